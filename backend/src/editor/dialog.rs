//! Dialog shell state: tabs, footer actions, and close suppression.

use fleetdesk_shared::{Client, ClientType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    /// Brand-new record, nothing persisted yet
    New,
    /// Existing record that is not archived
    ExistingActive,
    /// Existing record with the archived flag set
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Details,
    Contacts,
    Members,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterAction {
    Cancel,
    Submit,
    Archive,
    Restore,
    PermanentlyDelete,
}

/// Tabs available for a client type: individual clients only get Details
pub fn visible_tabs(client_type: ClientType) -> &'static [Tab] {
    match client_type {
        ClientType::Organization => &[Tab::Details, Tab::Contacts, Tab::Members],
        ClientType::Individual => &[Tab::Details],
    }
}

/// Footer button set for a dialog mode
pub fn footer_actions(mode: DialogMode) -> &'static [FooterAction] {
    match mode {
        DialogMode::New => &[FooterAction::Cancel, FooterAction::Submit],
        DialogMode::ExistingActive => &[
            FooterAction::Cancel,
            FooterAction::Archive,
            FooterAction::Submit,
        ],
        DialogMode::Archived => &[
            FooterAction::Cancel,
            FooterAction::Restore,
            FooterAction::PermanentlyDelete,
        ],
    }
}

#[derive(Debug, Clone)]
pub struct DialogShell {
    mode: DialogMode,
    active_tab: Tab,
    confirm_open: bool,
}

impl DialogShell {
    pub fn for_new() -> Self {
        Self {
            mode: DialogMode::New,
            active_tab: Tab::Details,
            confirm_open: false,
        }
    }

    pub fn for_existing(client: &Client) -> Self {
        Self {
            mode: if client.is_archived {
                DialogMode::Archived
            } else {
                DialogMode::ExistingActive
            },
            active_tab: Tab::Details,
            confirm_open: false,
        }
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DialogMode) {
        self.mode = mode;
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// Switch tabs; selecting a tab the client type does not expose is a
    /// no-op
    pub fn select_tab(&mut self, tab: Tab, client_type: ClientType) {
        if visible_tabs(client_type).contains(&tab) {
            self.active_tab = tab;
        }
    }

    pub fn actions(&self) -> &'static [FooterAction] {
        footer_actions(self.mode)
    }

    /// The delete-confirmation sub-dialog; while it is open the outer
    /// dialog ignores close requests so one outside click cannot dismiss
    /// both layers
    pub fn open_confirm(&mut self) {
        self.confirm_open = true;
    }

    pub fn resolve_confirm(&mut self) {
        self.confirm_open = false;
    }

    pub fn confirm_open(&self) -> bool {
        self.confirm_open
    }

    /// Returns true if the dialog may close now
    pub fn request_close(&self) -> bool {
        !self.confirm_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn client(archived: bool) -> Client {
        Client {
            id: Uuid::new_v4(),
            name: "Acme Ltd".to_string(),
            client_type: ClientType::Organization,
            description: None,
            website: None,
            address: None,
            contact_person: None,
            email: None,
            phone: None,
            profile_image_url: None,
            is_archived: archived,
            documents: vec![],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn individual_clients_hide_contacts_and_members_tabs() {
        assert_eq!(visible_tabs(ClientType::Individual), &[Tab::Details]);
        assert_eq!(
            visible_tabs(ClientType::Organization),
            &[Tab::Details, Tab::Contacts, Tab::Members]
        );
    }

    #[test]
    fn tab_selection_is_gated_on_client_type() {
        let mut shell = DialogShell::for_new();
        shell.select_tab(Tab::Members, ClientType::Individual);
        assert_eq!(shell.active_tab(), Tab::Details);
        shell.select_tab(Tab::Members, ClientType::Organization);
        assert_eq!(shell.active_tab(), Tab::Members);
    }

    #[test]
    fn archived_record_shows_restore_and_purge_not_submit() {
        let shell = DialogShell::for_existing(&client(true));
        assert_eq!(shell.mode(), DialogMode::Archived);
        let actions = shell.actions();
        assert!(actions.contains(&FooterAction::Restore));
        assert!(actions.contains(&FooterAction::PermanentlyDelete));
        assert!(!actions.contains(&FooterAction::Submit));
        assert!(!actions.contains(&FooterAction::Archive));
    }

    #[test]
    fn active_record_shows_archive_and_submit() {
        let shell = DialogShell::for_existing(&client(false));
        let actions = shell.actions();
        assert!(actions.contains(&FooterAction::Archive));
        assert!(actions.contains(&FooterAction::Submit));
        assert!(!actions.contains(&FooterAction::Restore));
    }

    #[test]
    fn close_is_suppressed_while_confirmation_is_open() {
        let mut shell = DialogShell::for_existing(&client(true));
        assert!(shell.request_close());
        shell.open_confirm();
        assert!(!shell.request_close());
        shell.resolve_confirm();
        assert!(shell.request_close());
    }
}
