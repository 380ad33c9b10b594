//! Client editor session: the draft state for one open client dialog.
//!
//! One session is one arena of draft sub-entity lists. Everything in it is
//! in-memory until the save coordinator commits; dropping the session is
//! cancel.

pub mod contacts;
pub mod dialog;
pub mod documents;
pub mod draft;
pub mod members;
pub mod profile;
pub mod saver;

pub use contacts::{ContactDraft, ContactListEditor, ContactPatch};
pub use dialog::{DialogMode, DialogShell, FooterAction, Tab};
pub use documents::DocumentSet;
pub use draft::ClientDraft;
pub use members::{MemberDraft, MemberEditor, MemberSlot};
pub use profile::ProfileImage;
pub use saver::{Lifecycle, LifecycleError, SaveCoordinator, SaveError, SaveState, SaveStep};

use fleetdesk_shared::{Client, ClientContact, ClientMember};

/// Errors from in-session editing operations
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EditorError {
    #[error("another member is already being added or edited")]
    SlotBusy,
    #[error("no entry at index {0}")]
    IndexOutOfRange(usize),
}

/// All live mutable state for one open client dialog
pub struct EditorSession {
    /// Present when editing an existing record, absent for a new one
    pub existing: Option<Client>,
    pub draft: ClientDraft,
    pub contacts: ContactListEditor,
    pub members: MemberEditor,
    pub documents: DocumentSet,
    pub profile: ProfileImage,
    pub shell: DialogShell,
}

impl EditorSession {
    /// Fresh session for a brand-new client
    pub fn new_client() -> Self {
        Self {
            existing: None,
            draft: ClientDraft::default(),
            contacts: ContactListEditor::new(),
            members: MemberEditor::new(),
            documents: DocumentSet::new(),
            profile: ProfileImage::new(),
            shell: DialogShell::for_new(),
        }
    }

    /// Session over an existing record with its loaded sub-entities
    pub fn edit(client: Client, contacts: Vec<ClientContact>, members: Vec<ClientMember>) -> Self {
        let mut session = Self::new_client();
        session.draft.reset_from(&client);
        session.contacts = ContactListEditor::from_rows(&contacts);
        session.members = MemberEditor::from_rows(&members);
        session.documents = DocumentSet::from_existing(client.documents.clone());
        session.profile = ProfileImage::from_existing(client.profile_image_url.clone());
        session.shell = DialogShell::for_existing(&client);
        session.existing = Some(client);
        session
    }

    pub fn client_id(&self) -> Option<uuid::Uuid> {
        self.existing.as_ref().map(|c| c.id)
    }
}
