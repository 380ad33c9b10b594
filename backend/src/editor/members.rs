//! Member roster with a single-slot add/edit/view editor.
//!
//! Only one member can be open for adding or editing at a time; the slot
//! state machine makes a second simultaneous edit unrepresentable rather
//! than merely unreachable. Attached files stay on the slot until the save
//! coordinator resolves them to URLs.

use uuid::Uuid;

use super::EditorError;
use crate::notify::{Notifier, Severity};
use crate::store::MemberRecord;
use crate::storage::UploadFile;
use crate::validation::MIN_NAME_LEN;
use fleetdesk_shared::ClientMember;

#[derive(Debug, Clone)]
pub struct MemberDraft {
    /// Store identity; absent until the member has been persisted once
    pub id: Option<Uuid>,
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
    /// File attached this session, uploaded lazily at overall save time
    pub pending_document: Option<UploadFile>,
    /// Correlation id for this slot's document upload path
    pub upload_key: Uuid,
}

impl MemberDraft {
    fn blank() -> Self {
        Self {
            id: None,
            name: String::new(),
            role: String::new(),
            email: String::new(),
            phone: String::new(),
            notes: String::new(),
            document_url: None,
            document_name: None,
            pending_document: None,
            upload_key: Uuid::new_v4(),
        }
    }

    fn from_row(row: &ClientMember) -> Self {
        Self {
            id: Some(row.id),
            name: row.name.clone(),
            role: row.role.clone().unwrap_or_default(),
            email: row.email.clone().unwrap_or_default(),
            phone: row.phone.clone().unwrap_or_default(),
            notes: row.notes.clone().unwrap_or_default(),
            document_url: row.document_url.clone(),
            document_name: row.document_name.clone(),
            pending_document: None,
            upload_key: Uuid::new_v4(),
        }
    }

    fn valid_name(&self) -> bool {
        self.name.trim().chars().count() >= MIN_NAME_LEN
    }

    fn valid_email(&self) -> bool {
        let email = self.email.trim();
        email.is_empty() || email.contains('@')
    }
}

/// Which member, if any, occupies the single editing slot
#[derive(Debug)]
pub enum MemberSlot {
    Browsing,
    Adding(MemberDraft),
    Editing { index: usize, form: MemberDraft },
    Viewing(usize),
}

impl MemberSlot {
    fn is_busy(&self) -> bool {
        matches!(self, Self::Adding(_) | Self::Editing { .. })
    }
}

pub struct MemberEditor {
    roster: Vec<MemberDraft>,
    slot: MemberSlot,
}

impl MemberEditor {
    pub fn new() -> Self {
        Self {
            roster: Vec::new(),
            slot: MemberSlot::Browsing,
        }
    }

    pub fn from_rows(rows: &[ClientMember]) -> Self {
        Self {
            roster: rows.iter().map(MemberDraft::from_row).collect(),
            slot: MemberSlot::Browsing,
        }
    }

    pub fn roster(&self) -> &[MemberDraft] {
        &self.roster
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn slot(&self) -> &MemberSlot {
        &self.slot
    }

    /// Enter add mode with a cleared form and fresh upload key
    pub fn open_add(&mut self) -> Result<(), EditorError> {
        if self.slot.is_busy() {
            return Err(EditorError::SlotBusy);
        }
        self.slot = MemberSlot::Adding(MemberDraft::blank());
        Ok(())
    }

    /// Copy the entry at index into the slot for editing. The copy gets a
    /// new upload key so a replacement document lands at a new path.
    pub fn open_edit(&mut self, index: usize) -> Result<(), EditorError> {
        if self.slot.is_busy() {
            return Err(EditorError::SlotBusy);
        }
        let entry = self
            .roster
            .get(index)
            .ok_or(EditorError::IndexOutOfRange(index))?;
        let mut form = entry.clone();
        form.upload_key = Uuid::new_v4();
        form.pending_document = None;
        self.slot = MemberSlot::Editing { index, form };
        Ok(())
    }

    /// Open a read-only detail view of the entry at index
    pub fn open_view(&mut self, index: usize) -> Result<(), EditorError> {
        if self.slot.is_busy() {
            return Err(EditorError::SlotBusy);
        }
        if index >= self.roster.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }
        self.slot = MemberSlot::Viewing(index);
        Ok(())
    }

    /// Discard the slot (in-progress form values included) and go back to
    /// browsing
    pub fn cancel(&mut self) {
        self.slot = MemberSlot::Browsing;
    }

    /// Mutable access to the form while adding or editing
    pub fn form_mut(&mut self) -> Option<&mut MemberDraft> {
        match &mut self.slot {
            MemberSlot::Adding(form) => Some(form),
            MemberSlot::Editing { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Attach a file to the open form; replaces any earlier attachment
    pub fn attach_document(&mut self, file: UploadFile) -> Result<(), EditorError> {
        match self.form_mut() {
            Some(form) => {
                form.document_name = Some(file.name.clone());
                form.pending_document = Some(file);
                Ok(())
            }
            None => Err(EditorError::SlotBusy),
        }
    }

    pub fn clear_document(&mut self) -> Result<(), EditorError> {
        match self.form_mut() {
            Some(form) => {
                form.pending_document = None;
                form.document_url = None;
                form.document_name = None;
                Ok(())
            }
            None => Err(EditorError::SlotBusy),
        }
    }

    /// Validate and commit the open form into the roster. On validation
    /// failure the roster is untouched, the notifier carries the message,
    /// and the slot stays open for correction.
    pub fn save(&mut self, notifier: &dyn Notifier) -> Result<(), EditorError> {
        let form = match &self.slot {
            MemberSlot::Adding(form) => form,
            MemberSlot::Editing { form, .. } => form,
            _ => return Err(EditorError::SlotBusy),
        };

        if !form.valid_name() {
            notifier.notify(
                Severity::Error,
                "Invalid member",
                "Member name must be at least 2 characters",
            );
            return Ok(());
        }
        if !form.valid_email() {
            notifier.notify(
                Severity::Error,
                "Invalid member",
                "Member email must contain @",
            );
            return Ok(());
        }

        match std::mem::replace(&mut self.slot, MemberSlot::Browsing) {
            MemberSlot::Adding(form) => self.roster.push(form),
            MemberSlot::Editing { index, form } => self.roster[index] = form,
            other => self.slot = other,
        }
        Ok(())
    }

    /// Remove the entry at index. Rejected while a member is being added
    /// or edited, so an open slot's index can never go stale.
    pub fn delete(&mut self, index: usize) -> Result<(), EditorError> {
        if self.slot.is_busy() {
            return Err(EditorError::SlotBusy);
        }
        if index >= self.roster.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }
        self.roster.remove(index);
        if matches!(self.slot, MemberSlot::Viewing(i) if i >= self.roster.len()) {
            self.slot = MemberSlot::Browsing;
        }
        Ok(())
    }

    /// Store records for the current roster; pending documents must have
    /// been resolved to URLs already
    pub fn to_records(&self) -> Vec<MemberRecord> {
        self.roster
            .iter()
            .map(|draft| MemberRecord {
                id: draft.id,
                name: draft.name.trim().to_string(),
                role: trimmed_opt(&draft.role),
                email: trimmed_opt(&draft.email),
                phone: trimmed_opt(&draft.phone),
                notes: trimmed_opt(&draft.notes),
                document_url: draft.document_url.clone(),
                document_name: draft.document_name.clone(),
            })
            .collect()
    }

    /// Mutable roster access for the save coordinator's upload resolution
    pub(crate) fn roster_mut(&mut self) -> &mut [MemberDraft] {
        &mut self.roster
    }
}

impl Default for MemberEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn trimmed_opt(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
