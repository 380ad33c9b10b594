//! In-session contact list editor.
//!
//! Purely in-memory: nothing here touches the store. The whole list is
//! replaced wholesale on save, so entries have no identity across saves.

use super::EditorError;
use crate::store::ContactRecord;
use crate::validation::{Validator, MIN_NAME_LEN};
use std::collections::HashMap;

use fleetdesk_shared::ClientContact;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDraft {
    pub name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub is_primary: bool,
}

/// Partial update for one entry; unset fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactListEditor {
    entries: Vec<ContactDraft>,
}

impl ContactListEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: &[ClientContact]) -> Self {
        Self {
            entries: rows
                .iter()
                .map(|row| ContactDraft {
                    name: row.name.clone(),
                    position: row.position.clone().unwrap_or_default(),
                    email: row.email.clone().unwrap_or_default(),
                    phone: row.phone.clone().unwrap_or_default(),
                    is_primary: row.is_primary,
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[ContactDraft] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a blank entry, primary only if it is the first
    pub fn add(&mut self) -> usize {
        let is_primary = self.entries.is_empty();
        self.entries.push(ContactDraft {
            is_primary,
            ..Default::default()
        });
        self.entries.len() - 1
    }

    /// Shallow-merge a patch into the entry at index. Setting
    /// `is_primary = true` clears every other primary flag first.
    pub fn update(&mut self, index: usize, patch: ContactPatch) -> Result<(), EditorError> {
        if index >= self.entries.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }

        if patch.is_primary == Some(true) {
            self.set_primary(index)?;
        } else if patch.is_primary == Some(false) {
            self.entries[index].is_primary = false;
        }

        let entry = &mut self.entries[index];
        if let Some(name) = patch.name {
            entry.name = name;
        }
        if let Some(position) = patch.position {
            entry.position = position;
        }
        if let Some(email) = patch.email {
            entry.email = email;
        }
        if let Some(phone) = patch.phone {
            entry.phone = phone;
        }
        Ok(())
    }

    /// Mark one entry primary, unsetting any previous primary
    pub fn set_primary(&mut self, index: usize) -> Result<(), EditorError> {
        if index >= self.entries.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.is_primary = i == index;
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<(), EditorError> {
        if index >= self.entries.len() {
            return Err(EditorError::IndexOutOfRange(index));
        }
        self.entries.remove(index);
        Ok(())
    }

    /// Validate every entry; keys are `contacts[i].field`
    pub fn validate(&self) -> HashMap<String, Vec<String>> {
        let mut validator = Validator::new();
        for (i, entry) in self.entries.iter().enumerate() {
            validator = validator.min_length(&entry.name, &format!("contacts[{}].name", i), MIN_NAME_LEN);
            let email = if entry.email.trim().is_empty() {
                None
            } else {
                Some(entry.email.clone())
            };
            validator = validator.email(&email, &format!("contacts[{}].email", i));
        }
        validator.into_field_errors()
    }

    pub fn to_records(&self) -> Vec<ContactRecord> {
        self.entries
            .iter()
            .map(|entry| ContactRecord {
                name: entry.name.trim().to_string(),
                position: trimmed_opt(&entry.position),
                email: trimmed_opt(&entry.email),
                phone: trimmed_opt(&entry.phone),
                is_primary: entry.is_primary,
            })
            .collect()
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

#[cfg(test)]
mod tests {
    use super::*;

    fn named(editor: &mut ContactListEditor, name: &str) -> usize {
        let index = editor.add();
        editor
            .update(
                index,
                ContactPatch {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        index
    }

    #[test]
    fn first_added_contact_is_primary() {
        let mut editor = ContactListEditor::new();
        named(&mut editor, "Jane Doe");
        named(&mut editor, "John Roe");
        assert!(editor.entries()[0].is_primary);
        assert!(!editor.entries()[1].is_primary);
    }

    #[test]
    fn at_most_one_primary_after_any_set_primary() {
        let mut editor = ContactListEditor::new();
        for name in ["A B", "C D", "E F"] {
            named(&mut editor, name);
        }

        editor.set_primary(2).unwrap();
        let primaries = editor.entries().iter().filter(|e| e.is_primary).count();
        assert_eq!(primaries, 1);
        assert!(editor.entries()[2].is_primary);

        // Through the patch path as well
        editor
            .update(
                1,
                ContactPatch {
                    is_primary: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        let primaries = editor.entries().iter().filter(|e| e.is_primary).count();
        assert_eq!(primaries, 1);
        assert!(editor.entries()[1].is_primary);
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut editor = ContactListEditor::new();
        let index = named(&mut editor, "Jane Doe");
        editor
            .update(
                index,
                ContactPatch {
                    email: Some("jane@acme.test".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(editor.entries()[index].name, "Jane Doe");
        assert_eq!(editor.entries()[index].email, "jane@acme.test");
    }

    #[test]
    fn remove_filters_out_the_entry() {
        let mut editor = ContactListEditor::new();
        named(&mut editor, "Jane Doe");
        named(&mut editor, "John Roe");
        editor.remove(0).unwrap();
        assert_eq!(editor.entries().len(), 1);
        assert_eq!(editor.entries()[0].name, "John Roe");
        assert_eq!(editor.remove(5), Err(EditorError::IndexOutOfRange(5)));
    }

    #[test]
    fn short_names_fail_validation() {
        let mut editor = ContactListEditor::new();
        let index = editor.add();
        editor
            .update(
                index,
                ContactPatch {
                    name: Some("J".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let errors = editor.validate();
        assert!(errors.contains_key("contacts[0].name"));
    }
}
