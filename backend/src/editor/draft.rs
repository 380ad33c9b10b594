//! Form state for the base client record.

use std::collections::HashMap;

use crate::store::ClientRecord;
use crate::validation::{self, Validator, MIN_NAME_LEN};
use fleetdesk_shared::{Client, ClientDocument, ClientType};

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Live field values for the client form. Defaults for a new record:
/// organization type, every optional text field empty.
#[derive(Debug, Clone)]
pub struct ClientDraft {
    pub name: String,
    pub client_type: ClientType,
    pub description: String,
    pub website: String,
    pub address: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
}

impl Default for ClientDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            client_type: ClientType::Organization,
            description: String::new(),
            website: String::new(),
            address: String::new(),
            contact_person: String::new(),
            email: String::new(),
            phone: String::new(),
        }
    }
}

impl ClientDraft {
    /// Load field values from an existing record, replacing current input
    pub fn reset_from(&mut self, client: &Client) {
        *self = Self {
            name: client.name.clone(),
            client_type: client.client_type,
            description: client.description.clone().unwrap_or_default(),
            website: client.website.clone().unwrap_or_default(),
            address: client.address.clone().unwrap_or_default(),
            contact_person: client.contact_person.clone().unwrap_or_default(),
            email: client.email.clone().unwrap_or_default(),
            phone: client.phone.clone().unwrap_or_default(),
        };
    }

    /// Clear back to new-record defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the type-gated Contacts/Members tabs apply
    pub fn is_organization(&self) -> bool {
        self.client_type == ClientType::Organization
    }

    /// Validate the current field values. Empty map means valid.
    pub fn validate(&self) -> HashMap<String, Vec<String>> {
        Validator::new()
            .min_length(&self.name, "name", MIN_NAME_LEN)
            .email(&none_if_empty(&self.email), "email")
            .into_field_errors()
    }

    /// Field values as a store record, empty inputs mapped to NULLs
    pub fn to_record(
        &self,
        profile_image_url: Option<String>,
        documents: Vec<ClientDocument>,
    ) -> ClientRecord {
        ClientRecord {
            name: self.name.trim().to_string(),
            client_type: self.client_type,
            description: none_if_empty(&self.description),
            website: none_if_empty(&self.website),
            address: none_if_empty(&self.address),
            contact_person: none_if_empty(&self.contact_person),
            email: none_if_empty(&self.email)
                .and_then(|e| validation::email::validate(&e, "email").ok()),
            phone: none_if_empty(&self.phone),
            profile_image_url,
            documents,
        }
    }
}
