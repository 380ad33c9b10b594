//! In-memory `ClientStore` used by coordinator and handler tests.
//!
//! Behaves like the Postgres store for the operations the editor exercises,
//! and can be armed to fail a single named operation so partial-save
//! behavior is observable.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{ClientRecord, ClientStore, ContactRecord, MemberRecord};
use crate::error::{ApiResult, AppError};
use crate::pagination::PaginationParams;
use fleetdesk_shared::{Client, ClientContact, ClientDocument, ClientMember};

#[derive(Default)]
struct Tables {
    clients: HashMap<Uuid, Client>,
    contacts: HashMap<Uuid, Vec<ClientContact>>,
    members: HashMap<Uuid, Vec<ClientMember>>,
    trip_refs: Vec<(Uuid, Option<Uuid>)>,    // (trip id, client_id)
    invoice_refs: Vec<(Uuid, Option<Uuid>)>, // (invoice id, client_id)
}

#[derive(Default)]
pub struct MemoryClientStore {
    tables: Mutex<Tables>,
    fail_on: Mutex<Option<&'static str>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call to the named operation fail with a database error
    pub fn fail_on(&self, operation: &'static str) {
        *self.fail_on.lock().unwrap() = Some(operation);
    }

    fn check_failure(&self, operation: &str) -> ApiResult<()> {
        let mut armed = self.fail_on.lock().unwrap();
        if (*armed).is_some_and(|op| op == operation) {
            *armed = None;
            return Err(AppError::DatabaseError(format!("injected failure in {}", operation)));
        }
        Ok(())
    }

    pub fn seed_client(&self, client: Client) {
        self.tables.lock().unwrap().clients.insert(client.id, client);
    }

    pub fn seed_trip(&self, client_id: Uuid) -> Uuid {
        let trip_id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .trip_refs
            .push((trip_id, Some(client_id)));
        trip_id
    }

    pub fn seed_invoice(&self, client_id: Uuid) -> Uuid {
        let invoice_id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .invoice_refs
            .push((invoice_id, Some(client_id)));
        invoice_id
    }

    pub fn contacts_of(&self, client_id: Uuid) -> Vec<ClientContact> {
        self.tables
            .lock()
            .unwrap()
            .contacts
            .get(&client_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn members_of(&self, client_id: Uuid) -> Vec<ClientMember> {
        self.tables
            .lock()
            .unwrap()
            .members
            .get(&client_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn client(&self, id: Uuid) -> Option<Client> {
        self.tables.lock().unwrap().clients.get(&id).cloned()
    }

    pub fn trip_client(&self, trip_id: Uuid) -> Option<Uuid> {
        self.tables
            .lock()
            .unwrap()
            .trip_refs
            .iter()
            .find(|(id, _)| *id == trip_id)
            .and_then(|(_, client)| *client)
    }

    pub fn invoice_client(&self, invoice_id: Uuid) -> Option<Uuid> {
        self.tables
            .lock()
            .unwrap()
            .invoice_refs
            .iter()
            .find(|(id, _)| *id == invoice_id)
            .and_then(|(_, client)| *client)
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn insert_client(&self, record: &ClientRecord) -> ApiResult<Client> {
        self.check_failure("insert_client")?;
        let client = record.clone().into_client(Uuid::new_v4());
        self.tables
            .lock()
            .unwrap()
            .clients
            .insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(&self, id: Uuid, record: &ClientRecord) -> ApiResult<Client> {
        self.check_failure("update_client")?;
        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .clients
            .get(&id)
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        let mut updated = record.clone().into_client(id);
        updated.is_archived = existing.is_archived;
        updated.created_at = existing.created_at;
        updated.updated_at = Some(Utc::now());
        tables.clients.insert(id, updated.clone());
        Ok(updated)
    }

    async fn set_profile_image(&self, id: Uuid, url: &str) -> ApiResult<()> {
        self.check_failure("set_profile_image")?;
        let mut tables = self.tables.lock().unwrap();
        let client = tables
            .clients
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
        client.profile_image_url = Some(url.to_string());
        Ok(())
    }

    async fn set_documents(&self, id: Uuid, documents: &[ClientDocument]) -> ApiResult<()> {
        self.check_failure("set_documents")?;
        let mut tables = self.tables.lock().unwrap();
        let client = tables
            .clients
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
        client.documents = documents.to_vec();
        Ok(())
    }

    async fn fetch_client(&self, id: Uuid) -> ApiResult<Option<Client>> {
        self.check_failure("fetch_client")?;
        Ok(self.tables.lock().unwrap().clients.get(&id).cloned())
    }

    async fn list_clients(
        &self,
        params: &PaginationParams,
        include_archived: bool,
    ) -> ApiResult<(Vec<Client>, i64)> {
        self.check_failure("list_clients")?;
        let tables = self.tables.lock().unwrap();
        let pattern = params
            .search_pattern()
            .map(|p| p.trim_matches('%').to_lowercase());

        let mut matches: Vec<Client> = tables
            .clients
            .values()
            .filter(|c| include_archived || !c.is_archived)
            .filter(|c| match &pattern {
                Some(p) => {
                    c.name.to_lowercase().contains(p)
                        || c.email
                            .as_ref()
                            .map(|e| e.to_lowercase().contains(p))
                            .unwrap_or(false)
                }
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        let total = matches.len() as i64;
        let page: Vec<Client> = matches
            .into_iter()
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> ApiResult<Client> {
        self.check_failure("set_archived")?;
        let mut tables = self.tables.lock().unwrap();
        let client = tables
            .clients
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
        client.is_archived = archived;
        client.updated_at = Some(Utc::now());
        Ok(client.clone())
    }

    async fn purge_client(&self, id: Uuid) -> ApiResult<()> {
        self.check_failure("purge_client")?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.clients.contains_key(&id) {
            return Err(AppError::NotFound("Client".to_string()));
        }
        for (_, client) in tables.trip_refs.iter_mut() {
            if *client == Some(id) {
                *client = None;
            }
        }
        for (_, client) in tables.invoice_refs.iter_mut() {
            if *client == Some(id) {
                *client = None;
            }
        }
        tables.clients.remove(&id);
        tables.contacts.remove(&id);
        tables.members.remove(&id);
        Ok(())
    }

    async fn replace_contacts(&self, client_id: Uuid, contacts: &[ContactRecord]) -> ApiResult<()> {
        self.check_failure("replace_contacts")?;
        let rows = contacts
            .iter()
            .map(|c| ClientContact {
                id: Uuid::new_v4(),
                client_id,
                name: c.name.clone(),
                position: c.position.clone(),
                email: c.email.clone(),
                phone: c.phone.clone(),
                is_primary: c.is_primary,
                created_at: Utc::now(),
            })
            .collect();
        self.tables.lock().unwrap().contacts.insert(client_id, rows);
        Ok(())
    }

    async fn upsert_members(&self, client_id: Uuid, members: &[MemberRecord]) -> ApiResult<()> {
        self.check_failure("upsert_members")?;
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.members.entry(client_id).or_default();

        for member in members {
            match member.id.and_then(|id| rows.iter().position(|r| r.id == id)) {
                Some(index) => {
                    let row = &mut rows[index];
                    row.name = member.name.clone();
                    row.role = member.role.clone();
                    row.email = member.email.clone();
                    row.phone = member.phone.clone();
                    row.notes = member.notes.clone();
                    row.document_url = member.document_url.clone();
                    row.document_name = member.document_name.clone();
                    row.updated_at = Some(Utc::now());
                }
                None => rows.push(ClientMember {
                    id: member.id.unwrap_or_else(Uuid::new_v4),
                    client_id,
                    name: member.name.clone(),
                    role: member.role.clone(),
                    email: member.email.clone(),
                    phone: member.phone.clone(),
                    notes: member.notes.clone(),
                    document_url: member.document_url.clone(),
                    document_name: member.document_name.clone(),
                    created_at: Utc::now(),
                    updated_at: None,
                }),
            }
        }
        Ok(())
    }

    async fn fetch_contacts(&self, client_id: Uuid) -> ApiResult<Vec<ClientContact>> {
        self.check_failure("fetch_contacts")?;
        Ok(self.contacts_of(client_id))
    }

    async fn fetch_members(&self, client_id: Uuid) -> ApiResult<Vec<ClientMember>> {
        self.check_failure("fetch_members")?;
        Ok(self.members_of(client_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::company::en::CompanyName;
    use fake::Fake;
    use fleetdesk_shared::ClientType;

    fn record(name: &str) -> ClientRecord {
        ClientRecord {
            name: name.to_string(),
            client_type: ClientType::Organization,
            description: None,
            website: None,
            address: None,
            contact_person: None,
            email: None,
            phone: None,
            profile_image_url: None,
            documents: vec![],
        }
    }

    #[tokio::test]
    async fn list_excludes_archived_unless_asked() {
        let store = MemoryClientStore::new();
        let kept = store.insert_client(&record("Kept Ltd")).await.unwrap();
        let gone = store.insert_client(&record("Gone Ltd")).await.unwrap();
        store.set_archived(gone.id, true).await.unwrap();

        let (page, total) = store
            .list_clients(&PaginationParams::default(), false)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].id, kept.id);

        let (_, total) = store
            .list_clients(&PaginationParams::default(), true)
            .await
            .unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn search_matches_name_case_insensitively() {
        let store = MemoryClientStore::new();
        for _ in 0..5 {
            let name: String = CompanyName().fake();
            store.insert_client(&record(&name)).await.unwrap();
        }
        store.insert_client(&record("Acme Haulage")).await.unwrap();

        let params = PaginationParams {
            search: Some("acme".to_string()),
            ..Default::default()
        };
        let (page, total) = store.list_clients(&params, false).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name, "Acme Haulage");
    }

    #[tokio::test]
    async fn armed_failure_fires_once() {
        let store = MemoryClientStore::new();
        store.fail_on("insert_client");

        assert!(store.insert_client(&record("First Ltd")).await.is_err());
        assert!(store.insert_client(&record("Second Ltd")).await.is_ok());
    }
}
