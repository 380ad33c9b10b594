//! Hosted relational store contract for the client subsystem.
//!
//! The save coordinator talks to this trait rather than to sqlx directly,
//! which is also what makes the multi-step save sequences testable without
//! a running database.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, ApiResult};
use crate::pagination::PaginationParams;
use fleetdesk_shared::{Client, ClientContact, ClientDocument, ClientMember, ClientType};

#[cfg(test)]
pub mod memory;

/// Field values for a client row write. Insert and update both carry the
/// full set; the create path passes an empty document collection and no
/// profile reference on the initial insert.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub name: String,
    pub client_type: ClientType,
    pub description: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub documents: Vec<ClientDocument>,
}

/// Contact values for the delete-all-then-insert-all replacement
#[derive(Debug, Clone)]
pub struct ContactRecord {
    pub name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_primary: bool,
}

/// Member values for reconciliation. `id` is present for members that
/// already exist in the store; absent for ones inserted this save.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub id: Option<Uuid>,
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
}

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn insert_client(&self, record: &ClientRecord) -> ApiResult<Client>;

    /// Full-row update. No optimistic locking: concurrent editors overwrite
    /// each other, last write wins.
    async fn update_client(&self, id: Uuid, record: &ClientRecord) -> ApiResult<Client>;

    async fn set_profile_image(&self, id: Uuid, url: &str) -> ApiResult<()>;

    /// Persist the embedded document collection as a single value
    async fn set_documents(&self, id: Uuid, documents: &[ClientDocument]) -> ApiResult<()>;

    async fn fetch_client(&self, id: Uuid) -> ApiResult<Option<Client>>;

    async fn list_clients(
        &self,
        params: &PaginationParams,
        include_archived: bool,
    ) -> ApiResult<(Vec<Client>, i64)>;

    /// Soft delete / restore via the archived flag; the row is never removed
    async fn set_archived(&self, id: Uuid, archived: bool) -> ApiResult<Client>;

    /// Irreversible delete. Nulls client references in dependent trip and
    /// invoice rows before removing the client row itself.
    async fn purge_client(&self, id: Uuid) -> ApiResult<()>;

    /// Replace the whole contact collection: delete-all, insert-all
    async fn replace_contacts(&self, client_id: Uuid, contacts: &[ContactRecord]) -> ApiResult<()>;

    /// Reconcile members: update rows identified by id, insert the rest
    async fn upsert_members(&self, client_id: Uuid, members: &[MemberRecord]) -> ApiResult<()>;

    async fn fetch_contacts(&self, client_id: Uuid) -> ApiResult<Vec<ClientContact>>;

    async fn fetch_members(&self, client_id: Uuid) -> ApiResult<Vec<ClientMember>>;
}

/// Postgres-backed store
pub struct PgClientStore {
    pool: PgPool,
}

impl PgClientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CLIENT_COLUMNS: &str = "id, name, client_type, description, website, address, \
     contact_person, email, phone, profile_image_url, is_archived, documents, \
     created_at, updated_at";

fn documents_json(documents: &[ClientDocument]) -> ApiResult<serde_json::Value> {
    serde_json::to_value(documents)
        .map_err(|e| AppError::InternalError(format!("document serialization: {}", e)))
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn insert_client(&self, record: &ClientRecord) -> ApiResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clients (id, name, client_type, description, website, address, \
             contact_person, email, phone, profile_image_url, documents) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&record.name)
        .bind(record.client_type)
        .bind(&record.description)
        .bind(&record.website)
        .bind(&record.address)
        .bind(&record.contact_person)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.profile_image_url)
        .bind(documents_json(&record.documents)?)
        .fetch_one(&self.pool)
        .await?;

        Ok(client)
    }

    async fn update_client(&self, id: Uuid, record: &ClientRecord) -> ApiResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET \
             name = $2, client_type = $3, description = $4, website = $5, address = $6, \
             contact_person = $7, email = $8, phone = $9, profile_image_url = $10, \
             documents = $11, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&record.name)
        .bind(record.client_type)
        .bind(&record.description)
        .bind(&record.website)
        .bind(&record.address)
        .bind(&record.contact_person)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.profile_image_url)
        .bind(documents_json(&record.documents)?)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        Ok(client)
    }

    async fn set_profile_image(&self, id: Uuid, url: &str) -> ApiResult<()> {
        let result =
            sqlx::query("UPDATE clients SET profile_image_url = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(url)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client".to_string()));
        }
        Ok(())
    }

    async fn set_documents(&self, id: Uuid, documents: &[ClientDocument]) -> ApiResult<()> {
        let result =
            sqlx::query("UPDATE clients SET documents = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(documents_json(documents)?)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client".to_string()));
        }
        Ok(())
    }

    async fn fetch_client(&self, id: Uuid) -> ApiResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    async fn list_clients(
        &self,
        params: &PaginationParams,
        include_archived: bool,
    ) -> ApiResult<(Vec<Client>, i64)> {
        let pattern = params.search_pattern();
        let archived_clause = if include_archived { "TRUE" } else { "NOT is_archived" };

        let (clients, total) = if let Some(pattern) = pattern {
            let clients = sqlx::query_as::<_, Client>(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients \
                 WHERE {archived_clause} AND (name ILIKE $1 OR email ILIKE $1) \
                 ORDER BY name LIMIT $2 OFFSET $3"
            ))
            .bind(&pattern)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await?;

            let total: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM clients \
                 WHERE {archived_clause} AND (name ILIKE $1 OR email ILIKE $1)"
            ))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

            (clients, total)
        } else {
            let clients = sqlx::query_as::<_, Client>(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients WHERE {archived_clause} \
                 ORDER BY name LIMIT $1 OFFSET $2"
            ))
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await?;

            let total: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM clients WHERE {archived_clause}"))
                    .fetch_one(&self.pool)
                    .await?;

            (clients, total)
        };

        Ok((clients, total))
    }

    async fn set_archived(&self, id: Uuid, archived: bool) -> ApiResult<Client> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "UPDATE clients SET is_archived = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(id)
        .bind(archived)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        Ok(client)
    }

    async fn purge_client(&self, id: Uuid) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE trips SET client_id = NULL WHERE client_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE invoices SET client_id = NULL WHERE client_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e.as_database_error().and_then(|d| d.code()) {
                // Remaining foreign-key references outside trips/invoices
                Some(code) if code == "23503" => AppError::PurgeFailed(
                    "Client is still referenced by other records".to_string(),
                ),
                _ => AppError::from(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn replace_contacts(&self, client_id: Uuid, contacts: &[ContactRecord]) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM client_contacts WHERE client_id = $1")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        for contact in contacts {
            sqlx::query(
                "INSERT INTO client_contacts (id, client_id, name, position, email, phone, is_primary) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::new_v4())
            .bind(client_id)
            .bind(&contact.name)
            .bind(&contact.position)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(contact.is_primary)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_members(&self, client_id: Uuid, members: &[MemberRecord]) -> ApiResult<()> {
        let mut tx = self.pool.begin().await?;

        for member in members {
            match member.id {
                Some(id) => {
                    sqlx::query(
                        "UPDATE client_members SET \
                         name = $3, role = $4, email = $5, phone = $6, notes = $7, \
                         document_url = $8, document_name = $9, updated_at = NOW() \
                         WHERE id = $1 AND client_id = $2",
                    )
                    .bind(id)
                    .bind(client_id)
                    .bind(&member.name)
                    .bind(&member.role)
                    .bind(&member.email)
                    .bind(&member.phone)
                    .bind(&member.notes)
                    .bind(&member.document_url)
                    .bind(&member.document_name)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        "INSERT INTO client_members \
                         (id, client_id, name, role, email, phone, notes, document_url, document_name) \
                         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                    )
                    .bind(Uuid::new_v4())
                    .bind(client_id)
                    .bind(&member.name)
                    .bind(&member.role)
                    .bind(&member.email)
                    .bind(&member.phone)
                    .bind(&member.notes)
                    .bind(&member.document_url)
                    .bind(&member.document_name)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_contacts(&self, client_id: Uuid) -> ApiResult<Vec<ClientContact>> {
        let contacts = sqlx::query_as::<_, ClientContact>(
            "SELECT id, client_id, name, position, email, phone, is_primary, created_at \
             FROM client_contacts WHERE client_id = $1 ORDER BY is_primary DESC, name",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    async fn fetch_members(&self, client_id: Uuid) -> ApiResult<Vec<ClientMember>> {
        let members = sqlx::query_as::<_, ClientMember>(
            "SELECT id, client_id, name, role, email, phone, notes, document_url, \
             document_name, created_at, updated_at \
             FROM client_members WHERE client_id = $1 ORDER BY name",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }
}

impl ClientRecord {
    /// Timestamped `Client` value for in-memory stores and tests
    pub fn into_client(self, id: Uuid) -> Client {
        Client {
            id,
            name: self.name,
            client_type: self.client_type,
            description: self.description,
            website: self.website,
            address: self.address,
            contact_person: self.contact_person,
            email: self.email,
            phone: self.phone,
            profile_image_url: self.profile_image_url,
            is_archived: false,
            documents: self.documents,
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}
