//! Client document collection state: finalized uploads plus files selected
//! before the owning client exists.

use chrono::Utc;
use uuid::Uuid;

use crate::storage::{document_path, BlobStore, Bucket, StorageError, UploadFile};
use fleetdesk_shared::ClientDocument;

#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    finalized: Vec<ClientDocument>,
    pending: Vec<UploadFile>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_existing(finalized: Vec<ClientDocument>) -> Self {
        Self {
            finalized,
            pending: Vec::new(),
        }
    }

    pub fn finalized(&self) -> &[ClientDocument] {
        &self.finalized
    }

    pub fn pending(&self) -> &[UploadFile] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Accept selected files. Without a client id they wait in the pending
    /// list; with one they upload immediately and join the finalized
    /// collection.
    pub async fn handle_upload(
        &mut self,
        files: Vec<UploadFile>,
        client_id: Option<Uuid>,
        storage: &dyn BlobStore,
    ) -> Result<(), StorageError> {
        match client_id {
            None => {
                self.pending.extend(files);
                Ok(())
            }
            Some(client_id) => {
                for file in files {
                    let document = upload_one(client_id, &file, storage).await?;
                    self.finalized.push(document);
                }
                Ok(())
            }
        }
    }

    /// Upload everything in the pending list for the now-known client,
    /// moving each into the finalized collection
    pub async fn flush_pending(
        &mut self,
        client_id: Uuid,
        storage: &dyn BlobStore,
    ) -> Result<(), StorageError> {
        let files = std::mem::take(&mut self.pending);
        for file in files {
            let document = upload_one(client_id, &file, storage).await?;
            self.finalized.push(document);
        }
        Ok(())
    }

    /// Remove a finalized document from the in-memory collection
    pub fn remove(&mut self, document_id: Uuid) -> Option<ClientDocument> {
        let index = self.finalized.iter().position(|d| d.id == document_id)?;
        Some(self.finalized.remove(index))
    }

    /// Replace both lists, used when switching which client is edited
    pub fn reset(&mut self, finalized: Vec<ClientDocument>) {
        self.finalized = finalized;
        self.pending.clear();
    }
}

async fn upload_one(
    client_id: Uuid,
    file: &UploadFile,
    storage: &dyn BlobStore,
) -> Result<ClientDocument, StorageError> {
    let blob = storage
        .upload(
            Bucket::ClientDocuments,
            &document_path(client_id, file),
            &file.bytes,
            false,
        )
        .await?;
    Ok(ClientDocument {
        id: Uuid::new_v4(),
        name: file.name.clone(),
        url: blob.url,
        uploaded_at: Utc::now(),
    })
}
