//! Save coordinator: sequences uploads and persistence writes for one
//! submit action, plus the separate archive/restore/purge unit.
//!
//! Steps run sequentially and are not rolled back on failure: a failure at
//! step N leaves steps before it applied and steps after it un-attempted.
//! The error names the failing step so callers can explain partial state.

use uuid::Uuid;

use super::EditorSession;
use crate::error::AppError;
use crate::notify::{CacheInvalidator, Notifier, Severity};
use crate::storage::{document_path, profile_path, BlobStore, Bucket};
use fleetdesk_shared::Client;

use super::dialog::DialogMode;
use crate::store::ClientStore;

/// Cache key invalidated after any successful client write
pub const CLIENTS_RESOURCE: &str = "clients";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

/// Which step of the persistence sequence failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    Validate,
    InsertClient,
    UpdateClient,
    UploadProfileImage,
    UploadDocuments,
    SaveContacts,
    SaveMembers,
}

impl SaveStep {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Validate => "validating the form",
            Self::InsertClient => "creating the client record",
            Self::UpdateClient => "updating the client record",
            Self::UploadProfileImage => "uploading the profile image",
            Self::UploadDocuments => "uploading documents",
            Self::SaveContacts => "saving contacts",
            Self::SaveMembers => "saving members",
        }
    }
}

#[derive(Debug)]
pub struct SaveError {
    pub step: SaveStep,
    pub error: AppError,
}

impl SaveError {
    fn at(step: SaveStep) -> impl FnOnce(AppError) -> SaveError {
        move |error| SaveError { step, error }
    }
}

impl From<SaveError> for AppError {
    fn from(err: SaveError) -> Self {
        err.error
    }
}

pub struct SaveCoordinator<'a> {
    store: &'a dyn ClientStore,
    storage: &'a dyn BlobStore,
    notifier: &'a dyn Notifier,
    invalidator: &'a dyn CacheInvalidator,
    state: SaveState,
}

impl<'a> SaveCoordinator<'a> {
    pub fn new(
        store: &'a dyn ClientStore,
        storage: &'a dyn BlobStore,
        notifier: &'a dyn Notifier,
        invalidator: &'a dyn CacheInvalidator,
    ) -> Self {
        Self {
            store,
            storage,
            notifier,
            invalidator,
            state: SaveState::Idle,
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == SaveState::Submitting
    }

    /// Run the full persistence sequence for the session. The submitting
    /// flag is cleared on every exit path.
    pub async fn submit(&mut self, session: &mut EditorSession) -> Result<Client, SaveError> {
        if self.is_submitting() {
            return Err(SaveError {
                step: SaveStep::Validate,
                error: AppError::Conflict("A save is already in progress".to_string()),
            });
        }
        self.state = SaveState::Submitting;

        let result = self.run(session).await;
        match &result {
            Ok(client) => {
                self.state = SaveState::Succeeded;
                self.notifier
                    .notify(Severity::Success, "Client saved", &client.name);
                self.invalidator.invalidate(CLIENTS_RESOURCE).await;
            }
            Err(err) => {
                self.state = SaveState::Failed;
                self.notifier
                    .notify(Severity::Error, "Save failed", err.step.describe());
            }
        }
        result
    }

    async fn run(&self, session: &mut EditorSession) -> Result<Client, SaveError> {
        // Client-side validation gates the whole sequence; an invalid draft
        // never reaches the store.
        let mut errors = session.draft.validate();
        if session.draft.is_organization() {
            errors.extend(session.contacts.validate());
        }
        if !errors.is_empty() {
            return Err(SaveError {
                step: SaveStep::Validate,
                error: AppError::ValidationError { details: errors },
            });
        }

        match session.client_id() {
            None => self.create(session).await,
            Some(id) => self.update(session, id).await,
        }
    }

    /// Create path: insert the bare record first to obtain an id, then
    /// attach everything that needed one.
    async fn create(&self, session: &mut EditorSession) -> Result<Client, SaveError> {
        let record = session.draft.to_record(None, Vec::new());
        let mut client = self
            .store
            .insert_client(&record)
            .await
            .map_err(SaveError::at(SaveStep::InsertClient))?;

        if let Some(file) = session.profile.take_pending() {
            let blob = self
                .storage
                .upload(
                    Bucket::ClientProfiles,
                    &profile_path(client.id),
                    &file.bytes,
                    true,
                )
                .await
                .map_err(|e| SaveError::at(SaveStep::UploadProfileImage)(e.into()))?;
            self.store
                .set_profile_image(client.id, &blob.url)
                .await
                .map_err(SaveError::at(SaveStep::UploadProfileImage))?;
            session.profile.mark_uploaded(blob.url.clone());
            client.profile_image_url = Some(blob.url);
        }

        if session.documents.has_pending() {
            session
                .documents
                .flush_pending(client.id, self.storage)
                .await
                .map_err(|e| SaveError::at(SaveStep::UploadDocuments)(e.into()))?;
            self.store
                .set_documents(client.id, session.documents.finalized())
                .await
                .map_err(SaveError::at(SaveStep::UploadDocuments))?;
            client.documents = session.documents.finalized().to_vec();
        }

        if session.draft.is_organization() {
            if !session.contacts.is_empty() {
                self.store
                    .replace_contacts(client.id, &session.contacts.to_records())
                    .await
                    .map_err(SaveError::at(SaveStep::SaveContacts))?;
            }
            if !session.members.is_empty() {
                self.resolve_member_documents(session).await?;
                self.store
                    .upsert_members(client.id, &session.members.to_records())
                    .await
                    .map_err(SaveError::at(SaveStep::SaveMembers))?;
            }
        }

        session.existing = Some(client.clone());
        session.shell.set_mode(DialogMode::ExistingActive);
        Ok(client)
    }

    /// Update path: one base-row write carrying current field values,
    /// document collection, and profile reference, then sub-entity
    /// replacement.
    async fn update(&self, session: &mut EditorSession, id: Uuid) -> Result<Client, SaveError> {
        if let Some(file) = session.profile.take_pending() {
            // Same derived path as any previous image, so this replaces it
            let blob = self
                .storage
                .upload(Bucket::ClientProfiles, &profile_path(id), &file.bytes, true)
                .await
                .map_err(|e| SaveError::at(SaveStep::UploadProfileImage)(e.into()))?;
            session.profile.mark_uploaded(blob.url);
        }

        let record = session.draft.to_record(
            session.profile.persisted_url().map(str::to_string),
            session.documents.finalized().to_vec(),
        );
        let client = self
            .store
            .update_client(id, &record)
            .await
            .map_err(SaveError::at(SaveStep::UpdateClient))?;

        if session.draft.is_organization() {
            self.store
                .replace_contacts(id, &session.contacts.to_records())
                .await
                .map_err(SaveError::at(SaveStep::SaveContacts))?;

            self.resolve_member_documents(session).await?;
            self.store
                .upsert_members(id, &session.members.to_records())
                .await
                .map_err(SaveError::at(SaveStep::SaveMembers))?;
        }

        session.existing = Some(client.clone());
        Ok(client)
    }

    /// Upload any member documents attached during the session, resolving
    /// each to a stable URL before the member rows are written
    async fn resolve_member_documents(&self, session: &mut EditorSession) -> Result<(), SaveError> {
        for draft in session.members.roster_mut() {
            if let Some(file) = draft.pending_document.take() {
                let blob = self
                    .storage
                    .upload(
                        Bucket::ClientMemberDocuments,
                        &document_path(draft.upload_key, &file),
                        &file.bytes,
                        false,
                    )
                    .await
                    .map_err(|e| SaveError::at(SaveStep::SaveMembers)(e.into()))?;
                draft.document_url = Some(blob.url);
                draft.document_name = Some(file.name);
            }
        }
        Ok(())
    }
}

/// Which lifecycle transition failed; kept distinct per transition so the
/// confirmation dialog can render the specific failure inline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Archive,
    Restore,
    Purge,
}

#[derive(Debug)]
pub struct LifecycleError {
    pub action: LifecycleAction,
    pub error: AppError,
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        err.error
    }
}

/// Archive / restore / permanent-delete, independent from the save
/// sequence. Archive and restore are reversible flag flips; purge is
/// irreversible and clears dependent trip/invoice references first.
pub struct Lifecycle<'a> {
    store: &'a dyn ClientStore,
    notifier: &'a dyn Notifier,
    invalidator: &'a dyn CacheInvalidator,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        store: &'a dyn ClientStore,
        notifier: &'a dyn Notifier,
        invalidator: &'a dyn CacheInvalidator,
    ) -> Self {
        Self {
            store,
            notifier,
            invalidator,
        }
    }

    pub async fn archive(&self, id: Uuid) -> Result<Client, LifecycleError> {
        match self.store.set_archived(id, true).await {
            Ok(client) => {
                self.notifier
                    .notify(Severity::Success, "Client archived", &client.name);
                self.invalidator.invalidate(CLIENTS_RESOURCE).await;
                Ok(client)
            }
            Err(error) => {
                self.notifier
                    .notify(Severity::Error, "Archive failed", &error.message());
                Err(LifecycleError {
                    action: LifecycleAction::Archive,
                    error,
                })
            }
        }
    }

    pub async fn restore(&self, id: Uuid) -> Result<Client, LifecycleError> {
        match self.store.set_archived(id, false).await {
            Ok(client) => {
                self.notifier
                    .notify(Severity::Success, "Client restored", &client.name);
                self.invalidator.invalidate(CLIENTS_RESOURCE).await;
                Ok(client)
            }
            Err(error) => {
                self.notifier
                    .notify(Severity::Error, "Restore failed", &error.message());
                Err(LifecycleError {
                    action: LifecycleAction::Restore,
                    error,
                })
            }
        }
    }

    pub async fn purge(&self, id: Uuid) -> Result<(), LifecycleError> {
        match self.store.purge_client(id).await {
            Ok(()) => {
                self.notifier
                    .notify(Severity::Success, "Client permanently deleted", "");
                self.invalidator.invalidate(CLIENTS_RESOURCE).await;
                Ok(())
            }
            Err(error) => {
                // Not a toast: the caller keeps the confirmation dialog
                // open and shows this inline
                Err(LifecycleError {
                    action: LifecycleAction::Purge,
                    error,
                })
            }
        }
    }
}
