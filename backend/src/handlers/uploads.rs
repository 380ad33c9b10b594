//! Client document and profile-image upload endpoints.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::editor::DocumentSet;
use crate::error::{ApiResult, AppError};
use crate::storage::{profile_path, Bucket, UploadFile};
use crate::AppState;
use fleetdesk_shared::{Client, ClientDocument};

pub fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:id/documents", post(upload_documents))
        .route("/:id/documents/:doc_id", delete(delete_document))
        .route("/:id/profile-image", post(upload_profile_image))
}

/// Collect every `file` field of the multipart body
async fn collect_files(multipart: &mut Multipart) -> ApiResult<Vec<UploadFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("unknown").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read file: {}", e)))?
            .to_vec();
        files.push(UploadFile::new(name, content_type, bytes));
    }

    if files.is_empty() {
        return Err(AppError::BadRequest("no file field in upload".to_string()));
    }
    Ok(files)
}

async fn fetch_client(state: &AppState, id: Uuid) -> ApiResult<Client> {
    state
        .store
        .fetch_client(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))
}

async fn upload_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Vec<ClientDocument>>)> {
    let client = fetch_client(&state, id).await?;
    let files = collect_files(&mut multipart).await?;

    let mut documents = DocumentSet::from_existing(client.documents);
    documents
        .handle_upload(files, Some(id), state.storage.as_ref())
        .await?;
    state.store.set_documents(id, documents.finalized()).await?;

    Ok((StatusCode::CREATED, Json(documents.finalized().to_vec())))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((id, doc_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<ClientDocument>>> {
    let client = fetch_client(&state, id).await?;

    let mut documents = DocumentSet::from_existing(client.documents);
    let removed = documents
        .remove(doc_id)
        .ok_or_else(|| AppError::NotFound("Document".to_string()))?;
    state.store.set_documents(id, documents.finalized()).await?;

    // Best-effort blob cleanup; the record no longer references it either way
    let prefix = format!("{}/", Bucket::ClientDocuments.as_str());
    if let Some(pos) = removed.url.find(&prefix) {
        let path = &removed.url[pos + prefix.len()..];
        if let Err(e) = state.storage.remove(Bucket::ClientDocuments, path).await {
            tracing::warn!(document = %removed.id, "failed to remove stored document: {}", e);
        }
    }

    Ok(Json(documents.finalized().to_vec()))
}

async fn upload_profile_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<Client>> {
    fetch_client(&state, id).await?;
    let mut files = collect_files(&mut multipart).await?;
    let file = files.remove(0);

    if !file.content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "profile image must be an image file".to_string(),
        ));
    }

    // Derived path keyed by the client id, replacing any previous image
    let blob = state
        .storage
        .upload(Bucket::ClientProfiles, &profile_path(id), &file.bytes, true)
        .await?;
    state.store.set_profile_image(id, &blob.url).await?;

    let client = fetch_client(&state, id).await?;
    Ok(Json(client))
}
