use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::editor::{ContactPatch, EditorSession, Lifecycle, MemberEditor, SaveCoordinator};
use crate::error::{ApiResult, AppError};
use crate::pagination::{PaginatedResponse, PaginationParams};
use crate::validation::{Validator, MIN_NAME_LEN};
use crate::AppState;
use fleetdesk_shared::{Client, ClientContact, ClientMember, ClientType};

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct MemberPayload {
    /// Present for members that already exist in the store
    pub id: Option<Uuid>,
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
}

/// One submit action: the base record's field values plus the full draft
/// contact and member lists
#[derive(Debug, Deserialize)]
pub struct SaveClientRequest {
    pub name: String,
    pub client_type: ClientType,
    pub description: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub contacts: Vec<ContactPayload>,
    #[serde(default)]
    pub members: Vec<MemberPayload>,
}

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    #[serde(flatten)]
    pub client: Client,
    pub contacts: Vec<ClientContact>,
    pub members: Vec<ClientMember>,
}

#[derive(Debug, Deserialize)]
pub struct ListClientsQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub include_archived: Option<bool>,
}

pub fn client_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client).delete(purge_client))
        .route("/:id/archive", post(archive_client))
        .route("/:id/restore", post(restore_client))
        .route("/:id/contacts", get(get_client_contacts))
        .route("/:id/members", get(get_client_members))
}

async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListClientsQuery>,
) -> ApiResult<Json<PaginatedResponse<Client>>> {
    let params = PaginationParams {
        page: query.page.unwrap_or(crate::pagination::DEFAULT_PAGE),
        per_page: query.per_page.unwrap_or(crate::pagination::DEFAULT_PAGE_SIZE),
        search: query.search,
    };
    let include_archived = query.include_archived.unwrap_or(false);

    let (clients, total) = state.store.list_clients(&params, include_archived).await?;
    Ok(Json(PaginatedResponse::new(clients, &params, total)))
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClientResponse>> {
    let client = state
        .store
        .fetch_client(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
    let (contacts, members) = load_sub_entities(&state, &client).await?;
    Ok(Json(ClientResponse {
        client,
        contacts,
        members,
    }))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveClientRequest>,
) -> ApiResult<(StatusCode, Json<ClientResponse>)> {
    let mut session = EditorSession::new_client();
    apply_payload(&mut session, payload)?;

    let mut coordinator = SaveCoordinator::new(
        state.store.as_ref(),
        state.storage.as_ref(),
        state.notifier.as_ref(),
        state.invalidator.as_ref(),
    );
    let client = coordinator.submit(&mut session).await.map_err(AppError::from)?;

    let (contacts, members) = load_sub_entities(&state, &client).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClientResponse {
            client,
            contacts,
            members,
        }),
    ))
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveClientRequest>,
) -> ApiResult<Json<ClientResponse>> {
    let existing = state
        .store
        .fetch_client(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;
    let contacts = state.store.fetch_contacts(id).await?;
    let members = state.store.fetch_members(id).await?;

    let mut session = EditorSession::edit(existing, contacts, members);
    apply_payload(&mut session, payload)?;

    let mut coordinator = SaveCoordinator::new(
        state.store.as_ref(),
        state.storage.as_ref(),
        state.notifier.as_ref(),
        state.invalidator.as_ref(),
    );
    let client = coordinator.submit(&mut session).await.map_err(AppError::from)?;

    let (contacts, members) = load_sub_entities(&state, &client).await?;
    Ok(Json(ClientResponse {
        client,
        contacts,
        members,
    }))
}

async fn archive_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Client>> {
    let lifecycle = Lifecycle::new(
        state.store.as_ref(),
        state.notifier.as_ref(),
        state.invalidator.as_ref(),
    );
    let client = lifecycle.archive(id).await.map_err(AppError::from)?;
    Ok(Json(client))
}

async fn restore_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Client>> {
    let lifecycle = Lifecycle::new(
        state.store.as_ref(),
        state.notifier.as_ref(),
        state.invalidator.as_ref(),
    );
    let client = lifecycle.restore(id).await.map_err(AppError::from)?;
    Ok(Json(client))
}

async fn purge_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let lifecycle = Lifecycle::new(
        state.store.as_ref(),
        state.notifier.as_ref(),
        state.invalidator.as_ref(),
    );
    lifecycle.purge(id).await.map_err(AppError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_client_contacts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ClientContact>>> {
    Ok(Json(state.store.fetch_contacts(id).await?))
}

async fn get_client_members(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ClientMember>>> {
    Ok(Json(state.store.fetch_members(id).await?))
}

async fn load_sub_entities(
    state: &AppState,
    client: &Client,
) -> ApiResult<(Vec<ClientContact>, Vec<ClientMember>)> {
    if client.client_type != ClientType::Organization {
        return Ok((Vec::new(), Vec::new()));
    }
    let contacts = state.store.fetch_contacts(client.id).await?;
    let members = state.store.fetch_members(client.id).await?;
    Ok((contacts, members))
}

/// Load the request payload into the session: base field values, a rebuilt
/// contact list, and a rebuilt member roster. Member payloads go through
/// the same single-slot flow the dialog uses, so they are pre-validated
/// here to guarantee each slot save lands.
fn apply_payload(session: &mut EditorSession, payload: SaveClientRequest) -> ApiResult<()> {
    validate_members(&payload.members)?;

    session.draft.name = payload.name;
    session.draft.client_type = payload.client_type;
    session.draft.description = payload.description.unwrap_or_default();
    session.draft.website = payload.website.unwrap_or_default();
    session.draft.address = payload.address.unwrap_or_default();
    session.draft.contact_person = payload.contact_person.unwrap_or_default();
    session.draft.email = payload.email.unwrap_or_default();
    session.draft.phone = payload.phone.unwrap_or_default();

    session.contacts = crate::editor::ContactListEditor::new();
    let mut primary: Option<usize> = None;
    for (i, contact) in payload.contacts.into_iter().enumerate() {
        let index = session.contacts.add();
        session
            .contacts
            .update(
                index,
                ContactPatch {
                    name: Some(contact.name),
                    position: contact.position,
                    email: contact.email,
                    phone: contact.phone,
                    is_primary: Some(false),
                },
            )
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if contact.is_primary {
            primary = Some(i);
        }
    }
    if let Some(index) = primary {
        session
            .contacts
            .set_primary(index)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    session.members = MemberEditor::new();
    for member in payload.members {
        session
            .members
            .open_add()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let form = session
            .members
            .form_mut()
            .ok_or_else(|| AppError::InternalError("member slot not open".to_string()))?;
        form.id = member.id;
        form.name = member.name;
        form.role = member.role.unwrap_or_default();
        form.email = member.email.unwrap_or_default();
        form.phone = member.phone.unwrap_or_default();
        form.notes = member.notes.unwrap_or_default();
        form.document_url = member.document_url;
        form.document_name = member.document_name;
        session
            .members
            .save(&crate::notify::TracingNotifier)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    Ok(())
}

fn validate_members(members: &[MemberPayload]) -> ApiResult<()> {
    let mut validator = Validator::new();
    for (i, member) in members.iter().enumerate() {
        validator = validator.min_length(&member.name, &format!("members[{}].name", i), MIN_NAME_LEN);
        if let Some(email) = &member.email {
            validator = validator.error_if(
                !email.trim().is_empty() && !email.contains('@'),
                &format!("members[{}].email", i),
                "Member email must contain @",
            );
        }
    }
    validator.finish()
}
