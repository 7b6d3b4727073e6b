use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    EventId, ParticipantId, ProposalId, ProposalRef, RoleDraft, RoleId, RoleUpdate, UserId,
};
use super::error::CastingError;
use super::service::CastingService;
use super::store::TransactionalStore;

/// Router exposing the casting board endpoints. The caller's identity arrives
/// in the `X-User-Id` header, filled in by the session layer in front of this
/// service; every mutation then checks organizer rights on the target event.
pub fn casting_router<S>(service: Arc<CastingService<S>>) -> Router
where
    S: TransactionalStore + 'static,
{
    Router::new()
        .route("/event/:event_id/casting_data", get(casting_data::<S>))
        .route(
            "/event/:event_id/casting/add_proposal",
            post(add_proposal::<S>),
        )
        .route(
            "/event/:event_id/casting/delete_proposal",
            post(delete_proposal::<S>),
        )
        .route("/event/:event_id/casting/assign", post(assign::<S>))
        .route(
            "/event/:event_id/casting/update_score",
            post(update_score::<S>),
        )
        .route(
            "/event/:event_id/casting/toggle_validation",
            post(toggle_validation::<S>),
        )
        .route(
            "/event/:event_id/casting/auto_assign",
            post(auto_assign::<S>),
        )
        .route("/event/:event_id/add_role", post(add_role::<S>))
        .route(
            "/event/:event_id/update_role/:role_id",
            post(update_role::<S>),
        )
        .route(
            "/event/:event_id/delete_role/:role_id",
            post(delete_role::<S>),
        )
        .route(
            "/event/:event_id/participant/:participant_id/status",
            post(change_status::<S>),
        )
        .route("/api/casting/assign", post(legacy_assign::<S>))
        .route("/api/casting/unassign", post(legacy_unassign::<S>))
        .with_state(service)
}

impl IntoResponse for CastingError {
    fn into_response(self) -> Response {
        let status = match &self {
            CastingError::Validation(_) => StatusCode::BAD_REQUEST,
            CastingError::NotFound(_) => StatusCode::NOT_FOUND,
            CastingError::Permission => StatusCode::FORBIDDEN,
            CastingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Caller identity, from the header the session layer injects. Anything
/// missing or malformed is treated as an unauthorized caller, not a 400: the
/// header is infrastructure, not user input.
fn current_user(headers: &HeaderMap) -> Result<UserId, CastingError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(UserId)
        .ok_or(CastingError::Permission)
}

/// Column reference as it appears on the wire: the literal `"main"` or an
/// integer proposal id. Resolved here once; everything below the router works
/// on [`ProposalRef`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnParam {
    Id(i64),
    Key(String),
}

impl ColumnParam {
    fn resolve(self) -> Result<ProposalRef, CastingError> {
        match self {
            ColumnParam::Id(id) => Ok(ProposalRef::Named(ProposalId(id))),
            ColumnParam::Key(key) if key == "main" => Ok(ProposalRef::Main),
            // Board clients read column ids out of DOM datasets, so numeric
            // ids can arrive as strings.
            ColumnParam::Key(key) => match key.trim().parse::<i64>() {
                Ok(id) => Ok(ProposalRef::Named(ProposalId(id))),
                Err(_) => Err(CastingError::validation(format!(
                    "unknown casting column '{key}'"
                ))),
            },
        }
    }
}

async fn casting_data<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let snapshot = service.snapshot(event_id)?;
    Ok(Json(snapshot).into_response())
}

#[derive(Debug, Deserialize)]
struct AddProposalRequest {
    name: String,
}

async fn add_proposal<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<AddProposalRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let proposal = service.create_proposal(event_id, &payload.name)?;
    Ok(Json(json!({ "id": proposal.id, "name": proposal.name })).into_response())
}

#[derive(Debug, Deserialize)]
struct DeleteProposalRequest {
    proposal_id: ColumnParam,
}

async fn delete_proposal<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<DeleteProposalRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    service.delete_proposal(event_id, payload.proposal_id.resolve()?)?;
    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
struct AssignRequest {
    proposal_id: ColumnParam,
    role_id: i64,
    /// Absent or null clears the slot, mirroring the board dropdown's empty
    /// choice.
    participant_id: Option<i64>,
}

async fn assign<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<AssignRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let column = payload.proposal_id.resolve()?;
    let role_id = RoleId(payload.role_id);
    match payload.participant_id {
        Some(participant_id) => {
            service.assign(event_id, column, role_id, ParticipantId(participant_id))?
        }
        None => service.unassign(event_id, column, role_id)?,
    }
    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
struct ScoreRequest {
    proposal_id: ColumnParam,
    role_id: i64,
    score: i32,
}

async fn update_score<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ScoreRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    service.update_score(
        event_id,
        payload.proposal_id.resolve()?,
        RoleId(payload.role_id),
        payload.score,
    )?;
    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
struct ToggleValidationRequest {
    validated: bool,
}

async fn toggle_validation<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ToggleValidationRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    service.toggle_validation(event_id, payload.validated)?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn auto_assign<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let outcome = service.auto_assign(event_id)?;
    Ok(Json(json!({
        "success": true,
        "assigned": outcome.assigned,
        "pairs": outcome.pairs,
    }))
    .into_response())
}

async fn add_role<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path(event_id): Path<i64>,
    headers: HeaderMap,
    Json(draft): Json<RoleDraft>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let role = service.create_role(event_id, draft)?;
    Ok((StatusCode::CREATED, Json(role)).into_response())
}

async fn update_role<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path((event_id, role_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    Json(update): Json<RoleUpdate>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let role = service.update_role(event_id, RoleId(role_id), update)?;
    Ok(Json(role).into_response())
}

async fn delete_role<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path((event_id, role_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    service.delete_role(event_id, RoleId(role_id))?;
    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
struct ChangeStatusRequest {
    action: String,
}

async fn change_status<S>(
    State(service): State<Arc<CastingService<S>>>,
    Path((event_id, participant_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    Json(payload): Json<ChangeStatusRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let participant =
        service.change_status(event_id, ParticipantId(participant_id), &payload.action)?;
    Ok(Json(json!({
        "success": true,
        "registration_status": participant.registration_status.label(),
    }))
    .into_response())
}

#[derive(Debug, Deserialize)]
struct LegacyAssignRequest {
    event_id: i64,
    role_id: i64,
    participant_id: i64,
}

/// Older board clients post the definitive assignment here, with the event id
/// in the body instead of the path.
async fn legacy_assign<S>(
    State(service): State<Arc<CastingService<S>>>,
    headers: HeaderMap,
    Json(payload): Json<LegacyAssignRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(payload.event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    service.assign(
        event_id,
        ProposalRef::Main,
        RoleId(payload.role_id),
        ParticipantId(payload.participant_id),
    )?;
    Ok(Json(json!({ "success": true })).into_response())
}

#[derive(Debug, Deserialize)]
struct LegacyUnassignRequest {
    event_id: i64,
    role_id: Option<i64>,
}

async fn legacy_unassign<S>(
    State(service): State<Arc<CastingService<S>>>,
    headers: HeaderMap,
    Json(payload): Json<LegacyUnassignRequest>,
) -> Result<Response, CastingError>
where
    S: TransactionalStore + 'static,
{
    let event_id = EventId(payload.event_id);
    service.ensure_organizer(event_id, current_user(&headers)?)?;
    let Some(role_id) = payload.role_id else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid request" })),
        )
            .into_response());
    };
    service.unassign(event_id, ProposalRef::Main, RoleId(role_id))?;
    Ok(Json(json!({ "success": true })).into_response())
}
