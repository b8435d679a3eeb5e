//! services/api/src/web/subjects.rs
//!
//! Handlers for the subject registry and the maintenance pass.

use crate::error::{port_failure, HandlerError};
use crate::web::dto::{CreateSubjectRequest, RepairResponse, SubjectResponse, UpdateSubjectRequest};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// List the user's subjects.
#[utoipa::path(
    get,
    path = "/subjects",
    responses(
        (status = 200, description = "All subjects of the user", body = [SubjectResponse]),
        (status = 400, description = "Missing or invalid x-user-id header")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn list_subjects_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let subjects = state
        .planner
        .list_subjects(user_id)
        .await
        .map_err(|e| port_failure("list subjects", e))?;
    let body: Vec<SubjectResponse> = subjects.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Add a subject. Names are trimmed and must be unique per user.
#[utoipa::path(
    post,
    path = "/subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 400, description = "Blank or duplicate name")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn create_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let subject = state
        .planner
        .add_subject(user_id, &payload.name)
        .await
        .map_err(|e| port_failure("add subject", e))?;
    info!("User {} added subject {}", user_id, subject.id);
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(subject))))
}

/// Rename a subject and/or toggle whether it is active.
#[utoipa::path(
    put,
    path = "/subjects/{id}",
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = SubjectResponse),
        (status = 400, description = "Blank or duplicate name, or nothing to update"),
        (status = 404, description = "Subject not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Subject id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if payload.name.is_none() && payload.active.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Provide a name or an active flag".to_string(),
        ));
    }

    let mut updated = None;
    if let Some(name) = payload.name.as_deref() {
        updated = Some(
            state
                .planner
                .rename_subject(user_id, subject_id, name)
                .await
                .map_err(|e| port_failure("rename subject", e))?,
        );
    }
    if let Some(active) = payload.active {
        updated = Some(
            state
                .planner
                .set_subject_active(user_id, subject_id, active)
                .await
                .map_err(|e| port_failure("update subject", e))?,
        );
    }

    let subject = updated.ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to update subject".to_string(),
        )
    })?;
    Ok(Json(SubjectResponse::from(subject)))
}

/// Delete a subject. Tasks keep their copied subject name.
#[utoipa::path(
    delete,
    path = "/subjects/{id}",
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 404, description = "Subject not found")
    ),
    params(
        ("id" = Uuid, Path, description = "Subject id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_subject_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(subject_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    state
        .planner
        .remove_subject(user_id, subject_id)
        .await
        .map_err(|e| port_failure("remove subject", e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the data repair pass for the user on demand.
#[utoipa::path(
    post,
    path = "/repair",
    responses((status = 200, description = "What the pass changed", body = RepairResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn repair_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = state
        .planner
        .repair_user_data(user_id)
        .await
        .map_err(|e| port_failure("repair user data", e))?;
    Ok(Json(RepairResponse::from(report)))
}
