//! services/api/src/web/entries.rs
//!
//! Handlers for daily entries and the exams recorded in them.

use crate::error::{port_failure, HandlerError};
use crate::web::dto::{
    parse_day, EntryResponse, ExamPayload, SubmitEntryRequest, SubmitEntryResponse, TaskResponse,
    UpcomingExamResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use study_planner_core::EntryDraft;
use tracing::info;
use uuid::Uuid;

/// Save today's entry and generate today's schedule from it.
///
/// Saving again on the same day overwrites the entry; how the previously
/// generated tasks are treated depends on the configured regeneration policy.
#[utoipa::path(
    post,
    path = "/entries",
    request_body = SubmitEntryRequest,
    responses(
        (status = 201, description = "Entry saved and tasks generated", body = SubmitEntryResponse),
        (status = 400, description = "Invalid entry (e.g., negative hours or focus outside 1..=5)"),
        (status = 500, description = "The entry was saved but generation did not finish")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn submit_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<SubmitEntryRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let draft = EntryDraft::from(payload);
    let (entry, tasks) = state
        .planner
        .submit_entry(user_id, draft)
        .await
        .map_err(|e| port_failure("save entry", e))?;
    info!(
        "User {} saved entry {} with {} generated tasks",
        user_id,
        entry.date_id,
        tasks.len()
    );

    let today = entry.date_id;
    let response = SubmitEntryResponse {
        entry: entry.into(),
        tasks: tasks.into_iter().map(|t| TaskResponse::at(t, today)).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch the entry saved for a day.
#[utoipa::path(
    get,
    path = "/entries/{day}",
    responses(
        (status = 200, description = "The saved entry", body = EntryResponse),
        (status = 400, description = "Malformed day"),
        (status = 404, description = "No entry for that day")
    ),
    params(
        ("day" = String, Path, description = "Day in YYYY-MM-DD form"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(day): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let day = parse_day(&day)?;
    let entry = state
        .planner
        .get_entry(user_id, day)
        .await
        .map_err(|e| port_failure("load entry", e))?;
    Ok(Json(EntryResponse::from(entry)))
}

/// Exams due within the next two weeks across all saved entries, soonest first.
#[utoipa::path(
    get,
    path = "/exams/upcoming",
    responses((status = 200, description = "Upcoming exams", body = [UpcomingExamResponse])),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn upcoming_exams_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let exams = state
        .planner
        .upcoming_exams(user_id)
        .await
        .map_err(|e| port_failure("list upcoming exams", e))?;
    let body: Vec<UpcomingExamResponse> = exams.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Replace one exam of a saved entry.
#[utoipa::path(
    put,
    path = "/entries/{day}/exams/{index}",
    request_body = ExamPayload,
    responses(
        (status = 200, description = "The updated entry", body = EntryResponse),
        (status = 400, description = "Malformed day or invalid exam"),
        (status = 404, description = "Entry or exam not found")
    ),
    params(
        ("day" = String, Path, description = "Day of the entry in YYYY-MM-DD form"),
        ("index" = usize, Path, description = "Position of the exam in the entry"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_exam_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((day, index)): Path<(String, usize)>,
    Json(payload): Json<ExamPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let day = parse_day(&day)?;
    let entry = state
        .planner
        .update_exam(user_id, day, index, payload.into())
        .await
        .map_err(|e| port_failure("update exam", e))?;
    Ok(Json(EntryResponse::from(entry)))
}

/// Delete one exam of a saved entry.
#[utoipa::path(
    delete,
    path = "/entries/{day}/exams/{index}",
    responses(
        (status = 200, description = "The updated entry", body = EntryResponse),
        (status = 404, description = "Entry or exam not found")
    ),
    params(
        ("day" = String, Path, description = "Day of the entry in YYYY-MM-DD form"),
        ("index" = usize, Path, description = "Position of the exam in the entry"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_exam_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((day, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, HandlerError> {
    let day = parse_day(&day)?;
    let entry = state
        .planner
        .remove_exam(user_id, day, index)
        .await
        .map_err(|e| port_failure("remove exam", e))?;
    Ok(Json(EntryResponse::from(entry)))
}
