//! services/api/src/web/tasks.rs
//!
//! Handlers for schedule tasks: listing, completion, late tasks and pulling.

use crate::error::{port_failure, HandlerError};
use crate::web::dto::{
    parse_day, CompletionRequest, DayBoardResponse, LateTaskResponse, TaskResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use study_planner_core::TaskRef;
use tracing::info;
use uuid::Uuid;

/// Today's tasks merged with every late task, split into pending and completed.
#[utoipa::path(
    get,
    path = "/schedule/today",
    responses((status = 200, description = "Today's board", body = DayBoardResponse)),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn today_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let board = state
        .planner
        .day_board(user_id)
        .await
        .map_err(|e| port_failure("load today's schedule", e))?;
    Ok(Json(DayBoardResponse::from(board)))
}

/// Unfinished tasks from earlier days.
#[utoipa::path(
    get,
    path = "/schedule/late",
    responses((status = 200, description = "Late tasks", body = [TaskResponse])),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn late_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let today = state.planner.calendar().today_id();
    let late = state
        .planner
        .list_late_tasks(user_id, today)
        .await
        .map_err(|e| port_failure("list late tasks", e))?;
    let body: Vec<TaskResponse> = late.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Tasks stored under one day, in creation order.
#[utoipa::path(
    get,
    path = "/schedule/{day}",
    responses(
        (status = 200, description = "Tasks of the day", body = [TaskResponse]),
        (status = 400, description = "Malformed day")
    ),
    params(
        ("day" = String, Path, description = "Day in YYYY-MM-DD form"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn day_tasks_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(day): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let day = parse_day(&day)?;
    let today = state.planner.calendar().today_id();
    let tasks = state
        .planner
        .list_tasks_for_day(user_id, day)
        .await
        .map_err(|e| port_failure("list tasks", e))?;
    let body: Vec<TaskResponse> = tasks
        .into_iter()
        .map(|t| TaskResponse::at(t, today))
        .collect();
    Ok(Json(body))
}

/// Mark a task completed (optionally with pages done) or pending again.
#[utoipa::path(
    put,
    path = "/tasks/{day}/{id}/completion",
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "The updated task", body = TaskResponse),
        (status = 404, description = "Task not found")
    ),
    params(
        ("day" = String, Path, description = "Day the task is stored under"),
        ("id" = Uuid, Path, description = "Task id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn completion_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((day, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<CompletionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let reference = TaskRef::new(parse_day(&day)?, task_id);
    let task = state
        .planner
        .set_completed(
            user_id,
            reference,
            payload.completed,
            payload.completed_pages,
        )
        .await
        .map_err(|e| port_failure("update task status", e))?;
    let today = state.planner.calendar().today_id();
    Ok(Json(TaskResponse::at(task, today)))
}

/// Copy a task from an earlier day into today's schedule.
#[utoipa::path(
    post,
    path = "/tasks/{day}/{id}/pull",
    responses(
        (status = 201, description = "The copy created for today", body = TaskResponse),
        (status = 400, description = "The task is not from an earlier day, is completed, or was already pulled"),
        (status = 404, description = "Task not found")
    ),
    params(
        ("day" = String, Path, description = "Day the task is stored under"),
        ("id" = Uuid, Path, description = "Task id"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn pull_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path((day, task_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, HandlerError> {
    let origin = TaskRef::new(parse_day(&day)?, task_id);
    let copy = state
        .planner
        .pull_to_today(user_id, origin)
        .await
        .map_err(|e| port_failure("pull task", e))?;
    info!("User {} pulled task {} from {} into today", user_id, task_id, day);
    let today = state.planner.calendar().today_id();
    Ok((StatusCode::CREATED, Json(TaskResponse::at(copy, today))))
}

/// Record a parked late task for each late task that has none yet.
#[utoipa::path(
    post,
    path = "/late/park",
    responses((status = 200, description = "Records created by this call", body = [LateTaskResponse])),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn park_late_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let parked = state
        .planner
        .park_late_tasks(user_id)
        .await
        .map_err(|e| port_failure("park late tasks", e))?;
    let body: Vec<LateTaskResponse> = parked.into_iter().map(Into::into).collect();
    Ok(Json(body))
}
