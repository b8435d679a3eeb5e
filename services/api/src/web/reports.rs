//! services/api/src/web/reports.rs
//!
//! Achievement reports and plain-text exports.

use crate::error::{port_failure, HandlerError};
use crate::web::dto::{RangeQuery, ReportResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use study_planner_core::ReportRange;
use uuid::Uuid;

fn parse_range(query: &RangeQuery) -> Result<ReportRange, HandlerError> {
    match query.range.as_deref() {
        None => Ok(ReportRange::Day),
        Some(raw) => raw
            .trim()
            .to_ascii_lowercase()
            .parse::<ReportRange>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e)),
    }
}

fn plain_text(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

/// Tasks of the requested window with completion totals.
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Achievement report", body = ReportResponse),
        (status = 400, description = "Unknown range")
    ),
    params(
        ("range" = Option<String>, Query, description = "day, week or month (default day)"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn achievements_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let range = parse_range(&query)?;
    let report = state
        .planner
        .report(user_id, range)
        .await
        .map_err(|e| port_failure("build achievement report", e))?;
    let today = state.planner.calendar().today_id();
    Ok(Json(ReportResponse::new(report, today)))
}

/// Today's schedule as a plain-text table.
#[utoipa::path(
    get,
    path = "/export/schedule",
    responses((status = 200, description = "Schedule table", body = String, content_type = "text/plain")),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn export_schedule_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let text = state
        .planner
        .export_schedule(user_id)
        .await
        .map_err(|e| port_failure("export schedule", e))?;
    Ok(plain_text(text))
}

/// The achievement log of a window as a plain-text table.
#[utoipa::path(
    get,
    path = "/export/achievements",
    responses(
        (status = 200, description = "Achievement table", body = String, content_type = "text/plain"),
        (status = 400, description = "Unknown range")
    ),
    params(
        ("range" = Option<String>, Query, description = "day, week or month (default day)"),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn export_achievements_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let range = parse_range(&query)?;
    let text = state
        .planner
        .export_achievements(user_id, range)
        .await
        .map_err(|e| port_failure("export achievements", e))?;
    Ok(plain_text(text))
}
