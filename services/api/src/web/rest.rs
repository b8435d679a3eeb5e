//! services/api/src/web/rest.rs
//!
//! Assembles the REST API router and the master OpenAPI document.

use crate::web::{
    dto::*, entries::*, middleware::require_user, reports::*, state::AppState, subjects::*,
    tasks::*,
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_subjects_handler,
        create_subject_handler,
        update_subject_handler,
        delete_subject_handler,
        submit_entry_handler,
        get_entry_handler,
        upcoming_exams_handler,
        update_exam_handler,
        delete_exam_handler,
        today_handler,
        late_handler,
        day_tasks_handler,
        completion_handler,
        pull_handler,
        park_late_handler,
        achievements_handler,
        export_schedule_handler,
        export_achievements_handler,
        repair_handler,
    ),
    components(
        schemas(
            CreateSubjectRequest,
            UpdateSubjectRequest,
            SubjectResponse,
            StudyInputPayload,
            ExamPayload,
            ReviewTypePayload,
            NotificationsPayload,
            SubmitEntryRequest,
            EntryResponse,
            UpcomingExamResponse,
            TaskRefPayload,
            TaskResponse,
            SubmitEntryResponse,
            DayBoardResponse,
            CompletionRequest,
            LateTaskResponse,
            ReportResponse,
            RepairResponse,
        )
    ),
    tags(
        (name = "Study Planner API", description = "Daily entries, generated review schedules and achievement reports.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds every API route behind the `x-user-id` middleware.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/subjects",
            get(list_subjects_handler).post(create_subject_handler),
        )
        .route(
            "/subjects/{id}",
            put(update_subject_handler).delete(delete_subject_handler),
        )
        .route("/entries", post(submit_entry_handler))
        .route("/entries/{day}", get(get_entry_handler))
        .route(
            "/entries/{day}/exams/{index}",
            put(update_exam_handler).delete(delete_exam_handler),
        )
        .route("/exams/upcoming", get(upcoming_exams_handler))
        .route("/schedule/today", get(today_handler))
        .route("/schedule/late", get(late_handler))
        .route("/schedule/{day}", get(day_tasks_handler))
        .route("/tasks/{day}/{id}/completion", put(completion_handler))
        .route("/tasks/{day}/{id}/pull", post(pull_handler))
        .route("/late/park", post(park_late_handler))
        .route("/achievements", get(achievements_handler))
        .route("/export/schedule", get(export_schedule_handler))
        .route("/export/achievements", get(export_achievements_handler))
        .route("/repair", post(repair_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ))
        .with_state(state)
}
