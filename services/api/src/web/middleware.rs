//! services/api/src/web/middleware.rs
//!
//! Anonymous identity middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::web::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that reads the per-device user id and registers the user.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// A missing or malformed header is a 400. When enabled, the repair pass runs
/// on each request of a user until it has succeeded once in this process; a
/// failure is logged and does not block the request.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // 1. Extract the identity header
    let user_id_str = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-user-id header is required".to_string(),
            )
        })?;

    let user_id = Uuid::parse_str(user_id_str.trim()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid x-user-id format".to_string(),
        )
    })?;

    // 2. Make sure the user exists in the store
    state.db.get_or_create_user(user_id).await.map_err(|e| {
        error!("Failed to register user {}: {:?}", user_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to register user".to_string(),
        )
    })?;

    // 3. Opportunistic repair, until it succeeds once for this user
    if state.config.repair_on_startup {
        let repaired = state.repaired_users.lock().await.contains(&user_id);
        if !repaired {
            match state.planner.repair_user_data(user_id).await {
                Ok(_) => {
                    state.repaired_users.lock().await.insert(user_id);
                }
                Err(e) => warn!("Repair pass for user {} failed: {}", user_id, e),
            }
        }
    }

    // 4. Insert user_id into request extensions
    req.extensions_mut().insert(user_id);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
