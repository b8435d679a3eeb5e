use std::sync::Arc;

use api_lib::config::Config;
use api_lib::web::{api_router, middleware::USER_ID_HEADER, state::AppState};
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use study_planner_core::{FixedClock, InMemoryStore, StudyCalendar, StudyStore};
use tower::ServiceExt;
use uuid::Uuid;

/// The application under test plus handles to steer it.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<FixedClock>,
    pub store: Arc<InMemoryStore>,
    pub state: Arc<AppState>,
    pub user: Uuid,
}

impl TestApp {
    /// Moves the planner clock forward by whole days.
    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }
}

/// Build the application router over an in-memory store.
///
/// The clock starts at 2024-03-10 09:00 in Muscat (a Sunday) and only moves
/// when a test advances it.
pub fn build_test_app() -> TestApp {
    let start = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
    let clock = Arc::new(FixedClock::new(start));
    let store = Arc::new(InMemoryStore::new());
    let config = Arc::new(Config::default());
    let calendar = StudyCalendar::new(config.timezone, clock.clone());
    let db: Arc<dyn StudyStore> = store.clone();
    let state = Arc::new(AppState::new(db, config, calendar));

    TestApp {
        router: api_router(state.clone()),
        clock,
        store,
        state,
        user: Uuid::new_v4(),
    }
}

pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response {
    let user = app.user.to_string();
    send(app, Method::GET, uri, Some(&user), None).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response {
    let user = app.user.to_string();
    send(app, Method::POST, uri, Some(&user), Some(body)).await
}

pub async fn post_empty(app: &TestApp, uri: &str) -> Response {
    let user = app.user.to_string();
    send(app, Method::POST, uri, Some(&user), None).await
}

pub async fn put_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response {
    let user = app.user.to_string();
    send(app, Method::PUT, uri, Some(&user), Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response {
    let user = app.user.to_string();
    send(app, Method::DELETE, uri, Some(&user), None).await
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
