//! HTTP transport: axum routes over the catalog and roster services.
//!
//! Requires the `http` feature.
//!
//! ## Routes
//!
//! - `GET /health`
//! - `GET|POST /api/{courses,events,groups,users}`: list, create
//! - `GET /api/{courses,events,groups,users}/:id`
//! - `POST|DELETE /api/courses/enroll`: body `{ courseId, userId }`
//! - `POST|DELETE /api/events/register`: body `{ eventId, userId }`
//! - `POST|DELETE /api/groups/join`: body `{ groupId, userId }`
//! - `POST /api/{courses,events,groups}/reconcile`: body `{ <parent>Id }`
//! - `GET /api/users/:id/{courses,events,groups}`
//!
//! Errors come back as `{ "error": "<message>" }`: 400 for bad input and
//! membership conflicts, 404 for unknown records, 500 otherwise.
//!
//! ## Example
//!
//! ```ignore
//! use campus_hub::{http, InMemoryModelStore};
//!
//! let app = http::router(http::AppState::shared(InMemoryModelStore::new()));
//! // or
//! http::serve(InMemoryModelStore::new(), "0.0.0.0:3000", std::future::pending()).await?;
//! ```

mod catalog;
mod roster;

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::catalog::{Catalog, CourseDraft, EventDraft, GroupDraft, UserDraft};
use crate::entities::{Course, Event, Group, User};
use crate::error::HubError;
use crate::model::ModelStore;
use crate::roster::{Enrollment, GroupMembership, Registration, RosterService};

use self::catalog::{create_handler, get_handler, list_handler};
use self::roster::{join_handler, leave_handler, memberships_handler, reconcile_handler};

/// Services shared by every request.
pub struct AppState<S> {
    pub catalog: Catalog<S>,
    pub roster: RosterService<S>,
}

impl<S: ModelStore + Clone> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            roster: RosterService::new(store),
        }
    }

    pub fn shared(store: S) -> Arc<Self> {
        Arc::new(Self::new(store))
    }
}

/// Build the application router.
pub fn router<S: ModelStore + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/courses",
            get(list_handler::<S, Course>).post(create_handler::<S, CourseDraft>),
        )
        .route(
            "/api/courses/enroll",
            post(join_handler::<S, Enrollment>).delete(leave_handler::<S, Enrollment>),
        )
        .route("/api/courses/reconcile", post(reconcile_handler::<S, Enrollment>))
        .route("/api/courses/:id", get(get_handler::<S, Course>))
        .route(
            "/api/events",
            get(list_handler::<S, Event>).post(create_handler::<S, EventDraft>),
        )
        .route(
            "/api/events/register",
            post(join_handler::<S, Registration>).delete(leave_handler::<S, Registration>),
        )
        .route("/api/events/reconcile", post(reconcile_handler::<S, Registration>))
        .route("/api/events/:id", get(get_handler::<S, Event>))
        .route(
            "/api/groups",
            get(list_handler::<S, Group>).post(create_handler::<S, GroupDraft>),
        )
        .route(
            "/api/groups/join",
            post(join_handler::<S, GroupMembership>).delete(leave_handler::<S, GroupMembership>),
        )
        .route("/api/groups/reconcile", post(reconcile_handler::<S, GroupMembership>))
        .route("/api/groups/:id", get(get_handler::<S, Group>))
        .route(
            "/api/users",
            get(list_handler::<S, User>).post(create_handler::<S, UserDraft>),
        )
        .route("/api/users/:id", get(get_handler::<S, User>))
        .route("/api/users/:id/courses", get(memberships_handler::<S, Enrollment>))
        .route("/api/users/:id/events", get(memberships_handler::<S, Registration>))
        .route("/api/users/:id/groups", get(memberships_handler::<S, GroupMembership>))
        .with_state(state)
}

/// Serve over HTTP at `addr` until `shutdown` resolves.
pub async fn serve<S, F>(store: S, addr: &str, shutdown: F) -> Result<(), std::io::Error>
where
    S: ModelStore + Clone + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(AppState::shared(store));
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// `GET /health`: returns `{ "ok": true }`.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self {
            HubError::Internal(detail) => {
                error!(error = %detail, "request failed");
                "Internal server error".to_string()
            }
            other => {
                debug!(status = status.as_u16(), error = %other, "request rejected");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Parse a request body as JSON. An empty body reads as `{}`.
fn parse_body(body: &Bytes) -> Result<Value, HubError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body)
        .map_err(|_| HubError::Validation("request body must be valid JSON".into()))
}

/// Run a blocking store operation off the async workers.
async fn blocking<T, F>(task: F) -> Result<T, HubError>
where
    F: FnOnce() -> Result<T, HubError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| HubError::Internal(format!("blocking task failed: {}", e)))?
}
