//! HTTP server for the workflow engine.
//!
//! # Endpoints
//!
//! - `POST /api/v1/projects/{project}/phases/{phase}/start` - Start a phase
//! - `POST /api/v1/projects/{project}/phases/{phase}/approve` - Approve a phase
//! - `POST /api/v1/projects/{project}/phases/{phase}/criteria` - Add a
//!   manual entry criterion
//! - `POST /api/v1/criteria/{id}/toggle` - Flip an entry criterion
//! - `DELETE /api/v1/criteria/{id}` - Remove an entry criterion
//! - `POST /api/v1/projects/{project}/phases/{phase}/recalculate` - Move an
//!   end date and cascade the shift through dependents
//! - `GET /health` - Liveness probe
//!
//! All failures return JSON `{"code", "message"}` bodies; the code values
//! are stable and documented on [`crate::service::ServiceError::code`].

use std::sync::Arc;

use crate::service::ProjectService;
use crate::store::InMemoryStore;

pub mod error;
pub mod health;
pub mod schedule;
pub mod workflow;

pub use error::ApiError;
pub use health::health_handler;
pub use schedule::recalculate_handler;
pub use workflow::{
    add_criterion_handler, approve_handler, delete_criterion_handler, start_handler,
    toggle_handler,
};

/// Shared application state, passed to handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<ProjectService<InMemoryStore>>,
}

impl AppState {
    pub fn new(service: ProjectService<InMemoryStore>) -> Self {
        AppState {
            inner: Arc::new(service),
        }
    }

    pub fn service(&self) -> &ProjectService<InMemoryStore> {
        &self.inner
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{delete, get, post};

    axum::Router::new()
        .route(
            "/api/v1/projects/{project}/phases/{phase}/start",
            post(start_handler),
        )
        .route(
            "/api/v1/projects/{project}/phases/{phase}/approve",
            post(approve_handler),
        )
        .route(
            "/api/v1/projects/{project}/phases/{phase}/criteria",
            post(add_criterion_handler),
        )
        .route("/api/v1/criteria/{id}/toggle", post(toggle_handler))
        .route("/api/v1/criteria/{id}", delete(delete_criterion_handler))
        .route(
            "/api/v1/projects/{project}/phases/{phase}/recalculate",
            post(recalculate_handler),
        )
        .route("/health", get(health_handler))
        .with_state(app_state)
}
