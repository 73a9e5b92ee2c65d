//! culina-api - HTTP surface for launching and monitoring re-embedding jobs.
//!
//! The router is built against trait objects (`CheckpointRepository`,
//! `JobLauncher` over any backend), so tests drive it with the in-memory
//! store and the scripted mock backend while the binary wires Postgres and
//! the real embedding service.

pub mod auth;
pub mod config;
pub mod handlers;

use std::sync::Arc;

use axum::http::Request;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use culina_core::CheckpointRepository;
use culina_jobs::JobLauncher;

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// correlating a launch request with the job log lines it produced.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CheckpointRepository>,
    pub launcher: Arc<JobLauncher>,
    pub admin_token: String,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/reembed", post(handlers::reembed::launch_reembed))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .merge(admin_routes)
        .route("/api/reembed/jobs", get(handlers::reembed::list_reembed_jobs))
        .route(
            "/api/reembed/jobs/:job_id",
            get(handlers::reembed::get_reembed_job),
        )
        .route("/health", get(handlers::reembed::health))
        .with_state(state)
}
