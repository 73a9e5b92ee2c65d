//! Operator authentication for privileged routes.
//!
//! Launching a re-embedding job is an operator action: the middleware rejects
//! unauthenticated and under-privileged callers before request validation
//! ever runs. A missing or malformed credential is 401; a present but wrong
//! one is 403.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use culina_core::Error;

use crate::handlers::ApiError;
use crate::AppState;

/// Require the operator bearer token on the wrapped routes.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        None => ApiError(Error::Unauthorized("missing bearer token".into())).into_response(),
        Some(t) if t != state.admin_token => {
            ApiError(Error::Forbidden("admin role required".into())).into_response()
        }
        Some(_) => next.run(request).await,
    }
}
