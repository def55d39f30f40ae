//! REST API module.
//!
//! Exposes the reconciled channel list, the org tree and the analytics view to
//! the console UI. Every handler runs inside the caller's session.

mod analytics;
mod channels;
mod org_tree;
mod session;

pub use analytics::*;
pub use channels::*;
pub use org_tree::*;
pub use session::*;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::bearer_token;
use crate::errors::ConsoleError;
use crate::session::Session;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, ConsoleError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// The caller's session, attached to the request by [`session_layer`].
#[derive(Clone)]
pub struct SessionHandle {
    pub token: String,
    pub session: Arc<Session>,
}

/// Create an error API response. Unauthorized also ends the session so the
/// next request starts from sign-in.
pub async fn error<T: Serialize>(
    state: &AppState,
    handle: &SessionHandle,
    err: ConsoleError,
) -> ApiResult<T> {
    if matches!(err, ConsoleError::Unauthorized(_)) {
        state.sessions.evict(&handle.token).await;
    }
    Err(err)
}

/// Resolve the bearer token to a session, opening one on first use.
pub async fn session_layer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return ConsoleError::Unauthorized("Missing bearer token".to_string()).into_response();
    };

    match state.sessions.resolve(&token).await {
        Ok(session) => {
            request
                .extensions_mut()
                .insert(SessionHandle { token, session });
            next.run(request).await
        }
        Err(err) => {
            if !matches!(err, ConsoleError::Unauthorized(_)) {
                tracing::warn!(error = %err, "Could not open session");
            }
            err.into_response()
        }
    }
}
