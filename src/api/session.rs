//! Session endpoints.

use axum::extract::{Extension, State};

use super::{success, ApiResult, SessionHandle};
use crate::models::Viewer;
use crate::AppState;

/// GET /api/session - The signed-in viewer.
pub async fn get_session(Extension(handle): Extension<SessionHandle>) -> ApiResult<Viewer> {
    success(handle.session.viewer.clone())
}

/// DELETE /api/session - Sign out and tear the session down.
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
) -> ApiResult<()> {
    state.sessions.evict(&handle.token).await;
    success(())
}
