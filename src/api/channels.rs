//! Channel list endpoint.

use axum::extract::{Extension, State};

use super::{error, success, ApiResult, SessionHandle};
use crate::channels::ChannelBoard;
use crate::AppState;

/// GET /api/channels - Reconciled channels in the viewer's scope.
pub async fn list_channels(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
) -> ApiResult<ChannelBoard> {
    match handle.session.channel_board().await {
        Ok(board) => success(board),
        Err(e) => error(&state, &handle, e).await,
    }
}
