//! Analytics endpoints.

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;

use super::{error, success, ApiResult, SessionHandle};
use crate::analytics::FetchOutcome;
use crate::errors::ConsoleError;
use crate::models::{AnalyticsQueryKey, AnalyticsView};
use crate::AppState;

/// Outcome of a fetch with the resulting view.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub outcome: FetchOutcome,
    pub view: AnalyticsView,
}

/// GET /api/analytics - Current report state.
pub async fn get_analytics(Extension(handle): Extension<SessionHandle>) -> ApiResult<AnalyticsView> {
    success(handle.session.analytics.view().await)
}

/// PUT /api/analytics - Select entity and date range.
pub async fn set_analytics_key(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
    Json(key): Json<AnalyticsQueryKey>,
) -> ApiResult<AnalyticsResponse> {
    match handle.session.analytics.set_key(key).await {
        Ok(outcome) => respond(&state, &handle, outcome).await,
        Err(e) => error(&state, &handle, e).await,
    }
}

/// POST /api/analytics/retry - Reissue the current request.
pub async fn retry_analytics(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
) -> ApiResult<AnalyticsResponse> {
    let outcome = handle.session.analytics.retry().await;
    respond(&state, &handle, outcome).await
}

async fn respond(
    state: &AppState,
    handle: &SessionHandle,
    outcome: FetchOutcome,
) -> ApiResult<AnalyticsResponse> {
    if outcome == FetchOutcome::SignInRequired {
        return error(
            state,
            handle,
            ConsoleError::Unauthorized("Upstream rejected the session credential".to_string()),
        )
        .await;
    }

    success(AnalyticsResponse {
        outcome,
        view: handle.session.analytics.view().await,
    })
}
