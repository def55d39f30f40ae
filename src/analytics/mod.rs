//! Dashboard report fetching keyed by `{entityId, startDate, endDate}`.
//!
//! Every request is stamped with a generation number when it is issued. Its
//! response is applied only if no newer request has been issued since, so a
//! slow response for an old range can never replace the report for the range
//! now selected.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::auth::CredentialProvider;
use crate::client::ConsoleApi;
use crate::errors::ConsoleError;
use crate::models::{AnalyticsQueryKey, AnalyticsView, ReportError};

/// What happened to one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Report applied to the view
    Applied,
    /// Upstream had nothing for the range; view shows the empty state
    NoData,
    /// Retryable failure; previous report kept
    Failed,
    /// A newer request superseded this one
    Discarded,
    /// Credentials rejected; session must be reset
    SignInRequired,
    /// Key unchanged, or no entity yet
    Skipped,
}

#[derive(Default)]
struct FetchState {
    generation: u64,
    closed: bool,
    view: AnalyticsView,
}

impl FetchState {
    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.view.loading = true;
        self.generation
    }
}

/// Ranged report fetcher for one consumer.
pub struct RangedAnalyticsFetcher {
    api: Arc<dyn ConsoleApi>,
    credentials: Arc<dyn CredentialProvider>,
    state: Mutex<FetchState>,
}

impl RangedAnalyticsFetcher {
    pub fn new(api: Arc<dyn ConsoleApi>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            api,
            credentials,
            state: Mutex::new(FetchState::default()),
        }
    }

    /// Select a new key. Fetches when the entity is known and the key differs
    /// from the current one. No debounce: rapid changes overlap, and only the
    /// newest response is applied.
    pub async fn set_key(&self, key: AnalyticsQueryKey) -> Result<FetchOutcome, ConsoleError> {
        key.validate()?;

        let generation = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Ok(FetchOutcome::Skipped);
            }
            if state.view.key.as_ref() == Some(&key) {
                return Ok(FetchOutcome::Skipped);
            }
            state.view.key = Some(key.clone());
            if !key.is_ready() {
                // Nothing to fetch yet; any older request is superseded
                state.generation += 1;
                state.view.loading = false;
                state.view.data = None;
                state.view.error = None;
                return Ok(FetchOutcome::Skipped);
            }
            state.begin()
        };

        Ok(self.run(generation, key).await)
    }

    /// Reissue the current key. The user's manual retry after a failure.
    pub async fn retry(&self) -> FetchOutcome {
        let (generation, key) = {
            let mut state = self.state.lock().await;
            let key = match state.view.key.clone() {
                Some(key) if key.is_ready() && !state.closed => key,
                _ => return FetchOutcome::Skipped,
            };
            (state.begin(), key)
        };

        self.run(generation, key).await
    }

    pub async fn view(&self) -> AnalyticsView {
        self.state.lock().await.view.clone()
    }

    /// Stop applying results; in-flight responses are discarded on arrival.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        state.closed = true;
        state.generation += 1;
        state.view.loading = false;
    }

    async fn run(&self, generation: u64, key: AnalyticsQueryKey) -> FetchOutcome {
        tracing::debug!(entity_id = %key.entity_id, start = %key.start_date, end = %key.end_date, generation, "Fetching analytics");
        let result = self.api.get_analytics(&key.entity_id, &key.range()).await;

        if let Err(ConsoleError::Unauthorized(msg)) = &result {
            tracing::warn!(entity_id = %key.entity_id, "Analytics rejected credentials: {}", msg);
            self.credentials.clear().await;
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.view.loading = false;
            state.view.sign_in_required = true;
            return FetchOutcome::SignInRequired;
        }

        let mut state = self.state.lock().await;
        if state.closed || state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "Discarding superseded analytics response"
            );
            return FetchOutcome::Discarded;
        }

        state.view.loading = false;
        match result {
            Ok(data) => {
                state.view.data = Some(data);
                state.view.error = None;
                FetchOutcome::Applied
            }
            Err(ConsoleError::NotFound(_)) => {
                state.view.data = None;
                state.view.error = None;
                FetchOutcome::NoData
            }
            Err(err) => {
                tracing::warn!(entity_id = %key.entity_id, error = %err, "Analytics fetch failed");
                state.view.error = Some(ReportError::from(&err));
                FetchOutcome::Failed
            }
        }
    }
}
