//! reqwest implementation of the upstream fetch contracts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{ChannelScope, ConsoleApi};
use crate::auth::CredentialProvider;
use crate::errors::ConsoleError;
use crate::models::{
    Branch, ChannelRecord, DateRange, ExternalChannelRecord, Team, TeamDetail, Viewer,
};

/// Upstream responses come either bare or wrapped in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

/// HTTP client for the upstream console backend.
#[derive(Clone)]
pub struct HttpConsoleApi {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpConsoleApi {
    pub fn new(client: Client, base_url: &str, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Build the shared reqwest client.
    pub fn build_client(timeout: Duration) -> Result<Client, ConsoleError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to build HTTP client: {}", e)))
    }

    /// Upstream URL for `segments`. Each segment is percent-encoded, so an id
    /// can never add path components or a query.
    fn url(&self, segments: &[&str]) -> Result<Url, ConsoleError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ConsoleError::Config(format!("Invalid upstream URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Config("Upstream URL cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ConsoleError> {
        let url = self.url(segments)?;
        let request = self.authorized(self.client.get(url.clone()).query(query)).await;
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(status_error(status, url.path()));
        }

        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.into_inner())
    }
}

/// Map a non-success upstream status to the error taxonomy.
fn status_error(status: StatusCode, path: &str) -> ConsoleError {
    match status {
        StatusCode::UNAUTHORIZED => {
            ConsoleError::Unauthorized(format!("Upstream rejected credentials for {}", path))
        }
        StatusCode::NOT_FOUND => ConsoleError::NotFound(format!("{} not found", path)),
        other => {
            tracing::warn!(path, status = other.as_u16(), "Upstream request failed");
            ConsoleError::Transient(format!("Upstream answered {} for {}", other, path))
        }
    }
}

#[async_trait]
impl ConsoleApi for HttpConsoleApi {
    async fn current_user(&self) -> Result<Viewer, ConsoleError> {
        self.get_json(&["auth", "me"], &[]).await
    }

    async fn list_channels(&self, scope: &ChannelScope) -> Result<Vec<ChannelRecord>, ConsoleError> {
        self.get_json(&["channels"], &scope.query()).await
    }

    async fn list_connected_account_channels(
        &self,
    ) -> Result<Vec<ExternalChannelRecord>, ConsoleError> {
        if self.credentials.bearer().await.is_none() {
            tracing::debug!("No credential, skipping connected account channels");
            return Ok(Vec::new());
        }
        self.get_json(&["youtube", "channels"], &[]).await
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, ConsoleError> {
        self.get_json(&["branches"], &[]).await
    }

    async fn list_teams_for_branch(&self, branch_id: &str) -> Result<Vec<Team>, ConsoleError> {
        self.get_json(&["branches", branch_id, "teams"], &[]).await
    }

    async fn get_team_detail(&self, team_id: &str) -> Result<TeamDetail, ConsoleError> {
        self.get_json(&["teams", team_id], &[]).await
    }

    async fn get_analytics(
        &self,
        entity_id: &str,
        range: &DateRange,
    ) -> Result<serde_json::Value, ConsoleError> {
        let start = range.start_date.format("%Y-%m-%d").to_string();
        let end = range.end_date.format("%Y-%m-%d").to_string();
        self.get_json(
            &["analytics", entity_id],
            &[("startDate", start.as_str()), ("endDate", end.as_str())],
        )
        .await
    }
}
