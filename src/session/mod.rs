//! Per-consumer console sessions.
//!
//! A session is keyed by the bearer token the UI presents. It owns the
//! credential used upstream, the viewer's identity, the org tree loader and the
//! analytics fetcher. Sessions live until the UI signs out or upstream rejects
//! the credential.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::analytics::RangedAnalyticsFetcher;
use crate::auth::{CredentialProvider, SessionCredentials};
use crate::channels::{load_channel_board, ChannelBoard};
use crate::client::{ChannelScope, ConsoleApi, HttpConsoleApi};
use crate::config::{Config, TreeStrategy};
use crate::errors::ConsoleError;
use crate::models::Viewer;
use crate::org_tree::OrgTreeLoader;

/// State held for one signed-in console user.
pub struct Session {
    pub viewer: Viewer,
    pub tree: OrgTreeLoader,
    pub analytics: RangedAnalyticsFetcher,
    api: Arc<dyn ConsoleApi>,
    credentials: Arc<SessionCredentials>,
}

impl Session {
    /// Identify the viewer and load the initial tree.
    ///
    /// Only an Unauthorized failure prevents the session from opening; a tree
    /// that fails to load can be reloaded later.
    pub async fn open(
        api: Arc<dyn ConsoleApi>,
        credentials: Arc<SessionCredentials>,
        strategy: TreeStrategy,
    ) -> Result<Self, ConsoleError> {
        let viewer = api.current_user().await?;
        let tree = OrgTreeLoader::new(api.clone(), &viewer, strategy);

        match tree.load().await {
            Ok(()) => {}
            Err(err @ ConsoleError::Unauthorized(_)) => return Err(err),
            Err(err) => tracing::warn!(viewer = %viewer.id, error = %err, "Initial org tree load failed"),
        }

        let analytics = RangedAnalyticsFetcher::new(api.clone(), credentials.clone());

        Ok(Self {
            viewer,
            tree,
            analytics,
            api,
            credentials,
        })
    }

    /// Channels in the viewer's scope, reconciled with the live feed.
    pub async fn channel_board(&self) -> Result<ChannelBoard, ConsoleError> {
        load_channel_board(self.api.as_ref(), &ChannelScope::for_viewer(&self.viewer)).await
    }

    /// Tear down: late results are discarded and the credential forgotten.
    pub async fn close(&self) {
        self.tree.shutdown().await;
        self.analytics.shutdown().await;
        self.credentials.clear().await;
    }
}

/// All open sessions, keyed by bearer token.
pub struct SessionRegistry {
    client: reqwest::Client,
    upstream_url: String,
    strategy: TreeStrategy,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(config: &Config) -> Result<Self, ConsoleError> {
        Ok(Self {
            client: HttpConsoleApi::build_client(config.request_timeout)?,
            upstream_url: config.upstream_url.clone(),
            strategy: config.tree_strategy,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Existing session for `token`, or a freshly opened one.
    pub async fn resolve(&self, token: &str) -> Result<Arc<Session>, ConsoleError> {
        if let Some(session) = self.sessions.read().await.get(token) {
            return Ok(session.clone());
        }

        let credentials = Arc::new(SessionCredentials::new(token));
        let api: Arc<dyn ConsoleApi> = Arc::new(HttpConsoleApi::new(
            self.client.clone(),
            &self.upstream_url,
            credentials.clone(),
        ));
        let session = Arc::new(Session::open(api, credentials, self.strategy).await?);

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(token).cloned() {
            // Opened concurrently by another request; keep the first one
            drop(sessions);
            session.close().await;
            return Ok(existing);
        }
        sessions.insert(token.to_string(), session.clone());
        tracing::info!(
            viewer = %session.viewer.id,
            role = session.viewer.role.as_str(),
            open_sessions = sessions.len(),
            "Session opened"
        );
        Ok(session)
    }

    /// Close and forget the session for `token`, if any.
    pub async fn evict(&self, token: &str) {
        let removed = self.sessions.write().await.remove(token);
        if let Some(session) = removed {
            session.close().await;
            let open_sessions = self.len().await;
            tracing::info!(viewer = %session.viewer.id, open_sessions, "Session closed");
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
