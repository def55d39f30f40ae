//! Session credentials.
//!
//! The console UI authenticates to the gateway with the same bearer token the
//! upstream backend issued. Each session owns its credential; fetch contracts
//! read it through [`CredentialProvider`] instead of a shared global.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use tokio::sync::RwLock;

/// Source of the bearer credential attached to upstream calls.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current bearer token, if the session still holds one.
    async fn bearer(&self) -> Option<String>;

    /// Forget the credential. Called when upstream answers 401.
    async fn clear(&self);
}

/// In-memory credential for one console session.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    token: RwLock<Option<String>>,
}

impl SessionCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl CredentialProvider for SessionCredentials {
    async fn bearer(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn clear(&self) {
        let mut token = self.token.write().await;
        if token.take().is_some() {
            tracing::info!("Session credential cleared");
        }
    }
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
