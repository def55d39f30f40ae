//! Configuration module for the console gateway.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::errors::ConsoleError;

/// How much of the org tree is fetched before the user expands anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStrategy {
    /// Children are fetched on the first expansion of their parent
    Lazy,
    /// Teams and members are prefetched right after the branch list
    Cascade,
}

impl TreeStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lazy" => Some(TreeStrategy::Lazy),
            "cascade" => Some(TreeStrategy::Cascade),
            _ => None,
        }
    }
}

/// Gateway configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream console backend
    pub upstream_url: String,
    /// Address to bind the gateway to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Org tree preloading strategy
    pub tree_strategy: TreeStrategy,
    /// Timeout applied to every upstream request
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConsoleError> {
        dotenvy::dotenv().ok();

        let upstream_url = env::var("CONSOLE_UPSTREAM_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api".to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = env::var("CONSOLE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| ConsoleError::Config(format!("Invalid CONSOLE_BIND_ADDR: {}", e)))?;

        let log_level = env::var("CONSOLE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let tree_strategy = match env::var("CONSOLE_TREE_STRATEGY") {
            Ok(raw) => TreeStrategy::parse(&raw).ok_or_else(|| {
                ConsoleError::Config(format!("Invalid CONSOLE_TREE_STRATEGY: {}", raw))
            })?,
            Err(_) => TreeStrategy::Lazy,
        };

        let timeout_secs = match env::var("CONSOLE_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConsoleError::Config(format!("Invalid CONSOLE_REQUEST_TIMEOUT_SECS: {}", e))
            })?,
            Err(_) => 15,
        };

        Ok(Self {
            upstream_url,
            bind_addr,
            log_level,
            tree_strategy,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
