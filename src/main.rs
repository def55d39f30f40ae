//! Channel Console Gateway
//!
//! Backend-for-frontend for the channel management console. Reconciles the
//! system channel list with the connected account's live feed, loads the
//! role-filtered org tree and serves ranged analytics reports.

mod analytics;
mod api;
mod auth;
mod channels;
mod client;
mod config;
mod errors;
mod models;
mod org_tree;
mod session;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use session::SessionRegistry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Channel Console Gateway");
    tracing::info!("Upstream: {}", config.upstream_url);
    tracing::info!("Org tree strategy: {:?}", config.tree_strategy);
    tracing::info!("Bind address: {}", config.bind_addr);

    let state = AppState {
        sessions: Arc::new(SessionRegistry::new(&config)?),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes, all scoped to the caller's session
    let api_routes = Router::new()
        .route(
            "/session",
            get(api::get_session).delete(api::delete_session),
        )
        // Channels
        .route("/channels", get(api::list_channels))
        // Org tree
        .route("/org-tree", get(api::get_org_tree))
        .route("/org-tree/toggle", post(api::toggle_node))
        .route("/org-tree/invalidate", post(api::invalidate_org_tree))
        // Analytics
        .route(
            "/analytics",
            get(api::get_analytics).put(api::set_analytics_key),
        )
        .route("/analytics/retry", post(api::retry_analytics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_layer,
        ));

    // Health check (no session required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod testing;
