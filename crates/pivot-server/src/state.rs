//! Shared application state and the router

use crate::auth::Auth;
use crate::integration_api;
use crate::link_group_api;
use axum::routing::{get, put};
use axum::Router;
use pivot_core::Config;
use pivot_crypto::SecretCodec;
use pivot_engine::{LinkGroupStore, Orchestrator, Registry, SettingsStore};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Everything the handlers need, cheap to clone
#[derive(Clone)]
pub struct AppState {
    /// Immutable source catalogue
    pub registry: Arc<Registry>,
    /// Query fan-out
    pub orchestrator: Arc<Orchestrator>,
    /// Link group documents
    pub link_groups: Arc<dyn LinkGroupStore>,
    /// Per-user integration settings documents
    pub settings: Arc<dyn SettingsStore>,
    /// Secret codec for sealing settings secrets
    pub codec: Arc<SecretCodec>,
    /// Requesting-user resolution
    pub auth: Arc<dyn Auth>,
    /// Startup configuration
    pub config: Arc<Config>,
}

/// Build the full route table over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/integration", get(integration_api::list))
        .route(
            "/api/integration/search/:query",
            get(integration_api::search),
        )
        .route(
            "/api/integration/userSettings",
            get(integration_api::user_settings),
        )
        .route("/api/roles", get(integration_api::roles))
        .route(
            "/api/linkGroup/getViewable",
            get(link_group_api::get_viewable),
        )
        .route(
            "/api/linkGroup/getEditable",
            get(link_group_api::get_editable),
        )
        .route("/api/linkGroup", put(link_group_api::create))
        .route(
            "/api/linkGroup/:id",
            put(link_group_api::update).delete(link_group_api::remove),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
