//! ariadne-resolver library
//!
//! Resolves an OpenURL citation into delivery links by consulting the
//! coverage service (SFX) and, when it has nothing substantive, the
//! catalog service (Primo).

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod catalog;
pub mod cli;
pub mod coverage;
pub mod error;
pub mod link;
pub mod normalize;
pub mod resolver;
pub mod upstream;

pub use error::{ApiError, ApiResult};
pub use link::{reconcile, NormalizedLink};
pub use resolver::{LinkSource, ResolutionResult, Resolver};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/v0/", get(api::resolve))
        .route("/v0", get(api::resolve))
        .merge(api::health_routes())
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
