//! HTTP control surface.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{basic_username, hash_secret, logging_middleware, require_api_key};
pub use types::*;

use crate::config::SchedulerConfig;
use crate::pipeline::Pipeline;
use crate::scheduler::ScheduleControl;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use outcome_store::OutcomeStore;
use secrecy::SecretString;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline each scheduled worker runs
    pub pipeline: Arc<dyn Pipeline>,
    /// Outcomes recorded since process start
    pub store: OutcomeStore,
    /// Handle to the single scheduling loop
    pub control: ScheduleControl,
    /// Defaults and bounds for start requests
    pub scheduler: SchedulerConfig,
    /// Shared secret for the control commands
    pub api_key: SecretString,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        pipeline: Arc<dyn Pipeline>,
        scheduler: SchedulerConfig,
        api_key: SecretString,
    ) -> Self {
        Self {
            pipeline,
            store: OutcomeStore::new(),
            control: ScheduleControl::new(),
            scheduler,
            api_key,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let commands = Router::new()
        .route("/start", post(handlers::start))
        .route("/stop", post(handlers::stop))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .merge(commands)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
