//! HTTP request handlers.

use super::types::{HealthResponse, MessageResponse, StartRequest};
use super::AppState;
use crate::error::ServiceError;
use crate::scheduler::BatchScheduler;
use axum::{
    extract::State,
    response::Html,
    Form, Json,
};
use outcome_store::ProvisioningOutcome;
use std::sync::Arc;
use tracing::info;

/// Landing page.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let schedule = state.control.status().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        running: schedule.running,
        state: schedule.state,
        outcomes: state.store.summary().await,
    })
}

/// Recorded outcomes in append order.
pub async fn status(State(state): State<AppState>) -> Json<Vec<ProvisioningOutcome>> {
    Json(state.store.snapshot().await)
}

/// Start the scheduling loop.
pub async fn start(
    State(state): State<AppState>,
    form: Option<Form<StartRequest>>,
) -> Result<Json<MessageResponse>, ServiceError> {
    let request = form.map(|Form(request)| request).unwrap_or_default();
    let settings = state
        .scheduler
        .schedule(request.threads(), request.interval_secs());

    let scheduler = BatchScheduler::new(Arc::clone(&state.pipeline), state.store.clone(), settings);
    let settings = state.control.start(scheduler).await?;

    info!(
        workers = settings.workers,
        interval = ?settings.interval,
        "Auto-invite process started"
    );

    Ok(Json(MessageResponse::new(format!(
        "Auto-invite process started with {} threads and {}s interval.",
        settings.workers,
        settings.interval.as_secs()
    ))))
}

/// Stop the scheduling loop.
pub async fn stop(State(state): State<AppState>) -> Result<Json<MessageResponse>, ServiceError> {
    state.control.stop().await?;
    info!("Auto-invite process stopped");
    Ok(Json(MessageResponse::new("Auto-invite process stopped.")))
}
