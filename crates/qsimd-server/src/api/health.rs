//! Health check endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::dto::HealthResponse;
use crate::state::AppState;

/// GET /health - Liveness plus the limits clients need to know.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let backend = state.dispatcher.backend();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: backend.name().to_string(),
        max_qubits: state
            .config
            .simulation
            .max_qubits
            .min(backend.capabilities().max_qubits),
        max_shots: state.config.simulation.max_shots,
    })
}
