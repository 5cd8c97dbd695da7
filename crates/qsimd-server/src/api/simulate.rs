//! The simulation endpoint.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::info;

use crate::dto::SimulateResponse;
use crate::error::ServiceResult;
use crate::source::{SimulateRequest, normalize};
use crate::state::AppState;

/// POST /simulate - Normalize, run, render.
///
/// Every stage runs in order for one request; nothing is cached, so the same
/// body submitted twice is simulated twice.
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SimulateRequest>, JsonRejection>,
) -> ServiceResult<Json<SimulateResponse>> {
    let Json(raw) = payload?;
    let request = normalize(raw, &state.config.simulation)?;
    info!(
        framework = ?request.source.kind(),
        qubits = request.source.circuit().num_qubits(),
        shots = request.shots,
        "Simulation requested"
    );

    let circuit = Arc::new(request.source.circuit().clone());
    let settled = state.dispatcher.execute(circuit, request.shots).await;

    let response = state.assembler.assemble_blocking(request, settled).await?;

    Ok(Json(response))
}
