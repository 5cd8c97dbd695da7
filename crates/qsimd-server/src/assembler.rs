//! Response assembly.
//!
//! A settled job either becomes an error response as-is, or a success
//! response with both images attached. Each image is rendered independently:
//! one that fails is left out and reported in `diagnostics`.
//!
//! Rendering runs on the blocking pool, at most `max_renders` at a time.
//! Requests beyond that wait for a slot.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use qsimd_render::{RenderResult, Renderer};
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::dispatcher::SettledJob;
use crate::dto::{Artifact, Diagnostic, Distribution, IMAGE_ENCODING, SimulateResponse};
use crate::error::{ServiceError, ServiceResult};
use crate::source::SimulationRequest;

#[derive(Clone)]
pub struct ResultAssembler {
    renderer: Arc<dyn Renderer>,
    render_slots: Arc<Semaphore>,
}

impl ResultAssembler {
    pub fn new(renderer: Arc<dyn Renderer>, max_renders: usize) -> Self {
        Self {
            renderer,
            render_slots: Arc::new(Semaphore::new(max_renders.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }

    /// Assemble on the blocking pool once a render slot is free.
    pub async fn assemble_blocking(
        &self,
        request: SimulationRequest,
        settled: SettledJob,
    ) -> ServiceResult<SimulateResponse> {
        if settled.result.is_err() {
            return self.assemble(&request, settled);
        }

        let permit = Arc::clone(&self.render_slots)
            .acquire_owned()
            .await
            .map_err(|_| ServiceError::internal("rendering is unavailable"))?;
        let assembler = self.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            assembler.assemble(&request, settled)
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Response assembly panicked");
            ServiceError::internal("failed to build the response")
        })?
    }

    pub(crate) fn free_render_slots(&self) -> usize {
        self.render_slots.available_permits()
    }

    /// Build the response for `request` from its settled job.
    ///
    /// Rendering is CPU-bound; call this from a blocking context.
    pub fn assemble(
        &self,
        request: &SimulationRequest,
        settled: SettledJob,
    ) -> ServiceResult<SimulateResponse> {
        let SettledJob { job, result } = settled;
        let result = result?;

        let circuit = request.source.circuit();
        let mut diagnostics = Vec::new();

        let circuit_image = encode(
            Artifact::CircuitDiagram,
            self.renderer.render_circuit(circuit),
            &mut diagnostics,
        );
        let histogram_image = encode(
            Artifact::Histogram,
            self.renderer.render_histogram(&result.counts),
            &mut diagnostics,
        );

        Ok(SimulateResponse {
            job_id: job.id,
            framework: request.source.kind(),
            shots: request.shots,
            num_qubits: circuit.num_qubits(),
            counts_format: request.counts_format,
            counts: Distribution::new(&result.counts, request.counts_format),
            image_encoding: IMAGE_ENCODING,
            circuit_image,
            histogram_image,
            diagnostics,
            execution_time_ms: result.execution_time_ms,
        })
    }
}

fn encode(
    artifact: Artifact,
    rendered: RenderResult<Vec<u8>>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    match rendered {
        Ok(bytes) => Some(BASE64.encode(bytes)),
        Err(e) => {
            warn!(?artifact, error = %e, "Rendering failed");
            diagnostics.push(Diagnostic::render_failure(artifact, e.to_string()));
            None
        }
    }
}
