//! Data transfer objects for API responses.

use std::collections::BTreeMap;

use qsimd_hal::{Counts, JobId};
use serde::Serialize;

use crate::config::CountsFormat;
use crate::source::SourceKind;

/// Encoding of every image field, so clients never have to sniff it.
pub const IMAGE_ENCODING: &str = "png;base64";

/// The outcome distribution in the requested format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Distribution {
    Counts(Counts),
    Probabilities(BTreeMap<String, f64>),
}

impl Distribution {
    pub fn new(counts: &Counts, format: CountsFormat) -> Self {
        match format {
            CountsFormat::Counts => Distribution::Counts(counts.clone()),
            CountsFormat::Probabilities => Distribution::Probabilities(counts.probabilities()),
        }
    }
}

/// Which image a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    CircuitDiagram,
    Histogram,
}

/// A problem that did not fail the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub artifact: Artifact,
    /// Always `render_failure` for now.
    pub kind: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn render_failure(artifact: Artifact, message: impl Into<String>) -> Self {
        Self {
            artifact,
            kind: "render_failure",
            message: message.into(),
        }
    }
}

/// Successful `POST /simulate` response.
#[derive(Debug, Clone, Serialize)]
pub struct SimulateResponse {
    pub job_id: JobId,
    pub framework: SourceKind,
    pub shots: u32,
    pub num_qubits: usize,
    pub counts_format: CountsFormat,
    pub counts: Distribution,
    pub image_encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: String,
    pub max_qubits: u32,
    pub max_shots: u32,
}
