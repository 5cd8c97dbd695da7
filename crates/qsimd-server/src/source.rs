//! Request normalization.
//!
//! Turns the raw `POST /simulate` body into a [`SimulationRequest`]: exactly
//! one circuit payload, lowered to IR, plus a shot count inside the configured
//! bounds. Nothing here touches the backend, and the result depends only on
//! the request and the configuration.

use qsimd_ir::{Circuit, ClbitId, Instruction, ParameterExpression, QubitId, StandardGate};
use qsimd_qasm::Limits;
use serde::{Deserialize, Serialize};

use crate::config::{CountsFormat, SimulationConfig};
use crate::error::{ServiceError, ServiceResult};

/// Classical bits accepted in one circuit.
const MAX_CLBITS: u32 = 1024;

/// Body of `POST /simulate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateRequest {
    /// OpenQASM 2 or 3 program text.
    pub qasm: Option<String>,
    /// Gate list built from whitelisted operations.
    pub circuit: Option<StructuredCircuit>,
    /// Signed so that negative values get a range error instead of a type error.
    pub shots: Option<i64>,
    pub counts_format: Option<CountsFormat>,
}

/// A circuit given as data.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredCircuit {
    pub num_qubits: u32,
    #[serde(default)]
    pub num_clbits: u32,
    #[serde(default)]
    pub instructions: Vec<Operation>,
    /// Append `measure q[i] -> c[i]` for every qubit, adding clbits as needed.
    #[serde(default)]
    pub measure_all: bool,
}

/// One entry of [`StructuredCircuit::instructions`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Operation {
    pub op: String,
    pub qubits: Vec<u32>,
    #[serde(default)]
    pub clbits: Vec<u32>,
    #[serde(default)]
    pub params: Vec<f64>,
}

/// Which payload a request carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Qasm,
    Structured,
}

/// A validated circuit, tagged with the payload it came from.
#[derive(Debug, Clone)]
pub enum CircuitSource {
    Qasm { text: String, circuit: Circuit },
    Structured { circuit: Circuit },
}

impl CircuitSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            CircuitSource::Qasm { .. } => SourceKind::Qasm,
            CircuitSource::Structured { .. } => SourceKind::Structured,
        }
    }

    pub fn circuit(&self) -> &Circuit {
        match self {
            CircuitSource::Qasm { circuit, .. } | CircuitSource::Structured { circuit } => circuit,
        }
    }
}

/// Everything needed to run and report one simulation.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub source: CircuitSource,
    pub shots: u32,
    pub counts_format: CountsFormat,
}

/// Validate a request body against the simulation settings.
pub fn normalize(
    request: SimulateRequest,
    config: &SimulationConfig,
) -> ServiceResult<SimulationRequest> {
    let shots = resolve_shots(request.shots, config)?;
    let counts_format = request.counts_format.unwrap_or(config.counts_format);

    let source = match (request.qasm, request.circuit) {
        (Some(_), Some(_)) => {
            return Err(ServiceError::invalid_input(
                "request has both 'qasm' and 'circuit'; send exactly one",
            ));
        }
        (None, None) => {
            return Err(ServiceError::invalid_input(
                "request needs either 'qasm' or 'circuit'",
            ));
        }
        (Some(text), None) => {
            let circuit = from_qasm(&text, config)?;
            CircuitSource::Qasm { text, circuit }
        }
        (None, Some(structured)) => CircuitSource::Structured {
            circuit: from_structured(&structured, config)?,
        },
    };

    if !source.circuit().has_measurements() {
        return Err(ServiceError::invalid_input(
            "circuit has no measurements, so there is nothing to sample",
        ));
    }

    Ok(SimulationRequest {
        source,
        shots,
        counts_format,
    })
}

fn resolve_shots(requested: Option<i64>, config: &SimulationConfig) -> ServiceResult<u32> {
    let Some(shots) = requested else {
        return Ok(config.default_shots);
    };
    u32::try_from(shots)
        .ok()
        .filter(|s| (config.min_shots..=config.max_shots).contains(s))
        .ok_or_else(|| {
            ServiceError::invalid_input(format!(
                "shots must be between {} and {}, got {shots}",
                config.min_shots, config.max_shots
            ))
        })
}

fn from_qasm(text: &str, config: &SimulationConfig) -> ServiceResult<Circuit> {
    let limits = Limits {
        max_qubits: config.max_qubits,
        max_clbits: MAX_CLBITS,
    };
    Ok(qsimd_qasm::parse_with_limits(text, limits)?)
}

fn from_structured(
    structured: &StructuredCircuit,
    config: &SimulationConfig,
) -> ServiceResult<Circuit> {
    if structured.num_qubits == 0 {
        return Err(ServiceError::invalid_input("num_qubits must be at least 1"));
    }
    if structured.num_qubits > config.max_qubits {
        return Err(ServiceError::invalid_input(format!(
            "circuit has {} qubits, the limit is {}",
            structured.num_qubits, config.max_qubits
        )));
    }
    let num_clbits = if structured.measure_all {
        structured.num_clbits.max(structured.num_qubits)
    } else {
        structured.num_clbits
    };
    if num_clbits > MAX_CLBITS {
        return Err(ServiceError::invalid_input(format!(
            "circuit has {num_clbits} classical bits, the limit is {MAX_CLBITS}"
        )));
    }

    let mut circuit = Circuit::with_size("structured", structured.num_qubits, num_clbits);
    for (index, op) in structured.instructions.iter().enumerate() {
        apply_operation(&mut circuit, op)
            .map_err(|e| ServiceError::invalid_input(format!("instruction {index}: {}", e.message)))?;
    }
    if structured.measure_all {
        circuit.measure_all()?;
    }
    Ok(circuit)
}

fn apply_operation(circuit: &mut Circuit, op: &Operation) -> ServiceResult<()> {
    let qubits = op.qubits.iter().copied().map(QubitId);

    let no_params = |name: &str| {
        if op.params.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::invalid_input(format!(
                "'{name}' takes no parameters"
            )))
        }
    };

    match op.op.as_str() {
        "measure" => {
            no_params("measure")?;
            if op.qubits.len() != op.clbits.len() {
                return Err(ServiceError::invalid_input(format!(
                    "measure has {} qubits but {} clbits",
                    op.qubits.len(),
                    op.clbits.len()
                )));
            }
            if op.qubits.is_empty() {
                return Err(ServiceError::invalid_input("measure needs at least one qubit"));
            }
            for (q, c) in qubits.zip(op.clbits.iter().copied().map(ClbitId)) {
                circuit.apply(Instruction::measure(q, c))?;
            }
        }
        "reset" => {
            no_params("reset")?;
            if op.qubits.is_empty() {
                return Err(ServiceError::invalid_input("reset needs at least one qubit"));
            }
            for q in qubits {
                circuit.apply(Instruction::reset(q))?;
            }
        }
        "barrier" => {
            no_params("barrier")?;
            if op.qubits.is_empty() {
                circuit.barrier_all()?;
            } else {
                circuit.apply(Instruction::barrier(qubits))?;
            }
        }
        name => {
            if !op.clbits.is_empty() {
                return Err(ServiceError::invalid_input(format!(
                    "gate '{name}' does not take clbits"
                )));
            }
            if let Some(bad) = op.params.iter().find(|p| !p.is_finite()) {
                return Err(ServiceError::invalid_input(format!(
                    "gate '{name}' has non-finite parameter {bad}"
                )));
            }
            let params = op
                .params
                .iter()
                .map(|&p| ParameterExpression::Constant(p))
                .collect();
            let gate = StandardGate::from_name(name, params)?;
            circuit.apply(Instruction::gate(gate, qubits))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    const BELL_QASM: &str = "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\nh q[0];\ncx q[0], q[1];\nc = measure q;\n";

    fn request(value: serde_json::Value) -> SimulateRequest {
        serde_json::from_value(value).unwrap()
    }

    fn normalize_json(value: serde_json::Value) -> ServiceResult<SimulationRequest> {
        normalize(request(value), &SimulationConfig::default())
    }

    #[test]
    fn test_qasm_source() {
        let normalized = normalize_json(json!({ "qasm": BELL_QASM })).unwrap();
        assert_eq!(normalized.source.kind(), SourceKind::Qasm);
        assert_eq!(normalized.shots, 1024);
        assert_eq!(normalized.counts_format, CountsFormat::Counts);
        assert_eq!(normalized.source.circuit().num_qubits(), 2);
        assert_eq!(normalized.source.circuit().num_measurements(), 2);
    }

    #[test]
    fn test_structured_source() {
        let normalized = normalize_json(json!({
            "circuit": {
                "num_qubits": 2,
                "num_clbits": 2,
                "instructions": [
                    {"op": "h", "qubits": [0]},
                    {"op": "cx", "qubits": [0, 1]},
                    {"op": "rz", "qubits": [1], "params": [0.5]},
                    {"op": "measure", "qubits": [0, 1], "clbits": [0, 1]}
                ]
            },
            "shots": 100,
            "counts_format": "probabilities"
        }))
        .unwrap();
        assert_eq!(normalized.source.kind(), SourceKind::Structured);
        assert_eq!(normalized.shots, 100);
        assert_eq!(normalized.counts_format, CountsFormat::Probabilities);
        assert_eq!(normalized.source.circuit().instructions().len(), 5);
    }

    #[test]
    fn test_measure_all_adds_clbits() {
        let normalized = normalize_json(json!({
            "circuit": { "num_qubits": 3, "instructions": [{"op": "x", "qubits": [2]}], "measure_all": true }
        }))
        .unwrap();
        let circuit = normalized.source.circuit();
        assert_eq!(circuit.num_clbits(), 3);
        assert_eq!(circuit.num_measurements(), 3);
    }

    #[test]
    fn test_both_or_neither_payload() {
        let both = normalize_json(json!({
            "qasm": BELL_QASM,
            "circuit": { "num_qubits": 1, "measure_all": true }
        }))
        .unwrap_err();
        assert_eq!(both.kind, ErrorKind::InvalidInput);

        let neither = normalize_json(json!({ "shots": 10 })).unwrap_err();
        assert_eq!(neither.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_shot_bounds() {
        for shots in [0_i64, -5, 8193, 100_000] {
            let err = normalize_json(json!({ "qasm": BELL_QASM, "shots": shots })).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidInput, "shots = {shots}");
        }
        for shots in [1_i64, 8192] {
            assert!(normalize_json(json!({ "qasm": BELL_QASM, "shots": shots })).is_ok());
        }
    }

    #[test]
    fn test_code_field_is_rejected() {
        let parsed: Result<SimulateRequest, _> =
            serde_json::from_value(json!({ "code": "import os" }));
        assert!(parsed.is_err());

        let parsed: Result<SimulateRequest, _> = serde_json::from_value(json!({
            "circuit": { "num_qubits": 1, "instructions": [{"op": "h", "qubits": [0], "eval": "x"}] }
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_bad_qasm() {
        let err = normalize_json(json!({ "qasm": "this is not qasm" })).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_unmeasured_circuit() {
        let err = normalize_json(json!({ "qasm": "OPENQASM 3; qubit q; h q;" })).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.message.contains("no measurements"));
    }

    #[test]
    fn test_qubit_limit() {
        let err = normalize_json(json!({ "qasm": "OPENQASM 3; qubit[21] q; bit[21] c; c = measure q;" }))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = normalize_json(json!({ "circuit": { "num_qubits": 21, "measure_all": true } }))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_structured_rejections() {
        let cases = [
            json!({"op": "exec", "qubits": [0]}),
            json!({"op": "h", "qubits": [5]}),
            json!({"op": "rx", "qubits": [0]}),
            json!({"op": "h", "qubits": [0], "params": [1.0]}),
            json!({"op": "cx", "qubits": [0, 0]}),
            json!({"op": "measure", "qubits": [0], "clbits": []}),
            json!({"op": "h", "qubits": [0], "clbits": [0]}),
            json!({"op": "reset", "qubits": []}),
        ];
        for op in cases {
            let err = normalize_json(json!({
                "circuit": { "num_qubits": 2, "num_clbits": 1, "instructions": [op.clone()], "measure_all": true }
            }))
            .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidInput, "accepted {op}");
            assert!(err.message.starts_with("instruction 0"), "{}", err.message);
        }
    }
}
