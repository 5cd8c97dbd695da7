//! Backend capability introspection.

use serde::{Deserialize, Serialize};

use qsimd_ir::StandardGate;

/// What a backend can run.
///
/// Reported by `/health` and used by [`SimulationBackend::validate`](crate::SimulationBackend::validate)
/// to reject circuits before a worker is spent on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Largest circuit, in qubits, the backend accepts.
    pub max_qubits: u32,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
    /// Supported gate names, canonical lower-case form.
    pub gates: Vec<String>,
}

impl Capabilities {
    /// Capabilities of a simulator that accepts the whole standard gate set.
    pub fn simulator(name: impl Into<String>, max_qubits: u32) -> Self {
        Self {
            name: name.into(),
            max_qubits,
            max_shots: 100_000,
            is_simulator: true,
            gates: StandardGate::NAMES.iter().map(|g| (*g).to_string()).collect(),
        }
    }

    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Check whether a gate (by canonical name) is supported.
    pub fn supports_gate(&self, name: &str) -> bool {
        self.gates.iter().any(|g| g == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_supports_standard_gates() {
        let caps = Capabilities::simulator("sim", 20);
        assert!(caps.is_simulator);
        assert_eq!(caps.max_qubits, 20);
        assert!(caps.supports_gate("h"));
        assert!(caps.supports_gate("cswap"));
        assert!(!caps.supports_gate("frobnicate"));
    }

    #[test]
    fn test_serializes_to_json() {
        let caps = Capabilities::simulator("sim", 4).with_max_shots(8192);
        let json = serde_json::to_value(&caps).unwrap();
        assert_eq!(json["max_shots"], 8192);
        assert_eq!(json["name"], "sim");
    }
}
