//! The backend trait.
//!
//! ```text
//!   capabilities() ──→ validate() ──→ run()
//!    (sync, &ref)       (sync)        (blocking, worker thread)
//! ```
//!
//! `run` is deliberately synchronous: the service calls it from a blocking
//! worker, so a backend is free to spin the CPU for as long as it needs. It
//! is expected to poll its [`CancelSignal`] and give up early once asked to.

use qsimd_ir::{Circuit, InstructionKind};

use crate::cancel::CancelSignal;
use crate::capability::Capabilities;
use crate::error::{HalError, HalResult};
use crate::result::ExecutionResult;

/// A simulation engine.
pub trait SimulationBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Get the backend capabilities.
    fn capabilities(&self) -> &Capabilities;

    /// Check a circuit against the backend's capabilities without running it.
    fn validate(&self, circuit: &Circuit) -> HalResult<()> {
        let caps = self.capabilities();

        if circuit.num_qubits() > caps.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "circuit has {} qubits but {} supports at most {}",
                circuit.num_qubits(),
                caps.name,
                caps.max_qubits
            )));
        }

        for instruction in circuit.instructions() {
            if let InstructionKind::Gate(gate) = &instruction.kind {
                if !caps.supports_gate(gate.name()) {
                    return Err(HalError::Unsupported(format!(
                        "gate '{}' is not supported by {}",
                        gate.name(),
                        caps.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Run `circuit` for `shots` repetitions and return the outcome counts.
    ///
    /// Blocking. Must be abandon-safe: the caller may stop waiting at any
    /// point, after setting `cancel`.
    fn run(
        &self,
        circuit: &Circuit,
        shots: u32,
        cancel: &CancelSignal,
    ) -> HalResult<ExecutionResult>;
}
