//! qsimd backend contract
//!
//! This crate defines the narrow interface between the simulation service and
//! whatever engine turns a circuit into measurement statistics.
//!
//! # Overview
//!
//! - A [`SimulationBackend`] trait with a blocking [`run`](SimulationBackend::run),
//!   meant to be called from a worker thread
//! - [`Capabilities`] describing qubit and shot limits
//! - Result handling via [`ExecutionResult`] and [`Counts`]
//! - The request-scoped job lifecycle ([`JobId`], [`JobStatus`])
//! - Cooperative cancellation through [`CancelSignal`]
//!
//! # Implementing a Backend
//!
//! ```
//! use qsimd_hal::{
//!     CancelSignal, Capabilities, Counts, ExecutionResult, HalError, HalResult,
//!     SimulationBackend,
//! };
//! use qsimd_ir::Circuit;
//!
//! struct AllZeros {
//!     capabilities: Capabilities,
//! }
//!
//! impl SimulationBackend for AllZeros {
//!     fn name(&self) -> &str {
//!         "all_zeros"
//!     }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.capabilities
//!     }
//!
//!     fn run(&self, circuit: &Circuit, shots: u32, cancel: &CancelSignal) -> HalResult<ExecutionResult> {
//!         if cancel.is_cancelled() {
//!             return Err(HalError::Cancelled);
//!         }
//!         let mut counts = Counts::new();
//!         counts.insert("0".repeat(circuit.num_clbits()), u64::from(shots));
//!         Ok(ExecutionResult::new(counts, shots))
//!     }
//! }
//!
//! let backend = AllZeros { capabilities: Capabilities::simulator("all_zeros", 4) };
//! let circuit = Circuit::bell().unwrap();
//! backend.validate(&circuit).unwrap();
//! let result = backend.run(&circuit, 10, &CancelSignal::new()).unwrap();
//! assert_eq!(result.counts.get("00"), 10);
//! ```

pub mod backend;
pub mod cancel;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;

pub use backend::SimulationBackend;
pub use cancel::CancelSignal;
pub use capability::Capabilities;
pub use error::{HalError, HalResult};
pub use job::{JobId, JobStatus, SimulationJob};
pub use result::{Counts, ExecutionResult};
