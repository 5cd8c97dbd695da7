//! qsimd Local Statevector Simulator
//!
//! The built-in [`SimulationBackend`](qsimd_hal::SimulationBackend) of the
//! service. It keeps the full statevector in memory, so it gives exact
//! amplitudes but is limited to ~20-25 qubits.
//!
//! # Features
//!
//! - **All Standard Gates**: Supports every gate in `qsimd-ir`
//! - **Fast Sampling**: Circuits whose measurements all come last are
//!   evolved once and sampled `shots` times
//! - **Mid-circuit Measurement**: Anything else is simulated shot by shot,
//!   with projective collapse and reset
//! - **Cooperative Cancellation**: The cancel signal is polled between
//!   instructions and between shots
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//!
//! # Example
//!
//! ```
//! use qsimd_adapter_sim::StatevectorBackend;
//! use qsimd_hal::{CancelSignal, SimulationBackend};
//! use qsimd_ir::Circuit;
//!
//! let backend = StatevectorBackend::new();
//! assert_eq!(backend.capabilities().max_qubits, 20);
//!
//! let circuit = Circuit::bell().unwrap();
//! let result = backend.run(&circuit, 1000, &CancelSignal::new()).unwrap();
//!
//! // Only correlated outcomes appear.
//! assert_eq!(result.counts.get("00") + result.counts.get("11"), 1000);
//! ```

mod simulator;
mod statevector;

pub use simulator::StatevectorBackend;
