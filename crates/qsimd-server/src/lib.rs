//! qsimd - quantum circuit simulation over HTTP.
//!
//! `POST /simulate` accepts a circuit as OpenQASM text or as a structured
//! gate list, runs it on a bounded pool of simulation workers, and answers
//! with the outcome counts plus PNG renderings of the circuit and the
//! histogram.
//!
//! Request flow:
//!
//! 1. [`source::normalize`] validates the body into a [`SimulationRequest`].
//! 2. [`JobDispatcher::execute`] runs it with admission control, a deadline
//!    and cooperative cancellation.
//! 3. [`ResultAssembler::assemble`] renders the images and shapes the response.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qsimd_adapter_sim::StatevectorBackend;
//! use qsimd_render::PngRenderer;
//! use qsimd_server::{AppState, Config, create_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(Config::default());
//!     let backend = Arc::new(StatevectorBackend::new());
//!     let state = Arc::new(AppState::new(config.clone(), backend, Arc::new(PngRenderer::default())));
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_address()?).await?;
//!     axum::serve(listener, create_router(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod assembler;
pub mod config;
pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod server;
pub mod source;
pub mod state;
pub mod tracing_config;

pub use assembler::ResultAssembler;
pub use config::{Config, ConfigError, CountsFormat};
pub use dispatcher::{JobDispatcher, SettledJob};
pub use dto::{HealthResponse, SimulateResponse};
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use server::create_router;
pub use source::{CircuitSource, SimulateRequest, SimulationRequest, SourceKind};
pub use state::AppState;
pub use tracing_config::{TracingConfig, TracingFormat, init_tracing};
