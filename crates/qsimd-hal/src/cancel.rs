//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A flag shared between the dispatcher and a running backend call.
///
/// Backends poll [`is_cancelled`](Self::is_cancelled) at convenient points and
/// return [`HalError::Cancelled`](crate::HalError::Cancelled) once it is set.
/// Nothing forces them to; a backend that never polls simply runs to
/// completion and its result is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
