//! Job dispatch onto a bounded pool of blocking workers.
//!
//! Admission is capped at `max_concurrent_jobs + max_queued_jobs`; anything
//! beyond that is turned away with `ServiceBusy` before a job exists in the
//! queue. Admitted jobs wait for one of `max_concurrent_jobs` worker permits
//! and then run on tokio's blocking pool. One deadline covers the wait and the
//! run.
//!
//! A job that times out, is interrupted by shutdown, or whose caller goes
//! away has its [`CancelSignal`] set. Backends poll the signal; one that does
//! not is left to finish on its own and keeps its worker permit until it
//! does, so the pool never grows past its bound.

use std::sync::Arc;

use qsimd_hal::{
    CancelSignal, ExecutionResult, HalError, JobStatus, SimulationBackend, SimulationJob,
};
use qsimd_ir::Circuit;
use tokio::sync::{Semaphore, watch};
use tokio::time::{Duration, Instant, timeout_at};
use tracing::{debug, error, info, warn};

use crate::config::ResourceLimits;
use crate::error::{ErrorKind, ServiceError, ServiceResult};

/// A job that reached a terminal state, with its outcome.
#[derive(Debug)]
pub struct SettledJob {
    pub job: SimulationJob,
    pub result: ServiceResult<ExecutionResult>,
}

/// Runs simulations off the request path.
#[derive(Clone)]
pub struct JobDispatcher {
    backend: Arc<dyn SimulationBackend>,
    admission: Arc<Semaphore>,
    workers: Arc<Semaphore>,
    timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

/// Sets the signal when dropped unless disarmed, so an abandoned request
/// stops its simulation.
struct CancelOnDrop {
    signal: Option<CancelSignal>,
}

impl CancelOnDrop {
    fn new(signal: CancelSignal) -> Self {
        Self {
            signal: Some(signal),
        }
    }

    fn disarm(&mut self) {
        self.signal = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.take() {
            signal.cancel();
        }
    }
}

impl JobDispatcher {
    pub fn new(
        backend: Arc<dyn SimulationBackend>,
        limits: &ResourceLimits,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let workers = limits.max_concurrent_jobs.clamp(1, Semaphore::MAX_PERMITS);
        let admitted = workers
            .saturating_add(limits.max_queued_jobs)
            .min(Semaphore::MAX_PERMITS);
        Self {
            backend,
            admission: Arc::new(Semaphore::new(admitted)),
            workers: Arc::new(Semaphore::new(workers)),
            timeout: limits.job_timeout(),
            shutdown,
        }
    }

    pub fn backend(&self) -> &dyn SimulationBackend {
        self.backend.as_ref()
    }

    /// Worker permits not currently held.
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Run `circuit` for `shots` and wait for the job to settle.
    ///
    /// Always resolves: with the backend's result, or with `ServiceBusy`,
    /// `Timeout`, `Cancelled`, `BackendFailure` or `Internal`.
    pub async fn execute(&self, circuit: Arc<Circuit>, shots: u32) -> SettledJob {
        let mut job = SimulationJob::new(shots);
        let result = self.drive(&mut job, circuit, shots).await;

        let status = match &result {
            Ok(_) => JobStatus::Succeeded,
            Err(e) if e.kind == ErrorKind::Cancelled => JobStatus::Cancelled,
            Err(e) => JobStatus::Failed(e.message.clone()),
        };
        settle(&mut job, status);

        match &result {
            Ok(r) => info!(
                job_id = %job.id,
                shots,
                outcomes = r.counts.len(),
                elapsed_ms = ?job.run_time_ms(),
                "Job succeeded"
            ),
            Err(e) => info!(job_id = %job.id, error = %e, "Job did not succeed"),
        }

        SettledJob { job, result }
    }

    async fn drive(
        &self,
        job: &mut SimulationJob,
        circuit: Arc<Circuit>,
        shots: u32,
    ) -> ServiceResult<ExecutionResult> {
        let Ok(admitted) = self.admission.clone().try_acquire_owned() else {
            warn!(job_id = %job.id, "Rejecting job: worker pool and queue are full");
            return Err(ServiceError::busy(
                "the simulation queue is full, retry shortly",
            ));
        };
        debug!(job_id = %job.id, shots, "Job admitted");

        let Some(deadline) = Instant::now().checked_add(self.timeout) else {
            error!(job_id = %job.id, timeout = ?self.timeout, "Job deadline is not representable");
            return Err(ServiceError::internal("the job timeout is misconfigured"));
        };
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Err(ServiceError::cancelled("the service is shutting down"));
        }

        let permit = tokio::select! {
            acquired = timeout_at(deadline, self.workers.clone().acquire_owned()) => match acquired {
                Ok(Ok(permit)) => permit,
                Ok(Err(_closed)) => {
                    return Err(ServiceError::internal("worker pool is closed"));
                }
                Err(_elapsed) => {
                    warn!(job_id = %job.id, "Job timed out waiting for a worker");
                    return Err(self.timed_out());
                }
            },
            () = shutdown_requested(&mut shutdown) => {
                return Err(ServiceError::cancelled("the service is shutting down"));
            }
        };

        settle(job, JobStatus::Running);
        debug!(job_id = %job.id, "Job running");

        let cancel = CancelSignal::new();
        let mut guard = CancelOnDrop::new(cancel.clone());
        let backend = Arc::clone(&self.backend);
        let num_clbits = circuit.num_clbits();
        let worker_cancel = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _admitted = admitted;
            backend.run(&circuit, shots, &worker_cancel)
        });

        let outcome = tokio::select! {
            joined = timeout_at(deadline, handle) => joined,
            () = shutdown_requested(&mut shutdown) => {
                cancel.cancel();
                warn!(job_id = %job.id, "Job cancelled by shutdown");
                return Err(ServiceError::cancelled("the service is shutting down"));
            }
        };
        guard.disarm();

        match outcome {
            Err(_elapsed) => {
                cancel.cancel();
                warn!(job_id = %job.id, "Job exceeded its deadline; cancellation requested");
                Err(self.timed_out())
            }
            Ok(Err(join_error)) if join_error.is_panic() => {
                error!(job_id = %job.id, "Backend panicked during simulation");
                Err(ServiceError::backend("the simulation backend crashed"))
            }
            Ok(Err(join_error)) => {
                error!(job_id = %job.id, error = %join_error, "Worker task failed");
                Err(ServiceError::internal("simulation worker was lost"))
            }
            Ok(Ok(Err(HalError::Cancelled))) => {
                Err(ServiceError::cancelled("the simulation was cancelled"))
            }
            Ok(Ok(Err(hal_error))) => Err(backend_failure(job, &hal_error)),
            Ok(Ok(Ok(result))) => match check_output(&result, shots, num_clbits) {
                Ok(()) => Ok(result),
                Err(problem) => {
                    warn!(job_id = %job.id, %problem, "Backend returned malformed output");
                    Err(ServiceError::backend(
                        "the simulation backend returned malformed output",
                    ))
                }
            },
        }
    }

    fn timed_out(&self) -> ServiceError {
        ServiceError::timeout(format!(
            "simulation did not finish within {} ms",
            self.timeout.as_millis()
        ))
    }
}

/// Log the backend's error in full and give the client a classified message.
fn backend_failure(job: &SimulationJob, e: &HalError) -> ServiceError {
    warn!(job_id = %job.id, error = %e, "Backend failed");
    if e.is_client_error() {
        ServiceError::backend(format!("the backend rejected the circuit: {e}"))
    } else {
        ServiceError::backend("the simulation backend failed")
    }
}

/// Counts must cover exactly `shots` samples, keyed by bitstrings over every
/// classical bit.
fn check_output(result: &ExecutionResult, shots: u32, num_clbits: usize) -> Result<(), String> {
    if result.shots != shots {
        return Err(format!("ran {} shots, {shots} requested", result.shots));
    }
    let total = result.counts.total_shots();
    if total != u64::from(shots) {
        return Err(format!("counts sum to {total}, expected {shots}"));
    }
    let is_bitstring =
        |key: &str| key.len() == num_clbits && key.bytes().all(|b| b == b'0' || b == b'1');
    if let Some((key, _)) = result.counts.iter().find(|(key, _)| !is_bitstring(key.as_str())) {
        return Err(format!("outcome {key:?} is not a {num_clbits}-bit string"));
    }
    Ok(())
}

fn settle(job: &mut SimulationJob, next: JobStatus) {
    let from = job.status.clone();
    if !job.transition(next.clone()) {
        error!(job_id = %job.id, %from, to = %next, "Refused job state transition");
    }
}

/// Resolves once shutdown is signalled; never, if the sender is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|&stopping| stopping).await.is_err() {
        std::future::pending::<()>().await;
    }
}
