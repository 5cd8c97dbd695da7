//! Integration tests for the simulation API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum_test::TestServer;
use qsimd_adapter_sim::StatevectorBackend;
use qsimd_hal::{
    CancelSignal, Capabilities, Counts, ExecutionResult, HalError, HalResult, SimulationBackend,
};
use qsimd_ir::Circuit;
use qsimd_render::{PngRenderer, RenderError, RenderResult, Renderer};
use qsimd_server::{AppState, Config, create_router};
use serde_json::{Value, json};

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Clone, Copy)]
enum Behavior {
    /// Every shot reads all zeros.
    Zeros,
    /// Returns an error.
    Fail,
    /// Panics inside the worker.
    Panic,
    /// Reports outcomes that do not match the request.
    Malformed,
    /// Ignores cancellation until released.
    Hang,
    /// Sleeps a little, then reports all shots on the zero string.
    Slow,
}

struct StubBackend {
    behavior: Behavior,
    capabilities: Capabilities,
    calls: AtomicUsize,
    released: AtomicBool,
}

impl StubBackend {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            capabilities: Capabilities::simulator("stub", 20),
            calls: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl SimulationBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn run(&self, circuit: &Circuit, shots: u32, _cancel: &CancelSignal) -> HalResult<ExecutionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let zeros = "0".repeat(circuit.num_clbits());
        match self.behavior {
            Behavior::Zeros => {}
            Behavior::Fail => {
                return Err(HalError::Backend("segfault in /opt/backend/lib.so".into()));
            }
            Behavior::Panic => panic!("simulator invariant violated"),
            Behavior::Malformed => {
                return Ok(ExecutionResult::new(Counts::from_pairs([("banana", 7)]), 3));
            }
            Behavior::Hang => {
                while !self.released.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
            Behavior::Slow => std::thread::sleep(Duration::from_millis(30)),
        }
        Ok(ExecutionResult::new(
            Counts::from_pairs([(zeros, u64::from(shots))]),
            shots,
        ))
    }
}

/// Draws circuits but never histograms.
struct NoHistograms(PngRenderer);

impl Renderer for NoHistograms {
    fn render_circuit(&self, circuit: &Circuit) -> RenderResult<Vec<u8>> {
        self.0.render_circuit(circuit)
    }

    fn render_histogram(&self, _counts: &Counts) -> RenderResult<Vec<u8>> {
        Err(RenderError::Empty("histograms are disabled".into()))
    }
}

// ============================================================================
// Test helpers
// ============================================================================

fn server_with(
    config: Config,
    backend: Arc<dyn SimulationBackend>,
    renderer: Arc<dyn Renderer>,
) -> TestServer {
    let state = Arc::new(AppState::new(Arc::new(config), backend, renderer));
    TestServer::new(create_router(state)).expect("test server")
}

fn server(backend: Arc<dyn SimulationBackend>) -> TestServer {
    server_with(Config::default(), backend, Arc::new(PngRenderer::default()))
}

fn config_with_limits(workers: usize, queued: usize, timeout_ms: u64) -> Config {
    let mut config = Config::default();
    config.limits.max_concurrent_jobs = workers;
    config.limits.max_queued_jobs = queued;
    config.limits.job_timeout_ms = timeout_ms;
    config
}

const BELL_QASM: &str = "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\nh q[0];\ncx q[0], q[1];\nc = measure q;\n";

const IDLE_QASM: &str = "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[1];\ncreg c[1];\nmeasure q[0] -> c[0];\n";

// ============================================================================
// Landing page and health
// ============================================================================

#[tokio::test]
async fn test_index_page() {
    let server = server(StubBackend::new(Behavior::Zeros));
    let response = server.get("/").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("Quantum Circuit Simulator API"));
    assert!(text.contains("Use POST /simulate endpoint to run quantum circuits"));
}

#[tokio::test]
async fn test_health() {
    let server = server(StubBackend::new(Behavior::Zeros));
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "stub");
    assert_eq!(body["max_shots"], 8192);
    assert_eq!(body["max_qubits"], 20);
    assert!(body["version"].as_str().is_some());
}

// ============================================================================
// End to end with the real simulator
// ============================================================================

#[tokio::test]
async fn test_idle_qubit_concentrates_on_zero() {
    let server = server(Arc::new(StatevectorBackend::new()));
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": IDLE_QASM, "shots": 100 }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["counts"], json!({ "0": 100 }));
    assert_eq!(body["counts_format"], "counts");
    assert_eq!(body["framework"], "qasm");
    assert_eq!(body["shots"], 100);
    assert_eq!(body["num_qubits"], 1);
    assert_eq!(body["image_encoding"], "png;base64");
    assert!(body["circuit_image"].as_str().unwrap().starts_with("iVBOR"));
    assert!(body["histogram_image"].as_str().unwrap().starts_with("iVBOR"));
    assert!(body.get("diagnostics").is_none());
    assert!(body["job_id"].as_str().is_some());
}

#[tokio::test]
async fn test_bell_counts_only_correlated_outcomes() {
    let server = server(Arc::new(StatevectorBackend::new()));
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": BELL_QASM }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["shots"], 1024);
    let counts = body["counts"].as_object().unwrap();
    let total: u64 = counts.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, 1024);
    assert!(counts.keys().all(|k| k == "00" || k == "11"));
}

#[tokio::test]
async fn test_structured_circuit_with_probabilities() {
    let server = server(Arc::new(StatevectorBackend::new()));
    let response = server
        .post("/simulate")
        .json(&json!({
            "circuit": {
                "num_qubits": 2,
                "num_clbits": 2,
                "instructions": [
                    {"op": "x", "qubits": [1]},
                    {"op": "measure", "qubits": [0, 1], "clbits": [0, 1]}
                ]
            },
            "shots": 64,
            "counts_format": "probabilities"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["framework"], "structured");
    assert_eq!(body["counts_format"], "probabilities");
    assert_eq!(body["counts"], json!({ "10": 1.0 }));
}

// ============================================================================
// Input validation never reaches the backend
// ============================================================================

async fn assert_rejected(server: &TestServer, body: Value) -> Value {
    let response = server.post("/simulate").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().is_some());
    assert!(body.get("circuit_image").is_none());
    body
}

#[tokio::test]
async fn test_invalid_qasm_is_rejected_before_dispatch() {
    let spy = StubBackend::new(Behavior::Zeros);
    let server = server(spy.clone());

    let body = assert_rejected(&server, json!({ "qasm": "this is not qasm" })).await;
    assert!(body["message"].as_str().unwrap().contains("QASM"));
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_out_of_range_shots_are_rejected() {
    let spy = StubBackend::new(Behavior::Zeros);
    let server = server(spy.clone());

    for shots in [0, 100_000, -3] {
        assert_rejected(&server, json!({ "qasm": BELL_QASM, "shots": shots })).await;
    }
    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() {
    let spy = StubBackend::new(Behavior::Zeros);
    let server = server(spy.clone());

    // Both payloads, neither payload, executable source, wrong types.
    assert_rejected(
        &server,
        json!({ "qasm": BELL_QASM, "circuit": { "num_qubits": 1, "measure_all": true } }),
    )
    .await;
    assert_rejected(&server, json!({ "shots": 10 })).await;
    assert_rejected(&server, json!({ "code": "qc = QuantumCircuit(1)" })).await;
    assert_rejected(&server, json!({ "qasm": 42 })).await;
    assert_rejected(&server, json!({ "qasm": BELL_QASM, "counts_format": "quasi" })).await;

    // Unmeasured and oversized circuits.
    assert_rejected(&server, json!({ "qasm": "OPENQASM 3; qubit q; h q;" })).await;
    assert_rejected(
        &server,
        json!({ "circuit": { "num_qubits": 25, "measure_all": true } }),
    )
    .await;

    let response = server.post("/simulate").text("{ not json").await;
    assert!(response.status_code().is_client_error());

    assert_eq!(spy.calls(), 0);
}

#[tokio::test]
async fn test_body_limit() {
    let mut config = Config::default();
    config.server.max_body_bytes = 128;
    let spy = StubBackend::new(Behavior::Zeros);
    let server = server_with(config, spy.clone(), Arc::new(PngRenderer::default()));

    let padded = format!("{BELL_QASM}{}", "// padding\n".repeat(50));
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": padded }))
        .await;
    assert!(response.status_code().is_client_error());
    assert_eq!(spy.calls(), 0);
}

// ============================================================================
// Backend failures and deadlines
// ============================================================================

#[tokio::test]
async fn test_backend_failure_is_classified() {
    let server = server(StubBackend::new(Behavior::Fail));
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": BELL_QASM }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"], "backend_failure");
    assert!(!body["message"].as_str().unwrap().contains("/opt/backend"));
    assert!(body.get("counts").is_none());

    // The service keeps working afterwards.
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_malformed_backend_output_is_a_failure() {
    let server = server(StubBackend::new(Behavior::Malformed));
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": BELL_QASM, "shots": 100 }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert_eq!(body["error"], "backend_failure");
    assert!(body.get("counts").is_none());
    assert!(!body["message"].as_str().unwrap().contains("banana"));
}

#[tokio::test]
async fn test_panicking_backend_is_isolated() {
    let backend = StubBackend::new(Behavior::Panic);
    let server = server(backend.clone());

    for _ in 0..3 {
        let response = server
            .post("/simulate")
            .json(&json!({ "qasm": BELL_QASM }))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["error"], "backend_failure");
        assert!(!body["message"].as_str().unwrap().contains("invariant"));
    }
    assert_eq!(backend.calls(), 3);
    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_hanging_backend_times_out() {
    let backend = StubBackend::new(Behavior::Hang);
    let server = server_with(
        config_with_limits(1, 0, 200),
        backend.clone(),
        Arc::new(PngRenderer::default()),
    );

    let started = Instant::now();
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": BELL_QASM }))
        .await;
    let elapsed = started.elapsed();
    backend.release();

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json();
    assert_eq!(body["error"], "timeout");
    assert!(elapsed < Duration::from_millis(400), "took {elapsed:?}");
}

#[tokio::test]
async fn test_saturated_pool_reports_busy() {
    let backend = StubBackend::new(Behavior::Hang);
    let server = server_with(
        config_with_limits(1, 0, 2_000),
        backend.clone(),
        Arc::new(PngRenderer::default()),
    );

    let first = server.post("/simulate").json(&json!({ "qasm": BELL_QASM }));
    let second = async {
        while backend.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let response = server
            .post("/simulate")
            .json(&json!({ "qasm": BELL_QASM }))
            .await;
        backend.release();
        response
    };
    let (first, second) = tokio::join!(first, second);

    second.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(second.header("retry-after"), "1");
    let body: Value = second.json();
    assert_eq!(body["error"], "service_busy");

    first.assert_status_ok();
    assert_eq!(backend.calls(), 1);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_requests_all_resolve_independently() {
    let backend = StubBackend::new(Behavior::Slow);
    let server = server_with(
        config_with_limits(2, 3, 5_000),
        backend.clone(),
        Arc::new(PngRenderer::default()),
    );

    let requests = (1..=12u64).map(|shots| {
        let server = &server;
        async move {
            let response = server
                .post("/simulate")
                .json(&json!({ "qasm": IDLE_QASM, "shots": shots }))
                .await;
            (shots, response)
        }
    });
    let responses = futures::future::join_all(requests).await;

    let mut succeeded = 0;
    for (shots, response) in responses {
        let body: Value = response.json();
        match response.status_code() {
            StatusCode::OK => {
                succeeded += 1;
                assert_eq!(body["shots"], shots);
                assert_eq!(body["counts"], json!({ "0": shots }));
            }
            StatusCode::SERVICE_UNAVAILABLE => assert_eq!(body["error"], "service_busy"),
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert!(succeeded >= 1);
    assert_eq!(backend.calls(), succeeded);
}

// ============================================================================
// Partial rendering
// ============================================================================

#[tokio::test]
async fn test_histogram_failure_keeps_result() {
    let server = server_with(
        Config::default(),
        Arc::new(StatevectorBackend::new()),
        Arc::new(NoHistograms(PngRenderer::default())),
    );
    let response = server
        .post("/simulate")
        .json(&json!({ "qasm": IDLE_QASM, "shots": 10 }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["counts"], json!({ "0": 10 }));
    assert!(body["circuit_image"].as_str().unwrap().starts_with("iVBOR"));
    assert!(body.get("histogram_image").is_none());
    assert_eq!(body["diagnostics"][0]["artifact"], "histogram");
    assert_eq!(body["diagnostics"][0]["kind"], "render_failure");
}
