//! Benchmarks for the statevector backend
//!
//! Run with: cargo bench -p qsimd-adapter-sim

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qsimd_adapter_sim::StatevectorBackend;
use qsimd_hal::{CancelSignal, SimulationBackend};
use qsimd_ir::{Circuit, ClbitId, QubitId};

/// GHZ preparation: the sampled fast path.
fn bench_ghz(c: &mut Criterion) {
    let mut group = c.benchmark_group("ghz_sampled");
    let backend = StatevectorBackend::new().with_seed(0);

    for num_qubits in &[4_u32, 10, 16] {
        let circuit = Circuit::ghz(*num_qubits).unwrap();
        group.bench_with_input(
            BenchmarkId::new("1024_shots", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    backend
                        .run(black_box(circuit), 1024, &CancelSignal::new())
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

/// Measure, reset, measure again: forces one simulation per shot.
fn bench_per_shot(c: &mut Criterion) {
    let mut group = c.benchmark_group("mid_circuit");
    let backend = StatevectorBackend::new().with_seed(0);

    for num_qubits in &[2_u32, 6, 10] {
        let mut circuit = Circuit::with_size("mid", *num_qubits, *num_qubits * 2);
        for q in 0..*num_qubits {
            circuit.h(QubitId(q)).unwrap();
            circuit.measure(QubitId(q), ClbitId(q)).unwrap();
            circuit.reset(QubitId(q)).unwrap();
            circuit
                .measure(QubitId(q), ClbitId(num_qubits + q))
                .unwrap();
        }
        group.bench_with_input(
            BenchmarkId::new("256_shots", num_qubits),
            &circuit,
            |b, circuit| {
                b.iter(|| {
                    backend
                        .run(black_box(circuit), 256, &CancelSignal::new())
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ghz, bench_per_shot);
criterion_main!(benches);
