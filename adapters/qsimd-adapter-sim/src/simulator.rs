//! Simulator backend implementation.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Instant;
use tracing::{debug, instrument};

use qsimd_hal::{
    CancelSignal, Capabilities, Counts, ExecutionResult, HalError, HalResult, SimulationBackend,
};
use qsimd_ir::{Circuit, Instruction, InstructionKind};

use crate::statevector::Statevector;

/// Shots between cancellation checks in sampling mode.
const CANCEL_POLL_INTERVAL: u32 = 1024;

/// Local statevector simulator.
///
/// Supports circuits up to ~20 qubits (limited by memory).
pub struct StatevectorBackend {
    capabilities: Capabilities,
    seed: Option<u64>,
}

impl StatevectorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(20)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            capabilities: Capabilities::simulator("statevector", max_qubits),
            seed: None,
        }
    }

    /// Fix the random seed, making every run reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.capabilities = self.capabilities.with_max_shots(max_shots);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Evolve once and draw every shot from the final distribution.
    fn run_sampled(
        &self,
        circuit: &Circuit,
        shots: u32,
        cancel: &CancelSignal,
    ) -> HalResult<Counts> {
        let mut sv = Statevector::new(circuit.num_qubits());
        let mut measurements = Vec::new();

        for inst in circuit.instructions() {
            check(cancel)?;
            match &inst.kind {
                InstructionKind::Gate(gate) => sv.apply_gate(gate, &indices(inst))?,
                InstructionKind::Measure => {
                    measurements.extend(inst.qubits.iter().zip(&inst.clbits).map(|(q, c)| {
                        (q.0 as usize, c.0 as usize)
                    }));
                }
                InstructionKind::Reset | InstructionKind::Barrier => {}
            }
        }

        let mut rng = self.rng();
        let mut outcomes: FxHashMap<usize, u64> = FxHashMap::default();
        for shot in 0..shots {
            if shot % CANCEL_POLL_INTERVAL == 0 {
                check(cancel)?;
            }
            *outcomes.entry(sv.sample(&mut rng)).or_insert(0) += 1;
        }

        let mut counts = Counts::new();
        let mut clbits = vec![false; circuit.num_clbits()];
        for (outcome, n) in outcomes {
            clbits.fill(false);
            for &(qubit, clbit) in &measurements {
                clbits[clbit] = (outcome >> qubit) & 1 == 1;
            }
            let key = bitstring(&clbits);
            let total = counts.get(&key) + n;
            counts.insert(key, total);
        }
        Ok(counts)
    }

    /// Simulate every shot separately, collapsing on measurement.
    fn run_per_shot(
        &self,
        circuit: &Circuit,
        shots: u32,
        cancel: &CancelSignal,
    ) -> HalResult<Counts> {
        let mut rng = self.rng();
        let mut counts = Counts::new();
        let mut clbits = vec![false; circuit.num_clbits()];

        for _ in 0..shots {
            let mut sv = Statevector::new(circuit.num_qubits());
            clbits.fill(false);

            for inst in circuit.instructions() {
                check(cancel)?;
                match &inst.kind {
                    InstructionKind::Gate(gate) => sv.apply_gate(gate, &indices(inst))?,
                    InstructionKind::Measure => {
                        for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                            clbits[c.0 as usize] = sv.measure(q.0 as usize, &mut rng);
                        }
                    }
                    InstructionKind::Reset => {
                        for q in &inst.qubits {
                            sv.reset(q.0 as usize, &mut rng);
                        }
                    }
                    InstructionKind::Barrier => {}
                }
            }

            counts.increment(bitstring(&clbits));
        }
        Ok(counts)
    }
}

impl Default for StatevectorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationBackend for StatevectorBackend {
    fn name(&self) -> &str {
        &self.capabilities.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, circuit, cancel), fields(qubits = circuit.num_qubits()))]
    fn run(
        &self,
        circuit: &Circuit,
        shots: u32,
        cancel: &CancelSignal,
    ) -> HalResult<ExecutionResult> {
        self.validate(circuit)?;
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} is outside 1..={}",
                self.capabilities.max_shots
            )));
        }
        if !circuit.has_measurements() {
            return Err(HalError::InvalidCircuit(
                "circuit has no measurements".into(),
            ));
        }

        let start = Instant::now();
        let sampled = measurements_are_terminal(circuit);
        debug!(
            "Starting simulation: {} instructions, {}",
            circuit.instructions().len(),
            if sampled { "sampled" } else { "per-shot" }
        );

        let counts = if sampled {
            self.run_sampled(circuit, shots, cancel)?
        } else {
            self.run_per_shot(circuit, shots, cancel)?
        };

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        Ok(ExecutionResult::new(counts, shots)
            .with_execution_time(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)))
    }
}

fn check(cancel: &CancelSignal) -> HalResult<()> {
    if cancel.is_cancelled() {
        return Err(HalError::Cancelled);
    }
    Ok(())
}

fn indices(inst: &Instruction) -> Vec<usize> {
    inst.qubits.iter().map(|q| q.0 as usize).collect()
}

/// Classical register as text, highest bit leftmost.
fn bitstring(clbits: &[bool]) -> String {
    clbits
        .iter()
        .rev()
        .map(|&b| if b { '1' } else { '0' })
        .collect()
}

/// True when no reset appears and nothing acts on a qubit after it is
/// measured, so one final-state distribution serves every shot.
fn measurements_are_terminal(circuit: &Circuit) -> bool {
    let mut measured = FxHashSet::default();
    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Reset => return false,
            InstructionKind::Gate(_) => {
                if inst.qubits.iter().any(|q| measured.contains(q)) {
                    return false;
                }
            }
            InstructionKind::Measure => measured.extend(inst.qubits.iter().copied()),
            InstructionKind::Barrier => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsimd_ir::{ClbitId, QubitId};

    fn run(circuit: &Circuit, shots: u32) -> ExecutionResult {
        StatevectorBackend::new()
            .with_seed(42)
            .run(circuit, shots, &CancelSignal::new())
            .unwrap()
    }

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        let result = run(&circuit, 1000);

        assert_eq!(result.counts.total_shots(), 1000);
        assert_eq!(result.counts.get("01") + result.counts.get("10"), 0);
        let p00 = result.counts.get("00");
        assert!((400..=600).contains(&p00), "got {p00} for 00");
    }

    #[test]
    fn test_ghz_state() {
        let circuit = Circuit::ghz(3).unwrap();
        let result = run(&circuit, 500);

        let both = result.counts.get("000") + result.counts.get("111");
        assert_eq!(both, 500);
    }

    #[test]
    fn test_idle_qubit_reads_zero() {
        let mut circuit = Circuit::with_size("idle", 1, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        let result = run(&circuit, 100);
        assert_eq!(result.counts, Counts::from_pairs([("0", 100)]));
    }

    #[test]
    fn test_bit_order_highest_clbit_leftmost() {
        let mut circuit = Circuit::with_size("order", 2, 2);
        circuit.x(QubitId(0)).unwrap();
        circuit.measure_all().unwrap();
        let result = run(&circuit, 10);
        assert_eq!(result.counts.get("01"), 10);
    }

    #[test]
    fn test_measurement_into_other_clbit() {
        let mut circuit = Circuit::with_size("swap_bits", 2, 2);
        circuit.x(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(1)).unwrap();
        circuit.measure(QubitId(1), ClbitId(0)).unwrap();
        let result = run(&circuit, 10);
        assert_eq!(result.counts.get("10"), 10);
    }

    #[test]
    fn test_mid_circuit_measurement_and_reset() {
        let mut circuit = Circuit::with_size("mid", 1, 2);
        circuit.x(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.reset(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(1)).unwrap();
        assert!(!measurements_are_terminal(&circuit));

        let result = run(&circuit, 50);
        assert_eq!(result.counts.get("01"), 50);
    }

    #[test]
    fn test_terminal_detection() {
        let circuit = Circuit::bell().unwrap();
        assert!(measurements_are_terminal(&circuit));

        let mut circuit = Circuit::with_size("after", 1, 1);
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.x(QubitId(0)).unwrap();
        assert!(!measurements_are_terminal(&circuit));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut circuit = Circuit::with_size("coin", 3, 3);
        for q in 0..3 {
            circuit.h(QubitId(q)).unwrap();
        }
        circuit.measure_all().unwrap();

        assert_eq!(run(&circuit, 256).counts, run(&circuit, 256).counts);
    }

    #[test]
    fn test_rejects_oversized_circuit() {
        let backend = StatevectorBackend::with_max_qubits(2);
        let circuit = Circuit::ghz(3).unwrap();
        let err = backend
            .run(&circuit, 10, &CancelSignal::new())
            .unwrap_err();
        assert!(matches!(err, HalError::CircuitTooLarge(_)));
    }

    #[test]
    fn test_rejects_bad_shots() {
        let backend = StatevectorBackend::new().with_max_shots(8192);
        let circuit = Circuit::bell().unwrap();
        for shots in [0, 8193] {
            let err = backend
                .run(&circuit, shots, &CancelSignal::new())
                .unwrap_err();
            assert!(matches!(err, HalError::InvalidShots(_)));
        }
    }

    #[test]
    fn test_rejects_unmeasured_circuit() {
        let mut circuit = Circuit::with_size("none", 1, 0);
        circuit.h(QubitId(0)).unwrap();
        let err = StatevectorBackend::new()
            .run(&circuit, 10, &CancelSignal::new())
            .unwrap_err();
        assert!(matches!(err, HalError::InvalidCircuit(_)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        let err = StatevectorBackend::new()
            .run(&Circuit::bell().unwrap(), 10, &cancel)
            .unwrap_err();
        assert_eq!(err, HalError::Cancelled);
    }
}
