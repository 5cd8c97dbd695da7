//! High-level circuit builder API.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit.
///
/// Instructions are kept in program order. Every instruction is validated on
/// insertion, so a `Circuit` that exists is always well formed: operands are in
/// range, gate arity matches, no qubit appears twice in one operation and all
/// parameters evaluate to finite numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.qubits.len() as u32);
        self.qubits.push(Qubit::new(id));
        id
    }

    /// Add a quantum register with multiple qubits.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = QubitId(self.qubits.len() as u32);
                self.qubits.push(Qubit::in_register(id, &name, i));
                id
            })
            .collect()
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.clbits.len() as u32);
        self.clbits.push(Clbit::new(id));
        id
    }

    /// Add a classical register with multiple bits.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let name = name.into();
        (0..size)
            .map(|i| {
                let id = ClbitId(self.clbits.len() as u32);
                self.clbits.push(Clbit::in_register(id, &name, i));
                id
            })
            .collect()
    }

    /// Validate and append an instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if instruction.qubits.is_empty() {
            return Err(IrError::InvalidCircuit(format!(
                "'{}' has no qubit operands",
                instruction.name()
            )));
        }

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let expected = gate.num_qubits() as usize;
                let got = instruction.qubits.len();
                if expected != got {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected: expected as u32,
                        got: got as u32,
                    });
                }
                for param in gate.parameters() {
                    if param.as_f64().is_none() {
                        return Err(IrError::NonFiniteParameter(param.to_string()));
                    }
                }
            }
            InstructionKind::Measure => {
                if instruction.qubits.len() != instruction.clbits.len() {
                    return Err(IrError::InvalidCircuit(format!(
                        "measure: qubit count ({}) does not match clbit count ({})",
                        instruction.qubits.len(),
                        instruction.clbits.len()
                    )));
                }
            }
            InstructionKind::Reset | InstructionKind::Barrier => {}
        }

        for &qubit in &instruction.qubits {
            if qubit.0 as usize >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        for &clbit in &instruction.clbits {
            if clbit.0 as usize >= self.clbits.len() {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        Ok(())
    }

    fn gate(&mut self, gate: StandardGate, qubits: &[QubitId]) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits.iter().copied()))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, &[qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, &[qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Y, &[qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Z, &[qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::S, &[qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::T, &[qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rx(theta.into()), &[qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Ry(theta.into()), &[qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(theta.into()), &[qubit])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CX, &[control, target])
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CZ, &[control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, &[q1, q2])
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CCX, &[c1, c2, target])
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure every qubit into the classical bit with the same index,
    /// growing the classical register if it is too small.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        while self.clbits.len() < self.qubits.len() {
            self.add_clbit();
        }
        for i in 0..self.qubits.len() as u32 {
            self.apply(Instruction::measure(QubitId(i), ClbitId(i)))?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    /// Barrier across all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = self.qubits.iter().map(|q| q.id).collect();
        self.apply(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// Number of individual qubit measurements.
    pub fn num_measurements(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.is_measure())
            .map(|i| i.qubits.len())
            .sum()
    }

    /// Circuit depth: the longest chain of operations on any qubit.
    /// Barriers do not count.
    pub fn depth(&self) -> usize {
        let mut qubit_depth: FxHashMap<QubitId, usize> = FxHashMap::default();
        let mut depth = 0;
        for instruction in self.instructions.iter().filter(|i| !i.is_barrier()) {
            let op_depth = instruction
                .qubits
                .iter()
                .map(|q| qubit_depth.get(q).copied().unwrap_or(0))
                .max()
                .unwrap_or(0)
                + 1;
            for q in &instruction.qubits {
                qubit_depth.insert(*q, op_depth);
            }
            depth = depth.max(op_depth);
        }
        depth
    }

    /// Group instructions into drawing columns.
    ///
    /// Each instruction lands in the earliest column after every earlier
    /// instruction that shares a wire with it. A multi-qubit instruction
    /// occupies every wire between its lowest and highest qubit, so the
    /// connector drawn between them never crosses another box. A measurement
    /// also occupies every wire below it, down to the classical register.
    pub fn layers(&self) -> Vec<Vec<&Instruction>> {
        let mut layers: Vec<Vec<&Instruction>> = vec![];
        let mut wire_depth = vec![0usize; self.qubits.len()];
        let last = self.qubits.len().saturating_sub(1);

        for instruction in &self.instructions {
            let (lo, mut hi) = span(instruction);
            if instruction.is_measure() {
                hi = last;
            }
            let op_depth = wire_depth[lo..=hi].iter().copied().max().unwrap_or(0);

            if layers.len() <= op_depth {
                layers.resize_with(op_depth + 1, Vec::new);
            }
            layers[op_depth].push(instruction);

            for depth in &mut wire_depth[lo..=hi] {
                *depth = op_depth + 1;
            }
        }

        layers
    }

    // =========================================================================
    // Common circuits
    // =========================================================================

    /// Two-qubit Bell state preparation with measurement.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?;
        circuit.measure_all()?;
        Ok(circuit)
    }

    /// `n`-qubit GHZ state preparation with measurement.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        circuit.h(QubitId(0))?;
        for i in 1..n {
            circuit.cx(QubitId(0), QubitId(i))?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}

/// Lowest and highest qubit index touched; instructions are never empty
/// once inside a circuit.
fn span(instruction: &Instruction) -> (usize, usize) {
    let indices = instruction.qubits.iter().map(|q| q.0 as usize);
    let lo = indices.clone().min().unwrap_or(0);
    let hi = indices.max().unwrap_or(0);
    (lo, hi)
}
