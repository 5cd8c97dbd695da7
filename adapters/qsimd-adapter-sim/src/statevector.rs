//! Statevector simulation engine.
//!
//! Amplitude index bit `k` is the state of qubit `k`.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

use qsimd_hal::{HalError, HalResult};
use qsimd_ir::{ParameterExpression, StandardGate};

/// A 2x2 single-qubit unitary, row-major.
type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A statevector representing a pure quantum state.
pub(crate) struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self { amplitudes }
    }

    /// Apply a gate to the given qubits. Operand order follows the gate
    /// convention: controls first, then targets.
    pub fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> HalResult<()> {
        let q = |i: usize| -> HalResult<usize> {
            qubits.get(i).copied().ok_or_else(|| {
                HalError::InvalidCircuit(format!("gate '{}' is missing operands", gate.name()))
            })
        };

        match gate {
            StandardGate::Swap => self.apply_swap(q(0)?, q(1)?),
            StandardGate::ISwap => self.apply_iswap(q(0)?, q(1)?),
            StandardGate::RZZ(theta) => self.apply_rzz(q(0)?, q(1)?, angle(theta)?),
            StandardGate::CCX => self.apply_ccx(q(0)?, q(1)?, q(2)?),
            StandardGate::CSwap => self.apply_cswap(q(0)?, q(1)?, q(2)?),
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_) => {
                let m = controlled_target(gate)?;
                self.apply_controlled(q(0)?, q(1)?, &m);
            }
            _ => {
                let m = single_qubit_matrix(gate)?;
                self.apply_single(q(0)?, &m);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Gate kernels
    // =========================================================================

    fn apply_single(&mut self, qubit: usize, m: &Matrix2) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_controlled(&mut self, control: usize, target: usize, m: &Matrix2) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_iswap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = I * self.amplitudes[j];
                self.amplitudes[j] = I * tmp;
            }
        }
    }

    fn apply_rzz(&mut self, q1: usize, q2: usize, theta: f64) {
        let same = Complex64::from_polar(1.0, -theta / 2.0);
        let differ = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            let parity = ((i >> q1) ^ (i >> q2)) & 1;
            *amp *= if parity == 0 { same } else { differ };
        }
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let ctrl_mask = (1 << c1) | (1 << c2);
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask == ctrl_mask) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cswap(&mut self, control: usize, t1: usize, t2: usize) {
        let ctrl_mask = 1 << control;
        let t1_mask = 1 << t1;
        let t2_mask = 1 << t2;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & t1_mask != 0) && (i & t2_mask == 0) {
                let j = (i & !t1_mask) | t2_mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    // =========================================================================
    // Measurement
    // =========================================================================

    /// Probability that `qubit` reads 1.
    fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Projectively measure one qubit, collapsing the state.
    pub fn measure<R: Rng>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let p1 = self.probability_one(qubit);
        let outcome = rng.r#gen::<f64>() < p1;
        let p = if outcome { p1 } else { 1.0 - p1 };
        let norm = p.sqrt();
        let mask = 1 << qubit;

        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if ((i & mask) != 0) == outcome && norm > 0.0 {
                *amp /= norm;
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Reset a qubit to |0⟩ by measuring it and flipping a 1.
    pub fn reset<R: Rng>(&mut self, qubit: usize, rng: &mut R) {
        if self.measure(qubit, rng) {
            self.apply_single(qubit, &pauli_x());
        }
    }

    /// Sample a full basis state without collapsing.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.r#gen();

        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }

        // Rounding can leave the cumulative sum just short of 1; pick the
        // last state with non-zero weight.
        self.amplitudes
            .iter()
            .rposition(|a| a.norm_sqr() > 0.0)
            .unwrap_or(0)
    }

    #[cfg(test)]
    fn amplitude(&self, index: usize) -> Complex64 {
        self.amplitudes[index]
    }
}

fn angle(param: &ParameterExpression) -> HalResult<f64> {
    param
        .as_f64()
        .ok_or_else(|| {
            HalError::InvalidCircuit(format!("parameter '{param}' is not a finite number"))
        })
}

fn pauli_x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn phase(theta: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

fn u(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();
    [
        [Complex64::new(c, 0.0), -Complex64::from_polar(s, lambda)],
        [
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

/// Matrix of a single-qubit gate.
fn single_qubit_matrix(gate: &StandardGate) -> HalResult<Matrix2> {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let sx_a = Complex64::new(0.5, 0.5);
    let sx_b = Complex64::new(0.5, -0.5);

    Ok(match gate {
        StandardGate::I => [[ONE, ZERO], [ZERO, ONE]],
        StandardGate::X => pauli_x(),
        StandardGate::Y => [[ZERO, -I], [I, ZERO]],
        StandardGate::Z => [[ONE, ZERO], [ZERO, -ONE]],
        StandardGate::H => [[h, h], [h, -h]],
        StandardGate::S => phase(PI / 2.0),
        StandardGate::Sdg => phase(-PI / 2.0),
        StandardGate::T => phase(PI / 4.0),
        StandardGate::Tdg => phase(-PI / 4.0),
        StandardGate::SX => [[sx_a, sx_b], [sx_b, sx_a]],
        StandardGate::SXdg => [[sx_b, sx_a], [sx_a, sx_b]],
        StandardGate::Rx(t) => rx(angle(t)?),
        StandardGate::Ry(t) => ry(angle(t)?),
        StandardGate::Rz(t) => rz(angle(t)?),
        StandardGate::P(t) => phase(angle(t)?),
        StandardGate::U(t, p, l) => u(angle(t)?, angle(p)?, angle(l)?),
        other => {
            return Err(HalError::Unsupported(format!(
                "gate '{}' has no single-qubit matrix",
                other.name()
            )));
        }
    })
}

/// Target matrix of a singly-controlled gate.
fn controlled_target(gate: &StandardGate) -> HalResult<Matrix2> {
    match gate {
        StandardGate::CX => single_qubit_matrix(&StandardGate::X),
        StandardGate::CY => single_qubit_matrix(&StandardGate::Y),
        StandardGate::CZ => single_qubit_matrix(&StandardGate::Z),
        StandardGate::CH => single_qubit_matrix(&StandardGate::H),
        StandardGate::CRx(t) => Ok(rx(angle(t)?)),
        StandardGate::CRy(t) => Ok(ry(angle(t)?)),
        StandardGate::CRz(t) => Ok(rz(angle(t)?)),
        StandardGate::CP(t) => Ok(phase(angle(t)?)),
        other => Err(HalError::Unsupported(format!(
            "gate '{}' is not a controlled single-qubit gate",
            other.name()
        ))),
    }
}
