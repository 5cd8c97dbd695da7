//! The standard gate set.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{IrError, IrResult};
use crate::parameter::ParameterExpression;

/// Gates with known semantics.
///
/// This is a closed set: client input can only ever name one of these,
/// through [`StandardGate::from_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Controlled rotation around X.
    CRx(ParameterExpression),
    /// Controlled rotation around Y.
    CRy(ParameterExpression),
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Controlled phase gate.
    CP(ParameterExpression),
    /// ZZ rotation gate.
    RZZ(ParameterExpression),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl StandardGate {
    /// Canonical lower-case names of every gate, as accepted by [`Self::from_name`].
    pub const NAMES: &'static [&'static str] = &[
        "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "sxdg", "rx", "ry", "rz", "p",
        "u", "cx", "cy", "cz", "ch", "swap", "iswap", "crx", "cry", "crz", "cp", "rzz", "ccx",
        "cswap",
    ];

    /// Look a gate up by name and attach its parameters.
    ///
    /// Accepts the canonical names plus the common OpenQASM 2 aliases
    /// (`u1`, `u2`, `u3`, `cnot`, `cu1`, `toffoli`, `fredkin`, `i`, `phase`).
    pub fn from_name(name: &str, params: Vec<ParameterExpression>) -> IrResult<Self> {
        let expected = match name {
            "id" | "i" | "x" | "y" | "z" | "h" | "s" | "sdg" | "t" | "tdg" | "sx" | "sxdg"
            | "cx" | "cnot" | "cy" | "cz" | "ch" | "swap" | "iswap" | "ccx" | "toffoli"
            | "cswap" | "fredkin" => 0,
            "rx" | "ry" | "rz" | "p" | "phase" | "u1" | "crx" | "cry" | "crz" | "cp" | "cu1"
            | "cphase" | "rzz" => 1,
            "u2" => 2,
            "u" | "u3" => 3,
            other => return Err(IrError::UnknownGate(other.to_string())),
        };
        if params.len() != expected {
            return Err(IrError::ParameterCountMismatch {
                gate_name: name.to_string(),
                expected,
                got: params.len(),
            });
        }

        let mut params = params.into_iter();
        let mut next = || params.next().unwrap_or(ParameterExpression::Constant(0.0));

        let gate = match name {
            "id" | "i" => StandardGate::I,
            "x" => StandardGate::X,
            "y" => StandardGate::Y,
            "z" => StandardGate::Z,
            "h" => StandardGate::H,
            "s" => StandardGate::S,
            "sdg" => StandardGate::Sdg,
            "t" => StandardGate::T,
            "tdg" => StandardGate::Tdg,
            "sx" => StandardGate::SX,
            "sxdg" => StandardGate::SXdg,
            "rx" => StandardGate::Rx(next()),
            "ry" => StandardGate::Ry(next()),
            "rz" => StandardGate::Rz(next()),
            "p" | "phase" | "u1" => StandardGate::P(next()),
            "u2" => {
                let phi = next();
                let lambda = next();
                StandardGate::U(ParameterExpression::Constant(PI / 2.0), phi, lambda)
            }
            "u" | "u3" => {
                let theta = next();
                let phi = next();
                let lambda = next();
                StandardGate::U(theta, phi, lambda)
            }
            "cx" | "cnot" => StandardGate::CX,
            "cy" => StandardGate::CY,
            "cz" => StandardGate::CZ,
            "ch" => StandardGate::CH,
            "swap" => StandardGate::Swap,
            "iswap" => StandardGate::ISwap,
            "crx" => StandardGate::CRx(next()),
            "cry" => StandardGate::CRy(next()),
            "crz" => StandardGate::CRz(next()),
            "cp" | "cu1" | "cphase" => StandardGate::CP(next()),
            "rzz" => StandardGate::RZZ(next()),
            "ccx" | "toffoli" => StandardGate::CCX,
            _ => StandardGate::CSwap,
        };
        Ok(gate)
    }

    /// Get the canonical name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(_, _, _) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RZZ(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Number of control qubits, which lead the operand list.
    pub fn num_controls(&self) -> usize {
        match self {
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::CSwap => 1,
            StandardGate::CCX => 2,
            _ => 0,
        }
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RZZ(p) => vec![p],

            StandardGate::U(a, b, c) => vec![a, b, c],

            _ => vec![],
        }
    }

    /// Short label for drawing, with controls stripped (`RX(π/2)` for a `crx`
    /// target, `H` for `ch`).
    pub fn label(&self) -> String {
        match self {
            StandardGate::I => "I".into(),
            StandardGate::X | StandardGate::CX | StandardGate::CCX => "X".into(),
            StandardGate::Y | StandardGate::CY => "Y".into(),
            StandardGate::Z | StandardGate::CZ => "Z".into(),
            StandardGate::H | StandardGate::CH => "H".into(),
            StandardGate::S => "S".into(),
            StandardGate::Sdg => "Sdg".into(),
            StandardGate::T => "T".into(),
            StandardGate::Tdg => "Tdg".into(),
            StandardGate::SX => "SX".into(),
            StandardGate::SXdg => "SXdg".into(),
            StandardGate::Swap | StandardGate::CSwap => "SWAP".into(),
            StandardGate::ISwap => "iSWAP".into(),
            StandardGate::Rx(p) | StandardGate::CRx(p) => format!("RX({})", format_param(p)),
            StandardGate::Ry(p) | StandardGate::CRy(p) => format!("RY({})", format_param(p)),
            StandardGate::Rz(p) | StandardGate::CRz(p) => format!("RZ({})", format_param(p)),
            StandardGate::P(p) | StandardGate::CP(p) => format!("P({})", format_param(p)),
            StandardGate::RZZ(p) => format!("RZZ({})", format_param(p)),
            StandardGate::U(t, p, l) => format!(
                "U({},{},{})",
                format_param(t),
                format_param(p),
                format_param(l)
            ),
        }
    }
}

/// Render a parameter compactly, snapping common multiples of π.
fn format_param(param: &ParameterExpression) -> String {
    let Some(value) = param.as_f64() else {
        return param.to_string();
    };
    const SNAPS: &[(f64, &str)] = &[
        (PI, "π"),
        (PI / 2.0, "π/2"),
        (PI / 4.0, "π/4"),
        (PI / 8.0, "π/8"),
        (-PI, "-π"),
        (-PI / 2.0, "-π/2"),
        (-PI / 4.0, "-π/4"),
        (-PI / 8.0, "-π/8"),
        (0.0, "0"),
    ];
    SNAPS
        .iter()
        .find(|(v, _)| (value - v).abs() < 1e-10)
        .map_or_else(|| format!("{value:.2}"), |(_, s)| (*s).to_string())
}
