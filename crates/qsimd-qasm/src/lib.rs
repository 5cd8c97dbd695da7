//! `OpenQASM` front end for qsimd
//!
//! Turns client-supplied QASM text into a validated [`qsimd_ir::Circuit`].
//! Both the `OpenQASM` 3 syntax and the older 2.0 dialect used by most
//! circuit-building toolkits are accepted, since clients routinely export
//! either.
//!
//! # Supported Features
//!
//! | Feature | Example |
//! |---------|---------|
//! | Version declaration (optional) | `OPENQASM 3.0;`, `OPENQASM 2.0;` |
//! | Standard includes | `include "stdgates.inc";`, `include "qelib1.inc";` |
//! | Qubit declarations | `qubit[5] q;`, `qreg q[5];` |
//! | Classical bits | `bit[5] c;`, `creg c[5];` |
//! | Standard gates | `h q[0];`, `cx q[0], q[1];` |
//! | Register broadcasting | `h q;`, `cx q, r;` |
//! | Parameterized gates | `rx(pi/4) q[0];`, `u3(0.1, 0.2, 0.3) q[1];` |
//! | Measurements | `c = measure q;`, `measure q[0] -> c[0];` |
//! | Ranges | `measure q[0:1] -> c[0:1];` (inclusive) |
//! | Barriers | `barrier q;`, `barrier;` |
//! | Reset | `reset q[0];` |
//! | Comments | `// comment`, `/* block */` |
//!
//! Control flow, custom gate definitions and classical computation are
//! rejected with [`ParseError::Unsupported`]; the service only runs circuits
//! built from its fixed gate set.
//!
//! # Example
//!
//! ```rust
//! use qsimd_qasm::parse;
//!
//! let qasm = r#"
//!     OPENQASM 3.0;
//!     include "stdgates.inc";
//!     qubit[2] q;
//!     bit[2] c;
//!     h q[0];
//!     cx q[0], q[1];
//!     c = measure q;
//! "#;
//!
//! let circuit = parse(qasm).unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.num_measurements(), 2);
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::{Limits, parse, parse_with_limits};
