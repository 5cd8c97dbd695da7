//! Lowering from AST to Circuit IR.

use rustc_hash::{FxHashMap, FxHashSet};

use qsimd_ir::{
    Circuit, ClbitId, Instruction, IrError, ParameterExpression, QubitId, StandardGate,
};

use super::Limits;
use crate::ast::{BinOp, Expression, GateCall, OperandRef, Program, Statement};
use crate::error::{ParseError, ParseResult};

/// Lower a parsed program to a Circuit.
pub(super) fn lower_to_circuit(program: &Program, limits: Limits) -> ParseResult<Circuit> {
    let mut ctx = LoweringContext::new(limits);

    for stmt in &program.statements {
        ctx.lower_statement(stmt.line, &stmt.node)?;
    }

    Ok(ctx.circuit)
}

/// A resolved operand: its element ids, and whether it named a single element.
struct Resolved<T> {
    ids: Vec<T>,
    single: bool,
}

struct LoweringContext {
    circuit: Circuit,
    limits: Limits,
    qregs: FxHashMap<String, Vec<QubitId>>,
    cregs: FxHashMap<String, Vec<ClbitId>>,
}

impl LoweringContext {
    fn new(limits: Limits) -> Self {
        Self {
            circuit: Circuit::new("main"),
            limits,
            qregs: FxHashMap::default(),
            cregs: FxHashMap::default(),
        }
    }

    fn lower_statement(&mut self, line: usize, stmt: &Statement) -> ParseResult<()> {
        match stmt {
            Statement::Include(_) => Ok(()),
            Statement::QubitDecl { name, size } => self.declare_qubits(line, name, *size),
            Statement::BitDecl { name, size } => self.declare_bits(line, name, *size),
            Statement::Gate(call) => self.lower_gate(line, call),
            Statement::Measure { qubits, bits } => self.lower_measure(line, qubits, bits),
            Statement::Reset { qubits } => {
                for qubit in self.flatten_qubits(line, qubits)? {
                    self.circuit.reset(qubit)?;
                }
                Ok(())
            }
            Statement::Barrier { qubits } => {
                if qubits.is_empty() {
                    self.circuit.barrier_all()?;
                    return Ok(());
                }
                let mut seen = FxHashSet::default();
                let ids: Vec<_> = self
                    .flatten_qubits(line, qubits)?
                    .into_iter()
                    .filter(|q| seen.insert(*q))
                    .collect();
                self.circuit.apply(Instruction::barrier(ids))?;
                Ok(())
            }
        }
    }

    fn check_name(&self, line: usize, name: &str) -> ParseResult<()> {
        if self.qregs.contains_key(name) || self.cregs.contains_key(name) {
            return Err(ParseError::RedefinedIdentifier {
                line,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn declare_qubits(&mut self, line: usize, name: &str, size: Option<u64>) -> ParseResult<()> {
        self.check_name(line, name)?;
        let size = checked_size(
            "qubit",
            self.circuit.num_qubits(),
            size,
            self.limits.max_qubits,
        )?;
        let ids = self.circuit.add_qreg(name, size);
        self.qregs.insert(name.to_string(), ids);
        Ok(())
    }

    fn declare_bits(&mut self, line: usize, name: &str, size: Option<u64>) -> ParseResult<()> {
        self.check_name(line, name)?;
        let size = checked_size(
            "bit",
            self.circuit.num_clbits(),
            size,
            self.limits.max_clbits,
        )?;
        let ids = self.circuit.add_creg(name, size);
        self.cregs.insert(name.to_string(), ids);
        Ok(())
    }

    fn lower_gate(&mut self, line: usize, call: &GateCall) -> ParseResult<()> {
        let name = call.name.to_lowercase();

        let params = call
            .params
            .iter()
            .map(|p| lower_expression(line, p))
            .collect::<ParseResult<Vec<_>>>()?;

        let gate = StandardGate::from_name(&name, params).map_err(|e| match e {
            IrError::UnknownGate(_) => ParseError::UnknownGate {
                line,
                name: call.name.clone(),
            },
            IrError::ParameterCountMismatch { expected, got, .. } => {
                ParseError::WrongParameterCount {
                    line,
                    gate: call.name.clone(),
                    expected,
                    got,
                }
            }
            other => ParseError::CircuitError(other),
        })?;

        let expected = gate.num_qubits() as usize;
        if call.qubits.len() != expected {
            return Err(ParseError::WrongQubitCount {
                line,
                gate: call.name.clone(),
                expected,
                got: call.qubits.len(),
            });
        }

        let operands = call
            .qubits
            .iter()
            .map(|op| self.resolve_qubits(line, op))
            .collect::<ParseResult<Vec<_>>>()?;

        for ids in broadcast(line, &call.name, &operands)? {
            self.circuit.apply(Instruction::gate(gate.clone(), ids))?;
        }
        Ok(())
    }

    fn lower_measure(
        &mut self,
        line: usize,
        qubits: &[OperandRef],
        bits: &[OperandRef],
    ) -> ParseResult<()> {
        let qubits = self.flatten_qubits(line, qubits)?;
        let mut clbits = Vec::with_capacity(qubits.len());
        for op in bits {
            clbits.extend(self.resolve_clbits(line, op)?.ids);
        }

        if qubits.len() != clbits.len() {
            return Err(ParseError::RegisterSizeMismatch {
                line,
                operation: "measure".into(),
            });
        }

        for (qubit, clbit) in qubits.into_iter().zip(clbits) {
            self.circuit.measure(qubit, clbit)?;
        }
        Ok(())
    }

    fn flatten_qubits(&self, line: usize, ops: &[OperandRef]) -> ParseResult<Vec<QubitId>> {
        let mut ids = Vec::new();
        for op in ops {
            ids.extend(self.resolve_qubits(line, op)?.ids);
        }
        Ok(ids)
    }

    fn resolve_qubits(&self, line: usize, op: &OperandRef) -> ParseResult<Resolved<QubitId>> {
        let register = self.qregs.get(op.register_name()).ok_or_else(|| {
            ParseError::UndefinedIdentifier {
                line,
                name: op.register_name().to_string(),
            }
        })?;
        select(line, op, register)
    }

    fn resolve_clbits(&self, line: usize, op: &OperandRef) -> ParseResult<Resolved<ClbitId>> {
        let register = self.cregs.get(op.register_name()).ok_or_else(|| {
            ParseError::UndefinedIdentifier {
                line,
                name: op.register_name().to_string(),
            }
        })?;
        select(line, op, register)
    }
}

/// Size of a new register, checked against the running total.
fn checked_size(
    kind: &'static str,
    current: usize,
    size: Option<u64>,
    limit: u32,
) -> ParseResult<u32> {
    let size = size.unwrap_or(1);
    let declared = (current as u64).saturating_add(size);
    if declared > u64::from(limit) {
        return Err(ParseError::RegisterTooLarge {
            kind,
            declared,
            limit,
        });
    }
    // Bounded by `limit` above.
    Ok(u32::try_from(size).unwrap_or(limit))
}

fn select<T: Copy>(line: usize, op: &OperandRef, register: &[T]) -> ParseResult<Resolved<T>> {
    let out_of_bounds = |index: u64| ParseError::IndexOutOfBounds {
        line,
        register: op.register_name().to_string(),
        index,
        size: u32::try_from(register.len()).unwrap_or(u32::MAX),
    };
    let get = |index: u64| {
        usize::try_from(index)
            .ok()
            .and_then(|i| register.get(i).copied())
            .ok_or_else(|| out_of_bounds(index))
    };

    match op {
        OperandRef::Register(_) => Ok(Resolved {
            ids: register.to_vec(),
            single: register.len() == 1,
        }),
        OperandRef::Index { index, .. } => Ok(Resolved {
            ids: vec![get(*index)?],
            single: true,
        }),
        OperandRef::Range { start, end, .. } => {
            if start > end {
                return Err(ParseError::InvalidExpression {
                    line,
                    message: format!(
                        "empty range [{start}:{end}] on register '{}'",
                        op.register_name()
                    ),
                });
            }
            get(*end)?;
            let ids = (*start..=*end).map(get).collect::<ParseResult<Vec<_>>>()?;
            Ok(Resolved { ids, single: false })
        }
    }
}

/// Expand register operands into one operand list per application.
///
/// Single-element operands repeat; register operands advance in lockstep and
/// must all have the same length.
fn broadcast(
    line: usize,
    operation: &str,
    operands: &[Resolved<QubitId>],
) -> ParseResult<Vec<Vec<QubitId>>> {
    let mut width = None;
    for op in operands.iter().filter(|op| !op.single) {
        match width {
            None => width = Some(op.ids.len()),
            Some(w) if w != op.ids.len() => {
                return Err(ParseError::RegisterSizeMismatch {
                    line,
                    operation: operation.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    let Some(width) = width else {
        return Ok(vec![operands.iter().map(|op| op.ids[0]).collect()]);
    };

    Ok((0..width)
        .map(|i| {
            operands
                .iter()
                .map(|op| if op.single { op.ids[0] } else { op.ids[i] })
                .collect()
        })
        .collect())
}

/// Lower an expression to a parameter that evaluates to a finite number.
fn lower_expression(line: usize, expr: &Expression) -> ParseResult<ParameterExpression> {
    let lowered = lower_expression_inner(line, expr)?;
    if lowered.as_f64().is_none() {
        return Err(ParseError::InvalidExpression {
            line,
            message: "parameter does not evaluate to a finite number".into(),
        });
    }
    Ok(lowered)
}

#[allow(clippy::cast_precision_loss)]
fn lower_expression_inner(line: usize, expr: &Expression) -> ParseResult<ParameterExpression> {
    Ok(match expr {
        Expression::Int(v) => ParameterExpression::Constant(*v as f64),
        Expression::Float(v) => ParameterExpression::Constant(*v),
        Expression::Pi => ParameterExpression::Pi,
        Expression::Tau => ParameterExpression::Constant(2.0) * ParameterExpression::Pi,
        Expression::Euler => ParameterExpression::Constant(std::f64::consts::E),
        Expression::Identifier(name) => {
            return Err(ParseError::UndefinedIdentifier {
                line,
                name: name.clone(),
            });
        }
        Expression::Neg(inner) => -lower_expression_inner(line, inner)?,
        Expression::Binary { left, op, right } => {
            let l = lower_expression_inner(line, left)?;
            let r = lower_expression_inner(line, right)?;
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => {
                    let value = l
                        .as_f64()
                        .zip(r.as_f64())
                        .map(|(base, exp)| base.powf(exp))
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| ParseError::InvalidExpression {
                            line,
                            message: "exponent does not evaluate to a finite number".into(),
                        })?;
                    ParameterExpression::Constant(value)
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::parser::{Limits, parse, parse_with_limits};
    use qsimd_ir::{InstructionKind, StandardGate};

    #[test]
    fn test_broadcast_over_registers() {
        let circuit = parse("qubit[3] a; qubit[3] b; cx a, b;").unwrap();
        assert_eq!(circuit.instructions().len(), 3);
        assert_eq!(circuit.depth(), 1);
    }

    #[test]
    fn test_broadcast_single_control() {
        let circuit = parse("qubit[3] q; qubit t; cx q, t;").unwrap();
        assert_eq!(circuit.instructions().len(), 3);
    }

    #[test]
    fn test_broadcast_size_mismatch() {
        let err = parse("qubit[2] a; qubit[3] b; cx a, b;").unwrap_err();
        assert!(matches!(err, ParseError::RegisterSizeMismatch { .. }));
    }

    #[test]
    fn test_gate_applied_to_whole_register() {
        let circuit = parse("qreg q[4]; h q;").unwrap();
        assert_eq!(circuit.instructions().len(), 4);
    }

    #[test]
    fn test_range_is_inclusive() {
        let circuit = parse("qubit[5] q; x q[1:3];").unwrap();
        assert_eq!(circuit.instructions().len(), 3);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = parse("qubit[2] q;\nx q[2];").unwrap_err();
        assert_eq!(
            err,
            ParseError::IndexOutOfBounds {
                line: 2,
                register: "q".into(),
                index: 2,
                size: 2
            }
        );
    }

    #[test]
    fn test_unknown_gate() {
        let err = parse("qubit q; frobnicate q;").unwrap_err();
        assert!(matches!(err, ParseError::UnknownGate { ref name, .. } if name == "frobnicate"));
    }

    #[test]
    fn test_gate_names_are_case_insensitive() {
        let circuit = parse("qubit[2] q; H q[0]; CX q[0], q[1];").unwrap();
        assert_eq!(circuit.instructions().len(), 2);
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse("qubit[2] q; h q[0], q[1];").unwrap_err();
        assert!(matches!(
            err,
            ParseError::WrongQubitCount {
                expected: 1,
                got: 2,
                ..
            }
        ));

        let err = parse("qubit q; rx q;").unwrap_err();
        assert!(matches!(
            err,
            ParseError::WrongParameterCount {
                expected: 1,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_qasm2_aliases() {
        let circuit = parse("qreg q[2]; u3(pi, 0, pi) q[0]; cu1(pi/2) q[0], q[1];").unwrap();
        let kinds: Vec<_> = circuit.instructions().iter().map(|i| &i.kind).collect();
        assert!(matches!(kinds[0], InstructionKind::Gate(StandardGate::U(..))));
        assert!(matches!(kinds[1], InstructionKind::Gate(StandardGate::CP(_))));
    }

    #[test]
    fn test_parameter_identifier_is_undefined() {
        let err = parse("qubit q; rx(theta) q;").unwrap_err();
        assert!(matches!(err, ParseError::UndefinedIdentifier { ref name, .. } if name == "theta"));
    }

    #[test]
    fn test_power_and_tau() {
        let circuit = parse("qubit q; rz(2 ** 2) q; rz(tau / 4) q;").unwrap();
        let InstructionKind::Gate(StandardGate::Rz(angle)) = &circuit.instructions()[0].kind else {
            panic!("expected rz");
        };
        assert!((angle.as_f64().unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_division_by_zero_rejected() {
        let err = parse("qubit q; rz(1/0) q;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidExpression { .. }));
    }

    #[test]
    fn test_measure_register_pairs() {
        let circuit = parse("qreg q[3]; creg c[3]; measure q -> c;").unwrap();
        assert_eq!(circuit.num_measurements(), 3);

        let err = parse("qreg q[3]; creg c[2]; measure q -> c;").unwrap_err();
        assert!(matches!(err, ParseError::RegisterSizeMismatch { .. }));
    }

    #[test]
    fn test_measure_requires_target() {
        assert!(parse("qreg q[1]; creg c[1]; measure q;").is_err());
    }

    #[test]
    fn test_redefinition() {
        let err = parse("qubit[2] q;\nbit[2] q;").unwrap_err();
        assert_eq!(
            err,
            ParseError::RedefinedIdentifier {
                line: 2,
                name: "q".into()
            }
        );
    }

    #[test]
    fn test_register_limit() {
        let limits = Limits {
            max_qubits: 4,
            max_clbits: 4,
        };
        assert!(parse_with_limits("qubit[4] q;", limits).is_ok());
        let err = parse_with_limits("qubit[3] a; qubit[2] b;", limits).unwrap_err();
        assert_eq!(
            err,
            ParseError::RegisterTooLarge {
                kind: "qubit",
                declared: 5,
                limit: 4
            }
        );
        let err = parse_with_limits("qubit[18446744073709551615] q;", limits).unwrap_err();
        assert!(matches!(err, ParseError::RegisterTooLarge { .. }));
    }

    #[test]
    fn test_barrier_forms() {
        let circuit = parse("qubit[3] q; barrier; barrier q[0], q[1];").unwrap();
        assert!(circuit.instructions().iter().all(|i| i.is_barrier()));
        assert_eq!(circuit.instructions()[0].qubits.len(), 3);
        assert_eq!(circuit.instructions()[1].qubits.len(), 2);
    }

    #[test]
    fn test_unsupported_constructs() {
        let err = parse("qubit q; bit c; c = measure q; if (c == 1) x q;").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));

        let err = parse("gate foo a { x a; }").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));

        let err = parse("include \"mylib.inc\";").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { .. }));
    }
}
