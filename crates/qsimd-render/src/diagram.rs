//! Circuit diagram layout.
//!
//! One horizontal wire per qubit, labelled `reg[i]` when the qubit came from
//! a named register, plus a double wire for the classical bits when the
//! circuit has any. Instructions are placed in the columns
//! given by [`Circuit::layers`].

use qsimd_ir::{Circuit, Clbit, Instruction, InstructionKind, Qubit, StandardGate};

use crate::RenderConfig;
use crate::canvas::{Canvas, GLYPH, Rgb, text_width};
use crate::error::{RenderError, RenderResult};

const BACKGROUND: Rgb = [255, 255, 255];
const WIRE: Rgb = [60, 60, 60];
const BOX_FILL: Rgb = [222, 234, 252];
const BOX_EDGE: Rgb = [32, 64, 128];
const INK: Rgb = [0, 0, 0];
const BARRIER: Rgb = [150, 150, 150];

/// Inner padding of a gate box around its label.
const BOX_PADDING: u32 = 6;

struct Layout<'a> {
    config: &'a RenderConfig,
    qubit_labels: Vec<String>,
    classical_label: String,
    label_width: u32,
    num_qubits: usize,
    has_clbits: bool,
}

impl Layout<'_> {
    fn row_y(&self, row: usize) -> u32 {
        self.config.margin + self.config.wire_spacing / 2 + row as u32 * self.config.wire_spacing
    }

    fn classical_y(&self) -> u32 {
        self.row_y(self.num_qubits)
    }

    fn box_height(&self) -> u32 {
        GLYPH * self.config.scale + 2 * BOX_PADDING
    }

    fn min_column_width(&self) -> u32 {
        self.box_height()
    }
}

/// Text shown in an instruction's box, if it draws one.
fn box_label(instruction: &Instruction) -> Option<String> {
    match &instruction.kind {
        InstructionKind::Gate(gate) => match gate {
            StandardGate::CX
            | StandardGate::CCX
            | StandardGate::CZ
            | StandardGate::Swap
            | StandardGate::CSwap => None,
            other => Some(other.label()),
        },
        InstructionKind::Measure => Some("M".into()),
        InstructionKind::Reset => Some("|0>".into()),
        InstructionKind::Barrier => None,
    }
}

/// The classical wire is named after its register when all bits share one.
fn classical_label(circuit: &Circuit) -> String {
    let mut registers = circuit.clbits().iter().map(Clbit::register);
    match registers.next() {
        Some(Some(first)) if registers.all(|r| r == Some(first)) => first.to_string(),
        _ => "c".to_string(),
    }
}

fn column_width(layout: &Layout<'_>, column: &[&Instruction]) -> u32 {
    column
        .iter()
        .filter_map(|inst| box_label(inst))
        .map(|label| text_width(&label, layout.config.scale) + 2 * BOX_PADDING)
        .max()
        .unwrap_or(0)
        .max(layout.min_column_width())
}

pub(crate) fn render(circuit: &Circuit, config: &RenderConfig) -> RenderResult<Vec<u8>> {
    if circuit.num_qubits() == 0 {
        return Err(RenderError::Empty("circuit has no qubits".into()));
    }

    let num_qubits = circuit.num_qubits();
    let has_clbits = circuit.num_clbits() > 0;
    let qubit_labels: Vec<String> = circuit.qubits().iter().map(Qubit::label).collect();
    let classical_label = classical_label(circuit);
    let label_width = qubit_labels
        .iter()
        .chain(has_clbits.then_some(&classical_label))
        .map(|label| text_width(label, config.scale))
        .max()
        .unwrap_or(0)
        + config.column_gap;
    let layout = Layout {
        config,
        qubit_labels,
        classical_label,
        label_width,
        num_qubits,
        has_clbits,
    };

    let columns = circuit.layers();
    let widths: Vec<u32> = columns.iter().map(|c| column_width(&layout, c)).collect();

    let rows = num_qubits + usize::from(has_clbits);
    let body: u32 = widths
        .iter()
        .fold(0u32, |acc, w| acc.saturating_add(w.saturating_add(config.column_gap)));
    let width = (2 * config.margin)
        .saturating_add(layout.label_width)
        .saturating_add(body.max(layout.min_column_width()))
        .saturating_add(config.column_gap);
    let height = (2 * config.margin)
        .saturating_add(u32::try_from(rows).unwrap_or(u32::MAX).saturating_mul(config.wire_spacing));

    let mut canvas = Canvas::new(
        width,
        height,
        (config.max_width, config.max_height),
        BACKGROUND,
    )?;

    draw_wires(&mut canvas, &layout, width);

    let mut x = config.margin + layout.label_width + config.column_gap;
    for (column, w) in columns.iter().zip(&widths) {
        let center = x + w / 2;
        for instruction in column {
            draw_instruction(&mut canvas, &layout, instruction, center);
        }
        x += w + config.column_gap;
    }

    canvas.encode_png()
}

fn draw_wires(canvas: &mut Canvas, layout: &Layout<'_>, width: u32) {
    let scale = layout.config.scale;
    let x0 = layout.config.margin + layout.label_width;
    let x1 = width - layout.config.margin;
    let text_offset = GLYPH * scale / 2;

    for (row, label) in layout.qubit_labels.iter().enumerate() {
        let y = layout.row_y(row);
        canvas.text(layout.config.margin, y - text_offset, label, scale, INK);
        canvas.hline(x0, x1, y, WIRE);
    }

    if layout.has_clbits {
        let y = layout.classical_y();
        canvas.text(
            layout.config.margin,
            y - text_offset,
            &layout.classical_label,
            scale,
            INK,
        );
        canvas.hline(x0, x1, y - 2, WIRE);
        canvas.hline(x0, x1, y + 2, WIRE);
    }
}

fn draw_box(canvas: &mut Canvas, layout: &Layout<'_>, center: u32, y: u32, label: &str) {
    let scale = layout.config.scale;
    let w = text_width(label, scale) + 2 * BOX_PADDING;
    let h = layout.box_height();
    let left = center - w / 2;
    let top = y - h / 2;
    canvas.fill_rect(left, top, w, h, BOX_FILL);
    canvas.stroke_rect(left, top, w, h, BOX_EDGE);
    canvas.text(left + BOX_PADDING, top + BOX_PADDING, label, scale, INK);
}

fn draw_instruction(canvas: &mut Canvas, layout: &Layout<'_>, instruction: &Instruction, x: u32) {
    let rows: Vec<usize> = instruction.qubits.iter().map(|q| q.0 as usize).collect();
    let ys: Vec<u32> = rows.iter().map(|&r| layout.row_y(r)).collect();
    let top = ys.iter().copied().min().unwrap_or(0);
    let bottom = ys.iter().copied().max().unwrap_or(0);
    let dot = (layout.config.scale * 2).max(3);

    match &instruction.kind {
        InstructionKind::Gate(gate) => {
            if ys.len() > 1 {
                canvas.vline(x, top, bottom, WIRE);
            }
            let controls = gate.num_controls().min(ys.len());
            for &y in &ys[..controls] {
                canvas.fill_circle(x, y, dot, WIRE);
            }
            let targets = &ys[controls..];

            match gate {
                StandardGate::CX | StandardGate::CCX => {
                    for &y in targets {
                        let r = layout.box_height() / 2 - 2;
                        canvas.fill_circle(x, y, r, BACKGROUND);
                        canvas.ring(x, y, r, WIRE);
                        canvas.hline(x - r, x + r, y, WIRE);
                        canvas.vline(x, y - r, y + r, WIRE);
                    }
                }
                StandardGate::CZ => {
                    for &y in targets {
                        canvas.fill_circle(x, y, dot, WIRE);
                    }
                }
                StandardGate::Swap | StandardGate::CSwap => {
                    for &y in targets {
                        canvas.cross(x, y, dot * 2, WIRE);
                    }
                }
                other => {
                    let label = other.label();
                    for &y in targets {
                        draw_box(canvas, layout, x, y, &label);
                    }
                }
            }
        }
        InstructionKind::Measure => {
            if layout.has_clbits {
                let cy = layout.classical_y();
                canvas.vline(x - 1, top, cy, WIRE);
                canvas.vline(x + 1, top, cy, WIRE);
                for clbit in &instruction.clbits {
                    canvas.text(
                        x + 4,
                        cy + 4,
                        &clbit.0.to_string(),
                        1,
                        INK,
                    );
                }
            }
            for &y in &ys {
                draw_box(canvas, layout, x, y, "M");
            }
        }
        InstructionKind::Reset => {
            for &y in &ys {
                draw_box(canvas, layout, x, y, "|0>");
            }
        }
        InstructionKind::Barrier => {
            let half = layout.config.wire_spacing / 2;
            canvas.dashed_vline(x, top - half + 2, bottom + half - 2, 4, BARRIER);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsimd_ir::{ClbitId, QubitId};

    fn decode(bytes: &[u8]) -> (u32, u32) {
        let decoder = png::Decoder::new(bytes);
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        (info.width, info.height)
    }

    #[test]
    fn test_bell_diagram_is_png() {
        let circuit = Circuit::bell().unwrap();
        let bytes = render(&circuit, &RenderConfig::default()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let config = RenderConfig::default();
        let (_, height) = decode(&bytes);
        // Two qubit wires and one classical wire.
        assert_eq!(height, 2 * config.margin + 3 * config.wire_spacing);
    }

    #[test]
    fn test_wider_circuit_gives_wider_image() {
        let mut short = Circuit::with_size("short", 1, 1);
        short.h(QubitId(0)).unwrap();
        let mut long = short.clone();
        for _ in 0..10 {
            long.h(QubitId(0)).unwrap();
        }

        let config = RenderConfig::default();
        let (w_short, _) = decode(&render(&short, &config).unwrap());
        let (w_long, _) = decode(&render(&long, &config).unwrap());
        assert!(w_long > w_short);
    }

    #[test]
    fn test_every_instruction_kind_draws() {
        let mut circuit = Circuit::with_size("all", 3, 2);
        circuit.h(QubitId(0)).unwrap();
        circuit.rx(std::f64::consts::FRAC_PI_2, QubitId(1)).unwrap();
        circuit.cz(QubitId(0), QubitId(2)).unwrap();
        circuit.swap(QubitId(1), QubitId(2)).unwrap();
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        circuit.barrier_all().unwrap();
        circuit.reset(QubitId(1)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.measure(QubitId(2), ClbitId(1)).unwrap();

        assert!(render(&circuit, &RenderConfig::default()).is_ok());
    }

    #[test]
    fn test_no_instructions_still_draws_wires() {
        let circuit = Circuit::with_size("empty", 2, 0);
        assert!(render(&circuit, &RenderConfig::default()).is_ok());
    }

    #[test]
    fn test_register_names_widen_the_label_column() {
        let mut anonymous = Circuit::new("anonymous");
        anonymous.add_qubit();
        anonymous.add_clbit();
        anonymous.measure(QubitId(0), ClbitId(0)).unwrap();

        let mut named = Circuit::new("named");
        named.add_qreg("ancilla", 1);
        named.add_creg("result", 1);
        named.measure(QubitId(0), ClbitId(0)).unwrap();

        let config = RenderConfig::default();
        let (w_anonymous, _) = decode(&render(&anonymous, &config).unwrap());
        let (w_named, _) = decode(&render(&named, &config).unwrap());
        let extra = text_width("ancilla[0]", config.scale) - text_width("q0", config.scale);
        assert_eq!(w_named - w_anonymous, extra);
    }

    #[test]
    fn test_classical_label() {
        let mut circuit = Circuit::new("one");
        circuit.add_creg("out", 2);
        assert_eq!(classical_label(&circuit), "out");

        circuit.add_creg("flags", 1);
        assert_eq!(classical_label(&circuit), "c");

        assert_eq!(classical_label(&Circuit::with_size("plain", 1, 1)), "c");
    }

    #[test]
    fn test_zero_qubits_is_empty() {
        let circuit = Circuit::new("nothing");
        let err = render(&circuit, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::Empty(_)));
    }

    #[test]
    fn test_size_limit() {
        let circuit = Circuit::ghz(10).unwrap();
        let config = RenderConfig {
            max_height: 100,
            ..RenderConfig::default()
        };
        let err = render(&circuit, &config).unwrap_err();
        assert!(matches!(err, RenderError::TooLarge { .. }));
    }
}
