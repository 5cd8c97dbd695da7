//! qsimd rendering
//!
//! Turns a circuit into a diagram and a set of counts into a histogram, both
//! as 8-bit RGB PNG bytes. Drawing is done on a plain pixel buffer with an
//! 8x8 bitmap font, so no system fonts or graphics libraries are needed.
//!
//! # Example
//!
//! ```
//! use qsimd_hal::Counts;
//! use qsimd_ir::Circuit;
//! use qsimd_render::{PngRenderer, Renderer};
//!
//! let renderer = PngRenderer::default();
//! let diagram = renderer.render_circuit(&Circuit::bell().unwrap()).unwrap();
//! assert_eq!(&diagram[1..4], b"PNG");
//!
//! let counts = Counts::from_pairs([("00", 512), ("11", 488)]);
//! let histogram = renderer.render_histogram(&counts).unwrap();
//! assert!(!histogram.is_empty());
//! ```

mod canvas;
mod diagram;
pub mod error;
mod histogram;

pub use error::{RenderError, RenderResult};

use qsimd_hal::Counts;
use qsimd_ir::Circuit;

/// Produces encoded images of circuits and outcome distributions.
///
/// Each call is independent; a failure in one says nothing about the other.
pub trait Renderer: Send + Sync {
    /// Draw the circuit diagram.
    fn render_circuit(&self, circuit: &Circuit) -> RenderResult<Vec<u8>>;

    /// Draw a bar chart of the counts.
    fn render_histogram(&self, counts: &Counts) -> RenderResult<Vec<u8>>;
}

/// Layout and size settings for [`PngRenderer`].
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Font scale factor; glyphs are `8 * scale` pixels square.
    pub scale: u32,
    /// Vertical distance between wires.
    pub wire_spacing: u32,
    /// Horizontal gap between diagram columns.
    pub column_gap: u32,
    /// Blank border around the image.
    pub margin: u32,
    /// Height of the tallest histogram bar.
    pub plot_height: u32,
    /// Width of one histogram bar.
    pub bar_width: u32,
    /// Outcomes beyond this many are dropped from the histogram, least
    /// frequent first, and summarized as `+N more`.
    pub max_bars: usize,
    /// Largest image width produced.
    pub max_width: u32,
    /// Largest image height produced.
    pub max_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2,
            wire_spacing: 48,
            column_gap: 12,
            margin: 16,
            plot_height: 240,
            bar_width: 28,
            max_bars: 64,
            max_width: 4096,
            max_height: 4096,
        }
    }
}

/// The built-in PNG renderer.
#[derive(Debug, Clone, Default)]
pub struct PngRenderer {
    config: RenderConfig,
}

impl PngRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }
}

impl Renderer for PngRenderer {
    fn render_circuit(&self, circuit: &Circuit) -> RenderResult<Vec<u8>> {
        diagram::render(circuit, &self.config)
    }

    fn render_histogram(&self, counts: &Counts) -> RenderResult<Vec<u8>> {
        histogram::render(counts, &self.config)
    }
}
