//! Outcome histogram.
//!
//! One bar per bitstring in key order, height proportional to its count.
//! Counts are printed above the bars and bitstrings run vertically below
//! the axis, one character per glyph row. When outcomes are dropped to
//! respect `max_bars`, a `+N more` note follows the last bar.

use qsimd_hal::Counts;

use crate::RenderConfig;
use crate::canvas::{Canvas, GLYPH, Rgb, text_width};
use crate::error::{RenderError, RenderResult};

const BACKGROUND: Rgb = [255, 255, 255];
const AXIS: Rgb = [40, 40, 40];
const BAR: Rgb = [66, 110, 190];
const INK: Rgb = [0, 0, 0];

/// Space between the axis and the first bar, and between bars.
fn bar_gap(config: &RenderConfig) -> u32 {
    (config.bar_width / 4).max(2)
}

/// Outcomes to plot, capped at `max_bars` by keeping the most frequent.
fn visible(counts: &Counts, max_bars: usize) -> Vec<(&String, u64)> {
    let mut bars = counts.sorted_by_count();
    bars.truncate(max_bars.max(1));
    bars.sort_by(|a, b| a.0.cmp(b.0));
    bars
}

/// Note for outcomes left off the plot, if any were.
fn hidden_note(counts: &Counts, shown: usize) -> Option<String> {
    let hidden = counts.len().saturating_sub(shown);
    (hidden > 0).then(|| format!("+{hidden} more"))
}

pub(crate) fn render(counts: &Counts, config: &RenderConfig) -> RenderResult<Vec<u8>> {
    if counts.is_empty() {
        return Err(RenderError::Empty("no outcomes".into()));
    }

    let bars = visible(counts, config.max_bars);
    let note = hidden_note(counts, bars.len());
    let peak = bars.iter().map(|&(_, n)| n).max().unwrap_or(1).max(1);
    let label_rows = bars
        .iter()
        .map(|(key, _)| key.chars().count() as u32)
        .max()
        .unwrap_or(0);

    let gap = bar_gap(config);
    let pitch = config.bar_width.saturating_add(gap);
    let plot_width = pitch.saturating_mul(u32::try_from(bars.len()).unwrap_or(u32::MAX));
    let note_width = note
        .as_deref()
        .map_or(0, |note| gap.saturating_add(text_width(note, 1)));

    let plot_left = config.margin;
    let plot_top = config.margin + GLYPH + 4;
    let baseline = plot_top + config.plot_height;

    let width = (2 * config.margin)
        .saturating_add(gap)
        .saturating_add(plot_width)
        .saturating_add(note_width);
    let height = baseline
        .saturating_add(4)
        .saturating_add(label_rows.saturating_mul(GLYPH))
        .saturating_add(config.margin);

    let mut canvas = Canvas::new(
        width,
        height,
        (config.max_width, config.max_height),
        BACKGROUND,
    )?;

    canvas.vline(plot_left, plot_top, baseline, AXIS);
    canvas.hline(plot_left, width - config.margin, baseline, AXIS);

    let mut x = plot_left + gap;
    for (key, n) in &bars {
        let h = bar_height(*n, peak, config.plot_height);
        canvas.fill_rect(x, baseline - h, config.bar_width, h, BAR);

        let label = n.to_string();
        let label_x = (x + config.bar_width / 2).saturating_sub(text_width(&label, 1) / 2);
        canvas.text(label_x, baseline - h - GLYPH - 2, &label, 1, INK);

        let char_x = x + config.bar_width.saturating_sub(GLYPH) / 2;
        for (row, ch) in key.chars().enumerate() {
            let mut buf = [0u8; 4];
            canvas.text(
                char_x,
                baseline + 4 + row as u32 * GLYPH,
                ch.encode_utf8(&mut buf),
                1,
                INK,
            );
        }

        x += pitch;
    }

    if let Some(note) = &note {
        canvas.text(x, baseline - GLYPH - 2, note, 1, INK);
    }

    canvas.encode_png()
}

/// Bar height in pixels; any non-zero count gets at least one pixel.
fn bar_height(count: u64, peak: u64, plot_height: u32) -> u32 {
    if count == 0 {
        return 0;
    }
    let scaled = count.saturating_mul(u64::from(plot_height)) / peak;
    u32::try_from(scaled).unwrap_or(plot_height).clamp(1, plot_height)
}
