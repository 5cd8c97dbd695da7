//! A minimal RGB raster with an 8x8 bitmap font and PNG output.

use font8x8::{BASIC_FONTS, GREEK_FONTS, UnicodeFonts};

use crate::error::{RenderError, RenderResult};

pub(crate) type Rgb = [u8; 3];

/// Glyph cell size in pixels at scale 1.
pub(crate) const GLYPH: u32 = 8;

pub(crate) struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Allocate a canvas, refusing anything larger than `max`.
    pub fn new(width: u32, height: u32, max: (u32, u32), background: Rgb) -> RenderResult<Self> {
        let (max_width, max_height) = max;
        if width > max_width || height > max_height {
            return Err(RenderError::TooLarge {
                width,
                height,
                max_width,
                max_height,
            });
        }
        let width = width.max(1);
        let height = height.max(1);
        let pixels = background.repeat(width as usize * height as usize);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    fn put(&mut self, x: u32, y: u32, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[i..i + 3].copy_from_slice(&color);
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        for yy in y..y.saturating_add(h).min(self.height) {
            for xx in x..x.saturating_add(w).min(self.width) {
                self.put(xx, yy, color);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        if w == 0 || h == 0 {
            return;
        }
        self.hline(x, x + w - 1, y, color);
        self.hline(x, x + w - 1, y + h - 1, color);
        self.vline(x, y, y + h - 1, color);
        self.vline(x + w - 1, y, y + h - 1, color);
    }

    /// Horizontal line, both ends included.
    pub fn hline(&mut self, x0: u32, x1: u32, y: u32, color: Rgb) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.put(x, y, color);
        }
    }

    /// Vertical line, both ends included.
    pub fn vline(&mut self, x: u32, y0: u32, y1: u32, color: Rgb) {
        for y in y0.min(y1)..=y0.max(y1) {
            self.put(x, y, color);
        }
    }

    pub fn dashed_vline(&mut self, x: u32, y0: u32, y1: u32, dash: u32, color: Rgb) {
        let dash = dash.max(1);
        for y in y0.min(y1)..=y0.max(y1) {
            if (y / dash) % 2 == 0 {
                self.put(x, y, color);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: u32, cy: u32, r: u32, color: Rgb) {
        self.circle(cx, cy, r, color, |d2, r2| d2 <= r2);
    }

    /// One-pixel-wide circle outline.
    pub fn ring(&mut self, cx: u32, cy: u32, r: u32, color: Rgb) {
        let inner = i64::from(r.saturating_sub(1));
        self.circle(cx, cy, r, color, |d2, r2| {
            d2 <= r2 && d2 > inner * inner
        });
    }

    fn circle(&mut self, cx: u32, cy: u32, r: u32, color: Rgb, inside: impl Fn(i64, i64) -> bool) {
        let r2 = i64::from(r) * i64::from(r);
        for y in cy.saturating_sub(r)..=cy.saturating_add(r) {
            for x in cx.saturating_sub(r)..=cx.saturating_add(r) {
                let dx = i64::from(x) - i64::from(cx);
                let dy = i64::from(y) - i64::from(cy);
                if inside(dx * dx + dy * dy, r2) {
                    self.put(x, y, color);
                }
            }
        }
    }

    /// Diagonal cross centred on (cx, cy), as drawn on swap targets.
    pub fn cross(&mut self, cx: u32, cy: u32, half: u32, color: Rgb) {
        for d in 0..=2 * half {
            let x = (cx + d).saturating_sub(half);
            self.put(x, (cy + d).saturating_sub(half), color);
            self.put(x, (cy + half).saturating_sub(d), color);
        }
    }

    /// Draw `text` with its top-left corner at (x, y).
    pub fn text(&mut self, x: u32, y: u32, text: &str, scale: u32, color: Rgb) {
        let scale = scale.max(1);
        for (n, ch) in text.chars().enumerate() {
            let origin = x + n as u32 * GLYPH * scale;
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..GLYPH {
                    if bits & (1 << col) != 0 {
                        self.fill_rect(
                            origin + col * scale,
                            y + row as u32 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }

    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// Pixel width of `text` at `scale`.
pub(crate) fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH * scale.max(1)
}

/// Bitmap for a character; `?` for anything the font lacks.
fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}
