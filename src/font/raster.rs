//! Glyph rasterization
//!
//! The atlas asks a `GlyphRasterizer` for pixels on every cache miss.
//! `FontdueRasterizer` draws real glyphs from a TTF/OTF font;
//! `BoxRasterizer` draws solid boxes with fixed metrics for headless use.

use fontdue::{Font, FontSettings};
use log::{debug, info};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::atlas::GlyphKey;
use super::FontError;

/// Supersampling scale (2.0 = 2x high quality)
const RENDER_SCALE: f32 = 2.0;

/// Italic shear (horizontal pixels per vertical pixel)
const ITALIC_SHEAR: f32 = 0.2;

/// Size of one grid cell in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

impl CellSize {
    /// Pixel size of a cols x rows area
    pub fn area(&self, cols: usize, rows: usize) -> (u32, u32) {
        (
            (cols as f32 * self.width).ceil() as u32,
            (rows as f32 * self.height).ceil() as u32,
        )
    }
}

/// Coverage bitmap for one glyph, one cell tall, baseline already applied
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    /// Width in pixels as measured by the font (may exceed one cell)
    pub width: u32,
    pub height: u32,
    /// Row-major coverage, `width * height` bytes
    pub bitmap: Vec<u8>,
}

/// Font collaborator used by the atlas
pub trait GlyphRasterizer {
    /// Cell metrics of the current font
    fn cell_size(&self) -> CellSize;

    /// Draw a glyph; None if the font has nothing for this text
    fn rasterize(&mut self, key: &GlyphKey) -> Option<RasterizedGlyph>;
}

/// Number of cells a text occupies (at least one)
fn cell_span(text: &str) -> u32 {
    UnicodeWidthStr::width(text).max(1) as u32
}

/// Draw underline / strikethrough rows into a bitmap
fn decorate(glyph: &mut RasterizedGlyph, key: &GlyphKey, baseline: u32) {
    let w = glyph.width as usize;
    let mut fill_row = |y: u32| {
        if y < glyph.height {
            let start = y as usize * w;
            glyph.bitmap[start..start + w].fill(255);
        }
    };
    if key.underline {
        fill_row(baseline + 1);
    }
    if key.strikethrough {
        fill_row(baseline.saturating_sub(glyph.height / 4));
    }
}

/// Fixed-metrics rasterizer drawing a solid box per glyph
#[derive(Debug, Clone)]
pub struct BoxRasterizer {
    cell: CellSize,
    calls: usize,
}

impl BoxRasterizer {
    pub fn new(cell: CellSize) -> Self {
        Self { cell, calls: 0 }
    }

    /// Number of glyphs rasterized so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl GlyphRasterizer for BoxRasterizer {
    fn cell_size(&self) -> CellSize {
        self.cell
    }

    fn rasterize(&mut self, key: &GlyphKey) -> Option<RasterizedGlyph> {
        if key.text.is_empty() {
            return None;
        }
        self.calls += 1;

        let width = (cell_span(&key.text) as f32 * self.cell.width).ceil() as u32;
        let height = self.cell.height.ceil() as u32;
        let mut bitmap = vec![0u8; width as usize * height as usize];
        // Solid box with a one pixel margin
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                bitmap[(y * width + x) as usize] = 255;
            }
        }

        let mut glyph = RasterizedGlyph { width, height, bitmap };
        decorate(&mut glyph, key, height * 3 / 4);
        Some(glyph)
    }
}

/// Rasterizer backed by a fontdue font
pub struct FontdueRasterizer {
    font: Font,
    /// Rasterize size (font_size * RENDER_SCALE)
    render_size: f32,
    cell: CellSize,
    /// Baseline Y position (distance from cell top)
    ascent: f32,
}

impl FontdueRasterizer {
    /// Load a font and derive cell metrics for `font_size` pixels.
    ///
    /// `linespace` adds extra pixels to every row.
    pub fn new(font_data: &[u8], font_size: f32, linespace: u32) -> Result<Self, FontError> {
        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let metrics = font
            .horizontal_line_metrics(font_size)
            .ok_or(FontError::MissingMetrics)?;
        let ascent = metrics.ascent + (linespace / 2) as f32;
        let cell_height = (metrics.ascent - metrics.descent).ceil() + linespace as f32;

        // Determine cell width from 'M' advance
        let cell_width = font.metrics('M', font_size).advance_width.ceil().max(1.0);

        info!(
            "Font metrics: ascent={:.1}, cell={}x{}",
            ascent, cell_width, cell_height
        );

        Ok(Self {
            font,
            render_size: font_size * RENDER_SCALE,
            cell: CellSize {
                width: cell_width,
                height: cell_height,
            },
            ascent,
        })
    }

    /// Draw one character into `canvas` with its pen at `pen_x`
    fn draw_char(&self, ch: char, pen_x: f32, key: &GlyphKey, canvas: &mut RasterizedGlyph) -> f32 {
        let (metrics, bitmap) = self.font.rasterize(ch, self.render_size);
        let bw = metrics.width;
        let bh = metrics.height;
        let x0 = pen_x + metrics.xmin as f32 / RENDER_SCALE;
        // fontdue ymin is the offset of the bitmap bottom from the baseline
        let top = self.ascent - (metrics.ymin as f32 + bh as f32) / RENDER_SCALE;

        // Downsample the supersampled bitmap by nearest pick with max blend
        let out_w = (bw as f32 / RENDER_SCALE).ceil() as usize;
        let out_h = (bh as f32 / RENDER_SCALE).ceil() as usize;
        for oy in 0..out_h {
            let y = top + oy as f32;
            if y < 0.0 || y >= canvas.height as f32 {
                continue;
            }
            let shear = if key.italic {
                ((out_h - oy) as f32 * ITALIC_SHEAR).round()
            } else {
                0.0
            };
            for ox in 0..out_w {
                let sx = ((ox as f32) * RENDER_SCALE) as usize;
                let sy = ((oy as f32) * RENDER_SCALE) as usize;
                let Some(&coverage) = bitmap.get(sy * bw + sx) else {
                    continue;
                };
                let x = (x0 + shear + ox as f32).round();
                if x < 0.0 || x >= canvas.width as f32 {
                    continue;
                }
                let idx = y as usize * canvas.width as usize + x as usize;
                canvas.bitmap[idx] = canvas.bitmap[idx].max(coverage);
                // Synthetic bold: smear one pixel right
                if key.bold && (x as u32 + 1) < canvas.width {
                    canvas.bitmap[idx + 1] = canvas.bitmap[idx + 1].max(coverage);
                }
            }
        }
        metrics.advance_width / RENDER_SCALE
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn cell_size(&self) -> CellSize {
        self.cell
    }

    fn rasterize(&mut self, key: &GlyphKey) -> Option<RasterizedGlyph> {
        let first = key.text.chars().next()?;
        if self.font.lookup_glyph_index(first) == 0 {
            debug!("Glyph not found: U+{:04X} '{}'", first as u32, first);
            return None;
        }

        // Width as measured by the font, but never narrower than the cells
        // the text occupies
        let advance: f32 = key
            .text
            .chars()
            .map(|c| self.font.metrics(c, self.render_size).advance_width / RENDER_SCALE)
            .sum();
        let span_px = cell_span(&key.text) as f32 * self.cell.width;
        let width = advance.max(span_px).ceil().max(1.0) as u32;
        let height = self.cell.height.ceil() as u32;

        let mut glyph = RasterizedGlyph {
            width,
            height,
            bitmap: vec![0u8; width as usize * height as usize],
        };
        let mut pen_x = 0.0;
        for ch in key.text.chars() {
            // Combining marks draw over the previous base
            if UnicodeWidthChar::width(ch) == Some(0) {
                self.draw_char(ch, 0.0_f32.max(pen_x - self.cell.width), key, &mut glyph);
                continue;
            }
            pen_x += self.draw_char(ch, pen_x, key, &mut glyph);
        }

        decorate(&mut glyph, key, self.ascent.round() as u32);
        Some(glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> CellSize {
        CellSize {
            width: 8.0,
            height: 16.0,
        }
    }

    #[test]
    fn test_box_width_follows_display_width() {
        let mut r = BoxRasterizer::new(cell());
        assert_eq!(r.rasterize(&GlyphKey::plain("a")).unwrap().width, 8);
        assert_eq!(r.rasterize(&GlyphKey::plain("あ")).unwrap().width, 16);
        assert!(r.rasterize(&GlyphKey::plain("")).is_none());
        assert_eq!(r.calls(), 2);
    }

    #[test]
    fn test_box_bitmap_size() {
        let mut r = BoxRasterizer::new(cell());
        let g = r.rasterize(&GlyphKey::plain("x")).unwrap();
        assert_eq!(g.bitmap.len(), (g.width * g.height) as usize);
        assert_eq!(g.bitmap[0], 0);
        assert_eq!(g.bitmap[(2 * g.width + 2) as usize], 255);
    }

    #[test]
    fn test_underline_row() {
        let mut r = BoxRasterizer::new(cell());
        let mut key = GlyphKey::plain("x");
        key.underline = true;
        let g = r.rasterize(&key).unwrap();
        let row = 16 * 3 / 4 + 1;
        assert!(g.bitmap[row * 8..row * 8 + 8].iter().all(|&p| p == 255));
    }

    #[test]
    fn test_cell_area() {
        assert_eq!(cell().area(80, 24), (640, 384));
    }

    #[test]
    fn test_invalid_font_data() {
        assert!(FontdueRasterizer::new(b"not a font", 14.0, 0).is_err());
    }
}
