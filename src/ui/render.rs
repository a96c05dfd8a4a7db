//! Frame building
//!
//! Turns dirty cells into draw commands with their atlas rects. When the
//! atlas resets while a frame is being built, every rect collected so far
//! is stale, so all grids are marked dirty and the frame is built again.

use std::time::Instant;

use log::warn;
use smol_str::SmolStr;
use unicode_width::UnicodeWidthStr;

use super::highlight::{ResolvedAttribute, StyleFlags};
use super::{CursorStyle, UiState};
use crate::font::{AtlasRect, GlyphKey, GlyphRasterizer};

/// One cell to draw
#[derive(Debug, Clone, PartialEq)]
pub struct CellDraw {
    pub grid: u64,
    pub screen_row: i64,
    pub screen_col: i64,
    /// Number of screen columns the glyph covers
    pub span: u32,
    pub text: SmolStr,
    pub attr: ResolvedAttribute,
    /// Glyph location in the atlas; None draws background only
    pub glyph: Option<AtlasRect>,
}

/// Cursor to draw on top of the cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorDraw {
    /// Top-left pixel position
    pub x: f32,
    pub y: f32,
    pub style: CursorStyle,
}

#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub cells: Vec<CellDraw>,
    pub cursor: Option<CursorDraw>,
    /// The atlas was reset; the texture must be re-uploaded in full
    pub atlas_reset: bool,
    /// Cursor still moving; another frame is wanted
    pub animating: bool,
}

/// Whether a cell needs a glyph at all
fn needs_glyph(text: &str, flags: StyleFlags) -> bool {
    if text.trim().is_empty() {
        // Blank cells only matter for their decorations
        return !text.is_empty()
            && flags.intersects(StyleFlags::UNDERLINE | StyleFlags::UNDERCURL | StyleFlags::STRIKETHROUGH);
    }
    true
}

/// Collect draw commands for every dirty cell
fn collect_cells(state: &mut UiState, rasterizer: &mut dyn GlyphRasterizer) -> Vec<CellDraw> {
    let dirty = state.grids.take_dirty();
    let mut cells = Vec::with_capacity(dirty.len());
    for cell in dirty {
        let glyph = if needs_glyph(&cell.text, cell.attr.flags) {
            state
                .atlas
                .resolve(&GlyphKey::new(&cell.text, cell.attr.flags), rasterizer)
        } else {
            None
        };
        cells.push(CellDraw {
            grid: cell.grid,
            screen_row: cell.screen_row,
            screen_col: cell.screen_col,
            span: UnicodeWidthStr::width(cell.text.as_str()).max(1) as u32,
            text: cell.text,
            attr: cell.attr,
            glyph,
        });
    }
    cells
}

/// Build the next frame, consuming dirty flags
pub fn build_frame(state: &mut UiState, rasterizer: &mut dyn GlyphRasterizer, now: Instant) -> Frame {
    // Font metrics may have changed under us
    let cell_size = rasterizer.cell_size();
    state.set_cell_size(cell_size);

    // Atlas cleared since the last frame: nothing drawn so far is valid
    if state.atlas.generation() != state.rendered_generation {
        state.grids.mark_all_dirty();
    }

    let generation = state.atlas.generation();
    let mut cells = collect_cells(state, rasterizer);
    if state.atlas.generation() != generation {
        state.grids.mark_all_dirty();
        let retry = state.atlas.generation();
        cells = collect_cells(state, rasterizer);
        if state.atlas.generation() != retry {
            warn!("Visible glyphs do not fit in the atlas; frame may show stale glyphs");
        }
    }
    let atlas_reset = state.atlas.generation() != state.rendered_generation;
    state.rendered_generation = state.atlas.generation();

    let animating = state.cursor.tick(now);
    let cursor = state.cursor_visible().then(|| {
        let (x, y) = state
            .cursor
            .current_pixel_position(now, state.cell_size.width, state.row_height());
        CursorDraw {
            x,
            y,
            style: state.cursor_style(),
        }
    });

    state.frame_ready = false;
    Frame {
        cells,
        cursor,
        atlas_reset,
        animating,
    }
}
