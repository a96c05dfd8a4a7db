//! Editor screen model
//!
//! Core module integrating grids, highlights, modes and the cursor with the
//! glyph atlas. `UiState` is the per-connection context: it is built once,
//! fed decoded batches by the dispatcher and read by the renderer.

pub mod cursor;
pub mod dispatch;
pub mod grid;
pub mod highlight;
pub mod manager;
pub mod mode;
pub mod queue;
pub mod render;

use std::time::Duration;

use log::info;

use crate::config::Config;
use crate::font::{CellSize, GlyphAtlas};
use crate::protocol::{RedrawEvent, UiOptions};

use cursor::Cursor;
use highlight::DefaultColors;
use manager::GridManager;
use mode::{CursorShape, Mode};

pub use dispatch::{BatchOutcome, NullWindow, WindowHandler};
pub use queue::{batch_queue, Batch, BatchReceiver, BatchSender};
pub use render::{build_frame, CellDraw, CursorDraw, Frame};

/// Cursor appearance for the active mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorStyle {
    pub shape: CursorShape,
    /// Share of the cell covered by bar cursors (0-100)
    pub cell_percentage: u8,
    /// (wait, on, off) in milliseconds when the mode blinks
    pub blink: Option<(u64, u64, u64)>,
    /// Cursor fill color (0xRRGGBB)
    pub background: u32,
    /// Color of the character under a block cursor (0xRRGGBB)
    pub foreground: u32,
}

/// Screen model context
pub struct UiState {
    pub(crate) grids: GridManager,
    pub(crate) atlas: GlyphAtlas,
    pub(crate) mode: Mode,
    pub(crate) cursor: Cursor,
    pub(crate) options: UiOptions,
    pub(crate) cell_size: CellSize,
    pub(crate) title: String,
    pub(crate) busy: bool,
    pub(crate) hide_when_busy: bool,
    pub(crate) mouse_enabled: bool,
    /// A flush arrived since the last frame was built
    pub(crate) frame_ready: bool,
    /// Atlas generation the last frame was built against
    pub(crate) rendered_generation: u64,
    /// Events received after a flush whose frame is not rendered yet
    pub(crate) deferred: Vec<RedrawEvent>,
}

impl UiState {
    pub fn new(config: &Config, cell_size: CellSize) -> Self {
        let fallback = DefaultColors {
            foreground: config.appearance.foreground_rgb(),
            background: config.appearance.background_rgb(),
            special: config.appearance.special_rgb(),
        };
        let atlas = GlyphAtlas::new(
            config.atlas.width,
            config.atlas.height,
            cell_size.height.ceil() as u32,
        );

        info!(
            "UI state initialized: cell={}x{}, atlas={}x{}",
            cell_size.width, cell_size.height, config.atlas.width, config.atlas.height
        );

        Self {
            grids: GridManager::new(fallback),
            atlas,
            mode: Mode::new(),
            cursor: Cursor::new(Duration::from_millis(config.cursor.animation_length_ms)),
            options: UiOptions::default(),
            cell_size,
            title: String::new(),
            busy: false,
            hide_when_busy: config.cursor.hide_when_busy,
            mouse_enabled: true,
            frame_ready: false,
            rendered_generation: 0,
            deferred: Vec::new(),
        }
    }

    pub fn grids(&self) -> &GridManager {
        &self.grids
    }

    pub fn grids_mut(&mut self) -> &mut GridManager {
        &mut self.grids
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut GlyphAtlas {
        &mut self.atlas
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn options(&self) -> &UiOptions {
        &self.options
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    /// Whether a flush arrived that has not been rendered yet
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    /// Events held back until the pending frame has been rendered
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Font metrics changed: the atlas is rebuilt and everything repainted
    pub fn set_cell_size(&mut self, cell_size: CellSize) {
        if cell_size == self.cell_size {
            return;
        }
        info!(
            "Cell size change: {}x{} -> {}x{}",
            self.cell_size.width, self.cell_size.height, cell_size.width, cell_size.height
        );
        self.cell_size = cell_size;
        self.atlas.set_cell_height(cell_size.height.ceil() as u32);
        self.grids.mark_all_dirty();
    }

    /// Row height including the editor's `linespace`
    pub fn row_height(&self) -> f32 {
        self.cell_size.height + self.options.linespace_px() as f32
    }

    /// Screen cell the cursor logically sits on (grid origin applied)
    pub fn cursor_screen_target(&self) -> Option<(f32, f32)> {
        let (grid, row, col) = self.cursor.logical();
        let (origin_row, origin_col) = self.grids.grid(grid)?.origin();
        Some(((origin_row + row as i64) as f32, (origin_col + col as i64) as f32))
    }

    /// Cursor is drawn unless its grid is gone/hidden or the editor is busy
    pub fn cursor_visible(&self) -> bool {
        if self.busy && self.hide_when_busy {
            return false;
        }
        self.grids
            .grid(self.cursor.grid())
            .is_some_and(|g| !g.is_hidden())
    }

    /// Cursor appearance for the active mode
    pub fn cursor_style(&self) -> CursorStyle {
        // Without cursor_style_enabled the client picks the look itself
        let info = self
            .mode
            .current()
            .filter(|_| self.mode.cursor_style_enabled());
        let (grid, row, col) = self.cursor.logical();

        // Attribute 0 (or none) draws the cursor as the inverse of its cell
        let (background, foreground) = match info.and_then(|m| m.attr_id).filter(|&id| id != 0) {
            Some(id) => {
                let attr = self.grids.resolve(id);
                (attr.background, attr.foreground)
            }
            None => {
                let cell_attr = self.grids.cell(grid, row, col).map(|c| c.attr_id).unwrap_or(0);
                let attr = self.grids.resolve(cell_attr);
                (attr.foreground, attr.background)
            }
        };

        CursorStyle {
            shape: info.map(|m| m.cursor_shape).unwrap_or_default(),
            cell_percentage: info.and_then(|m| m.cell_percentage).unwrap_or(100),
            blink: info.filter(|m| m.blinks()).map(|m| {
                (
                    m.blink_wait.unwrap_or(0),
                    m.blink_on.unwrap_or(0),
                    m.blink_off.unwrap_or(0),
                )
            }),
            background,
            foreground,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::GridLineCell;
    use crate::ui::highlight::HighlightAttribute;
    use crate::ui::mode::ModeInfo;

    fn state() -> UiState {
        UiState::new(
            &Config::default(),
            CellSize {
                width: 8.0,
                height: 16.0,
            },
        )
    }

    #[test]
    fn test_cursor_style_inverse_of_cell() {
        let mut ui = state();
        ui.grids.resize_grid(1, 4, 2);
        ui.grids.define_highlight(
            3,
            HighlightAttribute {
                foreground: Some(0x112233),
                background: Some(0x445566),
                ..Default::default()
            },
        );
        ui.grids.write_line(1, 0, 0, &[GridLineCell::new("a", Some(3), None)]);
        let style = ui.cursor_style();
        assert_eq!(style.shape, CursorShape::Block);
        assert_eq!(style.background, 0x112233);
        assert_eq!(style.foreground, 0x445566);
    }

    #[test]
    fn test_cursor_style_from_mode_attr() {
        let mut ui = state();
        ui.grids.resize_grid(1, 4, 2);
        ui.grids.define_highlight(
            9,
            HighlightAttribute {
                foreground: Some(0x000001),
                background: Some(0x000002),
                ..Default::default()
            },
        );
        ui.mode.set_infos(
            true,
            vec![ModeInfo {
                cursor_shape: CursorShape::Vertical,
                cell_percentage: Some(25),
                attr_id: Some(9),
                ..Default::default()
            }],
        );
        let style = ui.cursor_style();
        assert_eq!(style.shape, CursorShape::Vertical);
        assert_eq!(style.cell_percentage, 25);
        assert_eq!(style.background, 0x000002);
        assert!(style.blink.is_none());
    }

    #[test]
    fn test_set_cell_size_resets_atlas() {
        let mut ui = state();
        ui.grids.resize_grid(1, 2, 2);
        ui.grids.take_dirty();
        let generation = ui.atlas.generation();
        ui.set_cell_size(CellSize {
            width: 10.0,
            height: 20.0,
        });
        assert_eq!(ui.atlas.generation(), generation + 1);
        assert_eq!(ui.atlas.cell_height(), 20);
        assert_eq!(ui.grids.take_dirty().len(), 4);
    }

    #[test]
    fn test_cursor_hidden_without_grid() {
        let mut ui = state();
        assert!(!ui.cursor_visible());
        ui.grids.resize_grid(1, 2, 2);
        assert!(ui.cursor_visible());
        ui.busy = true;
        assert!(!ui.cursor_visible());
    }
}
