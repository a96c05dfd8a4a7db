//! Grid manager
//!
//! Owns every grid, the shared highlight table and the default colors.
//! Operations addressing a grid id that does not exist are ignored.

use std::collections::HashMap;

use log::{debug, warn};
use smol_str::SmolStr;

use super::grid::{Cell, Grid, GridType};
use super::highlight::{DefaultColors, HighlightAttribute, HighlightTable, ResolvedAttribute};
use crate::constants::{DEFAULT_GRID_ID, MAX_GRID_CELLS};
use crate::protocol::{Anchor, GridLineCell, WindowRef};

/// A cell the renderer has to redraw
#[derive(Debug, Clone, PartialEq)]
pub struct DirtyCell {
    pub grid: u64,
    /// Position inside the grid
    pub row: usize,
    pub col: usize,
    /// Position on screen (grid origin applied)
    pub screen_row: i64,
    pub screen_col: i64,
    pub text: SmolStr,
    pub attr_id: u64,
    pub attr: ResolvedAttribute,
}

pub struct GridManager {
    grids: HashMap<u64, Grid>,
    next_creation_order: u64,
    highlights: HighlightTable,
    /// Colors currently in effect
    defaults: DefaultColors,
    /// Colors used for channels the editor leaves unset
    fallback: DefaultColors,
}

impl GridManager {
    pub fn new(fallback: DefaultColors) -> Self {
        Self {
            grids: HashMap::new(),
            next_creation_order: 0,
            highlights: HighlightTable::new(),
            defaults: fallback,
            fallback,
        }
    }

    pub fn grid(&self, id: u64) -> Option<&Grid> {
        self.grids.get(&id)
    }

    pub fn grid_mut(&mut self, id: u64) -> Option<&mut Grid> {
        self.grids.get_mut(&id)
    }

    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Get cell of a grid (None for unknown grid or out of bounds)
    pub fn cell(&self, grid: u64, row: usize, col: usize) -> Option<&Cell> {
        self.grids.get(&grid)?.cell(row, col)
    }

    pub fn highlights(&self) -> &HighlightTable {
        &self.highlights
    }

    pub fn default_colors(&self) -> DefaultColors {
        self.defaults
    }

    // ========== Line-based events ==========

    /// Resize a grid, creating it on first use
    /// Create or resize a grid; returns false when the size is rejected
    pub fn resize_grid(&mut self, id: u64, cols: usize, rows: usize) -> bool {
        if cols.checked_mul(rows).map_or(true, |cells| cells > MAX_GRID_CELLS) {
            warn!("grid_resize: {}x{} for grid {} is too large, ignored", cols, rows, id);
            return false;
        }
        match self.grids.get_mut(&id) {
            Some(grid) => grid.resize(cols, rows),
            None => {
                let order = self.next_creation_order;
                self.next_creation_order += 1;
                debug!("Grid {} created ({}x{})", id, cols, rows);
                self.grids.insert(id, Grid::new(id, order, cols, rows));
            }
        }
        true
    }

    pub fn destroy_grid(&mut self, id: u64) -> Option<Grid> {
        let removed = self.grids.remove(&id);
        if removed.is_some() {
            debug!("Grid {} destroyed", id);
            // Whatever it covered must be repainted
            self.mark_all_dirty();
        } else {
            debug!("destroy: unknown grid {}", id);
        }
        removed
    }

    pub fn clear_grid(&mut self, id: u64) {
        match self.grids.get_mut(&id) {
            Some(grid) => grid.clear(),
            None => debug!("grid_clear: unknown grid {}", id),
        }
    }

    pub fn write_line(&mut self, id: u64, row: usize, col_start: usize, cells: &[GridLineCell]) {
        match self.grids.get_mut(&id) {
            Some(grid) => {
                grid.write_line(row, col_start, cells);
            }
            None => debug!("grid_line: unknown grid {}", id),
        }
    }

    pub fn scroll_grid(
        &mut self,
        id: u64,
        top: usize,
        bot: usize,
        left: usize,
        right: usize,
        rows: i64,
    ) {
        match self.grids.get_mut(&id) {
            Some(grid) => grid.scroll(top, bot, left, right, rows),
            None => debug!("grid_scroll: unknown grid {}", id),
        }
    }

    /// Update default colors; `None` channels use the configured fallback
    pub fn set_default_colors(
        &mut self,
        foreground: Option<u32>,
        background: Option<u32>,
        special: Option<u32>,
    ) {
        self.defaults = DefaultColors {
            foreground: foreground.unwrap_or(self.fallback.foreground),
            background: background.unwrap_or(self.fallback.background),
            special: special.unwrap_or(self.fallback.special),
        };
        // Not guaranteed to be followed by grid_clear
        self.mark_all_dirty();
    }

    /// Define a highlight attribute; every grid is repainted
    pub fn define_highlight(&mut self, id: u64, attr: HighlightAttribute) {
        if self.highlights.define(id, attr) {
            self.mark_all_dirty();
        }
    }

    /// Resolve an attribute id against the current defaults
    pub fn resolve(&self, attr_id: u64) -> ResolvedAttribute {
        self.highlights.resolve(attr_id, &self.defaults)
    }

    // ========== Multigrid placement ==========

    /// Place a normal grid at an absolute screen position
    pub fn set_win_pos(&mut self, id: u64, window: WindowRef, row: usize, col: usize) {
        let Some(grid) = self.grids.get_mut(&id) else {
            debug!("win_pos: unknown grid {}", id);
            return;
        };
        let moved = grid.origin() != (row as i64, col as i64);
        let was_hidden = grid.hidden;
        grid.grid_type = GridType::Normal;
        grid.origin_row = row as i64;
        grid.origin_col = col as i64;
        grid.hidden = false;
        grid.window = Some(window);
        if moved || was_hidden {
            self.mark_all_dirty();
        }
    }

    /// Place a floating grid relative to another grid's origin.
    ///
    /// The anchor names which corner of the float sits at the anchor
    /// position: east anchors shift left by the float's width, south
    /// anchors shift up by its height.
    pub fn set_float_pos(
        &mut self,
        id: u64,
        window: WindowRef,
        anchor: Anchor,
        anchor_grid: u64,
        anchor_row: f64,
        anchor_col: f64,
    ) {
        let Some((base_row, base_col)) = self.grids.get(&anchor_grid).map(Grid::origin) else {
            debug!("win_float_pos: unknown anchor grid {}", anchor_grid);
            return;
        };
        let Some(grid) = self.grids.get_mut(&id) else {
            debug!("win_float_pos: unknown grid {}", id);
            return;
        };

        let mut row = base_row + anchor_row.floor() as i64;
        let mut col = base_col + anchor_col.floor() as i64;
        if matches!(anchor, Anchor::NE | Anchor::SE) {
            col -= grid.cols() as i64;
        }
        if matches!(anchor, Anchor::SW | Anchor::SE) {
            row -= grid.rows() as i64;
        }

        grid.grid_type = GridType::Float;
        grid.origin_row = row;
        grid.origin_col = col;
        grid.hidden = false;
        grid.window = Some(window);
        self.mark_all_dirty();
    }

    /// Place the message grid `row` rows below the default grid's origin
    pub fn set_message_pos(&mut self, id: u64, row: usize) {
        let base_row = self
            .grids
            .get(&DEFAULT_GRID_ID)
            .map(|g| g.origin_row)
            .unwrap_or(0);
        let Some(grid) = self.grids.get_mut(&id) else {
            debug!("msg_set_pos: unknown grid {}", id);
            return;
        };
        grid.grid_type = GridType::Message;
        grid.origin_row = base_row + row as i64;
        grid.origin_col = 0;
        grid.hidden = false;
        self.mark_all_dirty();
    }

    pub fn hide_grid(&mut self, id: u64) {
        match self.grids.get_mut(&id) {
            Some(grid) if !grid.hidden => {
                grid.hidden = true;
                self.mark_all_dirty();
            }
            Some(_) => {}
            None => debug!("win_hide: unknown grid {}", id),
        }
    }

    // ========== Render queries ==========

    /// Visible grids in draw order: Normal, then Float, then Message,
    /// each by creation order
    pub fn sorted_grids(&self) -> Vec<&Grid> {
        let mut grids: Vec<&Grid> = self.grids.values().filter(|g| !g.is_hidden()).collect();
        grids.sort_by_key(|g| g.z_key());
        grids
    }

    pub fn mark_all_dirty(&mut self) {
        for grid in self.grids.values_mut() {
            grid.mark_all_dirty();
        }
    }

    /// Collect dirty cells of visible grids in draw order and clear the
    /// flags. Hidden grids keep their flags until shown again.
    pub fn take_dirty(&mut self) -> Vec<DirtyCell> {
        let mut order: Vec<(GridType, u64, u64)> = self
            .grids
            .values()
            .filter(|g| !g.is_hidden() && g.is_dirty())
            .map(|g| (g.grid_type(), g.creation_order(), g.id()))
            .collect();
        order.sort_unstable();

        let mut out = Vec::new();
        for (_, _, id) in order {
            let Some(grid) = self.grids.get_mut(&id) else {
                continue;
            };
            let (origin_row, origin_col) = grid.origin();
            out.extend(grid.dirty_cells().map(|(row, col, cell)| DirtyCell {
                grid: id,
                row,
                col,
                screen_row: origin_row + row as i64,
                screen_col: origin_col + col as i64,
                text: cell.text.clone(),
                attr_id: cell.attr_id,
                attr: self.highlights.resolve(cell.attr_id, &self.defaults),
            }));
            grid.clear_dirty();
        }
        out
    }
}
