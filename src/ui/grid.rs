//! Character grid
//!
//! 2D cell array for one editor grid. Cells carry their text, a highlight
//! id and a dirty flag; the renderer redraws dirty cells and clears the flag.

use log::{debug, trace};
use smol_str::SmolStr;
use unicode_width::UnicodeWidthStr;

use crate::constants::DEFAULT_ATTRIBUTE_ID;
use crate::protocol::{GridLineCell, WindowRef};

/// Data for one cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Cell text; empty for a blank cell or the right half of a wide character
    pub text: SmolStr,
    /// Highlight attribute id
    pub attr_id: u64,
    /// Needs redraw
    pub dirty: bool,
}

impl Cell {
    /// Blank cell with default attributes (dirty, it has never been drawn)
    pub fn blank() -> Cell {
        Cell {
            text: SmolStr::default(),
            attr_id: DEFAULT_ATTRIBUTE_ID,
            dirty: true,
        }
    }

    /// No glyph lookup should happen for an empty cell
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// First character (space for empty cells)
    pub fn ch(&self) -> char {
        self.text.chars().next().unwrap_or(' ')
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

/// Grid kind; declaration order is the z-order (later draws on top)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GridType {
    #[default]
    Normal,
    Float,
    Message,
}

/// Character grid
#[derive(Debug, Clone)]
pub struct Grid {
    /// Id assigned by the editor
    id: u64,
    /// Local creation counter (z-order tie-break)
    creation_order: u64,
    pub(crate) grid_type: GridType,
    /// Screen position of the top-left cell (may be negative for floats)
    pub(crate) origin_row: i64,
    pub(crate) origin_col: i64,
    /// Cell array (row-major)
    cells: Vec<Cell>,
    cols: usize,
    rows: usize,
    pub(crate) hidden: bool,
    pub(crate) window: Option<WindowRef>,
    /// At least one cell is dirty
    has_dirty: bool,
}

impl Grid {
    pub fn new(id: u64, creation_order: u64, cols: usize, rows: usize) -> Self {
        Self {
            id,
            creation_order,
            grid_type: GridType::Normal,
            origin_row: 0,
            origin_col: 0,
            cells: vec![Cell::blank(); cols * rows],
            cols,
            rows,
            hidden: false,
            window: None,
            has_dirty: true,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn creation_order(&self) -> u64 {
        self.creation_order
    }

    pub fn grid_type(&self) -> GridType {
        self.grid_type
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Screen position of cell (0, 0)
    pub fn origin(&self) -> (i64, i64) {
        (self.origin_row, self.origin_col)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn window(&self) -> Option<&WindowRef> {
        self.window.as_ref()
    }

    /// Sort key for drawing: type first, then creation order
    pub fn z_key(&self) -> (GridType, u64) {
        (self.grid_type, self.creation_order)
    }

    /// Get cell (None outside the grid)
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Whether (row, col) is inside the grid
    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Resize grid
    ///
    /// Reallocates the cell buffer, keeping the common area, and marks
    /// everything dirty.
    pub fn resize(&mut self, new_cols: usize, new_rows: usize) {
        let old_cols = self.cols;
        let mut new_cells = vec![Cell::blank(); new_cols * new_rows];

        // Copy existing cells (only common area)
        let copy_rows = self.rows.min(new_rows);
        let copy_cols = old_cols.min(new_cols);
        for row in 0..copy_rows {
            let src_start = row * old_cols;
            let dst_start = row * new_cols;
            new_cells[dst_start..dst_start + copy_cols]
                .clone_from_slice(&self.cells[src_start..src_start + copy_cols]);
        }

        self.cells = new_cells;
        self.cols = new_cols;
        self.rows = new_rows;
        self.mark_all_dirty();

        debug!("Grid {} resized to {}x{}", self.id, new_cols, new_rows);
    }

    /// Write a `grid_line` run starting at (row, col_start).
    ///
    /// A cell without a highlight id reuses the last explicit id seen in
    /// this run (0 before any). Cells past the right edge are dropped.
    /// Returns the number of columns written.
    pub fn write_line(&mut self, row: usize, col_start: usize, cells: &[GridLineCell]) -> usize {
        if row >= self.rows {
            debug!(
                "grid_line row {} outside grid {} ({} rows)",
                row, self.id, self.rows
            );
            return 0;
        }

        let row_start = row * self.cols;
        let mut col = col_start;
        let mut hl_id = DEFAULT_ATTRIBUTE_ID;

        'cells: for entry in cells {
            if let Some(id) = entry.hl_id {
                hl_id = id;
            }
            for _ in 0..entry.repeat.unwrap_or(1) {
                if col >= self.cols {
                    trace!("grid_line clipped at col {} (grid {})", col, self.id);
                    break 'cells;
                }
                let cell = &mut self.cells[row_start + col];
                cell.text.clone_from(&entry.text);
                cell.attr_id = hl_id;
                cell.dirty = true;
                col += 1;
            }
        }

        if col > col_start {
            self.has_dirty = true;
        }
        col.saturating_sub(col_start)
    }

    /// Reset every cell to blank / attribute 0
    pub fn clear(&mut self) {
        self.cells.fill(Cell::blank());
        self.has_dirty = true;
    }

    /// Shift the region [top, bot) x [left, right) by `rows`.
    ///
    /// Positive `rows` moves content up (row `r + rows` is copied into `r`),
    /// negative moves it down. Rows exposed at the trailing edge keep their
    /// previous contents; the editor overwrites them afterwards.
    pub fn scroll(&mut self, top: usize, bot: usize, left: usize, right: usize, rows: i64) {
        let bot = bot.min(self.rows);
        let right = right.min(self.cols);
        if rows == 0 || top >= bot || left >= right {
            return;
        }

        let shift = rows.unsigned_abs() as usize;
        if shift >= bot - top {
            trace!("grid_scroll by {} covers whole region, nothing to copy", rows);
            return;
        }

        if rows > 0 {
            // Content moves up: forward iteration reads rows before they are overwritten
            for dst in top..(bot - shift) {
                self.copy_row_span(dst + shift, dst, left, right);
            }
        } else {
            // Content moves down: iterate in reverse
            for dst in ((top + shift)..bot).rev() {
                self.copy_row_span(dst - shift, dst, left, right);
            }
        }
        self.has_dirty = true;
    }

    /// Copy columns [left, right) of row `src` into row `dst`
    fn copy_row_span(&mut self, src: usize, dst: usize, left: usize, right: usize) {
        let width = right - left;
        let src_start = src * self.cols + left;
        let dst_start = dst * self.cols + left;

        if src_start > dst_start {
            let (head, tail) = self.cells.split_at_mut(src_start);
            head[dst_start..dst_start + width].clone_from_slice(&tail[..width]);
        } else {
            let (head, tail) = self.cells.split_at_mut(dst_start);
            tail[..width].clone_from_slice(&head[src_start..src_start + width]);
        }

        for cell in &mut self.cells[dst_start..dst_start + width] {
            cell.dirty = true;
        }
    }

    /// Mark every cell for redraw
    pub fn mark_all_dirty(&mut self) {
        for cell in &mut self.cells {
            cell.dirty = true;
        }
        self.has_dirty = true;
    }

    /// Whether any cell needs redraw
    pub fn is_dirty(&self) -> bool {
        self.has_dirty
    }

    /// Iterate dirty cells as (row, col, cell)
    pub fn dirty_cells(&self) -> impl Iterator<Item = (usize, usize, &Cell)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.dirty)
            .map(move |(i, cell)| (i / cols, i % cols, cell))
    }

    /// Clear dirty flags after the renderer consumed them
    pub fn clear_dirty(&mut self) {
        for cell in &mut self.cells {
            cell.dirty = false;
        }
        self.has_dirty = false;
    }

    /// Row text with empty cells shown as spaces (trailing spaces trimmed)
    pub fn row_text(&self, row: usize) -> String {
        if row >= self.rows {
            return String::new();
        }
        let start = row * self.cols;
        let mut text = String::with_capacity(self.cols);
        let mut after_wide = false;
        for cell in &self.cells[start..start + self.cols] {
            if cell.is_empty() {
                // Right half of a wide character takes no space in text form
                if !after_wide {
                    text.push(' ');
                }
                after_wide = false;
                continue;
            }
            text.push_str(&cell.text);
            after_wide = UnicodeWidthStr::width(cell.text.as_str()) > 1;
        }
        text.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_rows(grid: &mut Grid) {
        for row in 0..grid.rows() {
            let text = ((b'a' + row as u8) as char).to_string();
            let cells = vec![GridLineCell::new(&text, Some(row as u64), Some(grid.cols()))];
            grid.write_line(row, 0, &cells);
        }
        grid.clear_dirty();
    }

    fn column(grid: &Grid, col: usize) -> String {
        (0..grid.rows())
            .map(|row| grid.cell(row, col).map(Cell::ch).unwrap_or('?'))
            .collect()
    }

    #[test]
    fn test_new_grid_is_blank_and_dirty() {
        let grid = Grid::new(1, 0, 10, 5);
        assert_eq!(grid.cols(), 10);
        assert_eq!(grid.rows(), 5);
        assert!(grid.cell(4, 9).unwrap().is_empty());
        assert!(grid.cell(5, 0).is_none());
        assert_eq!(grid.dirty_cells().count(), 50);
    }

    #[test]
    fn test_write_line_sticky_hl_and_repeat() {
        let mut grid = Grid::new(1, 0, 10, 2);
        grid.clear_dirty();
        let cells = vec![
            GridLineCell::new("a", Some(3), None),
            GridLineCell::new("b", None, Some(2)),
            GridLineCell::new("c", Some(0), None),
            GridLineCell::new("d", None, None),
        ];
        assert_eq!(grid.write_line(1, 2, &cells), 5);
        assert_eq!(grid.row_text(1), "  abbcd");
        assert_eq!(grid.cell(1, 3).unwrap().attr_id, 3);
        assert_eq!(grid.cell(1, 4).unwrap().attr_id, 3);
        assert_eq!(grid.cell(1, 6).unwrap().attr_id, 0);
        assert_eq!(grid.dirty_cells().count(), 5);
    }

    #[test]
    fn test_write_line_first_cell_without_hl_uses_zero() {
        let mut grid = Grid::new(1, 0, 4, 1);
        grid.write_line(0, 0, &[GridLineCell::new("x", None, None)]);
        assert_eq!(grid.cell(0, 0).unwrap().attr_id, 0);
    }

    #[test]
    fn test_write_line_clips_out_of_bounds() {
        let mut grid = Grid::new(1, 0, 4, 1);
        assert_eq!(grid.write_line(0, 2, &[GridLineCell::new("x", Some(1), Some(10))]), 2);
        assert_eq!(grid.write_line(3, 0, &[GridLineCell::new("x", None, None)]), 0);
        assert_eq!(grid.row_text(0), "  xx");
    }

    #[test]
    fn test_last_write_wins() {
        let mut grid = Grid::new(1, 0, 4, 2);
        grid.write_line(0, 0, &[GridLineCell::new("x", Some(1), Some(4))]);
        grid.write_line(0, 1, &[GridLineCell::new("y", Some(2), None)]);
        assert_eq!(grid.cell(0, 1).unwrap().text, "y");
        assert_eq!(grid.cell(0, 1).unwrap().attr_id, 2);
        assert_eq!(grid.cell(0, 2).unwrap().text, "x");
    }

    #[test]
    fn test_clear() {
        let mut grid = Grid::new(1, 0, 3, 2);
        fill_rows(&mut grid);
        grid.clear();
        assert!(grid.cell(1, 1).unwrap().is_empty());
        assert_eq!(grid.cell(1, 1).unwrap().attr_id, 0);
        assert_eq!(grid.dirty_cells().count(), 6);
    }

    #[test]
    fn test_scroll_up_keeps_exposed_rows() {
        let mut grid = Grid::new(1, 0, 3, 5);
        fill_rows(&mut grid);
        grid.scroll(0, 5, 0, 3, 2);
        assert_eq!(column(&grid, 0), "cdede");
        // Only copied rows are dirty
        assert_eq!(grid.dirty_cells().count(), 9);
    }

    #[test]
    fn test_scroll_down() {
        let mut grid = Grid::new(1, 0, 3, 5);
        fill_rows(&mut grid);
        grid.scroll(1, 5, 0, 3, -1);
        assert_eq!(column(&grid, 0), "abbcd");
    }

    #[test]
    fn test_scroll_column_span_only() {
        let mut grid = Grid::new(1, 0, 4, 3);
        fill_rows(&mut grid);
        grid.scroll(0, 3, 1, 3, 1);
        assert_eq!(column(&grid, 0), "abc");
        assert_eq!(column(&grid, 1), "bcc");
        assert_eq!(column(&grid, 2), "bcc");
        assert_eq!(column(&grid, 3), "abc");
    }

    #[test]
    fn test_scroll_zero_is_noop() {
        let mut grid = Grid::new(1, 0, 3, 4);
        fill_rows(&mut grid);
        grid.scroll(0, 4, 0, 3, 0);
        assert_eq!(column(&grid, 0), "abcd");
        assert!(!grid.is_dirty());
    }

    #[test]
    fn test_scroll_inverse_restores_region() {
        // +n then -n restores [top + n, bot)
        let mut grid = Grid::new(1, 0, 2, 6);
        fill_rows(&mut grid);
        grid.scroll(0, 6, 0, 2, 2);
        grid.scroll(0, 6, 0, 2, -2);
        assert_eq!(&column(&grid, 0)[2..], "cdef");

        // -n then +n restores [top, bot - n)
        let mut grid = Grid::new(1, 0, 2, 6);
        fill_rows(&mut grid);
        grid.scroll(0, 6, 0, 2, -2);
        grid.scroll(0, 6, 0, 2, 2);
        assert_eq!(&column(&grid, 0)[..4], "abcd");
    }

    #[test]
    fn test_scroll_out_of_bounds_region_is_clamped() {
        let mut grid = Grid::new(1, 0, 2, 3);
        fill_rows(&mut grid);
        grid.scroll(0, 99, 0, 99, 1);
        assert_eq!(column(&grid, 1), "bcc");
        grid.scroll(0, 3, 0, 2, 5);
        assert_eq!(column(&grid, 1), "bcc");
    }

    #[test]
    fn test_resize_preserves_common_area() {
        let mut grid = Grid::new(1, 0, 3, 3);
        fill_rows(&mut grid);
        grid.resize(2, 4);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.row_text(1), "bb");
        assert!(grid.cell(3, 0).unwrap().is_empty());
        assert_eq!(grid.dirty_cells().count(), 8);
    }
}
