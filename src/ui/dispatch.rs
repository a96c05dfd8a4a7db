//! Redraw event dispatcher
//!
//! Applies decoded batches to the screen model in order. Within a batch
//! only the last `grid_cursor_goto` takes effect; `flush` marks the point
//! where a frame may be rendered. Until that frame is built, later events
//! are held back so they cannot leak into it.

use std::time::Instant;

use log::{debug, info, trace};

use super::queue::BatchReceiver;
use super::UiState;
use crate::constants::DEFAULT_GRID_ID;
use crate::protocol::{RedrawEvent, UiOption};

/// Window collaborator: receives requests the screen model cannot fulfil
pub trait WindowHandler {
    fn set_title(&mut self, _title: &str) {}

    /// Pixel size the default grid wants
    fn request_resize(&mut self, _width: u32, _height: u32) {}

    fn bell(&mut self, _visual: bool) {}
}

/// Window collaborator that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWindow;

impl WindowHandler for NullWindow {}

/// Summary of one or more applied batches
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Events applied to the model
    pub applied: usize,
    /// `flush` events seen
    pub flushes: usize,
    /// `grid_cursor_goto` events superseded by a later one in their batch
    pub superseded_gotos: usize,
    /// Events held back behind a flushed, unrendered frame
    pub deferred: usize,
}

impl BatchOutcome {
    pub fn flushed(&self) -> bool {
        self.flushes > 0
    }

    fn merge(&mut self, other: BatchOutcome) {
        self.applied += other.applied;
        self.flushes += other.flushes;
        self.superseded_gotos += other.superseded_gotos;
        self.deferred += other.deferred;
    }
}

impl UiState {
    /// Apply one batch in order
    ///
    /// Events behind a flush whose frame has not been built yet are queued
    /// and applied by a later call once `build_frame` has consumed it.
    pub fn apply_batch(
        &mut self,
        batch: &[RedrawEvent],
        window: &mut dyn WindowHandler,
        now: Instant,
    ) -> BatchOutcome {
        let mut outcome = self.apply_deferred(window, now);

        let last_goto = batch
            .iter()
            .rposition(|e| matches!(e, RedrawEvent::GridCursorGoto { .. }));
        for (index, event) in batch.iter().enumerate() {
            if matches!(event, RedrawEvent::GridCursorGoto { .. }) && Some(index) != last_goto {
                trace!("Superseded cursor goto: {:?}", event);
                outcome.superseded_gotos += 1;
                continue;
            }
            if self.frame_ready {
                self.deferred.push(event.clone());
                outcome.deferred += 1;
                continue;
            }
            self.apply_counted(event, window, now, &mut outcome);
        }
        if outcome.deferred > 0 {
            trace!("{} events wait for the pending frame", self.deferred.len());
        }
        outcome
    }

    /// Replay held-back events up to the next flush
    fn apply_deferred(&mut self, window: &mut dyn WindowHandler, now: Instant) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        if self.frame_ready || self.deferred.is_empty() {
            return outcome;
        }
        let pending = std::mem::take(&mut self.deferred);
        let mut events = pending.into_iter();
        for event in events.by_ref() {
            self.apply_counted(&event, window, now, &mut outcome);
            if self.frame_ready {
                break;
            }
        }
        self.deferred.extend(events);
        outcome
    }

    fn apply_counted(
        &mut self,
        event: &RedrawEvent,
        window: &mut dyn WindowHandler,
        now: Instant,
        outcome: &mut BatchOutcome,
    ) {
        if matches!(event, RedrawEvent::Flush) {
            outcome.flushes += 1;
        }
        self.apply_event(event, window, now);
        outcome.applied += 1;
    }

    /// Drain the inbound queue, applying every pending batch in order
    ///
    /// Applies at most one flush worth of events; the rest waits in the
    /// deferred list until the frame has been built.
    pub fn process_queue(
        &mut self,
        receiver: &BatchReceiver,
        window: &mut dyn WindowHandler,
        now: Instant,
    ) -> BatchOutcome {
        let mut outcome = self.apply_deferred(window, now);
        for batch in receiver.drain() {
            outcome.merge(self.apply_batch(&batch, window, now));
        }
        outcome
    }

    fn apply_event(&mut self, event: &RedrawEvent, window: &mut dyn WindowHandler, now: Instant) {
        match event {
            // ===== Global =====
            RedrawEvent::SetTitle(title) => {
                self.title = title.clone();
                window.set_title(title);
            }
            RedrawEvent::SetIcon(icon) => {
                debug!("set_icon ignored: {:?}", icon);
            }
            RedrawEvent::ModeInfoSet {
                cursor_style_enabled,
                modes,
            } => {
                self.mode.set_infos(*cursor_style_enabled, modes.clone());
            }
            RedrawEvent::ModeChange { name, index } => {
                trace!("Mode change: {} ({})", name, index);
                self.mode.change(*index);
            }
            RedrawEvent::OptionSet(option) => {
                if let UiOption::Guifont(font) = option {
                    info!("Editor requested font: {:?}", font);
                }
                let linespace_before = self.options.linespace;
                self.options.apply(option.clone());
                if self.options.linespace != linespace_before {
                    self.grids.mark_all_dirty();
                }
            }
            RedrawEvent::BusyStart => self.busy = true,
            RedrawEvent::BusyStop => self.busy = false,
            RedrawEvent::MouseOn => self.mouse_enabled = true,
            RedrawEvent::MouseOff => self.mouse_enabled = false,
            RedrawEvent::Bell => window.bell(false),
            RedrawEvent::VisualBell => window.bell(true),
            RedrawEvent::Flush => {
                // Grids may have moved under the cursor since its last goto
                self.sync_cursor(now, false);
                self.frame_ready = true;
            }

            // ===== Line-based grid =====
            RedrawEvent::GridResize { grid, cols, rows } => {
                if self.grids.resize_grid(*grid, *cols, *rows) && *grid == DEFAULT_GRID_ID {
                    let width = (*cols as f32 * self.cell_size.width).ceil() as u32;
                    let height = (*rows as f32 * self.row_height()).ceil() as u32;
                    debug!("Default grid {}x{} -> {}x{} px", cols, rows, width, height);
                    window.request_resize(width, height);
                }
            }
            RedrawEvent::DefaultColorsSet {
                foreground,
                background,
                special,
            } => {
                self.grids
                    .set_default_colors(*foreground, *background, *special);
            }
            RedrawEvent::HlAttrDefine { id, attr } => {
                self.grids.define_highlight(*id, attr.clone());
            }
            RedrawEvent::GridLine {
                grid,
                row,
                col_start,
                cells,
            } => {
                self.grids.write_line(*grid, *row, *col_start, cells);
            }
            RedrawEvent::GridClear { grid } => self.grids.clear_grid(*grid),
            RedrawEvent::GridDestroy { grid } | RedrawEvent::WinClose { grid } => {
                self.grids.destroy_grid(*grid);
            }
            RedrawEvent::GridCursorGoto { grid, row, col } => {
                self.cursor.set_logical(*grid, *row, *col);
                self.sync_cursor(now, false);
            }
            RedrawEvent::GridScroll {
                grid,
                top,
                bot,
                left,
                right,
                rows,
            } => {
                self.scroll(*grid, (*top, *bot, *left, *right), *rows, now);
            }

            // ===== Multigrid =====
            RedrawEvent::WinPos {
                grid,
                window: win,
                row,
                col,
                ..
            } => {
                self.grids.set_win_pos(*grid, win.clone(), *row, *col);
            }
            RedrawEvent::WinFloatPos {
                grid,
                window: win,
                anchor,
                anchor_grid,
                anchor_row,
                anchor_col,
            } => {
                self.grids.set_float_pos(
                    *grid,
                    win.clone(),
                    *anchor,
                    *anchor_grid,
                    *anchor_row,
                    *anchor_col,
                );
            }
            RedrawEvent::WinExternalPos { grid } => {
                debug!("win_external_pos unsupported (grid {})", grid);
            }
            RedrawEvent::WinHide { grid } => self.grids.hide_grid(*grid),
            RedrawEvent::MsgSetPos { grid, row } => self.grids.set_message_pos(*grid, *row),
        }
    }

    /// Scroll a region; a cursor inside it jumps with the content and then
    /// animates back to its logical cell
    fn scroll(
        &mut self,
        grid: u64,
        (top, bot, left, right): (usize, usize, usize, usize),
        rows: i64,
        now: Instant,
    ) {
        self.grids.scroll_grid(grid, top, bot, left, right, rows);

        let (cursor_grid, row, col) = self.cursor.logical();
        let inside = cursor_grid == grid && (top..bot).contains(&row) && (left..right).contains(&col);
        if !inside || rows == 0 {
            return;
        }
        if let Some((target_row, target_col)) = self.cursor_screen_target() {
            self.cursor
                .set_position((target_row - rows as f32, target_col), true, now);
            self.sync_cursor(now, false);
        }
    }

    /// Point the cursor animation at the logical cell's screen position
    fn sync_cursor(&mut self, now: Instant, immediate: bool) {
        if let Some(target) = self.cursor_screen_target() {
            self.cursor.set_position(target, immediate, now);
        }
    }
}
