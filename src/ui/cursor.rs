//! Cursor position and movement animation
//!
//! The logical position is (grid, row, col). The rendered position lives in
//! screen cell coordinates and is either settled on its target or
//! interpolating toward it over a fixed lifetime.

use std::time::{Duration, Instant};

use log::trace;

/// Animation state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorAnimation {
    /// Rendered exactly at `at`
    Settled { at: (f32, f32) },
    /// Linear interpolation from `from` to `to` starting at `started`
    Animating {
        from: (f32, f32),
        to: (f32, f32),
        started: Instant,
    },
}

#[derive(Debug, Clone)]
pub struct Cursor {
    grid: u64,
    row: usize,
    col: usize,
    animation: CursorAnimation,
    lifetime: Duration,
}

impl Cursor {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            grid: crate::constants::DEFAULT_GRID_ID,
            row: 0,
            col: 0,
            animation: CursorAnimation::Settled { at: (0.0, 0.0) },
            lifetime,
        }
    }

    pub fn grid(&self) -> u64 {
        self.grid
    }

    /// Logical (grid, row, col)
    pub fn logical(&self) -> (u64, usize, usize) {
        (self.grid, self.row, self.col)
    }

    pub fn set_logical(&mut self, grid: u64, row: usize, col: usize) {
        self.grid = grid;
        self.row = row;
        self.col = col;
    }

    pub fn animation(&self) -> CursorAnimation {
        self.animation
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.animation, CursorAnimation::Settled { .. })
    }

    /// Where the cursor is heading (screen cells)
    pub fn target(&self) -> (f32, f32) {
        match self.animation {
            CursorAnimation::Settled { at } => at,
            CursorAnimation::Animating { to, .. } => to,
        }
    }

    /// Move the rendered cursor to `target` (screen row, col).
    ///
    /// `immediate` snaps without a transition. Otherwise the animation
    /// restarts from wherever the cursor is drawn right now, so a move in
    /// the middle of another animation does not jump.
    pub fn set_position(&mut self, target: (f32, f32), immediate: bool, now: Instant) {
        if immediate || self.lifetime.is_zero() {
            self.animation = CursorAnimation::Settled { at: target };
            return;
        }
        if self.target() == target {
            return;
        }

        let from = self.position_at(now);
        trace!("Cursor animating {:?} -> {:?}", from, target);
        self.animation = CursorAnimation::Animating {
            from,
            to: target,
            started: now,
        };
    }

    /// Interpolated position at `now` (screen cells)
    pub fn position_at(&self, now: Instant) -> (f32, f32) {
        match self.animation {
            CursorAnimation::Settled { at } => at,
            CursorAnimation::Animating { from, to, started } => {
                let t = self.progress(started, now);
                (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
            }
        }
    }

    /// Sample once per render tick; returns true while still animating
    pub fn tick(&mut self, now: Instant) -> bool {
        if let CursorAnimation::Animating { to, started, .. } = self.animation {
            if self.progress(started, now) >= 1.0 {
                self.animation = CursorAnimation::Settled { at: to };
                return false;
            }
            return true;
        }
        false
    }

    /// Pixel position of the cursor's top-left corner
    pub fn current_pixel_position(&self, now: Instant, cell_width: f32, cell_height: f32) -> (f32, f32) {
        let (row, col) = self.position_at(now);
        (col * cell_width, row * cell_height)
    }

    fn progress(&self, started: Instant, now: Instant) -> f32 {
        if self.lifetime.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(started);
        (elapsed.as_secs_f32() / self.lifetime.as_secs_f32()).clamp(0.0, 1.0)
    }
}
