//! Editor modes (`mode_info_set` / `mode_change`)

use log::debug;

/// Cursor shape for a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    /// Horizontal bar at the bottom of the cell
    Horizontal,
    /// Vertical bar at the left of the cell
    Vertical,
}

/// Cursor appearance for one mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeInfo {
    pub cursor_shape: CursorShape,
    /// Share of the cell covered by horizontal/vertical cursors (0-100)
    pub cell_percentage: Option<u8>,
    /// Blink timings in milliseconds (0 or `None` = no blink)
    pub blink_wait: Option<u64>,
    pub blink_on: Option<u64>,
    pub blink_off: Option<u64>,
    /// Highlight id for cursor colors (0 = inverse of the cell)
    pub attr_id: Option<u64>,
    pub short_name: String,
    pub name: String,
}

impl ModeInfo {
    /// Whether this mode blinks the cursor
    pub fn blinks(&self) -> bool {
        matches!(
            (self.blink_wait, self.blink_on, self.blink_off),
            (Some(w), Some(on), Some(off)) if w > 0 && on > 0 && off > 0
        )
    }
}

/// Mode list plus the active index
#[derive(Debug, Clone, Default)]
pub struct Mode {
    infos: Vec<ModeInfo>,
    current: usize,
    cursor_style_enabled: bool,
}

impl Mode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the mode list wholesale
    pub fn set_infos(&mut self, cursor_style_enabled: bool, infos: Vec<ModeInfo>) {
        debug!("mode_info_set: {} modes", infos.len());
        self.cursor_style_enabled = cursor_style_enabled;
        self.infos = infos;
    }

    /// Switch the active mode by index
    pub fn change(&mut self, index: usize) {
        if index >= self.infos.len() {
            debug!(
                "mode_change: index {} outside {} known modes",
                index,
                self.infos.len()
            );
        }
        self.current = index;
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Active mode info (None before `mode_info_set` or for a stale index)
    pub fn current(&self) -> Option<&ModeInfo> {
        self.infos.get(self.current)
    }

    pub fn cursor_style_enabled(&self) -> bool {
        self.cursor_style_enabled
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}
