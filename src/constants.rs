//! Global constants for gridview
//!
//! Consolidates atlas, timing and color defaults
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Grid Constants
// ============================================================================

/// Id of the default grid (always exists once the UI attaches)
pub const DEFAULT_GRID_ID: u64 = 1;

/// Attribute id reserved for the current default colors
pub const DEFAULT_ATTRIBUTE_ID: u64 = 0;

/// Largest cell count a single grid may hold (resizes beyond are rejected)
pub const MAX_GRID_CELLS: usize = 4096 * 4096;

// ============================================================================
// Atlas Constants
// ============================================================================

/// Default atlas backing store width (pixels)
pub const ATLAS_WIDTH: u32 = 2048;

/// Default atlas backing store height (pixels)
pub const ATLAS_HEIGHT: u32 = 2048;

// ============================================================================
// Timing Constants
// ============================================================================

/// Cursor animation lifetime in milliseconds
pub const CURSOR_ANIMATION_LENGTH_MS: u64 = 80;

// ============================================================================
// Queue Constants
// ============================================================================

/// Number of queued batches above which the consumer is considered behind
pub const QUEUE_HIGH_WATER_MARK: usize = 1024;

// ============================================================================
// Color Constants
// ============================================================================

/// Fallback foreground (0xRRGGBB)
pub const DEFAULT_FOREGROUND: u32 = 0xFFFFFF;

/// Fallback background (0xRRGGBB)
pub const DEFAULT_BACKGROUND: u32 = 0x000000;

/// Fallback special color, used for undercurl (0xRRGGBB)
pub const DEFAULT_SPECIAL: u32 = 0xFF0000;

// ============================================================================
// Font Constants
// ============================================================================

/// Default font size (pixels)
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Minimum font size (pixels)
pub const MIN_FONT_SIZE: f32 = 6.0;

/// Maximum font size (pixels)
pub const MAX_FONT_SIZE: f32 = 72.0;
