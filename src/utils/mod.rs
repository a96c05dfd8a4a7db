//! Utility functions shared across gridview
//!
//! Common helpers that don't fit in specialized modules.

pub mod color;

pub use color::{format_hex_rgb, pack_rgb, parse_hex_color, parse_hex_rgb};
