//! Color parsing utilities
//!
//! Colors travel as packed 24-bit `0xRRGGBB` integers, the same form the
//! editor sends them in. Helpers here convert between that form and the hex
//! strings of the config file.

/// Parse 6-digit hex color (e.g., "ff0000" -> (255, 0, 0))
/// Also supports 3-digit short format (e.g., "f00" -> (255, 0, 0))
/// Returns None on invalid input.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            // Short format: expand F -> FF
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse hex color string to packed 0xRRGGBB
pub fn parse_hex_rgb(hex: &str) -> Option<u32> {
    parse_hex_color(hex).map(|(r, g, b)| pack_rgb(r, g, b))
}

/// Pack components into 0xRRGGBB
#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Format 0xRRGGBB as a hex string without '#'
pub fn format_hex_rgb(rgb: u32) -> String {
    format!("{:06x}", rgb & 0xFF_FFFF)
}
