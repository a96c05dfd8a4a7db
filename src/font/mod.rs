//! Font loading and glyph atlas management
//!
//! Handles:
//! - TTF/OTF font loading (fontdue)
//! - Glyph rasterization behind the `GlyphRasterizer` seam
//! - Glyph atlas packing with reset-on-overflow

pub mod atlas;
pub mod raster;

use std::path::Path;

use log::{debug, info};
use thiserror::Error;

pub use atlas::{Allocation, AtlasRect, GlyphAtlas, GlyphKey};
pub use raster::{BoxRasterizer, CellSize, FontdueRasterizer, GlyphRasterizer, RasterizedGlyph};

/// Font loading failure
#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    Parse(String),

    #[error("font has no horizontal line metrics")]
    MissingMetrics,

    #[error("no system font found (searched: {})", .0.join(", "))]
    NotFound(Vec<String>),
}

/// Load a font file
pub fn load_font_file(path: &Path) -> Result<Vec<u8>, FontError> {
    std::fs::read(path).map_err(|source| FontError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Search and load a system monospace font
///
/// Search order:
/// 1. GRIDVIEW_FONT environment variable
/// 2. Known paths (hardcoded)
pub fn load_system_font() -> Result<Vec<u8>, FontError> {
    if let Ok(path) = std::env::var("GRIDVIEW_FONT") {
        let data = load_font_file(Path::new(&path))?;
        info!("Font loaded: {} (GRIDVIEW_FONT)", path);
        return Ok(data);
    }

    let candidates = [
        // Linux
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
        "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
        // macOS
        "/System/Library/Fonts/Menlo.ttc",
        "/System/Library/Fonts/Monaco.ttf",
    ];

    for path in &candidates {
        if let Ok(data) = std::fs::read(path) {
            info!("Font loaded: {}", path);
            return Ok(data);
        }
        debug!("Font not at {}", path);
    }

    Err(FontError::NotFound(
        candidates.iter().map(|s| s.to_string()).collect(),
    ))
}
