//! Glyph atlas
//!
//! Packs rasterized glyphs into a single fixed-size coverage texture.
//! Allocation is a row-major bump allocator with rows one cell tall. When
//! the texture runs out of rows the whole atlas is reset and the caller has
//! to repaint everything, since rects handed out earlier are now stale.

use std::collections::HashMap;

use log::{debug, warn};
use smol_str::SmolStr;

use super::raster::GlyphRasterizer;
use crate::ui::highlight::StyleFlags;

/// Lookup key: text plus the style bits that change the glyph's pixels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub text: SmolStr,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl GlyphKey {
    pub fn new(text: &str, flags: StyleFlags) -> Self {
        Self {
            text: SmolStr::new(text),
            bold: flags.contains(StyleFlags::BOLD),
            italic: flags.contains(StyleFlags::ITALIC),
            underline: flags.intersects(StyleFlags::UNDERLINE | StyleFlags::UNDERCURL),
            strikethrough: flags.contains(StyleFlags::STRIKETHROUGH),
        }
    }

    /// Plain key without style bits
    pub fn plain(text: &str) -> Self {
        Self::new(text, StyleFlags::empty())
    }
}

/// Region of the backing texture holding one glyph (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    /// Normalized texture coordinates [u, v, w, h]
    pub fn uv(&self, atlas_width: u32, atlas_height: u32) -> [f32; 4] {
        let aw = atlas_width.max(1) as f32;
        let ah = atlas_height.max(1) as f32;
        [
            self.x as f32 / aw,
            self.y as f32 / ah,
            self.width as f32 / aw,
            self.height as f32 / ah,
        ]
    }
}

/// Result of a raw allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Space found at (x, y)
    Placed { x: u32, y: u32 },
    /// Atlas was full: everything was cleared and space found at (x, y)
    Reset { x: u32, y: u32 },
    /// Request can never fit in this atlas
    TooLarge,
}

pub struct GlyphAtlas {
    /// Texture width
    width: u32,
    /// Texture height
    height: u32,
    /// Row height (one cell)
    cell_height: u32,
    /// Bump cursor: current X position
    cursor_x: u32,
    /// Bump cursor: top of the current row
    cursor_y: u32,
    cache: HashMap<GlyphKey, AtlasRect>,
    /// CPU-side texture data (R8 coverage)
    data: Vec<u8>,
    /// GPU re-upload flag
    dirty: bool,
    /// Bumped on every reset
    generation: u64,
}

impl GlyphAtlas {
    pub fn new(width: u32, height: u32, cell_height: u32) -> Self {
        debug!(
            "Atlas size: {}x{} (row height {})",
            width, height, cell_height
        );
        Self {
            width,
            height,
            cell_height: cell_height.max(1),
            cursor_x: 0,
            cursor_y: 0,
            cache: HashMap::new(),
            data: vec![0u8; width as usize * height as usize],
            dirty: false,
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_height
    }

    /// Number of cached glyphs
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Reset counter; a change means every previously returned rect is stale
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current bump cursor (x, y)
    pub fn alloc_cursor(&self) -> (u32, u32) {
        (self.cursor_x, self.cursor_y)
    }

    /// Cached rect for a key, without rasterizing
    pub fn get(&self, key: &GlyphKey) -> Option<AtlasRect> {
        self.cache.get(key).copied()
    }

    /// Look up a glyph, rasterizing and packing it on a miss.
    ///
    /// Returns None when the rasterizer has no glyph for the key or the
    /// glyph cannot fit in the texture at all.
    pub fn resolve(
        &mut self,
        key: &GlyphKey,
        rasterizer: &mut dyn GlyphRasterizer,
    ) -> Option<AtlasRect> {
        if let Some(rect) = self.cache.get(key) {
            return Some(*rect);
        }

        let glyph = rasterizer.rasterize(key)?;
        let (x, y) = match self.allocate(glyph.width) {
            Allocation::Placed { x, y } | Allocation::Reset { x, y } => (x, y),
            Allocation::TooLarge => {
                warn!("Glyph {:?} ({}px) does not fit in atlas", key.text, glyph.width);
                return None;
            }
        };

        let rect = AtlasRect {
            x,
            y,
            width: glyph.width,
            height: glyph.height.min(self.cell_height),
        };
        self.blit(&rect, glyph.width, &glyph.bitmap);
        self.cache.insert(key.clone(), rect);
        Some(rect)
    }

    /// Reserve `width` pixels on the current row.
    ///
    /// Wraps to the next row when the current one is exhausted; resets the
    /// whole atlas when no row is left.
    pub fn allocate(&mut self, width: u32) -> Allocation {
        if width > self.width || self.cell_height > self.height {
            return Allocation::TooLarge;
        }

        let mut reset = false;
        if self.cursor_x + width > self.width {
            self.cursor_x = 0;
            self.cursor_y += self.cell_height;
        }
        if self.cursor_y + self.cell_height > self.height {
            warn!(
                "Atlas full ({} glyphs), resetting",
                self.cache.len()
            );
            self.clear();
            reset = true;
        }

        let (x, y) = (self.cursor_x, self.cursor_y);
        self.cursor_x += width;
        if reset {
            Allocation::Reset { x, y }
        } else {
            Allocation::Placed { x, y }
        }
    }

    /// Drop every cached glyph and rewind the allocation cursor
    pub fn clear(&mut self) {
        self.cache.clear();
        self.data.fill(0);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.dirty = true;
        self.generation += 1;
    }

    /// Change row height (font change); implies a reset
    pub fn set_cell_height(&mut self, cell_height: u32) {
        self.cell_height = cell_height.max(1);
        self.clear();
    }

    /// Copy a coverage bitmap into the backing store, clipped to `rect`
    fn blit(&mut self, rect: &AtlasRect, src_width: u32, bitmap: &[u8]) {
        let aw = self.width as usize;
        for y in 0..rect.height as usize {
            for x in 0..rect.width as usize {
                let src_idx = y * src_width as usize + x;
                let dst_idx = (rect.y as usize + y) * aw + rect.x as usize + x;
                if let (Some(&src), Some(dst)) = (bitmap.get(src_idx), self.data.get_mut(dst_idx)) {
                    *dst = src;
                }
            }
        }
        self.dirty = true;
    }

    /// CPU-side texture data (row-major, one byte per pixel)
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Returns true once after the texture changed (caller re-uploads)
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
