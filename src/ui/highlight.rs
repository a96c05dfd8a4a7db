//! Highlight attribute table
//!
//! Cells reference attributes by integer id. Colors left unset on an
//! attribute follow the current default colors, so a later
//! `default_colors_set` changes every attribute that did not pin a channel.

use std::collections::HashMap;

use bitflags::bitflags;
use log::debug;

use crate::constants::DEFAULT_ATTRIBUTE_ID;

bitflags! {
    /// Attribute style flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const REVERSE       = 0b0000_0001;
        const ITALIC        = 0b0000_0010;
        const BOLD          = 0b0000_0100;
        const STRIKETHROUGH = 0b0000_1000;
        const UNDERLINE     = 0b0001_0000;
        const UNDERCURL     = 0b0010_0000;
    }
}

/// Attribute as defined by `hl_attr_define`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightAttribute {
    /// 0xRRGGBB, `None` follows the default foreground
    pub foreground: Option<u32>,
    /// 0xRRGGBB, `None` follows the default background
    pub background: Option<u32>,
    /// 0xRRGGBB, `None` follows the default special color
    pub special: Option<u32>,
    pub flags: StyleFlags,
    /// Blend level 0-100
    pub blend: u8,
}

/// Process-wide default colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultColors {
    pub foreground: u32,
    pub background: u32,
    pub special: u32,
}

/// Attribute with every channel filled in and reverse already applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAttribute {
    pub foreground: u32,
    pub background: u32,
    pub special: u32,
    pub flags: StyleFlags,
    pub blend: u8,
}

impl ResolvedAttribute {
    /// Attribute id 0
    pub fn from_defaults(defaults: &DefaultColors) -> Self {
        Self {
            foreground: defaults.foreground,
            background: defaults.background,
            special: defaults.special,
            flags: StyleFlags::empty(),
            blend: 0,
        }
    }

    #[inline]
    pub fn bold(&self) -> bool {
        self.flags.contains(StyleFlags::BOLD)
    }

    #[inline]
    pub fn italic(&self) -> bool {
        self.flags.contains(StyleFlags::ITALIC)
    }
}

/// Id -> attribute table shared by all grids
#[derive(Debug, Default)]
pub struct HighlightTable {
    attrs: HashMap<u64, HighlightAttribute>,
}

impl HighlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) an attribute.
    ///
    /// Id 0 always means "default colors" and is never stored; returns
    /// false when the definition was rejected.
    pub fn define(&mut self, id: u64, attr: HighlightAttribute) -> bool {
        if id == DEFAULT_ATTRIBUTE_ID {
            debug!("Ignoring redefinition of attribute 0");
            return false;
        }
        self.attrs.insert(id, attr);
        true
    }

    pub fn get(&self, id: u64) -> Option<&HighlightAttribute> {
        self.attrs.get(&id)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Resolve an id against the current defaults.
    ///
    /// Unset channels are substituted first, then `reverse` swaps the
    /// substituted foreground and background. Unknown ids resolve like id 0.
    pub fn resolve(&self, id: u64, defaults: &DefaultColors) -> ResolvedAttribute {
        let Some(attr) = self.attrs.get(&id) else {
            return ResolvedAttribute::from_defaults(defaults);
        };

        let mut foreground = attr.foreground.unwrap_or(defaults.foreground);
        let mut background = attr.background.unwrap_or(defaults.background);
        if attr.flags.contains(StyleFlags::REVERSE) {
            std::mem::swap(&mut foreground, &mut background);
        }

        ResolvedAttribute {
            foreground,
            background,
            special: attr.special.unwrap_or(defaults.special),
            flags: attr.flags,
            blend: attr.blend,
        }
    }
}
