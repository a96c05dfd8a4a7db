//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings.
//! Default config path: ~/.config/gridview/config.toml

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    ATLAS_HEIGHT, ATLAS_WIDTH, CURSOR_ANIMATION_LENGTH_MS, DEFAULT_BACKGROUND,
    DEFAULT_FONT_SIZE, DEFAULT_FOREGROUND, DEFAULT_SPECIAL, MAX_FONT_SIZE, MIN_FONT_SIZE,
    QUEUE_HIGH_WATER_MARK,
};
use crate::utils::color::{format_hex_rgb, parse_hex_rgb};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font settings
    pub font: FontConfig,
    /// Fallback colors used until the editor sends its own
    pub appearance: AppearanceConfig,
    /// Glyph atlas settings
    pub atlas: AtlasConfig,
    /// Cursor settings
    pub cursor: CursorConfig,
    /// Inbound event queue settings
    pub queue: QueueConfig,
}

/// Font settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Main font file path (searches system fonts if empty)
    pub main: String,
    /// Font size (pixels)
    pub size: f32,
    /// Extra pixels added to every row
    pub linespace: u32,
}

/// Appearance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Foreground color (RRGGBB)
    pub foreground: String,
    /// Background color (RRGGBB)
    pub background: String,
    /// Special color for undercurl (RRGGBB)
    pub special: String,
}

/// Glyph atlas settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Backing store width (pixels)
    pub width: u32,
    /// Backing store height (pixels)
    pub height: u32,
}

/// Cursor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Movement animation length in milliseconds (0 = no animation)
    pub animation_length_ms: u64,
    /// Hide the cursor between busy_start and busy_stop
    pub hide_when_busy: bool,
}

/// Inbound queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Queued batch count that triggers a backlog warning
    pub high_water_mark: usize,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            main: String::new(),
            size: DEFAULT_FONT_SIZE,
            linespace: 0,
        }
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            foreground: format_hex_rgb(DEFAULT_FOREGROUND),
            background: format_hex_rgb(DEFAULT_BACKGROUND),
            special: format_hex_rgb(DEFAULT_SPECIAL),
        }
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: ATLAS_WIDTH,
            height: ATLAS_HEIGHT,
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            animation_length_ms: CURSOR_ANIMATION_LENGTH_MS,
            hide_when_busy: true,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            high_water_mark: QUEUE_HIGH_WATER_MARK,
        }
    }
}

impl FontConfig {
    /// Font size clamped to the supported range
    pub fn clamped_size(&self) -> f32 {
        self.size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
    }
}

impl AppearanceConfig {
    /// Foreground as 0xRRGGBB (invalid hex falls back to built-in)
    pub fn foreground_rgb(&self) -> u32 {
        parse_hex_rgb(&self.foreground).unwrap_or(DEFAULT_FOREGROUND)
    }

    /// Background as 0xRRGGBB (invalid hex falls back to built-in)
    pub fn background_rgb(&self) -> u32 {
        parse_hex_rgb(&self.background).unwrap_or(DEFAULT_BACKGROUND)
    }

    /// Special as 0xRRGGBB (invalid hex falls back to built-in)
    pub fn special_rgb(&self) -> u32 {
        parse_hex_rgb(&self.special).unwrap_or(DEFAULT_SPECIAL)
    }
}

impl Config {
    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. GRIDVIEW_CONFIG environment variable
        if let Ok(path) = std::env::var("GRIDVIEW_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/gridview/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("gridview").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        None
    }

    /// Load configuration with priority:
    /// 1. GRIDVIEW_CONFIG environment variable
    /// 2. ~/.config/gridview/config.toml (user config)
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Write the built-in defaults to the user config path
    pub fn write_default_config() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("gridview");
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {}", config_dir.display()))?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        info!("Config written: {}", config_path.display());
        Ok(config_path)
    }
}
