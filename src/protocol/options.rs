//! UI options (`option_set`)
//!
//! Each recognized option has a fixed value type; anything else is kept
//! as `UiOption::Unknown` so the caller can log it.

use log::debug;

use super::{DecodeError, Value};

/// One decoded `option_set` entry
#[derive(Debug, Clone, PartialEq)]
pub enum UiOption {
    Arabicshape(bool),
    Ambiwidth(String),
    Emoji(bool),
    Guifont(String),
    Guifontwide(String),
    Linespace(i64),
    Pumblend(i64),
    Showtabline(i64),
    Termguicolors(bool),
    /// Option this client does not track
    Unknown(String),
}

impl UiOption {
    /// Decode a name/value pair using the option's fixed rule
    pub fn decode(name: &str, value: &Value) -> Result<Self, DecodeError> {
        let mismatch = |expected: &'static str| DecodeError::TypeMismatch {
            event: format!("option_set({})", name),
            index: 1,
            expected,
        };
        let boolean = || value.as_bool().ok_or_else(|| mismatch("a boolean"));
        let string = || {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| mismatch("a string"))
        };
        let integer = || value.as_i64().ok_or_else(|| mismatch("an integer"));

        Ok(match name {
            "arabicshape" => UiOption::Arabicshape(boolean()?),
            "ambiwidth" => UiOption::Ambiwidth(string()?),
            "emoji" => UiOption::Emoji(boolean()?),
            "guifont" => UiOption::Guifont(string()?),
            "guifontwide" => UiOption::Guifontwide(string()?),
            "linespace" => UiOption::Linespace(integer()?),
            "pumblend" => UiOption::Pumblend(integer()?),
            "showtabline" => UiOption::Showtabline(integer()?),
            "termguicolors" => UiOption::Termguicolors(boolean()?),
            other => UiOption::Unknown(other.to_string()),
        })
    }
}

/// Option table populated by `option_set`
#[derive(Debug, Clone, PartialEq)]
pub struct UiOptions {
    pub arabicshape: bool,
    pub ambiwidth: String,
    pub emoji: bool,
    pub guifont: String,
    pub guifontwide: String,
    pub linespace: i64,
    pub pumblend: i64,
    pub showtabline: i64,
    pub termguicolors: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            arabicshape: true,
            ambiwidth: "single".to_string(),
            emoji: true,
            guifont: String::new(),
            guifontwide: String::new(),
            linespace: 0,
            pumblend: 0,
            showtabline: 1,
            termguicolors: false,
        }
    }
}

impl UiOptions {
    /// Store a decoded option; returns false for unknown names
    pub fn apply(&mut self, option: UiOption) -> bool {
        match option {
            UiOption::Arabicshape(v) => self.arabicshape = v,
            UiOption::Ambiwidth(v) => self.ambiwidth = v,
            UiOption::Emoji(v) => self.emoji = v,
            UiOption::Guifont(v) => self.guifont = v,
            UiOption::Guifontwide(v) => self.guifontwide = v,
            UiOption::Linespace(v) => self.linespace = v,
            UiOption::Pumblend(v) => self.pumblend = v,
            UiOption::Showtabline(v) => self.showtabline = v,
            UiOption::Termguicolors(v) => self.termguicolors = v,
            UiOption::Unknown(name) => {
                debug!("Ignoring unknown UI option: {}", name);
                return false;
            }
        }
        true
    }

    /// Extra pixels per row requested by the editor (never negative)
    pub fn linespace_px(&self) -> u32 {
        self.linespace.clamp(0, u32::MAX as i64) as u32
    }
}
