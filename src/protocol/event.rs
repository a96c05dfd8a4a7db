//! Typed redraw events
//!
//! Every event name the UI understands maps to one `RedrawEvent` variant.
//! Decoding happens once, at the transport boundary; the grid state machine
//! only ever matches on these variants.

use log::{trace, warn};
use smol_str::SmolStr;

use super::options::UiOption;
use super::{DecodeError, Value};
use crate::ui::highlight::{HighlightAttribute, StyleFlags};
use crate::ui::mode::{CursorShape, ModeInfo};

/// Opaque window handle sent alongside multigrid placement events
#[derive(Debug, Clone, PartialEq)]
pub struct WindowRef(pub Value);

/// Corner of a floating grid that is pinned to the anchor position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    NW,
    NE,
    SW,
    SE,
}

impl Anchor {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "NW" => Some(Anchor::NW),
            "NE" => Some(Anchor::NE),
            "SW" => Some(Anchor::SW),
            "SE" => Some(Anchor::SE),
            _ => None,
        }
    }
}

/// One entry of a `grid_line` cell run
#[derive(Debug, Clone, PartialEq)]
pub struct GridLineCell {
    pub text: SmolStr,
    /// Explicit highlight id; `None` reuses the previous one in the same event
    pub hl_id: Option<u64>,
    /// Repeat count; `None` means once
    pub repeat: Option<usize>,
}

impl GridLineCell {
    pub fn new(text: &str, hl_id: Option<u64>, repeat: Option<usize>) -> Self {
        Self {
            text: SmolStr::new(text),
            hl_id,
            repeat,
        }
    }
}

/// Decoded redraw event
#[derive(Debug, Clone, PartialEq)]
pub enum RedrawEvent {
    // ===== Global =====
    SetTitle(String),
    SetIcon(String),
    ModeInfoSet {
        cursor_style_enabled: bool,
        modes: Vec<ModeInfo>,
    },
    ModeChange {
        name: String,
        index: usize,
    },
    OptionSet(UiOption),
    BusyStart,
    BusyStop,
    MouseOn,
    MouseOff,
    Bell,
    VisualBell,
    Flush,

    // ===== Line-based grid =====
    GridResize {
        grid: u64,
        cols: usize,
        rows: usize,
    },
    DefaultColorsSet {
        /// `None` when the editor sends a negative (unset) color
        foreground: Option<u32>,
        background: Option<u32>,
        special: Option<u32>,
    },
    HlAttrDefine {
        id: u64,
        attr: HighlightAttribute,
    },
    GridLine {
        grid: u64,
        row: usize,
        col_start: usize,
        cells: Vec<GridLineCell>,
    },
    GridClear {
        grid: u64,
    },
    GridDestroy {
        grid: u64,
    },
    GridCursorGoto {
        grid: u64,
        row: usize,
        col: usize,
    },
    GridScroll {
        grid: u64,
        top: usize,
        bot: usize,
        left: usize,
        right: usize,
        rows: i64,
    },

    // ===== Multigrid =====
    WinPos {
        grid: u64,
        window: WindowRef,
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
    WinFloatPos {
        grid: u64,
        window: WindowRef,
        anchor: Anchor,
        anchor_grid: u64,
        anchor_row: f64,
        anchor_col: f64,
    },
    WinExternalPos {
        grid: u64,
    },
    WinHide {
        grid: u64,
    },
    WinClose {
        grid: u64,
    },
    MsgSetPos {
        grid: u64,
        row: usize,
    },
}

/// Positional argument reader that produces decode errors with context
struct Args<'a> {
    event: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn new(event: &'a str, values: &'a [Value]) -> Self {
        Self { event, values }
    }

    fn get(&self, index: usize) -> Result<&'a Value, DecodeError> {
        self.values.get(index).ok_or_else(|| DecodeError::MissingArgument {
            event: self.event.to_string(),
            index,
        })
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> DecodeError {
        DecodeError::TypeMismatch {
            event: self.event.to_string(),
            index,
            expected,
        }
    }

    fn u64(&self, index: usize) -> Result<u64, DecodeError> {
        self.get(index)?
            .as_u64()
            .ok_or_else(|| self.mismatch(index, "a non-negative integer"))
    }

    fn usize(&self, index: usize) -> Result<usize, DecodeError> {
        let v = self.u64(index)?;
        usize::try_from(v).map_err(|_| self.mismatch(index, "an index"))
    }

    fn i64(&self, index: usize) -> Result<i64, DecodeError> {
        self.get(index)?
            .as_i64()
            .ok_or_else(|| self.mismatch(index, "an integer"))
    }

    fn f64(&self, index: usize) -> Result<f64, DecodeError> {
        self.get(index)?
            .as_f64()
            .ok_or_else(|| self.mismatch(index, "a number"))
    }

    fn bool(&self, index: usize) -> Result<bool, DecodeError> {
        self.get(index)?
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "a boolean"))
    }

    fn string(&self, index: usize) -> Result<String, DecodeError> {
        self.get(index)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(index, "a string"))
    }

    fn array(&self, index: usize) -> Result<&'a [Value], DecodeError> {
        self.get(index)?
            .as_array()
            .ok_or_else(|| self.mismatch(index, "an array"))
    }

    fn map(&self, index: usize) -> Result<&'a Value, DecodeError> {
        let v = self.get(index)?;
        if v.as_map().is_some() {
            Ok(v)
        } else {
            Err(self.mismatch(index, "a map"))
        }
    }

    /// Negative numbers mean "unset" for color arguments
    fn color(&self, index: usize) -> Result<Option<u32>, DecodeError> {
        let v = self.i64(index)?;
        Ok(u32::try_from(v).ok().map(|c| c & 0xFF_FFFF))
    }
}

impl RedrawEvent {
    /// Decode one event call.
    ///
    /// Returns `Ok(None)` for event names this UI does not handle.
    pub fn decode(name: &str, args: &[Value]) -> Result<Option<Self>, DecodeError> {
        let a = Args::new(name, args);
        let event = match name {
            "set_title" => RedrawEvent::SetTitle(a.string(0)?),
            "set_icon" => RedrawEvent::SetIcon(a.string(0)?),
            "mode_info_set" => RedrawEvent::ModeInfoSet {
                cursor_style_enabled: a.bool(0)?,
                modes: a
                    .array(1)?
                    .iter()
                    .map(decode_mode_info)
                    .collect::<Result<_, _>>()?,
            },
            "mode_change" => RedrawEvent::ModeChange {
                name: a.string(0)?,
                index: a.usize(1)?,
            },
            "option_set" => {
                let option_name = a.string(0)?;
                RedrawEvent::OptionSet(UiOption::decode(&option_name, a.get(1)?)?)
            }
            "busy_start" => RedrawEvent::BusyStart,
            "busy_stop" => RedrawEvent::BusyStop,
            "mouse_on" => RedrawEvent::MouseOn,
            "mouse_off" => RedrawEvent::MouseOff,
            "bell" => RedrawEvent::Bell,
            "visual_bell" => RedrawEvent::VisualBell,
            "flush" => RedrawEvent::Flush,

            "grid_resize" => RedrawEvent::GridResize {
                grid: a.u64(0)?,
                cols: a.usize(1)?,
                rows: a.usize(2)?,
            },
            "default_colors_set" => RedrawEvent::DefaultColorsSet {
                foreground: a.color(0)?,
                background: a.color(1)?,
                special: a.color(2)?,
            },
            "hl_attr_define" => RedrawEvent::HlAttrDefine {
                id: a.u64(0)?,
                attr: decode_highlight(a.map(1)?),
            },
            "grid_line" => RedrawEvent::GridLine {
                grid: a.u64(0)?,
                row: a.usize(1)?,
                col_start: a.usize(2)?,
                cells: decode_line_cells(name, a.array(3)?)?,
            },
            "grid_clear" => RedrawEvent::GridClear { grid: a.u64(0)? },
            "grid_destroy" => RedrawEvent::GridDestroy { grid: a.u64(0)? },
            "grid_cursor_goto" => RedrawEvent::GridCursorGoto {
                grid: a.u64(0)?,
                row: a.usize(1)?,
                col: a.usize(2)?,
            },
            "grid_scroll" => RedrawEvent::GridScroll {
                grid: a.u64(0)?,
                top: a.usize(1)?,
                bot: a.usize(2)?,
                left: a.usize(3)?,
                right: a.usize(4)?,
                rows: a.i64(5)?,
            },

            "win_pos" => RedrawEvent::WinPos {
                grid: a.u64(0)?,
                window: WindowRef(a.get(1)?.clone()),
                row: a.usize(2)?,
                col: a.usize(3)?,
                width: a.usize(4)?,
                height: a.usize(5)?,
            },
            "win_float_pos" => {
                let anchor = a.string(2)?;
                RedrawEvent::WinFloatPos {
                    grid: a.u64(0)?,
                    window: WindowRef(a.get(1)?.clone()),
                    anchor: Anchor::parse(&anchor)
                        .ok_or_else(|| a.mismatch(2, "one of NW/NE/SW/SE"))?,
                    anchor_grid: a.u64(3)?,
                    anchor_row: a.f64(4)?,
                    anchor_col: a.f64(5)?,
                }
            }
            "win_external_pos" => RedrawEvent::WinExternalPos { grid: a.u64(0)? },
            "win_hide" => RedrawEvent::WinHide { grid: a.u64(0)? },
            "win_close" => RedrawEvent::WinClose { grid: a.u64(0)? },
            "msg_set_pos" => RedrawEvent::MsgSetPos {
                grid: a.u64(0)?,
                row: a.usize(1)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

/// Decode the `rgb_attr` map of `hl_attr_define`
fn decode_highlight(map: &Value) -> HighlightAttribute {
    let color = |key: &str| {
        map.get(key)
            .and_then(Value::as_i64)
            .and_then(|c| u32::try_from(c).ok())
            .map(|c| c & 0xFF_FFFF)
    };
    let flag = |key: &str| map.get(key).and_then(Value::as_bool).unwrap_or(false);

    let mut flags = StyleFlags::empty();
    flags.set(StyleFlags::REVERSE, flag("reverse"));
    flags.set(StyleFlags::ITALIC, flag("italic"));
    flags.set(StyleFlags::BOLD, flag("bold"));
    flags.set(StyleFlags::STRIKETHROUGH, flag("strikethrough"));
    flags.set(StyleFlags::UNDERLINE, flag("underline"));
    flags.set(StyleFlags::UNDERCURL, flag("undercurl"));

    HighlightAttribute {
        foreground: color("foreground"),
        background: color("background"),
        special: color("special"),
        flags,
        blend: map
            .get("blend")
            .and_then(Value::as_i64)
            .map(|b| b.clamp(0, 100) as u8)
            .unwrap_or(0),
    }
}

fn decode_mode_info(value: &Value) -> Result<ModeInfo, DecodeError> {
    if value.as_map().is_none() {
        return Err(DecodeError::TypeMismatch {
            event: "mode_info_set".to_string(),
            index: 1,
            expected: "an array of maps",
        });
    }
    let int = |key: &str| value.get(key).and_then(Value::as_u64);
    let text = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let cursor_shape = match value.get("cursor_shape").and_then(Value::as_str) {
        Some("horizontal") => CursorShape::Horizontal,
        Some("vertical") => CursorShape::Vertical,
        _ => CursorShape::Block,
    };

    Ok(ModeInfo {
        cursor_shape,
        cell_percentage: int("cell_percentage").map(|p| p.min(100) as u8),
        blink_wait: int("blinkwait"),
        blink_on: int("blinkon"),
        blink_off: int("blinkoff"),
        attr_id: int("attr_id"),
        short_name: text("short_name"),
        name: text("name"),
    })
}

/// Decode `[text, hl_id?, repeat?]` cell entries
fn decode_line_cells(event: &str, cells: &[Value]) -> Result<Vec<GridLineCell>, DecodeError> {
    let malformed = |index: usize| DecodeError::MalformedCell {
        event: event.to_string(),
        index,
    };

    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let parts = cell.as_array().ok_or_else(|| malformed(i))?;
            let text = parts.first().and_then(Value::as_str).ok_or_else(|| malformed(i))?;
            let hl_id = match parts.get(1) {
                Some(v) => Some(v.as_u64().ok_or_else(|| malformed(i))?),
                None => None,
            };
            let repeat = match parts.get(2) {
                Some(v) => Some(
                    v.as_u64()
                        .and_then(|r| usize::try_from(r).ok())
                        .ok_or_else(|| malformed(i))?,
                ),
                None => None,
            };
            Ok(GridLineCell::new(text, hl_id, repeat))
        })
        .collect()
}

/// Expand a redraw notification into a flat event list.
///
/// The notification is `[[name, args1, args2, ...], ...]`: one name
/// followed by one argument tuple per call. Calls that fail to decode are
/// logged and dropped; the rest of the notification is kept.
pub fn decode_redraw(params: &[Value]) -> Vec<RedrawEvent> {
    let mut events = Vec::with_capacity(params.len());

    for group in params {
        let Some(items) = group.as_array() else {
            warn!("Malformed redraw group (not an array): {:?}", group);
            continue;
        };
        let Some(name) = items.first().and_then(Value::as_str) else {
            warn!("Malformed redraw group (missing name)");
            continue;
        };

        for call in &items[1..] {
            let args = call.as_array().unwrap_or(&[]);
            match RedrawEvent::decode(name, args) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {
                    trace!("Ignoring unknown redraw event: {}", name);
                    break;
                }
                Err(e) => warn!("Dropping malformed event: {}", e),
            }
        }
    }

    events
}
