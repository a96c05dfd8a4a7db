//! Editor UI protocol
//!
//! Handles:
//! - Untyped argument values handed over by the transport
//! - Decoding of redraw notifications into typed events
//! - UI option table (`option_set`)
//! - Recorded sessions for headless replay

pub mod event;
pub mod options;
pub mod replay;
pub mod value;

use thiserror::Error;

pub use event::{decode_redraw, Anchor, GridLineCell, RedrawEvent, WindowRef};
pub use options::{UiOption, UiOptions};
pub use replay::{load_replay, parse_replay};
pub use value::Value;

/// Protocol anomaly found while decoding one event
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("{event}: missing argument {index}")]
    MissingArgument { event: String, index: usize },

    #[error("{event}: argument {index} is not {expected}")]
    TypeMismatch {
        event: String,
        index: usize,
        expected: &'static str,
    },

    #[error("{event}: malformed cell entry {index}")]
    MalformedCell { event: String, index: usize },
}
