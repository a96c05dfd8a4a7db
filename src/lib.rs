//! gridview - screen model for a remote editor's multigrid UI
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │   Transport (external)                   │
//! │        ↓ redraw notifications            │
//! │   protocol: Value → RedrawEvent          │
//! │        ↓ BatchSender / BatchReceiver     │
//! │   ui: dispatcher → GridManager, Cursor   │
//! │        ↓ dirty cells                     │
//! │   render: build_frame ← GlyphAtlas       │
//! └──────────────────────────────────────────┘
//! ```

pub mod config;
pub mod constants;
pub mod font;
pub mod protocol;
pub mod ui;
pub mod utils;

pub use config::Config;
pub use font::{BoxRasterizer, CellSize, FontdueRasterizer, GlyphAtlas, GlyphRasterizer};
pub use protocol::{decode_redraw, RedrawEvent, Value};
pub use ui::{batch_queue, build_frame, Frame, NullWindow, UiState, WindowHandler};
