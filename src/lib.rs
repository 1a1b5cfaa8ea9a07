//! chafa-draw library crate.
//!
//! Converts raw 4-channel pixel buffers into printable terminal escape
//! sequences (block glyphs, Kitty/Sixel pixel protocols) by driving the
//! chafa terminal-graphics library. The central type is [`DrawState`]: it
//! is created once per output target, configured with quality options, and
//! reused across frames, rebuilding its internal render session only when
//! the terminal geometry changes.

pub mod backend;
pub mod capability;
pub mod config;
pub mod draw;
pub mod geometry;
pub mod quality;
pub mod session;

pub use backend::chafa::ChafaBackend;
pub use backend::{
    BackendError, Canvas, CanvasSpec, DitherSpec, OpenCanvas, SymbolTag, TermBackend,
};
pub use capability::{session_is_x11, CanvasMode, Capabilities, PixelLayout, PixelMode};
pub use config::{Config, ConfigError};
pub use draw::DrawState;
pub use geometry::TerminalGeometry;
pub use quality::{QualityOptions, QualityPreset};
pub use session::RenderSession;
