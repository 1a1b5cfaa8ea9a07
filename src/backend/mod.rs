//! Rendering backend abstraction.
//!
//! The chafa library is consumed through the [`TermBackend`] trait: the
//! backend detects terminal capabilities, builds a configured canvas from a
//! [`CanvasSpec`], and hands back a [`Canvas`] that turns pixel buffers into
//! printable text. Keeping the seam here lets the session cache be exercised
//! against a recording fake in tests, with the real libchafa binding living
//! in [`chafa`].

use crate::capability::{Capabilities, PixelLayout};
use crate::geometry::TerminalGeometry;
use crate::quality::QualityOptions;

pub mod chafa;

/// Symbol classes the rendering library may draw glyphs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTag {
    Space,
    Solid,
    Stipple,
    Block,
    Border,
    Diagonal,
    Dot,
    Quad,
    /// Half blocks split along the horizontal axis
    HorizHalf,
    /// Half blocks split along the vertical axis
    VertHalf,
    /// Both half-block orientations
    Half,
    Inverted,
    /// Rarely-supported extra symbols for fine detail
    Extra,
    /// Catch-all covering every usable symbol
    All,
}

impl SymbolTag {
    /// Bitmask value of this class in the rendering library's tag space.
    pub fn bits(self) -> u32 {
        match self {
            SymbolTag::Space => 1 << 0,
            SymbolTag::Solid => 1 << 1,
            SymbolTag::Stipple => 1 << 2,
            SymbolTag::Block => 1 << 3,
            SymbolTag::Border => 1 << 4,
            SymbolTag::Diagonal => 1 << 5,
            SymbolTag::Dot => 1 << 6,
            SymbolTag::Quad => 1 << 7,
            SymbolTag::HorizHalf => 1 << 8,
            SymbolTag::VertHalf => 1 << 9,
            SymbolTag::Half => (1 << 8) | (1 << 9),
            SymbolTag::Inverted => 1 << 10,
            SymbolTag::Extra => 1 << 30,
            // ~(EXTRA | AMBIGUOUS | UGLY)
            SymbolTag::All => 0xBFE7_FFFF,
        }
    }
}

/// Symbol classes selected for best glyph quality.
///
/// The repertoire is a set, so order of addition does not affect the final
/// membership; what matters is that every class ends up included.
pub const QUALITY_SYMBOL_TAGS: &[SymbolTag] = &[
    SymbolTag::Block,
    SymbolTag::Border,
    SymbolTag::Space,
    SymbolTag::Solid,
    SymbolTag::Stipple,
    SymbolTag::Diagonal,
    SymbolTag::Dot,
    SymbolTag::Quad,
    SymbolTag::HorizHalf,
    SymbolTag::VertHalf,
    SymbolTag::Half,
    SymbolTag::Inverted,
    SymbolTag::Extra,
    SymbolTag::All,
];

/// Dithering configuration for a canvas. Dithering is either fully on
/// (error diffusion, fixed grain, full intensity) or fully off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DitherSpec {
    None,
    Diffusion { grain: (u16, u16), intensity: f32 },
}

impl DitherSpec {
    /// Derive the dithering configuration from quality options.
    pub fn from_quality(quality: &QualityOptions) -> Self {
        if quality.dithering {
            DitherSpec::Diffusion {
                grain: (4, 4),
                intensity: 1.0,
            }
        } else {
            DitherSpec::None
        }
    }
}

/// Everything a backend needs to build one configured canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSpec {
    pub width_cells: u16,
    pub height_cells: u16,
    /// Pixel dimensions of one cell; `None` leaves the cell geometry unset
    /// so the library guesses an aspect
    pub cell_size: Option<(u16, u16)>,
    pub symbols: &'static [SymbolTag],
    pub optimizations: bool,
    pub preprocessing: bool,
    pub work_factor: f32,
    pub dither: DitherSpec,
}

impl CanvasSpec {
    /// Build the spec for a geometry/quality pair.
    pub fn new(geometry: &TerminalGeometry, quality: &QualityOptions) -> Self {
        Self {
            width_cells: geometry.columns,
            height_cells: geometry.rows,
            cell_size: geometry.cell_size(),
            symbols: QUALITY_SYMBOL_TAGS,
            optimizations: quality.optimizations,
            preprocessing: quality.preprocessing,
            work_factor: quality.work_factor,
            dither: DitherSpec::from_quality(quality),
        }
    }
}

/// A configured canvas plus the capabilities detected while opening it.
pub struct OpenCanvas {
    pub capabilities: Capabilities,
    pub canvas: Box<dyn Canvas>,
}

/// One configured conversion surface.
///
/// `draw` loads a pixel buffer, `to_text` emits the printable sequence for
/// the most recently drawn buffer. The canvas is reusable across repeated
/// draw/print rounds at its fixed geometry.
pub trait Canvas {
    fn draw(&mut self, layout: PixelLayout, pixels: &[u8], width: u32, height: u32, stride: u32);
    fn to_text(&mut self) -> String;
}

/// The rendering library boundary.
///
/// Detection runs once per `open_canvas` call and its result is baked into
/// the returned canvas.
pub trait TermBackend {
    fn open_canvas(&self, spec: &CanvasSpec) -> Result<OpenCanvas, BackendError>;
}

/// Failures crossing the rendering library boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to load the chafa library: {0}")]
    LibraryNotFound(libloading::Error),

    #[error("chafa symbol '{name}' could not be resolved: {source}")]
    MissingSymbol {
        name: &'static str,
        source: libloading::Error,
    },

    #[error("terminal capability detection failed")]
    DetectionFailed,

    #[error("chafa canvas creation failed")]
    CanvasCreation,
}
