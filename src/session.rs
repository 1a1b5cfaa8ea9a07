//! A render session: one configured canvas for a fixed terminal geometry.

use crate::backend::{BackendError, Canvas, CanvasSpec, TermBackend};
use crate::capability::{Capabilities, PixelLayout};
use crate::geometry::TerminalGeometry;
use crate::quality::QualityOptions;

/// One fully configured rendering context.
///
/// Geometry and quality are fixed at construction; any change requires
/// dropping the session and opening a new one. The canvas inside is
/// reusable across repeated [`convert`](Self::convert) calls.
pub struct RenderSession {
    geometry: TerminalGeometry,
    capabilities: Capabilities,
    session_is_x11: bool,
    canvas: Box<dyn Canvas>,
}

impl RenderSession {
    /// Open a session for the given geometry and quality.
    ///
    /// Terminal capabilities are detected by the backend as part of this
    /// call and stay baked into the session.
    pub fn open(
        backend: &impl TermBackend,
        geometry: TerminalGeometry,
        session_is_x11: bool,
        quality: &QualityOptions,
    ) -> Result<Self, BackendError> {
        let spec = CanvasSpec::new(&geometry, quality);
        let opened = backend.open_canvas(&spec)?;
        log::debug!(
            "opened render session: {}x{} cells, cell size {:?}, {:?}",
            geometry.columns,
            geometry.rows,
            geometry.cell_size(),
            opened.capabilities
        );
        Ok(Self {
            geometry,
            capabilities: opened.capabilities,
            session_is_x11,
            canvas: opened.canvas,
        })
    }

    /// The geometry this session was opened for.
    pub fn geometry(&self) -> TerminalGeometry {
        self.geometry
    }

    /// Capabilities detected when the session was opened.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The channel order [`convert`](Self::convert) reads pixel buffers with.
    pub fn pixel_layout(&self) -> PixelLayout {
        PixelLayout::for_output(self.capabilities.pixel_mode, self.session_is_x11)
    }

    /// Convert a 4-channel pixel buffer into a printable terminal sequence.
    ///
    /// `width`/`height` are the buffer's pixel dimensions and `stride` its
    /// row pitch in bytes. The buffer is read in the channel order given by
    /// [`pixel_layout`](Self::pixel_layout).
    pub fn convert(&mut self, pixels: &[u8], width: u32, height: u32, stride: u32) -> String {
        debug_assert!(pixels.len() >= stride as usize * height as usize);
        let layout = self.pixel_layout();
        self.canvas.draw(layout, pixels, width, height, stride);
        self.canvas.to_text()
    }
}
