//! Draw state: caches one render session across frames.

use crate::backend::{BackendError, TermBackend};
use crate::geometry::TerminalGeometry;
use crate::quality::QualityOptions;
use crate::session::RenderSession;

/// Per-output-target drawing state.
///
/// Holds the session type flag and quality options for the lifetime of the
/// target, plus at most one cached [`RenderSession`]. The cached session is
/// rebuilt whenever the requested geometry differs from the one it was
/// opened for.
///
/// Not synchronized; a multi-threaded host must serialize access to each
/// instance.
pub struct DrawState<B: TermBackend> {
    backend: B,
    session_is_x11: bool,
    quality: QualityOptions,
    session: Option<RenderSession>,
}

impl<B: TermBackend> DrawState<B> {
    /// Create a draw state with default quality options.
    pub fn new(backend: B, session_is_x11: bool) -> Self {
        Self::with_quality(backend, session_is_x11, QualityOptions::default())
    }

    /// Create a draw state with explicit quality options.
    ///
    /// Quality is fixed for the lifetime of the draw state.
    pub fn with_quality(backend: B, session_is_x11: bool, quality: QualityOptions) -> Self {
        Self {
            backend,
            session_is_x11,
            quality,
            session: None,
        }
    }

    /// The quality options every session is opened with.
    pub fn quality(&self) -> QualityOptions {
        self.quality
    }

    /// Whether the display session was flagged as X11 at construction.
    pub fn session_is_x11(&self) -> bool {
        self.session_is_x11
    }

    /// Get a session valid for `geometry`, rebuilding the cached one if any
    /// of its geometry fields no longer match.
    ///
    /// The first call constructs the session lazily. On a geometry change
    /// the old session is dropped before the new one is opened, so two
    /// sessions never coexist.
    pub fn ensure_session(
        &mut self,
        geometry: TerminalGeometry,
    ) -> Result<&mut RenderSession, BackendError> {
        if let Some(current) = self.session.take() {
            if current.geometry() == geometry {
                return Ok(self.session.insert(current));
            }
            log::debug!(
                "terminal geometry changed from {:?} to {:?}, rebuilding render session",
                current.geometry(),
                geometry
            );
            drop(current);
        }

        let session =
            RenderSession::open(&self.backend, geometry, self.session_is_x11, &self.quality)?;
        Ok(self.session.insert(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Canvas, CanvasSpec, OpenCanvas};
    use crate::capability::{CanvasMode, Capabilities, PixelLayout, PixelMode};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StubCanvas;

    impl Canvas for StubCanvas {
        fn draw(&mut self, _: PixelLayout, _: &[u8], _: u32, _: u32, _: u32) {}
        fn to_text(&mut self) -> String {
            "stub".to_string()
        }
    }

    struct CountingBackend {
        opened: Rc<RefCell<usize>>,
    }

    impl TermBackend for CountingBackend {
        fn open_canvas(&self, _spec: &CanvasSpec) -> Result<OpenCanvas, BackendError> {
            *self.opened.borrow_mut() += 1;
            Ok(OpenCanvas {
                capabilities: Capabilities {
                    canvas_mode: CanvasMode::TrueColor,
                    pixel_mode: PixelMode::Symbols,
                },
                canvas: Box::new(StubCanvas),
            })
        }
    }

    #[test]
    fn test_session_is_built_lazily() {
        let opened = Rc::new(RefCell::new(0));
        let mut state = DrawState::new(CountingBackend { opened: opened.clone() }, false);
        assert_eq!(*opened.borrow(), 0);
        state.ensure_session(TerminalGeometry::new(80, 24)).unwrap();
        assert_eq!(*opened.borrow(), 1);
    }

    #[test]
    fn test_same_geometry_reuses_session() {
        let opened = Rc::new(RefCell::new(0));
        let mut state = DrawState::new(CountingBackend { opened: opened.clone() }, false);
        let geometry = TerminalGeometry::with_cell_size(80, 24, 8, 16);
        state.ensure_session(geometry).unwrap();
        state.ensure_session(geometry).unwrap();
        state.ensure_session(geometry).unwrap();
        assert_eq!(*opened.borrow(), 1);
    }

    #[test]
    fn test_geometry_change_rebuilds_session() {
        let opened = Rc::new(RefCell::new(0));
        let mut state = DrawState::new(CountingBackend { opened: opened.clone() }, false);
        state
            .ensure_session(TerminalGeometry::new(80, 24))
            .unwrap();
        state
            .ensure_session(TerminalGeometry::new(80, 25))
            .unwrap();
        assert_eq!(*opened.borrow(), 2);
    }

    #[test]
    fn test_quality_is_fixed_at_construction() {
        let opened = Rc::new(RefCell::new(0));
        let quality = QualityOptions {
            dithering: false,
            ..QualityOptions::default()
        };
        let state = DrawState::with_quality(CountingBackend { opened }, true, quality);
        assert_eq!(state.quality(), quality);
        assert!(state.session_is_x11());
    }
}
