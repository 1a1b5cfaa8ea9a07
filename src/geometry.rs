//! Terminal geometry: cell grid size and per-cell pixel dimensions.

/// Size of the terminal's text grid, plus the pixel dimensions of one
/// character cell when the terminal reports them.
///
/// `cell_width`/`cell_height` of 0 mean "unknown"; the rendering library
/// will guess a cell aspect in that case. Equality over all four fields is
/// what decides whether a cached render session can be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalGeometry {
    /// Grid width in character cells
    pub columns: u16,
    /// Grid height in character cells
    pub rows: u16,
    /// Width of one cell in pixels (0 = unknown)
    pub cell_width: u16,
    /// Height of one cell in pixels (0 = unknown)
    pub cell_height: u16,
}

impl Default for TerminalGeometry {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 24,
            cell_width: 0,
            cell_height: 0,
        }
    }
}

impl TerminalGeometry {
    /// Create a geometry with unknown cell pixel dimensions.
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns,
            rows,
            cell_width: 0,
            cell_height: 0,
        }
    }

    /// Create a geometry with known cell pixel dimensions.
    pub fn with_cell_size(columns: u16, rows: u16, cell_width: u16, cell_height: u16) -> Self {
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
        }
    }

    /// Pixel dimensions of one cell, if both are known.
    ///
    /// Returns `None` when either dimension is 0, in which case the cell
    /// geometry must be left out of the canvas configuration entirely.
    pub fn cell_size(&self) -> Option<(u16, u16)> {
        if self.cell_width > 0 && self.cell_height > 0 {
            Some((self.cell_width, self.cell_height))
        } else {
            None
        }
    }

    /// Query the controlling terminal for its current geometry.
    ///
    /// Uses `TIOCGWINSZ` on the stdout descriptor. Per-cell pixel sizes are
    /// derived from the reported window pixel dimensions; terminals that
    /// don't report them yield 0 (unknown).
    ///
    /// Returns `None` when stdout is not a terminal.
    #[cfg(unix)]
    pub fn probe() -> Option<Self> {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let ok = unsafe {
            libc::isatty(libc::STDOUT_FILENO) == 1
                && libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) == 0
        };
        if !ok || ws.ws_col == 0 || ws.ws_row == 0 {
            return None;
        }

        let cell_width = if ws.ws_xpixel > 0 { ws.ws_xpixel / ws.ws_col } else { 0 };
        let cell_height = if ws.ws_ypixel > 0 { ws.ws_ypixel / ws.ws_row } else { 0 };

        Some(Self {
            columns: ws.ws_col,
            rows: ws.ws_row,
            cell_width,
            cell_height,
        })
    }

    /// Terminal geometry probing is only implemented for unix targets.
    #[cfg(not(unix))]
    pub fn probe() -> Option<Self> {
        None
    }
}
