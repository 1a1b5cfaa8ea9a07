//! Detected terminal capabilities and pixel channel-order selection.

/// Output technique chosen by capability detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasMode {
    /// 24-bit color glyph output
    TrueColor,
    /// 256-color palette
    Indexed256,
    /// 256-color palette minus the 16 low colors
    Indexed240,
    /// 16-color palette
    Indexed16,
    /// Default fg/bg colors plus inverse video
    FgBgBgFg,
    /// Default fg/bg colors only
    FgBg,
    /// 8-color palette
    Indexed8,
    /// 16 foreground colors, 8 background colors
    Indexed16Fg8Bg,
}

/// Pixel-graphics protocol supported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    /// No pixel protocol; approximate with glyphs
    Symbols,
    /// DEC sixel graphics
    Sixels,
    /// Kitty graphics protocol
    Kitty,
    /// iTerm2 inline images
    Iterm2,
}

/// What capability detection reported for the current terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub canvas_mode: CanvasMode,
    pub pixel_mode: PixelMode,
}

/// Channel order a pixel buffer is interpreted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Red, green, blue, alpha
    Rgba,
    /// Blue, green, red, alpha
    Bgra,
}

impl PixelLayout {
    /// Select the channel order for a conversion.
    ///
    /// Kitty pixel output under a non-X11 session reads the buffer as RGBA;
    /// every other combination reads it as BGRA. Pixel delivery paths
    /// produce different channel orders depending on the compositing
    /// backend, and this is the rule that matches them up.
    pub fn for_output(pixel_mode: PixelMode, session_is_x11: bool) -> Self {
        if pixel_mode == PixelMode::Kitty && !session_is_x11 {
            PixelLayout::Rgba
        } else {
            PixelLayout::Bgra
        }
    }

    /// Bytes per pixel (always 4 for the supported layouts).
    pub fn bytes_per_pixel(self) -> usize {
        4
    }
}

/// Whether the current display session runs under X11.
///
/// Reads `XDG_SESSION_TYPE` from the environment.
pub fn session_is_x11() -> bool {
    is_x11_session_type(std::env::var("XDG_SESSION_TYPE").ok().as_deref())
}

/// Interpret an `XDG_SESSION_TYPE` value.
pub fn is_x11_session_type(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("x11"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_kitty_without_x11_is_rgba() {
        assert_eq!(
            PixelLayout::for_output(PixelMode::Kitty, false),
            PixelLayout::Rgba
        );
    }

    #[test]
    fn test_layout_kitty_under_x11_is_bgra() {
        assert_eq!(
            PixelLayout::for_output(PixelMode::Kitty, true),
            PixelLayout::Bgra
        );
    }

    #[test]
    fn test_layout_non_kitty_is_bgra_regardless_of_session() {
        for mode in [PixelMode::Symbols, PixelMode::Sixels, PixelMode::Iterm2] {
            assert_eq!(PixelLayout::for_output(mode, false), PixelLayout::Bgra);
            assert_eq!(PixelLayout::for_output(mode, true), PixelLayout::Bgra);
        }
    }

    #[test]
    fn test_session_type_parsing() {
        assert!(is_x11_session_type(Some("x11")));
        assert!(is_x11_session_type(Some("X11")));
        assert!(is_x11_session_type(Some(" x11 ")));
        assert!(!is_x11_session_type(Some("wayland")));
        assert!(!is_x11_session_type(Some("tty")));
        assert!(!is_x11_session_type(Some("")));
        assert!(!is_x11_session_type(None));
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(PixelLayout::Rgba.bytes_per_pixel(), 4);
        assert_eq!(PixelLayout::Bgra.bytes_per_pixel(), 4);
    }
}
