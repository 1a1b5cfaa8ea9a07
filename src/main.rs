mod cli;

use std::io::Write;
use std::time::Duration;

use clap::Parser;

use chafa_draw::{
    session_is_x11, ChafaBackend, Config, DrawState, PixelLayout, QualityOptions,
    TerminalGeometry,
};

fn main() {
    env_logger::init();
    let args = cli::Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: cli::Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(args.config.as_deref())?;

    let preset = args.quality.or(config.quality.preset).unwrap_or_default();
    let quality = QualityOptions::resolve(
        Some(preset),
        args.work_factor.or(config.quality.work_factor),
        if args.no_dither {
            Some(false)
        } else {
            config.quality.dithering
        },
    );

    let mut geometry = TerminalGeometry::probe().unwrap_or_default();
    // leave a row for the shell prompt
    geometry.rows = geometry.rows.saturating_sub(1).max(1);
    if let Some(columns) = args.columns {
        geometry.columns = columns;
    }
    if let Some(rows) = args.rows {
        geometry.rows = rows;
    }

    let x11 = args.x11 || config.session.x11.unwrap_or_else(session_is_x11);

    let backend = ChafaBackend::load()?;
    let mut state = DrawState::with_quality(backend, x11, quality);

    let (cell_width, cell_height) = geometry.cell_size().unwrap_or((8, 16));
    let width = geometry.columns as u32 * cell_width as u32;
    let height = geometry.rows as u32 * cell_height as u32;
    let stride = width * 4;

    log::info!(
        "rendering {} frame(s) at {}x{} cells ({}x{} px), preset {}",
        args.frames,
        geometry.columns,
        geometry.rows,
        width,
        height,
        preset.name()
    );

    let frame_time = Duration::from_millis(1000 / preset.frame_rate() as u64);
    let mut stdout = std::io::stdout();
    for frame in 0..args.frames {
        let session = state.ensure_session(geometry)?;
        let pixels = test_pattern(session.pixel_layout(), width, height, frame);
        let text = session.convert(&pixels, width, height, stride);
        if args.frames > 1 {
            // repaint in place
            write!(stdout, "\x1b[H")?;
        }
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        if frame + 1 < args.frames {
            std::thread::sleep(frame_time);
        }
    }
    writeln!(stdout)?;

    Ok(())
}

/// Build a scrolling gradient test pattern in the session's channel order.
fn test_pattern(layout: PixelLayout, width: u32, height: u32, frame: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let shifted = (x + frame * 8) % width;
            let r = (shifted * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            let b = 255 - r;
            match layout {
                PixelLayout::Rgba => pixels.extend_from_slice(&[r, g, b, 255]),
                PixelLayout::Bgra => pixels.extend_from_slice(&[b, g, r, 255]),
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_size_and_alpha() {
        let pixels = test_pattern(PixelLayout::Bgra, 16, 8, 0);
        assert_eq!(pixels.len(), 16 * 8 * 4);
        assert!(pixels.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_pattern_channel_order_follows_layout() {
        // right edge of row 0 is strongly red in both layouts
        let rgba = test_pattern(PixelLayout::Rgba, 16, 8, 0);
        let bgra = test_pattern(PixelLayout::Bgra, 16, 8, 0);
        let last = (15 * 4) as usize;
        assert_eq!(rgba[last], bgra[last + 2]); // red channel swaps ends
        assert_eq!(rgba[last + 2], bgra[last]); // blue channel swaps ends
        assert_eq!(rgba[last + 1], bgra[last + 1]); // green stays put
    }
}
