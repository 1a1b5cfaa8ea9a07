//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

use chafa_draw::QualityPreset;

/// Render a built-in test pattern to the terminal through chafa
#[derive(Parser, Debug)]
#[command(name = "chafa-draw")]
#[command(version, about = "Terminal graphics demo for the chafa-draw library", long_about = None)]
pub struct Args {
    /// Override detected terminal width in cells
    #[arg(long)]
    pub columns: Option<u16>,

    /// Override detected terminal height in cells
    #[arg(long)]
    pub rows: Option<u16>,

    /// Quality preset
    #[arg(long, short, value_parser = parse_preset)]
    pub quality: Option<QualityPreset>,

    /// Work factor override (0.0-1.0)
    #[arg(long, value_parser = parse_work_factor)]
    pub work_factor: Option<f32>,

    /// Disable dithering
    #[arg(long)]
    pub no_dither: bool,

    /// Treat the display session as X11 regardless of XDG_SESSION_TYPE
    #[arg(long)]
    pub x11: bool,

    /// Number of frames to render (more than one demonstrates session reuse)
    #[arg(long, default_value = "1")]
    pub frames: u32,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// Parse a quality preset name
fn parse_preset(s: &str) -> Result<QualityPreset, String> {
    QualityPreset::from_str(s).ok_or_else(|| {
        format!(
            "Unknown preset '{}'. Available presets: low, medium, high, ultra",
            s
        )
    })
}

/// Parse and validate a work factor (0.0-1.0)
fn parse_work_factor(s: &str) -> Result<f32, String> {
    let factor: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&factor) {
        return Err(format!(
            "Work factor must be between 0.0 and 1.0, got {}",
            factor
        ));
    }
    Ok(factor)
}
