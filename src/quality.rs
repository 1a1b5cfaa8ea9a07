//! Rendering quality options and presets.
//!
//! Quality is fixed when a render session is opened; changing it requires
//! rebuilding the session. Presets trade conversion quality for frame rate.

use serde::Deserialize;

/// Quality knobs forwarded to the rendering library.
///
/// `work_factor` is a speed/quality trade-off in `[0.0, 1.0]`. Dithering,
/// when enabled, always means error-diffusion with a 4x4 grain at full
/// intensity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualityOptions {
    pub optimizations: bool,
    pub preprocessing: bool,
    pub dithering: bool,
    pub work_factor: f32,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            optimizations: true,
            preprocessing: true,
            dithering: true,
            work_factor: 1.0,
        }
    }
}

impl QualityOptions {
    /// Resolve effective options from an optional preset plus overrides.
    ///
    /// Starts from `preset` (default: [`QualityPreset::High`]), then applies
    /// the explicit overrides. A `work_factor` outside `[0.0, 1.0]` is
    /// ignored.
    pub fn resolve(
        preset: Option<QualityPreset>,
        work_factor: Option<f32>,
        dithering: Option<bool>,
    ) -> Self {
        let mut options = preset.unwrap_or(QualityPreset::High).options();

        if let Some(factor) = work_factor {
            if (0.0..=1.0).contains(&factor) {
                options.work_factor = factor;
            }
        }
        if let Some(dither) = dithering {
            options.dithering = dither;
        }

        options
    }
}

/// Named quality presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// Fastest conversion, no dithering
    Low,
    /// Dithered output, no preprocessing
    Medium,
    /// Full quality
    #[default]
    High,
    /// Full quality at a lower target frame rate
    Ultra,
}

impl QualityPreset {
    /// The quality options this preset stands for.
    pub fn options(self) -> QualityOptions {
        match self {
            QualityPreset::Low => QualityOptions {
                optimizations: false,
                preprocessing: false,
                dithering: false,
                work_factor: 0.2,
            },
            QualityPreset::Medium => QualityOptions {
                optimizations: true,
                preprocessing: false,
                dithering: true,
                work_factor: 0.5,
            },
            QualityPreset::High | QualityPreset::Ultra => QualityOptions::default(),
        }
    }

    /// Target frame rate when driving an animation loop with this preset.
    pub fn frame_rate(self) -> u32 {
        match self {
            QualityPreset::Low => 60,
            QualityPreset::Medium => 45,
            QualityPreset::High => 30,
            QualityPreset::Ultra => 24,
        }
    }

    /// Parse a preset name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            "ultra" => Some(QualityPreset::Ultra),
            _ => None,
        }
    }

    /// Get a human-readable name for the preset.
    pub fn name(self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
            QualityPreset::Ultra => "ultra",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = QualityOptions::default();
        assert!(options.optimizations);
        assert!(options.preprocessing);
        assert!(options.dithering);
        assert_eq!(options.work_factor, 1.0);
    }

    #[test]
    fn test_preset_table() {
        let low = QualityPreset::Low.options();
        assert!(!low.optimizations);
        assert!(!low.preprocessing);
        assert!(!low.dithering);
        assert_eq!(low.work_factor, 0.2);

        let medium = QualityPreset::Medium.options();
        assert!(medium.optimizations);
        assert!(!medium.preprocessing);
        assert!(medium.dithering);
        assert_eq!(medium.work_factor, 0.5);

        assert_eq!(QualityPreset::High.options(), QualityOptions::default());
        assert_eq!(QualityPreset::Ultra.options(), QualityOptions::default());
    }

    #[test]
    fn test_preset_frame_rates() {
        assert_eq!(QualityPreset::Low.frame_rate(), 60);
        assert_eq!(QualityPreset::Medium.frame_rate(), 45);
        assert_eq!(QualityPreset::High.frame_rate(), 30);
        assert_eq!(QualityPreset::Ultra.frame_rate(), 24);
    }

    #[test]
    fn test_resolve_defaults_to_high() {
        assert_eq!(
            QualityOptions::resolve(None, None, None),
            QualityPreset::High.options()
        );
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let options = QualityOptions::resolve(Some(QualityPreset::Low), Some(0.7), Some(true));
        assert_eq!(options.work_factor, 0.7);
        assert!(options.dithering);
        // preset flags untouched by the overrides
        assert!(!options.optimizations);
        assert!(!options.preprocessing);
    }

    #[test]
    fn test_resolve_ignores_out_of_range_work_factor() {
        let options = QualityOptions::resolve(None, Some(1.5), None);
        assert_eq!(options.work_factor, 1.0);
        let options = QualityOptions::resolve(None, Some(-0.1), None);
        assert_eq!(options.work_factor, 1.0);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!(QualityPreset::from_str("low"), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::from_str("ULTRA"), Some(QualityPreset::Ultra));
        assert_eq!(QualityPreset::from_str("best"), None);
    }

    #[test]
    fn test_options_deserialize() {
        let options: QualityOptions =
            toml::from_str("dithering = false\nwork_factor = 0.5").unwrap();
        assert!(!options.dithering);
        assert_eq!(options.work_factor, 0.5);
        // unspecified fields fall back to the defaults
        assert!(options.optimizations);
        assert!(options.preprocessing);
    }
}
