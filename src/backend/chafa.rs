//! Runtime binding to libchafa.
//!
//! The library is loaded with `dlopen` at runtime rather than linked at
//! build time, so the crate builds and its tests run on machines without
//! chafa installed. All symbols are resolved once, when the backend is
//! loaded; a missing library or symbol surfaces as [`BackendError`].

use std::ffi::{c_char, c_int, c_void, CString};
use std::sync::Arc;

use libloading::Library;

use crate::capability::{CanvasMode, Capabilities, PixelLayout, PixelMode};

use super::{BackendError, Canvas, CanvasSpec, DitherSpec, OpenCanvas, TermBackend};

// Opaque chafa object handles
type RawTermDb = *mut c_void;
type RawTermInfo = *mut c_void;
type RawSymbolMap = *mut c_void;
type RawCanvasConfig = *mut c_void;
type RawCanvas = *mut c_void;

/// Layout of glib's GString, which `chafa_canvas_print` returns.
#[repr(C)]
struct GString {
    str_ptr: *mut c_char,
    len: usize,
    allocated_len: usize,
}

// ChafaCanvasMode
const CHAFA_CANVAS_MODE_TRUECOLOR: c_int = 0;
const CHAFA_CANVAS_MODE_INDEXED_256: c_int = 1;
const CHAFA_CANVAS_MODE_INDEXED_240: c_int = 2;
const CHAFA_CANVAS_MODE_INDEXED_16: c_int = 3;
const CHAFA_CANVAS_MODE_FGBG_BGFG: c_int = 4;
const CHAFA_CANVAS_MODE_FGBG: c_int = 5;
const CHAFA_CANVAS_MODE_INDEXED_8: c_int = 6;
const CHAFA_CANVAS_MODE_INDEXED_16_8: c_int = 7;

// ChafaPixelMode
const CHAFA_PIXEL_MODE_SYMBOLS: c_int = 0;
const CHAFA_PIXEL_MODE_SIXELS: c_int = 1;
const CHAFA_PIXEL_MODE_KITTY: c_int = 2;
const CHAFA_PIXEL_MODE_ITERM2: c_int = 3;

// ChafaPixelType
const CHAFA_PIXEL_RGBA8_UNASSOCIATED: c_int = 4;
const CHAFA_PIXEL_BGRA8_UNASSOCIATED: c_int = 5;

// ChafaDitherMode
const CHAFA_DITHER_MODE_NONE: c_int = 0;
const CHAFA_DITHER_MODE_DIFFUSION: c_int = 2;

// ChafaOptimizations
const CHAFA_OPTIMIZATIONS_NONE: c_int = 0;
const CHAFA_OPTIMIZATIONS_ALL: c_int = 0x7fff_ffff;

type TermDbGetDefault = unsafe extern "C" fn() -> RawTermDb;
type TermDbDetect = unsafe extern "C" fn(RawTermDb, *mut *mut c_char) -> RawTermInfo;
type TermInfoGetBestCanvasMode = unsafe extern "C" fn(RawTermInfo) -> c_int;
type TermInfoGetBestPixelMode = unsafe extern "C" fn(RawTermInfo) -> c_int;
type TermInfoUnref = unsafe extern "C" fn(RawTermInfo);
type SymbolMapNew = unsafe extern "C" fn() -> RawSymbolMap;
type SymbolMapAddByTags = unsafe extern "C" fn(RawSymbolMap, u32);
type SymbolMapUnref = unsafe extern "C" fn(RawSymbolMap);
type CanvasConfigNew = unsafe extern "C" fn() -> RawCanvasConfig;
type CanvasConfigUnref = unsafe extern "C" fn(RawCanvasConfig);
type CanvasConfigSetCanvasMode = unsafe extern "C" fn(RawCanvasConfig, c_int);
type CanvasConfigSetPixelMode = unsafe extern "C" fn(RawCanvasConfig, c_int);
type CanvasConfigSetGeometry = unsafe extern "C" fn(RawCanvasConfig, c_int, c_int);
type CanvasConfigSetCellGeometry = unsafe extern "C" fn(RawCanvasConfig, c_int, c_int);
type CanvasConfigSetSymbolMap = unsafe extern "C" fn(RawCanvasConfig, RawSymbolMap);
type CanvasConfigSetOptimizations = unsafe extern "C" fn(RawCanvasConfig, c_int);
type CanvasConfigSetWorkFactor = unsafe extern "C" fn(RawCanvasConfig, f32);
type CanvasConfigSetPreprocessingEnabled = unsafe extern "C" fn(RawCanvasConfig, c_int);
type CanvasConfigSetDitherMode = unsafe extern "C" fn(RawCanvasConfig, c_int);
type CanvasConfigSetDitherGrainSize = unsafe extern "C" fn(RawCanvasConfig, c_int, c_int);
type CanvasConfigSetDitherIntensity = unsafe extern "C" fn(RawCanvasConfig, f32);
type CanvasNew = unsafe extern "C" fn(RawCanvasConfig) -> RawCanvas;
type CanvasUnref = unsafe extern "C" fn(RawCanvas);
type CanvasDrawAllPixels = unsafe extern "C" fn(RawCanvas, c_int, *const u8, c_int, c_int, c_int);
type CanvasPrint = unsafe extern "C" fn(RawCanvas, RawTermInfo) -> *mut GString;
type GStringFree = unsafe extern "C" fn(*mut GString, c_int) -> *mut c_char;

/// The loaded library and its resolved entry points.
struct ChafaLibrary {
    _lib: Library,
    /// Kept loaded when `g_string_free` had to come from glib directly
    _glib: Option<Library>,
    term_db_get_default: TermDbGetDefault,
    term_db_detect: TermDbDetect,
    term_info_get_best_canvas_mode: TermInfoGetBestCanvasMode,
    term_info_get_best_pixel_mode: TermInfoGetBestPixelMode,
    term_info_unref: TermInfoUnref,
    symbol_map_new: SymbolMapNew,
    symbol_map_add_by_tags: SymbolMapAddByTags,
    symbol_map_unref: SymbolMapUnref,
    canvas_config_new: CanvasConfigNew,
    canvas_config_unref: CanvasConfigUnref,
    canvas_config_set_canvas_mode: CanvasConfigSetCanvasMode,
    canvas_config_set_pixel_mode: CanvasConfigSetPixelMode,
    canvas_config_set_geometry: CanvasConfigSetGeometry,
    canvas_config_set_cell_geometry: CanvasConfigSetCellGeometry,
    canvas_config_set_symbol_map: CanvasConfigSetSymbolMap,
    canvas_config_set_optimizations: CanvasConfigSetOptimizations,
    canvas_config_set_work_factor: CanvasConfigSetWorkFactor,
    canvas_config_set_preprocessing_enabled: CanvasConfigSetPreprocessingEnabled,
    canvas_config_set_dither_mode: CanvasConfigSetDitherMode,
    canvas_config_set_dither_grain_size: CanvasConfigSetDitherGrainSize,
    canvas_config_set_dither_intensity: CanvasConfigSetDitherIntensity,
    canvas_new: CanvasNew,
    canvas_unref: CanvasUnref,
    canvas_draw_all_pixels: CanvasDrawAllPixels,
    canvas_print: CanvasPrint,
    g_string_free: GStringFree,
}

/// Resolve one symbol, copying the function pointer out of the library.
unsafe fn sym<T: Copy>(lib: &Library, name: &'static str) -> Result<T, BackendError> {
    match lib.get::<T>(name.as_bytes()) {
        Ok(symbol) => Ok(*symbol),
        Err(source) => Err(BackendError::MissingSymbol { name, source }),
    }
}

impl ChafaLibrary {
    fn load() -> Result<Self, BackendError> {
        unsafe {
            // Try different library names for different platforms
            let lib = Library::new("libchafa.so.0")
                .or_else(|_| Library::new("libchafa.so"))
                .or_else(|_| Library::new("libchafa.dylib"))
                .or_else(|_| Library::new("chafa.dll"))
                .map_err(BackendError::LibraryNotFound)?;

            // chafa links glib, so g_string_free normally resolves through
            // the chafa handle; fall back to glib itself when it doesn't
            let mut glib = None;
            let g_string_free = match sym::<GStringFree>(&lib, "g_string_free") {
                Ok(f) => f,
                Err(primary) => match Library::new("libglib-2.0.so.0") {
                    Ok(glib_lib) => {
                        let f = sym::<GStringFree>(&glib_lib, "g_string_free")?;
                        glib = Some(glib_lib);
                        f
                    }
                    Err(_) => return Err(primary),
                },
            };

            Ok(Self {
                term_db_get_default: sym(&lib, "chafa_term_db_get_default")?,
                term_db_detect: sym(&lib, "chafa_term_db_detect")?,
                term_info_get_best_canvas_mode: sym(&lib, "chafa_term_info_get_best_canvas_mode")?,
                term_info_get_best_pixel_mode: sym(&lib, "chafa_term_info_get_best_pixel_mode")?,
                term_info_unref: sym(&lib, "chafa_term_info_unref")?,
                symbol_map_new: sym(&lib, "chafa_symbol_map_new")?,
                symbol_map_add_by_tags: sym(&lib, "chafa_symbol_map_add_by_tags")?,
                symbol_map_unref: sym(&lib, "chafa_symbol_map_unref")?,
                canvas_config_new: sym(&lib, "chafa_canvas_config_new")?,
                canvas_config_unref: sym(&lib, "chafa_canvas_config_unref")?,
                canvas_config_set_canvas_mode: sym(&lib, "chafa_canvas_config_set_canvas_mode")?,
                canvas_config_set_pixel_mode: sym(&lib, "chafa_canvas_config_set_pixel_mode")?,
                canvas_config_set_geometry: sym(&lib, "chafa_canvas_config_set_geometry")?,
                canvas_config_set_cell_geometry: sym(&lib, "chafa_canvas_config_set_cell_geometry")?,
                canvas_config_set_symbol_map: sym(&lib, "chafa_canvas_config_set_symbol_map")?,
                canvas_config_set_optimizations: sym(&lib, "chafa_canvas_config_set_optimizations")?,
                canvas_config_set_work_factor: sym(&lib, "chafa_canvas_config_set_work_factor")?,
                canvas_config_set_preprocessing_enabled: sym(
                    &lib,
                    "chafa_canvas_config_set_preprocessing_enabled",
                )?,
                canvas_config_set_dither_mode: sym(&lib, "chafa_canvas_config_set_dither_mode")?,
                canvas_config_set_dither_grain_size: sym(
                    &lib,
                    "chafa_canvas_config_set_dither_grain_size",
                )?,
                canvas_config_set_dither_intensity: sym(
                    &lib,
                    "chafa_canvas_config_set_dither_intensity",
                )?,
                canvas_new: sym(&lib, "chafa_canvas_new")?,
                canvas_unref: sym(&lib, "chafa_canvas_unref")?,
                canvas_draw_all_pixels: sym(&lib, "chafa_canvas_draw_all_pixels")?,
                canvas_print: sym(&lib, "chafa_canvas_print")?,
                g_string_free,
                _lib: lib,
                _glib: glib,
            })
        }
    }
}

fn canvas_mode_from_raw(raw: c_int) -> CanvasMode {
    match raw {
        CHAFA_CANVAS_MODE_TRUECOLOR => CanvasMode::TrueColor,
        CHAFA_CANVAS_MODE_INDEXED_256 => CanvasMode::Indexed256,
        CHAFA_CANVAS_MODE_INDEXED_240 => CanvasMode::Indexed240,
        CHAFA_CANVAS_MODE_INDEXED_16 => CanvasMode::Indexed16,
        CHAFA_CANVAS_MODE_FGBG_BGFG => CanvasMode::FgBgBgFg,
        CHAFA_CANVAS_MODE_FGBG => CanvasMode::FgBg,
        CHAFA_CANVAS_MODE_INDEXED_8 => CanvasMode::Indexed8,
        CHAFA_CANVAS_MODE_INDEXED_16_8 => CanvasMode::Indexed16Fg8Bg,
        _ => CanvasMode::TrueColor,
    }
}

fn canvas_mode_to_raw(mode: CanvasMode) -> c_int {
    match mode {
        CanvasMode::TrueColor => CHAFA_CANVAS_MODE_TRUECOLOR,
        CanvasMode::Indexed256 => CHAFA_CANVAS_MODE_INDEXED_256,
        CanvasMode::Indexed240 => CHAFA_CANVAS_MODE_INDEXED_240,
        CanvasMode::Indexed16 => CHAFA_CANVAS_MODE_INDEXED_16,
        CanvasMode::FgBgBgFg => CHAFA_CANVAS_MODE_FGBG_BGFG,
        CanvasMode::FgBg => CHAFA_CANVAS_MODE_FGBG,
        CanvasMode::Indexed8 => CHAFA_CANVAS_MODE_INDEXED_8,
        CanvasMode::Indexed16Fg8Bg => CHAFA_CANVAS_MODE_INDEXED_16_8,
    }
}

fn pixel_mode_from_raw(raw: c_int) -> PixelMode {
    match raw {
        CHAFA_PIXEL_MODE_SIXELS => PixelMode::Sixels,
        CHAFA_PIXEL_MODE_KITTY => PixelMode::Kitty,
        CHAFA_PIXEL_MODE_ITERM2 => PixelMode::Iterm2,
        _ => PixelMode::Symbols,
    }
}

fn pixel_mode_to_raw(mode: PixelMode) -> c_int {
    match mode {
        PixelMode::Symbols => CHAFA_PIXEL_MODE_SYMBOLS,
        PixelMode::Sixels => CHAFA_PIXEL_MODE_SIXELS,
        PixelMode::Kitty => CHAFA_PIXEL_MODE_KITTY,
        PixelMode::Iterm2 => CHAFA_PIXEL_MODE_ITERM2,
    }
}

fn pixel_type_for_layout(layout: PixelLayout) -> c_int {
    match layout {
        PixelLayout::Rgba => CHAFA_PIXEL_RGBA8_UNASSOCIATED,
        PixelLayout::Bgra => CHAFA_PIXEL_BGRA8_UNASSOCIATED,
    }
}

/// Build a NULL-terminated `KEY=VALUE` pointer block for `chafa_term_db_detect`.
///
/// The returned CStrings own the storage the pointers refer to and must stay
/// alive for as long as the pointer block is in use.
fn environ_block() -> (Vec<CString>, Vec<*mut c_char>) {
    let mut strings = Vec::new();
    for (key, value) in std::env::vars() {
        if let Ok(entry) = CString::new(format!("{}={}", key, value)) {
            strings.push(entry);
        }
    }
    let mut pointers: Vec<*mut c_char> = strings
        .iter()
        .map(|entry| entry.as_ptr() as *mut c_char)
        .collect();
    pointers.push(std::ptr::null_mut());
    (strings, pointers)
}

/// Backend that renders through the system's chafa library.
pub struct ChafaBackend {
    lib: Arc<ChafaLibrary>,
}

impl ChafaBackend {
    /// Load libchafa and resolve every entry point the backend needs.
    pub fn load() -> Result<Self, BackendError> {
        Ok(Self {
            lib: Arc::new(ChafaLibrary::load()?),
        })
    }
}

impl TermBackend for ChafaBackend {
    fn open_canvas(&self, spec: &CanvasSpec) -> Result<OpenCanvas, BackendError> {
        let lib = &self.lib;
        unsafe {
            // env_strings owns the storage env_ptrs points into
            let (env_strings, mut env_ptrs) = environ_block();
            let term_db = (lib.term_db_get_default)();
            let term_info = (lib.term_db_detect)(term_db, env_ptrs.as_mut_ptr());
            drop(env_strings);
            if term_info.is_null() {
                return Err(BackendError::DetectionFailed);
            }

            let capabilities = Capabilities {
                canvas_mode: canvas_mode_from_raw((lib.term_info_get_best_canvas_mode)(term_info)),
                pixel_mode: pixel_mode_from_raw((lib.term_info_get_best_pixel_mode)(term_info)),
            };
            log::debug!(
                "terminal capabilities: canvas mode {:?}, pixel mode {:?}",
                capabilities.canvas_mode,
                capabilities.pixel_mode
            );

            let symbol_map = (lib.symbol_map_new)();
            for tag in spec.symbols {
                (lib.symbol_map_add_by_tags)(symbol_map, tag.bits());
            }

            let config = (lib.canvas_config_new)();
            (lib.canvas_config_set_canvas_mode)(config, canvas_mode_to_raw(capabilities.canvas_mode));
            (lib.canvas_config_set_pixel_mode)(config, pixel_mode_to_raw(capabilities.pixel_mode));
            (lib.canvas_config_set_geometry)(
                config,
                spec.width_cells as c_int,
                spec.height_cells as c_int,
            );
            (lib.canvas_config_set_symbol_map)(config, symbol_map);
            (lib.canvas_config_set_optimizations)(
                config,
                if spec.optimizations {
                    CHAFA_OPTIMIZATIONS_ALL
                } else {
                    CHAFA_OPTIMIZATIONS_NONE
                },
            );
            (lib.canvas_config_set_work_factor)(config, spec.work_factor);
            (lib.canvas_config_set_preprocessing_enabled)(config, spec.preprocessing as c_int);

            match spec.dither {
                DitherSpec::None => {
                    (lib.canvas_config_set_dither_mode)(config, CHAFA_DITHER_MODE_NONE);
                }
                DitherSpec::Diffusion { grain, intensity } => {
                    (lib.canvas_config_set_dither_mode)(config, CHAFA_DITHER_MODE_DIFFUSION);
                    (lib.canvas_config_set_dither_grain_size)(
                        config,
                        grain.0 as c_int,
                        grain.1 as c_int,
                    );
                    (lib.canvas_config_set_dither_intensity)(config, intensity);
                }
            }

            if let Some((cell_width, cell_height)) = spec.cell_size {
                // Known pixel dimensions of each cell enable pixel-accurate
                // protocols like Kitty and sixels
                (lib.canvas_config_set_cell_geometry)(
                    config,
                    cell_width as c_int,
                    cell_height as c_int,
                );
            }

            let canvas = (lib.canvas_new)(config);
            if canvas.is_null() {
                (lib.canvas_config_unref)(config);
                (lib.symbol_map_unref)(symbol_map);
                (lib.term_info_unref)(term_info);
                return Err(BackendError::CanvasCreation);
            }

            Ok(OpenCanvas {
                capabilities,
                canvas: Box::new(ChafaCanvas {
                    lib: Arc::clone(lib),
                    term_info,
                    symbol_map,
                    config,
                    canvas,
                }),
            })
        }
    }
}

/// One configured chafa canvas and the objects it was built from.
///
/// All four handles are exclusively owned by this canvas and released
/// exactly once on drop.
struct ChafaCanvas {
    lib: Arc<ChafaLibrary>,
    term_info: RawTermInfo,
    symbol_map: RawSymbolMap,
    config: RawCanvasConfig,
    canvas: RawCanvas,
}

impl Canvas for ChafaCanvas {
    fn draw(&mut self, layout: PixelLayout, pixels: &[u8], width: u32, height: u32, stride: u32) {
        debug_assert!(pixels.len() >= stride as usize * height as usize);
        unsafe {
            (self.lib.canvas_draw_all_pixels)(
                self.canvas,
                pixel_type_for_layout(layout),
                pixels.as_ptr(),
                width as c_int,
                height as c_int,
                stride as c_int,
            );
        }
    }

    fn to_text(&mut self) -> String {
        unsafe {
            let printable = (self.lib.canvas_print)(self.canvas, self.term_info);
            if printable.is_null() {
                return String::new();
            }
            let bytes =
                std::slice::from_raw_parts((*printable).str_ptr as *const u8, (*printable).len);
            let text = String::from_utf8_lossy(bytes).into_owned();
            (self.lib.g_string_free)(printable, 1);
            text
        }
    }
}

impl Drop for ChafaCanvas {
    fn drop(&mut self) {
        unsafe {
            (self.lib.canvas_unref)(self.canvas);
            (self.lib.canvas_config_unref)(self.config);
            (self.lib.symbol_map_unref)(self.symbol_map);
            (self.lib.term_info_unref)(self.term_info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_mode_mapping_round_trips() {
        for mode in [
            CanvasMode::TrueColor,
            CanvasMode::Indexed256,
            CanvasMode::Indexed240,
            CanvasMode::Indexed16,
            CanvasMode::FgBgBgFg,
            CanvasMode::FgBg,
            CanvasMode::Indexed8,
            CanvasMode::Indexed16Fg8Bg,
        ] {
            assert_eq!(canvas_mode_from_raw(canvas_mode_to_raw(mode)), mode);
        }
    }

    #[test]
    fn test_pixel_mode_mapping_round_trips() {
        for mode in [
            PixelMode::Symbols,
            PixelMode::Sixels,
            PixelMode::Kitty,
            PixelMode::Iterm2,
        ] {
            assert_eq!(pixel_mode_from_raw(pixel_mode_to_raw(mode)), mode);
        }
    }

    #[test]
    fn test_unknown_raw_values_fall_back() {
        assert_eq!(canvas_mode_from_raw(99), CanvasMode::TrueColor);
        assert_eq!(pixel_mode_from_raw(99), PixelMode::Symbols);
    }

    #[test]
    fn test_pixel_types_are_unassociated_variants() {
        assert_eq!(pixel_type_for_layout(PixelLayout::Rgba), 4);
        assert_eq!(pixel_type_for_layout(PixelLayout::Bgra), 5);
    }

    #[test]
    fn test_environ_block_is_null_terminated() {
        let (strings, pointers) = environ_block();
        assert_eq!(pointers.len(), strings.len() + 1);
        assert!(pointers.last().unwrap().is_null());
    }
}
