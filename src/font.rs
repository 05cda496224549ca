//! Font resolution and text rasterization.
//!
//! Fonts are looked up by file name or path across a fixed list of platform
//! font directories. Resolution never fails: anything that cannot be found
//! or parsed falls back to the built-in bitmap font.

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use image::{GrayImage, Luma};
use tracing::debug;

use crate::bitmap_font;
use crate::geometry::Size;

/// Families probed by [`SystemFonts::available_families`].
pub const COMMON_FAMILIES: [&str; 6] = [
    "arial.ttf",
    "simhei.ttf",
    "simsun.ttc",
    "msyh.ttc",
    "calibri.ttf",
    "times.ttf",
];

/// A resolved font, ready to rasterize text at any pixel size.
pub enum WatermarkFont {
    /// A parsed TrueType/OpenType outline font.
    Outline(FontVec),
    /// The built-in 5x7 bitmap font.
    Builtin,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatermarkFont::Outline(_) => f.write_str("WatermarkFont::Outline"),
            WatermarkFont::Builtin => f.write_str("WatermarkFont::Builtin"),
        }
    }
}

/// Rasterized text, cropped to its ink.
#[derive(Debug, Clone)]
pub struct TextMask {
    /// Coverage, 0 = empty, 255 = fully inked. The top-left pixel is the
    /// top-left of the inked box.
    pub mask: GrayImage,
}

impl TextMask {
    fn empty() -> Self {
        Self {
            mask: GrayImage::new(0, 0),
        }
    }

    /// Size of the inked box.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.mask.width(), self.mask.height())
    }
}

impl WatermarkFont {
    /// Parse font bytes (TTF, OTF, or the first face of a TTC).
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        FontVec::try_from_vec(data).ok().map(WatermarkFont::Outline)
    }

    /// Whether this is the built-in fallback.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, WatermarkFont::Builtin)
    }

    /// Rasterize `text` at `size` pixels. Lines are split on `\n`.
    #[must_use]
    pub fn rasterize(&self, text: &str, size: u32) -> TextMask {
        match self {
            WatermarkFont::Outline(font) => rasterize_outline(font, text, size),
            WatermarkFont::Builtin => rasterize_builtin(text, size),
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn rasterize_outline(font: &FontVec, text: &str, size: u32) -> TextMask {
    let scale = PxScale::from(size as f32);
    let scaled = font.as_scaled(scale);
    let line_height = scaled.height() + scaled.line_gap();

    let mut outlines: Vec<OutlinedGlyph> = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let baseline = scaled.ascent() + line_no as f32 * line_height;
        let mut caret = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                outlines.push(outlined);
            }
        }
    }

    let Some(first) = outlines.first().map(OutlinedGlyph::px_bounds) else {
        return TextMask::empty();
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) =
        (first.min.x, first.min.y, first.max.x, first.max.y);
    for b in outlines.iter().map(OutlinedGlyph::px_bounds) {
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    let (left, top) = (min_x.floor() as i32, min_y.floor() as i32);
    let width = (max_x.ceil() as i32 - left).max(0).unsigned_abs();
    let height = (max_y.ceil() as i32 - top).max(0).unsigned_abs();

    let mut mask = GrayImage::new(width, height);
    for outlined in &outlines {
        let bounds = outlined.px_bounds();
        let gx = bounds.min.x as i32 - left;
        let gy = bounds.min.y as i32 - top;
        outlined.draw(|x, y, coverage| {
            let (Ok(px), Ok(py)) = (
                u32::try_from(gx + x as i32),
                u32::try_from(gy + y as i32),
            ) else {
                return;
            };
            if px >= width || py >= height {
                return;
            }
            #[allow(clippy::cast_sign_loss)]
            let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
            let cell = mask.get_pixel_mut(px, py);
            cell[0] = cell[0].max(value);
        });
    }

    TextMask { mask }
}

fn rasterize_builtin(text: &str, size: u32) -> TextMask {
    let cell = (size / bitmap_font::GLYPH_HEIGHT).max(1);
    let lines: Vec<&str> = text.lines().collect();
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    if longest == 0 {
        return TextMask::empty();
    }
    let longest = u32::try_from(longest).unwrap_or(u32::MAX);
    let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);

    let width = (longest * bitmap_font::ADVANCE - 1) * cell;
    let height = ((line_count - 1) * bitmap_font::LINE_PITCH + bitmap_font::GLYPH_HEIGHT) * cell;

    let mask = GrayImage::from_fn(width, height, |x, y| {
        let (ux, uy) = (x / cell, y / cell);
        let line = (uy / bitmap_font::LINE_PITCH) as usize;
        let row = uy % bitmap_font::LINE_PITCH;
        let column = (ux / bitmap_font::ADVANCE) as usize;
        let col = ux % bitmap_font::ADVANCE;
        let inked = lines
            .get(line)
            .and_then(|l| l.chars().nth(column))
            .is_some_and(|ch| bitmap_font::is_set(ch, col, row));
        Luma([if inked { 255 } else { 0 }])
    });

    TextMask { mask }
}

/// Source of fonts for the text renderer.
pub trait FontProvider {
    /// Resolve a family name or path. Must not fail; return
    /// [`WatermarkFont::Builtin`] when nothing matches.
    fn resolve(&self, family: &str, bold: bool, italic: bool) -> WatermarkFont;
}

/// Always yields the built-in bitmap font.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFonts;

impl FontProvider for BuiltinFonts {
    fn resolve(&self, _family: &str, _bold: bool, _italic: bool) -> WatermarkFont {
        WatermarkFont::Builtin
    }
}

/// Looks fonts up on the local filesystem.
#[derive(Debug, Clone)]
pub struct SystemFonts {
    search_dirs: Vec<PathBuf>,
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::with_dirs(default_font_dirs())
    }
}

impl SystemFonts {
    /// Probe the platform font directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe only the given directories (plus names given as paths).
    #[must_use]
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Directories probed for bare font file names.
    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// The subset of [`COMMON_FAMILIES`] that resolves to an outline font,
    /// or `["default"]` if none do.
    #[must_use]
    pub fn available_families(&self) -> Vec<String> {
        let found: Vec<String> = COMMON_FAMILIES
            .iter()
            .filter(|name| self.load(name).is_some())
            .map(ToString::to_string)
            .collect();
        if found.is_empty() {
            vec!["default".to_string()]
        } else {
            found
        }
    }

    fn locate(&self, name: &str) -> Vec<PathBuf> {
        let direct = PathBuf::from(name);
        let mut paths = Vec::with_capacity(self.search_dirs.len() + 1);
        if direct.is_file() {
            paths.push(direct);
        }
        if Path::new(name).components().count() == 1 {
            paths.extend(
                self.search_dirs
                    .iter()
                    .map(|dir| dir.join(name))
                    .filter(|p| p.is_file()),
            );
        }
        paths
    }

    fn load(&self, name: &str) -> Option<WatermarkFont> {
        self.locate(name).into_iter().find_map(|path| {
            let font = std::fs::read(&path).ok().and_then(WatermarkFont::from_bytes);
            if font.is_none() {
                debug!(path = %path.display(), "font file unreadable, trying next candidate");
            }
            font
        })
    }
}

impl FontProvider for SystemFonts {
    fn resolve(&self, family: &str, bold: bool, italic: bool) -> WatermarkFont {
        if family.is_empty() || family.eq_ignore_ascii_case("default") {
            return WatermarkFont::Builtin;
        }
        for name in variant_names(family, bold, italic)
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(family))
        {
            if let Some(font) = self.load(name) {
                debug!(family, resolved = name, "font resolved");
                return font;
            }
        }
        debug!(family, "font not found, using built-in font");
        WatermarkFont::Builtin
    }
}

/// File names of the styled variants of `family`, most specific first.
///
/// Covers the Windows short-suffix convention (`arialbd.ttf`) and the
/// hyphenated convention (`DejaVuSans-Bold.ttf`).
#[must_use]
pub fn variant_names(family: &str, bold: bool, italic: bool) -> Vec<String> {
    let suffixes: &[&str] = match (bold, italic) {
        (false, false) => return Vec::new(),
        (true, false) => &["bd", "-Bold", "b"],
        (false, true) => &["i", "-Italic", "-Oblique"],
        (true, true) => &["bi", "z", "-BoldItalic", "-BoldOblique"],
    };
    let path = Path::new(family);
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };
    let ext = path.extension().and_then(|e| e.to_str());
    suffixes
        .iter()
        .map(|suffix| {
            let file = match ext {
                Some(ext) => format!("{stem}{suffix}.{ext}"),
                None => format!("{stem}{suffix}"),
            };
            match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(parent) => parent.join(file).to_string_lossy().into_owned(),
                None => file,
            }
        })
        .collect()
}

fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(windir) = std::env::var_os("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs.extend(
        [
            "/Library/Fonts",
            "/System/Library/Fonts",
            "/System/Library/Fonts/Supplemental",
            "/usr/share/fonts",
            "/usr/share/fonts/truetype",
            "/usr/share/fonts/TTF",
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/truetype/msttcorefonts",
            "/usr/local/share/fonts",
        ]
        .into_iter()
        .map(PathBuf::from),
    );
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs
}
