//! Batch watermarking engine and image file I/O.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, Rgb};
use tracing::{debug, info, warn};

use crate::blending;
use crate::error::{Error, Result};
use crate::font::{FontProvider, SystemFonts};
use crate::geometry::{Anchor, Size};
use crate::overlay::{self, ImageWatermark};
use crate::params::{TextWatermarkParams, WatermarkKind};
use crate::text::TextRenderer;

/// File extensions accepted as input, lowercase.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Suffix appended to the file stem of exported images.
pub const DEFAULT_SUFFIX: &str = "_watermarked";

/// JPEG quality used when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Options controlling how watermarked images are written.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// JPEG quality, clamped to `1..=100`. Ignored for lossless formats.
    pub quality: u8,
    /// Appended to each input file stem to name its output.
    pub suffix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the input file.
    pub path: PathBuf,
    /// Where the output was (or would have been) written.
    pub output: PathBuf,
    /// Whether the file was watermarked and saved.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

/// Outcome of a batch export, one entry per input in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-file results.
    pub results: Vec<ProcessResult>,
}

impl BatchReport {
    /// Number of files written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// `true` when every file was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }
}

/// Holds the live watermark settings and applies them to images.
///
/// Create once and reuse for multiple images. The engine never mutates the
/// images it is given.
#[derive(Debug, Clone)]
pub struct WatermarkEngine<P = SystemFonts> {
    /// Text watermark settings.
    pub text: TextWatermarkParams,
    /// Image watermark settings and bitmap.
    pub image: ImageWatermark,
    /// Which watermark [`apply`](Self::apply) renders.
    pub kind: WatermarkKind,
    /// When set, the watermark is placed at this anchor of each image
    /// instead of at the stored position.
    pub anchor: Option<Anchor>,
    renderer: TextRenderer<P>,
}

impl Default for WatermarkEngine<SystemFonts> {
    fn default() -> Self {
        Self::new()
    }
}

impl WatermarkEngine<SystemFonts> {
    /// Engine with default settings, resolving fonts from the system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fonts(SystemFonts::new())
    }
}

impl<P: FontProvider> WatermarkEngine<P> {
    /// Engine with default settings and a custom font provider.
    pub fn with_fonts(fonts: P) -> Self {
        Self {
            text: TextWatermarkParams::default(),
            image: ImageWatermark::default(),
            kind: WatermarkKind::default(),
            anchor: None,
            renderer: TextRenderer::with_fonts(fonts),
        }
    }

    /// The text renderer, for measuring text.
    pub fn renderer(&self) -> &TextRenderer<P> {
        &self.renderer
    }

    /// Render the active watermark onto `source`.
    ///
    /// With an anchor set, the position is resolved against this image's
    /// size first; the stored position is left untouched.
    pub fn apply(&self, source: &DynamicImage) -> DynamicImage {
        let canvas = Size::new(source.width(), source.height());
        match self.kind {
            WatermarkKind::Text => match self.anchor {
                Some(anchor) => {
                    let mut params = self.text.clone();
                    let text_box = self.renderer.measure(&params);
                    params.set_anchor(anchor, canvas, text_box);
                    self.renderer.render(source, &params)
                }
                None => self.renderer.render(source, &self.text),
            },
            WatermarkKind::Image => match (self.anchor, self.image.rendered_size()) {
                (Some(anchor), Some(size)) => {
                    let mut params = self.image.params.clone();
                    params.set_anchor(anchor, canvas, size);
                    overlay::render_image_watermark(source, self.image.bitmap(), &params)
                }
                _ => self.image.render(source),
            },
        }
    }

    /// Load, watermark and save one file.
    ///
    /// Never fails: problems are reported in the returned [`ProcessResult`].
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path, opts: &ExportOptions) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            output: output.to_path_buf(),
            success: false,
            message: String::new(),
        };

        if same_file(input, output) {
            result.message = "Refusing to overwrite the source image".to_string();
            return result;
        }

        let source = match load_image(input) {
            Ok(img) => img,
            Err(e) => {
                result.message = e.to_string();
                return result;
            }
        };
        debug!(input = %input.display(), width = source.width(), height = source.height(), "image loaded");

        let marked = self.apply(&source);

        match save_image(&marked, output, opts.quality) {
            Ok(()) => {
                result.success = true;
                result.message = "Watermark applied".to_string();
            }
            Err(e) => result.message = e.to_string(),
        }
        result
    }

    /// Watermark every input into `output_dir`, one file at a time.
    ///
    /// A failure on one file is recorded and the batch continues. Outputs
    /// are named `{stem}{suffix}.{ext}`.
    #[must_use]
    pub fn export_batch(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        opts: &ExportOptions,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            warn!(dir = %output_dir.display(), error = %e, "cannot create output folder");
            report.results = inputs
                .iter()
                .map(|input| ProcessResult {
                    path: input.clone(),
                    output: output_path_for(input, output_dir, &opts.suffix),
                    success: false,
                    message: format!("Failed to create output folder: {e}"),
                })
                .collect();
            return report;
        }

        for input in inputs {
            let output = output_path_for(input, output_dir, &opts.suffix);
            let result = self.process_file(input, &output, opts);
            if !result.success {
                warn!(input = %input.display(), reason = %result.message, "export failed");
            }
            report.results.push(result);
        }

        info!(
            kind = %self.kind,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch export finished"
        );
        report
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Keep only the paths with a supported image extension, in order.
#[must_use]
pub fn supported_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|p| is_supported_image(p))
        .cloned()
        .collect()
}

/// List the supported images directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`Error::ReadDir`] if the folder cannot be read.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(dir).map_err(|source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut images: Vec<PathBuf> = read_dir
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_supported_image(p))
        .collect();
    images.sort();
    Ok(images)
}

/// Output path for `input` inside `output_dir`.
///
/// Example: `"photo.jpg"` with suffix `"_watermarked"` becomes
/// `"{output_dir}/photo_watermarked.jpg"`.
#[must_use]
pub fn output_path_for(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    output_dir.join(name)
}

/// Decode an image file.
///
/// # Errors
///
/// Returns [`Error::Load`] if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode an image, choosing the format from the file extension.
///
/// JPEG has no alpha channel, so the image is flattened onto white and
/// encoded at `quality` (clamped to `1..=100`). PNG, BMP and TIFF are
/// written losslessly.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for any other extension and
/// [`Error::Save`] if encoding or writing fails.
pub fn save_image(img: &DynamicImage, path: &Path, quality: u8) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;
    let save_err = |source: ImageError| Error::Save {
        path: path.to_path_buf(),
        source,
    };

    match format {
        ImageFormat::Jpeg => {
            let flat = blending::flatten(&img.to_rgba8(), Rgb([255, 255, 255]));
            let file = File::create(path).map_err(|e| save_err(ImageError::IoError(e)))?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality.clamp(1, 100));
            flat.write_with_encoder(encoder).map_err(save_err)?;
        }
        ImageFormat::Png | ImageFormat::Bmp | ImageFormat::Tiff => {
            img.save_with_format(path, format).map_err(save_err)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BuiltinFonts;
    use crate::params::Color;
    use image::{RgbImage, Rgba, RgbaImage};

    fn engine() -> WatermarkEngine<BuiltinFonts> {
        let mut engine = WatermarkEngine::with_fonts(BuiltinFonts);
        engine.text.set_text("HI");
        engine.text.set_font("default", 14);
        engine.text.set_color(Color::WHITE);
        engine.text.set_opacity(255);
        engine
    }

    fn black(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([0, 0, 0])))
    }

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.JPEG")));
        assert!(is_supported_image(Path::new("a.Png")));
        assert!(is_supported_image(Path::new("a.bmp")));
        assert!(is_supported_image(Path::new("a.tif")));
        assert!(is_supported_image(Path::new("a.TIFF")));
        assert!(!is_supported_image(Path::new("a.gif")));
        assert!(!is_supported_image(Path::new("a.webp")));
        assert!(!is_supported_image(Path::new("jpg")));
    }

    #[test]
    fn supported_files_keeps_order() {
        let paths: Vec<PathBuf> = ["b.png", "notes.txt", "a.jpg"].map(PathBuf::from).into();
        assert_eq!(
            supported_files(&paths),
            vec![PathBuf::from("b.png"), PathBuf::from("a.jpg")]
        );
    }

    #[test]
    fn output_path_appends_suffix() {
        let out = output_path_for(Path::new("/in/photo.jpg"), Path::new("/out"), DEFAULT_SUFFIX);
        assert_eq!(out, PathBuf::from("/out/photo_watermarked.jpg"));

        let out = output_path_for(Path::new("shot.PNG"), Path::new("o"), "");
        assert_eq!(out, PathBuf::from("o/shot.PNG"));

        let out = output_path_for(Path::new("raw"), Path::new("o"), "_x");
        assert_eq!(out, PathBuf::from("o/raw_x"));
    }

    #[test]
    fn list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.png", "a.jpg", "b.txt", "B.TIF"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let names: Vec<String> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["B.TIF", "a.jpg", "c.png"]);
    }

    #[test]
    fn list_images_reports_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_images(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::ReadDir { .. }));
    }

    #[test]
    fn jpeg_output_is_flattened_onto_white() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clear.jpg");
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        save_image(&img, &path, DEFAULT_JPEG_QUALITY).unwrap();

        let back = image::open(&path).unwrap();
        assert!(!back.color().has_alpha());
        let px = back.to_rgb8().get_pixel(4, 4).0;
        assert!(px.iter().all(|&c| c > 245), "expected white, got {px:?}");
    }

    #[test]
    fn lossless_formats_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 200])));
        for name in ["a.png", "a.tiff"] {
            let path = dir.path().join(name);
            save_image(&img, &path, DEFAULT_JPEG_QUALITY).unwrap();
            assert_eq!(image::open(&path).unwrap().to_rgba8(), img.to_rgba8(), "{name}");
        }
    }

    #[test]
    fn unsupported_output_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_image(&black(2, 2), &dir.path().join("a.gif"), 95).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        let err = save_image(&black(2, 2), &dir.path().join("a.nope"), 95).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn anchor_is_resolved_per_image() {
        let mut engine = engine();
        engine.text.set_position(0, 0);
        engine.anchor = Some(Anchor::BottomRight);

        // "HI" is 22x14; bottom-right with a 10px margin
        let out = engine.apply(&black(200, 100)).to_rgba8();
        assert_eq!(*out.get_pixel(168, 76), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));

        let out = engine.apply(&black(100, 50)).to_rgba8();
        assert_eq!(*out.get_pixel(68, 26), Rgba([255, 255, 255, 255]));

        assert_eq!(engine.text.position(), (0, 0));
    }

    #[test]
    fn image_kind_anchors_rendered_size() {
        let mut engine = engine();
        engine.kind = WatermarkKind::Image;
        engine.image.params.set_opacity(255);
        engine
            .image
            .set_bitmap(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]))));
        engine.anchor = Some(Anchor::Center);

        let out = engine.apply(&black(100, 60)).to_rgba8();
        assert_eq!(*out.get_pixel(45, 25), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(44, 25), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn image_kind_without_bitmap_is_a_no_op() {
        let mut engine = engine();
        engine.kind = WatermarkKind::Image;
        engine.anchor = Some(Anchor::TopLeft);
        let src = black(20, 20);
        assert_eq!(engine.apply(&src), src);
    }

    #[test]
    fn process_file_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not an image").unwrap();

        let result = engine().process_file(&input, &dir.path().join("out.png"), &ExportOptions::default());
        assert!(!result.success);
        assert!(result.message.contains("broken.png"), "{}", result.message);
        assert!(!dir.path().join("out.png").exists());
    }

    #[test]
    fn process_file_will_not_overwrite_its_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        black(4, 4).save(&input).unwrap();
        let before = std::fs::read(&input).unwrap();

        let result = engine().process_file(&input, &input, &ExportOptions::default());
        assert!(!result.success);
        assert_eq!(std::fs::read(&input).unwrap(), before);
    }

    #[test]
    fn export_batch_creates_output_folder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.png");
        black(40, 20).save(&input).unwrap();
        let out_dir = dir.path().join("nested").join("out");

        let report = engine().export_batch(&[input], &out_dir, &ExportOptions::default());
        assert_eq!(report.succeeded(), 1);
        assert!(report.is_complete());
        assert!(out_dir.join("a_watermarked.png").is_file());
    }
}
