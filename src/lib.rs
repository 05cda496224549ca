//! Burn text or image watermarks into photos, one at a time or in batches.
//!
//! A watermark is described by a parameter set ([`TextWatermarkParams`] or
//! [`ImageWatermarkParams`]) and rendered onto a copy of the source image by
//! forward alpha compositing. Placement can be manual, one of nine anchors,
//! or dragged, and is always clamped so the watermark stays on the canvas.
//! Parameter sets can be stored as named templates in a JSON config file.
//!
//! # Quick Start
//!
//! ```no_run
//! use photo_watermark::{Color, TextRenderer, TextWatermarkParams};
//!
//! let img = image::open("photo.jpg").unwrap();
//! let mut params = TextWatermarkParams::new();
//! params.set_text("© 2024 Example");
//! params.set_color(Color::WHITE);
//! params.set_opacity(160);
//!
//! let marked = TextRenderer::new().render(&img, &params);
//! marked.save("photo_watermarked.png").unwrap();
//! ```
//!
//! # Batch export
//!
//! ```no_run
//! use std::path::Path;
//! use photo_watermark::{list_images, Anchor, ExportOptions, WatermarkEngine};
//!
//! let mut engine = WatermarkEngine::new();
//! engine.text.set_text("DRAFT");
//! engine.anchor = Some(Anchor::BottomRight);
//!
//! let inputs = list_images(Path::new("photos")).unwrap();
//! let report = engine.export_batch(&inputs, Path::new("out"), &ExportOptions::default());
//! println!("{} written, {} failed", report.succeeded(), report.failed());
//! ```
//!
//! # Templates
//!
//! ```no_run
//! use photo_watermark::{TemplateStore, TextWatermarkParams};
//!
//! let store = TemplateStore::new("watermark_config.json");
//! store.save("signature", &TextWatermarkParams::new()).unwrap();
//! let params: Option<TextWatermarkParams> = store.load("signature");
//! ```

#![deny(missing_docs)]

mod bitmap_font;
pub mod blending;
mod engine;
pub mod error;
pub mod font;
pub mod geometry;
mod overlay;
mod params;
pub mod templates;
mod text;
pub mod transform;

pub use engine::{
    is_supported_image, list_images, load_image, output_path_for, save_image, supported_files,
    BatchReport, ExportOptions, ProcessResult, WatermarkEngine, DEFAULT_JPEG_QUALITY,
    DEFAULT_SUFFIX, SUPPORTED_EXTENSIONS,
};
pub use error::{Error, Result};
pub use font::{BuiltinFonts, FontProvider, SystemFonts};
pub use geometry::{Anchor, Placement, Size};
pub use overlay::{render_image_watermark, ImageWatermark};
pub use params::{Color, ImageWatermarkParams, TextWatermarkParams, WatermarkKind, MIN_SCALE};
pub use templates::{TemplateParams, TemplateStore, DEFAULT_CONFIG_FILE};
pub use text::TextRenderer;
