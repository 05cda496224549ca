//! Text watermark rendering.
//!
//! The text is rasterized once into a coverage mask, then filled into a
//! transparent layer the size of the source: shadow first, then the stroke
//! halo, then the text itself. The layer is optionally rotated (without
//! growing the canvas) and composited over the source.

use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::blending;
use crate::font::{FontProvider, SystemFonts, TextMask};
use crate::geometry::{self, Size};
use crate::params::TextWatermarkParams;
use crate::transform;

/// Shadow alpha as a fraction of the text opacity.
const SHADOW_ALPHA: f64 = 0.7;
/// Stroke alpha as a fraction of the text opacity.
const STROKE_ALPHA: f64 = 0.8;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fraction_of(opacity: u8, fraction: f64) -> u8 {
    (f64::from(opacity) * fraction).round().clamp(0.0, 255.0) as u8
}

/// Renders text watermarks using fonts from a [`FontProvider`].
///
/// Create once and reuse; the renderer holds no per-image state.
#[derive(Debug, Clone, Default)]
pub struct TextRenderer<P = SystemFonts> {
    fonts: P,
}

impl TextRenderer<SystemFonts> {
    /// Renderer backed by the platform font directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: FontProvider> TextRenderer<P> {
    /// Renderer backed by a custom font provider.
    pub fn with_fonts(fonts: P) -> Self {
        Self { fonts }
    }

    /// The font provider.
    pub fn fonts(&self) -> &P {
        &self.fonts
    }

    fn rasterize(&self, params: &TextWatermarkParams) -> TextMask {
        let font = self
            .fonts
            .resolve(params.font_family(), params.bold(), params.italic());
        if font.is_builtin() {
            debug!(family = params.font_family(), "rendering with built-in font");
        }
        font.rasterize(params.text(), params.font_size())
    }

    /// Measure the inked text box for `params`.
    ///
    /// Used to resolve anchors before rendering.
    pub fn measure(&self, params: &TextWatermarkParams) -> Size {
        self.rasterize(params).size()
    }

    /// Render the text watermark over `source` and return a new RGBA image.
    ///
    /// `source` is never modified. The position is the top-left of the inked
    /// text box, and is clamped so that box stays inside the canvas.
    pub fn render(&self, source: &DynamicImage, params: &TextWatermarkParams) -> DynamicImage {
        let canvas = Size::new(source.width(), source.height());
        let mut layer = RgbaImage::new(canvas.width, canvas.height);

        let text = self.rasterize(params);
        let (ox, oy) = geometry::clamp_to_canvas(canvas, text.size(), params.position());
        let opacity = params.opacity();

        if params.shadow() {
            let (dx, dy) = params.shadow_offset();
            let ink = params
                .shadow_color()
                .with_alpha(fraction_of(opacity, SHADOW_ALPHA));
            blending::fill_mask(
                &mut layer,
                &text.mask,
                ox.saturating_add(dx),
                oy.saturating_add(dy),
                ink,
            );
        }

        if params.stroke() {
            let ink = params
                .stroke_color()
                .with_alpha(fraction_of(opacity, STROKE_ALPHA));
            let w = i32::try_from(params.stroke_width()).unwrap_or(i32::MAX);
            for dy in -w..=w {
                for dx in -w..=w {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    blending::fill_mask(
                        &mut layer,
                        &text.mask,
                        ox.saturating_add(dx),
                        oy.saturating_add(dy),
                        ink,
                    );
                }
            }
        }

        blending::fill_mask(
            &mut layer,
            &text.mask,
            ox,
            oy,
            params.color().with_alpha(opacity),
        );

        if params.rotation() != 0 {
            layer = transform::rotate_cropped(&layer, f64::from(params.rotation()));
        }

        let mut out = source.to_rgba8();
        blending::composite_over(&mut out, &layer, 0, 0);
        DynamicImage::ImageRgba8(out)
    }
}
