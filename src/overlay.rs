//! Image watermark rendering.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::blending;
use crate::error::{Error, Result};
use crate::geometry::{self, Size};
use crate::params::ImageWatermarkParams;
use crate::transform;

/// Scale, fade and rotate a watermark bitmap as `params` requests.
fn prepare(watermark: &RgbaImage, params: &ImageWatermarkParams) -> RgbaImage {
    let mut mark = transform::scale_by(watermark, params.scale());
    blending::scale_alpha(&mut mark, params.opacity());
    if params.rotation() != 0 {
        mark = transform::rotate_expanded(&mark, f64::from(params.rotation()));
    }
    mark
}

/// Paste `watermark` onto `source` and return the result.
///
/// The watermark is resized by `scale` (Lanczos3), its existing alpha is
/// multiplied by `opacity / 255`, it is rotated with the canvas grown to
/// fit, and finally composited at the requested position clamped against
/// its post-transform size. With no watermark the source is returned as is.
#[must_use]
pub fn render_image_watermark(
    source: &DynamicImage,
    watermark: Option<&RgbaImage>,
    params: &ImageWatermarkParams,
) -> DynamicImage {
    let Some(watermark) = watermark else {
        return source.clone();
    };

    let mark = prepare(watermark, params);
    let canvas = Size::new(source.width(), source.height());
    let (x, y) = geometry::clamp_to_canvas(
        canvas,
        Size::new(mark.width(), mark.height()),
        params.position(),
    );

    let mut out = source.to_rgba8();
    blending::composite_over(&mut out, &mark, x, y);
    DynamicImage::ImageRgba8(out)
}

/// The image watermark parameter store: placement and style plus the
/// decoded bitmap, loaded once and reused for every render.
#[derive(Debug, Clone, Default)]
pub struct ImageWatermark {
    /// Placement and style.
    pub params: ImageWatermarkParams,
    bitmap: Option<RgbaImage>,
}

impl ImageWatermark {
    /// An empty store with default parameters and no bitmap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a watermark image from disk, replacing any current bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if the file cannot be opened or decoded; the
    /// previous bitmap is kept in that case.
    pub fn load_watermark(&mut self, path: &Path) -> Result<()> {
        let img = image::open(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), width = img.width(), height = img.height(), "watermark loaded");
        self.set_bitmap(&img);
        Ok(())
    }

    /// Use an already decoded image as the watermark.
    pub fn set_bitmap(&mut self, image: &DynamicImage) {
        self.bitmap = Some(image.to_rgba8());
    }

    /// Drop the bitmap; renders become no-ops.
    pub fn clear_bitmap(&mut self) {
        self.bitmap = None;
    }

    /// The loaded bitmap, if any.
    #[must_use]
    pub fn bitmap(&self) -> Option<&RgbaImage> {
        self.bitmap.as_ref()
    }

    /// Size of the watermark after scaling and rotation, if a bitmap is loaded.
    #[must_use]
    pub fn rendered_size(&self) -> Option<Size> {
        let bitmap = self.bitmap.as_ref()?;
        let (w, h) = transform::scaled_size(bitmap.width(), bitmap.height(), self.params.scale());
        let (w, h) = if self.params.rotation() == 0 {
            (w, h)
        } else {
            transform::expanded_size(w, h, f64::from(self.params.rotation()))
        };
        Some(Size::new(w, h))
    }

    /// Render onto `source` with the current parameters.
    #[must_use]
    pub fn render(&self, source: &DynamicImage) -> DynamicImage {
        render_image_watermark(source, self.bitmap.as_ref(), &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn black(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([0, 0, 0])))
    }

    fn white_mark(w: u32, h: u32, alpha: u8) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, alpha]))
    }

    #[test]
    fn no_bitmap_returns_source_unchanged() {
        let src = black(20, 10);
        let out = render_image_watermark(&src, None, &ImageWatermarkParams::new());
        assert_eq!(out, src);
        assert_eq!(ImageWatermark::new().render(&src), src);
    }

    #[test]
    fn requested_opacity_compounds_with_bitmap_alpha() {
        let src = black(10, 10);
        let mark = white_mark(2, 2, 128);
        let mut params = ImageWatermarkParams::new();
        params.set_opacity(128);

        let out = render_image_watermark(&src, Some(&mark), &params).to_rgba8();
        // 128/255 * 128/255 * 255 ~= 64
        let px = out.get_pixel(0, 0);
        assert!((63..=65).contains(&px[0]), "effective alpha {}", px[0]);
        assert_eq!(px[3], 255);
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn full_opacity_pastes_opaque_pixels_exactly() {
        let src = black(10, 10);
        let mark = RgbaImage::from_pixel(3, 3, Rgba([10, 200, 30, 255]));
        let mut params = ImageWatermarkParams::new();
        params.set_opacity(255);
        params.set_position(4, 5);

        let out = render_image_watermark(&src, Some(&mark), &params).to_rgba8();
        assert_eq!(*out.get_pixel(4, 5), Rgba([10, 200, 30, 255]));
        assert_eq!(*out.get_pixel(6, 7), Rgba([10, 200, 30, 255]));
        assert_eq!(*out.get_pixel(7, 7), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn position_is_clamped_against_post_transform_size() {
        let src = black(100, 100);
        let mark = white_mark(10, 10, 255);
        let mut params = ImageWatermarkParams::new();
        params.set_opacity(255);
        params.set_position(500, 500);

        let out = render_image_watermark(&src, Some(&mark), &params).to_rgba8();
        assert_eq!(*out.get_pixel(90, 90), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(89, 89), Rgba([0, 0, 0, 255]));

        params.set_scale(2.0);
        let out = render_image_watermark(&src, Some(&mark), &params).to_rgba8();
        assert_eq!(*out.get_pixel(80, 80), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(79, 79), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn rotation_expands_the_watermark() {
        let mut store = ImageWatermark::new();
        store.set_bitmap(&DynamicImage::ImageRgba8(white_mark(40, 20, 255)));
        assert_eq!(store.rendered_size(), Some(Size::new(40, 20)));

        store.params.set_rotation(90);
        assert_eq!(store.rendered_size(), Some(Size::new(20, 40)));

        store.params.set_opacity(255);
        store.params.set_position(0, 0);
        let out = store.render(&black(100, 100)).to_rgba8();
        // nothing lost: the full 20x40 rotated block is painted
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(19, 39), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(20, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(0, 40), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn scale_resizes_before_paste() {
        let mut store = ImageWatermark::new();
        store.set_bitmap(&DynamicImage::ImageRgba8(white_mark(4, 4, 255)));
        store.params.set_scale(0.5);
        assert_eq!(store.rendered_size(), Some(Size::new(2, 2)));
        store.params.set_scale(3.0);
        assert_eq!(store.rendered_size(), Some(Size::new(12, 12)));
    }

    #[test]
    fn rendered_size_matches_the_prepared_bitmap() {
        let mut store = ImageWatermark::new();
        store.set_bitmap(&DynamicImage::ImageRgba8(white_mark(37, 11, 255)));
        for (scale, rotation) in [(1.0, 0), (0.3, 0), (2.5, 30), (0.01, 45), (1.7, 270)] {
            store.params.set_scale(scale);
            store.params.set_rotation(rotation);
            let mark = prepare(store.bitmap().unwrap(), &store.params);
            assert_eq!(
                store.rendered_size(),
                Some(Size::new(mark.width(), mark.height())),
                "scale {scale} rotation {rotation}"
            );
        }
    }

    #[test]
    fn source_is_not_mutated() {
        let src = black(16, 16);
        let before = src.clone();
        let mark = white_mark(4, 4, 255);
        let out = render_image_watermark(&src, Some(&mark), &ImageWatermarkParams::new());
        assert_eq!(src, before);
        assert_ne!(out.to_rgba8(), before.to_rgba8());
    }

    #[test]
    fn failed_load_keeps_previous_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("logo.png");
        std::fs::write(&bad, b"definitely not a png").unwrap();

        let mut store = ImageWatermark::new();
        store.set_bitmap(&DynamicImage::ImageRgba8(white_mark(3, 3, 255)));
        let err = store.load_watermark(&bad).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert_eq!(store.bitmap().map(RgbaImage::dimensions), Some((3, 3)));

        store.clear_bitmap();
        assert!(store.bitmap().is_none());
        assert!(store.rendered_size().is_none());
    }

    #[test]
    fn load_watermark_converts_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])).save(&path).unwrap();

        let mut store = ImageWatermark::new();
        store.load_watermark(&path).unwrap();
        let bitmap = store.bitmap().unwrap();
        assert_eq!(bitmap.dimensions(), (5, 3));
        assert_eq!(*bitmap.get_pixel(0, 0), Rgba([1, 2, 3, 255]));
    }
}
