//! Geometric transforms applied to watermark layers.
//!
//! Rotation angles are degrees counter-clockwise, sampled with nearest
//! neighbor about the image center. Pixels that map outside the source are
//! transparent.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Rotate about the center, keeping the original canvas size.
///
/// Corners rotated past the canvas edges are lost.
#[must_use]
pub fn rotate_cropped(image: &RgbaImage, degrees: f64) -> RgbaImage {
    rotate_into(image, degrees, image.width(), image.height())
}

/// Rotate about the center, growing the canvas to fit the rotated shape.
#[must_use]
pub fn rotate_expanded(image: &RgbaImage, degrees: f64) -> RgbaImage {
    let (w, h) = expanded_size(image.width(), image.height(), degrees);
    rotate_into(image, degrees, w, h)
}

/// Canvas size needed to hold a `width`x`height` image rotated by `degrees`.
#[must_use]
pub fn expanded_size(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (f64::from(width), f64::from(height));

    // absorb float noise so 90 degrees on 40x20 is exactly 20x40
    let fit = |v: f64| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = (v - 1e-6).ceil().max(1.0) as u32;
        px
    };
    (fit(w * cos + h * sin), fit(w * sin + h * cos))
}

fn rotate_into(image: &RgbaImage, degrees: f64, dst_w: u32, dst_h: u32) -> RgbaImage {
    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let src_cx = f64::from(image.width()) / 2.0;
    let src_cy = f64::from(image.height()) / 2.0;
    let dst_cx = f64::from(dst_w) / 2.0;
    let dst_cy = f64::from(dst_h) / 2.0;
    let (src_w, src_h) = (f64::from(image.width()), f64::from(image.height()));

    RgbaImage::from_fn(dst_w, dst_h, |dx, dy| {
        // y points down, so a counter-clockwise turn maps back through this inverse
        let rx = f64::from(dx) + 0.5 - dst_cx;
        let ry = f64::from(dy) + 0.5 - dst_cy;
        let sx = rx * cos - ry * sin + src_cx;
        let sy = rx * sin + ry * cos + src_cy;

        if sx < 0.0 || sy < 0.0 || sx >= src_w || sy >= src_h {
            return Rgba([0, 0, 0, 0]);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = (sx.floor() as u32, sy.floor() as u32);
        *image.get_pixel(x.min(image.width() - 1), y.min(image.height() - 1))
    })
}

/// Dimensions of a `width`x`height` image resized by `factor`.
///
/// Truncated, never below 1 pixel. A factor of exactly 1.0 keeps the size.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn scaled_size(width: u32, height: u32, factor: f32) -> (u32, u32) {
    if factor == 1.0 {
        return (width, height);
    }
    let dim = |v: u32| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = (f64::from(v) * f64::from(factor)).max(1.0) as u32;
        px
    };
    (dim(width), dim(height))
}

/// Resize by a uniform factor with Lanczos3 resampling, to
/// [`scaled_size`]. A factor of exactly 1.0 returns an unchanged copy.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn scale_by(image: &RgbaImage, factor: f32) -> RgbaImage {
    if factor == 1.0 {
        return image.clone();
    }
    let (w, h) = scaled_size(image.width(), image.height(), factor);
    imageops::resize(image, w, h, FilterType::Lanczos3)
}
