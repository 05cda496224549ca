//! Forward alpha compositing primitives.
//!
//! Watermarks are burned in with the Porter-Duff "over" operator:
//! `out_a = fg_a + bg_a * (1 - fg_a)` and
//! `out_c = (fg_c * fg_a + bg_c * bg_a * (1 - fg_a)) / out_a`.
//!
//! Text layers are built by filling a coverage mask with a solid ink, which
//! interpolates all four channels of the layer toward the ink by coverage.

use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Blend one pixel over another.
#[must_use]
pub fn blend_over(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_a = f32::from(foreground[3]) / 255.0;
    if fg_a <= 0.0 {
        return background;
    }
    let bg_a = f32::from(background[3]) / 255.0;
    let out_a = fg_a + bg_a * (1.0 - fg_a);

    let channel = |fg: u8, bg: u8| {
        to_u8((f32::from(fg) * fg_a + f32::from(bg) * bg_a * (1.0 - fg_a)) / out_a)
    };

    Rgba([
        channel(foreground[0], background[0]),
        channel(foreground[1], background[1]),
        channel(foreground[2], background[2]),
        to_u8(out_a * 255.0),
    ])
}

/// Iterate the overlapping region of a `w`x`h` layer placed at `(x, y)` on `base`.
///
/// Yields `(base_x, base_y, layer_x, layer_y)`.
fn overlap(
    base_w: u32,
    base_h: u32,
    w: u32,
    h: u32,
    x: i32,
    y: i32,
) -> impl Iterator<Item = (u32, u32, u32, u32)> {
    let x0 = i64::from(x).max(0);
    let y0 = i64::from(y).max(0);
    let x1 = (i64::from(x) + i64::from(w)).min(i64::from(base_w));
    let y1 = (i64::from(y) + i64::from(h)).min(i64::from(base_h));
    let (ox, oy) = (i64::from(x), i64::from(y));

    (y0..y1).flat_map(move |by| {
        (x0..x1).map(move |bx| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let coords = (bx as u32, by as u32, (bx - ox) as u32, (by - oy) as u32);
            coords
        })
    })
}

/// Composite `overlay` over `base` with its top-left corner at `(x, y)`.
///
/// Parts of the overlay outside `base` are dropped; the overlay's own alpha
/// channel is the compositing mask.
pub fn composite_over(base: &mut RgbaImage, overlay: &RgbaImage, x: i32, y: i32) {
    for (bx, by, lx, ly) in overlap(
        base.width(),
        base.height(),
        overlay.width(),
        overlay.height(),
        x,
        y,
    ) {
        let fg = *overlay.get_pixel(lx, ly);
        if fg[3] == 0 {
            continue;
        }
        let px = base.get_pixel_mut(bx, by);
        *px = blend_over(*px, fg);
    }
}

/// Fill `ink` through a coverage `mask` placed at `(x, y)` on `target`.
///
/// Each covered pixel moves toward `ink` by the mask coverage, alpha
/// included, so repeated fills with the same ink are idempotent.
pub fn fill_mask(target: &mut RgbaImage, mask: &GrayImage, x: i32, y: i32, ink: Rgba<u8>) {
    for (tx, ty, mx, my) in overlap(
        target.width(),
        target.height(),
        mask.width(),
        mask.height(),
        x,
        y,
    ) {
        let coverage = mask.get_pixel(mx, my)[0];
        if coverage == 0 {
            continue;
        }
        let t = f32::from(coverage) / 255.0;
        let px = target.get_pixel_mut(tx, ty);
        for ch in 0..4 {
            let dst = f32::from(px[ch]);
            px[ch] = to_u8(dst + (f32::from(ink[ch]) - dst) * t);
        }
    }
}

/// Multiply every alpha value by `opacity / 255`.
///
/// Existing transparency compounds: alpha 128 at opacity 128 becomes 64.
pub fn scale_alpha(image: &mut RgbaImage, opacity: u8) {
    if opacity == u8::MAX {
        return;
    }
    let factor = f32::from(opacity) / 255.0;
    for px in image.pixels_mut() {
        px[3] = to_u8(f32::from(px[3]) * factor);
    }
}

/// Flatten an RGBA image onto an opaque background color.
#[must_use]
pub fn flatten(image: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        let a = f32::from(px[3]) / 255.0;
        let channel = |ch: usize| to_u8(f32::from(px[ch]) * a + f32::from(background[ch]) * (1.0 - a));
        Rgb([channel(0), channel(1), channel(2)])
    })
}
