//! Watermark placement: manual coordinates, drag deltas and nine-point anchors.
//!
//! All coordinates are canvas-relative with a top-left origin. Manual
//! placement is clamped so the watermark box stays inside the canvas;
//! anchors and drags are resolved without clamping, and the renderers clamp
//! again when compositing.

use std::fmt;
use std::str::FromStr;

/// Distance in pixels between an edge anchor and the canvas edge.
pub const ANCHOR_MARGIN: i32 = 10;

/// Width and height of a canvas or watermark in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a size from width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// One of the nine canonical placement positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Top-left corner, inset by the margin.
    TopLeft,
    /// Horizontally centered along the top edge.
    TopCenter,
    /// Top-right corner, inset by the margin.
    TopRight,
    /// Vertically centered along the left edge.
    CenterLeft,
    /// Canvas center.
    Center,
    /// Vertically centered along the right edge.
    CenterRight,
    /// Bottom-left corner, inset by the margin.
    BottomLeft,
    /// Horizontally centered along the bottom edge.
    BottomCenter,
    /// Bottom-right corner, inset by the margin.
    BottomRight,
}

impl Anchor {
    /// All anchors in reading order.
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Kebab-case name, e.g. `"bottom-right"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// Parse an anchor name, falling back to [`Anchor::Center`] for anything unrecognized.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(Anchor::Center)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown anchor name with [`str::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAnchor(pub String);

impl fmt::Display for UnknownAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown anchor {:?}", self.0)
    }
}

impl std::error::Error for UnknownAnchor {}

impl FromStr for Anchor {
    type Err = UnknownAnchor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Anchor::ALL
            .into_iter()
            .find(|a| a.as_str() == name)
            .ok_or_else(|| UnknownAnchor(s.to_string()))
    }
}

/// A placement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Raw top-left coordinates, clamped into the canvas.
    Manual {
        /// Requested x.
        x: i32,
        /// Requested y.
        y: i32,
    },
    /// One of the nine anchors.
    Preset(Anchor),
    /// Pointer drag: previous position moved by a delta. Not clamped.
    Drag {
        /// Position before the drag step.
        origin: (i32, i32),
        /// Pointer movement since the previous step.
        delta: (i32, i32),
    },
}

/// Resolve a placement request to a top-left coordinate.
#[must_use]
pub fn resolve(canvas: Size, watermark: Size, placement: Placement) -> (i32, i32) {
    match placement {
        Placement::Manual { x, y } => clamp_to_canvas(canvas, watermark, (x, y)),
        Placement::Preset(anchor) => anchor_position(canvas, watermark, anchor),
        Placement::Drag { origin, delta } => drag(origin, delta),
    }
}

/// Clamp a position so the watermark box stays inside the canvas.
///
/// When the watermark is larger than the canvas on an axis, that axis
/// clamps to 0 and the watermark overflows the far edge.
#[must_use]
pub fn clamp_to_canvas(canvas: Size, watermark: Size, (x, y): (i32, i32)) -> (i32, i32) {
    (
        clamp_axis(x, canvas.width, watermark.width),
        clamp_axis(y, canvas.height, watermark.height),
    )
}

fn clamp_axis(v: i32, canvas: u32, watermark: u32) -> i32 {
    let max = (i64::from(canvas) - i64::from(watermark)).max(0);
    let clamped = i64::from(v).clamp(0, max);
    // canvas dimensions fit in i32 for any decodable image
    i32::try_from(clamped).unwrap_or(i32::MAX)
}

/// Compute the top-left coordinate for an anchor.
///
/// Middle anchors use floor division, so a watermark wider than the canvas
/// yields a negative coordinate here.
#[must_use]
pub fn anchor_position(canvas: Size, watermark: Size, anchor: Anchor) -> (i32, i32) {
    let free_w = i64::from(canvas.width) - i64::from(watermark.width);
    let free_h = i64::from(canvas.height) - i64::from(watermark.height);
    let m = i64::from(ANCHOR_MARGIN);

    let left = m;
    let center_x = free_w.div_euclid(2);
    let right = free_w - m;
    let top = m;
    let center_y = free_h.div_euclid(2);
    let bottom = free_h - m;

    let (x, y) = match anchor {
        Anchor::TopLeft => (left, top),
        Anchor::TopCenter => (center_x, top),
        Anchor::TopRight => (right, top),
        Anchor::CenterLeft => (left, center_y),
        Anchor::Center => (center_x, center_y),
        Anchor::CenterRight => (right, center_y),
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomCenter => (center_x, bottom),
        Anchor::BottomRight => (right, bottom),
    };
    (saturate(x), saturate(y))
}

/// Move a position by a pointer delta.
#[must_use]
pub fn drag((x, y): (i32, i32), (dx, dy): (i32, i32)) -> (i32, i32) {
    (x.saturating_add(dx), y.saturating_add(dy))
}

#[allow(clippy::cast_possible_truncation)]
fn saturate(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANVAS: Size = Size::new(1000, 800);
    const MARK: Size = Size::new(100, 50);

    #[test]
    fn nine_anchors_match_reference_layout() {
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::TopLeft), (10, 10));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::TopCenter), (450, 10));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::TopRight), (890, 10));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::CenterLeft), (10, 375));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::Center), (450, 375));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::CenterRight), (890, 375));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::BottomLeft), (10, 740));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::BottomCenter), (450, 740));
        assert_eq!(anchor_position(CANVAS, MARK, Anchor::BottomRight), (890, 740));
    }

    #[test]
    fn centering_floors_odd_and_negative_space() {
        assert_eq!(
            anchor_position(Size::new(101, 51), Size::new(10, 10), Anchor::Center),
            (45, 20)
        );
        // watermark wider than canvas: floor division rounds toward -inf
        assert_eq!(
            anchor_position(Size::new(10, 10), Size::new(13, 13), Anchor::Center),
            (-2, -2)
        );
    }

    #[test]
    fn unknown_anchor_names_fall_back_to_center() {
        assert_eq!(Anchor::from_name("middle"), Anchor::Center);
        assert_eq!(Anchor::from_name(""), Anchor::Center);
        assert_eq!(Anchor::from_name("Bottom-Right"), Anchor::BottomRight);
        assert!("sideways".parse::<Anchor>().is_err());
        for anchor in Anchor::ALL {
            assert_eq!(anchor.to_string().parse::<Anchor>(), Ok(anchor));
        }
    }

    #[test]
    fn manual_placement_is_clamped_inside_canvas() {
        let place = |x, y| resolve(CANVAS, MARK, Placement::Manual { x, y });
        assert_eq!(place(50, 60), (50, 60));
        assert_eq!(place(-20, -1), (0, 0));
        assert_eq!(place(5000, 5000), (900, 750));
        assert_eq!(place(i32::MAX, i32::MIN), (900, 0));
    }

    #[test]
    fn clamp_bounds_hold_for_a_grid_of_sizes() {
        for (cw, ch) in [(1, 1), (64, 48), (640, 480), (3, 900)] {
            for (ww, wh) in [(0, 0), (1, 1), (50, 20), (700, 700)] {
                for (x, y) in [(-100, -100), (0, 0), (10, 400), (1000, 1000)] {
                    let (rx, ry) =
                        clamp_to_canvas(Size::new(cw, ch), Size::new(ww, wh), (x, y));
                    let max_x = (i64::from(cw) - i64::from(ww)).max(0);
                    let max_y = (i64::from(ch) - i64::from(wh)).max(0);
                    assert!((0..=max_x).contains(&i64::from(rx)));
                    assert!((0..=max_y).contains(&i64::from(ry)));
                }
            }
        }
    }

    #[test]
    fn oversized_watermark_clamps_to_origin() {
        let pos = clamp_to_canvas(Size::new(50, 50), Size::new(80, 20), (30, 40));
        assert_eq!(pos, (0, 30));
    }

    #[test]
    fn drag_adds_delta_without_clamping() {
        assert_eq!(drag((10, 10), (-25, 5)), (-15, 15));
        assert_eq!(
            resolve(
                CANVAS,
                MARK,
                Placement::Drag {
                    origin: (980, 10),
                    delta: (40, 0)
                }
            ),
            (1020, 10)
        );
        assert_eq!(drag((i32::MAX, 0), (1, 0)), (i32::MAX, 0));
    }
}
