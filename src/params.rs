//! Parameter stores for text and image watermarks.
//!
//! Each store is a plain struct owned by the caller and mutated through its
//! setters. Setters enforce the numeric invariants (opacity in `0..=255`,
//! scale at least `0.01`, and so on); deserialization enforces the same
//! invariants so a hand-edited config cannot bypass them. Cloning a store is
//! how a snapshot is taken.

use std::fmt;

use image::Rgba;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::geometry::{self, Anchor, Placement, Size};

/// Smallest accepted image watermark scale factor.
pub const MIN_SCALE: f32 = 0.01;

/// Which kind of watermark a parameter set or template describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    /// Rendered text.
    #[default]
    Text,
    /// A pasted bitmap.
    Image,
}

impl WatermarkKind {
    /// Lowercase name as stored in the config file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WatermarkKind::Text => "text",
            WatermarkKind::Image => "image",
        }
    }
}

impl fmt::Display for WatermarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque RGB color, stored as an `[r, g, b]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    /// White.
    pub const WHITE: Color = Color([255, 255, 255]);
    /// Black.
    pub const BLACK: Color = Color([0, 0, 0]);

    /// Build a color from its components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Attach an alpha value.
    #[must_use]
    pub const fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, alpha])
    }

    /// Parse `#RGB` or `#RRGGBB`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] for any other shape or non-hex digits.
    pub fn parse_hex(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let digit = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        match hex.len() {
            3 => Ok(Self::new(digit(0..1)? * 17, digit(1..2)? * 17, digit(2..3)? * 17)),
            6 => Ok(Self::new(digit(0..2)?, digit(2..4)?, digit(4..6)?)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

fn clamp_opacity(value: i64) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

/// Whole numbers in the config may be written as `45` or `45.0`.
#[allow(clippy::cast_possible_truncation)]
fn de_whole<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    f64::deserialize(d).map(|v| v.round() as i64)
}

fn de_opacity<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u8, D::Error> {
    de_whole(d).map(clamp_opacity)
}

fn de_font_size<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    de_whole(d).map(|v| u32::try_from(v.max(1)).unwrap_or(u32::MAX))
}

fn de_non_negative<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    de_whole(d).map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
}

fn de_scale<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<f32, D::Error> {
    f32::deserialize(d).map(|v| if v.is_nan() { 1.0 } else { v.max(MIN_SCALE) })
}

fn de_rotation<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i32, D::Error> {
    de_whole(d).map(|v| {
        let v = v.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        i32::try_from(v).unwrap_or_default()
    })
}

fn de_degrees<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i32, D::Error> {
    de_whole(d).map(|v| i32::try_from(v.rem_euclid(360)).unwrap_or_default())
}

#[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde
fn ser_degrees<S: Serializer>(v: &i32, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_i32(v.rem_euclid(360))
}

/// Style and placement of a text watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct TextWatermarkParams {
    text: String,
    font_family: String,
    #[serde(deserialize_with = "de_font_size")]
    font_size: u32,
    color: Color,
    #[serde(deserialize_with = "de_opacity")]
    opacity: u8,
    position: (i32, i32),
    #[serde(serialize_with = "ser_degrees", deserialize_with = "de_rotation")]
    rotation: i32,
    bold: bool,
    italic: bool,
    shadow: bool,
    shadow_color: Color,
    shadow_offset: (i32, i32),
    stroke: bool,
    stroke_color: Color,
    #[serde(deserialize_with = "de_non_negative")]
    stroke_width: u32,
}

impl Default for TextWatermarkParams {
    fn default() -> Self {
        Self {
            text: "水印文本".to_string(),
            font_family: "arial.ttf".to_string(),
            font_size: 36,
            color: Color::WHITE,
            opacity: 128,
            position: (50, 50),
            rotation: 0,
            bold: false,
            italic: false,
            shadow: false,
            shadow_color: Color::BLACK,
            shadow_offset: (2, 2),
            stroke: false,
            stroke_color: Color::BLACK,
            stroke_width: 1,
        }
    }
}

impl TextWatermarkParams {
    /// Default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the watermark text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Set the font family (file name or path) and pixel size. Size is floored at 1.
    pub fn set_font(&mut self, family: impl Into<String>, size: u32) {
        self.font_family = family.into();
        self.font_size = size.max(1);
    }

    /// Set the fill color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Set the opacity, clamped to `0..=255`.
    pub fn set_opacity(&mut self, opacity: i32) {
        self.opacity = clamp_opacity(i64::from(opacity));
    }

    /// Set the requested top-left position.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    /// Set the rotation in degrees, counter-clockwise. Stored as given.
    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = degrees;
    }

    /// Request a bold face. Only effective if a bold variant of the font resolves.
    pub fn set_bold(&mut self, bold: bool) {
        self.bold = bold;
    }

    /// Request an italic face. Only effective if an italic variant of the font resolves.
    pub fn set_italic(&mut self, italic: bool) {
        self.italic = italic;
    }

    /// Enable or disable the drop shadow.
    pub fn set_shadow(&mut self, enabled: bool) {
        self.shadow = enabled;
    }

    /// Set the drop shadow color.
    pub fn set_shadow_color(&mut self, color: Color) {
        self.shadow_color = color;
    }

    /// Set the drop shadow offset from the text position.
    pub fn set_shadow_offset(&mut self, dx: i32, dy: i32) {
        self.shadow_offset = (dx, dy);
    }

    /// Enable or disable the outline halo.
    pub fn set_stroke(&mut self, enabled: bool) {
        self.stroke = enabled;
    }

    /// Set the outline color.
    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    /// Set the outline width, floored at 0.
    pub fn set_stroke_width(&mut self, width: i32) {
        self.stroke_width = width.max(0).unsigned_abs();
    }

    /// Move the position by a pointer delta (see [`geometry::drag`]).
    pub fn drag_by(&mut self, dx: i32, dy: i32) {
        self.position = geometry::drag(self.position, (dx, dy));
    }

    /// Place the text at an anchor of `canvas`, given the measured text box.
    pub fn set_anchor(&mut self, anchor: Anchor, canvas: Size, text_box: Size) {
        self.position = geometry::resolve(canvas, text_box, Placement::Preset(anchor));
    }

    /// Watermark text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Font family or path.
    #[must_use]
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Font size in pixels.
    #[must_use]
    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    /// Fill color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Opacity in `0..=255`.
    #[must_use]
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Requested top-left position.
    #[must_use]
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    /// Rotation in degrees, as set.
    #[must_use]
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Whether a bold face was requested.
    #[must_use]
    pub fn bold(&self) -> bool {
        self.bold
    }

    /// Whether an italic face was requested.
    #[must_use]
    pub fn italic(&self) -> bool {
        self.italic
    }

    /// Whether the drop shadow is drawn.
    #[must_use]
    pub fn shadow(&self) -> bool {
        self.shadow
    }

    /// Drop shadow color.
    #[must_use]
    pub fn shadow_color(&self) -> Color {
        self.shadow_color
    }

    /// Drop shadow offset.
    #[must_use]
    pub fn shadow_offset(&self) -> (i32, i32) {
        self.shadow_offset
    }

    /// Whether the outline halo is drawn.
    #[must_use]
    pub fn stroke(&self) -> bool {
        self.stroke
    }

    /// Outline color.
    #[must_use]
    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    /// Outline width in pixels.
    #[must_use]
    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }
}

/// Placement and style of an image watermark. The bitmap itself lives in
/// [`ImageWatermark`](crate::ImageWatermark).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageWatermarkParams {
    position: (i32, i32),
    #[serde(deserialize_with = "de_opacity")]
    opacity: u8,
    #[serde(deserialize_with = "de_scale")]
    scale: f32,
    #[serde(deserialize_with = "de_degrees")]
    rotation: i32,
}

impl Default for ImageWatermarkParams {
    fn default() -> Self {
        Self {
            position: (0, 0),
            opacity: 128,
            scale: 1.0,
            rotation: 0,
        }
    }
}

impl ImageWatermarkParams {
    /// Default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested top-left position.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    /// Set the opacity, clamped to `0..=255`.
    pub fn set_opacity(&mut self, opacity: i32) {
        self.opacity = clamp_opacity(i64::from(opacity));
    }

    /// Set the scale factor, floored at [`MIN_SCALE`]. NaN is ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if !scale.is_nan() {
            self.scale = scale.max(MIN_SCALE);
        }
    }

    /// Set the rotation in degrees, counter-clockwise, normalized into `0..360`.
    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = degrees.rem_euclid(360);
    }

    /// Move the position by a pointer delta (see [`geometry::drag`]).
    pub fn drag_by(&mut self, dx: i32, dy: i32) {
        self.position = geometry::drag(self.position, (dx, dy));
    }

    /// Place the watermark at an anchor of `canvas`, given its rendered size.
    pub fn set_anchor(&mut self, anchor: Anchor, canvas: Size, watermark: Size) {
        self.position = geometry::resolve(canvas, watermark, Placement::Preset(anchor));
    }

    /// Requested top-left position.
    #[must_use]
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    /// Opacity in `0..=255`.
    #[must_use]
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Scale factor.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rotation in degrees, in `0..360`.
    #[must_use]
    pub fn rotation(&self) -> i32 {
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_clamped_on_write() {
        let mut text = TextWatermarkParams::new();
        text.set_opacity(300);
        assert_eq!(text.opacity(), 255);
        text.set_opacity(-10);
        assert_eq!(text.opacity(), 0);
        text.set_opacity(77);
        assert_eq!(text.opacity(), 77);

        let mut image = ImageWatermarkParams::new();
        image.set_opacity(300);
        assert_eq!(image.opacity(), 255);
        image.set_opacity(-10);
        assert_eq!(image.opacity(), 0);
    }

    #[test]
    fn scale_has_a_floor() {
        let mut image = ImageWatermarkParams::new();
        image.set_scale(0.0);
        assert!((image.scale() - 0.01).abs() < f32::EPSILON);
        image.set_scale(-3.0);
        assert!((image.scale() - 0.01).abs() < f32::EPSILON);
        image.set_scale(f32::NAN);
        assert!((image.scale() - 0.01).abs() < f32::EPSILON);
        image.set_scale(2.5);
        assert!((image.scale() - 2.5).abs() < f32::EPSILON);
    }

    #[test]
    fn image_rotation_is_normalized_text_rotation_is_not() {
        let mut image = ImageWatermarkParams::new();
        image.set_rotation(-90);
        assert_eq!(image.rotation(), 270);
        image.set_rotation(725);
        assert_eq!(image.rotation(), 5);

        let mut text = TextWatermarkParams::new();
        text.set_rotation(-90);
        assert_eq!(text.rotation(), -90);
    }

    #[test]
    fn text_snapshot_normalizes_rotation_for_storage() {
        let mut text = TextWatermarkParams::new();
        text.set_rotation(-45);
        let value = serde_json::to_value(&text).unwrap();
        assert_eq!(value["rotation"], 315);
        assert_eq!(value["color"], serde_json::json!([255, 255, 255]));
        assert_eq!(value["position"], serde_json::json!([50, 50]));
    }

    #[test]
    fn deserialization_applies_setter_invariants() {
        let text: TextWatermarkParams = serde_json::from_value(serde_json::json!({
            "text": "Hi",
            "opacity": 999,
            "font_size": 0,
            "stroke_width": -4
        }))
        .unwrap();
        assert_eq!(text.text(), "Hi");
        assert_eq!(text.opacity(), 255);
        assert_eq!(text.font_size(), 1);
        assert_eq!(text.stroke_width(), 0);
        // missing keys keep their defaults
        assert_eq!(text.font_family(), "arial.ttf");
        assert_eq!(text.shadow_offset(), (2, 2));

        let image: ImageWatermarkParams = serde_json::from_value(serde_json::json!({
            "opacity": -5,
            "scale": 0.0,
            "rotation": -30
        }))
        .unwrap();
        assert_eq!(image.opacity(), 0);
        assert!((image.scale() - MIN_SCALE).abs() < f32::EPSILON);
        assert_eq!(image.rotation(), 330);
    }

    #[test]
    fn whole_numbers_may_be_written_as_floats() {
        let text: TextWatermarkParams = serde_json::from_value(serde_json::json!({
            "font_size": 40.0,
            "opacity": 127.6,
            "rotation": -45.0,
            "stroke_width": 2.0
        }))
        .unwrap();
        assert_eq!(text.font_size(), 40);
        assert_eq!(text.opacity(), 128);
        assert_eq!(text.rotation(), -45);
        assert_eq!(text.stroke_width(), 2);

        let image: ImageWatermarkParams =
            serde_json::from_value(serde_json::json!({ "rotation": 45.0 })).unwrap();
        assert_eq!(image.rotation(), 45);

        let wrong: std::result::Result<ImageWatermarkParams, _> =
            serde_json::from_value(serde_json::json!({ "rotation": "sideways" }));
        assert!(wrong.is_err());
    }

    #[test]
    fn stroke_width_and_font_size_floors() {
        let mut text = TextWatermarkParams::new();
        text.set_stroke_width(-3);
        assert_eq!(text.stroke_width(), 0);
        text.set_stroke_width(4);
        assert_eq!(text.stroke_width(), 4);
        text.set_font("times.ttf", 0);
        assert_eq!(text.font_size(), 1);
        assert_eq!(text.font_family(), "times.ttf");
    }

    #[test]
    fn drag_and_anchor_update_position() {
        let mut image = ImageWatermarkParams::new();
        image.set_position(100, 100);
        image.drag_by(-150, 20);
        assert_eq!(image.position(), (-50, 120));

        image.set_anchor(
            Anchor::BottomRight,
            Size::new(1000, 800),
            Size::new(100, 50),
        );
        assert_eq!(image.position(), (890, 740));

        let mut text = TextWatermarkParams::new();
        text.set_anchor(Anchor::TopLeft, Size::new(1000, 800), Size::new(100, 50));
        assert_eq!(text.position(), (10, 10));
    }

    #[test]
    fn parse_hex_colors() {
        assert_eq!(Color::parse_hex("#FF0000").unwrap(), Color::new(255, 0, 0));
        assert_eq!(Color::parse_hex("#abc").unwrap(), Color::new(170, 187, 204));
        assert!(Color::parse_hex("FF0000").is_err());
        assert!(Color::parse_hex("#FF00").is_err());
        assert!(Color::parse_hex("#GGGGGG").is_err());
        assert!(Color::parse_hex("#é12").is_err());
        assert_eq!(Color::new(1, 171, 255).to_string(), "#01ABFF");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WatermarkKind::Image).unwrap(),
            "\"image\""
        );
        let kind: WatermarkKind = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(kind, WatermarkKind::Text);
    }
}
