//! Indicator color constants and conversion helpers.
//!
//! All helpers return `palette::Srgb` (0.0-1.0 range) for direct use with
//! [`RgbLed`](crate::RgbLed) and [`PixelStrip`](crate::PixelStrip).

use palette::Srgb;

pub const OFF: Srgb = Srgb::new(0.0, 0.0, 0.0);
pub const RED: Srgb = Srgb::new(1.0, 0.0, 0.0);
pub const GREEN: Srgb = Srgb::new(0.0, 1.0, 0.0);
pub const BLUE: Srgb = Srgb::new(0.0, 0.0, 1.0);
pub const CYAN: Srgb = Srgb::new(0.0, 1.0, 1.0);

/// Creates a color from 8-bit channel values.
#[inline]
pub fn rgb8(red: u8, green: u8, blue: u8) -> Srgb {
    Srgb::new(red, green, blue).into_format()
}

/// Converts a color back to 8-bit channel values, clamping out-of-range input.
#[inline]
pub fn to_rgb8(color: Srgb) -> (u8, u8, u8) {
    let clamped = Srgb::new(
        color.red.clamp(0.0, 1.0),
        color.green.clamp(0.0, 1.0),
        color.blue.clamp(0.0, 1.0),
    );
    let c: Srgb<u8> = clamped.into_format();
    (c.red, c.green, c.blue)
}
