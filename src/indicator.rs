//! Semantic indicator colors and the lighting strategies that render them.
//!
//! The room logic only ever speaks in [`IndicatorColor`]. How a color turns
//! into light is the job of a [`LightOutput`] strategy picked per
//! installation:
//!
//! - [`SolidLight`]: one RGB LED (or several through [`Mirror`])
//! - [`ZonedStrip`]: an addressable strip, with an optional zone pattern for
//!   the activating color
//! - [`SignRelay`]: adds a room sign relay to any other strategy

use embedded_hal::digital::OutputPin;
use palette::Srgb;

use crate::colors;
use crate::types::RoomStatus;

/// Trait for abstracting RGB LED hardware.
///
/// Implement this for your LED hardware (GPIO, PWM, SPI, etc.).
pub trait RgbLed {
    /// Sets the LED to the specified RGB color.
    ///
    /// Color components are in the range 0.0-1.0. Implementations should
    /// convert these to their hardware's native format (e.g., PWM duty cycles,
    /// 8-bit RGB values). Handle any hardware errors internally - this method
    /// cannot fail.
    fn set_color(&mut self, color: Srgb);
}

/// Trait for abstracting an addressable LED strip.
pub trait PixelStrip {
    /// Number of pixels on the strip.
    fn pixel_count(&self) -> usize;

    /// Buffers a color for one pixel. Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Srgb);

    /// Pushes the buffered pixels out to the strip.
    fn show(&mut self);
}

/// Colors the room logic can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorColor {
    Off,
    Red,
    Green,
    /// The activating / active color.
    Cyan,
    Custom(u8, u8, u8),
}

impl IndicatorColor {
    /// Color shown for a room status.
    pub const fn for_status(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Win => IndicatorColor::Green,
            RoomStatus::Lose | RoomStatus::Timeout | RoomStatus::Emergency => IndicatorColor::Red,
            RoomStatus::Active | RoomStatus::Activated => IndicatorColor::Cyan,
            RoomStatus::Inactive | RoomStatus::Door | RoomStatus::Maintenance => IndicatorColor::Off,
        }
    }

    /// Solid RGB value for this color.
    pub fn to_srgb(self) -> Srgb {
        match self {
            IndicatorColor::Off => colors::OFF,
            IndicatorColor::Red => colors::RED,
            IndicatorColor::Green => colors::GREEN,
            IndicatorColor::Cyan => colors::CYAN,
            IndicatorColor::Custom(r, g, b) => colors::rgb8(r, g, b),
        }
    }
}

/// Trait for a lighting strategy: renders semantic colors on real hardware.
pub trait LightOutput {
    /// Renders `color`. Best effort - this method cannot fail.
    fn show(&mut self, color: IndicatorColor);

    /// Switches the room sign, if the installation has one.
    fn set_sign(&mut self, _on: bool) {}
}

/// Gives the room logic one vocabulary for the indicator and remembers what
/// was last shown.
pub struct IndicatorController<X: LightOutput> {
    output: X,
    current: IndicatorColor,
}

impl<X: LightOutput> IndicatorController<X> {
    /// Wraps `output` and turns it off.
    pub fn new(mut output: X) -> Self {
        output.show(IndicatorColor::Off);
        Self {
            output,
            current: IndicatorColor::Off,
        }
    }

    /// Shows `color`.
    pub fn show(&mut self, color: IndicatorColor) {
        self.output.show(color);
        self.current = color;
    }

    /// Shows the color for `status`.
    pub fn show_status(&mut self, status: RoomStatus) {
        self.show(IndicatorColor::for_status(status));
    }

    pub fn off(&mut self) {
        self.show(IndicatorColor::Off);
    }

    pub fn set_sign(&mut self, on: bool) {
        self.output.set_sign(on);
    }

    /// Last color shown.
    pub fn current(&self) -> IndicatorColor {
        self.current
    }

    /// Returns a reference to the underlying strategy.
    pub fn output(&self) -> &X {
        &self.output
    }
}

/// Drives one RGB LED with solid colors.
pub struct SolidLight<L: RgbLed> {
    led: L,
}

impl<L: RgbLed> SolidLight<L> {
    pub fn new(led: L) -> Self {
        Self { led }
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

impl<L: RgbLed> LightOutput for SolidLight<L> {
    fn show(&mut self, color: IndicatorColor) {
        self.led.set_color(color.to_srgb());
    }
}

/// Two LEDs showing the same color, e.g. the base station and a door frame.
pub struct Mirror<A: RgbLed, B: RgbLed> {
    pub primary: A,
    pub secondary: B,
}

impl<A: RgbLed, B: RgbLed> Mirror<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: RgbLed, B: RgbLed> RgbLed for Mirror<A, B> {
    fn set_color(&mut self, color: Srgb) {
        self.primary.set_color(color);
        self.secondary.set_color(color);
    }
}

/// A run of pixels painted in one color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    /// First pixel, inclusive.
    pub start: usize,
    /// Last pixel, exclusive.
    pub end: usize,
    pub color: Srgb,
}

impl Zone {
    pub const fn new(start: usize, end: usize, color: Srgb) -> Self {
        Self { start, end, color }
    }
}

/// Addressable strip that fills with the indicator color.
///
/// The activating color renders `pattern` instead when one is given;
/// pixels outside every zone are turned off.
pub struct ZonedStrip<P: PixelStrip> {
    strip: P,
    pattern: Option<&'static [Zone]>,
}

impl<P: PixelStrip> ZonedStrip<P> {
    /// Strip that fills every color solid.
    pub fn new(strip: P) -> Self {
        Self {
            strip,
            pattern: None,
        }
    }

    /// Strip that renders `pattern` for the activating color.
    pub fn with_pattern(strip: P, pattern: &'static [Zone]) -> Self {
        Self {
            strip,
            pattern: Some(pattern),
        }
    }

    pub fn strip(&self) -> &P {
        &self.strip
    }

    fn fill(&mut self, color: Srgb) {
        for index in 0..self.strip.pixel_count() {
            self.strip.set_pixel(index, color);
        }
    }
}

impl<P: PixelStrip> LightOutput for ZonedStrip<P> {
    fn show(&mut self, color: IndicatorColor) {
        match (color, self.pattern) {
            (IndicatorColor::Cyan, Some(pattern)) => {
                self.fill(colors::OFF);
                let count = self.strip.pixel_count();
                for zone in pattern {
                    for index in zone.start..zone.end.min(count) {
                        self.strip.set_pixel(index, zone.color);
                    }
                }
            }
            (color, _) => self.fill(color.to_srgb()),
        }
        self.strip.show();
    }
}

/// Adds a room sign relay to another strategy.
///
/// Installations without a monitor light a sign while a round is starting.
/// Relay write errors are ignored.
pub struct SignRelay<X: LightOutput, P: OutputPin> {
    inner: X,
    relay: P,
}

impl<X: LightOutput, P: OutputPin> SignRelay<X, P> {
    pub fn new(inner: X, relay: P) -> Self {
        Self { inner, relay }
    }

    pub fn inner(&self) -> &X {
        &self.inner
    }
}

impl<X: LightOutput, P: OutputPin> LightOutput for SignRelay<X, P> {
    fn show(&mut self, color: IndicatorColor) {
        self.inner.show(color);
    }

    fn set_sign(&mut self, on: bool) {
        let _ = self.relay.set_state(on.into());
        self.inner.set_sign(on);
    }
}

/// Strategy for controllers that do not own any lights.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLight;

impl LightOutput for NoLight {
    fn show(&mut self, _color: IndicatorColor) {}
}
