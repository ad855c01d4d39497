#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`RoomController`**: Owns the room state and keeps the host, the door and the lights consistent
//! - **`HostLink`**: Blocking request/response driver for the serial link to the host
//! - **`RoomStatus`**: The authoritative status negotiated with the host
//! - **`DoorPolicy`**: How activation waits on the door before a round starts
//! - **`Outcome`** / **`ScoreReport`**: How a round ended and what gets posted
//! - **`DoorActuator`**: Lock output plus door sensor, on embedded-hal pins
//! - **`IndicatorController`** / **`LightOutput`**: Semantic colors and the strategy that renders them
//! - **`LineChannel`**: Trait to implement for your serial line
//! - **`TimeSource`**: Trait to implement for your timing system
//! - **`InstallationProfile`**: Name, role and timing of one installation
//!
//! Indicator colors are `Srgb<f32>` (0.0-1.0 range) at the hardware boundary.
//! When implementing `RgbLed` or `PixelStrip` for your hardware, convert these
//! values to your device's native format (e.g., 8-bit integers, PWM duty cycles).

// This mod MUST go first, so that the others see its macros.
mod fmt;

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub mod activation;
pub mod colors;
pub mod door;
pub mod indicator;
pub mod link;
pub mod outcome;
pub mod profile;
pub mod protocol;
pub mod room;
pub mod time;
pub mod types;

pub use door::{DoorActuator, DoorError, DoorState, DoorWiring};
pub use indicator::{
    IndicatorColor, IndicatorController, LightOutput, Mirror, NoLight, PixelStrip, RgbLed,
    SignRelay, SolidLight, Zone, ZonedStrip,
};
pub use link::{HostLink, LineChannel, LinkError, LinkTiming, MemoryProbe, NoMemoryProbe};
pub use outcome::Settlement;
pub use profile::{InstallationProfile, RoomTiming, StationRole};
pub use protocol::{Line, Reply, Request, Telemetry};
pub use room::{RoomController, RoomError, RoomState};
pub use time::{Deadline, TimeDuration, TimeInstant, TimeSource};
pub use types::{Difficulty, DoorPolicy, Outcome, RoomStatus, RoundParameters, ScoreReport};
