//! Per-installation configuration.

/// What this controller is responsible for in its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StationRole {
    /// Owns the door, the indicator and the status lifecycle.
    BaseStation,
    /// Polls status only; never drives the door or the indicator and never
    /// moves the room back to `Inactive`.
    Satellite,
}

/// Timing of the room sequences, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoomTiming {
    /// How long activation waits for the door before giving up.
    pub activation_timeout_ms: u32,
    /// Sensor poll interval during activation.
    pub door_poll_ms: u32,
    /// Pause between requesting `Inactive` and re-locking after a failed activation.
    pub relock_pause_ms: u32,
    /// Dwell after a round ends before the room returns to `Inactive`.
    pub settle_ms: u32,
    /// Ping interval during the settle dwell.
    pub settle_ping_ms: u32,
    /// Dwell after each status change of the emergency sequence.
    pub emergency_dwell_ms: u32,
}

impl Default for RoomTiming {
    fn default() -> Self {
        Self {
            activation_timeout_ms: 80_000,
            door_poll_ms: 100,
            relock_pause_ms: 50,
            settle_ms: 20_000,
            settle_ping_ms: 1_000,
            emergency_dwell_ms: 2_000,
        }
    }
}

/// Identity and behavior knobs of one installation.
///
/// Hardware differences that change *what* is driven (door frame LEDs, sign
/// relays, addressable strips) are expressed by the lighting strategy handed
/// to the controller, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InstallationProfile {
    /// Name announced to the host during the handshake.
    pub name: &'static str,
    pub role: StationRole,
    pub timing: RoomTiming,
}

impl InstallationProfile {
    /// Base station profile with default timing.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            role: StationRole::BaseStation,
            timing: RoomTiming {
                activation_timeout_ms: 80_000,
                door_poll_ms: 100,
                relock_pause_ms: 50,
                settle_ms: 20_000,
                settle_ping_ms: 1_000,
                emergency_dwell_ms: 2_000,
            },
        }
    }

    /// Turns the profile into a satellite profile.
    pub const fn satellite(mut self) -> Self {
        self.role = StationRole::Satellite;
        self
    }

    /// Replaces the timing.
    pub const fn with_timing(mut self, timing: RoomTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Returns true for a base station.
    pub const fn is_base_station(&self) -> bool {
        matches!(self.role, StationRole::BaseStation)
    }
}
