//! Room status state machine.
//!
//! Provides [`RoomController`], which owns the host link, the door and the
//! indicator and keeps them consistent with the status the host reports.
//! Round activation and outcome reporting live in their own modules as
//! further `impl` blocks on the same type.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::door::{DoorActuator, DoorError};
use crate::indicator::{IndicatorColor, IndicatorController, LightOutput};
use crate::link::{HostLink, LineChannel, LinkError, MemoryProbe};
use crate::profile::InstallationProfile;
use crate::time::{Deadline, TimeInstant, TimeSource};
use crate::types::{Difficulty, RoomStatus, RoundParameters};

/// Errors that can occur during room operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoomError {
    /// A host link operation failed.
    Link(LinkError),
    /// The door hardware failed.
    Door(DoorError),
}

impl core::fmt::Display for RoomError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RoomError::Link(err) => write!(f, "host link error: {}", err),
            RoomError::Door(err) => write!(f, "door error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RoomError {}

impl From<LinkError> for RoomError {
    fn from(err: LinkError) -> Self {
        RoomError::Link(err)
    }
}

impl From<DoorError> for RoomError {
    fn from(err: DoorError) -> Self {
        RoomError::Door(err)
    }
}

/// Everything the controller knows about the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoomState {
    /// Last status read from the host or applied through it.
    pub status: RoomStatus,
    /// True between reading an `Active` status and the end of that round.
    pub active: bool,
    /// Parameters of the most recent `Active` round.
    pub round: Option<RoundParameters>,
    /// Round length in seconds, once asked for.
    pub round_duration: Option<u16>,
}

impl Default for RoomState {
    fn default() -> Self {
        Self {
            status: RoomStatus::Inactive,
            active: false,
            round: None,
            round_duration: None,
        }
    }
}

/// On-device controller for one room.
///
/// Everything runs on the caller's thread. Every wait is a loop that pauses
/// for a fixed interval and pings the host, so the host never sees the
/// controller go silent.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `C` - Serial line implementation type
/// * `D` - Blocking delay implementation type
/// * `M` - Free memory probe type
/// * `L` - Door lock output pin type
/// * `S` - Door sensor input pin type
/// * `X` - Lighting strategy type
pub struct RoomController<'t, I, T, C, D, M, L, S, X>
where
    I: TimeInstant,
    T: TimeSource<I>,
    C: LineChannel,
    D: DelayNs,
    M: MemoryProbe,
    L: OutputPin,
    S: InputPin,
    X: LightOutput,
{
    pub(crate) link: HostLink<'t, I, T, C, D, M>,
    pub(crate) door: DoorActuator<L, S>,
    pub(crate) indicator: IndicatorController<X>,
    pub(crate) profile: InstallationProfile,
    pub(crate) state: RoomState,
}

impl<'t, I, T, C, D, M, L, S, X> RoomController<'t, I, T, C, D, M, L, S, X>
where
    I: TimeInstant,
    T: TimeSource<I>,
    C: LineChannel,
    D: DelayNs,
    M: MemoryProbe,
    L: OutputPin,
    S: InputPin,
    X: LightOutput,
{
    /// Creates a controller in the `Inactive` state with the door locked and
    /// the indicator off. No host traffic happens until the first
    /// [`refresh`](Self::refresh).
    pub fn new(
        link: HostLink<'t, I, T, C, D, M>,
        mut door: DoorActuator<L, S>,
        mut indicator: IndicatorController<X>,
        profile: InstallationProfile,
    ) -> Result<Self, RoomError> {
        door.lock()?;
        indicator.off();

        Ok(Self {
            link,
            door,
            indicator,
            profile,
            state: RoomState::default(),
        })
    }

    /// Runs one control cycle.
    ///
    /// Shakes hands with the host if needed, reads the status and reacts:
    ///
    /// - `Active`: reads and confirms the round parameters, marks the round active
    /// - `Activated`, `Win`, `Lose`, `Timeout`, `Emergency`: moves the room back to `Inactive`
    /// - anything else: turns the indicator off
    ///
    /// Whatever happens above, the cycle ends by unlocking the door if and
    /// only if the status is `Door`. A status poll refused by the host counts
    /// as `Inactive`; a refused follow-up request is returned as an error
    /// after the door has been brought in line.
    pub fn refresh(&mut self) -> Result<RoomStatus, RoomError> {
        self.state.active = false;
        self.link.wait_until_ready(self.profile.name)?;

        let base = self.profile.is_base_station();
        self.sign(false);

        let status = match self.link.fetch_status() {
            Ok(status) => status,
            Err(LinkError::Rejected) => {
                warn!("status poll rejected, treating room as inactive");
                RoomStatus::Inactive
            }
            Err(err) => return Err(err.into()),
        };
        if status != self.state.status {
            info!("room status {} -> {}", self.state.status, status);
        }
        self.state.status = status;

        let outcome = if status == RoomStatus::Active {
            self.begin_round()
        } else if status.is_settling() && base {
            self.request_status(RoomStatus::Inactive)
                .map(|()| self.light(IndicatorColor::Off))
        } else {
            self.light(IndicatorColor::Off);
            Ok(())
        };

        let unlock = base && self.state.status == RoomStatus::Door;
        self.door.set_unlocked(unlock)?;

        outcome.map(|()| self.state.status)
    }

    fn begin_round(&mut self) -> Result<(), RoomError> {
        let difficulty = self.link.fetch_difficulty()?;
        let player_count = self.link.fetch_player_count()?;
        let round = RoundParameters {
            difficulty,
            player_count,
        };
        self.link.confirm_round(round)?;

        info!("round assigned: {}", round);
        self.state.round = Some(round);
        self.state.active = true;
        Ok(())
    }

    /// Asks the host to move the room to `status` and records it once
    /// acknowledged. Retries until the host answers; fails only if the host
    /// refuses the controller.
    pub fn request_status(&mut self, status: RoomStatus) -> Result<(), RoomError> {
        self.link.set_status(status)?;
        info!("update room status: {}", status);
        self.state.status = status;
        Ok(())
    }

    /// Runs the emergency sequence if `input` is asserted.
    ///
    /// Frees the door, records `Emergency`, shows red, dwells, records `Lose`
    /// and dwells again, pinging the host throughout. The door stays unlocked
    /// until the next [`refresh`](Self::refresh). Returns whether the
    /// sequence ran. Satellites never run it.
    ///
    /// An asserted input before the handshake fails with
    /// [`LinkError::NotReady`] without touching the door or the lights.
    pub fn check_emergency<E: InputPin>(&mut self, input: &mut E) -> Result<bool, RoomError> {
        // An unreadable button is treated as released.
        let pressed = input.is_high().unwrap_or(false);
        if !pressed || !self.profile.is_base_station() {
            return Ok(false);
        }
        self.require_ready()?;

        warn!("emergency input asserted");
        self.state.active = false;
        self.door.unlock()?;
        self.request_status(RoomStatus::Emergency)?;
        self.indicator.show_status(RoomStatus::Emergency);
        self.hold(self.profile.timing.emergency_dwell_ms)?;
        self.request_status(RoomStatus::Lose)?;
        self.hold(self.profile.timing.emergency_dwell_ms)?;
        Ok(true)
    }

    /// Asks the host for the round length in seconds and caches it.
    pub fn round_duration(&mut self) -> Result<u16, RoomError> {
        let seconds = self.link.fetch_round_duration()?;
        self.state.round_duration = Some(seconds);
        Ok(seconds)
    }

    /// Pings the host at the settle cadence until `duration_ms` has passed.
    pub(crate) fn hold(&mut self, duration_ms: u32) -> Result<(), RoomError> {
        let deadline = Deadline::new(self.link.now(), u64::from(duration_ms));
        while !deadline.has_expired(self.link.now()) {
            self.link.ping()?;
            self.link.pause(self.profile.timing.settle_ping_ms);
        }
        Ok(())
    }

    /// Fails with [`LinkError::NotReady`] until the handshake has completed.
    pub(crate) fn require_ready(&self) -> Result<(), RoomError> {
        if self.link.is_ready() {
            Ok(())
        } else {
            Err(LinkError::NotReady.into())
        }
    }

    /// Shows `color` on a base station. Satellites leave the lights alone.
    pub(crate) fn light(&mut self, color: IndicatorColor) {
        if self.profile.is_base_station() {
            self.indicator.show(color);
        }
    }

    /// Switches the room sign on a base station.
    pub(crate) fn sign(&mut self, on: bool) {
        if self.profile.is_base_station() {
            self.indicator.set_sign(on);
        }
    }

    /// Returns the room state.
    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Returns the current room status.
    pub fn status(&self) -> RoomStatus {
        self.state.status
    }

    /// Returns true if the last cycle found an `Active` round.
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Difficulty of the most recent round.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.state.round.map(|r| r.difficulty)
    }

    /// Player count of the most recent round.
    pub fn player_count(&self) -> Option<u8> {
        self.state.round.map(|r| r.player_count)
    }

    /// Returns the installation profile.
    pub fn profile(&self) -> &InstallationProfile {
        &self.profile
    }

    /// Returns a reference to the door actuator.
    pub fn door(&self) -> &DoorActuator<L, S> {
        &self.door
    }

    /// Returns a reference to the indicator controller.
    pub fn indicator(&self) -> &IndicatorController<X> {
        &self.indicator
    }

    /// Returns a reference to the host link.
    pub fn link(&self) -> &HostLink<'t, I, T, C, D, M> {
        &self.link
    }
}
