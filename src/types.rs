//! Core room types shared by the host link and the state machine.

/// Authoritative room status, as negotiated with the host.
///
/// The discriminants are the status codes used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoomStatus {
    /// A team has been assigned; round parameters are available.
    Active = 0,
    /// The round is running.
    Activated = 1,
    /// The round ended in a win.
    Win = 2,
    /// The round ended in a loss.
    Lose = 3,
    /// The round ran out of time.
    Timeout = 4,
    /// The emergency input was asserted.
    Emergency = 5,
    /// Idle, waiting for the host to assign a team.
    Inactive = 6,
    /// The host asked for the door to be held unlocked.
    Door = 7,
    /// The room is out of service.
    Maintenance = 8,
}

impl RoomStatus {
    /// Wire code for this status.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses a wire code, returning `None` for unknown codes.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RoomStatus::Active),
            1 => Some(RoomStatus::Activated),
            2 => Some(RoomStatus::Win),
            3 => Some(RoomStatus::Lose),
            4 => Some(RoomStatus::Timeout),
            5 => Some(RoomStatus::Emergency),
            6 => Some(RoomStatus::Inactive),
            7 => Some(RoomStatus::Door),
            8 => Some(RoomStatus::Maintenance),
            _ => None,
        }
    }

    /// Statuses that the controller winds back to `Inactive` on its own.
    pub const fn is_settling(self) -> bool {
        matches!(
            self,
            RoomStatus::Activated
                | RoomStatus::Win
                | RoomStatus::Lose
                | RoomStatus::Timeout
                | RoomStatus::Emergency
        )
    }
}

/// Difficulty selected by the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Difficulty {
    Easy = 1,
    Medium = 2,
    Hard = 3,
    Junior = 4,
}

impl Difficulty {
    /// Wire code for this difficulty.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses a wire code, returning `None` for unknown codes.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            4 => Some(Difficulty::Junior),
            _ => None,
        }
    }
}

/// Parameters of the round the host assigned when the room became `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoundParameters {
    pub difficulty: Difficulty,
    pub player_count: u8,
}

/// How activation waits on the physical door before the round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoorPolicy {
    /// Start without touching the door.
    StartImmediately,
    /// Unlock and wait for the door to open.
    WaitForOpen,
    /// Unlock, wait for the door to open, then wait for it to close again.
    WaitForOpenThenClose,
}

impl DoorPolicy {
    /// Returns true when the door is unlocked and watched during activation.
    pub const fn waits_for_door(self) -> bool {
        !matches!(self, DoorPolicy::StartImmediately)
    }
}

impl TryFrom<u8> for DoorPolicy {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DoorPolicy::StartImmediately),
            1 => Ok(DoorPolicy::WaitForOpen),
            2 => Ok(DoorPolicy::WaitForOpenThenClose),
            other => Err(other),
        }
    }
}

/// Final result of a round, as reported by the game logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Win,
    Lose,
    Timeout,
}

impl Outcome {
    /// Status recorded with the host for this outcome.
    ///
    /// A win whose report carries a bonus of zero is recorded as a timeout.
    pub fn settled_status(self, report: Option<&ScoreReport>) -> RoomStatus {
        match self {
            Outcome::Win if report.is_some_and(|r| r.bonus == Some(0)) => RoomStatus::Timeout,
            Outcome::Win => RoomStatus::Win,
            Outcome::Lose => RoomStatus::Lose,
            Outcome::Timeout => RoomStatus::Timeout,
        }
    }
}

/// Score posted to the host at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScoreReport {
    pub score: u32,
    pub target: u32,
    /// `None` for rounds without a bonus; sent as 0.
    pub bonus: Option<u32>,
    pub time_remaining: u32,
}

impl ScoreReport {
    /// Score with remaining time only (no target, no bonus).
    pub const fn new(score: u32, time_remaining: u32) -> Self {
        Self {
            score,
            target: 0,
            bonus: None,
            time_remaining,
        }
    }

    /// Score against a target with a bonus.
    pub const fn with_target(score: u32, target: u32, bonus: u32, time_remaining: u32) -> Self {
        Self {
            score,
            target,
            bonus: Some(bonus),
            time_remaining,
        }
    }
}
