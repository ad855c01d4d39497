//! Host link wire format.
//!
//! Outbound records are single JSON-style lines tagged with a request type.
//! Inbound lines are one of:
//!
//! - `OK`: acknowledgment
//! - `E`: the host refuses the controller (authoritative error)
//! - `>value`: a value, with the `>` marker stripped before parsing
//!
//! Anything else is noise from the link and is ignored by the caller.

use core::fmt::Write;

use heapless::String;

use crate::types::{RoomStatus, RoundParameters, ScoreReport};

/// Capacity of one outbound record.
pub const OUTBOUND_CAPACITY: usize = 128;

/// Capacity of one inbound line.
pub const LINE_CAPACITY: usize = 64;

/// One encoded outbound record, without the line terminator.
pub type Outbound = String<OUTBOUND_CAPACITY>;

/// One inbound line, without the line terminator.
pub type Line = String<LINE_CAPACITY>;

const ACK: &str = "OK";
const ERROR: &str = "E";
const VALUE_MARKER: char = '>';

/// Health figures piggy-backed on status polls and liveness pings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub free_memory: u32,
    pub uptime_ms: u64,
}

/// Reply shape a request waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Expect {
    /// Literal `OK`.
    Ack,
    /// A `>`-prefixed value.
    Value,
    /// Fire and forget.
    Nothing,
}

/// Records the controller sends to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    Announce { name: &'a str },
    Status(Telemetry),
    Difficulty,
    SetStatus(RoomStatus),
    PlayerCount,
    RoundDuration,
    Score(ScoreReport),
    Ping(Telemetry),
    Integrity(RoundParameters),
}

impl Request<'_> {
    /// Request type tag used on the wire.
    pub const fn kind(&self) -> u8 {
        match self {
            Request::Announce { .. } => 0,
            Request::Status(_) => 1,
            Request::Difficulty => 2,
            Request::SetStatus(_) => 4,
            Request::PlayerCount => 5,
            Request::RoundDuration => 6,
            Request::Score(_) => 7,
            Request::Ping(_) => 8,
            Request::Integrity(_) => 9,
        }
    }

    /// Reply shape this request is answered with.
    pub const fn expect(&self) -> Expect {
        match self {
            Request::Announce { .. }
            | Request::SetStatus(_)
            | Request::Integrity(_) => Expect::Ack,
            Request::Status(_)
            | Request::Difficulty
            | Request::PlayerCount
            | Request::RoundDuration
            | Request::Score(_) => Expect::Value,
            Request::Ping(_) => Expect::Nothing,
        }
    }

    /// Commands change host state and are paced at the slower command cadence.
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Request::SetStatus(_) | Request::Score(_) | Request::Integrity(_)
        )
    }

    /// Encodes the record. Fails only if it does not fit [`OUTBOUND_CAPACITY`].
    pub fn encode(&self) -> Result<Outbound, core::fmt::Error> {
        let mut out = Outbound::new();
        let kind = self.kind();
        match self {
            Request::Announce { name } => {
                write!(out, "{{\"type\":{},\"name\":\"{}\"}}", kind, name)?
            }
            Request::Status(t) | Request::Ping(t) => write!(
                out,
                "{{\"type\":{},\"mem\":{},\"rt\":{}}}",
                kind, t.free_memory, t.uptime_ms
            )?,
            Request::SetStatus(status) => {
                write!(out, "{{\"type\":{},\"st\":{}}}", kind, status.code())?
            }
            Request::Score(report) => write!(
                out,
                "{{\"type\":{},\"sc\":{},\"t\":{},\"b\":{},\"tr\":{}}}",
                kind,
                report.score,
                report.target,
                report.bonus.unwrap_or(0),
                report.time_remaining
            )?,
            Request::Integrity(round) => write!(
                out,
                "{{\"type\":{},\"dif\":{},\"nop\":{}}}",
                kind,
                round.difficulty.code(),
                round.player_count
            )?,
            Request::Difficulty | Request::PlayerCount | Request::RoundDuration => {
                write!(out, "{{\"type\":{}}}", kind)?
            }
        }
        Ok(out)
    }
}

/// A classified inbound line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    Ack,
    Error,
    Value(&'a str),
    /// Empty line, read timeout filler or anything unrecognized.
    Noise,
}

impl<'a> Reply<'a> {
    /// Classifies one line. Surrounding whitespace (including `\r`) is ignored.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line == ACK {
            Reply::Ack
        } else if line == ERROR {
            Reply::Error
        } else if let Some(value) = line.strip_prefix(VALUE_MARKER) {
            Reply::Value(value.trim())
        } else {
            Reply::Noise
        }
    }

    /// Parses a value reply as a number.
    pub fn number<N: core::str::FromStr>(self) -> Option<N> {
        match self {
            Reply::Value(v) => v.parse().ok(),
            _ => None,
        }
    }

    /// Parses a value reply as a boolean. Only `true` counts as true.
    pub fn flag(self) -> Option<bool> {
        match self {
            Reply::Value(v) => Some(v == "true"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;
    extern crate std;

    #[test]
    fn encodes_status_poll_with_health() {
        let request = Request::Status(Telemetry {
            free_memory: 1234,
            uptime_ms: 56_789,
        });
        assert_eq!(
            request.encode().unwrap().as_str(),
            "{\"type\":1,\"mem\":1234,\"rt\":56789}"
        );
    }

    #[test]
    fn encodes_score_without_bonus_as_zero() {
        let request = Request::Score(ScoreReport::new(420, 17));
        assert_eq!(
            request.encode().unwrap().as_str(),
            "{\"type\":7,\"sc\":420,\"t\":0,\"b\":0,\"tr\":17}"
        );
    }

    #[test]
    fn encodes_integrity_echo() {
        let request = Request::Integrity(RoundParameters {
            difficulty: Difficulty::Hard,
            player_count: 4,
        });
        assert_eq!(
            request.encode().unwrap().as_str(),
            "{\"type\":9,\"dif\":3,\"nop\":4}"
        );
    }

    #[test]
    fn encodes_bare_queries() {
        assert_eq!(Request::Difficulty.encode().unwrap().as_str(), "{\"type\":2}");
        assert_eq!(Request::PlayerCount.encode().unwrap().as_str(), "{\"type\":5}");
        assert_eq!(Request::RoundDuration.encode().unwrap().as_str(), "{\"type\":6}");
    }

    #[test]
    fn oversized_announce_fails_to_encode() {
        let name = "X".repeat(OUTBOUND_CAPACITY);
        assert!(Request::Announce { name: &name }.encode().is_err());
    }

    #[test]
    fn classifies_inbound_lines() {
        assert_eq!(Reply::parse("OK"), Reply::Ack);
        assert_eq!(Reply::parse("OK\r"), Reply::Ack);
        assert_eq!(Reply::parse("E"), Reply::Error);
        assert_eq!(Reply::parse(">6"), Reply::Value("6"));
        assert_eq!(Reply::parse(""), Reply::Noise);
        assert_eq!(Reply::parse("OKAY"), Reply::Noise);
        assert_eq!(Reply::parse("6"), Reply::Noise);
    }

    #[test]
    fn parses_values() {
        assert_eq!(Reply::parse(">42").number::<u8>(), Some(42));
        assert_eq!(Reply::parse(">x").number::<u8>(), None);
        assert_eq!(Reply::parse("OK").number::<u8>(), None);
        assert_eq!(Reply::parse(">true").flag(), Some(true));
        assert_eq!(Reply::parse(">false").flag(), Some(false));
        assert_eq!(Reply::parse(">1").flag(), Some(false));
    }

    #[test]
    fn commands_and_expectations() {
        assert!(Request::SetStatus(RoomStatus::Inactive).is_command());
        assert!(!Request::Difficulty.is_command());
        assert_eq!(Request::Announce { name: "R" }.expect(), Expect::Ack);
        assert_eq!(Request::Difficulty.expect(), Expect::Value);
        assert_eq!(
            Request::Ping(Telemetry { free_memory: 0, uptime_ms: 0 }).expect(),
            Expect::Nothing
        );
    }
}
