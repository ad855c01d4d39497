//! End-of-round reporting and the settle period that follows it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::indicator::{IndicatorColor, LightOutput};
use crate::link::{LineChannel, MemoryProbe};
use crate::room::{RoomController, RoomError};
use crate::time::{TimeInstant, TimeSource};
use crate::types::{Outcome, RoomStatus, ScoreReport};

/// What a settled round left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settlement {
    /// Status recorded with the host for the round.
    pub status: RoomStatus,
    /// True if the host reported a new high score.
    pub high_score: bool,
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
    /// Reports how the round ended, then settles the room back to `Inactive`.
    ///
    /// Shows the outcome color, posts `report` if there is one, records the
    /// outcome status, holds for the settle period while pinging the host,
    /// records `Inactive` and turns the indicator off.
    ///
    /// A win whose report carries a bonus of zero is recorded (and shown) as
    /// a timeout. If the host refuses any request, the indicator is turned
    /// off before the error is returned. Before the handshake this fails with
    /// `NotReady` and does nothing.
    ///
    /// Satellites post the score and record the outcome but leave the lights
    /// and the return to `Inactive` to the base station.
    pub fn report_and_settle(
        &mut self,
        outcome: Outcome,
        report: Option<ScoreReport>,
    ) -> Result<Settlement, RoomError> {
        self.require_ready()?;

        let result = self.settle(outcome, report);
        if result.is_err() {
            self.light(IndicatorColor::Off);
        }
        result
    }

    fn settle(
        &mut self,
        outcome: Outcome,
        report: Option<ScoreReport>,
    ) -> Result<Settlement, RoomError> {
        let status = outcome.settled_status(report.as_ref());
        self.light(IndicatorColor::for_status(status));

        let high_score = match report {
            Some(report) => {
                info!("post score: {}", report.score);
                let high_score = self.link.post_score(report)?;
                if high_score {
                    info!("new high score");
                }
                high_score
            }
            None => false,
        };

        self.request_status(status)?;
        self.state.active = false;
        self.hold(self.profile.timing.settle_ms)?;
        if self.profile.is_base_station() {
            self.request_status(RoomStatus::Inactive)?;
            self.light(IndicatorColor::Off);
        }

        Ok(Settlement { status, high_score })
    }

    /// Ends the round as a win, posting `report` if given.
    pub fn finish_win(&mut self, report: Option<ScoreReport>) -> Result<Settlement, RoomError> {
        self.report_and_settle(Outcome::Win, report)
    }

    /// Ends the round as a loss. With a remaining time, a zero score is posted.
    pub fn finish_lose(&mut self, time_remaining: Option<u32>) -> Result<Settlement, RoomError> {
        let report = time_remaining.map(|t| ScoreReport::new(0, t));
        self.report_and_settle(Outcome::Lose, report)
    }

    /// Ends the round as a timeout and posts a zero score.
    pub fn finish_timeout(&mut self) -> Result<Settlement, RoomError> {
        self.report_and_settle(Outcome::Timeout, Some(ScoreReport::new(0, 0)))
    }
}
