//! Request/response driver for the host link.
//!
//! Provides [`HostLink`], which owns the serial line to the host and turns
//! the unreliable line exchange into blocking, typed requests. Also defines
//! the [`LineChannel`] and [`MemoryProbe`] traits for hardware abstraction.

use embedded_hal::delay::DelayNs;

use crate::protocol::{Expect, Line, Reply, Request, Telemetry};
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::{Difficulty, RoomStatus, RoundParameters, ScoreReport};

/// Trait for abstracting the line-oriented serial link to the host.
///
/// Implement this for your UART (or USB CDC, or a socket when simulating).
pub trait LineChannel {
    /// Sends one line. The implementation appends the line terminator.
    ///
    /// Handle any transport errors internally - this method cannot fail.
    fn write_line(&mut self, line: &str);

    /// Reads one line, without its terminator.
    ///
    /// Should give up after the channel's own read timeout and return `None`
    /// when nothing complete arrived. Over-long lines may be truncated.
    fn read_line(&mut self) -> Option<Line>;
}

/// Trait for reporting free memory in host telemetry.
pub trait MemoryProbe {
    /// Free bytes, as best the platform can tell.
    fn free_memory(&self) -> u32;
}

/// Probe for platforms that cannot measure free memory; always reports 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn free_memory(&self) -> u32 {
        0
    }
}

/// Errors that can occur during host link operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// The host answered with the error token. The link is no longer ready.
    Rejected,
    /// An exchange was attempted before the handshake completed.
    NotReady,
    /// A record did not fit the outbound buffer.
    Oversized,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinkError::Rejected => write!(f, "host rejected the request"),
            LinkError::NotReady => write!(f, "host link handshake has not completed"),
            LinkError::Oversized => write!(f, "record exceeds outbound buffer capacity"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LinkError {}

/// Pacing of the host link, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkTiming {
    /// Wait between sending a query and reading its reply.
    pub query_interval_ms: u32,
    /// Quiet time before a command, and wait between sending it and reading.
    pub command_interval_ms: u32,
    /// Wait between identity announcements during the handshake.
    pub handshake_interval_ms: u32,
    /// Pause after each liveness ping.
    pub ping_pause_ms: u32,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            query_interval_ms: 100,
            command_interval_ms: 500,
            handshake_interval_ms: 500,
            ping_pause_ms: 100,
        }
    }
}

/// Blocking request/response driver for the host link.
///
/// Ordinary non-responses are retried forever at a fixed cadence; the host is
/// expected to answer eventually. The error token is the only way an exchange
/// fails, and it also drops the link out of the ready state until the next
/// [`wait_until_ready`](Self::wait_until_ready).
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `C` - Serial line implementation type
/// * `D` - Blocking delay implementation type
/// * `M` - Free memory probe type
pub struct HostLink<'t, I, T, C, D, M>
where
    I: TimeInstant,
    T: TimeSource<I>,
    C: LineChannel,
    D: DelayNs,
    M: MemoryProbe,
{
    channel: C,
    delay: D,
    memory: M,
    time_source: &'t T,
    boot: I,
    timing: LinkTiming,
    ready: bool,
}

impl<'t, I, T, C, D, M> HostLink<'t, I, T, C, D, M>
where
    I: TimeInstant,
    T: TimeSource<I>,
    C: LineChannel,
    D: DelayNs,
    M: MemoryProbe,
{
    /// Creates a link that has not yet shaken hands with the host.
    ///
    /// Uptime in telemetry is measured from this call.
    pub fn new(channel: C, delay: D, memory: M, time_source: &'t T) -> Self {
        Self {
            channel,
            delay,
            memory,
            time_source,
            boot: time_source.now(),
            timing: LinkTiming::default(),
            ready: false,
        }
    }

    /// Replaces the default pacing.
    pub fn with_timing(mut self, timing: LinkTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Returns true once the host has acknowledged the handshake.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Current time from the link's time source.
    pub fn now(&self) -> I {
        self.time_source.now()
    }

    /// Blocks for `ms` milliseconds.
    pub fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Health figures as they stand right now.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            free_memory: self.memory.free_memory(),
            uptime_ms: self.time_source.now().duration_since(self.boot).as_millis(),
        }
    }

    /// Announces `name` until the host acknowledges. Returns at once if the
    /// link is already ready.
    pub fn wait_until_ready(&mut self, name: &str) -> Result<(), LinkError> {
        if self.ready {
            return Ok(());
        }

        let announce = Request::Announce { name }
            .encode()
            .map_err(|_| LinkError::Oversized)?;

        while !self.ready {
            self.channel.write_line(&announce);
            self.delay.delay_ms(self.timing.handshake_interval_ms);
            if let Some(line) = self.channel.read_line() {
                self.ready = Reply::parse(&line) == Reply::Ack;
            }
        }

        info!("host link ready");
        Ok(())
    }

    /// Sends `build()` until `accept` takes the reply.
    ///
    /// The request is rebuilt for every attempt so piggy-backed telemetry is
    /// fresh each time. Replies that `accept` turns down, including values
    /// that fail to parse, count as no reply. The error token ends the
    /// exchange with [`LinkError::Rejected`].
    pub fn exchange<R>(
        &mut self,
        mut build: impl FnMut(&Self) -> Request<'static>,
        mut accept: impl FnMut(Reply<'_>) -> Option<R>,
    ) -> Result<R, LinkError> {
        if !self.ready {
            return Err(LinkError::NotReady);
        }

        let first = build(self);
        let interval = if first.is_command() {
            self.delay.delay_ms(self.timing.command_interval_ms);
            self.timing.command_interval_ms
        } else {
            self.timing.query_interval_ms
        };

        let mut request = first;
        let mut attempts: u32 = 0;
        loop {
            let record = request.encode().map_err(|_| LinkError::Oversized)?;
            self.channel.write_line(&record);
            self.delay.delay_ms(interval);
            attempts = attempts.saturating_add(1);

            if let Some(line) = self.channel.read_line() {
                match Reply::parse(&line) {
                    Reply::Error => {
                        warn!("host rejected request type {}", request.kind());
                        self.ready = false;
                        return Err(LinkError::Rejected);
                    }
                    reply => {
                        if let Some(value) = accept(reply) {
                            if attempts > 1 {
                                debug!(
                                    "request type {} answered after {} attempts",
                                    request.kind(),
                                    attempts
                                );
                            }
                            return Ok(value);
                        }
                    }
                }
            }

            request = build(self);
        }
    }

    fn acknowledge(&mut self, request: Request<'static>) -> Result<(), LinkError> {
        debug_assert_eq!(request.expect(), Expect::Ack);
        self.exchange(|_| request, |reply| (reply == Reply::Ack).then_some(()))
    }

    /// Polls the room status, reporting health with every attempt.
    pub fn fetch_status(&mut self) -> Result<RoomStatus, LinkError> {
        self.exchange(
            |link| Request::Status(link.telemetry()),
            |reply| reply.number::<u8>().and_then(RoomStatus::from_code),
        )
    }

    /// Asks for the difficulty of the assigned round.
    pub fn fetch_difficulty(&mut self) -> Result<Difficulty, LinkError> {
        self.exchange(
            |_| Request::Difficulty,
            |reply| reply.number::<u8>().and_then(Difficulty::from_code),
        )
    }

    /// Asks for the number of players in the assigned round.
    pub fn fetch_player_count(&mut self) -> Result<u8, LinkError> {
        self.exchange(
            |_| Request::PlayerCount,
            |reply| reply.number::<u8>().filter(|&n| n > 0),
        )
    }

    /// Asks for the round length in seconds.
    pub fn fetch_round_duration(&mut self) -> Result<u16, LinkError> {
        self.exchange(|_| Request::RoundDuration, |reply| reply.number::<u16>())
    }

    /// Asks the host to move the room to `status`.
    pub fn set_status(&mut self, status: RoomStatus) -> Result<(), LinkError> {
        self.acknowledge(Request::SetStatus(status))
    }

    /// Echoes the round parameters back so the host can verify them.
    pub fn confirm_round(&mut self, round: RoundParameters) -> Result<(), LinkError> {
        self.acknowledge(Request::Integrity(round))
    }

    /// Posts a score. Returns true when the host recorded a new high score.
    pub fn post_score(&mut self, report: ScoreReport) -> Result<bool, LinkError> {
        self.exchange(|_| Request::Score(report), |reply| reply.flag())
    }

    /// Sends a liveness ping and pauses briefly. No reply is expected.
    pub fn ping(&mut self) -> Result<(), LinkError> {
        if !self.ready {
            return Err(LinkError::NotReady);
        }
        let record = Request::Ping(self.telemetry())
            .encode()
            .map_err(|_| LinkError::Oversized)?;
        self.channel.write_line(&record);
        self.delay.delay_ms(self.timing.ping_pause_ms);
        Ok(())
    }

    /// Returns a reference to the line channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }
}
