//! Round activation: wait for the team to come through the door.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::door::DoorState;
use crate::indicator::{IndicatorColor, LightOutput};
use crate::link::{LineChannel, MemoryProbe};
use crate::room::{RoomController, RoomError};
use crate::time::{Deadline, TimeInstant, TimeSource};
use crate::types::{DoorPolicy, RoomStatus};

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
    /// Starts the round once the door does what `policy` asks for.
    ///
    /// Shows the activating color and, unless the policy starts immediately,
    /// unlocks the door and watches the sensor, pinging the host between
    /// reads. All door waits share one deadline measured from this call.
    /// Satellites do not own the door or the lights and start at once.
    ///
    /// # Returns
    /// * `Ok(true)` - Door relocked and the room is `Activated`
    /// * `Ok(false)` - The door did not cooperate in time; the door is
    ///   relocked, the indicator is off and the room is back to `Inactive`
    /// * `Err` - The link is not ready, the host refused a request or the
    ///   lock could not be driven. Past the readiness check the door is
    ///   relocked and the indicator cleared before returning.
    pub fn activate(&mut self, policy: DoorPolicy) -> Result<bool, RoomError> {
        self.require_ready()?;

        let policy = if self.profile.is_base_station() {
            policy
        } else {
            DoorPolicy::StartImmediately
        };

        self.light(IndicatorColor::Cyan);
        self.sign(true);

        let deadline = Deadline::new(
            self.link.now(),
            u64::from(self.profile.timing.activation_timeout_ms),
        );

        match self.await_policy(policy, &deadline) {
            Ok(true) => {}
            Ok(false) => return self.abandon_activation(),
            Err(err) => return Err(self.release(err)),
        }

        self.door.lock()?;
        if let Err(err) = self.request_status(RoomStatus::Activated) {
            return Err(self.release(err));
        }
        self.state.active = true;
        Ok(true)
    }

    /// Unlocks the door and waits for the transitions `policy` needs.
    fn await_policy(&mut self, policy: DoorPolicy, deadline: &Deadline<I>) -> Result<bool, RoomError> {
        if !policy.waits_for_door() {
            return Ok(true);
        }

        self.door.unlock()?;
        info!("door unlocked");

        if !self.await_door(DoorState::Open, deadline)? {
            warn!("door timeout, never opened");
            return Ok(false);
        }
        info!("door opened");

        if policy == DoorPolicy::WaitForOpenThenClose {
            if !self.await_door(DoorState::Closed, deadline)? {
                warn!("door timeout, never closed");
                return Ok(false);
            }
            info!("door closed");
        }
        Ok(true)
    }

    /// Polls the sensor until it reads `target` or `deadline` expires.
    fn await_door(&mut self, target: DoorState, deadline: &Deadline<I>) -> Result<bool, RoomError> {
        loop {
            match self.door.state() {
                Ok(state) if state == target => return Ok(true),
                Ok(_) => {}
                Err(_) => debug!("door sensor read failed"),
            }

            self.link.pause(self.profile.timing.door_poll_ms);
            self.link.ping()?;

            if deadline.has_expired(self.link.now()) {
                return Ok(false);
            }
        }
    }

    /// Falls back to `Inactive` after a door timeout. The door is relocked and
    /// the indicator cleared even if the host refuses the status change.
    fn abandon_activation(&mut self) -> Result<bool, RoomError> {
        self.state.active = false;
        let requested = if self.profile.is_base_station() {
            self.request_status(RoomStatus::Inactive)
        } else {
            Ok(())
        };
        self.link.pause(self.profile.timing.relock_pause_ms);
        let relocked = self.door.lock();
        self.light(IndicatorColor::Off);

        requested?;
        relocked?;
        Ok(false)
    }

    /// Relocks the door and clears the indicator after a failed activation.
    /// `err` is returned as is; a lock failure here is only logged.
    fn release(&mut self, err: RoomError) -> RoomError {
        self.state.active = false;
        if self.door.lock().is_err() {
            warn!("door relock failed after activation error");
        }
        self.light(IndicatorColor::Off);
        err
    }
}
