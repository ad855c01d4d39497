//! Door lock output and door sensor input.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Physical position of the door, as reported by its sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoorState {
    Open,
    Closed,
}

/// Per-installation polarity of the door hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorWiring {
    /// Output level that energizes the lock actuator and frees the door.
    pub unlock_level: PinState,
    /// Sensor level read while the door stands open.
    pub open_level: PinState,
}

impl Default for DoorWiring {
    /// Active-high lock output; sensor pulled high while the magnet is closed.
    fn default() -> Self {
        Self {
            unlock_level: PinState::High,
            open_level: PinState::Low,
        }
    }
}

/// Errors reported by the door hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoorError {
    /// Driving the lock output failed.
    Lock,
    /// Reading the door sensor failed.
    Sensor,
}

impl core::fmt::Display for DoorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DoorError::Lock => write!(f, "failed to drive the door lock output"),
            DoorError::Sensor => write!(f, "failed to read the door sensor"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DoorError {}

/// Binary door lock plus door sensor.
///
/// The lock output is energized only while the door should be free: when
/// the room status is `Door`, during the activation wait and during an
/// emergency. Everything else keeps it de-energized.
pub struct DoorActuator<L: OutputPin, S: InputPin> {
    lock: L,
    sensor: S,
    wiring: DoorWiring,
    unlocked: bool,
}

impl<L: OutputPin, S: InputPin> DoorActuator<L, S> {
    /// Wraps the lock output and sensor input. The lock is not driven until
    /// the first [`lock`](Self::lock) or [`unlock`](Self::unlock).
    pub fn new(lock: L, sensor: S, wiring: DoorWiring) -> Self {
        Self {
            lock,
            sensor,
            wiring,
            unlocked: false,
        }
    }

    /// De-energizes the lock actuator.
    pub fn lock(&mut self) -> Result<(), DoorError> {
        self.lock
            .set_state(!self.wiring.unlock_level)
            .map_err(|_| DoorError::Lock)?;
        self.unlocked = false;
        Ok(())
    }

    /// Energizes the lock actuator.
    pub fn unlock(&mut self) -> Result<(), DoorError> {
        self.lock
            .set_state(self.wiring.unlock_level)
            .map_err(|_| DoorError::Lock)?;
        self.unlocked = true;
        Ok(())
    }

    /// Drives the lock to match `unlocked`.
    pub fn set_unlocked(&mut self, unlocked: bool) -> Result<(), DoorError> {
        if unlocked { self.unlock() } else { self.lock() }
    }

    /// Returns true while the lock output is energized.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Reads the door sensor.
    pub fn state(&mut self) -> Result<DoorState, DoorError> {
        let high = self.sensor.is_high().map_err(|_| DoorError::Sensor)?;
        let level = PinState::from(high);
        Ok(if level == self.wiring.open_level {
            DoorState::Open
        } else {
            DoorState::Closed
        })
    }
}
