//! Shared test infrastructure for room-controller integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use palette::Srgb;
use room_controller::{
    DoorActuator, DoorWiring, HostLink, IndicatorController, InstallationProfile, Line,
    LightOutput, LineChannel, MemoryProbe, PixelStrip, RgbLed, RoomController, RoomStatus,
    SolidLight, TimeDuration, TimeInstant, TimeSource,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing (milliseconds since start)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Clock and Delay
// ============================================================================

/// Mock clock; only moves when a [`MockDelay`] sleeps or a test advances it
pub struct MockClock {
    nanos: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            nanos: Cell::new(0),
        }
    }

    pub fn millis(&self) -> u64 {
        self.nanos.get() / 1_000_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.nanos.set(self.nanos.get() + ms * 1_000_000);
    }
}

impl TimeSource<TestInstant> for MockClock {
    fn now(&self) -> TestInstant {
        TestInstant(self.millis())
    }
}

/// Blocking delay that advances the mock clock instead of sleeping
pub struct MockDelay<'a>(pub &'a MockClock);

impl DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let clock = self.0;
        clock.nanos.set(clock.nanos.get() + u64::from(ns));
    }
}

// ============================================================================
// Scripted Host
// ============================================================================

/// Host side of the link. Answers every request from its fields, unless a
/// scripted reply is queued, and records everything the controller sends.
pub struct HostState {
    pub status: RoomStatus,
    pub difficulty: u8,
    pub players: u8,
    pub round_duration: u16,
    pub high_score: bool,
    pub accept_handshake: bool,
    /// Request kinds answered with the error token.
    pub reject: Vec<u8>,
    /// Replies used before falling back to the defaults, one per request.
    pub scripted: VecDeque<&'static str>,
    pub sent: Vec<String>,
    pending: VecDeque<String>,
}

impl HostState {
    pub fn new(status: RoomStatus) -> Self {
        Self {
            status,
            difficulty: 2,
            players: 3,
            round_duration: 600,
            high_score: false,
            accept_handshake: true,
            reject: Vec::new(),
            scripted: VecDeque::new(),
            sent: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Lines of the given request kind, in order.
    pub fn sent_of(&self, kind: u8) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|line| field(line, "type") == Some(u64::from(kind)))
            .map(|line| line.as_str())
            .collect()
    }

    pub fn count(&self, kind: u8) -> usize {
        self.sent_of(kind).len()
    }

    /// Status codes the controller asked for, in order.
    pub fn requested_statuses(&self) -> Vec<u64> {
        self.sent_of(4)
            .iter()
            .filter_map(|line| field(line, "st"))
            .collect()
    }

    fn answer(&mut self, kind: u8, line: &str) -> Option<String> {
        if let Some(reply) = self.scripted.pop_front() {
            return Some(reply.into());
        }
        if self.reject.contains(&kind) {
            return Some("E".into());
        }
        match kind {
            0 => self.accept_handshake.then(|| "OK".into()),
            1 => Some(format!(">{}", self.status.code())),
            2 => Some(format!(">{}", self.difficulty)),
            4 => {
                let code = field(line, "st")?;
                self.status = RoomStatus::from_code(code as u8)?;
                Some("OK".into())
            }
            5 => Some(format!(">{}", self.players)),
            6 => Some(format!(">{}", self.round_duration)),
            7 => Some(format!(">{}", self.high_score)),
            9 => Some("OK".into()),
            _ => None,
        }
    }
}

/// Extracts an unsigned integer field from an outbound record.
pub fn field(line: &str, key: &str) -> Option<u64> {
    let pattern = format!("\"{}\":", key);
    let start = line.find(&pattern)? + pattern.len();
    let digits: String = line[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Controller side of the link, backed by a shared [`HostState`]
pub struct MockChannel<'a>(pub &'a RefCell<HostState>);

impl LineChannel for MockChannel<'_> {
    fn write_line(&mut self, line: &str) {
        let mut host = self.0.borrow_mut();
        host.sent.push(line.into());
        let kind = field(line, "type").unwrap_or(u64::MAX) as u8;
        if let Some(reply) = host.answer(kind, line) {
            host.pending.push_back(reply);
        }
    }

    fn read_line(&mut self) -> Option<Line> {
        let reply = self.0.borrow_mut().pending.pop_front()?;
        let mut line = Line::new();
        line.push_str(&reply).ok()?;
        Some(line)
    }
}

pub struct MockMemory(pub u32);

impl MemoryProbe for MockMemory {
    fn free_memory(&self) -> u32 {
        self.0
    }
}

// ============================================================================
// Mock Pins
// ============================================================================

/// Output pin recording its level and how often it was driven high
pub struct MockOutput<'a> {
    pub level: &'a Cell<bool>,
    pub highs: &'a Cell<u32>,
}

impl ErrorType for MockOutput<'_> {
    type Error = Infallible;
}

impl OutputPin for MockOutput<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        self.highs.set(self.highs.get() + 1);
        Ok(())
    }
}

/// Input pin with a level set by the test
pub struct MockInput<'a>(pub &'a Cell<bool>);

impl ErrorType for MockInput<'_> {
    type Error = Infallible;
}

impl InputPin for MockInput<'_> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

/// When the door opens and closes, in mock clock milliseconds
pub struct DoorScript {
    pub opens_at: Cell<Option<u64>>,
    pub closes_at: Cell<Option<u64>>,
    pub reads: Cell<u32>,
    pub reads_while_locked: Cell<u32>,
}

impl DoorScript {
    pub fn new() -> Self {
        Self {
            opens_at: Cell::new(None),
            closes_at: Cell::new(None),
            reads: Cell::new(0),
            reads_while_locked: Cell::new(0),
        }
    }
}

/// Door sensor following a [`DoorScript`]. Reads high while the door is
/// closed, matching the default wiring.
pub struct DoorSensor<'a> {
    pub clock: &'a MockClock,
    pub script: &'a DoorScript,
    pub lock_level: &'a Cell<bool>,
}

impl DoorSensor<'_> {
    fn is_open(&self) -> bool {
        let now = self.clock.millis();
        let opened = self.script.opens_at.get().is_some_and(|t| now >= t);
        let closed_again = self.script.closes_at.get().is_some_and(|t| now >= t);
        opened && !closed_again
    }
}

impl ErrorType for DoorSensor<'_> {
    type Error = Infallible;
}

impl InputPin for DoorSensor<'_> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.script.reads.set(self.script.reads.get() + 1);
        if !self.lock_level.get() {
            self.script
                .reads_while_locked
                .set(self.script.reads_while_locked.get() + 1);
        }
        Ok(!self.is_open())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

// ============================================================================
// Mock Lights
// ============================================================================

/// Mock LED that records all color changes for testing
pub struct MockLed {
    current_color: Srgb,
    color_history: Vec<Srgb>,
}

impl MockLed {
    pub fn new() -> Self {
        Self {
            current_color: Srgb::new(0.0, 0.0, 0.0),
            color_history: Vec::new(),
        }
    }

    pub fn get_last_color(&self) -> Srgb {
        self.current_color
    }

    pub fn color_history(&self) -> &[Srgb] {
        &self.color_history
    }
}

impl RgbLed for MockLed {
    fn set_color(&mut self, color: Srgb) {
        self.current_color = color;
        self.color_history.push(color);
    }
}

/// Mock addressable strip
pub struct MockStrip {
    pub pixels: Vec<Srgb>,
    pub shows: u32,
}

impl MockStrip {
    pub fn new(len: usize) -> Self {
        Self {
            pixels: vec![Srgb::new(0.5, 0.5, 0.5); len],
            shows: 0,
        }
    }
}

impl PixelStrip for MockStrip {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Srgb) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn show(&mut self) {
        self.shows += 1;
    }
}

// ============================================================================
// Test Rig
// ============================================================================

pub type TestLink<'a> = HostLink<'a, TestInstant, MockClock, MockChannel<'a>, MockDelay<'a>, MockMemory>;

pub type TestRoom<'a, X = SolidLight<MockLed>> = RoomController<
    'a,
    TestInstant,
    MockClock,
    MockChannel<'a>,
    MockDelay<'a>,
    MockMemory,
    MockOutput<'a>,
    DoorSensor<'a>,
    X,
>;

/// Everything a room needs, owned by the test so it can be inspected and
/// changed while the controller holds references into it.
pub struct Rig {
    pub clock: MockClock,
    pub host: RefCell<HostState>,
    pub lock_level: Cell<bool>,
    pub lock_highs: Cell<u32>,
    pub door: DoorScript,
    pub emergency: Cell<bool>,
}

impl Rig {
    pub fn new(status: RoomStatus) -> Self {
        Self {
            clock: MockClock::new(),
            host: RefCell::new(HostState::new(status)),
            lock_level: Cell::new(false),
            lock_highs: Cell::new(0),
            door: DoorScript::new(),
            emergency: Cell::new(false),
        }
    }

    pub fn link(&self) -> TestLink<'_> {
        HostLink::new(
            MockChannel(&self.host),
            MockDelay(&self.clock),
            MockMemory(2048),
            &self.clock,
        )
    }

    pub fn room(&self) -> TestRoom<'_> {
        self.room_with(
            IndicatorController::new(SolidLight::new(MockLed::new())),
            InstallationProfile::new("TEST_ROOM"),
        )
    }

    pub fn room_with<X: LightOutput>(
        &self,
        indicator: IndicatorController<X>,
        profile: InstallationProfile,
    ) -> TestRoom<'_, X> {
        let door = DoorActuator::new(
            MockOutput {
                level: &self.lock_level,
                highs: &self.lock_highs,
            },
            DoorSensor {
                clock: &self.clock,
                script: &self.door,
                lock_level: &self.lock_level,
            },
            DoorWiring::default(),
        );
        RoomController::new(self.link(), door, indicator, profile).unwrap()
    }

    pub fn emergency_button(&self) -> MockInput<'_> {
        MockInput(&self.emergency)
    }

    /// Door opens `ms` milliseconds from now.
    pub fn open_door_after(&self, ms: u64) {
        self.door.opens_at.set(Some(self.clock.millis() + ms));
    }

    /// Door closes again `ms` milliseconds from now.
    pub fn close_door_after(&self, ms: u64) {
        self.door.closes_at.set(Some(self.clock.millis() + ms));
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Compare two colors with floating-point tolerance
pub fn colors_equal(a: Srgb, b: Srgb) -> bool {
    const EPSILON: f32 = 0.001;
    (a.red - b.red).abs() < EPSILON
        && (a.green - b.green).abs() < EPSILON
        && (a.blue - b.blue).abs() < EPSILON
}
