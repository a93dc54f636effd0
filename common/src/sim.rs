//! In-memory GPIO backend.
//!
//! Used by the controller when it runs without board support and by tests.
//! Every [`SimPin`] records its level changes against a shared
//! [`SimClock`], which only moves when a [`SimDelay`] waits on it, so pulse
//! timing can be asserted exactly.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{Error as DigitalError, ErrorKind, ErrorType, OutputPin},
};
use tracing::debug;

use crate::types::Level;

#[derive(Debug, Clone, Default)]
pub struct SimClock {
    elapsed_ns: Arc<AtomicU64>,
}

impl SimClock {
    pub fn now_ms(&self) -> u64 {
        self.elapsed_ns.load(Ordering::SeqCst) / 1_000_000
    }

    pub fn advance(&self, duration: Duration) {
        let ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_ns.fetch_add(ns, Ordering::SeqCst);
    }
}

/// Advances a [`SimClock`]. A realtime delay also sleeps the calling thread.
#[derive(Debug, Clone)]
pub struct SimDelay {
    clock: SimClock,
    realtime: bool,
}

impl SimDelay {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            realtime: false,
        }
    }

    pub fn realtime(clock: SimClock) -> Self {
        Self {
            clock,
            realtime: true,
        }
    }

    fn wait(&self, duration: Duration) {
        self.clock.advance(duration);
        if self.realtime {
            thread::sleep(duration);
        }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.wait(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wait(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl DigitalError for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct SimPinState {
    level: Option<Level>,
    history: Vec<(u64, Level)>,
}

/// Cloning a `SimPin` yields another handle to the same line.
#[derive(Debug, Clone)]
pub struct SimPin {
    name: &'static str,
    clock: SimClock,
    state: Arc<Mutex<SimPinState>>,
    faulty: Arc<AtomicBool>,
}

impl SimPin {
    pub fn new(name: &'static str, clock: SimClock) -> Self {
        Self {
            name,
            clock,
            state: Arc::new(Mutex::new(SimPinState::default())),
            faulty: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `None` until the line is first driven.
    pub fn level(&self) -> Option<Level> {
        self.lock().level
    }

    pub fn is_high(&self) -> bool {
        self.level() == Some(Level::High)
    }

    /// Level changes as `(virtual ms, level)`; repeated writes of the same
    /// level are not recorded.
    pub fn history(&self) -> Vec<(u64, Level)> {
        self.lock().history.clone()
    }

    /// While set, every write fails and leaves the line untouched.
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimPinState> {
        // A panic while holding this lock cannot leave the state half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&mut self, level: Level) -> Result<(), SimPinError> {
        if self.faulty.load(Ordering::SeqCst) {
            return Err(SimPinError);
        }
        let now_ms = self.clock.now_ms();
        let mut state = self.lock();
        if state.level != Some(level) {
            debug!("sim {} -> {:?} at {now_ms}ms", self.name, level);
            state.history.push((now_ms, level));
        }
        state.level = Some(level);
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinError;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(Level::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(Level::High)
    }
}
