//! Interrupt-shared watchdog
//!
//! Edge and overflow handlers and the control loop all touch the same
//! watchdog. Each access runs inside a critical section, which is short:
//! the handlers only store a timestamp or flip the state.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::watchdog::{
    PulseWatchdog, Reading, Snapshot, WatchdogConfig, WatchdogState, WatchdogStats,
};
use crate::types::{CaptureTimestamp, Edge, PulseMeasurement};

/// [`PulseWatchdog`] behind a critical-section mutex, usable from a `static`
pub struct SharedWatchdog {
    inner: Mutex<CriticalSectionRawMutex, RefCell<PulseWatchdog>>,
}

impl SharedWatchdog {
    /// Create an idle shared watchdog
    #[must_use]
    pub const fn new(config: WatchdogConfig) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(PulseWatchdog::new(config))),
        }
    }

    /// Edge notification (interrupt context)
    pub fn on_edge(&self, edge: Edge, at: CaptureTimestamp) -> Option<PulseMeasurement> {
        self.inner.lock(|wd| wd.borrow_mut().on_edge(edge, at))
    }

    /// Overflow notification (interrupt context)
    pub fn on_overflow(&self, at: CaptureTimestamp) -> bool {
        self.inner.lock(|wd| wd.borrow_mut().on_overflow(at))
    }

    /// Current reading (main loop)
    #[must_use]
    pub fn poll(&self) -> Reading {
        self.inner.lock(|wd| wd.borrow().poll())
    }

    /// Current reading with its measurement count, taken atomically
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock(|wd| wd.borrow().snapshot())
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> WatchdogState {
        self.inner.lock(|wd| wd.borrow().state())
    }

    /// Event counters
    #[must_use]
    pub fn stats(&self) -> WatchdogStats {
        self.inner.lock(|wd| wd.borrow().stats())
    }

    /// Replace the configuration and return to idle
    pub fn reconfigure(&self, config: WatchdogConfig) {
        self.inner.lock(|wd| wd.borrow_mut().reconfigure(config));
    }
}

impl Default for SharedWatchdog {
    fn default() -> Self {
        Self::new(WatchdogConfig::DEFAULT)
    }
}
