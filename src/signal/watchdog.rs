//! Pulse Watchdog
//!
//! Reconstructs the width of each interval of an external pulse signal
//! from edge timestamps taken on a free-running 8-bit counter, and reports
//! loss of signal once the counter shows that the loss timeout has passed
//! without an edge.
//!
//! ```text
//!            edge                 opposite edge
//!   Idle ───────────► Armed ───────────────────► Present ──┐
//!                       ▲                           │  ▲    │ edge
//!                       │ edge                      │  └────┘
//!                       │                  timeout  │
//!                      Lost ◄───────────────────────┘
//!                       ▲          timeout
//!                       └──────────────────────── Armed
//! ```
//!
//! An interval that reaches the timeout (its closing edge was handled
//! before the overflow that would have declared loss) is discarded and the
//! watchdog drops back to Armed.
//!
//! Edge and overflow notifications are expected from interrupt context.
//! The watchdog itself is a plain value; see [`super::shared`] for the
//! critical-section wrapper the main loop and the handlers share.

use super::timer::TimerConfig;
use super::ConfigError;
use crate::types::{CaptureTimestamp, Edge, PulseMeasurement};

/// Watchdog state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WatchdogState {
    /// No edge seen since start or reset
    #[default]
    Idle,
    /// One edge recorded, waiting for the edge that completes an interval
    ArmedAwaitingEdge,
    /// Intervals are being measured
    SignalPresent,
    /// Timeout elapsed with no edge
    SignalLost,
}

impl WatchdogState {
    /// Check if the watchdog holds an edge timestamp
    #[must_use]
    pub const fn is_tracking(self) -> bool {
        matches!(self, Self::ArmedAwaitingEdge | Self::SignalPresent)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for WatchdogState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::ArmedAwaitingEdge => defmt::write!(f, "ARMED"),
            Self::SignalPresent => defmt::write!(f, "PRESENT"),
            Self::SignalLost => defmt::write!(f, "LOST"),
        }
    }
}

/// What the main loop sees when it polls the watchdog
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reading {
    /// No interval measured yet (idle, or re-armed after a loss)
    Waiting,
    /// Most recent interval
    Measurement(PulseMeasurement),
    /// Signal lost; the motor should be stopped
    Lost,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Reading {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Waiting => defmt::write!(f, "Waiting"),
            Self::Measurement(m) => defmt::write!(f, "Measurement({})", m),
            Self::Lost => defmt::write!(f, "Lost"),
        }
    }
}

/// A reading tagged with the number of measurements taken so far
///
/// Two snapshots carrying the same `sequence` hold the same measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Reading at the time of the snapshot
    pub reading: Reading,
    /// Measurement count (wrapping)
    pub sequence: u32,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Snapshot {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "#{} {}", self.sequence, self.reading);
    }
}

/// Loss timeout configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Ticks without an edge before the signal counts as lost
    timeout_ticks: u16,
}

impl WatchdogConfig {
    /// Loss after one full counter period without an edge
    pub const DEFAULT: Self = Self {
        timeout_ticks: CaptureTimestamp::PERIOD_TICKS,
    };

    /// Create from a timeout in counter ticks
    ///
    /// Loss is only evaluated on overflow notifications, so a timeout
    /// shorter than one period still takes up to one period to fire.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TimeoutTooShort`] for a zero timeout.
    pub const fn from_ticks(timeout_ticks: u16) -> Result<Self, ConfigError> {
        if timeout_ticks == 0 {
            return Err(ConfigError::TimeoutTooShort);
        }
        Ok(Self { timeout_ticks })
    }

    /// Create from a timeout in microseconds
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TimeoutTooShort`] unless the timeout is
    /// strictly longer than `max_pulse_us` (and at least one tick), and
    /// [`ConfigError::TimeoutTooLong`] if it exceeds the 16-bit tick range.
    pub fn from_timeout_us(
        timeout_us: u32,
        max_pulse_us: u32,
        timer: &TimerConfig,
    ) -> Result<Self, ConfigError> {
        if timeout_us <= max_pulse_us {
            return Err(ConfigError::TimeoutTooShort);
        }
        let ticks = u16::try_from(timer.us_to_ticks(timeout_us))
            .map_err(|_| ConfigError::TimeoutTooLong)?;
        Self::from_ticks(ticks)
    }

    /// Timeout in counter ticks
    #[must_use]
    pub const fn timeout_ticks(&self) -> u16 {
        self.timeout_ticks
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Event counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchdogStats {
    /// Intervals measured
    pub measurements: u32,
    /// Transitions into [`WatchdogState::SignalLost`]
    pub losses: u32,
    /// Intervals discarded for reaching the timeout
    pub rejected: u32,
    /// Edges with the same polarity as the previous one
    pub polarity_errors: u32,
}

impl WatchdogStats {
    const fn new() -> Self {
        Self {
            measurements: 0,
            losses: 0,
            rejected: 0,
            polarity_errors: 0,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for WatchdogStats {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "meas={} lost={} rej={} pol={}",
            self.measurements,
            self.losses,
            self.rejected,
            self.polarity_errors
        );
    }
}

/// Edge-timing watchdog for a pulse input
#[derive(Clone, Debug)]
pub struct PulseWatchdog {
    config: WatchdogConfig,
    state: WatchdogState,
    /// Edge that started the current interval
    armed_edge: Edge,
    /// Counter sample at that edge
    armed_at: CaptureTimestamp,
    /// Overflow notifications since `armed_at`
    overflows: u16,
    /// A wrap already accounted for by an edge whose notification is still
    /// outstanding
    wrap_pending: bool,
    latest: Option<PulseMeasurement>,
    stats: WatchdogStats,
}

impl PulseWatchdog {
    /// Create an idle watchdog
    #[must_use]
    pub const fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            state: WatchdogState::Idle,
            armed_edge: Edge::Rising,
            armed_at: CaptureTimestamp::from_raw(0),
            overflows: 0,
            wrap_pending: false,
            latest: None,
            stats: WatchdogStats::new(),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> WatchdogState {
        self.state
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> WatchdogConfig {
        self.config
    }

    /// Event counters
    #[must_use]
    pub const fn stats(&self) -> WatchdogStats {
        self.stats
    }

    /// Replace the configuration and return to [`WatchdogState::Idle`]
    ///
    /// Counters are kept.
    pub fn reconfigure(&mut self, config: WatchdogConfig) {
        self.config = config;
        self.reset();
    }

    /// Forget all timing state and return to [`WatchdogState::Idle`]
    ///
    /// An outstanding wrap notification stays expected; it belongs to the
    /// counter, not to the interval.
    pub fn reset(&mut self) {
        self.state = WatchdogState::Idle;
        self.overflows = 0;
        self.latest = None;
    }

    /// Record an edge of the monitored input
    ///
    /// Returns the measurement this edge completed, if any.
    pub fn on_edge(&mut self, edge: Edge, at: CaptureTimestamp) -> Option<PulseMeasurement> {
        match self.state {
            WatchdogState::Idle | WatchdogState::SignalLost => {
                self.latest = None;
                self.state = WatchdogState::ArmedAwaitingEdge;
                self.arm(edge, at);
                None
            }
            WatchdogState::ArmedAwaitingEdge | WatchdogState::SignalPresent => {
                if self.overflows == 0 && at.raw() < self.armed_at.raw() {
                    // Counter wrapped but its notification has not run yet
                    self.wrap_pending = true;
                }

                if edge == self.armed_edge {
                    // An edge went missing; this one starts a fresh interval
                    self.stats.polarity_errors = self.stats.polarity_errors.wrapping_add(1);
                    self.arm(edge, at);
                    return None;
                }

                let elapsed = self.ticks_since_armed(at);
                let level = self.armed_edge.level_after();
                self.arm(edge, at);

                if elapsed >= u32::from(self.config.timeout_ticks) {
                    // The previous measurement is older than the timeout
                    self.stats.rejected = self.stats.rejected.wrapping_add(1);
                    self.latest = None;
                    self.state = WatchdogState::ArmedAwaitingEdge;
                    return None;
                }

                // elapsed < timeout <= u16::MAX
                let measurement = PulseMeasurement::new(elapsed as u16, level);
                self.latest = Some(measurement);
                self.state = WatchdogState::SignalPresent;
                self.stats.measurements = self.stats.measurements.wrapping_add(1);
                Some(measurement)
            }
        }
    }

    /// Record a counter overflow
    ///
    /// `at` is the counter sample taken when the notification is handled.
    /// A notification for a wrap an edge has already accounted for is
    /// consumed without counting a period. Returns `true` if this overflow
    /// declared the signal lost.
    pub fn on_overflow(&mut self, at: CaptureTimestamp) -> bool {
        if self.wrap_pending {
            self.wrap_pending = false;
            return false;
        }
        if !self.state.is_tracking() {
            return false;
        }

        self.overflows = self.overflows.saturating_add(1);
        if self.ticks_since_armed(at) < u32::from(self.config.timeout_ticks) {
            return false;
        }

        self.state = WatchdogState::SignalLost;
        self.latest = None;
        self.stats.losses = self.stats.losses.wrapping_add(1);
        true
    }

    /// Current reading; repeated polls without new events agree
    #[must_use]
    pub fn poll(&self) -> Reading {
        match self.state {
            WatchdogState::Idle | WatchdogState::ArmedAwaitingEdge => Reading::Waiting,
            WatchdogState::SignalPresent => self.latest.map_or(Reading::Waiting, Reading::Measurement),
            WatchdogState::SignalLost => Reading::Lost,
        }
    }

    /// Current reading with the measurement count
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            reading: self.poll(),
            sequence: self.stats.measurements,
        }
    }

    fn arm(&mut self, edge: Edge, at: CaptureTimestamp) {
        self.armed_edge = edge;
        self.armed_at = at;
        self.overflows = 0;
    }

    /// Ticks from the armed edge to `at`
    ///
    /// Whole periods come from the overflow count. When `at` is below the
    /// armed sample, the first overflow is the wrap `wrapping_since`
    /// already spans. With no overflow seen, a lower `at` means the wrap's
    /// notification is still pending and the difference is taken modulo
    /// the counter width.
    fn ticks_since_armed(&self, at: CaptureTimestamp) -> u32 {
        let partial = u32::from(at.wrapping_since(self.armed_at));
        let whole = if at.raw() < self.armed_at.raw() {
            self.overflows.saturating_sub(1)
        } else {
            self.overflows
        };
        u32::from(whole) * u32::from(CaptureTimestamp::PERIOD_TICKS) + partial
    }
}

impl Default for PulseWatchdog {
    fn default() -> Self {
        Self::new(WatchdogConfig::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(raw: u8) -> CaptureTimestamp {
        CaptureTimestamp::from_raw(raw)
    }

    #[test]
    fn elapsed_within_one_period() {
        let mut wd = PulseWatchdog::default();
        wd.arm(Edge::Rising, t(10));
        assert_eq!(wd.ticks_since_armed(t(200)), 190);
    }

    #[test]
    fn elapsed_across_one_wrap() {
        let mut wd = PulseWatchdog::default();
        wd.arm(Edge::Rising, t(200));
        wd.overflows = 1;
        assert_eq!(wd.ticks_since_armed(t(20)), 76);
    }

    #[test]
    fn elapsed_with_pending_overflow_is_modular() {
        let mut wd = PulseWatchdog::default();
        wd.arm(Edge::Rising, t(250));
        assert_eq!(wd.ticks_since_armed(t(4)), 10);
    }

    #[test]
    fn late_wrap_notification_is_consumed() {
        let mut wd = PulseWatchdog::default();
        wd.on_edge(Edge::Rising, t(250));
        wd.on_edge(Edge::Falling, t(1));
        assert!(wd.wrap_pending);

        assert!(!wd.on_overflow(t(2)));
        assert!(!wd.wrap_pending);
        assert_eq!(wd.overflows, 0);
    }

    #[test]
    fn elapsed_counts_whole_periods() {
        let mut wd = PulseWatchdog::default();
        wd.arm(Edge::Falling, t(100));
        wd.overflows = 3;
        // two full periods plus the wrap back to 50
        assert_eq!(wd.ticks_since_armed(t(50)), 2 * 256 + 206);
        assert_eq!(wd.ticks_since_armed(t(150)), 3 * 256 + 50);
    }
}
