//! Pulse Watchdog Tests
//!
//! Tests for edge-to-edge measurement and signal-loss detection, driven by
//! a simulated free-running counter.
//! Run with: cargo test --test watchdog_tests

use openpwm::signal::shared::SharedWatchdog;
use openpwm::signal::timer::{Prescaler, TimerConfig};
use openpwm::signal::watchdog::{
    PulseWatchdog, Reading, Snapshot, WatchdogConfig, WatchdogState,
};
use openpwm::types::{CaptureTimestamp, Edge, Level, PulseMeasurement};

/// 1 MHz clock, /8: 8 us ticks, 2048 us period
fn timer() -> TimerConfig {
    TimerConfig::new(1_000_000, Prescaler::Div8).unwrap()
}

/// Counter and watchdog advanced together on a microsecond timeline
struct Sim {
    timer: TimerConfig,
    wd: PulseWatchdog,
    now_us: u64,
    next_wrap_us: u64,
}

impl Sim {
    fn new(config: WatchdogConfig) -> Self {
        let timer = timer();
        Self {
            timer,
            wd: PulseWatchdog::new(config),
            now_us: 0,
            next_wrap_us: timer.next_wrap_us(0),
        }
    }

    /// Move time forward, delivering an overflow at every wrap
    fn advance(&mut self, us: u64) -> u32 {
        let target = self.now_us + us;
        let mut losses = 0;
        while self.next_wrap_us <= target {
            let at = self.timer.sample_at(self.next_wrap_us);
            if self.wd.on_overflow(at) {
                losses += 1;
            }
            self.next_wrap_us = self.timer.next_wrap_us(self.next_wrap_us);
        }
        self.now_us = target;
        losses
    }

    /// Move time forward across exactly one wrap, holding its notification
    fn advance_holding_wrap(&mut self, us: u64) {
        let target = self.now_us + us;
        assert!(self.next_wrap_us <= target);
        self.next_wrap_us = self.timer.next_wrap_us(self.next_wrap_us);
        assert!(self.next_wrap_us > target);
        self.now_us = target;
    }

    /// Run the held notification now, sampling the counter as a late handler would
    fn deliver_held_wrap(&mut self) -> bool {
        let at = self.timer.sample_at(self.now_us);
        self.wd.on_overflow(at)
    }

    fn edge(&mut self, edge: Edge) -> Option<PulseMeasurement> {
        let at = self.timer.sample_at(self.now_us);
        self.wd.on_edge(edge, at)
    }
}

fn t(raw: u8) -> CaptureTimestamp {
    CaptureTimestamp::from_raw(raw)
}

// =============================================================================
// State Transition Tests
// =============================================================================

#[test]
fn starts_idle_and_waiting() {
    let wd = PulseWatchdog::default();
    assert_eq!(wd.state(), WatchdogState::Idle);
    assert_eq!(wd.poll(), Reading::Waiting);
}

#[test]
fn first_edge_arms() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    assert_eq!(sim.edge(Edge::Falling), None);
    assert_eq!(sim.wd.state(), WatchdogState::ArmedAwaitingEdge);
    assert_eq!(sim.wd.poll(), Reading::Waiting);
}

#[test]
fn opposite_edge_measures_high_pulse() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_500);

    let m = sim.edge(Edge::Falling).unwrap();
    assert_eq!(m, PulseMeasurement::new(187, Level::High));
    assert_eq!(sim.wd.state(), WatchdogState::SignalPresent);
    assert_eq!(sim.wd.poll(), Reading::Measurement(m));
}

#[test]
fn each_edge_starts_next_interval() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_000);
    sim.edge(Edge::Falling);
    sim.advance(800);

    let m = sim.edge(Edge::Rising).unwrap();
    assert_eq!(m.level, Level::Low);
    assert_eq!(m.ticks, 100);
    assert_eq!(sim.wd.stats().measurements, 2);
}

#[test]
fn measurement_across_counter_wrap() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.advance(1_900);
    sim.edge(Edge::Rising);
    // crosses the wrap at 2048 us
    sim.advance(1_500);

    let m = sim.edge(Edge::Falling).unwrap();
    assert_eq!(m.ticks, 188);
    assert_eq!(sim.wd.stats().losses, 0);
}

#[test]
fn same_polarity_edge_rearms() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(400);
    assert_eq!(sim.edge(Edge::Rising), None);
    assert_eq!(sim.wd.stats().polarity_errors, 1);

    sim.advance(1_000);
    let m = sim.edge(Edge::Falling).unwrap();
    assert_eq!(m.ticks, 125);
}

// =============================================================================
// Signal Loss Tests
// =============================================================================

#[test]
fn edges_every_1500us_never_lost() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    let mut edge = Edge::Rising;

    for _ in 0..1_000 {
        sim.edge(edge);
        assert_eq!(sim.advance(1_500), 0);
        assert_ne!(sim.wd.state(), WatchdogState::SignalLost);
        edge = edge.opposite();
    }

    assert_eq!(sim.wd.stats().losses, 0);
    assert_eq!(sim.wd.stats().measurements, 999);
}

#[test]
fn loss_after_exactly_one_period() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);

    sim.advance(2_047);
    assert_eq!(sim.wd.state(), WatchdogState::ArmedAwaitingEdge);

    assert_eq!(sim.advance(1), 1);
    assert_eq!(sim.wd.state(), WatchdogState::SignalLost);
}

#[test]
fn loss_detected_within_two_periods() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.advance(100);
    sim.edge(Edge::Rising);

    // first wrap is only 1948 us after the edge
    sim.advance(1_948);
    assert_eq!(sim.wd.state(), WatchdogState::ArmedAwaitingEdge);

    sim.advance(2_048);
    assert_eq!(sim.wd.state(), WatchdogState::SignalLost);
}

#[test]
fn silence_enters_lost_exactly_once() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_500);
    sim.edge(Edge::Falling);

    let losses = sim.advance(100_000);
    assert_eq!(losses, 1);
    assert_eq!(sim.wd.stats().losses, 1);
    assert_eq!(sim.wd.poll(), Reading::Lost);

    sim.advance(500_000);
    assert_eq!(sim.wd.stats().losses, 1);
    assert_eq!(sim.wd.poll(), Reading::Lost);
}

#[test]
fn lost_resumes_on_fresh_edges() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(10_000);
    assert_eq!(sim.wd.state(), WatchdogState::SignalLost);

    assert_eq!(sim.edge(Edge::Falling), None);
    assert_eq!(sim.wd.state(), WatchdogState::ArmedAwaitingEdge);
    assert_eq!(sim.wd.poll(), Reading::Waiting);

    sim.advance(1_200);
    let m = sim.edge(Edge::Rising).unwrap();
    assert_eq!(m.level, Level::Low);
    assert_eq!(sim.wd.state(), WatchdogState::SignalPresent);
}

#[test]
fn idle_ignores_overflows() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    assert_eq!(sim.advance(1_000_000), 0);
    assert_eq!(sim.wd.state(), WatchdogState::Idle);
}

#[test]
fn interval_reaching_timeout_is_rejected() {
    let mut wd = PulseWatchdog::default();
    wd.on_edge(Edge::Rising, t(10));
    // one wrap: 246 ticks so far, below the timeout
    assert!(!wd.on_overflow(t(0)));
    // 266 ticks, but no overflow arrived to declare the loss
    assert_eq!(wd.on_edge(Edge::Falling, t(20)), None);

    assert_eq!(wd.stats().rejected, 1);
    assert_eq!(wd.state(), WatchdogState::ArmedAwaitingEdge);
    assert_eq!(wd.poll(), Reading::Waiting);
}

#[test]
fn rejected_interval_drops_stale_measurement() {
    let mut wd = PulseWatchdog::default();
    wd.on_edge(Edge::Rising, t(0));
    wd.on_edge(Edge::Falling, t(100));
    assert_eq!(wd.state(), WatchdogState::SignalPresent);

    assert!(!wd.on_overflow(t(0)));
    // 266 ticks since the falling edge
    assert_eq!(wd.on_edge(Edge::Rising, t(110)), None);

    assert_eq!(wd.stats().rejected, 1);
    assert_eq!(wd.state(), WatchdogState::ArmedAwaitingEdge);
    assert_eq!(wd.poll(), Reading::Waiting);

    let m = wd.on_edge(Edge::Falling, t(200)).unwrap();
    assert_eq!(m, PulseMeasurement::new(90, Level::High));
    assert_eq!(wd.state(), WatchdogState::SignalPresent);
}

#[test]
fn pending_overflow_resolved_modulo_width() {
    let mut wd = PulseWatchdog::default();
    wd.on_edge(Edge::Rising, t(250));
    let m = wd.on_edge(Edge::Falling, t(6)).unwrap();
    assert_eq!(m.ticks, 12);
}

// =============================================================================
// Late Overflow Notification Tests
// =============================================================================

#[test]
fn late_wrap_notification_does_not_declare_loss() {
    let mut wd = PulseWatchdog::default();
    wd.on_edge(Edge::Rising, t(250));
    assert_eq!(
        wd.on_edge(Edge::Falling, t(1)),
        Some(PulseMeasurement::new(7, Level::High))
    );

    // notification for the wrap between 250 and 1 runs after the edge
    assert!(!wd.on_overflow(t(2)));
    assert_eq!(wd.state(), WatchdogState::SignalPresent);
    assert_eq!(wd.stats().losses, 0);

    // the next wrap still counts as a full period
    assert!(!wd.on_overflow(t(0)));
    assert!(wd.on_overflow(t(0)));
}

#[test]
fn late_wrap_notification_keeps_next_width() {
    let mut wd = PulseWatchdog::new(WatchdogConfig::from_ticks(3_125).unwrap());
    wd.on_edge(Edge::Falling, t(250));
    wd.on_edge(Edge::Rising, t(1));
    wd.on_overflow(t(2));

    let m = wd.on_edge(Edge::Falling, t(188)).unwrap();
    assert_eq!(m, PulseMeasurement::new(187, Level::High));
}

#[test]
fn late_wrap_notification_on_timeline() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_500);
    sim.edge(Edge::Falling);

    // wrap at 2048 us; its handler only runs after the next edge
    sim.advance_holding_wrap(600);
    let m = sim.edge(Edge::Rising).unwrap();
    assert_eq!(m, PulseMeasurement::new(75, Level::Low));
    assert!(!sim.deliver_held_wrap());
    assert_eq!(sim.wd.state(), WatchdogState::SignalPresent);

    sim.advance(1_500);
    let m = sim.edge(Edge::Falling).unwrap();
    assert_eq!(m, PulseMeasurement::new(188, Level::High));

    assert_eq!(sim.advance(10_000), 1);
    assert_eq!(sim.wd.stats().losses, 1);
}

// =============================================================================
// Servo Frame Tests
// =============================================================================

#[test]
fn servo_frames_with_long_timeout() {
    let timer = timer();
    let config = WatchdogConfig::from_timeout_us(25_000, 2_200, &timer).unwrap();
    assert_eq!(config.timeout_ticks(), 3_125);

    let mut sim = Sim::new(config);
    for _ in 0..50 {
        sim.edge(Edge::Rising);
        sim.advance(1_500);
        sim.edge(Edge::Falling);
        assert_eq!(sim.advance(18_500), 0);
    }

    let m = sim.edge(Edge::Rising).unwrap();
    assert_eq!(m, PulseMeasurement::new(2_313, Level::Low));
    assert_eq!(sim.wd.stats().losses, 0);

    sim.advance(1_500);
    let m = sim.edge(Edge::Falling).unwrap();
    assert_eq!(m, PulseMeasurement::new(187, Level::High));
}

#[test]
fn servo_frames_with_one_period_timeout_are_lost() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_500);
    sim.edge(Edge::Falling);
    sim.advance(18_500);
    assert_eq!(sim.wd.state(), WatchdogState::SignalLost);
}

// =============================================================================
// Polling Tests
// =============================================================================

#[test]
fn poll_is_idempotent() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_500);
    sim.edge(Edge::Falling);

    let first = sim.wd.poll();
    for _ in 0..10 {
        assert_eq!(sim.wd.poll(), first);
    }
}

#[test]
fn snapshot_sequence_follows_measurements() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    assert_eq!(
        sim.wd.snapshot(),
        Snapshot {
            reading: Reading::Waiting,
            sequence: 0
        }
    );

    sim.advance(1_500);
    let m = sim.edge(Edge::Falling).unwrap();
    let first = sim.wd.snapshot();
    assert_eq!(first.reading, Reading::Measurement(m));
    assert_eq!(first.sequence, 1);
    assert_eq!(sim.wd.snapshot(), first);

    sim.advance(1_500);
    sim.edge(Edge::Rising);
    assert_eq!(sim.wd.snapshot().sequence, 2);
}

#[test]
fn reset_returns_to_idle_keeping_stats() {
    let mut sim = Sim::new(WatchdogConfig::DEFAULT);
    sim.edge(Edge::Rising);
    sim.advance(1_500);
    sim.edge(Edge::Falling);

    sim.wd.reset();
    assert_eq!(sim.wd.state(), WatchdogState::Idle);
    assert_eq!(sim.wd.poll(), Reading::Waiting);
    assert_eq!(sim.wd.stats().measurements, 1);
}

// =============================================================================
// Shared Watchdog Tests
// =============================================================================

static SHARED: SharedWatchdog = SharedWatchdog::new(WatchdogConfig::DEFAULT);

#[test]
fn shared_watchdog_across_threads() {
    let producer = std::thread::spawn(|| {
        let mut edge = Edge::Rising;
        for i in 0..100_u8 {
            SHARED.on_edge(edge, CaptureTimestamp::from_raw(i.wrapping_mul(2)));
            edge = edge.opposite();
        }
    });

    // concurrent polls must always see a consistent reading
    for _ in 0..100 {
        let reading = SHARED.poll();
        assert_ne!(reading, Reading::Lost);
    }
    producer.join().unwrap();

    assert_eq!(SHARED.state(), WatchdogState::SignalPresent);
    assert_eq!(SHARED.stats().measurements, 99);
    assert_eq!(
        SHARED.poll(),
        Reading::Measurement(PulseMeasurement::new(2, Level::High))
    );
}
