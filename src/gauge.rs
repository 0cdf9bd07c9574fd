use std::fmt;
use std::sync::Arc;

use crate::clock::{default_clock, Clock, MAX_RESOLUTION};
use crate::tick::Tick;

/// Seconds of history a gauge keeps.
pub const WINDOW_SECS: usize = 5;

/// Moving-average rate over the last [`WINDOW_SECS`] seconds of a clock.
///
/// The ring holds one cumulative total per tick. Idle ticks carry the
/// previous total forward, so the rate is the difference between the newest
/// and oldest retained slots scaled to units per second.
///
/// `progress` takes `&mut self`: a gauge has a single writer. Wrap it in a
/// `Mutex` to report from several threads.
pub struct Gauge {
    clock: Arc<dyn Clock>,
    resolution: u32,
    buffer: Vec<i64>,
    filled: usize,
    cursor: usize,
    last_tick: Tick,
}

impl Gauge {
    /// A gauge on the shared default clock.
    pub fn new() -> Self {
        Self::with_clock(default_clock())
    }

    /// A gauge on a caller-supplied clock. Starting it is the caller's job.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let resolution = clock.resolution().clamp(1, MAX_RESOLUTION);
        let window = resolution as usize * WINDOW_SECS;
        let last_tick = clock.tick().prev();
        Self {
            clock,
            resolution,
            buffer: vec![0; window],
            filled: 1,
            cursor: 1,
            last_tick,
        }
    }

    /// Attribute `delta` to the current tick and return the rate estimate.
    pub fn progress(&mut self, delta: i64) -> f64 {
        let window = self.buffer.len();
        let tick = self.clock.tick();
        // Anything past a full window has aged out all history anyway.
        let dist = usize::from(tick.distance_since(self.last_tick)).min(window);
        self.last_tick = tick;

        for _ in 0..dist {
            self.advance_slot();
        }

        let head = self.cursor - 1;
        if delta != 0 {
            self.buffer[head] = self.buffer[head].saturating_add(delta);
        }

        let top = self.buffer[head];
        let btm = if self.filled < window {
            0
        } else {
            self.buffer[self.cursor % window]
        };

        if self.filled < self.resolution as usize {
            return top as f64;
        }

        top.saturating_sub(btm) as f64 * f64::from(self.resolution) / self.filled as f64
    }

    /// Current rate without reporting anything.
    pub fn read(&mut self) -> f64 {
        self.progress(0)
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Number of slots in the ring.
    pub fn window(&self) -> usize {
        self.buffer.len()
    }

    /// Slots that have seen at least one tick, capped at [`Gauge::window`].
    pub fn filled(&self) -> usize {
        self.filled
    }

    fn advance_slot(&mut self) {
        let window = self.buffer.len();
        if self.cursor == window {
            self.cursor = 0;
        }
        let prev = if self.cursor == 0 { window - 1 } else { self.cursor - 1 };
        self.buffer[self.cursor] = self.buffer[prev];

        if self.filled <= self.cursor {
            self.filled += 1;
        }
        self.cursor += 1;
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge")
            .field("resolution", &self.resolution)
            .field("window", &self.buffer.len())
            .field("filled", &self.filled)
            .field("cursor", &self.cursor)
            .field("last_tick", &self.last_tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{LockedClock, ManualClock};
    use crate::error::ClockError;
    use std::time::Duration;
    use std::sync::Mutex;

    fn manual(resolution: u32) -> (Arc<ManualClock>, Gauge) {
        let clock = Arc::new(ManualClock::new(resolution).unwrap());
        let gauge = Gauge::with_clock(clock.clone());
        (clock, gauge)
    }

    #[test]
    fn window_is_five_seconds_of_ticks() {
        let (_, g) = manual(4);
        assert_eq!(g.window(), 20);
        assert_eq!(g.resolution(), 4);
        assert_eq!(g.filled(), 1);
    }

    #[test]
    fn manual_tick_scenario() {
        let (clock, mut g) = manual(4);

        assert_eq!(g.progress(10), 10.0);
        assert_eq!(g.progress(20), 30.0);

        for _ in 0..2 {
            clock.advance();
            assert_eq!(g.progress(0), 30.0);
        }

        // one second of history
        clock.advance();
        assert_eq!(g.progress(0), 24.0);

        clock.advance();
        assert_eq!(g.progress(0), 20.0);
    }

    #[test]
    fn deltas_before_any_tick_return_running_sum() {
        let (_, mut g) = manual(4);
        let mut sum = 0;
        for d in [3, 7, 0, 12, 1] {
            sum += d;
            assert_eq!(g.progress(d), sum as f64);
        }
    }

    #[test]
    fn repeated_reads_are_stable() {
        let (clock, mut g) = manual(4);
        g.progress(50);
        clock.advance_by(6);
        let first = g.read();
        assert_eq!(g.read(), first);
        assert_eq!(g.read(), first);
    }

    #[test]
    fn negative_delta_lowers_the_total() {
        let (_, mut g) = manual(4);
        assert_eq!(g.progress(30), 30.0);
        assert_eq!(g.progress(-10), 20.0);
    }

    #[test]
    fn idle_full_window_reports_zero() {
        let (clock, mut g) = manual(4);
        g.progress(100);
        for _ in 0..40 {
            clock.advance();
            g.read();
        }
        assert_eq!(g.filled(), g.window());
        assert_eq!(g.read(), 0.0);
    }

    #[test]
    fn gap_longer_than_window_acts_like_one_window() {
        let (clock_a, mut a) = manual(4);
        let (clock_b, mut b) = manual(4);
        for g in [&mut a, &mut b] {
            g.progress(40);
        }

        clock_a.advance_by(20);
        clock_b.advance_by(5000);
        assert_eq!(a.read(), b.read());
        assert_eq!(a.filled(), b.filled());
        assert_eq!(a.cursor, b.cursor);
        assert_eq!(a.buffer, b.buffer);

        // Fresh data after the gap is measured against the aged-out total.
        clock_a.advance();
        clock_b.advance();
        assert_eq!(a.progress(8), b.progress(8));
    }

    #[test]
    fn filled_saturates_at_window() {
        let (clock, mut g) = manual(2);
        for _ in 0..100 {
            clock.advance();
            g.progress(1);
            assert!(g.filled() <= g.window());
        }
        assert_eq!(g.filled(), g.window());
    }

    #[test]
    fn steady_feed_settles() {
        let (clock, mut g) = manual(4);
        let mut rate = 0.0;
        for _ in 0..60 {
            clock.advance();
            rate = g.progress(10);
        }
        // oldest retained slot is window - 1 ticks behind the newest
        assert_eq!(rate, 10.0 * 19.0 * 4.0 / 20.0);
    }

    #[test]
    fn tick_wraparound_is_transparent() {
        let clock = Arc::new(ManualClock::new(4).unwrap());
        clock.set(Tick::new(65534));
        let mut g = Gauge::with_clock(clock.clone());

        assert_eq!(g.progress(10), 10.0);
        assert_eq!(g.progress(20), 30.0);
        for _ in 0..2 {
            clock.advance();
            assert_eq!(g.progress(0), 30.0);
        }
        assert_eq!(clock.tick(), Tick::new(0));
        clock.advance();
        assert_eq!(g.progress(0), 24.0);
        clock.advance();
        assert_eq!(g.progress(0), 20.0);
    }

    #[test]
    fn shared_clock_drives_several_gauges() {
        let clock = Arc::new(ManualClock::new(4).unwrap());
        let mut a = Gauge::with_clock(clock.clone());
        let mut b = Gauge::with_clock(clock.clone());
        a.progress(10);
        b.progress(20);
        clock.advance_by(3);
        assert_eq!(a.read(), 8.0);
        assert_eq!(b.read(), 16.0);
    }

    #[test]
    fn mutex_wrapped_gauge_accepts_concurrent_writers() {
        let clock = Arc::new(ManualClock::new(4).unwrap());
        let gauge = Arc::new(Mutex::new(Gauge::with_clock(clock.clone())));
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let gauge = Arc::clone(&gauge);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        gauge.lock().unwrap().progress(1);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(gauge.lock().unwrap().read(), 100.0);
    }

    #[test]
    fn default_gauge_uses_shared_clock() {
        let mut g = Gauge::new();
        assert_eq!(g.resolution(), crate::clock::DEFAULT_RESOLUTION);
        assert_eq!(g.progress(100), 100.0);
    }

    #[test]
    fn background_clock_ages_the_window() {
        let clock = Arc::new(LockedClock::new(4).unwrap());
        let mut g = Gauge::with_clock(clock.clone());
        clock.start().unwrap();
        assert_eq!(g.progress(100), 100.0);

        // three ticks land at 250, 500 and 750 ms; sleep between the third and fourth
        std::thread::sleep(Duration::from_millis(870));
        assert_eq!(g.read(), 80.0);
    }

    struct FixedClock(u32);

    impl Clock for FixedClock {
        fn start(&self) -> Result<(), ClockError> {
            Ok(())
        }

        fn tick(&self) -> Tick {
            Tick::START
        }

        fn resolution(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn foreign_clock_resolution_is_clamped() {
        let g = Gauge::with_clock(Arc::new(FixedClock(u32::MAX)));
        assert_eq!(g.resolution(), MAX_RESOLUTION);
        assert_eq!(g.window(), MAX_RESOLUTION as usize * WINDOW_SECS);

        let mut g = Gauge::with_clock(Arc::new(FixedClock(0)));
        assert_eq!(g.window(), WINDOW_SECS);
        assert_eq!(g.progress(7), 7.0);
    }
}
