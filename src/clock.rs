use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel as channel;
use once_cell::sync::Lazy;
use tracing::{debug, error, trace};

use crate::error::ClockError;
use crate::tick::Tick;

/// Ticks per second of the process-wide default clock.
pub const DEFAULT_RESOLUTION: u32 = 4;

/// Upper bound on resolution; keeps a gauge window far below the 16-bit wrap.
pub const MAX_RESOLUTION: u32 = 1000;

/// A periodic tick source shared by gauges.
pub trait Clock: Send + Sync {
    /// Begin advancing. Calling it on a running clock does nothing.
    fn start(&self) -> Result<(), ClockError>;
    fn tick(&self) -> Tick;
    fn resolution(&self) -> u32;
}

pub fn validate_resolution(resolution: u32) -> Result<u32, ClockError> {
    match resolution {
        0 => Err(ClockError::ZeroResolution),
        r if r > MAX_RESOLUTION => Err(ClockError::ResolutionTooHigh {
            resolution: r,
            max: MAX_RESOLUTION,
        }),
        r => Ok(r),
    }
}

pub fn tick_period(resolution: u32) -> Duration {
    Duration::from_secs(1) / resolution.max(1)
}

/// Unsynchronized counter state. Needs `&mut` to advance, so sharing it
/// with a driver thread goes through [`LockedClock`].
pub trait TickSource: Send + 'static {
    fn tick(&self) -> Tick;
    fn resolution(&self) -> u32;
    fn advance(&mut self) -> Tick;
}

#[derive(Debug, Clone)]
pub struct TickCounter {
    tick: Tick,
    resolution: u32,
}

impl TickCounter {
    pub fn new(resolution: u32) -> Result<Self, ClockError> {
        Ok(Self {
            tick: Tick::START,
            resolution: validate_resolution(resolution)?,
        })
    }
}

impl TickSource for TickCounter {
    fn tick(&self) -> Tick {
        self.tick
    }

    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn advance(&mut self) -> Tick {
        self.tick = self.tick.next();
        self.tick
    }
}

/// Serializes every access to a [`TickSource`] through a mutex and drives
/// it from a background thread once started.
pub struct LockedClock<S: TickSource = TickCounter> {
    source: Arc<Mutex<S>>,
    resolution: u32,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl LockedClock<TickCounter> {
    pub fn new(resolution: u32) -> Result<Self, ClockError> {
        TickCounter::new(resolution).map(Self::from_source)
    }
}

impl<S: TickSource> LockedClock<S> {
    pub fn from_source(source: S) -> Self {
        let resolution = source.resolution();
        Self {
            source: Arc::new(Mutex::new(source)),
            resolution,
            driver: Mutex::new(None),
        }
    }

    pub fn is_started(&self) -> bool {
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

// A panic mid-advance cannot leave a plain counter half-written.
fn lock_source<S>(source: &Mutex<S>) -> MutexGuard<'_, S> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: TickSource> Clock for LockedClock<S> {
    fn start(&self) -> Result<(), ClockError> {
        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if driver.is_some() {
            return Ok(());
        }

        let period = tick_period(self.resolution);
        let ticker = channel::tick(period);
        let source = Arc::clone(&self.source);
        let handle = thread::Builder::new()
            .name("speedgauge-clock".into())
            .spawn(move || {
                // Runs until process exit; the ticker never disconnects.
                for _ in ticker.iter() {
                    let tick = lock_source(&source).advance();
                    trace!(%tick, "Clock tick");
                }
            })
            .map_err(ClockError::Spawn)?;

        debug!(resolution = self.resolution, ?period, "Clock started");
        *driver = Some(handle);
        Ok(())
    }

    fn tick(&self) -> Tick {
        lock_source(&self.source).tick()
    }

    fn resolution(&self) -> u32 {
        self.resolution
    }
}

/// A clock that only moves when told to. Used to drive gauges
/// deterministically.
#[derive(Debug)]
pub struct ManualClock {
    tick: AtomicU16,
    resolution: u32,
}

impl ManualClock {
    pub fn new(resolution: u32) -> Result<Self, ClockError> {
        Ok(Self {
            tick: AtomicU16::new(Tick::START.get()),
            resolution: validate_resolution(resolution)?,
        })
    }

    pub fn advance(&self) -> Tick {
        self.advance_by(1)
    }

    pub fn advance_by(&self, ticks: u16) -> Tick {
        let prev = self.tick.fetch_add(ticks, Ordering::SeqCst);
        Tick::new(prev.wrapping_add(ticks))
    }

    pub fn set(&self, tick: Tick) {
        self.tick.store(tick.get(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn start(&self) -> Result<(), ClockError> {
        Ok(())
    }

    fn tick(&self) -> Tick {
        Tick::new(self.tick.load(Ordering::SeqCst))
    }

    fn resolution(&self) -> u32 {
        self.resolution
    }
}

static DEFAULT_CLOCK: Lazy<Arc<LockedClock>> = Lazy::new(|| {
    let clock = Arc::new(LockedClock::from_source(TickCounter {
        tick: Tick::START,
        resolution: DEFAULT_RESOLUTION,
    }));
    if let Err(e) = clock.start() {
        error!(?e, "Default clock failed to start; gauges will not advance");
    }
    clock
});

/// The process-wide clock at [`DEFAULT_RESOLUTION`], started on first use.
pub fn default_clock() -> Arc<dyn Clock> {
    let clock: Arc<LockedClock> = Arc::clone(&DEFAULT_CLOCK);
    clock
}
