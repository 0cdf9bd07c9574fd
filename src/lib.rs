//! Moving-average rate gauge driven by a discrete tick clock.
//!
//! Callers report deltas to a [`Gauge`] and read back a per-second rate
//! averaged over the last five seconds. Time comes from a [`Clock`]: the
//! shared [`default_clock`], a [`LockedClock`] of your own resolution, or a
//! [`ManualClock`] stepped by hand.

pub mod clock;
pub mod config;
pub mod error;
pub mod gauge;
pub mod tick;

pub use crate::clock::{
    default_clock, Clock, LockedClock, ManualClock, TickCounter, TickSource, DEFAULT_RESOLUTION,
    MAX_RESOLUTION,
};
pub use crate::config::ClockConfig;
pub use crate::error::ClockError;
pub use crate::gauge::{Gauge, WINDOW_SECS};
pub use crate::tick::Tick;
