use serde::Deserialize;
use tracing::warn;

use crate::clock::{LockedClock, DEFAULT_RESOLUTION};
use crate::error::ClockError;

pub const RESOLUTION_ENV: &str = "SPEEDGAUGE_RESOLUTION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClockConfig {
    /// Ticks per second
    pub resolution: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl ClockConfig {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Defaults, overridden by `SPEEDGAUGE_RESOLUTION` when it parses.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(RESOLUTION_ENV).ok().as_deref())
    }

    pub(crate) fn from_env_value(value: Option<&str>) -> Self {
        let mut cfg = Self::default();
        if let Some(raw) = value {
            match raw.trim().parse::<u32>() {
                Ok(r) => cfg.resolution = r,
                Err(e) => warn!(?e, value = raw, "Ignoring invalid {RESOLUTION_ENV}"),
            }
        }
        cfg
    }

    pub fn build(&self) -> Result<LockedClock, ClockError> {
        LockedClock::new(self.resolution)
    }
}
