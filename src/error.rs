use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("clock resolution must be at least 1 tick per second")]
    ZeroResolution,
    #[error("clock resolution {resolution} exceeds the maximum of {max} ticks per second")]
    ResolutionTooHigh { resolution: u32, max: u32 },
    #[error("failed to spawn clock driver thread")]
    Spawn(#[source] std::io::Error),
}
