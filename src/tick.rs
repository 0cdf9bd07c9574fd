use std::fmt;

/// A 16-bit clock tick. Wraps from `Tick::MAX` back to zero, so any
/// comparison between two ticks must go through [`Tick::distance_since`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tick(u16);

impl Tick {
    pub const MAX: Tick = Tick(u16::MAX);

    /// Value a freshly constructed counter starts at.
    pub const START: Tick = Tick(1);

    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn prev(self) -> Self {
        Self(self.0.wrapping_sub(1))
    }

    /// Ticks elapsed from `earlier` to `self`, modulo 2^16.
    pub const fn distance_since(self, earlier: Tick) -> u16 {
        self.0.wrapping_sub(earlier.0)
    }
}

impl Default for Tick {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
