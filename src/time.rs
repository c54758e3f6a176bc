//! Sensor clock resolution
use hifitime::{Duration, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Duration of one sensor clock tick.
/// Timestamps stored in a history are raw tick counts:
/// [Resolution] converts them to physical time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Resolution {
    Second,
    /// Default: most IMUs stamp their samples in milliseconds.
    #[default]
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Second => write!(f, "s"),
            Self::Millisecond => write!(f, "ms"),
            Self::Microsecond => write!(f, "us"),
            Self::Nanosecond => write!(f, "ns"),
        }
    }
}

impl Resolution {
    /// [Unit] of one tick
    pub fn unit(&self) -> Unit {
        match self {
            Self::Second => Unit::Second,
            Self::Millisecond => Unit::Millisecond,
            Self::Microsecond => Unit::Microsecond,
            Self::Nanosecond => Unit::Nanosecond,
        }
    }
    /// Converts a tick count to a [Duration]
    pub fn duration(&self, ticks: i64) -> Duration {
        self.unit() * ticks
    }
    /// Converts a tick count to seconds
    pub fn seconds(&self, ticks: i64) -> f64 {
        self.duration(ticks).to_seconds()
    }
    /// Converts a [Duration] to the nearest tick count
    pub fn ticks(&self, dt: Duration) -> i64 {
        let tick = self.duration(1).to_seconds();
        (dt.to_seconds() / tick).round() as i64
    }
}
