//! Timestamped sample
use crate::interp::Interpolate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A payload stamped with a sensor clock tick count.
///
/// Samples are either measured (added by a producer) or synthesized
/// by interpolation, which [ValueSample::interpolated] reports.
/// An invalid sample is a free slot and is never handed out by a history.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueSample<T> {
    /// Sensor clock ticks
    timestamp: i64,
    /// Holds a meaningful value
    valid: bool,
    /// Synthesized rather than measured
    interpolated: bool,
    /// Payload
    value: T,
}

impl<T: Clone> Clone for ValueSample<T> {
    fn clone(&self) -> Self {
        Self {
            timestamp: self.timestamp,
            valid: self.valid,
            interpolated: self.interpolated,
            value: self.value.clone(),
        }
    }
    fn clone_from(&mut self, src: &Self) {
        self.timestamp = src.timestamp;
        self.valid = src.valid;
        self.interpolated = src.interpolated;
        self.value.clone_from(&src.value);
    }
}

impl<T> ValueSample<T> {
    /// Builds an invalid sample, used as slot prototype.
    pub fn new(value: T) -> Self {
        Self {
            timestamp: 0,
            valid: false,
            interpolated: false,
            value,
        }
    }
    /// Builds a valid, measured sample.
    pub fn measured(timestamp: i64, value: T) -> Self {
        Self {
            timestamp,
            valid: true,
            interpolated: false,
            value,
        }
    }
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
    pub fn value(&self) -> &T {
        &self.value
    }
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }
    pub fn into_value(self) -> T {
        self.value
    }
    pub fn is_valid(&self) -> bool {
        self.valid
    }
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }
    /// True when this sample was synthesized from its neighbors.
    pub fn interpolated(&self) -> bool {
        self.interpolated
    }
    pub fn set_interpolated(&mut self, interpolated: bool) {
        self.interpolated = interpolated;
    }
}

impl<T: Clone> ValueSample<T> {
    /// Overwrites self with a measured value, reusing our storage.
    pub fn set(&mut self, timestamp: i64, value: &T) {
        self.value.clone_from(value);
        self.timestamp = timestamp;
        self.valid = true;
        self.interpolated = false;
    }
}

impl<T: Interpolate> ValueSample<T> {
    /// Synthesizes the sample located at `ratio` between self and `to`.
    /// Neither operand is modified. The resulting timestamp is rounded
    /// to the nearest tick.
    pub fn interpolate(&self, to: &Self, ratio: f64) -> Self {
        let span = i128::from(to.timestamp) - i128::from(self.timestamp);
        let offset = (ratio * span as f64).round() as i64;
        Self {
            timestamp: self.timestamp.saturating_add(offset),
            valid: true,
            interpolated: true,
            value: self.value.interpolate(&to.value, ratio),
        }
    }
    /// Synthesizes the sample at `timestamp`, which should lie
    /// strictly between self and `to`.
    pub fn interpolate_at(&self, to: &Self, timestamp: i64) -> Self {
        let offset = i128::from(timestamp) - i128::from(self.timestamp);
        let span = i128::from(to.timestamp) - i128::from(self.timestamp);
        let ratio = offset as f64 / span as f64;
        self.interpolate(to, ratio)
    }
}
