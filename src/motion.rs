//! Linear acceleration history
use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::{
    cfg::Config,
    history::{Error, Snapshot, TimeHistory},
    sample::ValueSample,
    stats::covariance,
};

/// Time history of linear accelerations (gravity removed), in g,
/// expressed in the sensor frame.
#[derive(Debug)]
pub struct LinearAccelerationHistory {
    history: TimeHistory<Vector3<f64>>,
}

impl LinearAccelerationHistory {
    /// Builds a new [LinearAccelerationHistory] covering the time span
    /// described by [Config].
    pub fn new(cfg: &Config) -> Result<Self, Error> {
        Ok(Self {
            history: TimeHistory::from_config(cfg, Vector3::zeros())?,
        })
    }
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Ok(Self {
            history: TimeHistory::new(capacity, Vector3::zeros())?,
        })
    }
    pub fn capacity(&self) -> usize {
        self.history.capacity()
    }
    pub fn len(&self) -> usize {
        self.history.len()
    }
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
    pub fn publish(&self, timestamp: i64, acceleration: &Vector3<f64>) {
        self.history.add(timestamp, acceleration);
    }
    pub fn reset(&self) {
        self.history.reset();
    }
    pub fn current(&self) -> Option<ValueSample<Vector3<f64>>> {
        self.history.most_recent()
    }
    /// Acceleration at given timestamp, either measured or linearly interpolated.
    pub fn at(&self, timestamp: i64) -> Option<ValueSample<Vector3<f64>>> {
        self.history.get(timestamp)
    }
    pub fn snapshot(&self) -> Snapshot<Vector3<f64>> {
        self.history.snapshot()
    }
    /// (x, y, z) covariance over the current content, in g².
    /// Requires at least 2 samples.
    pub fn covariance(&self) -> Option<Matrix3<f64>> {
        let snapshot = self.history.snapshot();
        let q = covariance(snapshot.iter().map(|s| s.value()));
        if q.is_none() {
            debug!("covariance: not enough samples ({}/2)", snapshot.len());
        }
        q
    }
}
