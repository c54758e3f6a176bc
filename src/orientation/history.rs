use itertools::Itertools;
use log::debug;
use nalgebra::{Matrix3, Vector3};

use crate::{
    cfg::Config,
    history::{Error, Snapshot, TimeHistory},
    orientation::{quaternion::wrap_angle, Quaternion},
    sample::ValueSample,
    stats::covariance,
    time::Resolution,
};

/// Orientation and angular rate covariances,
/// over (yaw, pitch, roll) in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationCovariance {
    /// In rad²
    pub orientation: Matrix3<f64>,
    /// In (rad/s)²
    pub angular_rate: Matrix3<f64>,
}

/// Time history of orientations, as reported by an IMU.
///
/// Orientations are looked up by sensor timestamp. Those falling between
/// two measurements are estimated by spherical interpolation.
#[derive(Debug)]
pub struct OrientationHistory {
    history: TimeHistory<Quaternion>,
    resolution: Resolution,
}

impl OrientationHistory {
    /// Builds a new [OrientationHistory] covering the time span
    /// described by [Config].
    pub fn new(cfg: &Config) -> Result<Self, Error> {
        Ok(Self {
            history: TimeHistory::from_config(cfg, Quaternion::identity())?,
            resolution: cfg.resolution,
        })
    }
    /// Builds a new [OrientationHistory] of given number of samples.
    pub fn with_capacity(capacity: usize, resolution: Resolution) -> Result<Self, Error> {
        Ok(Self {
            history: TimeHistory::new(capacity, Quaternion::identity())?,
            resolution,
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
    /// Stores a new orientation measurement.
    pub fn publish(&self, timestamp: i64, q: &Quaternion) {
        self.history.add(timestamp, q);
    }
    /// Clears all existing entries.
    pub fn reset(&self) {
        self.history.reset();
    }
    /// Most recent orientation
    pub fn current(&self) -> Option<ValueSample<Quaternion>> {
        self.history.most_recent()
    }
    /// Orientation at given sensor timestamp, either measured or interpolated.
    pub fn at(&self, timestamp: i64) -> Option<ValueSample<Quaternion>> {
        self.history.get(timestamp)
    }
    /// Yaw angle in degrees [-180, 180] at given sensor timestamp
    pub fn yaw_degrees_at(&self, timestamp: i64) -> Option<f64> {
        Some(self.at(timestamp)?.value().yaw().to_degrees())
    }
    /// Pitch angle in degrees [-90, 90] at given sensor timestamp
    pub fn pitch_degrees_at(&self, timestamp: i64) -> Option<f64> {
        Some(self.at(timestamp)?.value().pitch().to_degrees())
    }
    /// Roll angle in degrees [-180, 180] at given sensor timestamp
    pub fn roll_degrees_at(&self, timestamp: i64) -> Option<f64> {
        Some(self.at(timestamp)?.value().roll().to_degrees())
    }
    /// Rotation performed between both instants.
    pub fn rotation_between(&self, from: i64, to: i64) -> Option<Quaternion> {
        let q_from = self.at(from)?;
        let q_to = self.at(to)?;
        Some(q_to.value().difference(q_from.value()))
    }
    /// Average yaw rate between both instants, in °/s.
    pub fn yaw_rate_at(&self, from: i64, to: i64) -> Option<f64> {
        if from == to {
            return None;
        }
        let dq = self.rotation_between(from, to)?;
        let dt = self.resolution.seconds(to - from);
        Some(dq.yaw().to_degrees() / dt)
    }
    /// Copy of the current content
    pub fn snapshot(&self) -> Snapshot<Quaternion> {
        self.history.snapshot()
    }
    /// Evaluates orientation and angular rate covariances over the
    /// current content. Requires at least 3 samples.
    pub fn covariance(&self) -> Option<OrientationCovariance> {
        let snapshot = self.history.snapshot();
        if snapshot.len() < 3 {
            debug!(
                "covariance: not enough samples ({}/3)",
                snapshot.len()
            );
            return None;
        }

        /*
         * Yaw and roll wrap at +/- pi: accumulate wrapped increments,
         * so a heading crossing the wrap remains a continuous sequence.
         */
        let mut ypr = Vec::<(i64, Vector3<f64>)>::with_capacity(snapshot.len());
        let mut previous: Option<Vector3<f64>> = None;

        for s in snapshot.iter() {
            let angles = s.value().euler();
            let raw = Vector3::new(angles.yaw, angles.pitch, angles.roll);
            let unwrapped = match (previous, ypr.last()) {
                (Some(previous), Some((_, last))) => Vector3::new(
                    last[0] + wrap_angle(raw[0] - previous[0]),
                    raw[1],
                    last[2] + wrap_angle(raw[2] - previous[2]),
                ),
                _ => raw,
            };
            previous = Some(raw);
            ypr.push((s.timestamp(), unwrapped));
        }

        let rates = ypr
            .iter()
            .tuple_windows()
            .filter_map(|((t0, a), (t1, b))| {
                let dt = self.resolution.seconds(t1 - t0);
                if dt > 0.0 {
                    Some((b - a) / dt)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        Some(OrientationCovariance {
            orientation: covariance(ypr.iter().map(|(_, v)| v))?,
            angular_rate: covariance(&rates)?,
        })
    }
}
