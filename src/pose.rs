//! Planar pose
use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{history::TimeHistory, interp::Interpolate, orientation::Quaternion};

/// Position offset on the ground plane, combined with a 3D orientation.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// (x, y) offset, in meters
    pub offset: Vector2<f64>,
    pub orientation: Quaternion,
}

/// Time history of [Pose]s.
pub type PoseHistory = TimeHistory<Pose>;

impl Pose {
    pub fn new(x: f64, y: f64, orientation: Quaternion) -> Self {
        Self {
            offset: Vector2::new(x, y),
            orientation,
        }
    }
    /// [Pose] located at the origin.
    pub fn from_orientation(orientation: Quaternion) -> Self {
        Self::new(0.0, 0.0, orientation)
    }
    pub fn x(&self) -> f64 {
        self.offset.x
    }
    pub fn y(&self) -> f64 {
        self.offset.y
    }
    /// Returns a copy of self, moved by (dx, dy).
    pub fn add_offsets(&self, dx: f64, dy: f64) -> Self {
        Self {
            offset: self.offset + Vector2::new(dx, dy),
            orientation: self.orientation,
        }
    }
}

/// Offsets blend linearly, orientations spherically.
impl Interpolate for Pose {
    fn interpolate(&self, to: &Self, ratio: f64) -> Self {
        Self {
            offset: self.offset.interpolate(&to.offset, ratio),
            orientation: self.orientation.slerp(&to.orientation, ratio),
        }
    }
}
