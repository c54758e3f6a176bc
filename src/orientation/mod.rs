//! Orientation
mod history;
mod quaternion;

pub use history::{OrientationCovariance, OrientationHistory};
pub use quaternion::{Quaternion, YawPitchRoll};
