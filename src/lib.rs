#![doc = include_str!("../README.md")]
#![cfg_attr(docrs, feature(doc_cfg))]

// private modules
mod cfg;
mod history;
mod interp;
mod motion;
mod orientation;
mod pose;
mod sample;
mod stats;
mod time;

// pub export
pub use history::Error;


// prelude
pub mod prelude {
    pub use crate::cfg::Config;
    pub use crate::history::{Snapshot, TimeHistory, MAX_CAPACITY};
    pub use crate::interp::{lerp, Interpolate};
    pub use crate::motion::LinearAccelerationHistory;
    pub use crate::orientation::{
        OrientationCovariance, OrientationHistory, Quaternion, YawPitchRoll,
    };
    pub use crate::pose::{Pose, PoseHistory};
    pub use crate::sample::ValueSample;
    pub use crate::stats::covariance;
    pub use crate::time::Resolution;
    // re-export
    pub use hifitime::{Duration, Unit};
    pub use nalgebra::{Matrix3, Vector2, Vector3};
}
