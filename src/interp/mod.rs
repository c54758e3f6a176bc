//! Interpolation contract shared by every payload stored in a
//! [TimeHistory](crate::prelude::TimeHistory).
use nalgebra::SVector;
use num_traits::Float;

/// Capability required from any value stored in a time history.
///
/// [Clone] provides the deep copy: slots are refreshed with
/// [Clone::clone_from] so payloads owning heap memory may reuse it.
/// `interpolate` must never mutate either operand.
pub trait Interpolate: Clone {
    /// Returns the value located at `ratio` (0.0 = self, 1.0 = to)
    /// between `self` and `to`.
    fn interpolate(&self, to: &Self, ratio: f64) -> Self;
}

/// Linear interpolation between two scalars: `a + (b - a) * ratio`.
pub fn lerp<F: Float>(a: F, b: F, ratio: F) -> F {
    a + (b - a) * ratio
}

macro_rules! scalar_interpolate {
    ($($t:ty),*) => {
        $(
            impl Interpolate for $t {
                fn interpolate(&self, to: &Self, ratio: f64) -> Self {
                    lerp(*self, *to, ratio as $t)
                }
            }
        )*
    };
}

scalar_interpolate!(f32, f64);

/// Fixed size vectors (positions, accelerations..) blend component wise.
impl<const D: usize> Interpolate for SVector<f64, D> {
    fn interpolate(&self, to: &Self, ratio: f64) -> Self {
        self + (to - self) * ratio
    }
}
