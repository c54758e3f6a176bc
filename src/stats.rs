//! Sample statistics
use nalgebra::{Matrix3, Vector3};

/// Unbiased (n - 1) covariance of a set of 3D observations.
/// Requires at least two observations.
pub fn covariance<'a, I>(observations: I) -> Option<Matrix3<f64>>
where
    I: IntoIterator<Item = &'a Vector3<f64>>,
    I::IntoIter: Clone,
{
    let observations = observations.into_iter();

    let (n, sum) = observations
        .clone()
        .fold((0_usize, Vector3::<f64>::zeros()), |(n, sum), v| {
            (n + 1, sum + v)
        });

    if n < 2 {
        return None;
    }

    let mean = sum / n as f64;

    let q = observations.fold(Matrix3::<f64>::zeros(), |q, v| {
        let dv = v - mean;
        q + dv * dv.transpose()
    });

    Some(q / (n - 1) as f64)
}
