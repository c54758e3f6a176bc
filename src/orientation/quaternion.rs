//! Unit quaternion algebra
use log::debug;
use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Mul, Neg};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::history::Error;

use crate::interp::Interpolate;

/// Below this norm, a quaternion cannot be normalized.
const MIN_NORM: f64 = 1.0E-12;

/// Above this dot product, [Quaternion::slerp] falls back to
/// [Quaternion::nlerp]: sin(theta) gets too small to divide by.
const SLERP_DOT_THRESHOLD: f64 = 0.9995;

/// Gimbal lock is declared when |sin(pitch)| reaches 1 - this.
const GIMBAL_LOCK_THRESHOLD: f64 = 1.0E-9;

/// Yaw, pitch and roll angles, in radians unless converted.
///
/// Intrinsic Z-Y'-X'' sequence: yaw about Z, then pitch about the new Y,
/// then roll about the new X.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct YawPitchRoll {
    /// [-pi, pi]
    pub yaw: f64,
    /// [-pi/2, pi/2]
    pub pitch: f64,
    /// [-pi, pi]
    pub roll: f64,
}

impl YawPitchRoll {
    /// Converts all three angles to degrees.
    pub fn to_degrees(self) -> Self {
        Self {
            yaw: self.yaw.to_degrees(),
            pitch: self.pitch.to_degrees(),
            roll: self.roll.to_degrees(),
        }
    }
}

/// Wraps an angle (radians) to [-pi, pi].
pub(crate) fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI && angle > 0.0 {
        PI
    } else {
        wrapped
    }
}

/// Unit quaternion describing a 3D rotation.
///
/// Every constructor and every operation returns a normalized quaternion,
/// so floating point drift never accumulates. Composition follows the
/// Hamilton convention: `a * b` applies `b` first, then `a`.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawQuaternion"))]
pub struct Quaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

/// Components as found in a serialized stream, not normalized yet.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawQuaternion {
    w: f64,
    x: f64,
    y: f64,
    z: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawQuaternion> for Quaternion {
    type Error = Error;
    fn try_from(raw: RawQuaternion) -> Result<Self, Self::Error> {
        Self::try_new(raw.w, raw.x, raw.y, raw.z).ok_or(Error::NullQuaternion)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Null rotation
    pub const fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
    /// Builds a unit quaternion from raw components, normalizing them.
    /// A (near) zero input carries no rotation and resolves to [Self::identity].
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self::try_new(w, x, y, z).unwrap_or_else(|| {
            debug!("null quaternion ({}, {}, {}, {}): using identity", w, x, y, z);
            Self::identity()
        })
    }
    /// Builds a unit quaternion from raw components, or None
    /// when their magnitude is too small to be normalized.
    pub fn try_new(w: f64, x: f64, y: f64, z: f64) -> Option<Self> {
        let norm = (w * w + x * x + y * y + z * z).sqrt();
        if norm.is_finite() && norm > MIN_NORM {
            Some(Self {
                w: w / norm,
                x: x / norm,
                y: y / norm,
                z: z / norm,
            })
        } else {
            None
        }
    }
    /// Rotation of `angle` radians about `axis`.
    pub fn from_axis_angle(axis: &Vector3<f64>, angle: f64) -> Self {
        let norm = axis.norm();
        if norm < MIN_NORM {
            return Self::identity();
        }
        let (s, c) = (angle / 2.0).sin_cos();
        Self::new(
            c,
            s * axis[0] / norm,
            s * axis[1] / norm,
            s * axis[2] / norm,
        )
    }
    /// Builds the rotation described by yaw, pitch and roll angles (radians).
    pub fn from_euler(yaw: f64, pitch: f64, roll: f64) -> Self {
        let (sy, cy) = (yaw / 2.0).sin_cos();
        let (sp, cp) = (pitch / 2.0).sin_cos();
        let (sr, cr) = (roll / 2.0).sin_cos();
        Self::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        )
    }
    pub fn w(&self) -> f64 {
        self.w
    }
    pub fn x(&self) -> f64 {
        self.x
    }
    pub fn y(&self) -> f64 {
        self.y
    }
    pub fn z(&self) -> f64 {
        self.z
    }
    /// Euclidean norm of the four components.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
    /// Re-normalizes self. Only useful to absorb drift: all
    /// constructors already normalize.
    pub fn normalize(&self) -> Self {
        Self::new(self.w, self.x, self.y, self.z)
    }
    /// 4D dot product. Its magnitude is the cosine of half
    /// the angle between both rotations.
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }
    /// Hamilton product `self * rhs`: `rhs` is applied first.
    /// Not commutative.
    pub fn multiply(&self, rhs: &Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y + self.y * rhs.w + self.z * rhs.x - self.x * rhs.z,
            self.w * rhs.z + self.z * rhs.w + self.x * rhs.y - self.y * rhs.x,
        )
    }
    /// Negates the vector part.
    pub fn conjugate(&self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
    /// Opposite rotation. Equals [Self::conjugate] for unit quaternions.
    pub fn inverse(&self) -> Self {
        self.conjugate()
    }
    /// Relative rotation from `rhs` to self: `self * conj(rhs)`,
    /// such that `self == self.difference(rhs) * rhs`.
    pub fn difference(&self, rhs: &Self) -> Self {
        self.multiply(&rhs.conjugate())
    }
    /// Angle (radians, [0, pi]) of the rotation between self and `rhs`.
    pub fn angle_to(&self, rhs: &Self) -> f64 {
        2.0 * self.dot(rhs).abs().min(1.0).acos()
    }
    /// True when both quaternions describe the same rotation,
    /// `q` and `-q` included.
    pub fn same_rotation(&self, rhs: &Self, tolerance: f64) -> bool {
        self.dot(rhs).abs() >= 1.0 - tolerance
    }
    /// Normalized linear interpolation. Cheap, but not constant
    /// angular speed. Does not resolve the double cover.
    pub fn nlerp(&self, rhs: &Self, t: f64) -> Self {
        Self::new(
            self.w + (rhs.w - self.w) * t,
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }
    /// Spherical linear interpolation along the shortest arc, t in [0, 1].
    ///
    /// `q` and `-q` encode the same rotation: when the operands lie in
    /// opposite hemispheres (negative dot product) `rhs` is negated, otherwise
    /// the long arc would be followed. Nearly identical operands are
    /// handled with [Self::nlerp].
    pub fn slerp(&self, rhs: &Self, t: f64) -> Self {
        let mut cos_theta = self.dot(rhs);
        let rhs = if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            -*rhs
        } else {
            *rhs
        };

        if cos_theta > SLERP_DOT_THRESHOLD {
            return self.nlerp(&rhs, t);
        }

        let theta = cos_theta.min(1.0).acos();
        let sin_theta = theta.sin();
        let ratio_a = ((1.0 - t) * theta).sin() / sin_theta;
        let ratio_b = (t * theta).sin() / sin_theta;

        Self::new(
            self.w * ratio_a + rhs.w * ratio_b,
            self.x * ratio_a + rhs.x * ratio_b,
            self.y * ratio_a + rhs.y * ratio_b,
            self.z * ratio_a + rhs.z * ratio_b,
        )
    }
    /// Rotates given vector.
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let u = Vector3::new(self.x, self.y, self.z);
        let t = 2.0 * u.cross(v);
        v + self.w * t + u.cross(&t)
    }
    /// Gravity vector, as sensed in the body frame of an IMU
    /// whose orientation is self.
    pub fn gravity(&self) -> Vector3<f64> {
        Vector3::new(
            2.0 * (self.x * self.z - self.w * self.y),
            2.0 * (self.w * self.x + self.y * self.z),
            self.w * self.w - self.x * self.x - self.y * self.y + self.z * self.z,
        )
    }
    /// Extracts yaw, pitch and roll (radians).
    ///
    /// Near gimbal lock (pitch = +/- 90°) only the sum or difference of
    /// yaw and roll is observable: roll is then pinned to zero and yaw
    /// carries the whole rotation about the vertical axis.
    pub fn euler(&self) -> YawPitchRoll {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let sin_pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);

        if sin_pitch.abs() >= 1.0 - GIMBAL_LOCK_THRESHOLD {
            let pitch = FRAC_PI_2.copysign(sin_pitch);
            let yaw = -2.0 * sin_pitch.signum() * x.atan2(w);
            return YawPitchRoll {
                yaw: wrap_angle(yaw),
                pitch,
                roll: 0.0,
            };
        }

        YawPitchRoll {
            yaw: (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z)),
            pitch: sin_pitch.asin(),
            roll: (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y)),
        }
    }
    /// Yaw angle (radians)
    pub fn yaw(&self) -> f64 {
        self.euler().yaw
    }
    /// Pitch angle (radians)
    pub fn pitch(&self) -> f64 {
        self.euler().pitch
    }
    /// Roll angle (radians)
    pub fn roll(&self) -> f64 {
        self.euler().roll
    }
}

impl Mul for Quaternion {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

/// Same rotation, opposite hemisphere.
impl Neg for Quaternion {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            w: -self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Interpolate for Quaternion {
    fn interpolate(&self, to: &Self, ratio: f64) -> Self {
        self.slerp(to, ratio)
    }
}

impl From<UnitQuaternion<f64>> for Quaternion {
    fn from(q: UnitQuaternion<f64>) -> Self {
        let q = q.quaternion();
        Self::new(q.w, q.i, q.j, q.k)
    }
}

impl From<Quaternion> for UnitQuaternion<f64> {
    fn from(q: Quaternion) -> Self {
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z))
    }
}

impl std::fmt::Display for Quaternion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {}, {}, {})", self.w, self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod test {
    use super::{wrap_angle, Quaternion};
    use nalgebra::{UnitQuaternion, Vector3};
    use rstest::rstest;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn assert_close(a: &Quaternion, b: &Quaternion, tol: f64) {
        let err = (a.w() - b.w()).abs()
            + (a.x() - b.x()).abs()
            + (a.y() - b.y()).abs()
            + (a.z() - b.z()).abs();
        assert!(err < tol, "{} != {} (err={})", a, b, err);
    }

    fn about_z(angle: f64) -> Quaternion {
        Quaternion::from_axis_angle(&Vector3::z(), angle)
    }

    #[test]
    fn normalization() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0);
        assert_close(&q, &Quaternion::identity(), 1.0E-12);

        let q = Quaternion::new(1.0, 2.0, 3.0, 4.0);
        assert!((q.norm() - 1.0).abs() < 1.0E-12);
        assert!((q.normalize().norm() - 1.0).abs() < 1.0E-12);

        assert!(Quaternion::try_new(0.0, 0.0, 0.0, 0.0).is_none());
        assert!(Quaternion::try_new(f64::NAN, 0.0, 0.0, 0.0).is_none());
        assert_eq!(Quaternion::new(0.0, 0.0, 0.0, 0.0), Quaternion::identity());
    }

    #[test]
    fn hamilton_product() {
        let a = Quaternion::new(0.1, 0.7, -0.3, 0.2);
        let b = Quaternion::new(-0.5, 0.4, 0.1, 0.9);

        let na: UnitQuaternion<f64> = a.into();
        let nb: UnitQuaternion<f64> = b.into();

        assert_close(&(a * b), &Quaternion::from(na * nb), 1.0E-9);
        assert_close(&(b * a), &Quaternion::from(nb * na), 1.0E-9);
        assert!(!(a * b).same_rotation(&(b * a), 1.0E-6), "should not commute");

        let i = Quaternion::identity();
        assert_close(&(a * i), &a, 1.0E-12);
        assert_close(&(i * a), &a, 1.0E-12);
    }

    #[test]
    fn conjugate_is_inverse() {
        let q = Quaternion::from_euler(0.3, -0.2, 1.1);
        assert_close(&(q * q.conjugate()), &Quaternion::identity(), 1.0E-9);
        assert_close(&(q.inverse() * q), &Quaternion::identity(), 1.0E-9);
    }

    #[test]
    fn difference() {
        let a = about_z(FRAC_PI_2);
        let b = about_z(FRAC_PI_4);
        let d = a.difference(&b);
        assert!((d.angle_to(&Quaternion::identity()) - FRAC_PI_4).abs() < 1.0E-9);
        assert!((d.yaw() - FRAC_PI_4).abs() < 1.0E-9);

        let a = Quaternion::from_euler(0.4, 0.1, -0.7);
        let b = Quaternion::from_euler(-1.2, 0.3, 0.2);
        assert_close(&(a.difference(&b) * b), &a, 1.0E-9);
        assert_close(&a.difference(&a), &Quaternion::identity(), 1.0E-9);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.25)]
    #[case(0.5)]
    #[case(0.75)]
    #[case(1.0)]
    fn slerp_properties(#[case] t: f64) {
        let a = Quaternion::from_euler(0.2, 0.1, -0.3);
        let b = Quaternion::from_euler(1.4, -0.4, 0.5);

        // idempotent
        assert_close(&a.slerp(&a, t), &a, 1.0E-9);

        // unit magnitude
        let q = a.slerp(&b, t);
        assert!((q.norm() - 1.0).abs() < 1.0E-12);

        // double cover
        assert!(q.same_rotation(&a.slerp(&-b, t), 1.0E-9));

        // constant angular speed
        let total = a.angle_to(&b);
        assert!((a.angle_to(&q) - t * total).abs() < 1.0E-6);
    }

    #[test]
    fn slerp_end_points() {
        let a = Quaternion::from_euler(0.2, 0.1, -0.3);
        let b = Quaternion::from_euler(1.4, -0.4, 0.5);
        assert!(a.dot(&b) > 0.0);
        assert_close(&a.slerp(&b, 0.0), &a, 1.0E-9);
        assert_close(&a.slerp(&b, 1.0), &b, 1.0E-9);

        // opposite hemisphere: b is reached through -b
        let c = -b;
        assert!(a.slerp(&c, 1.0).same_rotation(&b, 1.0E-9));
        assert!(a.slerp(&c, 0.0).same_rotation(&a, 1.0E-9));
    }

    #[test]
    fn slerp_shortest_arc() {
        let a = about_z(0.0);
        let b = -about_z(FRAC_PI_2);
        assert!(a.dot(&b) < 0.0);

        let q = a.slerp(&b, 0.5);
        assert!((q.yaw() - FRAC_PI_4).abs() < 1.0E-9, "long arc: {}", q.yaw());
    }

    #[test]
    fn slerp_nearly_identical() {
        let a = about_z(0.3);
        let b = about_z(0.3 + 1.0E-6);
        let q = a.slerp(&b, 0.5);
        assert!((q.norm() - 1.0).abs() < 1.0E-12);
        assert!((q.yaw() - (0.3 + 0.5E-6)).abs() < 1.0E-9);

        let q = a.slerp(&-a, 0.5);
        assert!(q.same_rotation(&a, 1.0E-12));
    }

    #[test]
    fn slerp_half_turn() {
        let a = Quaternion::identity();
        let b = about_z(PI);
        let q = a.slerp(&b, 0.5);
        assert!((q.yaw() - FRAC_PI_2).abs() < 1.0E-9);
    }

    #[test]
    fn slerp_matches_nalgebra() {
        let a = Quaternion::from_euler(0.2, 0.1, -0.3);
        let b = Quaternion::from_euler(2.4, -0.4, 0.5);
        let na: UnitQuaternion<f64> = a.into();
        let nb: UnitQuaternion<f64> = b.into();
        for t in [0.1, 0.3, 0.6, 0.9] {
            let expected = Quaternion::from(na.slerp(&nb, t));
            assert!(a.slerp(&b, t).same_rotation(&expected, 1.0E-9));
        }
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(0.5, 0.2, -0.3)]
    #[case(-2.5, -1.2, 2.9)]
    #[case(3.0, 0.7, -3.0)]
    #[case(-0.1, -0.05, 1.5)]
    fn euler_angles(#[case] yaw: f64, #[case] pitch: f64, #[case] roll: f64) {
        let q = Quaternion::from_euler(yaw, pitch, roll);
        let ypr = q.euler();
        assert!((ypr.yaw - yaw).abs() < 1.0E-9, "yaw {} != {}", ypr.yaw, yaw);
        assert!((ypr.pitch - pitch).abs() < 1.0E-9, "pitch {} != {}", ypr.pitch, pitch);
        assert!((ypr.roll - roll).abs() < 1.0E-9, "roll {} != {}", ypr.roll, roll);

        // same convention as nalgebra (roll, pitch, yaw)
        let n = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        assert!(q.same_rotation(&Quaternion::from(n), 1.0E-12));

        // double cover does not matter
        let ypr_neg = (-q).euler();
        assert!((ypr_neg.yaw - yaw).abs() < 1.0E-9);
        assert!((ypr_neg.pitch - pitch).abs() < 1.0E-9);
        assert!((ypr_neg.roll - roll).abs() < 1.0E-9);
    }

    #[rstest]
    #[case(FRAC_PI_2, 0.3)]
    #[case(-FRAC_PI_2, 0.3)]
    #[case(FRAC_PI_2, -2.0)]
    #[case(-FRAC_PI_2, 3.0)]
    fn gimbal_lock(#[case] pitch: f64, #[case] yaw: f64) {
        let q = Quaternion::from_euler(yaw, pitch, 0.0);
        let ypr = q.euler();
        assert_eq!(ypr.roll, 0.0);
        assert!((ypr.pitch - pitch).abs() < 1.0E-6);
        assert!((ypr.yaw - yaw).abs() < 1.0E-6, "yaw {} != {}", ypr.yaw, yaw);

        // extracted angles describe the same rotation
        let back = Quaternion::from_euler(ypr.yaw, ypr.pitch, ypr.roll);
        assert!(back.same_rotation(&q, 1.0E-9));
    }

    #[test]
    fn degrees() {
        let ypr = Quaternion::from_euler(FRAC_PI_2, 0.0, -FRAC_PI_4)
            .euler()
            .to_degrees();
        assert!((ypr.yaw - 90.0).abs() < 1.0E-9);
        assert!(ypr.pitch.abs() < 1.0E-9);
        assert!((ypr.roll + 45.0).abs() < 1.0E-9);
    }

    #[test]
    fn wrapping() {
        assert!((wrap_angle(PI) - PI).abs() < 1.0E-12);
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1.0E-12);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1.0E-12);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1.0E-12);
    }

    #[test]
    fn rotation() {
        let q = about_z(FRAC_PI_2);
        let v = q.rotate(&Vector3::x());
        assert!((v - Vector3::y()).norm() < 1.0E-12);

        let q = Quaternion::from_euler(0.3, -0.8, 1.9);
        let n: UnitQuaternion<f64> = q.into();
        let v = Vector3::new(1.0, -2.0, 0.5);
        assert!((q.rotate(&v) - n * v).norm() < 1.0E-9);
    }

    #[test]
    fn gravity() {
        let g = Quaternion::identity().gravity();
        assert!((g - Vector3::z()).norm() < 1.0E-12);
        let g = Quaternion::from_euler(1.3, 0.0, 0.0).gravity();
        assert!((g - Vector3::z()).norm() < 1.0E-12, "yaw changes gravity");
    }

    #[test]
    #[cfg(feature = "serde")]
    fn deserialize_normalizes() {
        let q: Quaternion = serde_json::from_str(r#"{"w":2.0,"x":0.0,"y":0.0,"z":0.0}"#).unwrap();
        assert_eq!(q, Quaternion::identity());

        let q: Quaternion = serde_json::from_str(r#"{"w":0.0,"x":3.0,"y":0.0,"z":4.0}"#).unwrap();
        assert!((q.norm() - 1.0).abs() < 1.0E-12);
        assert!((q.x() - 0.6).abs() < 1.0E-12);
        assert!((q.z() - 0.8).abs() < 1.0E-12);

        let null = serde_json::from_str::<Quaternion>(r#"{"w":0.0,"x":0.0,"y":0.0,"z":0.0}"#);
        assert!(null.is_err());

        let content = serde_json::to_string(&Quaternion::identity()).unwrap();
        assert_eq!(content, r#"{"w":1.0,"x":0.0,"y":0.0,"z":0.0}"#);
    }
}
