//! Minimal 3D vector primitives for a right-handed, z-up world frame.
//!
//! This crate intentionally stays small: it exists to give the triangulation
//! solver and the tracking coordinator a single shared point/direction type,
//! not to be a general linear-algebra library. Heavier numerical work (the
//! solver's objective, nalgebra matrix ops) reaches past this crate straight
//! into `nalgebra`.

use nalgebra::Vector3;
use std::ops::Neg;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point or direction in the world frame.
///
/// `Vec3` wraps a plain `nalgebra::Vector3<f64>` the same way `mvg::PointWorldFrame`
/// wraps a `Point3` — a thin named type at the seam between modules, not a
/// reimplementation of vector algebra.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Vec3(Vector3<f64>);

impl Vec3 {
    pub fn from_cartesian(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Builds a vector of the given `radius` from an azimuth (xy-plane angle,
    /// see [`Vec3::angle_xy`]) and an elevation (xz-plane angle, see
    /// [`Vec3::angle_xz`]).
    ///
    /// The two angles are not an orthogonal spherical parameterization (the
    /// elevation ignores the y-component by construction, matching
    /// `angle_xz`), so this only round-trips `angle_xy`/`angle_xz` for
    /// azimuths in `(-pi/2, pi/2)`. That is the range the camera bore/offset
    /// geometry in the tracking coordinator always falls into.
    pub fn from_polar(azimuth: f64, elevation: f64, radius: f64) -> Self {
        let x = radius * azimuth.cos();
        let y = radius * azimuth.sin();
        let z = x * elevation.tan();
        Self(Vector3::new(x, y, z))
    }

    pub fn xyz(&self) -> (f64, f64, f64) {
        (self.0.x, self.0.y, self.0.z)
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn is_zero_length(&self) -> bool {
        self.0.norm_squared() < 1e-18
    }

    /// Returns `None` for a zero-length vector rather than producing NaN.
    pub fn normalize(&self) -> Option<Self> {
        if self.is_zero_length() {
            None
        } else {
            Some(Self(self.0.normalize()))
        }
    }

    /// Azimuth: the angle of this vector in the xy-plane, measured from +x.
    pub fn angle_xy(&self) -> f64 {
        self.0.y.atan2(self.0.x)
    }

    /// Elevation: the angle of this vector in the xz-plane, measured from +x.
    pub fn angle_xz(&self) -> f64 {
        self.0.z.atan2(self.0.x)
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn as_nalgebra(&self) -> Vector3<f64> {
        self.0
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3(-self.0)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3(self.0 - rhs.0)
    }
}

impl From<Vector3<f64>> for Vec3 {
    fn from(v: Vector3<f64>) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cartesian_round_trips_xyz() {
        let v = Vec3::from_cartesian(1.0, 2.0, 3.0);
        assert_eq!(v.xyz(), (1.0, 2.0, 3.0));
    }

    #[test]
    fn polar_round_trips_angles_for_forward_facing_azimuth() {
        let az = 0.3;
        let el = -0.2;
        let v = Vec3::from_polar(az, el, 10.0);
        assert_relative_eq!(v.angle_xy(), az, epsilon = 1e-9);
        assert_relative_eq!(v.angle_xz(), el, epsilon = 1e-9);
    }

    #[test]
    fn negation_flips_all_components() {
        let v = Vec3::from_cartesian(1.0, -2.0, 3.0);
        let n = -v;
        assert_eq!(n.xyz(), (-1.0, 2.0, -3.0));
    }

    #[test]
    fn zero_length_vector_does_not_normalize() {
        let v = Vec3::from_cartesian(0.0, 0.0, 0.0);
        assert!(v.normalize().is_none());
    }

    #[test]
    fn normalize_produces_unit_length() {
        let v = Vec3::from_cartesian(3.0, 4.0, 0.0);
        let n = v.normalize().unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
    }
}
