// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector, quaternion, and transform math for rig evaluation.
//!
//! [`Transform`] uses the "child times parent" convention: `a * b` applies `a`
//! first and then `b`, so an element's global transform is
//! `local * parent_global`. Scale is stored per axis and never sheared.
//! [`Transform::relative_to`] is the exact inverse of that composition, with
//! near-zero scale axes mapped to zero instead of infinity.
//!
//! Euler angles are expressed in degrees, one component per axis, and are
//! applied in the sequence named by [`EulerRotationOrder`].

use core::ops::{Add, AddAssign, Mul, Neg, Sub};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Threshold below which a weight, scale axis, or length counts as zero.
pub const SMALL_NUMBER: f64 = 1.0e-8;

/// Tolerance used when comparing transforms for equality.
pub const KINDA_SMALL_NUMBER: f64 = 1.0e-4;

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// A 3-component vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// All zeros.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All ones.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a vector from its components.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector with all components set to `v`.
    #[inline]
    #[must_use]
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    /// Returns component `axis` (0 = x, 1 = y, 2 = z).
    ///
    /// # Panics
    ///
    /// Panics if `axis >= 3`.
    #[inline]
    #[must_use]
    pub const fn axis(self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            _ => panic!("axis out of range"),
        }
    }

    /// Returns a copy with component `axis` replaced.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= 3`.
    #[inline]
    #[must_use]
    pub const fn with_axis(mut self, axis: usize, value: f64) -> Self {
        match axis {
            0 => self.x = value,
            1 => self.y = value,
            2 => self.z = value,
            _ => panic!("axis out of range"),
        }
        self
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product.
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Component-wise product.
    #[inline]
    #[must_use]
    pub fn mul_elem(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    /// Component-wise reciprocal, mapping components within `tolerance` of
    /// zero to zero.
    #[inline]
    #[must_use]
    pub fn safe_recip(self, tolerance: f64) -> Self {
        let r = |v: f64| if v.abs() <= tolerance { 0.0 } else { 1.0 / v };
        Self::new(r(self.x), r(self.y), r(self.z))
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `rhs`.
    #[inline]
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        self + (rhs - self) * t
    }

    /// Returns `true` if every component is within `tolerance` of zero.
    #[inline]
    #[must_use]
    pub fn is_nearly_zero(self, tolerance: f64) -> bool {
        self.x.abs() <= tolerance && self.y.abs() <= tolerance && self.z.abs() <= tolerance
    }

    /// Returns `true` if any component is within `tolerance` of zero.
    #[inline]
    #[must_use]
    pub fn has_nearly_zero_axis(self, tolerance: f64) -> bool {
        self.x.abs() <= tolerance || self.y.abs() <= tolerance || self.z.abs() <= tolerance
    }

    /// Component-wise approximate equality.
    #[inline]
    #[must_use]
    pub fn abs_diff_eq(self, rhs: Self, tolerance: f64) -> bool {
        (self - rhs).is_nearly_zero(tolerance)
    }

    /// Is every component [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ---------------------------------------------------------------------------
// Euler rotation order
// ---------------------------------------------------------------------------

/// The sequence in which per-axis euler rotations are applied.
///
/// `Xyz` rotates about X first, then Y, then Z (extrinsic axes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EulerRotationOrder {
    /// X, then Y, then Z.
    #[default]
    Xyz,
    /// X, then Z, then Y.
    Xzy,
    /// Y, then X, then Z.
    Yxz,
    /// Y, then Z, then X.
    Yzx,
    /// Z, then X, then Y.
    Zxy,
    /// Z, then Y, then X.
    Zyx,
}

impl EulerRotationOrder {
    /// Axis indices in application order.
    #[inline]
    #[must_use]
    pub const fn axes(self) -> [usize; 3] {
        match self {
            Self::Xyz => [0, 1, 2],
            Self::Xzy => [0, 2, 1],
            Self::Yxz => [1, 0, 2],
            Self::Yzx => [1, 2, 0],
            Self::Zxy => [2, 0, 1],
            Self::Zyx => [2, 1, 0],
        }
    }

    /// Whether the axis sequence is an even permutation of X, Y, Z.
    #[inline]
    #[must_use]
    pub const fn is_cyclic(self) -> bool {
        matches!(self, Self::Xyz | Self::Yzx | Self::Zxy)
    }
}

// ---------------------------------------------------------------------------
// Quat
// ---------------------------------------------------------------------------

/// A rotation quaternion `(x, y, z, w)`.
///
/// `a * b` is the Hamilton product: the result applies `b` first, then `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    /// X (imaginary i) component.
    pub x: f64,
    /// Y (imaginary j) component.
    pub y: f64,
    /// Z (imaginary k) component.
    pub z: f64,
    /// W (real) component.
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a quaternion from raw components (not normalized).
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `radians` about `axis`. The axis does not need to be
    /// normalized; a degenerate axis yields the identity.
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, radians: f64) -> Self {
        let len = axis.length();
        if len <= SMALL_NUMBER {
            return Self::IDENTITY;
        }
        let half = radians * 0.5;
        let s = half.sin() / len;
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    fn from_axis_index(axis: usize, radians: f64) -> Self {
        let half = radians * 0.5;
        let (s, c) = (half.sin(), half.cos());
        match axis {
            0 => Self::new(s, 0.0, 0.0, c),
            1 => Self::new(0.0, s, 0.0, c),
            _ => Self::new(0.0, 0.0, s, c),
        }
    }

    /// Builds a rotation from per-axis euler angles in degrees.
    #[must_use]
    pub fn from_euler(degrees: Vec3, order: EulerRotationOrder) -> Self {
        let [a, b, c] = order.axes();
        let qa = Self::from_axis_index(a, degrees.axis(a).to_radians());
        let qb = Self::from_axis_index(b, degrees.axis(b).to_radians());
        let qc = Self::from_axis_index(c, degrees.axis(c).to_radians());
        qc * qb * qa
    }

    /// Decomposes into per-axis euler angles in degrees.
    ///
    /// At gimbal lock the last axis is pinned to zero and the first absorbs the
    /// remaining rotation.
    #[must_use]
    pub fn to_euler(self, order: EulerRotationOrder) -> Vec3 {
        let m = self.normalized().to_matrix();
        let [a, b, c] = order.axes();
        let s = if order.is_cyclic() { 1.0 } else { -1.0 };

        let sin_b = (-s * m[c][a]).clamp(-1.0, 1.0);
        let cos_b = (1.0 - sin_b * sin_b).max(0.0).sqrt();
        let beta = sin_b.atan2(cos_b);
        let (alpha, gamma) = if cos_b > 1.0e-6 {
            (
                (s * m[c][b]).atan2(m[c][c]),
                (s * m[b][a]).atan2(m[a][a]),
            )
        } else {
            ((-s * m[b][c]).atan2(m[b][b]), 0.0)
        };

        Vec3::ZERO
            .with_axis(a, alpha.to_degrees())
            .with_axis(b, beta.to_degrees())
            .with_axis(c, gamma.to_degrees())
    }

    /// Row-major 3x3 rotation matrix acting on column vectors.
    fn to_matrix(self) -> [[f64; 3]; 3] {
        let Self { x, y, z, w } = self;
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ]
    }

    /// 4-D dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z + self.w * rhs.w
    }

    /// Returns the unit quaternion in the same direction, or the identity if
    /// the length is (nearly) zero.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len_sq = self.dot(self);
        if len_sq <= SMALL_NUMBER {
            return Self::IDENTITY;
        }
        self.scaled(1.0 / len_sq.sqrt())
    }

    /// Inverse of a unit quaternion.
    #[inline]
    #[must_use]
    pub fn inverse(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates a vector.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Spherical interpolation along the shortest arc, normalized.
    #[must_use]
    pub fn slerp(self, rhs: Self, t: f64) -> Self {
        let mut cos = self.dot(rhs);
        let rhs = if cos < 0.0 {
            cos = -cos;
            -rhs
        } else {
            rhs
        };

        let (s0, s1) = if cos < 0.9999 {
            let omega = (1.0 - cos * cos).max(0.0).sqrt().atan2(cos);
            let inv_sin = 1.0 / omega.sin();
            (((1.0 - t) * omega).sin() * inv_sin, (t * omega).sin() * inv_sin)
        } else {
            (1.0 - t, t)
        };

        (self.scaled(s0) + rhs.scaled(s1)).normalized()
    }

    /// Approximate equality that treats `q` and `-q` as the same rotation.
    #[must_use]
    pub fn abs_diff_eq(self, rhs: Self, tolerance: f64) -> bool {
        let close = |a: Self, b: Self| {
            (a.x - b.x).abs() <= tolerance
                && (a.y - b.y).abs() <= tolerance
                && (a.z - b.z).abs() <= tolerance
                && (a.w - b.w).abs() <= tolerance
        };
        close(self, rhs) || close(self, -rhs)
    }

    /// Is every component [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    #[inline]
    pub(crate) fn scaled(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl Mul for Quat {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Add for Quat {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Neg for Quat {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Translation, rotation, and per-axis scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub translation: Vec3,
    /// Rotation (kept unit length by the hierarchy).
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform from its parts.
    #[inline]
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// A pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY, Vec3::ONE)
    }

    /// A pure rotation.
    #[inline]
    #[must_use]
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self::new(Vec3::ZERO, rotation, Vec3::ONE)
    }

    /// A pure scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(scale: Vec3) -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, scale)
    }

    /// Expresses `self` in the space of `other`, so that
    /// `self.relative_to(other) * other == self`.
    ///
    /// Scale axes of `other` within [`SMALL_NUMBER`] of zero divide to zero.
    #[must_use]
    pub fn relative_to(&self, other: &Self) -> Self {
        let inv_scale = other.scale.safe_recip(SMALL_NUMBER);
        let inv_rotation = other.rotation.inverse();
        Self {
            translation: inv_rotation
                .rotate(self.translation - other.translation)
                .mul_elem(inv_scale),
            rotation: inv_rotation * self.rotation,
            scale: self.scale.mul_elem(inv_scale),
        }
    }

    /// The inverse transform (`IDENTITY.relative_to(self)`).
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self::IDENTITY.relative_to(self)
    }

    /// Renormalizes the rotation in place.
    #[inline]
    pub fn normalize_rotation(&mut self) {
        self.rotation = self.rotation.normalized();
    }

    /// Returns a copy with a normalized rotation.
    #[inline]
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize_rotation();
        self
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p.mul_elem(self.scale)) + self.translation
    }

    /// Interpolates translation and scale linearly and rotation spherically.
    #[must_use]
    pub fn lerp(&self, rhs: &Self, t: f64) -> Self {
        Self {
            translation: self.translation.lerp(rhs.translation, t),
            rotation: self.rotation.slerp(rhs.rotation, t),
            scale: self.scale.lerp(rhs.scale, t),
        }
    }

    /// Approximate equality of all three parts.
    #[must_use]
    pub fn abs_diff_eq(&self, rhs: &Self, tolerance: f64) -> bool {
        self.translation.abs_diff_eq(rhs.translation, tolerance)
            && self.rotation.abs_diff_eq(rhs.rotation, tolerance)
            && self.scale.abs_diff_eq(rhs.scale, tolerance)
    }

    /// Is every component [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

impl Mul for Transform {
    type Output = Self;

    /// `child * parent`: applies `self`, then `rhs`.
    fn mul(self, rhs: Self) -> Self {
        Self {
            translation: rhs.rotation.rotate(rhs.scale.mul_elem(self.translation))
                + rhs.translation,
            rotation: rhs.rotation * self.rotation,
            scale: self.scale.mul_elem(rhs.scale),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
