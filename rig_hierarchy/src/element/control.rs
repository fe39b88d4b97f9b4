// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Control settings, value limits, and preferred euler angles.

use crate::math::{EulerRotationOrder, Quat, Transform, Vec3};

/// The value a control animates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControlType {
    /// Boolean toggle (stored in translation.x).
    Bool,
    /// Scalar (stored in translation.x).
    Float,
    /// Integer (stored in translation.x).
    Integer,
    /// 2-D vector (stored in translation.xy).
    Vector2D,
    /// Translation only.
    Position,
    /// Scale only.
    Scale,
    /// Rotation only.
    Rotator,
    /// Full transform.
    #[default]
    EulerTransform,
    /// Full transform without euler display.
    Transform,
    /// Translation and rotation.
    TransformNoScale,
}

/// How a control participates in animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationType {
    /// Keyed and visible.
    #[default]
    AnimationControl,
    /// Keyed, drawn under a parent control.
    AnimationChannel,
    /// Not keyed; drives other controls.
    ProxyControl,
    /// Not keyed, display only.
    VisualCue,
}

/// Per-axis clamp range.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisLimits {
    /// Which axes are clamped.
    pub enabled: [bool; 3],
    /// Lower bounds.
    pub min: Vec3,
    /// Upper bounds.
    pub max: Vec3,
}

impl AxisLimits {
    /// Clamps every axis to the same range.
    #[must_use]
    pub const fn uniform(min: Vec3, max: Vec3) -> Self {
        Self {
            enabled: [true; 3],
            min,
            max,
        }
    }

    /// Whether any axis is clamped.
    #[inline]
    #[must_use]
    pub const fn any(&self) -> bool {
        self.enabled[0] || self.enabled[1] || self.enabled[2]
    }

    /// Clamps the enabled axes of `v`.
    #[must_use]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let mut out = v;
        for axis in 0..3 {
            if self.enabled[axis] {
                let (lo, hi) = (self.min.axis(axis), self.max.axis(axis));
                // Reversed ranges clamp to the nearer bound instead of panicking.
                let value = v.axis(axis).max(lo.min(hi)).min(hi.max(lo));
                out = out.with_axis(axis, value);
            }
        }
        out
    }
}

/// Translation, rotation, and scale limits of a control.
///
/// Rotation limits are expressed in euler degrees in the control's rotation
/// order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlLimits {
    /// Translation clamp.
    pub translation: AxisLimits,
    /// Euler rotation clamp, in degrees.
    pub rotation: AxisLimits,
    /// Scale clamp.
    pub scale: AxisLimits,
}

impl ControlLimits {
    /// Returns `value` clamped to the enabled limits.
    #[must_use]
    pub fn apply(&self, value: &Transform, order: EulerRotationOrder) -> Transform {
        let mut out = *value;
        if self.translation.any() {
            out.translation = self.translation.apply(out.translation);
        }
        if self.rotation.any() {
            let euler = out.rotation.to_euler(order);
            out.rotation = Quat::from_euler(self.rotation.apply(euler), order);
        }
        if self.scale.any() {
            out.scale = self.scale.apply(out.scale);
        }
        out
    }
}

/// Static configuration of a control element.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlSettings {
    /// Value type.
    pub control_type: ControlType,
    /// Animation role.
    pub animation_type: AnimationType,
    /// Value limits.
    pub limits: ControlLimits,
    /// Transient controls are skipped by pose capture unless requested.
    pub is_transient: bool,
    /// Rotation order used for euler display and limits.
    pub preferred_rotation_order: EulerRotationOrder,
}

/// Cached euler angles that keep a control's rotation free of flips when it
/// is re-derived from a quaternion.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PreferredEulerAngles {
    /// Order the angles are expressed in.
    pub rotation_order: EulerRotationOrder,
    /// Angles for the current pose, in degrees.
    pub current: Vec3,
    /// Angles for the initial pose, in degrees.
    pub initial: Vec3,
}

impl PreferredEulerAngles {
    /// Creates zeroed angles in the given order.
    #[must_use]
    pub fn new(rotation_order: EulerRotationOrder) -> Self {
        Self {
            rotation_order,
            ..Self::default()
        }
    }

    /// The stored angles.
    #[inline]
    #[must_use]
    pub fn get(&self, initial: bool) -> Vec3 {
        if initial { self.initial } else { self.current }
    }

    fn get_mut(&mut self, initial: bool) -> &mut Vec3 {
        if initial {
            &mut self.initial
        } else {
            &mut self.current
        }
    }

    /// The stored angles converted to `order`.
    #[must_use]
    pub fn angles(&self, initial: bool, order: EulerRotationOrder) -> Vec3 {
        let value = self.get(initial);
        if order == self.rotation_order {
            value
        } else {
            Quat::from_euler(value, self.rotation_order).to_euler(order)
        }
    }

    /// The stored angles as a rotation.
    #[must_use]
    pub fn rotation(&self, initial: bool) -> Quat {
        Quat::from_euler(self.get(initial), self.rotation_order)
    }

    /// Stores `value` (expressed in `order`).
    ///
    /// With `fix_flips`, each angle is wound to lie within half a turn of the
    /// previously stored one, so a rotation crossing +-180 degrees keeps
    /// counting instead of jumping.
    pub fn set_angles(
        &mut self,
        value: Vec3,
        initial: bool,
        order: EulerRotationOrder,
        fix_flips: bool,
    ) {
        let value = if order == self.rotation_order {
            value
        } else {
            Quat::from_euler(value, order).to_euler(self.rotation_order)
        };

        if !fix_flips {
            *self.get_mut(initial) = value;
            return;
        }

        let previous = self.get(initial);
        let mut fixed = Vec3::ZERO;
        for axis in 0..3 {
            let prev = previous.axis(axis);
            let remainder = normalize_degrees(prev);
            let delta = normalize_degrees(value.axis(axis) - remainder);
            fixed = fixed.with_axis(axis, prev + delta);
        }
        *self.get_mut(initial) = fixed;
    }

    /// Stores the euler decomposition of `rotation`, fixing flips.
    pub fn set_from_rotation(&mut self, rotation: Quat, initial: bool) {
        let euler = rotation.to_euler(self.rotation_order);
        self.set_angles(euler, initial, self.rotation_order, true);
    }

    /// Changes the rotation order, converting the stored angles.
    pub fn set_rotation_order(&mut self, order: EulerRotationOrder) {
        if order == self.rotation_order {
            return;
        }
        let previous = self.rotation_order;
        let current = self.current;
        let initial = self.initial;
        self.rotation_order = order;
        self.set_angles(current, false, previous, false);
        self.set_angles(initial, true, previous, false);
    }

    /// Zeroes both angle sets and restores `order`.
    pub fn reset(&mut self, order: EulerRotationOrder) {
        *self = Self::new(order);
    }
}

/// Wraps an angle into `(-180, 180]`.
fn normalize_degrees(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_limits_clamp_enabled_axes_only() {
        let limits = AxisLimits {
            enabled: [true, false, true],
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let v = limits.apply(Vec3::new(5.0, 5.0, -5.0));
        assert_eq!(v, Vec3::new(1.0, 5.0, -1.0));
    }

    #[test]
    fn rotation_limits_use_euler_degrees() {
        let limits = ControlLimits {
            rotation: AxisLimits::uniform(Vec3::splat(-45.0), Vec3::splat(45.0)),
            ..ControlLimits::default()
        };
        let t = Transform::from_rotation(Quat::from_euler(
            Vec3::new(0.0, 0.0, 90.0),
            EulerRotationOrder::Xyz,
        ));
        let clamped = limits.apply(&t, EulerRotationOrder::Xyz);
        let euler = clamped.rotation.to_euler(EulerRotationOrder::Xyz);
        assert!(euler.abs_diff_eq(Vec3::new(0.0, 0.0, 45.0), 1.0e-6));
    }

    #[test]
    fn flip_fix_keeps_winding() {
        let mut angles = PreferredEulerAngles::default();
        angles.set_angles(Vec3::new(0.0, 0.0, 170.0), false, EulerRotationOrder::Xyz, false);
        angles.set_angles(Vec3::new(0.0, 0.0, -170.0), false, EulerRotationOrder::Xyz, true);
        assert!((angles.current.z - 190.0).abs() < 1.0e-9);
    }

    #[test]
    fn set_rotation_order_preserves_rotation() {
        let mut angles = PreferredEulerAngles::default();
        angles.set_angles(Vec3::new(10.0, 20.0, 30.0), false, EulerRotationOrder::Xyz, false);
        let before = angles.rotation(false);
        angles.set_rotation_order(EulerRotationOrder::Zyx);
        assert_eq!(angles.rotation_order, EulerRotationOrder::Zyx);
        assert!(angles.rotation(false).abs_diff_eq(before, 1.0e-9));
    }

    #[test]
    fn normalize_degrees_range() {
        assert_eq!(normalize_degrees(190.0), -170.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
    }
}
