// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent constraint weights.

use crate::math::SMALL_NUMBER;

use super::id::ElementIndex;

/// Per-channel influence of one parent on a multi-parent element.
///
/// Each channel is independently non-negative; writes through the hierarchy
/// clamp negative values to zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementWeight {
    /// Influence on translation.
    pub location: f64,
    /// Influence on rotation.
    pub rotation: f64,
    /// Influence on scale.
    pub scale: f64,
}

impl Default for ElementWeight {
    fn default() -> Self {
        Self::FULL
    }
}

impl ElementWeight {
    /// Full influence on every channel.
    pub const FULL: Self = Self::splat(1.0);

    /// No influence.
    pub const ZERO: Self = Self::splat(0.0);

    /// Returned for a parent that is not in the constraint list.
    pub const NOT_FOUND: Self = Self::splat(f64::MAX);

    /// Creates a weight from its channels.
    #[inline]
    #[must_use]
    pub const fn new(location: f64, rotation: f64, scale: f64) -> Self {
        Self {
            location,
            rotation,
            scale,
        }
    }

    /// The same weight on every channel.
    #[inline]
    #[must_use]
    pub const fn splat(weight: f64) -> Self {
        Self::new(weight, weight, weight)
    }

    /// Whether translation is influenced.
    #[inline]
    #[must_use]
    pub fn affects_location(&self) -> bool {
        self.location > SMALL_NUMBER
    }

    /// Whether rotation is influenced.
    #[inline]
    #[must_use]
    pub fn affects_rotation(&self) -> bool {
        self.rotation > SMALL_NUMBER
    }

    /// Whether scale is influenced.
    #[inline]
    #[must_use]
    pub fn affects_scale(&self) -> bool {
        self.scale > SMALL_NUMBER
    }

    /// Whether any channel is influenced.
    #[inline]
    #[must_use]
    pub fn affects_anything(&self) -> bool {
        self.affects_location() || self.affects_rotation() || self.affects_scale()
    }

    /// Whether every channel is within `SMALL_NUMBER` of zero.
    #[inline]
    #[must_use]
    pub fn is_almost_zero(&self) -> bool {
        !self.affects_anything()
    }

    /// Returns a copy with negative channels raised to zero.
    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(
            self.location.max(0.0),
            self.rotation.max(0.0),
            self.scale.max(0.0),
        )
    }

    /// Channel-wise comparison within `tolerance`.
    #[must_use]
    pub fn abs_diff_eq(&self, rhs: &Self, tolerance: f64) -> bool {
        (self.location - rhs.location).abs() <= tolerance
            && (self.rotation - rhs.rotation).abs() <= tolerance
            && (self.scale - rhs.scale).abs() <= tolerance
    }
}

/// One weighted parent of a multi-parent element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParentConstraint {
    /// The parent element.
    pub parent: ElementIndex,
    /// Weight used for current transforms.
    pub weight: ElementWeight,
    /// Weight used for initial transforms.
    pub initial_weight: ElementWeight,
}

impl ParentConstraint {
    /// Weight for the initial or current pose.
    #[inline]
    #[must_use]
    pub fn weight_for(&self, initial: bool) -> ElementWeight {
        if initial {
            self.initial_weight
        } else {
            self.weight
        }
    }

    pub(crate) fn weight_mut(&mut self, initial: bool) -> &mut ElementWeight {
        if initial {
            &mut self.initial_weight
        } else {
            &mut self.weight
        }
    }
}
