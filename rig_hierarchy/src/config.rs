// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time hierarchy configuration.

use crate::math::SMALL_NUMBER;

/// Options fixed for the lifetime of a [`Hierarchy`](crate::hierarchy::Hierarchy).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HierarchyConfig {
    /// Honor each control's preferred rotation order. When off, every control
    /// uses [`EulerRotationOrder::default`](crate::math::EulerRotationOrder)
    /// and local writes do not refresh preferred euler angles.
    pub enable_rotation_order: bool,
    /// Allow physics elements to be added.
    pub enable_physics: bool,
    /// Scale axes at or below this magnitude count as zero when deciding
    /// whether to keep a previously stored local translation and scale.
    pub zero_scale_tolerance: f64,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            enable_rotation_order: true,
            enable_physics: true,
            zero_scale_tolerance: SMALL_NUMBER,
        }
    }
}
