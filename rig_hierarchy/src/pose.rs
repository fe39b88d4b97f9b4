// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Captured poses.

use alloc::vec::Vec;

use crate::element::{ElementIndex, ElementKey};
use crate::math::{Transform, Vec3};

/// One element's state inside a [`Pose`].
#[derive(Clone, Debug, PartialEq)]
pub struct PoseElement {
    /// The element.
    pub key: ElementKey,
    /// Handle at capture time. Only trusted when the pose is applied to a
    /// hierarchy with the same topology version; otherwise the key is looked
    /// up again.
    pub index: ElementIndex,
    /// Local transform (identity for curves).
    pub local: Transform,
    /// Global transform (identity for curves).
    pub global: Transform,
    /// First parent with a non-zero weight, for multi-parent elements.
    pub active_parent: Option<ElementKey>,
    /// Curve value (zero for transform elements).
    pub curve_value: f32,
    /// Preferred euler angles of controls, in the control's rotation order.
    pub preferred_euler_angles: Option<Vec3>,
}

/// An immutable snapshot of element transforms and curve values.
///
/// Produced by [`Hierarchy::pose`](crate::hierarchy::Hierarchy::pose) and
/// applied with [`Hierarchy::set_pose`](crate::hierarchy::Hierarchy::set_pose).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    pub(crate) elements: Vec<PoseElement>,
    pub(crate) topology_version: u32,
    pub(crate) hash: u32,
}

impl Pose {
    /// Number of captured elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing was captured.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The captured state of `key`.
    #[must_use]
    pub fn find(&self, key: &ElementKey) -> Option<&PoseElement> {
        self.elements.iter().find(|e| &e.key == key)
    }

    /// Whether `key` was captured.
    #[must_use]
    pub fn contains(&self, key: &ElementKey) -> bool {
        self.find(key).is_some()
    }

    /// Captured elements, in hierarchy order.
    pub fn iter(&self) -> impl Iterator<Item = &PoseElement> + '_ {
        self.elements.iter()
    }

    /// Topology version of the hierarchy at capture time.
    #[inline]
    #[must_use]
    pub fn topology_version(&self) -> u32 {
        self.topology_version
    }

    /// Hash of the topology version and every captured key.
    ///
    /// Two poses captured from the same topology with the same filter have
    /// the same hash.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u32 {
        self.hash
    }
}

impl<'a> IntoIterator for &'a Pose {
    type Item = &'a PoseElement;
    type IntoIter = core::slice::Iter<'a, PoseElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Folds `value` into `seed`.
pub(crate) fn hash_combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// FNV-1a over a key's type and name.
pub(crate) fn key_hash(key: &ElementKey) -> u32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "element type ordinals fit in a byte"
    )]
    let kind = key.kind().ordinal() as u8;
    let mut hash = 0x811c_9dc5_u32;
    for byte in core::iter::once(kind).chain(key.name().bytes()) {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
