// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pose capture and restore.

use alloc::vec::Vec;

use super::Hierarchy;
use crate::element::{ElementData, ElementIndex, ElementKey, ElementType, ElementTypeMask, TransformType};
use crate::math::{SMALL_NUMBER, Transform};
use crate::pose::{Pose, PoseElement, hash_combine, key_hash};

impl Hierarchy {
    /// Captures the initial or current state of every element whose type is
    /// in `mask`.
    ///
    /// A non-empty `items` restricts the capture to those keys. Transient
    /// controls are skipped unless `include_transient` is set.
    pub fn pose(
        &mut self,
        initial: bool,
        mask: ElementTypeMask,
        items: &[ElementKey],
        include_transient: bool,
    ) -> Pose {
        let local_type = TransformType::from_flags(initial, true);
        let global_type = local_type.make_global();

        let mut elements = Vec::new();
        let mut hash = self.topology_version;
        for idx in self.ordered() {
            let i = idx as usize;
            let kind = self.keys[i].kind();
            if !mask.contains(kind) || (!items.is_empty() && !items.contains(&self.keys[i])) {
                continue;
            }
            let transient = self.data[i]
                .control()
                .is_some_and(|c| c.settings.is_transient);
            if transient && !include_transient {
                continue;
            }

            let index = self.handle(idx);
            let (local, global, curve_value) = match &self.data[i] {
                ElementData::Curve(curve) => (Transform::IDENTITY, Transform::IDENTITY, curve.value),
                _ => (
                    self.transform_at(idx, local_type),
                    self.transform_at(idx, global_type),
                    0.0,
                ),
            };
            let active_parent = if self.is_multi_parent(idx) {
                self.active_parent(index)
                    .map(|parent| self.keys[parent.idx as usize].clone())
            } else {
                None
            };
            let preferred_euler_angles = self.data[i].control().map(|c| c.preferred.get(initial));

            let key = self.keys[i].clone();
            hash = hash_combine(hash, key_hash(&key));
            elements.push(PoseElement {
                key,
                index,
                local,
                global,
                active_parent,
                curve_value,
                preferred_euler_angles,
            });
        }

        Pose {
            elements,
            topology_version: self.topology_version,
            hash,
        }
    }

    /// Writes a captured pose back into the `ty` slots.
    ///
    /// `weight` is clamped to `[0, 1]`. Below [`SMALL_NUMBER`] nothing
    /// happens; below one the captured values are blended with the current
    /// ones. Multi-parent elements first switch to their captured active
    /// parent, since that changes what their local transform means. Writes
    /// propagate to children and record no undo.
    pub fn set_pose(
        &mut self,
        pose: &Pose,
        ty: TransformType,
        mask: ElementTypeMask,
        items: &[ElementKey],
        weight: f32,
    ) {
        let weight = weight.clamp(0.0, 1.0);
        if f64::from(weight) < SMALL_NUMBER {
            return;
        }
        let blend = f64::from(weight) < 1.0 - SMALL_NUMBER;
        let same_topology = pose.topology_version == self.topology_version;

        for element in pose {
            let kind = element.key.kind();
            if !mask.contains(kind) || (!items.is_empty() && !items.contains(&element.key)) {
                continue;
            }
            let Some(index) = self.resolve(element, same_topology) else {
                continue;
            };
            let idx = index.idx;

            if kind == ElementType::Curve {
                let value = if blend {
                    let current = self.curve_value(index);
                    current + (element.curve_value - current) * weight
                } else {
                    element.curve_value
                };
                self.set_curve_at(idx, value, false, false);
                continue;
            }

            if let Some(parent_key) = &element.active_parent {
                if let Some(parent) = self.find(parent_key) {
                    if self.is_multi_parent(idx) && self.active_parent(index) != Some(parent) {
                        // A rejected switch keeps the current parent.
                        let _ = self.switch_to_parent(index, parent, ty.is_initial(), true, None);
                    }
                }
            }

            let captured = if ty.is_local() {
                element.local
            } else {
                element.global
            };
            let value = if blend {
                let current = self.transform_at(idx, ty);
                current.lerp(&captured, f64::from(weight))
            } else {
                captured
            };
            self.set_transform_at(idx, value, ty, true, false, false);

            if !blend && ty.is_local() {
                if let (Some(angles), Some(control)) = (
                    element.preferred_euler_angles,
                    self.data[idx as usize].control_mut(),
                ) {
                    let order = control.preferred.rotation_order;
                    control
                        .preferred
                        .set_angles(angles, ty.is_initial(), order, false);
                }
            }
        }
    }

    /// Trusts the captured handle only while the topology is unchanged.
    fn resolve(&self, element: &PoseElement, same_topology: bool) -> Option<ElementIndex> {
        if same_topology && self.contains(element.index) {
            return Some(element.index);
        }
        self.find(&element.key)
    }
}
