// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element allocation, removal, and lookup.

use alloc::vec::Vec;

use super::Hierarchy;
use crate::dirty;
use crate::element::{
    ControlSettings, CurveData, ElementData, ElementIndex, ElementKey, ElementType,
    ElementWeight, ParentArity, Parents, PoseSlots, TransformType,
};
use crate::error::HierarchyError;
use crate::math::{EulerRotationOrder, Transform};
use crate::notify::Notification;

/// A read-only view of one element.
#[derive(Clone, Copy, Debug)]
pub struct ElementRef<'a> {
    /// The element's handle.
    pub index: ElementIndex,
    /// The element's key.
    pub key: &'a ElementKey,
    /// Position within the per-type bucket.
    pub sub_index: usize,
    /// Number of parents (constraints for multi-parent elements).
    pub num_parents: usize,
    /// Incremented on every pose transform write.
    pub pose_version: u32,
}

impl ElementRef<'_> {
    /// The element's type.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ElementType {
        self.key.kind()
    }
}

impl Hierarchy {
    // -- Adding --

    /// Adds an element with identity transforms.
    ///
    /// Multi-parent elements give the first parent full weight and every
    /// further parent zero weight. Single-parent elements accept at most one
    /// parent, curves none.
    pub fn add_element(
        &mut self,
        key: ElementKey,
        parents: &[ElementIndex],
    ) -> Result<ElementIndex, HierarchyError> {
        let idx = self.insert(key, ControlSettings::default(), parents)?;
        Ok(self.handle(idx))
    }

    /// Adds a bone. `transform` is the initial pose, in global space when
    /// `in_global` is set and relative to `parent` otherwise.
    pub fn add_bone(
        &mut self,
        name: &str,
        parent: Option<ElementIndex>,
        transform: Transform,
        in_global: bool,
    ) -> Result<ElementIndex, HierarchyError> {
        self.add_posed(ElementType::Bone, name, parent, transform, in_global)
    }

    /// Adds a null (a multi-parent locator).
    pub fn add_null(
        &mut self,
        name: &str,
        parent: Option<ElementIndex>,
        transform: Transform,
        in_global: bool,
    ) -> Result<ElementIndex, HierarchyError> {
        self.add_posed(ElementType::Null, name, parent, transform, in_global)
    }

    /// Adds a control. `offset`, `value` and `shape` are local transforms:
    /// the control's global is `value * offset * parent` and its shape is
    /// expressed relative to that global.
    pub fn add_control(
        &mut self,
        name: &str,
        parent: Option<ElementIndex>,
        settings: ControlSettings,
        offset: Transform,
        value: Transform,
        shape: Transform,
    ) -> Result<ElementIndex, HierarchyError> {
        let mut settings = settings;
        if !self.config.enable_rotation_order {
            settings.preferred_rotation_order = EulerRotationOrder::default();
        }
        let parents: Vec<ElementIndex> = parent.into_iter().collect();
        let key = ElementKey::new(ElementType::Control, name);
        let idx = self.insert(key, settings, &parents)?;

        let rotation_order_enabled = self.config.enable_rotation_order;
        let slots = self.data[idx as usize].control_mut().map(|control| {
            if rotation_order_enabled {
                control.preferred.set_from_rotation(value.rotation, true);
                control.preferred.set_from_rotation(value.rotation, false);
            }
            (control.pose, control.offset, control.shape)
        });
        if let Some((pose, offset_slots, shape_slots)) = slots {
            init_slots(self, offset_slots, offset, true);
            init_slots(self, pose, value, true);
            init_slots(self, shape_slots, shape, true);
        }
        Ok(self.handle(idx))
    }

    /// Adds a curve holding `value`. The value counts as unset until written.
    pub fn add_curve(&mut self, name: &str, value: f32) -> Result<ElementIndex, HierarchyError> {
        let key = ElementKey::new(ElementType::Curve, name);
        let idx = self.insert(key, ControlSettings::default(), &[])?;
        self.data[idx as usize] = ElementData::Curve(CurveData {
            value,
            is_set: false,
        });
        Ok(self.handle(idx))
    }

    /// Adds a physics proxy.
    ///
    /// Fails with [`HierarchyError::PhysicsDisabled`] when the configuration
    /// disables physics.
    pub fn add_physics(
        &mut self,
        name: &str,
        parent: Option<ElementIndex>,
        transform: Transform,
        in_global: bool,
    ) -> Result<ElementIndex, HierarchyError> {
        self.add_posed(ElementType::Physics, name, parent, transform, in_global)
    }

    /// Adds a reference (a multi-parent element whose transform is supplied
    /// from outside).
    pub fn add_reference(
        &mut self,
        name: &str,
        parent: Option<ElementIndex>,
    ) -> Result<ElementIndex, HierarchyError> {
        self.add_posed(
            ElementType::Reference,
            name,
            parent,
            Transform::IDENTITY,
            false,
        )
    }

    /// Adds an unparented connector.
    pub fn add_connector(&mut self, name: &str) -> Result<ElementIndex, HierarchyError> {
        self.add_element(ElementKey::new(ElementType::Connector, name), &[])
    }

    /// Adds a socket.
    pub fn add_socket(
        &mut self,
        name: &str,
        parent: Option<ElementIndex>,
        transform: Transform,
        in_global: bool,
    ) -> Result<ElementIndex, HierarchyError> {
        self.add_posed(ElementType::Socket, name, parent, transform, in_global)
    }

    fn add_posed(
        &mut self,
        kind: ElementType,
        name: &str,
        parent: Option<ElementIndex>,
        transform: Transform,
        in_global: bool,
    ) -> Result<ElementIndex, HierarchyError> {
        let parents: Vec<ElementIndex> = parent.into_iter().collect();
        let idx = self.insert(ElementKey::new(kind, name), ControlSettings::default(), &parents)?;
        if let Some(slots) = self.data[idx as usize].pose().copied() {
            init_slots(self, slots, transform, !in_global);
        }
        Ok(self.handle(idx))
    }

    /// Validates, allocates a slot and links parents.
    fn insert(
        &mut self,
        key: ElementKey,
        settings: ControlSettings,
        parents: &[ElementIndex],
    ) -> Result<u32, HierarchyError> {
        let kind = key.kind();
        if self.lookup.contains_key(&key) {
            return Err(HierarchyError::DuplicateKey(key));
        }
        if kind == ElementType::Physics && !self.config.enable_physics {
            return Err(HierarchyError::PhysicsDisabled);
        }
        match kind.parent_arity() {
            ParentArity::None if !parents.is_empty() => {
                return Err(HierarchyError::NoTransform(key));
            }
            ParentArity::Single if parents.len() > 1 => {
                return Err(HierarchyError::NotMultiParent(key));
            }
            _ => {}
        }
        for &parent in parents {
            if !self.contains(parent) {
                return Err(HierarchyError::ParentNotFound(parent));
            }
            let parent_key = &self.keys[parent.idx as usize];
            if !parent_key.kind().has_transform() {
                return Err(HierarchyError::NoTransform(parent_key.clone()));
            }
        }

        let data = ElementData::allocate(kind, settings, &mut self.storage);
        let sub_index = self.by_type[kind.ordinal()].len();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "bucket sizes are bounded by u32 handles"
        )]
        let sub_index = sub_index as u32;
        let links = Parents::for_arity(kind.parent_arity());

        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] = self.generation[i].wrapping_add(1);
            self.keys[i] = key.clone();
            self.data[i] = data;
            self.sub_index[i] = sub_index;
            self.pose_version[i] = 0;
            self.live[i] = true;
            self.parents[i] = links;
            self.dependents[i].clear();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.slot_count();
            self.keys.push(key.clone());
            self.data.push(data);
            self.sub_index.push(sub_index);
            self.pose_version.push(0);
            self.generation.push(0);
            self.live.push(true);
            self.parents.push(links);
            self.dependents.push(Vec::new());
            idx
        };

        self.order.push(idx);
        self.by_type[kind.ordinal()].push(idx);
        self.lookup.insert(key.clone(), idx);

        for (i, parent) in parents.iter().enumerate() {
            let weight = if i == 0 {
                ElementWeight::FULL
            } else {
                ElementWeight::ZERO
            };
            if !self.parents[idx as usize].iter().any(|p| p == *parent) {
                self.link_parent(idx, parent.idx, weight);
            }
        }

        self.bump_topology();
        self.pending_added.push(idx);
        self.changes.mark(idx, dirty::TOPOLOGY);
        self.notify(Notification::ElementAdded(key));
        Ok(idx)
    }

    // -- Removal --

    /// Removes an element.
    ///
    /// Children lose their constraint to the removed element and keep their
    /// global transforms. Returns `false` (and does nothing) if the handle is
    /// stale.
    pub fn remove_element(&mut self, index: ElementIndex) -> bool {
        if !self.contains(index) {
            return false;
        }
        let idx = index.idx;
        let i = idx as usize;

        for child in self.dependents[i].clone() {
            self.begin_relink(child, true);
            self.unlink_parent(child, idx);
            self.end_relink(child, true);
        }

        let own_parents: Vec<u32> = self.parents[i].iter().map(|p| p.idx).collect();
        for parent in own_parents {
            self.unlink_parent(idx, parent);
        }
        self.parents[i] = Parents::None;

        let data = core::mem::replace(&mut self.data[i], ElementData::Curve(CurveData::default()));
        data.release(&mut self.storage);

        let key = self.keys[i].clone();
        self.lookup.remove(&key);
        self.order.retain(|&e| e != idx);
        let bucket = &mut self.by_type[key.kind().ordinal()];
        if let Some(pos) = bucket.iter().position(|&e| e == idx) {
            bucket.remove(pos);
            for &later in &bucket[pos..] {
                self.sub_index[later as usize] -= 1;
            }
        }

        // Remove dirty tracking dependencies.
        self.changes.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.live[i] = false;
        self.free_list.push(idx);

        self.bump_topology();
        self.pending_removed.push(idx);
        self.changes.mark(idx, dirty::TOPOLOGY);
        self.notify(Notification::ElementRemoved(key));
        true
    }

    /// Removes every element, newest first, and clears the undo stack.
    pub fn reset(&mut self) {
        for idx in self.ordered().into_iter().rev() {
            let handle = self.handle(idx);
            self.remove_element(handle);
        }
        self.stack.clear();
        self.notify(Notification::HierarchyReset);
    }

    // -- Lookup --

    /// Returns whether the handle refers to a live element.
    #[must_use]
    pub fn contains(&self, index: ElementIndex) -> bool {
        self.is_live(index.idx) && self.generation[index.idx as usize] == index.generation
    }

    /// Finds an element by key.
    #[must_use]
    pub fn find(&self, key: &ElementKey) -> Option<ElementIndex> {
        self.lookup.get(key).map(|&idx| self.handle(idx))
    }

    /// Returns the element's key.
    #[must_use]
    pub fn key(&self, index: ElementIndex) -> &ElementKey {
        self.validate(index);
        &self.keys[index.idx as usize]
    }

    /// Returns the element's type.
    #[must_use]
    pub fn kind(&self, index: ElementIndex) -> ElementType {
        self.key(index).kind()
    }

    /// Returns a read-only view of the element.
    #[must_use]
    pub fn element(&self, index: ElementIndex) -> ElementRef<'_> {
        self.validate(index);
        let i = index.idx as usize;
        ElementRef {
            index,
            key: &self.keys[i],
            sub_index: self.sub_index[i] as usize,
            num_parents: self.parents[i].len(),
            pose_version: self.pose_version[i],
        }
    }

    /// Number of live elements.
    #[inline]
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.order.len()
    }

    /// Number of live elements of one type.
    #[inline]
    #[must_use]
    pub fn num_elements_of_type(&self, kind: ElementType) -> usize {
        self.by_type[kind.ordinal()].len()
    }

    /// Elements of one type, in insertion order.
    #[must_use]
    pub fn elements_of_type(&self, kind: ElementType) -> Vec<ElementIndex> {
        self.by_type[kind.ordinal()]
            .iter()
            .map(|&idx| self.handle(idx))
            .collect()
    }

    /// The `sub`-th element of one type.
    #[must_use]
    pub fn index_of_sub(&self, kind: ElementType, sub: usize) -> Option<ElementIndex> {
        self.by_type[kind.ordinal()]
            .get(sub)
            .map(|&idx| self.handle(idx))
    }

    /// Position of the element within its per-type bucket.
    #[must_use]
    pub fn sub_index(&self, index: ElementIndex) -> usize {
        self.validate(index);
        self.sub_index[index.idx as usize] as usize
    }

    /// Every live element in insertion order.
    ///
    /// Parents supplied at creation precede their children, but a parent
    /// linked later through [`set_parent`](Self::set_parent) or
    /// [`add_parent`](Self::add_parent) may come after its child. Use
    /// [`traverse_all`](Self::traverse_all) to walk from roots to leaves.
    pub fn iter(&self) -> impl Iterator<Item = ElementIndex> + '_ {
        self.order.iter().map(|&idx| self.handle(idx))
    }

    // -- Control settings --

    /// A control's settings, or `None` for other elements.
    #[must_use]
    pub fn control_settings(&self, index: ElementIndex) -> Option<&ControlSettings> {
        self.validate(index);
        self.data[index.idx as usize].control().map(|c| &c.settings)
    }

    /// Replaces a control's settings. Returns `false` for other elements or
    /// when nothing changed.
    pub fn set_control_settings(&mut self, index: ElementIndex, settings: ControlSettings) -> bool {
        self.validate(index);
        let rotation_order_enabled = self.config.enable_rotation_order;
        let Some(control) = self.data[index.idx as usize].control_mut() else {
            return false;
        };
        let mut settings = settings;
        if !rotation_order_enabled {
            settings.preferred_rotation_order = EulerRotationOrder::default();
        }
        if control.settings == settings {
            return false;
        }
        control
            .preferred
            .set_rotation_order(settings.preferred_rotation_order);
        control.settings = settings;
        let key = self.keys[index.idx as usize].clone();
        self.notify(Notification::ControlSettingChanged(key));
        true
    }

    /// A control's preferred euler angles in its preferred rotation order.
    #[must_use]
    pub fn control_preferred_euler_angles(
        &self,
        index: ElementIndex,
        initial: bool,
    ) -> Option<crate::math::Vec3> {
        self.validate(index);
        self.data[index.idx as usize]
            .control()
            .map(|c| c.preferred.get(initial))
    }
}

/// Writes `value` into both the initial and current slot of one space and
/// dirties the other space. Only used on freshly allocated slots.
fn init_slots(hierarchy: &mut Hierarchy, slots: PoseSlots, value: Transform, local: bool) {
    for initial in [true, false] {
        let ty = TransformType::from_flags(initial, local);
        slots.set(&mut hierarchy.storage, ty, value);
        slots.set_dirty(&mut hierarchy.storage, ty, false);
        slots.set_dirty(&mut hierarchy.storage, ty.swap_local_and_global(), true);
    }
}
