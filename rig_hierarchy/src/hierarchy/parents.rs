// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent links, parent weights, and space switching.

use alloc::vec::Vec;

use understory_dirty::EagerPolicy;

use super::Hierarchy;
use super::topology::DependencyMap;
use crate::dirty;
use crate::element::{
    ElementIndex, ElementType, ElementWeight, ParentArity, ParentConstraint, Parents,
    TransformType,
};
use crate::error::HierarchyError;
use crate::math::SMALL_NUMBER;
use crate::notify::{MutationEvent, Notification};
use crate::trace::ParentSwitchedEvent;

/// Name of the reference element used by
/// [`Hierarchy::switch_to_world_space`].
pub const WORLD_SPACE_NAME: &str = "WorldSpace";

impl Hierarchy {
    // -- Links --

    /// Adds `parent` to `child`'s parents.
    ///
    /// Multi-parent elements append a constraint with `weight`; single-parent
    /// elements accept a parent only while they have none. With
    /// `maintain_global` the child keeps its global transform, otherwise its
    /// local transform. Adding an existing parent does nothing.
    pub fn add_parent(
        &mut self,
        child: ElementIndex,
        parent: ElementIndex,
        weight: ElementWeight,
        maintain_global: bool,
    ) -> Result<(), HierarchyError> {
        self.check_link(child, parent)?;
        let links = &self.parents[child.idx as usize];
        if links.iter().any(|p| p == parent) {
            return Ok(());
        }
        if matches!(links, Parents::Single(Some(_))) {
            return Err(HierarchyError::NotMultiParent(self.keys[child.idx as usize].clone()));
        }

        self.begin_relink(child.idx, maintain_global);
        self.link_parent(child.idx, parent.idx, weight.clamped());
        self.end_relink(child.idx, maintain_global);
        Ok(())
    }

    /// Replaces every parent of `child` with `parent` at full weight, or
    /// removes all parents for `None`.
    pub fn set_parent(
        &mut self,
        child: ElementIndex,
        parent: Option<ElementIndex>,
        maintain_global: bool,
    ) -> Result<(), HierarchyError> {
        let Some(parent) = parent else {
            return self.remove_all_parents(child, maintain_global);
        };
        self.check_link(child, parent)?;
        let current: Vec<u32> = self.parents[child.idx as usize].iter().map(|p| p.idx).collect();
        if current == [parent.idx] {
            return Ok(());
        }

        self.begin_relink(child.idx, maintain_global);
        for old in current {
            self.unlink_parent(child.idx, old);
        }
        self.link_parent(child.idx, parent.idx, ElementWeight::FULL);
        self.end_relink(child.idx, maintain_global);
        Ok(())
    }

    /// Removes `parent` from `child`'s parents.
    pub fn remove_parent(
        &mut self,
        child: ElementIndex,
        parent: ElementIndex,
        maintain_global: bool,
    ) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        if !self.contains(parent) {
            return Err(HierarchyError::ParentNotFound(parent));
        }
        if !self.parents[child.idx as usize].iter().any(|p| p == parent) {
            return Err(HierarchyError::NotAParent {
                child: self.keys[child.idx as usize].clone(),
                parent: self.keys[parent.idx as usize].clone(),
            });
        }
        self.begin_relink(child.idx, maintain_global);
        self.unlink_parent(child.idx, parent.idx);
        self.end_relink(child.idx, maintain_global);
        Ok(())
    }

    /// Removes every parent of `child`.
    pub fn remove_all_parents(
        &mut self,
        child: ElementIndex,
        maintain_global: bool,
    ) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        let current: Vec<u32> = self.parents[child.idx as usize].iter().map(|p| p.idx).collect();
        if current.is_empty() {
            return Ok(());
        }
        self.begin_relink(child.idx, maintain_global);
        for parent in current {
            self.unlink_parent(child.idx, parent);
        }
        self.end_relink(child.idx, maintain_global);
        Ok(())
    }

    /// Shared validation of a prospective `child -> parent` link.
    fn check_link(&self, child: ElementIndex, parent: ElementIndex) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        if !self.contains(parent) {
            return Err(HierarchyError::ParentNotFound(parent));
        }
        let child_key = &self.keys[child.idx as usize];
        let parent_key = &self.keys[parent.idx as usize];
        if child_key.kind().parent_arity() == ParentArity::None {
            return Err(HierarchyError::NoTransform(child_key.clone()));
        }
        if !parent_key.kind().has_transform() {
            return Err(HierarchyError::NoTransform(parent_key.clone()));
        }
        if child == parent || self.is_parented_to(parent, child) {
            return Err(HierarchyError::WouldCycle {
                child: child_key.clone(),
                parent: parent_key.clone(),
            });
        }
        Ok(())
    }

    /// Records the link in the parent list, the dependents list and the
    /// change tracker. No transform bookkeeping.
    pub(crate) fn link_parent(&mut self, child: u32, parent: u32, weight: ElementWeight) {
        let handle = self.handle(parent);
        match &mut self.parents[child as usize] {
            Parents::Multi(constraints) => constraints.push(ParentConstraint {
                parent: handle,
                weight,
                initial_weight: weight,
            }),
            Parents::Single(slot) => *slot = Some(handle),
            Parents::None => return,
        }
        self.dependents[parent as usize].push(child);
        let _ = self.changes.add_dependency(child, parent, dirty::POSE);
    }

    /// Reverses [`link_parent`](Self::link_parent). Returns whether a link
    /// existed.
    pub(crate) fn unlink_parent(&mut self, child: u32, parent: u32) -> bool {
        let removed = match &mut self.parents[child as usize] {
            Parents::Multi(constraints) => {
                let before = constraints.len();
                constraints.retain(|c| c.parent.idx != parent);
                constraints.len() != before
            }
            Parents::Single(slot) if slot.is_some_and(|p| p.idx == parent) => {
                *slot = None;
                true
            }
            _ => false,
        };
        if removed {
            self.dependents[parent as usize].retain(|&d| d != child);
            self.changes.remove_dependency(child, parent, dirty::POSE);
        }
        removed
    }

    /// Pulls the space `child` keeps across a parent change into the cache.
    pub(crate) fn begin_relink(&mut self, child: u32, maintain_global: bool) {
        for initial in [true, false] {
            let keep = TransformType::from_flags(initial, !maintain_global);
            if !maintain_global {
                // The child's global moves, so its dependents follow.
                self.propagate_dirty_flags_at(child, initial, true);
            }
            if self.is_control(child) {
                self.offset_at(child, keep);
                self.shape_at(child, keep.make_local());
            }
            self.transform_at(child, keep);
        }
    }

    /// Dirties the space `child` does not keep and records the change.
    pub(crate) fn end_relink(&mut self, child: u32, maintain_global: bool) {
        if let Some(slots) = self.pose_slots(child) {
            for initial in [true, false] {
                let dirty = TransformType::from_flags(initial, maintain_global);
                slots.set_dirty(&mut self.storage, dirty, true);
                if let Some(control) = self.data[child as usize].control() {
                    let (offset, shape) = (control.offset, control.shape);
                    offset.set_dirty(&mut self.storage, dirty, true);
                    shape.set_dirty(&mut self.storage, dirty.make_global(), true);
                }
            }
            self.pose_version[child as usize] = self.pose_version[child as usize].wrapping_add(1);
        }
        self.bump_topology();
        self.changes.mark(child, dirty::TOPOLOGY);
        self.changes.mark_with(child, dirty::POSE, &EagerPolicy);
        let key = self.keys[child as usize].clone();
        self.notify(Notification::ParentChanged(key));
    }

    // -- Weights --

    /// The weight of `parent` on `child`, or [`ElementWeight::NOT_FOUND`] if
    /// `parent` is not a constraint of `child`.
    #[must_use]
    pub fn parent_weight(&self, child: ElementIndex, parent: ElementIndex, initial: bool) -> ElementWeight {
        self.validate(child);
        self.parents[child.idx as usize]
            .constraints()
            .iter()
            .find(|c| c.parent == parent)
            .map_or(ElementWeight::NOT_FOUND, |c| c.weight_for(initial))
    }

    /// Every constraint weight of `child`, in constraint order.
    #[must_use]
    pub fn parent_weights(&self, child: ElementIndex, initial: bool) -> Vec<ElementWeight> {
        self.validate(child);
        self.parents[child.idx as usize]
            .constraints()
            .iter()
            .map(|c| c.weight_for(initial))
            .collect()
    }

    /// Changes the weight of one constraint. See
    /// [`set_parent_weights`](Self::set_parent_weights).
    pub fn set_parent_weight(
        &mut self,
        child: ElementIndex,
        parent: ElementIndex,
        weight: ElementWeight,
        initial: bool,
        affect_children: bool,
    ) -> bool {
        self.validate(child);
        let constraints = self.parents[child.idx as usize].constraints();
        let Some(position) = constraints.iter().position(|c| c.parent == parent) else {
            return false;
        };
        let mut weights: Vec<ElementWeight> =
            constraints.iter().map(|c| c.weight_for(initial)).collect();
        weights[position] = weight;
        self.set_parent_weights(child, &weights, initial, affect_children)
    }

    /// Replaces every constraint weight of a multi-parent element.
    ///
    /// Weights are clamped to be non-negative. With `affect_children` the
    /// child keeps its local transform and moves, otherwise it keeps its
    /// global transform. Returns `false` without changing anything when the
    /// lengths differ, nothing changes, or the child is an animation channel.
    pub fn set_parent_weights(
        &mut self,
        child: ElementIndex,
        weights: &[ElementWeight],
        initial: bool,
        affect_children: bool,
    ) -> bool {
        self.validate(child);
        let idx = child.idx;
        let i = idx as usize;
        if self.is_animation_channel(idx) {
            return false;
        }
        let constraints = self.parents[i].constraints();
        if constraints.is_empty() || constraints.len() != weights.len() {
            return false;
        }
        let weights: Vec<ElementWeight> = weights.iter().map(|w| w.clamped()).collect();
        let changed = constraints
            .iter()
            .zip(&weights)
            .any(|(c, w)| !c.weight_for(initial).abs_diff_eq(w, SMALL_NUMBER));
        if !changed {
            return false;
        }

        self.propagate_dirty_flags_at(idx, initial, affect_children);
        let keep = TransformType::from_flags(initial, affect_children);
        if self.is_control(idx) {
            self.offset_at(idx, keep.make_local());
            self.shape_at(idx, keep.make_local());
        }
        self.transform_at(idx, keep);

        if let Parents::Multi(constraints) = &mut self.parents[i] {
            for (constraint, weight) in constraints.iter_mut().zip(&weights) {
                *constraint.weight_mut(initial) = *weight;
            }
        }

        if let Some(slots) = self.pose_slots(idx) {
            slots.set_dirty(&mut self.storage, keep.swap_local_and_global(), true);
        }
        if let Some(control) = self.data[i].control() {
            let (offset, shape) = (control.offset, control.shape);
            offset.set_dirty(&mut self.storage, keep.make_global(), true);
            shape.set_dirty(&mut self.storage, keep.make_global(), true);
        }
        self.pose_version[i] = self.pose_version[i].wrapping_add(1);
        self.changes.mark_with(idx, dirty::POSE, &EagerPolicy);

        let key = self.keys[i].clone();
        self.notify(Notification::ParentWeightsChanged(key.clone()));
        self.emit(|| MutationEvent::ParentWeightsSet {
            key,
            weights,
            initial,
            affect_children,
        });
        true
    }

    // -- Space switching --

    /// The parent currently driving `child`: the first constraint with a
    /// non-zero current weight, or the single parent.
    #[must_use]
    pub fn active_parent(&self, child: ElementIndex) -> Option<ElementIndex> {
        self.validate(child);
        match &self.parents[child.idx as usize] {
            Parents::Multi(constraints) => constraints
                .iter()
                .find(|c| !c.weight.is_almost_zero())
                .map(|c| c.parent),
            Parents::Single(parent) => *parent,
            Parents::None => None,
        }
    }

    /// Checks whether `child` may be switched to `parent` without creating a
    /// cycle, also following the edges of `map`.
    pub fn can_switch_to_parent(
        &mut self,
        child: ElementIndex,
        parent: ElementIndex,
        map: Option<&DependencyMap>,
    ) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        if !self.contains(parent) {
            return Err(HierarchyError::ParentNotFound(parent));
        }
        let child_key = self.keys[child.idx as usize].clone();
        let parent_key = self.keys[parent.idx as usize].clone();
        if !self.is_multi_parent(child.idx) {
            return Err(HierarchyError::NotMultiParent(child_key));
        }
        if !parent_key.kind().has_transform() {
            return Err(HierarchyError::NoTransform(parent_key));
        }
        if self.is_animation_channel(child.idx) {
            return Err(HierarchyError::AnimationChannel(child_key));
        }
        if child == parent
            || self.is_parented_to(parent, child)
            || self.is_dependent_on(parent, child, map)
        {
            return Err(HierarchyError::WouldCycle {
                child: child_key,
                parent: parent_key,
            });
        }
        Ok(())
    }

    /// Puts all weight of `child` on `parent`, adding `parent` as a
    /// zero-weight constraint first if needed.
    ///
    /// On error nothing changes.
    pub fn switch_to_parent(
        &mut self,
        child: ElementIndex,
        parent: ElementIndex,
        initial: bool,
        affect_children: bool,
        map: Option<&DependencyMap>,
    ) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        if self.contains(parent) && self.active_parent(child) == Some(parent) {
            return Ok(());
        }
        self.can_switch_to_parent(child, parent, map)?;

        if self.parent_weight(child, parent, initial) == ElementWeight::NOT_FOUND {
            self.add_parent(child, parent, ElementWeight::ZERO, true)?;
        }
        let weights: Vec<ElementWeight> = self.parents[child.idx as usize]
            .constraints()
            .iter()
            .map(|c| {
                if c.parent == parent {
                    ElementWeight::FULL
                } else {
                    ElementWeight::ZERO
                }
            })
            .collect();
        if !self.set_parent_weights(child, &weights, initial, affect_children) {
            return Ok(());
        }

        self.tracer.parent_switched(&ParentSwitchedEvent {
            child,
            parent: Some(parent),
            initial,
        });
        Ok(())
    }

    /// Switches `child` to its first constraint, or to world space when it
    /// has none.
    pub fn switch_to_default_parent(
        &mut self,
        child: ElementIndex,
        initial: bool,
        affect_children: bool,
    ) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        match self.parents[child.idx as usize].constraints().first() {
            Some(first) => {
                let parent = first.parent;
                self.switch_to_parent(child, parent, initial, affect_children, None)
            }
            None => self.switch_to_world_space(child, initial, affect_children),
        }
    }

    /// Switches `child` to the world-space reference.
    pub fn switch_to_world_space(
        &mut self,
        child: ElementIndex,
        initial: bool,
        affect_children: bool,
    ) -> Result<(), HierarchyError> {
        if !self.contains(child) {
            return Err(HierarchyError::ChildNotFound(child));
        }
        if self.is_animation_channel(child.idx) {
            return Err(HierarchyError::AnimationChannel(self.keys[child.idx as usize].clone()));
        }
        let world = self.world_space_reference()?;
        self.switch_to_parent(child, world, initial, affect_children, None)
    }

    /// The unparented reference named [`WORLD_SPACE_NAME`], created on first
    /// use.
    pub fn world_space_reference(&mut self) -> Result<ElementIndex, HierarchyError> {
        let key = crate::element::ElementKey::new(ElementType::Reference, WORLD_SPACE_NAME);
        match self.find(&key) {
            Some(index) => Ok(index),
            None => self.add_reference(WORLD_SPACE_NAME, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AnimationType, ControlSettings, ElementKey};
    use crate::hierarchy::test_util::{assert_transform_eq, translation};
    use crate::math::Transform;

    /// Two bone spaces and a null constrained to the first.
    fn spaces() -> (Hierarchy, ElementIndex, ElementIndex, ElementIndex) {
        let mut h = Hierarchy::new();
        let a = h
            .add_bone("a", None, translation(10.0, 0.0, 0.0), false)
            .unwrap();
        let b = h
            .add_bone("b", None, translation(0.0, 10.0, 0.0), false)
            .unwrap();
        let n = h
            .add_null("n", Some(a), translation(1.0, 0.0, 0.0), false)
            .unwrap();
        (h, a, b, n)
    }

    #[test]
    fn add_parent_maintaining_global() {
        let (mut h, a, b, n) = spaces();
        h.add_parent(n, b, ElementWeight::ZERO, true).unwrap();
        assert_eq!(h.parent_weights(n, false), alloc::vec![ElementWeight::FULL, ElementWeight::ZERO]);
        assert_eq!(h.parent_weight(n, b, true), ElementWeight::ZERO);
        assert_eq!(h.parent_weight(a, b, false), ElementWeight::NOT_FOUND);
        assert_transform_eq(&h.global_transform(n), &translation(11.0, 0.0, 0.0));
        assert_eq!(h.active_parent(n), Some(a));
    }

    #[test]
    fn single_parent_rejects_second_parent() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        let b = h.add_bone("b", None, Transform::IDENTITY, false).unwrap();
        let c = h.add_bone("c", Some(a), Transform::IDENTITY, false).unwrap();
        assert!(matches!(
            h.add_parent(c, b, ElementWeight::FULL, true),
            Err(HierarchyError::NotMultiParent(_))
        ));
        h.set_parent(c, Some(b), true).unwrap();
        assert_eq!(h.parents(c), alloc::vec![b]);
    }

    #[test]
    fn remove_parent_errors() {
        let (mut h, a, b, n) = spaces();
        assert!(matches!(
            h.remove_parent(n, b, true),
            Err(HierarchyError::NotAParent { .. })
        ));
        h.remove_parent(n, a, true).unwrap();
        assert_eq!(h.num_parents(n), 0);
        assert_transform_eq(&h.global_transform(n), &translation(11.0, 0.0, 0.0));
    }

    #[test]
    fn reparent_keeping_local_moves_element() {
        let (mut h, _, b, n) = spaces();
        h.set_parent(n, Some(b), false).unwrap();
        assert_transform_eq(&h.global_transform(n), &translation(1.0, 10.0, 0.0));
    }

    #[test]
    fn weight_change_keeping_global_holds_position() {
        let (mut h, _, b, n) = spaces();
        h.add_parent(n, b, ElementWeight::ZERO, true).unwrap();
        let before = h.global_transform(n);
        assert!(h.set_parent_weights(
            n,
            &[ElementWeight::ZERO, ElementWeight::FULL],
            false,
            false
        ));
        assert_transform_eq(&h.global_transform(n), &before);
        assert_eq!(h.active_parent(n), Some(b));
        // Moving the new parent now moves the child.
        h.set_local_transform(b, translation(0.0, 20.0, 0.0), true);
        assert_transform_eq(&h.global_transform(n), &translation(11.0, 10.0, 0.0));
    }

    #[test]
    fn set_parent_weights_rejects_bad_input() {
        let (mut h, _, b, n) = spaces();
        h.add_parent(n, b, ElementWeight::ZERO, true).unwrap();
        assert!(!h.set_parent_weights(n, &[ElementWeight::FULL], false, true));
        assert!(!h.set_parent_weights(
            n,
            &[ElementWeight::FULL, ElementWeight::ZERO],
            false,
            true
        ));
        h.take_notifications();
        assert!(!h.set_parent_weight(n, b, ElementWeight::splat(-2.0), false, true));
        assert!(h.set_parent_weight(n, b, ElementWeight::splat(0.5), false, true));
        assert_eq!(
            h.take_notifications(),
            alloc::vec![Notification::ParentWeightsChanged(h.key(n).clone())]
        );
    }

    #[test]
    fn cycle_rejection_leaves_topology_unchanged() {
        let mut h = Hierarchy::new();
        let root = h.add_null("root", None, Transform::IDENTITY, false).unwrap();
        let child = h.add_null("child", Some(root), Transform::IDENTITY, false).unwrap();
        let version = h.topology_version();
        let err = h
            .switch_to_parent(root, child, false, true, None)
            .unwrap_err();
        assert_eq!(
            err,
            HierarchyError::WouldCycle {
                child: ElementKey::new(ElementType::Null, "root"),
                parent: ElementKey::new(ElementType::Null, "child"),
            }
        );
        assert_eq!(h.topology_version(), version);
        assert_eq!(h.num_parents(root), 0);
        assert!(matches!(
            h.add_parent(root, child, ElementWeight::FULL, true),
            Err(HierarchyError::WouldCycle { .. })
        ));
    }

    #[test]
    fn dependency_map_blocks_switch() {
        let (mut h, a, b, n) = spaces();
        let mut map = DependencyMap::new();
        map.add(b, n);
        assert!(matches!(
            h.can_switch_to_parent(n, b, Some(&map)),
            Err(HierarchyError::WouldCycle { .. })
        ));
        assert!(h.can_switch_to_parent(n, b, None).is_ok());
        assert!(matches!(
            h.can_switch_to_parent(a, b, None),
            Err(HierarchyError::NotMultiParent(_))
        ));
    }

    #[test]
    fn switch_to_parent_adds_and_activates() {
        let (mut h, a, b, n) = spaces();
        h.switch_to_parent(n, b, false, false, None).unwrap();
        assert_eq!(h.active_parent(n), Some(b));
        assert_eq!(h.parent_weight(n, a, false), ElementWeight::ZERO);
        assert_eq!(h.parent_weight(n, b, false), ElementWeight::FULL);
        // Global kept across the switch.
        assert_transform_eq(&h.global_transform(n), &translation(11.0, 0.0, 0.0));
        assert_transform_eq(&h.local_transform(n), &translation(11.0, -10.0, 0.0));

        h.switch_to_default_parent(n, false, false).unwrap();
        assert_eq!(h.active_parent(n), Some(a));
    }

    #[test]
    fn animation_channel_refuses_to_switch() {
        let (mut h, a, b, _) = spaces();
        let settings = ControlSettings {
            animation_type: AnimationType::AnimationChannel,
            ..ControlSettings::default()
        };
        let channel = h
            .add_control(
                "channel",
                Some(a),
                settings,
                Transform::IDENTITY,
                translation(1.0, 0.0, 0.0),
                Transform::IDENTITY,
            )
            .unwrap();
        let version = h.topology_version();
        let key = h.key(channel).clone();

        assert_eq!(
            h.switch_to_parent(channel, b, false, true, None),
            Err(HierarchyError::AnimationChannel(key.clone()))
        );
        assert_eq!(
            h.switch_to_world_space(channel, false, true),
            Err(HierarchyError::AnimationChannel(key))
        );
        assert_eq!(h.topology_version(), version);
        assert_eq!(h.num_parents(channel), 1);
        assert_eq!(h.parent_weight(channel, b, false), ElementWeight::NOT_FOUND);
        assert_eq!(h.active_parent(channel), Some(a));
        assert_eq!(h.num_elements_of_type(ElementType::Reference), 0);
    }

    #[test]
    fn switch_to_world_space_creates_reference_once() {
        let (mut h, _, _, n) = spaces();
        h.switch_to_world_space(n, false, false).unwrap();
        let world = h.world_space_reference().unwrap();
        assert_eq!(h.active_parent(n), Some(world));
        assert_eq!(h.key(world).name(), WORLD_SPACE_NAME);
        assert_eq!(h.num_elements_of_type(ElementType::Reference), 1);
        assert_transform_eq(&h.local_transform(n), &translation(11.0, 0.0, 0.0));
    }

    #[test]
    fn abc_scenario_blends_halfway() {
        let mut h = Hierarchy::new();
        let a = h.add_null("A", None, Transform::IDENTITY, false).unwrap();
        let b = h.add_null("B", Some(a), Transform::IDENTITY, false).unwrap();
        let c = h.add_null("C", Some(b), Transform::IDENTITY, false).unwrap();
        h.add_parent(c, a, ElementWeight::ZERO, true).unwrap();
        h.set_parent_weights(
            c,
            &[ElementWeight::splat(0.5), ElementWeight::splat(0.5)],
            false,
            true,
        );
        h.set_global_transform(a, translation(10.0, 0.0, 0.0), true);
        h.set_local_transform(b, translation(0.0, 5.0, 0.0), true);
        // B is at (10, 5, 0), A at (10, 0, 0); C sits halfway.
        assert_transform_eq(&h.global_transform(c), &translation(10.0, 2.5, 0.0));
    }

    #[test]
    fn weight_monotonicity() {
        let (mut h, _, b, n) = spaces();
        h.add_parent(n, b, ElementWeight::ZERO, true).unwrap();
        let local = h.local_transform(n);
        let target = h.global_transform(b);
        let mut last = f64::MAX;
        for step in 0..=10 {
            let w = f64::from(step) / 10.0;
            h.set_parent_weights(
                n,
                &[ElementWeight::splat(1.0 - w), ElementWeight::splat(w)],
                false,
                true,
            );
            // Keeping the local value, the global slides towards `b`.
            let global = h.global_transform(n);
            let expected = (local * target).translation;
            let distance = (global.translation - expected).length();
            assert!(distance <= last + 1e-9, "distance grew at step {step}");
            last = distance;
        }
        assert!(last < 1e-9, "full weight must reach the target");
    }
}
