// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dirty-flag transform cache.
//!
//! Every transform set (pose, and for controls also offset and shape) caches
//! four values with one dirty bit each. At most one of local/global is dirty
//! per initial/current pair: a read of a dirty slot computes it from the
//! clean opposite slot and the parents, stores it and clears the bit. A write
//! stores one space, dirties the opposite one and first propagates dirty
//! flags to dependents so they either keep their local transform (and follow
//! the write) or keep their global transform (and stay in place).

use alloc::vec::Vec;

use understory_dirty::EagerPolicy;

use super::Hierarchy;
use crate::dirty;
use crate::element::{
    ElementData, ElementIndex, ElementKey, ElementType, ElementTypeMask, Parents, PoseSlots,
    TransformType,
};
use crate::math::{KINDA_SMALL_NUMBER, SMALL_NUMBER, Transform};
use crate::notify::{MutationEvent, Notification};
use crate::solver;
use crate::storage::StorageKind;
use crate::trace::{DirtyPropagatedEvent, TransformComputedEvent, TransformSetEvent};
use crate::undo::{StackEntry, StackEntryType};

/// How an element's local space relates to its parents.
#[derive(Clone, Copy, Debug)]
enum Link {
    Root,
    Single(u32),
    Multi,
}

impl Hierarchy {
    // -----------------------------------------------------------------------
    // Pose transforms
    // -----------------------------------------------------------------------

    /// Returns a transform, computing and caching it if dirty.
    ///
    /// Curves report the identity.
    pub fn transform(&mut self, index: ElementIndex, ty: TransformType) -> Transform {
        self.validate(index);
        self.transform_at(index.idx, ty)
    }

    /// Writes a transform.
    ///
    /// With `affect_children` dependents keep their local transforms and
    /// follow; without it they keep their global transforms. Writing a
    /// control's global transform converts it to local space first and
    /// applies the control's limits. Unless `force` is set, a write within
    /// [`KINDA_SMALL_NUMBER`] of a clean stored value does nothing.
    pub fn set_transform(
        &mut self,
        index: ElementIndex,
        value: Transform,
        ty: TransformType,
        affect_children: bool,
        setup_undo: bool,
        force: bool,
    ) {
        self.validate(index);
        self.set_transform_at(index.idx, value, ty, affect_children, setup_undo, force);
    }

    /// The current global transform.
    pub fn global_transform(&mut self, index: ElementIndex) -> Transform {
        self.transform(index, TransformType::CurrentGlobal)
    }

    /// The current local transform.
    pub fn local_transform(&mut self, index: ElementIndex) -> Transform {
        self.transform(index, TransformType::CurrentLocal)
    }

    /// The initial global transform.
    pub fn initial_global_transform(&mut self, index: ElementIndex) -> Transform {
        self.transform(index, TransformType::InitialGlobal)
    }

    /// The initial local transform.
    pub fn initial_local_transform(&mut self, index: ElementIndex) -> Transform {
        self.transform(index, TransformType::InitialLocal)
    }

    /// Writes the current global transform without recording undo.
    pub fn set_global_transform(
        &mut self,
        index: ElementIndex,
        value: Transform,
        affect_children: bool,
    ) {
        self.set_transform(
            index,
            value,
            TransformType::CurrentGlobal,
            affect_children,
            false,
            false,
        );
    }

    /// Writes the current local transform without recording undo.
    pub fn set_local_transform(&mut self, index: ElementIndex, value: Transform, affect_children: bool) {
        self.set_transform(
            index,
            value,
            TransformType::CurrentLocal,
            affect_children,
            false,
            false,
        );
    }

    /// Writes the initial global transform without recording undo.
    pub fn set_initial_global_transform(
        &mut self,
        index: ElementIndex,
        value: Transform,
        affect_children: bool,
    ) {
        self.set_transform(
            index,
            value,
            TransformType::InitialGlobal,
            affect_children,
            false,
            false,
        );
    }

    /// Writes the initial local transform without recording undo.
    pub fn set_initial_local_transform(
        &mut self,
        index: ElementIndex,
        value: Transform,
        affect_children: bool,
    ) {
        self.set_transform(
            index,
            value,
            TransformType::InitialLocal,
            affect_children,
            false,
            false,
        );
    }

    /// Reads a transform by key. `None` if no such element exists.
    pub fn transform_by_key(&mut self, key: &ElementKey, ty: TransformType) -> Option<Transform> {
        let index = self.find(key)?;
        Some(self.transform_at(index.idx, ty))
    }

    /// Writes a transform by key. Returns `false` if no such element exists.
    pub fn set_transform_by_key(
        &mut self,
        key: &ElementKey,
        value: Transform,
        ty: TransformType,
        affect_children: bool,
        setup_undo: bool,
    ) -> bool {
        let Some(index) = self.find(key) else {
            return false;
        };
        self.set_transform_at(index.idx, value, ty, affect_children, setup_undo, false);
        true
    }

    /// The transform of type `ty` the element's local transform is relative
    /// to, excluding a control's offset. Multi-parent elements report their
    /// weighted blend, unparented elements the identity.
    pub fn parent_transform(&mut self, index: ElementIndex, ty: TransformType) -> Transform {
        self.validate(index);
        self.parent_transform_at(index.idx, ty)
    }

    /// Incremented on every write to the element's pose.
    #[must_use]
    pub fn pose_version(&self, index: ElementIndex) -> u32 {
        self.validate(index);
        self.pose_version[index.idx as usize]
    }

    // -----------------------------------------------------------------------
    // Control offset and shape
    // -----------------------------------------------------------------------

    /// A control's offset transform. The identity for other elements.
    pub fn control_offset_transform(&mut self, index: ElementIndex, ty: TransformType) -> Transform {
        self.validate(index);
        self.offset_at(index.idx, ty)
    }

    /// Writes a control's offset transform. Writing an initial offset also
    /// writes the current one. Does nothing for other elements.
    pub fn set_control_offset_transform(
        &mut self,
        index: ElementIndex,
        value: Transform,
        ty: TransformType,
        affect_children: bool,
        setup_undo: bool,
        force: bool,
    ) {
        self.validate(index);
        self.set_offset_at(index.idx, value, ty, affect_children, setup_undo, force);
    }

    /// A control's shape transform. The identity for other elements.
    pub fn control_shape_transform(&mut self, index: ElementIndex, ty: TransformType) -> Transform {
        self.validate(index);
        self.shape_at(index.idx, ty)
    }

    /// Writes a control's shape transform. Writing an initial shape also
    /// writes the current one. Does nothing for other elements.
    pub fn set_control_shape_transform(
        &mut self,
        index: ElementIndex,
        value: Transform,
        ty: TransformType,
        setup_undo: bool,
        force: bool,
    ) {
        self.validate(index);
        self.set_shape_at(index.idx, value, ty, setup_undo, force);
    }

    // -----------------------------------------------------------------------
    // Curves
    // -----------------------------------------------------------------------

    /// A curve's value. Zero for other elements.
    #[must_use]
    pub fn curve_value(&self, index: ElementIndex) -> f32 {
        self.validate(index);
        match self.data[index.idx as usize] {
            ElementData::Curve(curve) => curve.value,
            _ => 0.0,
        }
    }

    /// Whether a curve's value was written since the last reset.
    #[must_use]
    pub fn is_curve_value_set(&self, index: ElementIndex) -> bool {
        self.validate(index);
        matches!(self.data[index.idx as usize], ElementData::Curve(curve) if curve.is_set)
    }

    /// Writes a curve value and marks it as set.
    pub fn set_curve_value(&mut self, index: ElementIndex, value: f32, setup_undo: bool, force: bool) {
        self.validate(index);
        self.set_curve_at(index.idx, value, setup_undo, force);
    }

    /// Marks a curve value as unset, keeping the stored number.
    pub fn unset_curve_value(&mut self, index: ElementIndex, setup_undo: bool) {
        self.validate(index);
        let idx = index.idx;
        let ElementData::Curve(curve) = &mut self.data[idx as usize] else {
            return;
        };
        if !curve.is_set {
            return;
        }
        let previous = (curve.value, true);
        curve.is_set = false;
        let value = curve.value;
        self.changes.mark(idx, dirty::CURVE);

        let key = self.keys[idx as usize].clone();
        if setup_undo {
            self.stack
                .push(StackEntry::curve(key.clone(), previous, (value, false)));
        }
        self.emit(|| MutationEvent::CurveUnset { key });
    }

    /// Zeroes every curve and marks it as unset.
    pub fn reset_curve_values(&mut self) {
        for idx in self.by_type[ElementType::Curve.ordinal()].clone() {
            if let ElementData::Curve(curve) = &mut self.data[idx as usize] {
                curve.value = 0.0;
                curve.is_set = false;
                self.changes.mark(idx, dirty::CURVE);
            }
        }
    }

    /// Marks every curve as unset, keeping the stored numbers.
    pub fn unset_curve_values(&mut self) {
        for idx in self.by_type[ElementType::Curve.ordinal()].clone() {
            if let ElementData::Curve(curve) = &mut self.data[idx as usize] {
                if curve.is_set {
                    curve.is_set = false;
                    self.changes.mark(idx, dirty::CURVE);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------------

    /// Copies initial values over current values for every element whose
    /// type is in `mask`. Curves in the mask are reset to zero.
    pub fn reset_pose_to_initial(&mut self, mask: ElementTypeMask) {
        let covers_all = ElementType::ALL
            .iter()
            .filter(|kind| kind.has_transform())
            .all(|&kind| mask.contains(kind));

        if covers_all {
            // Whole pose: copy slots and dirty flags directly.
            for idx in self.ordered() {
                let i = idx as usize;
                for slots in self.data[i].slot_sets() {
                    for local in [true, false] {
                        let initial = TransformType::from_flags(true, local);
                        let current = initial.make_current();
                        let value = slots.get(&self.storage, initial);
                        let flag = slots.is_dirty(&self.storage, initial);
                        slots.set(&mut self.storage, current, value);
                        slots.set_dirty(&mut self.storage, current, flag);
                    }
                }
                if let Some(control) = self.data[i].control_mut() {
                    control.preferred.current = control.preferred.initial;
                }
                if self.data[i].pose().is_some() {
                    self.pose_version[i] = self.pose_version[i].wrapping_add(1);
                    self.changes.mark_with(idx, dirty::POSE, &EagerPolicy);
                }
            }
        } else {
            for idx in self.ordered() {
                let kind = self.keys[idx as usize].kind();
                if !kind.has_transform() || !mask.contains(kind) {
                    continue;
                }
                if self.is_control(idx) {
                    let offset = self.offset_at(idx, TransformType::InitialLocal);
                    self.set_offset_at(idx, offset, TransformType::CurrentLocal, true, false, true);
                }
                let value = self.transform_at(idx, TransformType::InitialLocal);
                self.set_transform_at(idx, value, TransformType::CurrentLocal, true, false, true);
            }
        }

        if mask.contains(ElementType::Curve) {
            self.reset_curve_values();
        }
    }

    /// Computes every dirty transform of every element.
    pub fn compute_all_transforms(&mut self) {
        for idx in self.ordered() {
            for ty in TransformType::ALL {
                self.transform_at(idx, ty);
                if self.is_control(idx) {
                    self.offset_at(idx, ty);
                    self.shape_at(idx, ty);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals: reads
    // -----------------------------------------------------------------------

    pub(crate) fn transform_at(&mut self, idx: u32, ty: TransformType) -> Transform {
        let Some(slots) = self.data[idx as usize].pose().copied() else {
            return Transform::IDENTITY;
        };
        if !slots.is_dirty(&self.storage, ty) {
            return slots.get(&self.storage, ty);
        }
        let opposite = ty.swap_local_and_global();
        debug_assert!(
            !slots.is_dirty(&self.storage, opposite),
            "local and global transforms are both dirty"
        );
        let stored = slots.get(&self.storage, opposite);
        let global_ty = ty.make_global();
        let constraints = self.parents[idx as usize].constraints().to_vec();
        let control = self.is_control(idx);

        let value = if ty.is_local() {
            let local = match self.link(idx) {
                Link::Multi => {
                    let offset = control.then(|| self.offset_at(idx, ty));
                    solver::inverse_solve(
                        &stored,
                        &constraints,
                        global_ty,
                        offset.as_ref(),
                        |p, t| self.transform_at(p.idx, t),
                    )
                }
                Link::Single(parent) => {
                    let parent = self.transform_at(parent, global_ty);
                    stored.relative_to(&parent).normalized()
                }
                Link::Root => stored,
            };
            let previous = slots.get(&self.storage, ty);
            self.compensate_zero_scale(idx, global_ty, local, previous)
        } else {
            match self.link(idx) {
                Link::Multi => {
                    let offset = control.then(|| self.offset_at(idx, ty.make_local()));
                    solver::solve(
                        &constraints,
                        ty,
                        offset.as_ref(),
                        Some(&stored),
                        |p, t| self.transform_at(p.idx, t),
                    )
                }
                Link::Single(parent) => {
                    let parent = self.transform_at(parent, global_ty);
                    (stored * parent).normalized()
                }
                Link::Root => stored,
            }
        };

        slots.set(&mut self.storage, ty, value);
        slots.set_dirty(&mut self.storage, ty, false);
        self.tracer.transform_computed(&TransformComputedEvent {
            element: self.handle(idx),
            kind: self.keys[idx as usize].kind(),
            storage: StorageKind::Pose,
            transform_type: ty,
        });
        value
    }

    /// A computed local with a collapsed scale axis cannot be trusted when
    /// the parent is collapsed as well; keep the previously stored
    /// translation and scale in that case.
    fn compensate_zero_scale(
        &mut self,
        idx: u32,
        global_ty: TransformType,
        mut local: Transform,
        previous: Transform,
    ) -> Transform {
        let tolerance = self.config.zero_scale_tolerance;
        if !local.scale.has_nearly_zero_axis(tolerance) {
            return local;
        }
        let parent = self.parent_transform_at(idx, global_ty);
        if parent.scale.has_nearly_zero_axis(tolerance) {
            local.translation = previous.translation;
            local.scale = previous.scale;
        }
        local
    }

    pub(crate) fn parent_transform_at(&mut self, idx: u32, ty: TransformType) -> Transform {
        match self.link(idx) {
            Link::Multi => {
                let constraints = self.parents[idx as usize].constraints().to_vec();
                solver::effective_parent(&constraints, ty, |p, t| self.transform_at(p.idx, t))
            }
            Link::Single(parent) => self.transform_at(parent, ty),
            Link::Root => Transform::IDENTITY,
        }
    }

    pub(crate) fn offset_at(&mut self, idx: u32, ty: TransformType) -> Transform {
        let Some(slots) = self.data[idx as usize].control().map(|c| c.offset) else {
            return Transform::IDENTITY;
        };
        if !slots.is_dirty(&self.storage, ty) {
            return slots.get(&self.storage, ty);
        }
        let stored = slots.get(&self.storage, ty.swap_local_and_global());
        let constraints = self.parents[idx as usize].constraints().to_vec();
        let value = if ty.is_local() {
            solver::inverse_solve(&stored, &constraints, ty.make_global(), None, |p, t| {
                self.transform_at(p.idx, t)
            })
        } else {
            solver::solve(&constraints, ty, None, Some(&stored), |p, t| {
                self.transform_at(p.idx, t)
            })
        };
        slots.set(&mut self.storage, ty, value);
        slots.set_dirty(&mut self.storage, ty, false);
        self.tracer.transform_computed(&TransformComputedEvent {
            element: self.handle(idx),
            kind: ElementType::Control,
            storage: StorageKind::Offset,
            transform_type: ty,
        });
        value
    }

    pub(crate) fn shape_at(&mut self, idx: u32, ty: TransformType) -> Transform {
        let Some(slots) = self.data[idx as usize].control().map(|c| c.shape) else {
            return Transform::IDENTITY;
        };
        if !slots.is_dirty(&self.storage, ty) {
            return slots.get(&self.storage, ty);
        }
        let stored = slots.get(&self.storage, ty.swap_local_and_global());
        let pose = self.transform_at(idx, ty.make_global());
        let value = if ty.is_local() {
            stored.relative_to(&pose).normalized()
        } else {
            (stored * pose).normalized()
        };
        slots.set(&mut self.storage, ty, value);
        slots.set_dirty(&mut self.storage, ty, false);
        self.tracer.transform_computed(&TransformComputedEvent {
            element: self.handle(idx),
            kind: ElementType::Control,
            storage: StorageKind::Shape,
            transform_type: ty,
        });
        value
    }

    // -----------------------------------------------------------------------
    // Internals: writes
    // -----------------------------------------------------------------------

    pub(crate) fn set_transform_at(
        &mut self,
        idx: u32,
        value: Transform,
        ty: TransformType,
        affect_children: bool,
        setup_undo: bool,
        force: bool,
    ) {
        let Some(slots) = self.data[idx as usize].pose().copied() else {
            return;
        };

        if ty.is_global() {
            if let Some(control) = self.data[idx as usize].control() {
                let settings = control.settings;
                let offset = self.offset_at(idx, ty.make_local());
                let constraints = self.parents[idx as usize].constraints().to_vec();
                let local = solver::inverse_solve(&value, &constraints, ty, Some(&offset), |p, t| {
                    self.transform_at(p.idx, t)
                });
                let local = settings
                    .limits
                    .apply(&local, settings.preferred_rotation_order);
                self.set_transform_at(
                    idx,
                    local,
                    ty.make_local(),
                    affect_children,
                    setup_undo,
                    force,
                );
                return;
            }
        }

        if !force
            && !slots.is_dirty(&self.storage, ty)
            && slots
                .get(&self.storage, ty)
                .abs_diff_eq(&value, KINDA_SMALL_NUMBER)
        {
            return;
        }

        let previous = self.transform_at(idx, ty);
        self.propagate_dirty_flags_at(idx, ty.is_initial(), affect_children);

        let shape = self.data[idx as usize].control().map(|c| c.shape);
        if let Some(shape) = shape {
            // The shape follows the pose: keep its local, recompute its global.
            self.shape_at(idx, ty.make_local());
            shape.set_dirty(&mut self.storage, ty.make_global(), true);
        }

        slots.set(&mut self.storage, ty, value);
        slots.set_dirty(&mut self.storage, ty, false);
        slots.set_dirty(&mut self.storage, ty.swap_local_and_global(), true);
        self.pose_version[idx as usize] = self.pose_version[idx as usize].wrapping_add(1);

        if ty.is_local() && self.config.enable_rotation_order {
            if let Some(control) = self.data[idx as usize].control_mut() {
                control
                    .preferred
                    .set_from_rotation(value.rotation, ty.is_initial());
            }
        }

        self.changes.mark_with(idx, dirty::POSE, &EagerPolicy);
        self.tracer.transform_set(&TransformSetEvent {
            element: self.handle(idx),
            storage: StorageKind::Pose,
            transform_type: ty,
            affect_children,
        });

        let key = self.keys[idx as usize].clone();
        if setup_undo {
            self.stack.push(StackEntry {
                key: key.clone(),
                entry_type: StackEntryType::TransformPose,
                transform_type: ty,
                old: previous,
                new: value,
                affect_children,
            });
        }
        self.emit(|| MutationEvent::TransformSet {
            key,
            value,
            transform_type: ty,
            affect_children,
            force,
        });
    }

    pub(crate) fn set_offset_at(
        &mut self,
        idx: u32,
        value: Transform,
        ty: TransformType,
        affect_children: bool,
        setup_undo: bool,
        force: bool,
    ) {
        let Some((pose, offset, shape)) = self.data[idx as usize]
            .control()
            .map(|c| (c.pose, c.offset, c.shape))
        else {
            return;
        };

        if !force
            && !offset.is_dirty(&self.storage, ty)
            && offset
                .get(&self.storage, ty)
                .abs_diff_eq(&value, KINDA_SMALL_NUMBER)
        {
            return;
        }

        let previous = self.offset_at(idx, ty);
        self.propagate_dirty_flags_at(idx, ty.is_initial(), affect_children);

        // The pose keeps its local value and moves with the offset.
        self.transform_at(idx, ty.make_local());
        pose.set_dirty(&mut self.storage, ty.make_global(), true);
        self.shape_at(idx, ty.make_local());
        shape.set_dirty(&mut self.storage, ty.make_global(), true);

        offset.set(&mut self.storage, ty, value);
        offset.set_dirty(&mut self.storage, ty, false);
        offset.set_dirty(&mut self.storage, ty.swap_local_and_global(), true);
        self.pose_version[idx as usize] = self.pose_version[idx as usize].wrapping_add(1);

        self.changes.mark(idx, dirty::OFFSET);
        self.changes.mark_with(idx, dirty::POSE, &EagerPolicy);
        self.tracer.transform_set(&TransformSetEvent {
            element: self.handle(idx),
            storage: StorageKind::Offset,
            transform_type: ty,
            affect_children,
        });

        if ty.is_initial() {
            self.set_offset_at(idx, value, ty.make_current(), affect_children, false, force);
        }

        let key = self.keys[idx as usize].clone();
        if setup_undo {
            self.stack.push(StackEntry {
                key: key.clone(),
                entry_type: StackEntryType::ControlOffset,
                transform_type: ty,
                old: previous,
                new: value,
                affect_children,
            });
        }
        self.emit(|| MutationEvent::ControlOffsetSet {
            key,
            value,
            transform_type: ty,
            affect_children,
            force,
        });
    }

    pub(crate) fn set_shape_at(
        &mut self,
        idx: u32,
        value: Transform,
        ty: TransformType,
        setup_undo: bool,
        force: bool,
    ) {
        let Some(shape) = self.data[idx as usize].control().map(|c| c.shape) else {
            return;
        };

        if !force
            && !shape.is_dirty(&self.storage, ty)
            && shape
                .get(&self.storage, ty)
                .abs_diff_eq(&value, KINDA_SMALL_NUMBER)
        {
            return;
        }

        let previous = self.shape_at(idx, ty);
        shape.set(&mut self.storage, ty, value);
        shape.set_dirty(&mut self.storage, ty, false);
        shape.set_dirty(&mut self.storage, ty.swap_local_and_global(), true);

        self.changes.mark(idx, dirty::SHAPE);
        self.tracer.transform_set(&TransformSetEvent {
            element: self.handle(idx),
            storage: StorageKind::Shape,
            transform_type: ty,
            affect_children: false,
        });

        if ty.is_initial() {
            self.set_shape_at(idx, value, ty.make_current(), false, force);
        }

        let key = self.keys[idx as usize].clone();
        if ty.is_local() {
            self.notify(Notification::ControlShapeTransformChanged(key.clone()));
        }
        if setup_undo {
            self.stack.push(StackEntry {
                key: key.clone(),
                entry_type: StackEntryType::ControlShape,
                transform_type: ty,
                old: previous,
                new: value,
                affect_children: false,
            });
        }
        self.emit(|| MutationEvent::ControlShapeSet {
            key,
            value,
            transform_type: ty,
            force,
        });
    }

    pub(crate) fn set_curve_at(&mut self, idx: u32, value: f32, setup_undo: bool, force: bool) {
        let ElementData::Curve(curve) = &mut self.data[idx as usize] else {
            return;
        };
        if !force
            && curve.is_set
            && (f64::from(curve.value) - f64::from(value)).abs() <= SMALL_NUMBER
        {
            return;
        }
        let previous = (curve.value, curve.is_set);
        curve.value = value;
        curve.is_set = true;
        self.changes.mark(idx, dirty::CURVE);

        let key = self.keys[idx as usize].clone();
        if setup_undo {
            self.stack
                .push(StackEntry::curve(key.clone(), previous, (value, true)));
        }
        self.emit(|| MutationEvent::CurveSet { key, value, force });
    }

    // -----------------------------------------------------------------------
    // Internals: dirty propagation
    // -----------------------------------------------------------------------

    /// Prepares the dependents of `index` for an upcoming write to it.
    ///
    /// Setters call this themselves; it is exposed for callers that write
    /// storage through other means.
    pub fn propagate_dirty_flags(&mut self, index: ElementIndex, initial: bool, affect_children: bool) {
        self.validate(index);
        self.propagate_dirty_flags_at(index.idx, initial, affect_children);
    }

    /// Prepares every dependent of `idx` for a write to `idx`.
    ///
    /// Dependents keep one space (local with `affect_children`, global
    /// without) and have the other marked dirty. Animation channels always
    /// keep their local value. Dependents that keep their local value pass
    /// the write on to their own dependents.
    ///
    /// Every kept space is pulled into the cache before anything is marked,
    /// so all of them are computed from the pre-write state. Pulling one
    /// dependent may clean a space of another (a multi-parent solve reads
    /// its parents' globals), so marking never trusts flags observed before
    /// the pull.
    pub(crate) fn propagate_dirty_flags_at(&mut self, idx: u32, initial: bool, affect_children: bool) {
        self.ensure_children_cache();
        let compute = TransformType::from_flags(initial, affect_children);
        let affected = self.affected_dependents(idx, compute);
        if affected.is_empty() {
            return;
        }

        for &(dependent, keep, _) in &affected {
            if self.is_control(dependent) {
                self.offset_at(dependent, keep.make_local());
                self.shape_at(dependent, keep.make_local());
            }
            self.transform_at(dependent, keep);
        }

        let mut dirtied = Vec::new();
        for &(dependent, _, dirty) in &affected {
            if self.mark_dirty(dependent, dirty) {
                dirtied.push(dependent);
            }
        }

        #[expect(
            clippy::cast_possible_truncation,
            reason = "element counts are bounded by u32 handles"
        )]
        let count = dirtied.len() as u32;
        let source = self.handle(idx);
        self.tracer.dirty_propagated(&DirtyPropagatedEvent {
            element: source,
            initial,
            affect_children,
            dirtied: count,
        });
        #[cfg(feature = "trace-rich")]
        self.tracer.elements_dirtied(source, &dirtied);
    }

    /// The space `idx` keeps and the space it dirties, given the space its
    /// parent asked it to keep.
    fn propagation_types(&self, idx: u32, compute: TransformType) -> (TransformType, TransformType) {
        if self.is_animation_channel(idx) && compute.is_global() {
            (compute.make_local(), compute.make_global())
        } else {
            (compute, compute.swap_local_and_global())
        }
    }

    /// Every transform-bearing dependent a write to `idx` reaches, once each,
    /// with the space it keeps and the space it dirties.
    fn affected_dependents(
        &mut self,
        idx: u32,
        compute: TransformType,
    ) -> Vec<(u32, TransformType, TransformType)> {
        let mut seen = alloc::vec![false; self.keys.len()];
        let mut affected = Vec::new();
        let mut stack: Vec<(u32, TransformType)> = self
            .child_slots(idx)
            .into_iter()
            .rev()
            .map(|child| (child, compute))
            .collect();
        while let Some((dependent, asked)) = stack.pop() {
            if core::mem::replace(&mut seen[dependent as usize], true)
                || self.pose_slots(dependent).is_none()
            {
                continue;
            }
            let (keep, dirty) = self.propagation_types(dependent, asked);
            affected.push((dependent, keep, dirty));
            // Dependents of an element that keeps its local value move with it.
            if keep.is_local() {
                let children = self.child_slots(dependent);
                stack.extend(children.into_iter().rev().map(|child| (child, keep)));
            }
        }
        affected
    }

    /// Marks `dirty` on `idx` (and the matching global offset and shape of a
    /// control). Returns whether the pose slot was clean before.
    fn mark_dirty(&mut self, idx: u32, dirty: TransformType) -> bool {
        let Some(slots) = self.pose_slots(idx) else {
            return false;
        };
        let was_clean = !slots.is_dirty(&self.storage, dirty);
        slots.set_dirty(&mut self.storage, dirty, true);
        if let Some(control) = self.data[idx as usize].control() {
            let (offset, shape) = (control.offset, control.shape);
            offset.set_dirty(&mut self.storage, dirty.make_global(), true);
            shape.set_dirty(&mut self.storage, dirty.make_global(), true);
        }
        was_clean
    }

    fn child_slots(&mut self, idx: u32) -> Vec<u32> {
        let handle = self.handle(idx);
        self.children(handle).map(|c| c.idx).collect()
    }

    fn link(&self, idx: u32) -> Link {
        match &self.parents[idx as usize] {
            Parents::Multi(_) => Link::Multi,
            Parents::Single(Some(parent)) => Link::Single(parent.idx),
            Parents::Single(None) | Parents::None => Link::Root,
        }
    }

    /// Pose slots of a live element, if it has a transform.
    #[inline]
    pub(crate) fn pose_slots(&self, idx: u32) -> Option<PoseSlots> {
        self.data[idx as usize].pose().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AnimationType, ControlSettings, ElementWeight};
    use crate::hierarchy::test_util::{assert_transform_eq, rotation_z, translation};
    use crate::math::Vec3;

    fn bone_chain() -> (Hierarchy, ElementIndex, ElementIndex, ElementIndex) {
        let mut h = Hierarchy::new();
        let a = h
            .add_bone("a", None, translation(1.0, 0.0, 0.0), false)
            .unwrap();
        let b = h
            .add_bone("b", Some(a), translation(0.0, 1.0, 0.0), false)
            .unwrap();
        let c = h
            .add_bone("c", Some(b), translation(0.0, 0.0, 1.0), false)
            .unwrap();
        (h, a, b, c)
    }

    fn is_dirty(h: &Hierarchy, e: ElementIndex, ty: TransformType) -> bool {
        h.pose_slots(e.idx).unwrap().is_dirty(&h.storage, ty)
    }

    #[test]
    fn global_composes_local_with_parents() {
        let (mut h, _, _, c) = bone_chain();
        assert_transform_eq(&h.global_transform(c), &translation(1.0, 1.0, 1.0));
        assert_transform_eq(&h.initial_global_transform(c), &translation(1.0, 1.0, 1.0));
    }

    #[test]
    fn global_bone_creation_derives_local() {
        let mut h = Hierarchy::new();
        let a = h
            .add_bone("a", None, translation(1.0, 0.0, 0.0), true)
            .unwrap();
        let b = h
            .add_bone("b", Some(a), translation(3.0, 0.0, 0.0), true)
            .unwrap();
        assert_transform_eq(&h.local_transform(b), &translation(2.0, 0.0, 0.0));
    }

    #[test]
    fn local_write_with_affect_children_moves_dependents() {
        let (mut h, a, b, c) = bone_chain();
        h.compute_all_transforms();
        h.set_local_transform(a, translation(5.0, 0.0, 0.0), true);
        assert!(is_dirty(&h, a, TransformType::CurrentGlobal));
        assert!(is_dirty(&h, b, TransformType::CurrentGlobal));
        assert!(is_dirty(&h, c, TransformType::CurrentGlobal));
        assert!(!is_dirty(&h, b, TransformType::CurrentLocal));
        assert_transform_eq(&h.global_transform(c), &translation(5.0, 1.0, 1.0));
        assert_transform_eq(&h.local_transform(c), &translation(0.0, 0.0, 1.0));
    }

    #[test]
    fn explicit_propagation_marks_dependents() {
        let (mut h, a, b, c) = bone_chain();
        h.compute_all_transforms();
        h.propagate_dirty_flags(a, false, true);
        assert!(is_dirty(&h, b, TransformType::CurrentGlobal));
        assert!(is_dirty(&h, c, TransformType::CurrentGlobal));
        assert!(!is_dirty(&h, a, TransformType::CurrentGlobal));
        assert!(!is_dirty(&h, b, TransformType::InitialGlobal));
    }

    #[test]
    fn write_without_affect_children_keeps_dependent_globals() {
        let (mut h, a, b, c) = bone_chain();
        h.set_local_transform(a, translation(5.0, 0.0, 0.0), false);
        assert!(is_dirty(&h, b, TransformType::CurrentLocal));
        assert!(!is_dirty(&h, b, TransformType::CurrentGlobal));
        // Grandchildren are untouched.
        assert!(!is_dirty(&h, c, TransformType::CurrentLocal));
        assert_transform_eq(&h.global_transform(b), &translation(1.0, 1.0, 0.0));
        assert_transform_eq(&h.local_transform(b), &translation(-4.0, 1.0, 0.0));
        assert_transform_eq(&h.global_transform(c), &translation(1.0, 1.0, 1.0));
    }

    #[test]
    fn at_most_one_space_is_dirty() {
        let (mut h, a, b, c) = bone_chain();
        h.set_global_transform(b, translation(0.0, 7.0, 0.0), true);
        h.set_local_transform(a, rotation_z(45.0), false);
        h.set_global_transform(c, translation(2.0, 2.0, 2.0), true);
        for e in [a, b, c] {
            for initial in [true, false] {
                let local = TransformType::from_flags(initial, true);
                assert!(
                    !(is_dirty(&h, e, local) && is_dirty(&h, e, local.make_global())),
                    "{e:?} has both spaces dirty"
                );
            }
        }
    }

    #[test]
    fn unchanged_write_is_skipped() {
        let (mut h, a, _, _) = bone_chain();
        let before = h.pose_version(a);
        h.set_local_transform(a, translation(1.0, 0.0, 0.0), true);
        assert_eq!(h.pose_version(a), before);
        h.set_transform(
            a,
            translation(1.0, 0.0, 0.0),
            TransformType::CurrentLocal,
            true,
            false,
            true,
        );
        assert_eq!(h.pose_version(a), before + 1);
    }

    #[test]
    fn rotated_parent_rotates_child_translation() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, rotation_z(90.0), false).unwrap();
        let b = h
            .add_bone("b", Some(a), translation(1.0, 0.0, 0.0), false)
            .unwrap();
        let global = h.global_transform(b);
        assert!(global.translation.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-9));
    }

    #[test]
    fn zero_scale_parent_keeps_previous_local() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        let b = h
            .add_bone("b", Some(a), translation(2.0, 0.0, 0.0), false)
            .unwrap();
        // Collapse the parent while the child keeps its global.
        h.set_local_transform(a, Transform::from_scale(Vec3::new(0.0, 1.0, 1.0)), false);
        let local = h.local_transform(b);
        assert_eq!(local.translation, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(local.scale, Vec3::ONE);
    }

    #[test]
    fn control_global_includes_offset() {
        let mut h = Hierarchy::new();
        let root = h
            .add_bone("root", None, translation(10.0, 0.0, 0.0), false)
            .unwrap();
        let ctrl = h
            .add_control(
                "ctrl",
                Some(root),
                ControlSettings::default(),
                translation(0.0, 5.0, 0.0),
                translation(0.0, 0.0, 1.0),
                translation(0.0, 0.0, 2.0),
            )
            .unwrap();
        assert_transform_eq(&h.global_transform(ctrl), &translation(10.0, 5.0, 1.0));
        assert_transform_eq(
            &h.control_offset_transform(ctrl, TransformType::CurrentGlobal),
            &translation(10.0, 5.0, 0.0),
        );
        assert_transform_eq(
            &h.control_shape_transform(ctrl, TransformType::CurrentGlobal),
            &translation(10.0, 5.0, 3.0),
        );

        // A global write is solved back through the offset.
        h.set_global_transform(ctrl, translation(10.0, 5.0, 4.0), true);
        assert_transform_eq(&h.local_transform(ctrl), &translation(0.0, 0.0, 4.0));
        assert_transform_eq(
            &h.control_shape_transform(ctrl, TransformType::CurrentGlobal),
            &translation(10.0, 5.0, 6.0),
        );
    }

    #[test]
    fn control_global_write_applies_limits() {
        let mut h = Hierarchy::new();
        let mut settings = ControlSettings::default();
        settings.limits.translation =
            crate::element::AxisLimits::uniform(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ctrl = h
            .add_control(
                "ctrl",
                None,
                settings,
                Transform::IDENTITY,
                Transform::IDENTITY,
                Transform::IDENTITY,
            )
            .unwrap();
        h.set_global_transform(ctrl, translation(5.0, 0.0, -3.0), true);
        assert_transform_eq(&h.local_transform(ctrl), &translation(1.0, 0.0, -1.0));
    }

    #[test]
    fn initial_offset_write_also_sets_current() {
        let mut h = Hierarchy::new();
        let ctrl = h
            .add_control(
                "ctrl",
                None,
                ControlSettings::default(),
                Transform::IDENTITY,
                Transform::IDENTITY,
                Transform::IDENTITY,
            )
            .unwrap();
        h.set_control_offset_transform(
            ctrl,
            translation(3.0, 0.0, 0.0),
            TransformType::InitialLocal,
            true,
            false,
            false,
        );
        assert_transform_eq(
            &h.control_offset_transform(ctrl, TransformType::CurrentLocal),
            &translation(3.0, 0.0, 0.0),
        );
        assert_transform_eq(&h.global_transform(ctrl), &translation(3.0, 0.0, 0.0));
    }

    #[test]
    fn offset_write_moves_control_children() {
        let mut h = Hierarchy::new();
        let ctrl = h
            .add_control(
                "ctrl",
                None,
                ControlSettings::default(),
                Transform::IDENTITY,
                Transform::IDENTITY,
                Transform::IDENTITY,
            )
            .unwrap();
        let child = h
            .add_null("child", Some(ctrl), translation(1.0, 0.0, 0.0), false)
            .unwrap();
        h.global_transform(child);
        h.set_control_offset_transform(
            ctrl,
            translation(0.0, 2.0, 0.0),
            TransformType::CurrentLocal,
            true,
            false,
            false,
        );
        assert_transform_eq(&h.global_transform(child), &translation(1.0, 2.0, 0.0));
    }

    #[test]
    fn shape_local_write_notifies() {
        let mut h = Hierarchy::new();
        let ctrl = h
            .add_control(
                "ctrl",
                None,
                ControlSettings::default(),
                Transform::IDENTITY,
                Transform::IDENTITY,
                Transform::IDENTITY,
            )
            .unwrap();
        h.take_notifications();
        h.set_control_shape_transform(
            ctrl,
            translation(0.0, 0.0, 1.0),
            TransformType::CurrentLocal,
            false,
            false,
        );
        assert_eq!(
            h.take_notifications(),
            alloc::vec![Notification::ControlShapeTransformChanged(h.key(ctrl).clone())]
        );
    }

    #[test]
    fn animation_channel_keeps_local() {
        let mut h = Hierarchy::new();
        let root = h.add_bone("root", None, Transform::IDENTITY, false).unwrap();
        let settings = ControlSettings {
            animation_type: AnimationType::AnimationChannel,
            ..ControlSettings::default()
        };
        let channel = h
            .add_control(
                "channel",
                Some(root),
                settings,
                Transform::IDENTITY,
                translation(1.0, 0.0, 0.0),
                Transform::IDENTITY,
            )
            .unwrap();
        h.global_transform(channel);
        h.set_local_transform(root, translation(0.0, 3.0, 0.0), false);
        assert_transform_eq(&h.local_transform(channel), &translation(1.0, 0.0, 0.0));
        assert_transform_eq(&h.global_transform(channel), &translation(1.0, 3.0, 0.0));
    }

    #[test]
    fn curve_values() {
        let mut h = Hierarchy::new();
        let c = h.add_curve("c", 0.5).unwrap();
        assert!(!h.is_curve_value_set(c));
        assert_eq!(h.curve_value(c), 0.5);
        h.set_curve_value(c, 2.0, false, false);
        assert!(h.is_curve_value_set(c));
        assert_eq!(h.curve_value(c), 2.0);
        h.unset_curve_value(c, false);
        assert!(!h.is_curve_value_set(c));
        assert_eq!(h.curve_value(c), 2.0);
        h.reset_curve_values();
        assert_eq!(h.curve_value(c), 0.0);
    }

    #[test]
    fn reset_pose_to_initial_restores_everything() {
        let (mut h, a, b, c) = bone_chain();
        let curve = h.add_curve("curve", 0.0).unwrap();
        h.set_local_transform(a, translation(9.0, 9.0, 9.0), true);
        h.set_global_transform(c, Transform::IDENTITY, false);
        h.set_curve_value(curve, 4.0, false, false);
        h.reset_pose_to_initial(ElementTypeMask::ALL);
        assert_transform_eq(&h.global_transform(c), &translation(1.0, 1.0, 1.0));
        assert_transform_eq(&h.local_transform(b), &translation(0.0, 1.0, 0.0));
        assert_eq!(h.curve_value(curve), 0.0);
    }

    #[test]
    fn reset_pose_to_initial_filters_by_type() {
        let mut h = Hierarchy::new();
        let bone = h
            .add_bone("bone", None, translation(1.0, 0.0, 0.0), false)
            .unwrap();
        let null = h
            .add_null("null", None, translation(2.0, 0.0, 0.0), false)
            .unwrap();
        h.set_local_transform(bone, Transform::IDENTITY, true);
        h.set_local_transform(null, Transform::IDENTITY, true);
        h.reset_pose_to_initial(ElementType::Bone.mask());
        assert_transform_eq(&h.local_transform(bone), &translation(1.0, 0.0, 0.0));
        assert_transform_eq(&h.local_transform(null), &Transform::IDENTITY);
    }

    #[test]
    fn multi_parent_null_blends_parents() {
        let mut h = Hierarchy::new();
        let a = h
            .add_bone("a", None, translation(10.0, 0.0, 0.0), false)
            .unwrap();
        let b = h
            .add_bone("b", None, translation(0.0, 10.0, 0.0), false)
            .unwrap();
        let n = h.add_null("n", Some(a), Transform::IDENTITY, false).unwrap();
        h.add_parent(n, b, ElementWeight::ZERO, false).unwrap();
        h.set_parent_weights(
            n,
            &[ElementWeight::splat(1.0), ElementWeight::splat(1.0)],
            false,
            true,
        );
        assert_transform_eq(&h.global_transform(n), &translation(5.0, 5.0, 0.0));
    }

    #[test]
    fn global_round_trips_for_one_two_and_many_parents() {
        let mut h = Hierarchy::new();
        let spaces: Vec<ElementIndex> = (0..4)
            .map(|i| {
                let offset = f64::from(i);
                let value = translation(offset, 2.0 - offset, 1.0) * rotation_z(30.0 * offset);
                h.add_bone(&alloc::format!("p{i}"), None, value, true).unwrap()
            })
            .collect();
        let single = h.add_bone("single", Some(spaces[1]), Transform::IDENTITY, false).unwrap();
        let pair = h.add_null("pair", Some(spaces[0]), Transform::IDENTITY, false).unwrap();
        h.add_parent(pair, spaces[2], ElementWeight::ZERO, false).unwrap();
        h.set_parent_weights(
            pair,
            &[ElementWeight::splat(1.0), ElementWeight::splat(0.5)],
            false,
            false,
        );
        let many = h.add_null("many", Some(spaces[0]), Transform::IDENTITY, false).unwrap();
        for &space in &spaces[1..] {
            h.add_parent(many, space, ElementWeight::ZERO, false).unwrap();
        }
        h.set_parent_weights(
            many,
            &[
                ElementWeight::splat(0.25),
                ElementWeight::new(1.0, 0.5, 1.0),
                ElementWeight::splat(2.0),
                ElementWeight::new(0.5, 1.0, 0.0),
            ],
            false,
            false,
        );

        let target = Transform::new(
            Vec3::new(3.0, -2.0, 1.0),
            rotation_z(40.0).rotation,
            Vec3::ONE,
        );
        for element in [single, pair, many] {
            h.set_global_transform(element, target, true);
            assert_transform_eq(&h.global_transform(element), &target);

            // Writing the derived local back reproduces the same global.
            let local = h.local_transform(element);
            h.set_local_transform(element, translation(9.0, 9.0, 9.0), true);
            h.set_local_transform(element, local, true);
            assert_transform_eq(&h.global_transform(element), &target);
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn second_read_is_a_cache_hit() {
        use alloc::boxed::Box;
        use alloc::sync::Arc;
        use core::sync::atomic::{AtomicU32, Ordering};

        use crate::trace::{TraceSink, TransformComputedEvent};

        struct CountComputes(Arc<AtomicU32>);

        impl TraceSink for CountComputes {
            fn on_transform_computed(&mut self, _e: &TransformComputedEvent) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let (mut h, a, _, c) = bone_chain();
        let computes = Arc::new(AtomicU32::new(0));
        h.set_trace_sink(Box::new(CountComputes(Arc::clone(&computes))));

        let first = h.global_transform(c);
        let after_first = computes.load(Ordering::Relaxed);
        assert!(after_first > 0, "a dirty global must be computed");
        let second = h.global_transform(c);
        assert_eq!(first, second);
        assert_eq!(computes.load(Ordering::Relaxed), after_first);

        h.set_local_transform(a, translation(2.0, 0.0, 0.0), true);
        h.global_transform(c);
        assert!(computes.load(Ordering::Relaxed) > after_first);
    }

    #[test]
    fn cached_global_is_returned_without_recomputing() {
        let (mut h, _, _, c) = bone_chain();
        let first = h.global_transform(c);
        let slots = h.pose_slots(c.idx).unwrap();
        assert!(!slots.is_dirty(&h.storage, TransformType::CurrentGlobal));

        // A recompute would overwrite the planted value.
        let planted = translation(-7.0, -7.0, -7.0);
        slots.set(&mut h.storage, TransformType::CurrentGlobal, planted);
        let version = h.pose_version(c);
        assert_transform_eq(&h.global_transform(c), &planted);
        assert!(!slots.is_dirty(&h.storage, TransformType::CurrentGlobal));
        assert_eq!(h.pose_version(c), version);

        slots.set(&mut h.storage, TransformType::CurrentGlobal, first);
        assert_transform_eq(&h.global_transform(c), &translation(1.0, 1.0, 1.0));
    }

    /// `p` at the root, `x` under `p`, `y` under `x`, and `m` under both `x`
    /// and `p`.
    fn sibling_blend() -> (Hierarchy, [ElementIndex; 4]) {
        let mut h = Hierarchy::new();
        let p = h
            .add_null("p", None, translation(1.0, 0.0, 0.0), false)
            .unwrap();
        let x = h
            .add_null("x", Some(p), translation(0.0, 1.0, 0.0), false)
            .unwrap();
        let y = h
            .add_null("y", Some(x), translation(2.0, 0.0, 0.0), false)
            .unwrap();
        let m = h
            .add_null("m", Some(x), translation(0.0, 0.0, 1.0), false)
            .unwrap();
        h.add_parent(m, p, ElementWeight::splat(0.5), true).unwrap();
        (h, [p, x, y, m])
    }

    #[test]
    fn sibling_solve_does_not_leave_both_spaces_dirty() {
        let (mut h, [p, x, y, m]) = sibling_blend();
        h.compute_all_transforms();

        // `y` keeps its global, so its local goes dirty; `x`'s global too.
        h.set_local_transform(x, translation(0.0, 3.0, 0.0), false);
        h.set_local_transform(x, translation(0.0, 4.0, 0.0), false);
        // Solving `m` reads `x`'s global while `p` propagates.
        h.set_local_transform(p, translation(5.0, 0.0, 0.0), true);

        for e in [p, x, y, m] {
            for (local, global) in [
                (TransformType::CurrentLocal, TransformType::CurrentGlobal),
                (TransformType::InitialLocal, TransformType::InitialGlobal),
            ] {
                assert!(
                    !(is_dirty(&h, e, local) && is_dirty(&h, e, global)),
                    "{e:?} has both spaces dirty"
                );
            }
        }
        assert_transform_eq(&h.global_transform(x), &translation(5.0, 4.0, 0.0));
        // `y` held (3, 1, 0) while `x` moved, then follows `p` by (4, 0, 0).
        assert_transform_eq(&h.global_transform(y), &translation(7.0, 1.0, 0.0));
    }

    #[test]
    fn single_keep_global_write_then_parent_move_follows() {
        let (mut h, [p, x, y, _]) = sibling_blend();
        h.compute_all_transforms();
        h.set_local_transform(x, translation(0.0, 4.0, 0.0), false);
        h.set_local_transform(p, translation(5.0, 0.0, 0.0), true);
        assert_transform_eq(&h.global_transform(y), &translation(7.0, 1.0, 0.0));
    }

    /// Random writes against a twin hierarchy that is fully recomputed
    /// before every write, so its propagation never starts from dirty state.
    #[test]
    fn random_writes_match_a_fully_computed_twin() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        fn build() -> (Hierarchy, [ElementIndex; 5]) {
            let (mut h, [p, x, y, m]) = sibling_blend();
            let q = h
                .add_bone("q", Some(y), translation(0.0, 0.0, 3.0), false)
                .unwrap();
            (h, [p, x, y, m, q])
        }

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (mut h, elements) = build();
            let (mut twin, _) = build();
            h.compute_all_transforms();

            for step in 0..40 {
                let e = elements[rng.gen_range(0..elements.len())];
                if rng.gen_bool(0.3) {
                    twin.compute_all_transforms();
                    assert!(
                        h.global_transform(e)
                            .abs_diff_eq(&twin.global_transform(e), 1e-6),
                        "seed {seed} step {step}: global of {e:?} diverged"
                    );
                    continue;
                }
                let value = translation(
                    f64::from(rng.gen_range(-5_i32..=5)),
                    f64::from(rng.gen_range(-5_i32..=5)),
                    f64::from(rng.gen_range(-5_i32..=5)),
                );
                let ty = if rng.gen_bool(0.5) {
                    TransformType::CurrentLocal
                } else {
                    TransformType::CurrentGlobal
                };
                let affect_children = rng.gen_bool(0.5);
                twin.compute_all_transforms();
                twin.set_transform(e, value, ty, affect_children, false, false);
                h.set_transform(e, value, ty, affect_children, false, false);
            }

            twin.compute_all_transforms();
            for e in elements {
                for ty in [TransformType::CurrentLocal, TransformType::CurrentGlobal] {
                    assert!(
                        h.transform(e, ty).abs_diff_eq(&twin.transform(e, ty), 1e-6),
                        "seed {seed}: {ty:?} of {e:?} diverged"
                    );
                }
            }
        }
    }
}
