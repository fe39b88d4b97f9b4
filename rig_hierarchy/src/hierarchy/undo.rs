// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Undo and redo through the transform stack.

use super::Hierarchy;
use crate::dirty;
use crate::element::ElementData;
use crate::notify::{MutationEvent, Notification};
use crate::trace::StackStepEvent;
use crate::undo::{StackEntry, StackEntryType, TransformStack};

impl Hierarchy {
    /// The recorded undo/redo history.
    #[inline]
    #[must_use]
    pub fn transform_stack(&self) -> &TransformStack {
        &self.stack
    }

    /// Opens an interaction bracket: until it closes, consecutive writes to
    /// the same element coalesce into one undo entry.
    ///
    /// Returns `false` if a bracket is already open.
    pub fn begin_interaction(&mut self) -> bool {
        let opened = self.stack.begin_interaction();
        if opened {
            self.notify(Notification::InteractionBracketOpened);
        }
        opened
    }

    /// Closes the interaction bracket. Returns `false` if none was open.
    pub fn end_interaction(&mut self) -> bool {
        let closed = self.stack.end_interaction();
        if closed {
            self.notify(Notification::InteractionBracketClosed);
        }
        closed
    }

    /// Restores the old value of the newest entry. Returns `false` if there
    /// is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.stack.pop_undo() else {
            return false;
        };
        self.apply_stack_entry(&entry, true);
        self.tracer.undo(&StackStepEvent {
            index: self.stack.index(),
            entry_type: entry.entry_type,
            transform_type: entry.transform_type,
        });
        self.emit(|| MutationEvent::TransformUndone(entry));
        true
    }

    /// Reapplies the newest undone entry. Returns `false` if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.stack.pop_redo() else {
            return false;
        };
        self.apply_stack_entry(&entry, false);
        self.tracer.redo(&StackStepEvent {
            index: self.stack.index(),
            entry_type: entry.entry_type,
            transform_type: entry.transform_type,
        });
        self.emit(|| MutationEvent::TransformRedone(entry));
        true
    }

    /// Undoes or redoes until `target` entries remain on the undo stack.
    ///
    /// Returns whether the target was reached.
    pub fn set_transform_stack_index(&mut self, target: usize) -> bool {
        while self.stack.index() > target {
            if !self.undo() {
                break;
            }
        }
        while self.stack.index() < target {
            if !self.redo() {
                break;
            }
        }
        self.stack.index() == target
    }

    /// Number of undoable entries.
    #[inline]
    #[must_use]
    pub fn transform_stack_index(&self) -> usize {
        self.stack.index()
    }

    /// Drops the whole history.
    pub fn reset_transform_stack(&mut self) {
        self.stack.clear();
    }

    /// Whether an undo step is available.
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.stack.can_undo()
    }

    /// Whether a redo step is available.
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.stack.can_redo()
    }

    /// Writes the entry's old (`undo`) or new value through the regular
    /// setters, without recording undo or notifying listeners.
    pub(crate) fn apply_stack_entry(&mut self, entry: &StackEntry, undo: bool) {
        let Some(index) = self.find(&entry.key) else {
            return;
        };
        let idx = index.idx;
        let value = if undo { entry.old } else { entry.new };
        let ty = entry.transform_type;

        let propagating = core::mem::replace(&mut self.propagating, true);
        match entry.entry_type {
            StackEntryType::TransformPose => {
                self.set_transform_at(idx, value, ty, entry.affect_children, false, true);
            }
            StackEntryType::ControlOffset => {
                self.set_offset_at(idx, value, ty, entry.affect_children, false, true);
            }
            StackEntryType::ControlShape => self.set_shape_at(idx, value, ty, false, true),
            StackEntryType::CurveValue => {
                let (value, is_set) = entry.curve_value(undo);
                if let ElementData::Curve(curve) = &mut self.data[idx as usize] {
                    curve.value = value;
                    curve.is_set = is_set;
                    self.changes.mark(idx, dirty::CURVE);
                }
            }
        }
        self.propagating = propagating;
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::element::{ElementIndex, TransformType};
    use crate::hierarchy::test_util::{assert_transform_eq, translation};
    use crate::math::Transform;
    use crate::notify::HierarchyListener;

    fn one_bone() -> (Hierarchy, ElementIndex) {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        (h, a)
    }

    fn write(h: &mut Hierarchy, e: ElementIndex, x: f64) {
        h.set_transform(
            e,
            translation(x, 0.0, 0.0),
            TransformType::CurrentLocal,
            true,
            true,
            false,
        );
    }

    #[test]
    fn undo_and_redo_restore_values() {
        let (mut h, a) = one_bone();
        write(&mut h, a, 1.0);
        write(&mut h, a, 2.0);
        assert_eq!(h.transform_stack_index(), 2);

        assert!(h.undo());
        assert_transform_eq(&h.local_transform(a), &translation(1.0, 0.0, 0.0));
        assert!(h.undo());
        assert_transform_eq(&h.local_transform(a), &Transform::IDENTITY);
        assert!(!h.undo());
        assert!(h.can_redo());

        assert!(h.redo());
        assert_transform_eq(&h.local_transform(a), &translation(1.0, 0.0, 0.0));
        // Replaying does not record new entries.
        assert_eq!(h.transform_stack().redo_len(), 1);
    }

    #[test]
    fn interaction_coalesces_writes() {
        let (mut h, a) = one_bone();
        assert!(h.begin_interaction());
        assert!(!h.begin_interaction());
        for step in 1..=5 {
            write(&mut h, a, f64::from(step));
        }
        assert!(h.end_interaction());
        assert_eq!(h.transform_stack_index(), 1);
        assert!(h.undo());
        assert_transform_eq(&h.local_transform(a), &Transform::IDENTITY);
        assert_eq!(
            h.take_notifications()
                .into_iter()
                .filter(|n| matches!(
                    n,
                    Notification::InteractionBracketOpened | Notification::InteractionBracketClosed
                ))
                .count(),
            2
        );
    }

    #[test]
    fn stack_index_walks_both_ways() {
        let (mut h, a) = one_bone();
        for step in 1..=4 {
            write(&mut h, a, f64::from(step));
        }
        assert!(h.set_transform_stack_index(1));
        assert_transform_eq(&h.local_transform(a), &translation(1.0, 0.0, 0.0));
        assert!(h.set_transform_stack_index(3));
        assert_transform_eq(&h.local_transform(a), &translation(3.0, 0.0, 0.0));
        assert!(!h.set_transform_stack_index(9));
        assert_eq!(h.transform_stack_index(), 4);
        h.reset_transform_stack();
        assert!(!h.can_undo());
    }

    #[test]
    fn curve_undo_restores_set_flag() {
        let mut h = Hierarchy::new();
        let c = h.add_curve("c", 0.0).unwrap();
        h.set_curve_value(c, 3.0, true, false);
        assert!(h.undo());
        assert!(!h.is_curve_value_set(c));
        assert_eq!(h.curve_value(c), 0.0);
        assert!(h.redo());
        assert!(h.is_curve_value_set(c));
        assert_eq!(h.curve_value(c), 3.0);
    }

    #[test]
    fn offset_and_shape_writes_are_undoable() {
        let mut h = Hierarchy::new();
        let ctrl = h
            .add_control(
                "ctrl",
                None,
                crate::element::ControlSettings::default(),
                Transform::IDENTITY,
                Transform::IDENTITY,
                Transform::IDENTITY,
            )
            .unwrap();
        h.set_control_offset_transform(
            ctrl,
            translation(1.0, 0.0, 0.0),
            TransformType::CurrentLocal,
            true,
            true,
            false,
        );
        h.set_control_shape_transform(
            ctrl,
            translation(0.0, 1.0, 0.0),
            TransformType::CurrentLocal,
            true,
            false,
        );
        assert!(h.undo());
        assert_transform_eq(
            &h.control_shape_transform(ctrl, TransformType::CurrentLocal),
            &Transform::IDENTITY,
        );
        assert!(h.undo());
        assert_transform_eq(&h.global_transform(ctrl), &Transform::IDENTITY);
    }

    /// Counts every event and, separately, undo events.
    struct Count {
        all: Arc<AtomicU32>,
        undone: Arc<AtomicU32>,
    }

    impl HierarchyListener for Count {
        fn on_mutation(&mut self, event: &MutationEvent) {
            self.all.fetch_add(1, Ordering::Relaxed);
            if matches!(event, MutationEvent::TransformUndone(_)) {
                self.undone.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn listeners_see_undo_once() {
        let (mut h, a) = one_bone();
        write(&mut h, a, 1.0);
        let all = Arc::new(AtomicU32::new(0));
        let undone = Arc::new(AtomicU32::new(0));
        h.add_listener(Box::new(Count {
            all: Arc::clone(&all),
            undone: Arc::clone(&undone),
        }));
        assert!(h.undo());
        assert_eq!(all.load(Ordering::Relaxed), 1);
        assert_eq!(undone.load(Ordering::Relaxed), 1);
    }
}
