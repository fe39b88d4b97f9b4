// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change draining, notifications, and mutation listeners.

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::Hierarchy;
use crate::dirty;
use crate::element::ElementIndex;
use crate::notify::{HierarchyListener, MutationEvent, Notification};

/// Elements that changed since the previous
/// [`take_changes`](Hierarchy::take_changes).
///
/// Lists hold live elements only, in ascending slot order. Removed elements
/// are reported by slot index, since their handles are stale.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyChanges {
    /// Elements whose pose changed, including every dependent.
    pub pose: Vec<ElementIndex>,
    /// Controls whose offset transform was written.
    pub offsets: Vec<ElementIndex>,
    /// Controls whose shape transform was written.
    pub shapes: Vec<ElementIndex>,
    /// Curves whose value was written or unset.
    pub curves: Vec<ElementIndex>,
    /// Elements that were added or whose parent links changed.
    pub topology: Vec<ElementIndex>,
    /// Elements added since the last drain.
    pub added: Vec<ElementIndex>,
    /// Slot indices of elements removed since the last drain.
    pub removed: Vec<u32>,
}

impl HierarchyChanges {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pose.is_empty()
            && self.offsets.is_empty()
            && self.shapes.is_empty()
            && self.curves.is_empty()
            && self.topology.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
    }

    /// Clears all lists, keeping their allocations.
    pub fn clear(&mut self) {
        self.pose.clear();
        self.offsets.clear();
        self.shapes.clear();
        self.curves.clear();
        self.topology.clear();
        self.added.clear();
        self.removed.clear();
    }
}

impl Hierarchy {
    // -- Change sets --

    /// Drains every change channel.
    #[must_use]
    pub fn take_changes(&mut self) -> HierarchyChanges {
        let mut changes = HierarchyChanges::default();
        self.take_changes_into(&mut changes);
        changes
    }

    /// Like [`take_changes`](Self::take_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn take_changes_into(&mut self, changes: &mut HierarchyChanges) {
        changes.clear();

        let pose: Vec<u32> = self
            .changes
            .drain(dirty::POSE)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.pose = self.live_handles(pose);

        let offsets: Vec<u32> = self
            .changes
            .drain(dirty::OFFSET)
            .deterministic()
            .run()
            .collect();
        changes.offsets = self.live_handles(offsets);

        let shapes: Vec<u32> = self
            .changes
            .drain(dirty::SHAPE)
            .deterministic()
            .run()
            .collect();
        changes.shapes = self.live_handles(shapes);

        let curves: Vec<u32> = self
            .changes
            .drain(dirty::CURVE)
            .deterministic()
            .run()
            .collect();
        changes.curves = self.live_handles(curves);

        let topology: Vec<u32> = self
            .changes
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology = self.live_handles(topology);

        let added = core::mem::take(&mut self.pending_added);
        changes.added = self.live_handles(added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    fn live_handles(&self, mut slots: Vec<u32>) -> Vec<ElementIndex> {
        slots.sort_unstable();
        slots.dedup();
        slots
            .into_iter()
            .filter(|&idx| self.is_live(idx))
            .map(|idx| self.handle(idx))
            .collect()
    }

    // -- Notifications --

    /// Drains queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// While suspended, notifications are dropped instead of queued.
    pub fn set_notifications_suspended(&mut self, suspended: bool) {
        self.notifications_suspended = suspended;
    }

    /// Whether notifications are currently dropped.
    #[must_use]
    pub fn notifications_suspended(&self) -> bool {
        self.notifications_suspended
    }

    // -- Listeners --

    /// Registers a listener for value writes.
    pub fn add_listener(&mut self, listener: Box<dyn HierarchyListener + Send>) {
        self.listeners.push(listener);
    }

    /// Drops every listener.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn num_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Forwards `event` to every listener reacting to its transform type.
    ///
    /// Does nothing while a propagation is already running on this hierarchy.
    pub fn propagate_to_listeners(&mut self, event: &MutationEvent) {
        if self.propagating || self.listeners.is_empty() {
            return;
        }
        self.propagating = true;
        let mut listeners = core::mem::take(&mut self.listeners);
        for listener in &mut listeners {
            if event.transform_type().is_none_or(|ty| listener.reacts_to(ty)) {
                listener.on_mutation(event);
            }
        }
        self.listeners = listeners;
        self.propagating = false;
    }

    /// Builds and forwards an event only when someone listens.
    pub(crate) fn emit(&mut self, event: impl FnOnce() -> MutationEvent) {
        if self.propagating || self.listeners.is_empty() {
            return;
        }
        let event = event();
        self.propagate_to_listeners(&event);
    }

    /// Replays a mutation recorded on another hierarchy, matching elements
    /// by key and without recording undo.
    ///
    /// Returns `false` if the element does not exist here.
    pub fn apply_mutation(&mut self, event: &MutationEvent) -> bool {
        let Some(index) = self.find(event.key()) else {
            return false;
        };
        let idx = index.idx;
        match event {
            MutationEvent::TransformSet {
                value,
                transform_type,
                affect_children,
                force,
                ..
            } => {
                self.set_transform_at(idx, *value, *transform_type, *affect_children, false, *force);
            }
            MutationEvent::ControlOffsetSet {
                value,
                transform_type,
                affect_children,
                force,
                ..
            } => {
                self.set_offset_at(idx, *value, *transform_type, *affect_children, false, *force);
            }
            MutationEvent::ControlShapeSet {
                value,
                transform_type,
                force,
                ..
            } => self.set_shape_at(idx, *value, *transform_type, false, *force),
            MutationEvent::CurveSet { value, force, .. } => {
                self.set_curve_at(idx, *value, false, *force);
            }
            MutationEvent::CurveUnset { .. } => self.unset_curve_value(index, false),
            MutationEvent::ParentWeightsSet {
                weights,
                initial,
                affect_children,
                ..
            } => {
                self.set_parent_weights(index, weights, *initial, *affect_children);
            }
            MutationEvent::TransformUndone(entry) => self.apply_stack_entry(entry, true),
            MutationEvent::TransformRedone(entry) => self.apply_stack_entry(entry, false),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::element::{ElementKey, ElementType, TransformType};
    use crate::hierarchy::test_util::{assert_transform_eq, translation};
    use crate::math::Transform;

    struct Recorder {
        events: Arc<AtomicU32>,
        local_only: bool,
    }

    impl HierarchyListener for Recorder {
        fn on_mutation(&mut self, _event: &MutationEvent) {
            self.events.fetch_add(1, Ordering::Relaxed);
        }

        fn reacts_to(&self, transform_type: TransformType) -> bool {
            !self.local_only || transform_type.is_local()
        }
    }

    #[test]
    fn pose_changes_include_dependents() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        let b = h.add_bone("b", Some(a), Transform::IDENTITY, false).unwrap();
        let c = h.add_curve("c", 0.0).unwrap();
        let first = h.take_changes();
        assert_eq!(first.added, alloc::vec![a, b, c]);
        assert!(first.topology.contains(&b));

        h.set_local_transform(a, translation(1.0, 0.0, 0.0), true);
        h.set_curve_value(c, 1.0, false, false);
        let changes = h.take_changes();
        assert_eq!(changes.pose, alloc::vec![a, b]);
        assert_eq!(changes.curves, alloc::vec![c]);
        assert!(changes.added.is_empty());

        assert!(h.take_changes().is_empty());
    }

    #[test]
    fn removed_elements_are_reported_by_slot() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        let _ = h.take_changes();
        h.remove_element(a);
        let changes = h.take_changes();
        assert_eq!(changes.removed, alloc::vec![a.index()]);
        assert!(changes.topology.is_empty());
    }

    #[test]
    fn notifications_queue_and_suspend() {
        let mut h = Hierarchy::new();
        h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        h.set_notifications_suspended(true);
        h.add_bone("b", None, Transform::IDENTITY, false).unwrap();
        h.set_notifications_suspended(false);
        assert_eq!(
            h.take_notifications(),
            alloc::vec![Notification::ElementAdded(ElementKey::new(ElementType::Bone, "a"))]
        );
        assert!(h.take_notifications().is_empty());
    }

    #[test]
    fn listeners_filter_by_transform_type() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        let all = Arc::new(AtomicU32::new(0));
        let local = Arc::new(AtomicU32::new(0));
        h.add_listener(Box::new(Recorder {
            events: Arc::clone(&all),
            local_only: false,
        }));
        h.add_listener(Box::new(Recorder {
            events: Arc::clone(&local),
            local_only: true,
        }));
        assert_eq!(h.num_listeners(), 2);

        h.set_local_transform(a, translation(1.0, 0.0, 0.0), true);
        h.set_global_transform(a, translation(2.0, 0.0, 0.0), true);
        assert_eq!(all.load(Ordering::Relaxed), 2);
        assert_eq!(local.load(Ordering::Relaxed), 1);

        h.clear_listeners();
        h.set_local_transform(a, translation(3.0, 0.0, 0.0), true);
        assert_eq!(all.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn apply_mutation_matches_by_key() {
        let mut mirror = Hierarchy::new();
        let root = mirror.add_bone("root", None, Transform::IDENTITY, false).unwrap();
        mirror
            .add_bone("tip", Some(root), translation(1.0, 0.0, 0.0), false)
            .unwrap();
        let tip = ElementKey::new(ElementType::Bone, "tip");
        let event = MutationEvent::TransformSet {
            key: ElementKey::new(ElementType::Bone, "root"),
            value: translation(0.0, 4.0, 0.0),
            transform_type: TransformType::CurrentLocal,
            affect_children: true,
            force: false,
        };
        assert!(mirror.apply_mutation(&event));
        assert_transform_eq(
            &mirror
                .transform_by_key(&tip, TransformType::CurrentGlobal)
                .unwrap(),
            &translation(1.0, 4.0, 0.0),
        );
        let missing = MutationEvent::CurveUnset {
            key: ElementKey::new(ElementType::Curve, "nope"),
        };
        assert!(!mirror.apply_mutation(&missing));
    }
}
