// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A lockable, clonable hierarchy handle (requires the `std` feature).
//!
//! Evaluation is single-threaded: every method on
//! [`Hierarchy`](crate::hierarchy::Hierarchy) takes `&mut self` or `&self`.
//! [`SharedHierarchy`] puts one hierarchy behind a coarse mutex so an editor
//! thread and an evaluation thread can take turns, and so one hierarchy can
//! mirror another's writes as a [`HierarchyListener`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::hierarchy::Hierarchy;
use crate::notify::{HierarchyListener, MutationEvent};

/// Shared ownership of a [`Hierarchy`] behind a mutex.
///
/// Clones refer to the same hierarchy.
#[derive(Clone, Debug, Default)]
pub struct SharedHierarchy(Arc<Mutex<Hierarchy>>);

impl SharedHierarchy {
    /// Wraps `hierarchy`.
    #[must_use]
    pub fn new(hierarchy: Hierarchy) -> Self {
        Self(Arc::new(Mutex::new(hierarchy)))
    }

    /// Blocks until the hierarchy is free.
    ///
    /// A panic while another holder had the lock does not poison the
    /// hierarchy for later users.
    pub fn lock(&self) -> MutexGuard<'_, Hierarchy> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks without blocking. Returns `None` if another holder has it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Hierarchy>> {
        match self.0.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Runs `f` with the hierarchy locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Hierarchy) -> R) -> R {
        f(&mut self.lock())
    }

    /// Whether both handles refer to the same hierarchy.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Mirrors every received write into the shared hierarchy by key.
///
/// A write that arrives while the hierarchy is locked elsewhere (including a
/// hierarchy listening to itself) is dropped.
impl HierarchyListener for SharedHierarchy {
    fn on_mutation(&mut self, event: &MutationEvent) {
        if let Some(mut hierarchy) = self.try_lock() {
            hierarchy.apply_mutation(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use super::*;
    use crate::element::{ElementKey, ElementType, TransformType};
    use crate::hierarchy::test_util::{assert_transform_eq, translation};
    use crate::math::Transform;

    fn build(h: &mut Hierarchy) {
        let root = h.add_bone("root", None, Transform::IDENTITY, false).unwrap();
        h.add_bone("tip", Some(root), translation(1.0, 0.0, 0.0), false)
            .unwrap();
    }

    #[test]
    fn mirror_follows_source_writes() {
        let mut source = Hierarchy::new();
        build(&mut source);
        let mirror = SharedHierarchy::new(Hierarchy::new());
        mirror.with(build);
        source.add_listener(Box::new(mirror.clone()));

        let root = source.find(&ElementKey::new(ElementType::Bone, "root")).unwrap();
        source.set_local_transform(root, translation(0.0, 3.0, 0.0), true);

        let tip = ElementKey::new(ElementType::Bone, "tip");
        let mut guard = mirror.lock();
        assert_transform_eq(
            &guard.transform_by_key(&tip, TransformType::CurrentGlobal).unwrap(),
            &translation(1.0, 3.0, 0.0),
        );
        assert!(!guard.can_undo(), "mirrored writes must not record undo");
    }

    #[test]
    fn busy_mirror_drops_writes() {
        let mut source = Hierarchy::new();
        build(&mut source);
        let mirror = SharedHierarchy::new(Hierarchy::new());
        mirror.with(build);
        source.add_listener(Box::new(mirror.clone()));

        let held = mirror.lock();
        let root = source.find(&ElementKey::new(ElementType::Bone, "root")).unwrap();
        source.set_local_transform(root, translation(5.0, 0.0, 0.0), true);
        drop(held);

        let key = ElementKey::new(ElementType::Bone, "root");
        let value = mirror.with(|h| h.transform_by_key(&key, TransformType::CurrentLocal));
        assert_transform_eq(&value.unwrap(), &Transform::IDENTITY);
    }

    #[test]
    fn clones_share_one_hierarchy() {
        let a = SharedHierarchy::default();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        a.with(build);
        assert_eq!(b.lock().num_elements(), 2);
        let guard = a.lock();
        assert!(b.try_lock().is_none());
        drop(guard);
        assert!(b.try_lock().is_some());
    }
}
