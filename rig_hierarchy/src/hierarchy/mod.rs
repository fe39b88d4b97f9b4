// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rig hierarchy: element store, topology, and the transform cache.
//!
//! A [`Hierarchy`] owns every element struct-of-arrays style, addressed by
//! [`ElementIndex`] handles. Its API is split across submodules by concern:
//!
//! - `store`: adding, removing and looking up elements.
//! - `topology`: parents, the lazily rebuilt children cache, traversal and
//!   dependency queries.
//! - `cache`: the dirty-flag transform cache, curve values and control
//!   offset/shape transforms.
//! - `parents`: parent weights, reparenting and space switching.
//! - `pose`: pose capture and restore.
//! - `undo`: the transform undo/redo stack.
//! - `changes`: change draining, notifications and listeners.
//! - `compact`: storage shrinking and sorting.
//!
//! Transform getters take `&mut self` because reading a dirty transform
//! computes and caches it.

mod cache;
mod changes;
mod compact;
mod parents;
mod pose;
mod store;
mod topology;
mod undo;

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use understory_dirty::{CycleHandling, DirtyTracker};

pub use changes::HierarchyChanges;
pub use store::ElementRef;
pub use topology::{Children, DependencyMap, Traversal};

use crate::config::HierarchyConfig;
use crate::element::{AnimationType, ElementData, ElementIndex, ElementKey, ElementType, Parents};
use crate::notify::{HierarchyListener, Notification};
use crate::storage::TransformStorage;
use crate::trace::{TraceSink, Tracer};
use crate::undo::TransformStack;

/// Struct-of-arrays storage and evaluation state for all rig elements.
///
/// Removed elements are recycled via a free list, and generation counters
/// prevent stale handle access: every method taking an [`ElementIndex`]
/// panics on a stale handle unless documented otherwise. Methods returning a
/// [`HierarchyError`](crate::error::HierarchyError) report unknown handles as
/// errors instead.
pub struct Hierarchy {
    // -- Elements --
    pub(crate) keys: Vec<ElementKey>,
    pub(crate) data: Vec<ElementData>,
    pub(crate) sub_index: Vec<u32>,
    pub(crate) pose_version: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,

    // -- Lookup --
    pub(crate) order: Vec<u32>,
    pub(crate) by_type: [Vec<u32>; ElementType::COUNT],
    pub(crate) lookup: HashMap<ElementKey, u32>,

    // -- Topology --
    pub(crate) parents: Vec<Parents>,
    pub(crate) dependents: Vec<Vec<u32>>,
    pub(crate) topology_version: u32,
    pub(crate) children_cache: topology::ChildrenCache,
    pub(crate) dependency_memo: HashMap<(u32, u32), bool>,
    pub(crate) dependency_memo_version: Option<u32>,

    // -- Transform storage --
    pub(crate) storage: TransformStorage,

    // -- Change tracking --
    pub(crate) changes: DirtyTracker<u32>,
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    // -- Notifications --
    pub(crate) notifications: VecDeque<Notification>,
    pub(crate) notifications_suspended: bool,
    pub(crate) listeners: Vec<Box<dyn HierarchyListener + Send>>,
    pub(crate) propagating: bool,

    // -- Undo --
    pub(crate) stack: TransformStack,

    // -- Configuration --
    pub(crate) config: HierarchyConfig,
    pub(crate) tracer: Tracer,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("elements", &self.order.len())
            .field("topology_version", &self.topology_version)
            .field("transforms", &self.storage.transforms.len())
            .field("listeners", &self.listeners.len())
            .field("config", &self.config)
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}

impl Hierarchy {
    /// Creates an empty hierarchy with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HierarchyConfig::default())
    }

    /// Creates an empty hierarchy.
    #[must_use]
    pub fn with_config(config: HierarchyConfig) -> Self {
        Self {
            keys: Vec::new(),
            data: Vec::new(),
            sub_index: Vec::new(),
            pose_version: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
            by_type: core::array::from_fn(|_| Vec::new()),
            lookup: HashMap::new(),
            parents: Vec::new(),
            dependents: Vec::new(),
            topology_version: 0,
            children_cache: topology::ChildrenCache::default(),
            dependency_memo: HashMap::new(),
            dependency_memo_version: None,
            storage: TransformStorage::default(),
            changes: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            notifications: VecDeque::new(),
            notifications_suspended: false,
            listeners: Vec::new(),
            propagating: false,
            stack: TransformStack::new(),
            config,
            tracer: Tracer::none(),
        }
    }

    /// The configuration this hierarchy was created with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Installs a trace sink, replacing any previous one.
    ///
    /// Events are only delivered when the `trace` feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.tracer = Tracer::new(sink);
    }

    /// Removes and returns the trace sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink + Send>> {
        self.tracer.take()
    }

    /// Incremented whenever elements or parent links change.
    #[inline]
    #[must_use]
    pub fn topology_version(&self) -> u32 {
        self.topology_version
    }

    /// Read-only access to the backing storage pools.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &TransformStorage {
        &self.storage
    }

    // -- Internal helpers --

    /// Number of slots (live and free).
    #[inline]
    pub(crate) fn slot_count(&self) -> u32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "element counts are bounded by u32 handles"
        )]
        let len = self.keys.len() as u32;
        len
    }

    /// Builds a handle for a live slot.
    #[inline]
    pub(crate) fn handle(&self, idx: u32) -> ElementIndex {
        ElementIndex {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Whether `idx` is a live slot.
    #[inline]
    pub(crate) fn is_live(&self, idx: u32) -> bool {
        (idx as usize) < self.live.len() && self.live[idx as usize]
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, index: ElementIndex) {
        let i = index.idx as usize;
        assert!(
            i < self.keys.len() && self.live[i] && self.generation[i] == index.generation,
            "stale ElementIndex: {index:?} (current gen: {})",
            if i < self.keys.len() {
                self.generation[i]
            } else {
                u32::MAX
            }
        );
    }

    /// Live slot indices in insertion order.
    #[inline]
    pub(crate) fn ordered(&self) -> Vec<u32> {
        self.order.clone()
    }

    pub(crate) fn bump_topology(&mut self) {
        self.topology_version = self.topology_version.wrapping_add(1);
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        if !self.notifications_suspended {
            self.notifications.push_back(notification);
        }
    }

    #[inline]
    pub(crate) fn is_multi_parent(&self, idx: u32) -> bool {
        matches!(self.parents[idx as usize], Parents::Multi(_))
    }

    #[inline]
    pub(crate) fn is_control(&self, idx: u32) -> bool {
        matches!(self.data[idx as usize], ElementData::Control(_))
    }

    #[inline]
    pub(crate) fn is_animation_channel(&self, idx: u32) -> bool {
        self.data[idx as usize]
            .control()
            .is_some_and(|c| c.settings.animation_type == AnimationType::AnimationChannel)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::math::{Quat, Transform, Vec3};

    pub(crate) fn translation(x: f64, y: f64, z: f64) -> Transform {
        Transform::from_translation(Vec3::new(x, y, z))
    }

    pub(crate) fn rotation_z(degrees: f64) -> Transform {
        Transform::from_rotation(Quat::from_axis_angle(
            Vec3::new(0.0, 0.0, 1.0),
            degrees.to_radians(),
        ))
    }

    #[track_caller]
    pub(crate) fn assert_transform_eq(a: &Transform, b: &Transform) {
        assert!(a.abs_diff_eq(b, 1e-6), "{a:?} != {b:?}");
    }
}
