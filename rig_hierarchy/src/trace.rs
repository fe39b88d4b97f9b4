// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for hierarchy evaluation.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! cache engine calls at each interesting step: a dirty transform being
//! recomputed, a transform write, a dirty propagation pass, a children-cache
//! rebuild, storage compaction, a space switch, undo and redo. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! A [`Hierarchy`](crate::hierarchy::Hierarchy) owns a [`Tracer`] wrapping an
//! optional boxed sink. When the `trace` feature is **off**, every `Tracer`
//! method compiles to nothing and installed sinks are dropped. When **on**,
//! each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-element
//!   [`TraceSink::on_elements_dirtied`] event.

use alloc::boxed::Box;

use crate::element::{ElementIndex, ElementType, TransformType};
use crate::storage::StorageKind;
use crate::undo::StackEntryType;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a dirty transform is recomputed from the opposite space.
#[derive(Clone, Copy, Debug)]
pub struct TransformComputedEvent {
    /// The element.
    pub element: ElementIndex,
    /// Element type.
    pub kind: ElementType,
    /// Which transform set was recomputed.
    pub storage: StorageKind,
    /// Which slot was recomputed.
    pub transform_type: TransformType,
}

/// Emitted when a transform is written.
#[derive(Clone, Copy, Debug)]
pub struct TransformSetEvent {
    /// The element.
    pub element: ElementIndex,
    /// Which transform set was written.
    pub storage: StorageKind,
    /// Which slot was written.
    pub transform_type: TransformType,
    /// Whether dependents follow the write.
    pub affect_children: bool,
}

/// Emitted after a dirty propagation pass.
#[derive(Clone, Copy, Debug)]
pub struct DirtyPropagatedEvent {
    /// The element whose write started the pass.
    pub element: ElementIndex,
    /// Initial or current pose.
    pub initial: bool,
    /// Whether dependents' globals were dirtied (otherwise their locals).
    pub affect_children: bool,
    /// Number of dependents marked dirty.
    pub dirtied: u32,
}

/// Emitted when the children cache is rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct ChildrenCacheRebuiltEvent {
    /// Topology version the cache now matches.
    pub topology_version: u32,
    /// Number of live elements.
    pub elements: u32,
    /// Total number of parent-child links.
    pub links: u32,
}

/// Emitted after the storage pools are shrunk or sorted.
#[derive(Clone, Copy, Debug)]
pub struct StorageCompactedEvent {
    /// `true` for a sort, `false` for a shrink.
    pub sorted: bool,
    /// Transform pool length before.
    pub transforms_before: u32,
    /// Transform pool length after.
    pub transforms_after: u32,
}

/// Emitted after a successful space switch.
#[derive(Clone, Copy, Debug)]
pub struct ParentSwitchedEvent {
    /// The child.
    pub child: ElementIndex,
    /// The parent that now carries all weight, or `None` for world space.
    pub parent: Option<ElementIndex>,
    /// Initial or current weights.
    pub initial: bool,
}

/// Emitted when an undo or redo step is applied.
#[derive(Clone, Copy, Debug)]
pub struct StackStepEvent {
    /// Stack index after the step.
    pub index: usize,
    /// What the entry restored.
    pub entry_type: StackEntryType,
    /// Which slot the entry restored.
    pub transform_type: TransformType,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from hierarchy evaluation.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a dirty transform is recomputed.
    fn on_transform_computed(&mut self, e: &TransformComputedEvent) {
        _ = e;
    }

    /// Called when a transform is written.
    fn on_transform_set(&mut self, e: &TransformSetEvent) {
        _ = e;
    }

    /// Called after a dirty propagation pass.
    fn on_dirty_propagated(&mut self, e: &DirtyPropagatedEvent) {
        _ = e;
    }

    /// Called when the children cache is rebuilt.
    fn on_children_cache_rebuilt(&mut self, e: &ChildrenCacheRebuiltEvent) {
        _ = e;
    }

    /// Called after storage compaction.
    fn on_storage_compacted(&mut self, e: &StorageCompactedEvent) {
        _ = e;
    }

    /// Called after a space switch.
    fn on_parent_switched(&mut self, e: &ParentSwitchedEvent) {
        _ = e;
    }

    /// Called after an undo step.
    fn on_undo(&mut self, e: &StackStepEvent) {
        _ = e;
    }

    /// Called after a redo step.
    fn on_redo(&mut self, e: &StackStepEvent) {
        _ = e;
    }

    /// Called with the raw indices of every element a propagation pass
    /// dirtied (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_elements_dirtied(&mut self, source: ElementIndex, dirtied: &[u32]) {
        _ = (source, dirtied);
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer
// ---------------------------------------------------------------------------

/// Thin owner of an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
#[derive(Default)]
pub struct Tracer {
    #[cfg(feature = "trace")]
    sink: Option<Box<dyn TraceSink + Send>>,
}

impl core::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: Box<dyn TraceSink + Send>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {}
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Removes and returns the sink.
    #[inline]
    pub fn take(&mut self) -> Option<Box<dyn TraceSink + Send>> {
        #[cfg(feature = "trace")]
        {
            self.sink.take()
        }
        #[cfg(not(feature = "trace"))]
        {
            None
        }
    }

    /// Emits a [`TransformComputedEvent`].
    #[inline]
    pub fn transform_computed(&mut self, e: &TransformComputedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transform_computed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransformSetEvent`].
    #[inline]
    pub fn transform_set(&mut self, e: &TransformSetEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transform_set(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DirtyPropagatedEvent`].
    #[inline]
    pub fn dirty_propagated(&mut self, e: &DirtyPropagatedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dirty_propagated(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ChildrenCacheRebuiltEvent`].
    #[inline]
    pub fn children_cache_rebuilt(&mut self, e: &ChildrenCacheRebuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_children_cache_rebuilt(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StorageCompactedEvent`].
    #[inline]
    pub fn storage_compacted(&mut self, e: &StorageCompactedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_storage_compacted(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ParentSwitchedEvent`].
    #[inline]
    pub fn parent_switched(&mut self, e: &ParentSwitchedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_parent_switched(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an undo [`StackStepEvent`].
    #[inline]
    pub fn undo(&mut self, e: &StackStepEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_undo(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a redo [`StackStepEvent`].
    #[inline]
    pub fn redo(&mut self, e: &StackStepEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_redo(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits the dirtied element list (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn elements_dirtied(&mut self, source: ElementIndex, dirtied: &[u32]) {
        if let Some(s) = &mut self.sink {
            s.on_elements_dirtied(source, dirtied);
        }
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Default)]
    struct Collect {
        computed: Vec<TransformType>,
    }

    impl TraceSink for Collect {
        fn on_transform_computed(&mut self, e: &TransformComputedEvent) {
            self.computed.push(e.transform_type);
        }
    }

    #[test]
    fn tracer_dispatches_to_sink() {
        let mut tracer = Tracer::new(Box::new(Collect::default()));
        assert!(tracer.is_enabled());
        tracer.transform_computed(&TransformComputedEvent {
            element: ElementIndex {
                idx: 0,
                generation: 0,
            },
            kind: ElementType::Bone,
            storage: StorageKind::Pose,
            transform_type: TransformType::CurrentGlobal,
        });
        assert!(tracer.take().is_some());
        assert!(!tracer.is_enabled());
    }

    #[test]
    fn none_tracer_is_disabled() {
        let mut tracer = Tracer::none();
        assert!(!tracer.is_enabled());
        tracer.undo(&StackStepEvent {
            index: 0,
            entry_type: StackEntryType::TransformPose,
            transform_type: TransformType::CurrentLocal,
        });
    }
}
