// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Storage compaction.

use alloc::vec::Vec;

use super::Hierarchy;
use crate::element::{PoseSlots, TransformType};
use crate::storage::{RelinkMap, SlotIndex, StorageKind, StorageLayout};
use crate::trace::StorageCompactedEvent;

impl Hierarchy {
    /// Drops the free slots left behind by removed elements.
    ///
    /// Cached values and dirty flags are preserved; element handles stay
    /// valid.
    pub fn shrink_storage(&mut self) {
        let before = self.storage.transforms.len();
        let transforms = self.storage.transforms.shrink();
        let dirty = self.storage.dirty.shrink();
        self.relink_all(&transforms, &dirty);
        self.trace_compaction(false, before);
    }

    /// Rewrites the pools so that each `(StorageKind, TransformType)` pair
    /// occupies one contiguous run, ordered by element.
    ///
    /// Free slots are dropped on the way.
    pub fn sort_storage(&mut self) -> StorageLayout {
        let before = self.storage.transforms.len();
        let mut transform_order = Vec::with_capacity(self.storage.transforms.len());
        let mut dirty_order = Vec::with_capacity(self.storage.dirty.len());
        let mut layout = StorageLayout::default();

        for kind in StorageKind::ALL {
            let sets: Vec<PoseSlots> = self
                .order
                .iter()
                .filter_map(|&idx| self.slot_set(idx, kind))
                .collect();
            if sets.is_empty() {
                continue;
            }
            for ty in TransformType::ALL {
                let start = run_start(&transform_order);
                transform_order.extend(sets.iter().map(|s| s.transform[ty.slot()]));
                dirty_order.extend(sets.iter().map(|s| s.dirty[ty.slot()]));
                layout
                    .ranges
                    .push((kind, ty, start..run_start(&transform_order)));
            }
        }

        let transforms = self.storage.transforms.reorder(&transform_order);
        let dirty = self.storage.dirty.reorder(&dirty_order);
        self.relink_all(&transforms, &dirty);
        self.trace_compaction(true, before);
        layout
    }

    fn slot_set(&self, idx: u32, kind: StorageKind) -> Option<PoseSlots> {
        let data = &self.data[idx as usize];
        match kind {
            StorageKind::Pose => data.pose().copied(),
            StorageKind::Offset => data.control().map(|c| c.offset),
            StorageKind::Shape => data.control().map(|c| c.shape),
        }
    }

    fn relink_all(&mut self, transforms: &RelinkMap, dirty: &RelinkMap) {
        for &idx in &self.order {
            self.data[idx as usize].relink(transforms, dirty);
        }
    }

    fn trace_compaction(&mut self, sorted: bool, before: usize) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "pool sizes are bounded by u32 handles"
        )]
        let (transforms_before, transforms_after) =
            (before as u32, self.storage.transforms.len() as u32);
        self.tracer.storage_compacted(&StorageCompactedEvent {
            sorted,
            transforms_before,
            transforms_after,
        });
    }
}

fn run_start(order: &[SlotIndex]) -> u32 {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "pool sizes are bounded by u32 handles"
    )]
    let len = order.len() as u32;
    len
}
