// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable flat storage for transforms and dirty flags.
//!
//! Every transform an element owns lives in a [`StoragePool`] rather than in
//! the element itself. Elements hold [`SlotIndex`] handles into the pool.
//! Each handle carries a generation, so a handle that outlives its slot (after
//! [`deallocate`](StoragePool::deallocate), [`shrink`](StoragePool::shrink),
//! or [`reorder`](StoragePool::reorder)) fails loudly instead of silently
//! reading another element's data.
//!
//! Compaction returns a [`RelinkMap`]; the owner must rewrite every handle it
//! holds through the map before touching the pool again.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Index, IndexMut, Range};

use crate::element::TransformType;
use crate::math::Transform;

/// A generational handle into a [`StoragePool`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SlotIndex {
    /// Raw position in the pool.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotIndex({}@gen{})", self.idx, self.generation)
    }
}

/// Old-to-new handle mapping produced by compaction.
#[derive(Clone, Debug, Default)]
pub struct RelinkMap {
    map: Vec<Option<SlotIndex>>,
    stale_generation: Vec<u32>,
}

impl RelinkMap {
    /// Translates a pre-compaction handle.
    ///
    /// # Panics
    ///
    /// Panics if `old` was not live when the map was built.
    #[must_use]
    pub fn relink(&self, old: SlotIndex) -> SlotIndex {
        let i = old.idx as usize;
        assert!(
            i < self.map.len() && self.stale_generation[i] == old.generation,
            "stale SlotIndex: {old:?}"
        );
        match self.map[i] {
            Some(new) => new,
            None => panic!("stale SlotIndex: {old:?} was not live"),
        }
    }

    /// Number of live slots that were moved or kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.iter().filter(|m| m.is_some()).count()
    }

    /// Returns `true` if no slot was live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A flat array of `T` with a free list and per-slot generations.
#[derive(Clone, Debug, Default)]
pub struct StoragePool<T> {
    values: Vec<T>,
    generation: Vec<u32>,
    live: Vec<bool>,
    free_list: Vec<u32>,
}

impl<T: Clone> StoragePool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Number of slots, live or free.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the pool has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of free slots awaiting reuse.
    #[inline]
    #[must_use]
    pub fn num_free(&self) -> usize {
        self.free_list.len()
    }

    /// Returns whether `slot` refers to a live value.
    #[must_use]
    pub fn is_valid(&self, slot: SlotIndex) -> bool {
        let i = slot.idx as usize;
        i < self.values.len() && self.live[i] && self.generation[i] == slot.generation
    }

    /// Allocates `count` slots initialized to `default`, reusing freed slots
    /// first.
    pub fn allocate(&mut self, count: usize, default: T) -> Vec<SlotIndex> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let idx = if let Some(idx) = self.free_list.pop() {
                self.values[idx as usize] = default.clone();
                self.live[idx as usize] = true;
                idx
            } else {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "pool sizes are bounded by u32 handles"
                )]
                let idx = self.values.len() as u32;
                self.values.push(default.clone());
                self.generation.push(0);
                self.live.push(true);
                idx
            };
            out.push(SlotIndex {
                idx,
                generation: self.generation[idx as usize],
            });
        }
        out
    }

    /// Returns slots to the free list.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn deallocate(&mut self, slots: &[SlotIndex]) {
        for &slot in slots {
            self.validate(slot);
            let i = slot.idx as usize;
            self.live[i] = false;
            self.generation[i] += 1;
            self.free_list.push(slot.idx);
        }
    }

    /// Removes every free slot, packing live values to the front in their
    /// current order.
    pub fn shrink(&mut self) -> RelinkMap {
        let order: Vec<SlotIndex> = (0..self.values.len())
            .filter(|&i| self.live[i])
            .map(|i| SlotIndex {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "pool sizes are bounded by u32 handles"
                )]
                idx: i as u32,
                generation: self.generation[i],
            })
            .collect();
        self.reorder(&order)
    }

    /// Rebuilds the pool so that `order[i]` ends up at position `i`.
    ///
    /// Every live slot must appear exactly once. Every surviving slot gets a
    /// new generation, so all pre-reorder handles become stale.
    ///
    /// # Panics
    ///
    /// Panics if `order` contains a stale handle, a duplicate, or misses a
    /// live slot.
    pub fn reorder(&mut self, order: &[SlotIndex]) -> RelinkMap {
        let old_len = self.values.len();
        let live_count = self.live.iter().filter(|l| **l).count();
        assert_eq!(
            order.len(),
            live_count,
            "reorder must list every live slot exactly once"
        );

        let mut map = vec![None; old_len];
        let stale_generation = self.generation.clone();
        let mut values = Vec::with_capacity(order.len());
        let mut generation = Vec::with_capacity(order.len());

        for (new_idx, &old) in order.iter().enumerate() {
            self.validate(old);
            let i = old.idx as usize;
            assert!(map[i].is_none(), "duplicate slot in reorder: {old:?}");
            let new_generation = self
                .generation
                .get(new_idx)
                .map_or(0, |g| g + 1)
                .max(old.generation + 1);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "pool sizes are bounded by u32 handles"
            )]
            let new = SlotIndex {
                idx: new_idx as u32,
                generation: new_generation,
            };
            map[i] = Some(new);
            values.push(self.values[i].clone());
            generation.push(new_generation);
        }

        self.live = vec![true; values.len()];
        self.values = values;
        self.generation = generation;
        self.free_list.clear();

        RelinkMap {
            map,
            stale_generation,
        }
    }

    /// Returns the value at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: SlotIndex) -> &T {
        self.validate(slot);
        &self.values[slot.idx as usize]
    }

    /// Returns the value at `slot` mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[inline]
    pub fn get_mut(&mut self, slot: SlotIndex) -> &mut T {
        self.validate(slot);
        &mut self.values[slot.idx as usize]
    }

    /// Raw view of the packed values (including free slots).
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Panics if the handle is stale.
    fn validate(&self, slot: SlotIndex) {
        let i = slot.idx as usize;
        assert!(
            i < self.values.len() && self.live[i] && self.generation[i] == slot.generation,
            "stale SlotIndex: {slot:?} (current gen: {})",
            if i < self.values.len() {
                self.generation[i]
            } else {
                u32::MAX
            }
        );
    }
}

impl<T: Clone> Index<SlotIndex> for StoragePool<T> {
    type Output = T;

    #[inline]
    fn index(&self, slot: SlotIndex) -> &T {
        self.get(slot)
    }
}

impl<T: Clone> IndexMut<SlotIndex> for StoragePool<T> {
    #[inline]
    fn index_mut(&mut self, slot: SlotIndex) -> &mut T {
        self.get_mut(slot)
    }
}

/// Which of an element's transform sets a slot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKind {
    /// The element's own local/global transforms.
    Pose,
    /// A control's offset transforms.
    Offset,
    /// A control's shape transforms.
    Shape,
}

impl StorageKind {
    /// Every kind, in sort order.
    pub const ALL: [Self; 3] = [Self::Pose, Self::Offset, Self::Shape];
}

/// Contiguous slot ranges produced by
/// [`Hierarchy::sort_storage`](crate::hierarchy::Hierarchy::sort_storage).
///
/// After sorting, the transforms of one `(StorageKind, TransformType)` pair
/// occupy one run of the transform pool, ordered by element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageLayout {
    pub(crate) ranges: Vec<(StorageKind, TransformType, Range<u32>)>,
}

impl StorageLayout {
    /// The slot range of one transform type, if any element has it.
    #[must_use]
    pub fn range(&self, kind: StorageKind, ty: TransformType) -> Option<Range<u32>> {
        self.ranges
            .iter()
            .find(|(k, t, _)| *k == kind && *t == ty)
            .map(|(_, _, r)| r.clone())
    }

    /// Every non-empty range, in pool order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (StorageKind, TransformType, Range<u32>)> + '_ {
        self.ranges.iter().cloned()
    }
}

/// The two pools every hierarchy owns: transform values and dirty flags.
#[derive(Clone, Debug, Default)]
pub struct TransformStorage {
    /// Transform values.
    pub transforms: StoragePool<Transform>,
    /// Dirty flags, parallel in meaning (not position) to `transforms`.
    pub dirty: StoragePool<bool>,
}
