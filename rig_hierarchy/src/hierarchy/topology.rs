// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parent/child queries, traversal, and dependency checks.
//!
//! Parent links live on the child. The reverse direction is served by a flat
//! children cache that is rebuilt lazily whenever the topology version moved
//! since the last build.

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use super::Hierarchy;
use crate::element::ElementIndex;
use crate::trace::ChildrenCacheRebuiltEvent;

/// Result of a traversal visitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// Visit this element's neighbors next.
    Continue,
    /// Do not descend past this element.
    SkipChildren,
    /// Abort the whole traversal.
    Stop,
}

/// Extra dependency edges beyond parent links, for example the data flow of
/// a rig program.
///
/// An edge `dependent -> dependency` states that `dependent` reads from
/// `dependency`.
#[derive(Clone, Debug, Default)]
pub struct DependencyMap {
    edges: HashMap<ElementIndex, Vec<ElementIndex>>,
}

impl DependencyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent` reads from `dependency`.
    pub fn add(&mut self, dependent: ElementIndex, dependency: ElementIndex) {
        let list = self.edges.entry(dependent).or_default();
        if !list.contains(&dependency) {
            list.push(dependency);
        }
    }

    /// Whether no edges were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn dependencies(&self, dependent: ElementIndex) -> &[ElementIndex] {
        self.edges.get(&dependent).map_or(&[], Vec::as_slice)
    }
}

/// Flattened children lists, indexed by slot.
#[derive(Clone, Debug, Default)]
pub(crate) struct ChildrenCache {
    version: Option<u32>,
    offsets: Vec<u32>,
    counts: Vec<u32>,
    flat: Vec<u32>,
}

impl ChildrenCache {
    fn children(&self, idx: u32) -> &[u32] {
        let Some(&start) = self.offsets.get(idx as usize) else {
            return &[];
        };
        let start = start as usize;
        let count = self.counts[idx as usize] as usize;
        &self.flat[start..start + count]
    }
}

/// An iterator over the direct children of an element.
///
/// Created by [`Hierarchy::children`].
#[derive(Debug)]
pub struct Children<'a> {
    generation: &'a [u32],
    inner: core::slice::Iter<'a, u32>,
}

impl Iterator for Children<'_> {
    type Item = ElementIndex;

    fn next(&mut self) -> Option<ElementIndex> {
        let &idx = self.inner.next()?;
        Some(ElementIndex {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl Hierarchy {
    // -- Parents --

    /// Direct parents in constraint order.
    #[must_use]
    pub fn parents(&self, index: ElementIndex) -> Vec<ElementIndex> {
        self.validate(index);
        self.parents[index.idx as usize].iter().collect()
    }

    /// The first parent, if any.
    #[must_use]
    pub fn first_parent(&self, index: ElementIndex) -> Option<ElementIndex> {
        self.validate(index);
        self.parents[index.idx as usize].iter().next()
    }

    /// Number of direct parents.
    #[must_use]
    pub fn num_parents(&self, index: ElementIndex) -> usize {
        self.validate(index);
        self.parents[index.idx as usize].len()
    }

    /// Every ancestor, nearest first, each listed once.
    #[must_use]
    pub fn parents_recursive(&self, index: ElementIndex) -> Vec<ElementIndex> {
        self.validate(index);
        let mut visited = vec![false; self.slot_count() as usize];
        let mut out = Vec::new();
        let mut queue: Vec<ElementIndex> = self.parents[index.idx as usize].iter().collect();
        let mut head = 0;
        while head < queue.len() {
            let p = queue[head];
            head += 1;
            if core::mem::replace(&mut visited[p.idx as usize], true) {
                continue;
            }
            out.push(p);
            queue.extend(self.parents[p.idx as usize].iter());
        }
        out
    }

    /// Whether `parent` is an ancestor of `child` through parent links.
    #[must_use]
    pub fn is_parented_to(&self, child: ElementIndex, parent: ElementIndex) -> bool {
        if !self.contains(child) || !self.contains(parent) || child == parent {
            return false;
        }
        let mut visited = vec![false; self.slot_count() as usize];
        let mut stack: Vec<u32> = self.parents[child.idx as usize]
            .iter()
            .map(|p| p.idx)
            .collect();
        while let Some(idx) = stack.pop() {
            if idx == parent.idx {
                return true;
            }
            if core::mem::replace(&mut visited[idx as usize], true) {
                continue;
            }
            stack.extend(self.parents[idx as usize].iter().map(|p| p.idx));
        }
        false
    }

    // -- Children --

    /// Direct children, in insertion order.
    pub fn children(&mut self, index: ElementIndex) -> Children<'_> {
        self.validate(index);
        self.ensure_children_cache();
        Children {
            generation: &self.generation,
            inner: self.children_cache.children(index.idx).iter(),
        }
    }

    /// Number of direct children.
    pub fn num_children(&mut self, index: ElementIndex) -> usize {
        self.children(index).len()
    }

    /// Every descendant in breadth-first order, each listed once.
    pub fn children_recursive(&mut self, index: ElementIndex) -> Vec<ElementIndex> {
        self.validate(index);
        self.ensure_children_cache();
        let mut visited = vec![false; self.slot_count() as usize];
        let mut queue: Vec<u32> = self.children_cache.children(index.idx).to_vec();
        let mut out = Vec::new();
        let mut head = 0;
        while head < queue.len() {
            let idx = queue[head];
            head += 1;
            if core::mem::replace(&mut visited[idx as usize], true) {
                continue;
            }
            out.push(self.handle(idx));
            queue.extend_from_slice(self.children_cache.children(idx));
        }
        out
    }

    /// Transform elements without parents, in insertion order.
    #[must_use]
    pub fn roots(&self) -> Vec<ElementIndex> {
        self.order
            .iter()
            .filter(|&&idx| {
                self.keys[idx as usize].kind().has_transform() && self.parents[idx as usize].len() == 0
            })
            .map(|&idx| self.handle(idx))
            .collect()
    }

    /// Position of the element among its first parent's children, or among
    /// the roots when it has no parent.
    pub fn local_index(&mut self, index: ElementIndex) -> Option<usize> {
        match self.first_parent(index) {
            Some(parent) => self.children(parent).position(|c| c == index),
            None => self.roots().iter().position(|&r| r == index),
        }
    }

    /// Rebuilds the children cache if the topology changed.
    pub(crate) fn ensure_children_cache(&mut self) {
        if self.children_cache.version == Some(self.topology_version) {
            return;
        }
        let n = self.slot_count() as usize;
        let mut counts = vec![0_u32; n];
        for &child in &self.order {
            for parent in self.parents[child as usize].iter() {
                counts[parent.idx as usize] += 1;
            }
        }
        let mut offsets = vec![0_u32; n];
        let mut total = 0_u32;
        for (offset, &count) in offsets.iter_mut().zip(&counts) {
            *offset = total;
            total += count;
        }
        let mut flat = vec![0_u32; total as usize];
        let mut fill = offsets.clone();
        for &child in &self.order {
            for parent in self.parents[child as usize].iter() {
                let slot = &mut fill[parent.idx as usize];
                flat[*slot as usize] = child;
                *slot += 1;
            }
        }

        #[expect(
            clippy::cast_possible_truncation,
            reason = "element counts are bounded by u32 handles"
        )]
        let elements = self.order.len() as u32;
        self.tracer
            .children_cache_rebuilt(&ChildrenCacheRebuiltEvent {
                topology_version: self.topology_version,
                elements,
                links: total,
            });

        self.children_cache = ChildrenCache {
            version: Some(self.topology_version),
            offsets,
            counts,
            flat,
        };
    }

    // -- Traversal --

    /// Depth-first pre-order walk from `root`, towards children or towards
    /// parents. Each element is visited at most once.
    pub fn traverse<F>(&mut self, root: ElementIndex, towards_children: bool, mut visit: F)
    where
        F: FnMut(&Self, ElementIndex) -> Traversal,
    {
        self.validate(root);
        self.ensure_children_cache();
        let mut visited = vec![false; self.slot_count() as usize];
        self.traverse_from(root.idx, towards_children, &mut visited, &mut visit);
    }

    /// Walks every root towards its children, in insertion order.
    pub fn traverse_all<F>(&mut self, mut visit: F)
    where
        F: FnMut(&Self, ElementIndex) -> Traversal,
    {
        self.ensure_children_cache();
        let mut visited = vec![false; self.slot_count() as usize];
        for root in self.roots() {
            if !self.traverse_from(root.idx, true, &mut visited, &mut visit) {
                return;
            }
        }
    }

    /// Returns `false` when the visitor stopped the walk.
    fn traverse_from<F>(
        &self,
        start: u32,
        towards_children: bool,
        visited: &mut [bool],
        visit: &mut F,
    ) -> bool
    where
        F: FnMut(&Self, ElementIndex) -> Traversal,
    {
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if core::mem::replace(&mut visited[idx as usize], true) {
                continue;
            }
            match visit(self, self.handle(idx)) {
                Traversal::Stop => return false,
                Traversal::SkipChildren => continue,
                Traversal::Continue => {}
            }
            // Push in reverse so the first neighbor is visited first.
            if towards_children {
                stack.extend(self.children_cache.children(idx).iter().rev());
            } else {
                let parents: Vec<u32> = self.parents[idx as usize].iter().map(|p| p.idx).collect();
                stack.extend(parents.into_iter().rev());
            }
        }
        true
    }

    // -- Dependencies --

    /// Whether `dependent` reads from `dependency`, through parent links and
    /// the optional extra edges in `map`.
    ///
    /// Results derived from parent links alone are memoized until the next
    /// topology change.
    pub fn is_dependent_on(
        &mut self,
        dependent: ElementIndex,
        dependency: ElementIndex,
        map: Option<&DependencyMap>,
    ) -> bool {
        if !self.contains(dependent) || !self.contains(dependency) {
            return false;
        }
        if dependent == dependency {
            return true;
        }
        if self.dependency_memo_version != Some(self.topology_version) {
            self.dependency_memo.clear();
            self.dependency_memo_version = Some(self.topology_version);
        }

        let memo_key = (dependent.idx, dependency.idx);
        match self.dependency_memo.get(&memo_key) {
            Some(true) => return true,
            Some(false) if map.is_none() => return false,
            _ => {}
        }

        let result = self.walk_dependencies(dependent, dependency, map);
        // Edges from the map are not part of the topology, so only results
        // that parent links alone produced are cached.
        if map.is_none() || (result && self.walk_dependencies(dependent, dependency, None)) {
            self.dependency_memo.insert(memo_key, result);
        }
        result
    }

    fn walk_dependencies(
        &self,
        dependent: ElementIndex,
        dependency: ElementIndex,
        map: Option<&DependencyMap>,
    ) -> bool {
        let mut visited = vec![false; self.slot_count() as usize];
        let mut stack = vec![dependent];
        while let Some(current) = stack.pop() {
            if current == dependency {
                return true;
            }
            if !self.contains(current)
                || core::mem::replace(&mut visited[current.idx as usize], true)
            {
                continue;
            }
            stack.extend(self.parents[current.idx as usize].iter());
            if let Some(map) = map {
                stack.extend_from_slice(map.dependencies(current));
            }
        }
        false
    }
}
