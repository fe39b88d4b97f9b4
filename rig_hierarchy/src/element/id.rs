// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identity types.

use alloc::string::String;
use core::fmt;

use super::kind::ElementType;

/// Sentinel value indicating "no element" in raw index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to an element in a [`Hierarchy`](crate::hierarchy::Hierarchy).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an element is removed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementIndex {
    /// Slot index into the hierarchy's arrays.
    pub(crate) idx: u32,
    /// Generation counter, must match the hierarchy's generation for this slot.
    pub(crate) generation: u32,
}

impl ElementIndex {
    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementIndex({}@gen{})", self.idx, self.generation)
    }
}

/// The unique name of an element: its type plus a name.
///
/// Two elements of different types may share a name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey {
    kind: ElementType,
    name: String,
}

impl ElementKey {
    /// Creates a key.
    #[must_use]
    pub fn new(kind: ElementType, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// The element type.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ElementType {
        self.kind
    }

    /// The element name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.name)
    }
}
