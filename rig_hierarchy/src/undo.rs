// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform undo/redo stack.
//!
//! Every recorded write pushes a [`StackEntry`] holding the old and new value.
//! Inside an interaction bracket, consecutive writes to the same element with
//! the same entry type coalesce into one entry that keeps the first old value
//! and the latest new value. Any push clears the redo stack.

use alloc::vec::Vec;

use crate::element::{ElementKey, TransformType};
use crate::math::{Transform, Vec3};

/// What a [`StackEntry`] restores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StackEntryType {
    /// An element's pose transform.
    TransformPose,
    /// A control's offset transform.
    ControlOffset,
    /// A control's shape transform.
    ControlShape,
    /// A curve value, stored in the translation (see [`StackEntry::curve`]).
    CurveValue,
}

/// One undoable write.
#[derive(Clone, Debug, PartialEq)]
pub struct StackEntry {
    /// The written element.
    pub key: ElementKey,
    /// What was written.
    pub entry_type: StackEntryType,
    /// Which slot was written.
    pub transform_type: TransformType,
    /// Value before the write.
    pub old: Transform,
    /// Value after the write.
    pub new: Transform,
    /// Whether dependents followed the write.
    pub affect_children: bool,
}

impl StackEntry {
    /// Creates a curve entry. The value is stored as translation
    /// `(value, is_set, 0)`.
    #[must_use]
    pub fn curve(key: ElementKey, old: (f32, bool), new: (f32, bool)) -> Self {
        Self {
            key,
            entry_type: StackEntryType::CurveValue,
            transform_type: TransformType::CurrentLocal,
            old: encode_curve(old),
            new: encode_curve(new),
            affect_children: false,
        }
    }

    /// Decodes the curve value and set flag for an undo (`true`) or redo.
    #[must_use]
    pub fn curve_value(&self, undo: bool) -> (f32, bool) {
        let t = if undo { &self.old } else { &self.new };
        #[expect(
            clippy::cast_possible_truncation,
            reason = "curve values are stored from f32"
        )]
        let value = t.translation.x as f32;
        (value, t.translation.y != 0.0)
    }
}

fn encode_curve((value, is_set): (f32, bool)) -> Transform {
    Transform::from_translation(Vec3::new(
        f64::from(value),
        if is_set { 1.0 } else { 0.0 },
        0.0,
    ))
}

/// Undo and redo stacks with interaction coalescing.
#[derive(Clone, Debug, Default)]
pub struct TransformStack {
    undo: Vec<StackEntry>,
    redo: Vec<StackEntry>,
    index: usize,
    interacting: bool,
    last_interacted: Option<ElementKey>,
}

impl TransformStack {
    /// Creates empty stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a write, coalescing inside an interaction bracket.
    pub fn push(&mut self, entry: StackEntry) {
        self.redo.clear();
        if self.interacting {
            let key = entry.key.clone();
            let merge = self.last_interacted.as_ref() == Some(&entry.key)
                && self.undo.last().is_some_and(|last| {
                    last.key == entry.key
                        && last.entry_type == entry.entry_type
                        && last.affect_children == entry.affect_children
                });
            match self.undo.last_mut() {
                Some(last) if merge => {
                    last.transform_type = entry.transform_type;
                    last.new = entry.new;
                }
                _ => self.undo.push(entry),
            }
            self.last_interacted = Some(key);
        } else {
            self.undo.push(entry);
        }
        self.index = self.undo.len();
    }

    /// Moves the newest undo entry to the redo stack and returns it.
    pub fn pop_undo(&mut self) -> Option<StackEntry> {
        let entry = self.undo.pop()?;
        self.redo.push(entry.clone());
        self.index = self.undo.len();
        Some(entry)
    }

    /// Moves the newest redo entry back to the undo stack and returns it.
    pub fn pop_redo(&mut self) -> Option<StackEntry> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        self.index = self.undo.len();
        Some(entry)
    }

    /// Number of undoable entries.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether an undo step is available.
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Whether a redo step is available.
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of redoable entries.
    #[inline]
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[StackEntry] {
        &self.undo
    }

    /// Opens an interaction bracket. Returns `false` if one is already open.
    pub fn begin_interaction(&mut self) -> bool {
        if self.interacting {
            return false;
        }
        self.interacting = true;
        self.last_interacted = None;
        true
    }

    /// Closes the interaction bracket. Returns `false` if none was open.
    pub fn end_interaction(&mut self) -> bool {
        if !self.interacting {
            return false;
        }
        self.interacting = false;
        self.last_interacted = None;
        true
    }

    /// Whether an interaction bracket is open.
    #[inline]
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.index = 0;
        self.last_interacted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;

    fn entry(name: &str, x: f64) -> StackEntry {
        StackEntry {
            key: ElementKey::new(ElementType::Bone, name),
            entry_type: StackEntryType::TransformPose,
            transform_type: TransformType::CurrentLocal,
            old: Transform::from_translation(Vec3::new(x - 1.0, 0.0, 0.0)),
            new: Transform::from_translation(Vec3::new(x, 0.0, 0.0)),
            affect_children: true,
        }
    }

    #[test]
    fn pushes_outside_interaction_do_not_merge() {
        let mut stack = TransformStack::new();
        stack.push(entry("a", 1.0));
        stack.push(entry("a", 2.0));
        assert_eq!(stack.index(), 2);
    }

    #[test]
    fn interaction_coalesces_same_key() {
        let mut stack = TransformStack::new();
        assert!(stack.begin_interaction());
        stack.push(entry("a", 1.0));
        stack.push(entry("a", 2.0));
        stack.push(entry("a", 3.0));
        assert!(stack.end_interaction());
        assert_eq!(stack.index(), 1);
        let merged = &stack.entries()[0];
        assert_eq!(merged.old.translation.x, 0.0);
        assert_eq!(merged.new.translation.x, 3.0);
    }

    #[test]
    fn interaction_splits_on_other_key() {
        let mut stack = TransformStack::new();
        stack.begin_interaction();
        stack.push(entry("a", 1.0));
        stack.push(entry("b", 1.0));
        stack.push(entry("a", 2.0));
        assert_eq!(stack.index(), 3);
    }

    #[test]
    fn push_clears_redo() {
        let mut stack = TransformStack::new();
        stack.push(entry("a", 1.0));
        stack.pop_undo();
        assert!(stack.can_redo());
        stack.push(entry("b", 1.0));
        assert!(!stack.can_redo());
    }

    #[test]
    fn curve_entries_round_trip() {
        let e = StackEntry::curve(
            ElementKey::new(ElementType::Curve, "c"),
            (0.0, false),
            (2.5, true),
        );
        assert_eq!(e.curve_value(true), (0.0, false));
        assert_eq!(e.curve_value(false), (2.5, true));
    }
}
