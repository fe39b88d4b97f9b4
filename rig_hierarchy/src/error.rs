// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable hierarchy errors.

use core::fmt;

use crate::element::{ElementIndex, ElementKey};

/// Failure of a structural edit or a space switch.
///
/// When an operation returns an error the hierarchy is left unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// An element with this key already exists.
    DuplicateKey(ElementKey),
    /// The child handle does not refer to a live element.
    ChildNotFound(ElementIndex),
    /// The parent handle does not refer to a live element.
    ParentNotFound(ElementIndex),
    /// The parent is not among the child's parents.
    NotAParent {
        /// The child.
        child: ElementKey,
        /// The element that is not its parent.
        parent: ElementKey,
    },
    /// Parenting `child` under `parent` would create a cycle.
    WouldCycle {
        /// The child being reparented.
        child: ElementKey,
        /// The prospective parent.
        parent: ElementKey,
    },
    /// The operation needs a multi-parent element (null, control, reference).
    NotMultiParent(ElementKey),
    /// The element has no transform and cannot take part in parenting.
    NoTransform(ElementKey),
    /// Animation channels follow their parent and cannot switch spaces.
    AnimationChannel(ElementKey),
    /// Physics elements are disabled by the hierarchy configuration.
    PhysicsDisabled,
}

impl fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey(key) => write!(f, "Element '{key}' already exists."),
            Self::ChildNotFound(index) => write!(f, "Child Element {index:?} cannot be found."),
            Self::ParentNotFound(index) => {
                write!(f, "Parent Element {index:?} cannot be found.")
            }
            Self::NotAParent { child, parent } => {
                write!(f, "'{parent}' is not a parent of '{child}'.")
            }
            Self::WouldCycle { child, parent } => {
                write!(
                    f,
                    "Cannot switch '{child}' to '{parent}' - would cause a cycle."
                )
            }
            Self::NotMultiParent(key) => {
                write!(f, "Element '{key}' does not support multiple parents.")
            }
            Self::NoTransform(key) => write!(f, "Element '{key}' has no transform."),
            Self::AnimationChannel(key) => {
                write!(f, "Element '{key}' is an animation channel and cannot switch parents.")
            }
            Self::PhysicsDisabled => write!(f, "Physics elements are disabled."),
        }
    }
}

impl core::error::Error for HierarchyError {}
