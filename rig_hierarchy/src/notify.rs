// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural notifications and mutation listeners.
//!
//! A [`Hierarchy`](crate::hierarchy::Hierarchy) reports two kinds of events:
//!
//! - [`Notification`]s are queued on every structural or settings change and
//!   drained by the consumer with
//!   [`take_notifications`](crate::hierarchy::Hierarchy::take_notifications).
//!   The hierarchy never interprets them.
//! - [`MutationEvent`]s are pushed synchronously to every registered
//!   [`HierarchyListener`] when a transform, curve or weight is written, so a
//!   listening hierarchy can mirror the edit. Propagation is not re-entrant:
//!   mutations applied while a hierarchy is already propagating are not
//!   forwarded again.

use alloc::vec::Vec;

use crate::element::{ElementKey, ElementWeight, TransformType};
use crate::math::Transform;
use crate::undo::StackEntry;

/// A queued structural event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// An element was added.
    ElementAdded(ElementKey),
    /// An element was removed.
    ElementRemoved(ElementKey),
    /// An element gained or lost a parent.
    ParentChanged(ElementKey),
    /// An element's parent weights changed.
    ParentWeightsChanged(ElementKey),
    /// Every element was removed.
    HierarchyReset,
    /// A control's settings changed.
    ControlSettingChanged(ElementKey),
    /// A control's local shape transform changed.
    ControlShapeTransformChanged(ElementKey),
    /// An interaction bracket was opened.
    InteractionBracketOpened,
    /// An interaction bracket was closed.
    InteractionBracketClosed,
}

/// A value write forwarded to listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationEvent {
    /// A pose transform was written.
    TransformSet {
        /// Written element.
        key: ElementKey,
        /// New value.
        value: Transform,
        /// Written slot.
        transform_type: TransformType,
        /// Whether dependents followed the write.
        affect_children: bool,
        /// Whether the write skipped the unchanged-value check.
        force: bool,
    },
    /// A control offset transform was written.
    ControlOffsetSet {
        /// Written control.
        key: ElementKey,
        /// New value.
        value: Transform,
        /// Written slot.
        transform_type: TransformType,
        /// Whether dependents followed the write.
        affect_children: bool,
        /// Whether the write skipped the unchanged-value check.
        force: bool,
    },
    /// A control shape transform was written.
    ControlShapeSet {
        /// Written control.
        key: ElementKey,
        /// New value.
        value: Transform,
        /// Written slot.
        transform_type: TransformType,
        /// Whether the write skipped the unchanged-value check.
        force: bool,
    },
    /// A curve value was written.
    CurveSet {
        /// Written curve.
        key: ElementKey,
        /// New value.
        value: f32,
        /// Whether the write skipped the unchanged-value check.
        force: bool,
    },
    /// A curve value was unset.
    CurveUnset {
        /// The curve.
        key: ElementKey,
    },
    /// Parent weights of a multi-parent element were replaced.
    ParentWeightsSet {
        /// The child.
        key: ElementKey,
        /// One weight per parent constraint, in constraint order.
        weights: Vec<ElementWeight>,
        /// Initial or current weights.
        initial: bool,
        /// Whether dependents followed the change.
        affect_children: bool,
    },
    /// An undo step restored an entry's old value.
    TransformUndone(StackEntry),
    /// A redo step restored an entry's new value.
    TransformRedone(StackEntry),
}

impl MutationEvent {
    /// The element the event concerns.
    #[must_use]
    pub fn key(&self) -> &ElementKey {
        match self {
            Self::TransformSet { key, .. }
            | Self::ControlOffsetSet { key, .. }
            | Self::ControlShapeSet { key, .. }
            | Self::CurveSet { key, .. }
            | Self::CurveUnset { key }
            | Self::ParentWeightsSet { key, .. } => key,
            Self::TransformUndone(entry) | Self::TransformRedone(entry) => &entry.key,
        }
    }

    /// The transform slot the event concerns, if any.
    ///
    /// Weight changes report the local slot of the affected pose.
    #[must_use]
    pub fn transform_type(&self) -> Option<TransformType> {
        match self {
            Self::TransformSet { transform_type, .. }
            | Self::ControlOffsetSet { transform_type, .. }
            | Self::ControlShapeSet { transform_type, .. } => Some(*transform_type),
            Self::ParentWeightsSet { initial, .. } => {
                Some(TransformType::from_flags(*initial, true))
            }
            Self::TransformUndone(entry) | Self::TransformRedone(entry) => {
                Some(entry.transform_type)
            }
            Self::CurveSet { .. } | Self::CurveUnset { .. } => None,
        }
    }
}

/// Observer of value writes on a hierarchy.
///
/// Listeners are owned by the hierarchy they observe. To mirror edits into
/// another hierarchy, register a
/// [`SharedHierarchy`](crate::shared::SharedHierarchy) handle (requires the
/// `std` feature) or forward events to
/// [`Hierarchy::apply_mutation`](crate::hierarchy::Hierarchy::apply_mutation)
/// yourself.
pub trait HierarchyListener {
    /// Called after a write took effect.
    fn on_mutation(&mut self, event: &MutationEvent);

    /// Whether writes to `transform_type` are forwarded. Curve events are
    /// always forwarded.
    fn reacts_to(&self, transform_type: TransformType) -> bool {
        _ = transform_type;
        true
    }
}
