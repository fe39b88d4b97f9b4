// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-tracking channel constants.
//!
//! The transform cache itself lives in the hierarchy's storage pool as one
//! dirty bit per cached transform. Separately, every hierarchy records *which
//! elements changed* since the consumer last asked, using multi-channel
//! dirty tracking (via [`understory_dirty`]). Each channel represents an
//! independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`POSE`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to every parent. Writing an element's transform marks every
//!   dependent too, because their global transforms follow.
//!
//! - **Local-only**: [`OFFSET`], [`SHAPE`], and [`CURVE`] are marked with the
//!   default policy. Only the written element appears in the drain output.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on add/remove and on parent
//!   changes. It does not propagate.
//!
//! # Consumption
//!
//! [`Hierarchy::take_changes`](crate::hierarchy::Hierarchy::take_changes)
//! drains every channel and surfaces the results as
//! [`HierarchyChanges`](crate::hierarchy::HierarchyChanges).

use understory_dirty::Channel;

/// Pose transform changed. Propagates to dependents.
pub const POSE: Channel = Channel::new(0);

/// Control offset transform changed.
pub const OFFSET: Channel = Channel::new(1);

/// Control shape transform changed.
pub const SHAPE: Channel = Channel::new(2);

/// Curve value changed.
pub const CURVE: Channel = Channel::new(3);

/// Parent links changed, or the element was added or removed.
pub const TOPOLOGY: Channel = Channel::new(4);
