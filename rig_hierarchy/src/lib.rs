// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazily cached transform hierarchy for character rigs.
//!
//! `rig_hierarchy` evaluates a graph of transform-bearing elements (bones,
//! nulls, controls, physics proxies, references, connectors, sockets) plus
//! scalar curves. It is `no_std` compatible (with `alloc`) and stores
//! elements struct-of-arrays, addressed by generational handles.
//!
//! # Architecture
//!
//! Every transform element caches four values (initial/current, local/global),
//! each with a dirty bit. Reads compute on demand; writes store one space and
//! dirty the other:
//!
//! ```text
//!   set_transform(e, local)
//!       │
//!       ├──► propagate_dirty_flags ──► dependents: pull one space, dirty the other
//!       │
//!       └──► store local, dirty global, bump pose version
//!
//!   transform(e, global)
//!       │ dirty?
//!       ▼
//!   solver::solve(constraints, offset, pose = local)
//!       │                  │
//!       │                  └──► transform(parent, global)  (recursive, cached)
//!       ▼
//!   cache, mark clean
//! ```
//!
//! **[`hierarchy`]**: The [`Hierarchy`](hierarchy::Hierarchy) itself: element
//! store, topology queries, the dirty-flag cache engine, parent weights and
//! space switching, poses, undo/redo and change draining.
//!
//! **[`solver`]**: Weighted multi-parent solve and its exact inverse.
//!
//! **[`storage`]**: Generational, compactable pools backing every cached
//! transform and dirty flag.
//!
//! **[`element`]**: Element types, keys, handles, weights and control
//! settings.
//!
//! **[`dirty`]**: Change-tracking channels via `understory_dirty`.
//!
//! **[`notify`]**: Queued [`Notification`](notify::Notification)s and
//! [`HierarchyListener`](notify::HierarchyListener) observers.
//!
//! **[`pose`]** / **[`undo`]**: Pose snapshots and the transform stack.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! evaluation instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! **[`math`]**, **[`config`]**, **[`error`]**: Vector/quaternion/transform
//! types, tolerances, and the fallible-operation error type.
//!
//! `shared` (feature `std`): A mutex-guarded, clonable hierarchy handle that
//! can mirror another hierarchy's writes.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies and
//!   the `shared` module.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-element
//!   dirty propagation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod dirty;
pub mod element;
pub mod error;
pub mod hierarchy;
pub mod math;
pub mod notify;
pub mod pose;
#[cfg(feature = "std")]
pub mod shared;
pub mod solver;
pub mod storage;
pub mod trace;
pub mod undo;
