// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable and JSON-lines trace output for `rig_hierarchy`
//! diagnostics.
//!
//! This crate provides [`TraceSink`](rig_hierarchy::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: one human-readable line per event.
//! - [`json::JsonLinesSink`]: one JSON object per line, for tooling.
//!
//! Install either with
//! [`Hierarchy::set_trace_sink`](rig_hierarchy::hierarchy::Hierarchy::set_trace_sink).

pub mod json;
pub mod pretty;
