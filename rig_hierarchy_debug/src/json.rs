// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines trace output.
//!
//! [`JsonLinesSink`] writes each event as one JSON object on its own line.
//! Every object has an `"event"` field naming the event; elements are
//! `{"index": .., "generation": ..}` objects.

use std::io::{self, Write};

use serde_json::{Value, json};

use rig_hierarchy::element::ElementIndex;
use rig_hierarchy::trace::{
    ChildrenCacheRebuiltEvent, DirtyPropagatedEvent, ParentSwitchedEvent, StackStepEvent,
    StorageCompactedEvent, TraceSink, TransformComputedEvent, TransformSetEvent,
};

/// Writes one JSON object per trace event.
///
/// Write errors are counted rather than propagated, since trace callbacks
/// cannot fail.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    errors: u64,
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer, errors: 0 }
    }

    /// Number of events that failed to write.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Flushes and returns the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn emit(&mut self, value: &Value) {
        let written = serde_json::to_writer(&mut self.writer, value)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if written.is_err() {
            self.errors += 1;
        }
    }
}

fn element(index: ElementIndex) -> Value {
    json!({
        "index": index.index(),
        "generation": index.generation(),
    })
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_transform_computed(&mut self, e: &TransformComputedEvent) {
        self.emit(&json!({
            "event": "transform_computed",
            "element": element(e.element),
            "kind": format!("{:?}", e.kind),
            "storage": format!("{:?}", e.storage),
            "transform_type": format!("{:?}", e.transform_type),
        }));
    }

    fn on_transform_set(&mut self, e: &TransformSetEvent) {
        self.emit(&json!({
            "event": "transform_set",
            "element": element(e.element),
            "storage": format!("{:?}", e.storage),
            "transform_type": format!("{:?}", e.transform_type),
            "affect_children": e.affect_children,
        }));
    }

    fn on_dirty_propagated(&mut self, e: &DirtyPropagatedEvent) {
        self.emit(&json!({
            "event": "dirty_propagated",
            "element": element(e.element),
            "initial": e.initial,
            "affect_children": e.affect_children,
            "dirtied": e.dirtied,
        }));
    }

    fn on_children_cache_rebuilt(&mut self, e: &ChildrenCacheRebuiltEvent) {
        self.emit(&json!({
            "event": "children_cache_rebuilt",
            "topology_version": e.topology_version,
            "elements": e.elements,
            "links": e.links,
        }));
    }

    fn on_storage_compacted(&mut self, e: &StorageCompactedEvent) {
        self.emit(&json!({
            "event": "storage_compacted",
            "sorted": e.sorted,
            "transforms_before": e.transforms_before,
            "transforms_after": e.transforms_after,
        }));
    }

    fn on_parent_switched(&mut self, e: &ParentSwitchedEvent) {
        self.emit(&json!({
            "event": "parent_switched",
            "child": element(e.child),
            "parent": e.parent.map(element),
            "initial": e.initial,
        }));
    }

    fn on_undo(&mut self, e: &StackStepEvent) {
        self.emit(&stack_step("undo", e));
    }

    fn on_redo(&mut self, e: &StackStepEvent) {
        self.emit(&stack_step("redo", e));
    }

    fn on_elements_dirtied(&mut self, source: ElementIndex, dirtied: &[u32]) {
        self.emit(&json!({
            "event": "elements_dirtied",
            "source": element(source),
            "slots": dirtied,
        }));
    }
}

fn stack_step(name: &str, e: &StackStepEvent) -> Value {
    json!({
        "event": name,
        "index": e.index,
        "entry_type": format!("{:?}", e.entry_type),
        "transform_type": format!("{:?}", e.transform_type),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_hierarchy::hierarchy::Hierarchy;
    use rig_hierarchy::math::Transform;

    fn parse_lines(bytes: &[u8]) -> Vec<Value> {
        std::str::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn each_event_is_one_object() {
        let mut h = Hierarchy::new();
        let a = h.add_bone("a", None, Transform::IDENTITY, false).unwrap();
        let b = h.add_bone("b", Some(a), Transform::IDENTITY, false).unwrap();

        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_parent_switched(&ParentSwitchedEvent {
            child: b,
            parent: Some(a),
            initial: true,
        });
        sink.on_elements_dirtied(a, &[1, 2]);
        sink.on_storage_compacted(&StorageCompactedEvent {
            sorted: true,
            transforms_before: 12,
            transforms_after: 8,
        });
        assert_eq!(sink.errors(), 0);

        let events = parse_lines(&sink.finish().unwrap());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "parent_switched");
        assert_eq!(events[0]["child"]["index"], 1);
        assert_eq!(events[0]["parent"]["index"], 0);
        assert_eq!(events[1]["slots"], json!([1, 2]));
        assert_eq!(events[2]["transforms_after"], 8);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_counted() {
        let mut sink = JsonLinesSink::new(Broken);
        sink.on_children_cache_rebuilt(&ChildrenCacheRebuiltEvent {
            topology_version: 1,
            elements: 2,
            links: 1,
        });
        assert_eq!(sink.errors(), 1);
    }
}
