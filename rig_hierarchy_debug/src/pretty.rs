// Copyright 2026 the Rig Hierarchy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Elements are
//! printed as `#slot@generation`.

use std::io::Write;

use rig_hierarchy::element::{ElementIndex, TransformType};
use rig_hierarchy::storage::StorageKind;
use rig_hierarchy::trace::{
    ChildrenCacheRebuiltEvent, DirtyPropagatedEvent, ParentSwitchedEvent, StackStepEvent,
    StorageCompactedEvent, TraceSink, TransformComputedEvent, TransformSetEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
    lines: u64,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer, lines: 0 }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Number of lines written so far.
    #[must_use]
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if self.writer.write_fmt(args).is_ok() && self.writer.write_all(b"\n").is_ok() {
            self.lines += 1;
        }
    }
}

struct Element(ElementIndex);

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}@{}", self.0.index(), self.0.generation())
    }
}

fn transform_name(ty: TransformType) -> &'static str {
    match ty {
        TransformType::InitialLocal => "initial.local",
        TransformType::CurrentLocal => "local",
        TransformType::InitialGlobal => "initial.global",
        TransformType::CurrentGlobal => "global",
    }
}

fn storage_name(kind: StorageKind) -> &'static str {
    match kind {
        StorageKind::Pose => "pose",
        StorageKind::Offset => "offset",
        StorageKind::Shape => "shape",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_transform_computed(&mut self, e: &TransformComputedEvent) {
        self.line(format_args!(
            "[compute] {} {:?} {}.{}",
            Element(e.element),
            e.kind,
            storage_name(e.storage),
            transform_name(e.transform_type),
        ));
    }

    fn on_transform_set(&mut self, e: &TransformSetEvent) {
        self.line(format_args!(
            "[set] {} {}.{} children={}",
            Element(e.element),
            storage_name(e.storage),
            transform_name(e.transform_type),
            e.affect_children,
        ));
    }

    fn on_dirty_propagated(&mut self, e: &DirtyPropagatedEvent) {
        let space = if e.affect_children { "global" } else { "local" };
        self.line(format_args!(
            "[dirty] from {} initial={} dirtied={} ({space})",
            Element(e.element),
            e.initial,
            e.dirtied,
        ));
    }

    fn on_children_cache_rebuilt(&mut self, e: &ChildrenCacheRebuiltEvent) {
        self.line(format_args!(
            "[children] topology={} elements={} links={}",
            e.topology_version, e.elements, e.links,
        ));
    }

    fn on_storage_compacted(&mut self, e: &StorageCompactedEvent) {
        let op = if e.sorted { "sort" } else { "shrink" };
        self.line(format_args!(
            "[storage] {op} transforms {} -> {}",
            e.transforms_before, e.transforms_after,
        ));
    }

    fn on_parent_switched(&mut self, e: &ParentSwitchedEvent) {
        match e.parent {
            Some(parent) => self.line(format_args!(
                "[switch] {} -> {} initial={}",
                Element(e.child),
                Element(parent),
                e.initial,
            )),
            None => self.line(format_args!(
                "[switch] {} -> world initial={}",
                Element(e.child),
                e.initial,
            )),
        }
    }

    fn on_undo(&mut self, e: &StackStepEvent) {
        self.line(format_args!(
            "[undo] index={} {:?} {}",
            e.index,
            e.entry_type,
            transform_name(e.transform_type),
        ));
    }

    fn on_redo(&mut self, e: &StackStepEvent) {
        self.line(format_args!(
            "[redo] index={} {:?} {}",
            e.index,
            e.entry_type,
            transform_name(e.transform_type),
        ));
    }

    fn on_elements_dirtied(&mut self, source: ElementIndex, dirtied: &[u32]) {
        self.line(format_args!(
            "[dirty:elements] from {} slots={dirtied:?}",
            Element(source),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_hierarchy::element::ElementType;
    use rig_hierarchy::hierarchy::Hierarchy;
    use rig_hierarchy::math::Transform;
    use rig_hierarchy::undo::StackEntryType;

    fn bone() -> ElementIndex {
        let mut h = Hierarchy::new();
        h.add_bone("root", None, Transform::IDENTITY, false).unwrap()
    }

    #[test]
    fn pretty_print_compute() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_transform_computed(&TransformComputedEvent {
            element: bone(),
            kind: ElementType::Bone,
            storage: StorageKind::Pose,
            transform_type: TransformType::CurrentGlobal,
        });
        assert_eq!(sink.lines(), 1);
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("[compute]"), "got: {output}");
        assert!(output.contains("#0@0 Bone pose.global"), "got: {output}");
    }

    #[test]
    fn pretty_print_switch_and_undo() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let element = bone();
        sink.on_parent_switched(&ParentSwitchedEvent {
            child: element,
            parent: None,
            initial: false,
        });
        sink.on_undo(&StackStepEvent {
            index: 2,
            entry_type: StackEntryType::ControlOffset,
            transform_type: TransformType::CurrentLocal,
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "got: {output}");
        assert!(lines[0].contains("-> world"), "got: {output}");
        assert!(lines[1].starts_with("[undo] index=2 ControlOffset local"), "got: {output}");
    }
}
