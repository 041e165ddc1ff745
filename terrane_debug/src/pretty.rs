// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable scene inspection.
//!
//! [`dump_tree`] writes one indented line per node to a
//! [`Write`](std::io::Write) destination, following paint order.
//! [`PrettyHookSink`] implements [`SceneHooks`] and writes one line per
//! structural event as it happens.

use std::io::Write;

use terrane_core::hooks::SceneHooks;
use terrane_core::scene::{NodeId, NodeStore};

/// Writes an indented dump of every tree in the store, roots first.
///
/// # Errors
///
/// Propagates I/O errors from the writer.
pub fn dump_tree<W: Write>(writer: &mut W, store: &NodeStore) -> std::io::Result<()> {
    for root in store.roots() {
        dump_node(writer, store, root, 0)?;
    }
    Ok(())
}

/// Renders the store into a `String`, for tests and log attachments.
///
/// # Panics
///
/// Panics if formatting fails, which writing to a `Vec` does not.
#[must_use]
pub fn dump_tree_to_string(store: &NodeStore) -> String {
    let mut out = Vec::new();
    dump_tree(&mut out, store).expect("writing to a Vec cannot fail");
    String::from_utf8(out).expect("dump output is valid UTF-8")
}

fn dump_node<W: Write>(
    writer: &mut W,
    store: &NodeStore,
    node: NodeId,
    depth: usize,
) -> std::io::Result<()> {
    let pos = store.position(node);
    let mut markers = String::new();
    if store.is_render_group_root(node) {
        markers.push_str(" [group]");
    }
    if !store.visible(node) {
        markers.push_str(" [hidden]");
    }
    if !store.renderable(node) {
        markers.push_str(" [non-renderable]");
    }
    if store.has_effects(node) {
        markers.push_str(" [effects]");
    }
    if store.z_index(node) != 0 {
        markers.push_str(&format!(" z={}", store.z_index(node)));
    }
    writeln!(
        writer,
        "{:indent$}#{} pos=({:.1},{:.1}) rot={:.2} alpha={:.2}{markers}",
        "",
        node.index(),
        pos.x,
        pos.y,
        store.rotation(node),
        store.alpha(node),
        indent = depth * 2,
    )?;
    for child in store.children(node) {
        dump_node(writer, store, child, depth + 1)?;
    }
    Ok(())
}

/// Writes one line per structural event to a [`Write`](std::io::Write)
/// destination (default: stderr).
pub struct PrettyHookSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyHookSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyHookSink").finish_non_exhaustive()
    }
}

impl PrettyHookSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }
}

impl<W: Write> PrettyHookSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> SceneHooks for PrettyHookSink<W> {
    fn child_added(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let _ = writeln!(
            self.writer,
            "[child:add] parent=#{} child=#{} index={index}",
            parent.index(),
            child.index(),
        );
    }

    fn child_removed(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let _ = writeln!(
            self.writer,
            "[child:remove] parent=#{} child=#{} index={index}",
            parent.index(),
            child.index(),
        );
    }

    fn node_destroyed(&mut self, node: NodeId) {
        let _ = writeln!(self.writer, "[destroy] node=#{}", node.index());
    }

    fn sort_dirty(&mut self, parent: NodeId) {
        let _ = writeln!(self.writer, "[sort:dirty] parent=#{}", parent.index());
    }

    fn depth_modified(&mut self, parent: NodeId) {
        let _ = writeln!(self.writer, "[sort:depth] parent=#{}", parent.index());
    }
}
