// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator hooks for structural and ordering changes.
//!
//! External collaborators (bounds measurement, hit testing, z-order sorting)
//! observe the tree through [`SceneHooks`]. The store calls these methods
//! synchronously, exactly when structural or ordering-relevant state changes
//! and never otherwise. All methods default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! Install an implementation with
//! [`NodeStore::set_hooks`](crate::scene::NodeStore::set_hooks).

use crate::scene::NodeId;

/// Receives structural notifications from a [`NodeStore`](crate::scene::NodeStore).
///
/// Listeners see events in the order they occurred; delivery is synchronous,
/// within the mutating call.
pub trait SceneHooks {
    /// Called after `child` was appended to `parent` at `index`.
    fn child_added(&mut self, parent: NodeId, child: NodeId, index: usize) {
        _ = (parent, child, index);
    }

    /// Called after `child` was removed from `parent`. `index` is the
    /// position the child occupied before removal.
    fn child_removed(&mut self, parent: NodeId, child: NodeId, index: usize) {
        _ = (parent, child, index);
    }

    /// Called when a node is destroyed, after it has been detached.
    fn node_destroyed(&mut self, node: NodeId) {
        _ = node;
    }

    /// Called when a child with a non-default sort key is added to `parent`,
    /// so the external sorter knows the order needs rebuilding.
    fn sort_dirty(&mut self, parent: NodeId) {
        _ = parent;
    }

    /// Called when the sort key of one of `parent`'s children changes.
    fn depth_modified(&mut self, parent: NodeId) {
        _ = parent;
    }
}

/// A [`SceneHooks`] implementation that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl SceneHooks for NoopHooks {}
