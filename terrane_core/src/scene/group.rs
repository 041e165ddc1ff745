// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render groups: subtree aggregation for isolated transform handling.
//!
//! A render group owns its root node's subtree (down to any nested group
//! roots) and carries the subtree's world transform as a single value.
//! Moving the root therefore moves the whole subtree without re-deriving any
//! member's relative state: the backend applies the new group transform and
//! is done.
//!
//! Groups form a sparse tree mirroring the node tree: a group's parent is
//! the nearest render-group ancestor. Structural changes below a group's
//! boundary set its `structure_did_change` flag so the backend rebuilds that
//! group's draw instructions; changes absorbed by a nested root do not
//! propagate past the boundary.

use alloc::vec::Vec;

use kurbo::Affine;

use crate::visual::{ChangeFlags, Tint};

use super::id::{INVALID, NodeId, RenderableId};
use super::store::NodeStore;

/// Aggregation state for one render-group root.
#[derive(Debug)]
pub(crate) struct RenderGroup {
    /// Slot index of the owning root node.
    pub(crate) root: u32,
    /// World transform of the whole group; already encodes the root's own
    /// placement relative to the enclosing group.
    pub(crate) world_transform: Affine,
    /// Combined color/alpha at the group boundary.
    pub(crate) world_tint: Tint,
    /// Nearest render-group ancestor, `INVALID` for a top-level group.
    pub(crate) group_parent: u32,
    /// Directly nested render groups.
    pub(crate) group_children: Vec<u32>,
    /// Whether the group's draw instructions need rebuilding.
    pub(crate) structure_did_change: bool,
    /// Backend renderable standing in for the root when the root itself is
    /// rendered as content.
    pub(crate) proxy_renderable: Option<RenderableId>,
    /// Changed members awaiting update, bucketed by relative depth so
    /// parents are processed before children.
    pub(crate) update_buckets: Vec<Vec<u32>>,
    /// Members with pending view/content updates.
    pub(crate) view_updates: Vec<u32>,
    /// Monotonic pass counter for in-pass deduplication.
    pub(crate) update_tick: u64,
    /// False once the owning root has been destroyed and the slot recycled.
    pub(crate) alive: bool,
}

impl RenderGroup {
    fn new(root: u32) -> Self {
        Self {
            root,
            world_transform: Affine::IDENTITY,
            world_tint: Tint::WHITE,
            group_parent: INVALID,
            group_children: Vec::new(),
            structure_did_change: true,
            proxy_renderable: None,
            update_buckets: Vec::new(),
            view_updates: Vec::new(),
            update_tick: 0,
            alive: true,
        }
    }
}

impl NodeStore {
    /// Promotes a node to a render-group root.
    ///
    /// No-op if the node already owns a group. Otherwise the node's subtree
    /// leaves its previous owning group, a new group rooted at the node is
    /// created, nested groups rooted at strict descendants are re-homed
    /// under the new group, and the new group registers as a nested child of
    /// the previous one.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn enable_render_group(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        if self.is_group_root_idx(idx) {
            return;
        }

        let previous = self.group[idx as usize];
        if previous != INVALID {
            self.mark_structure_changed(previous);
            self.detach_subtree(idx);
        }

        let g = self.alloc_group(idx);
        self.group[idx as usize] = g;

        // Everything below the new root becomes a member; nested roots are
        // re-homed as child groups instead.
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.attach_subtree(g, child);
            child = self.next_sibling[child as usize];
        }

        if previous != INVALID {
            self.set_group_parent(g, previous);
            // The root's own placement still updates within the enclosing
            // group.
            self.did_change[idx as usize] = true;
            self.update_flags[idx as usize] = ChangeFlags::all();
            self.enqueue_update(previous, idx);
        }

        self.update_is_simple(idx);
    }

    /// Demotes a render-group root back to a plain node.
    ///
    /// # Panics
    ///
    /// Always; demotion is an unsupported operation.
    pub fn disable_render_group(&mut self, id: NodeId) {
        self.validate(id);
        panic!("demoting a render-group root is not supported");
    }

    /// Returns whether the node is the root of a render group.
    #[must_use]
    pub fn is_render_group_root(&self, id: NodeId) -> bool {
        self.validate(id);
        self.is_group_root_idx(id.idx)
    }

    /// Returns the slot index of the group this node owns (as a root) or
    /// belongs to (as a member), if any.
    #[must_use]
    pub fn render_group(&self, id: NodeId) -> Option<u32> {
        self.validate(id);
        let g = self.group[id.idx as usize];
        if g == INVALID { None } else { Some(g) }
    }

    /// Returns the node's depth counted from its owning render-group root.
    /// For a root, the depth within the enclosing group.
    ///
    /// Consistent with the path length at the time membership was last
    /// recomputed.
    #[must_use]
    pub fn relative_render_group_depth(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.relative_depth[id.idx as usize]
    }

    /// Returns the world transform of render group `g`.
    ///
    /// # Panics
    ///
    /// Panics if `g` does not refer to a live group.
    #[must_use]
    pub fn group_world_transform(&self, g: u32) -> Affine {
        self.validate_group(g);
        self.groups[g as usize].world_transform
    }

    /// Returns the packed combined color/alpha of render group `g`.
    ///
    /// # Panics
    ///
    /// Panics if `g` does not refer to a live group.
    #[must_use]
    pub fn group_world_color_alpha(&self, g: u32) -> u32 {
        self.validate_group(g);
        self.groups[g as usize].world_tint.packed()
    }

    /// Returns the root node of render group `g`.
    ///
    /// # Panics
    ///
    /// Panics if `g` does not refer to a live group.
    #[must_use]
    pub fn group_root(&self, g: u32) -> NodeId {
        self.validate_group(g);
        self.node_id(self.groups[g as usize].root)
    }

    /// Returns the nearest render-group ancestor of group `g`, if any.
    ///
    /// # Panics
    ///
    /// Panics if `g` does not refer to a live group.
    #[must_use]
    pub fn group_parent(&self, g: u32) -> Option<u32> {
        self.validate_group(g);
        let parent = self.groups[g as usize].group_parent;
        if parent == INVALID { None } else { Some(parent) }
    }

    /// Returns whether group `g` has pending structural changes (not yet
    /// consumed by an update pass).
    ///
    /// # Panics
    ///
    /// Panics if `g` does not refer to a live group.
    #[must_use]
    pub fn group_structure_did_change(&self, g: u32) -> bool {
        self.validate_group(g);
        self.groups[g as usize].structure_did_change
    }

    /// Sets the proxy renderable used when the group's root is itself
    /// rendered as content.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a render-group root.
    pub fn set_proxy_renderable(&mut self, root: NodeId, proxy: Option<RenderableId>) {
        self.validate(root);
        assert!(
            self.is_group_root_idx(root.idx),
            "node is not a render-group root"
        );
        let g = self.group[root.idx as usize];
        self.groups[g as usize].proxy_renderable = proxy;
    }

    /// Returns the proxy renderable of the group rooted at `root`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a render-group root.
    #[must_use]
    pub fn proxy_renderable(&self, root: NodeId) -> Option<RenderableId> {
        self.validate(root);
        assert!(
            self.is_group_root_idx(root.idx),
            "node is not a render-group root"
        );
        let g = self.group[root.idx as usize];
        self.groups[g as usize].proxy_renderable
    }

    // -- Internal membership management --

    /// Makes the subtree rooted at `idx` a member of group `g`.
    ///
    /// Nested render-group roots are re-homed as child groups of `g` with
    /// their members left untouched; their relative state does not depend on
    /// where the enclosing group sits.
    pub(crate) fn attach_subtree(&mut self, g: u32, idx: u32) {
        let p = self.parent[idx as usize];
        let depth = if self.is_group_root_idx(p) {
            1
        } else {
            self.relative_depth[p as usize] + 1
        };
        self.relative_depth[idx as usize] = depth;

        if self.is_group_root_idx(idx) {
            let nested = self.group[idx as usize];
            self.set_group_parent(nested, g);
            self.did_change[idx as usize] = true;
            self.update_flags[idx as usize] = ChangeFlags::all();
            self.enqueue_update(g, idx);
            return;
        }

        self.group[idx as usize] = g;
        self.update_tick[idx as usize] = 0;
        self.did_change[idx as usize] = true;
        self.update_flags[idx as usize] = ChangeFlags::all();
        self.enqueue_update(g, idx);
        if self.did_view_update[idx as usize] {
            self.groups[g as usize].view_updates.push(idx);
        }

        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.attach_subtree(g, child);
            child = self.next_sibling[child as usize];
        }
    }

    /// Removes the subtree rooted at `idx` from its owning group.
    ///
    /// A nested render group leaves as a unit and becomes top-level until
    /// re-attached.
    pub(crate) fn detach_subtree(&mut self, idx: u32) {
        if self.is_group_root_idx(idx) {
            let nested = self.group[idx as usize];
            self.set_group_parent(nested, INVALID);
            return;
        }

        self.group[idx as usize] = INVALID;
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.detach_subtree(child);
            child = self.next_sibling[child as usize];
        }
    }

    /// Enqueues `idx` into `g`'s per-depth update bucket.
    pub(crate) fn enqueue_update(&mut self, g: u32, idx: u32) {
        let depth = self.relative_depth[idx as usize] as usize;
        let buckets = &mut self.groups[g as usize].update_buckets;
        if buckets.len() <= depth {
            buckets.resize_with(depth + 1, Vec::new);
        }
        buckets[depth].push(idx);
    }

    /// Re-parents group `g` under `parent`, maintaining both child lists.
    /// `INVALID` detaches the group to top level.
    pub(crate) fn set_group_parent(&mut self, g: u32, parent: u32) {
        let old = self.groups[g as usize].group_parent;
        if old == parent {
            return;
        }
        if old != INVALID {
            let children = &mut self.groups[old as usize].group_children;
            if let Some(pos) = children.iter().position(|&x| x == g) {
                children.remove(pos);
            }
        }
        self.groups[g as usize].group_parent = parent;
        if parent != INVALID {
            self.groups[parent as usize].group_children.push(g);
        }
    }

    fn alloc_group(&mut self, root: u32) -> u32 {
        if let Some(g) = self.group_free_list.pop() {
            self.groups[g as usize] = RenderGroup::new(root);
            g
        } else {
            self.groups.push(RenderGroup::new(root));
            (self.groups.len() - 1) as u32
        }
    }

    /// Releases a group slot after its root was destroyed. Nested groups
    /// are orphaned to top level.
    pub(crate) fn free_group(&mut self, g: u32) {
        let parent = self.groups[g as usize].group_parent;
        if parent != INVALID {
            self.set_group_parent(g, INVALID);
            self.mark_structure_changed(parent);
        }
        let children = core::mem::take(&mut self.groups[g as usize].group_children);
        for nested in children {
            self.groups[nested as usize].group_parent = INVALID;
        }
        self.groups[g as usize].alive = false;
        self.group_free_list.push(g);
    }

    fn validate_group(&self, g: u32) {
        assert!(
            (g as usize) < self.groups.len() && self.groups[g as usize].alive,
            "no live render group at slot {g}"
        );
    }
}
