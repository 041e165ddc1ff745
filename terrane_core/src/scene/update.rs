// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The transform/visual update pass and its change report.
//!
//! [`NodeStore::update`] walks the render-group tree top-down once per
//! frame. For each group it:
//!
//! 1. Refreshes the group's world transform and boundary color from its
//!    root's relative state (for a top-level group, from the root's local
//!    state directly).
//! 2. Drains the group's per-depth update buckets in ascending depth order,
//!    so a parent's relative state is always fresh before a child combines
//!    with it. Each drained node has its `did_change` latch cleared, its
//!    relative transform recomputed as `parent_rg * local`, and — when
//!    category flags are set — its combined tint/blend/visibility refreshed.
//!    The recursion descends through the node's subtree, stops at nested
//!    render-group roots, and skips the subtree of a locally invisible node.
//! 3. Drains the view-update list and the structural flag.
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than
//! [`NodeId`](super::NodeId) handles so that backends can read the updated
//! values through the `*_at()` accessors (e.g.
//! [`rg_transform_at`](NodeStore::rg_transform_at)) without paying for
//! generation checks on every access.

use alloc::vec::Vec;

use crate::visual::{BlendMode, ChangeFlags, NodeFlags, Tint};

use super::id::INVALID;
use super::store::NodeStore;

/// The set of changes produced by a single [`NodeStore::update`] call.
///
/// Each field contains the raw slot indices of nodes that changed in the
/// corresponding category. Backends use these to apply incremental updates.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Nodes whose relative (and therefore world) transform was recomputed.
    pub transforms: Vec<u32>,
    /// Nodes whose combined color/alpha was recomputed.
    pub colors: Vec<u32>,
    /// Nodes whose resolved blend mode was recomputed.
    pub blends: Vec<u32>,
    /// Nodes whose combined visibility bits were recomputed.
    pub visibility: Vec<u32>,
    /// Nodes with pending view/content updates.
    pub view_updates: Vec<u32>,
    /// Render groups whose draw instructions need rebuilding.
    pub restructured_groups: Vec<u32>,
    /// Nodes created since the last update.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last update.
    pub removed: Vec<u32>,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.colors.clear();
        self.blends.clear();
        self.visibility.clear();
        self.view_updates.clear();
        self.restructured_groups.clear();
        self.added.clear();
        self.removed.clear();
    }
}

impl NodeStore {
    /// Updates every render group, recomputing dirty relative transforms and
    /// combined visual state, and returns the set of changes.
    pub fn update(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.update_into(&mut changes);
        changes
    }

    /// Like [`update`](Self::update), but reuses a caller-provided buffer to
    /// avoid allocation.
    pub fn update_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        let top_level: Vec<u32> = (0..self.groups.len() as u32)
            .filter(|&g| {
                self.groups[g as usize].alive && self.groups[g as usize].group_parent == INVALID
            })
            .collect();
        for g in top_level {
            self.update_group(g, changes);
        }

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    fn update_group(&mut self, g: u32, changes: &mut FrameChanges) {
        self.refresh_group_state(g, changes);

        self.groups[g as usize].update_tick += 1;
        let tick = self.groups[g as usize].update_tick;

        let mut depth = 0;
        while depth < self.groups[g as usize].update_buckets.len() {
            let bucket = core::mem::take(&mut self.groups[g as usize].update_buckets[depth]);
            for idx in bucket {
                // Skip entries stale since enqueueing: the node moved to
                // another group, changed depth, or was destroyed.
                if self.member_group(idx) != g
                    || self.relative_depth[idx as usize] as usize != depth
                {
                    continue;
                }
                self.update_transform_and_children(idx, tick, ChangeFlags::empty(), changes);
            }
            depth += 1;
        }

        // Drain the view/content channel, honoring the latch.
        let views = core::mem::take(&mut self.groups[g as usize].view_updates);
        for idx in views {
            if self.did_view_update[idx as usize] {
                self.did_view_update[idx as usize] = false;
                changes.view_updates.push(idx);
            }
        }

        if self.groups[g as usize].structure_did_change {
            self.groups[g as usize].structure_did_change = false;
            changes.restructured_groups.push(g);
        }

        let nested = self.groups[g as usize].group_children.clone();
        for child in nested {
            self.update_group(child, changes);
        }
    }

    /// Refreshes a group's world transform and boundary color.
    ///
    /// A nested group folds its root's relative state (maintained by the
    /// enclosing group's pass) into the enclosing group's world state. A
    /// top-level group has no enclosing pass, so the root's relative state
    /// is refreshed here from its local state.
    fn refresh_group_state(&mut self, g: u32, changes: &mut FrameChanges) {
        let root = self.groups[g as usize].root;
        let parent_group = self.groups[g as usize].group_parent;

        if parent_group == INVALID {
            if self.did_change[root as usize] || !self.update_flags[root as usize].is_empty() {
                self.did_change[root as usize] = false;
                let flags = core::mem::replace(
                    &mut self.update_flags[root as usize],
                    ChangeFlags::empty(),
                );
                self.rg_transform[root as usize] = self.local[root as usize].to_affine();
                changes.transforms.push(root);
                if flags.contains(ChangeFlags::COLOR) {
                    self.rg_tint[root as usize] = self.tint[root as usize];
                    changes.colors.push(root);
                }
                if flags.contains(ChangeFlags::BLEND) {
                    self.rg_blend[root as usize] =
                        self.blend[root as usize].resolve(BlendMode::SourceOver);
                    changes.blends.push(root);
                }
                if flags.contains(ChangeFlags::VISIBLE) {
                    self.rg_flags[root as usize] = self.flags[root as usize];
                    changes.visibility.push(root);
                }
            }
            self.groups[g as usize].world_transform = self.rg_transform[root as usize];
            self.groups[g as usize].world_tint = self.rg_tint[root as usize];
        } else {
            let parent_world = self.groups[parent_group as usize].world_transform;
            let parent_tint = self.groups[parent_group as usize].world_tint;
            self.groups[g as usize].world_transform =
                parent_world * self.rg_transform[root as usize];
            self.groups[g as usize].world_tint =
                self.rg_tint[root as usize].combine(parent_tint);
        }
    }

    /// Recomputes one node and recurses through its subtree.
    ///
    /// The tick guard makes re-entry from overlapping bucket entries a
    /// no-op. Category flags inherited from an ancestor force the same
    /// combination work on descendants even when their own flags are clear.
    fn update_transform_and_children(
        &mut self,
        idx: u32,
        tick: u64,
        inherited: ChangeFlags,
        changes: &mut FrameChanges,
    ) {
        if self.update_tick[idx as usize] == tick {
            return;
        }
        self.update_tick[idx as usize] = tick;
        self.did_change[idx as usize] = false;

        let local = self.local[idx as usize].to_affine();
        let flags = inherited
            | core::mem::replace(&mut self.update_flags[idx as usize], ChangeFlags::empty());

        let p = self.parent[idx as usize];
        if p != INVALID && !self.is_group_root_idx(p) {
            self.rg_transform[idx as usize] = self.rg_transform[p as usize] * local;
            if !flags.is_empty() {
                self.combine_visual(idx, Some(p), flags, changes);
            }
        } else {
            // Direct child of the group root (or the root of a nested group
            // seen from its enclosing group): relative state starts fresh.
            self.rg_transform[idx as usize] = local;
            if !flags.is_empty() {
                self.combine_visual(idx, None, flags, changes);
            }
        }
        changes.transforms.push(idx);

        // Stop at nested group boundaries; skip hidden subtrees.
        if !self.is_group_root_idx(idx) && self.flags[idx as usize].visible {
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                self.update_transform_and_children(child, tick, flags, changes);
                child = self.next_sibling[child as usize];
            }
        }
    }

    fn combine_visual(
        &mut self,
        idx: u32,
        parent: Option<u32>,
        flags: ChangeFlags,
        changes: &mut FrameChanges,
    ) {
        let (parent_tint, parent_blend, parent_flags) = match parent {
            Some(p) => (
                self.rg_tint[p as usize],
                self.rg_blend[p as usize],
                self.rg_flags[p as usize],
            ),
            None => (Tint::WHITE, BlendMode::SourceOver, NodeFlags::default()),
        };
        if flags.contains(ChangeFlags::COLOR) {
            self.rg_tint[idx as usize] = self.tint[idx as usize].combine(parent_tint);
            changes.colors.push(idx);
        }
        if flags.contains(ChangeFlags::BLEND) {
            self.rg_blend[idx as usize] = self.blend[idx as usize].resolve(parent_blend);
            changes.blends.push(idx);
        }
        if flags.contains(ChangeFlags::VISIBLE) {
            self.rg_flags[idx as usize] = self.flags[idx as usize].combine(parent_flags);
            changes.visibility.push(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Affine, Vec2};

    use crate::scene::NodeId;

    use super::*;

    /// Scene with a render-group root and two plain members:
    /// `root ─ a(10,0) ─ b(5,5)`.
    fn translated_pair() -> (NodeStore, NodeId, NodeId) {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(root, a);
        store.add_child(a, b);
        store.set_position(a, Vec2::new(10.0, 0.0));
        store.set_position(b, Vec2::new(5.0, 5.0));
        (store, a, b)
    }

    #[test]
    fn local_transforms_translate_independently() {
        let (store, a, b) = translated_pair();
        assert_eq!(store.local_transform(a), Affine::translate((10.0, 0.0)));
        assert_eq!(store.local_transform(b), Affine::translate((5.0, 5.0)));
    }

    #[test]
    fn world_placement_composes_down_the_chain() {
        let (mut store, a, b) = translated_pair();
        let _ = store.update();

        assert_eq!(store.world_transform(a), Affine::translate((10.0, 0.0)));
        assert_eq!(store.world_transform(b), Affine::translate((15.0, 5.0)));
    }

    #[test]
    fn root_world_transform_equals_group_world_transform() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        store.set_position(root, Vec2::new(7.0, 3.0));
        store.set_rotation(root, 0.4);
        let _ = store.update();

        let g = store.render_group(root).unwrap();
        assert_eq!(store.world_transform(root), store.group_world_transform(g));
    }

    #[test]
    fn second_update_reports_nothing() {
        let (mut store, _a, _b) = translated_pair();
        let _ = store.update();

        let changes = store.update();
        assert!(changes.transforms.is_empty());
        assert!(changes.colors.is_empty());
        assert!(changes.blends.is_empty());
        assert!(changes.visibility.is_empty());
        assert!(changes.view_updates.is_empty());
        assert!(changes.restructured_groups.is_empty());
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
    }

    #[test]
    fn update_clears_latch_and_category_flags() {
        let (mut store, a, _b) = translated_pair();
        assert!(store.did_change(a));
        let _ = store.update();
        assert!(!store.did_change(a));
        assert!(store.change_flags(a).is_empty());
    }

    #[test]
    fn no_duplicate_notification_per_cycle() {
        let (mut store, a, _b) = translated_pair();
        let _ = store.update();

        store.set_position(a, Vec2::new(1.0, 0.0));
        store.set_position(a, Vec2::new(2.0, 0.0));
        store.set_rotation(a, 0.3);

        let g = store.render_group(a).unwrap() as usize;
        let enqueued: usize = store.groups[g]
            .update_buckets
            .iter()
            .map(|bucket| bucket.iter().filter(|&&i| i == a.index()).count())
            .sum();
        assert_eq!(enqueued, 1, "latched node must notify its group once");
    }

    #[test]
    fn moving_the_group_root_leaves_members_untouched() {
        let (mut store, a, b) = translated_pair();
        let root = store.parent(a).unwrap();
        let _ = store.update();

        store.set_position(root, Vec2::new(100.0, 0.0));
        let changes = store.update();

        assert_eq!(changes.transforms, vec![root.index()]);
        // Members keep their relative state; only the group transform moved.
        assert_eq!(store.rg_transform(b), Affine::translate((15.0, 5.0)));
        assert_eq!(store.world_transform(b), Affine::translate((115.0, 5.0)));
    }

    #[test]
    fn nested_groups_compose_world_transforms() {
        let mut store = NodeStore::new();
        let outer = store.create_node();
        let inner = store.create_node();
        let leaf = store.create_node();
        store.add_child(outer, inner);
        store.add_child(inner, leaf);
        store.enable_render_group(outer);
        store.enable_render_group(inner);

        store.set_position(outer, Vec2::new(10.0, 0.0));
        store.set_position(inner, Vec2::new(5.0, 0.0));
        store.set_position(leaf, Vec2::new(1.0, 2.0));
        let _ = store.update();

        let inner_g = store.render_group(inner).unwrap();
        assert_eq!(
            store.group_world_transform(inner_g),
            Affine::translate((15.0, 0.0))
        );
        assert_eq!(store.world_transform(leaf), Affine::translate((16.0, 2.0)));
    }

    #[test]
    fn alpha_combines_within_a_group() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(root, a);
        store.add_child(a, b);

        store.set_alpha(a, 0.5);
        store.set_alpha(b, 0.8);
        let _ = store.update();

        let eps = 1e-6;
        assert!((store.rg_alpha(a) - 0.5).abs() < eps);
        assert!((store.rg_alpha(b) - 0.4).abs() < eps);
    }

    #[test]
    fn root_alpha_lives_in_the_group_boundary() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let child = store.create_node();
        store.add_child(root, child);

        store.set_alpha(root, 0.5);
        let _ = store.update();

        // The root's alpha is carried by the group's boundary color, not
        // re-multiplied into each member.
        let g = store.render_group(root).unwrap();
        assert_eq!(store.group_world_color_alpha(g) >> 24, 128);
        assert!((store.rg_alpha(child) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tint_combines_channel_wise() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(root, a);
        store.add_child(a, b);

        store.set_tint(a, 0x80_8080);
        store.set_tint(b, 0x80_4020);
        let _ = store.update();

        assert_eq!(store.rg_color(a), 0x80_8080);
        assert_eq!(store.rg_color(b), 0x40_2010);
    }

    #[test]
    fn blend_inherit_resolves_to_parent_mode() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();
        store.add_child(root, a);
        store.add_child(a, b);
        store.add_child(a, c);

        store.set_blend_mode(a, BlendMode::Multiply);
        store.set_blend_mode(c, BlendMode::Screen);
        let _ = store.update();

        assert_eq!(store.rg_blend_mode(a), BlendMode::Multiply);
        // `b` keeps the default Inherit and picks up the parent's mode.
        assert_eq!(store.rg_blend_mode(b), BlendMode::Multiply);
        assert_eq!(store.rg_blend_mode(c), BlendMode::Screen);
    }

    #[test]
    fn hiding_skips_the_subtree_and_unhiding_recombines_it() {
        let (mut store, a, b) = translated_pair();
        let _ = store.update();

        store.set_visible(a, false);
        let changes = store.update();
        assert!(changes.visibility.contains(&a.index()));
        assert!(
            !changes.transforms.contains(&b.index()),
            "hidden subtree must not be recomputed"
        );
        assert!(!store.rg_flags(a).visible);

        store.set_visible(a, true);
        let changes = store.update();
        assert!(changes.visibility.contains(&a.index()));
        assert!(changes.visibility.contains(&b.index()));
        assert!(store.rg_flags(b).visible);
    }

    #[test]
    fn renderable_suspends_drawing_only() {
        let (mut store, a, b) = translated_pair();
        let _ = store.update();

        store.set_renderable(a, false);
        let _ = store.update();
        store.set_position(b, Vec2::new(9.0, 9.0));
        let changes = store.update();

        assert!(
            changes.transforms.contains(&b.index()),
            "transforms still update below a non-renderable node"
        );
        assert!(!store.is_renderable(a));
    }

    #[test]
    fn view_updates_drain_through_the_own_group() {
        let mut store = NodeStore::new();
        let outer = store.create_node();
        let inner = store.create_node();
        store.add_child(outer, inner);
        store.enable_render_group(outer);
        store.enable_render_group(inner);
        let _ = store.update();

        // A root's content update routes to its own group, not the
        // enclosing one.
        store.mark_view_updated(inner);
        let inner_g = store.render_group(inner).unwrap() as usize;
        assert!(store.groups[inner_g].view_updates.contains(&inner.index()));

        let changes = store.update();
        assert_eq!(changes.view_updates, vec![inner.index()]);
        assert!(!store.did_view_update(inner));
    }

    #[test]
    fn reparenting_across_groups_recomputes_under_new_ancestry() {
        let mut store = NodeStore::new();
        let root_a = store.create_node();
        let root_b = store.create_node();
        store.enable_render_group(root_a);
        store.enable_render_group(root_b);
        store.set_position(root_a, Vec2::new(10.0, 0.0));
        store.set_position(root_b, Vec2::new(50.0, 0.0));
        let child = store.create_node();
        store.set_position(child, Vec2::new(1.0, 0.0));
        store.add_child(root_a, child);
        let _ = store.update();
        assert_eq!(store.world_transform(child), Affine::translate((11.0, 0.0)));

        store.add_child(root_b, child);
        let _ = store.update();
        assert_eq!(store.render_group(child), store.render_group(root_b));
        assert_eq!(store.world_transform(child), Affine::translate((51.0, 0.0)));
    }

    #[test]
    fn restructured_groups_are_reported_and_cleared() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let child = store.create_node();
        store.add_child(root, child);

        let g = store.render_group(root).unwrap();
        let changes = store.update();
        assert!(changes.restructured_groups.contains(&g));
        assert!(!store.group_structure_did_change(g));

        let changes = store.update();
        assert!(changes.restructured_groups.is_empty());
    }

    #[test]
    fn added_and_removed_lifecycle() {
        let mut store = NodeStore::new();
        let id = store.create_node();

        let changes = store.update();
        assert!(changes.added.contains(&id.index()));
        assert!(changes.removed.is_empty());

        let changes = store.update();
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());

        store.destroy_node(id, false);
        let changes = store.update();
        assert!(changes.removed.contains(&id.index()));
        assert!(changes.added.is_empty());
    }

    #[test]
    fn update_into_reuses_buffer() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(root, a);
        store.add_child(root, b);

        let mut changes = FrameChanges::default();
        store.update_into(&mut changes);
        assert_eq!(changes.added.len(), 3);

        store.set_alpha(a, 0.5);
        store.update_into(&mut changes);

        assert!(changes.added.is_empty(), "added should be cleared");
        assert!(changes.colors.contains(&a.index()));
        assert!(!changes.colors.contains(&b.index()));
    }

    #[test]
    fn raw_accessors_match_handle_getters() {
        let (mut store, a, b) = translated_pair();
        let _ = store.update();

        assert_eq!(store.rg_transform_at(b.index()), store.rg_transform(b));
        assert_eq!(store.world_transform_at(b.index()), store.world_transform(b));
        assert_eq!(store.rg_color_alpha_at(a.index()), store.rg_color_alpha(a));
        assert_eq!(store.rg_blend_mode_at(a.index()), store.rg_blend_mode(a));
        assert_eq!(store.rg_flags_at(a.index()), store.rg_flags(a));
    }
}
