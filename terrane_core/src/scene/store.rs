// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation and property management.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Affine, Rect, Vec2};

use crate::hooks::SceneHooks;
use crate::transform::LocalTransform;
use crate::visual::{BlendMode, ChangeFlags, NodeFlags, Tint};

use super::group::RenderGroup;
use super::id::{INVALID, NodeId};
use super::options::{DestroyOptions, NodeOptions};
use super::traverse::Children;

/// Struct-of-arrays storage for all nodes and render groups of one scene.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// # Dirty tracking
///
/// Property setters mark the node through two independent one-shot latches
/// (`did_change` for transform-affecting state, `did_view_update` for
/// view/content state) and OR the matching [`ChangeFlags`] category bit.
/// A latched node notifies its owning render group once; further changes of
/// the same class are no-ops until [`update`](Self::update) clears the latch.
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers) --
    pub(crate) local: Vec<LocalTransform>,
    pub(crate) tint: Vec<Tint>,
    pub(crate) blend: Vec<BlendMode>,
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) z_index: Vec<i32>,
    pub(crate) has_effects: Vec<bool>,
    pub(crate) bounds_area: Vec<Option<Rect>>,

    // -- Computed properties (written by the update pass) --
    pub(crate) rg_transform: Vec<Affine>,
    pub(crate) rg_tint: Vec<Tint>,
    pub(crate) rg_blend: Vec<BlendMode>,
    pub(crate) rg_flags: Vec<NodeFlags>,

    // -- Change tracking --
    pub(crate) did_change: Vec<bool>,
    pub(crate) did_view_update: Vec<bool>,
    pub(crate) update_flags: Vec<ChangeFlags>,
    pub(crate) update_tick: Vec<u64>,

    // -- Render-group linkage --
    pub(crate) group: Vec<u32>,
    pub(crate) relative_depth: Vec<u32>,
    pub(crate) is_simple: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Render groups --
    pub(crate) groups: Vec<RenderGroup>,
    pub(crate) group_free_list: Vec<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    // -- Collaborator hooks --
    hooks: Option<Box<dyn SceneHooks>>,
}

impl core::fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeStore")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("groups", &self.groups.len())
            .finish_non_exhaustive()
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            local: Vec::new(),
            tint: Vec::new(),
            blend: Vec::new(),
            flags: Vec::new(),
            z_index: Vec::new(),
            has_effects: Vec::new(),
            bounds_area: Vec::new(),
            rg_transform: Vec::new(),
            rg_tint: Vec::new(),
            rg_blend: Vec::new(),
            rg_flags: Vec::new(),
            did_change: Vec::new(),
            did_view_update: Vec::new(),
            update_flags: Vec::new(),
            update_tick: Vec::new(),
            group: Vec::new(),
            relative_depth: Vec::new(),
            is_simple: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            groups: Vec::new(),
            group_free_list: Vec::new(),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            hooks: None,
        }
    }

    /// Installs the collaborator hook listener, replacing any previous one.
    pub fn set_hooks(&mut self, hooks: Box<dyn SceneHooks>) {
        self.hooks = Some(hooks);
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts with an identity transform, white tint, full opacity,
    /// visible and renderable, inherited blend mode, no parent, and no
    /// render group.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.local[idx as usize] = LocalTransform::IDENTITY;
            self.tint[idx as usize] = Tint::WHITE;
            self.blend[idx as usize] = BlendMode::Inherit;
            self.flags[idx as usize] = NodeFlags::default();
            self.z_index[idx as usize] = 0;
            self.has_effects[idx as usize] = false;
            self.bounds_area[idx as usize] = None;
            self.rg_transform[idx as usize] = Affine::IDENTITY;
            self.rg_tint[idx as usize] = Tint::WHITE;
            self.rg_blend[idx as usize] = BlendMode::SourceOver;
            self.rg_flags[idx as usize] = NodeFlags::default();
            self.did_change[idx as usize] = false;
            self.did_view_update[idx as usize] = false;
            self.update_flags[idx as usize] = ChangeFlags::empty();
            self.update_tick[idx as usize] = 0;
            self.group[idx as usize] = INVALID;
            self.relative_depth[idx as usize] = 0;
            self.is_simple[idx as usize] = true;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.local.push(LocalTransform::IDENTITY);
            self.tint.push(Tint::WHITE);
            self.blend.push(BlendMode::Inherit);
            self.flags.push(NodeFlags::default());
            self.z_index.push(0);
            self.has_effects.push(false);
            self.bounds_area.push(None);
            self.rg_transform.push(Affine::IDENTITY);
            self.rg_tint.push(Tint::WHITE);
            self.rg_blend.push(BlendMode::SourceOver);
            self.rg_flags.push(NodeFlags::default());
            self.did_change.push(false);
            self.did_view_update.push(false);
            self.update_flags.push(ChangeFlags::empty());
            self.update_tick.push(0);
            self.group.push(INVALID);
            self.relative_depth.push(0);
            self.is_simple.push(true);
            self.generation.push(0);
            idx
        };

        self.pending_added.push(idx);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Creates a node configured from `options`.
    ///
    /// Applies every property, promotes the node to a render-group root when
    /// requested, then performs the parent/children attachments in order.
    pub fn create_node_with(&mut self, options: &NodeOptions) -> NodeId {
        let id = self.create_node();
        let idx = id.idx as usize;

        self.local[idx].position = options.position;
        self.local[idx].scale = options.scale;
        self.local[idx].pivot = options.pivot;
        self.local[idx].set_skew(options.skew);
        self.local[idx].set_rotation(options.rotation);
        self.tint[idx] = Tint {
            rgb: options.tint,
            alpha: options.alpha,
        };
        self.blend[idx] = options.blend_mode;
        self.flags[idx] = NodeFlags {
            visible: options.visible,
            renderable: options.renderable,
        };
        self.z_index[idx] = options.z_index;
        self.bounds_area[idx] = options.bounds_area;

        // A fresh node has no cached state worth preserving.
        self.did_change[idx] = true;
        self.update_flags[idx] = ChangeFlags::all();

        if options.is_render_group {
            self.enable_render_group(id);
        }
        if let Some(parent) = options.parent {
            self.add_child(parent, id);
        }
        for &child in &options.children {
            self.add_child(id, child);
        }
        id
    }

    /// Destroys a node, freeing its slot for reuse. Idempotent: a handle
    /// that is already stale is a no-op.
    ///
    /// All children are removed (detached) first. When
    /// [`DestroyOptions::children`] is set, each former child is then
    /// destroyed recursively with the same options.
    pub fn destroy_node(&mut self, id: NodeId, options: impl Into<DestroyOptions>) {
        if !self.is_alive(id) {
            return;
        }
        let options = options.into();
        let idx = id.idx;

        // Sever the parent link with full remove semantics.
        if self.parent[idx as usize] != INVALID {
            let parent = self.node_id(self.parent[idx as usize]);
            self.remove_child(parent, id);
        }

        // Detach every child, preserving order for the optional cascade.
        let mut removed = Vec::new();
        while self.first_child[idx as usize] != INVALID {
            let child = self.node_id(self.first_child[idx as usize]);
            self.remove_child(id, child);
            removed.push(child);
        }

        // A render-group root takes its group down with it.
        if self.is_group_root_idx(idx) {
            self.free_group(self.group[idx as usize]);
            self.group[idx as usize] = INVALID;
        }

        self.fire_hooks(|h| h.node_destroyed(id));

        // Clear the latches so stale queue entries for this slot are inert.
        self.did_change[idx as usize] = false;
        self.did_view_update[idx as usize] = false;
        self.update_flags[idx as usize] = ChangeFlags::empty();

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        self.pending_removed.push(idx);

        if options.children {
            for child in removed {
                self.destroy_node(child, options);
            }
        }
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Tree queries --

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(self.node_id(p))
        }
    }

    /// Returns an iterator over the direct children of a node, in paint
    /// order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the root nodes (those with no parent).
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && !self.free_list.contains(&idx) {
                roots.push(self.node_id(idx));
            }
        }
        roots
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the position of a node.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.local[id.idx as usize].position
    }

    /// Returns the per-axis scale of a node.
    #[must_use]
    pub fn scale(&self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.local[id.idx as usize].scale
    }

    /// Returns the pivot of a node.
    #[must_use]
    pub fn pivot(&self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.local[id.idx as usize].pivot
    }

    /// Returns the skew of a node, in radians per axis.
    #[must_use]
    pub fn skew(&self, id: NodeId) -> Vec2 {
        self.validate(id);
        self.local[id.idx as usize].skew()
    }

    /// Returns the rotation of a node in radians.
    #[must_use]
    pub fn rotation(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.local[id.idx as usize].rotation()
    }

    /// Returns the rotation of a node in degrees.
    #[must_use]
    pub fn angle(&self, id: NodeId) -> f64 {
        self.validate(id);
        self.local[id.idx as usize].angle()
    }

    /// Returns the local `0xRRGGBB` tint of a node.
    #[must_use]
    pub fn tint(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.tint[id.idx as usize].rgb
    }

    /// Returns the local alpha of a node.
    #[must_use]
    pub fn alpha(&self, id: NodeId) -> f32 {
        self.validate(id);
        self.tint[id.idx as usize].alpha
    }

    /// Returns the local blend mode of a node.
    #[must_use]
    pub fn blend_mode(&self, id: NodeId) -> BlendMode {
        self.validate(id);
        self.blend[id.idx as usize]
    }

    /// Returns the local visibility bit of a node.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].visible
    }

    /// Returns the local renderable bit of a node.
    #[must_use]
    pub fn renderable(&self, id: NodeId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].renderable
    }

    /// Returns the sort key of a node. Sorting itself is performed by an
    /// external collaborator.
    #[must_use]
    pub fn z_index(&self, id: NodeId) -> i32 {
        self.validate(id);
        self.z_index[id.idx as usize]
    }

    /// Returns whether the node has visual effects attached.
    #[must_use]
    pub fn has_effects(&self, id: NodeId) -> bool {
        self.validate(id);
        self.has_effects[id.idx as usize]
    }

    /// Returns the bounds override of a node, if any.
    #[must_use]
    pub fn bounds_area(&self, id: NodeId) -> Option<Rect> {
        self.validate(id);
        self.bounds_area[id.idx as usize]
    }

    /// Returns whether the node is a fast-path candidate for the backend:
    /// not a render-group root and no effects attached.
    #[must_use]
    pub fn is_simple(&self, id: NodeId) -> bool {
        self.validate(id);
        self.is_simple[id.idx as usize]
    }

    /// Returns whether the node would be drawn: both local visibility bits
    /// set and combined alpha strictly positive.
    #[must_use]
    pub fn is_renderable(&self, id: NodeId) -> bool {
        self.validate(id);
        let idx = id.idx as usize;
        self.flags[idx].visible && self.flags[idx].renderable && self.rg_tint[idx].alpha > 0.0
    }

    /// Returns the local transform of a node, assembled from its decomposed
    /// fields. Always current, independent of the update pass.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.local[id.idx as usize].to_affine()
    }

    /// Returns the render-group-relative transform of a node: its local
    /// transform composed with ancestors up to (not including) the owning
    /// render group.
    ///
    /// Maintained by [`update`](Self::update); stale between a mutation and
    /// the next update.
    #[must_use]
    pub fn rg_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        self.rg_transform[id.idx as usize]
    }

    /// Returns the world transform of a node.
    ///
    /// For a render-group root this is the group's world transform verbatim
    /// (the group's transform already encodes the root's own placement).
    /// For a member it composes the relative transform with the group's
    /// world transform. Only meaningful for nodes reachable from a
    /// render-group root; for detached nodes the relative transform is
    /// returned as-is.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.validate(id);
        let idx = id.idx as usize;
        let g = self.group[idx];
        if g == INVALID {
            return self.rg_transform[idx];
        }
        let group = &self.groups[g as usize];
        if group.root == id.idx {
            group.world_transform
        } else {
            group.world_transform * self.rg_transform[idx]
        }
    }

    /// Returns the combined `0xRRGGBB` color of a node.
    #[must_use]
    pub fn rg_color(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.rg_tint[id.idx as usize].rgb
    }

    /// Returns the combined alpha of a node.
    #[must_use]
    pub fn rg_alpha(&self, id: NodeId) -> f32 {
        self.validate(id);
        self.rg_tint[id.idx as usize].alpha
    }

    /// Returns the combined color and alpha packed in reversed byte order,
    /// ready for backend consumption.
    #[must_use]
    pub fn rg_color_alpha(&self, id: NodeId) -> u32 {
        self.validate(id);
        self.rg_tint[id.idx as usize].packed()
    }

    /// Returns the resolved blend mode of a node (never
    /// [`BlendMode::Inherit`]).
    #[must_use]
    pub fn rg_blend_mode(&self, id: NodeId) -> BlendMode {
        self.validate(id);
        self.rg_blend[id.idx as usize]
    }

    /// Returns the ancestor-combined visibility bits of a node.
    #[must_use]
    pub fn rg_flags(&self, id: NodeId) -> NodeFlags {
        self.validate(id);
        self.rg_flags[id.idx as usize]
    }

    /// Returns whether the transform-affecting change latch is set.
    #[must_use]
    pub fn did_change(&self, id: NodeId) -> bool {
        self.validate(id);
        self.did_change[id.idx as usize]
    }

    /// Returns whether the view-update latch is set.
    #[must_use]
    pub fn did_view_update(&self, id: NodeId) -> bool {
        self.validate(id);
        self.did_view_update[id.idx as usize]
    }

    /// Returns the accumulated change-category flags of a node.
    #[must_use]
    pub fn change_flags(&self, id: NodeId) -> ChangeFlags {
        self.validate(id);
        self.update_flags[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the position of a node.
    pub fn set_position(&mut self, id: NodeId, position: Vec2) {
        self.validate(id);
        self.local[id.idx as usize].position = position;
        self.touch_transform(id.idx);
    }

    /// Sets the per-axis scale of a node.
    pub fn set_scale(&mut self, id: NodeId, scale: Vec2) {
        self.validate(id);
        self.local[id.idx as usize].scale = scale;
        self.touch_transform(id.idx);
    }

    /// Sets the pivot of a node.
    pub fn set_pivot(&mut self, id: NodeId, pivot: Vec2) {
        self.validate(id);
        self.local[id.idx as usize].pivot = pivot;
        self.touch_transform(id.idx);
    }

    /// Sets the skew of a node, in radians per axis.
    ///
    /// The rotation/skew basis scalars are refreshed immediately, before the
    /// change latch is consulted.
    pub fn set_skew(&mut self, id: NodeId, skew: Vec2) {
        self.validate(id);
        self.local[id.idx as usize].set_skew(skew);
        self.touch_transform(id.idx);
    }

    /// Sets the rotation of a node in radians.
    pub fn set_rotation(&mut self, id: NodeId, radians: f64) {
        self.validate(id);
        self.local[id.idx as usize].set_rotation(radians);
        self.touch_transform(id.idx);
    }

    /// Sets the rotation of a node in degrees. Mutates the same underlying
    /// value as [`set_rotation`](Self::set_rotation).
    pub fn set_angle(&mut self, id: NodeId, degrees: f64) {
        self.validate(id);
        self.local[id.idx as usize].set_angle(degrees);
        self.touch_transform(id.idx);
    }

    /// Sets the local alpha of a node.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f32) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.tint[idx].alpha == alpha {
            return;
        }
        self.tint[idx].alpha = alpha;
        self.update_flags[idx] |= ChangeFlags::COLOR;
        self.mark_changed(id.idx);
    }

    /// Sets the local `0xRRGGBB` tint of a node.
    pub fn set_tint(&mut self, id: NodeId, rgb: u32) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.tint[idx].rgb == rgb {
            return;
        }
        self.tint[idx].rgb = rgb;
        self.update_flags[idx] |= ChangeFlags::COLOR;
        self.mark_changed(id.idx);
    }

    /// Sets the local blend mode of a node.
    ///
    /// Blend composition affects the owning group's draw instructions, so
    /// this also marks the group's structural flag.
    pub fn set_blend_mode(&mut self, id: NodeId, mode: BlendMode) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.blend[idx] == mode {
            return;
        }
        self.blend[idx] = mode;
        self.update_flags[idx] |= ChangeFlags::BLEND;
        let g = self.member_group(id.idx);
        self.mark_structure_changed(g);
        self.mark_changed(id.idx);
    }

    /// Sets the visibility bit of a node.
    ///
    /// While false, the update pass skips the node's subtree entirely.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.flags[idx].visible == visible {
            return;
        }
        self.flags[idx].visible = visible;
        self.update_flags[idx] |= ChangeFlags::VISIBLE;
        let g = self.member_group(id.idx);
        self.mark_structure_changed(g);
        self.mark_changed(id.idx);
    }

    /// Sets the renderable bit of a node. Suspends drawing only; transforms
    /// for the subtree keep updating.
    pub fn set_renderable(&mut self, id: NodeId, renderable: bool) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.flags[idx].renderable == renderable {
            return;
        }
        self.flags[idx].renderable = renderable;
        self.update_flags[idx] |= ChangeFlags::VISIBLE;
        self.mark_changed(id.idx);
    }

    /// Sets the sort key of a node, notifying the external sorter via the
    /// `depth_modified` hook on the parent.
    pub fn set_z_index(&mut self, id: NodeId, z_index: i32) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.z_index[idx] == z_index {
            return;
        }
        self.z_index[idx] = z_index;
        let p = self.parent[idx];
        if p != INVALID {
            let g = self.member_group(p);
            self.mark_structure_changed(g);
            let parent = self.node_id(p);
            self.fire_hooks(|h| h.depth_modified(parent));
        }
    }

    /// Sets whether the node has visual effects attached, refreshing the
    /// fast-path hint.
    pub fn set_has_effects(&mut self, id: NodeId, has_effects: bool) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.has_effects[idx] == has_effects {
            return;
        }
        self.has_effects[idx] = has_effects;
        self.update_is_simple(id.idx);
        let g = self.member_group(id.idx);
        self.mark_structure_changed(g);
    }

    /// Sets the bounds override consumed by the measurement collaborator.
    pub fn set_bounds_area(&mut self, id: NodeId, bounds: Option<Rect>) {
        self.validate(id);
        self.bounds_area[id.idx as usize] = bounds;
    }

    /// Marks the node's view/content as changed.
    ///
    /// Called by view collaborators when drawable content mutates. Coalesced
    /// by the independent `did_view_update` latch; routes to the node's own
    /// render group (content changes never cross a group boundary upward).
    pub fn mark_view_updated(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx as usize;
        if self.did_view_update[idx] {
            return;
        }
        self.did_view_update[idx] = true;
        let g = self.group[idx];
        if g != INVALID {
            self.groups[g as usize].view_updates.push(id.idx);
        }
    }

    // -- Raw-index accessors for backends --
    //
    // These accept raw slot indices (as found in `FrameChanges`) rather than
    // `NodeId` handles, skipping generation validation. Only use with
    // indices that came from `FrameChanges`.

    /// Returns the render-group-relative transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn rg_transform_at(&self, idx: u32) -> Affine {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.rg_transform[idx as usize]
    }

    /// Returns the world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Affine {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_transform(self.node_id(idx))
    }

    /// Returns the packed combined color/alpha at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn rg_color_alpha_at(&self, idx: u32) -> u32 {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.rg_tint[idx as usize].packed()
    }

    /// Returns the resolved blend mode at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn rg_blend_mode_at(&self, idx: u32) -> BlendMode {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.rg_blend[idx as usize]
    }

    /// Returns the combined visibility bits at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn rg_flags_at(&self, idx: u32) -> NodeFlags {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.rg_flags[idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a handle for a live slot.
    pub(crate) fn node_id(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Whether the node at `idx` is the root of its render group.
    pub(crate) fn is_group_root_idx(&self, idx: u32) -> bool {
        let g = self.group[idx as usize];
        g != INVALID && self.groups[g as usize].root == idx
    }

    /// The group that treats this node as an ordinary member: its own group
    /// for a plain member, the enclosing group for a render-group root,
    /// `INVALID` when detached.
    pub(crate) fn member_group(&self, idx: u32) -> u32 {
        let g = self.group[idx as usize];
        if g == INVALID {
            INVALID
        } else if self.groups[g as usize].root == idx {
            self.groups[g as usize].group_parent
        } else {
            g
        }
    }

    /// Sets a group's structural flag, tolerating `INVALID`.
    pub(crate) fn mark_structure_changed(&mut self, g: u32) {
        if g != INVALID {
            self.groups[g as usize].structure_did_change = true;
        }
    }

    /// Refreshes the backend fast-path hint for a node.
    pub(crate) fn update_is_simple(&mut self, idx: u32) {
        self.is_simple[idx as usize] = !self.is_group_root_idx(idx) && !self.has_effects[idx as usize];
    }

    /// Transform-affecting mutation entry point: records the category and
    /// runs the dirty-propagation protocol.
    fn touch_transform(&mut self, idx: u32) {
        self.update_flags[idx as usize] |= ChangeFlags::TRANSFORM;
        self.mark_changed(idx);
    }

    /// The dirty-propagation entry point.
    ///
    /// Coalesced by the `did_change` latch: at most one upward notification
    /// per node per update cycle. A render-group root hands the event to the
    /// enclosing group; a member notifies its owning group, which enqueues
    /// the node for the next update pass.
    pub(crate) fn mark_changed(&mut self, idx: u32) {
        if self.did_change[idx as usize] {
            return;
        }
        self.did_change[idx as usize] = true;
        let g = self.member_group(idx);
        if g != INVALID {
            self.enqueue_update(g, idx);
        }
    }

    /// Invokes the installed hook listener, if any.
    pub(crate) fn fire_hooks(&mut self, f: impl FnOnce(&mut dyn SceneHooks)) {
        if let Some(hooks) = self.hooks.as_deref_mut() {
            f(hooks);
        }
    }
}
