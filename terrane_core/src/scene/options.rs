// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction and destruction option sets.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};

use crate::visual::BlendMode;

use super::id::NodeId;

/// Configuration for [`NodeStore::create_node_with`](super::NodeStore::create_node_with).
///
/// Every public node property can be set at construction time; unset fields
/// keep their documented defaults (identity transform, white tint, full
/// opacity, visible and renderable, inherited blend mode, no render group).
#[derive(Clone, Debug)]
pub struct NodeOptions {
    /// Initial position. Default `(0, 0)`.
    pub position: Vec2,
    /// Initial per-axis scale. Default `(1, 1)`.
    pub scale: Vec2,
    /// Initial pivot. Default `(0, 0)`.
    pub pivot: Vec2,
    /// Initial skew in radians per axis. Default `(0, 0)`.
    pub skew: Vec2,
    /// Initial rotation in radians. Default `0`.
    pub rotation: f64,
    /// Initial visibility bit. Default `true`.
    pub visible: bool,
    /// Initial renderable bit. Default `true`.
    pub renderable: bool,
    /// Initial alpha. Default `1.0`.
    pub alpha: f32,
    /// Initial `0xRRGGBB` tint. Default white (no tint).
    pub tint: u32,
    /// Initial blend mode. Default [`BlendMode::Inherit`].
    pub blend_mode: BlendMode,
    /// Initial sort key. Default `0`.
    pub z_index: i32,
    /// Bounds override handed through to the measurement collaborator.
    /// Default `None`.
    pub bounds_area: Option<Rect>,
    /// Create the node as a render-group root. Default `false`.
    pub is_render_group: bool,
    /// Parent to attach the node to. Default `None`.
    pub parent: Option<NodeId>,
    /// Children to attach, in order. Default empty.
    pub children: Vec<NodeId>,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            pivot: Vec2::ZERO,
            skew: Vec2::ZERO,
            rotation: 0.0,
            visible: true,
            renderable: true,
            alpha: 1.0,
            tint: 0xFF_FFFF,
            blend_mode: BlendMode::Inherit,
            z_index: 0,
            bounds_area: None,
            is_render_group: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Options for [`NodeStore::destroy_node`](super::NodeStore::destroy_node).
///
/// `bool` converts into this, so `store.destroy_node(id, true)` reads as
/// "destroy, including children".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DestroyOptions {
    /// Also destroy every (former) child, recursively. When `false`,
    /// children are detached and survive as parentless nodes.
    pub children: bool,
}

impl From<bool> for DestroyOptions {
    #[inline]
    fn from(children: bool) -> Self {
        Self { children }
    }
}
