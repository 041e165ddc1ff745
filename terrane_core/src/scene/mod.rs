// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene tree data model.
//!
//! A *node* is an element of a retained-mode 2D scene. Each node has:
//!
//! - An identity ([`NodeId`]) — a generational handle that becomes stale
//!   when the node is destroyed, preventing use-after-free bugs at the API
//!   level.
//! - Topology — parent, first-child, and sibling links forming an ordered
//!   tree; the child order is the paint order.
//! - **Local properties** set by the caller: the decomposed transform
//!   (position, scale, pivot, skew, rotation), tint and alpha, blend mode,
//!   and the visible/renderable bits.
//! - **Computed properties** produced by [`update`](NodeStore::update): the
//!   render-group-relative transform and the ancestor-combined tint, blend
//!   mode, and visibility, all relative to the owning render group. World
//!   values derive from these by composing with the group's world state.
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles for
//! cache-friendly traversal.
//!
//! # Render groups
//!
//! Any node can be promoted to a [render-group
//! root](NodeStore::enable_render_group). Its subtree then updates in the
//! root's frame of reference, and moving the root adjusts a single group
//! transform instead of re-deriving every member. Groups nest, forming a
//! sparse tree over the node tree.
//!
//! # Dirty tracking
//!
//! Property setters latch the node (`did_change` for transform-affecting
//! state, `did_view_update` for content) and notify the owning render group
//! once per cycle; [`ChangeFlags`](crate::visual::ChangeFlags) record which
//! categories changed. [`NodeStore::update`] consumes the marks and reports
//! [`FrameChanges`] for the backend.

mod children;
mod group;
mod id;
mod options;
mod store;
mod traverse;
mod update;

pub use id::{INVALID, NodeId, RenderableId};
pub use options::{DestroyOptions, NodeOptions};
pub use store::NodeStore;
pub use traverse::Children;
pub use update::FrameChanges;
