// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode 2D scene graph with render groups and incremental
//! transform propagation.
//!
//! `terrane_core` provides the data structures between application code that
//! mutates a scene tree and a rasterization backend that draws it. It is
//! `no_std` compatible (with `alloc`) and uses struct-of-arrays storage with
//! index handles for cache-friendly traversal.
//!
//! # Architecture
//!
//! The crate is organized around a per-frame cycle that turns property
//! mutations into incremental updates:
//!
//! ```text
//!   Application (setters, add/remove, enable_render_group)
//!       │
//!       ▼
//!   dirty latches ──► render-group update queues
//!                              │
//!                              ▼
//!   NodeStore::update() ──► FrameChanges ──► backend applies
//! ```
//!
//! **[`scene`]** — Struct-of-arrays node tree with generational handles,
//! render-group management, and the update pass. Local properties are set by
//! the caller; relative transforms and combined visual state are computed by
//! updating.
//!
//! **[`transform`]** — Decomposed 2D local transform (position, scale,
//! pivot, skew, rotation) with cached basis scalars.
//!
//! **[`visual`]** — Tint, blend-mode, and visibility types with their
//! ancestor combination rules, plus the change-category flag set.
//!
//! **[`hooks`]** — The [`SceneHooks`](hooks::SceneHooks) trait through which
//! external collaborators (measurement, hit testing, sorting) observe
//! structural changes.
//!
//! # Concurrency
//!
//! Mutation is single-threaded and synchronous: all tree edits are expected
//! to happen on one logical thread between update passes. Nothing here
//! locks; a multi-threaded embedding must give the mutation surface
//! exclusive access to the affected tree.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod hooks;
pub mod scene;
pub mod transform;
pub mod visual;
