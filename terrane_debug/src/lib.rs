// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and scene-tree inspection for terrane diagnostics.
//!
//! This crate provides development-time views over a
//! [`NodeStore`](terrane_core::scene::NodeStore):
//!
//! - [`pretty::dump_tree`] — indented one-line-per-node scene dump.
//! - [`pretty::PrettyHookSink`] — a
//!   [`SceneHooks`](terrane_core::hooks::SceneHooks) implementation that
//!   logs structural events as they happen.

pub mod pretty;
