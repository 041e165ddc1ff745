// Copyright 2026 the Terrane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered child-list management: append, reorder, remove, insert.
//!
//! Child order is insertion order and doubles as the paint/traversal order.
//! No automatic depth-sort happens here; the external sort collaborator is
//! only notified through [`SceneHooks`](crate::hooks::SceneHooks) when a
//! sort-relevant change occurs.

use crate::visual::ChangeFlags;

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

impl NodeStore {
    /// Adds `child` as the last child of `parent` and returns it.
    ///
    /// A child already parented to `parent` is re-appended to the end of the
    /// paint order without touching its parent pointer or render-group
    /// membership. A child parented elsewhere is removed there first (full
    /// remove semantics), then attached: it is marked fully dirty, inherits
    /// `parent`'s render-group membership, and structural notifications
    /// fire. A child carrying a non-default sort key additionally triggers
    /// the `sort_dirty` hook.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, if `child` is `parent` itself, or
    /// if `child` is an ancestor of `parent` (cycle creation is rejected
    /// before any mutation).
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(p != c, "cannot add a node as a child of itself");
        assert!(
            !self.is_ancestor(c, p),
            "cannot add an ancestor as a child of its own descendant"
        );

        if self.parent[c as usize] == p {
            // Reorder to the top of the paint order. The render-group root
            // boundary absorbs the structural change.
            self.unlink_from_parent(c);
            self.parent[c as usize] = p;
            self.link_last(p, c);
            if !self.is_group_root_idx(p) {
                let g = self.member_group(p);
                self.mark_structure_changed(g);
            }
            return child;
        }

        if self.parent[c as usize] != INVALID {
            let old_parent = self.node_id(self.parent[c as usize]);
            self.remove_child(old_parent, child);
        }

        self.parent[c as usize] = p;
        self.link_last(p, c);

        // A newly attached child cannot assume any prior cached state is
        // valid.
        self.did_change[c as usize] = true;
        self.did_view_update[c as usize] = false;
        self.update_flags[c as usize] = ChangeFlags::all();

        let g = self.group[p as usize];
        if g != INVALID {
            self.mark_structure_changed(g);
            self.attach_subtree(g, c);
        }

        let index = self.child_count(p) - 1;
        self.fire_hooks(|h| h.child_added(parent, child, index));
        if self.z_index[c as usize] != 0 {
            self.fire_hooks(|h| h.sort_dirty(parent));
        }
        child
    }

    /// Adds several children in order; returns the first, or `None` for an
    /// empty slice.
    pub fn add_children(&mut self, parent: NodeId, children: &[NodeId]) -> Option<NodeId> {
        for &child in children {
            self.add_child(parent, child);
        }
        children.first().copied()
    }

    /// Removes `child` from `parent` and returns it.
    ///
    /// Removing a node that is not a child of `parent` is a defined no-op.
    /// Otherwise the child is spliced out of the order, detached from
    /// `parent`'s render group, and its parent pointer cleared; the
    /// `child_removed` hook fires with the pre-removal position.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        if self.parent[c as usize] != p {
            return child;
        }

        let index = self.child_index(p, c);
        self.unlink_from_parent(c);

        let g = self.group[p as usize];
        if g != INVALID {
            self.mark_structure_changed(g);
            self.detach_subtree(c);
        }

        self.fire_hooks(|h| h.child_removed(parent, child, index));
        child
    }

    /// Removes several children in order; returns the first, or `None` for
    /// an empty slice.
    pub fn remove_children(&mut self, parent: NodeId, children: &[NodeId]) -> Option<NodeId> {
        for &child in children {
            self.remove_child(parent, child);
        }
        children.first().copied()
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent; `sibling` must have one.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, `sibling`
    /// has no parent, or the insertion would create a cycle.
    pub fn insert_child_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");
        assert!(p != c, "cannot add a node as a child of itself");
        assert!(
            !self.is_ancestor(c, p),
            "cannot add an ancestor as a child of its own descendant"
        );

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.did_change[c as usize] = true;
        self.did_view_update[c as usize] = false;
        self.update_flags[c as usize] = ChangeFlags::all();

        let g = self.group[p as usize];
        if g != INVALID {
            self.mark_structure_changed(g);
            self.attach_subtree(g, c);
        }

        let index = self.child_index(p, c);
        let parent = self.node_id(p);
        self.fire_hooks(|h| h.child_added(parent, child, index));
        if self.z_index[c as usize] != 0 {
            self.fire_hooks(|h| h.sort_dirty(parent));
        }
    }

    // -- Internal helpers --

    /// Appends `c` at the end of `p`'s child list. Sibling links only; the
    /// parent pointer is managed by the caller.
    pub(crate) fn link_last(&mut self, p: u32, c: u32) {
        self.next_sibling[c as usize] = INVALID;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
            self.prev_sibling[c as usize] = INVALID;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty
    /// state.
    pub(crate) fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Whether `node` appears on `of`'s ancestor chain.
    fn is_ancestor(&self, node: u32, of: u32) -> bool {
        let mut walk = self.parent[of as usize];
        while walk != INVALID {
            if walk == node {
                return true;
            }
            walk = self.parent[walk as usize];
        }
        false
    }

    fn child_count(&self, p: u32) -> usize {
        let mut count = 0;
        let mut child = self.first_child[p as usize];
        while child != INVALID {
            count += 1;
            child = self.next_sibling[child as usize];
        }
        count
    }

    /// Position of `c` among `p`'s children.
    fn child_index(&self, p: u32, c: u32) -> usize {
        let mut index = 0;
        let mut child = self.first_child[p as usize];
        while child != INVALID && child != c {
            index += 1;
            child = self.next_sibling[child as usize];
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::hooks::SceneHooks;

    use super::*;

    #[test]
    fn add_child_and_query() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child1 = store.create_node();
        let child2 = store.create_node();

        store.add_child(parent, child1);
        store.add_child(parent, child2);

        assert_eq!(store.parent(child1), Some(parent));
        assert_eq!(store.parent(child2), Some(parent));

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
    }

    #[test]
    fn parent_and_child_list_agree_after_every_call() {
        let mut store = NodeStore::new();
        let p1 = store.create_node();
        let p2 = store.create_node();
        let child = store.create_node();

        store.add_child(p1, child);
        assert!(store.children(p1).any(|c| c == child));
        assert_eq!(store.parent(child), Some(p1));

        // Reparenting via add: removed from p1, appended to p2.
        store.add_child(p2, child);
        assert!(store.children(p1).next().is_none());
        assert!(store.children(p2).any(|c| c == child));
        assert_eq!(store.parent(child), Some(p2));

        store.remove_child(p2, child);
        assert!(store.children(p2).next().is_none());
        assert_eq!(store.parent(child), None);
    }

    #[test]
    fn re_add_reorders_to_top() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();
        store.add_children(parent, &[a, b, c]);

        store.add_child(parent, a);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![b, c, a]);
        assert_eq!(store.parent(a), Some(parent));
    }

    #[test]
    fn re_add_keeps_group_membership_and_latch_state() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        store.enable_render_group(root);
        let a = store.create_node();
        let b = store.create_node();
        store.add_children(root, &[a, b]);
        let _ = store.update();

        let group_before = store.render_group(a);
        store.add_child(root, a);
        assert_eq!(store.render_group(a), group_before);
        assert!(!store.did_change(a), "reorder must not dirty the child");
    }

    #[test]
    fn remove_non_child_is_noop() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();
        let stranger = store.create_node();
        store.add_child(parent, child);

        let returned = store.remove_child(parent, stranger);
        assert_eq!(returned, stranger);
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child]);
        assert_eq!(store.parent(stranger), None);
    }

    #[test]
    fn add_children_returns_first() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        assert_eq!(store.add_children(parent, &[a, b]), Some(a));
        assert_eq!(store.add_children(parent, &[]), None);
    }

    #[test]
    fn insert_child_before_works() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();

        store.add_child(parent, a);
        store.add_child(parent, c);
        store.insert_child_before(b, c);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    #[should_panic(expected = "child of itself")]
    fn add_to_self_panics() {
        let mut store = NodeStore::new();
        let node = store.create_node();
        store.add_child(node, node);
    }

    #[test]
    #[should_panic(expected = "ancestor as a child")]
    fn add_ancestor_to_descendant_panics() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();
        store.add_child(a, b);
        store.add_child(b, c);
        store.add_child(c, a);
    }

    #[derive(Default)]
    struct Recorder {
        events: Rc<RefCell<Vec<(&'static str, u32, usize)>>>,
    }

    impl SceneHooks for Recorder {
        fn child_added(&mut self, _parent: NodeId, child: NodeId, index: usize) {
            self.events.borrow_mut().push(("added", child.index(), index));
        }
        fn child_removed(&mut self, _parent: NodeId, child: NodeId, index: usize) {
            self.events
                .borrow_mut()
                .push(("removed", child.index(), index));
        }
        fn sort_dirty(&mut self, parent: NodeId) {
            self.events.borrow_mut().push(("sort", parent.index(), 0));
        }
        fn node_destroyed(&mut self, node: NodeId) {
            self.events
                .borrow_mut()
                .push(("destroyed", node.index(), 0));
        }
    }

    #[test]
    fn hooks_fire_with_positions() {
        let mut store = NodeStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        store.set_hooks(alloc::boxed::Box::new(Recorder {
            events: events.clone(),
        }));

        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(parent, a);
        store.add_child(parent, b);
        store.remove_child(parent, a);

        let log = events.borrow();
        assert_eq!(
            &*log,
            &[
                ("added", a.index(), 0),
                ("added", b.index(), 1),
                ("removed", a.index(), 0),
            ]
        );
    }

    #[test]
    fn sort_dirty_fires_for_nonzero_sort_key() {
        let mut store = NodeStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        store.set_hooks(alloc::boxed::Box::new(Recorder {
            events: events.clone(),
        }));

        let parent = store.create_node();
        let plain = store.create_node();
        let sorted = store.create_node();
        store.set_z_index(sorted, 5);
        store.add_child(parent, plain);
        store.add_child(parent, sorted);

        let log = events.borrow();
        assert!(log.contains(&("sort", parent.index(), 0)));
        assert_eq!(log.iter().filter(|e| e.0 == "sort").count(), 1);
    }

    #[test]
    fn destroy_with_children_destroys_each_exactly_once() {
        let mut store = NodeStore::new();
        let events = Rc::new(RefCell::new(Vec::new()));
        store.set_hooks(alloc::boxed::Box::new(Recorder {
            events: events.clone(),
        }));

        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let grandchild = store.create_node();
        store.add_child(parent, a);
        store.add_child(parent, b);
        store.add_child(a, grandchild);

        store.destroy_node(parent, true);

        assert!(!store.is_alive(parent));
        assert!(!store.is_alive(a));
        assert!(!store.is_alive(b));
        assert!(!store.is_alive(grandchild));

        let log = events.borrow();
        let destroyed: Vec<u32> = log
            .iter()
            .filter(|e| e.0 == "destroyed")
            .map(|e| e.1)
            .collect();
        assert_eq!(destroyed.len(), 4);
        for id in [parent, a, b, grandchild] {
            assert_eq!(destroyed.iter().filter(|&&i| i == id.index()).count(), 1);
        }
    }

    #[test]
    fn destroy_without_children_detaches_them_alive() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();
        store.add_child(parent, child);

        store.destroy_node(parent, false);

        assert!(!store.is_alive(parent));
        assert!(store.is_alive(child));
        assert_eq!(store.parent(child), None);
    }
}
