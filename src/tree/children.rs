//! Child collection storage.
//!
//! Two interchangeable strategies implement [`SiblingStore`]:
//!
//! - [`ArrayChildren`]: a `Vec<NodeId>`. Indexed access is O(1); sibling
//!   lookup and removal by node are O(n).
//! - [`LinkedChildren`]: a circular doubly linked list keyed by `NodeId`.
//!   Sibling lookup, removal by node and insertion at either end are O(1);
//!   indexed access walks from the nearer end.
//!
//! These types only store ids. Ownership bookkeeping, validation and
//! notifications are the job of the mutation layer on
//! [`Document`](crate::Document), which is the only code that changes them.

use std::collections::HashMap;

use super::NodeId;
use crate::config::ChildStorage;

/// Ordered storage for the children of one container.
pub trait SiblingStore {
    /// Number of children.
    fn len(&self) -> usize;

    /// Returns `true` if there are no children.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The child at `index`.
    fn get(&self, index: usize) -> Option<NodeId>;

    /// The index of `node`, if it is a member.
    fn position(&self, node: NodeId) -> Option<usize>;

    /// Returns `true` if `node` is a member.
    fn contains(&self, node: NodeId) -> bool;

    /// The first child.
    fn first(&self) -> Option<NodeId>;

    /// The last child.
    fn last(&self) -> Option<NodeId>;

    /// The member before `node`.
    fn previous(&self, node: NodeId) -> Option<NodeId>;

    /// The member after `node`.
    fn next(&self, node: NodeId) -> Option<NodeId>;

    /// Inserts `node` so that it ends up at `index`. `index` must be
    /// `<= len()` and `node` must not be a member.
    fn insert(&mut self, index: usize, node: NodeId);

    /// Removes `node`; returns `false` if it was not a member.
    fn remove(&mut self, node: NodeId) -> bool;

    /// Puts `node` at `index` in place of the current occupant, which is
    /// returned. `node` must not be a member.
    fn replace_at(&mut self, index: usize, node: NodeId) -> Option<NodeId>;

    /// Removes every member, returning them in order.
    fn clear(&mut self) -> Vec<NodeId>;

    /// The members in order.
    fn to_vec(&self) -> Vec<NodeId>;
}

/// Vec-backed child storage.
#[derive(Debug, Default, Clone)]
pub struct ArrayChildren {
    items: Vec<NodeId>,
}

impl SiblingStore for ArrayChildren {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<NodeId> {
        self.items.get(index).copied()
    }

    fn position(&self, node: NodeId) -> Option<usize> {
        self.items.iter().position(|&n| n == node)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.items.contains(&node)
    }

    fn first(&self) -> Option<NodeId> {
        self.items.first().copied()
    }

    fn last(&self) -> Option<NodeId> {
        self.items.last().copied()
    }

    fn previous(&self, node: NodeId) -> Option<NodeId> {
        let pos = self.position(node)?;
        pos.checked_sub(1).map(|i| self.items[i])
    }

    fn next(&self, node: NodeId) -> Option<NodeId> {
        let pos = self.position(node)?;
        self.items.get(pos + 1).copied()
    }

    fn insert(&mut self, index: usize, node: NodeId) {
        debug_assert!(!self.contains(node), "node is already a member");
        self.items.insert(index.min(self.items.len()), node);
    }

    fn remove(&mut self, node: NodeId) -> bool {
        match self.position(node) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    fn replace_at(&mut self, index: usize, node: NodeId) -> Option<NodeId> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, node))
    }

    fn clear(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.items)
    }

    fn to_vec(&self) -> Vec<NodeId> {
        self.items.clone()
    }
}

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: NodeId,
    next: NodeId,
}

/// Circular doubly linked child storage.
///
/// `head` is the first child; the head's `prev` link is the last child.
#[derive(Debug, Default, Clone)]
pub struct LinkedChildren {
    head: Option<NodeId>,
    links: HashMap<NodeId, Link>,
}

impl LinkedChildren {
    fn link(&self, node: NodeId) -> Option<Link> {
        self.links.get(&node).copied()
    }

    /// Walks to `index` from whichever end is closer.
    fn nth(&self, index: usize) -> Option<NodeId> {
        let len = self.links.len();
        if index >= len {
            return None;
        }
        let mut current = self.head?;
        if index <= len / 2 {
            for _ in 0..index {
                current = self.link(current)?.next;
            }
        } else {
            for _ in 0..len - index {
                current = self.link(current)?.prev;
            }
        }
        Some(current)
    }

    /// Links `node` immediately before `anchor`.
    fn link_before(&mut self, anchor: NodeId, node: NodeId) {
        let Some(anchor_link) = self.link(anchor) else {
            return;
        };
        let prev = anchor_link.prev;
        self.links.insert(node, Link { prev, next: anchor });
        if let Some(l) = self.links.get_mut(&prev) {
            l.next = node;
        }
        if let Some(l) = self.links.get_mut(&anchor) {
            l.prev = node;
        }
    }
}

impl SiblingStore for LinkedChildren {
    fn len(&self) -> usize {
        self.links.len()
    }

    fn get(&self, index: usize) -> Option<NodeId> {
        self.nth(index)
    }

    fn position(&self, node: NodeId) -> Option<usize> {
        if !self.links.contains_key(&node) {
            return None;
        }
        self.iter().position(|n| n == node)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.links.contains_key(&node)
    }

    fn first(&self) -> Option<NodeId> {
        self.head
    }

    fn last(&self) -> Option<NodeId> {
        self.head.and_then(|h| self.link(h)).map(|l| l.prev)
    }

    fn previous(&self, node: NodeId) -> Option<NodeId> {
        if Some(node) == self.head {
            return None;
        }
        self.link(node).map(|l| l.prev)
    }

    fn next(&self, node: NodeId) -> Option<NodeId> {
        let next = self.link(node)?.next;
        (Some(next) != self.head).then_some(next)
    }

    fn insert(&mut self, index: usize, node: NodeId) {
        debug_assert!(!self.contains(node), "node is already a member");
        let Some(head) = self.head else {
            self.links.insert(node, Link { prev: node, next: node });
            self.head = Some(node);
            return;
        };
        if index >= self.links.len() {
            // Before the head of a circular list is the tail position.
            self.link_before(head, node);
            return;
        }
        if let Some(anchor) = self.nth(index) {
            self.link_before(anchor, node);
            if index == 0 {
                self.head = Some(node);
            }
        }
    }

    fn remove(&mut self, node: NodeId) -> bool {
        let Some(link) = self.links.remove(&node) else {
            return false;
        };
        if self.links.is_empty() {
            self.head = None;
            return true;
        }
        if let Some(l) = self.links.get_mut(&link.prev) {
            l.next = link.next;
        }
        if let Some(l) = self.links.get_mut(&link.next) {
            l.prev = link.prev;
        }
        if self.head == Some(node) {
            self.head = Some(link.next);
        }
        true
    }

    fn replace_at(&mut self, index: usize, node: NodeId) -> Option<NodeId> {
        let old = self.nth(index)?;
        let link = self.links.remove(&old)?;
        if link.prev == old {
            // Sole member.
            self.links.insert(node, Link { prev: node, next: node });
        } else {
            self.links.insert(node, link);
            if let Some(l) = self.links.get_mut(&link.prev) {
                l.next = node;
            }
            if let Some(l) = self.links.get_mut(&link.next) {
                l.prev = node;
            }
        }
        if self.head == Some(old) {
            self.head = Some(node);
        }
        Some(old)
    }

    fn clear(&mut self) -> Vec<NodeId> {
        let members = self.to_vec();
        self.links.clear();
        self.head = None;
        members
    }

    fn to_vec(&self) -> Vec<NodeId> {
        self.iter().collect()
    }
}

impl LinkedChildren {
    fn iter(&self) -> LinkedIter<'_> {
        LinkedIter {
            store: self,
            next: self.head,
            remaining: self.links.len(),
        }
    }
}

/// Forward iterator over a [`LinkedChildren`].
#[derive(Debug, Clone)]
pub struct LinkedIter<'a> {
    store: &'a LinkedChildren,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for LinkedIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.store.link(current).map(|l| l.next);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// The child collection stored in a container node.
#[derive(Debug, Clone)]
pub enum ChildList {
    /// Array-backed storage.
    Array(ArrayChildren),
    /// Linked-list storage.
    Linked(LinkedChildren),
}

impl ChildList {
    /// Creates an empty collection with the given strategy.
    #[must_use]
    pub fn new(storage: ChildStorage) -> Self {
        match storage {
            ChildStorage::Array => Self::Array(ArrayChildren::default()),
            ChildStorage::Linked => Self::Linked(LinkedChildren::default()),
        }
    }

    /// Iterates over the children in order.
    #[must_use]
    pub fn iter(&self) -> ChildIter<'_> {
        match self {
            Self::Array(a) => ChildIter::Array(a.items.iter()),
            Self::Linked(l) => ChildIter::Linked(l.iter()),
        }
    }

    fn store(&self) -> &dyn SiblingStore {
        match self {
            Self::Array(a) => a,
            Self::Linked(l) => l,
        }
    }

    fn store_mut(&mut self) -> &mut dyn SiblingStore {
        match self {
            Self::Array(a) => a,
            Self::Linked(l) => l,
        }
    }
}

impl SiblingStore for ChildList {
    fn len(&self) -> usize {
        self.store().len()
    }

    fn get(&self, index: usize) -> Option<NodeId> {
        self.store().get(index)
    }

    fn position(&self, node: NodeId) -> Option<usize> {
        self.store().position(node)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.store().contains(node)
    }

    fn first(&self) -> Option<NodeId> {
        self.store().first()
    }

    fn last(&self) -> Option<NodeId> {
        self.store().last()
    }

    fn previous(&self, node: NodeId) -> Option<NodeId> {
        self.store().previous(node)
    }

    fn next(&self, node: NodeId) -> Option<NodeId> {
        self.store().next(node)
    }

    fn insert(&mut self, index: usize, node: NodeId) {
        self.store_mut().insert(index, node);
    }

    fn remove(&mut self, node: NodeId) -> bool {
        self.store_mut().remove(node)
    }

    fn replace_at(&mut self, index: usize, node: NodeId) -> Option<NodeId> {
        self.store_mut().replace_at(index, node)
    }

    fn clear(&mut self) -> Vec<NodeId> {
        self.store_mut().clear()
    }

    fn to_vec(&self) -> Vec<NodeId> {
        self.store().to_vec()
    }
}

/// Iterator over a [`ChildList`], or over nothing for non-containers.
#[derive(Debug, Clone)]
pub enum ChildIter<'a> {
    /// Iterating array storage.
    Array(std::slice::Iter<'a, NodeId>),
    /// Iterating linked storage.
    Linked(LinkedIter<'a>),
    /// The node has no children collection.
    Empty,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        match self {
            Self::Array(it) => it.next().copied(),
            Self::Linked(it) => it.next(),
            Self::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Array(it) => it.size_hint(),
            Self::Linked(it) => it.size_hint(),
            Self::Empty => (0, Some(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(n: u32) -> Vec<NodeId> {
        (1..=n).map(NodeId::for_test).collect()
    }

    fn exercise(storage: ChildStorage) {
        let n = ids(5);
        let mut list = ChildList::new(storage);
        list.insert(0, n[1]);
        list.insert(0, n[0]);
        list.insert(2, n[3]);
        list.insert(2, n[2]);
        list.insert(99, n[4]);
        assert_eq!(list.to_vec(), n);
        assert_eq!(list.len(), 5);

        assert_eq!(list.first(), Some(n[0]));
        assert_eq!(list.last(), Some(n[4]));
        assert_eq!(list.previous(n[0]), None);
        assert_eq!(list.previous(n[2]), Some(n[1]));
        assert_eq!(list.next(n[2]), Some(n[3]));
        assert_eq!(list.next(n[4]), None);
        assert_eq!(list.get(3), Some(n[3]));
        assert_eq!(list.get(5), None);
        assert_eq!(list.position(n[4]), Some(4));

        assert!(list.remove(n[0]));
        assert!(!list.remove(n[0]));
        assert_eq!(list.first(), Some(n[1]));
        assert!(list.remove(n[4]));
        assert_eq!(list.last(), Some(n[3]));

        let extra = NodeId::for_test(9);
        assert_eq!(list.replace_at(1, extra), Some(n[2]));
        assert_eq!(list.to_vec(), vec![n[1], extra, n[3]]);
        assert_eq!(list.replace_at(3, n[0]), None);

        assert_eq!(list.iter().collect::<Vec<_>>(), vec![n[1], extra, n[3]]);
        assert_eq!(list.clear(), vec![n[1], extra, n[3]]);
        assert!(list.is_empty());
        assert_eq!(list.first(), None);
    }

    #[test]
    fn test_array_storage() {
        exercise(ChildStorage::Array);
    }

    #[test]
    fn test_linked_storage() {
        exercise(ChildStorage::Linked);
    }

    #[test]
    fn test_linked_single_member_replace() {
        let n = ids(2);
        let mut list = ChildList::new(ChildStorage::Linked);
        list.insert(0, n[0]);
        assert_eq!(list.replace_at(0, n[1]), Some(n[0]));
        assert_eq!(list.to_vec(), vec![n[1]]);
        assert_eq!(list.previous(n[1]), None);
        assert_eq!(list.next(n[1]), None);
        assert_eq!(list.last(), Some(n[1]));
    }

    #[test]
    fn test_linked_index_walks_from_tail() {
        let n = ids(8);
        let mut list = ChildList::new(ChildStorage::Linked);
        for (i, id) in n.iter().enumerate() {
            list.insert(i, *id);
        }
        for (i, id) in n.iter().enumerate() {
            assert_eq!(list.get(i), Some(*id));
        }
        list.insert(6, NodeId::for_test(20));
        assert_eq!(list.get(6), Some(NodeId::for_test(20)));
        assert_eq!(list.get(7), Some(n[6]));
    }
}
