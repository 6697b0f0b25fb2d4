//! Structural mutation of child collections.
//!
//! Every public operation validates first and mutates second, so a failed
//! call leaves the tree untouched. The internal primitives below the
//! validation line cannot fail.
//!
//! Inserting a node that is linked somewhere else moves it: it is detached
//! first (one removal notification on its old parent) and the target index is
//! adjusted as a splice would. Inserting a [`DocumentFragment`] splices its
//! children instead and leaves the fragment empty.
//!
//! [`DocumentFragment`]: super::NodeType::DocumentFragment

use tracing::trace;

use super::{Document, NodeId, NodeKind, NodeType, Owner, SiblingStore};
use crate::error::DomError;
use crate::observer::ChildListChange;
use crate::util::qname::is_xml_whitespace;

impl Document {
    // --- Validation ---

    fn child_allowed(&self, parent_type: NodeType, node: NodeId) -> Result<(), DomError> {
        let data = self.try_node(node)?;
        let child_type = data.node_type();
        let allowed = match parent_type {
            NodeType::Element | NodeType::DocumentFragment => matches!(
                child_type,
                NodeType::Element
                    | NodeType::Text
                    | NodeType::CData
                    | NodeType::Comment
                    | NodeType::ProcessingInstruction
                    | NodeType::EntityReference
            ),
            NodeType::Document => match &data.kind {
                NodeKind::Text { content } => is_xml_whitespace(content),
                kind => matches!(
                    kind.node_type(),
                    NodeType::Element
                        | NodeType::DocumentType
                        | NodeType::Comment
                        | NodeType::ProcessingInstruction
                ),
            },
            NodeType::DocumentType => {
                matches!(child_type, NodeType::Entity | NodeType::Notation)
            }
            _ => false,
        };
        if allowed {
            Ok(())
        } else if !parent_type.is_container() {
            Err(DomError::structural(format!(
                "a {parent_type} cannot have children"
            )))
        } else {
            Err(DomError::structural(format!(
                "a {child_type} cannot be a child of a {parent_type}"
            )))
        }
    }

    /// Checks that `incoming` can become children of `parent` once every
    /// node in `leaving` has left it.
    fn check_insertable(
        &self,
        parent: NodeId,
        incoming: &[NodeId],
        leaving: &[NodeId],
    ) -> Result<(), DomError> {
        let parent_type = self.try_node(parent)?.node_type();
        for (i, &node) in incoming.iter().enumerate() {
            self.child_allowed(parent_type, node)?;
            if incoming[..i].contains(&node) {
                return Err(DomError::structural(format!(
                    "{node:?} is listed more than once"
                )));
            }
            if self.ancestors(parent).any(|a| a == node) {
                return Err(DomError::structural(
                    "a node cannot be inserted into itself or its own descendant",
                ));
            }
        }
        if parent_type == NodeType::Document {
            let remaining = self
                .children(parent)
                .filter(|c| !leaving.contains(c) && !incoming.contains(c));
            let mut elements = 0;
            let mut doctypes = 0;
            for node in remaining.chain(incoming.iter().copied()) {
                match self.node_type(node) {
                    Some(NodeType::Element) => elements += 1,
                    Some(NodeType::DocumentType) => doctypes += 1,
                    _ => {}
                }
            }
            if elements > 1 {
                return Err(DomError::structural(
                    "a document can have only one element child",
                ));
            }
            if doctypes > 1 {
                return Err(DomError::structural(
                    "a document can have only one document type",
                ));
            }
        }
        Ok(())
    }

    /// Validates inserting `nodes` into `parent`, with fragments flattened,
    /// once every node in `leaving` has left it. Nothing is mutated.
    pub(crate) fn check_insert(
        &self,
        parent: NodeId,
        nodes: &[NodeId],
        leaving: &[NodeId],
    ) -> Result<(), DomError> {
        let flat = self.flatten(nodes)?;
        self.check_insertable(parent, &flat, leaving)
    }

    /// Validates [`wrap`](Self::wrap) without mutating.
    pub(crate) fn check_wrap(&self, node: NodeId, wrapper: NodeId) -> Result<(), DomError> {
        self.require_wrapper(wrapper, node)?;
        self.check_insertable(wrapper, &[node], &[])?;
        if let Some(parent) = self.parent(node) {
            self.check_insertable(parent, &[wrapper], &[node])?;
        }
        Ok(())
    }

    fn check_index(&self, parent: NodeId, index: usize, inclusive: bool) -> Result<(), DomError> {
        let len = self.child_count(parent);
        let valid = if inclusive { index <= len } else { index < len };
        if valid {
            Ok(())
        } else {
            Err(DomError::OutOfRange { index, len })
        }
    }

    /// Replaces fragments by their children.
    fn flatten(&self, nodes: &[NodeId]) -> Result<Vec<NodeId>, DomError> {
        let mut flat = Vec::with_capacity(nodes.len());
        for &node in nodes {
            if self.try_node(node)?.node_type() == NodeType::DocumentFragment {
                flat.extend(self.children(node));
            } else {
                flat.push(node);
            }
        }
        Ok(flat)
    }

    // --- Primitives (infallible once validated) ---

    fn link_child(&mut self, parent: NodeId, index: usize, node: NodeId) {
        let Some(list) = self.child_list_mut(parent) else {
            return;
        };
        list.insert(index, node);
        let previous = list.previous(node);
        let next = list.next(node);
        self.set_owner(node, Owner::Children(parent));
        trace!(?parent, ?node, index, "linked child");
        self.record_child_change(ChildListChange::add(parent, node, previous, next));
    }

    /// Detaches `node` from its parent. Returns the parent and former index.
    pub(crate) fn unlink_child(&mut self, node: NodeId) -> Option<(NodeId, usize)> {
        let Some(Owner::Children(parent)) = self.owner(node) else {
            return None;
        };
        let list = self.child_list_mut(parent)?;
        let index = list.position(node)?;
        let previous = list.previous(node);
        let next = list.next(node);
        list.remove(node);
        self.set_owner(node, Owner::Unlinked);
        trace!(?parent, ?node, index, "unlinked child");
        self.record_child_change(ChildListChange::remove(parent, vec![node], previous, next));
        Some((parent, index))
    }

    /// Moves or links `node` to `index` of `parent`. Returns where it ended.
    fn place_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> usize {
        let mut index = index;
        if self.owner(node) == Some(Owner::Children(parent)) {
            if let Some(current) = self.child_list(parent).and_then(|l| l.position(node)) {
                if current == index || current + 1 == index {
                    return current;
                }
                if current < index {
                    index -= 1;
                }
            }
        }
        self.unlink_child(node);
        self.link_child(parent, index, node);
        index
    }

    /// Puts `node` at `index` of `parent`, unlinking the occupant. `node`
    /// must already be unlinked.
    fn swap_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> Option<NodeId> {
        let list = self.child_list_mut(parent)?;
        let old = list.replace_at(index, node)?;
        let previous = list.previous(node);
        let next = list.next(node);
        self.set_owner(old, Owner::Unlinked);
        self.set_owner(node, Owner::Children(parent));
        trace!(?parent, ?old, ?node, index, "replaced child");
        self.record_child_change(ChildListChange {
            parent,
            added: vec![node],
            removed: vec![old],
            previous_sibling: previous,
            next_sibling: next,
        });
        Some(old)
    }

    /// Empties the child list with a single removal notification.
    fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let removed = self
            .child_list_mut(parent)
            .map(|l| l.clear())
            .unwrap_or_default();
        for &node in &removed {
            self.set_owner(node, Owner::Unlinked);
        }
        if !removed.is_empty() {
            trace!(?parent, count = removed.len(), "cleared children");
            self.record_child_change(ChildListChange::remove(parent, removed.clone(), None, None));
        }
        removed
    }

    /// Runs `f` inside a batch frame, then closes it.
    fn batched(&mut self, f: impl FnOnce(&mut Self)) -> Result<(), DomError> {
        self.batches.push();
        f(self);
        self.close_batch()
    }

    // --- Insertion ---

    /// Inserts `node` so it ends up at `index` among the children of
    /// `parent`.
    ///
    /// A node already linked elsewhere is moved; one already at `index` is
    /// left alone. A document fragment contributes its children.
    ///
    /// # Errors
    ///
    /// - [`DomError::OutOfRange`] if `index > child_count(parent)`.
    /// - [`DomError::StructuralConstraint`] if the node kind is not allowed
    ///   under `parent`, the insert would create a cycle, or a document would
    ///   get a second element or doctype.
    /// - [`DomError::Observer`] if an observer failed (the insert stands).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<(), DomError> {
        if self.try_node(node)?.node_type() == NodeType::DocumentFragment {
            return self.insert_children(parent, index, &[node]);
        }
        self.check_index(parent, index, true)?;
        self.check_insertable(parent, &[node], &[])?;
        self.place_child(parent, index, node);
        self.deliver()
    }

    /// Appends `node` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`insert_child`](Self::insert_child).
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.try_node(parent)?;
        self.insert_child(parent, self.child_count(parent), node)
    }

    /// Inserts `node` as the first child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`insert_child`](Self::insert_child).
    pub fn prepend_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), DomError> {
        self.insert_child(parent, 0, node)
    }

    /// Inserts `node` right before `reference`.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if `reference` has no parent; otherwise see
    /// [`insert_child`](Self::insert_child).
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.sibling_position(reference)?;
        self.insert_child(parent, index, node)
    }

    /// Inserts `node` right after `reference`.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if `reference` has no parent; otherwise see
    /// [`insert_child`](Self::insert_child).
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let (parent, index) = self.sibling_position(reference)?;
        self.insert_child(parent, index + 1, node)
    }

    fn sibling_position(&self, node: NodeId) -> Result<(NodeId, usize), DomError> {
        self.try_node(node)?;
        self.parent(node)
            .zip(self.index_of(node))
            .ok_or_else(|| DomError::NotFound {
                what: format!("parent of {node:?}"),
            })
    }

    /// Inserts `nodes` in order starting at `index`, as one batch.
    ///
    /// Fragments are flattened; contiguous inserts reach observers as one
    /// notification.
    ///
    /// # Errors
    ///
    /// As [`insert_child`](Self::insert_child), plus
    /// [`DomError::StructuralConstraint`] if a node is listed twice.
    pub fn insert_children(
        &mut self,
        parent: NodeId,
        index: usize,
        nodes: &[NodeId],
    ) -> Result<(), DomError> {
        self.check_index(parent, index, true)?;
        let flat = self.flatten(nodes)?;
        self.check_insertable(parent, &flat, &[])?;
        let fragments: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&n| self.node_type(n) == Some(NodeType::DocumentFragment))
            .collect();
        self.batched(|doc| {
            // Emptying fragments up front keeps the inserts contiguous.
            for fragment in fragments {
                doc.take_children(fragment);
            }
            let mut cursor = index;
            for node in flat {
                cursor = doc.place_child(parent, cursor, node) + 1;
            }
        })
    }

    /// Appends `nodes` in order, as one batch.
    ///
    /// # Errors
    ///
    /// See [`insert_children`](Self::insert_children).
    pub fn append_children(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<(), DomError> {
        self.try_node(parent)?;
        self.insert_children(parent, self.child_count(parent), nodes)
    }

    // --- Removal ---

    /// Removes the child at `index`. The node goes to the unlinked bucket and
    /// is returned.
    ///
    /// # Errors
    ///
    /// [`DomError::OutOfRange`] if there is no child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId, DomError> {
        self.try_node(parent)?;
        self.check_index(parent, index, false)?;
        let node = self
            .child_at(parent, index)
            .ok_or(DomError::OutOfRange {
                index,
                len: self.child_count(parent),
            })?;
        self.unlink_child(node);
        self.deliver()?;
        Ok(node)
    }

    /// Detaches `node` from wherever it is linked. Attribute nodes are
    /// removed from their element. Unlinked nodes are left alone.
    ///
    /// # Errors
    ///
    /// [`DomError::StructuralConstraint`] for the document node.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), DomError> {
        self.try_node(node)?;
        match self.owner(node) {
            None => Err(DomError::structural("the document node cannot be removed")),
            Some(Owner::Attributes(element)) => self.remove_attribute_node(element, node),
            Some(Owner::Children(_)) => {
                self.unlink_child(node);
                self.deliver()
            }
            Some(Owner::Unlinked) => Ok(()),
        }
    }

    /// Removes every child of `parent` and returns them in their former
    /// order. Observers get one notification carrying all of them.
    ///
    /// # Errors
    ///
    /// [`DomError::Observer`] if an observer failed.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.try_node(parent)?;
        let removed = self.take_children(parent);
        self.deliver()?;
        Ok(removed)
    }

    // --- Replacement ---

    /// Puts `node` at `index` in place of the current child, which is
    /// unlinked and returned.
    ///
    /// If `node` is already a child of `parent`, it is moved and the index is
    /// adjusted for its removal.
    ///
    /// # Errors
    ///
    /// [`DomError::OutOfRange`] if there is no child at `index`, and the
    /// structural errors of [`insert_child`](Self::insert_child).
    pub fn replace_child_at(
        &mut self,
        parent: NodeId,
        index: usize,
        node: NodeId,
    ) -> Result<NodeId, DomError> {
        self.try_node(parent)?;
        self.check_index(parent, index, false)?;
        let old = self
            .child_at(parent, index)
            .ok_or(DomError::OutOfRange {
                index,
                len: self.child_count(parent),
            })?;
        if old == node {
            return Ok(old);
        }
        if self.try_node(node)?.node_type() == NodeType::DocumentFragment {
            let flat = self.flatten(&[node])?;
            self.check_insertable(parent, &flat, &[old])?;
            self.batched(|doc| {
                doc.take_children(node);
                doc.unlink_child(old);
                for (offset, child) in flat.into_iter().enumerate() {
                    doc.link_child(parent, index + offset, child);
                }
            })?;
            return Ok(old);
        }
        self.check_insertable(parent, &[node], &[old])?;
        self.batched(|doc| {
            let mut index = index;
            if let Some((from, current)) = doc.unlink_child(node) {
                if from == parent && current < index {
                    index -= 1;
                }
            }
            doc.swap_child(parent, index, node);
        })?;
        Ok(old)
    }

    /// Puts `new` in the place of `old`.
    ///
    /// Works for children and for attribute nodes.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if `old` is not linked, plus the errors of
    /// [`replace_child_at`](Self::replace_child_at).
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        self.try_node(old)?;
        match self.owner(old) {
            Some(Owner::Attributes(element)) => {
                let index = self.index_of(old).ok_or_else(|| DomError::NotFound {
                    what: format!("attribute {old:?}"),
                })?;
                self.set_attribute_node_at(element, index, new).map(|_| ())
            }
            Some(Owner::Children(parent)) => {
                let index = self.index_of(old).ok_or_else(|| DomError::NotFound {
                    what: format!("child {old:?}"),
                })?;
                self.replace_child_at(parent, index, new).map(|_| ())
            }
            _ => Err(DomError::NotFound {
                what: format!("parent of {old:?}"),
            }),
        }
    }

    // --- Wrapping ---

    /// Puts `wrapper` where `node` is and moves `node` into it as the last
    /// child.
    ///
    /// # Errors
    ///
    /// [`DomError::StructuralConstraint`] if `wrapper` is not an element or
    /// if the result would break a structural rule.
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) -> Result<(), DomError> {
        self.check_wrap(node, wrapper)?;
        let parent = self.parent(node);
        self.batched(|doc| {
            if let Some(parent) = parent {
                doc.unlink_child(wrapper);
                if let Some(index) = doc.index_of(node) {
                    doc.swap_child(parent, index, wrapper);
                }
            }
            let end = doc.child_count(wrapper);
            doc.place_child(wrapper, end, node);
        })
    }

    /// Moves every child of `parent` into `wrapper` and appends `wrapper` to
    /// `parent`.
    ///
    /// # Errors
    ///
    /// [`DomError::StructuralConstraint`] if `wrapper` is not an element, is
    /// `parent` or one of its children, or cannot hold the children.
    pub fn wrap_children(&mut self, parent: NodeId, wrapper: NodeId) -> Result<(), DomError> {
        self.require_wrapper(wrapper, parent)?;
        if self.parent(wrapper) == Some(parent) {
            return Err(DomError::structural(
                "a child cannot wrap its own siblings",
            ));
        }
        let children: Vec<NodeId> = self.children(parent).collect();
        self.check_insertable(wrapper, &children, &[])?;
        self.check_insertable(parent, &[wrapper], &children)?;
        self.batched(|doc| {
            let moved = doc.take_children(parent);
            doc.unlink_child(wrapper);
            doc.link_child(parent, 0, wrapper);
            let base = doc.child_count(wrapper);
            for (offset, child) in moved.into_iter().enumerate() {
                doc.link_child(wrapper, base + offset, child);
            }
        })
    }

    /// Replaces `element` by its children. The element ends up unlinked and
    /// empty; the moved children are returned.
    ///
    /// # Errors
    ///
    /// [`DomError::NotFound`] if the element has no parent;
    /// [`DomError::StructuralConstraint`] if the parent cannot hold the
    /// children (e.g. several elements under a document).
    pub fn unwrap(&mut self, element: NodeId) -> Result<Vec<NodeId>, DomError> {
        if self.try_node(element)?.node_type() != NodeType::Element {
            return Err(DomError::structural("only elements can be unwrapped"));
        }
        let (parent, index) = self.sibling_position(element)?;
        let children: Vec<NodeId> = self.children(element).collect();
        self.check_insertable(parent, &children, &[element])?;
        let mut moved = Vec::new();
        self.batched(|doc| {
            moved = doc.take_children(element);
            doc.unlink_child(element);
            for (offset, &child) in moved.iter().enumerate() {
                doc.link_child(parent, index + offset, child);
            }
        })?;
        Ok(moved)
    }

    fn require_wrapper(&self, wrapper: NodeId, target: NodeId) -> Result<(), DomError> {
        self.try_node(target)?;
        if self.try_node(wrapper)?.node_type() != NodeType::Element {
            return Err(DomError::structural("only an element can be a wrapper"));
        }
        if wrapper == target {
            return Err(DomError::structural("a node cannot wrap itself"));
        }
        Ok(())
    }
}
