//! Arena-based document tree.
//!
//! All nodes live in a `Vec` of slots owned by the [`Document`] and are
//! referenced by [`NodeId`]: a slot index plus a generation counter. Freeing a
//! node (see [`Document::dispose`]) bumps the slot's generation, so an old
//! `NodeId` that outlives its node is detected instead of silently aliasing
//! whatever reuses the slot.
//!
//! # Linkage
//!
//! Every node except the document node has exactly one owner at a time:
//!
//! - a container's child collection,
//! - an element's attribute collection,
//! - or the document's unlinked bucket.
//!
//! Freshly created nodes start in the unlinked bucket. Inserting a node that
//! is linked somewhere else moves it. Removing a node puts it back in the
//! bucket; it stays allocated and can be inserted again. The owner recorded
//! on the node is the single source of truth for its parent, its sibling
//! position and whether it is part of the tree.
//!
//! Structural changes go through the mutation layer (`mutation.rs`,
//! `attrs.rs`), which validates first, then mutates, then reports the change
//! to the batch layer and the observer registry.

mod attributes;
mod attrs;
mod children;
mod copy;
mod mutation;
mod namespace;
mod node;
mod text;

pub use attributes::AttributeList;
pub use children::{
    ArrayChildren, ChildIter, ChildList, LinkedChildren, LinkedIter, SiblingStore,
};
pub(crate) use namespace::declared_prefix;
pub use node::{NodeKind, NodeType};

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::num::NonZeroU32;

use tracing::trace;

use crate::annotation::{Annotations, NameContext};
use crate::batch::BatchStack;
use crate::config::DocumentOptions;
use crate::error::DomError;
use crate::name::QualifiedName;
use crate::observer::{ObserverRegistry, Queued};

/// A generation-checked handle to a node in a [`Document`].
///
/// `NodeId`s are cheap to copy and compare. Ordering follows allocation
/// order of slots, not document order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: NonZeroU32,
    generation: u32,
}

impl NodeId {
    /// # Panics
    ///
    /// Panics if `index` is 0 or does not fit in a `u32`.
    #[allow(clippy::expect_used)]
    fn new(index: usize, generation: u32) -> Self {
        let raw = u32::try_from(index).expect("node arena exceeds u32 slots");
        Self {
            index: NonZeroU32::new(raw).expect("NodeId index must be non-zero"),
            generation,
        }
    }

    fn as_index(self) -> usize {
        self.index.get() as usize
    }

    /// The arena slot this handle points at.
    #[must_use]
    pub fn slot(self) -> u32 {
        self.index.get()
    }

    /// The generation of the slot when this handle was issued.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn for_test(index: u32) -> Self {
        Self::new(index as usize, 0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// Where a node is currently linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    /// Member of this container's child collection.
    Children(NodeId),
    /// Member of this element's attribute collection.
    Attributes(NodeId),
    /// In the document's unlinked bucket.
    Unlinked,
}

/// Storage for a single node in the document arena.
///
/// Access individual nodes via [`Document::node`].
#[derive(Debug)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Side-channel values attached to the node.
    pub annotations: Annotations,
    /// `None` only for the document node.
    pub(crate) owner: Option<Owner>,
}

impl NodeData {
    /// The fieldless kind tag.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena and provides methods for
/// navigation (`&self`) and mutation (`&mut self`).
///
/// # Examples
///
/// ```
/// use arbordom::Document;
///
/// let mut doc = Document::new();
/// let root = doc.create_element("root");
/// doc.append_child(doc.root(), root).unwrap();
/// doc.set_attribute(root, "id", "r1").unwrap();
/// assert_eq!(doc.document_element(), Some(root));
/// assert_eq!(doc.attribute_value(root, "id"), Some("r1"));
/// ```
pub struct Document {
    /// Index 0 is a placeholder so slot indices fit `NonZeroU32`.
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
    root: NodeId,
    unlinked: BTreeSet<NodeId>,
    options: DocumentOptions,
    /// XML version from the XML declaration (e.g., "1.0").
    pub version: Option<String>,
    /// Encoding from the XML declaration (e.g., "UTF-8").
    pub encoding: Option<String>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<bool>,
    pub(crate) batches: BatchStack,
    pub(crate) observers: ObserverRegistry,
    pub(crate) queue: VecDeque<Queued>,
    pub(crate) dispatching: bool,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.live)
            .field("unlinked", &self.unlinked.len())
            .field("options", &self.options)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Creates a new empty document with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Creates a new empty document.
    ///
    /// The document contains a single Document node.
    #[must_use]
    pub fn with_options(options: DocumentOptions) -> Self {
        let mut slots = Vec::with_capacity(64);
        slots.push(Slot {
            generation: 0,
            data: None,
        });
        slots.push(Slot {
            generation: 0,
            data: Some(NodeData {
                kind: NodeKind::Document {
                    children: ChildList::new(options.child_storage),
                },
                annotations: Annotations::new(),
                owner: None,
            }),
        });
        Self {
            slots,
            free: Vec::new(),
            live: 1,
            root: NodeId::new(1, 0),
            unlinked: BTreeSet::new(),
            options,
            version: None,
            encoding: None,
            standalone: None,
            batches: BatchStack::default(),
            observers: ObserverRegistry::default(),
            queue: VecDeque::new(),
            dispatching: false,
        }
    }

    /// The options this document was created with.
    #[must_use]
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the document element (the single top-level element).
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node_type(id) == Some(NodeType::Element))
    }

    /// Returns the top-level document type node, if any.
    #[must_use]
    pub fn doctype(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node_type(id) == Some(NodeType::DocumentType))
    }

    // --- Arena access ---

    /// Returns `true` if `id` refers to a live node of this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the node data, or `None` for a stale handle.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.as_index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_ref()
    }

    /// Returns the node data.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `id` was disposed or belongs to a
    /// different document.
    pub fn try_node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.get(id).ok_or(DomError::StaleNode)
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale. Use [`get`](Self::get) or
    /// [`try_node`](Self::try_node) when that is possible.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        match self.get(id) {
            Some(data) => data,
            None => panic!("stale node handle {id:?}"),
        }
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.as_index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Mutable access to a node's annotations.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] for a stale handle.
    pub fn annotations_mut(&mut self, id: NodeId) -> Result<&mut Annotations, DomError> {
        self.node_mut(id)
            .map(|n| &mut n.annotations)
            .ok_or(DomError::StaleNode)
    }

    /// The kind tag of a node.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(NodeData::node_type)
    }

    /// The node name: qualified name for elements and attributes, a
    /// synthesized `#text`-style name otherwise.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<QualifiedName> {
        self.get(id).map(|n| n.kind.name())
    }

    /// The qualified name of an element or attribute.
    #[must_use]
    pub fn element_name(&self, id: NodeId) -> Option<&QualifiedName> {
        match &self.get(id)?.kind {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Character data of a text, CDATA, comment or attribute node; PI data.
    ///
    /// For containers, use [`text_content`](Self::text_content).
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.kind.text()
    }

    /// Number of live nodes, including the document node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.live
    }

    // --- Ownership ---

    pub(crate) fn owner(&self, id: NodeId) -> Option<Owner> {
        self.get(id)?.owner
    }

    pub(crate) fn set_owner(&mut self, id: NodeId, owner: Owner) {
        if owner == Owner::Unlinked {
            self.unlinked.insert(id);
        } else {
            self.unlinked.remove(&id);
        }
        if let Some(node) = self.node_mut(id) {
            node.owner = Some(owner);
        }
    }

    /// Returns `true` if the node is in the unlinked bucket.
    #[must_use]
    pub fn is_unlinked(&self, id: NodeId) -> bool {
        self.owner(id) == Some(Owner::Unlinked)
    }

    /// The roots of all subtrees currently not linked into anything.
    pub fn unlinked_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.unlinked.iter().copied()
    }

    /// Returns `true` if the node is reachable from the document node.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.owner(current) {
                Some(Owner::Children(p) | Owner::Attributes(p)) => current = p,
                _ => return false,
            }
        }
    }

    // --- Navigation ---

    /// Returns the parent of a node. Attributes have no parent; see
    /// [`owner_element`](Self::owner_element).
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        match self.owner(id)? {
            Owner::Children(parent) => Some(parent),
            _ => None,
        }
    }

    /// Returns the element an attribute belongs to.
    #[must_use]
    pub fn owner_element(&self, id: NodeId) -> Option<NodeId> {
        match self.owner(id)? {
            Owner::Attributes(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn child_list(&self, id: NodeId) -> Option<&ChildList> {
        self.get(id)?.kind.children()
    }

    pub(crate) fn child_list_mut(&mut self, id: NodeId) -> Option<&mut ChildList> {
        self.node_mut(id)?.kind.children_mut()
    }

    /// Returns an iterator over the children of a node.
    ///
    /// Non-containers and stale handles yield nothing.
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        self.child_list(id).map_or(ChildIter::Empty, ChildList::iter)
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.child_list(id).map_or(0, |c| c.len())
    }

    /// The child at `index`.
    #[must_use]
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.child_list(parent)?.get(index)
    }

    /// The position of `id` among its siblings (or among its element's
    /// attributes, for an attribute node).
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        match self.owner(id)? {
            Owner::Children(parent) => self.child_list(parent)?.position(id),
            Owner::Attributes(element) => self.attribute_list(element)?.position(id),
            Owner::Unlinked => None,
        }
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.child_list(id)?.first()
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.child_list(id)?.last()
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.child_list(self.parent(id)?)?.previous(id)
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.child_list(self.parent(id)?)?.next(id)
    }

    /// Returns an iterator over a node and its ancestors (walking up to the
    /// document node). An attribute's ancestors continue through its element.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first,
    /// document order). Attributes are not included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            first: None,
            stack: vec![self.children(id)],
        }
    }

    /// Like [`descendants`](Self::descendants) but starting with `id` itself.
    pub fn descendants_and_self(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            first: self.contains(id).then_some(id),
            stack: Vec::new(),
        }
    }

    // --- Factories ---

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            annotations: Annotations::new(),
            owner: Some(Owner::Unlinked),
        };
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.data = Some(data);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                data: Some(data),
            });
            NodeId::new(index, 0)
        };
        self.live += 1;
        self.unlinked.insert(id);
        id
    }

    fn new_children(&self) -> ChildList {
        ChildList::new(self.options.child_storage)
    }

    /// Creates an unlinked element.
    ///
    /// The element uses the document's default name context.
    pub fn create_element(&mut self, name: impl Into<QualifiedName>) -> NodeId {
        let context = self.options.name_context;
        let children = self.new_children();
        let id = self.alloc(NodeKind::Element {
            name: name.into(),
            attributes: AttributeList::new(context.comparer()),
            children,
        });
        if context != NameContext::Xml {
            if let Some(node) = self.node_mut(id) {
                node.annotations.add(context);
            }
        }
        id
    }

    /// Creates an unlinked attribute.
    pub fn create_attribute(
        &mut self,
        name: impl Into<QualifiedName>,
        value: impl Into<String>,
    ) -> NodeId {
        self.alloc(NodeKind::Attribute {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Creates an unlinked text node.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text {
            content: content.into(),
        })
    }

    /// Creates an unlinked CDATA section.
    pub fn create_cdata(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::CData {
            content: content.into(),
        })
    }

    /// Creates an unlinked comment.
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment {
            content: content.into(),
        })
    }

    /// Creates an unlinked processing instruction.
    pub fn create_processing_instruction(
        &mut self,
        target: impl Into<String>,
        data: Option<&str>,
    ) -> NodeId {
        self.alloc(NodeKind::ProcessingInstruction {
            target: target.into(),
            data: data.map(str::to_string),
        })
    }

    /// Creates an empty document fragment.
    pub fn create_document_fragment(&mut self) -> NodeId {
        let children = self.new_children();
        self.alloc(NodeKind::DocumentFragment { children })
    }

    /// Creates an unlinked document type node.
    pub fn create_document_type(
        &mut self,
        name: impl Into<String>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> NodeId {
        let children = self.new_children();
        self.alloc(NodeKind::DocumentType {
            name: name.into(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
            children,
        })
    }

    /// Creates an internal entity declaration with replacement text `value`.
    pub fn create_entity(&mut self, name: impl Into<String>, value: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Entity {
            name: name.into(),
            public_id: None,
            system_id: None,
            notation: None,
            value: Some(value.into()),
        })
    }

    /// Creates an external entity declaration.
    pub fn create_external_entity(
        &mut self,
        name: impl Into<String>,
        public_id: Option<&str>,
        system_id: &str,
        notation: Option<&str>,
    ) -> NodeId {
        self.alloc(NodeKind::Entity {
            name: name.into(),
            public_id: public_id.map(str::to_string),
            system_id: Some(system_id.to_string()),
            notation: notation.map(str::to_string),
            value: None,
        })
    }

    /// Creates an unexpanded entity reference.
    pub fn create_entity_reference(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::EntityReference { name: name.into() })
    }

    /// Creates a notation declaration.
    pub fn create_notation(
        &mut self,
        name: impl Into<String>,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> NodeId {
        self.alloc(NodeKind::Notation {
            name: name.into(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        })
    }

    pub(crate) fn alloc_kind(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind)
    }

    // --- Freeing ---

    /// Frees an unlinked node together with its subtree and attributes.
    ///
    /// Handles to freed nodes become stale.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StructuralConstraint`] if the node is linked (or
    /// is the document node), and [`DomError::StaleNode`] for a stale handle.
    pub fn dispose(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.try_node(id)?.owner != Some(Owner::Unlinked) {
            return Err(DomError::structural(
                "only unlinked nodes can be disposed; remove it first",
            ));
        }
        self.unlinked.remove(&id);
        let mut pending = vec![id];
        let mut freed = 0usize;
        while let Some(current) = pending.pop() {
            let slot_index = current.as_index();
            let Some(slot) = self.slots.get_mut(slot_index) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            let Some(data) = slot.data.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(slot_index);
            freed += 1;
            if let Some(children) = data.kind.children() {
                pending.extend(children.iter());
            }
            if let Some(attributes) = data.kind.attributes() {
                pending.extend(attributes.ids());
            }
        }
        self.live -= freed;
        trace!(node = ?id, freed, "disposed subtree");
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = match self.doc.owner(current) {
            Some(Owner::Children(p) | Owner::Attributes(p)) => Some(p),
            _ => None,
        };
        Some(current)
    }
}

/// Depth-first iterator over descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    first: Option<NodeId>,
    stack: Vec<ChildIter<'a>>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(first) = self.first.take() {
            self.stack.push(self.doc.children(first));
            return Some(first);
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(child) => {
                    self.stack.push(self.doc.children(child));
                    return Some(child);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChildStorage;

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new();
        assert_eq!(doc.node_type(doc.root()), Some(NodeType::Document));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.document_element(), None);
        assert_eq!(doc.parent(doc.root()), None);
    }

    #[test]
    fn test_created_nodes_start_unlinked() {
        let mut doc = Document::new();
        let elem = doc.create_element("a");
        let text = doc.create_text("hi");
        assert!(doc.is_unlinked(elem));
        assert!(doc.is_unlinked(text));
        assert_eq!(doc.unlinked_nodes().count(), 2);
        assert!(!doc.is_connected(elem));
    }

    #[test]
    fn test_descendants_document_order() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        let d = doc.create_element("d");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(b, c).unwrap();
        doc.append_child(a, d).unwrap();

        let order: Vec<_> = doc.descendants(doc.root()).collect();
        assert_eq!(order, vec![a, b, c, d]);
        let with_self: Vec<_> = doc.descendants_and_self(b).collect();
        assert_eq!(with_self, vec![b, c]);
        let up: Vec<_> = doc.ancestors(c).collect();
        assert_eq!(up, vec![c, b, a, doc.root()]);
    }

    #[test]
    fn test_dispose_makes_handles_stale() {
        let mut doc = Document::with_options(
            DocumentOptions::default().child_storage(ChildStorage::Linked),
        );
        let a = doc.create_element("a");
        let t = doc.create_text("x");
        doc.append_child(a, t).unwrap();
        assert_eq!(doc.node_count(), 3);

        doc.dispose(a).unwrap();
        assert!(!doc.contains(a));
        assert!(!doc.contains(t));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.try_node(a).unwrap_err(), DomError::StaleNode);

        let reused = doc.create_comment("again");
        assert!(reused.slot() == a.slot() || reused.slot() == t.slot());
        assert_ne!(reused, a);
        assert_ne!(reused, t);
    }

    #[test]
    fn test_dispose_rejects_linked_nodes() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        doc.append_child(doc.root(), a).unwrap();
        assert!(matches!(
            doc.dispose(a),
            Err(DomError::StructuralConstraint { .. })
        ));
        assert!(doc.dispose(doc.root()).is_err());
    }
}
