//! Cloning, importing and structural comparison.
//!
//! Copies carry payload, attributes, children (when deep) and annotations.
//! Annotations that know how to copy themselves are copied, the rest are
//! shared. Observers and indexes never follow a copy.

use super::{Document, NodeId, NodeKind, NodeType, Owner, SiblingStore};
use crate::annotation::Annotations;
use crate::config::ChildStorage;
use crate::error::DomError;

/// One node of a copy plan, in pre-order.
struct Planned {
    kind: NodeKind,
    annotations: Annotations,
    parent: Option<usize>,
    is_attribute: bool,
}

impl Document {
    /// Copies `id` within this document. The copy starts unlinked.
    ///
    /// # Errors
    ///
    /// [`DomError::StructuralConstraint`] for the document node,
    /// [`DomError::StaleNode`] for a stale handle.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let plan = self.plan_copy(id, deep, self.options().child_storage)?;
        Ok(self.materialize(plan))
    }

    /// Copies `id` from `source` into this document. The copy starts
    /// unlinked and uses this document's child storage.
    ///
    /// # Errors
    ///
    /// As [`clone_node`](Self::clone_node).
    pub fn import_node(&mut self, source: &Document, id: NodeId, deep: bool) -> Result<NodeId, DomError> {
        let plan = source.plan_copy(id, deep, self.options().child_storage)?;
        Ok(self.materialize(plan))
    }

    /// Copies the whole document, including the XML declaration fields and
    /// options. Observers are not copied.
    ///
    /// # Errors
    ///
    /// [`DomError::StaleNode`] if a top-level node cannot be copied, which
    /// means the arena is inconsistent.
    pub fn duplicate(&self) -> Result<Document, DomError> {
        let mut copy = Document::with_options(*self.options());
        copy.version.clone_from(&self.version);
        copy.encoding.clone_from(&self.encoding);
        copy.standalone = self.standalone;
        let root = copy.root();
        for child in self.children(self.root()) {
            let plan = self.plan_copy(child, true, copy.options().child_storage)?;
            let node = copy.materialize(plan);
            if let Some(list) = copy.child_list_mut(root) {
                let end = list.len();
                list.insert(end, node);
            }
            copy.set_owner(node, Owner::Children(root));
        }
        Ok(copy)
    }

    fn plan_copy(
        &self,
        id: NodeId,
        deep: bool,
        storage: ChildStorage,
    ) -> Result<Vec<Planned>, DomError> {
        let data = self.try_node(id)?;
        if data.node_type() == NodeType::Document {
            return Err(DomError::structural("the document node cannot be copied"));
        }
        let mut plan = Vec::new();
        let mut stack = vec![(id, None, false)];
        while let Some((current, parent, is_attribute)) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            let index = plan.len();
            plan.push(Planned {
                kind: node.kind.shallow_copy(storage),
                annotations: node.annotations.clone_for_copy(),
                parent,
                is_attribute,
            });
            let children: Vec<NodeId> = if deep {
                self.children(current).collect()
            } else {
                Vec::new()
            };
            // Reverse so the stack pops children in document order; the
            // attributes go on top so they are planned first.
            for &child in children.iter().rev() {
                stack.push((child, Some(index), false));
            }
            let attributes: Vec<NodeId> = self.attributes(current).collect();
            for &attribute in attributes.iter().rev() {
                stack.push((attribute, Some(index), true));
            }
        }
        Ok(plan)
    }

    fn materialize(&mut self, plan: Vec<Planned>) -> NodeId {
        let mut ids: Vec<NodeId> = Vec::with_capacity(plan.len());
        for planned in plan {
            let name = match &planned.kind {
                NodeKind::Attribute { name, .. } => Some(name.clone()),
                _ => None,
            };
            let id = self.alloc_kind(planned.kind);
            if let Some(node) = self.node_mut(id) {
                node.annotations = planned.annotations;
            }
            if let Some(parent) = planned.parent.and_then(|p| ids.get(p).copied()) {
                if planned.is_attribute {
                    if let (Some(list), Some(name)) =
                        (self.node_mut(parent).and_then(|n| n.kind.attributes_mut()), name)
                    {
                        list.insert(usize::MAX, id, name);
                    }
                    self.set_owner(id, Owner::Attributes(parent));
                } else {
                    if let Some(list) = self.child_list_mut(parent) {
                        let end = list.len();
                        list.insert(end, id);
                    }
                    self.set_owner(id, Owner::Children(parent));
                }
            }
            ids.push(id);
        }
        ids[0]
    }

    /// Compares the subtree at `a` with the subtree at `b` in `other`:
    /// kinds, names, data, attributes (order-insensitive) and children (in
    /// order). Annotations are ignored.
    #[must_use]
    pub fn structurally_equal(&self, a: NodeId, other: &Document, b: NodeId) -> bool {
        let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
            return false;
        };
        if !payload_equal(&left.kind, &right.kind) {
            return false;
        }
        if self.attribute_count(a) != other.attribute_count(b) {
            return false;
        }
        let attributes_match = self.attributes(a).all(|attr| {
            let Some(name) = self.element_name(attr) else {
                return false;
            };
            other
                .attribute_node(b, name)
                .is_some_and(|twin| self.node_text(attr) == other.node_text(twin))
        });
        if !attributes_match || self.child_count(a) != other.child_count(b) {
            return false;
        }
        self.children(a)
            .zip(other.children(b))
            .all(|(x, y)| self.structurally_equal(x, other, y))
    }
}

fn payload_equal(left: &NodeKind, right: &NodeKind) -> bool {
    match (left, right) {
        (NodeKind::Document { .. }, NodeKind::Document { .. })
        | (NodeKind::DocumentFragment { .. }, NodeKind::DocumentFragment { .. }) => true,
        (NodeKind::Element { name: x, .. }, NodeKind::Element { name: y, .. }) => x == y,
        (
            NodeKind::Attribute { name: x, value: v },
            NodeKind::Attribute { name: y, value: w },
        ) => x == y && v == w,
        (NodeKind::Text { content: x }, NodeKind::Text { content: y })
        | (NodeKind::CData { content: x }, NodeKind::CData { content: y })
        | (NodeKind::Comment { content: x }, NodeKind::Comment { content: y }) => x == y,
        (
            NodeKind::ProcessingInstruction { target: t, data: d },
            NodeKind::ProcessingInstruction { target: u, data: e },
        ) => t == u && d == e,
        (
            NodeKind::DocumentType {
                name: n,
                public_id: p,
                system_id: s,
                ..
            },
            NodeKind::DocumentType {
                name: m,
                public_id: q,
                system_id: t,
                ..
            },
        )
        | (
            NodeKind::Notation {
                name: n,
                public_id: p,
                system_id: s,
            },
            NodeKind::Notation {
                name: m,
                public_id: q,
                system_id: t,
            },
        ) => n == m && p == q && s == t,
        (
            NodeKind::Entity {
                name: n,
                public_id: p,
                system_id: s,
                notation: o,
                value: v,
            },
            NodeKind::Entity {
                name: m,
                public_id: q,
                system_id: t,
                notation: r,
                value: w,
            },
        ) => n == m && p == q && s == t && o == r && v == w,
        (NodeKind::EntityReference { name: x }, NodeKind::EntityReference { name: y }) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, BaseUri};
    use crate::config::DocumentOptions;
    use crate::observer::Scope;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Tag(u32);
    impl Annotation for Tag {
        fn clone_annotation(&self) -> Option<Arc<dyn Annotation>> {
            Some(Arc::new(self.clone()))
        }
    }

    fn sample(doc: &mut Document) -> NodeId {
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let t = doc.create_text("hi");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(b, t).unwrap();
        doc.set_attribute(a, "id", "x").unwrap();
        doc.set_attribute(b, "class", "k").unwrap();
        a
    }

    #[test]
    fn test_deep_clone_is_equal_and_unlinked() {
        let mut doc = Document::new();
        let a = sample(&mut doc);
        doc.annotations_mut(a).unwrap().add(Tag(7));
        doc.annotations_mut(a).unwrap().add(BaseUri("http://x/".to_string()));

        let copy = doc.clone_node(a, true).unwrap();
        assert_ne!(copy, a);
        assert!(doc.is_unlinked(copy));
        assert!(doc.structurally_equal(a, &doc, copy));
        assert_eq!(doc.node(copy).annotations.get::<Tag>(), Some(&Tag(7)));
        assert_eq!(doc.node(copy).annotations.len(), 2);

        let first = doc.first_child(copy).unwrap();
        assert_eq!(doc.parent(first), Some(copy));
        assert_eq!(doc.attribute_value(first, "class"), Some("k"));
    }

    #[test]
    fn test_shallow_clone_keeps_attributes_only() {
        let mut doc = Document::new();
        let a = sample(&mut doc);
        let copy = doc.clone_node(a, false).unwrap();
        assert_eq!(doc.child_count(copy), 0);
        assert_eq!(doc.attribute_value(copy, "id"), Some("x"));
        assert!(!doc.structurally_equal(a, &doc, copy));
    }

    #[test]
    fn test_clone_does_not_carry_observers() {
        let mut doc = Document::new();
        let a = sample(&mut doc);
        doc.observe(a, Scope::Target, |_, _| Err(DomError::ReadOnly))
            .unwrap();
        let copy = doc.clone_node(a, true).unwrap();
        doc.set_attribute(copy, "id", "y").unwrap();
    }

    #[test]
    fn test_import_across_storage_strategies() {
        let mut source = Document::new();
        let a = sample(&mut source);
        let mut target =
            Document::with_options(DocumentOptions::default().child_storage(ChildStorage::Linked));
        let imported = target.import_node(&source, a, true).unwrap();
        assert!(target.structurally_equal(imported, &source, a));
        assert!(target.clone_node(target.root(), true).is_err());
    }

    #[test]
    fn test_duplicate_document() {
        let mut doc = Document::new();
        doc.version = Some("1.0".to_string());
        sample(&mut doc);
        let copy = doc.duplicate().unwrap();
        assert!(copy.structurally_equal(copy.root(), &doc, doc.root()));
        assert_eq!(copy.version.as_deref(), Some("1.0"));
        assert_eq!(copy.unlinked_nodes().count(), 0);
    }

    #[test]
    fn test_attribute_order_is_ignored() {
        let mut doc = Document::new();
        let x = doc.create_element("e");
        let y = doc.create_element("e");
        doc.set_attribute(x, "a", "1").unwrap();
        doc.set_attribute(x, "b", "2").unwrap();
        doc.set_attribute(y, "b", "2").unwrap();
        doc.set_attribute(y, "a", "1").unwrap();
        assert!(doc.structurally_equal(x, &doc, y));
        doc.set_attribute(y, "a", "3").unwrap();
        assert!(!doc.structurally_equal(x, &doc, y));
    }
}
