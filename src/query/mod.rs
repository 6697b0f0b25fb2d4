//! Set-at-a-time manipulation.
//!
//! A [`NodeQuery`] borrows the document mutably together with an ordered set
//! of nodes and applies node operations to every member. [`ElementQuery`]
//! is the same over elements only; it derefs to [`NodeQuery`] for the
//! shared operations.
//!
//! Insert operations that target several nodes hand the given nodes
//! themselves to the first target and deep copies to every other target.
//! Each multi-target operation runs as one batch, so observers see the
//! coalesced result.
//!
//! # Examples
//!
//! ```
//! use arbordom::serial::{serialize_with_options, SerializeOptions};
//! use arbordom::Document;
//!
//! let mut doc = Document::parse_str("<list><item/><item/></list>").unwrap();
//! let mark = doc.create_element("mark");
//!
//! let mut items = doc.select("item").unwrap();
//! items.set_attr("seen", "yes").unwrap();
//! items.append(&[mark]).unwrap();
//!
//! let options = SerializeOptions::default().declaration(false);
//! assert_eq!(
//!     serialize_with_options(&doc, &options).unwrap(),
//!     "<list><item seen=\"yes\"><mark/></item><item seen=\"yes\"><mark/></item></list>\n"
//! );
//! ```

pub mod selector;

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

pub use selector::{CompoundSelector, Selector};

use tracing::debug;

use crate::error::DomError;
use crate::name::QualifiedName;
use crate::tree::{Document, NodeId, NodeType};

/// An ordered set of nodes of any kind, bound to its document.
#[derive(Debug)]
pub struct NodeQuery<'d> {
    doc: &'d mut Document,
    nodes: Vec<NodeId>,
}

impl<'d> NodeQuery<'d> {
    /// Wraps `nodes`, dropping stale handles and repeats.
    pub fn new(doc: &'d mut Document, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut seen = HashSet::new();
        let nodes = nodes
            .into_iter()
            .filter(|&n| doc.contains(n) && seen.insert(n))
            .collect();
        Self { doc, nodes }
    }

    /// The document the query operates on.
    #[must_use]
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// The members, in query order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the query has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A query over the first member only.
    pub fn first(&mut self) -> NodeQuery<'_> {
        let first = self.nodes.first().copied();
        NodeQuery::new(self.doc, first)
    }

    /// The members `selector` matches.
    pub fn filter<S: Selector + ?Sized>(&mut self, selector: &S) -> NodeQuery<'_> {
        let kept: Vec<NodeId> = self
            .nodes
            .iter()
            .copied()
            .filter(|&n| selector.matches(self.doc, n))
            .collect();
        NodeQuery::new(self.doc, kept)
    }

    /// The element members.
    pub fn elements(&mut self) -> ElementQuery<'_> {
        let nodes = self.nodes.clone();
        ElementQuery::new(self.doc, nodes)
    }

    /// The elements `selector` selects under any member, in member order and
    /// then document order, without repeats.
    pub fn select<S: Selector + ?Sized>(&mut self, selector: &S) -> ElementQuery<'_> {
        let found: Vec<NodeId> = self
            .nodes
            .iter()
            .flat_map(|&n| selector.select(self.doc, n))
            .collect();
        ElementQuery::new(self.doc, found)
    }

    /// Parses `selector` and selects with it.
    ///
    /// # Errors
    ///
    /// [`DomError::Parse`] for an invalid selector.
    pub fn find(&mut self, selector: &str) -> Result<ElementQuery<'_>, DomError> {
        let selector = CompoundSelector::parse(selector)?;
        Ok(self.select(&selector))
    }

    /// The concatenated text content of the members.
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .map(|&n| self.doc.text_content(n))
            .collect()
    }

    /// Replaces the text content of every member.
    ///
    /// # Errors
    ///
    /// As [`Document::set_text_content`].
    pub fn set_text(&mut self, text: &str) -> Result<&mut Self, DomError> {
        let nodes = self.nodes.clone();
        self.doc.with_batch(|doc| {
            for node in nodes {
                doc.set_text_content(node, text)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// The value of attribute `name` on the first element member that has
    /// it.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find_map(|&n| self.doc.attribute_value(n, name))
    }

    /// Sets attribute `name` on every element member.
    ///
    /// # Errors
    ///
    /// [`DomError::Observer`] if an observer failed.
    pub fn set_attr(
        &mut self,
        name: impl Into<QualifiedName>,
        value: &str,
    ) -> Result<&mut Self, DomError> {
        let name = name.into();
        let elements = self.element_members();
        self.doc.with_batch(|doc| {
            for element in elements {
                doc.set_attribute(element, name.clone(), value)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Removes attribute `name` from every element member.
    ///
    /// # Errors
    ///
    /// [`DomError::Observer`] if an observer failed.
    pub fn remove_attr(&mut self, name: impl Into<QualifiedName>) -> Result<&mut Self, DomError> {
        let name = name.into();
        let elements = self.element_members();
        self.doc.with_batch(|doc| {
            for element in elements {
                doc.remove_attribute(element, name.clone())?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Appends `nodes` to every member.
    ///
    /// # Errors
    ///
    /// Every member is checked before anything moves, so a structural
    /// failure leaves the tree unchanged; see [`Document::append_children`].
    pub fn append(&mut self, nodes: &[NodeId]) -> Result<&mut Self, DomError> {
        let targets = self.nodes.clone();
        distribute(
            self.doc,
            &targets,
            nodes,
            |doc, target, set| doc.check_insert(target, set, &[]),
            |doc, target, set| doc.append_children(target, set),
        )?;
        Ok(self)
    }

    /// Inserts `nodes` before the first child of every member.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn prepend(&mut self, nodes: &[NodeId]) -> Result<&mut Self, DomError> {
        let targets = self.nodes.clone();
        distribute(
            self.doc,
            &targets,
            nodes,
            |doc, target, set| doc.check_insert(target, set, &[]),
            |doc, target, set| doc.insert_children(target, 0, set),
        )?;
        Ok(self)
    }

    /// Inserts `nodes` before every member that has a parent.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn before(&mut self, nodes: &[NodeId]) -> Result<&mut Self, DomError> {
        let targets = self.linked_members();
        distribute(
            self.doc,
            &targets,
            nodes,
            |doc, target, set| doc.check_insert(position(doc, target)?.0, set, &[]),
            |doc, target, set| {
                let (parent, index) = position(doc, target)?;
                doc.insert_children(parent, index, set)
            },
        )?;
        Ok(self)
    }

    /// Inserts `nodes` after every member that has a parent.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn after(&mut self, nodes: &[NodeId]) -> Result<&mut Self, DomError> {
        let targets = self.linked_members();
        distribute(
            self.doc,
            &targets,
            nodes,
            |doc, target, set| doc.check_insert(position(doc, target)?.0, set, &[]),
            |doc, target, set| {
                let (parent, index) = position(doc, target)?;
                doc.insert_children(parent, index + 1, set)
            },
        )?;
        Ok(self)
    }

    /// Puts `nodes` in place of every member that has a parent. The members
    /// end up unlinked.
    ///
    /// # Errors
    ///
    /// See [`append`](Self::append).
    pub fn replace_with(&mut self, nodes: &[NodeId]) -> Result<&mut Self, DomError> {
        let targets = self.linked_members();
        distribute(
            self.doc,
            &targets,
            nodes,
            |doc, target, set| doc.check_insert(position(doc, target)?.0, set, &[target]),
            |doc, target, set| {
                let (parent, index) = position(doc, target)?;
                doc.insert_children(parent, index, set)?;
                doc.remove_node(target)
            },
        )?;
        Ok(self)
    }

    /// Unlinks every member. The query keeps the now detached nodes.
    ///
    /// # Errors
    ///
    /// [`DomError::StructuralConstraint`] if the document node is a member.
    pub fn remove(&mut self) -> Result<&mut Self, DomError> {
        let nodes = self.nodes.clone();
        self.doc.with_batch(|doc| {
            for node in nodes {
                doc.remove_node(node)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Removes the children of every member.
    ///
    /// # Errors
    ///
    /// [`DomError::Observer`] if an observer failed.
    pub fn empty(&mut self) -> Result<&mut Self, DomError> {
        let nodes = self.nodes.clone();
        self.doc.with_batch(|doc| {
            for node in nodes {
                doc.clear_children(node)?;
            }
            Ok(())
        })?;
        Ok(self)
    }

    /// Wraps every member in `wrapper` (the first member) or a deep copy of
    /// it (the others).
    ///
    /// # Errors
    ///
    /// See [`Document::wrap`].
    pub fn wrap(&mut self, wrapper: NodeId) -> Result<&mut Self, DomError> {
        let targets = self.nodes.clone();
        distribute(
            self.doc,
            &targets,
            &[wrapper],
            |doc, target, set| match set.first() {
                Some(&wrapper) => doc.check_wrap(target, wrapper),
                None => Ok(()),
            },
            |doc, target, set| match set.first() {
                Some(&wrapper) => doc.wrap(target, wrapper),
                None => Ok(()),
            },
        )?;
        Ok(self)
    }

    /// Replaces every element member by its children.
    ///
    /// # Errors
    ///
    /// See [`Document::unwrap`].
    pub fn unwrap(&mut self) -> Result<&mut Self, DomError> {
        let elements = self.element_members();
        self.doc.with_batch(|doc| {
            for element in elements {
                if doc.parent(element).is_some() {
                    doc.unwrap(element)?;
                }
            }
            Ok(())
        })?;
        Ok(self)
    }

    fn element_members(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&n| self.doc.node_type(n) == Some(NodeType::Element))
            .collect()
    }

    fn linked_members(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|&n| self.doc.parent(n).is_some())
            .collect()
    }
}

fn position(doc: &Document, node: NodeId) -> Result<(NodeId, usize), DomError> {
    doc.parent(node)
        .zip(doc.index_of(node))
        .ok_or_else(|| DomError::NotFound {
            what: format!("parent of {node:?}"),
        })
}

/// Runs `place` once per target: the first target gets `nodes`, the others
/// get fresh deep copies made before anything moves.
///
/// Every target is validated with `check` before the first placement, so a
/// rejected target leaves the tree as it was. Copies that end up unlinked,
/// whether unused after a failure or emptied fragments, are disposed.
fn distribute<C, P>(
    doc: &mut Document,
    targets: &[NodeId],
    nodes: &[NodeId],
    mut check: C,
    mut place: P,
) -> Result<(), DomError>
where
    C: FnMut(&Document, NodeId, &[NodeId]) -> Result<(), DomError>,
    P: FnMut(&mut Document, NodeId, &[NodeId]) -> Result<(), DomError>,
{
    if targets.is_empty() || nodes.is_empty() {
        return Ok(());
    }
    let mut sets = vec![nodes.to_vec()];
    let mut copies = Vec::new();
    let cloned: Result<(), DomError> = (1..targets.len()).try_for_each(|_| {
        let mut set = Vec::with_capacity(nodes.len());
        for &node in nodes {
            let copy = doc.clone_node(node, true)?;
            copies.push(copy);
            set.push(copy);
        }
        sets.push(set);
        Ok(())
    });
    let result = cloned
        .and_then(|()| {
            targets
                .iter()
                .zip(&sets)
                .try_for_each(|(&target, set)| check(doc, target, set))
        })
        .and_then(|()| {
            doc.with_batch(|doc| {
                for (&target, set) in targets.iter().zip(&sets) {
                    place(doc, target, set)?;
                }
                Ok(())
            })
        });
    for copy in copies {
        if doc.is_unlinked(copy) {
            if let Err(err) = doc.dispose(copy) {
                debug!(?copy, error = %err, "could not dispose unused copy");
            }
        }
    }
    result
}

/// An ordered set of elements, bound to its document.
#[derive(Debug)]
pub struct ElementQuery<'d> {
    inner: NodeQuery<'d>,
}

impl<'d> ElementQuery<'d> {
    /// Wraps the elements among `nodes`.
    pub fn new(doc: &'d mut Document, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let elements: Vec<NodeId> = nodes
            .into_iter()
            .filter(|&n| doc.node_type(n) == Some(NodeType::Element))
            .collect();
        Self {
            inner: NodeQuery::new(doc, elements),
        }
    }

    /// A query over the first element only.
    pub fn first(&mut self) -> ElementQuery<'_> {
        let first = self.inner.nodes.first().copied();
        ElementQuery::new(self.inner.doc, first)
    }

    /// The elements `selector` matches.
    pub fn filter<S: Selector + ?Sized>(&mut self, selector: &S) -> ElementQuery<'_> {
        let kept: Vec<NodeId> = self
            .inner
            .nodes
            .iter()
            .copied()
            .filter(|&n| selector.matches(self.inner.doc, n))
            .collect();
        ElementQuery::new(self.inner.doc, kept)
    }

    /// The element children of every member.
    pub fn children(&mut self) -> ElementQuery<'_> {
        let doc = &*self.inner.doc;
        let children: Vec<NodeId> = self
            .inner
            .nodes
            .iter()
            .flat_map(|&n| doc.children(n))
            .collect();
        ElementQuery::new(self.inner.doc, children)
    }

    /// The parents of the members that are elements.
    pub fn parent(&mut self) -> ElementQuery<'_> {
        let doc = &*self.inner.doc;
        let parents: Vec<NodeId> = self
            .inner
            .nodes
            .iter()
            .filter_map(|&n| doc.parent(n))
            .collect();
        ElementQuery::new(self.inner.doc, parents)
    }

    /// Converts into a query over any nodes.
    #[must_use]
    pub fn into_nodes(self) -> NodeQuery<'d> {
        self.inner
    }
}

impl<'d> Deref for ElementQuery<'d> {
    type Target = NodeQuery<'d>;

    fn deref(&self) -> &NodeQuery<'d> {
        &self.inner
    }
}

impl DerefMut for ElementQuery<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Document {
    /// A query over `nodes`.
    pub fn query(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> NodeQuery<'_> {
        NodeQuery::new(self, nodes)
    }

    /// The elements of the document that match `selector`.
    ///
    /// # Errors
    ///
    /// [`DomError::Parse`] for an invalid selector.
    pub fn select(&mut self, selector: &str) -> Result<ElementQuery<'_>, DomError> {
        let selector = CompoundSelector::parse(selector)?;
        let root = self.root();
        let found = selector.select(self, root);
        Ok(ElementQuery::new(self, found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::Scope;
    use crate::serial::{serialize_with_options, SerializeOptions};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn doc(text: &str) -> Document {
        Document::parse_str(text).unwrap()
    }

    fn xml(doc: &Document) -> String {
        let options = SerializeOptions::default().declaration(false);
        serialize_with_options(doc, &options).unwrap()
    }

    #[test]
    fn test_select_and_text() {
        let mut doc = doc("<r><p>a</p><q><p>b</p></q></r>");
        let mut query = doc.select("p").unwrap();
        assert_eq!(query.len(), 2);
        assert_eq!(query.text(), "ab");
        assert_eq!(query.first().text(), "a");
        let mut q = doc.select("q").unwrap();
        assert_eq!(q.find("p").unwrap().text(), "b");
        assert!(doc.select("p >").is_err());
    }

    #[test]
    fn test_attributes() {
        let mut doc = doc(r#"<r><a x="1"/><b/></r>"#);
        let mut all = doc.select("a, b").unwrap();
        assert_eq!(all.attr("x"), Some("1"));
        all.set_attr("y", "2").unwrap();
        all.remove_attr("x").unwrap();
        assert_eq!(xml(&doc), "<r><a y=\"2\"/><b y=\"2\"/></r>\n");
    }

    #[test]
    fn test_append_clones_for_later_targets() {
        let mut doc = doc("<r><a/><b/><c/></r>");
        let item = doc.create_element("i");
        let text = doc.create_text("t");
        doc.append_child(item, text).unwrap();

        let mut targets = doc.select("a, b, c").unwrap();
        targets.append(&[item]).unwrap();
        let a = targets.nodes()[0];
        assert_eq!(doc.first_child(a), Some(item));
        assert_eq!(
            xml(&doc),
            "<r><a><i>t</i></a><b><i>t</i></b><c><i>t</i></c></r>\n"
        );
    }

    #[test]
    fn test_rejected_target_leaves_tree_untouched() {
        let mut doc = doc("<r/>");
        let r = doc.document_element().unwrap();
        let root = doc.root();
        let text = doc.create_text("hello");
        let unlinked = doc.unlinked_nodes().count();

        let err = doc.query([r, root]).append(&[text]).unwrap_err();
        assert!(matches!(err, DomError::StructuralConstraint { .. }));
        assert_eq!(doc.child_count(r), 0);
        assert!(doc.is_unlinked(text));
        assert_eq!(doc.unlinked_nodes().count(), unlinked);
    }

    #[test]
    fn test_emptied_fragment_copies_are_freed() {
        let mut doc = doc("<r><a/><b/></r>");
        let fragment = doc.parse_fragment("x<i/>").unwrap();
        let unlinked = doc.unlinked_nodes().count();
        doc.select("a, b").unwrap().append(&[fragment]).unwrap();
        assert_eq!(doc.unlinked_nodes().count(), unlinked);
        assert_eq!(xml(&doc), "<r><a>x<i/></a><b>x<i/></b></r>\n");
    }

    #[test]
    fn test_multi_target_insert_is_one_batch() {
        let mut doc = doc("<r><a/><b/></r>");
        let r = doc.document_element().unwrap();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        doc.observe_child_list(r, Scope::TargetAndDescendants, move |_, _| {
            *sink.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
        let x = doc.create_element("x");
        doc.select("a, b").unwrap().append(&[x]).unwrap();
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_prepend_before_after() {
        let mut doc = doc("<r><a><z/></a></r>");
        let p = doc.create_element("p");
        let b = doc.create_element("b");
        let f = doc.create_element("f");
        let mut a = doc.select("a").unwrap();
        a.prepend(&[p]).unwrap();
        a.before(&[b]).unwrap();
        a.after(&[f]).unwrap();
        assert_eq!(xml(&doc), "<r><b/><a><p/><z/></a><f/></r>\n");
    }

    #[test]
    fn test_replace_remove_empty() {
        let mut doc = doc("<r><a>1</a><b>2</b><c>3</c></r>");
        let n = doc.create_element("n");
        doc.select("a, b").unwrap().replace_with(&[n]).unwrap();
        assert_eq!(xml(&doc), "<r><n/><n/><c>3</c></r>\n");

        doc.select("c").unwrap().empty().unwrap();
        assert_eq!(xml(&doc), "<r><n/><n/><c/></r>\n");

        let mut removed = doc.select("n").unwrap();
        removed.remove().unwrap();
        let gone = removed.nodes().to_vec();
        assert!(gone.iter().all(|&n| doc.is_unlinked(n)));
        assert_eq!(xml(&doc), "<r><c/></r>\n");
    }

    #[test]
    fn test_wrap_and_unwrap() {
        let mut doc = doc("<r><a/><b/></r>");
        let w = doc.create_element("w");
        doc.select("a, b").unwrap().wrap(w).unwrap();
        assert_eq!(xml(&doc), "<r><w><a/></w><w><b/></w></r>\n");
        doc.select("w").unwrap().unwrap().unwrap();
        assert_eq!(xml(&doc), "<r><a/><b/></r>\n");
    }

    #[test]
    fn test_filter_and_closures() {
        let mut doc = doc(r#"<r><a k="1"/><a/><b k="2"/></r>"#);
        let mut all = doc.select("*").unwrap();
        let keyed = all.filter(&|doc: &Document, n: NodeId| doc.attribute_value(n, "k").is_some());
        assert_eq!(keyed.len(), 2);

        let r = doc.document_element().unwrap();
        let mut nodes = doc.query([r, r]);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes.elements().children().len(), 3);
    }

    #[test]
    fn test_detached_targets_are_skipped_for_sibling_inserts() {
        let mut doc = Document::new();
        let lone = doc.create_element("lone");
        let x = doc.create_element("x");
        doc.query([lone]).before(&[x]).unwrap();
        assert!(doc.is_unlinked(x));
    }
}
