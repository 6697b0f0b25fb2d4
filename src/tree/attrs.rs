//! Attribute access and mutation on [`Document`].
//!
//! Two policies coexist on purpose:
//!
//! - [`Document::add_attribute_node`] is the raw form and fails with
//!   [`DomError::DuplicateKey`] when the name is taken.
//! - Every other setter overwrites by name: a colliding attribute elsewhere
//!   in the list is removed first and the target index is adjusted.
//!
//! Each add, remove, overwrite or value change produces one
//! [`AttributeChange`] after the collection has been updated.

use tracing::warn;

use super::{AttributeList, Document, NodeId, NodeKind, Owner};
use crate::annotation::NameContext;
use crate::error::DomError;
use crate::name::{NameComparer, QualifiedName};
use crate::observer::AttributeChange;
use crate::value::FromAttributeText;

impl Document {
    pub(crate) fn attribute_list(&self, element: NodeId) -> Option<&AttributeList> {
        self.get(element)?.kind.attributes()
    }

    fn attribute_list_mut(&mut self, element: NodeId) -> Option<&mut AttributeList> {
        self.node_mut(element)?.kind.attributes_mut()
    }

    fn require_element(&self, element: NodeId) -> Result<(), DomError> {
        match self.try_node(element)?.kind {
            NodeKind::Element { .. } => Ok(()),
            ref other => Err(DomError::structural(format!(
                "a {} cannot hold attributes",
                other.node_type()
            ))),
        }
    }

    fn require_attribute(&self, attribute: NodeId) -> Result<QualifiedName, DomError> {
        match &self.try_node(attribute)?.kind {
            NodeKind::Attribute { name, .. } => Ok(name.clone()),
            other => Err(DomError::structural(format!(
                "a {} cannot be used as an attribute",
                other.node_type()
            ))),
        }
    }

    fn attribute_text(&self, attribute: NodeId) -> Option<String> {
        match &self.get(attribute)?.kind {
            NodeKind::Attribute { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    fn attribute_change(
        &self,
        element: NodeId,
        attribute: NodeId,
        old_value: Option<String>,
    ) -> AttributeChange {
        AttributeChange {
            element,
            attribute,
            name: self
                .element_name(attribute)
                .cloned()
                .unwrap_or_else(|| QualifiedName::new("#attribute")),
            old_value,
        }
    }

    // --- Queries ---

    /// Iterates over the attribute nodes of an element, in order.
    pub fn attributes(&self, element: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.attribute_list(element)
            .into_iter()
            .flat_map(|l| l.ids())
    }

    /// Number of attributes on an element.
    #[must_use]
    pub fn attribute_count(&self, element: NodeId) -> usize {
        self.attribute_list(element).map_or(0, AttributeList::len)
    }

    /// The attribute node at `index`.
    #[must_use]
    pub fn attribute_node_at(&self, element: NodeId, index: usize) -> Option<NodeId> {
        self.attribute_list(element)?.get(index)
    }

    /// The attribute node named `name`, compared with the element's comparer.
    #[must_use]
    pub fn attribute_node(&self, element: NodeId, name: &QualifiedName) -> Option<NodeId> {
        let list = self.attribute_list(element)?;
        list.get(list.position_of_name(name)?)
    }

    /// The value of the no-namespace attribute with local name `local`.
    #[must_use]
    pub fn attribute_value(&self, element: NodeId, local: &str) -> Option<&str> {
        let list = self.attribute_list(element)?;
        self.node_text(list.get(list.position_of_local(local)?)?)
    }

    /// The value of the attribute named `name`.
    #[must_use]
    pub fn attribute_value_ns(&self, element: NodeId, name: &QualifiedName) -> Option<&str> {
        self.node_text(self.attribute_node(element, name)?)
    }

    /// Returns `true` if the element has a no-namespace attribute `local`.
    #[must_use]
    pub fn has_attribute(&self, element: NodeId, local: &str) -> bool {
        self.attribute_value(element, local).is_some()
    }

    /// Parses the value of attribute `local` as `T`.
    ///
    /// Returns `Ok(None)` when the attribute is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Parse`] if the text is not a valid `T`.
    pub fn attribute_value_as<T: FromAttributeText>(
        &self,
        element: NodeId,
        local: &str,
    ) -> Result<Option<T>, DomError> {
        self.attribute_value(element, local)
            .map(T::from_attribute_text)
            .transpose()
    }

    /// The comparer the element's attribute list uses.
    #[must_use]
    pub fn attribute_comparer(&self, element: NodeId) -> NameComparer {
        self.attribute_list(element)
            .map_or(NameComparer::Ordinal, AttributeList::comparer)
    }

    // --- Internal linkage ---

    fn unlink_attribute_at(&mut self, element: NodeId, index: usize) -> Option<NodeId> {
        let removed = self.attribute_list_mut(element)?.remove_at(index)?;
        self.set_owner(removed, Owner::Unlinked);
        Some(removed)
    }

    /// Takes `attribute` out of whatever element holds it, reporting the
    /// removal. Does nothing for unlinked attributes.
    fn detach_attribute(&mut self, attribute: NodeId) {
        let Some(Owner::Attributes(element)) = self.owner(attribute) else {
            return;
        };
        let Some(index) = self.attribute_list(element).and_then(|l| l.position(attribute)) else {
            return;
        };
        self.unlink_attribute_at(element, index);
        let change = self.attribute_change(element, attribute, self.attribute_text(attribute));
        self.record_attribute_change(change);
    }

    // --- Mutation ---

    /// Sets attribute `name` to `value`, creating the attribute node if the
    /// element has none by that name. Returns the attribute node.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StructuralConstraint`] if `element` is not an
    /// element, or [`DomError::Observer`] if an observer failed (the value
    /// is set regardless).
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        name: impl Into<QualifiedName>,
        value: impl Into<String>,
    ) -> Result<NodeId, DomError> {
        self.require_element(element)?;
        let name = name.into();
        let value = value.into();
        let existing = self.attribute_node(element, &name);
        let attribute = if let Some(attribute) = existing {
            let old = self.replace_attribute_text(attribute, value);
            let change = self.attribute_change(element, attribute, old);
            self.record_attribute_change(change);
            attribute
        } else {
            let attribute = self.create_attribute(name.clone(), value);
            if let Some(list) = self.attribute_list_mut(element) {
                list.insert(usize::MAX, attribute, name);
            }
            self.set_owner(attribute, Owner::Attributes(element));
            let change = self.attribute_change(element, attribute, None);
            self.record_attribute_change(change);
            attribute
        };
        self.deliver()?;
        Ok(attribute)
    }

    fn replace_attribute_text(&mut self, attribute: NodeId, value: String) -> Option<String> {
        match &mut self.node_mut(attribute)?.kind {
            NodeKind::Attribute { value: current, .. } => Some(std::mem::replace(current, value)),
            _ => None,
        }
    }

    /// Changes the value of an attribute node.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StructuralConstraint`] if `attribute` is not an
    /// attribute, or [`DomError::Observer`].
    pub fn set_attribute_value(
        &mut self,
        attribute: NodeId,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.require_attribute(attribute)?;
        let old = self.replace_attribute_text(attribute, value.into());
        if let Some(element) = self.owner_element(attribute) {
            let change = self.attribute_change(element, attribute, old);
            self.record_attribute_change(change);
        }
        self.deliver()
    }

    /// Appends an attribute node, failing if the name is already taken.
    ///
    /// A node linked to another element is moved. Re-adding an attribute
    /// the element already holds does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::DuplicateKey`] on a name collision; nothing is
    /// changed in that case.
    pub fn add_attribute_node(&mut self, element: NodeId, attribute: NodeId) -> Result<(), DomError> {
        self.require_element(element)?;
        let name = self.require_attribute(attribute)?;
        if self.owner(attribute) == Some(Owner::Attributes(element)) {
            return Ok(());
        }
        if self.attribute_node(element, &name).is_some() {
            return Err(DomError::DuplicateKey {
                name: name.qualified(),
            });
        }
        self.detach_attribute(attribute);
        if let Some(list) = self.attribute_list_mut(element) {
            list.try_push(attribute, name)?;
        }
        self.set_owner(attribute, Owner::Attributes(element));
        let change = self.attribute_change(element, attribute, None);
        self.record_attribute_change(change);
        self.deliver()
    }

    /// Adds `attribute`, replacing the attribute of the same name in place.
    /// Returns the replaced attribute, now unlinked.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StructuralConstraint`] for non-element targets or
    /// non-attribute nodes, or [`DomError::Observer`].
    pub fn set_attribute_node(
        &mut self,
        element: NodeId,
        attribute: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        self.require_element(element)?;
        let name = self.require_attribute(attribute)?;
        if self.owner(attribute) == Some(Owner::Attributes(element)) {
            return Ok(None);
        }
        self.detach_attribute(attribute);
        let collision = self
            .attribute_list(element)
            .and_then(|l| l.position_of_name(&name));
        let replaced = match collision {
            Some(index) => {
                let old = self
                    .attribute_list_mut(element)
                    .and_then(|l| l.replace_at(index, attribute, name));
                if let Some(old) = old {
                    self.set_owner(old, Owner::Unlinked);
                }
                old
            }
            None => {
                if let Some(list) = self.attribute_list_mut(element) {
                    list.insert(usize::MAX, attribute, name);
                }
                None
            }
        };
        self.set_owner(attribute, Owner::Attributes(element));
        let old_value = replaced.and_then(|old| self.attribute_text(old));
        let change = self.attribute_change(element, attribute, old_value);
        self.record_attribute_change(change);
        self.deliver()?;
        Ok(replaced)
    }

    /// Inserts `attribute` at `index`. An attribute with the same name
    /// elsewhere in the list is removed first and `index` is adjusted.
    /// Returns the overwritten attribute, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::OutOfRange`] if `index > attribute_count`.
    pub fn insert_attribute_node(
        &mut self,
        element: NodeId,
        index: usize,
        attribute: NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        self.require_element(element)?;
        let name = self.require_attribute(attribute)?;
        let len = self.attribute_count(element);
        if index > len {
            return Err(DomError::OutOfRange { index, len });
        }
        let mut index = index;
        if self.owner(attribute) == Some(Owner::Attributes(element)) {
            let current = self.index_of(attribute).unwrap_or(index);
            if current == index || current + 1 == index {
                return Ok(None);
            }
            self.unlink_attribute_at(element, current);
            if current < index {
                index -= 1;
            }
            if let Some(list) = self.attribute_list_mut(element) {
                list.insert(index, attribute, name);
            }
            self.set_owner(attribute, Owner::Attributes(element));
            return Ok(None);
        }
        self.detach_attribute(attribute);
        let collision = self
            .attribute_list(element)
            .and_then(|l| l.position_of_name(&name));
        let displaced = collision.and_then(|j| {
            if j < index {
                index -= 1;
            }
            self.unlink_attribute_at(element, j)
        });
        if let Some(list) = self.attribute_list_mut(element) {
            list.insert(index, attribute, name);
        }
        self.set_owner(attribute, Owner::Attributes(element));
        let old_value = displaced.and_then(|old| self.attribute_text(old));
        let change = self.attribute_change(element, attribute, old_value);
        self.record_attribute_change(change);
        self.deliver()?;
        Ok(displaced)
    }

    /// Puts `attribute` at `index` in place of the current occupant.
    ///
    /// An attribute of the same name at another index is removed first and
    /// `index` adjusted (overwrite by name). Returns every attribute that was
    /// displaced, now unlinked.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::OutOfRange`] if `index >= attribute_count`.
    pub fn set_attribute_node_at(
        &mut self,
        element: NodeId,
        index: usize,
        attribute: NodeId,
    ) -> Result<Vec<NodeId>, DomError> {
        self.require_element(element)?;
        let name = self.require_attribute(attribute)?;
        let len = self.attribute_count(element);
        if index >= len {
            return Err(DomError::OutOfRange { index, len });
        }
        if self.attribute_node_at(element, index) == Some(attribute) {
            return Ok(Vec::new());
        }
        let mut index = index;
        if self.owner(attribute) == Some(Owner::Attributes(element)) {
            if let Some(current) = self.index_of(attribute) {
                self.unlink_attribute_at(element, current);
                if current < index {
                    index -= 1;
                }
            }
        } else {
            self.detach_attribute(attribute);
        }

        let mut displaced = Vec::new();
        let mut overwritten_value = None;
        let collision = self
            .attribute_list(element)
            .and_then(|l| l.position_of_name(&name));
        let occupant_collides = collision == Some(index);
        if let Some(j) = collision.filter(|&j| j != index) {
            if let Some(old) = self.unlink_attribute_at(element, j) {
                overwritten_value = self.attribute_text(old);
                displaced.push(old);
            }
            if j < index {
                index -= 1;
            }
        }
        let occupant = self
            .attribute_list_mut(element)
            .and_then(|l| l.replace_at(index, attribute, name));
        self.set_owner(attribute, Owner::Attributes(element));
        if let Some(occupant) = occupant {
            self.set_owner(occupant, Owner::Unlinked);
            if occupant_collides {
                overwritten_value = self.attribute_text(occupant);
            } else {
                let change =
                    self.attribute_change(element, occupant, self.attribute_text(occupant));
                self.record_attribute_change(change);
            }
            displaced.push(occupant);
        }
        let change = self.attribute_change(element, attribute, overwritten_value);
        self.record_attribute_change(change);
        self.deliver()?;
        Ok(displaced)
    }

    /// Removes the attribute named `name`. Returns the removed node.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Observer`] if an observer failed.
    pub fn remove_attribute(
        &mut self,
        element: NodeId,
        name: impl Into<QualifiedName>,
    ) -> Result<Option<NodeId>, DomError> {
        self.require_element(element)?;
        let name = name.into();
        let Some(attribute) = self.attribute_node(element, &name) else {
            return Ok(None);
        };
        self.detach_attribute(attribute);
        self.deliver()?;
        Ok(Some(attribute))
    }

    /// Removes a specific attribute node from `element`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotFound`] if the attribute is not on `element`.
    pub fn remove_attribute_node(&mut self, element: NodeId, attribute: NodeId) -> Result<(), DomError> {
        self.require_element(element)?;
        if self.owner(attribute) != Some(Owner::Attributes(element)) {
            return Err(DomError::NotFound {
                what: format!("attribute {attribute:?} on element {element:?}"),
            });
        }
        self.detach_attribute(attribute);
        self.deliver()
    }

    /// Removes the attribute at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::OutOfRange`] if there is no attribute at `index`.
    pub fn remove_attribute_at(&mut self, element: NodeId, index: usize) -> Result<NodeId, DomError> {
        self.require_element(element)?;
        let len = self.attribute_count(element);
        let attribute = self
            .attribute_node_at(element, index)
            .ok_or(DomError::OutOfRange { index, len })?;
        self.detach_attribute(attribute);
        self.deliver()?;
        Ok(attribute)
    }

    /// Removes every attribute of `element`.
    ///
    /// One change is reported per attribute, after the list is empty.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Observer`] if an observer failed.
    pub fn clear_attributes(&mut self, element: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.require_element(element)?;
        let removed = self
            .attribute_list_mut(element)
            .map(AttributeList::clear)
            .unwrap_or_default();
        for &attribute in &removed {
            self.set_owner(attribute, Owner::Unlinked);
        }
        for &attribute in &removed {
            let change = self.attribute_change(element, attribute, self.attribute_text(attribute));
            self.record_attribute_change(change);
        }
        self.deliver()?;
        Ok(removed)
    }

    /// Switches the comparer of `element`'s attribute list.
    ///
    /// Shorthand for [`set_name_context`](Self::set_name_context) with the
    /// context that uses `comparer`.
    ///
    /// # Errors
    ///
    /// Same as [`set_name_context`](Self::set_name_context).
    pub fn set_name_comparer(
        &mut self,
        element: NodeId,
        comparer: NameComparer,
    ) -> Result<Vec<NodeId>, DomError> {
        let context = match comparer {
            NameComparer::Ordinal => NameContext::Xml,
            NameComparer::IgnoreCase => NameContext::Html,
        };
        self.set_name_context(element, context)
    }

    /// Attaches a [`NameContext`] to `element` and re-keys its attributes.
    ///
    /// Switching to HTML makes attribute names case-insensitive. Attributes
    /// that collide under the new rule are evicted (the later one loses),
    /// reported as removals and returned.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StructuralConstraint`] for non-elements, or
    /// [`DomError::Observer`].
    pub fn set_name_context(
        &mut self,
        element: NodeId,
        context: NameContext,
    ) -> Result<Vec<NodeId>, DomError> {
        self.require_element(element)?;
        let Some(node) = self.node_mut(element) else {
            return Err(DomError::StaleNode);
        };
        node.annotations.replace(context);
        let evicted = node
            .kind
            .attributes_mut()
            .map(|l| l.set_comparer(context.comparer()))
            .unwrap_or_default();
        for &attribute in &evicted {
            self.set_owner(attribute, Owner::Unlinked);
            let name = self.element_name(attribute).map(QualifiedName::qualified);
            warn!(?element, ?attribute, name = ?name, "attribute evicted by name context change");
        }
        for &attribute in &evicted {
            let change = self.attribute_change(element, attribute, self.attribute_text(attribute));
            self.record_attribute_change(change);
        }
        self.deliver()?;
        Ok(evicted)
    }

    /// The name context in effect for `element`.
    #[must_use]
    pub fn name_context(&self, element: NodeId) -> NameContext {
        self.get(element)
            .and_then(|n| n.annotations.get::<NameContext>().copied())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::observer::Scope;

    fn element_doc() -> (Document, NodeId) {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        doc.append_child(doc.root(), e).unwrap();
        (doc, e)
    }

    fn record(doc: &mut Document, e: NodeId) -> Arc<Mutex<Vec<(String, Option<String>)>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        doc.observe_attributes(e, Scope::Target, move |_, change| {
            sink.lock()
                .unwrap()
                .push((change.name.qualified(), change.old_value.clone()));
            Ok(())
        })
        .unwrap();
        log
    }

    #[test]
    fn test_set_attribute_creates_then_overwrites() {
        let (mut doc, e) = element_doc();
        let log = record(&mut doc, e);
        let a = doc.set_attribute(e, "id", "x").unwrap();
        let b = doc.set_attribute(e, "id", "y").unwrap();
        assert_eq!(a, b);
        assert_eq!(doc.attribute_value(e, "id"), Some("y"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("id".to_string(), None),
                ("id".to_string(), Some("x".to_string()))
            ]
        );
    }

    #[test]
    fn test_add_attribute_node_rejects_duplicate() {
        let (mut doc, e) = element_doc();
        doc.set_attribute(e, "id", "x").unwrap();
        let dup = doc.create_attribute("id", "y");
        let err = doc.add_attribute_node(e, dup).unwrap_err();
        assert_eq!(
            err,
            DomError::DuplicateKey {
                name: "id".to_string()
            }
        );
        assert!(doc.is_unlinked(dup));
        assert_eq!(doc.attribute_value(e, "id"), Some("x"));
    }

    #[test]
    fn test_set_attribute_node_overwrites_in_place() {
        let (mut doc, e) = element_doc();
        doc.set_attribute(e, "a", "1").unwrap();
        let old = doc.set_attribute(e, "b", "2").unwrap();
        doc.set_attribute(e, "c", "3").unwrap();
        let log = record(&mut doc, e);

        let new = doc.create_attribute("b", "two");
        assert_eq!(doc.set_attribute_node(e, new).unwrap(), Some(old));
        assert_eq!(doc.attribute_node_at(e, 1), Some(new));
        assert!(doc.is_unlinked(old));
        assert_eq!(
            *log.lock().unwrap(),
            vec![("b".to_string(), Some("2".to_string()))]
        );
    }

    #[test]
    fn test_set_attribute_node_at_adjusts_index_after_collision() {
        let (mut doc, e) = element_doc();
        let a = doc.set_attribute(e, "a", "1").unwrap();
        let b = doc.set_attribute(e, "b", "2").unwrap();
        let c = doc.set_attribute(e, "c", "3").unwrap();

        // Put a new "a" at index 2: the old "a" at 0 goes, "c" is replaced.
        let new_a = doc.create_attribute("a", "one");
        let displaced = doc.set_attribute_node_at(e, 2, new_a).unwrap();
        assert_eq!(displaced, vec![a, c]);
        assert_eq!(doc.attributes(e).collect::<Vec<_>>(), vec![b, new_a]);
    }

    #[test]
    fn test_insert_attribute_node_moves_between_elements() {
        let (mut doc, e) = element_doc();
        let f = doc.create_element("f");
        doc.append_child(e, f).unwrap();
        let x = doc.set_attribute(f, "x", "1").unwrap();
        doc.set_attribute(e, "y", "2").unwrap();

        doc.insert_attribute_node(e, 0, x).unwrap();
        assert_eq!(doc.owner_element(x), Some(e));
        assert_eq!(doc.attribute_count(f), 0);
        assert_eq!(doc.attribute_node_at(e, 0), Some(x));
        assert_eq!(doc.index_of(x), Some(0));
    }

    #[test]
    fn test_clear_attributes_reports_after_emptying() {
        let (mut doc, e) = element_doc();
        doc.set_attribute(e, "a", "1").unwrap();
        doc.set_attribute(e, "b", "2").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        doc.observe_attributes(e, Scope::Target, move |doc, change| {
            sink.lock()
                .unwrap()
                .push((doc.attribute_count(change.element), change.old_value.clone()));
            Ok(())
        })
        .unwrap();

        let removed = doc.clear_attributes(e).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, Some("1".to_string())), (0, Some("2".to_string()))]
        );
    }

    #[test]
    fn test_html_context_evicts_case_duplicates() {
        let (mut doc, e) = element_doc();
        doc.set_attribute(e, "ID", "a").unwrap();
        let lower = doc.set_attribute(e, "id", "b").unwrap();
        assert_eq!(doc.attribute_count(e), 2);

        let evicted = doc.set_name_context(e, NameContext::Html).unwrap();
        assert_eq!(evicted, vec![lower]);
        assert_eq!(doc.attribute_value(e, "id"), Some("a"));
        assert_eq!(doc.name_context(e), NameContext::Html);
        assert_eq!(doc.attribute_comparer(e), NameComparer::IgnoreCase);
    }

    #[test]
    fn test_set_name_comparer_round_trip() {
        let (mut doc, e) = element_doc();
        doc.set_attribute(e, "Lang", "en").unwrap();
        assert!(doc.set_name_comparer(e, NameComparer::IgnoreCase).unwrap().is_empty());
        assert_eq!(doc.attribute_value(e, "lang"), Some("en"));
        doc.set_name_comparer(e, NameComparer::Ordinal).unwrap();
        assert_eq!(doc.attribute_value(e, "lang"), None);
        assert_eq!(doc.name_context(e), NameContext::Xml);
    }

    #[test]
    fn test_typed_attribute_value() {
        let (mut doc, e) = element_doc();
        doc.set_attribute(e, "width", "42").unwrap();
        doc.set_attribute(e, "hidden", "true").unwrap();
        assert_eq!(doc.attribute_value_as::<i32>(e, "width"), Ok(Some(42)));
        assert_eq!(doc.attribute_value_as::<bool>(e, "hidden"), Ok(Some(true)));
        assert_eq!(doc.attribute_value_as::<u32>(e, "missing"), Ok(None));
        assert!(doc.attribute_value_as::<bool>(e, "width").is_err());
    }

    #[test]
    fn test_attribute_on_non_element_rejected() {
        let mut doc = Document::new();
        let t = doc.create_text("x");
        assert!(matches!(
            doc.set_attribute(t, "a", "b"),
            Err(DomError::StructuralConstraint { .. })
        ));
    }
}
