//! Live element indexes.
//!
//! An [`ElementIndex`] maps a key derived from one attribute to the set of
//! elements under a root that currently carry it. It is built once by
//! walking the subtree and then kept in sync by two observers on the root:
//!
//! - attribute changes of the indexed name (target and descendants), which
//!   move the element from its old key to its new one;
//! - child-list changes (target and descendants), which add or drop every
//!   element of an inserted or removed subtree.
//!
//! Observers run after each mutation (or after the outermost batch), so the
//! index reflects the tree as soon as the mutating call returns.
//!
//! # Examples
//!
//! ```
//! use arbordom::{Document, ElementIndex};
//!
//! let mut doc = Document::parse_str(r#"<a><b id="x"/><c id="y"/></a>"#).unwrap();
//! let root = doc.root();
//! let index = ElementIndex::by_attribute(&mut doc, root, "id").unwrap();
//! let b = index.get(&"x".to_string())[0];
//!
//! doc.set_attribute(b, "id", "y").unwrap();
//! assert!(index.get(&"x".to_string()).is_empty());
//! assert_eq!(index.get(&"y".to_string()).len(), 2);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::DomError;
use crate::name::QualifiedName;
use crate::observer::{ObserverHandle, Scope};
use crate::tree::{Document, NodeId, NodeType};

type Derive<K> = dyn Fn(&str) -> Result<K, DomError> + Send + Sync;

/// The mappings in both directions.
#[derive(Debug)]
struct IndexState<K> {
    buckets: HashMap<K, BTreeSet<NodeId>>,
    keys: HashMap<NodeId, K>,
}

impl<K: Eq + Hash + Clone> IndexState<K> {
    fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    fn unmap(&mut self, element: NodeId) {
        let Some(key) = self.keys.remove(&element) else {
            return;
        };
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.remove(&element);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    fn map(&mut self, element: NodeId, key: K) {
        self.buckets.entry(key.clone()).or_default().insert(element);
        self.keys.insert(element, key);
    }
}

/// What the observers need to refresh one element.
struct Tracker<K> {
    root: NodeId,
    name: QualifiedName,
    derive: Arc<Derive<K>>,
    state: Arc<Mutex<IndexState<K>>>,
}

impl<K> Clone for Tracker<K> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            name: self.name.clone(),
            derive: Arc::clone(&self.derive),
            state: Arc::clone(&self.state),
        }
    }
}

impl<K: Eq + Hash + Clone> Tracker<K> {
    fn under_root(&self, doc: &Document, node: NodeId) -> bool {
        doc.ancestors(node).any(|a| a == self.root)
    }

    /// Re-derives the key of `element` from its current state.
    fn refresh(&self, doc: &Document, element: NodeId) -> Result<(), DomError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.unmap(element);
        if doc.node_type(element) != Some(NodeType::Element) || !self.under_root(doc, element) {
            return Ok(());
        }
        let value = doc
            .attribute_node(element, &self.name)
            .and_then(|attribute| doc.node_text(attribute));
        if let Some(value) = value {
            let key = (self.derive)(value)?;
            state.map(element, key);
        }
        Ok(())
    }

    fn refresh_subtree(&self, doc: &Document, node: NodeId) -> Result<(), DomError> {
        let elements: Vec<NodeId> = doc
            .descendants_and_self(node)
            .filter(|&n| doc.node_type(n) == Some(NodeType::Element))
            .collect();
        for element in elements {
            self.refresh(doc, element)?;
        }
        Ok(())
    }
}

/// A live multimap from a derived key to the elements carrying it.
pub struct ElementIndex<K> {
    tracker: Tracker<K>,
    handles: Vec<ObserverHandle>,
}

impl<K> fmt::Debug for ElementIndex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementIndex")
            .field("root", &self.tracker.root)
            .field("name", &self.tracker.name)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl ElementIndex<String> {
    /// An index keyed by the raw attribute value.
    ///
    /// # Errors
    ///
    /// As [`build`](ElementIndex::build).
    pub fn by_attribute(
        doc: &mut Document,
        root: NodeId,
        name: impl Into<QualifiedName>,
    ) -> Result<Self, DomError> {
        Self::build(doc, root, name, |value| Ok(value.to_string()))
    }
}

impl<K> ElementIndex<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Builds an index over the elements at and under `root`, keyed by
    /// `derive` applied to the value of attribute `name`.
    ///
    /// A failing `derive` fails the build here, and fails the mutating call
    /// later with [`DomError::Observer`]; the element is left out of the
    /// index in that case.
    ///
    /// # Errors
    ///
    /// [`DomError::StaleNode`] for a stale root, or the first error of
    /// `derive` during the initial walk.
    pub fn build<F>(
        doc: &mut Document,
        root: NodeId,
        name: impl Into<QualifiedName>,
        derive: F,
    ) -> Result<Self, DomError>
    where
        F: Fn(&str) -> Result<K, DomError> + Send + Sync + 'static,
    {
        doc.try_node(root)?;
        let tracker = Tracker {
            root,
            name: name.into(),
            derive: Arc::new(derive),
            state: Arc::new(Mutex::new(IndexState::new())),
        };
        tracker.refresh_subtree(doc, root)?;

        let on_attribute = tracker.clone();
        let attributes = doc.observe_attribute(
            root,
            Scope::TargetAndDescendants,
            tracker.name.clone(),
            move |doc, change| on_attribute.refresh(doc, change.element),
        )?;
        let on_children = tracker.clone();
        let children = doc.observe_child_list(root, Scope::TargetAndDescendants, move |doc, change| {
            for &node in change.removed.iter().chain(&change.added) {
                on_children.refresh_subtree(doc, node)?;
            }
            Ok(())
        })?;

        let index = Self {
            tracker,
            handles: vec![attributes, children],
        };
        debug!(
            root = ?root,
            name = %index.tracker.name,
            keys = index.len(),
            "built element index"
        );
        Ok(index)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, IndexState<K>> {
        self.tracker
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The elements currently mapped to `key`, in slot order.
    #[must_use]
    pub fn get(&self, key: &K) -> Vec<NodeId> {
        self.state()
            .buckets
            .get(key)
            .map(|bucket| bucket.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if at least one element maps to `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.state().buckets.contains_key(key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().buckets.len()
    }

    /// Returns `true` if no element is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state().buckets.is_empty()
    }

    /// All keys, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.state().buckets.keys().cloned().collect()
    }

    /// The key `element` is indexed under.
    #[must_use]
    pub fn key_of(&self, element: NodeId) -> Option<K> {
        self.state().keys.get(&element).cloned()
    }
}

impl<K> ElementIndex<K> {
    /// The attribute the index is keyed on.
    #[must_use]
    pub fn attribute_name(&self) -> &QualifiedName {
        &self.tracker.name
    }

    /// Returns `true` until [`disconnect`](Self::disconnect) is called.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handles.iter().any(|h| !h.is_disposed())
    }

    /// Stops tracking the tree. Lookups keep answering from the last synced
    /// state. Calling it again does nothing.
    pub fn disconnect(&mut self, doc: &mut Document) {
        if !self.is_connected() {
            return;
        }
        for handle in &self.handles {
            if let Err(err) = doc.unobserve(handle) {
                debug!(id = handle.id(), error = %err, "could not remove index subscription");
            }
            handle.dispose();
        }
        debug!(root = ?self.tracker.root, name = %self.tracker.name, "disconnected element index");
    }
}

impl<K> Drop for ElementIndex<K> {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> String {
        s.to_string()
    }

    fn scenario() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(doc.root(), a).unwrap();
        doc.set_attribute(b, "id", "x").unwrap();
        doc.set_attribute(c, "id", "y").unwrap();
        doc.append_children(a, &[b, c]).unwrap();
        (doc, a, b, c)
    }

    #[test]
    fn test_initial_build_and_attribute_change() {
        let (mut doc, _, b, c) = scenario();
        let root = doc.root();
        let index = ElementIndex::by_attribute(&mut doc, root, "id").unwrap();
        assert_eq!(index.get(&key("x")), vec![b]);
        assert_eq!(index.get(&key("y")), vec![c]);

        doc.set_attribute(b, "id", "y").unwrap();
        assert!(index.get(&key("x")).is_empty());
        assert!(!index.contains_key(&key("x")));
        assert_eq!(index.get(&key("y")), vec![b, c]);
        assert_eq!(index.key_of(b), Some(key("y")));

        doc.remove_attribute(c, "id").unwrap();
        assert_eq!(index.get(&key("y")), vec![b]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_subtree_insert_and_remove() {
        let (mut doc, a, b, _) = scenario();
        let root = doc.root();
        let index = ElementIndex::by_attribute(&mut doc, root, "id").unwrap();

        let wrapper = doc.create_element("w");
        let inner = doc.create_element("i");
        doc.set_attribute(inner, "id", "z").unwrap();
        doc.append_child(wrapper, inner).unwrap();
        assert!(!index.contains_key(&key("z")));

        doc.append_child(a, wrapper).unwrap();
        assert_eq!(index.get(&key("z")), vec![inner]);

        doc.remove_node(wrapper).unwrap();
        assert!(!index.contains_key(&key("z")));

        doc.remove_node(b).unwrap();
        assert!(!index.contains_key(&key("x")));
        assert_eq!(index.keys(), vec![key("y")]);
    }

    #[test]
    fn test_move_within_root_keeps_entry() {
        let (mut doc, a, b, c) = scenario();
        let root = doc.root();
        let index = ElementIndex::by_attribute(&mut doc, root, "id").unwrap();
        doc.append_child(c, b).unwrap();
        assert_eq!(index.get(&key("x")), vec![b]);
        doc.append_child(a, b).unwrap();
        assert_eq!(index.get(&key("x")), vec![b]);
    }

    #[test]
    fn test_disconnect_freezes() {
        let (mut doc, _, b, _) = scenario();
        let root = doc.root();
        let mut index = ElementIndex::by_attribute(&mut doc, root, "id").unwrap();
        assert!(index.is_connected());
        index.disconnect(&mut doc);
        index.disconnect(&mut doc);
        assert!(!index.is_connected());
        doc.set_attribute(b, "id", "q").unwrap();
        assert_eq!(index.get(&key("x")), vec![b]);
        assert!(!index.contains_key(&key("q")));
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_key_derivation_failure_propagates() {
        let (mut doc, _, b, _) = scenario();
        let root = doc.root();
        let parse = |value: &str| {
            value.parse::<u32>().map_err(|_| DomError::KeyDerivation {
                value: value.to_string(),
                key_type: "u32",
            })
        };
        assert!(matches!(
            ElementIndex::build(&mut doc, root, "id", parse),
            Err(DomError::KeyDerivation { .. })
        ));

        doc.set_attribute(b, "id", "1").unwrap();
        let c = doc.next_sibling(b).unwrap();
        doc.set_attribute(c, "id", "2").unwrap();
        let index = ElementIndex::build(&mut doc, root, "id", parse).unwrap();
        assert_eq!(index.get(&1), vec![b]);

        let err = doc.set_attribute(b, "id", "one").unwrap_err();
        assert!(matches!(err, DomError::Observer(inner) if matches!(*inner, DomError::KeyDerivation { .. })));
        assert_eq!(doc.attribute_value(b, "id"), Some("one"));
        assert!(index.get(&1).is_empty());
    }

    #[test]
    fn test_scoped_to_root() {
        let (mut doc, a, b, _) = scenario();
        let outside = doc.create_element("o");
        doc.set_attribute(outside, "id", "x").unwrap();
        let index = ElementIndex::by_attribute(&mut doc, b, "id").unwrap();
        assert_eq!(index.get(&key("x")), vec![b]);
        doc.append_child(a, outside).unwrap();
        assert_eq!(index.get(&key("x")), vec![b]);
    }
}
