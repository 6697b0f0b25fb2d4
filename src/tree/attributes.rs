//! Attribute collection storage.
//!
//! An [`AttributeList`] holds the attribute node ids of one element together
//! with a copy of each attribute's name, so name lookups never touch the
//! arena. Names are unique under the list's [`NameComparer`].
//!
//! This is the raw layer: [`try_push`](AttributeList::try_push) rejects a
//! colliding name with [`DomError::DuplicateKey`]. Overwrite-by-name is
//! implemented one level up, on [`Document`](crate::Document).

use super::NodeId;
use crate::error::DomError;
use crate::name::{NameComparer, QualifiedName};

#[derive(Debug, Clone)]
struct AttributeEntry {
    id: NodeId,
    name: QualifiedName,
}

/// The attributes of one element.
#[derive(Debug, Clone, Default)]
pub struct AttributeList {
    entries: Vec<AttributeEntry>,
    comparer: NameComparer,
}

impl AttributeList {
    /// Creates an empty list using `comparer`.
    #[must_use]
    pub fn new(comparer: NameComparer) -> Self {
        Self {
            entries: Vec::new(),
            comparer,
        }
    }

    /// The active name comparer.
    #[must_use]
    pub fn comparer(&self) -> NameComparer {
        self.comparer
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The attribute node at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.entries.get(index).map(|e| e.id)
    }

    /// The name of the attribute at `index`.
    #[must_use]
    pub fn name_at(&self, index: usize) -> Option<&QualifiedName> {
        self.entries.get(index).map(|e| &e.name)
    }

    /// Iterates over the attribute node ids in order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// The index of attribute node `id`.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// The index of the attribute named `name` under the active comparer.
    #[must_use]
    pub fn position_of_name(&self, name: &QualifiedName) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| self.comparer.equals(&e.name, name))
    }

    /// The index of the no-namespace attribute whose local name is `local`.
    #[must_use]
    pub fn position_of_local(&self, local: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| self.comparer.matches_local(&e.name, local))
    }

    /// Appends an attribute, rejecting a name collision.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::DuplicateKey`] if an attribute with an equal name
    /// is already present.
    pub fn try_push(&mut self, id: NodeId, name: QualifiedName) -> Result<(), DomError> {
        if self.position_of_name(&name).is_some() {
            return Err(DomError::DuplicateKey {
                name: name.qualified(),
            });
        }
        self.entries.push(AttributeEntry { id, name });
        Ok(())
    }

    pub(crate) fn insert(&mut self, index: usize, id: NodeId, name: QualifiedName) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, AttributeEntry { id, name });
    }

    pub(crate) fn replace_at(
        &mut self,
        index: usize,
        id: NodeId,
        name: QualifiedName,
    ) -> Option<NodeId> {
        let entry = self.entries.get_mut(index)?;
        let old = std::mem::replace(entry, AttributeEntry { id, name });
        Some(old.id)
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Option<NodeId> {
        (index < self.entries.len()).then(|| self.entries.remove(index).id)
    }

    pub(crate) fn clear(&mut self) -> Vec<NodeId> {
        self.entries.drain(..).map(|e| e.id).collect()
    }

    /// Switches the comparer and evicts attributes that now collide with an
    /// earlier one. Returns the evicted ids in their former order.
    pub(crate) fn set_comparer(&mut self, comparer: NameComparer) -> Vec<NodeId> {
        self.comparer = comparer;
        let mut kept: Vec<AttributeEntry> = Vec::with_capacity(self.entries.len());
        let mut evicted = Vec::new();
        for entry in self.entries.drain(..) {
            if kept.iter().any(|k| comparer.equals(&k.name, &entry.name)) {
                evicted.push(entry.id);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NodeId {
        NodeId::for_test(n)
    }

    #[test]
    fn test_try_push_rejects_duplicates() {
        let mut list = AttributeList::default();
        list.try_push(id(1), QualifiedName::new("id")).unwrap();
        let err = list.try_push(id(2), QualifiedName::new("id")).unwrap_err();
        assert_eq!(
            err,
            DomError::DuplicateKey {
                name: "id".to_string()
            }
        );
        list.try_push(id(3), QualifiedName::with_namespace("urn:x", "id"))
            .unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_lookup_respects_comparer() {
        let mut list = AttributeList::new(NameComparer::IgnoreCase);
        list.try_push(id(1), QualifiedName::new("Class")).unwrap();
        assert_eq!(list.position_of_local("class"), Some(0));
        assert_eq!(list.position_of_name(&QualifiedName::new("CLASS")), Some(0));
        assert!(list.try_push(id(2), QualifiedName::new("class")).is_err());
    }

    #[test]
    fn test_set_comparer_evicts_later_duplicates() {
        let mut list = AttributeList::default();
        list.try_push(id(1), QualifiedName::new("ID")).unwrap();
        list.try_push(id(2), QualifiedName::new("title")).unwrap();
        list.try_push(id(3), QualifiedName::new("id")).unwrap();
        list.try_push(id(4), QualifiedName::new("Title")).unwrap();

        let evicted = list.set_comparer(NameComparer::IgnoreCase);
        assert_eq!(evicted, vec![id(3), id(4)]);
        assert_eq!(list.ids().collect::<Vec<_>>(), vec![id(1), id(2)]);
        assert_eq!(list.comparer(), NameComparer::IgnoreCase);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut list = AttributeList::default();
        list.try_push(id(1), QualifiedName::new("a")).unwrap();
        list.try_push(id(2), QualifiedName::new("b")).unwrap();
        assert_eq!(list.replace_at(0, id(5), QualifiedName::new("c")), Some(id(1)));
        assert_eq!(list.name_at(0).map(QualifiedName::local_name), Some("c"));
        assert_eq!(list.remove_at(1), Some(id(2)));
        assert_eq!(list.remove_at(1), None);
        assert_eq!(list.clear(), vec![id(5)]);
        assert!(list.is_empty());
    }
}
