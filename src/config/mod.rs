//! Document-level configuration.
//!
//! [`DocumentOptions`] is fixed when a [`Document`](crate::Document) is
//! created and decides how child collections are stored and which name
//! context new elements start in.

use crate::annotation::NameContext;

/// Backing strategy for child collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildStorage {
    /// Resizable array. O(1) indexed access, O(n) sibling lookup.
    #[default]
    Array,
    /// Circular doubly linked list. O(1) sibling lookup and removal.
    Linked,
}

/// Options for a new document.
///
/// # Examples
///
/// ```
/// use arbordom::config::{ChildStorage, DocumentOptions};
/// use arbordom::Document;
///
/// let doc = Document::with_options(DocumentOptions::default().child_storage(ChildStorage::Linked));
/// assert_eq!(doc.options().child_storage, ChildStorage::Linked);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentOptions {
    /// How child lists are stored. Defaults to [`ChildStorage::Array`].
    pub child_storage: ChildStorage,
    /// Name context applied to elements created by this document.
    /// Defaults to [`NameContext::Xml`].
    pub name_context: NameContext,
}

impl DocumentOptions {
    /// Sets the child storage strategy.
    #[must_use]
    pub fn child_storage(mut self, storage: ChildStorage) -> Self {
        self.child_storage = storage;
        self
    }

    /// Sets the default name context for new elements.
    #[must_use]
    pub fn name_context(mut self, context: NameContext) -> Self {
        self.name_context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DocumentOptions::default();
        assert_eq!(options.child_storage, ChildStorage::Array);
        assert_eq!(options.name_context, NameContext::Xml);
    }

    #[test]
    fn test_builder_chain() {
        let options = DocumentOptions::default()
            .child_storage(ChildStorage::Linked)
            .name_context(NameContext::Html);
        assert_eq!(options.child_storage, ChildStorage::Linked);
        assert_eq!(options.name_context, NameContext::Html);
    }
}
