//! Side-channel objects attached to nodes.
//!
//! Every node carries an [`Annotations`] bag: a short list of shared,
//! type-erased values that callers can add, query by type and remove by type.
//! The tree itself reads two built-in annotations, [`NameContext`] and
//! [`BaseUri`].
//!
//! When a node is cloned, each annotation is asked for a private copy through
//! [`Annotation::clone_annotation`]. Annotations that return `None` (the
//! default) are shared between the original and the clone.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::name::NameComparer;

/// Upcast helper so `dyn Annotation` can be downcast to its concrete type.
pub trait AsAny {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value that can be attached to a node.
///
/// # Examples
///
/// ```
/// use arbordom::annotation::Annotation;
///
/// #[derive(Debug)]
/// struct SourceLine(u32);
///
/// impl Annotation for SourceLine {}
/// ```
pub trait Annotation: Any + AsAny + Send + Sync + fmt::Debug {
    /// Produces an independent copy for a cloned node.
    ///
    /// Returning `None` shares this annotation with the clone.
    fn clone_annotation(&self) -> Option<Arc<dyn Annotation>> {
        None
    }
}

fn downcast<T: Annotation>(annotation: &Arc<dyn Annotation>) -> Option<&T> {
    <dyn Annotation as AsAny>::as_any(annotation.as_ref()).downcast_ref::<T>()
}

fn is<T: Annotation>(annotation: &Arc<dyn Annotation>) -> bool {
    <dyn Annotation as AsAny>::as_any(annotation.as_ref()).is::<T>()
}

/// The annotation list of a single node.
#[derive(Debug, Default, Clone)]
pub struct Annotations(Vec<Arc<dyn Annotation>>);

impl Annotations {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Attaches a value.
    pub fn add<T: Annotation>(&mut self, value: T) {
        self.0.push(Arc::new(value));
    }

    /// Attaches an already shared value.
    pub fn add_shared(&mut self, value: Arc<dyn Annotation>) {
        self.0.push(value);
    }

    /// Returns the first annotation of type `T`.
    #[must_use]
    pub fn get<T: Annotation>(&self) -> Option<&T> {
        self.0.iter().find_map(downcast::<T>)
    }

    /// Returns every annotation of type `T`, in insertion order.
    pub fn get_all<T: Annotation>(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter_map(downcast::<T>)
    }

    /// Returns `true` if an annotation of type `T` is attached.
    #[must_use]
    pub fn has<T: Annotation>(&self) -> bool {
        self.0.iter().any(is::<T>)
    }

    /// Removes every annotation of type `T`; returns how many were removed.
    pub fn remove<T: Annotation>(&mut self) -> usize {
        let before = self.0.len();
        self.0.retain(|a| !is::<T>(a));
        before - self.0.len()
    }

    /// Replaces every annotation of type `T` with `value`.
    pub fn replace<T: Annotation>(&mut self, value: T) {
        self.remove::<T>();
        self.add(value);
    }

    /// Number of attached annotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds the list a cloned node receives.
    #[must_use]
    pub fn clone_for_copy(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|a| a.clone_annotation().unwrap_or_else(|| Arc::clone(a)))
                .collect(),
        )
    }
}

/// Selects XML or HTML name handling for an element's attributes.
///
/// Attach with [`Document::set_name_context`](crate::Document::set_name_context)
/// so the attribute collection is re-keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameContext {
    /// Case-sensitive names.
    #[default]
    Xml,
    /// ASCII case-insensitive local names.
    Html,
}

impl NameContext {
    /// The comparer attribute collections use in this context.
    #[must_use]
    pub fn comparer(self) -> NameComparer {
        match self {
            Self::Xml => NameComparer::Ordinal,
            Self::Html => NameComparer::IgnoreCase,
        }
    }
}

impl Annotation for NameContext {
    fn clone_annotation(&self) -> Option<Arc<dyn Annotation>> {
        Some(Arc::new(*self))
    }
}

/// Overrides the base URI of a node and its descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUri(pub String);

impl Annotation for BaseUri {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    impl Annotation for Marker {}

    #[derive(Debug)]
    struct Owned(u32);

    impl Annotation for Owned {
        fn clone_annotation(&self) -> Option<Arc<dyn Annotation>> {
            Some(Arc::new(Owned(self.0 + 1)))
        }
    }

    #[test]
    fn test_query_by_type() {
        let mut list = Annotations::new();
        list.add(Marker(1));
        list.add(BaseUri("http://example.com/".to_string()));
        list.add(Marker(2));

        assert_eq!(list.get::<Marker>(), Some(&Marker(1)));
        assert_eq!(list.get_all::<Marker>().count(), 2);
        assert!(list.has::<BaseUri>());
        assert!(!list.has::<NameContext>());
    }

    #[test]
    fn test_remove_by_type() {
        let mut list = Annotations::new();
        list.add(Marker(1));
        list.add(NameContext::Html);
        list.add(Marker(2));
        assert_eq!(list.remove::<Marker>(), 2);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get::<NameContext>(), Some(&NameContext::Html));
    }

    #[test]
    fn test_clone_shares_or_copies() {
        let mut list = Annotations::new();
        list.add(Marker(7));
        list.add(Owned(1));

        let copy = list.clone_for_copy();
        assert!(Arc::ptr_eq(&list.0[0], &copy.0[0]));
        assert!(!Arc::ptr_eq(&list.0[1], &copy.0[1]));
        assert_eq!(copy.get::<Owned>().map(|o| o.0), Some(2));
    }

    #[test]
    fn test_name_context_comparer() {
        assert_eq!(NameContext::Xml.comparer(), NameComparer::Ordinal);
        assert_eq!(NameContext::Html.comparer(), NameComparer::IgnoreCase);
    }
}
