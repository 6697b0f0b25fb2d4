//! Copy-on-write list.
//!
//! [`CowList`] keeps its items in an `Arc<Vec<T>>`. Cloning a list or taking
//! an iterator only bumps the reference count; the first write through a
//! shared buffer copies it (`Arc::make_mut`). An iterator therefore keeps
//! seeing the items it started with, whatever happens to the list or its
//! clones afterwards.
//!
//! The observer registry stores its subscriptions here so callbacks can
//! register and dispose observers while a notification is being dispatched.

use std::sync::Arc;

use crate::error::DomError;

/// A list with snapshot iteration and clone-on-write mutation.
///
/// # Examples
///
/// ```
/// use arbordom::cow::CowList;
///
/// let mut list = CowList::new();
/// list.push(1).unwrap();
/// list.push(2).unwrap();
///
/// let snapshot = list.iter();
/// list.push(3).unwrap();
///
/// assert_eq!(snapshot.collect::<Vec<_>>(), vec![1, 2]);
/// assert_eq!(list.len(), 3);
/// ```
#[derive(Debug)]
pub struct CowList<T> {
    items: Arc<Vec<T>>,
    read_only: bool,
}

impl<T> Clone for CowList<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            read_only: self.read_only,
        }
    }
}

impl<T> Default for CowList<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            read_only: false,
        }
    }
}

impl<T: Clone> CowList<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list that rejects every mutation with [`DomError::ReadOnly`].
    #[must_use]
    pub fn frozen(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(items),
            read_only: true,
        }
    }

    /// Makes this handle read-only. Clones taken afterwards are read-only too.
    pub fn freeze(&mut self) {
        self.read_only = true;
    }

    /// Returns `true` if mutations are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Borrows the current buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Returns a snapshot iterator over the current items.
    #[must_use]
    pub fn iter(&self) -> CowIter<T> {
        CowIter {
            items: Arc::clone(&self.items),
            pos: 0,
        }
    }

    /// Returns `true` if another list or an iterator shares this buffer.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        Arc::strong_count(&self.items) > 1
    }

    fn writable(&mut self) -> Result<&mut Vec<T>, DomError> {
        if self.read_only {
            return Err(DomError::ReadOnly);
        }
        Ok(Arc::make_mut(&mut self.items))
    }

    /// Appends an item.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::ReadOnly`] on a frozen list.
    pub fn push(&mut self, item: T) -> Result<(), DomError> {
        self.writable()?.push(item);
        Ok(())
    }

    /// Inserts an item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::OutOfRange`] if `index > len`, or
    /// [`DomError::ReadOnly`] on a frozen list.
    pub fn insert(&mut self, index: usize, item: T) -> Result<(), DomError> {
        let len = self.len();
        if index > len {
            return Err(DomError::OutOfRange { index, len });
        }
        self.writable()?.insert(index, item);
        Ok(())
    }

    /// Removes and returns the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::OutOfRange`] or [`DomError::ReadOnly`].
    pub fn remove(&mut self, index: usize) -> Result<T, DomError> {
        let len = self.len();
        if index >= len {
            return Err(DomError::OutOfRange { index, len });
        }
        Ok(self.writable()?.remove(index))
    }

    /// Replaces the item at `index`, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::OutOfRange`] or [`DomError::ReadOnly`].
    pub fn set(&mut self, index: usize, item: T) -> Result<T, DomError> {
        let len = self.len();
        if index >= len {
            return Err(DomError::OutOfRange { index, len });
        }
        Ok(std::mem::replace(&mut self.writable()?[index], item))
    }

    /// Removes every item.
    ///
    /// A shared buffer is not copied; this handle simply starts a new one.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::ReadOnly`] on a frozen list.
    pub fn clear(&mut self) -> Result<(), DomError> {
        if self.read_only {
            return Err(DomError::ReadOnly);
        }
        if self.is_shared() {
            self.items = Arc::new(Vec::new());
        } else {
            Arc::make_mut(&mut self.items).clear();
        }
        Ok(())
    }

    /// Keeps only the items for which `keep` returns `true`.
    ///
    /// The buffer is copied only if something is actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::ReadOnly`] on a frozen list.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> Result<(), DomError> {
        if self.items.iter().all(&mut keep) {
            return Ok(());
        }
        self.writable()?.retain(keep);
        Ok(())
    }
}

impl<T: Clone + PartialEq> CowList<T> {
    /// Removes the first item equal to `item`; returns whether one was found.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::ReadOnly`] on a frozen list.
    pub fn remove_item(&mut self, item: &T) -> Result<bool, DomError> {
        match self.items.iter().position(|x| x == item) {
            Some(index) => self.remove(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Returns `true` if an item equal to `item` is present.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

impl<T: Clone> FromIterator<T> for CowList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: Arc::new(iter.into_iter().collect()),
            read_only: false,
        }
    }
}

impl<'a, T> IntoIterator for &'a CowList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Snapshot iterator returned by [`CowList::iter`].
///
/// Holds its own reference to the buffer it was created from and yields
/// clones of the items.
#[derive(Debug)]
pub struct CowIter<T> {
    items: Arc<Vec<T>>,
    pos: usize,
}

impl<T: Clone> Iterator for CowIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.items.get(self.pos)?.clone();
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for CowIter<T> {}
