//! Mutation batching.
//!
//! While a batch scope is open, observer delivery is deferred and runs of
//! single-node child-list changes are coalesced: consecutive inserts into the
//! same parent where each node lands right after the previous one become one
//! [`ChildListChange`] with several `added` nodes, and consecutive removals
//! from the same position become one change with several `removed` nodes.
//!
//! Scopes nest. Each frame holds at most one pending coalesced change; when a
//! frame closes its pending change moves to the enclosing frame, where later
//! adjacent changes keep extending it. Closing the outermost frame flushes
//! everything and delivers.
//!
//! Anything that cannot be coalesced (a replace, an attribute change, a
//! change to a different parent) flushes every pending change first, outermost
//! frame first, so the delivered order always matches the order the changes
//! were made in.

use std::ops::{Deref, DerefMut};

use tracing::{debug, trace, warn};

use crate::error::DomError;
use crate::observer::{ChildListChange, ChildListChangeKind, MutationEvent, Queued, Reach};
use crate::tree::{Document, NodeId};

#[derive(Debug)]
struct Pending {
    kind: ChildListChangeKind,
    parent: NodeId,
    first_previous: Option<NodeId>,
    last_node: NodeId,
    next: Option<NodeId>,
    nodes: Vec<NodeId>,
    reach: Reach,
}

impl Pending {
    /// Starts a pending run, or hands the change back when it cannot be
    /// coalesced.
    fn start(change: ChildListChange, reach: Reach) -> Result<Self, Queued> {
        let kind = change.kind();
        let node = match (kind, change.added.as_slice(), change.removed.as_slice()) {
            (ChildListChangeKind::Add, [node], _) | (ChildListChangeKind::Remove, _, [node]) => {
                Some(*node)
            }
            _ => None,
        };
        let Some(node) = node else {
            return Err(Queued {
                event: MutationEvent::ChildList(change),
                reach,
            });
        };
        Ok(Self {
            kind,
            parent: change.parent,
            first_previous: change.previous_sibling,
            last_node: node,
            next: change.next_sibling,
            nodes: vec![node],
            reach,
        })
    }

    fn continues(&self, kind: ChildListChangeKind, parent: NodeId, previous: Option<NodeId>) -> bool {
        if kind != self.kind || parent != self.parent {
            return false;
        }
        match kind {
            ChildListChangeKind::Add => previous == Some(self.last_node),
            ChildListChangeKind::Remove => previous == self.first_previous,
            ChildListChangeKind::Replace => false,
        }
    }

    fn extends(&self, change: &ChildListChange) -> bool {
        let count = change.added.len() + change.removed.len();
        count == 1 && self.continues(change.kind(), change.parent, change.previous_sibling)
    }

    /// Appends a later run that starts where this one ends, or hands it back.
    fn merge(&mut self, later: Self) -> Result<(), Self> {
        if !self.continues(later.kind, later.parent, later.first_previous) {
            return Err(later);
        }
        self.nodes.extend(later.nodes);
        self.last_node = later.last_node;
        self.next = later.next;
        Ok(())
    }

    fn absorb(&mut self, change: ChildListChange) {
        self.nodes.extend(change.added);
        self.nodes.extend(change.removed);
        if let Some(&last) = self.nodes.last() {
            self.last_node = last;
        }
        self.next = change.next_sibling;
    }

    fn into_queued(self) -> Queued {
        debug!(
            parent = ?self.parent,
            kind = ?self.kind,
            nodes = self.nodes.len(),
            "flushing coalesced child-list change"
        );
        let change = match self.kind {
            ChildListChangeKind::Add => ChildListChange {
                parent: self.parent,
                added: self.nodes,
                removed: Vec::new(),
                previous_sibling: self.first_previous,
                next_sibling: self.next,
            },
            _ => ChildListChange::remove(self.parent, self.nodes, self.first_previous, self.next),
        };
        Queued {
            event: MutationEvent::ChildList(change),
            reach: self.reach,
        }
    }
}

#[derive(Debug, Default)]
struct Frame {
    pending: Option<Pending>,
}

/// The stack of open batch frames of one document.
#[derive(Debug, Default)]
pub(crate) struct BatchStack {
    frames: Vec<Frame>,
}

impl BatchStack {
    pub(crate) fn is_active(&self) -> bool {
        !self.frames.is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push(&mut self) {
        self.frames.push(Frame::default());
        trace!(depth = self.frames.len(), "batch opened");
    }

    /// Routes a child-list change through the open frames and returns what is
    /// ready to be queued.
    pub(crate) fn record(&mut self, change: ChildListChange, reach: impl Into<Reach>) -> Vec<Queued> {
        let reach = reach.into();
        if self.frames.is_empty() {
            return vec![Queued {
                event: MutationEvent::ChildList(change),
                reach,
            }];
        }
        // At most one run is pending across all frames, and it may sit in an
        // outer frame after an inner scope closed.
        if let Some(pending) = self.frames.iter_mut().rev().find_map(|f| f.pending.as_mut()) {
            if pending.extends(&change) {
                pending.absorb(change);
                return Vec::new();
            }
        }
        let mut ready = self.flush_all();
        match Pending::start(change, reach) {
            Ok(pending) => {
                if let Some(top) = self.frames.last_mut() {
                    top.pending = Some(pending);
                }
            }
            Err(queued) => ready.push(queued),
        }
        ready
    }

    /// Takes every pending run, outermost frame first.
    pub(crate) fn flush_all(&mut self) -> Vec<Queued> {
        self.frames
            .iter_mut()
            .filter_map(|frame| frame.pending.take())
            .map(Pending::into_queued)
            .collect()
    }

    /// Closes the innermost frame and returns what is ready to be queued.
    pub(crate) fn pop(&mut self) -> Vec<Queued> {
        let Some(frame) = self.frames.pop() else {
            return Vec::new();
        };
        trace!(depth = self.frames.len(), "batch closed");
        let Some(pending) = frame.pending else {
            return Vec::new();
        };
        let Some(parent) = self.frames.last_mut() else {
            return vec![pending.into_queued()];
        };
        match parent.pending.as_mut() {
            None => {
                parent.pending = Some(pending);
                Vec::new()
            }
            Some(earlier) => match earlier.merge(pending) {
                Ok(()) => Vec::new(),
                Err(pending) => parent
                    .pending
                    .replace(pending)
                    .map(Pending::into_queued)
                    .into_iter()
                    .collect(),
            },
        }
    }
}

/// An open batch scope.
///
/// Derefs to the [`Document`] so mutations go through the scope. The batch
/// closes when the scope is finished or dropped; observer errors raised at
/// close are returned by [`finish`](Self::finish) and only logged on drop.
#[derive(Debug)]
pub struct BatchScope<'a> {
    doc: &'a mut Document,
    open: bool,
}

impl BatchScope<'_> {
    /// Closes the batch, delivering queued changes when this was the
    /// outermost scope.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Observer`] if a callback failed.
    pub fn finish(mut self) -> Result<(), DomError> {
        self.open = false;
        self.doc.close_batch()
    }
}

impl Deref for BatchScope<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl DerefMut for BatchScope<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.doc.close_batch() {
                warn!(error = %err, "observer failed while closing batch scope");
            }
        }
    }
}

impl Document {
    /// Opens a batch scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::{Arc, Mutex};
    /// use arbordom::{Document, Scope};
    ///
    /// let mut doc = Document::new();
    /// let list = doc.create_element("list");
    /// doc.append_child(doc.root(), list).unwrap();
    ///
    /// let events = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&events);
    /// doc.observe_child_list(list, Scope::Target, move |_, change| {
    ///     sink.lock().unwrap().push(change.added.len());
    ///     Ok(())
    /// })
    /// .unwrap();
    ///
    /// let mut batch = doc.begin_batch();
    /// for _ in 0..3 {
    ///     let item = batch.create_element("item");
    ///     batch.append_child(list, item).unwrap();
    /// }
    /// batch.finish().unwrap();
    ///
    /// assert_eq!(*events.lock().unwrap(), vec![3]);
    /// ```
    pub fn begin_batch(&mut self) -> BatchScope<'_> {
        self.batches.push();
        BatchScope {
            doc: self,
            open: true,
        }
    }

    /// Runs `f` inside a batch scope.
    ///
    /// The scope is closed whether `f` succeeds or not. An error from `f` is
    /// returned in preference to an observer error raised at close.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or [`DomError::Observer`] if a callback
    /// failed during delivery.
    pub fn with_batch<T, F>(&mut self, f: F) -> Result<T, DomError>
    where
        F: FnOnce(&mut Document) -> Result<T, DomError>,
    {
        self.batches.push();
        let result = f(self);
        let closed = self.close_batch();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Returns `true` while a batch scope is open.
    #[must_use]
    pub fn in_batch(&self) -> bool {
        self.batches.is_active()
    }

    /// Number of nested batch scopes currently open.
    #[must_use]
    pub fn batch_depth(&self) -> usize {
        self.batches.depth()
    }

    pub(crate) fn close_batch(&mut self) -> Result<(), DomError> {
        let ready = self.batches.pop();
        self.queue.extend(ready);
        self.deliver()
    }
}
