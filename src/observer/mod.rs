//! Mutation observers.
//!
//! Callers subscribe to attribute changes, child-list changes, or both, on a
//! target node with a [`Scope`]:
//!
//! | Scope                    | Fires for a change on node `N` when          |
//! |--------------------------|----------------------------------------------|
//! | `Target`                 | `N` is the target                            |
//! | `TargetAndDescendants`   | `N` is the target or one of its descendants  |
//! | `TargetAndAncestors`     | `N` is the target or one of its ancestors    |
//!
//! "Descendant" is judged against the tree as it was when the change was
//! made, so a change inside a subtree that was detached later in the same
//! batch still reaches observers on the old ancestors.
//!
//! # Delivery
//!
//! Changes are queued on the document and delivered in order once the
//! outermost batch scope closes, or immediately after the mutating call when
//! no batch is open. Callbacks receive `&mut Document` and may mutate the tree
//! or register and dispose observers; changes they cause are appended to the
//! queue and delivered after the current one, never re-entrantly.
//!
//! Subscriptions live in [`CowList`]s, so dispatch iterates a snapshot that
//! registrations made by callbacks cannot disturb. A disposed subscription is
//! skipped at once and dropped from the lists on the next registration.
//!
//! A failing callback does not stop delivery to the others. The first error
//! is returned to the mutating caller wrapped in [`DomError::Observer`]; the
//! mutation itself has already been applied.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{trace, warn};

use crate::cow::CowList;
use crate::error::DomError;
use crate::name::QualifiedName;
use crate::tree::{Document, NodeId};

/// Which nodes around the target a subscription covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Only the target itself.
    Target,
    /// The target and everything below it.
    TargetAndDescendants,
    /// The target and everything above it.
    TargetAndAncestors,
}

/// Shape of a [`ChildListChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildListChangeKind {
    /// Nodes were inserted.
    Add,
    /// Nodes were removed.
    Remove,
    /// One node took the place of another.
    Replace,
}

/// A change to the children of `parent`.
///
/// `added` and `removed` are contiguous runs in document order. The sibling
/// fields bound the run: for an add they are the neighbours of the inserted
/// run after insertion, for a remove the neighbours the removed run had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildListChange {
    /// The container whose child list changed.
    pub parent: NodeId,
    /// Inserted nodes.
    pub added: Vec<NodeId>,
    /// Removed nodes.
    pub removed: Vec<NodeId>,
    /// The sibling before the affected run.
    pub previous_sibling: Option<NodeId>,
    /// The sibling after the affected run.
    pub next_sibling: Option<NodeId>,
}

impl ChildListChange {
    pub(crate) fn add(
        parent: NodeId,
        node: NodeId,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            parent,
            added: vec![node],
            removed: Vec::new(),
            previous_sibling,
            next_sibling,
        }
    }

    pub(crate) fn remove(
        parent: NodeId,
        nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        Self {
            parent,
            added: Vec::new(),
            removed: nodes,
            previous_sibling,
            next_sibling,
        }
    }

    /// Classifies the change.
    #[must_use]
    pub fn kind(&self) -> ChildListChangeKind {
        match (self.added.is_empty(), self.removed.is_empty()) {
            (false, false) => ChildListChangeKind::Replace,
            (false, true) => ChildListChangeKind::Add,
            _ => ChildListChangeKind::Remove,
        }
    }
}

/// A change to one attribute of `element`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    /// The element whose attribute list or attribute value changed.
    pub element: NodeId,
    /// The attribute node that was added, removed or changed.
    pub attribute: NodeId,
    /// The attribute name.
    pub name: QualifiedName,
    /// The value before the change; `None` when the attribute is new.
    pub old_value: Option<String>,
}

/// Any change an observer can be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    /// An attribute was added, removed or changed.
    Attribute(AttributeChange),
    /// A child list changed.
    ChildList(ChildListChange),
}

impl MutationEvent {
    /// The node the change happened on: the element for attribute changes,
    /// the parent for child-list changes.
    #[must_use]
    pub fn target(&self) -> NodeId {
        match self {
            Self::Attribute(change) => change.element,
            Self::ChildList(change) => change.parent,
        }
    }
}

/// Which subscriptions a change reaches, captured when the change was made.
#[derive(Debug, Clone, Default)]
pub(crate) struct Reach {
    /// The target's ancestor chain, self first.
    pub(crate) path: Vec<NodeId>,
    /// Ancestor-scoped subscriptions whose target lay at or under the
    /// change target.
    pub(crate) below: Vec<u64>,
}

impl From<Vec<NodeId>> for Reach {
    fn from(path: Vec<NodeId>) -> Self {
        Self {
            path,
            below: Vec::new(),
        }
    }
}

/// A change waiting for delivery.
#[derive(Debug, Clone)]
pub(crate) struct Queued {
    pub(crate) event: MutationEvent,
    pub(crate) reach: Reach,
}

/// Marks a document as dispatching; the mark is cleared on drop, so a
/// panicking callback does not stall later deliveries.
struct Dispatching<'a> {
    doc: &'a mut Document,
}

impl<'a> Dispatching<'a> {
    fn enter(doc: &'a mut Document) -> Self {
        doc.dispatching = true;
        Self { doc }
    }
}

impl Drop for Dispatching<'_> {
    fn drop(&mut self) {
        self.doc.dispatching = false;
    }
}

type Callback = dyn FnMut(&mut Document, &MutationEvent) -> Result<(), DomError> + Send;

#[derive(Clone)]
pub(crate) struct Subscription {
    id: u64,
    target: NodeId,
    scope: Scope,
    filter: Option<QualifiedName>,
    callback: Arc<Mutex<Box<Callback>>>,
    disposed: Arc<AtomicBool>,
}

impl Subscription {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("scope", &self.scope)
            .field("filter", &self.filter)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

/// Returned by every `observe_*` call. Dropping the handle does not
/// unsubscribe; call [`dispose`](Self::dispose) or
/// [`Document::unobserve`].
#[derive(Debug, Clone)]
pub struct ObserverHandle {
    id: u64,
    disposed: Arc<AtomicBool>,
}

impl ObserverHandle {
    /// Identifier of the subscription.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops delivery to this subscription. Safe to call from inside a
    /// callback and more than once.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    /// Returns `true` once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// The per-document subscription lists.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    attributes: CowList<Subscription>,
    child_list: CowList<Subscription>,
    next_id: u64,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("attributes", &self.attributes.len())
            .field("child_list", &self.child_list.len())
            .finish()
    }
}

impl ObserverRegistry {
    fn purge(&mut self) -> Result<(), DomError> {
        self.attributes.retain(|s| !s.is_disposed())?;
        self.child_list.retain(|s| !s.is_disposed())
    }
}

#[derive(Clone, Copy)]
enum Lists {
    Attributes,
    ChildList,
    Both,
}

impl Document {
    /// Subscribes to attribute changes.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `target` is stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::{Arc, Mutex};
    /// use arbordom::{Document, Scope};
    ///
    /// let mut doc = Document::new();
    /// let root = doc.create_element("root");
    /// doc.append_child(doc.root(), root).unwrap();
    ///
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = Arc::clone(&seen);
    /// doc.observe_attributes(root, Scope::Target, move |_, change| {
    ///     sink.lock().unwrap().push(change.name.to_string());
    ///     Ok(())
    /// })
    /// .unwrap();
    ///
    /// doc.set_attribute(root, "id", "r").unwrap();
    /// assert_eq!(*seen.lock().unwrap(), vec!["id".to_string()]);
    /// ```
    pub fn observe_attributes<F>(
        &mut self,
        target: NodeId,
        scope: Scope,
        mut callback: F,
    ) -> Result<ObserverHandle, DomError>
    where
        F: FnMut(&mut Document, &AttributeChange) -> Result<(), DomError> + Send + 'static,
    {
        self.subscribe(
            target,
            scope,
            None,
            Lists::Attributes,
            Box::new(move |doc, event| match event {
                MutationEvent::Attribute(change) => callback(doc, change),
                MutationEvent::ChildList(_) => Ok(()),
            }),
        )
    }

    /// Subscribes to changes of the attribute named `name` only.
    ///
    /// The name is matched with the changed element's comparer.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `target` is stale.
    pub fn observe_attribute<F>(
        &mut self,
        target: NodeId,
        scope: Scope,
        name: impl Into<QualifiedName>,
        mut callback: F,
    ) -> Result<ObserverHandle, DomError>
    where
        F: FnMut(&mut Document, &AttributeChange) -> Result<(), DomError> + Send + 'static,
    {
        self.subscribe(
            target,
            scope,
            Some(name.into()),
            Lists::Attributes,
            Box::new(move |doc, event| match event {
                MutationEvent::Attribute(change) => callback(doc, change),
                MutationEvent::ChildList(_) => Ok(()),
            }),
        )
    }

    /// Subscribes to child-list changes.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `target` is stale.
    pub fn observe_child_list<F>(
        &mut self,
        target: NodeId,
        scope: Scope,
        mut callback: F,
    ) -> Result<ObserverHandle, DomError>
    where
        F: FnMut(&mut Document, &ChildListChange) -> Result<(), DomError> + Send + 'static,
    {
        self.subscribe(
            target,
            scope,
            None,
            Lists::ChildList,
            Box::new(move |doc, event| match event {
                MutationEvent::ChildList(change) => callback(doc, change),
                MutationEvent::Attribute(_) => Ok(()),
            }),
        )
    }

    /// Subscribes to every kind of change.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::StaleNode`] if `target` is stale.
    pub fn observe<F>(
        &mut self,
        target: NodeId,
        scope: Scope,
        callback: F,
    ) -> Result<ObserverHandle, DomError>
    where
        F: FnMut(&mut Document, &MutationEvent) -> Result<(), DomError> + Send + 'static,
    {
        self.subscribe(target, scope, None, Lists::Both, Box::new(callback))
    }

    /// Disposes the subscription and removes it from the registry now.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::ReadOnly`] only if the registry was frozen, which
    /// this crate never does.
    pub fn unobserve(&mut self, handle: &ObserverHandle) -> Result<(), DomError> {
        handle.dispose();
        let id = handle.id;
        self.observers.attributes.retain(|s| s.id != id)?;
        self.observers.child_list.retain(|s| s.id != id)?;
        trace!(id, "observer removed");
        Ok(())
    }

    /// Number of live (not disposed) subscriptions.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        let mut ids: Vec<u64> = self
            .observers
            .attributes
            .as_slice()
            .iter()
            .chain(self.observers.child_list.as_slice())
            .filter(|s| !s.is_disposed())
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    fn subscribe(
        &mut self,
        target: NodeId,
        scope: Scope,
        filter: Option<QualifiedName>,
        lists: Lists,
        callback: Box<Callback>,
    ) -> Result<ObserverHandle, DomError> {
        self.try_node(target)?;
        self.observers.purge()?;
        let id = self.observers.next_id;
        self.observers.next_id += 1;
        let disposed = Arc::new(AtomicBool::new(false));
        let subscription = Subscription {
            id,
            target,
            scope,
            filter,
            callback: Arc::new(Mutex::new(callback)),
            disposed: Arc::clone(&disposed),
        };
        match lists {
            Lists::Attributes => self.observers.attributes.push(subscription)?,
            Lists::ChildList => self.observers.child_list.push(subscription)?,
            Lists::Both => {
                self.observers.attributes.push(subscription.clone())?;
                self.observers.child_list.push(subscription)?;
            }
        }
        trace!(id, ?target, ?scope, "observer registered");
        Ok(ObserverHandle { id, disposed })
    }

    // --- Notification ---

    /// Feeds a child-list change through the batch layer into the queue.
    pub(crate) fn record_child_change(&mut self, change: ChildListChange) {
        let reach = self.reach_of(change.parent, &self.observers.child_list);
        trace!(parent = ?change.parent, kind = ?change.kind(), "child list changed");
        let ready = self.batches.record(change, reach);
        self.queue.extend(ready);
    }

    /// Queues an attribute change behind any pending child-list changes.
    pub(crate) fn record_attribute_change(&mut self, change: AttributeChange) {
        let flushed = self.batches.flush_all();
        self.queue.extend(flushed);
        let reach = self.reach_of(change.element, &self.observers.attributes);
        trace!(element = ?change.element, name = %change.name, "attribute changed");
        self.queue.push_back(Queued {
            event: MutationEvent::Attribute(change),
            reach,
        });
    }

    fn reach_of(&self, node: NodeId, subscriptions: &CowList<Subscription>) -> Reach {
        let below = subscriptions
            .as_slice()
            .iter()
            .filter(|s| s.scope == Scope::TargetAndAncestors && !s.is_disposed())
            .filter(|s| self.ancestors(s.target).any(|a| a == node))
            .map(|s| s.id)
            .collect();
        Reach {
            path: self.ancestors(node).collect(),
            below,
        }
    }

    /// Delivers queued changes unless a batch is open or delivery is already
    /// running further up the stack.
    pub(crate) fn deliver(&mut self) -> Result<(), DomError> {
        if self.dispatching || self.batches.is_active() {
            return Ok(());
        }
        let mut guard = Dispatching::enter(self);
        let mut first_error = None;
        while let Some(queued) = guard.doc.queue.pop_front() {
            if let Err(err) = guard.doc.dispatch(&queued) {
                first_error.get_or_insert(err);
            }
        }
        drop(guard);
        match first_error {
            Some(err) => Err(DomError::Observer(Box::new(err))),
            None => Ok(()),
        }
    }

    fn dispatch(&mut self, queued: &Queued) -> Result<(), DomError> {
        let subscriptions = match queued.event {
            MutationEvent::Attribute(_) => self.observers.attributes.iter(),
            MutationEvent::ChildList(_) => self.observers.child_list.iter(),
        };
        let mut first_error = None;
        for subscription in subscriptions {
            if subscription.is_disposed() || !self.reaches(&subscription, queued) {
                continue;
            }
            trace!(id = subscription.id, target = ?queued.event.target(), "dispatching");
            let mut callback = subscription
                .callback
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = (*callback)(self, &queued.event) {
                warn!(id = subscription.id, error = %err, "observer callback failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn reaches(&self, subscription: &Subscription, queued: &Queued) -> bool {
        if !self.contains(subscription.target) {
            return false;
        }
        if let (Some(filter), MutationEvent::Attribute(change)) =
            (&subscription.filter, &queued.event)
        {
            if !self.attribute_comparer(change.element).equals(filter, &change.name) {
                return false;
            }
        }
        let node = queued.event.target();
        match subscription.scope {
            Scope::Target => subscription.target == node,
            Scope::TargetAndDescendants => queued.reach.path.contains(&subscription.target),
            Scope::TargetAndAncestors => queued.reach.below.contains(&subscription.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(b, c).unwrap();
        (doc, a, b, c)
    }

    fn counter(
        doc: &mut Document,
        target: NodeId,
        scope: Scope,
    ) -> (Arc<Mutex<usize>>, ObserverHandle) {
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        let handle = doc
            .observe(target, scope, move |_, _| {
                *sink.lock().unwrap() += 1;
                Ok(())
            })
            .unwrap();
        (hits, handle)
    }

    #[test]
    fn test_scope_reach() {
        let (mut doc, a, b, c) = tree();
        let (on_target, _) = counter(&mut doc, b, Scope::Target);
        let (below, _) = counter(&mut doc, a, Scope::TargetAndDescendants);
        let (above, _) = counter(&mut doc, c, Scope::TargetAndAncestors);

        doc.set_attribute(c, "x", "1").unwrap();
        assert_eq!(*on_target.lock().unwrap(), 0);
        assert_eq!(*below.lock().unwrap(), 1);
        assert_eq!(*above.lock().unwrap(), 1);

        doc.set_attribute(b, "x", "1").unwrap();
        assert_eq!(*on_target.lock().unwrap(), 1);
        assert_eq!(*below.lock().unwrap(), 2);
        assert_eq!(*above.lock().unwrap(), 2);

        let sibling = doc.create_element("d");
        doc.append_child(a, sibling).unwrap();
        assert_eq!(*below.lock().unwrap(), 3);
        assert_eq!(*above.lock().unwrap(), 3);
        doc.set_attribute(sibling, "y", "2").unwrap();
        assert_eq!(*above.lock().unwrap(), 3);
    }

    #[test]
    fn test_disposed_subscription_never_fires() {
        let (mut doc, a, _, _) = tree();
        let (hits, handle) = counter(&mut doc, a, Scope::Target);
        handle.dispose();
        doc.set_attribute(a, "x", "1").unwrap();
        assert_eq!(*hits.lock().unwrap(), 0);
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_callback_can_register_and_dispose_during_dispatch() {
        let (mut doc, a, _, _) = tree();
        let (late_hits, late) = counter(&mut doc, a, Scope::Target);
        let late = Arc::new(late);
        let registered = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&registered);
        let to_dispose = Arc::clone(&late);
        doc.observe_attributes(a, Scope::Target, move |doc, change| {
            to_dispose.dispose();
            if slot.lock().unwrap().is_none() {
                let handle = doc.observe_attributes(change.element, Scope::Target, |_, _| Ok(()))?;
                *slot.lock().unwrap() = Some(handle);
            }
            Ok(())
        })
        .unwrap();

        doc.set_attribute(a, "x", "1").unwrap();
        // The counter was registered first, so it ran before being disposed.
        assert_eq!(*late_hits.lock().unwrap(), 1);
        doc.set_attribute(a, "x", "2").unwrap();
        assert_eq!(*late_hits.lock().unwrap(), 1);
        assert!(registered.lock().unwrap().is_some());
    }

    #[test]
    fn test_changes_made_by_callbacks_are_queued_in_order() {
        let (mut doc, a, b, _) = tree();
        let order = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&order);
        doc.observe(a, Scope::TargetAndDescendants, move |doc, event| {
            let label = match event {
                MutationEvent::Attribute(c) => format!("attr {}", c.name),
                MutationEvent::ChildList(c) => format!("{:?}", c.kind()),
            };
            sink.lock().unwrap().push(label);
            if let MutationEvent::Attribute(c) = event {
                if c.name.local_name() == "first" {
                    doc.set_attribute(c.element, "second", "1")?;
                }
            }
            Ok(())
        })
        .unwrap();

        doc.set_attribute(b, "first", "1").unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec!["attr first".to_string(), "attr second".to_string()]
        );
    }

    #[test]
    fn test_observer_error_reaches_caller_after_commit() {
        let (mut doc, a, _, _) = tree();
        let (hits, _) = counter(&mut doc, a, Scope::Target);
        doc.observe_attributes(a, Scope::Target, |_, _| Err(DomError::ReadOnly))
            .unwrap();
        let (later, _) = counter(&mut doc, a, Scope::Target);

        let err = doc.set_attribute(a, "x", "1").unwrap_err();
        assert_eq!(err, DomError::Observer(Box::new(DomError::ReadOnly)));
        assert_eq!(doc.attribute_value(a, "x"), Some("1"));
        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(*later.lock().unwrap(), 1);
    }

    #[test]
    fn test_attribute_filter() {
        let (mut doc, a, _, _) = tree();
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        doc.observe_attribute(a, Scope::Target, "id", move |_, _| {
            *sink.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
        doc.set_attribute(a, "class", "x").unwrap();
        doc.set_attribute(a, "id", "y").unwrap();
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_unobserve_removes_eagerly() {
        let (mut doc, a, _, _) = tree();
        let (_, handle) = counter(&mut doc, a, Scope::Target);
        assert_eq!(doc.observer_count(), 1);
        doc.unobserve(&handle).unwrap();
        assert!(handle.is_disposed());
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn test_stale_target_rejected() {
        let mut doc = Document::new();
        let x = doc.create_element("x");
        doc.dispose(x).unwrap();
        assert_eq!(
            doc.observe(x, Scope::Target, |_, _| Ok(())).unwrap_err(),
            DomError::StaleNode
        );
    }

    #[test]
    fn test_scopes_use_tree_shape_at_change_time() {
        let (mut doc, a, b, c) = tree();
        let (up, _) = counter(&mut doc, c, Scope::TargetAndAncestors);
        let (down, _) = counter(&mut doc, b, Scope::TargetAndDescendants);

        doc.with_batch(|doc| {
            doc.set_attribute(c, "k", "2")?;
            doc.set_attribute(b, "k", "1")?;
            // After this move b is no longer an ancestor of c.
            doc.append_child(a, c)
        })
        .unwrap();

        assert_eq!(*up.lock().unwrap(), 3);
        assert_eq!(*down.lock().unwrap(), 3);
    }

    #[test]
    fn test_panicking_callback_does_not_stall_delivery() {
        let (mut doc, a, _, _) = tree();
        let handle = doc
            .observe_attributes(a, Scope::Target, |_, _| panic!("callback failure"))
            .unwrap();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            doc.set_attribute(a, "k", "1")
        }));
        assert!(outcome.is_err());
        assert!(!doc.dispatching);

        doc.unobserve(&handle).unwrap();
        let (hits, _) = counter(&mut doc, a, Scope::Target);
        doc.set_attribute(a, "k", "2").unwrap();
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
