//! Observer delivery and batching, driven through the public API.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use arbordom::{
    ChildListChange, ChildListChangeKind, Document, DomError, MutationEvent, NodeId, Scope,
};

fn record_children(doc: &mut Document, target: NodeId, scope: Scope) -> Arc<Mutex<Vec<ChildListChange>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    doc.observe_child_list(target, scope, move |_, change| {
        sink.lock().unwrap().push(change.clone());
        Ok(())
    })
    .unwrap();
    seen
}

#[test]
fn test_appending_two_children_is_one_notification() {
    let mut doc = Document::new();
    let a = doc.create_element("a");
    doc.append_child(doc.root(), a).unwrap();
    let b = doc.create_element("b");
    let c = doc.create_element("c");
    doc.set_attribute(b, "id", "x").unwrap();
    doc.set_attribute(c, "id", "y").unwrap();
    let seen = record_children(&mut doc, a, Scope::Target);

    doc.append_children(a, &[b, c]).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind(), ChildListChangeKind::Add);
    assert_eq!(seen[0].added, vec![b, c]);
    assert_eq!(seen[0].previous_sibling, None);
    assert_eq!(seen[0].next_sibling, None);
}

#[test]
fn test_batch_coalesces_adjacent_appends() {
    let mut doc = Document::parse_str("<list><end/></list>").unwrap();
    let list = doc.document_element().unwrap();
    let end = doc.first_child(list).unwrap();
    let seen = record_children(&mut doc, list, Scope::Target);

    let items = doc
        .with_batch(|doc| {
            let mut items = Vec::new();
            for _ in 0..3 {
                let item = doc.create_element("item");
                doc.insert_before(end, item)?;
                items.push(item);
            }
            assert!(seen.lock().unwrap().is_empty());
            Ok(items)
        })
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].added, items);
    assert_eq!(seen[0].next_sibling, Some(end));
}

#[test]
fn test_nested_batches_deliver_at_the_outermost_close() {
    let mut doc = Document::parse_str("<r/>").unwrap();
    let r = doc.document_element().unwrap();
    let seen = record_children(&mut doc, r, Scope::Target);

    let mut outer = doc.begin_batch();
    let first = outer.create_element("a");
    outer.append_child(r, first).unwrap();
    outer
        .with_batch(|doc| {
            let second = doc.create_element("b");
            doc.append_child(r, second)
        })
        .unwrap();
    assert_eq!(outer.batch_depth(), 1);
    assert!(seen.lock().unwrap().is_empty());
    outer.finish().unwrap();

    assert!(!doc.in_batch());
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].added.len(), 2);
}

#[test]
fn test_attribute_changes_are_ordered_with_child_changes() {
    let mut doc = Document::parse_str("<r/>").unwrap();
    let r = doc.document_element().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    doc.observe(r, Scope::TargetAndDescendants, move |_, event| {
        let entry = match event {
            MutationEvent::Attribute(change) => {
                format!("attr {}={:?}", change.name, change.old_value)
            }
            MutationEvent::ChildList(change) => format!("{:?} {}", change.kind(), change.added.len()),
        };
        sink.lock().unwrap().push(entry);
        Ok(())
    })
    .unwrap();

    doc.with_batch(|doc| {
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(r, a)?;
        doc.append_child(r, b)?;
        doc.set_attribute(r, "k", "1")?;
        doc.set_attribute(r, "k", "2")?;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "Add 2".to_string(),
            "attr k=None".to_string(),
            "attr k=Some(\"1\")".to_string(),
        ]
    );
}

#[test]
fn test_moves_report_remove_and_add() {
    let mut doc = Document::parse_str("<r><a><x/></a><b/></r>").unwrap();
    let r = doc.document_element().unwrap();
    let a = doc.child_at(r, 0).unwrap();
    let b = doc.child_at(r, 1).unwrap();
    let x = doc.first_child(a).unwrap();
    let seen = record_children(&mut doc, r, Scope::TargetAndDescendants);

    doc.append_child(b, x).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].parent, seen[0].kind()), (a, ChildListChangeKind::Remove));
    assert_eq!(seen[0].removed, vec![x]);
    assert_eq!((seen[1].parent, seen[1].kind()), (b, ChildListChangeKind::Add));
}

#[test]
fn test_removed_subtree_is_out_of_descendant_scope() {
    let mut doc = Document::parse_str("<r><a/></r>").unwrap();
    let r = doc.document_element().unwrap();
    let a = doc.first_child(r).unwrap();
    let hits = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&hits);
    doc.observe_attributes(r, Scope::TargetAndDescendants, move |_, _| {
        *sink.lock().unwrap() += 1;
        Ok(())
    })
    .unwrap();

    doc.set_attribute(a, "k", "1").unwrap();
    doc.remove_node(a).unwrap();
    doc.set_attribute(a, "k", "2").unwrap();
    assert_eq!(*hits.lock().unwrap(), 1);
}

#[test]
fn test_failing_observer_does_not_roll_back() {
    let mut doc = Document::parse_str("<r/>").unwrap();
    let r = doc.document_element().unwrap();
    let handle = doc
        .observe_child_list(r, Scope::Target, |_, _| Err(DomError::ReadOnly))
        .unwrap();
    let child = doc.create_element("c");

    let err = doc.append_child(r, child).unwrap_err();
    assert_eq!(err, DomError::Observer(Box::new(DomError::ReadOnly)));
    assert_eq!(doc.parent(child), Some(r));

    doc.unobserve(&handle).unwrap();
    let other = doc.create_element("d");
    doc.append_child(r, other).unwrap();
}

#[test]
fn test_callbacks_may_mutate_the_document() {
    let mut doc = Document::parse_str("<r/>").unwrap();
    let r = doc.document_element().unwrap();
    // Stamp every added element with an attribute.
    doc.observe_child_list(r, Scope::Target, |doc, change| {
        for &node in &change.added {
            doc.set_attribute(node, "seen", "1")?;
        }
        Ok(())
    })
    .unwrap();

    let a = doc.create_element("a");
    doc.append_child(r, a).unwrap();
    assert_eq!(doc.attribute_value(a, "seen"), Some("1"));
}

#[test]
fn test_document_is_send() {
    fn assert_send<T: Send>(_: &T) {}
    let mut doc = Document::parse_str("<r/>").unwrap();
    let r = doc.document_element().unwrap();
    doc.observe(r, Scope::Target, |_, _| Ok(())).unwrap();
    assert_send(&doc);

    let handle = std::thread::spawn(move || {
        let c = doc.create_element("c");
        doc.append_child(r, c).unwrap();
        doc.child_count(r)
    });
    assert_eq!(handle.join().unwrap(), 1);
}
