//! Reading and writing: parse, serialize, parse again and compare trees.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use arbordom::reader::{EventReader, ReaderOptions, XmlEvent};
use arbordom::serial::{serialize, serialize_with_options, SerializeOptions, XmlWriter};
use arbordom::{ChildStorage, CowList, Document, DocumentOptions, DomError, QualifiedName, TreeBuilder};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE catalog [<!ENTITY copy "(c)"><!NOTATION gif SYSTEM "image/gif">]>
<!-- head -->
<catalog xmlns="urn:books" xmlns:m="urn:meta" m:rev="3">
  <book id="b1" lang="en">
    <title>Rust &amp; XML</title>
    <m:note><![CDATA[<raw> & ]]></m:note>
  </book>
  <?render fast?>
  <empty/>
</catalog>
<!-- tail -->"#;

fn assert_round_trip(text: &str) {
    let first = Document::parse_str(text).unwrap();
    let written = serialize(&first).unwrap();
    let second = Document::parse_str(&written).unwrap();
    assert!(
        first.structurally_equal(first.root(), &second, second.root()),
        "round trip changed the tree:\n{written}"
    );
    assert_eq!(serialize(&second).unwrap(), written);
}

#[test]
fn test_sample_round_trips() {
    assert_round_trip(SAMPLE);
}

#[test]
fn test_round_trip_with_linked_storage() {
    let first = Document::parse_str_with_options(
        SAMPLE,
        DocumentOptions::default().child_storage(ChildStorage::Linked),
    )
    .unwrap();
    let array = Document::parse_str(SAMPLE).unwrap();
    assert!(first.structurally_equal(first.root(), &array, array.root()));
    assert_eq!(serialize(&first).unwrap(), serialize(&array).unwrap());
}

#[test]
fn test_special_characters_round_trip() {
    assert_round_trip(r#"<r a="&lt;&quot;&apos;&#9;">x &gt; y &#x1F600; ]]&gt;</r>"#);
    assert_round_trip("<r><![CDATA[a]]]]><![CDATA[>b]]></r>");
}

#[test]
fn test_built_tree_with_namespaces_round_trips() {
    let mut doc = Document::new();
    let root = doc.create_element(QualifiedName::with_namespace("urn:a", "root"));
    let child = doc.create_element(QualifiedName::with_namespace("urn:b", "child").with_prefix("b"));
    let plain = doc.create_element("plain");
    doc.append_child(doc.root(), root).unwrap();
    doc.append_children(root, &[child, plain]).unwrap();
    doc.set_attribute(child, QualifiedName::with_namespace("urn:b", "k"), "v")
        .unwrap();

    let written = serialize_with_options(&doc, &SerializeOptions::default().declaration(false)).unwrap();
    let parsed = Document::parse_str(&written).unwrap();
    let parsed_root = parsed.document_element().unwrap();
    assert_eq!(parsed.element_name(parsed_root).unwrap().namespace(), Some("urn:a"));
    let parsed_child = parsed.child_at(parsed_root, 0).unwrap();
    let parsed_plain = parsed.child_at(parsed_root, 1).unwrap();
    assert_eq!(parsed.element_name(parsed_child).unwrap().namespace(), Some("urn:b"));
    assert_eq!(parsed.element_name(parsed_plain).unwrap().namespace(), None);
    assert_eq!(
        parsed.attribute_value_ns(parsed_child, &QualifiedName::with_namespace("urn:b", "k")),
        Some("v")
    );
}

#[test]
fn test_indented_output_reparses_to_same_elements() {
    let doc = Document::parse_str("<r><a><b/></a><c>text</c></r>").unwrap();
    let options = SerializeOptions::default().declaration(false).indent(true);
    let written = serialize_with_options(&doc, &options).unwrap();
    assert_eq!(written, "<r>\n  <a>\n    <b/>\n  </a>\n  <c>text</c>\n</r>\n");

    let trimmed = TreeBuilder::new()
        .build_document(EventReader::with_options(
            &written,
            ReaderOptions::default().trim_whitespace(true),
        ))
        .unwrap();
    assert!(doc.structurally_equal(doc.root(), &trimmed, trimmed.root()));
}

#[test]
fn test_writer_drives_reader() {
    let mut writer = XmlWriter::new();
    writer.declaration("1.0", None, None).unwrap();
    writer.start_element("doc").unwrap();
    writer.attribute("n", "1 < 2").unwrap();
    writer.text("body").unwrap();
    writer.end_element().unwrap();
    let text = writer.finish().unwrap();

    let events: Vec<XmlEvent> = EventReader::new(&text).collect::<Result<_, _>>().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        XmlEvent::StartElement { name, attributes }
            if name == "doc" && attributes == &vec![("n".to_string(), "1 < 2".to_string())]
    )));
}

#[test]
fn test_malformed_input_reports_location() {
    let err = Document::parse_str("<r>\n  <a></b>\n</r>").unwrap_err();
    let DomError::Read(parse) = &err else {
        panic!("expected a read error, got {err:?}");
    };
    assert_eq!(parse.location.line, 2);
}

#[test]
fn test_copy_on_write_list_isolation() {
    let mut original: CowList<u32> = CowList::new();
    original.push(1).unwrap();
    original.push(2).unwrap();
    let snapshot = original.clone();
    let iter = original.iter();

    original.push(3).unwrap();
    assert_eq!(snapshot.as_slice().to_vec(), vec![1, 2]);
    assert_eq!(iter.collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(original.as_slice().to_vec(), vec![1, 2, 3]);
}
