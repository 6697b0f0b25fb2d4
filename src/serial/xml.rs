//! XML serializer.
//!
//! Serializes a `Document` tree into a well-formed XML string. The tree is
//! walked with a [`Visitor`] that drives an [`XmlWriter`]; namespace
//! declarations missing from the tree are synthesized on the element that
//! first needs them.

use std::collections::HashMap;

use super::writer::{write_escaped_attr, XmlWriter};
use crate::error::DomError;
use crate::name::QualifiedName;
use crate::tree::{declared_prefix, Document, NodeId, NodeKind};
use crate::util::qname::{is_xml_whitespace, XMLNS_NAMESPACE, XML_NAMESPACE};
use crate::visit::{walk, ExternalId, Visitor};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use arbordom::Document;
/// use arbordom::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true)).unwrap();
/// assert!(xml.contains("  <child>"));
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
    /// Whether a document starts with an XML declaration. Defaults to `true`.
    pub declaration: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
            declaration: true,
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented (pretty-printed) output.
    ///
    /// When enabled, child elements are placed on their own lines with
    /// indentation. Mixed-content elements (those containing both text and
    /// element children) are not indented.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }

    /// Enables or disables the `<?xml ...?>` declaration.
    #[must_use]
    pub fn declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}


/// Serializes a document to an XML string with default options.
///
/// # Errors
///
/// [`DomError::InvalidState`] if the tree cannot be written as well-formed
/// XML.
pub fn serialize(doc: &Document) -> Result<String, DomError> {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string.
///
/// # Errors
///
/// As [`serialize`].
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> Result<String, DomError> {
    let mut serializer = XmlSerializer::for_document(options);
    if options.declaration {
        serializer.writer.declaration(
            doc.version.as_deref().unwrap_or("1.0"),
            doc.encoding.as_deref(),
            doc.standalone,
        )?;
        serializer.top_level_started = true;
    }
    walk(doc, doc.root(), &mut serializer)?;
    serializer.writer.text("\n")?;
    serializer.finish()
}

/// Serializes a single node and its subtree.
///
/// The document node is serialized as with [`serialize_with_options`]; an
/// attribute becomes `name="value"`; a document type is written without an
/// XML declaration. Namespaces used in the subtree are declared in the
/// output, so it stands alone.
///
/// # Errors
///
/// [`DomError::StaleNode`] for a stale handle, [`DomError::InvalidState`]
/// for entity and notation declarations outside their doctype.
pub fn serialize_node(doc: &Document, id: NodeId, options: &SerializeOptions) -> Result<String, DomError> {
    let mut serializer = match &doc.try_node(id)?.kind {
        NodeKind::Document { .. } => return serialize_with_options(doc, options),
        NodeKind::Attribute { name, value } => {
            let mut out = attribute_markup_name(name);
            out.push_str("=\"");
            write_escaped_attr(&mut out, value);
            out.push('"');
            return Ok(out);
        }
        NodeKind::DocumentType { .. } => XmlSerializer::for_document(options),
        _ => XmlSerializer::for_fragment(options),
    };
    walk(doc, id, &mut serializer)?;
    serializer.finish()
}

impl Document {
    /// Serializes the document with default options. See [`serialize`].
    ///
    /// # Errors
    ///
    /// As [`serialize`].
    pub fn to_xml_string(&self) -> Result<String, DomError> {
        serialize(self)
    }
}

/// The markup name of an attribute whose namespace needs no binding.
fn attribute_markup_name(name: &QualifiedName) -> String {
    match name.namespace() {
        Some(XMLNS_NAMESPACE) if name.local_name() == "xmlns" => "xmlns".to_string(),
        Some(XMLNS_NAMESPACE) => format!("xmlns:{}", name.local_name()),
        Some(XML_NAMESPACE) => format!("xml:{}", name.local_name()),
        _ => name.qualified(),
    }
}

/// Returns true if the element has element children and no text content
/// other than whitespace, which makes it safe to indent.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    let mut has_element_child = false;
    for child in doc.children(id) {
        match doc.get(child).map(|n| &n.kind) {
            Some(NodeKind::Element { .. }) => has_element_child = true,
            Some(NodeKind::Text { content }) => {
                if !is_xml_whitespace(content) {
                    return false;
                }
            }
            Some(NodeKind::CData { .. } | NodeKind::EntityReference { .. }) => return false,
            _ => {}
        }
    }
    has_element_child
}

/// A prefix binding; an empty URI undeclares the default namespace.
#[derive(Debug, Clone)]
struct Binding {
    prefix: Option<String>,
    uri: String,
}

/// A [`Visitor`] that writes the nodes it visits through an [`XmlWriter`].
///
/// Use [`serialize`] or [`serialize_node`] unless you need to drive the walk
/// yourself.
#[derive(Debug)]
pub struct XmlSerializer<'o> {
    writer: XmlWriter,
    options: &'o SerializeOptions,
    document: bool,
    /// One frame of bindings per open element.
    scopes: Vec<Vec<Binding>>,
    /// Markup names computed for the attributes of the current element.
    attribute_names: HashMap<NodeId, String>,
    /// For each open element, whether its children are indented.
    open: Vec<bool>,
    in_doctype: bool,
    top_level_started: bool,
    generated: usize,
}

impl<'o> XmlSerializer<'o> {
    /// A serializer for a whole document. Top-level nodes go on their own
    /// lines and top-level whitespace text is dropped.
    #[must_use]
    pub fn for_document(options: &'o SerializeOptions) -> Self {
        Self::with_writer(XmlWriter::new(), options, true)
    }

    /// A serializer for a fragment or a single subtree.
    #[must_use]
    pub fn for_fragment(options: &'o SerializeOptions) -> Self {
        Self::with_writer(XmlWriter::fragment(), options, false)
    }

    fn with_writer(writer: XmlWriter, options: &'o SerializeOptions, document: bool) -> Self {
        Self {
            writer,
            options,
            document,
            scopes: Vec::new(),
            attribute_names: HashMap::new(),
            open: Vec::new(),
            in_doctype: false,
            top_level_started: false,
            generated: 0,
        }
    }

    /// Returns the output.
    ///
    /// # Errors
    ///
    /// As [`XmlWriter::finish`].
    pub fn finish(self) -> Result<String, DomError> {
        self.writer.finish()
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|b| b.prefix.as_deref() == prefix)
            .map(|b| b.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    fn declared_here(&self, prefix: Option<&str>) -> bool {
        self.scopes
            .last()
            .is_some_and(|frame| frame.iter().any(|b| b.prefix.as_deref() == prefix))
    }

    fn declare(&mut self, prefix: Option<&str>, uri: &str, synthesized: &mut Vec<Binding>) {
        let binding = Binding {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        };
        if let Some(frame) = self.scopes.last_mut() {
            frame.push(binding.clone());
        }
        synthesized.push(binding);
    }

    /// Picks a prefix bound to `uri`, declaring one when none is in scope.
    /// Attributes never use the default namespace.
    fn prefix_for(
        &mut self,
        uri: &str,
        preferred: Option<&str>,
        attribute: bool,
        synthesized: &mut Vec<Binding>,
    ) -> Option<String> {
        if !(attribute && preferred.is_none()) {
            if self.lookup(preferred) == Some(uri) {
                return preferred.map(str::to_string);
            }
            if !self.declared_here(preferred) && preferred != Some("xml") {
                self.declare(preferred, uri, synthesized);
                return preferred.map(str::to_string);
            }
        }
        let existing = self
            .scopes
            .iter()
            .rev()
            .flatten()
            .filter_map(|b| b.prefix.as_deref())
            .find(|&p| self.lookup(Some(p)) == Some(uri))
            .map(str::to_string);
        if existing.is_some() {
            return existing;
        }
        let prefix = loop {
            let candidate = format!("ns{}", self.generated);
            self.generated += 1;
            if self.lookup(Some(&candidate)).is_none() && !self.declared_here(Some(&candidate)) {
                break candidate;
            }
        };
        self.declare(Some(&prefix), uri, synthesized);
        Some(prefix)
    }

    fn indent_line(&mut self, depth: usize) -> Result<(), DomError> {
        let line = format!("\n{}", self.options.indent_str.repeat(depth));
        self.writer.text(&line)
    }

    /// Runs before every node written as content or at the top level.
    /// Returns `false` for layout whitespace that is skipped.
    fn before_child(&mut self, whitespace_text: bool) -> Result<bool, DomError> {
        if self.in_doctype {
            return Ok(true);
        }
        match self.open.last() {
            Some(&indented) => {
                if self.options.indent && indented {
                    if whitespace_text {
                        return Ok(false);
                    }
                    self.indent_line(self.open.len())?;
                }
                Ok(true)
            }
            None if self.document => {
                if whitespace_text {
                    return Ok(false);
                }
                if self.top_level_started {
                    self.writer.text("\n")?;
                }
                self.top_level_started = true;
                Ok(true)
            }
            None => Ok(true),
        }
    }
}

impl Visitor for XmlSerializer<'_> {
    fn visit_element(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &QualifiedName,
    ) -> Result<(), DomError> {
        self.before_child(false)?;

        let declared: Vec<Binding> = doc
            .attributes(id)
            .filter_map(|attribute| {
                let prefix = declared_prefix(doc.element_name(attribute)?)?;
                Some(Binding {
                    prefix: prefix.map(str::to_string),
                    uri: doc.node_text(attribute).unwrap_or_default().to_string(),
                })
            })
            .collect();
        self.scopes.push(declared);

        let mut synthesized = Vec::new();
        let markup = match name.namespace() {
            Some(uri) => match self.prefix_for(uri, name.prefix(), false, &mut synthesized) {
                Some(prefix) => format!("{prefix}:{}", name.local_name()),
                None => name.local_name().to_string(),
            },
            None => {
                if name.prefix().is_none() && self.lookup(None).is_some() && !self.declared_here(None)
                {
                    self.declare(None, "", &mut synthesized);
                }
                name.qualified()
            }
        };

        self.attribute_names.clear();
        for attribute in doc.attributes(id) {
            let Some(attr_name) = doc.element_name(attribute) else {
                continue;
            };
            let attr_markup = match attr_name.namespace() {
                Some(XMLNS_NAMESPACE | XML_NAMESPACE) | None => attribute_markup_name(attr_name),
                Some(uri) => {
                    let prefix = self.prefix_for(uri, attr_name.prefix(), true, &mut synthesized);
                    match prefix {
                        Some(prefix) => format!("{prefix}:{}", attr_name.local_name()),
                        None => attr_name.local_name().to_string(),
                    }
                }
            };
            self.attribute_names.insert(attribute, attr_markup);
        }

        self.writer.start_element(&markup)?;
        for binding in synthesized {
            let attr = match &binding.prefix {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            self.writer.attribute(&attr, &binding.uri)?;
        }
        self.open.push(self.options.indent && is_element_only(doc, id));
        Ok(())
    }

    fn leave_element(&mut self, _: &Document, _: NodeId, _: &QualifiedName) -> Result<(), DomError> {
        let indented = self.open.pop().unwrap_or(false);
        if indented {
            self.indent_line(self.open.len())?;
        }
        self.scopes.pop();
        self.writer.end_element()
    }

    fn visit_attribute(
        &mut self,
        _: &Document,
        id: NodeId,
        name: &QualifiedName,
        value: &str,
    ) -> Result<(), DomError> {
        let markup = self
            .attribute_names
            .remove(&id)
            .unwrap_or_else(|| attribute_markup_name(name));
        self.writer.attribute(&markup, value)
    }

    fn visit_text(&mut self, _: &Document, _: NodeId, content: &str) -> Result<(), DomError> {
        if self.before_child(is_xml_whitespace(content))? {
            self.writer.text(content)?;
        }
        Ok(())
    }

    fn visit_cdata(&mut self, _: &Document, _: NodeId, content: &str) -> Result<(), DomError> {
        self.before_child(false)?;
        self.writer.cdata(content)
    }

    fn visit_comment(&mut self, _: &Document, _: NodeId, content: &str) -> Result<(), DomError> {
        self.before_child(false)?;
        self.writer.comment(content)
    }

    fn visit_processing_instruction(
        &mut self,
        _: &Document,
        _: NodeId,
        target: &str,
        data: Option<&str>,
    ) -> Result<(), DomError> {
        self.before_child(false)?;
        self.writer.processing_instruction(target, data)
    }

    fn visit_document_type(
        &mut self,
        _: &Document,
        _: NodeId,
        name: &str,
        external: ExternalId<'_>,
    ) -> Result<(), DomError> {
        self.before_child(false)?;
        self.writer
            .start_doctype(name, external.public_id, external.system_id)?;
        self.in_doctype = true;
        Ok(())
    }

    fn leave_document_type(&mut self, _: &Document, _: NodeId) -> Result<(), DomError> {
        self.in_doctype = false;
        self.writer.end_doctype()
    }

    fn visit_entity(
        &mut self,
        _: &Document,
        _: NodeId,
        name: &str,
        value: Option<&str>,
        external: ExternalId<'_>,
        notation: Option<&str>,
    ) -> Result<(), DomError> {
        self.writer.entity_declaration(
            name,
            value,
            external.public_id,
            external.system_id,
            notation,
        )
    }

    fn visit_entity_reference(&mut self, _: &Document, _: NodeId, name: &str) -> Result<(), DomError> {
        self.before_child(false)?;
        self.writer.entity_reference(name)
    }

    fn visit_notation(
        &mut self,
        _: &Document,
        _: NodeId,
        name: &str,
        external: ExternalId<'_>,
    ) -> Result<(), DomError> {
        self.writer
            .notation_declaration(name, external.public_id, external.system_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn no_decl() -> SerializeOptions {
        SerializeOptions::default().declaration(false)
    }

    #[test]
    fn test_serialize_built_tree() {
        let mut doc = Document::new();
        let root = doc.create_element("root");
        let child = doc.create_element("child");
        let text = doc.create_text("a & b");
        let comment = doc.create_comment(" note ");
        doc.append_child(doc.root(), comment).unwrap();
        doc.append_child(doc.root(), root).unwrap();
        doc.append_child(root, child).unwrap();
        doc.append_child(child, text).unwrap();
        doc.set_attribute(root, "id", "r<1>").unwrap();

        assert_eq!(
            serialize(&doc).unwrap(),
            "<?xml version=\"1.0\"?>\n<!-- note -->\n<root id=\"r&lt;1&gt;\"><child>a &amp; b</child></root>\n"
        );
    }

    #[test]
    fn test_indentation_skips_mixed_content() {
        let mut doc = Document::new();
        let root = doc.create_element("root");
        let a = doc.create_element("a");
        let p = doc.create_element("p");
        let t = doc.create_text("x");
        let b = doc.create_element("b");
        let ws = doc.create_text("\n   ");
        doc.append_child(doc.root(), root).unwrap();
        doc.append_children(root, &[a, ws, p]).unwrap();
        doc.append_children(p, &[t, b]).unwrap();

        let options = no_decl().indent(true);
        assert_eq!(
            serialize_with_options(&doc, &options).unwrap(),
            "<root>\n  <a/>\n  <p>x<b/></p>\n</root>\n"
        );
    }

    #[test]
    fn test_missing_namespace_declarations_are_synthesized() {
        let mut doc = Document::new();
        let root = doc.create_element(QualifiedName::with_namespace("urn:d", "root"));
        let inner = doc.create_element(QualifiedName::with_namespace("urn:x", "item").with_prefix("x"));
        let plain = doc.create_element("plain");
        doc.append_child(doc.root(), root).unwrap();
        doc.append_children(root, &[inner, plain]).unwrap();
        doc.set_attribute(inner, QualifiedName::with_namespace("urn:a", "flag"), "1")
            .unwrap();

        assert_eq!(
            serialize_with_options(&doc, &no_decl()).unwrap(),
            "<root xmlns=\"urn:d\"><x:item xmlns:x=\"urn:x\" xmlns:ns0=\"urn:a\" ns0:flag=\"1\"/>\
             <plain xmlns=\"\"/></root>\n"
        );
    }

    #[test]
    fn test_existing_declarations_are_reused() {
        let mut doc = Document::new();
        let root = doc.create_element(QualifiedName::with_namespace("urn:x", "root").with_prefix("x"));
        doc.append_child(doc.root(), root).unwrap();
        doc.set_attribute(
            root,
            QualifiedName::with_namespace(XMLNS_NAMESPACE, "x").with_prefix("xmlns"),
            "urn:x",
        )
        .unwrap();
        assert_eq!(
            serialize_node(&doc, root, &no_decl()).unwrap(),
            "<x:root xmlns:x=\"urn:x\"/>"
        );
    }

    #[test]
    fn test_doctype_and_declaration_fields() {
        let mut doc = Document::new();
        doc.version = Some("1.1".to_string());
        doc.encoding = Some("UTF-8".to_string());
        doc.standalone = Some(true);
        let dt = doc.create_document_type("root", None, None);
        let entity = doc.create_entity("e", "value");
        doc.append_child(dt, entity).unwrap();
        let root = doc.create_element("root");
        let reference = doc.create_entity_reference("e");
        doc.append_child(doc.root(), dt).unwrap();
        doc.append_child(doc.root(), root).unwrap();
        doc.append_child(root, reference).unwrap();

        assert_eq!(
            serialize(&doc).unwrap(),
            "<?xml version=\"1.1\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <!DOCTYPE root [<!ENTITY e \"value\">]>\n<root>&e;</root>\n"
        );
    }

    #[test]
    fn test_serialize_single_nodes() {
        let mut doc = Document::new();
        let frag = doc.create_document_fragment();
        let t = doc.create_text("lead");
        let e = doc.create_element("e");
        doc.append_children(frag, &[t, e]).unwrap();
        let options = SerializeOptions::default();
        assert_eq!(serialize_node(&doc, frag, &options).unwrap(), "lead<e/>");

        let attr = doc.create_attribute("title", "say \"hi\"");
        assert_eq!(
            serialize_node(&doc, attr, &options).unwrap(),
            "title=\"say &quot;hi&quot;\""
        );
    }
}
