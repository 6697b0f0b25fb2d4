//! Building trees from reader events.
//!
//! [`TreeBuilder`] consumes any stream of [`XmlEvent`]s and links the nodes
//! it creates through the regular mutation API, so the structural rules of
//! the tree apply to built documents too. Prefixes are resolved against a
//! scope stack of the `xmlns` declarations seen so far; declarations
//! themselves become attributes in the `http://www.w3.org/2000/xmlns/`
//! namespace.
//!
//! # Examples
//!
//! ```
//! use arbordom::Document;
//!
//! let doc = Document::parse_str(r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"/>"#).unwrap();
//! let root = doc.document_element().unwrap();
//! let name = doc.element_name(root).unwrap();
//! assert_eq!(name.namespace(), Some("http://www.w3.org/2000/svg"));
//! assert_eq!(name.local_name(), "svg");
//! ```

use tracing::debug;

use crate::config::DocumentOptions;
use crate::error::{DomError, ParseError};
use crate::name::QualifiedName;
use crate::reader::{EventReader, XmlEvent};
use crate::tree::{Document, NodeId, NodeType};
use crate::util::qname::{is_qname, split_qname, XMLNS_NAMESPACE, XML_NAMESPACE};

/// Lets callers supply their own element nodes.
///
/// Returning `None` means no opinion and the builder creates a plain
/// element. A factory typically creates the element itself and attaches
/// annotations to it.
pub trait NodeFactory {
    /// Creates an unlinked element for `name`.
    fn create_element(&self, doc: &mut Document, name: &QualifiedName) -> Option<NodeId>;
}

/// Namespace bindings, one frame per open element.
#[derive(Debug, Default)]
struct Scopes {
    frames: Vec<Vec<(Option<String>, String)>>,
}

impl Scopes {
    fn push(&mut self, bindings: Vec<(Option<String>, String)>) {
        self.frames.push(bindings);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    /// The URI bound to `prefix`; an empty default binding means none.
    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

fn invalid_name(text: &str, target: &'static str) -> DomError {
    DomError::Parse {
        text: text.to_string(),
        target,
    }
}

/// Turns event streams into documents and fragments.
pub struct TreeBuilder<'f> {
    options: DocumentOptions,
    factory: Option<&'f dyn NodeFactory>,
}

impl std::fmt::Debug for TreeBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("options", &self.options)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

impl Default for TreeBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f> TreeBuilder<'f> {
    /// A builder producing documents with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// A builder producing documents with `options`.
    #[must_use]
    pub fn with_options(options: DocumentOptions) -> Self {
        Self {
            options,
            factory: None,
        }
    }

    /// Uses `factory` to create elements.
    #[must_use]
    pub fn factory(mut self, factory: &'f dyn NodeFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Builds a new document.
    ///
    /// # Errors
    ///
    /// [`DomError::Read`] for reader errors and truncated streams,
    /// [`DomError::Parse`] for malformed names and unbound prefixes, and the
    /// structural errors of the mutation API (for example text outside the
    /// root element).
    pub fn build_document<I>(&self, events: I) -> Result<Document, DomError>
    where
        I: IntoIterator<Item = Result<XmlEvent, ParseError>>,
    {
        let mut doc = Document::with_options(self.options);
        let root = doc.root();
        self.build_into(&mut doc, root, events)?;
        debug!(nodes = doc.node_count(), "built document");
        Ok(doc)
    }

    /// Builds a new, unlinked document fragment inside `doc`.
    ///
    /// # Errors
    ///
    /// As [`build_document`](Self::build_document); XML declarations and
    /// doctypes are structural errors in a fragment.
    pub fn build_fragment<I>(&self, doc: &mut Document, events: I) -> Result<NodeId, DomError>
    where
        I: IntoIterator<Item = Result<XmlEvent, ParseError>>,
    {
        let fragment = doc.create_document_fragment();
        if let Err(error) = self.build_into(doc, fragment, events) {
            if let Err(err) = doc.dispose(fragment) {
                debug!(?fragment, error = %err, "could not free partial fragment");
            }
            return Err(error);
        }
        Ok(fragment)
    }

    fn build_into<I>(&self, doc: &mut Document, base: NodeId, events: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = Result<XmlEvent, ParseError>>,
    {
        let is_document = base == doc.root();
        let mut stack = vec![base];
        let mut scopes = Scopes::default();
        for event in events {
            let parent = stack.last().copied().unwrap_or(base);
            match event? {
                XmlEvent::Declaration {
                    version,
                    encoding,
                    standalone,
                } => {
                    if !is_document {
                        return Err(DomError::structural(
                            "an XML declaration cannot appear in a fragment",
                        ));
                    }
                    doc.version = Some(version);
                    doc.encoding = encoding;
                    doc.standalone = standalone;
                }
                XmlEvent::DocumentType {
                    name,
                    public_id,
                    system_id,
                } => {
                    let doctype =
                        doc.create_document_type(name, public_id.as_deref(), system_id.as_deref());
                    doc.append_child(parent, doctype)?;
                    stack.push(doctype);
                }
                XmlEvent::EntityDeclaration {
                    name,
                    value,
                    public_id,
                    system_id,
                    notation,
                } => {
                    let entity = match (value, system_id) {
                        (Some(value), _) => doc.create_entity(name, value),
                        (None, system_id) => doc.create_external_entity(
                            name,
                            public_id.as_deref(),
                            system_id.as_deref().unwrap_or_default(),
                            notation.as_deref(),
                        ),
                    };
                    doc.append_child(parent, entity)?;
                }
                XmlEvent::NotationDeclaration {
                    name,
                    public_id,
                    system_id,
                } => {
                    let notation =
                        doc.create_notation(name, public_id.as_deref(), system_id.as_deref());
                    doc.append_child(parent, notation)?;
                }
                XmlEvent::EndDocumentType | XmlEvent::EndElement { .. } => {
                    if stack.len() <= 1 {
                        return Err(unbalanced("unexpected end event"));
                    }
                    let closed = stack.pop();
                    if closed.is_some_and(|n| doc.node_type(n) == Some(NodeType::Element)) {
                        scopes.pop();
                    }
                }
                XmlEvent::StartElement { name, attributes } => {
                    let element = self.start_element(doc, &mut scopes, &name, attributes)?;
                    doc.append_child(parent, element)?;
                    stack.push(element);
                }
                XmlEvent::Text(content) => {
                    let text = doc.create_text(content);
                    doc.append_child(parent, text)?;
                }
                XmlEvent::CData(content) => {
                    let cdata = doc.create_cdata(content);
                    doc.append_child(parent, cdata)?;
                }
                XmlEvent::Comment(content) => {
                    let comment = doc.create_comment(content);
                    doc.append_child(parent, comment)?;
                }
                XmlEvent::ProcessingInstruction { target, data } => {
                    let pi = doc.create_processing_instruction(target, data.as_deref());
                    doc.append_child(parent, pi)?;
                }
                XmlEvent::EntityReference(name) => {
                    let reference = doc.create_entity_reference(name);
                    doc.append_child(parent, reference)?;
                }
            }
        }
        if stack.len() > 1 {
            return Err(unbalanced("event stream ended inside an element"));
        }
        Ok(())
    }

    /// Creates an element with its attributes, resolving prefixes.
    fn start_element(
        &self,
        doc: &mut Document,
        scopes: &mut Scopes,
        raw: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<NodeId, DomError> {
        let mut bindings = Vec::new();
        for (attr, value) in &attributes {
            if attr == "xmlns" {
                bindings.push((None, value.clone()));
            } else if let Some(prefix) = attr.strip_prefix("xmlns:") {
                if value.is_empty() {
                    return Err(invalid_name(attr, "namespace declaration"));
                }
                bindings.push((Some(prefix.to_string()), value.clone()));
            }
        }
        scopes.push(bindings);

        let name = match resolve_name(scopes, raw, false) {
            Ok(name) => name,
            Err(error) => {
                scopes.pop();
                return Err(error);
            }
        };
        let element = self
            .factory
            .and_then(|factory| factory.create_element(doc, &name))
            .unwrap_or_else(|| doc.create_element(name));

        let result = attributes.into_iter().try_for_each(|(raw_attr, value)| {
            let attr_name = resolve_name(scopes, &raw_attr, true)?;
            let attribute = doc.create_attribute(attr_name, value);
            doc.add_attribute_node(element, attribute)
        });
        if let Err(error) = result {
            scopes.pop();
            if let Err(err) = doc.dispose(element) {
                debug!(?element, error = %err, "could not free rejected element");
            }
            return Err(error);
        }
        Ok(element)
    }
}

fn unbalanced(message: &str) -> DomError {
    DomError::Read(ParseError {
        message: message.to_string(),
        location: crate::error::SourceLocation::default(),
    })
}

/// Resolves a raw `prefix:local` name. Unprefixed attributes are in no
/// namespace; unprefixed elements take the default namespace.
fn resolve_name(scopes: &Scopes, raw: &str, attribute: bool) -> Result<QualifiedName, DomError> {
    if !is_qname(raw) {
        return Err(invalid_name(raw, "QName"));
    }
    let (prefix, local) = split_qname(raw);
    if attribute {
        match prefix {
            None if local == "xmlns" => {
                return Ok(QualifiedName::with_namespace(XMLNS_NAMESPACE, local));
            }
            Some("xmlns") => {
                return Ok(QualifiedName::with_namespace(XMLNS_NAMESPACE, local).with_prefix("xmlns"));
            }
            None => return Ok(QualifiedName::new(local)),
            Some(_) => {}
        }
    } else if prefix == Some("xmlns") {
        return Err(invalid_name(raw, "element name"));
    }
    match (prefix, scopes.resolve(prefix)) {
        (Some(p), Some(uri)) => Ok(QualifiedName::with_namespace(uri, local).with_prefix(p)),
        (Some(_), None) => Err(invalid_name(raw, "namespace prefix")),
        (None, Some(uri)) => Ok(QualifiedName::with_namespace(uri, local)),
        (None, None) => Ok(QualifiedName::new(local)),
    }
}

impl Document {
    /// Parses a document from a string.
    ///
    /// # Errors
    ///
    /// [`DomError::Read`] for malformed XML, otherwise as
    /// [`TreeBuilder::build_document`].
    pub fn parse_str(text: &str) -> Result<Document, DomError> {
        TreeBuilder::new().build_document(EventReader::new(text))
    }

    /// Parses a document from a string into a document with `options`.
    ///
    /// # Errors
    ///
    /// As [`parse_str`](Self::parse_str).
    pub fn parse_str_with_options(text: &str, options: DocumentOptions) -> Result<Document, DomError> {
        TreeBuilder::with_options(options).build_document(EventReader::new(text))
    }

    /// Parses a fragment (any mix of elements and text) into a new unlinked
    /// document fragment of this document.
    ///
    /// # Errors
    ///
    /// As [`TreeBuilder::build_fragment`].
    pub fn parse_fragment(&mut self, text: &str) -> Result<NodeId, DomError> {
        let options = *self.options();
        TreeBuilder::with_options(options).build_fragment(self, EventReader::fragment(text))
    }
}
