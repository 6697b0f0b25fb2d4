//! Namespace and base URI resolution.
//!
//! Namespace declarations are ordinary attributes. Three spellings are
//! recognized: `{http://www.w3.org/2000/xmlns/}p` (what the tree builder
//! produces), and the unresolved `xmlns` and `xmlns:p` names that
//! [`Document::set_attribute`] creates from plain strings.

use super::{Document, NodeId, NodeType};
use crate::annotation::BaseUri;
use crate::name::QualifiedName;
use crate::util::qname::{XMLNS_NAMESPACE, XML_NAMESPACE};

/// For a namespace declaration attribute, the prefix it declares (`None` for
/// the default namespace).
pub(crate) fn declared_prefix(name: &QualifiedName) -> Option<Option<&str>> {
    let local = name.local_name();
    match name.namespace() {
        Some(XMLNS_NAMESPACE) => Some((local != "xmlns").then_some(local)),
        None if local == "xmlns" && name.prefix().is_none() => Some(None),
        None if name.prefix() == Some("xmlns") => Some(Some(local)),
        None => local.strip_prefix("xmlns:").map(Some),
        Some(_) => None,
    }
}

impl Document {
    /// The nearest element at or above `id`; attributes start at their
    /// element and the document node at its document element.
    fn context_element(&self, id: NodeId) -> Option<NodeId> {
        match self.node_type(id)? {
            NodeType::Document => self.document_element(),
            NodeType::Attribute => self.owner_element(id),
            _ => self
                .ancestors(id)
                .find(|&a| self.node_type(a) == Some(NodeType::Element)),
        }
    }

    fn element_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.context_element(id)
            .into_iter()
            .flat_map(|start| self.ancestors(start))
            .filter(|&a| self.node_type(a) == Some(NodeType::Element))
    }

    /// The namespace URI bound to `prefix` (`None` for the default namespace)
    /// in scope at `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbordom::Document;
    ///
    /// let doc = Document::parse_str(r#"<a xmlns:x="urn:x"><b/></a>"#).unwrap();
    /// let a = doc.document_element().unwrap();
    /// let b = doc.first_child(a).unwrap();
    /// assert_eq!(doc.lookup_namespace_uri(b, Some("x")).as_deref(), Some("urn:x"));
    /// assert_eq!(doc.lookup_namespace_uri(b, None), None);
    /// ```
    #[must_use]
    pub fn lookup_namespace_uri(&self, id: NodeId, prefix: Option<&str>) -> Option<String> {
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE.to_string()),
            Some("xmlns") => return Some(XMLNS_NAMESPACE.to_string()),
            _ => {}
        }
        for element in self.element_ancestors(id) {
            for attribute in self.attributes(element) {
                let Some(name) = self.element_name(attribute) else {
                    continue;
                };
                if declared_prefix(name) == Some(prefix) {
                    let uri = self.node_text(attribute).unwrap_or_default();
                    return (!uri.is_empty()).then(|| uri.to_string());
                }
            }
            if let Some(name) = self.element_name(element) {
                if name.prefix() == prefix {
                    if let Some(ns) = name.namespace() {
                        return Some(ns.to_string());
                    }
                }
            }
        }
        None
    }

    /// A prefix bound to `uri` in scope at `id`, skipping prefixes that an
    /// inner declaration has rebound.
    #[must_use]
    pub fn lookup_prefix(&self, id: NodeId, uri: &str) -> Option<String> {
        if uri.is_empty() {
            return None;
        }
        for element in self.element_ancestors(id) {
            let declared = self.attributes(element).filter_map(|attribute| {
                let prefix = declared_prefix(self.element_name(attribute)?)??;
                (self.node_text(attribute) == Some(uri)).then_some(prefix)
            });
            let own = self
                .element_name(element)
                .filter(|name| name.namespace() == Some(uri))
                .and_then(QualifiedName::prefix);
            for prefix in declared.chain(own) {
                if self.lookup_namespace_uri(id, Some(prefix)).as_deref() == Some(uri) {
                    return Some(prefix.to_string());
                }
            }
        }
        None
    }

    /// The base URI of `id`.
    ///
    /// [`BaseUri`] annotations and `xml:base` attributes on the node and its
    /// ancestors are combined from the outside in; a relative value replaces
    /// the last path segment of the base it is resolved against.
    #[must_use]
    pub fn base_uri(&self, id: NodeId) -> Option<String> {
        let mut pieces = Vec::new();
        for node in self.ancestors(id) {
            if let Some(piece) = self.own_base(node) {
                let absolute = is_absolute(&piece);
                pieces.push(piece);
                if absolute {
                    break;
                }
            }
        }
        let mut resolved: Option<String> = None;
        for piece in pieces.into_iter().rev() {
            resolved = Some(match resolved {
                Some(base) if !is_absolute(&piece) => join(&base, &piece),
                _ => piece,
            });
        }
        resolved
    }

    fn own_base(&self, node: NodeId) -> Option<String> {
        if let Some(BaseUri(uri)) = self.get(node)?.annotations.get::<BaseUri>() {
            return Some(uri.clone());
        }
        self.attributes(node).find_map(|attribute| {
            let name = self.element_name(attribute)?;
            let is_base = name.local_name() == "base"
                && (name.namespace() == Some(XML_NAMESPACE) || name.prefix() == Some("xml"));
            let is_plain = name.namespace().is_none() && name.local_name() == "xml:base";
            (is_base || is_plain).then(|| self.node_text(attribute).unwrap_or_default().to_string())
        })
    }
}

fn is_absolute(uri: &str) -> bool {
    match uri.find(':') {
        Some(colon) => {
            let scheme = &uri[..colon];
            !scheme.is_empty()
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn join(base: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        if let Some(scheme_end) = base.find("://") {
            let authority_end = base[scheme_end + 3..]
                .find('/')
                .map_or(base.len(), |i| scheme_end + 3 + i);
            return format!("{}{relative}", &base[..authority_end]);
        }
        return relative.to_string();
    }
    match base.rfind('/') {
        Some(slash) => format!("{}{relative}", &base[..=slash]),
        None => relative.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_prefix_spellings() {
        let resolved = QualifiedName::with_namespace(XMLNS_NAMESPACE, "p").with_prefix("xmlns");
        assert_eq!(declared_prefix(&resolved), Some(Some("p")));
        let default = QualifiedName::with_namespace(XMLNS_NAMESPACE, "xmlns");
        assert_eq!(declared_prefix(&default), Some(None));
        assert_eq!(declared_prefix(&QualifiedName::new("xmlns")), Some(None));
        assert_eq!(declared_prefix(&QualifiedName::new("xmlns:q")), Some(Some("q")));
        assert_eq!(declared_prefix(&QualifiedName::new("href")), None);
    }

    #[test]
    fn test_lookup_through_manual_declarations() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element(QualifiedName::with_namespace("urn:inner", "b").with_prefix("i"));
        let t = doc.create_text("t");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(b, t).unwrap();
        doc.set_attribute(a, "xmlns", "urn:default").unwrap();
        doc.set_attribute(a, "xmlns:p", "urn:p").unwrap();

        assert_eq!(doc.lookup_namespace_uri(t, None).as_deref(), Some("urn:default"));
        assert_eq!(doc.lookup_namespace_uri(t, Some("p")).as_deref(), Some("urn:p"));
        assert_eq!(doc.lookup_namespace_uri(t, Some("i")).as_deref(), Some("urn:inner"));
        assert_eq!(doc.lookup_namespace_uri(t, Some("zz")), None);
        assert_eq!(
            doc.lookup_namespace_uri(doc.root(), Some("xml")).as_deref(),
            Some(XML_NAMESPACE)
        );
        assert_eq!(doc.lookup_prefix(t, "urn:p").as_deref(), Some("p"));
        assert_eq!(doc.lookup_prefix(t, "urn:inner").as_deref(), Some("i"));
        assert_eq!(doc.lookup_prefix(t, "urn:none"), None);
    }

    #[test]
    fn test_rebound_prefix_is_skipped() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(a, b).unwrap();
        doc.set_attribute(a, "xmlns:p", "urn:one").unwrap();
        doc.set_attribute(b, "xmlns:p", "urn:two").unwrap();
        assert_eq!(doc.lookup_prefix(b, "urn:one"), None);
        assert_eq!(doc.lookup_prefix(a, "urn:one").as_deref(), Some("p"));
    }

    #[test]
    fn test_base_uri_resolution() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(b, c).unwrap();
        doc.annotations_mut(doc.root())
            .unwrap()
            .add(BaseUri("http://example.com/docs/index.xml".to_string()));
        doc.set_attribute(b, "xml:base", "sub/").unwrap();
        doc.set_attribute(c, "xml:base", "page.xml").unwrap();

        assert_eq!(
            doc.base_uri(a).as_deref(),
            Some("http://example.com/docs/index.xml")
        );
        assert_eq!(
            doc.base_uri(c).as_deref(),
            Some("http://example.com/docs/sub/page.xml")
        );
        assert_eq!(join("http://h/x/y", "/z"), "http://h/z");
    }
}
