//! Node type definitions.
//!
//! The `NodeKind` enum is the closed set of node kinds a document can hold.
//! Each variant carries its payload; container variants own their child
//! collection and elements own their attribute collection. The collections
//! hold `NodeId`s only, the nodes themselves live in the document arena.

use std::fmt;

use super::attributes::AttributeList;
use super::children::ChildList;
use crate::config::ChildStorage;
use crate::name::QualifiedName;

/// Fieldless tag for a node's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// The document node.
    Document,
    /// A document fragment.
    DocumentFragment,
    /// An element.
    Element,
    /// An attribute.
    Attribute,
    /// Character data.
    Text,
    /// A CDATA section.
    CData,
    /// A comment.
    Comment,
    /// A processing instruction.
    ProcessingInstruction,
    /// A document type declaration.
    DocumentType,
    /// An entity declaration.
    Entity,
    /// An unexpanded entity reference.
    EntityReference,
    /// A notation declaration.
    Notation,
}

impl NodeType {
    /// Returns `true` for kinds that own a child collection.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Document | Self::DocumentFragment | Self::Element | Self::DocumentType
        )
    }

    /// Returns `true` for text, CDATA and comment nodes.
    #[must_use]
    pub fn is_character_data(self) -> bool {
        matches!(self, Self::Text | Self::CData | Self::Comment)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Document => "document",
            Self::DocumentFragment => "document fragment",
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::Text => "text",
            Self::CData => "CDATA section",
            Self::Comment => "comment",
            Self::ProcessingInstruction => "processing instruction",
            Self::DocumentType => "document type",
            Self::Entity => "entity",
            Self::EntityReference => "entity reference",
            Self::Notation => "notation",
        };
        f.write_str(s)
    }
}

/// The kind of a node and its payload.
#[derive(Debug)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document {
        /// Top-level nodes: at most one element and one doctype, plus
        /// comments, PIs and whitespace text.
        children: ChildList,
    },

    /// A lightweight container whose children are spliced into the target
    /// on insertion.
    DocumentFragment {
        /// The fragment's children.
        children: ChildList,
    },

    /// An element, e.g. `<div class="x">`.
    Element {
        /// The element name.
        name: QualifiedName,
        /// Attribute node ids, unique by name under the list's comparer.
        attributes: AttributeList,
        /// Child nodes.
        children: ChildList,
    },

    /// An attribute. Linked into at most one element's attribute list.
    Attribute {
        /// The attribute name.
        name: QualifiedName,
        /// The attribute value.
        value: String,
    },

    /// Character data.
    Text {
        /// The text content.
        content: String,
    },

    /// A CDATA section, e.g. `<![CDATA[...]]>`.
    CData {
        /// The section content.
        content: String,
    },

    /// A comment, e.g. `<!-- ... -->`.
    Comment {
        /// The comment text without delimiters.
        content: String,
    },

    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// A document type declaration, e.g. `<!DOCTYPE html>`.
    DocumentType {
        /// The declared root element name.
        name: String,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The SYSTEM identifier, if any.
        system_id: Option<String>,
        /// Entity and notation declarations of the internal subset.
        children: ChildList,
    },

    /// An entity declaration.
    Entity {
        /// The entity name.
        name: String,
        /// The PUBLIC identifier of an external entity.
        public_id: Option<String>,
        /// The SYSTEM identifier of an external entity.
        system_id: Option<String>,
        /// The notation of an unparsed entity (`NDATA`).
        notation: Option<String>,
        /// The replacement text of an internal entity.
        value: Option<String>,
    },

    /// An entity reference left unexpanded, e.g. `&custom;`.
    EntityReference {
        /// The entity name without `&` and `;`.
        name: String,
    },

    /// A notation declaration.
    Notation {
        /// The notation name.
        name: String,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The SYSTEM identifier, if any.
        system_id: Option<String>,
    },
}

impl NodeKind {
    /// Returns the fieldless tag of this kind.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document { .. } => NodeType::Document,
            Self::DocumentFragment { .. } => NodeType::DocumentFragment,
            Self::Element { .. } => NodeType::Element,
            Self::Attribute { .. } => NodeType::Attribute,
            Self::Text { .. } => NodeType::Text,
            Self::CData { .. } => NodeType::CData,
            Self::Comment { .. } => NodeType::Comment,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            Self::DocumentType { .. } => NodeType::DocumentType,
            Self::Entity { .. } => NodeType::Entity,
            Self::EntityReference { .. } => NodeType::EntityReference,
            Self::Notation { .. } => NodeType::Notation,
        }
    }

    /// The node name. Elements and attributes return their qualified name;
    /// other kinds synthesize one (`#text`, `#comment`, ...) or use their
    /// declared name.
    #[must_use]
    pub fn name(&self) -> QualifiedName {
        match self {
            Self::Element { name, .. } | Self::Attribute { name, .. } => name.clone(),
            Self::Document { .. } => QualifiedName::new("#document"),
            Self::DocumentFragment { .. } => QualifiedName::new("#document-fragment"),
            Self::Text { .. } => QualifiedName::new("#text"),
            Self::CData { .. } => QualifiedName::new("#cdata-section"),
            Self::Comment { .. } => QualifiedName::new("#comment"),
            Self::ProcessingInstruction { target: name, .. }
            | Self::DocumentType { name, .. }
            | Self::Entity { name, .. }
            | Self::EntityReference { name }
            | Self::Notation { name, .. } => QualifiedName::new(name),
        }
    }

    /// The child collection of a container kind.
    #[must_use]
    pub fn children(&self) -> Option<&ChildList> {
        match self {
            Self::Document { children }
            | Self::DocumentFragment { children }
            | Self::Element { children, .. }
            | Self::DocumentType { children, .. } => Some(children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut ChildList> {
        match self {
            Self::Document { children }
            | Self::DocumentFragment { children }
            | Self::Element { children, .. }
            | Self::DocumentType { children, .. } => Some(children),
            _ => None,
        }
    }

    /// The attribute collection of an element.
    #[must_use]
    pub fn attributes(&self) -> Option<&AttributeList> {
        match self {
            Self::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub(crate) fn attributes_mut(&mut self) -> Option<&mut AttributeList> {
        match self {
            Self::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// Character data of text, CDATA, comment and attribute nodes; PI data.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { content } | Self::CData { content } | Self::Comment { content } => {
                Some(content)
            }
            Self::Attribute { value, .. } => Some(value),
            Self::ProcessingInstruction { data, .. } => data.as_deref(),
            _ => None,
        }
    }

    /// Copies the payload without children or attributes. Containers get
    /// empty collections using `storage`; element attribute lists keep their
    /// comparer.
    pub(crate) fn shallow_copy(&self, storage: ChildStorage) -> Self {
        match self {
            Self::Document { .. } => Self::Document {
                children: ChildList::new(storage),
            },
            Self::DocumentFragment { .. } => Self::DocumentFragment {
                children: ChildList::new(storage),
            },
            Self::Element {
                name, attributes, ..
            } => Self::Element {
                name: name.clone(),
                attributes: AttributeList::new(attributes.comparer()),
                children: ChildList::new(storage),
            },
            Self::Attribute { name, value } => Self::Attribute {
                name: name.clone(),
                value: value.clone(),
            },
            Self::Text { content } => Self::Text {
                content: content.clone(),
            },
            Self::CData { content } => Self::CData {
                content: content.clone(),
            },
            Self::Comment { content } => Self::Comment {
                content: content.clone(),
            },
            Self::ProcessingInstruction { target, data } => Self::ProcessingInstruction {
                target: target.clone(),
                data: data.clone(),
            },
            Self::DocumentType {
                name,
                public_id,
                system_id,
                ..
            } => Self::DocumentType {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
                children: ChildList::new(storage),
            },
            Self::Entity {
                name,
                public_id,
                system_id,
                notation,
                value,
            } => Self::Entity {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
                notation: notation.clone(),
                value: value.clone(),
            },
            Self::EntityReference { name } => Self::EntityReference { name: name.clone() },
            Self::Notation {
                name,
                public_id,
                system_id,
            } => Self::Notation {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
            },
        }
    }
}
