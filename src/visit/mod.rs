//! Depth-first visitor over a document tree.
//!
//! Implement the callbacks you care about; every method has a default no-op
//! implementation. [`walk`] guarantees the order: a container is visited,
//! then (for elements) its attributes in order, then its children in order,
//! then it is left.
//!
//! # Examples
//!
//! ```
//! use arbordom::visit::{walk, Visitor};
//! use arbordom::{Document, DomError, NodeId, QualifiedName};
//!
//! struct ElementCounter(usize);
//!
//! impl Visitor for ElementCounter {
//!     fn visit_element(
//!         &mut self,
//!         _doc: &Document,
//!         _id: NodeId,
//!         _name: &QualifiedName,
//!     ) -> Result<(), DomError> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//! }
//!
//! let doc = Document::parse_str("<root><a/><b/><c/></root>").unwrap();
//! let mut counter = ElementCounter(0);
//! walk(&doc, doc.root(), &mut counter).unwrap();
//! assert_eq!(counter.0, 4);
//! ```

use crate::error::DomError;
use crate::name::QualifiedName;
use crate::tree::{Document, NodeId, NodeKind};

/// The external identifier of a doctype, entity or notation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalId<'a> {
    /// The PUBLIC identifier.
    pub public_id: Option<&'a str>,
    /// The SYSTEM identifier.
    pub system_id: Option<&'a str>,
}

/// Callbacks for each node kind.
///
/// Returning an error stops the walk and propagates the error.
#[allow(unused_variables)]
pub trait Visitor {
    /// Entering the document node.
    fn visit_document(&mut self, doc: &Document, id: NodeId) -> Result<(), DomError> {
        Ok(())
    }

    /// Leaving the document node.
    fn leave_document(&mut self, doc: &Document, id: NodeId) -> Result<(), DomError> {
        Ok(())
    }

    /// Entering a document fragment.
    fn visit_document_fragment(&mut self, doc: &Document, id: NodeId) -> Result<(), DomError> {
        Ok(())
    }

    /// Leaving a document fragment.
    fn leave_document_fragment(&mut self, doc: &Document, id: NodeId) -> Result<(), DomError> {
        Ok(())
    }

    /// Entering an element, before its attributes.
    fn visit_element(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &QualifiedName,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// Leaving an element, after its children.
    fn leave_element(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &QualifiedName,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// An attribute of the element being visited.
    fn visit_attribute(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &QualifiedName,
        value: &str,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// A text node.
    fn visit_text(&mut self, doc: &Document, id: NodeId, content: &str) -> Result<(), DomError> {
        Ok(())
    }

    /// A CDATA section.
    fn visit_cdata(&mut self, doc: &Document, id: NodeId, content: &str) -> Result<(), DomError> {
        Ok(())
    }

    /// A comment.
    fn visit_comment(&mut self, doc: &Document, id: NodeId, content: &str) -> Result<(), DomError> {
        Ok(())
    }

    /// A processing instruction.
    fn visit_processing_instruction(
        &mut self,
        doc: &Document,
        id: NodeId,
        target: &str,
        data: Option<&str>,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// Entering a document type, before its declarations.
    fn visit_document_type(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &str,
        external: ExternalId<'_>,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// Leaving a document type.
    fn leave_document_type(&mut self, doc: &Document, id: NodeId) -> Result<(), DomError> {
        Ok(())
    }

    /// An entity declaration.
    fn visit_entity(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &str,
        value: Option<&str>,
        external: ExternalId<'_>,
        notation: Option<&str>,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// An unexpanded entity reference.
    fn visit_entity_reference(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &str,
    ) -> Result<(), DomError> {
        Ok(())
    }

    /// A notation declaration.
    fn visit_notation(
        &mut self,
        doc: &Document,
        id: NodeId,
        name: &str,
        external: ExternalId<'_>,
    ) -> Result<(), DomError> {
        Ok(())
    }
}

/// Walks the subtree rooted at `id`, calling `visitor` for every node.
///
/// # Errors
///
/// Returns [`DomError::StaleNode`] for a stale handle, or the first error a
/// callback returns.
pub fn walk<V: Visitor + ?Sized>(doc: &Document, id: NodeId, visitor: &mut V) -> Result<(), DomError> {
    match &doc.try_node(id)?.kind {
        NodeKind::Document { .. } => {
            visitor.visit_document(doc, id)?;
            walk_children(doc, id, visitor)?;
            visitor.leave_document(doc, id)
        }
        NodeKind::DocumentFragment { .. } => {
            visitor.visit_document_fragment(doc, id)?;
            walk_children(doc, id, visitor)?;
            visitor.leave_document_fragment(doc, id)
        }
        NodeKind::Element { name, .. } => {
            visitor.visit_element(doc, id, name)?;
            for attribute in doc.attributes(id) {
                walk(doc, attribute, visitor)?;
            }
            walk_children(doc, id, visitor)?;
            visitor.leave_element(doc, id, name)
        }
        NodeKind::Attribute { name, value } => visitor.visit_attribute(doc, id, name, value),
        NodeKind::Text { content } => visitor.visit_text(doc, id, content),
        NodeKind::CData { content } => visitor.visit_cdata(doc, id, content),
        NodeKind::Comment { content } => visitor.visit_comment(doc, id, content),
        NodeKind::ProcessingInstruction { target, data } => {
            visitor.visit_processing_instruction(doc, id, target, data.as_deref())
        }
        NodeKind::DocumentType {
            name,
            public_id,
            system_id,
            ..
        } => {
            let external = ExternalId {
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
            };
            visitor.visit_document_type(doc, id, name, external)?;
            walk_children(doc, id, visitor)?;
            visitor.leave_document_type(doc, id)
        }
        NodeKind::Entity {
            name,
            public_id,
            system_id,
            notation,
            value,
        } => {
            let external = ExternalId {
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
            };
            visitor.visit_entity(doc, id, name, value.as_deref(), external, notation.as_deref())
        }
        NodeKind::EntityReference { name } => visitor.visit_entity_reference(doc, id, name),
        NodeKind::Notation {
            name,
            public_id,
            system_id,
        } => {
            let external = ExternalId {
                public_id: public_id.as_deref(),
                system_id: system_id.as_deref(),
            };
            visitor.visit_notation(doc, id, name, external)
        }
    }
}

fn walk_children<V: Visitor + ?Sized>(
    doc: &Document,
    id: NodeId,
    visitor: &mut V,
) -> Result<(), DomError> {
    for child in doc.children(id) {
        walk(doc, child, visitor)?;
    }
    Ok(())
}

impl Document {
    /// Walks the subtree at `id` with `visitor`. See [`walk`].
    ///
    /// # Errors
    ///
    /// As [`walk`].
    pub fn accept<V: Visitor + ?Sized>(&self, id: NodeId, visitor: &mut V) -> Result<(), DomError> {
        walk(self, id, visitor)
    }
}
