//! # arbordom
//!
//! An in-memory XML document tree with checked node linkage, batched
//! mutation observers and live element indexes.
//!
//! Nodes live in an arena owned by a [`Document`] and are addressed through
//! generation-checked [`NodeId`] handles. Every node is linked in exactly one
//! place: as a child, as an attribute of an element, or in the document's
//! unlinked bucket. Structural rules are checked before anything moves, so a
//! failed mutation leaves the tree untouched.
//!
//! ## Quick Start
//!
//! ```
//! use arbordom::Document;
//!
//! let mut doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
//! let root = doc.document_element().unwrap();
//! let note = doc.create_element("note");
//! doc.append_child(root, note).unwrap();
//!
//! assert_eq!(doc.child_count(root), 2);
//! assert_eq!(doc.text_content(root), "Hello");
//! ```
//!
//! ## Observing changes
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use arbordom::{Document, Scope};
//!
//! let mut doc = Document::parse_str("<a/>").unwrap();
//! let a = doc.document_element().unwrap();
//! let added = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&added);
//! doc.observe_child_list(a, Scope::Target, move |_, change| {
//!     sink.lock().unwrap().extend(change.added.iter().copied());
//!     Ok(())
//! })
//! .unwrap();
//!
//! let (b, c) = (doc.create_element("b"), doc.create_element("c"));
//! doc.append_children(a, &[b, c]).unwrap();
//! assert_eq!(*added.lock().unwrap(), vec![b, c]);
//! ```

pub mod annotation;
pub mod batch;
pub mod builder;
pub mod config;
pub mod cow;
pub mod error;
pub mod index;
pub mod name;
pub mod observer;
pub mod query;
pub mod reader;
pub mod serial;
pub mod tree;
pub mod util;
pub mod value;
pub mod visit;

// Re-export primary types at the crate root for convenience.
pub use annotation::{Annotation, Annotations, BaseUri, NameContext};
pub use batch::BatchScope;
pub use builder::{NodeFactory, TreeBuilder};
pub use config::{ChildStorage, DocumentOptions};
pub use cow::CowList;
pub use error::{DomError, ParseError, SourceLocation};
pub use index::ElementIndex;
pub use name::{NameComparer, QualifiedName};
pub use observer::{
    AttributeChange, ChildListChange, ChildListChangeKind, MutationEvent, ObserverHandle, Scope,
};
pub use query::{CompoundSelector, ElementQuery, NodeQuery, Selector};
pub use tree::{Document, NodeId, NodeKind, NodeType};
pub use value::FromAttributeText;
pub use visit::Visitor;
