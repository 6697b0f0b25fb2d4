//! XML serialization.
//!
//! [`XmlWriter`] is the low-level state machine that guarantees well-formed
//! output; [`XmlSerializer`] walks a tree and drives it, handling escaping,
//! the XML declaration, namespace declarations and indentation.

pub mod writer;
pub mod xml;

pub use writer::{WriterState, XmlWriter};
pub use xml::{serialize, serialize_node, serialize_with_options, SerializeOptions, XmlSerializer};
