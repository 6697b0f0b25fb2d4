//! Error types for tree mutation, reading, and writing.
//!
//! Every fallible operation in the crate returns [`DomError`]. Structural
//! errors are raised before any mutation takes place, so a failed call never
//! leaves the tree half-changed. Reader failures carry a [`SourceLocation`]
//! through [`ParseError`].

use std::fmt;

use thiserror::Error;

/// Source location within an XML input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error produced when the event reader meets malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

/// Every failure the DOM core can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The mutation would break a container invariant (second document
    /// element, attribute inserted as a child, cycle, ...).
    #[error("structural constraint violated: {message}")]
    StructuralConstraint {
        /// What was rejected and why.
        message: String,
    },

    /// An attribute with the same name already exists under the active
    /// name comparer.
    #[error("duplicate attribute name '{name}'")]
    DuplicateKey {
        /// The colliding name, in qualified form.
        name: String,
    },

    /// An index-based accessor was called past the end of a collection.
    #[error("index {index} out of range for collection of length {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The collection length at the time of the call.
        len: usize,
    },

    /// A lookup that requires an existing item found nothing.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing item.
        what: String,
    },

    /// A mutation was attempted on a frozen collection.
    #[error("collection is read-only")]
    ReadOnly,

    /// Text could not be parsed into the requested kind of value.
    #[error("cannot parse '{text}' as {target}")]
    Parse {
        /// The offending text.
        text: String,
        /// The type or grammar that was expected.
        target: &'static str,
    },

    /// A writer or builder was driven out of protocol order.
    #[error("operation '{operation}' is not valid in writer state {state}")]
    InvalidState {
        /// The state the machine was in.
        state: &'static str,
        /// The rejected operation.
        operation: &'static str,
    },

    /// The `NodeId` refers to a slot that was disposed or reused.
    #[error("node handle is stale or belongs to another document")]
    StaleNode,

    /// An index could not derive a key from an attribute value.
    #[error("cannot derive index key of type {key_type} from '{value}'")]
    KeyDerivation {
        /// The attribute text that failed.
        value: String,
        /// The key type the index expects.
        key_type: &'static str,
    },

    /// An observer callback failed. The mutation that triggered it has
    /// already been applied.
    #[error("observer failed: {0}")]
    Observer(Box<DomError>),

    /// The event reader rejected its input.
    #[error(transparent)]
    Read(#[from] ParseError),
}

impl DomError {
    /// Shorthand for building a [`DomError::StructuralConstraint`].
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::StructuralConstraint {
            message: message.into(),
        }
    }
}
