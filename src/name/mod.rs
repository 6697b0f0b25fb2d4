//! Node names and name comparison.
//!
//! A [`QualifiedName`] identifies elements and attributes by the pair
//! `(namespace, local_name)`. The prefix is carried along for serialization
//! but takes no part in equality or hashing: `svg:rect` and `s:rect` bound to
//! the same namespace are the same name.
//!
//! Attribute collections compare names through a [`NameComparer`], which is
//! ordinal for XML and ASCII case-insensitive on the local part for HTML.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::DomError;
use crate::util::qname::{is_ncname, is_qname, split_qname};

/// A namespace-qualified name.
///
/// # Examples
///
/// ```
/// use arbordom::QualifiedName;
///
/// let a = QualifiedName::with_namespace("http://www.w3.org/2000/svg", "rect")
///     .with_prefix("svg");
/// let b: QualifiedName = "{http://www.w3.org/2000/svg}rect".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.qualified(), "svg:rect");
/// ```
#[derive(Clone)]
pub struct QualifiedName {
    namespace: Option<Arc<str>>,
    local_name: Arc<str>,
    prefix: Option<Arc<str>>,
}

impl QualifiedName {
    /// Creates a name with no namespace.
    #[must_use]
    pub fn new(local_name: &str) -> Self {
        Self {
            namespace: None,
            local_name: Arc::from(local_name),
            prefix: None,
        }
    }

    /// Creates a name in the given namespace.
    ///
    /// An empty namespace string is treated as "no namespace".
    #[must_use]
    pub fn with_namespace(namespace: &str, local_name: &str) -> Self {
        Self {
            namespace: (!namespace.is_empty()).then(|| Arc::from(namespace)),
            local_name: Arc::from(local_name),
            prefix: None,
        }
    }

    /// Returns a copy of this name carrying `prefix` for serialization.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = (!prefix.is_empty()).then(|| Arc::from(prefix));
        self
    }

    /// Parses Clark notation (`{namespace}local`) or a plain `QName`
    /// (`prefix:local`, prefix kept but unresolved).
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Parse`] when the text is not a legal name.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let invalid = || DomError::Parse {
            text: text.to_string(),
            target: "QualifiedName",
        };
        if let Some(rest) = text.strip_prefix('{') {
            let close = rest.find('}').ok_or_else(invalid)?;
            let (namespace, local) = (&rest[..close], &rest[close + 1..]);
            if !is_ncname(local) {
                return Err(invalid());
            }
            return Ok(Self::with_namespace(namespace, local));
        }
        if !is_qname(text) {
            return Err(invalid());
        }
        let (prefix, local) = split_qname(text);
        let name = Self::new(local);
        Ok(match prefix {
            Some(p) => name.with_prefix(p),
            None => name,
        })
    }

    /// The namespace URI, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The local part of the name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The serialization prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The name as written in markup: `prefix:local` or `local`.
    #[must_use]
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.local_name),
            None => self.local_name.to_string(),
        }
    }

    /// Returns `true` for `xmlns` and `xmlns:*` declaration attributes.
    #[must_use]
    pub fn is_namespace_declaration(&self) -> bool {
        self.namespace() == Some(crate::util::qname::XMLNS_NAMESPACE)
            || (self.namespace.is_none() && self.prefix.is_none() && &*self.local_name == "xmlns")
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl PartialOrd for QualifiedName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualifiedName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.namespace
            .cmp(&other.namespace)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Clark notation: `{namespace}local`, or `local` without a namespace.
impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(local_name: &str) -> Self {
        Self::new(local_name)
    }
}

impl From<&QualifiedName> for QualifiedName {
    fn from(name: &QualifiedName) -> Self {
        name.clone()
    }
}

impl FromStr for QualifiedName {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How an attribute collection decides that two names collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameComparer {
    /// Exact comparison of namespace and local name (XML).
    #[default]
    Ordinal,
    /// Namespace compared exactly, local name ASCII case-insensitively (HTML).
    IgnoreCase,
}

impl NameComparer {
    /// Returns `true` if `a` and `b` name the same attribute.
    #[must_use]
    pub fn equals(self, a: &QualifiedName, b: &QualifiedName) -> bool {
        if a.namespace != b.namespace {
            return false;
        }
        match self {
            Self::Ordinal => a.local_name == b.local_name,
            Self::IgnoreCase => a.local_name.eq_ignore_ascii_case(&b.local_name),
        }
    }

    /// Returns `true` if `name` has no namespace and its local part
    /// matches `local`.
    #[must_use]
    pub fn matches_local(self, name: &QualifiedName, local: &str) -> bool {
        if name.namespace.is_some() {
            return false;
        }
        match self {
            Self::Ordinal => &*name.local_name == local,
            Self::IgnoreCase => name.local_name.eq_ignore_ascii_case(local),
        }
    }
}
