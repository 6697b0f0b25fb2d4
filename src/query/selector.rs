//! Node selection.
//!
//! [`Selector`] is the capability the query facade consumes. Any closure
//! `Fn(&Document, NodeId) -> bool` is a selector; [`CompoundSelector`] is the
//! built-in CSS subset:
//!
//! | Syntax          | Matches                                             |
//! |-----------------|-----------------------------------------------------|
//! | `*`             | any element                                         |
//! | `tag`           | elements with that local name                       |
//! | `#id`           | elements whose `id` attribute equals `id`           |
//! | `.class`        | elements whose `class` list contains `class`        |
//! | `[attr]`        | elements carrying `attr`                            |
//! | `[attr=value]`  | elements whose `attr` equals `value` (quotes allowed) |
//! | `a b`           | `b` elements with an `a` ancestor                   |
//! | `a, b`          | elements matching either                            |

use std::fmt;
use std::str::FromStr;

use crate::error::DomError;
use crate::name::NameComparer;
use crate::tree::{Document, NodeId, NodeType};

/// Decides which nodes belong to a query.
pub trait Selector {
    /// Returns `true` if `node` is selected.
    fn matches(&self, doc: &Document, node: NodeId) -> bool;

    /// The descendants of `root` that match, in document order. `root`
    /// itself is not considered.
    fn select(&self, doc: &Document, root: NodeId) -> Vec<NodeId> {
        doc.descendants(root)
            .filter(|&node| self.matches(doc, node))
            .collect()
    }
}

impl<F> Selector for F
where
    F: Fn(&Document, NodeId) -> bool,
{
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self(doc, node)
    }
}

/// One test within a compound such as `div#main.note`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleSelector {
    Universal,
    Type(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn matches(&self, doc: &Document, element: NodeId) -> bool {
        match self {
            Self::Universal => true,
            Self::Type(tag) => doc.element_name(element).is_some_and(|name| {
                if doc.attribute_comparer(element) == NameComparer::IgnoreCase {
                    name.local_name().eq_ignore_ascii_case(tag)
                } else {
                    name.local_name() == tag
                }
            }),
            Self::Id(id) => doc.attribute_value(element, "id") == Some(id.as_str()),
            Self::Class(class) => doc
                .attribute_value(element, "class")
                .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class)),
            Self::Attribute { name, value } => match (doc.attribute_value(element, name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        }
    }
}

/// A compound plus the compounds its ancestors must match, outermost
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Vec<SimpleSelector>>,
}

impl Complex {
    fn matches(&self, doc: &Document, element: NodeId) -> bool {
        let Some((subject, ancestors)) = self.compounds.split_last() else {
            return false;
        };
        if !compound_matches(subject, doc, element) {
            return false;
        }
        // Nearest matching ancestor first is enough with only descendant
        // combinators.
        let mut remaining = ancestors.iter().rev().peekable();
        for ancestor in doc.ancestors(element).skip(1) {
            let Some(compound) = remaining.peek() else {
                break;
            };
            if doc.node_type(ancestor) == Some(NodeType::Element)
                && compound_matches(compound, doc, ancestor)
            {
                remaining.next();
            }
        }
        remaining.peek().is_none()
    }
}

fn compound_matches(compound: &[SimpleSelector], doc: &Document, element: NodeId) -> bool {
    compound.iter().all(|simple| simple.matches(doc, element))
}

/// A parsed selector list.
///
/// # Examples
///
/// ```
/// use arbordom::query::{CompoundSelector, Selector};
/// use arbordom::Document;
///
/// let doc = Document::parse_str(r#"<ul><li class="a b">1</li><li>2</li></ul>"#).unwrap();
/// let selector = CompoundSelector::parse("ul li.b").unwrap();
/// assert_eq!(selector.select(&doc, doc.root()).len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    source: String,
    alternatives: Vec<Complex>,
}

impl CompoundSelector {
    /// Parses a selector list.
    ///
    /// # Errors
    ///
    /// [`DomError::Parse`] with target `"selector"` if `text` is empty or
    /// uses unsupported syntax.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let alternatives = SelectorParser::new(text).parse_list()?;
        Ok(Self {
            source: text.trim().to_string(),
            alternatives,
        })
    }

    /// The selector text as given (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Selector for CompoundSelector {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.node_type(node) == Some(NodeType::Element)
            && self.alternatives.iter().any(|c| c.matches(doc, node))
    }
}

impl FromStr for CompoundSelector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

struct SelectorParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn error(&self) -> DomError {
        DomError::Parse {
            text: self.text.to_string(),
            target: "selector",
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<Vec<Complex>, DomError> {
        let mut list = Vec::new();
        loop {
            self.skip_whitespace();
            list.push(self.parse_complex()?);
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                None => return Ok(list),
                Some(_) => return Err(self.error()),
            }
        }
    }

    fn parse_complex(&mut self) -> Result<Complex, DomError> {
        let mut compounds = vec![self.parse_compound()?];
        loop {
            let spaced = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some(_) if spaced => compounds.push(self.parse_compound()?),
                Some(_) => return Err(self.error()),
            }
        }
        Ok(Complex { compounds })
    }

    fn parse_compound(&mut self) -> Result<Vec<SimpleSelector>, DomError> {
        let mut compound = Vec::new();
        match self.peek() {
            Some('*') => {
                self.bump();
                compound.push(SimpleSelector::Universal);
            }
            Some(ch) if is_ident_char(ch) => compound.push(SimpleSelector::Type(self.parse_ident()?)),
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.push(SimpleSelector::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.push(SimpleSelector::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    compound.push(self.parse_attribute()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, DomError> {
        self.skip_whitespace();
        let name = self.parse_ident()?;
        self.skip_whitespace();
        let value = match self.bump() {
            Some(']') => return Ok(SimpleSelector::Attribute { name, value: None }),
            Some('=') => {
                self.skip_whitespace();
                match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.bump();
                        let start = self.pos;
                        let end = self.text[start..].find(quote).ok_or_else(|| self.error())?;
                        self.pos = start + end + 1;
                        self.text[start..start + end].to_string()
                    }
                    _ => self.parse_ident()?,
                }
            }
            _ => return Err(self.error()),
        };
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error());
        }
        Ok(SimpleSelector::Attribute {
            name,
            value: Some(value),
        })
    }

    fn parse_ident(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(self.text[start..self.pos].to_string())
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '_') || !ch.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> Document {
        Document::parse_str(
            r#"<root><div id="main" class="box wide"><p class="note">a</p><p>b</p></div><p lang="en">c</p></root>"#,
        )
        .unwrap()
    }

    fn names(doc: &Document, selector: &str) -> Vec<String> {
        let selector = CompoundSelector::parse(selector).unwrap();
        selector
            .select(doc, doc.root())
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect()
    }

    #[test]
    fn test_simple_selectors() {
        let doc = doc();
        assert_eq!(names(&doc, "p"), vec!["a", "b", "c"]);
        assert_eq!(names(&doc, "#main"), vec!["ab"]);
        assert_eq!(names(&doc, ".wide"), vec!["ab"]);
        assert_eq!(names(&doc, "p.note"), vec!["a"]);
        assert_eq!(names(&doc, "[lang]"), vec!["c"]);
        assert_eq!(names(&doc, "[lang=en]"), vec!["c"]);
        assert_eq!(names(&doc, "p[lang='fr']"), Vec::<String>::new());
        assert_eq!(names(&doc, "*").len(), 5);
    }

    #[test]
    fn test_descendant_and_list() {
        let doc = doc();
        assert_eq!(names(&doc, "div p"), vec!["a", "b"]);
        assert_eq!(names(&doc, "root  div p.note"), vec!["a"]);
        assert_eq!(names(&doc, "div p, [lang]"), vec!["a", "b", "c"]);
        assert_eq!(names(&doc, "p div"), Vec::<String>::new());
    }

    #[test]
    fn test_invalid_selectors() {
        for text in ["", "   ", "p,", "#", "[x", "[x=]", "p > q", "a..b", ":hover"] {
            let err = CompoundSelector::parse(text).unwrap_err();
            assert_eq!(
                err,
                DomError::Parse {
                    text: text.to_string(),
                    target: "selector"
                },
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_closure_selector() {
        let doc = doc();
        let has_text = |doc: &Document, node: NodeId| doc.node_type(node) == Some(NodeType::Text);
        assert_eq!(has_text.select(&doc, doc.root()).len(), 3);
        let parsed: CompoundSelector = "div".parse().unwrap();
        assert_eq!(parsed.to_string(), "div");
    }
}
