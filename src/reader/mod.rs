//! Pull-based XML event reader.
//!
//! [`EventReader`] turns a string into a stream of [`XmlEvent`]s. It checks
//! well-formedness (matching tags, unique attribute names, a single root
//! element) but resolves no namespaces and loads nothing external; the
//! [`TreeBuilder`](crate::builder::TreeBuilder) does the namespace work when
//! it turns the events into a tree.
//!
//! References to the predefined entities and character references are
//! expanded. Other entity references in content are reported as
//! [`XmlEvent::EntityReference`]; in attribute values they are replaced by
//! the internal entity declared in the doctype, or rejected.
//!
//! # Examples
//!
//! ```
//! use arbordom::reader::{EventReader, XmlEvent};
//!
//! let names: Vec<String> = EventReader::new("<root><child>Hello</child></root>")
//!     .filter_map(|event| match event {
//!         Ok(XmlEvent::StartElement { name, .. }) => Some(name),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(names, vec!["root", "child"]);
//! ```

mod input;

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::error::ParseError;
use crate::util::qname::is_xml_whitespace;
use input::{predefined_entity, Input, DEFAULT_MAX_DEPTH};

/// Options for [`EventReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Maximum element nesting depth. Defaults to 256.
    pub max_depth: usize,
    /// Drop whitespace-only text inside elements. Defaults to `false`.
    pub trim_whitespace: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trim_whitespace: false,
        }
    }
}

impl ReaderOptions {
    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables dropping whitespace-only text.
    #[must_use]
    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }
}

/// One piece of XML markup or content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// The XML declaration.
    Declaration {
        /// The `version` pseudo-attribute.
        version: String,
        /// The `encoding` pseudo-attribute, if present.
        encoding: Option<String>,
        /// The `standalone` pseudo-attribute, if present.
        standalone: Option<bool>,
    },
    /// The start of a `<!DOCTYPE>`; its declarations follow, then
    /// [`EndDocumentType`](Self::EndDocumentType).
    DocumentType {
        /// The declared root element name.
        name: String,
        /// The PUBLIC identifier.
        public_id: Option<String>,
        /// The SYSTEM identifier.
        system_id: Option<String>,
    },
    /// A general entity declaration of the internal subset.
    EntityDeclaration {
        /// The entity name.
        name: String,
        /// Replacement text of an internal entity.
        value: Option<String>,
        /// PUBLIC identifier of an external entity.
        public_id: Option<String>,
        /// SYSTEM identifier of an external entity.
        system_id: Option<String>,
        /// `NDATA` notation of an unparsed entity.
        notation: Option<String>,
    },
    /// A notation declaration of the internal subset.
    NotationDeclaration {
        /// The notation name.
        name: String,
        /// PUBLIC identifier.
        public_id: Option<String>,
        /// SYSTEM identifier.
        system_id: Option<String>,
    },
    /// The end of the `<!DOCTYPE>`.
    EndDocumentType,
    /// A start tag; empty-element tags are followed by an `EndElement`.
    StartElement {
        /// The raw `prefix:local` name.
        name: String,
        /// Attributes in document order, values expanded.
        attributes: Vec<(String, String)>,
    },
    /// An end tag.
    EndElement {
        /// The raw name.
        name: String,
    },
    /// Character data.
    Text(String),
    /// A CDATA section.
    CData(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },
    /// A reference to a non-predefined entity.
    EntityReference(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Prolog,
    Subset,
    Content,
    Epilog,
    Done,
}

/// Streams [`XmlEvent`]s out of a string.
///
/// After the first error the reader is exhausted.
#[derive(Debug)]
pub struct EventReader<'a> {
    input: Input<'a>,
    options: ReaderOptions,
    phase: Phase,
    open: Vec<String>,
    pending: VecDeque<XmlEvent>,
    entities: HashMap<String, String>,
    fragment: bool,
}

impl<'a> EventReader<'a> {
    /// A reader with default options.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self::with_options(text, ReaderOptions::default())
    }

    /// A reader with the given options.
    #[must_use]
    pub fn with_options(text: &'a str, options: ReaderOptions) -> Self {
        Self {
            input: Input::new(text),
            options,
            phase: Phase::Start,
            open: Vec::new(),
            pending: VecDeque::new(),
            entities: HashMap::new(),
            fragment: false,
        }
    }

    /// A reader for a fragment: any number of top-level elements mixed with
    /// text, no XML declaration and no doctype.
    #[must_use]
    pub fn fragment(text: &'a str) -> Self {
        Self::fragment_with_options(text, ReaderOptions::default())
    }

    /// A fragment reader with the given options.
    #[must_use]
    pub fn fragment_with_options(text: &'a str, options: ReaderOptions) -> Self {
        Self {
            phase: Phase::Content,
            fragment: true,
            ..Self::with_options(text, options)
        }
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn read_event(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            let event = match self.phase {
                Phase::Done => return Ok(None),
                Phase::Start => {
                    self.phase = Phase::Prolog;
                    if self.input.looking_at("<?xml")
                        && matches!(self.input.peek_at(5), Some(b' ' | b'\t' | b'\r' | b'\n' | b'?'))
                    {
                        Some(self.read_declaration()?)
                    } else {
                        None
                    }
                }
                Phase::Prolog | Phase::Epilog => self.read_misc()?,
                Phase::Subset => self.read_subset()?,
                Phase::Content => self.read_content()?,
            };
            if let Some(event) = event {
                return Ok(Some(event));
            }
        }
    }

    fn read_declaration(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("<?xml")?;
        let mut version = None;
        let mut encoding = None;
        let mut standalone = None;
        loop {
            let had_space = self.input.skip_whitespace();
            if self.input.looking_at("?>") {
                self.input.advance(2);
                break;
            }
            if !had_space {
                return Err(self.input.fatal("whitespace required in XML declaration"));
            }
            let name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_str("=")?;
            self.input.skip_whitespace();
            let value = self.input.parse_quoted()?;
            match name.as_str() {
                "version" if version.is_none() && encoding.is_none() => version = Some(value),
                "encoding" if version.is_some() && encoding.is_none() && standalone.is_none() => {
                    encoding = Some(value);
                }
                "standalone" if version.is_some() && standalone.is_none() => {
                    standalone = Some(match value.as_str() {
                        "yes" => true,
                        "no" => false,
                        _ => return Err(self.input.fatal("standalone must be 'yes' or 'no'")),
                    });
                }
                _ => {
                    return Err(self
                        .input
                        .fatal(format!("unexpected '{name}' in XML declaration")))
                }
            }
        }
        let version = version.ok_or_else(|| self.input.fatal("XML declaration without version"))?;
        Ok(XmlEvent::Declaration {
            version,
            encoding,
            standalone,
        })
    }

    /// Prolog and epilog: comments, PIs, the doctype and the root element.
    fn read_misc(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        self.input.skip_whitespace();
        if self.input.at_end() {
            if self.phase == Phase::Prolog {
                return Err(self.input.fatal("document has no root element"));
            }
            self.phase = Phase::Done;
            return Ok(None);
        }
        if self.input.looking_at("<!--") {
            return self.read_comment().map(Some);
        }
        if self.input.looking_at("<?") {
            return self.read_pi().map(Some);
        }
        if self.input.looking_at("<!DOCTYPE") {
            if self.phase == Phase::Epilog {
                return Err(self.input.fatal("DOCTYPE after the root element"));
            }
            return self.read_doctype().map(Some);
        }
        if self.input.peek() == Some(b'<') && self.input.peek_at(1) != Some(b'/') {
            if self.phase == Phase::Epilog {
                return Err(self.input.fatal("extra content after the root element"));
            }
            self.phase = Phase::Content;
            return self.read_start_tag().map(Some);
        }
        Err(self.input.fatal("content outside the root element"))
    }

    fn read_comment(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("<!--")?;
        let content = self.input.take_until("--", "comment")?;
        self.input.advance(2);
        if self.input.peek() != Some(b'>') {
            return Err(self.input.fatal("'--' is not allowed inside a comment"));
        }
        self.input.advance(1);
        Ok(XmlEvent::Comment(content))
    }

    fn read_pi(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("<?")?;
        let target = self.input.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.input.fatal("the XML declaration must come first"));
        }
        if self.input.looking_at("?>") {
            self.input.advance(2);
            return Ok(XmlEvent::ProcessingInstruction { target, data: None });
        }
        self.input.skip_whitespace_required()?;
        let data = self.input.take_until("?>", "processing instruction")?;
        self.input.advance(2);
        Ok(XmlEvent::ProcessingInstruction {
            target,
            data: (!data.is_empty()).then_some(data),
        })
    }

    fn read_external_id(&mut self) -> Result<(Option<String>, Option<String>), ParseError> {
        if self.input.looking_at("PUBLIC") {
            self.input.advance(6);
            self.input.skip_whitespace_required()?;
            let public_id = self.input.parse_quoted()?;
            let mark = self.input.mark();
            let spaced = self.input.skip_whitespace();
            if spaced && matches!(self.input.peek(), Some(b'"' | b'\'')) {
                let system_id = self.input.parse_quoted()?;
                return Ok((Some(public_id), Some(system_id)));
            }
            self.input.reset(mark);
            Ok((Some(public_id), None))
        } else if self.input.looking_at("SYSTEM") {
            self.input.advance(6);
            self.input.skip_whitespace_required()?;
            Ok((None, Some(self.input.parse_quoted()?)))
        } else {
            Ok((None, None))
        }
    }

    fn read_doctype(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("<!DOCTYPE")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        let (public_id, system_id) = self.read_external_id()?;
        self.input.skip_whitespace();
        match self.input.peek() {
            Some(b'[') => {
                self.input.advance(1);
                self.phase = Phase::Subset;
            }
            Some(b'>') => {
                self.input.advance(1);
                self.pending.push_back(XmlEvent::EndDocumentType);
            }
            _ => return Err(self.input.fatal("malformed DOCTYPE")),
        }
        trace!(%name, "doctype");
        Ok(XmlEvent::DocumentType {
            name,
            public_id,
            system_id,
        })
    }

    /// The internal subset. Element, attribute-list and parameter-entity
    /// declarations are skipped.
    fn read_subset(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        self.input.skip_whitespace();
        if self.input.at_end() {
            return Err(self.input.fatal("unterminated DOCTYPE"));
        }
        if self.input.peek() == Some(b']') {
            self.input.advance(1);
            self.input.skip_whitespace();
            self.input.expect_str(">")?;
            self.phase = Phase::Prolog;
            return Ok(Some(XmlEvent::EndDocumentType));
        }
        if self.input.looking_at("<!--") {
            self.read_comment()?;
            return Ok(None);
        }
        if self.input.looking_at("<?") {
            self.read_pi()?;
            return Ok(None);
        }
        if self.input.peek() == Some(b'%') {
            self.input.advance(1);
            self.input.parse_name()?;
            self.input.expect_str(";")?;
            return Ok(None);
        }
        if self.input.looking_at("<!ENTITY") {
            return self.read_entity_declaration();
        }
        if self.input.looking_at("<!NOTATION") {
            return self.read_notation_declaration().map(Some);
        }
        if self.input.looking_at("<!ELEMENT") || self.input.looking_at("<!ATTLIST") {
            self.skip_declaration()?;
            return Ok(None);
        }
        Err(self.input.fatal("unexpected content in the internal subset"))
    }

    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let mut quote = None;
        loop {
            let ch = self.input.next_char()?;
            match (quote, ch) {
                (None, '>') => return Ok(()),
                (None, '"' | '\'') => quote = Some(ch),
                (Some(q), c) if q == c => quote = None,
                _ => {}
            }
        }
    }

    fn read_entity_declaration(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        self.input.expect_str("<!ENTITY")?;
        self.input.skip_whitespace_required()?;
        if self.input.peek() == Some(b'%') {
            self.skip_declaration()?;
            return Ok(None);
        }
        let name = self.input.parse_name()?;
        self.input.skip_whitespace_required()?;
        let event = if matches!(self.input.peek(), Some(b'"' | b'\'')) {
            let value = self.input.parse_quoted()?;
            self.entities
                .entry(name.clone())
                .or_insert_with(|| value.clone());
            XmlEvent::EntityDeclaration {
                name,
                value: Some(value),
                public_id: None,
                system_id: None,
                notation: None,
            }
        } else {
            let (public_id, system_id) = self.read_external_id()?;
            if system_id.is_none() {
                return Err(self.input.fatal("entity declaration needs a value or SYSTEM id"));
            }
            self.input.skip_whitespace();
            let notation = if self.input.looking_at("NDATA") {
                self.input.advance(5);
                self.input.skip_whitespace_required()?;
                Some(self.input.parse_name()?)
            } else {
                None
            };
            XmlEvent::EntityDeclaration {
                name,
                value: None,
                public_id,
                system_id,
                notation,
            }
        };
        self.input.skip_whitespace();
        self.input.expect_str(">")?;
        Ok(Some(event))
    }

    fn read_notation_declaration(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("<!NOTATION")?;
        self.input.skip_whitespace_required()?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace_required()?;
        let (public_id, system_id) = self.read_external_id()?;
        if public_id.is_none() && system_id.is_none() {
            return Err(self.input.fatal("notation declaration needs PUBLIC or SYSTEM"));
        }
        self.input.skip_whitespace();
        self.input.expect_str(">")?;
        Ok(XmlEvent::NotationDeclaration {
            name,
            public_id,
            system_id,
        })
    }

    fn read_start_tag(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("<")?;
        let name = self.input.parse_name()?;
        if self.open.len() >= self.options.max_depth {
            return Err(self.input.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.options.max_depth
            )));
        }
        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            let had_space = self.input.skip_whitespace();
            match self.input.peek() {
                Some(b'>') => {
                    self.input.advance(1);
                    break;
                }
                Some(b'/') => {
                    self.input.expect_str("/>")?;
                    self.pending.push_back(XmlEvent::EndElement { name: name.clone() });
                    break;
                }
                None => return Err(self.input.fatal("unterminated start tag")),
                _ if !had_space => {
                    return Err(self.input.fatal("whitespace required between attributes"))
                }
                _ => {}
            }
            let attr_name = self.input.parse_name()?;
            if attributes.iter().any(|(n, _)| *n == attr_name) {
                return Err(self
                    .input
                    .fatal(format!("duplicate attribute '{attr_name}'")));
            }
            self.input.skip_whitespace();
            self.input.expect_str("=")?;
            self.input.skip_whitespace();
            let value = self.read_attribute_value()?;
            attributes.push((attr_name, value));
        }
        if self.pending.is_empty() {
            self.open.push(name.clone());
        } else if self.open.is_empty() && !self.fragment {
            self.phase = Phase::Epilog;
        }
        Ok(XmlEvent::StartElement { name, attributes })
    }

    /// A quoted attribute value with references expanded and whitespace
    /// characters normalized to spaces.
    fn read_attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = match self.input.peek() {
            Some(q @ (b'"' | b'\'')) => q as char,
            _ => return Err(self.input.fatal("expected quoted attribute value")),
        };
        self.input.advance(1);
        let mut value = String::new();
        loop {
            match self.input.peek_char() {
                None => return Err(self.input.fatal("unterminated attribute value")),
                Some(c) if c == quote => {
                    self.input.advance(1);
                    return Ok(value);
                }
                Some('<') => return Err(self.input.fatal("'<' in attribute value")),
                Some('&') => {
                    self.input.advance(1);
                    if self.input.peek() == Some(b'#') {
                        self.input.advance(1);
                        value.push(self.input.parse_char_reference()?);
                        continue;
                    }
                    let name = self.input.parse_name()?;
                    self.input.expect_str(";")?;
                    if let Some(ch) = predefined_entity(&name) {
                        value.push(ch);
                    } else if let Some(text) = self.entities.get(&name) {
                        if text.contains('<') || text.contains('&') {
                            return Err(self
                                .input
                                .fatal(format!("entity '{name}' cannot be used in an attribute")));
                        }
                        value.push_str(text);
                    } else {
                        return Err(self.input.fatal(format!("unknown entity reference: &{name};")));
                    }
                }
                Some(_) => {
                    let ch = self.input.next_char()?;
                    value.push(if matches!(ch, '\t' | '\n') { ' ' } else { ch });
                }
            }
        }
    }

    fn read_content(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        if self.input.at_end() {
            if self.fragment && self.open.is_empty() {
                self.phase = Phase::Done;
                return Ok(None);
            }
            let name = self.open.last().cloned().unwrap_or_default();
            return Err(self.input.fatal(format!("unclosed element '{name}'")));
        }
        if self.input.looking_at("</") {
            return self.read_end_tag().map(Some);
        }
        if self.input.looking_at("<!--") {
            return self.read_comment().map(Some);
        }
        if self.input.looking_at("<![CDATA[") {
            self.input.advance(9);
            let content = self.input.take_until("]]>", "CDATA section")?;
            self.input.advance(3);
            return Ok(Some(XmlEvent::CData(content)));
        }
        if self.input.looking_at("<?") {
            return self.read_pi().map(Some);
        }
        if self.input.looking_at("<!") {
            return Err(self.input.fatal("unexpected markup declaration in content"));
        }
        if self.input.peek() == Some(b'<') {
            return self.read_start_tag().map(Some);
        }
        self.read_text()
    }

    fn read_end_tag(&mut self) -> Result<XmlEvent, ParseError> {
        self.input.expect_str("</")?;
        let name = self.input.parse_name()?;
        self.input.skip_whitespace();
        self.input.expect_str(">")?;
        match self.open.pop() {
            Some(open) if open == name => {}
            Some(open) => {
                return Err(self.input.fatal(format!(
                    "end tag '{name}' does not match start tag '{open}'"
                )))
            }
            None => return Err(self.input.fatal(format!("unexpected end tag '{name}'"))),
        }
        if self.open.is_empty() && !self.fragment {
            self.phase = Phase::Epilog;
        }
        Ok(XmlEvent::EndElement { name })
    }

    /// Character data up to the next markup or non-predefined entity
    /// reference.
    fn read_text(&mut self) -> Result<Option<XmlEvent>, ParseError> {
        let mut text = String::new();
        loop {
            match self.input.peek() {
                None | Some(b'<') => break,
                Some(b'&') => {
                    let mark = self.input.mark();
                    self.input.advance(1);
                    if self.input.peek() == Some(b'#') {
                        self.input.advance(1);
                        text.push(self.input.parse_char_reference()?);
                        continue;
                    }
                    let name = self.input.parse_name()?;
                    self.input.expect_str(";")?;
                    if let Some(ch) = predefined_entity(&name) {
                        text.push(ch);
                    } else if text.is_empty() {
                        return Ok(Some(XmlEvent::EntityReference(name)));
                    } else {
                        self.input.reset(mark);
                        break;
                    }
                }
                Some(_) => {
                    if self.input.looking_at("]]>") {
                        return Err(self.input.fatal("']]>' is not allowed in text"));
                    }
                    text.push(self.input.next_char()?);
                }
            }
        }
        if self.options.trim_whitespace && is_xml_whitespace(&text) {
            return Ok(None);
        }
        Ok(Some(XmlEvent::Text(text)))
    }
}

impl Iterator for EventReader<'_> {
    type Item = Result<XmlEvent, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_event() {
            Ok(event) => event.map(Ok),
            Err(error) => {
                self.phase = Phase::Done;
                self.pending.clear();
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn events(text: &str) -> Vec<XmlEvent> {
        EventReader::new(text).collect::<Result<_, _>>().unwrap()
    }

    fn first_error(text: &str) -> ParseError {
        EventReader::new(text)
            .find_map(Result::err)
            .unwrap_or_else(|| panic!("expected an error for {text:?}"))
    }

    #[test]
    fn test_basic_events() {
        assert_eq!(
            events("<?xml version=\"1.0\"?>\n<a x='1 &amp; 2'>t<b/><!--c--><?p d?></a>\n"),
            vec![
                XmlEvent::Declaration {
                    version: "1.0".into(),
                    encoding: None,
                    standalone: None
                },
                XmlEvent::StartElement {
                    name: "a".into(),
                    attributes: vec![("x".into(), "1 & 2".into())]
                },
                XmlEvent::Text("t".into()),
                XmlEvent::StartElement {
                    name: "b".into(),
                    attributes: vec![]
                },
                XmlEvent::EndElement { name: "b".into() },
                XmlEvent::Comment("c".into()),
                XmlEvent::ProcessingInstruction {
                    target: "p".into(),
                    data: Some("d".into())
                },
                XmlEvent::EndElement { name: "a".into() },
            ]
        );
    }

    #[test]
    fn test_doctype_and_entity_references() {
        let text = "<!DOCTYPE r [\n<!ELEMENT r ANY>\n<!ENTITY e \"val\">\n\
                    <!NOTATION n SYSTEM \"n.bin\">\n]>\n<r a=\"&e;\">x&e;&#65;<![CDATA[<raw>]]></r>";
        assert_eq!(
            events(text),
            vec![
                XmlEvent::DocumentType {
                    name: "r".into(),
                    public_id: None,
                    system_id: None
                },
                XmlEvent::EntityDeclaration {
                    name: "e".into(),
                    value: Some("val".into()),
                    public_id: None,
                    system_id: None,
                    notation: None
                },
                XmlEvent::NotationDeclaration {
                    name: "n".into(),
                    public_id: None,
                    system_id: Some("n.bin".into())
                },
                XmlEvent::EndDocumentType,
                XmlEvent::StartElement {
                    name: "r".into(),
                    attributes: vec![("a".into(), "val".into())]
                },
                XmlEvent::Text("x".into()),
                XmlEvent::EntityReference("e".into()),
                XmlEvent::Text("A".into()),
                XmlEvent::CData("<raw>".into()),
                XmlEvent::EndElement { name: "r".into() },
            ]
        );
    }

    #[test]
    fn test_well_formedness_errors() {
        assert!(first_error("<a></b>").message.contains("does not match"));
        assert!(first_error("<a x='1' x='2'/>").message.contains("duplicate"));
        assert!(first_error("<a/><b/>").message.contains("after the root"));
        assert!(first_error("text").message.contains("outside the root"));
        assert!(first_error("").message.contains("no root element"));
        assert!(first_error("<a>").message.contains("unclosed"));
        assert!(first_error("<a b='&nope;'/>").message.contains("unknown entity"));
        let err = first_error("<a>\n  <b></c></a>");
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_fragment_mode() {
        let events: Vec<_> = EventReader::fragment("lead <a/> mid <b>x</b>")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(events.len(), 7);
        assert_eq!(events[0], XmlEvent::Text("lead ".into()));
        assert!(EventReader::fragment("<a>")
            .collect::<Result<Vec<_>, _>>()
            .is_err());
        assert!(EventReader::fragment("").next().is_none());
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = EventReader::new("<a></b><c/>");
        assert!(matches!(reader.next(), Some(Ok(XmlEvent::StartElement { .. }))));
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_options() {
        let options = ReaderOptions::default().max_depth(2);
        let result: Result<Vec<_>, _> = EventReader::with_options("<a><b><c/></b></a>", options).collect();
        assert!(result.unwrap_err().message.contains("depth"));

        let options = ReaderOptions::default().trim_whitespace(true);
        let kept: Vec<_> = EventReader::with_options("<a>\n  <b/>\n</a>", options)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(kept.len(), 4);
    }
}
