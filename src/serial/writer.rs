//! Streaming XML writer.
//!
//! [`XmlWriter`] is a small state machine over an output `String`:
//!
//! ```text
//! Start ─► Prolog ─► DocType ─► Prolog ─► Element ⇄ Content ─► Epilog ─► Closed
//!   └──────────────────────────────────────┘
//! ```
//!
//! `Element` means a start tag is open and still accepts attributes; any
//! content closes it. Calls that are illegal in the current state fail with
//! [`DomError::InvalidState`] and move the writer to `Error`, where every
//! further call fails too.
//!
//! A writer made with [`XmlWriter::fragment`] starts in `Content` at the top
//! level, so text and several sibling elements are allowed there.

use std::fmt::Write as _;

use crate::error::DomError;
use crate::util::qname::is_xml_whitespace;

/// The writer's protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing written yet.
    Start,
    /// After the XML declaration, before the root element.
    Prolog,
    /// Inside a `<!DOCTYPE` declaration.
    DocType,
    /// A start tag is open.
    Element,
    /// Inside an element, or at the top level of a fragment.
    Content,
    /// After the root element.
    Epilog,
    /// Finished.
    Closed,
    /// A previous call failed.
    Error,
}

impl WriterState {
    fn name(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Prolog => "Prolog",
            Self::DocType => "DocType",
            Self::Element => "Element",
            Self::Content => "Content",
            Self::Epilog => "Epilog",
            Self::Closed => "Closed",
            Self::Error => "Error",
        }
    }
}

/// Writes well-formed XML into a `String`.
///
/// # Examples
///
/// ```
/// use arbordom::serial::XmlWriter;
///
/// let mut w = XmlWriter::new();
/// w.start_element("greeting").unwrap();
/// w.attribute("lang", "en").unwrap();
/// w.text("a < b").unwrap();
/// w.end_element().unwrap();
/// assert_eq!(w.finish().unwrap(), r#"<greeting lang="en">a &lt; b</greeting>"#);
/// ```
#[derive(Debug)]
pub struct XmlWriter {
    out: String,
    state: WriterState,
    open: Vec<String>,
    fragment: bool,
    subset_open: bool,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    /// A writer for a complete document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            out: String::new(),
            state: WriterState::Start,
            open: Vec::new(),
            fragment: false,
            subset_open: false,
        }
    }

    /// A writer for a fragment: top-level text and sibling elements allowed.
    #[must_use]
    pub fn fragment() -> Self {
        Self {
            state: WriterState::Content,
            fragment: true,
            ..Self::new()
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Nesting depth of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn fail(&mut self, operation: &'static str) -> DomError {
        let state = self.state.name();
        self.state = WriterState::Error;
        DomError::InvalidState { state, operation }
    }

    /// Closes an open start tag so content can follow.
    fn enter_content(&mut self) {
        if self.state == WriterState::Element {
            self.out.push('>');
            self.state = WriterState::Content;
        }
    }

    /// Writes `<?xml ...?>`. Only legal first.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] unless the writer is in `Start`.
    pub fn declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> Result<(), DomError> {
        if self.state != WriterState::Start {
            return Err(self.fail("declaration"));
        }
        let _ = write!(self.out, "<?xml version=\"{version}\"");
        if let Some(encoding) = encoding {
            let _ = write!(self.out, " encoding=\"{encoding}\"");
        }
        if let Some(standalone) = standalone {
            let value = if standalone { "yes" } else { "no" };
            let _ = write!(self.out, " standalone=\"{value}\"");
        }
        self.out.push_str("?>");
        self.state = WriterState::Prolog;
        Ok(())
    }

    /// Opens `<!DOCTYPE name ...`.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] outside the prolog.
    pub fn start_doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), DomError> {
        if !matches!(self.state, WriterState::Start | WriterState::Prolog) {
            return Err(self.fail("start_doctype"));
        }
        let _ = write!(self.out, "<!DOCTYPE {name}");
        write_external_id(&mut self.out, public_id, system_id);
        self.state = WriterState::DocType;
        self.subset_open = false;
        Ok(())
    }

    fn open_subset(&mut self, operation: &'static str) -> Result<(), DomError> {
        if self.state != WriterState::DocType {
            return Err(self.fail(operation));
        }
        if !self.subset_open {
            self.out.push_str(" [");
            self.subset_open = true;
        }
        Ok(())
    }

    /// Writes an `<!ENTITY>` declaration inside the doctype.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] outside a doctype.
    pub fn entity_declaration(
        &mut self,
        name: &str,
        value: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
        notation: Option<&str>,
    ) -> Result<(), DomError> {
        self.open_subset("entity_declaration")?;
        let _ = write!(self.out, "<!ENTITY {name}");
        match value {
            Some(value) => {
                self.out.push_str(" \"");
                write_escaped_attr(&mut self.out, value);
                self.out.push('"');
            }
            None => {
                write_external_id(&mut self.out, public_id, system_id);
                if let Some(notation) = notation {
                    let _ = write!(self.out, " NDATA {notation}");
                }
            }
        }
        self.out.push('>');
        Ok(())
    }

    /// Writes a `<!NOTATION>` declaration inside the doctype.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] outside a doctype.
    pub fn notation_declaration(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), DomError> {
        self.open_subset("notation_declaration")?;
        let _ = write!(self.out, "<!NOTATION {name}");
        match (public_id, system_id) {
            (Some(public_id), None) => {
                let _ = write!(self.out, " PUBLIC \"{public_id}\"");
            }
            _ => write_external_id(&mut self.out, public_id, system_id),
        }
        self.out.push('>');
        Ok(())
    }

    /// Closes the doctype.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] outside a doctype.
    pub fn end_doctype(&mut self) -> Result<(), DomError> {
        if self.state != WriterState::DocType {
            return Err(self.fail("end_doctype"));
        }
        self.out.push_str(if self.subset_open { "]>" } else { ">" });
        self.subset_open = false;
        self.state = WriterState::Prolog;
        Ok(())
    }

    /// Opens an element. `name` is written as given (`prefix:local`).
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] after the root element of a document or
    /// inside a doctype.
    pub fn start_element(&mut self, name: &str) -> Result<(), DomError> {
        match self.state {
            WriterState::Start | WriterState::Prolog | WriterState::Content => {}
            WriterState::Element => self.enter_content(),
            _ => return Err(self.fail("start_element")),
        }
        self.out.push('<');
        self.out.push_str(name);
        self.open.push(name.to_string());
        self.state = WriterState::Element;
        Ok(())
    }

    /// Adds an attribute to the open start tag.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] unless a start tag is open.
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<(), DomError> {
        if self.state != WriterState::Element {
            return Err(self.fail("attribute"));
        }
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        write_escaped_attr(&mut self.out, value);
        self.out.push('"');
        Ok(())
    }

    /// Closes the innermost element, as `/>` when it has no content.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] when no element is open.
    pub fn end_element(&mut self) -> Result<(), DomError> {
        if !matches!(self.state, WriterState::Element | WriterState::Content) {
            return Err(self.fail("end_element"));
        }
        let Some(name) = self.open.pop() else {
            return Err(self.fail("end_element"));
        };
        if self.state == WriterState::Element {
            self.out.push_str("/>");
        } else {
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
        }
        self.state = if !self.open.is_empty() || self.fragment {
            WriterState::Content
        } else {
            WriterState::Epilog
        };
        Ok(())
    }

    /// Writes escaped character data. Outside elements only whitespace is
    /// accepted.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] for non-whitespace text outside content.
    pub fn text(&mut self, content: &str) -> Result<(), DomError> {
        match self.state {
            WriterState::Element | WriterState::Content => {
                self.enter_content();
                write_escaped_text(&mut self.out, content);
                Ok(())
            }
            WriterState::Start | WriterState::Prolog | WriterState::Epilog
                if is_xml_whitespace(content) =>
            {
                if self.state == WriterState::Start {
                    self.state = WriterState::Prolog;
                }
                self.out.push_str(content);
                Ok(())
            }
            _ => Err(self.fail("text")),
        }
    }

    /// Writes a CDATA section. `]]>` inside the content is split across two
    /// sections.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] outside content.
    pub fn cdata(&mut self, content: &str) -> Result<(), DomError> {
        if !matches!(self.state, WriterState::Element | WriterState::Content) {
            return Err(self.fail("cdata"));
        }
        self.enter_content();
        self.out.push_str("<![CDATA[");
        self.out.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
        self.out.push_str("]]>");
        Ok(())
    }

    /// Writes a comment.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] inside a doctype or after [`finish`](Self::finish).
    pub fn comment(&mut self, content: &str) -> Result<(), DomError> {
        self.misc("comment")?;
        self.out.push_str("<!--");
        self.out.push_str(content);
        self.out.push_str("-->");
        Ok(())
    }

    /// Writes a processing instruction.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] inside a doctype or after [`finish`](Self::finish).
    pub fn processing_instruction(&mut self, target: &str, data: Option<&str>) -> Result<(), DomError> {
        self.misc("processing_instruction")?;
        self.out.push_str("<?");
        self.out.push_str(target);
        if let Some(data) = data {
            self.out.push(' ');
            self.out.push_str(data);
        }
        self.out.push_str("?>");
        Ok(())
    }

    fn misc(&mut self, operation: &'static str) -> Result<(), DomError> {
        match self.state {
            WriterState::Start => self.state = WriterState::Prolog,
            WriterState::Prolog | WriterState::Content | WriterState::Epilog => {}
            WriterState::Element => self.enter_content(),
            _ => return Err(self.fail(operation)),
        }
        Ok(())
    }

    /// Writes `&name;`.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] outside content.
    pub fn entity_reference(&mut self, name: &str) -> Result<(), DomError> {
        if !matches!(self.state, WriterState::Element | WriterState::Content) {
            return Err(self.fail("entity_reference"));
        }
        self.enter_content();
        self.out.push('&');
        self.out.push_str(name);
        self.out.push(';');
        Ok(())
    }

    /// Returns the output.
    ///
    /// # Errors
    ///
    /// [`DomError::InvalidState`] if an element or doctype is still open or
    /// a previous call failed.
    pub fn finish(mut self) -> Result<String, DomError> {
        let ok = match self.state {
            WriterState::Start | WriterState::Prolog | WriterState::Epilog => true,
            WriterState::Content => self.open.is_empty(),
            _ => false,
        };
        if !ok {
            return Err(self.fail("finish"));
        }
        self.state = WriterState::Closed;
        Ok(self.out)
    }
}

fn write_external_id(out: &mut String, public_id: Option<&str>, system_id: Option<&str>) {
    match (public_id, system_id) {
        (Some(public_id), Some(system_id)) => {
            let _ = write!(out, " PUBLIC \"{public_id}\" \"{system_id}\"");
        }
        (None, Some(system_id)) => {
            let _ = write!(out, " SYSTEM \"{system_id}\"");
        }
        _ => {}
    }
}

/// Writes a hexadecimal character reference (`&#xHH;`).
fn write_hex_char_ref(out: &mut String, ch: char) {
    let _ = write!(out, "&#x{:X};", ch as u32);
}

/// Escapes text content: `<`, `>` and `&` by name, `\r` and other control
/// characters (except tab and newline) as character references.
pub(crate) fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value; whitespace characters that attribute value
/// normalization would change are written as references.
pub(crate) fn write_escaped_attr(out: &mut String, text: &str) {
    for ch in text.chars() {
        write_escaped_attr_char(out, ch);
    }
}

fn write_escaped_attr_char(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\t' => out.push_str("&#9;"),
        '\n' => out.push_str("&#10;"),
        '\r' => out.push_str("&#13;"),
        c if (c as u32) < 0x20 => write_hex_char_ref(out, c),
        _ => out.push(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_protocol() {
        let mut w = XmlWriter::new();
        w.declaration("1.0", Some("UTF-8"), None).unwrap();
        w.text("\n").unwrap();
        w.start_doctype("root", None, Some("root.dtd")).unwrap();
        w.entity_declaration("e", Some("v&"), None, None, None).unwrap();
        w.end_doctype().unwrap();
        w.start_element("root").unwrap();
        w.start_element("empty").unwrap();
        w.end_element().unwrap();
        w.entity_reference("e").unwrap();
        w.end_element().unwrap();
        assert_eq!(w.state(), WriterState::Epilog);
        w.comment(" done ").unwrap();
        assert_eq!(
            w.finish().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <!DOCTYPE root SYSTEM \"root.dtd\" [<!ENTITY e \"v&amp;\">]>\
             <root><empty/>&e;</root><!-- done -->"
        );
    }

    #[test]
    fn test_illegal_transitions() {
        let mut w = XmlWriter::new();
        w.start_element("a").unwrap();
        w.end_element().unwrap();
        assert_eq!(
            w.start_element("b"),
            Err(DomError::InvalidState {
                state: "Epilog",
                operation: "start_element"
            })
        );
        assert_eq!(w.state(), WriterState::Error);
        assert!(w.comment("x").is_err());

        let mut w = XmlWriter::new();
        assert!(w.text("not whitespace").is_err());

        let mut w = XmlWriter::new();
        w.start_element("a").unwrap();
        w.text("x").unwrap();
        assert!(w.attribute("late", "1").is_err());

        let mut w = XmlWriter::new();
        w.start_element("a").unwrap();
        assert!(w.finish().is_err());
    }

    #[test]
    fn test_fragment_allows_top_level_text() {
        let mut w = XmlWriter::fragment();
        w.text("lead ").unwrap();
        w.start_element("a").unwrap();
        w.end_element().unwrap();
        w.start_element("b").unwrap();
        w.end_element().unwrap();
        assert_eq!(w.finish().unwrap(), "lead <a/><b/>");
    }

    #[test]
    fn test_escaping() {
        let mut w = XmlWriter::fragment();
        w.start_element("a").unwrap();
        w.attribute("v", "\"1\"\t<&>").unwrap();
        w.text("x\r\u{1}").unwrap();
        w.cdata("a]]>b").unwrap();
        w.end_element().unwrap();
        assert_eq!(
            w.finish().unwrap(),
            "<a v=\"&quot;1&quot;&#9;&lt;&amp;&gt;\">x&#13;&#x1;<![CDATA[a]]]]><![CDATA[>b]]></a>"
        );
    }
}
