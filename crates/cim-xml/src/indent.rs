//! Minimal XML tokenizer and indented pretty-printer
//!
//! Used to make generated documents readable in trace output. The
//! tokenizer checks well-formedness (matching tags, a single root,
//! terminated comments and CDATA blocks, valid references) but performs no
//! validation.

use crate::error::{Result, XmlError};

/// Indentation used when none is given
pub const DEFAULT_INDENT_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEntryKind {
    XmlDeclaration,
    StartTag,
    EmptyTag,
    EndTag,
    Comment,
    Content,
    CData,
    DocType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

/// One token of an XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlEntry {
    pub kind: XmlEntryKind,
    /// Element name, or the text of comments, content and CDATA
    pub text: String,
    pub attributes: Vec<XmlAttribute>,
    pub line: u32,
}

impl XmlEntry {
    fn new(kind: XmlEntryKind, text: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            attributes: Vec::new(),
            line,
        }
    }

    pub fn find_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

fn is_xml_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b':') || c >= 0x80
}

/// Streaming tokenizer over a complete document
pub struct XmlTokenizer<'a> {
    text: &'a str,
    pos: usize,
    line: u32,
    stack: Vec<String>,
    found_root: bool,
}

impl<'a> XmlTokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            stack: Vec::new(),
            found_root: false,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Nesting depth of the last entry returned
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn error(&self, message: &str) -> XmlError {
        XmlError::malformed(self.line, message)
    }

    fn advance(&mut self, n: usize) {
        let end = (self.pos + n).min(self.text.len());
        self.line += self.text[self.pos..end].bytes().filter(|&b| b == b'\n').count() as u32;
        self.pos = end;
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.bytes().get(self.pos) {
            if !is_xml_space(c) {
                break;
            }
            self.advance(1);
        }
    }

    fn read_name(&mut self) -> Result<String> {
        let start = self.pos;
        while self.bytes().get(self.pos).copied().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("Bad opening element"));
        }
        Ok(self.text[start..self.pos].to_string())
    }

    /// Text up to `terminator`, consuming both
    fn read_until(&mut self, terminator: &str, unterminated: &str) -> Result<&'a str> {
        let source = self.text;
        match self.rest().find(terminator) {
            Some(offset) => {
                let text = &source[self.pos..self.pos + offset];
                self.advance(offset + terminator.len());
                Ok(text)
            }
            None => Err(self.error(unterminated)),
        }
    }

    /// Next entry, or `None` at the end of a well-formed document
    pub fn next_entry(&mut self) -> Result<Option<XmlEntry>> {
        self.skip_whitespace();

        if self.pos >= self.text.len() {
            if !self.stack.is_empty() {
                return Err(self.error("One or more tags are still open"));
            }
            return Ok(None);
        }

        let line = self.line;
        let rest = self.rest();

        if !rest.starts_with('<') {
            return self.content(line).map(Some);
        }

        if rest.starts_with("<?") {
            self.advance(2);
            let name = self.read_name()?;
            let mut entry = XmlEntry::new(XmlEntryKind::XmlDeclaration, name, line);
            entry.attributes = self.attributes()?;
            if !self.rest().starts_with("?>") {
                return Err(self.error("Bad opening element"));
            }
            self.advance(2);
            return Ok(Some(entry));
        }

        if rest.starts_with("<!--") {
            self.advance(4);
            let body = self.read_until("--", "Unterminated comment")?;
            if !self.rest().starts_with('>') {
                return Err(self.error("A \"--\" sequence found within comment"));
            }
            self.advance(1);
            return Ok(Some(XmlEntry::new(XmlEntryKind::Comment, body, line)));
        }

        if rest.starts_with("<![CDATA[") {
            self.advance(9);
            let body = self.read_until("]]>", "Unterminated CDATA block")?;
            return Ok(Some(XmlEntry::new(XmlEntryKind::CData, body, line)));
        }

        if rest.starts_with("<!DOCTYPE") {
            self.advance(9);
            let body = self.read_until(">", "Unterminated DOCTYPE")?;
            return Ok(Some(XmlEntry::new(XmlEntryKind::DocType, body.trim(), line)));
        }

        if rest.starts_with("<!") {
            return Err(self.error("Expected a comment or CDATA following \"<!\" sequence"));
        }

        if rest.starts_with("</") {
            self.advance(2);
            let name = self
                .read_name()
                .map_err(|_| self.error("Bad closing element"))?;
            self.skip_whitespace();
            if !self.rest().starts_with('>') {
                return Err(self.error("Bad closing element"));
            }
            self.advance(1);
            match self.stack.pop() {
                Some(open) if open == name => {}
                _ => return Err(self.error("Closing element does not match opening element")),
            }
            return Ok(Some(XmlEntry::new(XmlEntryKind::EndTag, name, line)));
        }

        self.advance(1);
        let name = self.read_name()?;
        let attributes = self.attributes()?;

        if self.stack.is_empty() {
            if self.found_root {
                return Err(self.error("More than one root element was encountered"));
            }
            self.found_root = true;
        }

        let kind = if self.rest().starts_with("/>") {
            self.advance(2);
            XmlEntryKind::EmptyTag
        } else if self.rest().starts_with('>') {
            self.advance(1);
            self.stack.push(name.clone());
            XmlEntryKind::StartTag
        } else {
            return Err(self.error("Bad opening element"));
        };

        let mut entry = XmlEntry::new(kind, name, line);
        entry.attributes = attributes;
        Ok(Some(entry))
    }

    fn content(&mut self, line: u32) -> Result<XmlEntry> {
        let source = self.text;
        let end = self.rest().find('<').unwrap_or(self.rest().len());
        let raw = &source[self.pos..self.pos + end];
        self.advance(end);
        let text = decode_references(raw.trim_end_matches(|c: char| c.is_ascii_whitespace()))
            .map_err(|message| self.error(message))?;
        Ok(XmlEntry::new(XmlEntryKind::Content, text, line))
    }

    fn attributes(&mut self) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.bytes().get(self.pos) {
                Some(b'>') | Some(b'/') | Some(b'?') | None => return Ok(attributes),
                _ => {}
            }

            let name = self
                .read_name()
                .map_err(|_| self.error("Bad attribute name"))?;
            self.skip_whitespace();
            if self.bytes().get(self.pos) != Some(&b'=') {
                return Err(self.error("Exepected equal sign"));
            }
            self.advance(1);
            self.skip_whitespace();

            let quote = match self.bytes().get(self.pos) {
                Some(&q @ (b'"' | b'\'')) => q as char,
                _ => return Err(self.error("Bad attribute value")),
            };
            self.advance(1);
            let end = self
                .rest()
                .find(quote)
                .ok_or_else(|| self.error("Bad attribute value"))?;
            let source = self.text;
            let raw = &source[self.pos..self.pos + end];
            self.advance(end + 1);

            let value = decode_references(&compress_whitespace(raw))
                .map_err(|message| self.error(message))?;
            attributes.push(XmlAttribute { name, value });
        }
    }
}

impl Iterator for XmlTokenizer<'_> {
    type Item = Result<XmlEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Collapse whitespace runs to one space and trim both ends
fn compress_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_ascii() && is_xml_space(c as u8))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace entity and character references
///
/// Character references are limited to values below 256.
fn decode_references(text: &str) -> std::result::Result<String, &'static str> {
    const MALFORMED: &str = "Malformed reference";

    if !text.contains('&') {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];
        let semi = rest.find(';').ok_or(MALFORMED)?;
        let reference = &rest[..semi];
        rest = &rest[semi + 1..];

        let c = match reference {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let value = if let Some(hex) = reference.strip_prefix("#x") {
                    if hex.is_empty() || hex.len() > 4 {
                        return Err(MALFORMED);
                    }
                    u32::from_str_radix(hex, 16).map_err(|_| MALFORMED)?
                } else if let Some(dec) = reference.strip_prefix('#') {
                    if dec.is_empty() || dec.len() > 5 || !dec.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(MALFORMED);
                    }
                    dec.parse::<u32>().map_err(|_| MALFORMED)?
                } else {
                    return Err(MALFORMED);
                };
                if value > 255 {
                    return Err(MALFORMED);
                }
                char::from_u32(value).ok_or(MALFORMED)?
            }
        };
        out.push(c);
    }
    out.push_str(rest);
    Ok(out)
}

/// Escape text for re-emission; no whitespace protection
fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 32 || c == '\u{7f}' => {
                out.push_str(&format!("&#{};", c as u32));
            }
            c => out.push(c),
        }
    }
}

fn push_attributes(out: &mut String, attributes: &[XmlAttribute]) {
    for (i, attribute) in attributes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&attribute.name);
        out.push_str("=\"");
        push_escaped(out, &attribute.value);
        out.push('"');
    }
}

/// Re-emit `text` one entry per line, indented by nesting depth
pub fn indented_print(text: &str, indent_chars: usize) -> Result<String> {
    let mut out = String::with_capacity(text.len() * 2);
    let mut stack: Vec<String> = Vec::new();
    let indent = |out: &mut String, depth: usize| {
        out.extend(std::iter::repeat(' ').take(depth * indent_chars));
    };

    for entry in XmlTokenizer::new(text) {
        let entry = entry?;
        match entry.kind {
            XmlEntryKind::XmlDeclaration => {
                indent(&mut out, stack.len());
                out.push_str("<?");
                out.push_str(&entry.text);
                out.push(' ');
                push_attributes(&mut out, &entry.attributes);
                out.push_str("?>");
            }
            XmlEntryKind::StartTag => {
                indent(&mut out, stack.len());
                out.push('<');
                out.push_str(&entry.text);
                if !entry.attributes.is_empty() {
                    out.push(' ');
                }
                push_attributes(&mut out, &entry.attributes);
                out.push('>');
                stack.push(entry.text);
            }
            XmlEntryKind::EmptyTag => {
                indent(&mut out, stack.len());
                out.push('<');
                out.push_str(&entry.text);
                out.push(' ');
                push_attributes(&mut out, &entry.attributes);
                out.push_str("/>");
            }
            XmlEntryKind::EndTag => {
                if stack.last() == Some(&entry.text) {
                    stack.pop();
                }
                indent(&mut out, stack.len());
                out.push_str("</");
                out.push_str(&entry.text);
                out.push('>');
            }
            XmlEntryKind::Comment => {
                indent(&mut out, stack.len());
                out.push_str("<!--");
                push_escaped(&mut out, &entry.text);
                out.push_str("-->");
            }
            XmlEntryKind::Content => {
                indent(&mut out, stack.len());
                push_escaped(&mut out, &entry.text);
            }
            XmlEntryKind::CData => {
                indent(&mut out, stack.len());
                out.push_str("<![CDATA[");
                out.push_str(&entry.text);
                out.push_str("]]>");
            }
            XmlEntryKind::DocType => {
                indent(&mut out, stack.len());
                out.push_str("<!DOCTYPE...>");
            }
        }
        out.push('\n');
    }
    Ok(out)
}
