//! Pull tokenizer producing raw element events

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::input::{is_supported_encoding, Input};
use crate::reader::cursor::{is_whitespace, Cursor};
use crate::reader::event::{Attribute, RawEvent};

/// Configuration for the XML reader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
    /// Trim leading/trailing whitespace of reported text
    pub trim_text: bool,
    /// Report whitespace-only text before a child element instead of
    /// dropping it
    pub keep_blank_text: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_size: 0,
            trim_text: false,
            keep_blank_text: false,
        }
    }
}

impl Config {
    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
            trim_text: false,
            keep_blank_text: false,
        }
    }

    pub const fn with_trim_text(mut self, trim_text: bool) -> Self {
        self.trim_text = trim_text;
        self
    }

    pub const fn with_keep_blank_text(mut self, keep_blank_text: bool) -> Self {
        self.keep_blank_text = keep_blank_text;
        self
    }
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    text: Option<String>,
}

/// Streaming XML reader.
///
/// Yields one [`RawEvent`] per element boundary, in document order. Comments,
/// processing instructions and the DOCTYPE are skipped. The reader stops
/// after the first error.
#[derive(Debug)]
pub struct Reader<'a> {
    cursor: Cursor<'a>,
    config: Config,
    open: Vec<OpenElement>,
    /// End event of a self-closing tag, reported on the next pull
    queued: Option<RawEvent>,
    root_closed: bool,
    failed: bool,
    deferred_error: Option<Error>,
}

impl<'a> Reader<'a> {
    /// Create a new reader with default configuration
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new reader with custom configuration
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        let mut deferred_error = None;
        if config.max_size > 0 && input.len() > config.max_size {
            deferred_error = Some(Error::unpositioned(ErrorKind::MaxSizeExceeded {
                max: config.max_size,
            }));
        }
        let bytes: &'a [u8] = match Input::from_bytes(input).decoded() {
            Ok(bytes) => bytes,
            Err(err) => {
                deferred_error.get_or_insert(err);
                &[]
            }
        };

        Self {
            cursor: Cursor::new(bytes),
            config,
            open: Vec::new(),
            queued: None,
            root_closed: false,
            failed: false,
            deferred_error,
        }
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Pull the next raw event. `Ok(None)` once the root element has closed
    /// and only trailing misc remains.
    pub fn next_event(&mut self) -> Result<Option<RawEvent>> {
        if let Some(err) = self.deferred_error.take() {
            return Err(err);
        }
        if let Some(event) = self.queued.take() {
            return Ok(Some(event));
        }

        loop {
            if self.open.is_empty() {
                self.cursor.skip_whitespace();
                if self.cursor.is_eof() {
                    if self.root_closed {
                        return Ok(None);
                    }
                    return Err(self.error_here(ErrorKind::UnexpectedEof, "no root element"));
                }
                if self.cursor.current() != Some(b'<') {
                    return Err(
                        self.error_here(ErrorKind::InvalidToken, "text outside root element")
                    );
                }
                if self.cursor.eat(b"<?") {
                    self.skip_processing_instruction()?;
                } else if self.cursor.eat(b"<!--") {
                    self.skip_comment()?;
                } else if self.cursor.starts_with(b"<!") && !self.root_closed {
                    self.skip_doctype()?;
                } else if self.cursor.starts_with(b"</") {
                    return Err(self.error_here(ErrorKind::InvalidToken, "unexpected closing tag"));
                } else if self.root_closed {
                    return Err(self.error_here(ErrorKind::InvalidToken, "multiple root elements"));
                } else {
                    return self.read_start_tag().map(Some);
                }
                continue;
            }

            if self.cursor.is_eof() {
                let name = self.open.last().map(|e| e.name.as_str()).unwrap_or_default();
                let message = format!("unterminated element <{name}>");
                return Err(self.error_here(ErrorKind::UnexpectedEof, &message));
            }

            // Mixed-content tail text: checked, then dropped
            if self.cursor.current() != Some(b'<') {
                self.read_text()?;
            } else if self.cursor.eat(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.eat(b"<![CDATA[") {
                self.read_cdata()?;
            } else if self.cursor.eat(b"<?") {
                self.skip_processing_instruction()?;
            } else if self.cursor.eat(b"</") {
                return self.read_end_tag().map(Some);
            } else if self.cursor.starts_with(b"<!") {
                return Err(self.error_here(ErrorKind::InvalidToken, "unexpected declaration"));
            } else {
                return self.read_start_tag().map(Some);
            }
        }
    }

    fn read_start_tag(&mut self) -> Result<RawEvent> {
        self.cursor.advance();
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;
        let self_closing = self.cursor.eat(b"/");
        self.expect_byte(b'>')?;

        let max = self.config.max_depth;
        if max > 0 && self.open.len() >= usize::from(max) {
            return Err(self.error_here(
                ErrorKind::MaxDepthExceeded { max },
                "element nested too deeply",
            ));
        }

        let mut event = RawEvent::start(name.as_str());
        event.attributes = attributes;

        if self_closing {
            if self.open.is_empty() {
                self.root_closed = true;
            }
            self.queued = Some(RawEvent::end(name));
            return Ok(event);
        }

        let text = self.read_leading_text()?;
        event.text.clone_from(&text);
        self.open.push(OpenElement { name, text });
        Ok(event)
    }

    fn read_end_tag(&mut self) -> Result<RawEvent> {
        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        self.expect_byte(b'>')?;

        let Some(open) = self.open.pop() else {
            return Err(self.error_here(ErrorKind::InvalidToken, "unexpected closing tag"));
        };
        if open.name != name {
            return Err(self.error_here(
                ErrorKind::MismatchedTag {
                    expected: open.name,
                    found: name,
                },
                "mismatched closing tag",
            ));
        }
        if self.open.is_empty() {
            self.root_closed = true;
        }

        let mut event = RawEvent::end(name);
        event.text = open.text;
        Ok(event)
    }

    /// Character data and CDATA up to the first child element or end tag.
    /// Whitespace-only text is dropped before a child element and kept in a
    /// childless element.
    fn read_leading_text(&mut self) -> Result<Option<String>> {
        let mut text = String::new();
        while !self.cursor.is_eof() {
            if self.cursor.current() != Some(b'<') {
                text.push_str(&self.read_text()?);
            } else if self.cursor.eat(b"<![CDATA[") {
                text.push_str(&self.read_cdata()?);
            } else if self.cursor.eat(b"<!--") {
                self.skip_comment()?;
            } else if self.cursor.eat(b"<?") {
                self.skip_processing_instruction()?;
            } else {
                break;
            }
        }
        let childless = self.cursor.starts_with(b"</");
        Ok(self.finish_text(text, childless))
    }

    fn finish_text(&self, text: String, childless: bool) -> Option<String> {
        let blank = text.bytes().all(is_whitespace);
        if text.is_empty() || (blank && !childless && !self.config.keep_blank_text) {
            return None;
        }
        if self.config.trim_text {
            return Some(text.trim().to_string());
        }
        Some(text)
    }

    fn read_text(&mut self) -> Result<String> {
        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }
        let raw = bytes_to_str(self.cursor.slice_from(start), &self.cursor)?;
        decode_entities(raw).map_err(|kind| Error::at(kind, pos))
    }

    fn read_cdata(&mut self) -> Result<String> {
        match self.cursor.take_until(b"]]>") {
            Some(raw) => bytes_to_str(raw, &self.cursor).map(str::to_string),
            None => Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated CDATA section")),
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        match self.cursor.take_until(b"-->") {
            Some(_) => Ok(()),
            None => Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated comment")),
        }
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        let pos = self.cursor.position();
        let Some(raw) = self.cursor.take_until(b"?>") else {
            return Err(self.error_here(
                ErrorKind::UnexpectedEof,
                "unterminated processing instruction",
            ));
        };
        let content = bytes_to_str(raw, &self.cursor)?;
        let is_declaration = content
            .strip_prefix("xml")
            .is_some_and(|rest| rest.bytes().next().is_some_and(is_whitespace));
        if is_declaration {
            if let Some(encoding) = declared_encoding(content) {
                if !is_supported_encoding(encoding) {
                    return Err(Error::at(
                        ErrorKind::UnsupportedEncoding {
                            encoding: encoding.to_string(),
                        },
                        pos,
                    ));
                }
            }
        }
        Ok(())
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // cursor at "<!"; the internal subset may contain '>' inside brackets or quotes
        self.cursor.advance_by(2);
        let mut depth = 0usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'"' | b'\'' => {
                    let quote = [b];
                    if self.cursor.take_until(&quote).is_none() {
                        break;
                    }
                }
                b'>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated declaration"))
    }

    fn parse_attributes(&mut self) -> Result<Vec<Attribute>> {
        let mut attrs: IndexMap<String, String> = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => {
                    return Err(
                        self.error_here(ErrorKind::UnexpectedEof, "unterminated start tag")
                    )
                }
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here(
                    ErrorKind::DuplicateAttribute { name },
                    "duplicate attribute",
                ));
            }
            attrs.insert(name, value);
        }

        // Namespace declarations are not attributes; URIs are never resolved
        Ok(attrs
            .into_iter()
            .filter(|(name, _)| name != "xmlns" && !name.starts_with("xmlns:"))
            .map(|(name, value)| Attribute::new(name, value))
            .collect())
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => {
                return Err(self.error_here(
                    ErrorKind::InvalidToken,
                    "expected quoted attribute value",
                ))
            }
        };
        self.cursor.advance();

        let pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = bytes_to_str(self.cursor.slice_from(start), &self.cursor)?;
                self.cursor.advance();
                let normalized = raw.replace(['\t', '\n', '\r'], " ");
                return decode_entities(&normalized).map_err(|kind| Error::at(kind, pos));
            }
            if b == b'<' {
                return Err(self.error_here(ErrorKind::InvalidToken, "'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(self.error_here(ErrorKind::InvalidToken, "invalid name")),
            None => return Err(self.error_here(ErrorKind::UnexpectedEof, "expected name")),
        }
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_str(self.cursor.slice_from(start), &self.cursor).map(str::to_string)
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.current() == Some(expected) {
            self.cursor.advance();
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.error_here(ErrorKind::UnexpectedEof, "unexpected end of input"))
        } else {
            let message = format!("expected '{}'", char::from(expected));
            Err(self.error_here(ErrorKind::InvalidToken, &message))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        let pos = self.cursor.position();
        Error::with_message(kind, Span::at(pos), message)
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<RawEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_event() {
            Ok(event) => event.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

fn bytes_to_str<'b>(bytes: &'b [u8], cursor: &Cursor<'_>) -> Result<&'b str> {
    std::str::from_utf8(bytes).map_err(|_| {
        Error::with_message(
            ErrorKind::UnsupportedEncoding {
                encoding: "non-UTF-8".to_string(),
            },
            Span::at(cursor.position()),
            "invalid utf-8",
        )
    })
}

/// `encoding` pseudo-attribute of an XML declaration body
fn declared_encoding(declaration: &str) -> Option<&str> {
    let rest = declaration.split_once("encoding")?.1.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let value = rest.get(1..)?;
    value.split_once(quote).map(|(encoding, _)| encoding)
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> std::result::Result<String, ErrorKind> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        result.push_str(rest.get(..amp).unwrap_or_default());
        let after = rest.get(amp + 1..).unwrap_or_default();
        let (entity, tail) = after.split_once(';').ok_or(ErrorKind::InvalidEntity)?;

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        result.push(decoded.ok_or(ErrorKind::InvalidEntity)?);
        rest = tail;
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::event::RawKind;

    fn collect(input: &str) -> Result<Vec<RawEvent>> {
        Reader::new(input.as_bytes()).collect()
    }

    fn kinds_and_names(events: &[RawEvent]) -> Vec<(RawKind, &str)> {
        events.iter().map(|e| (e.kind, e.name.as_str())).collect()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_depth, 128);
        assert_eq!(config.max_size, 0);
        assert!(!config.trim_text);
        assert!(!config.keep_blank_text);
    }

    #[test]
    fn test_simple_document() -> Result<()> {
        let events = collect("<root><child>text</child></root>")?;
        assert_eq!(
            kinds_and_names(&events),
            vec![
                (RawKind::Start, "root"),
                (RawKind::Start, "child"),
                (RawKind::End, "child"),
                (RawKind::End, "root"),
            ]
        );
        assert_eq!(events.get(1).and_then(|e| e.text.as_deref()), Some("text"));
        assert_eq!(events.get(2).and_then(|e| e.text.as_deref()), Some("text"));
        Ok(())
    }

    #[test]
    fn test_self_closing_reports_start_and_end() -> Result<()> {
        let events = collect("<root><child id=\"1\"/></root>")?;
        assert_eq!(
            kinds_and_names(&events),
            vec![
                (RawKind::Start, "root"),
                (RawKind::Start, "child"),
                (RawKind::End, "child"),
                (RawKind::End, "root"),
            ]
        );
        assert_eq!(events.get(1).map(|e| e.attributes.len()), Some(1));
        assert_eq!(events.get(2).map(|e| e.attributes.len()), Some(0));
        Ok(())
    }

    #[test]
    fn test_attributes_keep_document_order() -> Result<()> {
        let events = collect("<root zeta='1' alpha=\"2\" mid='3'/>")?;
        let names: Vec<_> = events
            .first()
            .map(|e| e.attributes.iter().map(|a| a.name.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        Ok(())
    }

    #[test]
    fn test_namespace_declarations_are_not_attributes() -> Result<()> {
        let events = collect("<a xmlns=\"urn:x\" xmlns:ns2=\"urn:y\" ns2:id=\"7\"><ns2:b/></a>")?;
        let first = events.first().map(|e| e.attributes.clone()).unwrap_or_default();
        assert_eq!(first, vec![Attribute::new("ns2:id", "7")]);
        assert_eq!(events.get(1).and_then(|e| e.prefix.as_deref()), Some("ns2"));
        Ok(())
    }

    #[test]
    fn test_blank_text_is_dropped() -> Result<()> {
        let events = collect("<a>\n  <b> x </b>\n</a>")?;
        assert_eq!(events.first().and_then(|e| e.text.clone()), None);
        assert_eq!(events.get(1).and_then(|e| e.text.as_deref()), Some(" x "));
        Ok(())
    }

    #[test]
    fn test_blank_leaf_text_is_kept() -> Result<()> {
        let events = collect("<a>\n  <s>   </s>\n  <t><!-- c --> \t</t>\n</a>")?;
        assert_eq!(events.first().and_then(|e| e.text.clone()), None);
        assert_eq!(events.get(1).and_then(|e| e.text.as_deref()), Some("   "));
        assert_eq!(events.get(3).and_then(|e| e.text.as_deref()), Some(" \t"));
        Ok(())
    }

    #[test]
    fn test_keep_blank_and_trim() -> Result<()> {
        let config = Config::default()
            .with_keep_blank_text(true)
            .with_trim_text(true);
        let events: Vec<_> =
            Reader::with_config(b"<a>  <b> x </b></a>", config).collect::<Result<_>>()?;
        assert_eq!(events.first().and_then(|e| e.text.as_deref()), Some(""));
        assert_eq!(events.get(1).and_then(|e| e.text.as_deref()), Some("x"));
        Ok(())
    }

    #[test]
    fn test_leading_text_joins_cdata_and_skips_comments() -> Result<()> {
        let events = collect("<a>one <!-- c --><![CDATA[<two>]]> &amp; three<b/>tail</a>")?;
        assert_eq!(
            events.first().and_then(|e| e.text.as_deref()),
            Some("one <two> & three")
        );
        assert_eq!(
            events.last().and_then(|e| e.text.as_deref()),
            Some("one <two> & three")
        );
        Ok(())
    }

    #[test]
    fn test_prolog_is_skipped() -> Result<()> {
        let input = concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
            "<!DOCTYPE rss [<!ENTITY x \"y>\">]>\n",
            "<!-- top -->\n<rss/>\n",
        );
        let events = collect(input)?;
        assert_eq!(events.len(), 2);
        Ok(())
    }

    #[test]
    fn test_entities_are_decoded() -> Result<()> {
        let events = collect("<a t=\"&lt;&#65;&#x42;&gt;\">&quot;&apos;</a>")?;
        let event = events.first();
        assert_eq!(
            event.and_then(|e| e.attributes.first()).map(|a| a.value.as_str()),
            Some("<AB>")
        );
        assert_eq!(event.and_then(|e| e.text.as_deref()), Some("\"'"));
        Ok(())
    }

    #[test]
    fn test_unknown_entity_is_error() {
        let err = collect("<a>&nbsp;</a>").err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidEntity));
    }

    #[test]
    fn test_mismatched_tag() {
        let err = collect("<a><b></a>").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MismatchedTag {
                expected: "b".to_string(),
                found: "a".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = collect("<a x='1' x='2'/>").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::DuplicateAttribute {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn test_truncated_document() {
        let err = collect("<a><b>text").err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_multiple_roots() {
        let err = collect("<a/><b/>").err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidToken));
    }

    #[test]
    fn test_empty_document() {
        let err = collect("  ").err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_declared_encoding_is_checked() {
        let err = collect("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>").err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::UnsupportedEncoding {
                encoding: "ISO-8859-1".to_string()
            })
        );
    }

    #[test]
    fn test_depth_limit() {
        let config = Config::new(2, 0);
        let result: Result<Vec<_>> = Reader::with_config(b"<a><b><c/></b></a>", config).collect();
        assert_eq!(
            result.err().map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded { max: 2 })
        );
    }

    #[test]
    fn test_size_limit() {
        let config = Config::new(0, 5);
        let result: Result<Vec<_>> = Reader::with_config(b"<root/>", config).collect();
        assert_eq!(
            result.err().map(|e| e.kind().clone()),
            Some(ErrorKind::MaxSizeExceeded { max: 5 })
        );
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = Reader::new(b"<a></b>");
        assert!(matches!(reader.next(), Some(Ok(_))));
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_error_position() {
        let err = collect("<a>\n  <b></c>\n</a>").err();
        let pos = err.map(|e| e.span().start);
        assert_eq!(pos.map(|p| p.line), Some(2));
    }
}
