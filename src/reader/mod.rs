/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod element;
mod error;

use std::borrow::Cow;
use std::io::ErrorKind;
use std::io::Read;

use tracing::trace;

use crate::entities;

pub use element::Attribute;
pub use element::Element;
pub use element::Name;
pub use element::Node;
pub use element::StartElement;
pub use element::attributes_to_map;
pub use error::DecodeError;
pub use error::ReadError;
use error::description;

/// A single XML construct read from the stream.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Token {
    /// A start tag or an empty element tag.
    ///
    /// An empty element tag is always followed by a matching
    /// [End](Token::End) token.
    Start(StartElement),

    /// An end tag.
    End(Name),

    /// Character data with the references replaced.
    ///
    /// CDATA sections are returned as text too.
    Text(String),
}

const READ_BUFFER_SIZE: usize = 4096;

macro_rules! whitespace {
    () => {
        b' ' | b'\t' | b'\r' | b'\n'
    };
}

macro_rules! xml_error {
    ($a:ident) => {
        return Err(ReadError::Decode(DecodeError::BadXml(description::$a)))
    };
}

/// Pull based XML reader for endless streams.
///
/// Unlike a document parser, this reader never expects the root tag
/// to be closed. It hands out one construct at a time, and blocks on
/// the underlying reader only when it needs more bytes to finish the
/// current construct.
///
/// The reader checks that end tags match their start tags, so typed
/// decoders built on top of it only need to count tokens.
pub struct XmlReader<R> {
    inner: R,
    buffer: Box<[u8; READ_BUFFER_SIZE]>,
    consumed: usize,
    read: usize,
    open_tags: Vec<Name>,
    pending_end: Option<Name>,
    capture: Option<Vec<u8>>,
}

impl<R: Read> XmlReader<R> {
    pub fn new(inner: R) -> Self {
        XmlReader {
            inner,
            buffer: Box::new([0; READ_BUFFER_SIZE]),
            consumed: 0,
            read: 0,
            open_tags: Vec::new(),
            pending_end: None,
            capture: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns the underlying reader.
    ///
    /// Bytes which are read into the internal buffer but not parsed yet
    /// are discarded.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Number of currently open elements, including the stream root.
    pub fn depth(&self) -> usize {
        self.open_tags.len()
    }

    fn fill(&mut self) -> Result<bool, ReadError> {
        if self.consumed < self.read {
            return Ok(true);
        }
        loop {
            match self.inner.read(&mut self.buffer[..]) {
                Ok(0) => return Ok(false),
                Ok(nr_read) => {
                    trace!(
                        bytes = %String::from_utf8_lossy(&self.buffer[..nr_read]),
                        "received"
                    );
                    self.read = nr_read;
                    self.consumed = 0;
                    return Ok(true);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, ReadError> {
        if self.fill()? {
            Ok(Some(self.buffer[self.consumed]))
        } else {
            Ok(None)
        }
    }

    fn next_byte(&mut self) -> Result<u8, ReadError> {
        if !self.fill()? {
            return Err(ReadError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "stream closed",
            )));
        }
        let c = self.buffer[self.consumed];
        self.consumed += 1;
        if c < 0x20 && !matches!(c, b'\t' | b'\n' | b'\r') {
            xml_error!(CHAR_INVALID);
        }
        if let Some(capture) = &mut self.capture {
            capture.push(c);
        }
        Ok(c)
    }

    fn utf8(bytes: Vec<u8>) -> Result<String, ReadError> {
        match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(_) => xml_error!(UTF8_INVALID),
        }
    }

    fn decode_text(bytes: Vec<u8>) -> Result<String, ReadError> {
        let text = Self::utf8(bytes)?;
        let unescaped = match entities::unescape(&text)? {
            Cow::Borrowed(_) => None,
            Cow::Owned(unescaped) => Some(unescaped),
        };
        Ok(unescaped.unwrap_or(text))
    }

    fn read_until(&mut self, terminator: &[u8]) -> Result<Vec<u8>, ReadError> {
        let mut bytes = Vec::new();
        while !bytes.ends_with(terminator) {
            bytes.push(self.next_byte()?);
        }
        bytes.truncate(bytes.len() - terminator.len());
        Ok(bytes)
    }

    fn read_name(&mut self, first: u8) -> Result<(String, u8), ReadError> {
        let mut bytes = Vec::new();
        let mut c = first;
        loop {
            match c {
                whitespace!() | b'/' | b'>' | b'=' => break,
                b'<' | b'"' | b'\'' => xml_error!(TAG_BAD_NAME),
                _ => bytes.push(c),
            }
            c = self.next_byte()?;
        }
        Ok((Self::utf8(bytes)?, c))
    }

    fn skip_whitespace(&mut self, mut c: u8) -> Result<u8, ReadError> {
        while matches!(c, whitespace!()) {
            c = self.next_byte()?;
        }
        Ok(c)
    }

    fn read_text(&mut self, first: u8) -> Result<Token, ReadError> {
        let mut bytes = vec![first];
        while let Some(c) = self.peek_byte()? {
            if c == b'<' {
                break;
            }
            bytes.push(self.next_byte()?);
        }
        Ok(Token::Text(Self::decode_text(bytes)?))
    }

    fn read_markup(&mut self) -> Result<Option<String>, ReadError> {
        match self.next_byte()? {
            b'-' => {
                if self.next_byte()? != b'-' {
                    xml_error!(COMMENT_MISSING_DASH);
                }
                self.read_until(b"-->")?;
                Ok(None)
            }
            b'[' => {
                for &expected in b"CDATA[" {
                    if self.next_byte()? != expected {
                        xml_error!(MARKUP_CDATA_SECTION_BAD_START);
                    }
                }
                let bytes = self.read_until(b"]]>")?;
                Ok(Some(Self::utf8(bytes)?))
            }
            b'D' => xml_error!(MARKUP_DOCTYPE_NOT_ALLOWED),
            _ => xml_error!(MARKUP_UNRECOGNIZED),
        }
    }

    fn read_attribute(&mut self, first: u8) -> Result<Attribute, ReadError> {
        let (name, c) = self.read_name(first)?;
        if name.is_empty() {
            xml_error!(TAG_ATTRIBUTE_WITHOUT_NAME);
        }
        if self.skip_whitespace(c)? != b'=' {
            xml_error!(TAG_ATTRIBUTE_WITHOUT_EQUAL);
        }
        let c = self.next_byte()?;
        let quote = self.skip_whitespace(c)?;
        if quote != b'\'' && quote != b'"' {
            xml_error!(TAG_ATTRIBUTE_WITHOUT_QUOTE);
        }
        let mut value = Vec::new();
        loop {
            match self.next_byte()? {
                c if c == quote => break,
                b'<' => xml_error!(TAG_ATTRIBUTE_BAD_VALUE),
                c => value.push(c),
            }
        }
        Ok(Attribute {
            name: Name::parse(&name),
            value: Self::decode_text(value)?,
        })
    }

    fn read_start_tag(&mut self, first: u8) -> Result<Token, ReadError> {
        if matches!(first, whitespace!()) {
            xml_error!(TAG_WHITESPACE_START);
        }
        let (full_name, mut c) = self.read_name(first)?;
        let name = Name::parse(&full_name);
        let mut attributes = Vec::new();
        let mut separated = false;
        let self_closing = loop {
            match c {
                whitespace!() => {
                    separated = true;
                    c = self.next_byte()?;
                }
                b'>' => break false,
                b'/' => {
                    if self.next_byte()? != b'>' {
                        xml_error!(TAG_EMPTY_TAG_MISSING_END);
                    }
                    break true;
                }
                _ => {
                    if !separated {
                        xml_error!(TAG_ATTRIBUTE_WITHOUT_WHITESPACE);
                    }
                    attributes.push(self.read_attribute(c)?);
                    separated = false;
                    c = self.next_byte()?;
                }
            }
        };
        if self_closing {
            self.pending_end = Some(name.clone());
        } else {
            self.open_tags.push(name.clone());
        }
        Ok(Token::Start(StartElement {
            name,
            attributes,
            self_closing,
        }))
    }

    fn read_end_tag(&mut self) -> Result<Token, ReadError> {
        let first = self.next_byte()?;
        let (full_name, c) = self.read_name(first)?;
        if self.skip_whitespace(c)? != b'>' {
            xml_error!(TAG_END_TAG_ATTRIBUTES);
        }
        let name = Name::parse(&full_name);
        match self.open_tags.pop() {
            Some(open) if open == name => Ok(Token::End(name)),
            Some(_) => xml_error!(TAG_MISMATCH),
            None => xml_error!(TAG_CLOSE_WITHOUT_OPEN),
        }
    }

    /// Reads the next construct from the stream.
    ///
    /// Comments, processing instructions, and the XML declaration are
    /// skipped silently.
    pub fn read_token(&mut self) -> Result<Token, ReadError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Token::End(name));
        }
        loop {
            let c = self.next_byte()?;
            if c != b'<' {
                return self.read_text(c);
            }
            match self.next_byte()? {
                b'?' => {
                    self.read_until(b"?>")?;
                }
                b'!' => {
                    if let Some(text) = self.read_markup()? {
                        return Ok(Token::Text(text));
                    }
                }
                b'/' => return self.read_end_tag(),
                c => return self.read_start_tag(c),
            }
        }
    }

    /// Skips forward to the next start tag and returns it.
    ///
    /// A start tag with an empty local name is reported as
    /// [InvalidResponse](DecodeError::InvalidResponse).
    pub fn next_start(&mut self) -> Result<StartElement, ReadError> {
        loop {
            if let Token::Start(start) = self.read_token()? {
                if start.name.local.is_empty() {
                    return Err(DecodeError::InvalidResponse.into());
                }
                return Ok(start);
            }
        }
    }

    /// Reads the next element with all of its content.
    pub fn read_element(&mut self) -> Result<Element, ReadError> {
        let start = self.next_start()?;
        self.read_element_from(start)
    }

    /// Reads the content of an element whose start tag was just returned.
    pub fn read_element_from(&mut self, start: StartElement) -> Result<Element, ReadError> {
        let mut stack = vec![Element::from(start)];
        loop {
            match self.read_token()? {
                Token::Start(child) => {
                    if child.name.local.is_empty() {
                        return Err(DecodeError::InvalidResponse.into());
                    }
                    stack.push(Element::from(child));
                }
                Token::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text));
                    }
                }
                Token::End(_) => {
                    let Some(done) = stack.pop() else {
                        xml_error!(TAG_CLOSE_WITHOUT_OPEN);
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::Element(done)),
                        None => return Ok(done),
                    }
                }
            }
        }
    }

    /// Returns the raw XML between a start tag which was just returned
    /// and its end tag.
    ///
    /// References are not replaced and nested tags are kept as they
    /// appear in the stream.
    pub fn read_inner_xml(&mut self, start: &StartElement) -> Result<String, ReadError> {
        if start.self_closing {
            self.read_token()?;
            return Ok(String::new());
        }
        self.capture = Some(Vec::new());
        let result = self.skip_content();
        let mut captured = self.capture.take().unwrap_or_default();
        result?;
        // Captured bytes end with the end tag, which has no '<' inside
        if let Some(pos) = captured.iter().rposition(|&c| c == b'<') {
            captured.truncate(pos);
        }
        Self::utf8(captured)
    }

    fn skip_content(&mut self) -> Result<(), ReadError> {
        let mut depth: usize = 0;
        loop {
            match self.read_token()? {
                Token::Start(_) => depth += 1,
                Token::End(_) if depth == 0 => return Ok(()),
                Token::End(_) => depth -= 1,
                Token::Text(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests;
