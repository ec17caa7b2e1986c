/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::borrow::Cow;

pub mod predefined {
    pub const LT: &str = "&lt;";
    pub const GT: &str = "&gt;";
    pub const AMP: &str = "&amp;";
    pub const APOS: &str = "&apos;";
    pub const QUOT: &str = "&quot;";
}

// Attribute value normalization turns literal whitespace into spaces,
// character references survive it.
mod whitespace {
    pub const TAB: &str = "&#x9;";
    pub const LF: &str = "&#xA;";
    pub const CR: &str = "&#xD;";
}

/// Stands in for characters which cannot appear in an XML document.
pub const REPLACEMENT: char = '\u{fffd}';

fn reference(c: char) -> Option<&'static str> {
    match c {
        '<' => Some(predefined::LT),
        '>' => Some(predefined::GT),
        '&' => Some(predefined::AMP),
        '\'' => Some(predefined::APOS),
        '"' => Some(predefined::QUOT),
        '\t' => Some(whitespace::TAB),
        '\n' => Some(whitespace::LF),
        '\r' => Some(whitespace::CR),
        _ => None,
    }
}

fn needs_escape(c: char) -> bool {
    reference(c).is_some() || !is_valid_xml_char(c as u32)
}

pub fn escaped_size(s: &str) -> usize {
    let mut size = 0;
    for c in s.chars() {
        match reference(c) {
            Some(reference) => size += reference.len(),
            None if is_valid_xml_char(c as u32) => size += c.len_utf8(),
            None => size += REPLACEMENT.len_utf8(),
        }
    }

    size
}

/// Escapes the XML special characters in a string.
///
/// The result is safe both as character data and as a single or double
/// quoted attribute value. Tab, newline and carriage return are written
/// as character references so they survive in attribute values too.
/// Characters not allowed in XML are replaced with [REPLACEMENT].
/// Strings without special characters are returned borrowed.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.chars().any(needs_escape) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(escaped_size(s));
    for c in s.chars() {
        match reference(c) {
            Some(reference) => escaped.push_str(reference),
            None if is_valid_xml_char(c as u32) => escaped.push(c),
            None => escaped.push(REPLACEMENT),
        }
    }
    Cow::Owned(escaped)
}

/// Error returned when a reference cannot be decoded.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct BadReference(pub &'static str);

impl std::fmt::Display for BadReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadReference {}

fn is_valid_xml_char(c: u32) -> bool {
    matches!(c, 0x09 | 0x0a | 0x0d | 0x20..=0xd7ff | 0xe000..=0xfffd | 0x10000..=0x10ffff)
}

fn decode_reference(reference: &str) -> Result<char, BadReference> {
    let value = match reference {
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "amp" => return Ok('&'),
        "apos" => return Ok('\''),
        "quot" => return Ok('"'),
        _ => {
            if let Some(hex) = reference.strip_prefix("#x") {
                if hex.is_empty() || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
                    return Err(BadReference("Non hex digit in hexadecimal character reference"));
                }
                u32::from_str_radix(hex, 16)
            } else if let Some(decimal) = reference.strip_prefix('#') {
                if decimal.is_empty() || !decimal.bytes().all(|c| c.is_ascii_digit()) {
                    return Err(BadReference("Non digit in decimal character reference"));
                }
                decimal.parse::<u32>()
            } else {
                return Err(BadReference(
                    "Non-predefined entity references are not supported",
                ));
            }
        }
    };
    match value {
        Ok(value) if is_valid_xml_char(value) => {
            char::from_u32(value).ok_or(BadReference("Invalid XML character"))
        }
        _ => Err(BadReference("Invalid XML character")),
    }
}

/// Replaces entity and character references with the actual characters.
pub fn unescape(s: &str) -> Result<Cow<'_, str>, BadReference> {
    if !s.contains('&') {
        return Ok(Cow::Borrowed(s));
    }
    let mut text = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        text.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(';')
            .ok_or(BadReference("Reference must end with ';'"))?;
        text.push(decode_reference(&after[..end])?);
        rest = &after[end + 1..];
    }
    text.push_str(rest);
    Ok(Cow::Owned(text))
}
