/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::error::Error;
use std::fmt::Display;

use crate::entities::BadReference;

/// A structural problem in the incoming XML stream.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// The bytes are not well-formed XML.
    BadXml(&'static str),

    /// A start tag without a local name was received.
    ///
    /// This is reported separately from [BadXml](DecodeError::BadXml)
    /// since it indicates a corrupted response rather than a syntax
    /// problem the tokenizer could pinpoint.
    InvalidResponse,

    /// A typed decode found a different element than it decodes.
    UnexpectedElement {
        expected: &'static str,
        found: String,
    },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::BadXml(msg) => write!(f, "invalid XML syntax: {msg}"),
            DecodeError::InvalidResponse => write!(f, "invalid xml response"),
            DecodeError::UnexpectedElement { expected, found } => {
                write!(f, "expected element <{expected}> but have <{found}>")
            }
        }
    }
}

impl Error for DecodeError {}

impl From<BadReference> for DecodeError {
    fn from(err: BadReference) -> Self {
        DecodeError::BadXml(err.0)
    }
}

#[derive(Debug)]
pub enum ReadError {
    Io(std::io::Error),
    Decode(DecodeError),
}

impl Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Io(err) => err.fmt(f),
            ReadError::Decode(err) => err.fmt(f),
        }
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadError::Io(err) => Some(err),
            ReadError::Decode(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        ReadError::Io(err)
    }
}

impl From<DecodeError> for ReadError {
    fn from(err: DecodeError) -> Self {
        ReadError::Decode(err)
    }
}

impl From<BadReference> for ReadError {
    fn from(err: BadReference) -> Self {
        ReadError::Decode(err.into())
    }
}

pub(super) mod description {
    pub(in super::super) const CHAR_INVALID: &str = "Invalid XML character";
    pub(in super::super) const UTF8_INVALID: &str = "Invalid UTF8 sequence";
    pub(in super::super) const TAG_WHITESPACE_START: &str = "Tag cannot start with whitespace";
    pub(in super::super) const TAG_BAD_NAME: &str = "Tag names cannot have '<' or quotes";
    pub(in super::super) const TAG_CLOSE_WITHOUT_OPEN: &str = "Close tag without open";
    pub(in super::super) const TAG_MISMATCH: &str = "Close tag does not match the open tag";
    pub(in super::super) const TAG_END_TAG_ATTRIBUTES: &str = "End tag cannot have attributes";
    pub(in super::super) const TAG_EMPTY_TAG_MISSING_END: &str =
        "Empty element tags must end after the '/'";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_NAME: &str = "Tag attribute has no name";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_WHITESPACE: &str =
        "Tag attributes must be separated by whitespace";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_EQUAL: &str =
        "Tag attributes must have '=' before the value";
    pub(in super::super) const TAG_ATTRIBUTE_WITHOUT_QUOTE: &str =
        "Tag attribute value must be double or single quotes";
    pub(in super::super) const TAG_ATTRIBUTE_BAD_VALUE: &str =
        "Tag value cannot have '<' character without a reference";
    pub(in super::super) const COMMENT_MISSING_DASH: &str =
        "Comment tag should start with double dash";
    pub(in super::super) const MARKUP_CDATA_SECTION_BAD_START: &str =
        "Character data sections must start with '[CDATA['";
    pub(in super::super) const MARKUP_DOCTYPE_NOT_ALLOWED: &str =
        "Document type declarations are not allowed in XML streams";
    pub(in super::super) const MARKUP_UNRECOGNIZED: &str =
        "Markup is not a comment or character data section";
}
