/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io::Read;

use crate::reader::DecodeError;
use crate::reader::Element;
use crate::reader::StartElement;
use crate::reader::XmlReader;
use crate::stanza::Ack;
use crate::stanza::Incoming;
use crate::stanza::MessageBody;
use crate::stanza::QueryResult;
use crate::stanza::StreamFeatures;

use super::ConnError;

/// Receiving half of a connection.
///
/// Each method blocks until it has consumed one construct from the
/// stream. The reader does not know the protocol order; calling the
/// right method at the right time is up to the caller, or the caller
/// can use [read_incoming()](StanzaReader::read_incoming) and dispatch
/// on the result.
pub struct StanzaReader<R> {
    xml: XmlReader<R>,
}

impl<R: Read> StanzaReader<R> {
    pub fn new(stream: R) -> Self {
        StanzaReader {
            xml: XmlReader::new(stream),
        }
    }

    pub(super) fn into_inner(self) -> R {
        self.xml.into_inner()
    }

    /// Gives access to the underlying XML reader for custom decoding.
    pub fn xml_reader(&mut self) -> &mut XmlReader<R> {
        &mut self.xml
    }

    // Tag is checked before the content is read, the stream root would
    // otherwise block until the stream ends.
    fn read_named(&mut self, local: &'static str) -> Result<Element, ConnError> {
        let start = self.xml.next_start()?;
        if start.name.local != local {
            return Err(DecodeError::UnexpectedElement {
                expected: local,
                found: start.name.to_string(),
            }
            .into());
        }
        Ok(self.xml.read_element_from(start)?)
    }

    pub fn read_features(&mut self) -> Result<StreamFeatures, ConnError> {
        let element = self.read_named(StreamFeatures::TAG)?;
        Ok(StreamFeatures::from_element(&element)?)
    }

    /// Returns the next start tag, skipping everything else.
    ///
    /// Content of the returned element stays in the stream, so this can
    /// be followed by a typed read for its children.
    pub fn read_next_element(&mut self) -> Result<StartElement, ConnError> {
        Ok(self.xml.next_start()?)
    }

    /// Reads the next element and returns its inner XML as the body.
    pub fn read_body(&mut self) -> Result<MessageBody, ConnError> {
        let start = self.xml.next_start()?;
        Ok(MessageBody {
            raw: self.xml.read_inner_xml(&start)?,
        })
    }

    pub fn read_query_result(&mut self) -> Result<QueryResult, ConnError> {
        let element = self.read_named(QueryResult::TAG)?;
        Ok(QueryResult::from_element(&element)?)
    }

    pub fn read_ack(&mut self) -> Result<Ack, ConnError> {
        Ok(Ack::from_element(&self.xml.read_element()?))
    }

    /// Reads the rest of an element returned by
    /// [read_next_element()](StanzaReader::read_next_element).
    pub fn read_element_from(&mut self, start: StartElement) -> Result<Element, ConnError> {
        Ok(self.xml.read_element_from(start)?)
    }

    /// Reads the next start tag and decodes it according to its name.
    ///
    /// Stream features, query results, and message bodies are decoded
    /// completely. Any other element is returned as a start tag with
    /// its content left in the stream.
    pub fn read_incoming(&mut self) -> Result<Incoming, ConnError> {
        let start = self.xml.next_start()?;
        match start.name.local.as_str() {
            StreamFeatures::TAG => {
                let element = self.xml.read_element_from(start)?;
                Ok(Incoming::Features(StreamFeatures::from_element(&element)?))
            }
            QueryResult::TAG => {
                let element = self.xml.read_element_from(start)?;
                Ok(Incoming::Query(QueryResult::from_element(&element)?))
            }
            "body" => Ok(Incoming::Body(MessageBody {
                raw: self.xml.read_inner_xml(&start)?,
            })),
            _ => Ok(Incoming::Element(start)),
        }
    }
}
