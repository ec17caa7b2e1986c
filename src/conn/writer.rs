/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io::Write;
use std::sync::Arc;

use tracing::debug;
use tracing::trace;

use crate::stanza;
use crate::stanza::MessageType;

use super::Close;
use super::ConnError;
use super::ErrorSink;
use super::NoopSink;

const PASSWORD_MASK: &str = "********";

/// Sending half of a connection.
///
/// Stanza methods do not return errors. A failed write is reported to
/// the installed [ErrorSink] instead, and dropped with a warning when
/// no sink is installed. Callers who need to know about write failures
/// must install a sink. Only [send_keepalive()](StanzaWriter::send_keepalive)
/// returns its error directly.
pub struct StanzaWriter<W> {
    stream: W,
    sink: Arc<dyn ErrorSink>,
}

impl<W: Write> StanzaWriter<W> {
    pub fn new(stream: W) -> Self {
        Self::with_sink(stream, Arc::new(NoopSink))
    }

    pub(super) fn with_sink(stream: W, sink: Arc<dyn ErrorSink>) -> Self {
        StanzaWriter { stream, sink }
    }

    pub fn set_error_sink(&mut self, sink: impl ErrorSink + 'static) {
        debug!("error sink installed");
        self.sink = Arc::new(sink);
    }

    pub fn get_ref(&self) -> &W {
        &self.stream
    }

    pub(super) fn into_parts(self) -> (W, Arc<dyn ErrorSink>) {
        (self.stream, self.sink)
    }

    fn write_fragment(&mut self, fragment: &str) -> std::io::Result<()> {
        self.stream.write_all(fragment.as_bytes())?;
        self.stream.flush()
    }

    fn send(&mut self, fragment: String) {
        trace!(bytes = fragment.as_str(), "sending");
        self.send_untraced(fragment);
    }

    fn send_untraced(&mut self, fragment: String) {
        if let Err(err) = self.write_fragment(&fragment) {
            self.sink.report(ConnError::Write(err));
        }
    }

    /// Opens the XML stream, this must be the first write on a new stream.
    pub fn open_stream(&mut self, from_jid: &str, to_host: &str) {
        self.send(stanza::stream_header(from_jid, to_host));
    }

    /// Asks the server to start TLS negotiation.
    ///
    /// After the server answers with `<proceed/>`, the connection must be
    /// upgraded with [upgrade_tls()](super::Connection::upgrade_tls).
    pub fn request_starttls(&mut self) {
        self.send(stanza::starttls());
    }

    /// Sends a legacy non-SASL authentication request.
    ///
    /// The password is sent in clear text inside the stanza, and it is
    /// masked in the trace output.
    pub fn authenticate(&mut self, user: &str, pass: &str, resource: &str) {
        let id = stanza::request_id();
        let masked = stanza::auth(&id, user, PASSWORD_MASK, resource);
        trace!(bytes = masked.as_str(), "sending");
        self.send_untraced(stanza::auth(&id, user, pass, resource));
    }

    pub fn request_discovery(&mut self, from: &str, to: &str) {
        self.send(stanza::iq_get(
            from,
            to,
            &stanza::request_id(),
            stanza::NS_DISCO_ITEMS,
        ));
    }

    pub fn set_presence(&mut self, jid: &str, show: &str) {
        self.send(stanza::presence(jid, show));
    }

    pub fn request_roster(&mut self, from: &str, to: &str) {
        self.send(stanza::iq_get(
            from,
            to,
            &stanza::request_id(),
            stanza::NS_IQ_ROSTER,
        ));
    }

    pub fn part_room(&mut self, room_id: &str) {
        self.send(stanza::muc_part(room_id));
    }

    pub fn join_room(&mut self, room_id: &str, jid: &str) {
        self.send(stanza::muc_join(&stanza::request_id(), room_id, jid));
    }

    pub fn send_room_message(&mut self, kind: MessageType, to: &str, from: &str, body: &str) {
        self.send(stanza::muc_message(
            from,
            &stanza::request_id(),
            to,
            kind,
            body,
        ));
    }

    /// Sends a whitespace keepalive.
    ///
    /// A failure here usually means the connection is dead, so it is
    /// returned to the caller instead of going to the error sink.
    pub fn send_keepalive(&mut self) -> Result<(), ConnError> {
        trace!("sending keepalive");
        self.write_fragment(stanza::KEEPALIVE)
            .map_err(ConnError::Write)
    }
}

impl<W: Write + Close> StanzaWriter<W> {
    /// Shuts the transport down in both directions.
    pub fn close(&mut self) -> Result<(), ConnError> {
        debug!("closing connection");
        self.stream.close().map_err(ConnError::Connection)
    }
}
