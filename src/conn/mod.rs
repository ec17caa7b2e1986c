/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

mod dialer;
mod error;
mod reader;
mod sink;
mod transport;
mod writer;

use std::net::TcpStream;
use std::sync::Arc;

use rustls::ClientConfig;
use rustls::ClientConnection;
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tracing::debug;

use crate::reader::Element;
use crate::reader::StartElement;
use crate::stanza::Ack;
use crate::stanza::Incoming;
use crate::stanza::MessageBody;
use crate::stanza::MessageType;
use crate::stanza::QueryResult;
use crate::stanza::StreamFeatures;

pub use dialer::Dialer;
pub use error::ConnError;
pub use reader::StanzaReader;
pub use sink::ErrorSink;
pub use sink::NoopSink;
pub use transport::Close;
pub use transport::Plain;
pub use transport::Secure;
pub use transport::Security;
pub use transport::TlsReadHalf;
pub use transport::TlsWriteHalf;
pub use writer::StanzaWriter;

/// A client connection to an XMPP server.
///
/// The type parameter tracks the transport security. A freshly dialed
/// connection is [Plain]; [upgrade_tls()](Connection::upgrade_tls)
/// consumes it and returns a [Secure] one whose XML decoder reads from
/// the TLS session. Stanza methods are available in both states.
///
/// A typical session:
///
/// ```no_run
/// # use iks_conn::{Connection, ConnError};
/// # fn main() -> Result<(), ConnError> {
/// let (errors, failures) = std::sync::mpsc::channel::<ConnError>();
/// let mut conn = Connection::dial("example.com")?;
/// conn.set_error_sink(errors);
/// conn.open_stream("juliet@example.com", "example.com");
/// conn.read_next_element()?;
/// if conn.read_features()?.starttls_offered {
///     conn.request_starttls();
///     conn.read_next_element()?;
///     let mut conn = conn.upgrade_tls("example.com")?;
///     conn.open_stream("juliet@example.com", "example.com");
///     conn.read_next_element()?;
///     conn.read_features()?;
///     conn.authenticate("juliet", "s3cret", "balcony");
/// }
/// # drop(failures);
/// # Ok(())
/// # }
/// ```
pub struct Connection<S: Security = Plain> {
    reader: StanzaReader<S::Reader>,
    writer: StanzaWriter<S::Writer>,
}

fn default_tls_config() -> Arc<ClientConfig> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth(),
    )
}

impl Connection<Plain> {
    /// Connects to the standard client port of the given host.
    pub fn dial(host: &str) -> Result<Self, ConnError> {
        Dialer::new(host).connect()
    }

    pub(crate) fn from_tcp(stream: TcpStream) -> Result<Self, ConnError> {
        let read_stream = stream.try_clone().map_err(ConnError::Connection)?;
        Ok(Connection {
            reader: StanzaReader::new(read_stream),
            writer: StanzaWriter::new(stream),
        })
    }

    /// Upgrades the connection to TLS, verifying the server against the
    /// bundled web PKI roots.
    ///
    /// Call this after the server accepted the
    /// [request_starttls()](Connection::request_starttls) request.
    pub fn upgrade_tls(self, host: &str) -> Result<Connection<Secure>, ConnError> {
        self.upgrade_tls_with_config(host, default_tls_config())
    }

    /// Upgrades the connection to TLS with a caller provided configuration.
    ///
    /// Only the host name is checked here. The handshake runs with the
    /// first read or write, and its failures are reported from there.
    pub fn upgrade_tls_with_config(
        self,
        host: &str,
        config: Arc<ClientConfig>,
    ) -> Result<Connection<Secure>, ConnError> {
        let server_name = ServerName::try_from(host.to_string()).map_err(|err| {
            ConnError::Tls(rustls::Error::General(format!(
                "invalid server name {host}: {err}"
            )))
        })?;
        let session = ClientConnection::new(config, server_name)?;
        let read_socket = self.reader.into_inner();
        let (write_socket, sink) = self.writer.into_parts();
        let (read_half, write_half) = transport::tls_halves(read_socket, write_socket, session);
        debug!(host, "upgraded connection to tls");
        Ok(Connection {
            reader: StanzaReader::new(read_half),
            writer: StanzaWriter::with_sink(write_half, sink),
        })
    }
}

impl<S: Security> Connection<S> {
    /// Separates the connection into halves which can be moved to
    /// different threads.
    pub fn split(self) -> (StanzaReader<S::Reader>, StanzaWriter<S::Writer>) {
        (self.reader, self.writer)
    }

    pub fn reader(&mut self) -> &mut StanzaReader<S::Reader> {
        &mut self.reader
    }

    pub fn writer(&mut self) -> &mut StanzaWriter<S::Writer> {
        &mut self.writer
    }

    pub fn set_error_sink(&mut self, sink: impl ErrorSink + 'static) {
        self.writer.set_error_sink(sink);
    }

    pub fn close(&mut self) -> Result<(), ConnError> {
        self.writer.close()
    }

    pub fn open_stream(&mut self, from_jid: &str, to_host: &str) {
        self.writer.open_stream(from_jid, to_host);
    }

    pub fn request_starttls(&mut self) {
        self.writer.request_starttls();
    }

    pub fn authenticate(&mut self, user: &str, pass: &str, resource: &str) {
        self.writer.authenticate(user, pass, resource);
    }

    pub fn request_discovery(&mut self, from: &str, to: &str) {
        self.writer.request_discovery(from, to);
    }

    pub fn set_presence(&mut self, jid: &str, show: &str) {
        self.writer.set_presence(jid, show);
    }

    pub fn request_roster(&mut self, from: &str, to: &str) {
        self.writer.request_roster(from, to);
    }

    pub fn part_room(&mut self, room_id: &str) {
        self.writer.part_room(room_id);
    }

    pub fn join_room(&mut self, room_id: &str, jid: &str) {
        self.writer.join_room(room_id, jid);
    }

    pub fn send_room_message(&mut self, kind: MessageType, to: &str, from: &str, body: &str) {
        self.writer.send_room_message(kind, to, from, body);
    }

    pub fn send_keepalive(&mut self) -> Result<(), ConnError> {
        self.writer.send_keepalive()
    }

    pub fn read_features(&mut self) -> Result<StreamFeatures, ConnError> {
        self.reader.read_features()
    }

    pub fn read_next_element(&mut self) -> Result<StartElement, ConnError> {
        self.reader.read_next_element()
    }

    pub fn read_body(&mut self) -> Result<MessageBody, ConnError> {
        self.reader.read_body()
    }

    pub fn read_query_result(&mut self) -> Result<QueryResult, ConnError> {
        self.reader.read_query_result()
    }

    pub fn read_ack(&mut self) -> Result<Ack, ConnError> {
        self.reader.read_ack()
    }

    pub fn read_element_from(&mut self, start: StartElement) -> Result<Element, ConnError> {
        self.reader.read_element_from(start)
    }

    pub fn read_incoming(&mut self) -> Result<Incoming, ConnError> {
        self.reader.read_incoming()
    }
}
