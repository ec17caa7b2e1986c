/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

use tracing::debug;

use crate::stanza::CLIENT_PORT;

use super::ConnError;
use super::Connection;
use super::Plain;

/// Connection settings for reaching a server.
pub struct Dialer {
    host: String,
    port: u16,
    connection_timeout: Duration,
}

// Rust resolver does require a port number but does NOT provide
// a way to provide a default one, so detect if the host has one.
fn needs_port(host: &str) -> bool {
    match (host.rfind(':'), host.rfind(']')) {
        (None, _) => true,
        (Some(colon), Some(bracket)) => colon < bracket,
        // More than one colon without brackets is a bare IPv6 address
        (Some(_), None) => host.matches(':').count() > 1,
    }
}

impl Dialer {
    pub fn new(host: &str) -> Self {
        Dialer {
            host: host.to_string(),
            port: CLIENT_PORT,
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Port used when the host does not specify one.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn resolve(&self) -> io::Result<Vec<SocketAddr>> {
        let addrs = if needs_port(&self.host) {
            let host = self.host.trim_start_matches('[').trim_end_matches(']');
            (host, self.port).to_socket_addrs()?
        } else {
            self.host.to_socket_addrs()?
        };
        Ok(addrs.collect())
    }

    pub fn connect(self) -> Result<Connection<Plain>, ConnError> {
        let addrs = self.resolve().map_err(ConnError::Connection)?;
        debug!(host = %self.host, ?addrs, "connecting");
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connection_timeout) {
                Ok(stream) => {
                    debug!(%addr, "connected");
                    return Connection::from_tcp(stream);
                }
                Err(err) => {
                    debug!(%addr, %err, "connection attempt failed");
                    last_error = Some(err);
                }
            }
        }
        Err(ConnError::Connection(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {}", self.host),
            )
        })))
    }
}
