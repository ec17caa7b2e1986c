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

use crate::reader::DecodeError;
use crate::reader::ReadError;

#[derive(Debug)]
pub enum ConnError {
    /// Dialing or reading from the transport failed.
    Connection(std::io::Error),
    /// TLS setup or session failure.
    ///
    /// Handshake problems are only noticed by the first read after the
    /// upgrade.
    Tls(rustls::Error),
    /// The incoming XML is malformed or not what the decoder expects.
    Decode(DecodeError),
    /// Writing a stanza to the transport failed.
    Write(std::io::Error),
}

impl Display for ConnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnError::Connection(err) => write!(f, "connection error: {err}"),
            ConnError::Tls(err) => write!(f, "tls error: {err}"),
            ConnError::Decode(err) => err.fmt(f),
            ConnError::Write(err) => write!(f, "write error: {err}"),
        }
    }
}

impl Error for ConnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConnError::Connection(err) | ConnError::Write(err) => Some(err),
            ConnError::Tls(err) => Some(err),
            ConnError::Decode(err) => Some(err),
        }
    }
}

impl From<DecodeError> for ConnError {
    fn from(err: DecodeError) -> Self {
        ConnError::Decode(err)
    }
}

impl From<rustls::Error> for ConnError {
    fn from(err: rustls::Error) -> Self {
        ConnError::Tls(err)
    }
}

impl From<ReadError> for ConnError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io(err) => {
                // The TLS halves wrap session errors into io errors
                let tls_error = err
                    .get_ref()
                    .and_then(|inner| inner.downcast_ref::<rustls::Error>())
                    .cloned();
                match tls_error {
                    Some(tls_error) => ConnError::Tls(tls_error),
                    None => ConnError::Connection(err),
                }
            }
            ReadError::Decode(err) => ConnError::Decode(err),
        }
    }
}
