/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Minimal blocking XMPP client connection.
//!
//! A [Connection] owns the socket and a streaming XML decoder bound to
//! it. Writer methods format and send one protocol fragment each;
//! reader methods consume one XML construct each. Protocol ordering is
//! left to the caller.

mod conn;
mod entities;
mod reader;
pub mod stanza;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use conn::Close;
pub use conn::ConnError;
pub use conn::Connection;
pub use conn::Dialer;
pub use conn::ErrorSink;
pub use conn::NoopSink;
pub use conn::Plain;
pub use conn::Secure;
pub use conn::Security;
pub use conn::StanzaReader;
pub use conn::StanzaWriter;
pub use conn::TlsReadHalf;
pub use conn::TlsWriteHalf;

pub use entities::BadReference;
pub use entities::escape;
pub use entities::unescape;

pub use reader::Attribute;
pub use reader::DecodeError;
pub use reader::Element;
pub use reader::Name;
pub use reader::Node;
pub use reader::ReadError;
pub use reader::StartElement;
pub use reader::Token;
pub use reader::XmlReader;
pub use reader::attributes_to_map;

pub use stanza::Ack;
pub use stanza::DiscoveryItem;
pub use stanza::Incoming;
pub use stanza::MessageBody;
pub use stanza::MessageType;
pub use stanza::QueryResult;
pub use stanza::StreamFeatures;
