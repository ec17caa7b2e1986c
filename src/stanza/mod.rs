/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

//! Wire templates and decoded stanza structures.
//!
//! Every interpolated value is escaped, so the templates can take
//! untrusted input without allowing stanza injection.

mod decoded;

use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::error;

use crate::entities::escape;

pub use decoded::Ack;
pub use decoded::DiscoveryItem;
pub use decoded::Incoming;
pub use decoded::MessageBody;
pub use decoded::MessageType;
pub use decoded::QueryResult;
pub use decoded::StreamFeatures;

pub const CLIENT_PORT: u16 = 5222;

pub const NS_JABBER_CLIENT: &str = "jabber:client";
pub const NS_STREAM: &str = "http://etherx.jabber.org/streams";
pub const NS_IQ_AUTH: &str = "jabber:iq:auth";
pub const NS_IQ_ROSTER: &str = "jabber:iq:roster";
pub const NS_TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";
pub const NS_DISCO_ITEMS: &str = "http://jabber.org/protocol/disco#items";
pub const NS_MUC: &str = "http://jabber.org/protocol/muc";

/// Whitespace keepalive sent between stanzas.
pub const KEEPALIVE: &str = " ";

/// Generates a new request identifier.
///
/// The identifier is 8 bytes from the operating system's secure random
/// source, hex encoded. If the random source fails, the failure is
/// logged and a predictable identifier is returned instead of failing
/// the stanza.
pub fn request_id() -> String {
    let mut bytes = [0u8; 8];
    if let Err(err) = OsRng.try_fill_bytes(&mut bytes) {
        error!(%err, "error generating request id");
    }
    hex::encode(bytes)
}

pub fn stream_header(from: &str, to: &str) -> String {
    format!(
        "<stream:stream from='{}' to='{}' version='1.0' xml:lang='en' xmlns='{NS_JABBER_CLIENT}' xmlns:stream='{NS_STREAM}'>",
        escape(from),
        escape(to),
    )
}

pub fn starttls() -> String {
    format!("<starttls xmlns='{NS_TLS}'/>")
}

/// Legacy non-SASL authentication request.
///
/// The password travels in clear text inside the stanza, so this must
/// only be sent over an encrypted stream.
pub fn auth(id: &str, user: &str, pass: &str, resource: &str) -> String {
    format!(
        "<iq type='set' id='{}'><query xmlns='{NS_IQ_AUTH}'><username>{}</username><password>{}</password><resource>{}</resource></query></iq>",
        escape(id),
        escape(user),
        escape(pass),
        escape(resource),
    )
}

pub fn iq_get(from: &str, to: &str, id: &str, namespace: &str) -> String {
    format!(
        "<iq from='{}' to='{}' id='{}' type='get'><query xmlns='{}'/></iq>",
        escape(from),
        escape(to),
        escape(id),
        escape(namespace),
    )
}

pub fn presence(jid: &str, show: &str) -> String {
    format!(
        "<presence from='{}'><show>{}</show></presence>",
        escape(jid),
        escape(show),
    )
}

pub fn muc_part(room_id: &str) -> String {
    format!(
        "<presence to='{}' type='unavailable'></presence>",
        escape(room_id)
    )
}

pub fn muc_join(id: &str, room_id: &str, jid: &str) -> String {
    format!(
        "<presence id='{}' to='{}' from='{}'><x xmlns='{NS_MUC}'/></presence>",
        escape(id),
        escape(room_id),
        escape(jid),
    )
}

pub fn muc_message(from: &str, id: &str, to: &str, kind: MessageType, body: &str) -> String {
    format!(
        "<message from='{}' id='{}' to='{}' type='{}'><body>{}</body></message>",
        escape(from),
        escape(id),
        escape(to),
        kind.as_str(),
        escape(body),
    )
}

#[cfg(test)]
mod tests;
