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
use std::fmt::Display;

use crate::entities;
use crate::reader::DecodeError;
use crate::reader::Element;
use crate::reader::StartElement;

/// Stream features advertised by the server.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct StreamFeatures {
    pub starttls_offered: bool,
    pub starttls_required: bool,
    /// SASL mechanism names in the order the server listed them.
    pub mechanisms: Vec<String>,
}

impl StreamFeatures {
    pub const TAG: &'static str = "features";

    pub fn from_element(element: &Element) -> Result<Self, DecodeError> {
        element.expect_name(Self::TAG)?;
        let starttls = element.child("starttls");
        let mut mechanisms = Vec::new();
        for list in element.elements_named("mechanisms") {
            for mechanism in list.elements_named("mechanism") {
                mechanisms.push(mechanism.text().trim().to_string());
            }
        }
        Ok(StreamFeatures {
            starttls_offered: starttls.is_some(),
            starttls_required: starttls.is_some_and(|tls| tls.child("required").is_some()),
            mechanisms,
        })
    }
}

/// An entry of a roster or service discovery result.
///
/// Roster and room discovery results fill different fields; whatever
/// the server did not send is left empty.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DiscoveryItem {
    pub email: String,
    pub jid: String,
    pub last_active: String,
    pub mention_name: String,
    pub name: String,
    pub num_participants: String,
    pub owner: String,
    pub privacy: String,
    pub room_id: String,
    pub topic: String,
}

impl DiscoveryItem {
    pub fn from_element(item: &Element) -> Self {
        let attribute = |local| item.attribute(local).unwrap_or_default().to_string();
        let mut decoded = DiscoveryItem {
            email: attribute("email"),
            jid: attribute("jid"),
            mention_name: attribute("mention_name"),
            name: attribute("name"),
            ..Default::default()
        };
        for x in item.elements_named("x") {
            for field in x.elements() {
                let target = match field.name.local.as_str() {
                    "last_active" => &mut decoded.last_active,
                    "num_participants" => &mut decoded.num_participants,
                    "owner" => &mut decoded.owner,
                    "privacy" => &mut decoded.privacy,
                    "id" => &mut decoded.room_id,
                    "topic" => &mut decoded.topic,
                    _ => continue,
                };
                *target = field.text();
            }
        }
        decoded
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct QueryResult {
    pub items: Vec<DiscoveryItem>,
}

impl QueryResult {
    pub const TAG: &'static str = "query";

    pub fn from_element(element: &Element) -> Result<Self, DecodeError> {
        element.expect_name(Self::TAG)?;
        Ok(QueryResult {
            items: element
                .elements_named("item")
                .map(DiscoveryItem::from_element)
                .collect(),
        })
    }
}

/// Raw content of a message body element.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MessageBody {
    /// Inner XML exactly as received, references are not replaced.
    pub raw: String,
}

impl MessageBody {
    /// Returns the body with the references replaced.
    pub fn text(&self) -> Result<Cow<'_, str>, DecodeError> {
        Ok(entities::unescape(&self.raw)?)
    }
}

impl Display for MessageBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Acknowledgement marker, the token is not interpreted.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Ack {
    pub ack: String,
}

impl Ack {
    pub fn from_element(element: &Element) -> Self {
        Ack {
            ack: element.child("a").map(Element::text).unwrap_or_default(),
        }
    }
}

/// Result of reading the next stanza without knowing its kind first.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Incoming {
    Features(StreamFeatures),
    Query(QueryResult),
    Body(MessageBody),
    /// Any other start tag; its content is left in the stream.
    Element(StartElement),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MessageType {
    Chat,
    Groupchat,
    Normal,
    Headline,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Chat => "chat",
            MessageType::Groupchat => "groupchat",
            MessageType::Normal => "normal",
            MessageType::Headline => "headline",
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
