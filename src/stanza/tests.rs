/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::HashSet;

use crate::reader::Name;
use crate::reader::XmlReader;

use super::*;

fn read_element(xml: &str) -> crate::reader::Element {
    XmlReader::new(xml.as_bytes()).read_element().unwrap()
}

#[test]
fn request_ids() {
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let id = request_id();
        assert_eq!(id.len(), 16);
        assert!(id.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')));
        assert!(seen.insert(id));
    }
}

#[test]
fn templates() {
    assert_eq!(
        stream_header("user@example.com", "example.com"),
        "<stream:stream from='user@example.com' to='example.com' version='1.0' xml:lang='en' \
         xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams'>"
    );
    assert_eq!(
        starttls(),
        "<starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>"
    );
    assert_eq!(
        auth("0011223344556677", "juliet", "s3cret", "balcony"),
        "<iq type='set' id='0011223344556677'><query xmlns='jabber:iq:auth'>\
         <username>juliet</username><password>s3cret</password>\
         <resource>balcony</resource></query></iq>"
    );
    assert_eq!(
        iq_get("a@b/c", "b", "1", NS_DISCO_ITEMS),
        "<iq from='a@b/c' to='b' id='1' type='get'>\
         <query xmlns='http://jabber.org/protocol/disco#items'/></iq>"
    );
    assert_eq!(
        iq_get("a@b/c", "b", "2", NS_IQ_ROSTER),
        "<iq from='a@b/c' to='b' id='2' type='get'><query xmlns='jabber:iq:roster'/></iq>"
    );
    assert_eq!(
        presence("a@b", "away"),
        "<presence from='a@b'><show>away</show></presence>"
    );
    assert_eq!(
        muc_part("room@conf.b"),
        "<presence to='room@conf.b' type='unavailable'></presence>"
    );
    assert_eq!(
        muc_join("3", "room@conf.b/nick", "a@b"),
        "<presence id='3' to='room@conf.b/nick' from='a@b'>\
         <x xmlns='http://jabber.org/protocol/muc'/></presence>"
    );
    assert_eq!(
        muc_message("a@b", "4", "room@conf.b", MessageType::Groupchat, "hello"),
        "<message from='a@b' id='4' to='room@conf.b' type='groupchat'><body>hello</body></message>"
    );
}

#[test]
fn stream_header_injection() {
    let from = "user@example.com' to='evil'><iq type='set'/><x a='";
    let header = stream_header(from, "example.com");
    assert!(!header.contains("<iq"));
    let mut reader = XmlReader::new(header.as_bytes());
    let start = reader.next_start().unwrap();
    assert_eq!(start.name, Name::parse("stream:stream"));
    assert_eq!(start.attribute("from"), Some(from));
    assert_eq!(start.attribute("to"), Some("example.com"));
    assert_eq!(start.attribute("version"), Some("1.0"));
    assert_eq!(start.attribute("xmlns"), Some(NS_JABBER_CLIENT));
    assert_eq!(start.attribute("stream"), Some(NS_STREAM));
    assert_eq!(start.attribute("lang"), Some("en"));
}

#[test]
fn stream_header_control_characters() {
    let header = stream_header("a\u{1}b\tc\nd", "example.com\u{0}");
    assert!(!header.chars().any(|c| c.is_control()));
    let mut reader = XmlReader::new(header.as_bytes());
    let start = reader.next_start().unwrap();
    assert_eq!(start.attribute("from"), Some("a\u{fffd}b\tc\nd"));
    assert_eq!(start.attribute("to"), Some("example.com\u{fffd}"));
}

#[test]
fn message_body_roundtrip() {
    for body in [
        "plain",
        "a < b & c > \"d\"",
        "</body></message><message to='x'><body>spoofed",
        "&amp; is already escaped",
        "two\r\nlines\twith tab",
    ] {
        let stanza = muc_message("a@b", &request_id(), "c@d", MessageType::Chat, body);
        let mut reader = XmlReader::new(stanza.as_bytes());
        let message = reader.next_start().unwrap();
        assert_eq!(message.attribute("type"), Some("chat"));
        let start = reader.next_start().unwrap();
        assert_eq!(start.name, Name::new("body"));
        let decoded = MessageBody {
            raw: reader.read_inner_xml(&start).unwrap(),
        };
        assert_eq!(decoded.text().unwrap(), body);
        assert_eq!(
            reader.read_token().unwrap(),
            crate::reader::Token::End(Name::new("message"))
        );
    }
}

#[test]
fn message_body_invalid_characters() {
    let stanza = muc_message("a@b", "1", "c@d", MessageType::Chat, "x\u{0}y\u{ffff}");
    assert!(!stanza.contains('\u{0}'));
    let mut reader = XmlReader::new(stanza.as_bytes());
    reader.next_start().unwrap();
    let start = reader.next_start().unwrap();
    let decoded = MessageBody {
        raw: reader.read_inner_xml(&start).unwrap(),
    };
    assert_eq!(decoded.text().unwrap(), "x\u{fffd}y\u{fffd}");
}

#[test]
fn features() {
    let features = StreamFeatures::from_element(&read_element(
        "<stream:features>\
            <starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'><required/></starttls>\
            <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                <mechanism>PLAIN</mechanism>\
                <mechanism> SCRAM-SHA-1 </mechanism>\
            </mechanisms>\
        </stream:features>",
    ))
    .unwrap();
    assert!(features.starttls_offered);
    assert!(features.starttls_required);
    assert_eq!(features.mechanisms, ["PLAIN", "SCRAM-SHA-1"]);

    let features = StreamFeatures::from_element(&read_element(
        "<stream:features><starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'/></stream:features>",
    ))
    .unwrap();
    assert!(features.starttls_offered);
    assert!(!features.starttls_required);
    assert!(features.mechanisms.is_empty());

    let features =
        StreamFeatures::from_element(&read_element("<stream:features/>")).unwrap();
    assert_eq!(features, StreamFeatures::default());

    assert!(StreamFeatures::from_element(&read_element("<message/>")).is_err());
}

#[test]
fn roster_query() {
    let query = QueryResult::from_element(&read_element(
        "<query xmlns='jabber:iq:roster'>\
            <item jid='juliet@example.com' name='Juliet' mention_name='jules' email='j@e.com'/>\
            <item jid='romeo@example.com' name='Romeo'/>\
        </query>",
    ))
    .unwrap();
    assert_eq!(query.items.len(), 2);
    assert_eq!(
        query.items[0],
        DiscoveryItem {
            email: "j@e.com".to_string(),
            jid: "juliet@example.com".to_string(),
            mention_name: "jules".to_string(),
            name: "Juliet".to_string(),
            ..Default::default()
        }
    );
    assert_eq!(query.items[1].jid, "romeo@example.com");
    assert_eq!(query.items[1].email, "");
}

#[test]
fn room_query() {
    let query = QueryResult::from_element(&read_element(
        "<query xmlns='http://jabber.org/protocol/disco#items'>\
            <item jid='1_room@conf.example.com' name='Room'>\
                <x xmlns='http://example.com/protocol/muc#room'>\
                    <id>42</id><topic>Topic &amp; more</topic><privacy>public</privacy>\
                    <owner>1_1@example.com</owner><num_participants>3</num_participants>\
                    <last_active>2024-01-02T03:04:05Z</last_active>\
                </x>\
            </item>\
            <other/>\
        </query>",
    ))
    .unwrap();
    assert_eq!(
        query.items,
        [DiscoveryItem {
            jid: "1_room@conf.example.com".to_string(),
            name: "Room".to_string(),
            room_id: "42".to_string(),
            topic: "Topic & more".to_string(),
            privacy: "public".to_string(),
            owner: "1_1@example.com".to_string(),
            num_participants: "3".to_string(),
            last_active: "2024-01-02T03:04:05Z".to_string(),
            ..Default::default()
        }]
    );
    assert!(QueryResult::from_element(&read_element("<iq/>")).is_err());
}

#[test]
fn acks() {
    let ack = Ack::from_element(&read_element("<r><a>5</a></r>"));
    assert_eq!(ack.ack, "5");
    assert_eq!(Ack::from_element(&read_element("<r/>")), Ack::default());
}

#[test]
fn message_types() {
    assert_eq!(MessageType::Chat.to_string(), "chat");
    assert_eq!(MessageType::Groupchat.as_str(), "groupchat");
    assert_eq!(MessageType::Normal.as_str(), "normal");
    assert_eq!(MessageType::Headline.as_str(), "headline");
}
