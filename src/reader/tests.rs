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

use super::*;

// Hands out the input one byte per read call.
struct Trickle<'a> {
    bytes: &'a [u8],
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.bytes.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.bytes[0];
        self.bytes = &self.bytes[1..];
        Ok(1)
    }
}

fn start(name: &str, attributes: &[(&str, &str)], self_closing: bool) -> Token {
    Token::Start(StartElement {
        name: Name::parse(name),
        attributes: attributes
            .iter()
            .map(|(name, value)| Attribute::new(name, value))
            .collect(),
        self_closing,
    })
}

fn end(name: &str) -> Token {
    Token::End(Name::parse(name))
}

fn text(s: &str) -> Token {
    Token::Text(s.to_string())
}

fn check_tokens(xml: &str, expected: &[Token]) {
    let mut reader = XmlReader::new(xml.as_bytes());
    for token in expected {
        assert_eq!(&reader.read_token().unwrap(), token);
    }

    // now try byte by byte
    let mut reader = XmlReader::new(Trickle {
        bytes: xml.as_bytes(),
    });
    for token in expected {
        assert_eq!(&reader.read_token().unwrap(), token);
    }
}

fn check_bad(xml: &str, description: &'static str) {
    let mut reader = XmlReader::new(xml.as_bytes());
    loop {
        match reader.read_token() {
            Ok(_) => continue,
            Err(ReadError::Decode(DecodeError::BadXml(msg))) => {
                assert_eq!(msg, description);
                return;
            }
            Err(err) => panic!("unexpected error {err:?} for {xml}"),
        }
    }
}

fn assert_eof(result: Result<Token, ReadError>) {
    match result {
        Err(ReadError::Io(err)) => assert_eq!(err.kind(), ErrorKind::UnexpectedEof),
        other => panic!("expected end of stream, got {other:?}"),
    }
}

#[test]
fn tags() {
    check_tokens(
        "<a><b/><c x='1' y=\"2\">hi</c></a>",
        &[
            start("a", &[], false),
            start("b", &[], true),
            end("b"),
            start("c", &[("x", "1"), ("y", "2")], false),
            text("hi"),
            end("c"),
            end("a"),
        ],
    );
    check_tokens(
        "<stream:stream xmlns:stream='http://etherx.jabber.org/streams' xml:lang='en' >",
        &[start(
            "stream:stream",
            &[
                ("xmlns:stream", "http://etherx.jabber.org/streams"),
                ("xml:lang", "en"),
            ],
            false,
        )],
    );
    check_tokens(
        "<a\n  b = 'x' />",
        &[start("a", &[("b", "x")], true), end("a")],
    );
}

#[test]
fn names() {
    let name = Name::parse("stream:features");
    assert_eq!(name.prefix.as_deref(), Some("stream"));
    assert_eq!(name.local, "features");
    assert_eq!(name.to_string(), "stream:features");
    assert_eq!(Name::parse("message"), Name::new("message"));
    assert_eq!(Name::parse("x:").local, "");
}

#[test]
fn skipped_constructs() {
    check_tokens(
        "<?xml version='1.0'?><a><!-- c - o -- m --><?pi x?></a>",
        &[start("a", &[], false), end("a")],
    );
}

#[test]
fn references_and_cdata() {
    check_tokens(
        "<a t='&lt;&amp;&#65;'>x &gt; y &#x11f;<![CDATA[<raw> &amp;]]></a>",
        &[
            start("a", &[("t", "<&A")], false),
            text("x > y ğ"),
            text("<raw> &amp;"),
            end("a"),
        ],
    );
}

#[test]
fn underlying_reader() {
    let mut reader = XmlReader::new("<a>text".as_bytes());
    assert_eq!(*reader.get_ref(), b"<a>text");
    assert_eq!(reader.read_token().unwrap(), start("a", &[], false));
    // The whole input sits in the buffer now
    assert!(reader.get_ref().is_empty());
    assert_eq!(reader.read_token().unwrap(), text("text"));
}

#[test]
fn end_of_stream() {
    let mut reader = XmlReader::new("<a>".as_bytes());
    assert_eq!(reader.read_token().unwrap(), start("a", &[], false));
    assert_eq!(reader.depth(), 1);
    assert_eof(reader.read_token());

    let mut reader = XmlReader::new("<a x='unfinished".as_bytes());
    assert_eof(reader.read_token());
}

#[test]
fn bad_xml() {
    check_bad("<a></b>", description::TAG_MISMATCH);
    check_bad("</a>", description::TAG_CLOSE_WITHOUT_OPEN);
    check_bad("< a>", description::TAG_WHITESPACE_START);
    check_bad("<a b></a>", description::TAG_ATTRIBUTE_WITHOUT_EQUAL);
    check_bad("<a b=c></a>", description::TAG_ATTRIBUTE_WITHOUT_QUOTE);
    check_bad("<a b='<'></a>", description::TAG_ATTRIBUTE_BAD_VALUE);
    check_bad("<a =''></a>", description::TAG_ATTRIBUTE_WITHOUT_NAME);
    check_bad("<a x='1'y='2'></a>", description::TAG_ATTRIBUTE_WITHOUT_WHITESPACE);
    check_bad("<a/ >", description::TAG_EMPTY_TAG_MISSING_END);
    check_bad("<a></a x='1'>", description::TAG_END_TAG_ATTRIBUTES);
    check_bad("<!-x-->", description::COMMENT_MISSING_DASH);
    check_bad("<a><![CDTA[x]]></a>", description::MARKUP_CDATA_SECTION_BAD_START);
    check_bad("<!DOCTYPE a>", description::MARKUP_DOCTYPE_NOT_ALLOWED);
    check_bad("<!x>", description::MARKUP_UNRECOGNIZED);
    check_bad("<a>\u{1}</a>", description::CHAR_INVALID);
    check_bad("<a>&nbsp;</a>", "Non-predefined entity references are not supported");

    let mut reader = XmlReader::new("<a x='1'\ty=\"2\"/>".as_bytes());
    assert_eq!(
        reader.read_token().unwrap(),
        start("a", &[("x", "1"), ("y", "2")], true)
    );

    let mut reader = XmlReader::new(&b"<a>\xff\xfe</a>"[..]);
    assert_eq!(reader.read_token().unwrap(), start("a", &[], false));
    match reader.read_token() {
        Err(ReadError::Decode(DecodeError::BadXml(msg))) => {
            assert_eq!(msg, description::UTF8_INVALID)
        }
        other => panic!("expected utf8 error, got {other:?}"),
    }
}

#[test]
fn next_start_skips_other_tokens() {
    let mut reader = XmlReader::new("  text <a> <b>x</b></a>".as_bytes());
    assert_eq!(reader.next_start().unwrap().name, Name::new("a"));
    assert_eq!(reader.next_start().unwrap().name, Name::new("b"));
    assert_eof(reader.next_start().map(Token::Start));
}

#[test]
fn next_start_rejects_empty_names() {
    for xml in ["<stream><>", "<stream><x:>", "<stream><a/><x:/>"] {
        let mut reader = XmlReader::new(xml.as_bytes());
        reader.next_start().unwrap();
        let mut result = reader.next_start();
        if xml.contains("<a/>") {
            assert_eq!(result.unwrap().name, Name::new("a"));
            result = reader.next_start();
        }
        match result {
            Err(ReadError::Decode(DecodeError::InvalidResponse)) => {}
            other => panic!("expected invalid response, got {other:?}"),
        }
    }
}

#[test]
fn elements() {
    let mut reader = XmlReader::new(
        "<stream:stream><iq type='result'><query xmlns='q'>\
         <item jid='a@b'/><item jid='c@d'>text</item></query></iq><next/>"
            .as_bytes(),
    );
    reader.next_start().unwrap();
    let iq = reader.read_element().unwrap();
    assert_eq!(iq.name, Name::new("iq"));
    assert_eq!(iq.attribute("type"), Some("result"));
    let query = iq.child("query").unwrap();
    assert_eq!(query.attribute("xmlns"), Some("q"));
    let jids: Vec<_> = query
        .elements_named("item")
        .map(|item| item.attribute("jid").unwrap())
        .collect();
    assert_eq!(jids, ["a@b", "c@d"]);
    assert_eq!(query.elements().nth(1).unwrap().text(), "text");
    assert_eq!(reader.depth(), 1);
    assert_eq!(reader.next_start().unwrap().name, Name::new("next"));
}

#[test]
fn element_name_check() {
    let mut reader = XmlReader::new("<iq/>".as_bytes());
    let iq = reader.read_element().unwrap();
    assert!(iq.expect_name("iq").is_ok());
    assert_eq!(
        iq.expect_name("query"),
        Err(DecodeError::UnexpectedElement {
            expected: "query",
            found: "iq".to_string(),
        })
    );
}

#[test]
fn inner_xml() {
    let mut reader = XmlReader::new(
        "<message><body>a &lt; b <b>bold</b><br/> end</body><body/><x>1</x></message>"
            .as_bytes(),
    );
    reader.next_start().unwrap();
    let body = reader.next_start().unwrap();
    assert_eq!(
        reader.read_inner_xml(&body).unwrap(),
        "a &lt; b <b>bold</b><br/> end"
    );
    let empty = reader.next_start().unwrap();
    assert_eq!(reader.read_inner_xml(&empty).unwrap(), "");
    let x = reader.next_start().unwrap();
    assert_eq!(x.name, Name::new("x"));
    assert_eq!(reader.read_inner_xml(&x).unwrap(), "1");
    assert_eq!(reader.read_token().unwrap(), end("message"));
}

#[test]
fn attribute_maps() {
    let attributes = [
        Attribute::new("xmlns:stream", "s"),
        Attribute::new("xml:lang", "en"),
        Attribute::new("to", "example.com"),
    ];
    let map = attributes_to_map(&attributes);
    assert_eq!(map.len(), 3);
    assert_eq!(map["stream"], "s");
    assert_eq!(map["lang"], "en");
    assert_eq!(map["to"], "example.com");

    let mut reversed = attributes.to_vec();
    reversed.reverse();
    assert_eq!(attributes_to_map(&reversed), map);
    assert_eq!(attributes_to_map(&attributes), map);

    let repeated = [
        Attribute::new("a:id", "first"),
        Attribute::new("b:id", "second"),
    ];
    assert_eq!(attributes_to_map(&repeated)["id"], "second");
    assert!(attributes_to_map(&[]).is_empty());
}
