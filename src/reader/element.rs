/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::HashMap;
use std::fmt::Display;

use super::DecodeError;

/// Qualified name of an element or attribute.
///
/// The name is split at the first colon. Namespace declarations are
/// not resolved, `xmlns:stream` simply has the prefix `xmlns` and the
/// local name `stream`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Name {
    pub prefix: Option<String>,
    pub local: String,
}

impl Name {
    pub fn new(local: &str) -> Self {
        Name {
            prefix: None,
            local: local.to_string(),
        }
    }

    pub fn parse(full: &str) -> Self {
        match full.split_once(':') {
            Some((prefix, local)) => Name {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            None => Name::new(full),
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Attribute {
    pub name: Name,
    /// Value with all references replaced.
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Attribute {
            name: Name::parse(name),
            value: value.to_string(),
        }
    }
}

/// Converts an attribute list into a map keyed by the local names.
///
/// When a local name repeats, the value appearing last wins.
pub fn attributes_to_map(attributes: &[Attribute]) -> HashMap<String, String> {
    let mut map = HashMap::with_capacity(attributes.len());
    for attribute in attributes {
        map.insert(attribute.name.local.clone(), attribute.value.clone());
    }
    map
}

fn find_attribute<'a>(attributes: &'a [Attribute], local: &str) -> Option<&'a str> {
    attributes
        .iter()
        .rev()
        .find(|attribute| attribute.name.local == local)
        .map(|attribute| attribute.value.as_str())
}

/// A start tag read from the stream.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StartElement {
    pub name: Name,
    pub attributes: Vec<Attribute>,
    /// True for `<tag/>` style tags, which have no content.
    pub self_closing: bool,
}

impl StartElement {
    pub fn attribute(&self, local: &str) -> Option<&str> {
        find_attribute(&self.attributes, local)
    }

    pub fn attribute_map(&self) -> HashMap<String, String> {
        attributes_to_map(&self.attributes)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// A fully read element subtree.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Element {
    pub name: Name,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attribute(&self, local: &str) -> Option<&str> {
        find_attribute(&self.attributes, local)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements()
            .filter(move |element| element.name.local == local)
    }

    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|element| element.name.local == local)
    }

    /// Concatenated character data of the direct children.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            if let Node::Text(s) = node {
                text.push_str(s);
            }
        }
        text
    }

    pub fn expect_name(&self, local: &'static str) -> Result<(), DecodeError> {
        if self.name.local != local {
            return Err(DecodeError::UnexpectedElement {
                expected: local,
                found: self.name.to_string(),
            });
        }
        Ok(())
    }
}

impl From<StartElement> for Element {
    fn from(start: StartElement) -> Self {
        Element {
            name: start.name,
            attributes: start.attributes,
            children: Vec::new(),
        }
    }
}
