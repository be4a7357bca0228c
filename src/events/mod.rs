//! Event Stream Codec
//!
//! Converts an element tree into a flat sequence of structural events and
//! back, carrying namespaces as curly-name tokens.
//!
//! ```text
//! XmlDocument --scan--> [Event] --unscan--> XmlDocument
//!                          |
//!                          +--with_peer--> [(Event, Option<Event>)]
//! ```
//!
//! ## Event Types
//!
//! - `Enter` - Element start with curly-name tag and attributes
//! - `Exit` - Element end
//! - `Text` - Character data
//! - `ProcessingInstruction` - PI target and content
//! - `Comment` - Comment content

pub mod peer;
pub mod qname;
pub mod qualifier;
pub mod scan;
pub mod unscan;

pub use peer::{with_peer, WithPeer};
pub use qualifier::Qualifier;
pub use scan::{scan, scan_node, Scanner};
pub use unscan::unscan;

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Insertion-ordered attributes of an [`Event::Enter`], keyed by curly name.
///
/// A `None` value marks an attribute to leave out when building a tree.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Option<String>)>,
    /// Key -> position in `entries`
    index: HashMap<String, usize>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing an existing entry in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key.into(), Some(value.into()));
    }

    /// Mark `key` as absent
    pub fn omit(&mut self, key: impl Into<String>) {
        self.insert(key.into(), None);
    }

    /// Set `key` to an optional value
    pub fn insert(&mut self, key: String, value: Option<String>) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Value of `key`, if present and not absent
    pub fn get(&self, key: &str) -> Option<&str> {
        let &pos = self.index.get(key)?;
        self.entries[pos].1.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (k, v) in iter {
            attributes.set(k, v);
        }
        attributes
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Option<String>);
    type IntoIter = std::vec::IntoIter<(String, Option<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A structural event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Start of an element
    Enter {
        /// Curly-name tag
        tag: String,
        /// Attributes, without namespace declarations
        attributes: Attributes,
    },
    /// End of the innermost open element
    Exit,
    /// Character data
    Text { content: String },
    /// Processing instruction
    ProcessingInstruction { target: String, content: String },
    /// Comment
    Comment { content: String },
}

impl Event {
    /// Enter event with no attributes
    pub fn enter(tag: impl Into<String>) -> Self {
        Event::Enter {
            tag: tag.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Event::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Event::Comment {
            content: content.into(),
        }
    }

    pub fn processing_instruction(target: impl Into<String>, content: impl Into<String>) -> Self {
        Event::ProcessingInstruction {
            target: target.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Enter { .. } => EventKind::Enter,
            Event::Exit => EventKind::Exit,
            Event::Text { .. } => EventKind::Text,
            Event::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
            Event::Comment { .. } => EventKind::Comment,
        }
    }
}

/// Event tag, as named on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Enter,
    Exit,
    Text,
    ProcessingInstruction,
    Comment,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Enter => "enter",
            EventKind::Exit => "exit",
            EventKind::Text => "text",
            EventKind::ProcessingInstruction => "pi",
            EventKind::Comment => "comment",
        }
    }

    /// Parse a tag name, rejecting anything outside the five kinds
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "enter" => Ok(EventKind::Enter),
            "exit" => Ok(EventKind::Exit),
            "text" => Ok(EventKind::Text),
            "pi" => Ok(EventKind::ProcessingInstruction),
            "comment" => Ok(EventKind::Comment),
            other => Err(Error::UnrecognizedEvent(other.to_string())),
        }
    }
}

/// Concatenated content of all text events, in order
pub fn text_of<I>(events: I) -> String
where
    I: IntoIterator<Item = Event>,
{
    let mut text = String::new();
    for event in events {
        if let Event::Text { content } = event {
            text.push_str(&content);
        }
    }
    text
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::dom::XmlDocument;
    use crate::options::UnscanOptions;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Child {
        Element(Element),
        Text(String),
        Comment(String),
        Pi(String, String),
    }

    #[derive(Debug, Clone)]
    struct Element {
        namespace: Option<String>,
        name: String,
        attributes: Vec<(Option<String>, String, String)>,
        children: Vec<Child>,
    }

    fn namespace() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("urn:a".to_string())),
            Just(Some("urn:b".to_string())),
            Just(Some("http://example.com/c".to_string())),
        ]
    }

    fn name() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z][a-z0-9]{0,5}").unwrap()
    }

    fn content() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9 <>&]{0,12}").unwrap()
    }

    fn element_with(children: impl Strategy<Value = Vec<Child>>) -> impl Strategy<Value = Element> {
        (
            namespace(),
            name(),
            prop::collection::vec((namespace(), name(), content()), 0..3),
            children,
        )
            .prop_map(|(namespace, name, attributes, children)| Element {
                namespace,
                name,
                attributes,
                children,
            })
    }

    fn tree() -> impl Strategy<Value = Element> {
        let leaf = element_with(Just(Vec::new()));
        leaf.prop_recursive(4, 32, 4, |inner| {
            element_with(prop::collection::vec(
                prop_oneof![
                    inner.prop_map(Child::Element),
                    content().prop_map(Child::Text),
                    content().prop_map(Child::Comment),
                    (name(), content()).prop_map(|(t, c)| Child::Pi(t, c)),
                ],
                0..4,
            ))
        })
    }

    fn build(doc: &mut XmlDocument, element: &Element, parent: Option<u32>) {
        let prefixed = match &element.namespace {
            Some(_) => format!("p:{}", element.name),
            None => element.name.clone(),
        };
        let id = doc.create_element(element.namespace.as_deref(), &prefixed, parent);
        for (ns, name, value) in &element.attributes {
            let prefixed = match ns {
                Some(_) => format!("q:{}", name),
                None => name.clone(),
            };
            doc.set_attribute(id, ns.as_deref(), &prefixed, value);
        }
        for child in &element.children {
            match child {
                Child::Element(e) => build(doc, e, Some(id)),
                Child::Text(t) => {
                    doc.append_text(id, t);
                }
                Child::Comment(c) => {
                    doc.append_comment(id, c);
                }
                Child::Pi(t, c) => {
                    doc.append_processing_instruction(id, t, c);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn unscan_inverts_scan(root in tree()) {
            let mut doc = XmlDocument::new();
            build(&mut doc, &root, None);

            let events: Vec<_> = scan(&doc).collect();
            let rebuilt = unscan(events.clone(), &UnscanOptions::default()).unwrap();
            let rescanned: Vec<_> = scan(&rebuilt).collect();
            prop_assert_eq!(rescanned, events);
        }

        #[test]
        fn scan_is_balanced(root in tree()) {
            let mut doc = XmlDocument::new();
            build(&mut doc, &root, None);

            let mut depth = 0i64;
            for (event, peer) in with_peer(scan(&doc)) {
                match event {
                    Event::Enter { .. } => depth += 1,
                    Event::Exit => {
                        depth -= 1;
                        let closes_enter = matches!(peer, Some(Event::Enter { .. }));
                        prop_assert!(closes_enter, "exit without a matching enter");
                    }
                    _ => prop_assert!(depth > 0),
                }
                prop_assert!(depth >= 0);
            }
            prop_assert_eq!(depth, 0);
        }
    }
}
