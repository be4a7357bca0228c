//! Tree Scanner
//!
//! Depth-first walk of an element tree that yields one [`Event`] per step.
//! Uses an explicit frame stack instead of recursion, so arbitrarily deep
//! trees scan without growing the call stack and nothing is materialized
//! ahead of the consumer.

use std::iter::FusedIterator;

use super::qname::encode;
use super::{Attributes, Event};
use crate::dom::{NodeId, NodeKind, XmlDocument};

enum Frame {
    Visit(NodeId),
    Exit,
}

/// Lazy event sequence over a document, see [`scan`]
pub struct Scanner<'d> {
    doc: &'d XmlDocument,
    stack: Vec<Frame>,
}

/// Scan the document's root element. A document without a root yields nothing.
pub fn scan(doc: &XmlDocument) -> Scanner<'_> {
    let mut stack = Vec::with_capacity(32);
    if let Some(root) = doc.root_element_id() {
        stack.push(Frame::Visit(root));
    }
    Scanner { doc, stack }
}

/// Scan the subtree rooted at `element`
pub fn scan_node(doc: &XmlDocument, element: NodeId) -> Scanner<'_> {
    let mut stack = Vec::with_capacity(32);
    stack.push(Frame::Visit(element));
    Scanner { doc, stack }
}

/// Whether an attribute name is a namespace declaration
#[inline]
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

impl<'d> Scanner<'d> {
    fn enter(&mut self, id: NodeId) -> Event {
        let doc = self.doc;
        let tag = encode(doc.namespace(id), doc.node_name(id).unwrap_or_default());

        let attributes: Attributes = doc
            .attributes(id)
            .iter()
            .filter(|attr| !is_namespace_declaration(doc.attribute_name(attr)))
            .map(|attr| {
                (
                    encode(doc.attribute_namespace(attr), doc.attribute_name(attr)),
                    doc.attribute_value(attr).to_string(),
                )
            })
            .collect();

        // Exit goes under the children so it pops after all of them
        self.stack.push(Frame::Exit);
        let mut child_id = doc.get_node(id).and_then(|n| n.last_child);
        while let Some(cid) = child_id {
            self.stack.push(Frame::Visit(cid));
            child_id = doc.get_node(cid).and_then(|n| n.prev_sibling);
        }

        Event::Enter { tag, attributes }
    }
}

impl<'d> Iterator for Scanner<'d> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        loop {
            let id = match self.stack.pop()? {
                Frame::Exit => return Some(Event::Exit),
                Frame::Visit(id) => id,
            };
            let doc = self.doc;
            let kind = match doc.get_node(id) {
                Some(node) => node.kind,
                None => continue,
            };
            let content = || doc.text_content(id).unwrap_or_default().to_string();

            return Some(match kind {
                NodeKind::Element => self.enter(id),
                NodeKind::Text => Event::Text { content: content() },
                NodeKind::Comment => Event::Comment { content: content() },
                NodeKind::ProcessingInstruction => Event::ProcessingInstruction {
                    target: doc.node_name(id).unwrap_or_default().to_string(),
                    content: content(),
                },
                // No event kind carries CDATA
                NodeKind::CData => continue,
            });
        }
    }
}

impl FusedIterator for Scanner<'_> {}
