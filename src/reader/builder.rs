//! Tree Builder
//!
//! Consumes quick-xml events and grows an [`XmlDocument`], resolving
//! prefixes against a scoped [`NamespaceResolver`].

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;

use crate::dom::namespace::ns;
use crate::dom::{NamespaceResolver, NodeId, XmlDocument};
use crate::error::{Error, Result};
use crate::events::scan::is_namespace_declaration;

pub(super) struct TreeBuilder {
    doc: XmlDocument,
    scope: NamespaceResolver,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub(super) fn new() -> Self {
        TreeBuilder {
            doc: XmlDocument::new(),
            scope: NamespaceResolver::new(),
            stack: Vec::with_capacity(32),
        }
    }

    /// Drive `reader` to EOF and return the finished document
    pub(super) fn build(mut self, reader: &mut Reader<&[u8]>) -> Result<XmlDocument> {
        loop {
            match reader.read_event()? {
                XmlEvent::Start(ref e) => {
                    self.open(e)?;
                }
                XmlEvent::Empty(ref e) => {
                    self.open(e)?;
                    self.close();
                }
                XmlEvent::End(_) => self.close(),
                XmlEvent::Text(ref t) => {
                    let content = t.unescape()?;
                    match self.stack.last() {
                        Some(&parent) => {
                            self.doc.append_text(parent, &content);
                        }
                        None if content.trim().is_empty() => {}
                        None => {
                            return Err(Error::Parse(format!(
                                "text outside the root element at position {}",
                                reader.buffer_position()
                            )))
                        }
                    }
                }
                XmlEvent::CData(ref c) => {
                    let content = std::str::from_utf8(c)?;
                    match self.stack.last() {
                        Some(&parent) => {
                            self.doc.append_cdata(parent, content);
                        }
                        None => {
                            return Err(Error::Parse(format!(
                                "CDATA outside the root element at position {}",
                                reader.buffer_position()
                            )))
                        }
                    }
                }
                XmlEvent::Comment(ref c) => {
                    if let Some(&parent) = self.stack.last() {
                        self.doc.append_comment(parent, std::str::from_utf8(c)?);
                    }
                }
                XmlEvent::PI(ref pi) => {
                    if let Some(&parent) = self.stack.last() {
                        let target = std::str::from_utf8(pi.target())?;
                        let data = std::str::from_utf8(pi.content())?.trim_start();
                        self.doc.append_processing_instruction(parent, target, data);
                    }
                }
                XmlEvent::Decl(_) | XmlEvent::DocType(_) => {}
                XmlEvent::Eof => break,
            }
        }

        if !self.stack.is_empty() {
            return Err(Error::Parse(format!(
                "{} element(s) not closed at end of input",
                self.stack.len()
            )));
        }
        if self.doc.root_element_id().is_none() {
            return Err(Error::Parse("no root element".to_string()));
        }
        Ok(self.doc)
    }

    fn open(&mut self, e: &BytesStart) -> Result<()> {
        let parent = self.stack.last().copied();
        if parent.is_none() && self.doc.root_element_id().is_some() {
            return Err(Error::Parse("content after the root element".to_string()));
        }

        self.scope.push_scope();

        // Declarations bind before any name on the element is resolved
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            if key == "xmlns" {
                self.scope.declare_default(&value);
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                self.scope.declare(prefix, &value);
            }
            attributes.push((key, value));
        }

        let qname = e.name();
        let name = std::str::from_utf8(qname.as_ref())?;
        let namespace = match split_prefix(name) {
            Some(prefix) => Some(resolve(&self.scope, prefix)?),
            None => self.scope.resolve_default(),
        };
        let id = self.doc.create_element(namespace, name, parent);

        let mut resolved = Vec::with_capacity(attributes.len());
        for (key, value) in &attributes {
            let namespace = if is_namespace_declaration(key) {
                Some(ns::XMLNS)
            } else {
                match split_prefix(key) {
                    Some(prefix) => Some(resolve(&self.scope, prefix)?),
                    None => None,
                }
            };
            resolved.push((namespace, key.as_str(), value.as_str()));
        }
        self.doc.set_attributes(id, resolved);

        self.stack.push(id);
        Ok(())
    }

    fn close(&mut self) {
        self.stack.pop();
        self.scope.pop_scope();
    }
}

#[inline]
fn split_prefix(name: &str) -> Option<&str> {
    memchr::memchr(b':', name.as_bytes()).map(|pos| &name[..pos])
}

fn resolve<'s>(scope: &'s NamespaceResolver, prefix: &str) -> Result<&'s str> {
    scope
        .resolve(prefix)
        .ok_or_else(|| Error::Parse(format!("unbound namespace prefix '{}'", prefix)))
}
