//! XML Document - Arena-based element tree
//!
//! Efficient tree storage with:
//! - Arena allocation for nodes and attributes
//! - NodeId indices for traversal
//! - String interning for names, namespaces and character data
//!
//! The document is built append-only: elements and character data are
//! created as the last child of their parent, which is exactly the order
//! both the reader and the event builder produce them in.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use crate::events::qname::local_part;

/// An XML element tree stored in arena format
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Arena of attributes, contiguous per element
    attributes: Vec<XmlAttribute>,
    /// Interned strings
    strings: StringPool,
    /// Root element node ID
    root_element: Option<NodeId>,
}

impl XmlDocument {
    /// Create an empty document with no root element
    pub fn new() -> Self {
        XmlDocument {
            nodes: Vec::with_capacity(64),
            attributes: Vec::with_capacity(32),
            strings: StringPool::new(),
            root_element: None,
        }
    }

    /// Create an element, appending it to `parent`.
    ///
    /// An element created without a parent becomes the root if the document
    /// has none yet; otherwise it stays detached.
    pub fn create_element(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        parent: Option<NodeId>,
    ) -> NodeId {
        let name_id = self.strings.intern(name);
        let namespace_id = self.strings.intern(namespace.unwrap_or(""));
        let id = self.push_node(XmlNode::element(name_id, namespace_id, parent));
        if parent.is_none() && self.root_element.is_none() {
            self.root_element = Some(id);
        }
        id
    }

    /// Set an attribute on an element.
    ///
    /// An attribute with the same namespace and local name is replaced in
    /// place, keeping its position; otherwise the attribute is appended.
    pub fn set_attribute(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) {
        self.set_attributes(element, std::iter::once((namespace, name, value)));
    }

    /// Set `(namespace, name, value)` attributes in order, with the same
    /// replacement rule as [`set_attribute`](Self::set_attribute)
    pub fn set_attributes<'s, I>(&mut self, element: NodeId, attributes: I)
    where
        I: IntoIterator<Item = (Option<&'s str>, &'s str, &'s str)>,
    {
        let (start, count) = {
            let node = &self.nodes[element as usize];
            debug_assert!(node.is_element());
            (node.attr_start as usize, node.attr_count as usize)
        };

        // Keep the element's attributes contiguous at the end of the arena
        let start = if count > 0 && start + count == self.attributes.len() {
            start
        } else {
            let moved: Vec<XmlAttribute> = self.attributes[start..start + count].to_vec();
            let relocated = self.attributes.len();
            self.attributes.extend(moved);
            relocated
        };

        let mut index: HashMap<(u32, String), usize> = self.attributes[start..]
            .iter()
            .enumerate()
            .map(|(offset, a)| {
                let local = local_part(self.strings.get(a.name_id)).to_string();
                ((a.namespace_id, local), start + offset)
            })
            .collect();

        for (namespace, name, value) in attributes {
            let attr = XmlAttribute::new(
                self.strings.intern(name),
                self.strings.intern(namespace.unwrap_or("")),
                self.strings.intern(value),
            );
            match index.entry((attr.namespace_id, local_part(name).to_string())) {
                Entry::Occupied(slot) => self.attributes[*slot.get()] = attr,
                Entry::Vacant(slot) => {
                    slot.insert(self.attributes.len());
                    self.attributes.push(attr);
                }
            }
        }

        let node = &mut self.nodes[element as usize];
        node.attr_start = start as u32;
        node.attr_count = (self.attributes.len() - start) as u32;
    }

    /// Append a text node to `parent`
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> NodeId {
        let value_id = self.strings.intern(content);
        self.push_node(XmlNode::character_data(NodeKind::Text, value_id, Some(parent)))
    }

    /// Append a CDATA section to `parent`
    pub fn append_cdata(&mut self, parent: NodeId, content: &str) -> NodeId {
        let value_id = self.strings.intern(content);
        self.push_node(XmlNode::character_data(NodeKind::CData, value_id, Some(parent)))
    }

    /// Append a comment to `parent`
    pub fn append_comment(&mut self, parent: NodeId, content: &str) -> NodeId {
        let value_id = self.strings.intern(content);
        self.push_node(XmlNode::character_data(NodeKind::Comment, value_id, Some(parent)))
    }

    /// Append a processing instruction to `parent`
    pub fn append_processing_instruction(
        &mut self,
        parent: NodeId,
        target: &str,
        data: &str,
    ) -> NodeId {
        let target_id = self.strings.intern(target);
        let data_id = self.strings.intern(data);
        self.push_node(XmlNode::processing_instruction(target_id, data_id, Some(parent)))
    }

    fn push_node(&mut self, node: XmlNode) -> NodeId {
        let parent = node.parent;
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        if let Some(parent_id) = parent {
            self.link_child(parent_id, id);
        }
        id
    }

    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        // Get parent's last_child first to avoid borrow issues
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    /// Get root element ID
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get the node name as written (elements) or target (processing instructions)
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => {
                Some(self.strings.get(node.name_id))
            }
            _ => None,
        }
    }

    /// Get element local name (without prefix)
    pub fn node_local_name(&self, id: NodeId) -> Option<&str> {
        self.node_name(id).map(local_part)
    }

    /// Namespace URI of an element, if it has one
    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        self.non_empty(node.namespace_id)
    }

    /// Character data of a text, CDATA or comment node, or data of a processing instruction
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element => None,
            _ => Some(self.strings.get(node.value_id)),
        }
    }

    /// Get attributes for an element
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        match self.get_node(id) {
            Some(node) => {
                let start = node.attr_start as usize;
                &self.attributes[start..start + node.attr_count as usize]
            }
            None => &[],
        }
    }

    /// Name of an attribute as written
    pub fn attribute_name(&self, attr: &XmlAttribute) -> &str {
        self.strings.get(attr.name_id)
    }

    /// Namespace URI of an attribute, if it has one
    pub fn attribute_namespace(&self, attr: &XmlAttribute) -> Option<&str> {
        self.non_empty(attr.namespace_id)
    }

    /// Value of an attribute
    pub fn attribute_value(&self, attr: &XmlAttribute) -> &str {
        self.strings.get(attr.value_id)
    }

    /// Get attribute value by name as written
    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.attributes(node_id)
            .iter()
            .find(|attr| self.attribute_name(attr) == name)
            .map(|attr| self.attribute_value(attr))
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Get total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the string pool
    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    fn non_empty(&self, id: u32) -> Option<&str> {
        if id == 0 {
            None
        } else {
            Some(self.strings.get(id))
        }
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over child nodes
pub struct ChildIter<'d> {
    doc: &'d XmlDocument,
    next: Option<NodeId>,
}

impl<'d> Iterator for ChildIter<'d> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}
