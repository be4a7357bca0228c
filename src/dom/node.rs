//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
///
/// String fields are IDs into the owning document's string pool, with 0
/// meaning "none".
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent element (None for the root and for detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Node name as written (`prefix:local` or `local`) for elements, target for PIs
    pub name_id: u32,
    /// Namespace URI of an element
    pub namespace_id: u32,
    /// Character data for text, CDATA and comments; data for PIs
    pub value_id: u32,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u32,
}

impl XmlNode {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            namespace_id: 0,
            value_id: 0,
            attr_start: 0,
            attr_count: 0,
        }
    }

    /// Create a new element node
    pub fn element(name_id: u32, namespace_id: u32, parent: Option<NodeId>) -> Self {
        XmlNode {
            name_id,
            namespace_id,
            ..Self::new(NodeKind::Element, parent)
        }
    }

    /// Create a character data node (text, CDATA or comment)
    pub fn character_data(kind: NodeKind, value_id: u32, parent: Option<NodeId>) -> Self {
        debug_assert!(matches!(
            kind,
            NodeKind::Text | NodeKind::CData | NodeKind::Comment
        ));
        XmlNode {
            value_id,
            ..Self::new(kind, parent)
        }
    }

    /// Create a processing instruction node
    pub fn processing_instruction(target_id: u32, data_id: u32, parent: Option<NodeId>) -> Self {
        XmlNode {
            name_id: target_id,
            value_id: data_id,
            ..Self::new(NodeKind::ProcessingInstruction, parent)
        }
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy)]
pub struct XmlAttribute {
    /// Attribute name as written (`prefix:local` or `local`)
    pub name_id: u32,
    /// Namespace URI, or 0
    pub namespace_id: u32,
    /// Attribute value
    pub value_id: u32,
}

impl XmlAttribute {
    pub fn new(name_id: u32, namespace_id: u32, value_id: u32) -> Self {
        XmlAttribute {
            name_id,
            namespace_id,
            value_id,
        }
    }
}
