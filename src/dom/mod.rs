//! DOM Module - Arena-based XML element tree
//!
//! Implements the tree the event codec reads from and builds into:
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names, namespaces and character data
//! - Namespace resolution stack

pub mod document;
pub mod namespace;
pub mod node;
pub mod strings;

pub use document::XmlDocument;
pub use namespace::NamespaceResolver;
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
pub use strings::StringPool;
