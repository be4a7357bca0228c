//! ResourceArc Wrappers
//!
//! Keeps a built element tree on the Rust side so Elixir can hand it back
//! to `scan` or `serialize` without re-parsing.

use rustler::ResourceArc;

use crate::dom::XmlDocument;

/// Wrapper for XmlDocument that can be stored in a ResourceArc.
///
/// Trees are never mutated after construction, so the document is shared
/// across processes without a lock.
pub struct DocumentResource {
    pub doc: XmlDocument,
}

impl DocumentResource {
    pub fn new(doc: XmlDocument) -> Self {
        DocumentResource { doc }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;
