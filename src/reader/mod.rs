//! XML Reader Module
//!
//! Parses XML text into an [`XmlDocument`] using quick-xml for
//! tokenization. Only the document element's tree is kept: the XML
//! declaration, the DOCTYPE, and comments or processing instructions
//! outside the root are dropped.

mod builder;

use quick_xml::Reader;

use crate::dom::XmlDocument;
use crate::error::Result;
use builder::TreeBuilder;

/// Parse `text` into a tree. Empty input is not an error and yields `None`.
pub fn parse(text: &str) -> Result<Option<XmlDocument>> {
    if text.is_empty() {
        return Ok(None);
    }

    let mut reader = Reader::from_str(text);
    let doc = TreeBuilder::new().build(&mut reader)?;

    log::debug!(
        "parse: {} bytes -> {} nodes, {} strings ({} bytes interned)",
        text.len(),
        doc.node_count(),
        doc.strings().len(),
        doc.strings().bytes_used()
    );
    Ok(Some(doc))
}
