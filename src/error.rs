//! Error types
//!
//! Every fallible operation in the crate returns [`Result`].

/// Ways an event sequence can fail to be balanced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    /// An exit event arrived with no element open
    #[error("exit event without a matching enter")]
    UnmatchedExit,

    /// Text, comment or processing instruction arrived with no element open
    #[error("content outside of any element")]
    ContentOutsideElement,

    /// The sequence ended while elements were still open
    #[error("unbalanced tags in stream: {0} element(s) left open")]
    UnclosedElements(usize),
}

/// Errors that can occur while scanning, building, parsing or decoding events
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Event sequence is not balanced
    #[error("invalid event structure: {0}")]
    Structure(#[from] StructureError),

    /// Event term carries a tag outside the five known kinds
    #[error("unexpected event type {0}")]
    UnrecognizedEvent(String),

    /// Error reported by the XML reader
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute in the XML input
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Input is not UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Document is well-formed at the token level but not as a tree
    #[error("Error parsing text: {0}")]
    Parse(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;
