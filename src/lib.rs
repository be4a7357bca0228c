//! XmlEvents - XML trees as flat structural event streams
//!
//! Operations:
//! - scan: element tree -> lazy event sequence
//! - unscan: event sequence -> element tree, with generated prefixes
//! - with_peer: pair each exit with the enter it closes
//! - text_of: concatenated character data of an event sequence
//!
//! Namespaced names travel as curly-name tokens (`{uri}local`), see
//! [`events::qname`]. XML text enters and leaves through [`reader::parse`]
//! and [`writer::serialize`].

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

pub mod dom;
pub mod error;
pub mod events;
pub mod options;
pub mod reader;
mod resource;
mod term;
pub mod writer;

pub use dom::XmlDocument;
pub use error::{Error, Result, StructureError};
pub use events::qname;
pub use events::{scan, text_of, unscan, with_peer, Attributes, Event, EventKind};
pub use options::{SerializeOptions, UnscanOptions};

use resource::{DocumentRef, DocumentResource};
use term::{error_tuple, events_to_term, ok_tuple, pairs_to_term, str_to_binary, term_to_events};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Text Adapters
// ============================================================================

/// Parse XML text (returns {:ok, doc}, {:ok, nil} for empty input, or {:error, reason})
#[rustler::nif(name = "parse")]
fn parse_text<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let parsed = std::str::from_utf8(input.as_slice())
        .map_err(Error::from)
        .and_then(reader::parse);

    match parsed {
        Ok(Some(doc)) => {
            let arc = ResourceArc::new(DocumentResource::new(doc));
            Ok(ok_tuple(env, arc.encode(env)))
        }
        Ok(None) => Ok(ok_tuple(env, rustler::types::atom::nil().encode(env))),
        Err(e) => Ok(error_tuple(env, &e)),
    }
}

/// Serialize a document back to XML text
#[rustler::nif(name = "serialize")]
fn serialize_document<'a>(
    env: Env<'a>,
    doc_ref: DocumentRef,
    xml_declaration: bool,
) -> NifResult<Term<'a>> {
    let options = SerializeOptions::new().with_xml_declaration(xml_declaration);
    let xml = writer::serialize(&doc_ref.doc, &options);
    Ok(str_to_binary(env, &xml))
}

// ============================================================================
// Event Stream
// ============================================================================

/// Scan a document into a list of events
#[rustler::nif(name = "scan")]
fn scan_document<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    Ok(events_to_term(env, scan(&doc_ref.doc)))
}

/// Build a document from a list of events.
///
/// `namespace_map` is a list of `{prefix | nil, uri}`; a nil, empty or
/// `"default"` prefix selects the default namespace.
#[rustler::nif(name = "unscan")]
fn unscan_events<'a>(
    env: Env<'a>,
    events: Term<'a>,
    namespace_map: Vec<(Option<String>, String)>,
) -> NifResult<Term<'a>> {
    let options = UnscanOptions { namespace_map };
    let built = term_to_events(events).and_then(|events| unscan(events, &options));

    match built {
        Ok(doc) => {
            let arc = ResourceArc::new(DocumentResource::new(doc));
            Ok(ok_tuple(env, arc.encode(env)))
        }
        Err(e) => Ok(error_tuple(env, &e)),
    }
}

/// Pair each event with its peer (returns {:ok, [{event, peer | nil}]} or {:error, reason})
#[rustler::nif(name = "with_peer")]
fn with_peer_events<'a>(env: Env<'a>, events: Term<'a>) -> NifResult<Term<'a>> {
    match term_to_events(events) {
        Ok(events) => Ok(ok_tuple(env, pairs_to_term(env, with_peer(events)))),
        Err(e) => Ok(error_tuple(env, &e)),
    }
}

/// Concatenate the content of all text events
#[rustler::nif(name = "text_of")]
fn text_of_events<'a>(env: Env<'a>, events: Term<'a>) -> NifResult<Term<'a>> {
    match term_to_events(events) {
        Ok(events) => Ok(ok_tuple(env, str_to_binary(env, &text_of(events)))),
        Err(e) => Ok(error_tuple(env, &e)),
    }
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlEvents.Native");
