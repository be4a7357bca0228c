//! Elixir Term Conversion Utilities
//!
//! Converts events to Elixir terms and back:
//!
//! ```text
//! {:enter, tag, [{key, value | nil}]}
//! :exit
//! {:text, content}
//! {:pi, target, content}
//! {:comment, content}
//! ```

use rustler::types::tuple::get_tuple;
use rustler::{Atom, Encoder, Env, NewBinary, Term};

use crate::error::{Error, Result};
use crate::events::{Attributes, Event, EventKind};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    enter,
    exit,
    text,
    pi,
    comment,
}

fn kind_atom(kind: EventKind) -> Atom {
    match kind {
        EventKind::Enter => enter(),
        EventKind::Exit => exit(),
        EventKind::Text => text(),
        EventKind::ProcessingInstruction => pi(),
        EventKind::Comment => comment(),
    }
}

/// Convert an event to an Elixir term
pub fn event_to_term<'a>(env: Env<'a>, event: &Event) -> Term<'a> {
    let tag = kind_atom(event.kind());
    match event {
        Event::Enter { tag: name, attributes } => {
            let attrs: Vec<Term<'a>> = attributes
                .iter()
                .map(|(key, value)| {
                    let value = value.map(|v| str_to_binary(env, v));
                    (str_to_binary(env, key), value).encode(env)
                })
                .collect();
            (tag, str_to_binary(env, name), attrs).encode(env)
        }
        Event::Exit => tag.encode(env),
        Event::Text { content } | Event::Comment { content } => {
            (tag, str_to_binary(env, content)).encode(env)
        }
        Event::ProcessingInstruction { target, content } => {
            (tag, str_to_binary(env, target), str_to_binary(env, content)).encode(env)
        }
    }
}

/// Convert a sequence of events to an Elixir list
pub fn events_to_term<'a, I>(env: Env<'a>, events: I) -> Term<'a>
where
    I: IntoIterator<Item = Event>,
{
    let terms: Vec<Term<'a>> = events
        .into_iter()
        .map(|event| event_to_term(env, &event))
        .collect();
    terms_to_list(env, terms)
}

/// Convert `(event, peer)` pairs to a list of `{event, peer | nil}` tuples
pub fn pairs_to_term<'a, I>(env: Env<'a>, pairs: I) -> Term<'a>
where
    I: IntoIterator<Item = (Event, Option<Event>)>,
{
    let terms: Vec<Term<'a>> = pairs
        .into_iter()
        .map(|(event, peer)| {
            let peer = peer.map(|p| event_to_term(env, &p));
            (event_to_term(env, &event), peer).encode(env)
        })
        .collect();
    terms_to_list(env, terms)
}

fn terms_to_list<'a>(env: Env<'a>, terms: Vec<Term<'a>>) -> Term<'a> {
    // Build list in reverse order
    let mut list = Term::list_new_empty(env);
    for term in terms.into_iter().rev() {
        list = list.list_prepend(term);
    }
    list
}

/// Decode one event term.
///
/// Any term that is not one of the five event shapes is rejected with
/// [`Error::UnrecognizedEvent`].
pub fn term_to_event(term: Term<'_>) -> Result<Event> {
    if term.is_atom() {
        let name = term.atom_to_string().map_err(|_| unrecognized(term))?;
        return match EventKind::from_name(&name)? {
            EventKind::Exit => Ok(Event::Exit),
            _ => Err(unrecognized(term)),
        };
    }

    let fields = get_tuple(term).map_err(|_| unrecognized(term))?;
    let (tag, rest) = fields.split_first().ok_or_else(|| unrecognized(term))?;
    let name = tag.atom_to_string().map_err(|_| unrecognized(term))?;

    let field = |t: &Term| t.decode::<String>().map_err(|_| unrecognized(term));
    match (EventKind::from_name(&name)?, rest) {
        (EventKind::Enter, [tag, attrs]) => {
            let attrs: Vec<(String, Option<String>)> =
                attrs.decode().map_err(|_| unrecognized(term))?;
            let mut attributes = Attributes::new();
            for (key, value) in attrs {
                attributes.insert(key, value);
            }
            Ok(Event::Enter {
                tag: field(tag)?,
                attributes,
            })
        }
        (EventKind::Text, [content]) => Ok(Event::Text {
            content: field(content)?,
        }),
        (EventKind::Comment, [content]) => Ok(Event::Comment {
            content: field(content)?,
        }),
        (EventKind::ProcessingInstruction, [target, content]) => {
            Ok(Event::ProcessingInstruction {
                target: field(target)?,
                content: field(content)?,
            })
        }
        _ => Err(unrecognized(term)),
    }
}

/// Decode a list of event terms, failing on the first bad one
pub fn term_to_events(term: Term<'_>) -> Result<Vec<Event>> {
    let items: Vec<Term<'_>> = term
        .decode()
        .map_err(|_| Error::UnrecognizedEvent(format!("{:?}", term)))?;
    items.into_iter().map(term_to_event).collect()
}

/// `{:ok, value}`
pub fn ok_tuple<'a>(env: Env<'a>, value: Term<'a>) -> Term<'a> {
    (ok(), value).encode(env)
}

/// `{:error, message}`
pub fn error_tuple<'a>(env: Env<'a>, err: &Error) -> Term<'a> {
    (error(), err.to_string()).encode(env)
}

fn unrecognized(term: Term<'_>) -> Error {
    Error::UnrecognizedEvent(format!("{:?}", term))
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
