//! Peer Pairer
//!
//! Annotates each exit event with the enter event it closes.

use std::iter::FusedIterator;

use super::Event;

/// Lazy `(event, peer)` sequence, see [`with_peer`]
pub struct WithPeer<I> {
    events: I,
    open: Vec<Event>,
}

/// Pair every [`Event::Exit`] with its matching [`Event::Enter`].
///
/// All other events, and an exit with nothing open, are paired with `None`.
pub fn with_peer<I>(events: I) -> WithPeer<I::IntoIter>
where
    I: IntoIterator<Item = Event>,
{
    WithPeer {
        events: events.into_iter(),
        open: Vec::new(),
    }
}

impl<I: Iterator<Item = Event>> Iterator for WithPeer<I> {
    type Item = (Event, Option<Event>);

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.events.next()?;
        let peer = match &event {
            Event::Enter { .. } => {
                self.open.push(event.clone());
                None
            }
            Event::Exit => self.open.pop(),
            Event::Text { .. } | Event::ProcessingInstruction { .. } | Event::Comment { .. } => {
                None
            }
        };
        Some((event, peer))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

impl<I: FusedIterator<Item = Event>> FusedIterator for WithPeer<I> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_peer() {
        let result: Vec<_> = with_peer(vec![
            Event::enter("a"),
            Event::text("Hello"),
            Event::comment("content"),
            Event::text(" world!"),
            Event::Exit,
        ])
        .collect();

        assert_eq!(
            result,
            vec![
                (Event::enter("a"), None),
                (Event::text("Hello"), None),
                (Event::comment("content"), None),
                (Event::text(" world!"), None),
                (Event::Exit, Some(Event::enter("a"))),
            ]
        );
    }

    #[test]
    fn test_with_peer_nested() {
        let result: Vec<_> = with_peer(vec![
            Event::enter("a"),
            Event::enter("b"),
            Event::processing_instruction("p", ""),
            Event::Exit,
            Event::enter("c"),
            Event::Exit,
            Event::Exit,
        ])
        .map(|(_, peer)| peer)
        .collect();

        assert_eq!(
            result,
            vec![
                None,
                None,
                None,
                Some(Event::enter("b")),
                None,
                Some(Event::enter("c")),
                Some(Event::enter("a")),
            ]
        );
    }

    #[test]
    fn test_with_peer_unmatched_exit() {
        let result: Vec<_> = with_peer(vec![Event::Exit]).collect();
        assert_eq!(result, vec![(Event::Exit, None)]);
    }

    #[test]
    fn test_with_peer_is_lazy() {
        let mut pairs = with_peer(std::iter::repeat(Event::text("x")));
        assert_eq!(pairs.next(), Some((Event::text("x"), None)));
        assert_eq!(pairs.next(), Some((Event::text("x"), None)));
    }
}
