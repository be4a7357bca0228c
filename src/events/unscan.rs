//! Event-Stream Builder
//!
//! Rebuilds an element tree from a balanced event sequence. Namespaced
//! names get their prefixes from a [`Qualifier`] owned by the call.

use super::qname::decode;
use super::qualifier::Qualifier;
use super::{Attributes, Event};
use crate::dom::{NodeId, XmlDocument};
use crate::error::{Result, StructureError};
use crate::options::UnscanOptions;

/// Build a tree from `events`.
///
/// Fails with a [`StructureError`] if an exit has nothing to close, content
/// appears outside any element, or elements are left open; no partial tree
/// is returned. Elements entered after the root closed are kept detached,
/// and an empty sequence gives a document without a root.
pub fn unscan<I>(events: I, options: &UnscanOptions) -> Result<XmlDocument>
where
    I: IntoIterator<Item = Event>,
{
    let mut qualifier = Qualifier::new(&options.namespace_map);
    let mut doc = XmlDocument::new();
    let mut stack: Vec<NodeId> = Vec::with_capacity(32);
    let mut event_count = 0usize;

    for event in events {
        event_count += 1;
        match event {
            Event::Enter { tag, attributes } => {
                let parent = stack.last().copied();
                let id = create_element(&mut doc, &tag, &attributes, parent, &mut qualifier);
                stack.push(id);
            }
            Event::Exit => {
                stack.pop().ok_or(StructureError::UnmatchedExit)?;
            }
            Event::Text { content } => {
                doc.append_text(current(&stack)?, &content);
            }
            Event::ProcessingInstruction { target, content } => {
                doc.append_processing_instruction(current(&stack)?, &target, &content);
            }
            Event::Comment { content } => {
                doc.append_comment(current(&stack)?, &content);
            }
        }
    }

    if !stack.is_empty() {
        return Err(StructureError::UnclosedElements(stack.len()).into());
    }

    log::debug!(
        "unscan: {} events -> {} nodes",
        event_count,
        doc.node_count()
    );
    Ok(doc)
}

#[inline]
fn current(stack: &[NodeId]) -> Result<NodeId> {
    stack
        .last()
        .copied()
        .ok_or_else(|| StructureError::ContentOutsideElement.into())
}

fn create_element(
    doc: &mut XmlDocument,
    tag: &str,
    attributes: &Attributes,
    parent: Option<NodeId>,
    qualifier: &mut Qualifier,
) -> NodeId {
    let name = decode(tag);
    let qualified = qualifier.qualify(name.namespace, name.local_name);
    let id = doc.create_element(name.namespace, &qualified, parent);

    let mut present = Vec::with_capacity(attributes.len());
    for (key, value) in attributes.iter() {
        let attr_name = decode(key);
        // Prefix is allocated even when the attribute is omitted
        let qualified = qualifier.qualify(attr_name.namespace, attr_name.local_name);
        if let Some(value) = value {
            present.push((attr_name.namespace, qualified, value));
        }
    }
    doc.set_attributes(
        id,
        present
            .iter()
            .map(|(namespace, name, value)| (*namespace, name.as_str(), *value)),
    );

    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::events::scan;

    fn hello(tag: &str) -> Vec<Event> {
        vec![Event::enter(tag), Event::text("Hello"), Event::Exit]
    }

    fn structure_error(result: Result<XmlDocument>) -> StructureError {
        match result {
            Err(Error::Structure(e)) => e,
            Err(other) => panic!("expected structure error, got {other}"),
            Ok(_) => panic!("expected structure error, got a document"),
        }
    }

    #[test]
    fn test_unscan_simple() {
        let doc = unscan(hello("a"), &UnscanOptions::default()).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("a"));
        assert_eq!(doc.namespace(root), None);

        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text_content(children[0]), Some("Hello"));
    }

    #[test]
    fn test_unscan_seeded_namespace() {
        let options = UnscanOptions::new().with_prefix("ns", "boo");
        let doc = unscan(hello("{boo}a"), &options).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("ns:a"));
        assert_eq!(doc.namespace(root), Some("boo"));
    }

    #[test]
    fn test_unscan_default_namespace() {
        let options = UnscanOptions::new().with_default_namespace("boo");
        let doc = unscan(hello("{boo}a"), &options).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("a"));
        assert_eq!(doc.namespace(root), Some("boo"));
    }

    #[test]
    fn test_unscan_mints_prefixes_in_encounter_order() {
        let mut attributes = Attributes::new();
        attributes.set("{urn:attr}x", "1");
        attributes.set("{urn:root}y", "2");
        let events = vec![
            Event::Enter {
                tag: "{urn:root}r".to_string(),
                attributes,
            },
            Event::enter("{urn:child}c"),
            Event::Exit,
            Event::enter("{urn:root}c"),
            Event::Exit,
            Event::Exit,
        ];
        let doc = unscan(events, &UnscanOptions::default()).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("ns0:r"));
        assert_eq!(doc.get_attribute(root, "ns1:x"), Some("1"));
        assert_eq!(doc.get_attribute(root, "ns0:y"), Some("2"));

        let names: Vec<_> = doc
            .children(root)
            .map(|c| doc.node_name(c).unwrap())
            .collect();
        assert_eq!(names, vec!["ns2:c", "ns0:c"]);
    }

    #[test]
    fn test_unscan_omits_absent_attribute_values() {
        let mut attributes = Attributes::new();
        attributes.set("keep", "yes");
        attributes.omit("{urn:gone}drop");
        attributes.set("{urn:kept}also", "");
        let events = vec![
            Event::Enter {
                tag: "a".to_string(),
                attributes,
            },
            Event::Exit,
        ];
        let doc = unscan(events, &UnscanOptions::default()).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.attributes(root).len(), 2);
        assert_eq!(doc.get_attribute(root, "keep"), Some("yes"));
        // ns0 went to the omitted attribute's namespace
        assert_eq!(doc.get_attribute(root, "ns1:also"), Some(""));
    }

    #[test]
    fn test_unscan_pi_and_comment() {
        let events = vec![
            Event::enter("a"),
            Event::text("Hello"),
            Event::processing_instruction("pi", "content"),
            Event::comment("note"),
            Event::text(" world!"),
            Event::Exit,
        ];
        let doc = unscan(events.clone(), &UnscanOptions::default()).unwrap();
        let rescanned: Vec<_> = scan(&doc).collect();
        assert_eq!(rescanned, events);
    }

    #[test]
    fn test_unscan_missing_exit() {
        let events = vec![Event::enter("a"), Event::enter("b"), Event::Exit];
        assert_eq!(
            structure_error(unscan(events, &UnscanOptions::default())),
            StructureError::UnclosedElements(1)
        );
    }

    #[test]
    fn test_unscan_extra_exit() {
        let mut events = hello("a");
        events.push(Event::Exit);
        assert_eq!(
            structure_error(unscan(events, &UnscanOptions::default())),
            StructureError::UnmatchedExit
        );
    }

    #[test]
    fn test_unscan_content_outside_element() {
        for leaf in [
            Event::text("x"),
            Event::comment("x"),
            Event::processing_instruction("p", "x"),
        ] {
            assert_eq!(
                structure_error(unscan(vec![leaf], &UnscanOptions::default())),
                StructureError::ContentOutsideElement
            );
        }

        let mut events = hello("a");
        events.push(Event::text("trailing"));
        assert_eq!(
            structure_error(unscan(events, &UnscanOptions::default())),
            StructureError::ContentOutsideElement
        );
    }

    #[test]
    fn test_unscan_second_root_stays_detached() {
        let mut events = hello("a");
        events.extend(hello("b"));
        let doc = unscan(events, &UnscanOptions::default()).unwrap();

        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("a"));
        assert_eq!(scan(&doc).collect::<Vec<_>>(), hello("a"));

        let serialized = crate::writer::serialize(&doc, &Default::default());
        assert_eq!(serialized, "<a>Hello</a>");
    }

    #[test]
    fn test_unscan_empty() {
        let doc = unscan(Vec::new(), &UnscanOptions::default()).unwrap();
        assert_eq!(doc.root_element_id(), None);
        assert_eq!(scan(&doc).count(), 0);
        assert_eq!(crate::writer::serialize(&doc, &Default::default()), "");
    }

    #[test]
    fn test_unscan_many_attributes() {
        let count = 70_000;
        let attributes: Attributes = (0..count)
            .map(|i| (format!("{{urn:wide}}a{}", i), i.to_string()))
            .collect();
        let events = vec![
            Event::Enter {
                tag: "a".to_string(),
                attributes,
            },
            Event::Exit,
        ];
        let doc = unscan(events, &UnscanOptions::default()).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.attributes(root).len(), count);
        assert_eq!(doc.get_attribute(root, "ns0:a69999"), Some("69999"));

        let rescanned: Vec<_> = scan(&doc).collect();
        match &rescanned[0] {
            Event::Enter { attributes, .. } => {
                assert_eq!(attributes.len(), count);
                assert_eq!(attributes.get("{urn:wide}a0"), Some("0"));
            }
            other => panic!("expected enter, got {other:?}"),
        }
    }

    #[test]
    fn test_unscan_accepts_lazy_iterators() {
        let events = std::iter::once(Event::enter("a"))
            .chain(["x", "y"].into_iter().map(|s| Event::text(s)))
            .chain(std::iter::once(Event::Exit));
        let doc = unscan(events, &UnscanOptions::default()).unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.children(root).count(), 2);
    }
}
