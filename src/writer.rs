//! Tree Serializer
//!
//! Writes an element tree as XML text. Namespace declarations present as
//! attributes are written as-is; any prefix (or default namespace) an
//! element or attribute needs that is not already in scope gets a
//! declaration synthesized on the element that first needs it.

use std::borrow::Cow;

use crate::dom::{NamespaceResolver, NodeId, NodeKind, XmlDocument};
use crate::events::scan::is_namespace_declaration;
use crate::options::SerializeOptions;

/// Prepended when [`SerializeOptions::xml_declaration`] is set
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>\n";

/// Serialize the document's root element
pub fn serialize(doc: &XmlDocument, options: &SerializeOptions) -> String {
    let mut buf = String::with_capacity(1024);
    if options.xml_declaration {
        buf.push_str(XML_DECLARATION);
    }
    if let Some(root) = doc.root_element_id() {
        write_node(doc, root, &mut buf);
    }
    log::debug!("serialize: {} nodes -> {} bytes", doc.node_count(), buf.len());
    buf
}

/// Serialize a single node and its descendants
pub fn serialize_node(doc: &XmlDocument, id: NodeId) -> String {
    let mut buf = String::with_capacity(256);
    write_node(doc, id, &mut buf);
    buf
}

/// Uses iterative approach with explicit stack to avoid stack overflow on deep XML
fn write_node(doc: &XmlDocument, node_id: NodeId, buf: &mut String) {
    // Stack entries: Either entering a node or need to write closing tag
    enum StackEntry {
        Enter(NodeId),
        Close(NodeId),
    }

    let mut scope = NamespaceResolver::new();
    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);
    stack.push(StackEntry::Enter(node_id));

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::Close(id) => {
                buf.push_str("</");
                buf.push_str(doc.node_name(id).unwrap_or_default());
                buf.push('>');
                scope.pop_scope();
            }
            StackEntry::Enter(current_id) => {
                let node = match doc.get_node(current_id) {
                    Some(n) => n,
                    None => continue,
                };
                let content = doc.text_content(current_id).unwrap_or_default();

                match node.kind {
                    NodeKind::Element => {
                        scope.push_scope();
                        write_start_tag(doc, current_id, &mut scope, buf);

                        if !node.has_children() {
                            buf.push_str("/>");
                            scope.pop_scope();
                        } else {
                            buf.push('>');

                            // Push closing tag first (processed after children)
                            stack.push(StackEntry::Close(current_id));

                            let mut child_id = node.last_child;
                            while let Some(cid) = child_id {
                                stack.push(StackEntry::Enter(cid));
                                child_id = doc.get_node(cid).and_then(|n| n.prev_sibling);
                            }
                        }
                    }
                    NodeKind::Text => escape_text(content, buf),
                    NodeKind::CData => {
                        buf.push_str("<![CDATA[");
                        buf.push_str(content);
                        buf.push_str("]]>");
                    }
                    NodeKind::Comment => {
                        buf.push_str("<!--");
                        buf.push_str(content);
                        buf.push_str("-->");
                    }
                    NodeKind::ProcessingInstruction => {
                        buf.push_str("<?");
                        buf.push_str(doc.node_name(current_id).unwrap_or_default());
                        buf.push(' ');
                        buf.push_str(content);
                        buf.push_str("?>");
                    }
                }
            }
        }
    }
}

/// Write `<name` plus declarations and attributes, leaving the tag open
fn write_start_tag(doc: &XmlDocument, id: NodeId, scope: &mut NamespaceResolver, buf: &mut String) {
    let name = doc.node_name(id).unwrap_or_default();
    buf.push('<');
    buf.push_str(name);

    let attributes = doc.attributes(id);
    let local = local_bindings(doc, id);

    // Declarations already on the element come first and shape the scope
    for attr in attributes {
        let attr_name = doc.attribute_name(attr);
        if !is_namespace_declaration(attr_name) {
            continue;
        }
        let value = doc.attribute_value(attr);
        match attr_name.strip_prefix("xmlns:") {
            Some(prefix) => scope.declare(prefix, value),
            None => scope.declare_default(value),
        }
        write_attribute(attr_name, value, buf);
    }

    match (doc.namespace(id), prefix_of(name)) {
        (Some(ns), Some(prefix)) => ensure_prefix(prefix, ns, scope, buf),
        (Some(ns), None) => {
            if scope.resolve_default() != Some(ns) {
                scope.declare_default(ns);
                write_attribute("xmlns", ns, buf);
            }
        }
        (None, None) => {
            if scope.resolve_default().is_some() {
                scope.declare_default("");
                write_attribute("xmlns", "", buf);
            }
        }
        // Prefixed name with no namespace is written verbatim
        (None, Some(_)) => {}
    }

    for attr in attributes {
        let attr_name = doc.attribute_name(attr);
        if is_namespace_declaration(attr_name) {
            continue;
        }
        let written: Cow<'_, str> = match (doc.attribute_namespace(attr), prefix_of(attr_name)) {
            (Some(ns), Some(prefix)) => {
                ensure_prefix(prefix, ns, scope, buf);
                Cow::Borrowed(attr_name)
            }
            // Attributes never take the default namespace
            (Some(ns), None) => {
                let reusable = scope
                    .prefix_for(ns)
                    .filter(|prefix| binds_compatibly(&local, prefix, ns))
                    .map(str::to_string);
                let prefix = match reusable {
                    Some(prefix) => prefix,
                    None => {
                        let prefix = unused_prefix(scope, &local);
                        ensure_prefix(&prefix, ns, scope, buf);
                        prefix
                    }
                };
                Cow::Owned(format!("{}:{}", prefix, attr_name))
            }
            (None, _) => Cow::Borrowed(attr_name),
        };
        write_attribute(&written, doc.attribute_value(attr), buf);
    }
}

/// Declare `prefix` for `ns` unless it already resolves there
fn ensure_prefix(prefix: &str, ns: &str, scope: &mut NamespaceResolver, buf: &mut String) {
    if scope.resolve(prefix) == Some(ns) {
        return;
    }
    scope.declare(prefix, ns);
    buf.push_str(" xmlns:");
    buf.push_str(prefix);
    buf.push_str("=\"");
    escape_attribute(ns, buf);
    buf.push('"');
}

/// `(prefix, namespace)` pairs bound by the element's own name, its
/// declarations and its prefixed attributes
fn local_bindings(doc: &XmlDocument, id: NodeId) -> Vec<(&str, &str)> {
    let mut bindings = Vec::new();
    if let (Some(ns), Some(prefix)) = (doc.namespace(id), doc.node_name(id).and_then(prefix_of)) {
        bindings.push((prefix, ns));
    }
    for attr in doc.attributes(id) {
        let name = doc.attribute_name(attr);
        if let Some(prefix) = name.strip_prefix("xmlns:") {
            bindings.push((prefix, doc.attribute_value(attr)));
        } else if let (Some(ns), Some(prefix)) = (doc.attribute_namespace(attr), prefix_of(name)) {
            bindings.push((prefix, ns));
        }
    }
    bindings
}

/// Whether `prefix` can mean `ns` without contradicting the element's own bindings
fn binds_compatibly(local: &[(&str, &str)], prefix: &str, ns: &str) -> bool {
    local.iter().all(|&(p, bound)| p != prefix || bound == ns)
}

/// First `nsN` neither in scope nor bound on the element itself
fn unused_prefix(scope: &NamespaceResolver, local: &[(&str, &str)]) -> String {
    (0..)
        .map(|i| format!("ns{}", i))
        .find(|candidate| {
            scope.resolve(candidate).is_none()
                && local.iter().all(|&(prefix, _)| prefix != candidate.as_str())
        })
        .unwrap_or_default()
}

#[inline]
fn prefix_of(name: &str) -> Option<&str> {
    memchr::memrchr(b':', name.as_bytes()).map(|pos| &name[..pos])
}

fn write_attribute(name: &str, value: &str, buf: &mut String) {
    buf.push(' ');
    buf.push_str(name);
    buf.push_str("=\"");
    escape_attribute(value, buf);
    buf.push('"');
}

/// Escape character data: `&`, `<` and `>`
fn escape_text(s: &str, buf: &mut String) {
    if memchr::memchr3(b'&', b'<', b'>', s.as_bytes()).is_none() {
        buf.push_str(s);
        return;
    }
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            _ => buf.push(c),
        }
    }
}

/// Escape an attribute value: `&`, `<`, `>` and `"`
fn escape_attribute(s: &str, buf: &mut String) {
    let bytes = s.as_bytes();
    if memchr::memchr3(b'&', b'<', b'"', bytes).is_none() && memchr::memchr(b'>', bytes).is_none() {
        buf.push_str(s);
        return;
    }
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            _ => buf.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::namespace::ns;

    fn to_string(doc: &XmlDocument) -> String {
        serialize(doc, &SerializeOptions::default())
    }

    #[test]
    fn test_serialize_simple() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.append_text(a, "Hello");
        assert_eq!(to_string(&doc), "<a>Hello</a>");
    }

    #[test]
    fn test_serialize_xml_declaration() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.append_text(a, "Hello");
        let text = serialize(&doc, &SerializeOptions::new().with_xml_declaration(true));
        assert_eq!(text, "<?xml version='1.0' encoding='utf-8'?>\n<a>Hello</a>");
    }

    #[test]
    fn test_serialize_empty_document() {
        assert_eq!(to_string(&XmlDocument::new()), "");
    }

    #[test]
    fn test_serialize_empty_element() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.create_element(None, "b", Some(a));
        assert_eq!(to_string(&doc), "<a><b/></a>");
    }

    #[test]
    fn test_serialize_synthesizes_prefix_declaration() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(Some("boo"), "ns:a", None);
        doc.append_text(a, "Hello");
        let b = doc.create_element(Some("boo"), "ns:b", Some(a));
        doc.append_text(b, "x");
        assert_eq!(
            to_string(&doc),
            r#"<ns:a xmlns:ns="boo">Hello<ns:b>x</ns:b></ns:a>"#
        );
    }

    #[test]
    fn test_serialize_unscanned_with_seeded_prefix() {
        use crate::events::{unscan, Event};
        use crate::options::UnscanOptions;

        let events = vec![Event::enter("{boo}a"), Event::text("Hello"), Event::Exit];
        let doc = unscan(events, &UnscanOptions::new().with_prefix("ns", "boo")).unwrap();
        assert_eq!(to_string(&doc), r#"<ns:a xmlns:ns="boo">Hello</ns:a>"#);
    }

    #[test]
    fn test_serialize_fresh_prefix_avoids_later_attribute_prefix() {
        use crate::events::{scan, unscan, Attributes, Event};
        use crate::options::UnscanOptions;

        let mut attributes = Attributes::new();
        attributes.set("{urn:y}two", "2");
        attributes.set("{urn:z}three", "3");
        let events = vec![
            Event::Enter {
                tag: "{urn:y}a".to_string(),
                attributes,
            },
            Event::Exit,
        ];
        let options = UnscanOptions::new().with_default_namespace("urn:y");
        let doc = unscan(events.clone(), &options).unwrap();

        let text = to_string(&doc);
        assert_eq!(
            text,
            r#"<a xmlns="urn:y" xmlns:ns1="urn:y" ns1:two="2" xmlns:ns0="urn:z" ns0:three="3"/>"#
        );

        let reparsed = crate::reader::parse(&text).unwrap().unwrap();
        assert_eq!(scan(&reparsed).collect::<Vec<_>>(), events);
    }

    #[test]
    fn test_serialize_in_scope_prefix_not_reused_when_rebound() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(Some("urn:y"), "ns0:a", None);
        let b = doc.create_element(None, "b", Some(a));
        doc.set_attribute(b, Some("urn:y"), "two", "2");
        doc.set_attribute(b, Some("urn:z"), "ns0:three", "3");
        assert_eq!(
            to_string(&doc),
            r#"<ns0:a xmlns:ns0="urn:y"><b xmlns:ns1="urn:y" ns1:two="2" xmlns:ns0="urn:z" ns0:three="3"/></ns0:a>"#
        );
    }

    #[test]
    fn test_serialize_keeps_existing_declarations() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(Some("huh"), "ns:a", None);
        doc.set_attribute(a, Some(ns::XMLNS), "xmlns:ns", "huh");
        doc.append_text(a, "Hello");
        assert_eq!(to_string(&doc), r#"<ns:a xmlns:ns="huh">Hello</ns:a>"#);
    }

    #[test]
    fn test_serialize_default_namespace() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(Some("urn:d"), "a", None);
        doc.create_element(Some("urn:d"), "b", Some(a));
        doc.create_element(None, "c", Some(a));
        assert_eq!(
            to_string(&doc),
            r#"<a xmlns="urn:d"><b/><c xmlns=""/></a>"#
        );
    }

    #[test]
    fn test_serialize_namespaced_attributes() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.set_attribute(a, Some("urn:x"), "x:one", "1");
        doc.set_attribute(a, Some("urn:y"), "two", "2");
        doc.set_attribute(a, Some(ns::XML), "xml:lang", "en");
        assert_eq!(
            to_string(&doc),
            r#"<a xmlns:x="urn:x" x:one="1" xmlns:ns0="urn:y" ns0:two="2" xml:lang="en"/>"#
        );
    }

    #[test]
    fn test_serialize_unprefixed_attribute_reuses_prefix_in_scope() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(Some("urn:x"), "x:a", None);
        doc.set_attribute(a, Some("urn:x"), "attr", "v");
        assert_eq!(to_string(&doc), r#"<x:a xmlns:x="urn:x" x:attr="v"/>"#);
    }

    #[test]
    fn test_serialize_escaping() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.set_attribute(a, None, "q", "\"<&>\"");
        doc.append_text(a, "1 < 2 & 3 > 2 \"ok\"");
        assert_eq!(
            to_string(&doc),
            r#"<a q="&quot;&lt;&amp;&gt;&quot;">1 &lt; 2 &amp; 3 &gt; 2 "ok"</a>"#
        );
    }

    #[test]
    fn test_serialize_pi_comment_cdata() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.append_text(a, "Hello");
        doc.append_processing_instruction(a, "pi", "content");
        doc.append_comment(a, "content");
        doc.append_cdata(a, "<raw>");
        doc.append_text(a, " world!");
        assert_eq!(
            to_string(&doc),
            "<a>Hello<?pi content?><!--content--><![CDATA[<raw>]]> world!</a>"
        );
    }

    #[test]
    fn test_serialize_node_subtree() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(Some("urn:x"), "x:a", None);
        let b = doc.create_element(Some("urn:x"), "x:b", Some(a));
        doc.append_text(b, "t");
        assert_eq!(serialize_node(&doc, b), r#"<x:b xmlns:x="urn:x">t</x:b>"#);
    }

    #[test]
    fn test_serialize_sibling_scopes_redeclare() {
        let mut doc = XmlDocument::new();
        let a = doc.create_element(None, "a", None);
        doc.create_element(Some("urn:x"), "x:b", Some(a));
        doc.create_element(Some("urn:x"), "x:c", Some(a));
        assert_eq!(
            to_string(&doc),
            r#"<a><x:b xmlns:x="urn:x"/><x:c xmlns:x="urn:x"/></a>"#
        );
    }
}
