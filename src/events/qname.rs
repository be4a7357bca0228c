//! Curly-name tokens
//!
//! A namespaced name travels through an event stream as a single string,
//! `{namespace}local`. Names without a namespace pass through unchanged.

/// A decoded curly-name token, borrowing from the token it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QName<'a> {
    pub namespace: Option<&'a str>,
    pub local_name: &'a str,
}

/// Local part of a node name: everything after the last colon
#[inline]
pub fn local_part(name: &str) -> &str {
    match memchr::memrchr(b':', name.as_bytes()) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Encode a node's namespace and name as a curly-name token.
///
/// The prefix of `name`, if any, is dropped: `encode(Some("urn:x"), "x:a")`
/// is `"{urn:x}a"`.
pub fn encode(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => {
            let local = local_part(name);
            let mut token = String::with_capacity(ns.len() + local.len() + 2);
            token.push('{');
            token.push_str(ns);
            token.push('}');
            token.push_str(local);
            token
        }
        _ => name.to_string(),
    }
}

/// Decode a curly-name token.
///
/// Matches `{ns}local` with both parts non-empty, splitting at the last
/// closing brace that still leaves a local name. Anything else is a bare
/// local name.
pub fn decode(token: &str) -> QName<'_> {
    let bytes = token.as_bytes();
    if bytes.len() >= 4 && bytes[0] == b'{' {
        if let Some(close) = memchr::memrchr(b'}', &bytes[..bytes.len() - 1]) {
            if close >= 2 {
                return QName {
                    namespace: Some(&token[1..close]),
                    local_name: &token[close + 1..],
                };
            }
        }
    }
    QName {
        namespace: None,
        local_name: token,
    }
}
