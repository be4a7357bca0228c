//! Namespace Qualifier
//!
//! Chooses the prefix each namespace is written with while a tree is being
//! rebuilt from events. One qualifier lives for exactly one build.

use std::collections::{HashMap, HashSet};

/// How a namespace is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prefix {
    /// Unprefixed, as the default namespace
    Default,
    /// `prefix:local`
    Named(String),
}

impl Prefix {
    /// Interpret a namespace map key. `None`, `""` and `"default"` mean no prefix.
    fn from_map_key(key: Option<&str>) -> Self {
        match key {
            None | Some("") | Some("default") => Prefix::Default,
            Some(prefix) => Prefix::Named(prefix.to_string()),
        }
    }
}

/// Deterministic namespace -> prefix allocator.
///
/// Fresh prefixes count up as `ns0`, `ns1`, ... but unlike a plain counter
/// the sequence skips any `nsN` the caller already seeded, so a seeded
/// prefix never ends up naming two namespaces.
#[derive(Debug)]
pub struct Qualifier {
    /// Reverse index: namespace URI -> prefix
    index: HashMap<String, Prefix>,
    /// Prefixes supplied by the caller, never handed out by `mint`
    reserved: HashSet<String>,
    /// Counter for `ns0`, `ns1`, ...
    next_id: usize,
}

impl Qualifier {
    /// Create a qualifier seeded from `(prefix, namespace)` pairs.
    ///
    /// When a namespace is listed twice the later pair wins.
    pub fn new(namespace_map: &[(Option<String>, String)]) -> Self {
        let mut index = HashMap::with_capacity(namespace_map.len());
        let mut reserved = HashSet::new();
        for (key, namespace) in namespace_map {
            let prefix = Prefix::from_map_key(key.as_deref());
            if let Prefix::Named(name) = &prefix {
                reserved.insert(name.clone());
            }
            index.insert(namespace.clone(), prefix);
        }
        Qualifier {
            index,
            reserved,
            next_id: 0,
        }
    }

    /// Qualified name to write for `local` in `namespace`
    pub fn qualify(&mut self, namespace: Option<&str>, local: &str) -> String {
        let namespace = match namespace {
            Some(ns) if !ns.is_empty() => ns,
            _ => return local.to_string(),
        };

        if !self.index.contains_key(namespace) {
            let prefix = self.mint();
            log::trace!("assigned prefix {} to namespace {}", prefix, namespace);
            self.index
                .insert(namespace.to_string(), Prefix::Named(prefix));
        }

        match &self.index[namespace] {
            Prefix::Default => local.to_string(),
            Prefix::Named(prefix) => format!("{}:{}", prefix, local),
        }
    }

    fn mint(&mut self) -> String {
        loop {
            let candidate = format!("ns{}", self.next_id);
            self.next_id += 1;
            if !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for Qualifier {
    fn default() -> Self {
        Self::new(&[])
    }
}
