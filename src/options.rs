//! Options for building and serializing trees

/// Options for [`unscan`](crate::events::unscan)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnscanOptions {
    /// Seed prefixes as `(prefix, namespace)` pairs, applied in order.
    ///
    /// A prefix of `None`, `""` or `"default"` renders that namespace
    /// unprefixed.
    pub namespace_map: Vec<(Option<String>, String)>,
}

impl UnscanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `namespace`
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.namespace_map
            .push((Some(prefix.into()), namespace.into()));
        self
    }

    /// Render `namespace` as the default namespace
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace_map.push((None, namespace.into()));
        self
    }
}

/// Options for [`serialize`](crate::writer::serialize)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Prepend `<?xml version='1.0' encoding='utf-8'?>` and a newline
    pub xml_declaration: bool,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xml_declaration(mut self, xml_declaration: bool) -> Self {
        self.xml_declaration = xml_declaration;
        self
    }
}
