use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Vertex,
    Edge,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Vertex => "Vertex",
            ElementKind::Edge => "Edge",
        }
    }

    pub(crate) fn family(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

#[derive(Debug, Clone)]
struct CachedProperty {
    value: PropertyValue,
    expires_at: Option<Instant>,
}

impl CachedProperty {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Property bindings decoded from an element's row, each with its own
/// cache deadline. Expired bindings read as absent.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    entries: BTreeMap<String, CachedProperty>,
}

impl PropertyBag {
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries
            .get(key)
            .filter(|p| !p.expired())
            .map(|p| &p.value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue, ttl: Option<Duration>) {
        self.entries.insert(
            key.into(),
            CachedProperty {
                value,
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
    }

    pub(crate) fn insert_if_absent(
        &mut self,
        key: &str,
        value: PropertyValue,
        ttl: Option<Duration>,
    ) {
        if !self.entries.contains_key(key) {
            self.insert(key, value, ttl);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key).map(|p| p.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, p)| !p.expired())
            .map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Uniform access to an element's id and property bag, used by the cache.
pub(crate) trait Element {
    fn id(&self) -> &str;
    fn bag_mut(&mut self) -> &mut PropertyBag;
}

#[derive(Debug, Clone)]
pub struct Vertex {
    id: String,
    props: PropertyBag,
}

impl Vertex {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            props: PropertyBag::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// A property binding previously loaded onto this handle, if any and
    /// unexpired. Misses say nothing about the stored row.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.props.get(key)
    }

    pub fn cached_keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys()
    }
}

impl Element for Vertex {
    fn id(&self) -> &str {
        &self.id
    }

    fn bag_mut(&mut self) -> &mut PropertyBag {
        &mut self.props
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    id: String,
    label: Option<String>,
    in_vertex: Option<String>,
    out_vertex: Option<String>,
    props: PropertyBag,
}

impl Edge {
    /// A lazy handle: identity only, endpoints and label unresolved.
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            in_vertex: None,
            out_vertex: None,
            props: PropertyBag::default(),
        }
    }

    pub(crate) fn resolved(
        id: impl Into<String>,
        label: impl Into<String>,
        in_vertex: impl Into<String>,
        out_vertex: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
            in_vertex: Some(in_vertex.into()),
            out_vertex: Some(out_vertex.into()),
            props: PropertyBag::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn in_vertex(&self) -> Option<&str> {
        self.in_vertex.as_deref()
    }

    pub fn out_vertex(&self) -> Option<&str> {
        self.out_vertex.as_deref()
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.props.get(key)
    }

    pub fn cached_keys(&self) -> impl Iterator<Item = &str> {
        self.props.keys()
    }

    pub(crate) fn set_endpoints(&mut self, in_vertex: String, out_vertex: String) {
        self.in_vertex = Some(in_vertex);
        self.out_vertex = Some(out_vertex);
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }
}

impl Element for Edge {
    fn id(&self) -> &str {
        &self.id
    }

    fn bag_mut(&mut self) -> &mut PropertyBag {
        &mut self.props
    }
}
