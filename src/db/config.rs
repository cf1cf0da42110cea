use std::collections::HashMap;
use std::time::Duration;

use crate::model::ElementKind;

/// Tuning and naming for one graph. Connection handling belongs to the
/// injected store; everything else recognized by the engine lives here.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub graph_name: String,
    pub table_prefix: String,
    /// Flush the multi-writer after every public mutation.
    pub auto_flush: bool,
    /// Provision missing tables on open; opening fails on missing tables
    /// when disabled.
    pub create_tables: bool,
    /// Drop and recreate the graph's tables on open.
    pub clear_tables_on_open: bool,
    /// `add_vertex` skips the duplicate check and element getters return
    /// lazy handles without scanning.
    pub skip_existence_checks: bool,
    /// Treat every property key as key-indexed on writes and reads.
    pub auto_index: bool,
    /// Disable the named-index API.
    pub indexable_disabled: bool,
    /// Per-kind LRU capacity; 0 disables both element caches.
    pub lru_max_capacity: usize,
    pub vertex_cache_ttl: Duration,
    pub edge_cache_ttl: Duration,
    /// TTL for property bindings whose key has no explicit entry.
    pub default_property_ttl: Duration,
    /// Per-key TTL override; `None` means never cache that key.
    pub property_cache_ttl: HashMap<String, Option<Duration>>,
    /// Property families fetched eagerly on every element load.
    pub preloaded_properties: Vec<String>,
    /// Edge labels whose incident edges are primed into the edge cache on
    /// vertex load.
    pub preloaded_edge_labels: Vec<String>,
    /// Split points applied to every core table at creation.
    pub splits: Vec<Vec<u8>>,
    pub query_threads: usize,
    pub max_write_threads: usize,
    /// Sweep key-index cells of cascade-removed edges during
    /// `remove_vertex`; `false` restores the legacy leak.
    pub sweep_edge_key_index: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            graph_name: "graph".to_string(),
            table_prefix: String::new(),
            auto_flush: true,
            create_tables: true,
            clear_tables_on_open: false,
            skip_existence_checks: false,
            auto_index: false,
            indexable_disabled: false,
            lru_max_capacity: 1000,
            vertex_cache_ttl: Duration::from_secs(300),
            edge_cache_ttl: Duration::from_secs(300),
            default_property_ttl: Duration::from_secs(60),
            property_cache_ttl: HashMap::new(),
            preloaded_properties: Vec::new(),
            preloaded_edge_labels: Vec::new(),
            splits: Vec::new(),
            query_threads: 3,
            max_write_threads: 3,
            sweep_edge_key_index: true,
        }
    }
}

impl GraphConfig {
    pub fn named(graph_name: impl Into<String>) -> Self {
        Self {
            graph_name: graph_name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn property_ttl(&self, key: &str) -> Option<Duration> {
        self.property_cache_ttl
            .get(key)
            .copied()
            .unwrap_or(Some(self.default_property_ttl))
    }

    fn table(&self, suffix: &str) -> String {
        format!("{}{}_{suffix}", self.table_prefix, self.graph_name)
    }

    pub fn vertex_table(&self) -> String {
        self.table("vertex")
    }

    pub fn edge_table(&self) -> String {
        self.table("edge")
    }

    pub fn vertex_index_table(&self) -> String {
        self.table("vertex_index")
    }

    pub fn edge_index_table(&self) -> String {
        self.table("edge_index")
    }

    pub fn metadata_table(&self) -> String {
        self.table("metadata")
    }

    pub fn key_metadata_table(&self) -> String {
        self.table("key_metadata")
    }

    pub fn named_index_table(&self, index_name: &str) -> String {
        self.table(&format!("index_{index_name}"))
    }

    pub(crate) fn element_table(&self, kind: ElementKind) -> String {
        match kind {
            ElementKind::Vertex => self.vertex_table(),
            ElementKind::Edge => self.edge_table(),
        }
    }

    pub(crate) fn index_table(&self, kind: ElementKind) -> String {
        match kind {
            ElementKind::Vertex => self.vertex_index_table(),
            ElementKind::Edge => self.edge_index_table(),
        }
    }

    pub(crate) fn core_tables(&self) -> [String; 6] {
        [
            self.vertex_table(),
            self.edge_table(),
            self.vertex_index_table(),
            self.edge_index_table(),
            self.metadata_table(),
            self.key_metadata_table(),
        ]
    }
}
