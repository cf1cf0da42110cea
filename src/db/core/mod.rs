mod edges;
mod indexes;
mod iter;
mod properties;
mod time_travel;
mod vertices;

pub use indexes::NamedIndex;
pub use iter::{
    AdjacentEdges, AdjacentVertices, EdgeIter, EdgePropertyLookup, VertexIter,
    VertexPropertyLookup,
};

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::cache::ElementCache;
use crate::db::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::model::{Edge, ElementKind, Vertex};
use crate::storage::{
    Cell, MultiWriter, Scanner, SortedStore, StoreError, Writer,
};

/// The graph handle. All persistent state lives in the store's tables;
/// the handle owns the buffered writers, the element caches and the
/// configuration. Safe to share across threads.
pub struct CellGraph {
    pub(crate) config: GraphConfig,
    pub(crate) store: Arc<dyn SortedStore>,
    writers: RwLock<WriterSet>,
    pub(crate) vertex_cache: Option<ElementCache<Vertex>>,
    pub(crate) edge_cache: Option<ElementCache<Edge>>,
}

struct WriterSet {
    multi: Box<dyn MultiWriter>,
    vertex: Arc<dyn Writer>,
    edge: Arc<dyn Writer>,
}

impl WriterSet {
    fn new(store: &dyn SortedStore, config: &GraphConfig) -> Result<Self> {
        let multi = store.multi_writer(config.max_write_threads)?;
        let vertex = multi.writer(&config.vertex_table())?;
        let edge = multi.writer(&config.edge_table())?;
        Ok(Self {
            multi,
            vertex,
            edge,
        })
    }
}

impl std::fmt::Debug for CellGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellGraph")
            .field("graph_name", &self.config.graph_name)
            .field("auto_flush", &self.config.auto_flush)
            .finish()
    }
}

impl CellGraph {
    pub fn open(store: Arc<dyn SortedStore>, config: GraphConfig) -> Result<Self> {
        if config.clear_tables_on_open {
            Self::drop_graph_tables(&*store, &config)?;
        }
        let ops = store.table_ops();
        for table in config.core_tables() {
            if !ops.exists(&table) {
                if !config.create_tables {
                    return Err(StoreError::TableNotFound(table).into());
                }
                ops.create_with_splits(&table, &config.splits)?;
            }
        }
        let writers = WriterSet::new(&*store, &config)?;
        let vertex_cache = ElementCache::new(config.lru_max_capacity, config.vertex_cache_ttl);
        let edge_cache = ElementCache::new(config.lru_max_capacity, config.edge_cache_ttl);
        info!(graph = %config.graph_name, "graph opened");
        Ok(Self {
            config,
            store,
            writers: RwLock::new(writers),
            vertex_cache,
            edge_cache,
        })
    }

    /// Delete every table belonging to this graph, named-index tables
    /// included. The index names have to be read before the metadata
    /// table goes away.
    fn drop_graph_tables(store: &dyn SortedStore, config: &GraphConfig) -> Result<()> {
        let ops = store.table_ops();
        if ops.exists(&config.metadata_table()) {
            let scanner = store.scanner(&config.metadata_table())?;
            for cell in scanner {
                let cell = cell?;
                let name = String::from_utf8_lossy(&cell.row).to_string();
                let table = config.named_index_table(&name);
                if ops.exists(&table) {
                    ops.delete(&table)?;
                }
            }
        }
        for table in config.core_tables() {
            if ops.exists(&table) {
                ops.delete(&table)?;
            }
        }
        Ok(())
    }

    pub(crate) fn vertex_writer(&self) -> Arc<dyn Writer> {
        self.writers.read().vertex.clone()
    }

    pub(crate) fn edge_writer(&self) -> Arc<dyn Writer> {
        self.writers.read().edge.clone()
    }

    pub(crate) fn element_writer(&self, kind: ElementKind) -> Arc<dyn Writer> {
        match kind {
            ElementKind::Vertex => self.vertex_writer(),
            ElementKind::Edge => self.edge_writer(),
        }
    }

    pub(crate) fn table_writer(&self, table: &str) -> Result<Arc<dyn Writer>> {
        Ok(self.writers.read().multi.writer(table)?)
    }

    pub(crate) fn index_writer(&self, kind: ElementKind) -> Result<Arc<dyn Writer>> {
        self.table_writer(&self.config.index_table(kind))
    }

    /// Scanner without the caller's time-travel filter; index and
    /// metadata reads go through here.
    pub(crate) fn scanner(&self, table: &str) -> Result<Box<dyn Scanner>> {
        Ok(self.store.scanner(table)?)
    }

    /// Scanner over an element table, carrying the calling thread's
    /// time-travel filter when one is enabled.
    pub(crate) fn element_scanner(&self, kind: ElementKind) -> Result<Box<dyn Scanner>> {
        let mut scanner = self.store.scanner(&self.config.element_table(kind))?;
        if let Some(window) = time_travel::current_window() {
            scanner.add_filter(window.filter());
        }
        Ok(scanner)
    }

    pub(crate) fn element_batch_scanner(&self, kind: ElementKind) -> Result<Box<dyn Scanner>> {
        Ok(self
            .store
            .batch_scanner(&self.config.element_table(kind), self.config.query_threads)?)
    }

    pub(crate) fn collect_cells(&self, scanner: Box<dyn Scanner>) -> Result<Vec<Cell>> {
        scanner
            .map(|entry| entry.map_err(GraphError::from))
            .collect()
    }

    pub fn flush(&self) -> Result<()> {
        self.writers.read().multi.flush()?;
        Ok(())
    }

    pub(crate) fn checked_flush(&self) -> Result<()> {
        if self.config.auto_flush {
            self.flush()
        } else {
            Ok(())
        }
    }

    /// Flush and close the writers and wipe both caches. The handle is
    /// unusable for mutations afterwards.
    pub fn shutdown(&self) -> Result<()> {
        {
            let writers = self.writers.read();
            writers.multi.flush()?;
            writers.multi.close()?;
        }
        self.clear_cache();
        info!(graph = %self.config.graph_name, "graph shut down");
        Ok(())
    }

    /// Drop every row of the graph: named-index tables are deleted, core
    /// tables deleted and recreated, writers rebuilt, caches wiped.
    pub fn clear(&self) -> Result<()> {
        let mut writers = self.writers.write();
        writers.multi.close()?;
        Self::drop_graph_tables(&*self.store, &self.config)?;
        let ops = self.store.table_ops();
        for table in self.config.core_tables() {
            ops.create_with_splits(&table, &self.config.splits)?;
        }
        *writers = WriterSet::new(&*self.store, &self.config)?;
        drop(writers);
        self.clear_cache();
        info!(graph = %self.config.graph_name, "graph cleared");
        Ok(())
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.vertex_cache {
            cache.clear();
        }
        if let Some(cache) = &self.edge_cache {
            cache.clear();
        }
    }

    /// Whether every table of the graph is devoid of cells.
    pub fn is_empty(&self) -> Result<bool> {
        for table in self.config.core_tables() {
            let mut scanner = self.scanner(&table)?;
            if let Some(entry) = scanner.next() {
                entry?;
                return Ok(false);
            }
        }
        Ok(true)
    }
}
