use tracing::debug;
use uuid::Uuid;

use crate::codec;
use crate::error::{GraphError, Result};
use crate::model::{Element, ElementKind, PropertyBag, Vertex};
use crate::schema;
use crate::storage::{Cell, Mutation, Range, ScanFilter};

use super::CellGraph;

impl CellGraph {
    pub fn add_vertex(&self, id: Option<&str>) -> Result<Vertex> {
        self.add_vertex_at(id, 0)
    }

    /// `timestamp > 0` stamps the existence cell; `0` lets the store
    /// assign wall-clock time.
    pub fn add_vertex_at(&self, id: Option<&str>, timestamp: u64) -> Result<Vertex> {
        let id = match id {
            Some(id) => {
                schema::validate_id(id)?;
                id.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        if !self.config.skip_existence_checks && self.vertex(&id)?.is_some() {
            return Err(GraphError::DuplicateId(id));
        }

        let mut mutation = Mutation::new(id.as_str());
        mutation.put(
            schema::FAMILY_LABEL,
            schema::QUALIFIER_EXISTS,
            timestamp,
            schema::EMPTY,
        );
        self.vertex_writer().add_mutation(mutation)?;
        self.checked_flush()?;

        let vertex = Vertex::new(&id);
        if let Some(cache) = &self.vertex_cache {
            cache.cache(vertex.clone());
        }
        debug!(id = %id, "vertex added");
        Ok(vertex)
    }

    /// `None` when no existence cell is visible. With existence checks
    /// disabled this returns a lazy handle without touching the store.
    pub fn vertex(&self, id: &str) -> Result<Option<Vertex>> {
        schema::validate_id(id)?;
        if let Some(cache) = &self.vertex_cache {
            if let Some(vertex) = cache.retrieve(id) {
                return Ok(Some(vertex));
            }
        }
        if self.config.skip_existence_checks {
            return Ok(Some(Vertex::new(id)));
        }

        let mut scanner = self.element_scanner(ElementKind::Vertex)?;
        scanner.set_range(Range::row(id));
        scanner.fetch_column(schema::FAMILY_LABEL, schema::QUALIFIER_EXISTS);
        for key in &self.config.preloaded_properties {
            if key != "label" {
                scanner.fetch_column_family(key.as_bytes());
            }
        }
        let cells = self.collect_cells(scanner)?;
        if cells.is_empty() {
            return Ok(None);
        }

        let mut vertex = Vertex::new(id);
        self.preload_properties(vertex.bag_mut(), &cells)?;
        if let Some(cache) = &self.vertex_cache {
            cache.cache(vertex.clone());
        }
        self.prime_preloaded_edges(id)?;
        Ok(Some(vertex))
    }

    pub fn remove_vertex(&self, id: &str) -> Result<()> {
        self.remove_vertex_at(id, 0)
    }

    /// Cascades: incident edges are deleted wholesale, the peers'
    /// inverted adjacency cells are removed, and index cells referencing
    /// the vertex (and, unless configured off, its removed edges) are
    /// dropped.
    pub fn remove_vertex_at(&self, id: &str, timestamp: u64) -> Result<()> {
        schema::validate_id(id)?;
        if let Some(cache) = &self.vertex_cache {
            cache.remove(id);
        }
        if !self.config.indexable_disabled {
            self.clear_named_indices(id)?;
        }

        let mut scanner = self.element_scanner(ElementKind::Vertex)?;
        scanner.set_range(Range::row(id));
        let cells = self.collect_cells(scanner)?;
        if cells.is_empty() {
            return Err(GraphError::NotFound(id.to_string()));
        }

        let vertex_writer = self.vertex_writer();
        let index_writer = self.index_writer(ElementKind::Vertex)?;
        let mut edge_rows = Vec::new();
        let mut edge_ids = Vec::new();
        for cell in &cells {
            if cell.family == schema::FAMILY_IN_EDGE || cell.family == schema::FAMILY_OUT_EDGE {
                let (_, edge_id) = schema::split_adjacency_qualifier(&cell.qualifier)?;
                self.stage_peer_adjacency_delete(&vertex_writer, id, cell, &edge_id, timestamp)?;
                edge_rows.push(Range::row(edge_id.as_str()));
                edge_ids.push(edge_id);
            } else if cell.family == schema::FAMILY_LABEL {
                continue;
            } else {
                let mut mutation = Mutation::new(cell.value.clone());
                mutation.delete(cell.family.clone(), cell.row.clone(), timestamp);
                index_writer.add_mutation(mutation)?;
            }
        }

        if let Some(cache) = &self.edge_cache {
            for edge_id in &edge_ids {
                cache.remove(edge_id);
            }
        }
        if self.config.sweep_edge_key_index && !edge_ids.is_empty() {
            self.sweep_edge_index_cells(&edge_ids, timestamp)?;
        }

        self.flush()?;

        if !edge_rows.is_empty() {
            let mut deleter = self
                .store
                .batch_deleter(&self.config.edge_table(), self.config.query_threads)?;
            deleter.set_ranges(edge_rows);
            deleter.delete()?;
        }
        let mut deleter = self
            .store
            .batch_deleter(&self.config.vertex_table(), self.config.query_threads)?;
        deleter.set_ranges(vec![Range::row(id)]);
        deleter.delete()?;
        debug!(id = %id, edges = edge_ids.len(), "vertex removed");
        Ok(())
    }

    /// The peer vertex holds the mirror of this adjacency cell under the
    /// inverted family, qualified by `<this vertex>_<edge>`.
    fn stage_peer_adjacency_delete(
        &self,
        writer: &std::sync::Arc<dyn crate::storage::Writer>,
        id: &str,
        cell: &Cell,
        edge_id: &str,
        timestamp: u64,
    ) -> Result<()> {
        let (other, _) = schema::split_adjacency_qualifier(&cell.qualifier)?;
        let inverted: &[u8] = if cell.family == schema::FAMILY_IN_EDGE {
            schema::FAMILY_OUT_EDGE
        } else {
            schema::FAMILY_IN_EDGE
        };
        let mut mutation = Mutation::new(other.as_str());
        mutation.delete(
            inverted,
            schema::adjacency_qualifier(id, edge_id),
            timestamp,
        );
        writer.add_mutation(mutation)?;
        Ok(())
    }

    /// Key-index cells of edges about to be cascade-removed. The original
    /// engine leaked these; `sweep_edge_key_index = false` restores that.
    fn sweep_edge_index_cells(&self, edge_ids: &[String], timestamp: u64) -> Result<()> {
        let index_writer = self.index_writer(ElementKind::Edge)?;
        for edge_id in edge_ids {
            let mut scanner = self.scanner(&self.config.edge_table())?;
            scanner.set_range(Range::row(edge_id.as_str()));
            for entry in scanner {
                let cell = entry?;
                if cell.family == schema::FAMILY_LABEL {
                    continue;
                }
                let mut mutation = Mutation::new(cell.value.clone());
                mutation.delete(cell.family, cell.row, timestamp);
                index_writer.add_mutation(mutation)?;
            }
        }
        Ok(())
    }

    /// Decode property cells into a bag, newest version first per key.
    /// Cells in the schema's own families are skipped here; edge `L`
    /// cells are handled by the edge loader.
    pub(crate) fn preload_properties(&self, bag: &mut PropertyBag, cells: &[Cell]) -> Result<()> {
        for cell in cells {
            if cell.family == schema::FAMILY_LABEL
                || cell.family == schema::FAMILY_IN_EDGE
                || cell.family == schema::FAMILY_OUT_EDGE
            {
                continue;
            }
            let key = std::str::from_utf8(&cell.family)
                .map_err(|_| GraphError::Corruption("non-utf8 property family".into()))?;
            if let Some(ttl) = self.config.property_ttl(key) {
                let value = codec::deserialize(&cell.value)?;
                bag.insert_if_absent(key, value, Some(ttl));
            }
        }
        Ok(())
    }

    /// Prime the edge cache with incident edges for the configured
    /// preloaded labels.
    fn prime_preloaded_edges(&self, id: &str) -> Result<()> {
        let Some(cache) = &self.edge_cache else {
            return Ok(());
        };
        if self.config.preloaded_edge_labels.is_empty() {
            return Ok(());
        }
        let labels: Vec<&str> = self
            .config
            .preloaded_edge_labels
            .iter()
            .map(String::as_str)
            .collect();
        let mut scanner = self.element_scanner(ElementKind::Vertex)?;
        scanner.set_range(Range::row(id));
        scanner.fetch_column_family(schema::FAMILY_IN_EDGE);
        scanner.fetch_column_family(schema::FAMILY_OUT_EDGE);
        scanner.add_filter(ScanFilter::value_regex(schema::label_filter_pattern(
            &labels,
        )));
        for entry in scanner {
            let cell = entry?;
            let (other, edge_id) = schema::split_adjacency_qualifier(&cell.qualifier)?;
            let label = schema::adjacency_label(&cell.value)?;
            let edge = if cell.family == schema::FAMILY_IN_EDGE {
                crate::model::Edge::resolved(&edge_id, &label, id, &other)
            } else {
                crate::model::Edge::resolved(&edge_id, &label, &other, id)
            };
            cache.cache(edge);
        }
        Ok(())
    }
}
