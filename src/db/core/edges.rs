use tracing::debug;
use uuid::Uuid;

use crate::codec;
use crate::error::{GraphError, Result};
use crate::model::{Direction, Edge, Element, ElementKind, PropertyValue, Vertex};
use crate::schema;
use crate::storage::{Cell, Mutation, Range};

use super::CellGraph;

impl CellGraph {
    pub fn add_edge(
        &self,
        id: Option<&str>,
        out_vertex: &str,
        in_vertex: &str,
        label: &str,
    ) -> Result<Edge> {
        self.add_edge_at(id, out_vertex, in_vertex, label, 0)
    }

    /// Writes the edge's `L` cell and both endpoints' adjacency cells in
    /// one batch. Endpoint existence is never verified.
    pub fn add_edge_at(
        &self,
        id: Option<&str>,
        out_vertex: &str,
        in_vertex: &str,
        label: &str,
        timestamp: u64,
    ) -> Result<Edge> {
        schema::validate_label(label)?;
        schema::validate_id(out_vertex)?;
        schema::validate_id(in_vertex)?;
        let id = match id {
            Some(id) => {
                schema::validate_id(id)?;
                id.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };

        let mut mutation = Mutation::new(id.as_str());
        mutation.put(
            schema::FAMILY_LABEL,
            schema::endpoints_qualifier(in_vertex, out_vertex),
            timestamp,
            codec::serialize(&PropertyValue::String(label.to_string())),
        );
        self.edge_writer().add_mutation(mutation)?;

        let vertex_writer = self.vertex_writer();
        let mut mutation = Mutation::new(in_vertex);
        mutation.put(
            schema::FAMILY_IN_EDGE,
            schema::adjacency_qualifier(out_vertex, &id),
            timestamp,
            schema::adjacency_value(label),
        );
        vertex_writer.add_mutation(mutation)?;
        let mut mutation = Mutation::new(out_vertex);
        mutation.put(
            schema::FAMILY_OUT_EDGE,
            schema::adjacency_qualifier(in_vertex, &id),
            timestamp,
            schema::adjacency_value(label),
        );
        vertex_writer.add_mutation(mutation)?;
        self.checked_flush()?;

        let edge = Edge::resolved(&id, label, in_vertex, out_vertex);
        if let Some(cache) = &self.edge_cache {
            cache.cache(edge.clone());
        }
        debug!(id = %id, label = %label, "edge added");
        Ok(edge)
    }

    pub fn edge(&self, id: &str) -> Result<Option<Edge>> {
        schema::validate_id(id)?;
        if let Some(cache) = &self.edge_cache {
            if let Some(edge) = cache.retrieve(id) {
                return Ok(Some(edge));
            }
        }
        if self.config.skip_existence_checks {
            return Ok(Some(Edge::new(id)));
        }

        let mut scanner = self.element_scanner(ElementKind::Edge)?;
        scanner.set_range(Range::row(id));
        scanner.fetch_column_family(schema::FAMILY_LABEL);
        for key in &self.config.preloaded_properties {
            if key != "label" {
                scanner.fetch_column_family(key.as_bytes());
            }
        }
        let cells = self.collect_cells(scanner)?;
        if cells.is_empty() {
            return Ok(None);
        }

        let mut edge = Edge::new(id);
        self.load_edge_cells(&mut edge, &cells)?;
        if let Some(cache) = &self.edge_cache {
            cache.cache(edge.clone());
        }
        Ok(Some(edge))
    }

    pub fn remove_edge(&self, id: &str) -> Result<()> {
        self.remove_edge_at(id, 0)
    }

    pub fn remove_edge_at(&self, id: &str, timestamp: u64) -> Result<()> {
        schema::validate_id(id)?;
        if !self.config.indexable_disabled {
            self.clear_named_indices(id)?;
        }
        if let Some(cache) = &self.edge_cache {
            cache.remove(id);
        }

        let mut scanner = self.element_scanner(ElementKind::Edge)?;
        scanner.set_range(Range::row(id));
        let cells = self.collect_cells(scanner)?;

        let mut endpoints = None;
        let mut index_deletes = Vec::new();
        for cell in &cells {
            if cell.family == schema::FAMILY_LABEL {
                endpoints = Some(schema::split_endpoints_qualifier(&cell.qualifier)?);
            } else {
                let mut mutation = Mutation::new(cell.value.clone());
                mutation.delete(cell.family.clone(), cell.row.clone(), timestamp);
                index_deletes.push(mutation);
            }
        }
        let Some((in_vertex, out_vertex)) = endpoints else {
            debug!(id = %id, "edge has no endpoint cell, nothing to remove");
            return Ok(());
        };

        let index_writer = self.index_writer(ElementKind::Edge)?;
        for mutation in index_deletes {
            index_writer.add_mutation(mutation)?;
        }

        let vertex_writer = self.vertex_writer();
        let mut mutation = Mutation::new(in_vertex.as_str());
        mutation.delete(
            schema::FAMILY_IN_EDGE,
            schema::adjacency_qualifier(&out_vertex, id),
            timestamp,
        );
        vertex_writer.add_mutation(mutation)?;
        let mut mutation = Mutation::new(out_vertex.as_str());
        mutation.delete(
            schema::FAMILY_OUT_EDGE,
            schema::adjacency_qualifier(&in_vertex, id),
            timestamp,
        );
        vertex_writer.add_mutation(mutation)?;
        let mut mutation = Mutation::new(id);
        mutation.delete(
            schema::FAMILY_LABEL,
            schema::endpoints_qualifier(&in_vertex, &out_vertex),
            timestamp,
        );
        self.edge_writer().add_mutation(mutation)?;

        self.flush()?;

        let mut deleter = self
            .store
            .batch_deleter(&self.config.edge_table(), self.config.query_threads)?;
        deleter.set_ranges(vec![Range::row(id)]);
        deleter.delete()?;
        debug!(id = %id, "edge removed");
        Ok(())
    }

    /// Resolve one endpoint of an edge from its `L` cell.
    pub fn edge_vertex(&self, edge_id: &str, direction: Direction) -> Result<Option<Vertex>> {
        schema::validate_id(edge_id)?;
        if direction == Direction::Both {
            return Err(GraphError::InvalidArgument(
                "edge endpoint lookup needs In or Out".into(),
            ));
        }
        let mut scanner = self.element_scanner(ElementKind::Edge)?;
        scanner.set_range(Range::row(edge_id));
        scanner.fetch_column_family(schema::FAMILY_LABEL);
        let Some(entry) = scanner.next() else {
            return Ok(None);
        };
        let cell = entry?;
        let (in_vertex, out_vertex) = schema::split_endpoints_qualifier(&cell.qualifier)?;
        let id = match direction {
            Direction::In => in_vertex,
            _ => out_vertex,
        };
        let vertex = Vertex::new(&id);
        if let Some(cache) = &self.vertex_cache {
            cache.cache(vertex.clone());
        }
        Ok(Some(vertex))
    }

    /// Decode an edge row group: the `L` cell carries endpoints and
    /// label, the rest are property cells.
    pub(crate) fn load_edge_cells(&self, edge: &mut Edge, cells: &[Cell]) -> Result<()> {
        for cell in cells {
            if cell.family == schema::FAMILY_LABEL
                && cell.qualifier != schema::QUALIFIER_EXISTS
                && edge.label().is_none()
            {
                let (in_vertex, out_vertex) = schema::split_endpoints_qualifier(&cell.qualifier)?;
                edge.set_endpoints(in_vertex, out_vertex);
                edge.set_label(codec::deserialize_string(&cell.value)?);
            }
        }
        self.preload_properties(edge.bag_mut(), cells)
    }
}
