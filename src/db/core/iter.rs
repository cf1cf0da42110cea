//! Scan-driven iterators. Full-table iterators group contiguous cells by
//! row and rebuild one element per group; adjacency and index lookups map
//! single cells to elements. Scanners are dropped with the iterator.

use crate::codec;
use crate::error::{GraphError, Result};
use crate::model::{Direction, Edge, Element, ElementKind, PropertyValue, Vertex};
use crate::schema;
use crate::storage::{Cell, Range, ScanFilter, Scanner, StoreResult};

use super::CellGraph;

fn row_id(cell: &Cell) -> Result<String> {
    String::from_utf8(cell.row.clone())
        .map_err(|_| GraphError::Corruption("non-utf8 element id".into()))
}

fn qualifier_id(cell: &Cell) -> Result<String> {
    String::from_utf8(cell.qualifier.clone())
        .map_err(|_| GraphError::Corruption("non-utf8 element id".into()))
}

/// Groups a sorted scan into per-row cell bundles.
pub(crate) struct RowGroups {
    scanner: Box<dyn Scanner>,
    pending: Option<Cell>,
}

impl RowGroups {
    pub(crate) fn new(scanner: Box<dyn Scanner>) -> Self {
        Self {
            scanner,
            pending: None,
        }
    }

    fn next_group(&mut self) -> Option<Result<Vec<Cell>>> {
        let first = match self.pending.take() {
            Some(cell) => cell,
            None => match self.scanner.next()? {
                Ok(cell) => cell,
                Err(e) => return Some(Err(e.into())),
            },
        };
        let mut group = vec![first];
        for entry in self.scanner.by_ref() {
            match entry {
                Ok(cell) if cell.row == group[0].row => group.push(cell),
                Ok(cell) => {
                    self.pending = Some(cell);
                    break;
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
        Some(Ok(group))
    }
}

pub struct VertexIter<'g> {
    graph: &'g CellGraph,
    groups: RowGroups,
}

impl Iterator for VertexIter<'_> {
    type Item = Result<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        let cells = match self.groups.next_group()? {
            Ok(cells) => cells,
            Err(e) => return Some(Err(e)),
        };
        Some(self.build(&cells))
    }
}

impl VertexIter<'_> {
    fn build(&self, cells: &[Cell]) -> Result<Vertex> {
        let mut vertex = Vertex::new(row_id(&cells[0])?);
        self.graph.preload_properties(vertex.bag_mut(), cells)?;
        if let Some(cache) = &self.graph.vertex_cache {
            cache.cache(vertex.clone());
        }
        Ok(vertex)
    }
}

pub struct EdgeIter<'g> {
    graph: &'g CellGraph,
    groups: RowGroups,
}

impl Iterator for EdgeIter<'_> {
    type Item = Result<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        let cells = match self.groups.next_group()? {
            Ok(cells) => cells,
            Err(e) => return Some(Err(e)),
        };
        Some(self.build(&cells))
    }
}

impl EdgeIter<'_> {
    fn build(&self, cells: &[Cell]) -> Result<Edge> {
        let mut edge = Edge::new(row_id(&cells[0])?);
        self.graph.load_edge_cells(&mut edge, cells)?;
        if let Some(cache) = &self.graph.edge_cache {
            cache.cache(edge.clone());
        }
        Ok(edge)
    }
}

/// Incident edges of one vertex, rebuilt from its adjacency cells. The
/// scanned row supplies one endpoint, the qualifier the other; the cell's
/// family decides which is which.
pub struct AdjacentEdges<'g> {
    graph: &'g CellGraph,
    vertex_id: String,
    scanner: Box<dyn Scanner>,
}

impl Iterator for AdjacentEdges<'_> {
    type Item = Result<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.scanner.next()?;
        Some(self.build(entry))
    }
}

impl AdjacentEdges<'_> {
    fn build(&self, entry: StoreResult<Cell>) -> Result<Edge> {
        let cell = entry?;
        let (other, edge_id) = schema::split_adjacency_qualifier(&cell.qualifier)?;
        let label = schema::adjacency_label(&cell.value)?;
        let edge = if cell.family == schema::FAMILY_IN_EDGE {
            Edge::resolved(edge_id, label, self.vertex_id.as_str(), other.as_str())
        } else {
            Edge::resolved(edge_id, label, other.as_str(), self.vertex_id.as_str())
        };
        if let Some(cache) = &self.graph.edge_cache {
            cache.cache(edge.clone());
        }
        Ok(edge)
    }
}

/// Peer vertices across one vertex's adjacency cells.
pub struct AdjacentVertices<'g> {
    graph: &'g CellGraph,
    scanner: Box<dyn Scanner>,
}

impl Iterator for AdjacentVertices<'_> {
    type Item = Result<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.scanner.next()?;
        Some(self.build(entry))
    }
}

impl AdjacentVertices<'_> {
    fn build(&self, entry: StoreResult<Cell>) -> Result<Vertex> {
        let cell = entry?;
        let (other, _) = schema::split_adjacency_qualifier(&cell.qualifier)?;
        let vertex = Vertex::new(other);
        if let Some(cache) = &self.graph.vertex_cache {
            cache.cache(vertex.clone());
        }
        Ok(vertex)
    }
}

enum LookupMode {
    /// Index-table scan: element id in the qualifier, value in the row.
    Index,
    /// Primary-table scan: element id in the row, value in the cell.
    Scan,
}

pub struct VertexPropertyLookup<'g> {
    graph: &'g CellGraph,
    scanner: Box<dyn Scanner>,
    mode: LookupMode,
    key: String,
}

impl Iterator for VertexPropertyLookup<'_> {
    type Item = Result<Vertex>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.scanner.next()?;
        Some(self.build(entry))
    }
}

impl VertexPropertyLookup<'_> {
    fn build(&self, entry: StoreResult<Cell>) -> Result<Vertex> {
        let cell = entry?;
        let (id, encoded) = match self.mode {
            LookupMode::Index => (qualifier_id(&cell)?, cell.row.as_slice()),
            LookupMode::Scan => (row_id(&cell)?, cell.value.as_slice()),
        };
        let mut vertex = match &self.graph.vertex_cache {
            Some(cache) => cache.retrieve(&id).unwrap_or_else(|| Vertex::new(&id)),
            None => Vertex::new(&id),
        };
        if let Some(ttl) = self.graph.config.property_ttl(&self.key) {
            vertex
                .bag_mut()
                .insert(&self.key, codec::deserialize(encoded)?, Some(ttl));
        }
        if let Some(cache) = &self.graph.vertex_cache {
            cache.cache(vertex.clone());
        }
        Ok(vertex)
    }
}

pub struct EdgePropertyLookup<'g> {
    graph: &'g CellGraph,
    scanner: Box<dyn Scanner>,
    mode: LookupMode,
    key: String,
}

impl Iterator for EdgePropertyLookup<'_> {
    type Item = Result<Edge>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.scanner.next()?;
        Some(self.build(entry))
    }
}

impl EdgePropertyLookup<'_> {
    fn build(&self, entry: StoreResult<Cell>) -> Result<Edge> {
        let cell = entry?;
        if matches!(self.mode, LookupMode::Scan) && cell.family == schema::FAMILY_LABEL {
            let (in_vertex, out_vertex) = schema::split_endpoints_qualifier(&cell.qualifier)?;
            let label = codec::deserialize_string(&cell.value)?;
            return Ok(Edge::resolved(row_id(&cell)?, label, in_vertex, out_vertex));
        }
        let (id, encoded) = match self.mode {
            LookupMode::Index => (qualifier_id(&cell)?, cell.row.as_slice()),
            LookupMode::Scan => (row_id(&cell)?, cell.value.as_slice()),
        };
        let mut edge = match &self.graph.edge_cache {
            Some(cache) => cache.retrieve(&id).unwrap_or_else(|| Edge::new(&id)),
            None => Edge::new(&id),
        };
        if let Some(ttl) = self.graph.config.property_ttl(&self.key) {
            edge.bag_mut()
                .insert(&self.key, codec::deserialize(encoded)?, Some(ttl));
        }
        if let Some(cache) = &self.graph.edge_cache {
            cache.cache(edge.clone());
        }
        Ok(edge)
    }
}

impl CellGraph {
    /// Every vertex, existence cells plus preloaded property families.
    pub fn vertices(&self) -> Result<VertexIter<'_>> {
        let mut scanner = self.element_scanner(ElementKind::Vertex)?;
        scanner.fetch_column_family(schema::FAMILY_LABEL);
        for key in &self.config.preloaded_properties {
            scanner.fetch_column_family(key.as_bytes());
        }
        Ok(VertexIter {
            graph: self,
            groups: RowGroups::new(scanner),
        })
    }

    pub fn edges(&self) -> Result<EdgeIter<'_>> {
        let mut scanner = self.element_batch_scanner(ElementKind::Edge)?;
        scanner.set_ranges(vec![Range::Full]);
        scanner.fetch_column_family(schema::FAMILY_LABEL);
        for key in &self.config.preloaded_properties {
            scanner.fetch_column_family(key.as_bytes());
        }
        Ok(EdgeIter {
            graph: self,
            groups: RowGroups::new(scanner),
        })
    }

    /// Vertices bound to `(key, value)`: the index table when the key is
    /// indexed, otherwise a batch scan with a literal value filter.
    /// Opaque-tagged values cannot take the filter path.
    pub fn vertices_by_property(
        &self,
        key: &str,
        value: &PropertyValue,
    ) -> Result<VertexPropertyLookup<'_>> {
        schema::validate_property_key(key)?;
        let encoded = codec::serialize(value);
        if self.config.auto_index || self.indexed_keys(ElementKind::Vertex)?.contains(key) {
            let mut scanner = self.scanner(&self.config.vertex_index_table())?;
            scanner.set_range(Range::Row(encoded));
            scanner.fetch_column_family(key.as_bytes());
            return Ok(VertexPropertyLookup {
                graph: self,
                scanner,
                mode: LookupMode::Index,
                key: key.to_string(),
            });
        }
        if !codec::is_regex_safe(&encoded) {
            return Err(GraphError::UnsupportedFilter);
        }
        let mut scanner = self.element_batch_scanner(ElementKind::Vertex)?;
        scanner.set_ranges(vec![Range::Full]);
        scanner.fetch_column_family(key.as_bytes());
        scanner.add_filter(ScanFilter::value_regex(schema::encoded_value_pattern(
            &encoded,
        )?));
        Ok(VertexPropertyLookup {
            graph: self,
            scanner,
            mode: LookupMode::Scan,
            key: key.to_string(),
        })
    }

    pub fn edges_by_property(
        &self,
        key: &str,
        value: &PropertyValue,
    ) -> Result<EdgePropertyLookup<'_>> {
        if key.trim().is_empty() {
            return Err(GraphError::EmptyKey);
        }
        let key = if key.eq_ignore_ascii_case("label") {
            "L"
        } else {
            key
        };
        let encoded = codec::serialize(value);
        if self.config.auto_index || self.indexed_keys(ElementKind::Edge)?.contains(key) {
            let mut scanner = self.scanner(&self.config.edge_index_table())?;
            scanner.set_range(Range::Row(encoded));
            scanner.fetch_column_family(key.as_bytes());
            return Ok(EdgePropertyLookup {
                graph: self,
                scanner,
                mode: LookupMode::Index,
                key: key.to_string(),
            });
        }
        if !codec::is_regex_safe(&encoded) {
            return Err(GraphError::UnsupportedFilter);
        }
        let mut scanner = self.element_batch_scanner(ElementKind::Edge)?;
        scanner.set_ranges(vec![Range::Full]);
        scanner.fetch_column_family(key.as_bytes());
        scanner.add_filter(ScanFilter::value_regex(schema::encoded_value_pattern(
            &encoded,
        )?));
        Ok(EdgePropertyLookup {
            graph: self,
            scanner,
            mode: LookupMode::Scan,
            key: key.to_string(),
        })
    }

    /// Incident edges of one vertex, optionally restricted by direction
    /// and label set. Label restriction is pushed down as a value-regex
    /// over the adjacency cells.
    pub fn incident_edges(
        &self,
        vertex_id: &str,
        direction: Direction,
        labels: &[&str],
    ) -> Result<AdjacentEdges<'_>> {
        let scanner = self.adjacency_scanner(vertex_id, direction, labels)?;
        Ok(AdjacentEdges {
            graph: self,
            vertex_id: vertex_id.to_string(),
            scanner,
        })
    }

    /// Peer vertices reachable over matching adjacency cells.
    pub fn adjacent_vertices(
        &self,
        vertex_id: &str,
        direction: Direction,
        labels: &[&str],
    ) -> Result<AdjacentVertices<'_>> {
        let scanner = self.adjacency_scanner(vertex_id, direction, labels)?;
        Ok(AdjacentVertices {
            graph: self,
            scanner,
        })
    }

    fn adjacency_scanner(
        &self,
        vertex_id: &str,
        direction: Direction,
        labels: &[&str],
    ) -> Result<Box<dyn Scanner>> {
        schema::validate_id(vertex_id)?;
        for label in labels {
            schema::validate_label(label)?;
        }
        let mut scanner = self.element_scanner(ElementKind::Vertex)?;
        scanner.set_range(Range::row(vertex_id));
        match direction {
            Direction::In => scanner.fetch_column_family(schema::FAMILY_IN_EDGE),
            Direction::Out => scanner.fetch_column_family(schema::FAMILY_OUT_EDGE),
            Direction::Both => {
                scanner.fetch_column_family(schema::FAMILY_IN_EDGE);
                scanner.fetch_column_family(schema::FAMILY_OUT_EDGE);
            }
        }
        if !labels.is_empty() {
            scanner.add_filter(ScanFilter::value_regex(schema::label_filter_pattern(labels)));
        }
        Ok(scanner)
    }
}
