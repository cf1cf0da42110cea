use std::collections::HashSet;

use tracing::{debug, info};

use crate::codec;
use crate::error::{GraphError, Result};
use crate::model::{ElementKind, PropertyValue};
use crate::schema;
use crate::storage::{Mutation, Range, ScanFilter};

use super::CellGraph;

/// Descriptor for a caller-managed named index: a metadata row plus a
/// dedicated backing table. Population is entirely manual through the
/// `index_*` operations; element removal is the only automatic sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedIndex {
    name: String,
    kind: ElementKind,
    table: String,
}

impl NamedIndex {
    pub(crate) fn new(name: impl Into<String>, kind: ElementKind, table: String) -> Self {
        Self {
            name: name.into(),
            kind,
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub(crate) fn table(&self) -> &str {
        &self.table
    }
}

impl CellGraph {
    pub fn create_index(&self, name: &str, kind: ElementKind) -> Result<NamedIndex> {
        self.create_index_at(name, kind, 0)
    }

    pub fn create_index_at(&self, name: &str, kind: ElementKind, timestamp: u64) -> Result<NamedIndex> {
        self.ensure_indexable()?;
        if name.is_empty() {
            return Err(GraphError::InvalidArgument("index name may not be empty".into()));
        }
        let mut scanner = self.scanner(&self.config.metadata_table())?;
        scanner.set_range(Range::row(name));
        if let Some(entry) = scanner.next() {
            entry?;
            return Err(GraphError::IndexAlreadyExists(name.to_string()));
        }

        let writer = self.table_writer(&self.config.metadata_table())?;
        let mut mutation = Mutation::new(name);
        mutation.put(kind.family(), schema::EMPTY, timestamp, schema::EMPTY);
        writer.add_mutation(mutation)?;
        self.checked_flush()?;

        let table = self.config.named_index_table(name);
        if !self.store.table_ops().exists(&table) {
            self.store.table_ops().create(&table)?;
        }
        info!(index = %name, kind = %kind, "named index created");
        Ok(NamedIndex::new(name, kind, table))
    }

    /// `Ok(None)` when no such index exists; kind mismatch is an error.
    pub fn index(&self, name: &str, kind: ElementKind) -> Result<Option<NamedIndex>> {
        self.ensure_indexable()?;
        let mut scanner = self.scanner(&self.config.metadata_table())?;
        scanner.set_range(Range::row(name));
        match scanner.next() {
            Some(entry) => {
                let cell = entry?;
                if cell.family == kind.family() {
                    Ok(Some(NamedIndex::new(
                        name,
                        kind,
                        self.config.named_index_table(name),
                    )))
                } else {
                    Err(GraphError::IndexKindMismatch(name.to_string(), kind))
                }
            }
            None => Ok(None),
        }
    }

    pub fn indices(&self) -> Result<Vec<NamedIndex>> {
        self.ensure_indexable()?;
        self.indices_unchecked()
    }

    pub(crate) fn indices_unchecked(&self) -> Result<Vec<NamedIndex>> {
        let scanner = self.scanner(&self.config.metadata_table())?;
        let mut out = Vec::new();
        for entry in scanner {
            let cell = entry?;
            let name = std::str::from_utf8(&cell.row)
                .map_err(|_| GraphError::Corruption("non-utf8 index name".into()))?
                .to_string();
            let kind = if cell.family == ElementKind::Vertex.family() {
                ElementKind::Vertex
            } else {
                ElementKind::Edge
            };
            let table = self.config.named_index_table(&name);
            out.push(NamedIndex::new(name, kind, table));
        }
        Ok(out)
    }

    pub fn drop_index(&self, name: &str) -> Result<()> {
        self.ensure_indexable()?;
        let mut deleter = self
            .store
            .batch_deleter(&self.config.metadata_table(), self.config.query_threads)?;
        deleter.set_ranges(vec![Range::row(name)]);
        deleter.delete()?;
        self.store
            .table_ops()
            .delete(&self.config.named_index_table(name))?;
        info!(index = %name, "named index dropped");
        Ok(())
    }

    /// Remove every named-index cell referencing `element_id`, across all
    /// named indices, via a qualifier-suffix regex delete.
    pub(crate) fn clear_named_indices(&self, element_id: &str) -> Result<()> {
        for index in self.indices_unchecked()? {
            let mut deleter = self
                .store
                .batch_deleter(index.table(), self.config.max_write_threads)?;
            deleter.set_ranges(vec![Range::Full]);
            deleter.add_filter(ScanFilter::qualifier_regex(schema::element_id_pattern(
                element_id,
            )));
            deleter.delete()?;
        }
        Ok(())
    }

    pub fn index_put(
        &self,
        index: &NamedIndex,
        key: &str,
        value: &PropertyValue,
        element_id: &str,
    ) -> Result<()> {
        self.index_put_at(index, key, value, element_id, 0)
    }

    pub fn index_put_at(
        &self,
        index: &NamedIndex,
        key: &str,
        value: &PropertyValue,
        element_id: &str,
        timestamp: u64,
    ) -> Result<()> {
        if key.trim().is_empty() {
            return Err(GraphError::EmptyKey);
        }
        schema::validate_id(element_id)?;
        let writer = self.table_writer(index.table())?;
        let mut mutation = Mutation::new(codec::serialize(value));
        mutation.put(key, element_id, timestamp, schema::EMPTY);
        writer.add_mutation(mutation)?;
        self.checked_flush()
    }

    /// Element ids bound to `(key, value)`, in qualifier order.
    pub fn index_get(&self, index: &NamedIndex, key: &str, value: &PropertyValue) -> Result<Vec<String>> {
        let mut scanner = self.scanner(index.table())?;
        scanner.set_range(Range::Row(codec::serialize(value)));
        scanner.fetch_column_family(key.as_bytes());
        let mut ids = Vec::new();
        for entry in scanner {
            let cell = entry?;
            ids.push(
                std::str::from_utf8(&cell.qualifier)
                    .map_err(|_| GraphError::Corruption("non-utf8 element id".into()))?
                    .to_string(),
            );
        }
        Ok(ids)
    }

    pub fn index_count(&self, index: &NamedIndex, key: &str, value: &PropertyValue) -> Result<usize> {
        Ok(self.index_get(index, key, value)?.len())
    }

    pub fn index_remove(
        &self,
        index: &NamedIndex,
        key: &str,
        value: &PropertyValue,
        element_id: &str,
    ) -> Result<()> {
        let writer = self.table_writer(index.table())?;
        let mut mutation = Mutation::new(codec::serialize(value));
        mutation.delete(key, element_id, 0);
        writer.add_mutation(mutation)?;
        self.checked_flush()
    }

    pub fn create_key_index(&self, key: &str, kind: ElementKind) -> Result<()> {
        self.create_key_index_at(key, kind, 0)
    }

    /// Registers the key, then re-indexes the whole kind table so rows
    /// written before registration become visible to the fast path.
    pub fn create_key_index_at(&self, key: &str, kind: ElementKind, timestamp: u64) -> Result<()> {
        schema::validate_property_key(key)?;
        let writer = self.table_writer(&self.config.key_metadata_table())?;
        let mut mutation = Mutation::new(key);
        mutation.put(kind.family(), schema::EMPTY, timestamp, schema::EMPTY);
        writer.add_mutation(mutation)?;
        self.checked_flush()?;

        let mut scanner = self.element_batch_scanner(kind)?;
        scanner.set_ranges(vec![Range::Full]);
        scanner.fetch_column_family(key.as_bytes());
        let index_writer = self.index_writer(kind)?;
        let mut reindexed = 0usize;
        for entry in scanner {
            let cell = entry?;
            let mut mutation = Mutation::new(cell.value);
            mutation.put(cell.family, cell.row, timestamp, schema::EMPTY);
            index_writer.add_mutation(mutation)?;
            reindexed += 1;
        }
        self.flush()?;
        debug!(key = %key, kind = %kind, reindexed, "key index created");
        Ok(())
    }

    /// Unregisters the key and range-deletes its column across the whole
    /// index table.
    pub fn drop_key_index(&self, key: &str, kind: ElementKind) -> Result<()> {
        schema::validate_property_key(key)?;
        let writer = self.table_writer(&self.config.key_metadata_table())?;
        let mut mutation = Mutation::new(key);
        mutation.delete(kind.family(), schema::EMPTY, 0);
        writer.add_mutation(mutation)?;

        let mut deleter = self
            .store
            .batch_deleter(&self.config.index_table(kind), self.config.max_write_threads)?;
        deleter.set_ranges(vec![Range::Full]);
        deleter.fetch_column_family(key.as_bytes());
        deleter.delete()?;
        self.checked_flush()?;
        debug!(key = %key, kind = %kind, "key index dropped");
        Ok(())
    }

    pub fn indexed_keys(&self, kind: ElementKind) -> Result<HashSet<String>> {
        let mut scanner = self.scanner(&self.config.key_metadata_table())?;
        scanner.fetch_column_family(kind.family());
        let mut keys = HashSet::new();
        for entry in scanner {
            let cell = entry?;
            keys.insert(
                std::str::from_utf8(&cell.row)
                    .map_err(|_| GraphError::Corruption("non-utf8 key name".into()))?
                    .to_string(),
            );
        }
        Ok(keys)
    }

    fn ensure_indexable(&self) -> Result<()> {
        if self.config.indexable_disabled {
            return Err(GraphError::IndexingDisabled);
        }
        Ok(())
    }
}
