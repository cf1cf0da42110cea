use std::collections::BTreeSet;

use crate::codec;
use crate::error::{GraphError, Result};
use crate::model::{ElementKind, PropertyValue};
use crate::schema;
use crate::storage::{Mutation, Range};

use super::CellGraph;

impl CellGraph {
    pub fn set_property(
        &self,
        kind: ElementKind,
        id: &str,
        key: &str,
        value: &PropertyValue,
    ) -> Result<()> {
        self.set_property_at(kind, id, key, value, 0)
    }

    /// When the key is indexed for this kind, the old index cell is
    /// retired and a fresh one written before the primary put, which
    /// costs a round-trip for the old value. Create key indices after
    /// bulk ingest if that matters.
    pub fn set_property_at(
        &self,
        kind: ElementKind,
        id: &str,
        key: &str,
        value: &PropertyValue,
        timestamp: u64,
    ) -> Result<()> {
        schema::validate_property_key(key)?;
        schema::validate_id(id)?;
        let encoded = codec::serialize(value);

        if self.config.auto_index || self.indexed_keys(kind)?.contains(key) {
            let index_writer = self.index_writer(kind)?;
            if let Some(old) = self.stored_property(kind, id, key)? {
                let mut mutation = Mutation::new(codec::serialize(&old));
                mutation.delete(key, id, 0);
                index_writer.add_mutation(mutation)?;
            }
            let mut mutation = Mutation::new(encoded.clone());
            mutation.put(key, id, timestamp, schema::EMPTY);
            index_writer.add_mutation(mutation)?;
            self.checked_flush()?;
        }

        let mut mutation = Mutation::new(id);
        mutation.put(key, schema::EMPTY, timestamp, encoded);
        self.element_writer(kind).add_mutation(mutation)?;
        self.checked_flush()?;

        match self.config.property_ttl(key) {
            Some(ttl) => self.recache_property(kind, id, key, Some((value.clone(), ttl))),
            None => self.recache_property(kind, id, key, None),
        }
        Ok(())
    }

    pub fn property(&self, kind: ElementKind, id: &str, key: &str) -> Result<Option<PropertyValue>> {
        schema::validate_id(id)?;
        if key.trim().is_empty() {
            return Err(GraphError::EmptyKey);
        }
        if let Some(held) = self.cached_property(kind, id, key) {
            return Ok(Some(held));
        }
        let value = self.stored_property(kind, id, key)?;
        if let Some(found) = &value {
            if let Some(ttl) = self.config.property_ttl(key) {
                self.recache_property(kind, id, key, Some((found.clone(), ttl)));
            }
        }
        Ok(value)
    }

    pub fn remove_property(
        &self,
        kind: ElementKind,
        id: &str,
        key: &str,
    ) -> Result<Option<PropertyValue>> {
        schema::validate_property_key(key)?;
        schema::validate_id(id)?;
        let old = self.stored_property(kind, id, key)?;
        if let Some(old_value) = &old {
            let mut mutation = Mutation::new(id);
            mutation.delete(key, schema::EMPTY, 0);
            self.element_writer(kind).add_mutation(mutation)?;
            let mut mutation = Mutation::new(codec::serialize(old_value));
            mutation.delete(key, id, 0);
            self.index_writer(kind)?.add_mutation(mutation)?;
            self.checked_flush()?;
            self.recache_property(kind, id, key, None);
        }
        Ok(old)
    }

    /// Every property family present on the element's row; the schema's
    /// own families don't count.
    pub fn property_keys(&self, kind: ElementKind, id: &str) -> Result<BTreeSet<String>> {
        schema::validate_id(id)?;
        let mut scanner = self.element_scanner(kind)?;
        scanner.set_range(Range::row(id));
        let mut keys = BTreeSet::new();
        for entry in scanner {
            let cell = entry?;
            if cell.family == schema::FAMILY_LABEL
                || cell.family == schema::FAMILY_IN_EDGE
                || cell.family == schema::FAMILY_OUT_EDGE
            {
                continue;
            }
            keys.insert(
                std::str::from_utf8(&cell.family)
                    .map_err(|_| GraphError::Corruption("non-utf8 property family".into()))?
                    .to_string(),
            );
        }
        Ok(keys)
    }

    /// The stored value, bypassing element caches. Honors the caller's
    /// time-travel filter.
    pub(crate) fn stored_property(
        &self,
        kind: ElementKind,
        id: &str,
        key: &str,
    ) -> Result<Option<PropertyValue>> {
        let mut scanner = self.element_scanner(kind)?;
        scanner.set_range(Range::row(id));
        if key == "label" && kind == ElementKind::Edge {
            scanner.fetch_column_family(schema::FAMILY_LABEL);
        } else {
            scanner.fetch_column_family(key.as_bytes());
        }
        match scanner.next() {
            Some(entry) => Ok(Some(codec::deserialize(&entry?.value)?)),
            None => Ok(None),
        }
    }

    fn cached_property(&self, kind: ElementKind, id: &str, key: &str) -> Option<PropertyValue> {
        match kind {
            ElementKind::Vertex => self
                .vertex_cache
                .as_ref()?
                .retrieve(id)?
                .property(key)
                .cloned(),
            ElementKind::Edge => self
                .edge_cache
                .as_ref()?
                .retrieve(id)?
                .property(key)
                .cloned(),
        }
    }

    /// Coherence hook: update the touched property on a held element,
    /// leaving peers alone. `None` evicts the binding.
    pub(crate) fn recache_property(
        &self,
        kind: ElementKind,
        id: &str,
        key: &str,
        update: Option<(PropertyValue, std::time::Duration)>,
    ) {
        match kind {
            ElementKind::Vertex => {
                if let Some(cache) = &self.vertex_cache {
                    match update {
                        Some((value, ttl)) => cache.cache_property(id, key, value, Some(ttl)),
                        None => cache.remove_property(id, key),
                    }
                }
            }
            ElementKind::Edge => {
                if let Some(cache) = &self.edge_cache {
                    match update {
                        Some((value, ttl)) => cache.cache_property(id, key, value, Some(ttl)),
                        None => cache.remove_property(id, key),
                    }
                }
            }
        }
    }
}
