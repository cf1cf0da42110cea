//! Per-thread time-travel window. Enabling the filter affects element
//! scans issued from the same thread only; index and metadata scans and
//! all writes ignore it. The slot is process-wide per thread, shared by
//! every graph handle, matching the original engine's behavior.

use std::cell::Cell;

use crate::codec;
use crate::error::{GraphError, Result};
use crate::model::{ElementKind, PropertyValue};
use crate::schema;
use crate::storage::{Range, ScanFilter};

use super::CellGraph;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TimestampWindow {
    start: Option<u64>,
    end: Option<u64>,
}

impl TimestampWindow {
    pub(crate) fn filter(&self) -> ScanFilter {
        ScanFilter::TimestampRange {
            start: self.start,
            end: self.end,
        }
    }
}

thread_local! {
    static WINDOW: Cell<Option<TimestampWindow>> = const { Cell::new(None) };
}

pub(crate) fn current_window() -> Option<TimestampWindow> {
    WINDOW.with(|slot| slot.get())
}

impl CellGraph {
    /// Restrict every element scan on this thread to cells whose
    /// timestamps fall in the inclusive `[start, end]` window. Either
    /// bound may be open, not both.
    ///
    /// Delete tombstones suppress all older versions of a cell, so a
    /// point-in-time read from before a later deletion returns nothing.
    pub fn enable_timestamp_filter(&self, start: Option<u64>, end: Option<u64>) -> Result<()> {
        if start.is_none() && end.is_none() {
            return Err(GraphError::InvalidFilter("a start or an end is required"));
        }
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(GraphError::InvalidFilter("start must not exceed end"));
            }
        }
        WINDOW.with(|slot| slot.set(Some(TimestampWindow { start, end })));
        Ok(())
    }

    pub fn disable_timestamp_filter(&self) {
        WINDOW.with(|slot| slot.set(None));
    }

    /// Every retained `(timestamp, value)` version of one property, in
    /// store-returned order (newest first). Meaningful with a timestamp
    /// filter enabled; without one the store hands back only the newest
    /// version.
    pub fn versioned_property(
        &self,
        kind: ElementKind,
        id: &str,
        key: &str,
    ) -> Result<Vec<(u64, PropertyValue)>> {
        schema::validate_id(id)?;
        if key.trim().is_empty() {
            return Err(GraphError::EmptyKey);
        }
        let mut scanner = self.element_scanner(kind)?;
        scanner.set_range(Range::row(id));
        if key == "label" && kind == ElementKind::Edge {
            scanner.fetch_column_family(schema::FAMILY_LABEL);
        } else {
            scanner.fetch_column_family(key.as_bytes());
        }
        let mut versions = Vec::new();
        for entry in scanner {
            let cell = entry?;
            versions.push((cell.timestamp, codec::deserialize(&cell.value)?));
        }
        Ok(versions)
    }
}
