//! Contract for the sorted key-value store the graph runs on.
//!
//! Cell keys sort by `(row, family, qualifier, timestamp desc)`. The store
//! must offer single-range scanners, multi-range batch scanners, buffered
//! multi-table writers with an atomic flush, batch deleters and table
//! administration, plus the server-side filters the graph pushes down:
//! inclusive timestamp windows and full-match regexes over row, qualifier
//! and value. [`memory::MemoryStore`] is the in-process reference
//! implementation.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table {0:?} does not exist")]
    TableNotFound(String),
    #[error("table {0:?} already exists")]
    TableExists(String),
    #[error("invalid filter pattern: {0}")]
    BadPattern(String),
    #[error("writer is closed")]
    WriterClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: Vec<u8>,
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub timestamp: u64,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Range {
    Full,
    /// Every cell of one row.
    Row(Vec<u8>),
    /// Closed row interval, inclusive on both ends.
    Closed(Vec<u8>, Vec<u8>),
}

impl Range {
    pub fn row(row: impl Into<Vec<u8>>) -> Self {
        Range::Row(row.into())
    }

    pub fn contains(&self, row: &[u8]) -> bool {
        match self {
            Range::Full => true,
            Range::Row(r) => r.as_slice() == row,
            Range::Closed(start, end) => start.as_slice() <= row && row <= end.as_slice(),
        }
    }
}

/// Server-side filter attached to a scanner or deleter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFilter {
    /// Inclusive on both ends; `None` leaves that end open. When attached,
    /// the scanner returns every retained version inside the window
    /// (newest first) instead of only the newest version per cell.
    TimestampRange {
        start: Option<u64>,
        end: Option<u64>,
    },
    /// Full-match regexes over the cell's coordinates. Omitted components
    /// match anything.
    Regex {
        row: Option<String>,
        qualifier: Option<String>,
        value: Option<String>,
    },
}

impl ScanFilter {
    pub fn value_regex(pattern: impl Into<String>) -> Self {
        ScanFilter::Regex {
            row: None,
            qualifier: None,
            value: Some(pattern.into()),
        }
    }

    pub fn qualifier_regex(pattern: impl Into<String>) -> Self {
        ScanFilter::Regex {
            row: None,
            qualifier: Some(pattern.into()),
            value: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CellOp {
    Put {
        family: Vec<u8>,
        qualifier: Vec<u8>,
        timestamp: u64,
        value: Vec<u8>,
    },
    Delete {
        family: Vec<u8>,
        qualifier: Vec<u8>,
        timestamp: u64,
    },
}

/// A row-scoped batch of cell puts and deletes. Timestamp `0` lets the
/// store assign wall-clock time at write.
#[derive(Debug, Clone)]
pub struct Mutation {
    row: Vec<u8>,
    ops: Vec<CellOp>,
}

impl Mutation {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            ops: Vec::new(),
        }
    }

    pub fn put(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: u64,
        value: impl Into<Vec<u8>>,
    ) {
        self.ops.push(CellOp::Put {
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            value: value.into(),
        });
    }

    pub fn delete(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: u64,
    ) {
        self.ops.push(CellOp::Delete {
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
        });
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, Vec<CellOp>) {
        (self.row, self.ops)
    }
}

/// Configure, then iterate. Entries arrive in `(row, family, qualifier)`
/// order for single-range scanners; batch scanners give no cross-range
/// ordering guarantee. Dropping the scanner releases it.
pub trait Scanner: Iterator<Item = StoreResult<Cell>> {
    fn set_range(&mut self, range: Range);
    fn set_ranges(&mut self, ranges: Vec<Range>);
    fn fetch_column_family(&mut self, family: &[u8]);
    fn fetch_column(&mut self, family: &[u8], qualifier: &[u8]);
    fn add_filter(&mut self, filter: ScanFilter);
}

pub trait Writer: Send + Sync {
    fn add_mutation(&self, mutation: Mutation) -> StoreResult<()>;
}

/// Multiplexes buffered writers across tables. `flush` pushes everything
/// buffered so far atomically; `close` discards pending mutations.
pub trait MultiWriter: Send + Sync {
    fn writer(&self, table: &str) -> StoreResult<Arc<dyn Writer>>;
    fn flush(&self) -> StoreResult<()>;
    fn close(&self) -> StoreResult<()>;
}

/// Range delete with optional fetched column family and filters; `delete`
/// applies immediately.
pub trait BatchDeleter {
    fn set_ranges(&mut self, ranges: Vec<Range>);
    fn fetch_column_family(&mut self, family: &[u8]);
    fn add_filter(&mut self, filter: ScanFilter);
    fn delete(&mut self) -> StoreResult<()>;
}

pub trait TableOps {
    fn create(&self, table: &str) -> StoreResult<()>;
    fn create_with_splits(&self, table: &str, splits: &[Vec<u8>]) -> StoreResult<()>;
    fn delete(&self, table: &str) -> StoreResult<()>;
    fn exists(&self, table: &str) -> bool;
    fn list(&self) -> Vec<String>;
    /// `None` retains every version; tables default to unbounded retention.
    fn set_max_versions(&self, table: &str, versions: Option<usize>) -> StoreResult<()>;
}

pub trait SortedStore: Send + Sync {
    fn scanner(&self, table: &str) -> StoreResult<Box<dyn Scanner>>;
    fn batch_scanner(&self, table: &str, query_threads: usize) -> StoreResult<Box<dyn Scanner>>;
    fn multi_writer(&self, max_write_threads: usize) -> StoreResult<Box<dyn MultiWriter>>;
    fn batch_deleter(&self, table: &str, query_threads: usize)
        -> StoreResult<Box<dyn BatchDeleter>>;
    fn table_ops(&self) -> &dyn TableOps;
}
