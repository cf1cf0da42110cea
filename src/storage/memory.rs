//! In-process reference implementation of the store contract: sorted
//! tables with per-cell version chains, delete tombstones and server-side
//! filter evaluation. Backs the test suite and doubles as an embedded
//! backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, RwLock};
use regex::bytes::Regex;

use super::{
    BatchDeleter, Cell, CellOp, MultiWriter, Mutation, Range, ScanFilter, Scanner, SortedStore,
    StoreError, StoreResult, TableOps, Writer,
};

#[derive(Default)]
struct Table {
    cells: BTreeMap<CellKey, VersionChain>,
    max_versions: Option<usize>,
    splits: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CellKey {
    row: Vec<u8>,
    family: Vec<u8>,
    qualifier: Vec<u8>,
}

/// Versions newest-first. A tombstone at `t` suppresses every version with
/// timestamp `<= t`, whatever filter a later scan attaches.
#[derive(Debug, Default)]
struct VersionChain {
    versions: Vec<(u64, Vec<u8>)>,
    delete_ts: Option<u64>,
}

impl VersionChain {
    fn put(&mut self, timestamp: u64, value: Vec<u8>) {
        let at = self
            .versions
            .iter()
            .position(|(ts, _)| *ts <= timestamp)
            .unwrap_or(self.versions.len());
        self.versions.insert(at, (timestamp, value));
    }

    fn tombstone(&mut self, timestamp: u64) {
        self.delete_ts = Some(self.delete_ts.map_or(timestamp, |d| d.max(timestamp)));
    }

    fn live(&self, max_versions: Option<usize>) -> impl Iterator<Item = &(u64, Vec<u8>)> {
        let cutoff = self.delete_ts;
        self.versions
            .iter()
            .filter(move |(ts, _)| cutoff.map_or(true, |d| *ts > d))
            .take(max_versions.unwrap_or(usize::MAX))
    }
}

struct StoreInner {
    tables: RwLock<BTreeMap<String, Table>>,
    clock: Mutex<u64>,
}

impl StoreInner {
    /// Store-assigned timestamps: wall-clock millis, strictly increasing.
    fn assign_ts(&self) -> u64 {
        let mut last = self.clock.lock();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        *last = now.max(*last + 1);
        *last
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tables: RwLock::new(BTreeMap::new()),
                clock: Mutex::new(0),
            }),
        }
    }
}

impl SortedStore for MemoryStore {
    fn scanner(&self, table: &str) -> StoreResult<Box<dyn Scanner>> {
        if !self.exists(table) {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        Ok(Box::new(MemScanner::new(self.inner.clone(), table)))
    }

    fn batch_scanner(&self, table: &str, _query_threads: usize) -> StoreResult<Box<dyn Scanner>> {
        self.scanner(table)
    }

    fn multi_writer(&self, _max_write_threads: usize) -> StoreResult<Box<dyn MultiWriter>> {
        Ok(Box::new(MemMultiWriter {
            inner: self.inner.clone(),
            shared: Arc::new(WriterShared {
                buffer: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }))
    }

    fn batch_deleter(
        &self,
        table: &str,
        _query_threads: usize,
    ) -> StoreResult<Box<dyn BatchDeleter>> {
        if !self.exists(table) {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        Ok(Box::new(MemBatchDeleter {
            inner: self.inner.clone(),
            table: table.to_string(),
            ranges: Vec::new(),
            family: None,
            filters: Vec::new(),
        }))
    }

    fn table_ops(&self) -> &dyn TableOps {
        self
    }
}

impl TableOps for MemoryStore {
    fn create(&self, table: &str) -> StoreResult<()> {
        self.create_with_splits(table, &[])
    }

    fn create_with_splits(&self, table: &str, splits: &[Vec<u8>]) -> StoreResult<()> {
        let mut tables = self.inner.tables.write();
        if tables.contains_key(table) {
            return Err(StoreError::TableExists(table.to_string()));
        }
        tables.insert(
            table.to_string(),
            Table {
                splits: splits.to_vec(),
                ..Table::default()
            },
        );
        Ok(())
    }

    fn delete(&self, table: &str) -> StoreResult<()> {
        self.inner
            .tables
            .write()
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn exists(&self, table: &str) -> bool {
        self.inner.tables.read().contains_key(table)
    }

    fn list(&self) -> Vec<String> {
        self.inner.tables.read().keys().cloned().collect()
    }

    fn set_max_versions(&self, table: &str, versions: Option<usize>) -> StoreResult<()> {
        let mut tables = self.inner.tables.write();
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        entry.max_versions = versions;
        Ok(())
    }
}

struct CompiledFilters {
    ts_start: Option<u64>,
    ts_end: Option<u64>,
    ts_attached: bool,
    row: Option<Regex>,
    qualifier: Option<Regex>,
    value: Option<Regex>,
}

impl CompiledFilters {
    fn compile(filters: &[ScanFilter]) -> StoreResult<Self> {
        let mut out = CompiledFilters {
            ts_start: None,
            ts_end: None,
            ts_attached: false,
            row: None,
            qualifier: None,
            value: None,
        };
        for filter in filters {
            match filter {
                ScanFilter::TimestampRange { start, end } => {
                    out.ts_attached = true;
                    if let Some(s) = start {
                        out.ts_start = Some(out.ts_start.map_or(*s, |prev: u64| prev.max(*s)));
                    }
                    if let Some(e) = end {
                        out.ts_end = Some(out.ts_end.map_or(*e, |prev: u64| prev.min(*e)));
                    }
                }
                ScanFilter::Regex {
                    row,
                    qualifier,
                    value,
                } => {
                    if let Some(p) = row {
                        out.row = Some(full_match(p)?);
                    }
                    if let Some(p) = qualifier {
                        out.qualifier = Some(full_match(p)?);
                    }
                    if let Some(p) = value {
                        out.value = Some(full_match(p)?);
                    }
                }
            }
        }
        Ok(out)
    }

    fn ts_in_window(&self, ts: u64) -> bool {
        self.ts_start.map_or(true, |s| ts >= s) && self.ts_end.map_or(true, |e| ts <= e)
    }

    fn coordinates_match(&self, key: &CellKey) -> bool {
        self.row.as_ref().map_or(true, |r| r.is_match(&key.row))
            && self
                .qualifier
                .as_ref()
                .map_or(true, |r| r.is_match(&key.qualifier))
    }

    fn value_matches(&self, value: &[u8]) -> bool {
        self.value.as_ref().map_or(true, |r| r.is_match(value))
    }
}

/// The original store's regex filter uses whole-entry matching; anchor to
/// reproduce it.
fn full_match(pattern: &str) -> StoreResult<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| StoreError::BadPattern(e.to_string()))
}

fn fetch_matches(
    families: &[Vec<u8>],
    columns: &[(Vec<u8>, Vec<u8>)],
    key: &CellKey,
) -> bool {
    if families.is_empty() && columns.is_empty() {
        return true;
    }
    families.iter().any(|f| *f == key.family)
        || columns
            .iter()
            .any(|(f, q)| *f == key.family && *q == key.qualifier)
}

struct MemScanner {
    inner: Arc<StoreInner>,
    table: String,
    ranges: Vec<Range>,
    families: Vec<Vec<u8>>,
    columns: Vec<(Vec<u8>, Vec<u8>)>,
    filters: Vec<ScanFilter>,
    materialized: Option<std::vec::IntoIter<StoreResult<Cell>>>,
}

impl MemScanner {
    fn new(inner: Arc<StoreInner>, table: &str) -> Self {
        Self {
            inner,
            table: table.to_string(),
            ranges: Vec::new(),
            families: Vec::new(),
            columns: Vec::new(),
            filters: Vec::new(),
            materialized: None,
        }
    }

    fn materialize(&self) -> Vec<StoreResult<Cell>> {
        let compiled = match CompiledFilters::compile(&self.filters) {
            Ok(c) => c,
            Err(e) => return vec![Err(e)],
        };
        let tables = self.inner.tables.read();
        let table = match tables.get(&self.table) {
            Some(t) => t,
            None => return vec![Err(StoreError::TableNotFound(self.table.clone()))],
        };
        let mut out = Vec::new();
        for (key, chain) in &table.cells {
            if !self.ranges.is_empty() && !self.ranges.iter().any(|r| r.contains(&key.row)) {
                continue;
            }
            if !fetch_matches(&self.families, &self.columns, key) {
                continue;
            }
            if !compiled.coordinates_match(key) {
                continue;
            }
            if compiled.ts_attached {
                for (ts, value) in chain.live(table.max_versions) {
                    if compiled.ts_in_window(*ts) && compiled.value_matches(value) {
                        out.push(Ok(cell(key, *ts, value)));
                    }
                }
            } else if let Some((ts, value)) = chain.live(table.max_versions).next() {
                if compiled.value_matches(value) {
                    out.push(Ok(cell(key, *ts, value)));
                }
            }
        }
        out
    }
}

fn cell(key: &CellKey, timestamp: u64, value: &[u8]) -> Cell {
    Cell {
        row: key.row.clone(),
        family: key.family.clone(),
        qualifier: key.qualifier.clone(),
        timestamp,
        value: value.to_vec(),
    }
}

impl Iterator for MemScanner {
    type Item = StoreResult<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.materialized.is_none() {
            self.materialized = Some(self.materialize().into_iter());
        }
        self.materialized.as_mut().and_then(|iter| iter.next())
    }
}

impl Scanner for MemScanner {
    fn set_range(&mut self, range: Range) {
        self.ranges = vec![range];
    }

    fn set_ranges(&mut self, ranges: Vec<Range>) {
        self.ranges = ranges;
    }

    fn fetch_column_family(&mut self, family: &[u8]) {
        self.families.push(family.to_vec());
    }

    fn fetch_column(&mut self, family: &[u8], qualifier: &[u8]) {
        self.columns.push((family.to_vec(), qualifier.to_vec()));
    }

    fn add_filter(&mut self, filter: ScanFilter) {
        self.filters.push(filter);
    }
}

struct WriterShared {
    buffer: Mutex<Vec<(String, Mutation)>>,
    closed: AtomicBool,
}

struct MemMultiWriter {
    inner: Arc<StoreInner>,
    shared: Arc<WriterShared>,
}

struct MemWriter {
    shared: Arc<WriterShared>,
    table: String,
}

impl Writer for MemWriter {
    fn add_mutation(&self, mutation: Mutation) -> StoreResult<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(StoreError::WriterClosed);
        }
        self.shared
            .buffer
            .lock()
            .push((self.table.clone(), mutation));
        Ok(())
    }
}

impl MultiWriter for MemMultiWriter {
    fn writer(&self, table: &str) -> StoreResult<Arc<dyn Writer>> {
        if !self.inner.tables.read().contains_key(table) {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        Ok(Arc::new(MemWriter {
            shared: self.shared.clone(),
            table: table.to_string(),
        }))
    }

    fn flush(&self) -> StoreResult<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(StoreError::WriterClosed);
        }
        let pending: Vec<_> = self.shared.buffer.lock().drain(..).collect();
        if pending.is_empty() {
            return Ok(());
        }
        let mut tables = self.inner.tables.write();
        for (table, _) in &pending {
            if !tables.contains_key(table) {
                return Err(StoreError::TableNotFound(table.clone()));
            }
        }
        for (table, mutation) in pending {
            let target = tables.get_mut(&table).expect("verified above");
            let (row, ops) = mutation.into_parts();
            for op in ops {
                match op {
                    CellOp::Put {
                        family,
                        qualifier,
                        timestamp,
                        value,
                    } => {
                        let ts = if timestamp > 0 {
                            timestamp
                        } else {
                            self.inner.assign_ts()
                        };
                        target
                            .cells
                            .entry(CellKey {
                                row: row.clone(),
                                family,
                                qualifier,
                            })
                            .or_default()
                            .put(ts, value);
                    }
                    CellOp::Delete {
                        family,
                        qualifier,
                        timestamp,
                    } => {
                        let ts = if timestamp > 0 {
                            timestamp
                        } else {
                            self.inner.assign_ts()
                        };
                        target
                            .cells
                            .entry(CellKey {
                                row: row.clone(),
                                family,
                                qualifier,
                            })
                            .or_default()
                            .tombstone(ts);
                    }
                }
            }
        }
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.buffer.lock().clear();
        Ok(())
    }
}

struct MemBatchDeleter {
    inner: Arc<StoreInner>,
    table: String,
    ranges: Vec<Range>,
    family: Option<Vec<u8>>,
    filters: Vec<ScanFilter>,
}

impl BatchDeleter for MemBatchDeleter {
    fn set_ranges(&mut self, ranges: Vec<Range>) {
        self.ranges = ranges;
    }

    fn fetch_column_family(&mut self, family: &[u8]) {
        self.family = Some(family.to_vec());
    }

    fn add_filter(&mut self, filter: ScanFilter) {
        self.filters.push(filter);
    }

    fn delete(&mut self) -> StoreResult<()> {
        let compiled = CompiledFilters::compile(&self.filters)?;
        let delete_ts = self.inner.assign_ts();
        let mut tables = self.inner.tables.write();
        let table = tables
            .get_mut(&self.table)
            .ok_or_else(|| StoreError::TableNotFound(self.table.clone()))?;
        let max_versions = table.max_versions;
        for (key, chain) in table.cells.iter_mut() {
            if !self.ranges.is_empty() && !self.ranges.iter().any(|r| r.contains(&key.row)) {
                continue;
            }
            if let Some(family) = &self.family {
                if *family != key.family {
                    continue;
                }
            }
            if !compiled.coordinates_match(key) {
                continue;
            }
            let newest = chain.live(max_versions).next();
            let matches = match newest {
                Some((ts, value)) => {
                    (!compiled.ts_attached || compiled.ts_in_window(*ts))
                        && compiled.value_matches(value)
                }
                None => false,
            };
            if matches {
                chain.tombstone(delete_ts);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_table() -> MemoryStore {
        let store = MemoryStore::new();
        store.table_ops().create("t").unwrap();
        store
    }

    fn put(store: &MemoryStore, row: &str, family: &str, qualifier: &str, ts: u64, value: &[u8]) {
        let writer = store.multi_writer(1).unwrap();
        let mut m = Mutation::new(row);
        m.put(family, qualifier, ts, value);
        writer.writer("t").unwrap().add_mutation(m).unwrap();
        writer.flush().unwrap();
    }

    fn scan_all(store: &MemoryStore) -> Vec<Cell> {
        store
            .scanner("t")
            .unwrap()
            .collect::<StoreResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn entries_come_back_sorted() {
        let store = store_with_table();
        put(&store, "b", "f", "q", 0, b"2");
        put(&store, "a", "f", "q", 0, b"1");
        put(&store, "a", "e", "q", 0, b"0");
        let rows: Vec<_> = scan_all(&store)
            .into_iter()
            .map(|c| (c.row, c.family))
            .collect();
        assert_eq!(
            rows,
            vec![
                (b"a".to_vec(), b"e".to_vec()),
                (b"a".to_vec(), b"f".to_vec()),
                (b"b".to_vec(), b"f".to_vec()),
            ]
        );
    }

    #[test]
    fn newest_version_wins_without_filter() {
        let store = store_with_table();
        put(&store, "r", "f", "q", 10, b"old");
        put(&store, "r", "f", "q", 20, b"new");
        let cells = scan_all(&store);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].value, b"new");
        assert_eq!(cells[0].timestamp, 20);
    }

    #[test]
    fn timestamp_filter_returns_versions_in_window() {
        let store = store_with_table();
        put(&store, "r", "f", "q", 10, b"v1");
        put(&store, "r", "f", "q", 20, b"v2");
        put(&store, "r", "f", "q", 30, b"v3");
        let mut scanner = store.scanner("t").unwrap();
        scanner.add_filter(ScanFilter::TimestampRange {
            start: None,
            end: Some(20),
        });
        let cells: Vec<_> = scanner.collect::<StoreResult<Vec<_>>>().unwrap();
        let versions: Vec<_> = cells.iter().map(|c| (c.timestamp, c.value.clone())).collect();
        assert_eq!(versions, vec![(20, b"v2".to_vec()), (10, b"v1".to_vec())]);
    }

    #[test]
    fn tombstone_suppresses_older_versions_under_any_filter() {
        let store = store_with_table();
        put(&store, "r", "f", "q", 10, b"v1");
        let writer = store.multi_writer(1).unwrap();
        let mut m = Mutation::new("r");
        m.delete("f", "q", 50);
        writer.writer("t").unwrap().add_mutation(m).unwrap();
        writer.flush().unwrap();

        assert!(scan_all(&store).is_empty());

        // A point-in-time read before the delete sees nothing either.
        let mut scanner = store.scanner("t").unwrap();
        scanner.add_filter(ScanFilter::TimestampRange {
            start: None,
            end: Some(20),
        });
        assert!(scanner.collect::<StoreResult<Vec<_>>>().unwrap().is_empty());

        // A write after the tombstone becomes visible again.
        put(&store, "r", "f", "q", 60, b"v2");
        let cells = scan_all(&store);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].value, b"v2");
    }

    #[test]
    fn value_regex_is_full_match() {
        let store = store_with_table();
        put(&store, "r1", "f", "q", 0, b"Sabc");
        put(&store, "r2", "f", "q", 0, b"Sabcdef");
        let mut scanner = store.scanner("t").unwrap();
        scanner.add_filter(ScanFilter::value_regex("Sabc"));
        let cells: Vec<_> = scanner.collect::<StoreResult<Vec<_>>>().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].row, b"r1");
    }

    #[test]
    fn qualifier_regex_selects_suffix() {
        let store = store_with_table();
        put(&store, "v", "name", "A", 0, b"");
        put(&store, "v", "name", "AB", 0, b"");
        let mut scanner = store.scanner("t").unwrap();
        scanner.add_filter(ScanFilter::qualifier_regex(".*B$"));
        let cells: Vec<_> = scanner.collect::<StoreResult<Vec<_>>>().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].qualifier, b"AB");
    }

    #[test]
    fn bad_pattern_surfaces_as_error() {
        let store = store_with_table();
        let mut scanner = store.scanner("t").unwrap();
        scanner.add_filter(ScanFilter::value_regex("("));
        assert!(matches!(
            scanner.next(),
            Some(Err(StoreError::BadPattern(_)))
        ));
    }

    #[test]
    fn fetched_columns_limit_results() {
        let store = store_with_table();
        put(&store, "r", "L", "E", 0, b"");
        put(&store, "r", "name", "", 0, b"Sx");
        put(&store, "r", "age", "", 0, b"I3");
        let mut scanner = store.scanner("t").unwrap();
        scanner.fetch_column(b"L", b"E");
        scanner.fetch_column_family(b"name");
        let families: Vec<_> = scanner
            .collect::<StoreResult<Vec<_>>>()
            .unwrap()
            .into_iter()
            .map(|c| c.family)
            .collect();
        assert_eq!(families, vec![b"L".to_vec(), b"name".to_vec()]);
    }

    #[test]
    fn flush_is_buffered_and_atomic() {
        let store = store_with_table();
        let writer = store.multi_writer(1).unwrap();
        let mut m = Mutation::new("r");
        m.put("f", "q", 0, b"v".as_slice());
        writer.writer("t").unwrap().add_mutation(m).unwrap();
        assert!(scan_all(&store).is_empty());
        writer.flush().unwrap();
        assert_eq!(scan_all(&store).len(), 1);
    }

    #[test]
    fn close_discards_pending_mutations() {
        let store = store_with_table();
        let writer = store.multi_writer(1).unwrap();
        let handle = writer.writer("t").unwrap();
        let mut m = Mutation::new("r");
        m.put("f", "q", 0, b"v".as_slice());
        handle.add_mutation(m).unwrap();
        writer.close().unwrap();
        assert!(matches!(
            handle.add_mutation(Mutation::new("r")),
            Err(StoreError::WriterClosed)
        ));
        assert!(scan_all(&store).is_empty());
    }

    #[test]
    fn assigned_timestamps_increase() {
        let store = store_with_table();
        put(&store, "r", "f", "a", 0, b"1");
        put(&store, "r", "f", "b", 0, b"2");
        let cells = scan_all(&store);
        assert!(cells[0].timestamp < cells[1].timestamp);
    }

    #[test]
    fn max_versions_caps_retention() {
        let store = store_with_table();
        store.table_ops().set_max_versions("t", Some(1)).unwrap();
        put(&store, "r", "f", "q", 10, b"v1");
        put(&store, "r", "f", "q", 20, b"v2");
        let mut scanner = store.scanner("t").unwrap();
        scanner.add_filter(ScanFilter::TimestampRange {
            start: Some(0),
            end: Some(100),
        });
        let cells: Vec<_> = scanner.collect::<StoreResult<Vec<_>>>().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].value, b"v2");
    }

    #[test]
    fn batch_deleter_honors_family_and_ranges() {
        let store = store_with_table();
        put(&store, "a", "f", "q", 0, b"1");
        put(&store, "a", "g", "q", 0, b"2");
        put(&store, "b", "f", "q", 0, b"3");
        let mut deleter = store.batch_deleter("t", 1).unwrap();
        deleter.set_ranges(vec![Range::row("a")]);
        deleter.fetch_column_family(b"f");
        deleter.delete().unwrap();
        let left: Vec<_> = scan_all(&store)
            .into_iter()
            .map(|c| (c.row, c.family))
            .collect();
        assert_eq!(
            left,
            vec![(b"a".to_vec(), b"g".to_vec()), (b"b".to_vec(), b"f".to_vec())]
        );
    }

    #[test]
    fn batch_deleter_with_qualifier_regex() {
        let store = store_with_table();
        put(&store, "Sval", "name", "v1", 0, b"");
        put(&store, "Sval", "name", "v2", 0, b"");
        let mut deleter = store.batch_deleter("t", 1).unwrap();
        deleter.set_ranges(vec![Range::Full]);
        deleter.add_filter(ScanFilter::qualifier_regex(".*v1$"));
        deleter.delete().unwrap();
        let cells = scan_all(&store);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].qualifier, b"v2");
    }

    #[test]
    fn closed_ranges_are_inclusive() {
        let store = store_with_table();
        for row in ["a", "b", "c", "d"] {
            put(&store, row, "f", "q", 0, b"");
        }
        let mut scanner = store.scanner("t").unwrap();
        scanner.set_range(Range::Closed(b"b".to_vec(), b"c".to_vec()));
        let rows: Vec<_> = scanner
            .collect::<StoreResult<Vec<_>>>()
            .unwrap()
            .into_iter()
            .map(|c| c.row)
            .collect();
        assert_eq!(rows, vec![b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn table_ops_lifecycle() {
        let store = MemoryStore::new();
        assert!(!store.table_ops().exists("x"));
        store.table_ops().create("x").unwrap();
        assert!(store.table_ops().exists("x"));
        assert!(matches!(
            store.table_ops().create("x"),
            Err(StoreError::TableExists(_))
        ));
        assert_eq!(store.table_ops().list(), vec!["x".to_string()]);
        store.table_ops().delete("x").unwrap();
        assert!(matches!(
            store.table_ops().delete("x"),
            Err(StoreError::TableNotFound(_))
        ));
        assert!(store.scanner("x").is_err());
    }
}
