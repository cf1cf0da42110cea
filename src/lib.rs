pub mod cache;
pub mod codec;
pub mod db;
pub mod error;
pub mod model;
pub mod schema;
pub mod storage;

pub use crate::db::{CellGraph, GraphConfig, NamedIndex};
pub use crate::error::{GraphError, Result};
pub use crate::model::{Direction, Edge, ElementKind, PropertyValue, Vertex};
pub use crate::storage::memory::MemoryStore;
pub use crate::storage::{Cell, Mutation, Range, ScanFilter, SortedStore};
