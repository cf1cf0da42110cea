use thiserror::Error;

use crate::model::ElementKind;
use crate::storage::StoreError;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("element id may not be empty")]
    EmptyId,
    #[error("invalid element id {0:?}: ids may not contain '_'")]
    InvalidId(String),
    #[error("invalid edge label {0:?}: labels may not be empty or contain '_'")]
    InvalidLabel(String),
    #[error("vertex {0:?} already exists")]
    DuplicateId(String),
    #[error("vertex {0:?} does not exist")]
    NotFound(String),
    #[error("property key may not be empty")]
    EmptyKey,
    #[error("property key {0:?} is reserved")]
    ReservedKey(String),
    #[error("invalid timestamp filter: {0}")]
    InvalidFilter(&'static str),
    #[error("cannot filter on opaque byte values")]
    UnsupportedFilter,
    #[error("index {0:?} already exists")]
    IndexAlreadyExists(String),
    #[error("index {0:?} does not index {1} elements")]
    IndexKindMismatch(String, ElementKind),
    #[error("named indices are disabled by configuration")]
    IndexingDisabled,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("corruption detected: {0}")]
    Corruption(String),
}
