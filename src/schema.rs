//! Cell-layout codec: how graph elements map onto `(row, family,
//! qualifier, value)` cells.
//!
//! Vertex table rows are vertex ids: `L:E` marks existence, `I`/`O`
//! families hold adjacency cells qualified `otherId_edgeId` with value
//! `_label`, any other family is a property cell. Edge table rows are edge
//! ids: the `L` cell is qualified `inId_outId` and carries the encoded
//! label. Index table rows are encoded property values, qualified by
//! element id under the property-key family.

use regex::escape;

use crate::error::{GraphError, Result};

pub const FAMILY_LABEL: &[u8] = b"L";
pub const FAMILY_IN_EDGE: &[u8] = b"I";
pub const FAMILY_OUT_EDGE: &[u8] = b"O";
pub const QUALIFIER_EXISTS: &[u8] = b"E";
pub const EMPTY: &[u8] = b"";

/// Joins ids inside qualifiers; must never occur in an id or label.
pub const ID_DELIMITER: u8 = b'_';

pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(GraphError::EmptyId);
    }
    if id.bytes().any(|b| b == ID_DELIMITER) {
        return Err(GraphError::InvalidId(id.to_string()));
    }
    Ok(())
}

pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() || label.bytes().any(|b| b == ID_DELIMITER) {
        return Err(GraphError::InvalidLabel(label.to_string()));
    }
    Ok(())
}

/// Keys that would collide with the schema's own column families.
pub fn validate_property_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(GraphError::EmptyKey);
    }
    if matches!(key, "id" | "label" | "L" | "I" | "O") {
        return Err(GraphError::ReservedKey(key.to_string()));
    }
    Ok(())
}

fn join(a: &str, b: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + 1 + b.len());
    out.extend_from_slice(a.as_bytes());
    out.push(ID_DELIMITER);
    out.extend_from_slice(b.as_bytes());
    out
}

fn split(qualifier: &[u8]) -> Result<(String, String)> {
    let text = std::str::from_utf8(qualifier)
        .map_err(|_| GraphError::Corruption("non-utf8 qualifier".into()))?;
    let (a, b) = text
        .split_once(ID_DELIMITER as char)
        .ok_or_else(|| GraphError::Corruption(format!("undelimited qualifier {text:?}")))?;
    Ok((a.to_string(), b.to_string()))
}

/// Adjacency cell qualifier on a vertex row: `otherId_edgeId`.
pub fn adjacency_qualifier(other: &str, edge: &str) -> Vec<u8> {
    join(other, edge)
}

/// `(other vertex id, edge id)` from an adjacency qualifier.
pub fn split_adjacency_qualifier(qualifier: &[u8]) -> Result<(String, String)> {
    split(qualifier)
}

/// Adjacency cell value: `_label`.
pub fn adjacency_value(label: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(label.len() + 1);
    out.push(ID_DELIMITER);
    out.extend_from_slice(label.as_bytes());
    out
}

pub fn adjacency_label(value: &[u8]) -> Result<String> {
    match value.split_first() {
        Some((&ID_DELIMITER, rest)) => std::str::from_utf8(rest)
            .map(str::to_string)
            .map_err(|_| GraphError::Corruption("non-utf8 adjacency label".into())),
        _ => Err(GraphError::Corruption("malformed adjacency value".into())),
    }
}

/// Edge `L` cell qualifier: `inId_outId`.
pub fn endpoints_qualifier(in_vertex: &str, out_vertex: &str) -> Vec<u8> {
    join(in_vertex, out_vertex)
}

/// `(in vertex id, out vertex id)` from an edge `L` cell qualifier.
pub fn split_endpoints_qualifier(qualifier: &[u8]) -> Result<(String, String)> {
    split(qualifier)
}

/// Value-regex alternation selecting adjacency cells whose label is one of
/// `labels`: `.*_<label>$` per label.
pub fn label_filter_pattern(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| format!(".*_{}$", escape(label)))
        .collect::<Vec<_>>()
        .join("|")
}

/// Qualifier-regex selecting index cells that reference `id`.
pub fn element_id_pattern(id: &str) -> String {
    format!(".*{}$", escape(id))
}

/// Value-regex matching one exact encoded property value.
pub fn encoded_value_pattern(encoded: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(encoded)
        .map_err(|_| GraphError::Corruption("non-utf8 encoded value".into()))?;
    Ok(escape(text))
}
