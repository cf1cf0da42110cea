//! Tag-byte value codec. The first byte of every encoded property value
//! identifies its type; everything after is a textual rendering, so any
//! non-opaque encoding is valid UTF-8 and safe to match literally with a
//! server-side regex. `TAG_BYTES` is the reserved opaque tag: values
//! carrying it must never be regex-matched.

use crate::error::{GraphError, Result};
use crate::model::PropertyValue;

pub const TAG_BOOL: u8 = b'B';
pub const TAG_INT: u8 = b'I';
pub const TAG_FLOAT: u8 = b'F';
pub const TAG_STRING: u8 = b'S';
pub const TAG_BYTES: u8 = b'X';

pub fn serialize(value: &PropertyValue) -> Vec<u8> {
    match value {
        PropertyValue::Bool(v) => vec![TAG_BOOL, if *v { b'1' } else { b'0' }],
        PropertyValue::Int(v) => {
            let mut out = vec![TAG_INT];
            out.extend_from_slice(v.to_string().as_bytes());
            out
        }
        PropertyValue::Float(v) => {
            let mut out = vec![TAG_FLOAT];
            out.extend_from_slice(v.to_string().as_bytes());
            out
        }
        PropertyValue::String(v) => {
            let mut out = vec![TAG_STRING];
            out.extend_from_slice(v.as_bytes());
            out
        }
        PropertyValue::Bytes(v) => {
            let mut out = vec![TAG_BYTES];
            out.extend_from_slice(v);
            out
        }
    }
}

pub fn deserialize(bytes: &[u8]) -> Result<PropertyValue> {
    let (tag, rest) = bytes
        .split_first()
        .ok_or_else(|| GraphError::Corruption("empty property value".into()))?;
    match *tag {
        TAG_BOOL => match rest {
            [b'1'] => Ok(PropertyValue::Bool(true)),
            [b'0'] => Ok(PropertyValue::Bool(false)),
            _ => Err(GraphError::Corruption("malformed bool value".into())),
        },
        TAG_INT => text(rest)?
            .parse()
            .map(PropertyValue::Int)
            .map_err(|_| GraphError::Corruption("malformed int value".into())),
        TAG_FLOAT => text(rest)?
            .parse()
            .map(PropertyValue::Float)
            .map_err(|_| GraphError::Corruption("malformed float value".into())),
        TAG_STRING => Ok(PropertyValue::String(text(rest)?.to_string())),
        TAG_BYTES => Ok(PropertyValue::Bytes(rest.to_vec())),
        other => Err(GraphError::Corruption(format!(
            "unknown value tag 0x{other:02x}"
        ))),
    }
}

/// Whether an encoded value may be matched by a server-side regex filter.
pub fn is_regex_safe(bytes: &[u8]) -> bool {
    bytes.first().is_some_and(|tag| *tag != TAG_BYTES)
}

/// Deserialize expecting a string, used for edge labels.
pub fn deserialize_string(bytes: &[u8]) -> Result<String> {
    match deserialize(bytes)? {
        PropertyValue::String(s) => Ok(s),
        other => Err(GraphError::Corruption(format!(
            "expected string value, found {other:?}"
        ))),
    }
}

fn text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|_| GraphError::Corruption("non-utf8 payload in tagged value".into()))
}
