//! Opaque cursor transcoding.
//!
//! A cursor is the base64url (no padding) encoding of a JSON object whose
//! keys are exactly the active sort-key fields and whose values are that
//! row's scalar values, serialized in sort-key order. The format is
//! human-inspectable on purpose; authorization lives in the base query,
//! not in cursor opacity.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use indexmap::IndexMap;
use serde_json::Value;

use crate::order::SortKeySpec;

/// Sort-key values for one row, in sort-key field order.
pub type CursorValues = IndexMap<String, Value>;

/// Opaque decode failure.
///
/// Bad base64, bad JSON, and a well-formed object missing a required field
/// all collapse here; callers cannot tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCursor;

/// Serialize sort-key values into a transport-safe cursor string.
///
/// Deterministic: the same values in the same order always produce an
/// identical string.
pub fn encode(values: &CursorValues) -> String {
    // IndexMap serializes in insertion order, which is the sort-key order
    // the values were collected in.
    let json = serde_json::to_string(values)
        .expect("cursor values are JSON scalars and always serialize");
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// Decode a cursor string against the active sort-key spec.
///
/// The returned map contains one scalar per spec field, in spec order.
/// Keys in the payload beyond the spec's fields are dropped.
pub fn decode(cursor: &str, spec: &SortKeySpec) -> Result<CursorValues, InvalidCursor> {
    let bytes = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| InvalidCursor)?;
    let payload: Value = serde_json::from_slice(&bytes).map_err(|_| InvalidCursor)?;
    values_from_row(&payload, spec)
}

/// Collect a row's sort-key values out of its JSON representation.
///
/// Fails when the row lacks a key field or carries a composite value
/// there; the caller maps this to an internal-invariant error rather than
/// minting a corrupt cursor.
pub fn values_from_row(row: &Value, spec: &SortKeySpec) -> Result<CursorValues, InvalidCursor> {
    let object = row.as_object().ok_or(InvalidCursor)?;
    let mut values = CursorValues::with_capacity(spec.fields().len());
    for name in spec.field_names() {
        let value = object.get(name).ok_or(InvalidCursor)?;
        if !is_scalar(value) {
            return Err(InvalidCursor);
        }
        values.insert(name.to_string(), value.clone());
    }
    Ok(values)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
