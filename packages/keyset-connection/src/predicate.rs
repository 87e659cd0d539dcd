//! Keyset predicate construction.
//!
//! The window's "rows after/before this key tuple" condition is built as a
//! small tagged AST rather than concatenated SQL, so it can be rendered
//! for a database backend or evaluated directly against in-memory rows.
//!
//! A proper lexicographic tuple comparison over fields `(f1, f2)` against
//! cursor values `(v1, v2)` expands to
//! `f1 > v1 OR (f1 = v1 AND f2 > v2)`, with each field's operator chosen
//! from its declared direction and the pagination direction. Independent
//! per-field comparisons would be wrong: the trailing tie-break field only
//! disambiguates rows whose leading fields are equal.

use std::cmp::Ordering;

use serde_json::Value;

use crate::cursor::CursorValues;
use crate::order::{OrderDirection, SortKeySpec};
use crate::{ConnectionError, ConnectionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }
}

/// Tagged predicate tree combined from comparisons, conjunctions and
/// disjunctions. Additive only: it narrows the caller's base query scope,
/// never widens it.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

/// Collects SQL bind parameters during rendering.
///
/// `offset` seeds placeholder numbering so the rendered fragment can sit
/// after a base query that already owns `$1..$offset`.
#[derive(Debug, Default)]
pub struct SqlParams {
    offset: usize,
    values: Vec<Value>,
}

impl SqlParams {
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            values: Vec::new(),
        }
    }

    fn push(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.offset + self.values.len())
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Predicate {
    /// Build the keyset window predicate for a cursor anchor.
    ///
    /// Forward pagination selects rows strictly after the anchor under the
    /// declared order; backward selects strictly before it.
    pub fn keyset(
        spec: &SortKeySpec,
        cursor: &CursorValues,
        is_inversed: bool,
    ) -> ConnectionResult<Predicate> {
        let mut branches = Vec::with_capacity(spec.fields().len());

        for (idx, field) in spec.fields().iter().enumerate() {
            let mut conjuncts = Vec::with_capacity(idx + 1);
            for prior in &spec.fields()[..idx] {
                conjuncts.push(Predicate::Compare {
                    field: prior.name.clone(),
                    op: CompareOp::Eq,
                    value: cursor_value(cursor, &prior.name)?,
                });
            }

            let advancing = match (field.direction, is_inversed) {
                (OrderDirection::Asc, false) | (OrderDirection::Desc, true) => CompareOp::Gt,
                (OrderDirection::Asc, true) | (OrderDirection::Desc, false) => CompareOp::Lt,
            };
            conjuncts.push(Predicate::Compare {
                field: field.name.clone(),
                op: advancing,
                value: cursor_value(cursor, &field.name)?,
            });

            if conjuncts.len() == 1 {
                branches.push(conjuncts.remove(0));
            } else {
                branches.push(Predicate::And(conjuncts));
            }
        }

        if branches.len() == 1 {
            Ok(branches.remove(0))
        } else {
            Ok(Predicate::Or(branches))
        }
    }

    /// Render to a SQL condition, appending bind values to `params`.
    pub fn to_sql(&self, params: &mut SqlParams) -> String {
        match self {
            Predicate::Compare { field, op, value } => {
                let placeholder = params.push(value.clone());
                format!("{field} {} {placeholder}", op.as_sql())
            }
            Predicate::And(parts) => {
                let rendered: Vec<String> =
                    parts.iter().map(|p| p.to_sql(params)).collect();
                format!("({})", rendered.join(" AND "))
            }
            Predicate::Or(parts) => {
                let rendered: Vec<String> =
                    parts.iter().map(|p| p.to_sql(params)).collect();
                format!("({})", rendered.join(" OR "))
            }
        }
    }

    /// Evaluate against an in-memory JSON object row.
    ///
    /// Rows missing the compared field, or holding a value that does not
    /// order against the cursor's, never match.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Predicate::Compare { field, op, value } => {
                let Some(actual) = row.get(field) else {
                    return false;
                };
                match compare_values(actual, value) {
                    Some(Ordering::Equal) => *op == CompareOp::Eq,
                    Some(Ordering::Greater) => *op == CompareOp::Gt,
                    Some(Ordering::Less) => *op == CompareOp::Lt,
                    None => false,
                }
            }
            Predicate::And(parts) => parts.iter().all(|p| p.matches(row)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(row)),
        }
    }
}

fn cursor_value(cursor: &CursorValues, field: &str) -> ConnectionResult<Value> {
    cursor.get(field).cloned().ok_or_else(|| {
        ConnectionError::Unexpected(format!(
            "cursor is missing a value for sort key field `{field}`"
        ))
    })
}

/// Total order over the scalar values cursors may carry.
///
/// Strings compare lexicographically, which agrees with time order for
/// ISO-8601 timestamps; numbers numerically; booleans false-before-true;
/// null sorts first. Mixed-type pairs do not order.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            a.as_f64().partial_cmp(&b.as_f64())
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
