//! In-memory connection source.
//!
//! Holds the scoped row set as JSON objects and answers window queries by
//! interpreting the predicate AST directly. Backs the engine's own tests
//! and small embedded datasets; larger deployments use a database-backed
//! source instead.

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use crate::cursor::{self, CursorValues};
use crate::engine::{ConnectionSource, WindowRow};
use crate::order::{OrderDirection, SortKeySpec};
use crate::predicate::compare_values;
use crate::window::WindowQuery;
use crate::{ConnectionError, ConnectionResult};

/// A scoped, orderable row set held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    rows: Vec<Value>,
    spec: SortKeySpec,
}

impl MemorySource {
    /// Wrap pre-scoped rows. Every row must be a JSON object carrying a
    /// scalar for each sort-key field.
    pub fn new(rows: Vec<Value>, spec: SortKeySpec) -> Self {
        Self { rows, spec }
    }

    fn sorted_window_rows(&self, window: &WindowQuery) -> Vec<Value> {
        let mut rows: Vec<Value> = self
            .rows
            .iter()
            .filter(|row| {
                window
                    .predicate
                    .as_ref()
                    .map_or(true, |predicate| predicate.matches(row))
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| compare_rows(a, b, window));
        rows.truncate(window.limit as usize);
        rows
    }
}

fn compare_rows(a: &Value, b: &Value, window: &WindowQuery) -> Ordering {
    for field in &window.order_by {
        let left = a.get(&field.name).unwrap_or(&Value::Null);
        let right = b.get(&field.name).unwrap_or(&Value::Null);
        let ordering = compare_values(left, right).unwrap_or(Ordering::Equal);
        let ordering = match field.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl ConnectionSource for MemorySource {
    type Node = Value;

    async fn anchor_exists(&self, key: &CursorValues) -> ConnectionResult<bool> {
        Ok(self.rows.iter().any(|row| {
            key.iter().all(|(field, expected)| {
                row.get(field)
                    .map_or(false, |actual| {
                        compare_values(actual, expected) == Some(Ordering::Equal)
                    })
            })
        }))
    }

    async fn fetch_window(
        &self,
        window: &WindowQuery,
    ) -> ConnectionResult<Vec<WindowRow<Value>>> {
        self.sorted_window_rows(window)
            .into_iter()
            .map(|node| {
                let key = cursor::values_from_row(&node, &self.spec).map_err(|_| {
                    ConnectionError::Unexpected(
                        "row in memory source is missing sort key fields".to_string(),
                    )
                })?;
                Ok(WindowRow { node, key })
            })
            .collect()
    }
}
