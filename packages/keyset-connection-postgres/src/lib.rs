//! Postgres-backed connection source.
//!
//! Wraps a caller-supplied base query (already joined, filtered and
//! authorization-scoped) and executes the engine's window queries on top
//! of it. Rows come back as JSON objects via `row_to_json`, so the same
//! sort-key extraction path serves every entity type without per-table
//! row mappers.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::Query;
use sqlx::{Postgres, Row};
use tracing::debug;

use keyset_connection::{
    cursor, ConnectionError, ConnectionResult, ConnectionSource, CursorValues, SortKeySpec,
    SqlParams, WindowQuery, WindowRow,
};

/// A scoped base query plus the spec it is paginated under.
#[derive(Debug, Clone)]
pub struct PgSource {
    pool: PgPool,
    base_sql: String,
    base_binds: Vec<Value>,
    spec: SortKeySpec,
}

impl PgSource {
    /// Wrap a base query. `base_sql` must select every sort-key column by
    /// its spec name; `base_binds` are its own `$1..$n` parameters.
    ///
    /// Sort-key field names are interpolated into ORDER BY and WHERE
    /// clauses, so they are restricted to plain identifiers up front.
    pub fn new(
        pool: PgPool,
        base_sql: impl Into<String>,
        base_binds: Vec<Value>,
        spec: SortKeySpec,
    ) -> ConnectionResult<Self> {
        for name in spec.field_names() {
            if !is_sql_identifier(name) {
                return Err(ConnectionError::Unexpected(format!(
                    "sort key field `{name}` is not a plain SQL identifier"
                )));
            }
        }
        Ok(Self {
            pool,
            base_sql: base_sql.into(),
            base_binds,
            spec,
        })
    }

    fn window_sql(&self, window: &WindowQuery) -> (String, Vec<Value>) {
        let mut params = SqlParams::new(self.base_binds.len());
        let suffix = window.to_sql_suffix(&mut params);
        let sql = format!(
            "SELECT row_to_json(t) AS node FROM ({}) AS t {suffix}",
            self.base_sql
        );
        let mut binds = self.base_binds.clone();
        binds.extend(params.into_values());
        (sql, binds)
    }

    fn anchor_sql(&self, key: &CursorValues) -> (String, Vec<Value>) {
        let mut binds = self.base_binds.clone();
        let conditions: Vec<String> = key
            .keys()
            .enumerate()
            .map(|(idx, field)| format!("{field} = ${}", self.base_binds.len() + idx + 1))
            .collect();
        binds.extend(key.values().cloned());
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM ({}) AS t WHERE {}) AS present",
            self.base_sql,
            conditions.join(" AND ")
        );
        (sql, binds)
    }
}

#[async_trait]
impl ConnectionSource for PgSource {
    type Node = Value;

    async fn anchor_exists(&self, key: &CursorValues) -> ConnectionResult<bool> {
        let (sql, binds) = self.anchor_sql(key);
        debug!(%sql, "checking cursor anchor");

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = bind_scalar(query, value)?;
        }
        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ConnectionError::Query(e.to_string()))?;
        row.try_get::<bool, _>("present")
            .map_err(|e| ConnectionError::Query(e.to_string()))
    }

    async fn fetch_window(
        &self,
        window: &WindowQuery,
    ) -> ConnectionResult<Vec<WindowRow<Value>>> {
        let (sql, binds) = self.window_sql(window);
        debug!(%sql, limit = window.limit, "fetching connection window");

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = bind_scalar(query, value)?;
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ConnectionError::Query(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let node: Value = row
                    .try_get("node")
                    .map_err(|e| ConnectionError::Query(e.to_string()))?;
                let key = cursor::values_from_row(&node, &self.spec).map_err(|_| {
                    ConnectionError::Unexpected(
                        "window row is missing sort key columns".to_string(),
                    )
                })?;
                Ok(WindowRow { node, key })
            })
            .collect()
    }
}

fn bind_scalar<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> ConnectionResult<Query<'q, Postgres, PgArguments>> {
    match value {
        Value::String(s) => Ok(query.bind(s.as_str())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(query.bind(i))
            } else if let Some(f) = n.as_f64() {
                Ok(query.bind(f))
            } else {
                Err(ConnectionError::Unexpected(format!(
                    "unbindable numeric parameter: {n}"
                )))
            }
        }
        Value::Bool(b) => Ok(query.bind(*b)),
        Value::Null => Ok(query.bind(Option::<String>::None)),
        Value::Array(_) | Value::Object(_) => Err(ConnectionError::Unexpected(
            "composite values cannot be bound as window parameters".to_string(),
        )),
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
