//! Connection assembly.
//!
//! Turns the raw window rows (up to `limit`, sentinel included) into the
//! Relay connection envelope: trimmed, re-ordered edges with per-row
//! cursors and recomputed page info. Nothing here persists between
//! requests.

use serde::Serialize;

use crate::arguments::FetchPlan;
use crate::cursor::{self, CursorValues};
use crate::engine::WindowRow;
use crate::{ConnectionError, ConnectionResult};

/// A node plus the cursor that names its position under the active order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

/// The Relay pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

/// Assemble the final connection from fetched window rows.
///
/// The sentinel row beyond `plan.count` only proves more rows exist in the
/// fetch direction; it is dropped before edges are built. Inversed fetches
/// arrive in reversed order and are flipped back so edges always read in
/// the natural (declared) order.
pub fn assemble<T>(
    mut rows: Vec<WindowRow<T>>,
    plan: &FetchPlan,
) -> ConnectionResult<Connection<T>> {
    let has_more = rows.len() as i64 > plan.count;
    if has_more {
        rows.truncate(plan.count as usize);
    }
    if plan.is_inversed {
        rows.reverse();
    }

    let anchored = plan.cursor.is_some();
    let (has_next_page, has_previous_page) = if plan.is_inversed {
        // The anchor row and everything past it exist by construction
        // whenever a cursor was supplied.
        (anchored, has_more)
    } else {
        (has_more, anchored)
    };

    let mut edges = Vec::with_capacity(rows.len());
    for row in rows {
        edges.push(Edge {
            cursor: mint_cursor(&row.key)?,
            node: row.node,
        });
    }

    let page_info = PageInfo {
        has_next_page,
        has_previous_page,
        start_cursor: edges.first().map(|e| e.cursor.clone()),
        end_cursor: edges.last().map(|e| e.cursor.clone()),
    };

    Ok(Connection { edges, page_info })
}

fn mint_cursor(key: &CursorValues) -> ConnectionResult<String> {
    if key.is_empty() {
        // A row that lost its sort-key values cannot be addressed again;
        // fail closed instead of minting a cursor that dereferences to
        // nothing.
        tracing::warn!("window row carried no sort key values");
        return Err(ConnectionError::Unexpected(
            "window row is missing its sort key values".to_string(),
        ));
    }
    Ok(cursor::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{SortField, SortKeySpec};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn spec() -> SortKeySpec {
        SortKeySpec::new(vec![SortField::asc("id")]).unwrap()
    }

    fn row(id: &str) -> WindowRow<Value> {
        let node = json!({"id": id});
        let key = cursor::values_from_row(&node, &spec()).unwrap();
        WindowRow { node, key }
    }

    fn plan(is_inversed: bool, count: i64, cursor_anchor: bool) -> FetchPlan {
        let cursor = cursor_anchor.then(|| {
            let mut values = CursorValues::new();
            values.insert("id".to_string(), json!("0"));
            values
        });
        FetchPlan {
            is_inversed,
            count,
            limit: count + 1,
            cursor,
        }
    }

    fn ids(connection: &Connection<Value>) -> Vec<String> {
        connection
            .edges
            .iter()
            .map(|e| e.node["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn sentinel_row_is_dropped_and_flags_next() {
        let rows = vec![row("1"), row("2"), row("3")];
        let connection = assemble(rows, &plan(false, 2, false)).unwrap();
        assert_eq!(ids(&connection), vec!["1", "2"]);
        assert!(connection.page_info.has_next_page);
        assert!(!connection.page_info.has_previous_page);
    }

    #[test]
    fn short_window_means_no_further_page() {
        let rows = vec![row("1"), row("2")];
        let connection = assemble(rows, &plan(false, 2, false)).unwrap();
        assert_eq!(connection.edges.len(), 2);
        assert!(!connection.page_info.has_next_page);
    }

    #[test]
    fn inversed_rows_are_restored_to_natural_order() {
        // Backward fetch returns reversed order: 3, 2, plus sentinel 1.
        let rows = vec![row("3"), row("2"), row("1")];
        let connection = assemble(rows, &plan(true, 2, false)).unwrap();
        assert_eq!(ids(&connection), vec!["2", "3"]);
        assert!(connection.page_info.has_previous_page);
        assert!(!connection.page_info.has_next_page);
    }

    #[test]
    fn cursor_anchor_implies_rows_on_the_other_side() {
        let rows = vec![row("2"), row("3")];
        let forward = assemble(rows, &plan(false, 2, true)).unwrap();
        assert!(forward.page_info.has_previous_page);

        let rows = vec![row("2"), row("1")];
        let backward = assemble(rows, &plan(true, 2, true)).unwrap();
        assert!(backward.page_info.has_next_page);
    }

    #[test]
    fn start_and_end_cursors_bound_the_page() {
        let rows = vec![row("1"), row("2")];
        let connection = assemble(rows, &plan(false, 2, false)).unwrap();
        assert_eq!(
            connection.page_info.start_cursor.as_deref(),
            Some(connection.edges.first().unwrap().cursor.as_str())
        );
        assert_eq!(
            connection.page_info.end_cursor.as_deref(),
            Some(connection.edges.last().unwrap().cursor.as_str())
        );
    }

    #[test]
    fn empty_forward_page_with_anchor_keeps_previous_flag() {
        let connection: Connection<Value> =
            assemble(Vec::new(), &plan(false, 10, true)).unwrap();
        assert!(connection.edges.is_empty());
        assert!(!connection.page_info.has_next_page);
        assert!(connection.page_info.has_previous_page);
        assert_eq!(connection.page_info.start_cursor, None);
        assert_eq!(connection.page_info.end_cursor, None);
    }

    #[test]
    fn empty_backward_page_with_anchor_keeps_next_flag() {
        let connection: Connection<Value> =
            assemble(Vec::new(), &plan(true, 10, true)).unwrap();
        assert!(connection.page_info.has_next_page);
        assert!(!connection.page_info.has_previous_page);
    }

    #[test]
    fn keyless_row_fails_closed() {
        let bad = WindowRow {
            node: json!({"id": "1"}),
            key: CursorValues::new(),
        };
        let result = assemble(vec![bad], &plan(false, 2, false));
        assert!(matches!(result, Err(ConnectionError::Unexpected(_))));
    }

    #[test]
    fn minted_cursor_replays_through_the_codec() {
        let rows = vec![row("42")];
        let connection = assemble(rows, &plan(false, 2, false)).unwrap();
        let decoded =
            cursor::decode(&connection.edges[0].cursor, &spec()).unwrap();
        assert_eq!(decoded.get("id"), Some(&json!("42")));
    }
}
