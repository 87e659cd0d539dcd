//! Window query construction.
//!
//! Translates a fetch plan into the ordered, keyset-bounded, limited query
//! shape that a [`ConnectionSource`](crate::engine::ConnectionSource)
//! executes on top of the caller's base query.

use crate::arguments::FetchPlan;
use crate::order::{SortField, SortKeySpec};
use crate::predicate::{Predicate, SqlParams};
use crate::ConnectionResult;

/// One windowed fetch: keyset bound, ordering, and sentinel-inclusive limit.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowQuery {
    /// Keyset bound anchored at the cursor row; absent on first pages.
    pub predicate: Option<Predicate>,
    /// Sort-key fields with directions already reversed for inversed fetches.
    pub order_by: Vec<SortField>,
    /// Row count including the one-row sentinel.
    pub limit: i64,
}

/// Build the window for a validated fetch plan.
///
/// Backward pagination fetches "the last N" as "the first N under the
/// reversed order"; the assembler re-reverses rows into natural order.
pub fn build_window(spec: &SortKeySpec, plan: &FetchPlan) -> ConnectionResult<WindowQuery> {
    let predicate = match &plan.cursor {
        Some(cursor) => Some(Predicate::keyset(spec, cursor, plan.is_inversed)?),
        None => None,
    };

    let order_by = spec
        .fields()
        .iter()
        .map(|field| SortField {
            name: field.name.clone(),
            direction: if plan.is_inversed {
                field.direction.reversed()
            } else {
                field.direction
            },
        })
        .collect();

    Ok(WindowQuery {
        predicate,
        order_by,
        limit: plan.limit,
    })
}

impl WindowQuery {
    /// Render the ORDER BY column list.
    pub fn order_by_sql(&self) -> String {
        self.order_by
            .iter()
            .map(|f| format!("{} {}", f.name, f.direction.as_sql()))
            .collect::<Vec<String>>()
            .join(", ")
    }

    /// Render the full window suffix (`WHERE`/`ORDER BY`/`LIMIT`) for a
    /// base query, appending bind values to `params`.
    pub fn to_sql_suffix(&self, params: &mut SqlParams) -> String {
        let mut fragments = Vec::with_capacity(3);
        if let Some(predicate) = &self.predicate {
            fragments.push(format!("WHERE {}", predicate.to_sql(params)));
        }
        fragments.push(format!("ORDER BY {}", self.order_by_sql()));
        fragments.push(format!("LIMIT {}", self.limit));
        fragments.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorValues;
    use crate::order::{OrderDirection, SortField};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec() -> SortKeySpec {
        SortKeySpec::new(vec![SortField::asc("name"), SortField::asc("id")]).unwrap()
    }

    fn forward_plan(cursor: Option<CursorValues>) -> FetchPlan {
        FetchPlan {
            is_inversed: false,
            count: 2,
            limit: 3,
            cursor,
        }
    }

    fn anchor(name: &str, id: &str) -> CursorValues {
        let mut values = CursorValues::new();
        values.insert("name".to_string(), json!(name));
        values.insert("id".to_string(), json!(id));
        values
    }

    #[test]
    fn forward_window_keeps_declared_order() {
        let window = build_window(&spec(), &forward_plan(None)).unwrap();
        assert_eq!(window.order_by_sql(), "name ASC, id ASC");
        assert_eq!(window.predicate, None);
        assert_eq!(window.limit, 3);
    }

    #[test]
    fn inversed_window_reverses_every_direction() {
        let plan = FetchPlan {
            is_inversed: true,
            count: 2,
            limit: 3,
            cursor: None,
        };
        let window = build_window(&spec(), &plan).unwrap();
        assert_eq!(window.order_by_sql(), "name DESC, id DESC");
    }

    #[test]
    fn inversed_window_over_mixed_directions() {
        let spec =
            SortKeySpec::new(vec![SortField::desc("created_at"), SortField::asc("id")])
                .unwrap();
        let plan = FetchPlan {
            is_inversed: true,
            count: 1,
            limit: 2,
            cursor: None,
        };
        let window = build_window(&spec, &plan).unwrap();
        assert_eq!(window.order_by[0].direction, OrderDirection::Asc);
        assert_eq!(window.order_by[1].direction, OrderDirection::Desc);
    }

    #[test]
    fn suffix_renders_where_order_limit() {
        let window =
            build_window(&spec(), &forward_plan(Some(anchor("Alpha", "2")))).unwrap();
        let mut params = SqlParams::new(0);
        assert_eq!(
            window.to_sql_suffix(&mut params),
            "WHERE (name > $1 OR (name = $2 AND id > $3)) ORDER BY name ASC, id ASC LIMIT 3"
        );
        assert_eq!(params.values().len(), 3);
    }

    #[test]
    fn suffix_without_cursor_has_no_where_clause() {
        let window = build_window(&spec(), &forward_plan(None)).unwrap();
        let mut params = SqlParams::new(0);
        assert_eq!(
            window.to_sql_suffix(&mut params),
            "ORDER BY name ASC, id ASC LIMIT 3"
        );
        assert!(params.values().is_empty());
    }
}
