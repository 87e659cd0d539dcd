//! The generic pagination engine.
//!
//! One engine serves every list field: a field supplies its scoped
//! [`ConnectionSource`] and [`SortKeySpec`] and the engine handles the
//! rest. Validation, anchor resolution, window construction and assembly
//! run as strictly ordered phases; a failure in any phase short-circuits
//! the ones behind it, so no query runs on malformed arguments.

use async_trait::async_trait;
use tracing::debug;

use crate::arguments::{self, PaginationArguments};
use crate::config::ConnectionConfig;
use crate::connection::{self, Connection};
use crate::cursor::CursorValues;
use crate::order::SortKeySpec;
use crate::window::{self, WindowQuery};
use crate::{ConnectionError, ConnectionResult};

/// One fetched row: the node plus its sort-key values under the active
/// spec, extracted by the source that produced it.
#[derive(Debug, Clone)]
pub struct WindowRow<T> {
    pub node: T,
    pub key: CursorValues,
}

/// Seam between the engine and a data store.
///
/// Implementations wrap a base query already restricted to the rows the
/// caller is authorized to see; the engine only ever narrows that scope.
#[async_trait]
pub trait ConnectionSource {
    type Node: Send + Sync;

    /// Whether a row with exactly these sort-key values exists in scope.
    ///
    /// Runs as its own phase before the window query: a keyset predicate
    /// anchored on a nonexistent row silently returns everything or
    /// nothing depending on direction, and that must not pass for a valid
    /// empty page.
    async fn anchor_exists(&self, key: &CursorValues) -> ConnectionResult<bool>;

    /// Execute the windowed fetch and return up to `window.limit` rows in
    /// window order.
    async fn fetch_window(
        &self,
        window: &WindowQuery,
    ) -> ConnectionResult<Vec<WindowRow<Self::Node>>>;
}

/// Paginate a source under a sort-key spec.
pub async fn paginate<S: ConnectionSource + Sync>(
    source: &S,
    spec: &SortKeySpec,
    config: &ConnectionConfig,
    args: &PaginationArguments,
) -> ConnectionResult<Connection<S::Node>> {
    let plan = arguments::parse_arguments(args, spec, config)?;

    if let Some(anchor) = &plan.cursor {
        if !source.anchor_exists(anchor).await? {
            return Err(ConnectionError::ResourceNotFound {
                argument_path: vec![plan.cursor_argument().to_string()],
            });
        }
    }

    let window = window::build_window(spec, &plan)?;
    debug!(
        limit = window.limit,
        is_inversed = plan.is_inversed,
        anchored = plan.cursor.is_some(),
        "fetching connection window"
    );

    let rows = source.fetch_window(&window).await?;
    if rows.len() as i64 > window.limit {
        return Err(ConnectionError::Unexpected(format!(
            "source returned {} rows for a window limited to {}",
            rows.len(),
            window.limit
        )));
    }

    connection::assemble(rows, &plan)
}
