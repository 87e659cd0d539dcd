//! Relay-style cursor pagination over keyset-ordered queries.
//!
//! Every list field shares one engine: the caller supplies a base query
//! already restricted to the rows it may see, a [`SortKeySpec`] defining a
//! total order over those rows, and the raw `first`/`after`/`last`/`before`
//! arguments. The engine hands back a [`Connection`] of edges and page info,
//! or a structured error addressed to the offending argument.
//!
//! Cursors encode sort-key values, never row offsets, so concurrent inserts
//! and deletes elsewhere in the order cannot skip or duplicate rows for an
//! in-flight client.

pub mod arguments;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod defaults;
pub mod engine;
pub mod memory;
pub mod order;
pub mod predicate;
pub mod window;

pub use arguments::{FetchPlan, PaginationArguments};
pub use config::ConnectionConfig;
pub use connection::{Connection, Edge, PageInfo};
pub use cursor::CursorValues;
pub use engine::{paginate, ConnectionSource, WindowRow};
pub use memory::MemorySource;
pub use order::{OrderDirection, SortField, SortKeySpec};
pub use predicate::{CompareOp, Predicate, SqlParams};
pub use window::WindowQuery;

use thiserror::Error;

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// A single validation failure, addressed to the argument that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentIssue {
    pub argument_path: Vec<String>,
    pub message: String,
}

impl ArgumentIssue {
    pub fn new(argument: &str, message: impl Into<String>) -> Self {
        Self {
            argument_path: vec![argument.to_string()],
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Malformed argument shape: out-of-range counts, conflicting argument
    /// pairs, or an undecodable cursor. The client can recover by fixing
    /// the request.
    #[error("Invalid connection arguments: {issues:?}")]
    InvalidArguments { issues: Vec<ArgumentIssue> },
    /// The cursor decoded cleanly but the row it points at no longer exists
    /// within the caller's visible scope.
    #[error("No resource found for the cursor supplied at {argument_path:?}")]
    ResourceNotFound { argument_path: Vec<String> },
    /// Internal invariant violation; never client-remediable.
    #[error("Unexpected engine state: {0}")]
    Unexpected(String),
    /// Data-layer failure passthrough.
    #[error("Query error: {0}")]
    Query(String),
}

impl ConnectionError {
    /// Stable error code for the transport layer to attach to field errors.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionError::InvalidArguments { .. } => "invalid_arguments",
            ConnectionError::ResourceNotFound { .. } => {
                "arguments_associated_resources_not_found"
            }
            ConnectionError::Unexpected(_) => "unexpected",
            ConnectionError::Query(_) => "unexpected",
        }
    }

    /// Argument paths implicated in this error, if any.
    pub fn issues(&self) -> Vec<ArgumentIssue> {
        match self {
            ConnectionError::InvalidArguments { issues } => issues.clone(),
            ConnectionError::ResourceNotFound { argument_path } => {
                vec![ArgumentIssue {
                    argument_path: argument_path.clone(),
                    message: String::new(),
                }]
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn invalid(issues: Vec<ArgumentIssue>) -> Self {
        ConnectionError::InvalidArguments { issues }
    }
}
