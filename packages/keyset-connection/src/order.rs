//! Sort-key specifications for connection fields.
//!
//! A [`SortKeySpec`] defines the total order a list field paginates over.
//! The final field must be unique per row (typically the primary key) so
//! that no two rows compare equal under the full key; a cursor then names
//! exactly one position in the order.

use crate::{ConnectionError, ConnectionResult};

/// Ordering direction for a sort-key field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn reversed(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One field of a sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub name: String,
    pub direction: OrderDirection,
}

impl SortField {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Ordered sequence of sort-key fields defining a total row order.
///
/// The engine cannot verify uniqueness of the trailing field; callers are
/// responsible for ending the spec with a per-row-unique column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKeySpec {
    fields: Vec<SortField>,
}

impl SortKeySpec {
    pub fn new(fields: Vec<SortField>) -> ConnectionResult<Self> {
        if fields.is_empty() {
            return Err(ConnectionError::Unexpected(
                "sort key spec requires at least one field".to_string(),
            ));
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
