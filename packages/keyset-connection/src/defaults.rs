pub const DEFAULT_PAGE_SIZE: i32 = 16;

/// Upper bound on `first`/`last`. Keeps a single request from dragging an
/// unbounded window out of the data store.
pub const MAX_PAGE_SIZE: i32 = 32;
