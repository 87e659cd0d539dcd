//! Validation of raw pagination arguments into a fetch plan.
//!
//! Pure argument-shape checking plus cursor decoding; nothing here touches
//! the data store. All violations are collected into path-addressed issues
//! and reported together, so a client fixing its request sees every
//! problem at once.

use crate::config::ConnectionConfig;
use crate::cursor::{self, CursorValues};
use crate::order::SortKeySpec;
use crate::{ArgumentIssue, ConnectionError, ConnectionResult};

/// Raw connection arguments as supplied by the caller. Any may be absent.
#[derive(Debug, Clone, Default)]
pub struct PaginationArguments {
    pub first: Option<i32>,
    pub after: Option<String>,
    pub last: Option<i32>,
    pub before: Option<String>,
}

impl PaginationArguments {
    pub fn forward(first: i32, after: Option<String>) -> Self {
        Self {
            first: Some(first),
            after,
            ..Self::default()
        }
    }

    pub fn backward(last: i32, before: Option<String>) -> Self {
        Self {
            last: Some(last),
            before,
            ..Self::default()
        }
    }
}

/// Derived plan for one window fetch.
///
/// `limit` is always `count + 1`: the extra sentinel row exists only so
/// the assembler can detect a further page without a COUNT query, and is
/// never surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub is_inversed: bool,
    pub count: i64,
    pub limit: i64,
    pub cursor: Option<CursorValues>,
}

impl FetchPlan {
    /// Name of the argument the active cursor arrived through.
    pub fn cursor_argument(&self) -> &'static str {
        if self.is_inversed {
            "before"
        } else {
            "after"
        }
    }
}

/// Validate raw arguments against the spec and config, producing a plan.
pub fn parse_arguments(
    args: &PaginationArguments,
    spec: &SortKeySpec,
    config: &ConnectionConfig,
) -> ConnectionResult<FetchPlan> {
    let mut issues: Vec<ArgumentIssue> = Vec::new();

    let (is_inversed, count) = match (args.first, args.last) {
        (Some(first), Some(_)) => {
            issues.push(ArgumentIssue::new(
                "last",
                r#"Argument "last" cannot be provided with argument "first"."#,
            ));
            (false, check_count("first", first, config, &mut issues))
        }
        (Some(first), None) => (false, check_count("first", first, config, &mut issues)),
        (None, Some(last)) => (true, check_count("last", last, config, &mut issues)),
        // Neither count argument: forward pagination at the server default.
        (None, None) => (false, i64::from(config.default_page_size)),
    };

    if is_inversed {
        if args.after.is_some() {
            issues.push(ArgumentIssue::new(
                "after",
                r#"Argument "after" cannot be provided with argument "last"."#,
            ));
        }
    } else if args.before.is_some() {
        let message = if args.first.is_some() {
            r#"Argument "before" cannot be provided with argument "first"."#
        } else {
            r#"Argument "before" cannot be provided without argument "last"."#
        };
        issues.push(ArgumentIssue::new("before", message));
    }

    let raw_cursor = if is_inversed {
        args.before.as_deref()
    } else {
        args.after.as_deref()
    };
    let cursor_argument = if is_inversed { "before" } else { "after" };

    let cursor = match raw_cursor {
        Some(raw) => match cursor::decode(raw, spec) {
            Ok(values) => Some(values),
            Err(_) => {
                issues.push(ArgumentIssue::new(cursor_argument, "Not a valid cursor."));
                None
            }
        },
        None => None,
    };

    if !issues.is_empty() {
        return Err(ConnectionError::invalid(issues));
    }

    Ok(FetchPlan {
        is_inversed,
        count,
        limit: count + 1,
        cursor,
    })
}

fn check_count(
    argument: &str,
    value: i32,
    config: &ConnectionConfig,
    issues: &mut Vec<ArgumentIssue>,
) -> i64 {
    if value < 1 || value > config.max_page_size {
        issues.push(ArgumentIssue::new(
            argument,
            format!(
                r#"Argument "{argument}" must be between 1 and {}."#,
                config.max_page_size
            ),
        ));
        // Clamped placeholder; the request fails before the count is used.
        return 0;
    }
    i64::from(value)
}
