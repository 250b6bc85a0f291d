//! Lexical statement-kind gate.
//!
//! The backend is read-only from the driver's point of view. Before any
//! statement leaves the process, a keyword scan rejects anything that is
//! not a plain `SELECT` or a `WITH ... SELECT` common table expression.
//! This is a lexical filter, not a parser: it only has to stop obvious
//! writes from reaching the wire.

use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that mark a statement as a write or a transaction control
/// command. Matched as whole words only; `UPDATEX` is an identifier, not a
/// keyword.
#[allow(clippy::unwrap_used)]
static BLOCKED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[^0-9A-Za-z])(INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|TRUNCATE|GRANT|REVOKE|COMMIT|ROLLBACK)(?:[^0-9A-Za-z]|$)",
    )
    .unwrap()
});

fn normalize(sql: &str) -> String {
    sql.trim().to_uppercase()
}

/// Whether the statement reads as a `SELECT` (directly, or behind a CTE
/// prologue within the first 20 characters).
#[must_use]
pub fn is_select(sql: &str) -> bool {
    let normalized = normalize(sql);
    if normalized.starts_with("SELECT") {
        return true;
    }
    match normalized.find("WITH") {
        Some(pos) if pos < 20 => normalized[pos..].contains("SELECT"),
        _ => false,
    }
}

/// Whether the statement may be sent to the backend.
///
/// Rejects any statement containing a blocked keyword as a whole word, then
/// requires the remainder to be a `SELECT`.
#[must_use]
pub fn is_read_only(sql: &str) -> bool {
    let normalized = normalize(sql);
    if BLOCKED.is_match(&normalized) {
        return false;
    }
    is_select(sql)
}
