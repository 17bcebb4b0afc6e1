//! Identifier allow-list: only letters, digits and underscore ever reach statement text.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// Longest identifier PostgreSQL keeps without truncation.
pub const MAX_IDENTIFIER_LEN: usize = 63;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("identifier pattern is valid"))
}

pub fn is_valid_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && identifier_pattern().is_match(name)
}

/// Reject `name` with `DataInvalid` unless it passes the allow-list.
pub fn validate_identifier(kind: &str, name: &str) -> Result<(), AppError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(AppError::data_invalid(format!("invalid {} identifier: {:?}", kind, name)))
    }
}

/// Quote a validated identifier for PostgreSQL.
pub(crate) fn quoted(name: &str) -> String {
    format!("\"{}\"", name)
}
