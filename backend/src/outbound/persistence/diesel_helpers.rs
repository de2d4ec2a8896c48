//! Shared helpers for the Diesel repository implementations.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Classified Diesel failure, ready to be turned into a port error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection(String),
    /// Any other query or constraint failure.
    Query(String),
}

/// Classify a Diesel error and emit debug context.
pub fn classify_diesel_error(error: DieselError, operation: &str) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), %operation, "diesel operation failed");
        }
        _ => debug!(error_message = %error, %operation, "diesel operation failed"),
    }
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error".to_owned())
        }
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error".to_owned()),
        other => DieselFailure::Query(other.to_string()),
    }
}

/// Whether the error is a unique-constraint violation.
pub fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

/// Escape `%`, `_` and `\` so `text` matches literally inside a LIKE pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive substring pattern for `ILIKE`.
pub fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("spam", "%spam%")]
    #[case("50%", "%50\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case("c:\\", "%c:\\\\%")]
    fn patterns_escape_wildcards(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(text), expected);
    }

    #[rstest]
    fn closed_connections_classify_as_connection_failures() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert!(matches!(
            classify_diesel_error(error, "test"),
            DieselFailure::Connection(_)
        ));
    }

    #[rstest]
    fn unique_violations_are_detected() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );
        assert!(is_unique_violation(&error));
        assert!(!is_unique_violation(&DieselError::NotFound));
    }

    #[rstest]
    fn pool_messages_are_extracted() {
        assert_eq!(map_pool_error_message(PoolError::checkout("timed out")), "timed out");
    }
}
