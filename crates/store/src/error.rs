//! Typed error type for the store crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The pool could not be opened or failed its health check.
    #[error("connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// A statement, `BEGIN` or `COMMIT` failed.
    ///
    /// `intent` names what the statement was for; the raw SQL is not carried.
    #[error("query failed ({intent}): {source}")]
    Query {
        intent: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A row did not have the shape the entity expects.
    #[error("cannot decode {kind} row: {source}")]
    RowDecode {
        kind: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The record and content tables no longer pair one-to-one.
    #[error("consistency violation ({intent}): expected {expected} rows affected, got {affected}")]
    Consistency {
        intent: &'static str,
        expected: u64,
        affected: u64,
    },

    #[error("deadline exceeded ({intent})")]
    DeadlineExceeded { intent: &'static str },

    #[error("invalid table name: {0}")]
    InvalidTable(String),

    #[error("config error: {0}")]
    Config(String),
}

impl StoreError {
    /// `true` for the "does not exist" outcome, as opposed to an operational failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn query(intent: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Query { intent, source }
    }

    pub(crate) fn decode(kind: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::RowDecode { kind, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let err = StoreError::NotFound { kind: "page", id: "7".into() };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "page '7' not found");

        let err = StoreError::Consistency { intent: "delete", expected: 2, affected: 1 };
        assert!(!err.is_not_found());
    }

    #[test]
    fn query_error_reports_intent_not_sql() {
        let err = StoreError::query("insert content row")(sqlx::Error::RowNotFound);
        let msg = err.to_string();
        assert!(msg.contains("insert content row"));
        assert!(!msg.contains("INSERT"));
    }
}
