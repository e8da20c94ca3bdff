//! Error types for migsql

use thiserror::Error;

/// Result type alias for migsql operations
pub type MigResult<T> = Result<T, MigError>;

/// Errors raised while building migration SQL.
///
/// All of these are caller errors: nothing is retried, the migration step
/// that triggered them is expected to abort.
#[derive(Debug, Error)]
pub enum MigError {
    /// A parameter name was bound twice within one fragment
    #[error("Parameter \"{0}\" is already bound")]
    DuplicateParameterName(String),

    /// An array parameter has no elements, so its element type is unknown
    #[error("Parameter \"{0}\" is bound to an empty array")]
    EmptyArrayParameter(String),

    /// A predicate builder was called without fields
    #[error("{0} clause requires at least one field")]
    EmptyFieldSet(&'static str),

    /// A dynamic-name template has no `?` marker
    #[error("Name template \"{0}\" has no `?` marker, use a static statement instead")]
    StaticNameTemplate(String),

    /// A single-value lookup matched the wrong number of rows
    #[error("Expected {expected} row(s) in table {table}, found {actual}")]
    UnexpectedRowCount {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// A lookup returned a value of the wrong shape
    #[error("Unexpected value for {table}.{field}: {found}")]
    UnexpectedValue {
        table: String,
        field: String,
        found: String,
    },

    /// Malformed scratch variable or prepared statement name
    #[error("Invalid variable name: {0}")]
    InvalidVariable(String),

    /// Failure reported by the executing collaborator
    #[error("Executor error: {0}")]
    Executor(String),
}

impl MigError {
    /// Create a row-count error for a lookup against `table`
    pub fn unexpected_row_count(table: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::UnexpectedRowCount {
            table: table.into(),
            expected,
            actual,
        }
    }

    /// Create an executor error
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor(message.into())
    }

    /// Check if this is a duplicate parameter name error
    pub fn is_duplicate_parameter(&self) -> bool {
        matches!(self, Self::DuplicateParameterName(_))
    }

    /// Check if this is an empty array parameter error
    pub fn is_empty_array(&self) -> bool {
        matches!(self, Self::EmptyArrayParameter(_))
    }

    /// Check if this is a row-count error
    pub fn is_unexpected_row_count(&self) -> bool {
        matches!(self, Self::UnexpectedRowCount { .. })
    }
}
