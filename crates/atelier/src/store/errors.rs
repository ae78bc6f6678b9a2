use sea_orm::DbErr;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Row not found.
    #[error("Not found: {context}")]
    NotFound { context: String },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    pub fn not_found(table: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            context: format!("{table} id={id}"),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_table_and_id() {
        let msg = StoreError::not_found("artworks", 42).to_string();
        assert_eq!(msg, "Not found: artworks id=42");
    }

    #[test]
    fn db_errors_convert() {
        let err: StoreError = DbErr::Custom("locked".into()).into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.to_string().contains("locked"));
    }
}
