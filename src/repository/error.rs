//! Repository Errors

use crate::domain::DomainError;

/// Errors raised by the Postgres data-access layer
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// UPDATE matched no row inside a unit of work that had locked it
    #[error("Row vanished during update: {0}")]
    RowNotFound(String),
}

impl From<RepositoryError> for DomainError {
    fn from(err: RepositoryError) -> Self {
        DomainError::PersistenceFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_is_persistence_failure() {
        let err: DomainError = RepositoryError::RowNotFound("accounts".into()).into();
        assert!(err.is_retryable());
        assert!(matches!(err, DomainError::PersistenceFailure(_)));
    }
}
