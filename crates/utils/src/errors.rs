use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Store unavailable / write failed. The user can safely resubmit,
    /// nothing about their form state was changed.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AppError::Database(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_classification() {
        assert!(!AppError::NotFound("x".to_string()).is_persistence());
        assert!(!AppError::Internal("x".to_string()).is_persistence());
    }
}
