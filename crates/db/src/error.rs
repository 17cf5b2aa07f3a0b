use thiserror::Error;

/// Failure reported by the persistence layer.
///
/// Constraint violations keep the driver's message verbatim: callers surface
/// it to API consumers, who match on the constraint name it contains.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    UniqueViolation(String),

    #[error("{0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return DbError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return DbError::ForeignKeyViolation(db_err.message().to_string());
            }
        }
        DbError::Database(err)
    }
}
