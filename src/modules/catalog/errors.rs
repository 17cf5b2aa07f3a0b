//! Mapping of persistence failures onto catalog statuses.

use books_db::DbError;
use books_http::Status;

use super::store::StoreResult;

/// Insert or update failure: a unique violation is a conflict carrying the
/// driver text verbatim, anything else is unprocessable.
pub(crate) fn write_failed(err: DbError) -> Status {
    match err {
        DbError::UniqueViolation(message) => Status::conflict(message),
        other => Status::unprocessable(other.to_string()),
    }
}

pub(crate) fn read_failed(err: DbError) -> Status {
    Status::internal(err.to_string())
}

/// Delete outcome for a single row. A missing row is reported but is not an
/// error; a row still referenced elsewhere is a conflict.
pub(crate) fn deleted(entity: &str, id: i32, result: StoreResult<u64>) -> Status {
    match result {
        Ok(0) => Status::ok(format!("{entity} with id = {id} does not exist")),
        Ok(_) => Status::no_content(),
        Err(DbError::ForeignKeyViolation(message)) => Status::conflict(message),
        Err(err) => Status::internal(err.to_string()),
    }
}
