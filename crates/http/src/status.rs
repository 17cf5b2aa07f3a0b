//! Status and outcome types returned by catalog operations, and their HTTP mapping.
//!
//! Catalog operations never raise: they hand back an [`Outcome`], a status
//! paired with an optional value. A status whose code is not 2xx is an error;
//! callers short-circuit on it and pass it upward unchanged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Outcome codes used by the catalog, a subset of HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    Conflict,
    UnprocessableEntity,
    InternalServerError,
}

impl Code {
    /// Numeric HTTP status code.
    pub const fn as_u16(self) -> u16 {
        match self {
            Code::Ok => 200,
            Code::Created => 201,
            Code::NoContent => 204,
            Code::BadRequest => 400,
            Code::NotFound => 404,
            Code::Conflict => 409,
            Code::UnprocessableEntity => 422,
            Code::InternalServerError => 500,
        }
    }

    /// True for 2xx codes.
    pub const fn is_success(self) -> bool {
        self.as_u16() / 100 == 2
    }

    pub fn http(self) -> StatusCode {
        match self {
            Code::Ok => StatusCode::OK,
            Code::Created => StatusCode::CREATED,
            Code::NoContent => StatusCode::NO_CONTENT,
            Code::BadRequest => StatusCode::BAD_REQUEST,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::Conflict => StatusCode::CONFLICT,
            Code::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Code::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A code and a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Successful status, optionally carrying an informational message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(Code::Ok, message)
    }

    pub fn created() -> Self {
        Self::new(Code::Created, "")
    }

    pub fn no_content() -> Self {
        Self::new(Code::NoContent, "")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(Code::Conflict, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(Code::UnprocessableEntity, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::InternalServerError, message)
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the code is not 2xx.
    pub fn is_err(&self) -> bool {
        !self.code.is_success()
    }
}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        let status = self.code.http();

        if self.is_err() {
            let error_id = Uuid::new_v4();
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                message = %self.message,
                "request error"
            );
        }

        match self.code {
            Code::NoContent => status.into_response(),
            _ if self.message.is_empty() => status.into_response(),
            _ => (status, self.message).into_response(),
        }
    }
}

/// The status of an operation together with the value it produced, if any.
///
/// Some failures still carry a value: a conflicting create reports the row
/// that already occupies the natural key.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Outcome<T> {
    status: Status,
    value: Option<T>,
}

impl<T> Outcome<T> {
    pub fn new(status: Status, value: Option<T>) -> Self {
        Self { status, value }
    }

    /// `200 OK` with a value.
    pub fn ok(value: T) -> Self {
        Self::new(Status::ok(""), Some(value))
    }

    /// `201 Created` with the persisted value.
    pub fn created(value: T) -> Self {
        Self::new(Status::created(), Some(value))
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    pub fn into_parts(self) -> (Status, Option<T>) {
        (self.status, self.value)
    }

    /// `Err(status)` when the status is an error, otherwise the value.
    pub fn into_result(self) -> Result<Option<T>, Status> {
        if self.status.is_err() {
            Err(self.status)
        } else {
            Ok(self.value)
        }
    }
}

impl<T> From<Status> for Outcome<T> {
    fn from(status: Status) -> Self {
        Self::new(status, None)
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        match self.value {
            Some(value) if !self.status.is_err() && self.status.code() != Code::NoContent => {
                (self.status.code().http(), Json(value)).into_response()
            }
            _ => self.status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn error_predicate_follows_code_class() {
        assert!(!Status::ok("").is_err());
        assert!(!Status::created().is_err());
        assert!(!Status::no_content().is_err());
        assert!(Status::new(Code::BadRequest, "bad").is_err());
        assert!(Status::not_found("missing").is_err());
        assert!(Status::conflict("dup").is_err());
        assert!(Status::unprocessable("bad").is_err());
        assert!(Status::internal("boom").is_err());
    }

    #[test]
    fn into_result_short_circuits_on_error() {
        let outcome: Outcome<i32> = Outcome::new(Status::conflict("dup"), Some(7));
        assert_eq!(outcome.into_result(), Err(Status::conflict("dup")));

        let outcome = Outcome::ok(7);
        assert_eq!(outcome.into_result(), Ok(Some(7)));
    }

    #[test]
    fn status_displays_its_message() {
        let status = Status::not_found("Work with id = 3 does not exist");
        assert_eq!(status.to_string(), "Work with id = 3 does not exist");
    }

    #[tokio::test]
    async fn error_renders_as_plain_text() {
        let response = Status::conflict("duplicate key").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_text(response).await, "duplicate key");
    }

    #[tokio::test]
    async fn value_renders_as_json_with_status_code() {
        let response = Outcome::created(serde_json::json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await, r#"{"id":1}"#);
    }

    #[tokio::test]
    async fn soft_failure_renders_message_with_ok() {
        let outcome: Outcome<i32> = Status::ok("No fields in work to update").into();
        let response = outcome.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "No fields in work to update");
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let outcome: Outcome<i32> = Status::no_content().into();
        let response = outcome.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_text(response).await.is_empty());
    }
}
