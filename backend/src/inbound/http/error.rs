//! Domain errors rendered as HTTP responses.
//!
//! Handlers return [`ApiResult`] and the domain [`Error`] becomes its own JSON
//! body. Server-side failures are logged here and reach clients in reduced
//! form: internal errors collapse to a generic message, while an unreachable
//! store keeps its message but loses details and adds a `Retry-After` hint.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, Error>;

const INTERNAL_MESSAGE: &str = "Internal server error";
const RETRY_AFTER_SECS: &str = "5";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The payload clients receive for `error`.
fn client_payload(error: &Error) -> Error {
    let reduced = match error.code() {
        ErrorCode::InternalError => Error::internal(INTERNAL_MESSAGE),
        ErrorCode::ServiceUnavailable => Error::service_unavailable(error.message()),
        _ => return error.clone(),
    };
    match error.trace_id() {
        Some(id) => reduced.with_trace_id(id.to_owned()),
        None => reduced,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(
                code = ?self.code(),
                message = %self.message(),
                trace_id = self.trace_id().unwrap_or_default(),
                "request failed"
            );
        }

        let mut builder = HttpResponse::build(status);
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        if self.code() == ErrorCode::ServiceUnavailable {
            builder.insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS));
        }
        builder.json(client_payload(self))
    }
}

#[cfg(test)]
mod tests;
