//! Response rendering for domain errors.

use super::*;
use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn trace_id() -> String {
    "00000000-0000-0000-0000-000000000000".to_owned()
}

#[rstest]
#[case::validation(Error::invalid_request("Please enter a password."), StatusCode::BAD_REQUEST)]
#[case::login(Error::unauthorized("login required"), StatusCode::UNAUTHORIZED)]
#[case::forbidden(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case::missing_recipe(Error::not_found("recipe not found"), StatusCode::NOT_FOUND)]
#[case::taken_email(Error::conflict("A user with that email already exists."), StatusCode::CONFLICT)]
#[case::store_down(Error::service_unavailable("recipe store unavailable"), StatusCode::SERVICE_UNAVAILABLE)]
#[case::bug(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_follows_the_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

struct Rendered {
    status: StatusCode,
    trace_header: Option<String>,
    retry_after: Option<String>,
    payload: Error,
}

async fn render(error: Error) -> Rendered {
    let response = ResponseError::error_response(&error);
    let header_text = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .map(|value: &header::HeaderValue| value.to_str().expect("ascii header").to_owned())
    };
    let trace_header = header_text(header::HeaderName::from_static(TRACE_ID_HEADER));
    let retry_after = header_text(header::RETRY_AFTER);
    let status = response.status();
    let bytes = to_bytes(response.into_body()).await.expect("body");
    Rendered {
        status,
        trace_header,
        retry_after,
        payload: serde_json::from_slice(&bytes).expect("error JSON"),
    }
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_replaced_by_a_generic_message(trace_id: String) {
    let rendered = render(
        Error::internal("pool checkout failed for postgres://admin@db")
            .with_trace_id(trace_id.clone())
            .with_details(json!({"query": "SELECT"})),
    )
    .await;

    assert_eq!(rendered.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(rendered.trace_header.as_deref(), Some(trace_id.as_str()));
    assert_eq!(rendered.retry_after, None);
    assert_eq!(rendered.payload.message(), INTERNAL_MESSAGE);
    assert_eq!(rendered.payload.details(), None);
    assert_eq!(rendered.payload.trace_id(), Some(trace_id.as_str()));
}

#[rstest]
#[actix_web::test]
async fn unavailable_store_keeps_message_and_asks_for_retry(trace_id: String) {
    let rendered = render(
        Error::service_unavailable("recipe store unavailable")
            .with_trace_id(trace_id.clone())
            .with_details(json!({"host": "db.internal"})),
    )
    .await;

    assert_eq!(rendered.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(rendered.retry_after.as_deref(), Some(RETRY_AFTER_SECS));
    assert_eq!(rendered.payload.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(rendered.payload.message(), "recipe store unavailable");
    assert_eq!(rendered.payload.details(), None);
    assert_eq!(rendered.payload.trace_id(), Some(trace_id.as_str()));
}

#[rstest]
#[actix_web::test]
async fn client_errors_pass_through_unchanged() {
    let error =
        Error::invalid_request("You must specify a name.").with_details(json!({"field": "name"}));

    let rendered = render(error.clone()).await;

    assert_eq!(rendered.status, StatusCode::BAD_REQUEST);
    assert_eq!(rendered.trace_header, None);
    assert_eq!(rendered.retry_after, None);
    assert_eq!(rendered.payload, error);
}
