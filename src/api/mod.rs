//! Request handling: options parsing, the identifier endpoints, the HTML
//! form page and the shared response envelope.

pub mod form;
pub mod handlers;
pub mod options;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::ServiceError;
use crate::negotiate::{select_from_headers, Encoding};

/// Successful endpoint output, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A rendered identifier.
    Identifier(String),
    /// A bare counter value.
    Counter(u64),
}

impl Payload {
    fn text(&self) -> String {
        match self {
            Payload::Identifier(id) => id.clone(),
            Payload::Counter(value) => value.to_string(),
        }
    }

    fn json(&self) -> serde_json::Value {
        match self {
            Payload::Identifier(id) => json!({ "result": id }),
            Payload::Counter(value) => json!({ "result": value }),
        }
    }
}

/// Encode a success payload as `{"result": ..}` or the bare value.
#[must_use]
pub fn respond_ok(headers: &HeaderMap, default: Encoding, payload: &Payload) -> Response {
    match select_from_headers(headers, default) {
        Encoding::Json => encoded(StatusCode::OK, Encoding::Json, payload.json().to_string()),
        Encoding::Txt => encoded(StatusCode::OK, Encoding::Txt, payload.text()),
    }
}

/// Encode an error as `{"error": ..}` or `error: ..`.
///
/// Server errors negotiate with plain text as the default so a failure is
/// readable even when no usable `accept` header was sent. The fixed
/// not-found message is sent without the `error: ` prefix.
#[must_use]
pub fn respond_error(headers: &HeaderMap, default: Encoding, err: &ServiceError) -> Response {
    let status = err.status();
    let default = if err.is_fatal() { Encoding::Txt } else { default };
    let message = err.to_string();
    match select_from_headers(headers, default) {
        Encoding::Json => encoded(
            status,
            Encoding::Json,
            json!({ "error": message }).to_string(),
        ),
        Encoding::Txt => {
            let body = if matches!(err, ServiceError::NotFound) {
                message
            } else {
                format!("error: {message}")
            };
            encoded(status, Encoding::Txt, body)
        }
    }
}

/// [`respond_ok`] or [`respond_error`] depending on `result`.
#[must_use]
pub fn respond(
    headers: &HeaderMap,
    default: Encoding,
    result: Result<Payload, ServiceError>,
) -> Response {
    match result {
        Ok(payload) => respond_ok(headers, default, &payload),
        Err(err) => {
            if err.is_fatal() {
                tracing::warn!("request failed: {err}");
            }
            respond_error(headers, default, &err)
        }
    }
}

fn encoded(status: StatusCode, encoding: Encoding, body: String) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(encoding.content_type()),
        )],
        Body::from(body),
    )
        .into_response()
}
