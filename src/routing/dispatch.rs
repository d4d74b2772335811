use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{self, Body};
use axum::http::{HeaderMap, Method, Request};
use axum::response::Response;

use crate::api::options::RequestOptions;
use crate::api::{form, handlers, respond, respond_error};
use crate::error::ServiceError;
use crate::ident::HashVersion;
use crate::observability::log_request_complete;
use crate::state::AppState;
use crate::util::percent_decode;

#[derive(Debug, PartialEq, Eq)]
enum RouteMatch<'a> {
    Form,
    Health,
    Random,
    Hashed {
        version: HashVersion,
        namespace: &'a str,
        name: &'a str,
    },
    TimeOrdered,
    SequenceCurrent,
    MethodNotAllowed,
    NotFound,
}

/// Dispatch a raw HTTP request to the matching handler.
///
/// # Errors
///
/// This function currently never returns `Err` and uses `Infallible`.
pub async fn dispatch_request(
    state: Arc<AppState>,
    request: Request<Body>,
) -> Result<Response, Infallible> {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();
    let route = match_route(&parts.method, path, state.base_path());

    let response = handle_route(&state, &parts.method, parts.uri.query(), &parts.headers, route, body).await;
    log_request_complete(&parts.method, path, response.status(), started.elapsed());
    Ok(response)
}

async fn handle_route(
    state: &AppState,
    method: &Method,
    query: Option<&str>,
    headers: &HeaderMap,
    route: RouteMatch<'_>,
    body: Body,
) -> Response {
    let default = state.default_encoding();
    match route {
        RouteMatch::NotFound => return respond_error(headers, default, &ServiceError::NotFound),
        RouteMatch::MethodNotAllowed => {
            return respond_error(headers, default, &ServiceError::MethodNotAllowed)
        }
        RouteMatch::Health => return handlers::health(state),
        RouteMatch::SequenceCurrent => {
            return respond(headers, default, handlers::sequence_current(state).await)
        }
        _ => {}
    }

    let body_bytes = if method == Method::POST {
        match read_request_body(body, state.config.server.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(err) => return respond_error(headers, default, &err),
        }
    } else {
        bytes::Bytes::new()
    };
    let opts = match RequestOptions::from_request(method, query, &body_bytes) {
        Ok(opts) => opts,
        Err(err) => return respond_error(headers, default, &err),
    };

    match route {
        RouteMatch::Form => form::page(state, &opts).await,
        RouteMatch::Random => respond(headers, default, handlers::random(&opts)),
        RouteMatch::Hashed {
            version,
            namespace,
            name,
        } => respond(
            headers,
            default,
            handlers::hashed(
                version,
                &percent_decode(namespace),
                &percent_decode(name),
                &opts,
            ),
        ),
        RouteMatch::TimeOrdered => {
            respond(headers, default, handlers::time_ordered(state, &opts).await)
        }
        RouteMatch::Health
        | RouteMatch::SequenceCurrent
        | RouteMatch::MethodNotAllowed
        | RouteMatch::NotFound => respond_error(headers, default, &ServiceError::NotFound),
    }
}

#[must_use]
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("/{}", trimmed.trim_end_matches('/'))
    }
}

async fn read_request_body(body: Body, limit: usize) -> Result<bytes::Bytes, ServiceError> {
    body::to_bytes(body, limit)
        .await
        .map_err(|_| ServiceError::PayloadTooLarge(limit))
}

fn get_or_post<'a>(method: &Method, route: RouteMatch<'a>) -> RouteMatch<'a> {
    if method == Method::GET || method == Method::POST {
        route
    } else {
        RouteMatch::MethodNotAllowed
    }
}

fn get_only<'a>(method: &Method, route: RouteMatch<'a>) -> RouteMatch<'a> {
    if method == Method::GET {
        route
    } else {
        RouteMatch::MethodNotAllowed
    }
}

fn match_route<'a>(method: &Method, path: &'a str, base_path: &str) -> RouteMatch<'a> {
    let Some(path) = strip_base_path(path, base_path) else {
        return RouteMatch::NotFound;
    };

    match path {
        "/" => get_or_post(method, RouteMatch::Form),
        "/healthz" => get_only(method, RouteMatch::Health),
        "/api/v4" => get_or_post(method, RouteMatch::Random),
        "/api/v7" => get_or_post(method, RouteMatch::TimeOrdered),
        "/api/v7/seq-current" => get_only(method, RouteMatch::SequenceCurrent),
        _ => match match_hashed(path) {
            Some(route) => get_or_post(method, route),
            None => RouteMatch::NotFound,
        },
    }
}

/// `/api/v3/<ns>/<name>` or `/api/v5/<ns>/<name>`, ignoring ASCII case in
/// the fixed segments. Both variable segments must be non-empty.
fn match_hashed(path: &str) -> Option<RouteMatch<'_>> {
    let mut segments = path.strip_prefix('/')?.split('/');
    let api = segments.next()?;
    let version = HashVersion::parse(segments.next()?)?;
    let namespace = segments.next()?;
    let name = segments.next()?;
    if !api.eq_ignore_ascii_case("api")
        || namespace.is_empty()
        || name.is_empty()
        || segments.next().is_some()
    {
        return None;
    }
    Some(RouteMatch::Hashed {
        version,
        namespace,
        name,
    })
}

fn strip_base_path<'a>(path: &'a str, base_path: &str) -> Option<&'a str> {
    if base_path.is_empty() {
        return Some(path);
    }

    let remainder = path.strip_prefix(base_path)?;
    if remainder.is_empty() {
        Some("/")
    } else if remainder.starts_with('/') {
        Some(remainder)
    } else {
        None
    }
}
