use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use super::options::RequestOptions;
use super::Payload;
use crate::error::ServiceError;
use crate::ident::{self, HashVersion};
use crate::state::AppState;

/// `/api/v4`
///
/// # Errors
///
/// Returns [`ServiceError::Entropy`] when no secure randomness is available.
pub fn random(opts: &RequestOptions) -> Result<Payload, ServiceError> {
    let id = ident::v4()?;
    Ok(Payload::Identifier(opts.letter_case().render(&id)))
}

/// `/api/v{3,5}/<namespace>/<name>`; both segments arrive percent-decoded.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidNamespace`] when `namespace` is not a
/// canonical identifier.
pub fn hashed(
    version: HashVersion,
    namespace: &[u8],
    name: &[u8],
    opts: &RequestOptions,
) -> Result<Payload, ServiceError> {
    let namespace = std::str::from_utf8(namespace).map_err(|_| {
        ServiceError::InvalidNamespace(String::from_utf8_lossy(namespace).into_owned())
    })?;
    let id = ident::hash_str(version, namespace, name)?;
    Ok(Payload::Identifier(opts.letter_case().render(&id)))
}

/// `/api/v7`, honouring an explicit `seq` override.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidSequence`] for a malformed override and
/// propagates sequence and entropy failures.
pub async fn time_ordered(state: &AppState, opts: &RequestOptions) -> Result<Payload, ServiceError> {
    let seq_override = opts.seq_override()?;
    let id = ident::v7(seq_override, state.sequence()).await?;
    Ok(Payload::Identifier(opts.letter_case().render(&id)))
}

/// `/api/v7/seq-current`: the counter without advancing it.
///
/// # Errors
///
/// Returns [`ServiceError::SequenceInitFault`] when the counter cannot be loaded.
pub async fn sequence_current(state: &AppState) -> Result<Payload, ServiceError> {
    state.sequence().load().await.map(Payload::Counter)
}

/// Liveness probe.
#[must_use]
pub fn health(state: &AppState) -> Response {
    Json(json!({
        "status": "ok",
        "sequence": state.sequence().name(),
    }))
    .into_response()
}
