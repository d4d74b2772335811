use rand::rngs::OsRng;
use rand::RngCore;
use uuid::{Builder, Uuid};

use crate::error::ServiceError;

/// Fill `buf` from the operating system's secure entropy source.
///
/// A failing OS source is an error; no weaker generator is substituted.
///
/// # Errors
///
/// Returns [`ServiceError::Entropy`] when the entropy source is unavailable.
pub fn fill_random(buf: &mut [u8]) -> Result<(), ServiceError> {
    OsRng.try_fill_bytes(buf).map_err(|err| {
        tracing::error!("secure entropy source failed: {err}");
        ServiceError::Entropy(err.to_string())
    })
}

/// `n` bytes of secure random material.
///
/// # Errors
///
/// Returns [`ServiceError::Entropy`] when the entropy source is unavailable.
pub fn random_bytes(n: usize) -> Result<Vec<u8>, ServiceError> {
    let mut out = vec![0u8; n];
    fill_random(&mut out)?;
    Ok(out)
}

/// Random (version 4) identifier.
///
/// # Errors
///
/// Returns [`ServiceError::Entropy`] when the entropy source is unavailable.
pub fn v4() -> Result<Uuid, ServiceError> {
    let mut bytes = [0u8; 16];
    fill_random(&mut bytes)?;
    Ok(Builder::from_random_bytes(bytes).into_uuid())
}
