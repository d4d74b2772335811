use std::fmt;

use uuid::Uuid;

use crate::error::ServiceError;

/// Name-based identifier version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashVersion {
    /// MD5 over `namespace || name`.
    V3,
    /// SHA-1 over `namespace || name`.
    #[default]
    V5,
}

impl HashVersion {
    /// Parse the `v3` / `v5` selector; matching ignores ASCII case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("v3") {
            Some(HashVersion::V3)
        } else if raw.eq_ignore_ascii_case("v5") {
            Some(HashVersion::V5)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HashVersion::V3 => "v3",
            HashVersion::V5 => "v5",
        }
    }
}

impl fmt::Display for HashVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a name-based identifier. Version nibble and variant bits are set
/// by the digest builder, so the result is always a valid v3/v5 value.
#[must_use]
pub fn hash(version: HashVersion, namespace: &Uuid, name: &[u8]) -> Uuid {
    match version {
        HashVersion::V3 => Uuid::new_v3(namespace, name),
        HashVersion::V5 => Uuid::new_v5(namespace, name),
    }
}

/// Validate `namespace` and then hash. Nothing is digested when the
/// namespace is malformed.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidNamespace`] when `namespace` is not a
/// canonical identifier string.
pub fn hash_str(version: HashVersion, namespace: &str, name: &[u8]) -> Result<Uuid, ServiceError> {
    let namespace = super::parse_identifier(namespace)?;
    Ok(hash(version, &namespace, name))
}
