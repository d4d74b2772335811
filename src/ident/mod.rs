//! RFC 4122 identifier generation.
//!
//! Every generator hands back a plain [`Uuid`]; rendering (including the
//! upper/lower case choice) happens once, through [`LetterCase::render`].

pub mod hash;
pub mod random;
pub mod v7;

use uuid::Uuid;

use crate::error::ServiceError;

pub use hash::{hash, hash_str, HashVersion};
pub use random::{fill_random, random_bytes, v4};
pub use v7::{pack_v7, v7};

const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];
const CANONICAL_LEN: usize = 36;

/// Parse the canonical 8-4-4-4-12 form; hex digits may be either case.
///
/// Braced, URN and un-hyphenated forms are rejected so that a namespace
/// typed into a URL is either used verbatim or refused.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidNamespace`] echoing the input when it is not
/// a well-formed identifier.
pub fn parse_identifier(input: &str) -> Result<Uuid, ServiceError> {
    let invalid = || ServiceError::InvalidNamespace(input.to_string());
    let bytes = input.as_bytes();
    if bytes.len() != CANONICAL_LEN {
        return Err(invalid());
    }
    for (index, byte) in bytes.iter().enumerate() {
        let ok = if HYPHEN_POSITIONS.contains(&index) {
            *byte == b'-'
        } else {
            byte.is_ascii_hexdigit()
        };
        if !ok {
            return Err(invalid());
        }
    }
    Uuid::try_parse(input).map_err(|_| invalid())
}

#[must_use]
pub fn is_identifier(input: &str) -> bool {
    parse_identifier(input).is_ok()
}

/// Output letter case, applied uniformly after generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LetterCase {
    #[default]
    Lower,
    Upper,
}

impl LetterCase {
    #[must_use]
    pub fn from_uppercase_flag(uppercase: bool) -> Self {
        if uppercase {
            LetterCase::Upper
        } else {
            LetterCase::Lower
        }
    }

    #[must_use]
    pub fn render(self, id: &Uuid) -> String {
        let mut buf = Uuid::encode_buffer();
        let text = match self {
            LetterCase::Lower => id.hyphenated().encode_lower(&mut buf),
            LetterCase::Upper => id.hyphenated().encode_upper(&mut buf),
        };
        text.to_string()
    }
}

/// Version nibble of an identifier (bits 48..52).
#[must_use]
pub fn version_nibble(id: &Uuid) -> u8 {
    id.as_bytes()[6] >> 4
}

/// True when the variant bits carry the RFC 4122 `10` pattern.
#[must_use]
pub fn has_rfc4122_variant(id: &Uuid) -> bool {
    id.as_bytes()[8] & 0xc0 == 0x80
}
