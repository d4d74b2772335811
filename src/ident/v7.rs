//! Time-ordered (version 7) identifiers.
//!
//! Layout, most significant bit first:
//!
//! ```text
//! unix_ts_ms:48 | ver:4 = 7 | rand_a:12 | var:2 = 0b10 | rand_b:62
//! ```
//!
//! The whole 64-bit sequence value follows the version nibble: its top 12
//! bits fill `rand_a` and its low 52 bits the top of `rand_b`. The last 10
//! bits are random. Identifiers therefore sort by `(timestamp, sequence)`
//! over the full `u64` range.

use uuid::Uuid;

use crate::error::ServiceError;
use crate::ident::random::fill_random;
use crate::sequence::SequenceActor;
use crate::util::unix_now_millis;

const MAX_TIMESTAMP: u64 = (1 << 48) - 1;
const SEQUENCE_LOW_BITS: u32 = 52;
const RANDOM_TAIL_BITS: u32 = 10;
const RANDOM_TAIL_MASK: u16 = (1 << RANDOM_TAIL_BITS) - 1;

/// Pack a v7 identifier from its parts. Timestamps wider than 48 bits are
/// masked, as are bits of `random_tail` above the low 10.
#[must_use]
pub fn pack_v7(unix_ts_ms: u64, sequence: u64, random_tail: u16) -> Uuid {
    let unix_ts_ms = unix_ts_ms & MAX_TIMESTAMP;
    let rand_a = (sequence >> SEQUENCE_LOW_BITS) as u16;
    let rand_b = ((sequence & ((1 << SEQUENCE_LOW_BITS) - 1)) << RANDOM_TAIL_BITS)
        | u64::from(random_tail & RANDOM_TAIL_MASK);

    let value = (u128::from(unix_ts_ms) << 80)
        | (0x7u128 << 76)
        | (u128::from(rand_a) << 64)
        | (0b10u128 << 62)
        | u128::from(rand_b);
    Uuid::from_u128(value)
}

/// Mint a v7 identifier.
///
/// An explicit `seq_override` is used verbatim and the sequence actor is not
/// consulted; otherwise the actor is incremented once.
///
/// # Errors
///
/// Propagates sequence actor failures and [`ServiceError::Entropy`].
pub async fn v7(seq_override: Option<u64>, sequence: &SequenceActor) -> Result<Uuid, ServiceError> {
    let seq = match seq_override {
        Some(seq) => seq,
        None => sequence.increment().await?,
    };
    let mut tail = [0u8; 2];
    fill_random(&mut tail)?;
    Ok(pack_v7(unix_now_millis(), seq, u16::from_be_bytes(tail)))
}
