//! Identifier generation for documents (DUID) and files (FUID).
//!
//! # DUID structure
//!
//! A DUID is a 20-byte payload rendered as 27 base-62 characters:
//!
//! ```text
//! 0       4                                      20
//! +-------+---------------------------------------+
//! | secs  |             random (128 bits)         |
//! +-------+---------------------------------------+
//! ```
//!
//! `secs` is a big-endian count of seconds since [`DUID_EPOCH`]. The alphabet
//! is ordered `0-9A-Za-z`, so lexicographic order of the text equals numeric
//! order of the payload. Within one process the generator never repeats: when
//! the clock has not advanced past the last payload it emits the last payload
//! plus one.
//!
//! A FUID is a lower-case, hyphenated UUIDv4.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::RngCore;
use uuid::Uuid;

use crate::defaults::DUID_LEN;

/// Seconds since the Unix epoch at which DUID time starts (2014-05-13T16:53:20Z).
pub const DUID_EPOCH: i64 = 1_400_000_000;

const PAYLOAD_LEN: usize = 20;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

static GLOBAL_DUIDS: Lazy<DuidGenerator> = Lazy::new(DuidGenerator::new);

/// Generate a new DUID from the process-wide generator.
pub fn new_duid() -> String {
    GLOBAL_DUIDS.next_id()
}

/// Generate a new FUID.
#[inline]
pub fn new_fuid() -> String {
    Uuid::new_v4().to_string()
}

/// Strictly increasing DUID source.
#[derive(Debug)]
pub struct DuidGenerator {
    last: Mutex<[u8; PAYLOAD_LEN]>,
}

impl Default for DuidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DuidGenerator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new([0u8; PAYLOAD_LEN]),
        }
    }

    /// Next identifier, greater than every identifier this generator returned before.
    pub fn next_id(&self) -> String {
        let secs = duid_seconds(Utc::now());
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        let last_secs = u32::from_be_bytes([last[0], last[1], last[2], last[3]]);
        let payload = if secs > last_secs {
            let mut fresh = [0u8; PAYLOAD_LEN];
            fresh[..4].copy_from_slice(&secs.to_be_bytes());
            rand::thread_rng().fill_bytes(&mut fresh[4..]);
            fresh
        } else {
            increment(*last)
        };
        *last = payload;
        drop(last);

        encode_base62(&payload)
    }
}

fn duid_seconds(now: DateTime<Utc>) -> u32 {
    (now.timestamp() - DUID_EPOCH).clamp(0, u32::MAX as i64) as u32
}

/// Big-endian add-one; carries from the random part into the seconds.
fn increment(mut payload: [u8; PAYLOAD_LEN]) -> [u8; PAYLOAD_LEN] {
    for byte in payload.iter_mut().rev() {
        let (next, overflow) = byte.overflowing_add(1);
        *byte = next;
        if !overflow {
            break;
        }
    }
    payload
}

fn encode_base62(payload: &[u8; PAYLOAD_LEN]) -> String {
    let mut digits = Vec::with_capacity(DUID_LEN);
    let mut number = payload.to_vec();

    while number.iter().any(|&b| b != 0) {
        let mut remainder: u32 = 0;
        for byte in number.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 62) as u8;
            remainder = acc % 62;
        }
        digits.push(BASE62[remainder as usize]);
    }
    while digits.len() < DUID_LEN {
        digits.push(b'0');
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_duid_shape() {
        let id = new_duid();
        assert_eq!(id.len(), DUID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_duid_strictly_increasing() {
        let generator = DuidGenerator::new();
        let mut previous = generator.next_id();
        for _ in 0..10_000 {
            let next = generator.next_id();
            assert!(next > previous, "{next} should sort after {previous}");
            previous = next;
        }
    }

    #[test]
    fn test_base62_extremes_fill_the_width() {
        let zero = [0u8; PAYLOAD_LEN];
        assert_eq!(encode_base62(&zero), "0".repeat(DUID_LEN));

        let max = [0xFFu8; PAYLOAD_LEN];
        let encoded = encode_base62(&max);
        assert_eq!(encoded.len(), DUID_LEN);
        assert!(encoded > encode_base62(&zero));
    }

    #[test]
    fn test_base62_preserves_payload_order() {
        let mut earlier = [0u8; PAYLOAD_LEN];
        earlier[..4].copy_from_slice(&100u32.to_be_bytes());
        earlier[4..].fill(0xFF);
        let mut later = [0u8; PAYLOAD_LEN];
        later[..4].copy_from_slice(&101u32.to_be_bytes());

        assert!(encode_base62(&earlier) < encode_base62(&later));
        assert!(encode_base62(&later) < encode_base62(&increment(later)));
    }

    #[test]
    fn test_increment_carries() {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[PAYLOAD_LEN - 1] = 0xFF;
        let next = increment(payload);
        assert_eq!(next[PAYLOAD_LEN - 1], 0);
        assert_eq!(next[PAYLOAD_LEN - 2], 1);
    }

    #[test]
    fn test_fuid_shape() {
        let id = new_fuid();
        assert_eq!(id.len(), 36);
        assert_eq!(id, id.to_lowercase());
        assert_eq!(id.matches('-').count(), 4);
    }

    #[test]
    fn test_concurrent_duids_are_distinct() {
        let generator = Arc::new(DuidGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..5_000).map(|_| generator.next_id()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate DUID");
            }
        }
        assert_eq!(seen.len(), 8 * 5_000);
    }
}
