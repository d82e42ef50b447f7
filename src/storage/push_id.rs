//! Chronologically ordered push keys.
//!
//! A key is 8 characters of millisecond timestamp followed by 12 random
//! characters, both drawn from a 64-character alphabet whose ASCII order
//! matches its numeric order. Keys sort lexicographically by creation time;
//! keys created within the same millisecond increment the random tail.

use std::sync::Mutex;

use chrono::Utc;

use crate::storage::traits::StoreError;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_LEN: usize = 8;
const RAND_LEN: usize = 12;

/// Length of every generated push key.
pub const PUSH_ID_LEN: usize = TIME_LEN + RAND_LEN;

#[derive(Debug, Default)]
struct GeneratorState {
    last_ms: u64,
    last_rand: [u8; RAND_LEN],
}

/// Thread-safe generator of strictly increasing push keys.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<GeneratorState>,
}

impl PushIdGenerator {
    /// Create a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next key using the wall clock.
    ///
    /// # Errors
    /// `BackendError` if the internal lock is poisoned.
    pub fn next_id(&self) -> Result<String, StoreError> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        self.next_id_at(now)
    }

    fn next_id_at(&self, now_ms: u64) -> Result<String, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::BackendError("poisoned lock: push_id".to_string()))?;

        if now_ms > state.last_ms {
            state.last_ms = now_ms;
            state.last_rand = random_tail();
        } else if increment(&mut state.last_rand) {
            // Tail wrapped around; borrow the next millisecond.
            state.last_ms += 1;
        }

        let mut out = [0u8; PUSH_ID_LEN];
        let mut ts = state.last_ms;
        for slot in out[..TIME_LEN].iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        for (slot, &r) in out[TIME_LEN..].iter_mut().zip(state.last_rand.iter()) {
            *slot = PUSH_CHARS[r as usize];
        }

        Ok(out.iter().map(|&b| char::from(b)).collect())
    }
}

fn random_tail() -> [u8; RAND_LEN] {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let mut tail = [0u8; RAND_LEN];
    for (slot, b) in tail.iter_mut().zip(bytes.iter()) {
        *slot = b & 63;
    }
    tail
}

/// Increments the tail in base 64. Returns true on overflow.
fn increment(tail: &mut [u8; RAND_LEN]) -> bool {
    for digit in tail.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_id_shape() {
        let id = PushIdGenerator::new().next_id().unwrap();
        assert_eq!(id.len(), PUSH_ID_LEN);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_push_ids_strictly_increase_within_same_millisecond() {
        let gen = PushIdGenerator::new();
        let a = gen.next_id_at(1_700_000_000_000).unwrap();
        let b = gen.next_id_at(1_700_000_000_000).unwrap();
        let c = gen.next_id_at(1_700_000_000_000).unwrap();
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a[..TIME_LEN], b[..TIME_LEN]);
    }

    #[test]
    fn test_push_ids_stay_ordered_when_clock_goes_back() {
        let gen = PushIdGenerator::new();
        let a = gen.next_id_at(2_000).unwrap();
        let b = gen.next_id_at(1_000).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_push_ids_order_by_time() {
        let gen = PushIdGenerator::new();
        let a = gen.next_id_at(1_000).unwrap();
        let b = gen.next_id_at(64_000).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_increment_carries_and_overflows() {
        let mut tail = [0u8; RAND_LEN];
        tail[RAND_LEN - 1] = 63;
        assert!(!increment(&mut tail));
        assert_eq!(tail[RAND_LEN - 1], 0);
        assert_eq!(tail[RAND_LEN - 2], 1);

        let mut full = [63u8; RAND_LEN];
        assert!(increment(&mut full));
        assert_eq!(full, [0u8; RAND_LEN]);
    }
}
