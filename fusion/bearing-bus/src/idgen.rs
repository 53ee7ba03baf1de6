//! Outbound message id generation.
//!
//! The reference scheme computes `id = floor(time) + mac`, which collides
//! whenever a sender issues two messages inside the same second. We instead
//! seed a per-process random salt once and hand out ids from a monotonic
//! counter, which the reference's own design notes call out as the fix
//! ("a monotonically increasing counter combined with the mac, or a UUID").
//! This guarantees per-sender uniqueness for the process lifetime without
//! needing real MAC-address access.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct IdGenerator {
    salt: u64,
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        let salt: u32 = rand::random();
        Self {
            salt: (salt as u64) << 32,
            counter: AtomicU64::new(0),
        }
    }

    /// Returns a fresh id, unique among all ids handed out by this generator.
    pub fn next(&self) -> i64 {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed);
        (self.salt | (counter & 0xFFFF_FFFF)) as i64
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sender's wall-clock time, in seconds, as used in the envelope's `time` field.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_ids_are_unique() {
        let gen = IdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_from_different_generators_rarely_collide_and_never_within_one() {
        let gen = IdGenerator::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(gen.next()));
        }
    }
}
