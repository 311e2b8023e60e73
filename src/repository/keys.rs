//! Identity generators for entities inserted without an id.

use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Source of identities for entities inserted without one.
pub trait KeyGenerator<Id>: Send + Sync {
    fn next_key(&self) -> Id;
}

/// Random v4 UUIDs, as `Uuid` or as their hyphenated string.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidKeys;

impl KeyGenerator<Uuid> for UuidKeys {
    fn next_key(&self) -> Uuid {
        Uuid::new_v4()
    }
}

impl KeyGenerator<String> for UuidKeys {
    fn next_key(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Process-local increasing integers.
#[derive(Debug)]
pub struct SequenceKeys {
    next: AtomicI64,
}

impl SequenceKeys {
    pub fn starting_at(first: i64) -> Self {
        SequenceKeys {
            next: AtomicI64::new(first),
        }
    }
}

impl Default for SequenceKeys {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl KeyGenerator<i64> for SequenceKeys {
    fn next_key(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_counts_up() {
        let keys = SequenceKeys::starting_at(41);
        assert_eq!(keys.next_key(), 41);
        assert_eq!(keys.next_key(), 42);
    }

    #[test]
    fn uuid_keys_are_distinct() {
        let a: String = UuidKeys.next_key();
        let b: String = UuidKeys.next_key();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
