use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }
}

/// The in-memory keyspace: key -> (value, optional expiry instant), with
/// lazy TTL evaluation on read. No persistence, no eviction beyond lazy
/// expiry — exactly the scope described for the keyspace component.
pub struct Database {
    entries: HashMap<Vec<u8>, Entry>,
}

pub enum SetOutcome {
    Stored,
    AlreadyExists,
}

impl Database {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts `(key, value)` only if `key` is absent. A deliberate
    /// simplification over real Redis's SET-overwrites semantics: existing
    /// keys are left untouched and the call reports `AlreadyExists`.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>, expiry_ms: Option<u64>) -> SetOutcome {
        if self.entries.contains_key(&key) {
            return SetOutcome::AlreadyExists;
        }

        let expires_at = expiry_ms.map(|ms| Instant::now() + Duration::from_millis(ms));
        self.entries.insert(key, Entry { value, expires_at });
        SetOutcome::Stored
    }

    /// Returns the stored value, lazily removing (and reporting absent for)
    /// an entry whose expiry has passed.
    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let now = Instant::now();

        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Removes `key` if present, returning whether it was.
    pub fn del(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }
}
