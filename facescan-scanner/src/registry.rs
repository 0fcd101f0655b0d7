use std::collections::HashSet;
use std::hash::{BuildHasher, RandomState};
use std::sync::{Mutex, PoisonError};

const DEFAULT_SHARDS: usize = 16;

/// Process-wide record of probe URLs that have already been dispatched.
///
/// Keys are spread over a fixed number of independently locked shards so
/// workers claiming unrelated URLs do not contend on one lock. Entries are
/// never removed.
pub struct DedupRegistry {
    shards: Vec<Mutex<HashSet<String>>>,
    hasher: RandomState,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    pub fn with_shards(shards: usize) -> Self {
        let shards = shards.max(1);
        Self {
            shards: (0..shards).map(|_| Mutex::new(HashSet::new())).collect(),
            hasher: RandomState::new(),
        }
    }

    /// Returns `true` only for the first claim of `url`; every later claim
    /// of the same string returns `false`.
    pub fn claim(&self, url: &str) -> bool {
        let mut shard = self
            .shard_for(url)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if shard.contains(url) {
            return false;
        }
        shard.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard_for(&self, url: &str) -> &Mutex<HashSet<String>> {
        let index = (self.hasher.hash_one(url) as usize) % self.shards.len();
        &self.shards[index]
    }
}

impl Default for DedupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
