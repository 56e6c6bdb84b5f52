use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::trace;

/// Maps a ratelimit bucket key to the instant its window resets.
///
/// An entry only exists while the bucket is exhausted (`x-ratelimit-remaining: 0`). Entries whose
/// reset has passed are evicted either on the next lookup or by [`Self::sweep`].
#[derive(Debug, Default)]
pub struct BucketStore {
    resets: DashMap<String, Instant>,
}

impl BucketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How long a request on `key` has to wait at `now`, evicting the entry if its reset already
    /// passed.
    #[must_use]
    pub fn delay_for(&self, key: &str, now: Instant) -> Option<Duration> {
        let reset = *self.resets.get(key)?;

        if now >= reset {
            self.resets.remove_if(key, |_, reset| now >= *reset);
            return None;
        }

        Some(reset - now)
    }

    /// Records that `key` is exhausted until `reset`.
    pub fn record(&self, key: impl Into<String>, reset: Instant) {
        self.resets.insert(key.into(), reset);
    }

    /// Forgets `key`, because the last response reported requests remaining.
    pub fn clear(&self, key: &str) {
        self.resets.remove(key);
    }

    #[must_use]
    pub fn reset_at(&self, key: &str) -> Option<Instant> {
        self.resets.get(key).map(|reset| *reset)
    }

    /// Removes every entry whose reset has passed, returning how many were dropped.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.resets.len();
        self.resets.retain(|_, reset| *reset > now);
        let removed = before.saturating_sub(self.resets.len());

        trace!(removed, remaining = self.resets.len(), "Swept ratelimit buckets");

        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_until_reset() {
        let store = BucketStore::new();
        let now = Instant::now();
        let reset = now + Duration::from_secs(2);
        store.record("abc:1", reset);

        let before = reset - Duration::from_millis(1);
        assert_eq!(store.delay_for("abc:1", before), Some(Duration::from_millis(1)));

        let after = reset + Duration::from_millis(1);
        assert_eq!(store.delay_for("abc:1", after), None);
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_bucket_does_not_wait() {
        let store = BucketStore::new();
        assert_eq!(store.delay_for("missing", Instant::now()), None);
    }

    #[test]
    fn sweep_evicts_expired_only() {
        let store = BucketStore::new();
        let now = Instant::now();
        store.record("old", now);
        store.record("fresh", now + Duration::from_secs(10));

        assert_eq!(store.sweep(now + Duration::from_secs(1)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.reset_at("fresh").is_some());

        store.clear("fresh");
        assert!(store.is_empty());
    }
}
