//! Telegram update deduplication cache

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Default dedup TTL (5 minutes)
const DEDUP_TTL_SECS: u64 = 300;

/// Maximum dedup cache entries
const DEDUP_MAX_ENTRIES: usize = 2000;

/// Remembers recently seen update ids
///
/// Guards against handling one update twice when a `getUpdates` response is
/// retried or overlaps the previous batch. Entries expire after a TTL and the
/// oldest are dropped once the cache is full.
#[derive(Debug)]
pub struct UpdateDedup {
    seen: HashMap<i64, Instant>,
    order: VecDeque<i64>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for UpdateDedup {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEDUP_TTL_SECS), DEDUP_MAX_ENTRIES)
    }
}

impl UpdateDedup {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            seen: HashMap::new(),
            order: VecDeque::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Record `update_id`; returns `true` if it was already seen within the TTL
    pub fn is_duplicate(&mut self, update_id: i64) -> bool {
        let now = Instant::now();
        self.expire(now);

        if self.seen.contains_key(&update_id) {
            return true;
        }

        while self.order.len() >= self.max_entries {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        self.seen.insert(update_id, now);
        self.order.push_back(update_id);
        false
    }

    /// Number of ids currently remembered
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn expire(&mut self, now: Instant) {
        while let Some(&oldest) = self.order.front() {
            let expired = self
                .seen
                .get(&oldest)
                .is_none_or(|seen_at| now.duration_since(*seen_at) >= self.ttl);
            if !expired {
                break;
            }
            self.order.pop_front();
            self.seen.remove(&oldest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_sight_is_duplicate() {
        let mut dedup = UpdateDedup::default();
        assert!(!dedup.is_duplicate(10));
        assert!(dedup.is_duplicate(10));
        assert!(!dedup.is_duplicate(11));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn oldest_dropped_at_capacity() {
        let mut dedup = UpdateDedup::new(Duration::from_secs(300), 2);
        dedup.is_duplicate(1);
        dedup.is_duplicate(2);
        dedup.is_duplicate(3);

        assert_eq!(dedup.len(), 2);
        assert!(!dedup.is_duplicate(1));
    }

    #[test]
    fn expired_ids_are_forgotten() {
        let mut dedup = UpdateDedup::new(Duration::ZERO, 10);
        assert!(!dedup.is_duplicate(5));
        assert!(!dedup.is_duplicate(5));
    }
}
