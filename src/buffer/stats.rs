//! Buffer pool statistics and eviction event log.

use std::collections::VecDeque;
use std::fmt;

use crate::common::PageId;

/// Bound on how many recent eviction events are retained for observability.
const EVICTION_LOG_CAPACITY: usize = 64;

/// One eviction, recorded for diagnostics.
///
/// `sequence` is a logical clock local to the owning buffer pool (it
/// increments once per eviction) rather than a wall-clock timestamp, so
/// ordering is reproducible across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionEvent {
    pub sequence: u64,
    pub table: String,
    pub page_id: PageId,
    pub dirty: bool,
    pub reason: String,
}

impl fmt::Display for EvictionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} evicted {}/{} (dirty: {}): {}",
            self.sequence, self.table, self.page_id, self.dirty, self.reason
        )
    }
}

/// Counters and the bounded eviction log tracked by the buffer pool.
///
/// The pool is single-threaded (per-statement execution, never accessed
/// concurrently), so plain `u64` counters suffice — no atomics needed.
#[derive(Debug)]
pub struct BufferPoolStats {
    cache_hits: u64,
    cache_misses: u64,
    evictions: u64,
    pages_read: u64,
    pages_written: u64,
    next_sequence: u64,
    eviction_log: VecDeque<EvictionEvent>,
}

impl BufferPoolStats {
    pub fn new() -> Self {
        Self {
            cache_hits: 0,
            cache_misses: 0,
            evictions: 0,
            pages_read: 0,
            pages_written: 0,
            next_sequence: 0,
            eviction_log: VecDeque::new(),
        }
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn record_page_read(&mut self) {
        self.pages_read += 1;
    }

    pub fn record_page_written(&mut self) {
        self.pages_written += 1;
    }

    /// Record an eviction, appending it to the bounded log and dropping
    /// the oldest entry once [`EVICTION_LOG_CAPACITY`] is exceeded.
    pub fn record_eviction(&mut self, table: impl Into<String>, page_id: PageId, dirty: bool, reason: impl Into<String>) {
        self.evictions += 1;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if self.eviction_log.len() == EVICTION_LOG_CAPACITY {
            self.eviction_log.pop_front();
        }
        self.eviction_log.push_back(EvictionEvent {
            sequence,
            table: table.into(),
            page_id,
            dirty,
            reason: reason.into(),
        });
    }

    /// Most recent eviction events, oldest first, bounded to the last
    /// [`EVICTION_LOG_CAPACITY`] evictions.
    pub fn recent_evictions(&self) -> impl Iterator<Item = &EvictionEvent> {
        self.eviction_log.iter()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            evictions: self.evictions,
            pages_read: self.pages_read,
            pages_written: self.pages_written,
        }
    }

    /// Clear every counter and the eviction log. Distinct from normal
    /// operation: callers opt into losing the history.
    pub fn reset(&mut self) {
        self.cache_hits = 0;
        self.cache_misses = 0;
        self.evictions = 0;
        self.pages_read = 0;
        self.pages_written = 0;
        self.eviction_log.clear();
    }
}

impl Default for BufferPoolStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time, non-mutable copy of the counters, cheap to pass
/// around and print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
}

impl StatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let mut stats = BufferPoolStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_eviction_log_bounded() {
        let mut stats = BufferPoolStats::new();
        for i in 0..(EVICTION_LOG_CAPACITY + 10) {
            stats.record_eviction("t", PageId::new(i as u32), false, "capacity exceeded");
        }
        assert_eq!(stats.recent_evictions().count(), EVICTION_LOG_CAPACITY);
        assert_eq!(stats.snapshot().evictions, (EVICTION_LOG_CAPACITY + 10) as u64);
        let first = stats.recent_evictions().next().unwrap();
        assert_eq!(first.page_id, PageId::new(10));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut stats = BufferPoolStats::new();
        stats.record_hit();
        stats.record_eviction("t", PageId::new(0), true, "lru");
        stats.reset();
        assert_eq!(stats.snapshot().cache_hits, 0);
        assert_eq!(stats.recent_evictions().count(), 0);
    }
}
