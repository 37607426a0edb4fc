use std::sync::atomic::{AtomicU64, Ordering};

/// 扇出计数器
#[derive(Debug, Default)]
pub struct FanoutStats {
    index_applied: AtomicU64,
    index_failed: AtomicU64,
    events_published: AtomicU64,
    events_failed: AtomicU64,
    dropped: AtomicU64,
}

/// 某一时刻的计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutStatsSnapshot {
    pub index_applied: u64,
    pub index_failed: u64,
    pub events_published: u64,
    pub events_failed: u64,
    pub dropped: u64,
}

impl FanoutStats {
    pub fn snapshot(&self) -> FanoutStatsSnapshot {
        FanoutStatsSnapshot {
            index_applied: self.index_applied.load(Ordering::Relaxed),
            index_failed: self.index_failed.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_index(&self, ok: bool) {
        let counter = if ok {
            &self.index_applied
        } else {
            &self.index_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_event(&self, ok: bool) {
        let counter = if ok {
            &self.events_published
        } else {
            &self.events_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}
