//! Pipeline counters, shared between the ingest and processing threads.
//!
//! Every counter is written by exactly one thread and may be read by any.
//! Relaxed ordering is enough: the values are only reported, never used
//! to synchronize.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    // Ingest thread
    datagrams_received: AtomicU64,
    datagrams_rejected: AtomicU64,
    messages_enqueued: AtomicU64,
    messages_dropped: AtomicU64,
    // Processing thread
    messages_processed: AtomicU64,
    trades: AtomicU64,
    traded_qty: AtomicU64,
    orders_rested: AtomicU64,
}

/// A point-in-time copy of [`PipelineStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub datagrams_received: u64,
    /// Datagrams shorter than one wire record
    pub datagrams_rejected: u64,
    pub messages_enqueued: u64,
    /// Decoded messages dropped because the queue was full
    pub messages_dropped: u64,
    pub messages_processed: u64,
    pub trades: u64,
    pub traded_qty: u64,
    pub orders_rested: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_received(&self) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.datagrams_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.messages_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_trade(&self, qty: u32) {
        self.trades.fetch_add(1, Ordering::Relaxed);
        self.traded_qty.fetch_add(qty as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rested(&self) {
        self.orders_rested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            datagrams_rejected: self.datagrams_rejected.load(Ordering::Relaxed),
            messages_enqueued: self.messages_enqueued.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            trades: self.trades.load(Ordering::Relaxed),
            traded_qty: self.traded_qty.load(Ordering::Relaxed),
            orders_rested: self.orders_rested.load(Ordering::Relaxed),
        }
    }
}
