//! Engine - the processing thread: pop decoded messages, drive the book.
//!
//! Owns the [`OrderBook`] exclusively. Input arrives through the consumer
//! half of the SPSC queue; output events go to a caller-supplied sink.

use tracing::{debug, info, trace};

use crate::command::{price_to_f64, OutputEvent};
use crate::config::IdleStrategy;
use crate::order_book::OrderBook;
use crate::shutdown::ShutdownToken;
use crate::spsc::Consumer;
use crate::stats::PipelineStats;
use crate::wire::WireMessage;

/// The matching engine that processes messages from a ring buffer.
pub struct Engine {
    /// The single-instrument order book
    pub book: OrderBook,
    /// Reused per message so the hot loop does not allocate
    events: Vec<OutputEvent>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            book: OrderBook::new(),
            events: Vec::with_capacity(64),
        }
    }

    /// Process one decoded message and return its output events.
    ///
    /// This is the main entry point for synchronous usage (testing, benchmarks).
    #[inline]
    pub fn process(&mut self, msg: &WireMessage) -> &[OutputEvent] {
        self.events.clear();
        self.book.add_order_into(msg.to_add_order(), &mut self.events);
        &self.events
    }

    /// Run the engine event loop until `token` is cancelled.
    ///
    /// Never blocks on the queue: when it is empty the `idle` strategy runs
    /// and the pop is retried. Messages still queued at shutdown are left
    /// unprocessed.
    pub fn run<F>(
        &mut self,
        input: &mut Consumer<WireMessage>,
        token: &ShutdownToken,
        idle: IdleStrategy,
        stats: &PipelineStats,
        mut sink: F,
    ) where
        F: FnMut(&OutputEvent),
    {
        info!(?idle, "engine ready to match");

        while !token.is_cancelled() {
            let Some(msg) = input.pop() else {
                idle.idle();
                continue;
            };

            for event in self.process(&msg) {
                match event {
                    OutputEvent::Trade(t) => {
                        stats.record_trade(t.qty);
                        debug!(
                            taker = t.taker_order_id,
                            maker = t.maker_order_id,
                            side = ?t.taker_side,
                            qty = t.qty,
                            price = price_to_f64(t.price),
                            "trade"
                        );
                    }
                    OutputEvent::Rested(r) => {
                        stats.record_rested();
                        trace!(
                            order_id = r.order_id,
                            side = ?r.side,
                            qty = r.qty,
                            price = price_to_f64(r.price),
                            "order added to book"
                        );
                    }
                }
                sink(event);
            }
            stats.record_processed();
        }

        debug!(
            pending = input.len(),
            orders = self.book.order_count(),
            "engine loop stopped"
        );
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) -> bool {
        let pinned = core_affinity::get_core_ids()
            .and_then(|ids| ids.last().copied())
            .map(core_affinity::set_for_current)
            .unwrap_or(false);
        debug!(pinned, "engine core pinning");
        pinned
    }

    /// Get the best bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.book.best_bid()
    }

    /// Get the best ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.book.best_ask()
    }

    /// Get the spread.
    #[inline]
    pub fn spread(&self) -> Option<u64> {
        self.book.spread()
    }

    /// Get total order count.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.book.state_hash()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Side;
    use crate::spsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn msg(order_id: u64, side: Side, price: u32, shares: u32) -> WireMessage {
        WireMessage::add_order(order_id, side, shares, "AAPL", price)
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new();
        assert_eq!(engine.order_count(), 0);
        assert_eq!(engine.best_bid(), None);
        assert_eq!(engine.best_ask(), None);
    }

    #[test]
    fn test_engine_process_rest() {
        let mut engine = Engine::new();

        let events = engine.process(&msg(1, Side::Bid, 1_500_000, 10)).to_vec();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OutputEvent::Rested(_)));
        assert_eq!(engine.order_count(), 1);
        assert_eq!(engine.best_bid(), Some(1_500_000));
    }

    #[test]
    fn test_engine_non_buy_byte_is_sell() {
        let mut engine = Engine::new();
        let mut odd = msg(1, Side::Bid, 1_500_000, 10);
        odd.side = b'X';

        engine.process(&odd);

        assert_eq!(engine.best_ask(), Some(1_500_000));
        assert_eq!(engine.best_bid(), None);
    }

    #[test]
    fn test_engine_process_match() {
        let mut engine = Engine::new();
        engine.process(&msg(1, Side::Bid, 1_500_000, 10));

        let events = engine.process(&msg(101, Side::Ask, 1_500_000, 10)).to_vec();

        assert_eq!(events.len(), 1);
        match events[0] {
            OutputEvent::Trade(t) => {
                assert_eq!(t.maker_order_id, 1);
                assert_eq!(t.taker_order_id, 101);
                assert_eq!(t.qty, 10);
            }
            other => panic!("Expected Trade, got {:?}", other),
        }
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_engine_state_hash_determinism() {
        let mut engine1 = Engine::new();
        let mut engine2 = Engine::new();

        for i in 0..100u32 {
            let m = msg(
                i as u64,
                if i % 2 == 0 { Side::Bid } else { Side::Ask },
                10_000 + (i % 10) * 10,
                100,
            );
            engine1.process(&m);
            engine2.process(&m);
        }

        assert_eq!(engine1.state_hash(), engine2.state_hash());
    }

    #[test]
    fn test_engine_run_until_cancelled() {
        let (mut tx, mut rx) = spsc::channel(16);
        let token = ShutdownToken::new();
        let stats = Arc::new(PipelineStats::new());

        tx.push(msg(1, Side::Bid, 10_000, 10)).unwrap();
        tx.push(msg(2, Side::Ask, 10_000, 4)).unwrap();

        let engine_token = token.clone();
        let engine_stats = stats.clone();
        let handle = thread::spawn(move || {
            let mut engine = Engine::new();
            let mut seen = Vec::new();
            engine.run(&mut rx, &engine_token, IdleStrategy::Yield, &engine_stats, |e| seen.push(*e));
            (engine, seen)
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        while stats.snapshot().messages_processed < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        token.cancel();

        let (engine, seen) = handle.join().unwrap();
        let snap = stats.snapshot();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[1], OutputEvent::Trade(_)));
        assert_eq!(snap.messages_processed, 2);
        assert_eq!(snap.traded_qty, 4);
        assert_eq!(engine.book.depth_at(Side::Bid, 10_000), (6, 1));
    }

    #[test]
    fn test_pin_to_core_does_not_panic() {
        let engine = Engine::new();
        let _ = engine.pin_to_core();
    }
}
