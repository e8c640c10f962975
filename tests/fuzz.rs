//! Fuzz Test - Compares the order book against a reference implementation.
//!
//! Uses a naive but correct BTreeMap-based book to verify the sorted-vector
//! book produces identical trades and resting state, and checks the book
//! invariants after every operation.

use itch_lob::{OrderBook, OutputEvent, PriceLevel, Side, TradeEvent};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Simple reference implementation for verification
struct ReferenceBook {
    bids: BTreeMap<u64, Vec<(u64, u32)>>, // price -> [(order_id, qty)]
    asks: BTreeMap<u64, Vec<(u64, u32)>>,
}

impl ReferenceBook {
    fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next_back().copied()
    }

    fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    fn order_count(&self) -> usize {
        self.bids.values().chain(self.asks.values()).map(Vec::len).sum()
    }

    /// Returns (price, qty, maker_id) per fill
    fn place(&mut self, order_id: u64, side: Side, price: u64, mut qty: u32) -> Vec<(u64, u32, u64)> {
        let mut fills = Vec::new();

        loop {
            if qty == 0 {
                break;
            }
            let best = match side {
                Side::Bid => self.best_ask().filter(|&p| p <= price),
                Side::Ask => self.best_bid().filter(|&p| p >= price),
            };
            let Some(level_price) = best else { break };

            let book = match side {
                Side::Bid => &mut self.asks,
                Side::Ask => &mut self.bids,
            };
            let orders = book.get_mut(&level_price).unwrap();
            let trade_qty = orders[0].1.min(qty);
            orders[0].1 -= trade_qty;
            qty -= trade_qty;
            fills.push((level_price, trade_qty, orders[0].0));

            if orders[0].1 == 0 {
                orders.remove(0);
            }
            if orders.is_empty() {
                book.remove(&level_price);
            }
        }

        if qty > 0 {
            let book = match side {
                Side::Bid => &mut self.bids,
                Side::Ask => &mut self.asks,
            };
            book.entry(price).or_default().push((order_id, qty));
        }

        fills
    }

    /// Levels best first, as (price, [(id, qty)])
    fn snapshot(&self, side: Side) -> Vec<(u64, Vec<(u64, u32)>)> {
        let levels: Vec<_> = match side {
            Side::Bid => self.bids.iter().rev().map(|(p, o)| (*p, o.clone())).collect(),
            Side::Ask => self.asks.iter().map(|(p, o)| (*p, o.clone())).collect(),
        };
        levels
    }
}

fn book_snapshot(book: &OrderBook, side: Side) -> Vec<(u64, Vec<(u64, u32)>)> {
    book.levels(side)
        .map(|level| {
            (
                level.price(),
                level.orders().map(|o| (o.order_id, o.qty)).collect(),
            )
        })
        .collect()
}

fn trades(events: &[OutputEvent]) -> Vec<TradeEvent> {
    events
        .iter()
        .filter_map(|e| if let OutputEvent::Trade(t) = e { Some(*t) } else { None })
        .collect()
}

fn assert_invariants(book: &OrderBook) {
    let bids: Vec<u64> = book.levels(Side::Bid).map(PriceLevel::price).collect();
    let asks: Vec<u64> = book.levels(Side::Ask).map(PriceLevel::price).collect();

    assert!(bids.windows(2).all(|w| w[0] > w[1]), "bids not strictly descending: {:?}", bids);
    assert!(asks.windows(2).all(|w| w[0] < w[1]), "asks not strictly ascending: {:?}", asks);

    let mut count = 0;
    for side in [Side::Bid, Side::Ask] {
        for level in book.levels(side) {
            assert!(!level.is_empty(), "empty level left at {}", level.price());
            let total: u64 = level.orders().map(|o| o.qty as u64).sum();
            assert_eq!(total, level.total_qty());
            for order in level.orders() {
                assert!(order.qty > 0, "zero-quantity order {} resting", order.order_id);
                assert_eq!(order.price, level.price());
                assert_eq!(order.side, side);
            }
            count += level.count();
        }
    }
    assert_eq!(count, book.order_count());
}

fn random_order(rng: &mut ChaCha8Rng) -> (Side, u64, u32) {
    (
        if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask },
        rng.gen_range(9_800..10_200) * 100,
        rng.gen_range(1..200),
    )
}

#[test]
fn test_fuzz_matches_reference() {
    const SEED: u64 = 0xFEEDFACE;
    const OPS: u64 = 10_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new();
    let mut reference = ReferenceBook::new();

    for order_id in 0..OPS {
        let (side, price, qty) = random_order(&mut rng);

        let events = book.add_order(order_id, side, price, qty);
        let expected = reference.place(order_id, side, price, qty);

        let got: Vec<(u64, u32, u64)> = trades(&events)
            .iter()
            .map(|t| {
                assert_eq!(t.taker_order_id, order_id);
                assert_eq!(t.taker_side, side);
                (t.price, t.qty, t.maker_order_id)
            })
            .collect();
        assert_eq!(got, expected, "trade mismatch at op {}", order_id);

        assert_eq!(book.best_bid(), reference.best_bid(), "best bid mismatch at op {}", order_id);
        assert_eq!(book.best_ask(), reference.best_ask(), "best ask mismatch at op {}", order_id);

        if order_id % 100 == 0 {
            assert_invariants(&book);
            assert_eq!(book.order_count(), reference.order_count());
        }
    }

    assert_invariants(&book);
    assert_eq!(book_snapshot(&book, Side::Bid), reference.snapshot(Side::Bid));
    assert_eq!(book_snapshot(&book, Side::Ask), reference.snapshot(Side::Ask));
}

#[test]
fn test_fuzz_conservation() {
    const SEED: u64 = 0x12345678;
    const OPS: u64 = 5_000;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new();

    for order_id in 0..OPS {
        let (side, price, qty) = random_order(&mut rng);
        let events = book.add_order(order_id, side, price, qty);

        let matched: u64 = trades(&events).iter().map(|t| t.qty as u64).sum();
        let rested: u64 = events
            .iter()
            .filter_map(|e| if let OutputEvent::Rested(r) = e { Some(r.qty as u64) } else { None })
            .sum();

        assert_eq!(matched + rested, qty as u64, "quantity not conserved at op {}", order_id);
        assert_invariants(&book);
    }
}

#[test]
fn test_fuzz_matching_boundary() {
    const SEED: u64 = 0xBADC0DE;

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut book = OrderBook::new();
    let mut next_id = 0u64;

    for _ in 0..2_000 {
        let (side, price, qty) = random_order(&mut rng);
        next_id += 1;
        let before: Vec<u64> = book.levels(side.opposite()).map(PriceLevel::price).collect();
        let events = book.add_order(next_id, side, price, qty);

        // Trade prices walk the opposite side best-first and never pass the limit
        let trade_prices: Vec<u64> = trades(&events).iter().map(|t| t.price).collect();
        for pair in trade_prices.windows(2) {
            match side {
                Side::Bid => assert!(pair[0] <= pair[1]),
                Side::Ask => assert!(pair[0] >= pair[1]),
            }
        }
        for &p in &trade_prices {
            match side {
                Side::Bid => assert!(p <= price),
                Side::Ask => assert!(p >= price),
            }
        }

        // If the order rested, every crossing level was consumed
        if matches!(events.last(), Some(OutputEvent::Rested(_))) {
            let crossing: Vec<u64> = before
                .iter()
                .copied()
                .filter(|&p| match side {
                    Side::Bid => p <= price,
                    Side::Ask => p >= price,
                })
                .collect();
            for p in crossing {
                assert!(book.get_level(side.opposite(), p).is_none(), "crossing level {} survived", p);
            }
        }
    }
}
