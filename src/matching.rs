//! Matching - price-time priority crossing for the order book.
//!
//! Implements the cross/rest algorithm:
//! 1. CROSSING: Match the incoming intent against the opposite side,
//!    best level first, oldest order first within a level
//! 2. RESTING: Place remaining quantity in the book

use crate::command::{AddOrder, OrderRested, OutputEvent, Side, TradeEvent};
use crate::order_book::OrderBook;
use crate::price_level::Order;

impl OrderBook {
    /// Match and/or rest an add-order intent.
    ///
    /// This is the only mutator of the book. It performs no validation:
    /// a zero quantity is a no-op, any price (including 0) is accepted,
    /// and repeated order IDs rest as independent orders.
    ///
    /// # Returns
    /// Trades in execution order, followed by a `Rested` event if any
    /// quantity remained.
    pub fn add_order(&mut self, order_id: u64, side: Side, price: u64, qty: u32) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        self.add_order_into(
            AddOrder {
                order_id,
                side,
                price,
                qty,
            },
            &mut events,
        );
        events
    }

    /// Same as [`OrderBook::add_order`], appending to a caller-owned buffer.
    ///
    /// # Returns
    /// The quantity left resting (0 if fully matched).
    pub fn add_order_into(&mut self, order: AddOrder, events: &mut Vec<OutputEvent>) -> u32 {
        // Phase 1: CROSSING (aggressive matching)
        let remaining = self.cross_order(&order, events);

        // Phase 2: RESTING (passive posting)
        if remaining > 0 {
            self.rest_order(&order, remaining, events);
        }

        remaining
    }

    /// Cross an incoming order against the opposite side.
    ///
    /// # Returns
    /// Remaining quantity after matching
    fn cross_order(&mut self, taker: &AddOrder, events: &mut Vec<OutputEvent>) -> u32 {
        let mut remaining = taker.qty;
        let mut makers_done = 0;
        let maker_side = self.side_mut(taker.side.opposite());

        while remaining > 0 {
            let Some(level) = maker_side.best_mut() else {
                break; // No orders on opposite side
            };

            let level_price = level.price();
            if !prices_cross(taker.price, level_price, taker.side) {
                break;
            }

            // A level is never empty while in the book
            let Some(fill) = level.fill_front(remaining) else {
                break;
            };

            remaining -= fill.qty;
            events.push(OutputEvent::Trade(TradeEvent {
                price: level_price,
                qty: fill.qty,
                maker_order_id: fill.maker_order_id,
                taker_order_id: taker.order_id,
                taker_side: taker.side,
            }));

            if fill.maker_done {
                maker_side.remove_best_if_empty();
                makers_done += 1;
            }
        }

        self.order_count -= makers_done;
        remaining
    }

    /// Rest the residual of an order in the book (passive posting).
    fn rest_order(&mut self, order: &AddOrder, qty: u32, events: &mut Vec<OutputEvent>) {
        self.side_mut(order.side).insert(Order {
            order_id: order.order_id,
            side: order.side,
            price: order.price,
            qty,
        });
        self.order_count += 1;

        events.push(OutputEvent::Rested(OrderRested {
            order_id: order.order_id,
            side: order.side,
            price: order.price,
            qty,
        }));
    }
}

/// Check if an incoming order price crosses the opposite best price.
#[inline]
fn prices_cross(order_price: u64, opposite_best: u64, order_side: Side) -> bool {
    match order_side {
        // Buyer willing to pay >= lowest ask
        Side::Bid => order_price >= opposite_best,
        // Seller willing to accept <= highest bid
        Side::Ask => order_price <= opposite_best,
    }
}
