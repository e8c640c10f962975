//! Order Book - The two-sided limit order book for a single instrument.
//!
//! Each side keeps its price levels in a sorted `Vec`, located by binary
//! search. The best level is stored at the end of the vector so that
//! consuming it during matching is a `pop`.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::command::Side;
use crate::price_level::{Order, PriceLevel};

/// One side of the book.
///
/// `levels` is sorted worst price first, best price last:
/// ascending for bids, descending for asks. Prices are unique.
#[derive(Clone, Debug)]
pub struct BookSide {
    side: Side,
    levels: Vec<PriceLevel>,
}

impl BookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: Vec::new(),
        }
    }

    /// Storage order of a level's price relative to `price`.
    #[inline]
    fn storage_cmp(&self, level_price: u64, price: u64) -> Ordering {
        match self.side {
            Side::Bid => level_price.cmp(&price),
            Side::Ask => price.cmp(&level_price),
        }
    }

    #[inline]
    fn search(&self, price: u64) -> Result<usize, usize> {
        self.levels
            .binary_search_by(|level| self.storage_cmp(level.price(), price))
    }

    /// Best (highest bid / lowest ask) level
    #[inline]
    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels.last()
    }

    #[inline]
    pub(crate) fn best_mut(&mut self) -> Option<&mut PriceLevel> {
        self.levels.last_mut()
    }

    /// Drop the best level once it has been emptied.
    #[inline]
    pub(crate) fn remove_best_if_empty(&mut self) {
        if self.levels.last().is_some_and(PriceLevel::is_empty) {
            self.levels.pop();
        }
    }

    /// Append to the level at `order.price`, creating it at its sorted
    /// position if needed.
    pub(crate) fn insert(&mut self, order: Order) {
        match self.search(order.price) {
            Ok(idx) => self.levels[idx].push_back(order),
            Err(idx) => self.levels.insert(idx, PriceLevel::with_order(order)),
        }
    }

    #[inline]
    pub fn get(&self, price: u64) -> Option<&PriceLevel> {
        self.search(price).ok().map(|idx| &self.levels[idx])
    }

    /// Levels in priority order (best first).
    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> + '_ {
        self.levels.iter().rev()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Price-time priority order book.
///
/// Only the processing thread ever holds one; nothing here is shared.
#[derive(Clone)]
pub struct OrderBook {
    pub(crate) bids: BookSide,
    pub(crate) asks: BookSide,
    /// Number of resting orders across both sides
    pub(crate) order_count: usize,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            bids: BookSide::new(Side::Bid),
            asks: BookSide::new(Side::Ask),
            order_count: 0,
        }
    }

    // ========================================================================
    // Best Price Access
    // ========================================================================

    /// Get the best bid price (highest buy price)
    #[inline]
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.best().map(PriceLevel::price)
    }

    /// Get the best ask price (lowest sell price)
    #[inline]
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.best().map(PriceLevel::price)
    }

    /// Get the best price on a given side
    #[inline]
    pub fn best_price(&self, side: Side) -> Option<u64> {
        self.side(side).best().map(PriceLevel::price)
    }

    // ========================================================================
    // Level Access
    // ========================================================================

    #[inline]
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[inline]
    pub(crate) fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Levels of one side, best price first.
    pub fn levels(&self, side: Side) -> impl Iterator<Item = &PriceLevel> + '_ {
        self.side(side).iter()
    }

    /// Get a price level (immutable)
    #[inline]
    pub fn get_level(&self, side: Side, price: u64) -> Option<&PriceLevel> {
        self.side(side).get(price)
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get the total number of orders in the book
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    /// Get the number of bid levels
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Get the number of ask levels
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Check if the book is empty
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Calculate spread (best_ask - best_bid)
    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    /// Get (total quantity, order count) at a price level
    pub fn depth_at(&self, side: Side, price: u64) -> (u64, usize) {
        self.get_level(side, price)
            .map(|l| (l.total_qty(), l.count()))
            .unwrap_or((0, 0))
    }

    /// Hash of every resting order, in priority order (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for side in [Side::Bid, Side::Ask] {
            side.hash(&mut hasher);
            for level in self.levels(side) {
                level.price().hash(&mut hasher);
                for order in level.orders() {
                    order.order_id.hash(&mut hasher);
                    order.qty.hash(&mut hasher);
                }
            }
        }
        self.order_count.hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.order_count)
            .finish()
    }
}
