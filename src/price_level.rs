//! Price Level - A FIFO queue of orders at a single price point.
//!
//! The oldest order sits at the front and is the first to match.
//! Orders are only ever appended at the back and consumed from the
//! front, so a `VecDeque` gives O(1) for both ends.

use std::collections::VecDeque;

use crate::command::Side;

/// A resting order. Quantity is always > 0 while the order is in a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Order {
    pub order_id: u64,
    pub side: Side,
    /// Price in wire ticks
    pub price: u64,
    /// Remaining quantity
    pub qty: u32,
}

/// Outcome of filling against the head order of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fill {
    /// Maker (resting) order ID
    pub maker_order_id: u64,
    /// Quantity executed
    pub qty: u32,
    /// The maker was fully filled and removed from the level
    pub maker_done: bool,
}

/// All resting orders at one price, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceLevel {
    price: u64,
    orders: VecDeque<Order>,
    /// Total quantity across all orders at this level
    total_qty: u64,
}

impl PriceLevel {
    /// Create a level holding its first order.
    pub fn with_order(order: Order) -> Self {
        debug_assert!(order.qty > 0);
        let mut orders = VecDeque::with_capacity(4);
        orders.push_back(order);
        Self {
            price: order.price,
            orders,
            total_qty: order.qty as u64,
        }
    }

    #[inline]
    pub fn price(&self) -> u64 {
        self.price
    }

    #[inline]
    pub fn total_qty(&self) -> u64 {
        self.total_qty
    }

    /// Number of orders at this level
    #[inline]
    pub fn count(&self) -> usize {
        self.orders.len()
    }

    /// An empty level must be removed from the book immediately.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Oldest order (next to match)
    #[inline]
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Orders oldest first
    pub fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.orders.iter()
    }

    /// Append an order to the tail of the queue (newest order).
    ///
    /// # Complexity
    /// O(1) amortized
    #[inline]
    pub fn push_back(&mut self, order: Order) {
        debug_assert_eq!(order.price, self.price);
        debug_assert!(order.qty > 0);
        self.total_qty += order.qty as u64;
        self.orders.push_back(order);
    }

    /// Fill up to `qty` against the head order.
    ///
    /// The head is removed once its quantity reaches zero; the remaining
    /// orders keep their arrival order. Returns `None` on an empty level.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn fill_front(&mut self, qty: u32) -> Option<Fill> {
        let head = self.orders.front_mut()?;
        let traded = qty.min(head.qty);
        head.qty -= traded;
        self.total_qty -= traded as u64;

        let maker_order_id = head.order_id;
        let maker_done = head.qty == 0;
        if maker_done {
            self.orders.pop_front();
        }

        Some(Fill {
            maker_order_id,
            qty: traded,
            maker_done,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_id: u64, qty: u32) -> Order {
        Order {
            order_id,
            side: Side::Ask,
            price: 10000,
            qty,
        }
    }

    fn level_with(orders: &[(u64, u32)]) -> PriceLevel {
        let mut level = PriceLevel::with_order(order(orders[0].0, orders[0].1));
        for &(id, qty) in &orders[1..] {
            level.push_back(order(id, qty));
        }
        level
    }

    #[test]
    fn test_single_order_level() {
        let level = PriceLevel::with_order(order(1, 100));
        assert!(!level.is_empty());
        assert_eq!(level.price(), 10000);
        assert_eq!(level.count(), 1);
        assert_eq!(level.total_qty(), 100);
        assert_eq!(level.front().map(|o| o.order_id), Some(1));
    }

    #[test]
    fn test_push_multiple_fifo() {
        let level = level_with(&[(1, 100), (2, 50), (3, 25)]);
        assert_eq!(level.count(), 3);
        assert_eq!(level.total_qty(), 175);

        let ids: Vec<u64> = level.orders().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_partial_fill_keeps_head() {
        let mut level = level_with(&[(1, 100), (2, 50)]);

        let fill = level.fill_front(30).unwrap();
        assert_eq!(fill, Fill { maker_order_id: 1, qty: 30, maker_done: false });
        assert_eq!(level.front().map(|o| (o.order_id, o.qty)), Some((1, 70)));
        assert_eq!(level.total_qty(), 120);
        assert_eq!(level.count(), 2);
    }

    #[test]
    fn test_full_fill_pops_head() {
        let mut level = level_with(&[(1, 100), (2, 50)]);

        let fill = level.fill_front(500).unwrap();
        assert_eq!(fill, Fill { maker_order_id: 1, qty: 100, maker_done: true });
        assert_eq!(level.front().map(|o| o.order_id), Some(2));
        assert_eq!(level.total_qty(), 50);

        let fill = level.fill_front(50).unwrap();
        assert!(fill.maker_done);
        assert!(level.is_empty());
        assert_eq!(level.total_qty(), 0);

        assert!(level.fill_front(10).is_none());
    }
}
