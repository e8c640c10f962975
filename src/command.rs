//! Command and Event types for the matching engine.
//!
//! Commands are decoded intents handed over by the ingest thread.
//! Events are outputs of the processing thread.

/// Number of implied decimal digits in a wire price (wire ticks / 10_000).
pub const PRICE_SCALE: u64 = 10_000;

/// Convert a quoted price (e.g. `100.5`) to wire ticks, rounding to the nearest tick.
#[inline]
pub fn price_from_f64(price: f64) -> u64 {
    (price * PRICE_SCALE as f64).round() as u64
}

/// Convert wire ticks to the quoted price.
#[inline]
pub fn price_to_f64(ticks: u64) -> f64 {
    ticks as f64 / PRICE_SCALE as f64
}

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Wire byte for a buy order.
    pub const BUY_BYTE: u8 = b'B';
    /// Wire byte written for a sell order.
    pub const SELL_BYTE: u8 = b'S';

    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Interpret a wire side byte. Only `'B'` is a buy; any other byte is a sell.
    #[inline]
    pub const fn from_wire(byte: u8) -> Self {
        if byte == Self::BUY_BYTE {
            Side::Bid
        } else {
            Side::Ask
        }
    }

    /// Wire byte for this side ('B' / 'S')
    #[inline]
    pub const fn to_wire(self) -> u8 {
        match self {
            Side::Bid => Self::BUY_BYTE,
            Side::Ask => Self::SELL_BYTE,
        }
    }
}

// ============================================================================
// Input Commands
// ============================================================================

/// An add-order intent, prior to matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddOrder {
    /// Wire order ID (not enforced unique)
    pub order_id: u64,
    /// Order side (bid/ask)
    pub side: Side,
    /// Price in wire ticks (e.g., $100.50 -> 1005000)
    pub price: u64,
    /// Order quantity
    pub qty: u32,
}

// ============================================================================
// Output Events
// ============================================================================

/// A trade was executed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeEvent {
    /// Execution price (the resting level's price)
    pub price: u64,
    /// Executed quantity
    pub qty: u32,
    /// Maker (resting) order ID
    pub maker_order_id: u64,
    /// Taker (incoming) order ID
    pub taker_order_id: u64,
    /// Side of the taker order
    pub taker_side: Side,
}

/// Residual quantity of an intent was placed in the book
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderRested {
    pub order_id: u64,
    pub side: Side,
    pub price: u64,
    pub qty: u32,
}

/// Output events from the matching engine, in emission order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputEvent {
    /// Trade executed
    Trade(TradeEvent),
    /// Order resting in the book
    Rested(OrderRested),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_from_wire() {
        assert_eq!(Side::from_wire(b'B'), Side::Bid);
        assert_eq!(Side::from_wire(b'S'), Side::Ask);
        // Anything that is not 'B' falls back to sell
        assert_eq!(Side::from_wire(b'b'), Side::Ask);
        assert_eq!(Side::from_wire(0), Side::Ask);
        assert_eq!(Side::from_wire(Side::Bid.to_wire()), Side::Bid);
        assert_eq!(Side::from_wire(Side::Ask.to_wire()), Side::Ask);
    }

    #[test]
    fn test_price_scaling() {
        assert_eq!(price_from_f64(100.0), 1_000_000);
        assert_eq!(price_from_f64(100.5), 1_005_000);
        assert_eq!(price_from_f64(0.0001), 1);
        assert_eq!(price_to_f64(1_005_000), 100.5);
    }
}
