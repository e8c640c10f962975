//! Wire Decoder - fixed 38-byte ITCH "add order" layout.
//!
//! All multi-byte integers are big-endian on the wire and are normalized
//! to host order while decoding. Single-byte fields and the symbol are
//! copied as-is.
//!
//! # Layout
//!
//! | Field        | Type    | Offset | Size |
//! |--------------|---------|--------|------|
//! | msg_type     | u8      | 0      | 1    |
//! | stock_locate | u16     | 1      | 2    |
//! | tracking     | u16     | 3      | 2    |
//! | timestamp    | u64     | 5      | 8    |
//! | order_id     | u64     | 13     | 8    |
//! | side         | u8      | 21     | 1    |
//! | shares       | u32     | 22     | 4    |
//! | stock        | [u8; 8] | 26     | 8    |
//! | price        | u32     | 34     | 4    |
//! | **Total**    |         |        | 38   |

use thiserror::Error;

use crate::command::{AddOrder, Side};

/// Width of an add-order record on the wire.
pub const MESSAGE_LEN: usize = 38;

/// Type tag of an add-order message.
pub const ADD_ORDER: u8 = b'A';

const TYPE: usize = 0;
const LOCATE: usize = 1;
const TRACKING: usize = 3;
const TIMESTAMP: usize = 5;
const ORDER_ID: usize = 13;
const SIDE: usize = 21;
const SHARES: usize = 22;
const STOCK: usize = 26;
const PRICE: usize = 34;

const _: () = assert!(PRICE + 4 == MESSAGE_LEN, "wire layout must be exactly 38 bytes");

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram too short: {len} bytes, need 38")]
    Truncated { len: usize },
}

/// A decoded add-order message. Fields are in host byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WireMessage {
    /// Message type tag, passed through unchecked
    pub msg_type: u8,
    pub stock_locate: u16,
    pub tracking: u16,
    /// Nanoseconds, as sent
    pub timestamp: u64,
    pub order_id: u64,
    /// Raw side byte (`'B'` = buy, anything else = sell)
    pub side: u8,
    pub shares: u32,
    /// Space-padded ASCII symbol
    pub stock: [u8; 8],
    /// Price in wire ticks (4 implied decimals)
    pub price: u32,
}

/// Decode a 38-byte record. Cannot fail: the length is part of the type.
#[inline]
pub fn decode(buf: &[u8; MESSAGE_LEN]) -> WireMessage {
    WireMessage {
        msg_type: buf[TYPE],
        stock_locate: u16::from_be_bytes(field(buf, LOCATE)),
        tracking: u16::from_be_bytes(field(buf, TRACKING)),
        timestamp: u64::from_be_bytes(field(buf, TIMESTAMP)),
        order_id: u64::from_be_bytes(field(buf, ORDER_ID)),
        side: buf[SIDE],
        shares: u32::from_be_bytes(field(buf, SHARES)),
        stock: field(buf, STOCK),
        price: u32::from_be_bytes(field(buf, PRICE)),
    }
}

/// Copy `N` bytes starting at `offset`. Offsets are compile-time constants
/// that fit inside the record, so the slice conversion is infallible.
#[inline(always)]
fn field<const N: usize>(buf: &[u8; MESSAGE_LEN], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

impl WireMessage {
    /// Build an add-order message for the given intent.
    pub fn add_order(order_id: u64, side: Side, shares: u32, stock: &str, price: u32) -> Self {
        Self {
            msg_type: ADD_ORDER,
            stock_locate: 1,
            tracking: 1,
            timestamp: 0,
            order_id,
            side: side.to_wire(),
            shares,
            stock: pad_symbol(stock),
            price,
        }
    }

    /// Encode into the big-endian wire layout.
    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let mut buf = [0u8; MESSAGE_LEN];
        buf[TYPE] = self.msg_type;
        buf[LOCATE..TRACKING].copy_from_slice(&self.stock_locate.to_be_bytes());
        buf[TRACKING..TIMESTAMP].copy_from_slice(&self.tracking.to_be_bytes());
        buf[TIMESTAMP..ORDER_ID].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[ORDER_ID..SIDE].copy_from_slice(&self.order_id.to_be_bytes());
        buf[SIDE] = self.side;
        buf[SHARES..STOCK].copy_from_slice(&self.shares.to_be_bytes());
        buf[STOCK..PRICE].copy_from_slice(&self.stock);
        buf[PRICE..].copy_from_slice(&self.price.to_be_bytes());
        buf
    }

    #[inline]
    pub fn is_add_order(&self) -> bool {
        self.msg_type == ADD_ORDER
    }

    #[inline]
    pub fn side(&self) -> Side {
        Side::from_wire(self.side)
    }

    /// Symbol with the space padding removed.
    pub fn symbol_str(&self) -> String {
        String::from_utf8_lossy(&self.stock).trim_end().to_string()
    }

    /// The intent handed to the order book.
    #[inline]
    pub fn to_add_order(&self) -> AddOrder {
        AddOrder {
            order_id: self.order_id,
            side: self.side(),
            price: self.price as u64,
            qty: self.shares,
        }
    }
}

impl TryFrom<&[u8]> for WireMessage {
    type Error = DecodeError;

    /// Decode the first 38 bytes of a transport buffer. Trailing bytes are ignored.
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        let record: &[u8; MESSAGE_LEN] = buf
            .get(..MESSAGE_LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(DecodeError::Truncated { len: buf.len() })?;
        Ok(decode(record))
    }
}

/// Left-align a symbol in 8 bytes, space padded. Longer symbols are cut.
pub fn pad_symbol(symbol: &str) -> [u8; 8] {
    let mut out = [b' '; 8];
    for (dst, src) in out.iter_mut().zip(symbol.bytes()) {
        *dst = src;
    }
    out
}
