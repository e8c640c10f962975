//! # itch-lob
//!
//! An ITCH add-order feed handler feeding a single-instrument limit order
//! book under price-time priority.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns the order book exclusively (no locks)
//! - **Lock-Free Handoff**: A bounded SPSC ring with acquire/release cursors
//! - **Explicit Decoding**: Big-endian fields copied out of a fixed 38-byte record
//! - **Lossy Backpressure**: A full queue drops the message; nothing blocks
//!
//! ## Architecture
//!
//! ```text
//! [Ingest Thread] --> [SPSC Ring Buffer] --> [Engine Thread (optionally pinned)]
//!  recv + decode                               add_order
//!                                                  |
//!                                           [Output Events]
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod matching;
pub mod order_book;
pub mod pipeline;
pub mod price_level;
pub mod shutdown;
pub mod spsc;
pub mod stats;
pub mod wire;

// Re-exports for convenience
pub use command::{
    price_from_f64, price_to_f64, AddOrder, OrderRested, OutputEvent, Side, TradeEvent,
    PRICE_SCALE,
};
pub use config::{IdleStrategy, PipelineConfig};
pub use engine::Engine;
pub use error::FeedError;
pub use feed::{run_ingest, DatagramSource, MemorySource, UdpSource};
pub use order_book::OrderBook;
pub use pipeline::{Pipeline, PipelineOptions};
pub use price_level::{Order, PriceLevel};
pub use shutdown::ShutdownToken;
pub use stats::{PipelineStats, StatsSnapshot};
pub use wire::{decode, DecodeError, WireMessage, MESSAGE_LEN};
