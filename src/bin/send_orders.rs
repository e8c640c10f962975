//! Sends paired buy/sell add-order datagrams to a running engine.
//!
//! Each pair crosses at the same price, so every sell should trade against
//! the preceding buy.

use std::net::UdpSocket;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use itch_lob::feed::send_to;
use itch_lob::{price_from_f64, Side, WireMessage};

#[derive(Parser, Debug)]
#[command(name = "send-orders", about = "Send ITCH add-order datagrams over UDP")]
struct Args {
    /// Engine address
    #[arg(long, default_value = "127.0.0.1:1234")]
    target: String,

    /// Number of buy/sell pairs
    #[arg(long, default_value_t = 10)]
    count: u64,

    /// Quoted price for every order
    #[arg(long, default_value_t = 150.0)]
    price: f64,

    #[arg(long, default_value_t = 10)]
    shares: u32,

    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// Pause between datagrams
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Offset added to the buy order id to form the sell order id
    #[arg(long, default_value_t = 100)]
    sell_id_offset: u64,
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
    let args = Args::parse();

    let price = u32::try_from(price_from_f64(args.price))
        .with_context(|| format!("price {} does not fit the wire format", args.price))?;
    let socket = UdpSocket::bind("0.0.0.0:0").context("binding sender socket")?;
    let delay = Duration::from_millis(args.delay_ms);

    info!(addr = %args.target, "sending orders");

    for i in 1..=args.count {
        for (order_id, side) in [(i, Side::Bid), (i + args.sell_id_offset, Side::Ask)] {
            let mut msg = WireMessage::add_order(order_id, side, args.shares, &args.symbol, price);
            msg.timestamp = now_nanos();
            send_to(&socket, args.target.as_str(), &msg)
                .with_context(|| format!("sending order {order_id}"))?;
            info!(order_id, ?side, "sent");
            thread::sleep(delay);
        }
    }

    info!(pairs = args.count, "done");
    Ok(())
}
