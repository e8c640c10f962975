//! UDP feed -> SPSC -> order book, until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use itch_lob::{price_to_f64, Pipeline, PipelineConfig, PipelineOptions, Side, UdpSource};

fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_thread_names(true)).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = PipelineConfig::parse();
    init_tracing(config.json_logs);

    let source = UdpSource::bind(&config.bind, config.recv_timeout())
        .with_context(|| format!("binding feed socket on {}", config.bind))?;
    info!(addr = %source.local_addr()?, "listening for add-order datagrams");

    let pipeline = Pipeline::spawn(PipelineOptions::from(&config), source, |_event| {})
        .context("starting pipeline")?;

    match config.stats_interval() {
        Some(interval) => {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let stats = pipeline.stats();
                        info!(?stats, "pipeline stats");
                    }
                    res = tokio::signal::ctrl_c() => {
                        res.context("waiting for Ctrl-C")?;
                        break;
                    }
                }
            }
        }
        None => tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?,
    }

    info!("shutdown requested");
    let (engine, stats) = pipeline.shutdown().context("stopping pipeline")?;

    let book = &engine.book;
    info!(
        orders = book.order_count(),
        bid_levels = book.bid_levels(),
        ask_levels = book.ask_levels(),
        best_bid = ?book.best_price(Side::Bid).map(price_to_f64),
        best_ask = ?book.best_price(Side::Ask).map(price_to_f64),
        processed = stats.messages_processed,
        dropped = stats.messages_dropped,
        trades = stats.trades,
        "final book"
    );
    Ok(())
}
