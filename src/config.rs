//! Runtime configuration for the feed pipeline.
//!
//! Parsed from the command line with `clap`; every flag can also be set
//! through an `ITCH_LOB_*` environment variable.

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// What the processing thread does when the queue is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum IdleStrategy {
    /// Busy-spin with a CPU pause hint (lowest latency, burns a core)
    Spin,
    /// Yield the time slice to the OS scheduler
    #[default]
    Yield,
}

impl IdleStrategy {
    #[inline]
    pub fn idle(self) {
        match self {
            IdleStrategy::Spin => std::hint::spin_loop(),
            IdleStrategy::Yield => std::thread::yield_now(),
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(name = "lob-engine", about = "ITCH add-order feed into a price-time priority order book")]
pub struct PipelineConfig {
    /// UDP address to receive add-order datagrams on
    #[arg(long, env = "ITCH_LOB_BIND", default_value = "0.0.0.0:1234")]
    pub bind: String,

    /// Ring size of the ingest -> engine queue (one slot is kept free)
    #[arg(
        long,
        env = "ITCH_LOB_QUEUE_CAPACITY",
        default_value_t = 100_000,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..)
    )]
    pub queue_capacity: usize,

    /// Engine behaviour when the queue is empty
    #[arg(long, env = "ITCH_LOB_IDLE", value_enum, default_value_t = IdleStrategy::Yield)]
    pub idle: IdleStrategy,

    /// Pin the engine thread to the last CPU core
    #[arg(long, env = "ITCH_LOB_PIN_ENGINE")]
    pub pin_engine: bool,

    /// Socket read timeout; bounds how long shutdown takes to be noticed
    #[arg(long, env = "ITCH_LOB_RECV_TIMEOUT_MS", default_value_t = 100)]
    pub recv_timeout_ms: u64,

    /// Log pipeline counters every N seconds (0 disables)
    #[arg(long, env = "ITCH_LOB_STATS_INTERVAL_SECS", default_value_t = 10)]
    pub stats_interval_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "ITCH_LOB_JSON_LOGS")]
    pub json_logs: bool,
}

impl PipelineConfig {
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms.max(1))
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:1234".to_string(),
            queue_capacity: 100_000,
            idle: IdleStrategy::Yield,
            pin_engine: false,
            recv_timeout_ms: 100,
            stats_interval_secs: 10,
            json_logs: false,
        }
    }
}
