//! Pipeline - wires the ingest thread and the engine thread together.
//!
//! ```text
//! [DatagramSource] -> ingest thread -> SPSC queue -> engine thread -> sink
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::command::OutputEvent;
use crate::config::{IdleStrategy, PipelineConfig};
use crate::engine::Engine;
use crate::error::{FeedError, Result};
use crate::feed::{run_ingest, DatagramSource};
use crate::shutdown::ShutdownToken;
use crate::spsc;
use crate::stats::{PipelineStats, StatsSnapshot};

/// Knobs for [`Pipeline::spawn`].
#[derive(Clone, Copy, Debug)]
pub struct PipelineOptions {
    /// Ring size (one slot is kept free)
    pub queue_capacity: usize,
    pub idle: IdleStrategy,
    pub pin_engine: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 100_000,
            idle: IdleStrategy::Yield,
            pin_engine: false,
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            idle: config.idle,
            pin_engine: config.pin_engine,
        }
    }
}

/// A running two-thread pipeline.
pub struct Pipeline {
    token: ShutdownToken,
    stats: Arc<PipelineStats>,
    ingest: JoinHandle<()>,
    engine: JoinHandle<Engine>,
}

impl Pipeline {
    /// Start the ingest and engine threads.
    ///
    /// `sink` runs on the engine thread for every output event.
    ///
    /// Fails with [`FeedError::InvalidCapacity`] if `queue_capacity` is below
    /// [`spsc::MIN_CAPACITY`].
    pub fn spawn<S, F>(options: PipelineOptions, mut source: S, sink: F) -> Result<Self>
    where
        S: DatagramSource + Send + 'static,
        F: FnMut(&OutputEvent) + Send + 'static,
    {
        if options.queue_capacity < spsc::MIN_CAPACITY {
            return Err(FeedError::InvalidCapacity(options.queue_capacity));
        }

        let token = ShutdownToken::new();
        let stats = Arc::new(PipelineStats::new());
        let (mut producer, mut consumer) = spsc::channel(options.queue_capacity);

        let engine = {
            let token = token.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name("lob-engine".into())
                .spawn(move || {
                    let mut engine = Engine::new();
                    if options.pin_engine {
                        engine.pin_to_core();
                    }
                    engine.run(&mut consumer, &token, options.idle, &stats, sink);
                    engine
                })
                .map_err(|source| FeedError::Spawn { name: "engine", source })?
        };

        let ingest = {
            let token = token.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name("lob-ingest".into())
                .spawn(move || run_ingest(&mut source, &mut producer, &token, &stats))
        };
        let ingest = match ingest {
            Ok(handle) => handle,
            Err(source) => {
                // Do not leave the engine spinning
                token.cancel();
                let _ = engine.join();
                return Err(FeedError::Spawn { name: "ingest", source });
            }
        };

        info!(queue_capacity = options.queue_capacity, "pipeline started");
        Ok(Self {
            token,
            stats,
            ingest,
            engine,
        })
    }

    /// A handle that can stop the pipeline from another thread (e.g. a signal handler).
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.token.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Cancel both loops, join them, and hand back the engine with its final book.
    ///
    /// Messages still in the queue are discarded.
    pub fn shutdown(self) -> Result<(Engine, StatsSnapshot)> {
        self.token.cancel();

        let ingest = self.ingest.join();
        let engine = self.engine.join();
        ingest.map_err(|_| FeedError::ThreadPanicked("ingest"))?;
        let engine = engine.map_err(|_| FeedError::ThreadPanicked("engine"))?;

        let stats = self.stats.snapshot();
        info!(?stats, "pipeline stopped");
        Ok((engine, stats))
    }
}
