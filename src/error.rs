//! Error types for the pipeline's outer layers.
//!
//! The matching core itself has no error path; see [`crate::wire::DecodeError`]
//! and [`crate::spsc::PushError`] for the two local, non-fatal outcomes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("queue capacity {0} is too small, need at least 2")]
    InvalidCapacity(usize),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

pub type Result<T> = std::result::Result<T, FeedError>;
