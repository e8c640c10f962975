//! Feed - the ingest thread: receive datagrams, decode, hand off.
//!
//! The transport is abstracted behind [`DatagramSource`] so the loop can be
//! driven by a UDP socket in production and by an in-memory script in tests.

use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::{FeedError, Result};
use crate::shutdown::ShutdownToken;
use crate::spsc::Producer;
use crate::stats::PipelineStats;
use crate::wire::WireMessage;

/// Receive buffer size; anything past the first record is ignored.
pub const RECV_BUFFER_LEN: usize = 1024;

/// A source of whole datagrams.
pub trait DatagramSource {
    /// Receive one datagram into `buf`.
    ///
    /// Returns `Ok(None)` when nothing arrived before the source's timeout,
    /// giving the caller a chance to check for shutdown.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>>;
}

/// UDP socket with a read timeout.
#[derive(Debug)]
pub struct UdpSource {
    socket: UdpSocket,
}

impl UdpSource {
    pub fn bind(addr: &str, timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(addr).map_err(|source| FeedError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl DatagramSource for UdpSource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((len, _peer)) => Ok(Some(len)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Scripted datagrams, returned in order. Reports a timeout once drained.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    datagrams: VecDeque<Vec<u8>>,
}

impl MemorySource {
    pub fn new<I>(datagrams: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        Self {
            datagrams: datagrams.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.datagrams.len()
    }
}

impl DatagramSource for MemorySource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        let Some(datagram) = self.datagrams.pop_front() else {
            std::thread::yield_now();
            return Ok(None);
        };
        // Datagram semantics: excess bytes are truncated
        let len = datagram.len().min(buf.len());
        buf[..len].copy_from_slice(&datagram[..len]);
        Ok(Some(len))
    }
}

/// Send add-order records to a UDP target. Used by the order sender tool.
pub fn send_to<A: ToSocketAddrs>(socket: &UdpSocket, target: A, msg: &WireMessage) -> Result<()> {
    socket.send_to(&msg.encode(), target)?;
    Ok(())
}

/// Run the ingest loop until `token` is cancelled.
///
/// Per datagram: decode, then push. Short datagrams and pushes onto a full
/// queue are dropped and counted; transport errors are logged and the loop
/// keeps going.
pub fn run_ingest<S: DatagramSource>(
    source: &mut S,
    producer: &mut Producer<WireMessage>,
    token: &ShutdownToken,
    stats: &PipelineStats,
) {
    info!(queue_capacity = producer.capacity(), "ingest loop started");
    let mut buf = [0u8; RECV_BUFFER_LEN];

    while !token.is_cancelled() {
        let len = match source.recv(&mut buf) {
            Ok(Some(len)) => len,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "receive failed");
                continue;
            }
        };
        stats.record_received();

        let msg = match WireMessage::try_from(&buf[..len]) {
            Ok(msg) => msg,
            Err(e) => {
                trace!(error = %e, "datagram rejected");
                stats.record_rejected();
                continue;
            }
        };

        match producer.push(msg) {
            Ok(()) => stats.record_enqueued(),
            Err(_) => {
                trace!(order_id = msg.order_id, "queue full, dropping message");
                stats.record_dropped();
            }
        }
    }

    debug!(pending = producer.len(), "ingest loop stopped");
}
