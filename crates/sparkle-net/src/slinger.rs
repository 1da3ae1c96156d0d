//! Message slinger
//!
//! Owns the transport. Inbound frames are validated, filtered by destination
//! and handed to a [`MsgHandler`]; outbound messages are queued on an
//! [`Outbox`] by any activity and written out by the slinger.
//!
//! Delivery is best effort in both directions: nothing is acknowledged or
//! retransmitted, and every frame that is not delivered bumps a counter in
//! [`SlingerStats`].

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_futures::{
    select::{Either, select},
    yield_now,
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, Timer};
use heapless::Vec;
use sparkle_wire::{WireError, WireWriter};

use crate::{
    FrameError, MAX_FRAME_LEN, Msg, MsgHandler, MsgHeader, MsgType, NodeId, SlingerError,
    Transport,
};

/// Outbound queue capacity
pub const OUTBOX_DEPTH: usize = 8;

/// Largest payload of a queued outbound message
pub const MAX_OUTBOUND_PAYLOAD: usize = 64;

/// Most frames taken from the transport by one [`MsgSlinger::poll_inbound`],
/// and most back-to-back events [`MsgSlinger::run`] handles before yielding
pub const MAX_INBOUND_PER_POLL: usize = 16;

/// Pause after a failed receive before polling the transport again
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Bounded retry for opening the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total open attempts, at least one is always made
    pub max_attempts: u32,
    /// Wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Retry without waiting between attempts
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::from_ticks(0))
    }
}

/// Message waiting in the [`Outbox`]; the source is filled in on send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMsg {
    pub kind: MsgType,
    pub dest: NodeId,
    pub payload: Vec<u8, MAX_OUTBOUND_PAYLOAD>,
}

impl OutboundMsg {
    /// Message without payload
    pub fn new(kind: MsgType, dest: NodeId) -> Self {
        Self {
            kind,
            dest,
            payload: Vec::new(),
        }
    }

    /// Message whose payload is produced by `write`
    pub fn build(
        kind: MsgType,
        dest: NodeId,
        write: impl FnOnce(&mut WireWriter<MAX_OUTBOUND_PAYLOAD>) -> Result<(), WireError>,
    ) -> Result<Self, WireError> {
        let mut writer = WireWriter::new();
        write(&mut writer)?;
        Ok(Self {
            kind,
            dest,
            payload: writer.into_inner(),
        })
    }
}

/// Outbound message queue
///
/// Enqueueing never blocks; when the queue is full the message is dropped
/// and counted.
pub struct Outbox {
    channel: Channel<CriticalSectionRawMutex, OutboundMsg, OUTBOX_DEPTH>,
    dropped: AtomicU32,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue `msg` for sending. Returns false if it was dropped.
    pub fn enqueue(&self, msg: OutboundMsg) -> bool {
        let kind = msg.kind;
        if self.channel.try_send(msg).is_ok() {
            return true;
        }
        self.dropped.fetch_add(1, Ordering::Relaxed);
        log::debug!("slinger: outbox full, dropping {}", kind.as_str());
        false
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Messages dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn try_next(&self) -> Option<OutboundMsg> {
        self.channel.try_receive().ok()
    }

    async fn next(&self) -> OutboundMsg {
        self.channel.receive().await
    }
}

/// Slinger counters for external observation
///
/// Uses atomics so they can be read while the slinger runs.
#[derive(Default)]
pub struct SlingerStats {
    received: AtomicU32,
    delivered: AtomicU32,
    malformed: AtomicU32,
    unknown_type: AtomicU32,
    not_for_us: AtomicU32,
    sent: AtomicU32,
    send_failed: AtomicU32,
    recv_failed: AtomicU32,
}

/// Point-in-time copy of [`SlingerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u32,
    pub delivered: u32,
    pub malformed: u32,
    pub unknown_type: u32,
    pub not_for_us: u32,
    pub sent: u32,
    pub send_failed: u32,
    pub recv_failed: u32,
    pub outbox_dropped: u32,
}

impl SlingerStats {
    pub const fn new() -> Self {
        Self {
            received: AtomicU32::new(0),
            delivered: AtomicU32::new(0),
            malformed: AtomicU32::new(0),
            unknown_type: AtomicU32::new(0),
            not_for_us: AtomicU32::new(0),
            sent: AtomicU32::new(0),
            send_failed: AtomicU32::new(0),
            recv_failed: AtomicU32::new(0),
        }
    }

    pub fn snapshot(&self, outbox: &Outbox) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown_type: self.unknown_type.load(Ordering::Relaxed),
            not_for_us: self.not_for_us.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            send_failed: self.send_failed.load(Ordering::Relaxed),
            recv_failed: self.recv_failed.load(Ordering::Relaxed),
            outbox_dropped: outbox.dropped(),
        }
    }
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Message slinger
pub struct MsgSlinger<'a, T: Transport> {
    transport: T,
    node_id: NodeId,
    outbox: &'a Outbox,
    stats: &'a SlingerStats,
    retry: RetryPolicy,
    open: bool,
    /// Message whose send did not complete during a flush
    unsent: Option<OutboundMsg>,
    rx_buf: [u8; MAX_FRAME_LEN],
}

impl<'a, T: Transport> MsgSlinger<'a, T> {
    pub fn new(transport: T, node_id: NodeId, outbox: &'a Outbox, stats: &'a SlingerStats) -> Self {
        Self {
            transport,
            node_id,
            outbox,
            stats,
            retry: RetryPolicy::default(),
            open: false,
            unsent: None,
            rx_buf: [0; MAX_FRAME_LEN],
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Open the transport, retrying according to the [`RetryPolicy`]
    pub async fn start(&mut self) -> Result<(), SlingerError> {
        let attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.transport.open().await {
                Ok(()) => {
                    log::info!("slinger: transport open as node {}", self.node_id);
                    self.open = true;
                    return Ok(());
                }
                Err(err) => {
                    log::warn!("slinger: open attempt {attempt}/{attempts} failed: {err:?}");
                }
            }
            if attempt < attempts && self.retry.backoff > Duration::from_ticks(0) {
                Timer::after(self.retry.backoff).await;
            }
        }
        Err(SlingerError::TransportOpenFailed { attempts })
    }

    /// Validate one raw frame and deliver it if it is addressed to this node
    ///
    /// Returns whether the handler was called.
    pub fn dispatch_frame<H: MsgHandler + ?Sized>(&self, frame: &[u8], handler: &mut H) -> bool {
        bump(&self.stats.received);
        let msg = match Msg::decode(frame) {
            Ok(msg) => msg,
            Err(err @ FrameError::TooShort { .. }) => {
                bump(&self.stats.malformed);
                log::debug!("slinger: dropping frame: {err}");
                return false;
            }
            Err(err @ FrameError::UnknownType(_)) => {
                bump(&self.stats.unknown_type);
                log::debug!("slinger: dropping frame: {err}");
                return false;
            }
        };
        if !msg.header().is_for(self.node_id) {
            bump(&self.stats.not_for_us);
            log::debug!(
                "slinger: dropping {} for node {}",
                msg.kind().as_str(),
                msg.dest()
            );
            return false;
        }

        log::trace!(
            "slinger: {} from {} ({} bytes)",
            msg.kind().as_str(),
            msg.source(),
            msg.payload().len()
        );
        handler.handle_msg(&msg);
        bump(&self.stats.delivered);
        true
    }

    fn dispatch_received<H: MsgHandler + ?Sized>(&self, len: usize, handler: &mut H) {
        match self.rx_buf.get(..len) {
            Some(frame) => {
                self.dispatch_frame(frame, handler);
            }
            None => {
                bump(&self.stats.received);
                bump(&self.stats.malformed);
                log::warn!("slinger: transport reported {len} bytes, buffer holds {MAX_FRAME_LEN}");
            }
        }
    }

    /// Encode and send one message now, stamped with this node as source
    pub async fn send(&mut self, msg: &OutboundMsg) -> Result<(), SlingerError> {
        let header = MsgHeader {
            kind: msg.kind,
            source: self.node_id,
            dest: msg.dest,
        };
        let frame = match Msg::new(header, &msg.payload).encode::<MAX_FRAME_LEN>() {
            Ok(frame) => frame,
            Err(err) => {
                bump(&self.stats.send_failed);
                return Err(err.into());
            }
        };

        match self.transport.send(frame.as_bytes()).await {
            Ok(()) => {
                bump(&self.stats.sent);
                log::trace!("slinger: sent {} to {}", msg.kind.as_str(), msg.dest);
                Ok(())
            }
            Err(err) => {
                bump(&self.stats.send_failed);
                log::warn!("slinger: send of {} failed: {err:?}", msg.kind.as_str());
                Err(SlingerError::Transport)
            }
        }
    }

    /// Send queued messages for as long as the transport accepts them
    /// immediately; returns the number of messages sent
    ///
    /// A send that cannot complete right away is abandoned and the message is
    /// kept to be sent first next time, ahead of the rest of the queue.
    pub async fn flush_outbound(&mut self) -> usize {
        let mut sent = 0;
        while let Some(msg) = self.unsent.take().or_else(|| self.outbox.try_next()) {
            match select(self.send(&msg), core::future::ready(())).await {
                Either::First(Ok(())) => sent += 1,
                Either::First(Err(_)) => {}
                Either::Second(()) => {
                    log::trace!("slinger: transport busy, holding {}", msg.kind.as_str());
                    self.unsent = Some(msg);
                    break;
                }
            }
        }
        sent
    }

    /// Messages waiting to be sent, including one held back by a busy transport
    pub fn pending_outbound(&self) -> usize {
        self.outbox.len() + usize::from(self.unsent.is_some())
    }

    /// Deliver frames the transport has ready without waiting for more
    ///
    /// Takes at most [`MAX_INBOUND_PER_POLL`] frames so a flooded link cannot
    /// starve the caller. Returns the number of frames taken from the transport.
    pub async fn poll_inbound<H: MsgHandler + ?Sized>(&mut self, handler: &mut H) -> usize {
        let mut frames = 0;
        while frames < MAX_INBOUND_PER_POLL {
            let ready = select(
                self.transport.recv(&mut self.rx_buf),
                core::future::ready(()),
            )
            .await;
            match ready {
                Either::First(Ok(len)) => {
                    frames += 1;
                    self.dispatch_received(len, handler);
                }
                Either::First(Err(err)) => {
                    bump(&self.stats.recv_failed);
                    log::warn!("slinger: receive failed: {err:?}");
                    break;
                }
                Either::Second(()) => break,
            }
        }
        frames
    }

    /// Serve the transport forever: deliver inbound frames and send queued messages
    ///
    /// Yields to the executor after every [`MAX_INBOUND_PER_POLL`] events so
    /// tasks joined with this one keep running while the link is busy.
    pub async fn run<H: MsgHandler + ?Sized>(&mut self, handler: &mut H) -> ! {
        let mut streak = 0;
        loop {
            if let Some(msg) = self.unsent.take() {
                let _ = self.send(&msg).await;
            }

            streak += 1;
            if streak >= MAX_INBOUND_PER_POLL {
                streak = 0;
                yield_now().await;
            }

            let event = select(self.transport.recv(&mut self.rx_buf), self.outbox.next()).await;
            match event {
                Either::First(Ok(len)) => self.dispatch_received(len, handler),
                Either::First(Err(err)) => {
                    bump(&self.stats.recv_failed);
                    log::warn!("slinger: receive failed: {err:?}");
                    Timer::after(RECV_ERROR_BACKOFF).await;
                }
                Either::Second(msg) => {
                    // Failures are counted and logged by `send`
                    let _ = self.send(&msg).await;
                }
            }
        }
    }
}
