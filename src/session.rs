// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use mqtt_codec::{ConnectAckPacket, ConnectPacket, ConnectReturnCode, Frame, PacketId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::error::{Error, ErrorKind};
use crate::identifier::IdentifierTable;
use crate::outcome::Outcome;
use crate::ticker::Ticker;
use crate::transport::Transport;
use crate::{inbound, outbound};

/// Default bound for the frame queue (`Q` in §4.3).
const DEFAULT_QUEUE_SIZE: usize = 128;

type PendingSlot = oneshot::Sender<Result<Outcome, Error>>;

/// A boolean flag set by either pipeline when it terminates (inbound
/// end-of-stream/protocol error, or an outbound transport write
/// failure), per §4.5's "boolean stop signal" and §7's requirement that
/// outbound failures be surfaced to the session. `Session::send` and
/// `send_receive` check it up front so a stalled pipeline fails new
/// calls immediately instead of queueing into a channel that will never
/// drain again.
#[derive(Clone, Debug)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A lazy, non-restartable sequence of delivered messages, terminating
/// when the stop signal is set.
#[derive(Debug)]
pub struct MessageStream {
    receiver: mpsc::Receiver<crate::message::Message>,
}

impl MessageStream {
    /// Suspend until the next delivered message, or `None` once the
    /// inbound pipeline has ended.
    pub async fn next(&mut self) -> Option<crate::message::Message> {
        self.receiver.recv().await
    }
}

/// Orchestrates connection setup, lifecycle, cancellation, and the
/// caller-facing operations. Exclusively owns the identifier tables, the
/// two pipelines, and the ticker, per §3's ownership rule.
#[derive(Debug)]
pub struct Session {
    frame_tx: mpsc::Sender<Frame>,
    pending: Arc<IdentifierTable<PendingSlot>>,
    ticker: Ticker,
    outbound_handle: JoinHandle<()>,
    inbound_handle: JoinHandle<()>,
    messages: MessageStream,
    stop: StopSignal,
}

impl Session {
    /// Runs the six-step construction sequence of §4.5: allocate shared
    /// state, start both pipelines, send CONNECT, and gate on CONNACK.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConnectionFailure`] if the broker refuses the
    /// connection, or [`ErrorKind::TransportError`]/[`ErrorKind::ProtocolError`]
    /// if the handshake itself fails.
    pub async fn connect(config: &SessionConfig, transport: Transport) -> Result<Self, Error> {
        // Step 1: allocate.
        let (connack_tx, connack_rx) = oneshot::channel::<ConnectAckPacket>();
        let (message_tx, message_rx) = mpsc::channel(DEFAULT_QUEUE_SIZE);
        let (frame_tx, frame_rx) = mpsc::channel(DEFAULT_QUEUE_SIZE);
        let stop = StopSignal::new();
        let ticker = Ticker::spawn(config.keep_alive(), frame_tx.clone());
        let in_flight = Arc::new(IdentifierTable::new());
        let pending: Arc<IdentifierTable<PendingSlot>> = Arc::new(IdentifierTable::new());
        let inbound_qos2: Arc<Mutex<HashSet<PacketId>>> = Arc::new(Mutex::new(HashSet::new()));

        let (transport_tx, transport_rx) = transport.split();

        // Step 2: outbound pipeline.
        let outbound_handle = tokio::spawn(outbound::run(
            frame_rx,
            transport_tx,
            in_flight.clone(),
            ticker.handle(),
            stop.clone(),
        ));

        // Step 3: inbound pipeline.
        let inbound_handle = tokio::spawn(inbound::run(
            transport_rx,
            frame_tx.clone(),
            message_tx,
            in_flight,
            pending.clone(),
            inbound_qos2,
            Some(connack_tx),
            stop.clone(),
        ));

        // Step 4: enqueue CONNECT.
        let connect_frame = build_connect(config)?;
        if frame_tx.send(connect_frame).await.is_err() {
            outbound_handle.abort();
            inbound_handle.abort();
            return Err(Error::new(ErrorKind::TransportError, "frame queue closed before CONNECT was sent"));
        }

        // Step 5: suspend until CONNACK.
        let ack = match connack_rx.await {
            Ok(ack) => ack,
            Err(_err) => {
                outbound_handle.abort();
                inbound_handle.abort();
                return Err(Error::new(ErrorKind::TransportError, "connection closed before CONNACK was received"));
            }
        };

        // Step 6: branch on return code.
        if ack.return_code != ConnectReturnCode::Accepted {
            log::info!("session: broker refused connection: {:?}", ack.return_code);
            outbound_handle.abort();
            inbound_handle.abort();
            return Err(Error::from_string(ErrorKind::ConnectionFailure, format!("{:?}", ack.return_code)));
        }

        log::info!("session: connected as {:?}", config.client_id());
        Ok(Self {
            frame_tx,
            pending,
            ticker,
            outbound_handle,
            inbound_handle,
            messages: MessageStream { receiver: message_rx },
            stop,
        })
    }

    /// Enqueue `frame`; return once enqueue completes. No correlation, no
    /// waiting — the caller-chosen identifier, if any, is its
    /// responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Cancelled`] if either pipeline has already
    /// stopped (including after an outbound transport failure), or
    /// [`ErrorKind::ChannelError`] if the frame queue is closed.
    pub async fn send(&self, frame: Frame) -> Result<(), Error> {
        if self.stop.is_set() {
            return Err(Error::new(ErrorKind::Cancelled, "session pipelines have stopped"));
        }
        self.frame_tx.send(frame).await?;
        Ok(())
    }

    /// Register a one-shot slot under `id` (replacing any prior
    /// registration under the same id, a caller bug), enqueue `frame`,
    /// and suspend until the inbound pipeline completes it.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Cancelled`] if the session is cancelled, either
    /// pipeline has already stopped, or the inbound pipeline ends before
    /// completion, or [`ErrorKind::ChannelError`] if the frame queue is
    /// closed.
    pub async fn send_receive(&self, frame: Frame, id: PacketId) -> Result<Outcome, Error> {
        if self.stop.is_set() {
            return Err(Error::new(ErrorKind::Cancelled, "session pipelines have stopped"));
        }
        let (slot_tx, slot_rx) = oneshot::channel();
        self.pending.update(id, slot_tx);
        self.frame_tx.send(frame).await?;
        slot_rx
            .await
            .unwrap_or_else(|_err| Err(Error::new(ErrorKind::Cancelled, "session ended before the result arrived")))
    }

    /// The lazy, non-restartable stream of delivered messages.
    pub fn messages(&mut self) -> &mut MessageStream {
        &mut self.messages
    }

    /// Cancel the ticker, outbound task, and inbound task, in that order,
    /// then complete every pending waiter with `Cancelled` so none hang
    /// forever. Idempotent.
    pub fn cancel(&mut self) {
        log::info!("session: cancel() called");
        self.ticker.cancel();
        self.outbound_handle.abort();
        self.inbound_handle.abort();

        for (_id, slot) in self.pending.drain() {
            let _ = slot.send(Err(Error::new(ErrorKind::Cancelled, "session cancelled")));
        }
        self.stop.set();
    }
}

fn build_connect(config: &SessionConfig) -> Result<Frame, Error> {
    let mut packet = ConnectPacket::new(config.client_id())
        .map_err(|err| Error::from_string(ErrorKind::ProtocolError, format!("{err:?}")))?;
    packet.set_keep_alive(config.keep_alive());
    packet.set_clean_session(config.clean_session());

    if let Some(user) = config.user() {
        packet
            .set_username(user)
            .map_err(|err| Error::from_string(ErrorKind::ProtocolError, format!("{err:?}")))?;
    }
    if let Some(password) = config.password() {
        packet
            .set_password(password)
            .map_err(|err| Error::from_string(ErrorKind::ProtocolError, format!("{err:?}")))?;
    }
    if let Some(will) = config.will() {
        packet
            .set_will(&will.topic, &will.payload, will.qos, will.retain)
            .map_err(|err| Error::from_string(ErrorKind::ProtocolError, format!("{err:?}")))?;
    }

    Ok(Frame::Connect(packet))
}
