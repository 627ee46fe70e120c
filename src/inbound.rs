// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use mqtt_codec::{
    ConnectAckPacket, Frame, PacketId, PublishAckPacket, PublishCompletePacket, PublishPacket,
    PublishReceivedPacket, PublishReleasePacket, QoS, SubscribeAck,
};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, ErrorKind};
use crate::identifier::IdentifierTable;
use crate::message::Message;
use crate::outcome::Outcome;
use crate::session::StopSignal;
use crate::transport::TransportRx;

type PendingSlot = oneshot::Sender<Result<Outcome, Error>>;

/// Completes a pending-result slot, if one is registered at `id`. A
/// missing slot is not an error: `send()` callers never register one.
fn complete(pending: &IdentifierTable<PendingSlot>, id: PacketId, outcome: Outcome) {
    if let Some(slot) = pending.remove(id) {
        // The caller may have dropped its receiver (e.g. timed out); that
        // is the caller's business, not a pipeline failure.
        let _ = slot.send(Ok(outcome));
    }
}

/// Reads decoded frames off the transport and drives every QoS handshake,
/// per-identifier completion, and message delivery. Grounded on
/// `async_client.rs`'s `recv_router`, generalized from its per-HashMap
/// bookkeeping to the shared `IdentifierTable`.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    mut transport: TransportRx,
    frame_tx: mpsc::Sender<Frame>,
    message_tx: mpsc::Sender<Message>,
    in_flight: Arc<IdentifierTable<Frame>>,
    pending: Arc<IdentifierTable<PendingSlot>>,
    inbound_qos2: Arc<Mutex<HashSet<PacketId>>>,
    mut connack_tx: Option<oneshot::Sender<ConnectAckPacket>>,
    stop: StopSignal,
) {
    let result = dispatch_loop(
        &mut transport,
        &frame_tx,
        &message_tx,
        &in_flight,
        &pending,
        &inbound_qos2,
        &mut connack_tx,
    )
    .await;

    if let Err(ref err) = result {
        log::error!("inbound: pipeline terminated: {err}");
    }

    let cancel_reason = result
        .err()
        .unwrap_or_else(|| Error::new(ErrorKind::Cancelled, "inbound pipeline ended"));
    for (_id, slot) in pending.drain() {
        let _ = slot.send(Err(cancel_reason.clone()));
    }

    stop.set();
    log::info!("inbound: pipeline stopped");
}

async fn dispatch_loop(
    transport: &mut TransportRx,
    frame_tx: &mpsc::Sender<Frame>,
    message_tx: &mpsc::Sender<Message>,
    in_flight: &IdentifierTable<Frame>,
    pending: &IdentifierTable<PendingSlot>,
    inbound_qos2: &Mutex<HashSet<PacketId>>,
    connack_tx: &mut Option<oneshot::Sender<ConnectAckPacket>>,
) -> Result<(), Error> {
    loop {
        let frame = match transport.recv().await? {
            Some(frame) => frame,
            None => {
                log::info!("inbound: end of stream");
                return Ok(());
            }
        };

        log::info!("inbound: dispatching {:?}", frame.packet_type());

        match frame {
            Frame::Publish(publish) => on_publish(&publish, frame_tx, message_tx, inbound_qos2).await?,
            Frame::PublishAck(ack) => {
                in_flight.remove(ack.packet_id());
                complete(pending, ack.packet_id(), Outcome::Empty);
            }
            Frame::PublishReceived(received) => on_publish_received(&received, in_flight, frame_tx).await?,
            Frame::PublishRelease(release) => on_publish_release(&release, frame_tx, inbound_qos2).await?,
            Frame::PublishComplete(complete_packet) => {
                in_flight.remove(complete_packet.packet_id());
                complete(pending, complete_packet.packet_id(), Outcome::Empty);
            }
            Frame::SubscribeAck(ack) => {
                let granted = ack.codes().iter().map(granted_qos).collect();
                complete(pending, ack.packet_id(), Outcome::QoS(granted));
            }
            Frame::UnsubscribeAck(ack) => {
                complete(pending, ack.packet_id(), Outcome::Empty);
            }
            Frame::PingResponse(_) => {
                log::info!("inbound: PINGRESP received, server is alive");
                // TODO: track outstanding PINGREQ and close the transport
                // if PINGRESP is not observed within keep_alive.
            }
            Frame::ConnectAck(ack) => on_connect_ack(ack, connack_tx)?,
            other => {
                log::error!("inbound: illegal frame on the client side: {:?}", other.packet_type());
                return Err(Error::new(
                    ErrorKind::ProtocolError,
                    &format!("unexpected inbound frame type: {:?}", other.packet_type()),
                ));
            }
        }
    }
}

async fn on_publish(
    publish: &PublishPacket,
    frame_tx: &mpsc::Sender<Frame>,
    message_tx: &mpsc::Sender<Message>,
    inbound_qos2: &Mutex<HashSet<PacketId>>,
) -> Result<(), Error> {
    match (publish.qos(), publish.packet_id()) {
        (QoS::AtMostOnce, None) => {
            deliver(message_tx, publish).await;
            Ok(())
        }
        (QoS::AtLeastOnce, Some(id)) => {
            deliver(message_tx, publish).await;
            send(frame_tx, Frame::PublishAck(PublishAckPacket::new(id))).await
        }
        (QoS::ExactlyOnce, Some(id)) => {
            let already_seen = {
                let mut set = inbound_qos2.lock().expect("inbound qos2 mutex poisoned");
                !set.insert(id)
            };
            if already_seen {
                log::warn!("inbound: duplicate QoS 2 publish for id {id}, suppressing redelivery");
            } else {
                deliver(message_tx, publish).await;
            }
            send(frame_tx, Frame::PublishReceived(PublishReceivedPacket::new(id))).await
        }
        (qos, id) => Err(Error::new(
            ErrorKind::ProtocolError,
            &format!("illegal publish qos/id combination: qos={qos:?}, id={id:?}"),
        )),
    }
}

async fn deliver(message_tx: &mpsc::Sender<Message>, publish: &PublishPacket) {
    let message = Message::new(publish.topic(), publish.payload());
    if message_tx.send(message).await.is_err() {
        log::warn!("inbound: message sink closed, dropping delivered message");
    }
}

async fn on_publish_received(
    received: &PublishReceivedPacket,
    in_flight: &IdentifierTable<Frame>,
    frame_tx: &mpsc::Sender<Frame>,
) -> Result<(), Error> {
    let id = received.packet_id();
    in_flight.update(id, Frame::PublishRelease(PublishReleasePacket::new(id)));
    send(frame_tx, Frame::PublishRelease(PublishReleasePacket::new(id))).await
}

async fn on_publish_release(
    release: &PublishReleasePacket,
    frame_tx: &mpsc::Sender<Frame>,
    inbound_qos2: &Mutex<HashSet<PacketId>>,
) -> Result<(), Error> {
    let id = release.packet_id();
    inbound_qos2.lock().expect("inbound qos2 mutex poisoned").remove(&id);
    send(frame_tx, Frame::PublishComplete(PublishCompletePacket::new(id))).await
}

fn on_connect_ack(ack: ConnectAckPacket, connack_tx: &mut Option<oneshot::Sender<ConnectAckPacket>>) -> Result<(), Error> {
    match connack_tx.take() {
        Some(slot) => {
            let _ = slot.send(ack);
            Ok(())
        }
        None => Err(Error::new(ErrorKind::ProtocolError, "received a second CONNACK")),
    }
}

/// MQTT's SUBACK can refuse an individual topic filter (return code
/// `0x80`), which has no corresponding `QoS` value. Mapped defensively to
/// `QoS::AtMostOnce` with a warning rather than failing the whole
/// subscribe, since the other granted topics in the same SUBACK are
/// still valid.
fn granted_qos(code: &SubscribeAck) -> QoS {
    match code {
        SubscribeAck::QoS(qos) => *qos,
        SubscribeAck::Failed => {
            log::warn!("inbound: broker refused a subscribed topic filter");
            QoS::AtMostOnce
        }
    }
}

async fn send(frame_tx: &mpsc::Sender<Frame>, frame: Frame) -> Result<(), Error> {
    frame_tx.send(frame).await?;
    Ok(())
}
