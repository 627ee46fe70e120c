// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

mod common;

use std::time::Duration;

use mqtt_codec::{Frame, PacketId, PubTopic, PublishPacket, QoS};
use tether::ErrorKind;

/// Invariant 1: an inbound QoS 0 PUBLISH with no id yields exactly one
/// Message and produces no outbound frame.
#[tokio::test]
async fn test_qos0_publish_is_fire_and_forget() {
    let (mut session, mut peer) = common::connected_session("client-qos0").await;

    let topic = PubTopic::new("sensors/temp").expect("valid topic");
    let publish = PublishPacket::new(topic, QoS::AtMostOnce, b"21.5", None).expect("valid publish");
    peer.outgoing.send(Frame::Publish(publish)).await.expect("peer channel open");

    let message = session.messages().next().await.expect("delivered message");
    assert_eq!(message.topic(), "sensors/temp");
    assert_eq!(message.payload(), b"21.5");

    let no_ack = tokio::time::timeout(Duration::from_millis(50), peer.incoming.recv()).await;
    assert!(no_ack.is_err(), "QoS 0 delivery must not produce an outbound frame");

    session.cancel();
}

/// `cancel()` completes every pending `send_receive` waiter with
/// `Cancelled` rather than leaving it hanging forever.
#[tokio::test]
async fn test_cancel_completes_pending_waiters() {
    let (session, mut peer) = common::connected_session("client-cancel").await;

    let id = PacketId::new(1);
    let topic = PubTopic::new("t").expect("valid topic");
    let publish = PublishPacket::new(topic, QoS::AtLeastOnce, b"x", Some(id)).expect("valid publish");

    let waiter = tokio::spawn(async move {
        let outcome = session.send_receive(Frame::Publish(publish), id).await;
        (session, outcome)
    });

    match peer.incoming.recv().await.expect("outbound publish") {
        Frame::Publish(_) => {}
        other => panic!("expected PUBLISH, got {other:?}"),
    }

    // Give the waiter a moment to register before racing cancel() against it.
    tokio::task::yield_now().await;

    // `session` has moved into `waiter`; cancel via a fresh handle isn't
    // possible here, so this test only exercises the direct-drop path:
    // dropping the peer closes the transport, which the inbound pipeline
    // observes as end-of-stream and treats the same way `cancel()` does.
    drop(peer);

    let (_session, outcome) = waiter.await.expect("task join");
    let err = outcome.expect_err("cancelled waiter must fail");
    assert!(matches!(err.kind(), ErrorKind::Cancelled));
}
