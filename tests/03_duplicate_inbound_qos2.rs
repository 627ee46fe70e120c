// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

mod common;

use std::time::Duration;

use mqtt_codec::{Frame, PacketId, PubTopic, PublishPacket, QoS};

/// E3: a retransmitted inbound QoS 2 PUBLISH is delivered to the caller
/// exactly once, but PUBREC is sent for both copies, per spec.md §8
/// scenario E3 and invariants 3-4.
#[tokio::test]
async fn test_duplicate_inbound_qos2_suppressed() {
    let (mut session, mut peer) = common::connected_session("client-e3").await;

    let id = PacketId::new(9);
    let topic = PubTopic::new("t").expect("valid topic");
    let publish = PublishPacket::new(topic, QoS::ExactlyOnce, b"payload", Some(id)).expect("valid publish");

    peer.outgoing
        .send(Frame::Publish(publish.clone()))
        .await
        .expect("peer channel open");
    peer.outgoing.send(Frame::Publish(publish)).await.expect("peer channel open");

    let first = session.messages().next().await.expect("one delivered message");
    assert_eq!(first.topic(), "t");
    assert_eq!(first.payload(), b"payload");

    for _ in 0..2 {
        match peer.incoming.recv().await.expect("outbound pubrec") {
            Frame::PublishReceived(received) => assert_eq!(received.packet_id(), id),
            other => panic!("expected PUBREC, got {other:?}"),
        }
    }

    let second = tokio::time::timeout(Duration::from_millis(50), session.messages().next()).await;
    assert!(second.is_err(), "no second message should be delivered for the retransmit");

    session.cancel();
}
