// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

mod common;

use mqtt_codec::{Frame, PacketId, PubTopic, PublishCompletePacket, PublishPacket, PublishReceivedPacket, QoS};
use tether::Outcome;

/// E2: between PUBREC and PUBCOMP the in-flight outbound entry becomes a
/// PUBREL(QoS=1); after PUBCOMP the caller resumes with `Empty`, per
/// spec.md §8 scenario E2.
#[tokio::test]
async fn test_publish_qos2_round_trip() {
    let (session, mut peer) = common::connected_session("client-e2").await;

    let id = PacketId::new(42);
    let topic = PubTopic::new("t").expect("valid topic");
    let publish = PublishPacket::new(topic, QoS::ExactlyOnce, &[0xAA], Some(id)).expect("valid publish");

    let session_task = tokio::spawn(async move { session.send_receive(Frame::Publish(publish), id).await });

    match peer.incoming.recv().await.expect("outbound publish") {
        Frame::Publish(sent) => assert_eq!(sent.qos(), QoS::ExactlyOnce),
        other => panic!("expected PUBLISH, got {other:?}"),
    }

    peer.outgoing
        .send(Frame::PublishReceived(PublishReceivedPacket::new(id)))
        .await
        .expect("peer channel open");

    match peer.incoming.recv().await.expect("outbound release") {
        Frame::PublishRelease(release) => assert_eq!(release.packet_id(), id),
        other => panic!("expected PUBREL, got {other:?}"),
    }

    peer.outgoing
        .send(Frame::PublishComplete(PublishCompletePacket::new(id)))
        .await
        .expect("peer channel open");

    let outcome = session_task.await.expect("task join").expect("publish completed");
    assert_eq!(outcome, Outcome::Empty);
}
