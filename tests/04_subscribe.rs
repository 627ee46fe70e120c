// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

mod common;

use mqtt_codec::{Frame, PacketId, QoS, SubTopic, SubscribeAck, SubscribeAckPacket, SubscribePacket, SubscribeTopic};
use tether::Outcome;

/// E4: `sendReceive` on SUBSCRIBE resumes with the granted QoS list in
/// request order, per spec.md §8 scenario E4.
#[tokio::test]
async fn test_subscribe_round_trip() {
    let (session, mut peer) = common::connected_session("client-e4").await;

    let id = PacketId::new(3);
    let topics = vec![
        SubscribeTopic::new(SubTopic::new("a").expect("valid topic"), QoS::AtMostOnce),
        SubscribeTopic::new(SubTopic::new("b").expect("valid topic"), QoS::ExactlyOnce),
    ];
    let subscribe = SubscribePacket::new(id, topics).expect("non-empty topic list");

    let session_task = tokio::spawn(async move { session.send_receive(Frame::Subscribe(subscribe), id).await });

    match peer.incoming.recv().await.expect("outbound subscribe") {
        Frame::Subscribe(sent) => assert_eq!(sent.packet_id(), id),
        other => panic!("expected SUBSCRIBE, got {other:?}"),
    }

    peer.outgoing
        .send(Frame::SubscribeAck(SubscribeAckPacket::new(
            id,
            vec![SubscribeAck::QoS(QoS::AtMostOnce), SubscribeAck::QoS(QoS::ExactlyOnce)],
        )))
        .await
        .expect("peer channel open");

    let outcome = session_task.await.expect("task join").expect("subscribe acked");
    assert_eq!(outcome, Outcome::QoS(vec![QoS::AtMostOnce, QoS::ExactlyOnce]));
}
