// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

mod common;

use std::time::Duration;

use mqtt_codec::{Frame, PacketId, PubTopic, PublishAckPacket, PublishPacket, QoS};

/// E6: with `keep_alive = 2`, idle for the full interval yields exactly
/// one PINGREQ; outbound activity at `t=1s` resets the timer so no
/// PINGREQ is produced at the original `t=2s` deadline, per spec.md §8
/// scenario E6.
#[tokio::test(start_paused = true)]
async fn test_keep_alive_resets_on_activity() {
    let (session, mut peer) = common::connected_session_with_keep_alive("client-e6", 2).await;

    tokio::time::advance(Duration::from_secs(1)).await;

    let id = PacketId::new(1);
    let topic = PubTopic::new("t").expect("valid topic");
    let publish = PublishPacket::new(topic, QoS::AtLeastOnce, b"x", Some(id)).expect("valid publish");
    session.send(Frame::Publish(publish)).await.expect("frame queue open");
    match peer.incoming.recv().await.expect("outbound publish") {
        Frame::Publish(_) => {}
        other => panic!("expected PUBLISH, got {other:?}"),
    }
    peer.outgoing
        .send(Frame::PublishAck(PublishAckPacket::new(id)))
        .await
        .expect("peer channel open");

    tokio::time::advance(Duration::from_secs(1)).await;
    let no_ping = tokio::time::timeout(Duration::from_millis(1), peer.incoming.recv());
    assert!(no_ping.await.is_err(), "ticker reset at t=1s must suppress the t=2s PINGREQ");

    tokio::time::advance(Duration::from_secs(2)).await;
    match peer.incoming.recv().await.expect("outbound pingreq") {
        Frame::PingRequest(_) => {}
        other => panic!("expected PINGREQ, got {other:?}"),
    }

    drop(session);
}
