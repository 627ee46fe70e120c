// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use mqtt_codec::{ConnectAckPacket, ConnectReturnCode, Frame};
use tether::{ChannelPeer, ChannelTransport, ErrorKind, Session, SessionConfig, Transport};

/// E5: a non-zero CONNACK return code fails construction with
/// `ConnectionFailure` and no `Session` is returned, per spec.md §8
/// scenario E5.
#[tokio::test]
async fn test_connection_refused() {
    let (transport, mut peer): (Transport, ChannelPeer) = ChannelTransport::pair(128);
    let config = SessionConfig::new("client-e5").expect("valid client id");

    let connect_task = tokio::spawn(async move { Session::connect(&config, transport).await });

    match peer.incoming.recv().await.expect("CONNECT frame") {
        Frame::Connect(_) => {}
        other => panic!("expected CONNECT, got {other:?}"),
    }
    peer.outgoing
        .send(Frame::ConnectAck(ConnectAckPacket::new(
            false,
            ConnectReturnCode::BadUserNameOrPassword,
        )))
        .await
        .expect("peer channel open");

    let result = connect_task.await.expect("task join");
    let err = result.expect_err("refused connection must fail construction");
    assert!(matches!(err.kind(), ErrorKind::ConnectionFailure));
}
