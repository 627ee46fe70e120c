// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use mqtt_codec::{ConnectAckPacket, ConnectReturnCode, Frame};
use tether::{ChannelPeer, ChannelTransport, Session, SessionConfig, Transport};

/// Build a session wired to an in-memory peer instead of a real broker,
/// and drive the CONNECT/CONNACK handshake with `Accepted`.
pub async fn connected_session(client_id: &str) -> (Session, ChannelPeer) {
    connected_session_with_keep_alive(client_id, 60).await
}

/// Same as [`connected_session`], with an explicit `keep_alive` for tests
/// that exercise the ticker.
pub async fn connected_session_with_keep_alive(client_id: &str, keep_alive: u16) -> (Session, ChannelPeer) {
    let (transport, mut peer): (Transport, ChannelPeer) = ChannelTransport::pair(128);
    let mut config = SessionConfig::new(client_id).expect("valid client id");
    config.with_keep_alive(keep_alive);

    let connect_task = tokio::spawn(async move { Session::connect(&config, transport).await });

    match peer.incoming.recv().await.expect("CONNECT frame") {
        Frame::Connect(_) => {}
        other => panic!("expected CONNECT, got {other:?}"),
    }
    peer.outgoing
        .send(Frame::ConnectAck(ConnectAckPacket::new(false, ConnectReturnCode::Accepted)))
        .await
        .expect("peer channel open");

    let session = connect_task.await.expect("task join").expect("handshake accepted");
    (session, peer)
}
