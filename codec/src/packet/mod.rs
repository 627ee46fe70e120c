// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Concrete packet types and the [`Frame`] dispatch enum that ties them
//! to a single fixed-header type nibble, grounded on the dispatch done
//! by a hand-rolled router reading off a socket: peek the type, then
//! decode the matching packet from the start of the same bytes.

mod connect;
mod connect_ack;
mod disconnect;
mod ping_request;
mod ping_response;
mod publish;
mod publish_ack;
mod publish_complete;
mod publish_received;
mod publish_release;
mod subscribe;
mod subscribe_ack;
mod unsubscribe;
mod unsubscribe_ack;

pub use connect::ConnectPacket;
pub use connect_ack::{ConnectAckPacket, ConnectReturnCode};
pub use disconnect::DisconnectPacket;
pub use ping_request::PingRequestPacket;
pub use ping_response::PingResponsePacket;
pub use publish::PublishPacket;
pub use publish_ack::PublishAckPacket;
pub use publish_complete::PublishCompletePacket;
pub use publish_received::PublishReceivedPacket;
pub use publish_release::PublishReleasePacket;
pub use subscribe::{SubscribePacket, SubscribeTopic};
pub use subscribe_ack::{SubscribeAck, SubscribeAckPacket};
pub use unsubscribe::UnsubscribePacket;
pub use unsubscribe_ack::UnsubscribeAckPacket;

use crate::header::PacketType;
use crate::{ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket};

/// Every MQTT 3.1.1 control packet this client sends or receives, tagged
/// by variant so a caller holding raw bytes can decode without knowing
/// the type ahead of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Connect(ConnectPacket),
    ConnectAck(ConnectAckPacket),
    Publish(PublishPacket),
    PublishAck(PublishAckPacket),
    PublishReceived(PublishReceivedPacket),
    PublishRelease(PublishReleasePacket),
    PublishComplete(PublishCompletePacket),
    Subscribe(SubscribePacket),
    SubscribeAck(SubscribeAckPacket),
    Unsubscribe(UnsubscribePacket),
    UnsubscribeAck(UnsubscribeAckPacket),
    PingRequest(PingRequestPacket),
    PingResponse(PingResponsePacket),
    Disconnect(DisconnectPacket),
}

impl Frame {
    /// Decode a single packet from `ba`, dispatching on the fixed header's
    /// type nibble.
    ///
    /// The cursor is cloned to peek the fixed header first; each packet's
    /// own `decode` independently re-reads its fixed header from the
    /// original, unconsumed cursor, so only `ba` itself advances once this
    /// call returns.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes do not form a complete, valid
    /// packet of the type the fixed header claims.
    pub fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let mut peek = *ba;
        let fixed_header = crate::FixedHeader::decode(&mut peek)?;

        let frame = match fixed_header.packet_type {
            PacketType::Connect => Self::Connect(ConnectPacket::decode(ba)?),
            PacketType::ConnectAck => Self::ConnectAck(ConnectAckPacket::decode(ba)?),
            PacketType::Publish { .. } => Self::Publish(PublishPacket::decode(ba)?),
            PacketType::PublishAck => Self::PublishAck(PublishAckPacket::decode(ba)?),
            PacketType::PublishReceived => Self::PublishReceived(PublishReceivedPacket::decode(ba)?),
            PacketType::PublishRelease => Self::PublishRelease(PublishReleasePacket::decode(ba)?),
            PacketType::PublishComplete => Self::PublishComplete(PublishCompletePacket::decode(ba)?),
            PacketType::Subscribe => Self::Subscribe(SubscribePacket::decode(ba)?),
            PacketType::SubscribeAck => Self::SubscribeAck(SubscribeAckPacket::decode(ba)?),
            PacketType::Unsubscribe => Self::Unsubscribe(UnsubscribePacket::decode(ba)?),
            PacketType::UnsubscribeAck => Self::UnsubscribeAck(UnsubscribeAckPacket::decode(ba)?),
            PacketType::PingRequest => Self::PingRequest(PingRequestPacket::decode(ba)?),
            PacketType::PingResponse => Self::PingResponse(PingResponsePacket::decode(ba)?),
            PacketType::Disconnect => Self::Disconnect(DisconnectPacket::decode(ba)?),
        };

        Ok(frame)
    }

    /// Encode this frame to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the wrapped packet cannot be represented
    /// on the wire.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        match self {
            Self::Connect(p) => p.encode(buf),
            Self::ConnectAck(p) => p.encode(buf),
            Self::Publish(p) => p.encode(buf),
            Self::PublishAck(p) => p.encode(buf),
            Self::PublishReceived(p) => p.encode(buf),
            Self::PublishRelease(p) => p.encode(buf),
            Self::PublishComplete(p) => p.encode(buf),
            Self::Subscribe(p) => p.encode(buf),
            Self::SubscribeAck(p) => p.encode(buf),
            Self::Unsubscribe(p) => p.encode(buf),
            Self::UnsubscribeAck(p) => p.encode(buf),
            Self::PingRequest(p) => p.encode(buf),
            Self::PingResponse(p) => p.encode(buf),
            Self::Disconnect(p) => p.encode(buf),
        }
    }

    /// The packet type this frame carries.
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::Connect(_) => PacketType::Connect,
            Self::ConnectAck(_) => PacketType::ConnectAck,
            Self::Publish(p) => crate::Packet::packet_type(p),
            Self::PublishAck(_) => PacketType::PublishAck,
            Self::PublishReceived(_) => PacketType::PublishReceived,
            Self::PublishRelease(_) => PacketType::PublishRelease,
            Self::PublishComplete(_) => PacketType::PublishComplete,
            Self::Subscribe(_) => PacketType::Subscribe,
            Self::SubscribeAck(_) => PacketType::SubscribeAck,
            Self::Unsubscribe(_) => PacketType::Unsubscribe,
            Self::UnsubscribeAck(_) => PacketType::UnsubscribeAck,
            Self::PingRequest(_) => PacketType::PingRequest,
            Self::PingResponse(_) => PacketType::PingResponse,
            Self::Disconnect(_) => PacketType::Disconnect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PacketId, PubTopic, QoS};

    #[test]
    fn test_frame_dispatch_round_trip() {
        let topic = PubTopic::new("a/b").unwrap();
        let publish =
            PublishPacket::new(topic, QoS::AtLeastOnce, b"payload", Some(PacketId::new(1))).unwrap();
        let frame = Frame::Publish(publish);

        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();

        let mut ba = ByteArray::new(&buf);
        let decoded = Frame::decode(&mut ba).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_frame_dispatch_ping() {
        let frame = Frame::PingRequest(PingRequestPacket::new());
        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();
        let mut ba = ByteArray::new(&buf);
        assert_eq!(Frame::decode(&mut ba).unwrap(), frame);
    }
}
