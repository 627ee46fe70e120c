// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use bytes::Bytes;

use crate::{
    ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket, FixedHeader, Packet,
    PacketId, PacketType, PubTopic, QoS, VarInt, VarIntError,
};

/// PUBLISH, carrying an application message to or from the server
/// [MQTT-3.3].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPacket {
    dup: bool,
    qos: QoS,
    retain: bool,
    topic: PubTopic,
    packet_id: Option<PacketId>,
    payload: Bytes,
}

impl PublishPacket {
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidPacketId`] if `qos` requires a packet
    /// identifier and `packet_id` is `None`, or if `qos` is
    /// [`QoS::AtMostOnce`] and `packet_id` is `Some` (MQTT-3.3.1-2: a QoS
    /// 0 PUBLISH must not carry a packet identifier).
    pub fn new(
        topic: PubTopic,
        qos: QoS,
        payload: &[u8],
        packet_id: Option<PacketId>,
    ) -> Result<Self, DecodeError> {
        if qos != QoS::AtMostOnce && packet_id.is_none() {
            return Err(DecodeError::InvalidPacketId);
        }
        if qos == QoS::AtMostOnce && packet_id.is_some() {
            return Err(DecodeError::InvalidPacketId);
        }
        Ok(Self {
            dup: false,
            qos,
            retain: false,
            topic,
            packet_id,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    #[must_use]
    pub const fn qos(&self) -> QoS {
        self.qos
    }

    #[must_use]
    pub const fn dup(&self) -> bool {
        self.dup
    }

    #[must_use]
    pub const fn retain(&self) -> bool {
        self.retain
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    #[must_use]
    pub const fn packet_id(&self) -> Option<PacketId> {
        self.packet_id
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn set_dup(&mut self, dup: bool) -> &mut Self {
        self.dup = dup;
        self
    }

    pub fn set_retain(&mut self, retain: bool) -> &mut Self {
        self.retain = retain;
        self
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let remaining_length =
            self.topic.bytes() + self.packet_id.map_or(0, |_| PacketId::bytes()) + self.payload.len();
        Ok(FixedHeader::new(
            PacketType::Publish {
                dup: self.dup,
                qos: self.qos,
                retain: self.retain,
            },
            VarInt::from(remaining_length)?,
        ))
    }
}

impl DecodePacket for PublishPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        let PacketType::Publish { dup, qos, retain } = fixed_header.packet_type else {
            return Err(DecodeError::InvalidPacketType);
        };

        let header_start = ba.offset();
        let topic = PubTopic::decode(ba)?;

        let packet_id = if qos == QoS::AtMostOnce {
            if dup {
                // DUP must be 0 for QoS 0 PUBLISH [MQTT-3.3.1-2].
                return Err(DecodeError::InvalidPacketFlags);
            }
            None
        } else {
            Some(PacketId::decode(ba)?)
        };

        let consumed = ba.offset() - header_start;
        let payload_len = fixed_header
            .remaining_length
            .value()
            .checked_sub(consumed)
            .ok_or(DecodeError::InvalidRemainingLength)?;
        let payload = ba.read_bytes(payload_len)?;

        Ok(Self {
            dup,
            qos,
            retain,
            topic,
            packet_id,
            payload: Bytes::copy_from_slice(payload),
        })
    }
}

impl EncodePacket for PublishPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        if self.qos != QoS::AtMostOnce && self.packet_id.is_none() {
            return Err(EncodeError::InvalidPacketType);
        }

        let old_len = buf.len();
        self.get_fixed_header()?.encode(buf)?;
        self.topic.encode(buf)?;
        if let Some(packet_id) = self.packet_id {
            packet_id.encode(buf)?;
        }
        buf.extend_from_slice(&self.payload);
        Ok(buf.len() - old_len)
    }
}

impl Packet for PublishPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Publish {
            dup: self.dup,
            qos: self.qos,
            retain: self.retain,
        }
    }

    fn bytes(&self) -> Result<usize, VarIntError> {
        let fixed_header = self.get_fixed_header()?;
        Ok(fixed_header.bytes() + fixed_header.remaining_length.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_qos1_round_trip() {
        let topic = PubTopic::new("sensors/temp").unwrap();
        let packet =
            PublishPacket::new(topic, QoS::AtLeastOnce, b"21.5", Some(PacketId::new(7))).unwrap();

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();

        let mut ba = ByteArray::new(&buf);
        let decoded = PublishPacket::decode(&mut ba).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_publish_qos0_requires_no_packet_id() {
        let topic = PubTopic::new("sensors/temp").unwrap();
        assert_eq!(
            PublishPacket::new(topic, QoS::AtMostOnce, b"x", Some(PacketId::new(1))),
            Err(DecodeError::InvalidPacketId)
        );
    }

    #[test]
    fn test_publish_qos1_requires_packet_id() {
        let topic = PubTopic::new("sensors/temp").unwrap();
        assert_eq!(
            PublishPacket::new(topic, QoS::AtLeastOnce, b"x", None),
            Err(DecodeError::InvalidPacketId)
        );
    }
}
