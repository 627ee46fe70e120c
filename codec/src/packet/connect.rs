// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::utils::validate_client_id;
use crate::{
    BinaryData, ByteArray, ConnectFlags, DecodeError, DecodePacket, EncodeError, EncodePacket,
    FixedHeader, KeepAlive, Packet, PacketType, ProtocolLevel, PubTopic, QoS, StringData, VarInt,
    VarIntError,
};

/// CONNECT, the first packet a client sends to open a session
/// [MQTT-3.1].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPacket {
    client_id: StringData,
    protocol_level: ProtocolLevel,
    keep_alive: KeepAlive,
    flags: ConnectFlags,
    username: StringData,
    password: BinaryData,
    will_topic: Option<PubTopic>,
    will_message: BinaryData,
}

impl ConnectPacket {
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidClientId`] if `client_id` does not
    /// meet MQTT-3.1.3-5's constraints.
    pub fn new(client_id: &str) -> Result<Self, DecodeError> {
        validate_client_id(client_id).map_err(|_err| DecodeError::InvalidClientId)?;
        Ok(Self {
            client_id: StringData::from(client_id).map_err(|_err| DecodeError::InvalidClientId)?,
            protocol_level: ProtocolLevel::V4,
            keep_alive: KeepAlive::new(60),
            flags: ConnectFlags::default(),
            username: StringData::new(),
            password: BinaryData::new(),
            will_topic: None,
            will_message: BinaryData::new(),
        })
    }

    pub fn set_keep_alive(&mut self, seconds: u16) -> &mut Self {
        self.keep_alive = KeepAlive::new(seconds);
        self
    }

    pub fn set_clean_session(&mut self, clean_session: bool) -> &mut Self {
        self.flags.clean_session = clean_session;
        self
    }

    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidString`] if `username` is too long.
    pub fn set_username(&mut self, username: &str) -> Result<&mut Self, DecodeError> {
        self.username = StringData::from(username)?;
        self.flags.has_username = !self.username.is_empty();
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidString`] if `password` is too long.
    pub fn set_password(&mut self, password: &[u8]) -> Result<&mut Self, DecodeError> {
        self.password = BinaryData::from_slice(password)?;
        self.flags.has_password = !self.password.as_ref().is_empty();
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidTopic`] if `topic` is empty or
    /// contains a wildcard.
    pub fn set_will(
        &mut self,
        topic: &str,
        message: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<&mut Self, DecodeError> {
        self.will_topic = Some(PubTopic::new(topic)?);
        self.will_message = BinaryData::from_slice(message)?;
        self.flags.will = true;
        self.flags.will_qos = qos;
        self.flags.will_retain = retain;
        Ok(self)
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_ref()
    }

    #[must_use]
    pub fn keep_alive(&self) -> KeepAlive {
        self.keep_alive
    }

    fn get_fixed_header(&self) -> Result<FixedHeader, VarIntError> {
        let remaining_length = 10
            + self.client_id.bytes()
            + if self.flags.will {
                self.will_topic.as_ref().map_or(0, PubTopic::bytes) + self.will_message.bytes()
            } else {
                0
            }
            + if self.flags.has_username {
                self.username.bytes()
            } else {
                0
            }
            + if self.flags.has_password {
                self.password.bytes()
            } else {
                0
            };
        Ok(FixedHeader::new(
            PacketType::Connect,
            VarInt::from(remaining_length)?,
        ))
    }
}

impl DecodePacket for ConnectPacket {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let fixed_header = FixedHeader::decode(ba)?;
        if fixed_header.packet_type != PacketType::Connect {
            return Err(DecodeError::InvalidPacketType);
        }

        let protocol_name = StringData::decode(ba)?;
        if protocol_name.as_ref() != "MQTT" {
            return Err(DecodeError::InvalidProtocolName);
        }

        let protocol_level = ProtocolLevel::decode(ba)?;
        let flags = ConnectFlags::decode(ba)?;
        let keep_alive = KeepAlive::decode(ba)?;

        let client_id = StringData::decode(ba)?;
        validate_client_id(client_id.as_ref()).map_err(|_err| DecodeError::InvalidClientId)?;

        let (will_topic, will_message) = if flags.will {
            let topic = StringData::decode(ba)?;
            let topic = PubTopic::new(topic.as_ref())?;
            let message = BinaryData::decode(ba)?;
            (Some(topic), message)
        } else {
            (None, BinaryData::new())
        };

        let username = if flags.has_username {
            StringData::decode(ba)?
        } else {
            StringData::new()
        };

        let password = if flags.has_password {
            BinaryData::decode(ba)?
        } else {
            BinaryData::new()
        };

        Ok(Self {
            client_id,
            protocol_level,
            keep_alive,
            flags,
            username,
            password,
            will_topic,
            will_message,
        })
    }
}

impl EncodePacket for ConnectPacket {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        let old_len = buf.len();

        let fixed_header = self.get_fixed_header()?;
        fixed_header.encode(buf)?;

        StringData::from("MQTT")?.encode(buf)?;
        self.protocol_level.encode(buf)?;
        self.flags.encode(buf)?;
        self.keep_alive.encode(buf)?;
        self.client_id.encode(buf)?;

        if self.flags.will {
            if let Some(will_topic) = &self.will_topic {
                will_topic.encode(buf)?;
            }
            self.will_message.encode(buf)?;
        }

        if self.flags.has_username {
            self.username.encode(buf)?;
        }
        if self.flags.has_password {
            self.password.encode(buf)?;
        }

        Ok(buf.len() - old_len)
    }
}

impl Packet for ConnectPacket {
    fn packet_type(&self) -> PacketType {
        PacketType::Connect
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
    fn test_connect_round_trip() {
        let mut packet = ConnectPacket::new("client-01").unwrap();
        packet.set_keep_alive(30);
        packet.set_username("alice").unwrap();
        packet.set_password(b"secret").unwrap();
        packet
            .set_will("clients/client-01/status", b"offline", QoS::AtLeastOnce, true)
            .unwrap();

        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();

        let mut ba = ByteArray::new(&buf);
        let decoded = ConnectPacket::decode(&mut ba).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_connect_rejects_bad_protocol_name() {
        let mut buf = Vec::new();
        FixedHeader::new(PacketType::Connect, VarInt::from(8).unwrap())
            .encode(&mut buf)
            .unwrap();
        StringData::from("MQTX").unwrap().encode(&mut buf).unwrap();
        ProtocolLevel::V4.encode(&mut buf).unwrap();
        ConnectFlags::default().encode(&mut buf).unwrap();
        KeepAlive::new(0).encode(&mut buf).unwrap();

        let mut ba = ByteArray::new(&buf);
        assert_eq!(
            ConnectPacket::decode(&mut ba),
            Err(DecodeError::InvalidProtocolName)
        );
    }
}
