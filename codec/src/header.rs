// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use std::convert::TryFrom;

use crate::{ByteArray, DecodeError, EncodeError, QoS, VarInt};

/// Decode `Self` from a byte cursor positioned at the start of its
/// encoding. Implemented by every wire primitive and packet type.
pub trait DecodePacket: Sized {
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the cursor is exhausted or the bytes do
    /// not form a valid encoding.
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError>;
}

/// Encode `Self` onto the end of `buf`, returning the number of bytes
/// written.
pub trait EncodePacket {
    /// # Errors
    ///
    /// Returns [`EncodeError`] if `Self` holds a value that cannot be
    /// represented on the wire.
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError>;
}

/// Common surface every MQTT control packet implements, on top of
/// `DecodePacket`/`EncodePacket`.
pub trait Packet: DecodePacket + EncodePacket {
    /// Packet type this value decodes/encodes as.
    fn packet_type(&self) -> PacketType;

    /// Total encoded length, fixed header included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::VarIntError`] if the remaining length would not fit
    /// a four-byte `VarInt`.
    fn bytes(&self) -> Result<usize, crate::VarIntError>;
}

/// The fixed header type nibble together with its per-type flag bits,
/// as laid out in MQTT 3.1.1 section 2.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Connect,
    ConnectAck,
    Publish { dup: bool, qos: QoS, retain: bool },
    PublishAck,
    PublishReceived,
    PublishRelease,
    PublishComplete,
    Subscribe,
    SubscribeAck,
    Unsubscribe,
    UnsubscribeAck,
    PingRequest,
    PingResponse,
    Disconnect,
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> Self {
        let (type_bits, flag_bits): (u8, u8) = match packet_type {
            PacketType::Connect => (1, 0b0000),
            PacketType::ConnectAck => (2, 0b0000),
            PacketType::Publish { dup, qos, retain } => {
                let mut flags = 0u8;
                if dup {
                    flags |= 0b1000;
                }
                flags |= u8::from(qos) << 1;
                if retain {
                    flags |= 0b0001;
                }
                (3, flags)
            }
            PacketType::PublishAck => (4, 0b0000),
            PacketType::PublishReceived => (5, 0b0000),
            PacketType::PublishRelease => (6, 0b0010),
            PacketType::PublishComplete => (7, 0b0000),
            PacketType::Subscribe => (8, 0b0010),
            PacketType::SubscribeAck => (9, 0b0000),
            PacketType::Unsubscribe => (10, 0b0010),
            PacketType::UnsubscribeAck => (11, 0b0000),
            PacketType::PingRequest => (12, 0b0000),
            PacketType::PingResponse => (13, 0b0000),
            PacketType::Disconnect => (14, 0b0000),
        };
        (type_bits << 4) | flag_bits
    }
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let type_bits = byte >> 4;
        let flag_bits = byte & 0b1111;

        match type_bits {
            1 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::Connect)
            }
            2 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::ConnectAck)
            }
            3 => {
                let dup = flag_bits & 0b1000 != 0;
                let retain = flag_bits & 0b0001 != 0;
                let qos_bits = (flag_bits & 0b0110) >> 1;
                let qos = QoS::try_from(qos_bits).map_err(|_err| DecodeError::InvalidPacketFlags)?;
                Ok(Self::Publish { dup, qos, retain })
            }
            4 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::PublishAck)
            }
            5 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::PublishReceived)
            }
            6 => {
                if flag_bits != 0b0010 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::PublishRelease)
            }
            7 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::PublishComplete)
            }
            8 => {
                if flag_bits != 0b0010 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::Subscribe)
            }
            9 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::SubscribeAck)
            }
            10 => {
                if flag_bits != 0b0010 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::Unsubscribe)
            }
            11 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::UnsubscribeAck)
            }
            12 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::PingRequest)
            }
            13 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::PingResponse)
            }
            14 => {
                if flag_bits != 0 {
                    return Err(DecodeError::InvalidPacketFlags);
                }
                Ok(Self::Disconnect)
            }
            _ => {
                log::error!("invalid packet type nibble: {type_bits}");
                Err(DecodeError::InvalidPacketType)
            }
        }
    }
}

/// The first one-to-five bytes of every MQTT control packet: a type/flags
/// byte followed by the `Remaining Length` VarInt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader {
    pub packet_type: PacketType,
    pub remaining_length: VarInt,
}

impl FixedHeader {
    #[must_use]
    pub const fn new(packet_type: PacketType, remaining_length: VarInt) -> Self {
        Self {
            packet_type,
            remaining_length,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> usize {
        1 + self.remaining_length.bytes()
    }
}

impl DecodePacket for FixedHeader {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let byte = ba.read_byte()?;
        let packet_type = PacketType::try_from(byte)?;
        let remaining_length = VarInt::decode(ba)?;
        Ok(Self::new(packet_type, remaining_length))
    }
}

impl EncodePacket for FixedHeader {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        buf.push(self.packet_type.into());
        let len_bytes = self.remaining_length.encode(buf)?;
        Ok(1 + len_bytes)
    }
}
