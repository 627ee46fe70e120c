// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

//! Packet codec for the MQTT 3.1.1 protocol.
//!
//! This crate decodes and encodes the wire representation of MQTT control
//! packets. It knows nothing about sockets, timers or session state; it is
//! a pure, allocation-light transform between bytes and typed packets,
//! consumed by the `tether` engine crate.

mod binary_data;
mod bool_data;
mod byte_array;
mod connect_flags;
mod error;
mod header;
mod keep_alive;
pub mod packet;
mod packet_id;
mod protocol_level;
mod qos;
mod string_data;
mod topic;
mod u16_data;
pub mod utils;
mod var_int;

pub use binary_data::BinaryData;
pub use bool_data::BoolData;
pub use byte_array::{ByteArray, ByteArrayError};
pub use connect_flags::ConnectFlags;
pub use error::{DecodeError, EncodeError};
pub use header::{DecodePacket, EncodePacket, FixedHeader, Packet, PacketType};
pub use keep_alive::{validate_keep_alive, KeepAlive};
pub use packet::{
    ConnectAckPacket, ConnectPacket, ConnectReturnCode, DisconnectPacket, Frame, PingRequestPacket,
    PingResponsePacket, PublishAckPacket, PublishCompletePacket, PublishPacket, PublishReceivedPacket,
    PublishReleasePacket, SubscribeAck, SubscribeAckPacket, SubscribePacket, SubscribeTopic,
    UnsubscribeAckPacket, UnsubscribePacket,
};
pub use packet_id::PacketId;
pub use protocol_level::ProtocolLevel;
pub use qos::QoS;
pub use string_data::StringData;
pub use topic::{PubTopic, SubTopic};
pub use u16_data::U16Data;
pub use var_int::{VarInt, VarIntError, MAX_PACKET_LEN};
