// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::{ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket};

/// A single boolean value coded as one byte, `0x00` or `0x01`. Used by
/// connect flags bit-packing helpers that decode a byte at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolData(bool);

impl BoolData {
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(&self) -> bool {
        self.0
    }

    #[must_use]
    pub const fn bytes(&self) -> usize {
        Self::const_bytes()
    }

    #[must_use]
    pub const fn const_bytes() -> usize {
        1
    }
}

impl From<bool> for BoolData {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<BoolData> for bool {
    fn from(data: BoolData) -> Self {
        data.0
    }
}

impl DecodePacket for BoolData {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        match ba.read_byte()? {
            0x00 => Ok(Self(false)),
            0x01 => Ok(Self(true)),
            _ => Err(DecodeError::InvalidBoolData),
        }
    }
}

impl EncodePacket for BoolData {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        buf.push(u8::from(self.0));
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_data_round_trip() {
        for value in [true, false] {
            let mut buf = Vec::new();
            BoolData::new(value).encode(&mut buf).unwrap();
            let mut ba = ByteArray::new(&buf);
            assert_eq!(BoolData::decode(&mut ba).unwrap().value(), value);
        }
    }

    #[test]
    fn test_bool_data_invalid_byte() {
        let buf = [0x02];
        let mut ba = ByteArray::new(&buf);
        assert_eq!(BoolData::decode(&mut ba), Err(DecodeError::InvalidBoolData));
    }
}
