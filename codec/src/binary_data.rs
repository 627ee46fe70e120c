// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use crate::utils::validate_two_bytes_data;
use crate::{ByteArray, DecodeError, DecodePacket, EncodeError, EncodePacket};

/// Arbitrary bytes prefixed with a 16-bit big-endian length, used for will
/// messages and PUBLISH payloads that aren't decoded as UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryData(Vec<u8>);

impl BinaryData {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// # Errors
    ///
    /// Returns [`crate::utils::StringError`] if `data` exceeds the 64KiB
    /// length-prefix range.
    pub fn from_slice(data: &[u8]) -> Result<Self, crate::utils::StringError> {
        validate_two_bytes_data(data)?;
        Ok(Self(data.to_vec()))
    }

    #[must_use]
    pub fn bytes(&self) -> usize {
        2 + self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl AsRef<[u8]> for BinaryData {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<Vec<u8>> for BinaryData {
    fn as_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

impl DecodePacket for BinaryData {
    fn decode(ba: &mut ByteArray) -> Result<Self, DecodeError> {
        let len = ba.read_u16()? as usize;
        let bytes = ba.read_bytes(len)?;
        Ok(Self(bytes.to_vec()))
    }
}

impl EncodePacket for BinaryData {
    fn encode(&self, buf: &mut Vec<u8>) -> Result<usize, EncodeError> {
        validate_two_bytes_data(&self.0)?;
        let len = self.0.len() as u16;
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(&self.0);
        Ok(self.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_data_round_trip() {
        let data = BinaryData::from_slice(&[1, 2, 3]).unwrap();
        let mut buf = Vec::new();
        data.encode(&mut buf).unwrap();
        assert_eq!(&buf, &[0x00, 0x03, 1, 2, 3]);
        let mut ba = ByteArray::new(&buf);
        assert_eq!(BinaryData::decode(&mut ba).unwrap(), data);
    }
}
