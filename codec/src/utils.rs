// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringError {
    /// Not valid UTF-8.
    InvalidUtf8,

    /// Encoded length would exceed the 16-bit length prefix.
    TooLong,
}

/// Validate that `bytes` is well-formed UTF-8 and convert it to a `String`.
///
/// # Errors
///
/// Returns [`StringError::InvalidUtf8`] if `bytes` is not valid UTF-8.
pub fn to_utf8_string(bytes: &[u8]) -> Result<String, StringError> {
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(|_err| StringError::InvalidUtf8)
}

/// Validate that `s` encodes to no more than 65535 bytes, the limit of the
/// MQTT two-byte length prefix used by `StringData`/`BinaryData`.
///
/// # Errors
///
/// Returns [`StringError::TooLong`] if `s` is too large.
pub fn validate_utf8_string(s: &str) -> Result<(), StringError> {
    if s.len() > usize::from(u16::MAX) {
        Err(StringError::TooLong)
    } else {
        Ok(())
    }
}

/// Validate that `data` fits the 16-bit length prefix used by `BinaryData`.
///
/// # Errors
///
/// Returns [`StringError::TooLong`] if `data` is too large.
pub fn validate_two_bytes_data(data: &[u8]) -> Result<(), StringError> {
    if data.len() > usize::from(u16::MAX) {
        Err(StringError::TooLong)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientIdError {
    /// Length exceeds 23 bytes.
    ///
    /// The MQTT-3.1.3-5 limit; brokers are permitted to accept longer ids
    /// but this layer enforces the conservative interoperable bound.
    TooLong,

    /// Contains characters outside `0-9a-zA-Z`.
    InvalidChars,
}

/// Validate a client identifier against MQTT-3.1.3-5's character and
/// length constraints. An empty client id is valid (the broker assigns one).
///
/// # Errors
///
/// Returns [`ClientIdError`] if `client_id` is too long or uses characters
/// outside the allowed alphanumeric set.
pub fn validate_client_id(client_id: &str) -> Result<(), ClientIdError> {
    if client_id.len() > 23 {
        return Err(ClientIdError::TooLong);
    }
    if !client_id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ClientIdError::InvalidChars);
    }
    Ok(())
}

/// Generate a random alphanumeric client id, for callers that want one
/// without picking their own.
#[must_use]
pub fn random_client_id() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(23).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_client_id() {
        assert!(validate_client_id("").is_ok());
        assert!(validate_client_id("abc123").is_ok());
        assert_eq!(
            validate_client_id("has space"),
            Err(ClientIdError::InvalidChars)
        );
        assert_eq!(
            validate_client_id(&"a".repeat(24)),
            Err(ClientIdError::TooLong)
        );
    }

    #[test]
    fn test_random_client_id_is_valid() {
        let id = random_client_id();
        assert!(validate_client_id(&id).is_ok());
    }
}
