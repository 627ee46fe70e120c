// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use std::fmt::{self, Display};
use std::io;

use tokio::sync::mpsc;

use mqtt_codec::Frame;

/// Type of error raised anywhere in the engine.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// Broker violated MQTT framing or sent a frame illegal for the
    /// client role. Fatal; the session tears down.
    ProtocolError,

    /// CONNACK carried a non-zero return code.
    ConnectionFailure,

    /// Underlying transport I/O failed.
    TransportError,

    /// The caller invoked `cancel()`.
    Cancelled,

    /// A frame could not be encoded for the wire.
    EncodeError,

    /// Inbound bytes did not decode to a valid frame.
    DecodeError,

    /// Enqueueing onto an internal channel failed because the receiving
    /// task has already stopped.
    ChannelError,
}

#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_owned(),
        }
    }

    #[must_use]
    pub const fn from_string(kind: ErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::from_string(ErrorKind::TransportError, format!("IoError: {err}"))
    }
}

impl From<mqtt_codec::EncodeError> for Error {
    fn from(err: mqtt_codec::EncodeError) -> Self {
        Self::from_string(ErrorKind::EncodeError, format!("{err:?}"))
    }
}

impl From<mqtt_codec::DecodeError> for Error {
    fn from(err: mqtt_codec::DecodeError) -> Self {
        Self::from_string(ErrorKind::DecodeError, format!("{err:?}"))
    }
}

macro_rules! convert_send_error {
    ($cmd_type: ty) => {
        impl From<mpsc::error::SendError<$cmd_type>> for Error {
            fn from(err: mpsc::error::SendError<$cmd_type>) -> Self {
                Error::from_string(ErrorKind::ChannelError, format!("channel closed: {err}"))
            }
        }
    };
}

convert_send_error!(Frame);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::new(ErrorKind::ProtocolError, "unexpected frame");
        assert_eq!(format!("{err}"), "ProtocolError: unexpected frame");
    }
}
