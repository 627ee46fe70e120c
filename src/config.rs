// Copyright (c) 2020 Xu Shaohua <shaohua@biofan.org>. All rights reserved.
// Use of this source is governed by Affero General Public License that can be found
// in the LICENSE file.

use mqtt_codec::QoS;

use crate::error::{Error, ErrorKind};

/// A Will Message, published by the broker on behalf of a client that
/// disconnects ungracefully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Will {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Immutable parameters established at session construction, mirroring
/// the teacher's `ConnectOptions` builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    client_id: String,
    keep_alive: u16,
    clean_session: bool,
    will: Option<Will>,
    user: Option<String>,
    password: Option<Vec<u8>>,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns [`ErrorKind::ProtocolError`] if `client_id` violates
    /// MQTT-3.1.3-5's character or length constraints.
    pub fn new(client_id: &str) -> Result<Self, Error> {
        mqtt_codec::utils::validate_client_id(client_id)
            .map_err(|err| Error::new(ErrorKind::ProtocolError, &format!("invalid client id: {err:?}")))?;
        Ok(Self {
            client_id: client_id.to_owned(),
            keep_alive: 60,
            clean_session: true,
            will: None,
            user: None,
            password: None,
        })
    }

    pub fn with_keep_alive(&mut self, keep_alive: u16) -> &mut Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_clean_session(&mut self, clean_session: bool) -> &mut Self {
        self.clean_session = clean_session;
        self
    }

    pub fn with_will(&mut self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> &mut Self {
        self.will = Some(Will {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        self
    }

    pub fn with_credentials(&mut self, user: &str, password: &[u8]) -> &mut Self {
        self.user = Some(user.to_owned());
        self.password = Some(password.to_vec());
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub const fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    #[must_use]
    pub const fn clean_session(&self) -> bool {
        self.clean_session
    }

    #[must_use]
    pub fn will(&self) -> Option<&Will> {
        self.will.as_ref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    #[must_use]
    pub fn password(&self) -> Option<&[u8]> {
        self.password.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_builder() {
        let mut config = SessionConfig::new("client-01").unwrap();
        config
            .with_keep_alive(30)
            .with_clean_session(false)
            .with_credentials("alice", b"secret");
        assert_eq!(config.client_id(), "client-01");
        assert_eq!(config.keep_alive(), 30);
        assert!(!config.clean_session());
        assert_eq!(config.user(), Some("alice"));
    }

    #[test]
    fn test_session_config_rejects_bad_client_id() {
        assert!(SessionConfig::new("has space").is_err());
    }
}
