// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the inverter bot.
//!
//! The hierarchy mirrors the three recovery classes of the bridge:
//!
//! - [`ParseError`]: a telemetry payload could not be decoded. The message is
//!   dropped and the status store is left untouched.
//! - [`ProtocolError`]: a call to the broker or the chat API failed. The
//!   current tick is abandoned and the loop carries on with the next one.
//! - [`ConfigError`]: required settings are missing or invalid. Startup is
//!   aborted.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the broker or the chat API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a telemetry payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while loading or validating configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to transport communication (MQTT and the Bot API).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MQTT connection or communication failed.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to a remote endpoint failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication failed (bad bot token or broker credentials).
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The chat API answered with `ok: false`.
    #[error("API error {code}: {description}")]
    Api {
        /// Error code reported by the API.
        code: i64,
        /// Human readable description reported by the API.
        description: String,
    },
}

/// Errors related to decoding inbound payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The payload decoded to JSON `null`.
    #[error("payload is null")]
    Null,
}

/// Errors related to loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting has no value.
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// A setting has a value that cannot be used.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// The offending setting.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("failed to parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ProtocolError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error 400: Bad Request: chat not found");
    }

    #[test]
    fn error_from_protocol_error() {
        let err: Error = ProtocolError::AuthenticationFailed.into();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::AuthenticationFailed)
        ));
    }

    #[test]
    fn parse_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ParseError = json_err.into();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::Missing("telegram.token");
        assert_eq!(
            err.to_string(),
            "missing configuration value: telegram.token"
        );

        let err = ConfigError::Invalid {
            key: "mqtt.port",
            message: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "invalid value for mqtt.port: not a number");
    }
}
