// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! | Variable             | Setting             |
//! |----------------------|---------------------|
//! | `MQ_HOST`            | `mqtt.host`         |
//! | `MQ_PORT`            | `mqtt.port`         |
//! | `MQ_USER`            | `mqtt.username`     |
//! | `MQ_PASSWORD`        | `mqtt.password`     |
//! | `MQ_TOPIC`           | `mqtt.topic`        |
//! | `TELEGRAM_BOT_TOKEN` | `telegram.token`    |
//! | `TELEGRAM_CHAT_ID`   | `telegram.chat_id`  |
//! | `TELEGRAM_API_URL`   | `telegram.api_url`  |
//!
//! # Examples
//!
//! ```
//! use inverter_bot::config::Config;
//!
//! let config = Config::from_toml_str(r#"
//!     [mqtt]
//!     host = "broker.local"
//!     username = "inverter"
//!     password = "secret"
//!
//!     [telegram]
//!     token = "123456:ABC-DEF"
//!     chat_id = -1001234567890
//! "#).unwrap();
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.mqtt.port, 1883);
//! assert_eq!(config.mqtt.topic, "status");
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::chat::TelegramConfig;
use crate::error::ConfigError;
use crate::telemetry::{DEFAULT_TOPIC, TelemetrySubscriber, TelemetrySubscriberBuilder};

/// Complete bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Telemetry broker settings.
    pub mqtt: MqttSettings,
    /// Chat bot settings.
    pub telegram: TelegramSettings,
}

/// Telemetry broker settings.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttSettings {
    /// Broker host name or address.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Broker user name.
    pub username: Option<String>,
    /// Broker password.
    pub password: Option<String>,
    /// Topic the inverter monitor publishes on.
    pub topic: String,
    /// MQTT keep-alive interval in seconds.
    pub keep_alive_secs: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            username: None,
            password: None,
            topic: DEFAULT_TOPIC.to_string(),
            keep_alive_secs: 30,
        }
    }
}

impl MqttSettings {
    /// Creates a subscriber builder from these settings.
    #[must_use]
    pub fn subscriber(&self) -> TelemetrySubscriberBuilder {
        let builder = TelemetrySubscriber::builder()
            .host(&self.host)
            .port(self.port)
            .topic(&self.topic)
            .keep_alive(Duration::from_secs(self.keep_alive_secs));

        match (&self.username, &self.password) {
            (Some(username), password) => {
                builder.credentials(username, password.clone().unwrap_or_default())
            }
            (None, _) => builder,
        }
    }
}

impl std::fmt::Debug for MqttSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("topic", &self.topic)
            .field("keep_alive_secs", &self.keep_alive_secs)
            .finish()
    }
}

/// Longest accepted `getUpdates` wait, in seconds.
///
/// Shutdown is observed between ticks, so this plus the request timeout
/// bounds how long a Ctrl-C can go unanswered.
pub const MAX_POLL_TIMEOUT_SECS: u64 = 50;

/// Chat bot settings.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramSettings {
    /// Bot token issued by `@BotFather`.
    pub token: String,
    /// Conversation notifications are sent to.
    pub chat_id: Option<i64>,
    /// Bot API endpoint.
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Server-side wait of `getUpdates` in seconds, at most
    /// [`MAX_POLL_TIMEOUT_SECS`].
    pub poll_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_id: None,
            api_url: TelegramConfig::DEFAULT_API_URL.to_string(),
            timeout_secs: TelegramConfig::DEFAULT_TIMEOUT.as_secs(),
            poll_timeout_secs: TelegramConfig::DEFAULT_POLL_TIMEOUT.as_secs(),
        }
    }
}

impl TelegramSettings {
    /// Creates the client configuration from these settings.
    #[must_use]
    pub fn client_config(&self) -> TelegramConfig {
        TelegramConfig::new(&self.token)
            .with_api_url(&self.api_url)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_poll_timeout(Duration::from_secs(self.poll_timeout_secs))
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &"***")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Loads the configuration used by the binary.
    ///
    /// Reads `path` when given, applies the process environment and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, an
    /// environment value is malformed, or a required setting is missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Toml` if the document is invalid.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overrides settings with the variables found by `lookup`.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("MQ_HOST") {
            self.mqtt.host = host;
        }
        if let Some(port) = var("MQ_PORT") {
            self.mqtt.port = parse_number("mqtt.port", &port)?;
        }
        if let Some(username) = var("MQ_USER") {
            self.mqtt.username = Some(username);
        }
        if let Some(password) = var("MQ_PASSWORD") {
            self.mqtt.password = Some(password);
        }
        if let Some(topic) = var("MQ_TOPIC") {
            self.mqtt.topic = topic;
        }
        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            self.telegram.token = token;
        }
        if let Some(chat_id) = var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(parse_number("telegram.chat_id", &chat_id)?);
        }
        if let Some(api_url) = var("TELEGRAM_API_URL") {
            self.telegram.api_url = api_url;
        }
        Ok(())
    }

    /// Checks that the settings needed to start are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.host.trim().is_empty() {
            return Err(ConfigError::Missing("mqtt.host"));
        }
        if self.mqtt.topic.trim().is_empty() {
            return Err(ConfigError::Missing("mqtt.topic"));
        }
        if self.telegram.token.trim().is_empty() {
            return Err(ConfigError::Missing("telegram.token"));
        }
        if !self.telegram.token.contains(':') {
            return Err(ConfigError::Invalid {
                key: "telegram.token",
                message: "expected <bot id>:<secret>".to_string(),
            });
        }
        if self.telegram.chat_id.is_none() {
            return Err(ConfigError::Missing("telegram.chat_id"));
        }
        if self.telegram.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                key: "telegram.poll_timeout_secs",
                message: format!(
                    "{} exceeds the maximum of {MAX_POLL_TIMEOUT_SECS}",
                    self.telegram.poll_timeout_secs
                ),
            });
        }
        if !self.telegram.api_url.starts_with("http://")
            && !self.telegram.api_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                key: "telegram.api_url",
                message: format!("not an http(s) URL: {}", self.telegram.api_url),
            });
        }
        Ok(())
    }

    /// Returns the destination chat, once validated.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no chat id is configured.
    pub fn chat_id(&self) -> Result<i64, ConfigError> {
        self.telegram
            .chat_id
            .ok_or(ConfigError::Missing("telegram.chat_id"))
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
