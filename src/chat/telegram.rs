// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Telegram Bot API client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ChatTransport, InboundMessage, Update};
use crate::error::ProtocolError;

// ============================================================================
// TelegramConfig
// ============================================================================

/// Configuration for a Telegram bot.
///
/// # Examples
///
/// ```
/// use inverter_bot::chat::TelegramConfig;
/// use std::time::Duration;
///
/// let config = TelegramConfig::new("123456:ABC-DEF")
///     .with_api_url("http://127.0.0.1:8081")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.bot_url(), "http://127.0.0.1:8081/bot123456:ABC-DEF");
/// ```
#[derive(Clone)]
pub struct TelegramConfig {
    token: String,
    api_url: String,
    timeout: Duration,
    poll_timeout: Duration,
}

impl TelegramConfig {
    /// Public Bot API endpoint.
    pub const DEFAULT_API_URL: &'static str = "https://api.telegram.org";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default long-poll wait for `getUpdates` (short polling).
    pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::ZERO;

    /// Creates a configuration for the bot identified by `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: Self::DEFAULT_API_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            poll_timeout: Self::DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Sets a custom API endpoint (e.g. a local Bot API server).
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how long `getUpdates` may wait for new updates server-side.
    #[must_use]
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Returns the API endpoint.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the long-poll wait.
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Builds the per-bot base URL.
    #[must_use]
    pub fn bot_url(&self) -> String {
        format!("{}/bot{}", self.api_url, self.token)
    }

    /// Creates a `TelegramClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the token is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> Result<TelegramClient, ProtocolError> {
        if self.token.trim().is_empty() {
            return Err(ProtocolError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(TelegramClient {
            bot_url: self.bot_url(),
            client,
            timeout: self.timeout,
            poll_timeout: self.poll_timeout,
        })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Identity of the bot account, as returned by `getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotUser {
    /// Numeric user id.
    pub id: i64,
    /// Display name.
    pub first_name: String,
    /// Username, used for `@mentions`.
    pub username: Option<String>,
}

/// An entry of the bot command menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotCommand {
    /// Command name without the leading slash.
    pub command: String,
    /// Text shown next to the command in clients.
    pub description: String,
}

impl BotCommand {
    /// Creates a menu entry. A leading slash in `command` is dropped.
    #[must_use]
    pub fn new(command: &str, description: impl Into<String>) -> Self {
        Self {
            command: command.trim_start_matches('/').to_string(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUpdate {
    update_id: i64,
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    message_id: i64,
    chat: WireChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChat {
    id: i64,
}

impl From<WireUpdate> for Update {
    fn from(update: WireUpdate) -> Self {
        Self {
            id: update.update_id,
            message: update.message.map(|m| InboundMessage {
                message_id: m.message_id,
                chat_id: m.chat.id,
                text: m.text,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct GetUpdatesParams {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<ReplyParameters>,
}

#[derive(Debug, Serialize)]
struct ReplyParameters {
    message_id: i64,
    allow_sending_without_reply: bool,
}

#[derive(Debug, Serialize)]
struct SetMyCommandsParams<'a> {
    commands: &'a [BotCommand],
}

// ============================================================================
// TelegramClient
// ============================================================================

/// HTTP client for the Telegram Bot API.
///
/// Every call is a JSON `POST` to `<api>/bot<token>/<method>`, bounded by the
/// configured timeout. `getUpdates` additionally waits up to the long-poll
/// timeout.
///
/// # Examples
///
/// ```no_run
/// use inverter_bot::chat::{ChatTransport, TelegramConfig};
///
/// # async fn example() -> Result<(), inverter_bot::ProtocolError> {
/// let client = TelegramConfig::new("123456:ABC-DEF").into_client()?;
/// let me = client.get_me().await?;
/// client.send_text(-1001234, "hello", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TelegramClient {
    bot_url: String,
    client: Client,
    timeout: Duration,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// Builds the URL for an API method.
    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.bot_url)
    }

    /// Calls an API method and unwraps the response envelope.
    async fn call<P, R>(
        &self,
        method: &str,
        params: &P,
        timeout: Duration,
    ) -> Result<R, ProtocolError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(method = %method, "Calling Bot API");

        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProtocolError::Timeout(duration_millis(timeout))
                } else {
                    ProtocolError::Http(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        let body = response.text().await.map_err(ProtocolError::Http)?;
        let Ok(envelope) = serde_json::from_str::<ApiResponse<R>>(&body) else {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        };

        match envelope {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse {
                error_code,
                description,
                ..
            } => Err(ProtocolError::Api {
                code: error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: description.unwrap_or_else(|| "missing result".to_string()),
            }),
        }
    }

    /// Returns the identity of the bot.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    pub async fn get_me(&self) -> Result<BotUser, ProtocolError> {
        self.call("getMe", &serde_json::json!({}), self.timeout)
            .await
    }

    /// Replaces the command menu shown by clients.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), ProtocolError> {
        let _: bool = self
            .call(
                "setMyCommands",
                &SetMyCommandsParams { commands },
                self.timeout,
            )
            .await?;
        Ok(())
    }

    /// Retrieves pending updates starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ProtocolError> {
        let params = GetUpdatesParams {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ["message"],
        };
        let updates: Vec<WireUpdate> = self
            .call("getUpdates", &params, self.timeout + self.poll_timeout)
            .await?;
        Ok(updates.into_iter().map(Update::from).collect())
    }

    /// Sends a plain-text message, optionally as a reply.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the chat rejects the message.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), ProtocolError> {
        let params = SendMessageParams {
            chat_id,
            text,
            reply_parameters: reply_to.map(|message_id| ReplyParameters {
                message_id,
                allow_sending_without_reply: true,
            }),
        };
        let _: serde_json::Value = self.call("sendMessage", &params, self.timeout).await?;
        Ok(())
    }
}

impl ChatTransport for TelegramClient {
    async fn fetch_updates(&self, offset: i64) -> Result<Vec<Update>, ProtocolError> {
        self.get_updates(offset).await
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), ProtocolError> {
        self.send_message(chat_id, text, reply_to).await
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("timeout", &self.timeout)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

// Safe: request timeouts never approach u64::MAX milliseconds
#[allow(clippy::cast_possible_truncation)]
fn duration_millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
