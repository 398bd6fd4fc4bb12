// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chat transport used for inbound commands and outbound messages.
//!
//! The bridge only depends on the [`ChatTransport`] trait. [`TelegramClient`]
//! implements it over the Telegram Bot API; tests plug in an in-memory
//! implementation.

mod telegram;

pub use telegram::{BotCommand, BotUser, TelegramClient, TelegramConfig};

use std::future::Future;

use crate::error::ProtocolError;

/// One inbound event retrieved from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// Monotonic identifier assigned by the transport.
    pub id: i64,
    /// The message carried by this update, if it is a message at all.
    pub message: Option<InboundMessage>,
}

impl Update {
    /// Returns the text of the carried message, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.text.as_deref())
    }
}

/// A message posted in a conversation the bot can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Identifier of the message inside its conversation.
    pub message_id: i64,
    /// Conversation the message was posted in.
    pub chat_id: i64,
    /// Message text; `None` for stickers, photos and other non-text content.
    pub text: Option<String>,
}

/// Operations the bridge needs from a chat service.
///
/// Implementations must bound every call with a timeout; the polling loop
/// relies on these futures completing.
pub trait ChatTransport: Send + Sync {
    /// Retrieves the updates with an id greater than or equal to `offset`,
    /// in arrival order.
    fn fetch_updates(
        &self,
        offset: i64,
    ) -> impl Future<Output = Result<Vec<Update>, ProtocolError>> + Send;

    /// Posts `text` to `chat_id`, threaded under `reply_to` when given.
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}
