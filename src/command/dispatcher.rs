// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command retrieval with an update cursor.

use super::Command;
use crate::chat::{ChatTransport, Update};
use crate::error::ProtocolError;

/// A recognized command together with where to answer it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedCommand {
    /// Update the command arrived in.
    pub update_id: i64,
    /// The parsed command.
    pub command: Command,
    /// Conversation to answer in.
    pub chat_id: i64,
    /// Message to thread the answer under.
    pub message_id: i64,
}

/// Turns batches of chat updates into commands, each at most once.
///
/// The dispatcher owns the update cursor. After a batch is accepted the
/// cursor moves to one past the highest update id seen, and updates below
/// the cursor are never dispatched again, even if the transport hands them
/// out a second time.
///
/// # Examples
///
/// ```
/// use inverter_bot::chat::{InboundMessage, Update};
/// use inverter_bot::command::{Command, CommandDispatcher};
///
/// let mut dispatcher = CommandDispatcher::new(None);
/// let batch = vec![Update {
///     id: 10,
///     message: Some(InboundMessage { message_id: 1, chat_id: 5, text: Some("/status".into()) }),
/// }];
///
/// let commands = dispatcher.accept(batch.clone());
/// assert_eq!(commands[0].command, Command::Status);
/// assert_eq!(dispatcher.cursor(), 11);
///
/// // Replaying the same batch dispatches nothing.
/// assert!(dispatcher.accept(batch).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    cursor: i64,
    bot_username: Option<String>,
}

impl CommandDispatcher {
    /// Creates a dispatcher starting from the beginning of the update queue.
    ///
    /// `bot_username` is stripped from `/command@bot_username` mentions.
    #[must_use]
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            cursor: 0,
            bot_username,
        }
    }

    /// Returns the id of the next update to request.
    #[must_use]
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Returns the username mentions are stripped for.
    #[must_use]
    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }

    /// Fetches the next batch from `transport` and returns its commands.
    ///
    /// # Errors
    ///
    /// Returns error if the transport call fails; the cursor is unchanged.
    pub async fn fetch_next_batch<T: ChatTransport>(
        &mut self,
        transport: &T,
    ) -> Result<Vec<DispatchedCommand>, ProtocolError> {
        let updates = transport.fetch_updates(self.cursor).await?;
        Ok(self.accept(updates))
    }

    /// Processes a batch of updates in arrival order and advances the cursor.
    pub fn accept(&mut self, updates: Vec<Update>) -> Vec<DispatchedCommand> {
        let mut commands = Vec::new();
        let mut highest = None::<i64>;

        for update in updates {
            highest = Some(highest.map_or(update.id, |h| h.max(update.id)));

            if update.id < self.cursor {
                tracing::debug!(update_id = update.id, "Skipping already dispatched update");
                continue;
            }
            if let Some(command) = self.recognize(&update) {
                commands.push(command);
            }
        }

        if let Some(highest) = highest {
            self.cursor = self.cursor.max(highest.saturating_add(1));
        }

        commands
    }

    fn recognize(&self, update: &Update) -> Option<DispatchedCommand> {
        let text = update.text()?;
        let message = update.message.as_ref()?;

        tracing::debug!(update_id = update.id, text = %text, "Message received");

        let command = Command::parse(text, self.bot_username.as_deref())?;
        Some(DispatchedCommand {
            update_id: update.id,
            command,
            chat_id: message.chat_id,
            message_id: message.message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::InboundMessage;

    fn text_update(id: i64, text: &str) -> Update {
        Update {
            id,
            message: Some(InboundMessage {
                message_id: id * 10,
                chat_id: -500,
                text: Some(text.to_string()),
            }),
        }
    }

    #[test]
    fn empty_batch_keeps_cursor() {
        let mut dispatcher = CommandDispatcher::new(None);
        assert!(dispatcher.accept(Vec::new()).is_empty());
        assert_eq!(dispatcher.cursor(), 0);
    }

    #[test]
    fn commands_keep_arrival_order() {
        let mut dispatcher = CommandDispatcher::new(None);
        let commands = dispatcher.accept(vec![
            text_update(1, "/info"),
            text_update(2, "/battery"),
            text_update(3, "/status"),
        ]);

        let kinds: Vec<Command> = commands.iter().map(|c| c.command).collect();
        assert_eq!(kinds, vec![Command::Info, Command::Battery, Command::Status]);
        assert_eq!(commands[1].message_id, 20);
        assert_eq!(commands[1].chat_id, -500);
        assert_eq!(dispatcher.cursor(), 4);
    }

    #[test]
    fn ignored_updates_still_advance_cursor() {
        let mut dispatcher = CommandDispatcher::new(None);
        let sticker = Update {
            id: 8,
            message: Some(InboundMessage {
                message_id: 1,
                chat_id: 1,
                text: None,
            }),
        };
        let commands = dispatcher.accept(vec![
            text_update(5, "hello"),
            text_update(6, "/unknown"),
            Update {
                id: 7,
                message: None,
            },
            sticker,
        ]);

        assert!(commands.is_empty());
        assert_eq!(dispatcher.cursor(), 9);
    }

    #[test]
    fn replayed_batch_is_not_dispatched_again() {
        let mut dispatcher = CommandDispatcher::new(None);
        let batch = vec![text_update(41, "/status"), text_update(42, "/info")];

        assert_eq!(dispatcher.accept(batch.clone()).len(), 2);
        assert!(dispatcher.accept(batch).is_empty());
        assert_eq!(dispatcher.cursor(), 43);
    }

    #[test]
    fn overlapping_batch_dispatches_only_new_updates() {
        let mut dispatcher = CommandDispatcher::new(None);
        dispatcher.accept(vec![text_update(1, "/status")]);

        let commands = dispatcher.accept(vec![text_update(1, "/status"), text_update(2, "/info")]);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, Command::Info);
    }

    #[test]
    fn cursor_never_moves_backwards() {
        let mut dispatcher = CommandDispatcher::new(None);
        dispatcher.accept(vec![text_update(100, "/status")]);
        dispatcher.accept(vec![text_update(3, "/status")]);
        assert_eq!(dispatcher.cursor(), 101);
    }

    #[test]
    fn mention_is_stripped_with_username() {
        let mut dispatcher = CommandDispatcher::new(Some("InverterBot".to_string()));
        let commands = dispatcher.accept(vec![text_update(1, "/battery@InverterBot")]);
        assert_eq!(commands[0].command, Command::Battery);
        assert_eq!(dispatcher.bot_username(), Some("InverterBot"));
    }
}
