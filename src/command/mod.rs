// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Chat commands understood by the bot.
//!
//! Three queries are supported, each answered from the status store:
//!
//! | Command    | Answer                                   |
//! |------------|------------------------------------------|
//! | `/battery` | Battery percentage and last change time  |
//! | `/status`  | Operating mode and last change time      |
//! | `/info`    | Multi-line summary of the latest reading |
//!
//! # Examples
//!
//! ```
//! use inverter_bot::command::Command;
//!
//! assert_eq!(Command::parse("/Battery", None), Some(Command::Battery));
//! assert_eq!(
//!     Command::parse("/info@InverterBot", Some("InverterBot")),
//!     Some(Command::Info)
//! );
//! assert_eq!(Command::parse("/reboot", None), None);
//! assert_eq!(Command::parse("status", None), None);
//! ```

mod dispatcher;
mod reply;

pub use dispatcher::{CommandDispatcher, DispatchedCommand};
pub use reply::format_reply;

use std::fmt;

use crate::chat::BotCommand;

/// Marker every command starts with.
const COMMAND_PREFIX: char = '/';

/// A recognized query command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `/battery`
    Battery,
    /// `/status`
    Status,
    /// `/info`
    Info,
}

impl Command {
    /// All commands, in menu order.
    pub const ALL: [Self; 3] = [Self::Battery, Self::Info, Self::Status];

    /// Parses the text of an inbound message.
    ///
    /// The text is lowercased and any `@<bot_username>` mention is removed
    /// before matching. Text that does not start with `/`, and commands other
    /// than the three known ones, yield `None`.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        if !text.starts_with(COMMAND_PREFIX) {
            return None;
        }

        let mut normalized = text.to_lowercase();
        if let Some(username) = bot_username.filter(|u| !u.is_empty()) {
            let mention = format!("@{}", username.to_lowercase());
            normalized = normalized.replace(&mention, "");
        }

        match normalized.as_str() {
            "/battery" => Some(Self::Battery),
            "/status" => Some(Self::Status),
            "/info" => Some(Self::Info),
            _ => None,
        }
    }

    /// Returns the command as typed, including the leading slash.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Battery => "/battery",
            Self::Status => "/status",
            Self::Info => "/info",
        }
    }

    /// Returns the description shown in the command menu.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Battery => "Returns current battery percentage",
            Self::Status => "Returns current line status mode",
            Self::Info => "Returns summary of current data",
        }
    }

    /// Returns the command menu entries for all commands.
    #[must_use]
    pub fn menu() -> Vec<BotCommand> {
        Self::ALL
            .iter()
            .map(|c| BotCommand::new(c.as_str(), c.description()))
            .collect()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_commands() {
        assert_eq!(Command::parse("/battery", None), Some(Command::Battery));
        assert_eq!(Command::parse("/status", None), Some(Command::Status));
        assert_eq!(Command::parse("/info", None), Some(Command::Info));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Command::parse("/STATUS", None), Some(Command::Status));
        assert_eq!(Command::parse("/InFo", None), Some(Command::Info));
    }

    #[test]
    fn parse_strips_mention() {
        let bot = Some("Inverter_Bot");
        assert_eq!(Command::parse("/battery@Inverter_Bot", bot), Some(Command::Battery));
        assert_eq!(Command::parse("/battery@inverter_bot", bot), Some(Command::Battery));
        assert_eq!(Command::parse("/status@other_bot", bot), None);
    }

    #[test]
    fn parse_ignores_unknown_and_plain_text() {
        assert_eq!(Command::parse("/start", None), None);
        assert_eq!(Command::parse("battery", None), None);
        assert_eq!(Command::parse("", None), None);
        assert_eq!(Command::parse("/battery now", None), None);
    }

    #[test]
    fn menu_entries() {
        let menu = Command::menu();
        assert_eq!(menu.len(), 3);
        assert_eq!(menu[0].command, "battery");
        assert_eq!(menu[0].description, "Returns current battery percentage");
        assert_eq!(menu[1].command, "info");
        assert_eq!(menu[2].command, "status");
    }
}
