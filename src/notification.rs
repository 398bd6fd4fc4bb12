// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Proactive notifications pushed to the configured chat.
//!
//! Notifications are produced while the status store is locked and sent
//! after the lock is released, so the state machine advances even when a
//! send fails.
//!
//! # Examples
//!
//! ```
//! use inverter_bot::notification::Notification;
//! use inverter_bot::status::Mode;
//!
//! let change = Notification::mode_changed(Mode::line(), Mode::battery());
//! assert_eq!(change.text(), "Inverter Status Change=Battery");
//! assert_eq!(Notification::Online.text(), "Inverter Monitor Online");
//! ```

use crate::status::Mode;

/// A state transition worth telling the chat about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The operating mode differs from the last recorded one.
    ModeChanged {
        /// Mode recorded before this reading.
        previous: Mode,
        /// Mode carried by this reading.
        current: Mode,
    },

    /// The telemetry source started reporting again.
    Online,

    /// The telemetry source went silent for longer than the grace period.
    Offline,
}

impl Notification {
    /// Creates a mode change notification.
    #[must_use]
    pub fn mode_changed(previous: Mode, current: Mode) -> Self {
        Self::ModeChanged { previous, current }
    }

    /// Renders the chat message for this notification.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::ModeChanged { current, .. } => format!("Inverter Status Change={current}"),
            Self::Online => "Inverter Monitor Online".to_string(),
            Self::Offline => "Inverter Monitor Offline".to_string(),
        }
    }
}
