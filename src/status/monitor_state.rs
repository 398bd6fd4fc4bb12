// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The single piece of mutable state shared by the bridge.

use chrono::{DateTime, Local};

use super::{DeviceStatus, Mode, Presence};

/// Latest known inverter status plus the facts derived from it.
///
/// Only the most recent reading is kept. All mutation goes through
/// [`StatusStore`](super::StatusStore), which wraps this struct in a mutex;
/// readers work on clones.
///
/// # Examples
///
/// ```
/// use inverter_bot::status::{MonitorState, Mode, Presence};
///
/// let state = MonitorState::new();
/// assert!(state.current().is_none());
/// assert_eq!(state.current_mode(), &Mode::line());
/// assert_eq!(state.presence(), Presence::Offline);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorState {
    /// Last adopted status, `None` until the first ingestion.
    pub(crate) current: Option<DeviceStatus>,
    /// Mode used for change detection.
    pub(crate) current_mode: Mode,
    /// Time of the last ingestion (receipt, not change).
    pub(crate) last_update_at: Option<DateTime<Local>>,
    /// Time of the last mode change.
    pub(crate) last_change_at: Option<DateTime<Local>>,
    /// Derived presence of the telemetry source.
    pub(crate) presence: Presence,
}

impl MonitorState {
    /// Creates the cold-start state: no status, mode `Line`, offline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last adopted status.
    #[must_use]
    pub fn current(&self) -> Option<&DeviceStatus> {
        self.current.as_ref()
    }

    /// Returns the mode recorded for change detection.
    #[must_use]
    pub fn current_mode(&self) -> &Mode {
        &self.current_mode
    }

    /// Returns the time of the last ingested status.
    #[must_use]
    pub fn last_update_at(&self) -> Option<DateTime<Local>> {
        self.last_update_at
    }

    /// Returns the time of the last mode change.
    #[must_use]
    pub fn last_change_at(&self) -> Option<DateTime<Local>> {
        self.last_change_at
    }

    /// Returns the derived presence.
    #[must_use]
    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// Returns `true` when the telemetry source is considered online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.presence.is_online()
    }
}
