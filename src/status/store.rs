// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutex-guarded status store shared by ingestion and the polling loop.

use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::{DeviceStatus, MonitorState, presence, transition};
use crate::notification::Notification;

/// Exclusive-access wrapper around [`MonitorState`].
///
/// The telemetry callback and the polling loop both go through this type.
/// Every operation takes the lock once and performs its whole update under
/// it, so a reply is never rendered from a half-applied reading and a mode
/// change is never reported twice. The lock is never held across an
/// `.await`: callers receive the notifications to send once it is released.
///
/// `StatusStore` is cheaply cloneable (via `Arc`); clones share the state.
///
/// # Examples
///
/// ```
/// use chrono::Local;
/// use inverter_bot::notification::Notification;
/// use inverter_bot::status::{DeviceStatus, Mode, StatusStore};
///
/// let store = StatusStore::new();
/// let sent = store.ingest(DeviceStatus::with_mode(Mode::battery()), Local::now());
///
/// assert_eq!(
///     sent,
///     vec![
///         Notification::mode_changed(Mode::line(), Mode::battery()),
///         Notification::Online,
///     ]
/// );
/// assert!(store.snapshot().is_online());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    inner: Arc<Mutex<MonitorState>>,
}

impl StatusStore {
    /// Creates a store holding the cold-start state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts a freshly received status.
    ///
    /// Runs the transition detector, then the online branch of the presence
    /// monitor, then replaces the current status as a unit. Returns the
    /// notifications to send, mode change first.
    pub fn ingest(&self, status: DeviceStatus, now: DateTime<Local>) -> Vec<Notification> {
        let mut state = self.inner.lock();
        let mut notifications = Vec::with_capacity(2);

        notifications.extend(transition::detect_transition(&mut state, &status, now));
        notifications.extend(presence::mark_seen(&mut state, now));
        state.current = Some(status);

        notifications
    }

    /// Runs the staleness check for one tick of the polling loop.
    pub fn check_presence(&self, now: DateTime<Local>) -> Option<Notification> {
        presence::check_stale(&mut self.inner.lock(), now)
    }

    /// Returns a consistent copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> MonitorState {
        self.inner.lock().clone()
    }

    /// Runs `f` against the state while holding the lock.
    ///
    /// Avoids cloning the whole state when only a derived value is needed.
    pub fn read<R>(&self, f: impl FnOnce(&MonitorState) -> R) -> R {
        f(&self.inner.lock())
    }
}
