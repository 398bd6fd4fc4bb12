// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Online/offline presence derived from update recency.
//!
//! ```text
//!   Offline --ingest-----------> Online   (emits Online)
//!   Online  --ingest-----------> Online   (refreshes last update)
//!   Online  --tick, stale------> Offline  (emits Offline)
//!   Offline --tick-------------> Offline  (no-op)
//! ```
//!
//! There is no timer of its own: staleness is only noticed when the polling
//! loop ticks, so detection lags by up to one poll interval.

use std::time::Duration;

use chrono::{DateTime, Local};

use super::MonitorState;
use crate::notification::Notification;

/// Silence after which an online source is declared offline.
pub const OFFLINE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Presence of the telemetry source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Presence {
    /// No recent status (initial state).
    #[default]
    Offline,
    /// A status arrived within the grace period.
    Online,
}

impl Presence {
    /// Returns `true` for [`Presence::Online`].
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Records a successful ingestion.
///
/// Returns [`Notification::Online`] on the offline to online edge.
pub(crate) fn mark_seen(state: &mut MonitorState, now: DateTime<Local>) -> Option<Notification> {
    let was_online = state.presence.is_online();
    state.presence = Presence::Online;
    state.last_update_at = Some(now);

    if was_online {
        None
    } else {
        tracing::info!("Inverter monitor online");
        Some(Notification::Online)
    }
}

/// Runs the staleness check of one tick.
///
/// Returns [`Notification::Offline`] exactly once when an online source has
/// been silent for longer than [`OFFLINE_AFTER`].
pub(crate) fn check_stale(state: &mut MonitorState, now: DateTime<Local>) -> Option<Notification> {
    if !state.presence.is_online() {
        return None;
    }

    let stale = state
        .last_update_at
        .is_none_or(|last| is_older_than(last, now, OFFLINE_AFTER));
    if !stale {
        return None;
    }

    state.presence = Presence::Offline;
    tracing::info!(
        last_update = ?state.last_update_at,
        "Inverter monitor offline"
    );
    Some(Notification::Offline)
}

/// A negative elapsed time (clock stepped backwards) never counts as stale.
fn is_older_than(last: DateTime<Local>, now: DateTime<Local>, limit: Duration) -> bool {
    (now - last).to_std().is_ok_and(|elapsed| elapsed > limit)
}
