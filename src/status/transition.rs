// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mode change detection.

use chrono::{DateTime, Local};

use super::{DeviceStatus, MonitorState};
use crate::notification::Notification;

/// Compares the recorded mode with the mode of an incoming status.
///
/// When they differ (exact, case-sensitive comparison) the recorded mode and
/// the change time are updated and a [`Notification::ModeChanged`] is
/// returned. Otherwise the state is left untouched.
///
/// Must run exactly once per ingested status, while the caller holds the
/// store lock, so that the recorded mode and the emitted notifications never
/// drift apart.
pub(crate) fn detect_transition(
    state: &mut MonitorState,
    status: &DeviceStatus,
    now: DateTime<Local>,
) -> Option<Notification> {
    if status.mode == state.current_mode {
        return None;
    }

    let previous = std::mem::replace(&mut state.current_mode, status.mode.clone());
    state.last_change_at = Some(now);

    tracing::info!(
        previous = %previous,
        current = %status.mode,
        "Status change"
    );

    Some(Notification::mode_changed(previous, status.mode.clone()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::status::Mode;

    fn at(minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 19, 8, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn same_mode_is_not_a_change() {
        let mut state = MonitorState::new();
        let status = DeviceStatus::with_mode(Mode::line());

        assert!(detect_transition(&mut state, &status, at(0)).is_none());
        assert_eq!(state.current_mode, Mode::line());
        assert!(state.last_change_at.is_none());
    }

    #[test]
    fn different_mode_records_change() {
        let mut state = MonitorState::new();
        let status = DeviceStatus::with_mode(Mode::battery());

        let change = detect_transition(&mut state, &status, at(5));

        assert_eq!(
            change,
            Some(Notification::mode_changed(Mode::line(), Mode::battery()))
        );
        assert_eq!(state.current_mode, Mode::battery());
        assert_eq!(state.last_change_at, Some(at(5)));
    }

    #[test]
    fn repeated_mode_emits_once() {
        let mut state = MonitorState::new();
        let battery = DeviceStatus::with_mode(Mode::battery());

        assert!(detect_transition(&mut state, &battery, at(1)).is_some());
        assert!(detect_transition(&mut state, &battery, at(2)).is_none());
        assert!(detect_transition(&mut state, &battery, at(3)).is_none());
        assert_eq!(state.last_change_at, Some(at(1)));
    }

    #[test]
    fn case_difference_is_a_change() {
        let mut state = MonitorState::new();
        let status = DeviceStatus::with_mode(Mode::new("line"));

        assert!(detect_transition(&mut state, &status, at(0)).is_some());
        assert_eq!(state.current_mode.as_str(), "line");
    }
}
