// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Human readable answers to chat commands.

use chrono::{DateTime, Local};

use super::Command;
use crate::status::{DeviceStatus, MonitorState};

/// Format used for timestamps in replies.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders the answer to `command` from a snapshot of the monitor state.
///
/// Without a status the answer is `Unknown Battery Status` for `/battery`
/// and `Unknown Status` otherwise.
///
/// # Examples
///
/// ```
/// use inverter_bot::command::{Command, format_reply};
/// use inverter_bot::status::MonitorState;
///
/// let state = MonitorState::new();
/// assert_eq!(format_reply(Command::Battery, &state), "Unknown Battery Status");
/// assert_eq!(format_reply(Command::Info, &state), "Unknown Status");
/// ```
#[must_use]
pub fn format_reply(command: Command, state: &MonitorState) -> String {
    let Some(status) = state.current() else {
        return match command {
            Command::Battery => "Unknown Battery Status".to_string(),
            Command::Status | Command::Info => "Unknown Status".to_string(),
        };
    };
    let changed = change_stamp(state.last_change_at());

    match command {
        Command::Battery => format!("Battery is {}% {changed}", status.battery_capacity),
        Command::Status => format!("Online status {} {changed}", status.mode),
        Command::Info => info_report(status, &changed),
    }
}

fn info_report(status: &DeviceStatus, changed: &str) -> String {
    let battery_current = if status.mode.is_battery() {
        format!("Discharging: {}A", status.battery_discharge_current)
    } else {
        format!("Charging: {}A", status.battery_charge_current)
    };

    [
        format!("Status {changed}"),
        format!("Online status: {}", status.mode),
        format!("Load: {}% {}W", status.load_percentage, status.load_watt),
        format!(
            "AC Input: {}V {}Hz",
            status.grid_voltage, status.grid_frequency
        ),
        format!(
            "Output: {}V {}Hz",
            status.output_voltage, status.output_frequency
        ),
        format!(
            "Battery: {}% {}V ({battery_current})",
            status.battery_capacity, status.battery_voltage
        ),
    ]
    .join("\n")
}

fn change_stamp(at: Option<DateTime<Local>>) -> String {
    match at {
        Some(at) => format!("at {}", at.format(TIME_FORMAT)),
        None => "(no change recorded)".to_string(),
    }
}
