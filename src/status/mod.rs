// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverter status tracking.
//!
//! This module holds the only mutable state of the bridge:
//!
//! - [`DeviceStatus`] and [`Mode`]: one telemetry reading, as received.
//! - [`MonitorState`]: the latest reading plus the derived facts (recorded
//!   mode, last update, last change, presence).
//! - [`StatusStore`]: the mutex-guarded owner of the state, which runs the
//!   transition detector and the presence monitor on every update.
//!
//! # Examples
//!
//! ```
//! use chrono::Local;
//! use inverter_bot::status::{DeviceStatus, Mode, StatusStore};
//!
//! let store = StatusStore::new();
//! store.ingest(DeviceStatus::with_mode(Mode::line()), Local::now());
//!
//! let state = store.snapshot();
//! assert_eq!(state.current().map(|s| s.mode.as_str()), Some("Line"));
//! ```

mod device_status;
mod monitor_state;
mod presence;
mod store;
mod transition;

pub use device_status::{DeviceStatus, Mode};
pub use monitor_state::MonitorState;
pub use presence::{OFFLINE_AFTER, Presence};
pub use store::StatusStore;
