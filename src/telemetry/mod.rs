// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Telemetry intake from the message broker.
//!
//! The inverter monitor publishes one JSON document per reading on the
//! `status` topic. [`TelemetrySubscriber`] receives the raw payloads and
//! [`decode_status`] turns them into [`DeviceStatus`] values.
//!
//! # Examples
//!
//! ```
//! use inverter_bot::telemetry::decode_status;
//!
//! let status = decode_status(br#"{"Mode":"Line","BatteryCapacity":100}"#).unwrap();
//! assert_eq!(status.mode.as_str(), "Line");
//!
//! assert!(decode_status(b"null").is_err());
//! assert!(decode_status(b"not json").is_err());
//! ```

mod subscriber;

pub use subscriber::{
    DEFAULT_TOPIC, SubscriberConfig, TelemetrySubscriber, TelemetrySubscriberBuilder,
};

use crate::error::ParseError;
use crate::status::DeviceStatus;

/// Decodes a raw telemetry payload.
///
/// # Errors
///
/// Returns `ParseError` if the payload is not UTF-8, is not a JSON object
/// matching [`DeviceStatus`], or is JSON `null`.
pub fn decode_status(payload: &[u8]) -> Result<DeviceStatus, ParseError> {
    let text = String::from_utf8(payload.to_vec())?;
    let status: Option<DeviceStatus> = serde_json::from_str(&text)?;
    status.ok_or(ParseError::Null)
}
