// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverter status snapshot as published on the telemetry topic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating mode reported by the inverter.
///
/// The mode is kept exactly as received so that change detection compares
/// the raw strings case-sensitively. Well-known values have named
/// constructors.
///
/// # Examples
///
/// ```
/// use inverter_bot::status::Mode;
///
/// assert_eq!(Mode::default(), Mode::line());
/// assert_ne!(Mode::new("battery"), Mode::battery());
/// assert!(Mode::new("battery").is_battery());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(String);

impl Mode {
    /// Creates a mode from the raw string reported by the device.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Grid powered operation.
    #[must_use]
    pub fn line() -> Self {
        Self::new("Line")
    }

    /// Running from the battery bank.
    #[must_use]
    pub fn battery() -> Self {
        Self::new("Battery")
    }

    /// Device reports a fault.
    #[must_use]
    pub fn fault() -> Self {
        Self::new("Fault")
    }

    /// Mode could not be determined.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("Unknown")
    }

    /// Returns the raw mode string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the device runs on battery.
    ///
    /// Unlike equality, this comparison ignores case.
    #[must_use]
    pub fn is_battery(&self) -> bool {
        self.0.eq_ignore_ascii_case("battery")
    }
}

impl Default for Mode {
    fn default() -> Self {
        Self::line()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A complete status reading from the inverter.
///
/// Every telemetry message carries a full reading; a new message replaces
/// the previous one wholesale. Field names follow the producer's PascalCase
/// serialization, camelCase is accepted too. Missing fields default to zero,
/// a missing mode to [`Mode::unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStatus {
    /// Operating mode.
    #[serde(rename = "Mode", alias = "mode")]
    pub mode: Mode,
    /// Grid (AC input) voltage in Volts.
    #[serde(rename = "GridVoltage", alias = "gridVoltage")]
    pub grid_voltage: f64,
    /// Grid frequency in Hertz.
    #[serde(rename = "GridFrequency", alias = "gridFrequency")]
    pub grid_frequency: f64,
    /// Output voltage in Volts.
    #[serde(rename = "OutputVoltage", alias = "outputVoltage")]
    pub output_voltage: f64,
    /// Output frequency in Hertz.
    #[serde(rename = "OutputFrequency", alias = "outputFrequency")]
    pub output_frequency: f64,
    /// Apparent load in VA.
    #[serde(rename = "LoadVA", alias = "loadVA", alias = "loadVa")]
    pub load_va: f64,
    /// Active load in Watts.
    #[serde(rename = "LoadWatt", alias = "loadWatt")]
    pub load_watt: f64,
    /// Load as a percentage of rated output.
    #[serde(rename = "LoadPercentage", alias = "loadPercentage")]
    pub load_percentage: f64,
    /// DC bus voltage in Volts.
    #[serde(rename = "BusVoltage", alias = "busVoltage")]
    pub bus_voltage: f64,
    /// Battery voltage in Volts.
    #[serde(rename = "BatteryVoltage", alias = "batteryVoltage")]
    pub battery_voltage: f64,
    /// Battery charge current in Amperes.
    #[serde(rename = "BatteryChargeCurrent", alias = "batteryChargeCurrent")]
    pub battery_charge_current: f64,
    /// Battery state of charge in percent.
    #[serde(rename = "BatteryCapacity", alias = "batteryCapacity")]
    pub battery_capacity: f64,
    /// Battery discharge current in Amperes.
    #[serde(rename = "BatteryDischargeCurrent", alias = "batteryDischargeCurrent")]
    pub battery_discharge_current: f64,
    /// Heatsink temperature in degrees Celsius.
    #[serde(rename = "HeatsinkTemperature", alias = "heatsinkTemperature")]
    pub heatsink_temperature: f64,
    /// PV input current in Amperes.
    #[serde(rename = "PvInputCurrent", alias = "pvInputCurrent")]
    pub pv_input_current: f64,
    /// PV input voltage in Volts.
    #[serde(rename = "PvInputVoltage", alias = "pvInputVoltage")]
    pub pv_input_voltage: f64,
    /// Solar charge controller voltage in Volts.
    #[serde(rename = "SccVoltage", alias = "sccVoltage")]
    pub scc_voltage: f64,
    /// Whether the output load is switched on.
    #[serde(rename = "LoadStatusOn", alias = "loadStatusOn")]
    pub load_status_on: bool,
    /// Whether the solar charge controller is charging.
    #[serde(rename = "SccChargeOn", alias = "sccChargeOn")]
    pub scc_charge_on: bool,
    /// Whether the grid is charging the battery.
    #[serde(rename = "AcChargeOn", alias = "acChargeOn")]
    pub ac_charge_on: bool,
}

impl DeviceStatus {
    /// Creates an all-zero status with the given mode.
    #[must_use]
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            mode: Mode::unknown(),
            grid_voltage: 0.0,
            grid_frequency: 0.0,
            output_voltage: 0.0,
            output_frequency: 0.0,
            load_va: 0.0,
            load_watt: 0.0,
            load_percentage: 0.0,
            bus_voltage: 0.0,
            battery_voltage: 0.0,
            battery_charge_current: 0.0,
            battery_capacity: 0.0,
            battery_discharge_current: 0.0,
            heatsink_temperature: 0.0,
            pv_input_current: 0.0,
            pv_input_voltage: 0.0,
            scc_voltage: 0.0,
            load_status_on: false,
            scc_charge_on: false,
            ac_charge_on: false,
        }
    }
}
