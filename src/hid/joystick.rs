// Copyright 2026 hogp contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! BLE joystick.

use std::sync::Arc;
use std::time::Duration;

use super::report_map::*;
use super::{buttons_byte, clamp_delta, HidProfile, ReportKinds};
use crate::config::Config;
use crate::error::Result;
use crate::peripheral::HidPeripheral;
use crate::report::Report;

/// Report Map: 3 buttons plus X/Y/Z/Rx axes, one signed byte each. Four
/// usages are declared for the four report slots even though the fourth
/// byte is always sent as zero.
#[rustfmt::skip]
pub const REPORT_MAP: [u8; 52] = [
    usage_page(1),      0x01,  // Generic Desktop
    usage(1),           0x04,  // Joystick
    collection(1),      0x01,  // Application
    collection(1),      0x00,  //  Physical
    usage_page(1),      0x09,  //   Buttons
    usage_minimum(1),   0x01,
    usage_maximum(1),   0x03,
    logical_minimum(1), 0x00,
    logical_maximum(1), 0x01,
    report_count(1),    0x03,  //   3 bits (buttons)
    report_size(1),     0x01,
    input(1),           0x02,  //   Data, Variable, Absolute
    report_count(1),    0x01,  //   5 bits (padding)
    report_size(1),     0x05,
    input(1),           0x01,  //   Constant
    usage_page(1),      0x01,  //   Generic Desktop
    usage(1),           0x30,  //   X
    usage(1),           0x31,  //   Y
    usage(1),           0x32,  //   Z
    usage(1),           0x33,  //   Rx
    logical_minimum(1), 0x81,  //   -127
    logical_maximum(1), 0x7F,  //   127
    report_size(1),     0x08,
    report_count(1),    0x04,
    input(1),           0x02,  //   Data, Variable, Absolute
    end_collection(0),
    end_collection(0),
];

/// Build the 5-byte joystick report. Deltas are clamped to one signed byte;
/// the trailing byte fills the fourth declared axis and is always zero.
pub fn encode(dx: i32, dy: i32, dz: i32, left: bool, right: bool, middle: bool) -> [u8; 5] {
    [
        buttons_byte(left, right, middle) & 7,
        clamp_delta(dx) as u8,
        clamp_delta(dy) as u8,
        clamp_delta(dz) as u8,
        0,
    ]
}

struct JoystickProfile;

impl HidProfile for JoystickProfile {
    fn report_map(&self) -> &'static [u8] {
        &REPORT_MAP
    }

    fn report_kinds(&self) -> ReportKinds {
        ReportKinds::INPUT_ONLY
    }

    fn data_rate(&self) -> Duration {
        Duration::from_millis(10)
    }

    fn handle_output_report(&self, _report: &[u8]) {}

    fn appearance(&self) -> u16 {
        // HID subtype: joystick.
        0x03C3
    }
}

/// BLE joystick peripheral.
pub struct Joystick {
    peripheral: HidPeripheral,
}

impl Joystick {
    /// Construct the peripheral. Fails when the environment cannot host a
    /// BLE peripheral.
    pub async fn new(config: Config) -> Result<Self> {
        let peripheral = HidPeripheral::new(Arc::new(JoystickProfile), config).await?;
        Ok(Self { peripheral })
    }

    /// Report the stick position and buttons. Deltas are clamped to
    /// -127..=127.
    pub fn move_pointer(
        &self,
        dx: i32,
        dy: i32,
        dz: i32,
        left_button: bool,
        right_button: bool,
        middle_button: bool,
    ) {
        let report = encode(dx, dy, dz, left_button, right_button, middle_button);
        self.peripheral.add_input_report(Report::from(report));
    }

    /// Start advertising to centrals.
    pub async fn start_advertising(&mut self) -> Result<()> {
        self.peripheral.start_advertising().await
    }

    /// Stop advertising and disconnect every central, best effort.
    pub async fn stop_advertising(&mut self) {
        self.peripheral.stop_advertising().await;
    }

    /// Access the underlying engine.
    pub fn peripheral(&self) -> &HidPeripheral {
        &self.peripheral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let report = encode(10, -20, 30, true, true, false);
        assert_eq!(report, [3, 10, 0xEC, 30, 0]);
    }

    #[test]
    fn test_encode_clamps_axes() {
        let report = encode(500, -500, 128, false, false, false);
        assert_eq!(report[1] as i8, 127);
        assert_eq!(report[2] as i8, -127);
        assert_eq!(report[3] as i8, 127);
    }

    #[test]
    fn test_trailing_byte_always_zero() {
        assert_eq!(encode(127, 127, 127, true, true, true)[4], 0);
    }

    #[test]
    fn test_report_map_declares_four_axes() {
        let needle = [
            usage(1), 0x30, usage(1), 0x31, usage(1), 0x32, usage(1), 0x33,
        ];
        assert!(REPORT_MAP.windows(8).any(|w| w == needle));
        let needle = [report_count(1), 0x04];
        assert!(REPORT_MAP.windows(2).any(|w| w == needle));
    }
}
