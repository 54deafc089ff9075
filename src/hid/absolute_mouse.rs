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

//! Absolute-coordinate BLE mouse (digitizer style).

use std::sync::Arc;
use std::time::Duration;

use super::report_map::*;
use super::{buttons_byte, clamp_delta, HidProfile, ReportKinds};
use crate::config::Config;
use crate::error::Result;
use crate::peripheral::HidPeripheral;
use crate::report::Report;

/// Upper bound of both absolute axes.
pub const AXIS_MAX: i32 = 32767;

/// Report Map: absolute 16-bit X/Y, 8-bit wheel, 3 buttons.
#[rustfmt::skip]
pub const REPORT_MAP: [u8; 65] = [
    usage_page(1),      0x01,              // Generic Desktop
    usage(1),           0x02,              // Mouse
    collection(1),      0x01,              // Application
    usage(1),           0x01,              //  Pointer
    collection(1),      0x00,              //  Physical
    usage_page(1),      0x01,              //   Generic Desktop
    usage(1),           0x30,              //   X
    usage(1),           0x31,              //   Y
    logical_minimum(1), 0x00,              //   0
    logical_maximum(2), lsb(32767), msb(32767),
    report_size(1),     0x10,              //   two 16-bit axes
    report_count(1),    0x02,
    input(1),           0x02,              //   Data, Variable, Absolute
    usage_page(1),      0x01,              //   Generic Desktop
    usage(1),           0x38,              //   Wheel
    logical_minimum(1), 0x81,              //   -127
    logical_maximum(1), 0x7F,              //   127
    report_size(1),     0x08,
    report_count(1),    0x01,
    input(1),           0x06,              //   Data, Variable, Relative
    usage_page(1),      0x09,              //   Buttons
    usage_minimum(1),   0x01,
    usage_maximum(1),   0x03,
    logical_minimum(1), 0x00,
    logical_maximum(1), 0x01,
    report_count(1),    0x03,              //   3 bits (buttons)
    report_size(1),     0x01,
    input(1),           0x02,              //   Data, Variable, Absolute
    report_count(1),    0x01,              //   5 bits (padding)
    report_size(1),     0x05,
    input(1),           0x01,              //   Constant
    end_collection(0),
    end_collection(0),
];

/// Build the 6-byte absolute report. Coordinates are clamped to the axis
/// range, the wheel to one signed byte.
pub fn encode(x: i32, y: i32, wheel: i32, left: bool, right: bool, middle: bool) -> [u8; 6] {
    let x = x.clamp(0, AXIS_MAX) as u16;
    let y = y.clamp(0, AXIS_MAX) as u16;
    [
        lsb(x),
        msb(x),
        lsb(y),
        msb(y),
        clamp_delta(wheel) as u8,
        buttons_byte(left, right, middle) & 7,
    ]
}

struct AbsoluteMouseProfile;

impl HidProfile for AbsoluteMouseProfile {
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
        // HID subtype: mouse.
        0x03C2
    }
}

/// BLE mouse peripheral addressing the screen in absolute coordinates.
///
/// Unlike the relative [`Mouse`](super::Mouse), repeated identical positions
/// are meaningful (the central re-anchors the cursor) and are never
/// suppressed.
pub struct AbsoluteMouse {
    peripheral: HidPeripheral,
}

impl AbsoluteMouse {
    /// Construct the peripheral. Fails when the environment cannot host a
    /// BLE peripheral.
    pub async fn new(config: Config) -> Result<Self> {
        let peripheral = HidPeripheral::new(Arc::new(AbsoluteMouseProfile), config).await?;
        Ok(Self { peripheral })
    }

    /// Move the pointer to `(x, y)` in the 0..=32767 device space.
    pub fn move_pointer(
        &self,
        x: i32,
        y: i32,
        wheel: i32,
        left_button: bool,
        right_button: bool,
        middle_button: bool,
    ) {
        let report = encode(x, y, wheel, left_button, right_button, middle_button);
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
    fn test_encode_layout_little_endian() {
        let report = encode(0x1234, 0x0102, -2, true, false, false);
        assert_eq!(report, [0x34, 0x12, 0x02, 0x01, 0xFE, 1]);
    }

    #[test]
    fn test_encode_clamps_coordinates() {
        let report = encode(40000, -5, 0, false, false, false);
        assert_eq!(u16::from_le_bytes([report[0], report[1]]), 32767);
        assert_eq!(u16::from_le_bytes([report[2], report[3]]), 0);
    }

    #[test]
    fn test_repeated_positions_are_distinct_reports() {
        // No idle-state suppression for absolute coordinates.
        let a = encode(100, 100, 0, false, false, false);
        let b = encode(100, 100, 0, false, false, false);
        assert_eq!(a, b);
        assert_ne!(a, [0; 6]);
    }

    #[test]
    fn test_report_map_declares_16_bit_axes() {
        // Logical Maximum 32767 appears as a two-byte item.
        let needle = [logical_maximum(2), 0xFF, 0x7F];
        assert!(REPORT_MAP.windows(3).any(|w| w == needle));
        // Report Size 16 for the axes.
        let needle = [report_size(1), 0x10];
        assert!(REPORT_MAP.windows(2).any(|w| w == needle));
    }
}
