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

//! Relative-movement BLE mouse.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use super::report_map::*;
use super::{buttons_byte, clamp_delta, HidProfile, ReportKinds};
use crate::config::Config;
use crate::error::Result;
use crate::peripheral::HidPeripheral;
use crate::report::Report;

/// Report Map: 3 buttons, relative X/Y/wheel, one byte each.
#[rustfmt::skip]
pub const REPORT_MAP: [u8; 52] = [
    usage_page(1),      0x01,  // Generic Desktop
    usage(1),           0x02,  // Mouse
    collection(1),      0x01,  // Application
    usage(1),           0x01,  //  Pointer
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
    usage(1),           0x38,  //   Wheel
    logical_minimum(1), 0x81,  //   -127
    logical_maximum(1), 0x7F,  //   127
    report_size(1),     0x08,  //   three bytes
    report_count(1),    0x03,
    input(1),           0x06,  //   Data, Variable, Relative
    end_collection(0),
    end_collection(0),
];

/// Encodes pointer input into 4-byte reports.
///
/// Suppression is adjacency-only: an all-zero report is dropped only when the
/// immediately previous sent report was also all-zero. Two zero reports
/// separated by a non-zero one are both sent.
#[derive(Debug, Default)]
pub struct MouseEncoder {
    last_sent: [u8; 4],
}

impl MouseEncoder {
    /// Encode one movement, or `None` when the idle state repeats.
    pub fn encode(
        &mut self,
        dx: i32,
        dy: i32,
        wheel: i32,
        left: bool,
        right: bool,
        middle: bool,
    ) -> Option<[u8; 4]> {
        let report = [
            buttons_byte(left, right, middle) & 7,
            clamp_delta(dx) as u8,
            clamp_delta(dy) as u8,
            clamp_delta(wheel) as u8,
        ];

        if self.last_sent == [0; 4] && report == [0; 4] {
            return None;
        }
        self.last_sent = report;
        Some(report)
    }
}

struct MouseProfile;

impl HidProfile for MouseProfile {
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

/// BLE mouse peripheral with relative movement.
pub struct Mouse {
    peripheral: HidPeripheral,
    encoder: Mutex<MouseEncoder>,
}

impl Mouse {
    /// Construct the peripheral. Fails when the environment cannot host a
    /// BLE peripheral (no adapter, adapter off, GATT registration refused).
    pub async fn new(config: Config) -> Result<Self> {
        let peripheral = HidPeripheral::new(Arc::new(MouseProfile), config).await?;
        Ok(Self {
            peripheral,
            encoder: Mutex::new(MouseEncoder::default()),
        })
    }

    /// Move the mouse pointer. Deltas are clamped to -127..=127.
    pub fn move_pointer(
        &self,
        dx: i32,
        dy: i32,
        wheel: i32,
        left_button: bool,
        right_button: bool,
        middle_button: bool,
    ) {
        let encoded = self
            .encoder
            .lock()
            .encode(dx, dy, wheel, left_button, right_button, middle_button);
        if let Some(report) = encoded {
            self.peripheral.add_input_report(Report::from(report));
        }
    }

    /// Start advertising to centrals.
    pub async fn start_advertising(&mut self) -> Result<()> {
        self.peripheral.start_advertising().await
    }

    /// Stop advertising and disconnect every central, best effort.
    pub async fn stop_advertising(&mut self) {
        self.peripheral.stop_advertising().await;
    }

    /// Access the underlying engine (name setters, queue inspection).
    pub fn peripheral(&self) -> &HidPeripheral {
        &self.peripheral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_map_starts_with_mouse_usage() {
        assert_eq!(REPORT_MAP[0], 0x05); // Usage Page, 1 byte
        assert_eq!(REPORT_MAP[1], 0x01); // Generic Desktop
        assert_eq!(REPORT_MAP[2], 0x09); // Usage, 1 byte
        assert_eq!(REPORT_MAP[3], 0x02); // Mouse
        assert_eq!(REPORT_MAP[REPORT_MAP.len() - 1], end_collection(0));
    }

    #[test]
    fn test_encode_layout() {
        let mut encoder = MouseEncoder::default();
        let report = encoder.encode(10, -5, 3, true, false, true).unwrap();
        assert_eq!(report, [5, 10, 0xFB, 3]);
    }

    #[test]
    fn test_encode_clamps_deltas() {
        let mut encoder = MouseEncoder::default();
        let report = encoder.encode(1000, -1000, 200, false, false, false).unwrap();
        assert_eq!(report[1] as i8, 127);
        assert_eq!(report[2] as i8, -127);
        assert_eq!(report[3] as i8, 127);
    }

    #[test]
    fn test_adjacent_zero_reports_collapsed() {
        let mut encoder = MouseEncoder::default();
        // First zero report after movement is sent, the repeat is not.
        assert!(encoder.encode(1, 0, 0, false, false, false).is_some());
        assert!(encoder.encode(0, 0, 0, false, false, false).is_some());
        assert!(encoder.encode(0, 0, 0, false, false, false).is_none());
        // A non-zero report in between re-arms the zero report.
        assert!(encoder.encode(0, 2, 0, false, false, false).is_some());
        assert!(encoder.encode(0, 0, 0, false, false, false).is_some());
    }

    #[test]
    fn test_initial_zero_report_suppressed() {
        let mut encoder = MouseEncoder::default();
        assert!(encoder.encode(0, 0, 0, false, false, false).is_none());
    }

    #[test]
    fn test_button_only_report_not_suppressed() {
        let mut encoder = MouseEncoder::default();
        assert!(encoder.encode(0, 0, 0, true, false, false).is_some());
        // Releasing the button is a transition to all-zero: sent once.
        assert!(encoder.encode(0, 0, 0, false, false, false).is_some());
        assert!(encoder.encode(0, 0, 0, false, false, false).is_none());
    }
}
