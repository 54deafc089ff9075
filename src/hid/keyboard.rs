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

//! BLE keyboard (US layout).

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::report_map::*;
use super::{HidProfile, ReportKinds};
use crate::config::Config;
use crate::error::Result;
use crate::peripheral::HidPeripheral;
use crate::report::Report;

pub const MODIFIER_KEY_NONE: u8 = 0;
pub const MODIFIER_KEY_CTRL: u8 = 1;
pub const MODIFIER_KEY_SHIFT: u8 = 2;
pub const MODIFIER_KEY_ALT: u8 = 4;

pub const KEY_F1: u8 = 0x3A;
pub const KEY_F2: u8 = 0x3B;
pub const KEY_F3: u8 = 0x3C;
pub const KEY_F4: u8 = 0x3D;
pub const KEY_F5: u8 = 0x3E;
pub const KEY_F6: u8 = 0x3F;
pub const KEY_F7: u8 = 0x40;
pub const KEY_F8: u8 = 0x41;
pub const KEY_F9: u8 = 0x42;
pub const KEY_F10: u8 = 0x43;
pub const KEY_F11: u8 = 0x44;
pub const KEY_F12: u8 = 0x45;

pub const KEY_PRINT_SCREEN: u8 = 0x46;
pub const KEY_SCROLL_LOCK: u8 = 0x47;
pub const KEY_CAPS_LOCK: u8 = 0x39;
pub const KEY_NUM_LOCK: u8 = 0x53;
pub const KEY_INSERT: u8 = 0x49;
pub const KEY_HOME: u8 = 0x4A;
pub const KEY_PAGE_UP: u8 = 0x4B;
pub const KEY_PAGE_DOWN: u8 = 0x4E;

pub const KEY_RIGHT_ARROW: u8 = 0x4F;
pub const KEY_LEFT_ARROW: u8 = 0x50;
pub const KEY_DOWN_ARROW: u8 = 0x51;
pub const KEY_UP_ARROW: u8 = 0x52;

const KEY_PACKET_MODIFIER_INDEX: usize = 0;
const KEY_PACKET_KEY_INDEX: usize = 2;

/// The 8-byte all-up report.
pub const EMPTY_REPORT: [u8; 8] = [0; 8];

/// Report Map: 8 modifier bits, reserved byte, 5 LED output bits, 6 key
/// slots.
#[rustfmt::skip]
pub const REPORT_MAP: [u8; 63] = [
    usage_page(1),      0x01,  // Generic Desktop
    usage(1),           0x06,  // Keyboard
    collection(1),      0x01,  // Application
    usage_page(1),      0x07,  //  Keyboard/Keypad
    usage_minimum(1),   0xE0,
    usage_maximum(1),   0xE7,
    logical_minimum(1), 0x00,
    logical_maximum(1), 0x01,
    report_size(1),     0x01,  //  1 byte (modifiers)
    report_count(1),    0x08,
    input(1),           0x02,  //  Data, Variable, Absolute
    report_count(1),    0x01,  //  1 byte (reserved)
    report_size(1),     0x08,
    input(1),           0x01,  //  Constant
    report_count(1),    0x05,  //  5 bits (LEDs)
    report_size(1),     0x01,
    usage_page(1),      0x08,  //  LEDs
    usage_minimum(1),   0x01,  //  Num Lock
    usage_maximum(1),   0x05,  //  Kana
    output(1),          0x02,  //  Data, Variable, Absolute
    report_count(1),    0x01,  //  3 bits (padding)
    report_size(1),     0x03,
    output(1),          0x01,  //  Constant
    report_count(1),    0x06,  //  6 bytes (keys)
    report_size(1),     0x08,
    logical_minimum(1), 0x00,
    logical_maximum(1), 0x65,  //  101 keys
    usage_page(1),      0x07,  //  Keyboard/Keypad
    usage_minimum(1),   0x00,
    usage_maximum(1),   0x65,
    input(1),           0x00,  //  Data, Array, Absolute
    end_collection(0),
];

/// Modifier byte needed to type `c` on a US layout.
pub fn modifier(c: char) -> u8 {
    match c {
        'A'..='Z' => MODIFIER_KEY_SHIFT,
        '!' | '@' | '#' | '$' | '%' | '^' | '&' | '*' | '(' | ')' | '_' | '+' | '{' | '}'
        | '|' | ':' | '"' | '~' | '<' | '>' | '?' => MODIFIER_KEY_SHIFT,
        _ => MODIFIER_KEY_NONE,
    }
}

/// HID usage code for `c` on a US layout, 0 when untypeable.
pub fn key_code(c: char) -> u8 {
    match c {
        'A'..='Z' => c as u8 - b'A' + 0x04,
        'a'..='z' => c as u8 - b'a' + 0x04,
        '1'..='9' => c as u8 - b'1' + 0x1E,
        '!' => 0x1E,
        '@' => 0x1F,
        '#' => 0x20,
        '$' => 0x21,
        '%' => 0x22,
        '^' => 0x23,
        '&' => 0x24,
        '*' => 0x25,
        '(' => 0x26,
        ')' | '0' => 0x27,
        '\n' => 0x28,
        '\u{8}' => 0x2A,
        '\t' => 0x2B,
        ' ' => 0x2C,
        '_' | '-' => 0x2D,
        '+' | '=' => 0x2E,
        '{' | '[' => 0x2F,
        '}' | ']' => 0x30,
        '|' | '\\' => 0x31,
        ':' | ';' => 0x33,
        '"' | '\'' => 0x34,
        '~' | '`' => 0x35,
        '<' | ',' => 0x36,
        '>' | '.' => 0x37,
        '?' | '/' => 0x38,
        _ => 0,
    }
}

fn key_report(modifier: u8, key_code: u8) -> [u8; 8] {
    let mut report = [0u8; 8];
    report[KEY_PACKET_MODIFIER_INDEX] = modifier;
    report[KEY_PACKET_KEY_INDEX] = key_code;
    report
}

/// Translate text into the key-down/key-up report sequence.
///
/// Each character yields one key-down report. When a character repeats the
/// previous one, a key-up report is inserted first so the central registers
/// two presses instead of one held key. A trailing key-up closes the
/// sequence.
pub fn encode_text(text: &str) -> Vec<[u8; 8]> {
    let mut reports = Vec::with_capacity(text.chars().count() + 1);
    let mut last_key = None;
    for c in text.chars() {
        if last_key == Some(c) {
            reports.push(EMPTY_REPORT);
        }
        reports.push(key_report(modifier(c), key_code(c)));
        last_key = Some(c);
    }
    reports.push(EMPTY_REPORT);
    reports
}

struct KeyboardProfile;

impl HidProfile for KeyboardProfile {
    fn report_map(&self) -> &'static [u8] {
        &REPORT_MAP
    }

    fn report_kinds(&self) -> ReportKinds {
        ReportKinds::INPUT_AND_OUTPUT
    }

    fn data_rate(&self) -> Duration {
        Duration::from_millis(20)
    }

    fn handle_output_report(&self, report: &[u8]) {
        // LED state: bit 0 Num Lock, 1 Caps Lock, 2 Scroll Lock, 3 Compose,
        // 4 Kana.
        info!(report = ?report, "output report");
    }

    fn appearance(&self) -> u16 {
        // HID subtype: keyboard.
        0x03C1
    }
}

/// BLE keyboard peripheral.
pub struct Keyboard {
    peripheral: HidPeripheral,
}

impl Keyboard {
    /// Construct the peripheral. Fails when the environment cannot host a
    /// BLE peripheral.
    pub async fn new(config: Config) -> Result<Self> {
        let peripheral = HidPeripheral::new(Arc::new(KeyboardProfile), config).await?;
        Ok(Self { peripheral })
    }

    /// Type `text` on the central, character by character.
    pub fn send_keys(&self, text: &str) {
        for report in encode_text(text) {
            self.peripheral.add_input_report(Report::from(report));
        }
    }

    /// Press a key (with modifiers). Stays pressed until
    /// [`send_key_up`](Self::send_key_up).
    pub fn send_key_down(&self, modifier: u8, key_code: u8) {
        self.peripheral
            .add_input_report(Report::from(key_report(modifier, key_code)));
    }

    /// Release all keys.
    pub fn send_key_up(&self) {
        self.peripheral.add_input_report(Report::from(EMPTY_REPORT));
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
