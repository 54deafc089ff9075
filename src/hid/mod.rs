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

//! HID device variants.
//!
//! Each variant supplies its report map and output-report handling through
//! the [`HidProfile`] trait; the engine stays variant-agnostic.

pub mod absolute_mouse;
pub mod joystick;
pub mod keyboard;
pub mod mouse;
pub mod report_map;

pub use absolute_mouse::AbsoluteMouse;
pub use joystick::Joystick;
pub use keyboard::Keyboard;
pub use mouse::Mouse;

use std::time::Duration;

/// Which Report characteristics a device variant serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportKinds {
    pub input: bool,
    pub output: bool,
    pub feature: bool,
}

impl ReportKinds {
    /// Input reports only (pointer devices).
    pub const INPUT_ONLY: Self = Self {
        input: true,
        output: false,
        feature: false,
    };

    /// Input plus output reports (keyboard LED state).
    pub const INPUT_AND_OUTPUT: Self = Self {
        input: true,
        output: true,
        feature: false,
    };
}

/// Behavior a device variant contributes to the peripheral engine.
pub trait HidProfile: Send + Sync {
    /// The HID Report Map served by the Report Map characteristic.
    fn report_map(&self) -> &'static [u8];

    /// Report characteristics this variant needs.
    fn report_kinds(&self) -> ReportKinds;

    /// Period of the report scheduler for this variant.
    fn data_rate(&self) -> Duration;

    /// Called with the payload of each Output Report written by the central.
    fn handle_output_report(&self, report: &[u8]);

    /// GAP appearance advertised for this variant.
    fn appearance(&self) -> u16 {
        // Generic human interface device.
        0x03C0
    }
}

/// Pack the three pointer buttons into the low bits of the button byte.
pub(crate) fn buttons_byte(left: bool, right: bool, middle: bool) -> u8 {
    let mut buttons = 0u8;
    if left {
        buttons |= 1;
    }
    if right {
        buttons |= 2;
    }
    if middle {
        buttons |= 4;
    }
    buttons
}

/// Clamp an axis delta to the signed range of one report byte.
pub(crate) fn clamp_delta(value: i32) -> i8 {
    value.clamp(-127, 127) as i8
}
