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

//! Bluetooth-assigned UUIDs and short-form matching.
//!
//! Centrals may address a service or characteristic with either its 16-bit
//! assigned number or the expanded 128-bit form built on the Bluetooth base
//! UUID (`0000xxxx-0000-1000-8000-00805F9B34FB`). Both must resolve to the
//! same entity.

use uuid::Uuid;

/// Lower 112 bits of the Bluetooth base UUID; the 16-bit assigned number
/// occupies bits 96..112.
const BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805F9B34FB;

/// Mask selecting the 16-bit short-form window.
const SHORT_VALUE_MASK: u128 = 0x0000FFFF << 96;

/// Device Information Service.
pub const SERVICE_DEVICE_INFORMATION: Uuid = from_short_value(0x180A);
pub const CHARACTERISTIC_MANUFACTURER_NAME: Uuid = from_short_value(0x2A29);
pub const CHARACTERISTIC_MODEL_NUMBER: Uuid = from_short_value(0x2A24);
pub const CHARACTERISTIC_SERIAL_NUMBER: Uuid = from_short_value(0x2A25);

/// Battery Service.
pub const SERVICE_BATTERY: Uuid = from_short_value(0x180F);
pub const CHARACTERISTIC_BATTERY_LEVEL: Uuid = from_short_value(0x2A19);

/// HID Service.
pub const SERVICE_BLE_HID: Uuid = from_short_value(0x1812);
pub const CHARACTERISTIC_HID_INFORMATION: Uuid = from_short_value(0x2A4A);
pub const CHARACTERISTIC_REPORT_MAP: Uuid = from_short_value(0x2A4B);
pub const CHARACTERISTIC_HID_CONTROL_POINT: Uuid = from_short_value(0x2A4C);
pub const CHARACTERISTIC_REPORT: Uuid = from_short_value(0x2A4D);
pub const CHARACTERISTIC_PROTOCOL_MODE: Uuid = from_short_value(0x2A4E);

/// GATT characteristic descriptors.
pub const DESCRIPTOR_REPORT_REFERENCE: Uuid = from_short_value(0x2908);
pub const DESCRIPTOR_CLIENT_CHARACTERISTIC_CONFIGURATION: Uuid = from_short_value(0x2902);

/// Expand a 16-bit assigned number into its canonical 128-bit form.
pub const fn from_short_value(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | BASE_UUID)
}

/// Extract the 16-bit short-form window of a UUID.
pub const fn to_short_value(uuid: &Uuid) -> u16 {
    (uuid.as_u128() >> 96) as u16
}

/// True if the UUID is base-UUID-derived: every bit outside the 16-bit
/// short-form window equals the Bluetooth base UUID.
pub const fn is_short(uuid: &Uuid) -> bool {
    uuid.as_u128() & !SHORT_VALUE_MASK == BASE_UUID
}

/// Compare two UUIDs under the short-form convention.
///
/// When either side is base-UUID-derived, the match is on the 16-bit windows
/// (and requires the other side to be base-UUID-derived as well - a full
/// UUID that differs anywhere outside the window is a different entity).
/// Otherwise the comparison is full 128-bit equality.
pub fn matches(a: &Uuid, b: &Uuid) -> bool {
    if is_short(a) || is_short(b) {
        is_short(a) && is_short(b) && to_short_value(a) == to_short_value(b)
    } else {
        a == b
    }
}

/// Parse a UUID string, accepting the bare 4-digit short form.
pub fn from_string(value: &str) -> Option<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(value) {
        return Some(uuid);
    }
    // May be a short style, e.g. "2A4D".
    u16::from_str_radix(value, 16).ok().map(from_short_value)
}
