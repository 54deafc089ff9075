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

//! HID Report Map item opcodes.
//!
//! A report map is a flat byte sequence of items. Each item prefix is
//! `base | size_code` where the size code 0..=3 declares a 0/1/2/4-byte
//! payload following the prefix. The helpers below build the prefixes for
//! the items the device variants use; the per-variant maps live next to the
//! variants themselves.

/// Main item: Input.
pub const fn input(size: u8) -> u8 {
    0x80 | size
}

/// Main item: Output.
pub const fn output(size: u8) -> u8 {
    0x90 | size
}

/// Main item: Feature.
pub const fn feature(size: u8) -> u8 {
    0xB0 | size
}

/// Main item: Collection.
pub const fn collection(size: u8) -> u8 {
    0xA0 | size
}

/// Main item: End Collection.
pub const fn end_collection(size: u8) -> u8 {
    0xC0 | size
}

/// Global item: Usage Page.
pub const fn usage_page(size: u8) -> u8 {
    0x04 | size
}

/// Global item: Logical Minimum.
pub const fn logical_minimum(size: u8) -> u8 {
    0x14 | size
}

/// Global item: Logical Maximum.
pub const fn logical_maximum(size: u8) -> u8 {
    0x24 | size
}

/// Global item: Report Size.
pub const fn report_size(size: u8) -> u8 {
    0x74 | size
}

/// Global item: Report Count.
pub const fn report_count(size: u8) -> u8 {
    0x94 | size
}

/// Local item: Usage.
pub const fn usage(size: u8) -> u8 {
    0x08 | size
}

/// Local item: Usage Minimum.
pub const fn usage_minimum(size: u8) -> u8 {
    0x18 | size
}

/// Local item: Usage Maximum.
pub const fn usage_maximum(size: u8) -> u8 {
    0x28 | size
}

/// Low byte of a 16-bit value.
pub const fn lsb(value: u16) -> u8 {
    (value & 0xFF) as u8
}

/// High byte of a 16-bit value.
pub const fn msb(value: u16) -> u8 {
    (value >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_is_base_or_size() {
        for size in 0u8..=3 {
            assert_eq!(input(size), 0x80 | size);
            assert_eq!(output(size), 0x90 | size);
            assert_eq!(feature(size), 0xB0 | size);
            assert_eq!(collection(size), 0xA0 | size);
            assert_eq!(end_collection(size), 0xC0 | size);
            assert_eq!(usage_page(size), 0x04 | size);
            assert_eq!(logical_minimum(size), 0x14 | size);
            assert_eq!(logical_maximum(size), 0x24 | size);
            assert_eq!(report_size(size), 0x74 | size);
            assert_eq!(report_count(size), 0x94 | size);
            assert_eq!(usage(size), 0x08 | size);
            assert_eq!(usage_minimum(size), 0x18 | size);
            assert_eq!(usage_maximum(size), 0x28 | size);
        }
    }

    #[test]
    fn test_split_16_bit_value() {
        assert_eq!(lsb(32767), 0xFF);
        assert_eq!(msb(32767), 0x7F);
        assert_eq!(lsb(0x1234), 0x34);
        assert_eq!(msb(0x1234), 0x12);
    }
}
