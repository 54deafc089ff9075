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

//! GATT service topology.
//!
//! Pure data: which services, characteristics and descriptors the peripheral
//! serves. Built once at startup from the device variant's report kinds; the
//! server layer turns it into live GATT objects.

use uuid::Uuid;

use super::uuids;
use crate::hid::ReportKinds;

/// HID Information value: HID 1.11, no country code, remote-wake plus
/// normally-connectable.
pub const HID_INFORMATION_VALUE: [u8; 4] = [0x11, 0x01, 0x00, 0x03];

/// Battery level is always reported as 100%.
pub const BATTERY_LEVEL_VALUE: [u8; 1] = [0x64];

/// CCCD preset: notifications enabled.
pub const CCCD_NOTIFICATIONS_ENABLED: [u8; 2] = [0x01, 0x00];

/// Property flags of one characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CharacteristicProps {
    pub read: bool,
    pub write: bool,
    pub write_without_response: bool,
    pub notify: bool,
}

impl CharacteristicProps {
    pub const READ: Self = Self {
        read: true,
        write: false,
        write_without_response: false,
        notify: false,
    };

    pub const READ_NOTIFY: Self = Self {
        read: true,
        write: false,
        write_without_response: false,
        notify: true,
    };

    pub const WRITE_WITHOUT_RESPONSE: Self = Self {
        read: false,
        write: false,
        write_without_response: true,
        notify: false,
    };

    pub const READ_WRITE_WITHOUT_RESPONSE: Self = Self {
        read: true,
        write: false,
        write_without_response: true,
        notify: false,
    };

    /// Input Report: read, write, notify.
    pub const INPUT_REPORT: Self = Self {
        read: true,
        write: true,
        write_without_response: false,
        notify: true,
    };

    /// Output Report: read, write, write-without-response.
    pub const OUTPUT_REPORT: Self = Self {
        read: true,
        write: true,
        write_without_response: true,
        notify: false,
    };

    /// Feature Report: read, write.
    pub const FEATURE_REPORT: Self = Self {
        read: true,
        write: true,
        write_without_response: false,
        notify: false,
    };
}

/// Report kind tag carried by the Report Reference descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Input,
    Output,
    Feature,
}

impl ReportKind {
    /// Wire tag of the kind.
    pub fn tag(self) -> u8 {
        match self {
            Self::Input => 1,
            Self::Output => 2,
            Self::Feature => 3,
        }
    }
}

/// Derive the report kind from the exact property set of a Report
/// characteristic. Any other combination is a protocol error.
pub fn report_kind_for(props: CharacteristicProps) -> Option<ReportKind> {
    match props {
        CharacteristicProps::INPUT_REPORT => Some(ReportKind::Input),
        CharacteristicProps::OUTPUT_REPORT => Some(ReportKind::Output),
        CharacteristicProps::FEATURE_REPORT => Some(ReportKind::Feature),
        _ => None,
    }
}

/// One descriptor with its initial value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSpec {
    pub uuid: Uuid,
    pub initial_value: Vec<u8>,
    pub writable: bool,
}

impl DescriptorSpec {
    fn cccd() -> Self {
        Self {
            uuid: uuids::DESCRIPTOR_CLIENT_CHARACTERISTIC_CONFIGURATION,
            initial_value: CCCD_NOTIFICATIONS_ENABLED.to_vec(),
            writable: true,
        }
    }

    fn report_reference(kind: ReportKind) -> Self {
        Self {
            uuid: uuids::DESCRIPTOR_REPORT_REFERENCE,
            // Report ID 0, then the kind tag.
            initial_value: vec![0, kind.tag()],
            writable: false,
        }
    }
}

/// One characteristic with its properties and descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicSpec {
    pub uuid: Uuid,
    pub props: CharacteristicProps,
    pub encrypted: bool,
    pub descriptors: Vec<DescriptorSpec>,
}

impl CharacteristicSpec {
    fn new(uuid: Uuid, props: CharacteristicProps) -> Self {
        Self {
            uuid,
            props,
            encrypted: false,
            descriptors: Vec::new(),
        }
    }

    fn encrypted(uuid: Uuid, props: CharacteristicProps) -> Self {
        Self {
            uuid,
            props,
            encrypted: true,
            descriptors: Vec::new(),
        }
    }

    fn with_descriptors(mut self, descriptors: Vec<DescriptorSpec>) -> Self {
        self.descriptors = descriptors;
        self
    }
}

/// One primary service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub uuid: Uuid,
    pub characteristics: Vec<CharacteristicSpec>,
}

/// Build the full three-service topology for a device variant.
pub fn build_topology(kinds: ReportKinds) -> Vec<ServiceSpec> {
    vec![
        hid_service(kinds),
        device_information_service(),
        battery_service(),
    ]
}

fn hid_service(kinds: ReportKinds) -> ServiceSpec {
    let mut characteristics = vec![
        CharacteristicSpec::new(uuids::CHARACTERISTIC_HID_INFORMATION, CharacteristicProps::READ),
        CharacteristicSpec::new(uuids::CHARACTERISTIC_REPORT_MAP, CharacteristicProps::READ),
        CharacteristicSpec::new(
            uuids::CHARACTERISTIC_PROTOCOL_MODE,
            CharacteristicProps::READ_WRITE_WITHOUT_RESPONSE,
        ),
        CharacteristicSpec::new(
            uuids::CHARACTERISTIC_HID_CONTROL_POINT,
            CharacteristicProps::WRITE_WITHOUT_RESPONSE,
        ),
    ];

    if kinds.input {
        characteristics.push(
            CharacteristicSpec::new(uuids::CHARACTERISTIC_REPORT, CharacteristicProps::INPUT_REPORT)
                .with_descriptors(vec![
                    DescriptorSpec::report_reference(ReportKind::Input),
                    DescriptorSpec::cccd(),
                ]),
        );
    }
    if kinds.output {
        characteristics.push(
            CharacteristicSpec::new(uuids::CHARACTERISTIC_REPORT, CharacteristicProps::OUTPUT_REPORT)
                .with_descriptors(vec![DescriptorSpec::report_reference(ReportKind::Output)]),
        );
    }
    if kinds.feature {
        characteristics.push(
            CharacteristicSpec::new(
                uuids::CHARACTERISTIC_REPORT,
                CharacteristicProps::FEATURE_REPORT,
            )
            .with_descriptors(vec![DescriptorSpec::report_reference(ReportKind::Feature)]),
        );
    }

    ServiceSpec {
        uuid: uuids::SERVICE_BLE_HID,
        characteristics,
    }
}

fn device_information_service() -> ServiceSpec {
    ServiceSpec {
        uuid: uuids::SERVICE_DEVICE_INFORMATION,
        characteristics: vec![
            CharacteristicSpec::encrypted(
                uuids::CHARACTERISTIC_MANUFACTURER_NAME,
                CharacteristicProps::READ,
            ),
            CharacteristicSpec::encrypted(
                uuids::CHARACTERISTIC_MODEL_NUMBER,
                CharacteristicProps::READ,
            ),
            CharacteristicSpec::encrypted(
                uuids::CHARACTERISTIC_SERIAL_NUMBER,
                CharacteristicProps::READ,
            ),
        ],
    }
}

fn battery_service() -> ServiceSpec {
    ServiceSpec {
        uuid: uuids::SERVICE_BATTERY,
        characteristics: vec![CharacteristicSpec::encrypted(
            uuids::CHARACTERISTIC_BATTERY_LEVEL,
            CharacteristicProps::READ_NOTIFY,
        )
        .with_descriptors(vec![DescriptorSpec::cccd()])],
    }
}
