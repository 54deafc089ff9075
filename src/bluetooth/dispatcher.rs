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

//! GATT read/write request dispatch.
//!
//! A pure responder keyed by operation kind and target UUID. Every response
//! is derived synchronously from the configuration, the report map and a
//! small write-back cache; nothing here waits on the central.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::topology::{report_kind_for, CharacteristicProps, HID_INFORMATION_VALUE};
use super::uuids;
use crate::config::Config;
use crate::hid::HidProfile;

/// Protocol Mode: report protocol.
const PROTOCOL_MODE_REPORT: [u8; 1] = [0x01];

/// One request taken off the GATT server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattRequest {
    ReadCharacteristic {
        uuid: Uuid,
        offset: usize,
    },
    WriteCharacteristic {
        uuid: Uuid,
        props: CharacteristicProps,
        value: Vec<u8>,
        response_needed: bool,
    },
    ReadDescriptor {
        uuid: Uuid,
        characteristic_props: CharacteristicProps,
    },
    WriteDescriptor {
        uuid: Uuid,
        characteristic_props: CharacteristicProps,
        value: Vec<u8>,
        response_needed: bool,
    },
}

/// The single response owed for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattResponse {
    /// Read succeeded with this payload.
    Value(Vec<u8>),
    /// Write accepted, success response due.
    Written,
    /// Write accepted, no response was requested.
    NoResponse,
    /// Protocol-level failure; the connection stays open.
    Failure,
}

/// Responder for all characteristic and descriptor traffic.
pub struct Dispatcher {
    config: Arc<RwLock<Config>>,
    report_map: &'static [u8],
    profile: Arc<dyn HidProfile>,
    /// Last-written characteristic values.
    characteristic_cache: Mutex<HashMap<Uuid, Vec<u8>>>,
    /// Last-written descriptor values such as the CCCD flag, keyed by the
    /// owning characteristic's property set as well: both Report
    /// characteristics and the battery level carry their own CCCD instance.
    descriptor_cache: Mutex<HashMap<(CharacteristicProps, Uuid), Vec<u8>>>,
}

impl Dispatcher {
    pub fn new(config: Arc<RwLock<Config>>, profile: Arc<dyn HidProfile>) -> Self {
        let mut cache = HashMap::new();
        cache.insert(
            uuids::CHARACTERISTIC_PROTOCOL_MODE,
            PROTOCOL_MODE_REPORT.to_vec(),
        );
        Self {
            config,
            report_map: profile.report_map(),
            profile,
            characteristic_cache: Mutex::new(cache),
            descriptor_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Answer one request. Exactly one response per request.
    pub fn dispatch(&self, request: GattRequest) -> GattResponse {
        match request {
            GattRequest::ReadCharacteristic { uuid, offset } => {
                self.read_characteristic(&uuid, offset)
            }
            GattRequest::WriteCharacteristic {
                uuid,
                props,
                value,
                response_needed,
            } => self.write_characteristic(&uuid, props, value, response_needed),
            GattRequest::ReadDescriptor {
                uuid,
                characteristic_props,
            } => self.read_descriptor(&uuid, characteristic_props),
            GattRequest::WriteDescriptor {
                uuid,
                characteristic_props,
                value,
                response_needed,
            } => self.write_descriptor(&uuid, characteristic_props, value, response_needed),
        }
    }

    fn read_characteristic(&self, uuid: &Uuid, offset: usize) -> GattResponse {
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_HID_INFORMATION) {
            return GattResponse::Value(HID_INFORMATION_VALUE.to_vec());
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_REPORT_MAP) {
            // Long reads arrive as offset continuations.
            let chunk = self.report_map.get(offset..).unwrap_or(&[]);
            return GattResponse::Value(chunk.to_vec());
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_HID_CONTROL_POINT) {
            return GattResponse::Value(vec![0]);
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_REPORT) {
            // Reports are pushed by notification, never pulled.
            return GattResponse::Value(Vec::new());
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_MANUFACTURER_NAME) {
            return GattResponse::Value(self.config.read().manufacturer.as_bytes().to_vec());
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_SERIAL_NUMBER) {
            return GattResponse::Value(self.config.read().serial_number.as_bytes().to_vec());
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_MODEL_NUMBER) {
            return GattResponse::Value(self.config.read().device_name.as_bytes().to_vec());
        }
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_BATTERY_LEVEL) {
            return GattResponse::Value(vec![0x64]);
        }
        // Anything else echoes its last-written value.
        let cached = self
            .characteristic_cache
            .lock()
            .get(uuid)
            .cloned()
            .unwrap_or_default();
        GattResponse::Value(cached)
    }

    fn write_characteristic(
        &self,
        uuid: &Uuid,
        props: CharacteristicProps,
        value: Vec<u8>,
        response_needed: bool,
    ) -> GattResponse {
        if uuids::matches(uuid, &uuids::CHARACTERISTIC_REPORT)
            && props == CharacteristicProps::OUTPUT_REPORT
        {
            debug!(len = value.len(), "output report received");
            self.profile.handle_output_report(&value);
        }
        self.characteristic_cache.lock().insert(*uuid, value);
        if response_needed {
            GattResponse::Written
        } else {
            GattResponse::NoResponse
        }
    }

    fn read_descriptor(
        &self,
        uuid: &Uuid,
        characteristic_props: CharacteristicProps,
    ) -> GattResponse {
        if uuids::matches(uuid, &uuids::DESCRIPTOR_REPORT_REFERENCE) {
            // Report ID 0, kind derived from the owning characteristic's
            // exact property set.
            return match report_kind_for(characteristic_props) {
                Some(kind) => GattResponse::Value(vec![0, kind.tag()]),
                None => {
                    warn!("report reference read on unrecognized property set");
                    GattResponse::Failure
                }
            };
        }
        let cached = self
            .descriptor_cache
            .lock()
            .get(&(characteristic_props, *uuid))
            .cloned();
        match cached {
            Some(value) => GattResponse::Value(value),
            None if uuids::matches(uuid, &uuids::DESCRIPTOR_CLIENT_CHARACTERISTIC_CONFIGURATION) => {
                GattResponse::Value(super::topology::CCCD_NOTIFICATIONS_ENABLED.to_vec())
            }
            None => GattResponse::Value(Vec::new()),
        }
    }

    fn write_descriptor(
        &self,
        uuid: &Uuid,
        characteristic_props: CharacteristicProps,
        value: Vec<u8>,
        response_needed: bool,
    ) -> GattResponse {
        self.descriptor_cache
            .lock()
            .insert((characteristic_props, *uuid), value);
        if response_needed {
            GattResponse::Written
        } else {
            GattResponse::NoResponse
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::ReportKinds;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    static MAP: [u8; 4] = [1, 2, 3, 4];

    struct RecordingProfile {
        output_reports: Mutex<Vec<Vec<u8>>>,
        outputs_seen: AtomicUsize,
    }

    impl RecordingProfile {
        fn new() -> Self {
            Self {
                output_reports: Mutex::new(Vec::new()),
                outputs_seen: AtomicUsize::new(0),
            }
        }
    }

    impl HidProfile for RecordingProfile {
        fn report_map(&self) -> &'static [u8] {
            &MAP
        }

        fn report_kinds(&self) -> ReportKinds {
            ReportKinds::INPUT_AND_OUTPUT
        }

        fn data_rate(&self) -> Duration {
            Duration::from_millis(10)
        }

        fn handle_output_report(&self, report: &[u8]) {
            self.output_reports.lock().push(report.to_vec());
            self.outputs_seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<RecordingProfile>) {
        let profile = Arc::new(RecordingProfile::new());
        let mut config = Config::default();
        config.set_device_name("Model X");
        config.set_manufacturer("Acme");
        config.set_serial_number("0001");
        let dispatcher = Dispatcher::new(Arc::new(RwLock::new(config)), profile.clone());
        (dispatcher, profile)
    }

    #[test]
    fn test_hid_information_read() {
        let (dispatcher, _) = dispatcher();
        let response = dispatcher.dispatch(GattRequest::ReadCharacteristic {
            uuid: uuids::CHARACTERISTIC_HID_INFORMATION,
            offset: 0,
        });
        assert_eq!(response, GattResponse::Value(vec![0x11, 0x01, 0x00, 0x03]));
    }

    #[test]
    fn test_report_map_chunked_reads() {
        let (dispatcher, _) = dispatcher();
        let read = |offset| {
            dispatcher.dispatch(GattRequest::ReadCharacteristic {
                uuid: uuids::CHARACTERISTIC_REPORT_MAP,
                offset,
            })
        };
        assert_eq!(read(0), GattResponse::Value(vec![1, 2, 3, 4]));
        assert_eq!(read(2), GattResponse::Value(vec![3, 4]));
        assert_eq!(read(4), GattResponse::Value(Vec::new()));
        assert_eq!(read(100), GattResponse::Value(Vec::new()));
    }

    #[test]
    fn test_fixed_value_reads() {
        let (dispatcher, _) = dispatcher();
        let read = |uuid| {
            dispatcher.dispatch(GattRequest::ReadCharacteristic { uuid, offset: 0 })
        };
        assert_eq!(
            read(uuids::CHARACTERISTIC_HID_CONTROL_POINT),
            GattResponse::Value(vec![0])
        );
        assert_eq!(
            read(uuids::CHARACTERISTIC_REPORT),
            GattResponse::Value(Vec::new())
        );
        assert_eq!(
            read(uuids::CHARACTERISTIC_BATTERY_LEVEL),
            GattResponse::Value(vec![100])
        );
    }

    #[test]
    fn test_device_information_reads_config() {
        let (dispatcher, _) = dispatcher();
        let read = |uuid| {
            dispatcher.dispatch(GattRequest::ReadCharacteristic { uuid, offset: 0 })
        };
        assert_eq!(
            read(uuids::CHARACTERISTIC_MANUFACTURER_NAME),
            GattResponse::Value(b"Acme".to_vec())
        );
        assert_eq!(
            read(uuids::CHARACTERISTIC_MODEL_NUMBER),
            GattResponse::Value(b"Model X".to_vec())
        );
        assert_eq!(
            read(uuids::CHARACTERISTIC_SERIAL_NUMBER),
            GattResponse::Value(b"0001".to_vec())
        );
    }

    #[test]
    fn test_short_and_expanded_uuid_reads_agree() {
        let (dispatcher, _) = dispatcher();
        let expanded = Uuid::parse_str("00002a4a-0000-1000-8000-00805f9b34fb").unwrap();
        let response = dispatcher.dispatch(GattRequest::ReadCharacteristic {
            uuid: expanded,
            offset: 0,
        });
        assert_eq!(response, GattResponse::Value(HID_INFORMATION_VALUE.to_vec()));
    }

    #[test]
    fn test_protocol_mode_defaults_then_echoes_writes() {
        let (dispatcher, _) = dispatcher();
        let read = || {
            dispatcher.dispatch(GattRequest::ReadCharacteristic {
                uuid: uuids::CHARACTERISTIC_PROTOCOL_MODE,
                offset: 0,
            })
        };
        assert_eq!(read(), GattResponse::Value(vec![0x01]));

        let response = dispatcher.dispatch(GattRequest::WriteCharacteristic {
            uuid: uuids::CHARACTERISTIC_PROTOCOL_MODE,
            props: CharacteristicProps::READ_WRITE_WITHOUT_RESPONSE,
            value: vec![0x00],
            response_needed: false,
        });
        assert_eq!(response, GattResponse::NoResponse);
        assert_eq!(read(), GattResponse::Value(vec![0x00]));
    }

    #[test]
    fn test_output_report_write_reaches_profile() {
        let (dispatcher, profile) = dispatcher();
        let response = dispatcher.dispatch(GattRequest::WriteCharacteristic {
            uuid: uuids::CHARACTERISTIC_REPORT,
            props: CharacteristicProps::OUTPUT_REPORT,
            value: vec![0x02],
            response_needed: true,
        });
        assert_eq!(response, GattResponse::Written);
        assert_eq!(*profile.output_reports.lock(), vec![vec![0x02]]);
    }

    #[test]
    fn test_input_report_write_does_not_reach_profile() {
        let (dispatcher, profile) = dispatcher();
        dispatcher.dispatch(GattRequest::WriteCharacteristic {
            uuid: uuids::CHARACTERISTIC_REPORT,
            props: CharacteristicProps::INPUT_REPORT,
            value: vec![0x02],
            response_needed: true,
        });
        assert_eq!(profile.outputs_seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_report_reference_kinds() {
        let (dispatcher, _) = dispatcher();
        let read = |props| {
            dispatcher.dispatch(GattRequest::ReadDescriptor {
                uuid: uuids::DESCRIPTOR_REPORT_REFERENCE,
                characteristic_props: props,
            })
        };
        assert_eq!(
            read(CharacteristicProps::INPUT_REPORT),
            GattResponse::Value(vec![0, 1])
        );
        assert_eq!(
            read(CharacteristicProps::OUTPUT_REPORT),
            GattResponse::Value(vec![0, 2])
        );
        assert_eq!(
            read(CharacteristicProps::FEATURE_REPORT),
            GattResponse::Value(vec![0, 3])
        );
        assert_eq!(read(CharacteristicProps::READ), GattResponse::Failure);
    }

    #[test]
    fn test_cccd_write_then_read() {
        let (dispatcher, _) = dispatcher();
        let cccd = uuids::DESCRIPTOR_CLIENT_CHARACTERISTIC_CONFIGURATION;
        // Default is notifications enabled.
        assert_eq!(
            dispatcher.dispatch(GattRequest::ReadDescriptor {
                uuid: cccd,
                characteristic_props: CharacteristicProps::INPUT_REPORT,
            }),
            GattResponse::Value(vec![0x01, 0x00])
        );
        let response = dispatcher.dispatch(GattRequest::WriteDescriptor {
            uuid: cccd,
            characteristic_props: CharacteristicProps::INPUT_REPORT,
            value: vec![0x00, 0x00],
            response_needed: true,
        });
        assert_eq!(response, GattResponse::Written);
        assert_eq!(
            dispatcher.dispatch(GattRequest::ReadDescriptor {
                uuid: cccd,
                characteristic_props: CharacteristicProps::INPUT_REPORT,
            }),
            GattResponse::Value(vec![0x00, 0x00])
        );
    }

    #[test]
    fn test_cccd_slots_are_per_characteristic() {
        let (dispatcher, _) = dispatcher();
        let cccd = uuids::DESCRIPTOR_CLIENT_CHARACTERISTIC_CONFIGURATION;
        // Disabling battery notifications must not touch the input-report
        // CCCD, which shares the descriptor UUID.
        dispatcher.dispatch(GattRequest::WriteDescriptor {
            uuid: cccd,
            characteristic_props: CharacteristicProps::READ_NOTIFY,
            value: vec![0x00, 0x00],
            response_needed: true,
        });
        assert_eq!(
            dispatcher.dispatch(GattRequest::ReadDescriptor {
                uuid: cccd,
                characteristic_props: CharacteristicProps::INPUT_REPORT,
            }),
            GattResponse::Value(vec![0x01, 0x00])
        );
        assert_eq!(
            dispatcher.dispatch(GattRequest::ReadDescriptor {
                uuid: cccd,
                characteristic_props: CharacteristicProps::READ_NOTIFY,
            }),
            GattResponse::Value(vec![0x00, 0x00])
        );
    }
}
