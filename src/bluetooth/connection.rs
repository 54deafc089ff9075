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

//! Connection and bonding state tracking.
//!
//! Platform callbacks are modeled as [`LinkEvent`]s fed into a single
//! transition function; the function mutates the registry under one lock and
//! returns the [`LinkAction`]s the server layer must carry out. A device is
//! eligible for report delivery only while bonded and connected.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

/// Bonding axis of a remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondState {
    Unbonded,
    Bonding,
    Bonded,
}

/// Link axis of a remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
}

/// One remote central, keyed by its link-layer address.
#[derive(Debug, Clone)]
pub struct RemoteDevice {
    pub address: String,
    pub bond: BondState,
    pub link: LinkState,
}

impl RemoteDevice {
    fn new(address: &str) -> Self {
        Self {
            address: address.to_owned(),
            bond: BondState::Unbonded,
            link: LinkState::Disconnected,
        }
    }

    /// Eligible for report delivery.
    pub fn is_active(&self) -> bool {
        self.bond == BondState::Bonded && self.link == LinkState::Connected
    }
}

/// A platform callback, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link came up; `bonded` reflects the platform's pairing record.
    Connected { address: String, bonded: bool },
    /// The bonding handshake completed.
    BondEstablished { address: String },
    /// The link dropped.
    Disconnected { address: String },
}

/// Work the server layer owes after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Confirm the pairing request for this central.
    ConfirmPairing(String),
    /// Start the bonding handshake.
    CreateBond(String),
    /// (Re)establish the GATT connection.
    GattConnect(String),
}

/// Shared registry of remote devices.
///
/// The scheduler reads a point-in-time snapshot instead of iterating the
/// live map, so a concurrent disconnect never invalidates an in-flight
/// notification loop.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    devices: Mutex<HashMap<String, RemoteDevice>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the actions it demands.
    pub fn handle_event(&self, event: LinkEvent) -> Vec<LinkAction> {
        let mut devices = self.devices.lock();
        match event {
            LinkEvent::Connected { address, bonded } => {
                let device = devices
                    .entry(address.clone())
                    .or_insert_with(|| RemoteDevice::new(&address));
                device.link = LinkState::Connected;
                if bonded {
                    info!(%address, "bonded central connected");
                    device.bond = BondState::Bonded;
                    vec![LinkAction::GattConnect(address)]
                } else {
                    info!(%address, "unbonded central connected, requesting bond");
                    device.bond = BondState::Bonding;
                    vec![
                        LinkAction::ConfirmPairing(address.clone()),
                        LinkAction::CreateBond(address),
                    ]
                }
            }
            LinkEvent::BondEstablished { address } => {
                let device = devices
                    .entry(address.clone())
                    .or_insert_with(|| RemoteDevice::new(&address));
                info!(%address, "bond established");
                device.bond = BondState::Bonded;
                device.link = LinkState::Connected;
                vec![LinkAction::GattConnect(address)]
            }
            LinkEvent::Disconnected { address } => {
                if let Some(device) = devices.get_mut(&address) {
                    device.link = LinkState::Disconnected;
                }
                // Persistent reconnect: the peripheral re-establishes a
                // dropped link without waiting for the central.
                debug!(%address, "link dropped, reconnecting");
                vec![LinkAction::GattConnect(address)]
            }
        }
    }

    /// Addresses currently eligible for report delivery.
    pub fn snapshot(&self) -> Vec<String> {
        self.devices
            .lock()
            .values()
            .filter(|device| device.is_active())
            .map(|device| device.address.clone())
            .collect()
    }

    /// All known addresses, regardless of state.
    pub fn known_addresses(&self) -> Vec<String> {
        self.devices.lock().keys().cloned().collect()
    }

    /// Number of devices eligible for report delivery.
    pub fn active_count(&self) -> usize {
        self.devices
            .lock()
            .values()
            .filter(|device| device.is_active())
            .count()
    }
}
