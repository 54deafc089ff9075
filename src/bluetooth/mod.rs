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

//! Bluetooth layer.
//!
//! Topology and dispatch are pure and testable; `gatt_server` is the only
//! module that talks to BlueZ.

pub mod connection;
pub mod dispatcher;
pub mod gatt_server;
pub mod scheduler;
pub mod topology;
pub mod uuids;

pub use connection::{BondState, ConnectionRegistry, LinkAction, LinkEvent, LinkState, RemoteDevice};
pub use dispatcher::{Dispatcher, GattRequest, GattResponse};
pub use gatt_server::GattServer;
pub use scheduler::{Notifier, Scheduler};
pub use topology::{build_topology, CharacteristicProps, ReportKind, ServiceSpec};
