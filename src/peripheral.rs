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

//! The variant-agnostic peripheral engine.
//!
//! Wires together the GATT server, the request dispatcher, the connection
//! registry, the link event pump and the report scheduler. Device variants
//! supply behavior through [`HidProfile`] and push reports into the queue;
//! everything else runs on background tasks owned by this type.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bluetooth::{
    build_topology, ConnectionRegistry, Dispatcher, GattServer, Scheduler,
};
use crate::config::Config;
use crate::error::Result;
use crate::events;
use crate::hid::HidProfile;
use crate::report::{Report, ReportQueue};

/// A running BLE HID peripheral.
pub struct HidPeripheral {
    config: Arc<RwLock<Config>>,
    queue: Arc<ReportQueue>,
    registry: Arc<ConnectionRegistry>,
    server: GattServer,
    appearance: u16,
    tasks: Vec<JoinHandle<()>>,
}

impl HidPeripheral {
    /// Construct and register the peripheral for one device variant.
    ///
    /// Fails only on environment problems: no adapter, adapter powered off,
    /// or GATT registration refused past the retry cap. On success all
    /// background tasks are running and the peripheral only awaits
    /// [`start_advertising`](Self::start_advertising).
    pub async fn new(profile: Arc<dyn HidProfile>, config: Config) -> Result<Self> {
        let config = Arc::new(RwLock::new(config));
        let dispatcher = Arc::new(Dispatcher::new(config.clone(), profile.clone()));

        let mut server = GattServer::new(dispatcher).await?;
        let topology = build_topology(profile.report_kinds());
        server.register(&topology).await?;

        let queue = Arc::new(ReportQueue::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let scheduler = Arc::new(Scheduler::new(
            queue.clone(),
            registry.clone(),
            server.notifier(),
        ));

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let tasks = vec![
            server.spawn_link_watcher(event_tx),
            server.spawn_action_executor(action_rx),
            tokio::spawn(events::pump(event_rx, registry.clone(), action_tx)),
            scheduler.spawn(profile.data_rate()),
        ];

        info!(name = %config.read().device_name, "peripheral ready");
        Ok(Self {
            config,
            queue,
            registry,
            server,
            appearance: profile.appearance(),
            tasks,
        })
    }

    /// Enqueue one input report for delivery on the next scheduler tick.
    /// Never blocks.
    pub fn add_input_report(&self, report: Report) {
        self.queue.push(report);
    }

    /// Start advertising the HID, Device Information and Battery services.
    pub async fn start_advertising(&mut self) -> Result<()> {
        let name = self.config.read().device_name.clone();
        self.server.start_advertising(&name, self.appearance).await
    }

    /// Stop advertising, disconnect every central and release the GATT
    /// application. Best effort; a radio that already went away does not
    /// fail the shutdown.
    pub async fn stop_advertising(&mut self) {
        let addresses = self.registry.known_addresses();
        self.server.stop(&addresses).await;
    }

    /// Rename the device as seen by centrals. Truncated to 20 UTF-8 bytes.
    pub fn set_device_name(&self, name: &str) {
        self.config.write().set_device_name(name);
    }

    /// Set the manufacturer string. Truncated to 20 UTF-8 bytes.
    pub fn set_manufacturer(&self, manufacturer: &str) {
        self.config.write().set_manufacturer(manufacturer);
    }

    /// Set the serial number string. Truncated to 20 UTF-8 bytes.
    pub fn set_serial_number(&self, serial_number: &str) {
        self.config.write().set_serial_number(serial_number);
    }

    /// Number of reports waiting for delivery.
    pub fn queued_reports(&self) -> usize {
        self.queue.len()
    }

    /// Number of centrals currently eligible for delivery.
    pub fn active_devices(&self) -> usize {
        self.registry.active_count()
    }
}

impl Drop for HidPeripheral {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
