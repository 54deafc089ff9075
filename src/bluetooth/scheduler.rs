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

//! Periodic report delivery.
//!
//! Each tick drains at most one report from the queue, updates the Input
//! Report value, and notifies every active central. A backlog drains over
//! subsequent ticks; a per-device notification failure never affects the
//! other devices or the next tick.

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::connection::ConnectionRegistry;
use crate::report::ReportQueue;

/// Sink for input-report notifications, one call per active device.
pub trait Notifier: Send + Sync {
    fn notify(&self, address: &str, value: &[u8]) -> Result<()>;

    /// True when one send already reaches every subscribed central because
    /// the transport fans the notification out itself. The scheduler then
    /// sends once per tick instead of once per device.
    fn broadcasts(&self) -> bool {
        false
    }
}

/// Drives report delivery at the device variant's data rate.
pub struct Scheduler {
    queue: Arc<ReportQueue>,
    registry: Arc<ConnectionRegistry>,
    notifier: Arc<dyn Notifier>,
    /// Cached value of the Input Report characteristic.
    input_value: Arc<Mutex<Vec<u8>>>,
}

impl Scheduler {
    pub fn new(
        queue: Arc<ReportQueue>,
        registry: Arc<ConnectionRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            queue,
            registry,
            notifier,
            input_value: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The cached Input Report value, shared with the server layer.
    pub fn input_value(&self) -> Arc<Mutex<Vec<u8>>> {
        self.input_value.clone()
    }

    /// Run one tick. Returns the number of notifications attempted.
    pub fn tick(&self) -> usize {
        let Some(report) = self.queue.drain_one() else {
            return 0;
        };
        *self.input_value.lock() = report.as_bytes().to_vec();

        let addresses = self.registry.snapshot();
        let targets = if self.notifier.broadcasts() {
            // One send covers every subscriber.
            &addresses[..addresses.len().min(1)]
        } else {
            &addresses[..]
        };
        let mut sent = 0;
        for address in targets {
            match self.notifier.notify(address, report.as_bytes()) {
                Ok(()) => {
                    trace!(%address, len = report.len(), "report notified");
                    sent += 1;
                }
                // Central briefly unreachable; the remaining devices and
                // future ticks are unaffected.
                Err(err) => warn!(%address, %err, "notification failed"),
            }
        }
        sent
    }

    /// Spawn the periodic tick loop. Aborted by dropping the handle owner.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick();
            }
        })
    }
}
