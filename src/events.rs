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

//! Link event pump.
//!
//! Platform callbacks arrive as [`LinkEvent`]s on a channel; the pump runs
//! each through the registry's transition function and forwards the
//! resulting [`LinkAction`]s to the server layer. Single consumer, so
//! transitions are never re-entrant.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::bluetooth::{ConnectionRegistry, LinkAction, LinkEvent};

/// Consume link events until either channel closes.
pub async fn pump(
    mut events: mpsc::UnboundedReceiver<LinkEvent>,
    registry: Arc<ConnectionRegistry>,
    actions: mpsc::UnboundedSender<LinkAction>,
) {
    while let Some(event) = events.recv().await {
        debug!(?event, "link event");
        for action in registry.handle_event(event) {
            if actions.send(action).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pump_translates_events_into_actions() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        let pump_task = tokio::spawn(pump(event_rx, registry.clone(), action_tx));

        event_tx
            .send(LinkEvent::Connected {
                address: "AA:BB:CC:DD:EE:FF".to_owned(),
                bonded: false,
            })
            .unwrap();
        assert_eq!(
            action_rx.recv().await,
            Some(LinkAction::ConfirmPairing("AA:BB:CC:DD:EE:FF".to_owned()))
        );
        assert_eq!(
            action_rx.recv().await,
            Some(LinkAction::CreateBond("AA:BB:CC:DD:EE:FF".to_owned()))
        );

        event_tx
            .send(LinkEvent::BondEstablished {
                address: "AA:BB:CC:DD:EE:FF".to_owned(),
            })
            .unwrap();
        assert_eq!(
            action_rx.recv().await,
            Some(LinkAction::GattConnect("AA:BB:CC:DD:EE:FF".to_owned()))
        );
        assert_eq!(registry.active_count(), 1);

        drop(event_tx);
        pump_task.await.unwrap();
    }

    #[tokio::test]
    async fn test_pump_stops_when_action_channel_closes() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        drop(action_rx);

        let pump_task = tokio::spawn(pump(event_rx, registry, action_tx));
        event_tx
            .send(LinkEvent::Disconnected {
                address: "AA:BB:CC:DD:EE:FF".to_owned(),
            })
            .unwrap();
        pump_task.await.unwrap();
    }
}
