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

//! BlueZ-backed GATT server.
//!
//! Turns the topology into a live GATT application, routes every read and
//! write through the [`Dispatcher`], and translates BlueZ device events into
//! [`LinkEvent`]s for the registry. Pairing confirmations are auto-accepted
//! by a registered agent so bonding completes without user interaction.

use anyhow::Result as AnyResult;
use bluer::adv::{Advertisement, AdvertisementHandle, Type};
use bluer::agent::{Agent, AgentHandle};
use bluer::gatt::local::{
    Application, ApplicationHandle, Characteristic, CharacteristicNotify,
    CharacteristicNotifyMethod, CharacteristicRead, CharacteristicWrite, CharacteristicWriteMethod,
    Descriptor, DescriptorRead, DescriptorWrite, ReqError, Service,
};
use bluer::{Adapter, AdapterEvent, Address, DeviceEvent, DeviceProperty, Session};
use futures::{pin_mut, StreamExt};
use parking_lot::Mutex;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::connection::{LinkAction, LinkEvent};
use super::dispatcher::{Dispatcher, GattRequest, GattResponse};
use super::scheduler::Notifier;
use super::topology::{CharacteristicProps, CharacteristicSpec, DescriptorSpec, ServiceSpec};
use super::uuids;
use crate::error::{Error, Result};

/// Registration against BlueZ can transiently fail while a prior
/// registration settles; retry up to this many times.
const REGISTRATION_ATTEMPTS: u32 = 16;
const REGISTRATION_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Slot holding the sender of the live input-report notification session.
///
/// A central that reconnects resubscribes before the old session observes
/// its channel closing, so the slot can already belong to a newer session
/// by the time a stale one winds down. Closing therefore only clears the
/// slot when the departing session still owns it.
pub struct NotifyChannel {
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
}

impl NotifyChannel {
    fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    /// Install a fresh session, displacing any previous sender.
    fn open(&self) -> (mpsc::UnboundedSender<Vec<u8>>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tx.lock() = Some(tx.clone());
        (tx, rx)
    }

    /// Release the slot, unless a newer session already took it over.
    fn close(&self, tx: &mpsc::UnboundedSender<Vec<u8>>) {
        let mut guard = self.tx.lock();
        if guard.as_ref().is_some_and(|current| current.same_channel(tx)) {
            *guard = None;
        }
    }

    fn send(&self, value: &[u8]) -> AnyResult<()> {
        match self.tx.lock().as_ref() {
            Some(tx) => tx
                .send(value.to_vec())
                .map_err(|_| anyhow::anyhow!("notification session closed")),
            None => Err(anyhow::anyhow!("no central subscribed")),
        }
    }
}

/// Sends input-report values into the live notification session.
///
/// BlueZ fans a characteristic notification out to every subscribed central
/// itself, so the per-address sink feeds a single channel and the scheduler
/// sends once per tick.
pub struct BluerNotifier {
    channel: Arc<NotifyChannel>,
}

impl Notifier for BluerNotifier {
    fn notify(&self, address: &str, value: &[u8]) -> AnyResult<()> {
        self.channel.send(value)?;
        debug!(%address, len = value.len(), "notification queued");
        Ok(())
    }

    fn broadcasts(&self) -> bool {
        true
    }
}

/// BlueZ GATT server hosting the HID application.
pub struct GattServer {
    _session: Session,
    adapter: Adapter,
    dispatcher: Arc<Dispatcher>,
    notify_channel: Arc<NotifyChannel>,
    _agent_handle: AgentHandle,
    _adv_handle: Option<AdvertisementHandle>,
    _app_handle: Option<ApplicationHandle>,
}

impl GattServer {
    /// Connect to BlueZ and validate the adapter. Fails hard when the
    /// environment cannot host a BLE peripheral.
    pub async fn new(dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let session = Session::new().await.map_err(Error::AdapterUnavailable)?;
        let adapter = session
            .default_adapter()
            .await
            .map_err(Error::AdapterUnavailable)?;
        let adapter_name = adapter.name().to_owned();
        info!(adapter = %adapter_name, "using Bluetooth adapter");

        if !adapter.is_powered().await? {
            return Err(Error::AdapterDisabled(adapter_name));
        }

        // Auto-confirm pairing so bonding completes without interaction.
        let agent = Agent {
            request_confirmation: Some(Box::new(|req| {
                Box::pin(async move {
                    info!(device = %req.device, "confirming pairing request");
                    Ok(())
                })
            })),
            request_authorization: Some(Box::new(|req| {
                Box::pin(async move {
                    info!(device = %req.device, "authorizing pairing request");
                    Ok(())
                })
            })),
            ..Default::default()
        };
        let agent_handle = session.register_agent(agent).await?;

        Ok(Self {
            _session: session,
            adapter,
            dispatcher,
            notify_channel: Arc::new(NotifyChannel::new()),
            _agent_handle: agent_handle,
            _adv_handle: None,
            _app_handle: None,
        })
    }

    /// Sink the scheduler uses to deliver input reports.
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::new(BluerNotifier {
            channel: self.notify_channel.clone(),
        })
    }

    /// Register the GATT application, retrying transient failures.
    pub async fn register(&mut self, topology: &[ServiceSpec]) -> Result<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let app = self.build_application(topology);
            match self.adapter.serve_gatt_application(app).await {
                Ok(handle) => {
                    self._app_handle = Some(handle);
                    info!(attempt, "GATT application registered");
                    return Ok(());
                }
                Err(source) if attempt < REGISTRATION_ATTEMPTS => {
                    debug!(attempt, %source, "GATT registration failed, retrying");
                    tokio::time::sleep(REGISTRATION_RETRY_DELAY).await;
                }
                Err(source) => {
                    return Err(Error::GattRegistration {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    fn build_application(&self, topology: &[ServiceSpec]) -> Application {
        let services = topology
            .iter()
            .map(|spec| Service {
                uuid: spec.uuid,
                primary: true,
                characteristics: spec
                    .characteristics
                    .iter()
                    .map(|c| self.build_characteristic(c))
                    .collect(),
                ..Default::default()
            })
            .collect();
        Application {
            services,
            ..Default::default()
        }
    }

    fn build_characteristic(&self, spec: &CharacteristicSpec) -> Characteristic {
        let uuid = spec.uuid;
        let props = spec.props;

        let read = (props.read).then(|| {
            let dispatcher = self.dispatcher.clone();
            CharacteristicRead {
                read: true,
                encrypt_read: spec.encrypted,
                fun: Box::new(move |req| {
                    let dispatcher = dispatcher.clone();
                    Box::pin(async move {
                        let response = dispatcher.dispatch(GattRequest::ReadCharacteristic {
                            uuid,
                            offset: req.offset as usize,
                        });
                        into_read_result(response)
                    })
                }),
                ..Default::default()
            }
        });

        let write = (props.write || props.write_without_response).then(|| {
            let dispatcher = self.dispatcher.clone();
            CharacteristicWrite {
                write: props.write,
                write_without_response: props.write_without_response,
                method: CharacteristicWriteMethod::Fun(Box::new(move |value, _req| {
                    let dispatcher = dispatcher.clone();
                    Box::pin(async move {
                        let response = dispatcher.dispatch(GattRequest::WriteCharacteristic {
                            uuid,
                            props,
                            value,
                            response_needed: true,
                        });
                        into_write_result(response)
                    })
                })),
                ..Default::default()
            }
        });

        let notify = props.notify.then(|| {
            let is_input_report = uuids::matches(&uuid, &uuids::CHARACTERISTIC_REPORT);
            let channel = self.notify_channel.clone();
            CharacteristicNotify {
                notify: true,
                method: CharacteristicNotifyMethod::Fun(Box::new(move |mut notifier| {
                    let channel = channel.clone();
                    Box::pin(async move {
                        if !is_input_report {
                            // Battery level never changes; nothing to push.
                            debug!("notification session on static characteristic");
                            return;
                        }
                        let (tx, mut rx) = channel.open();
                        debug!("input report notification session started");
                        while let Some(value) = rx.recv().await {
                            if let Err(err) = notifier.notify(value).await {
                                warn!(%err, "input report notification failed");
                                break;
                            }
                        }
                        channel.close(&tx);
                        debug!("input report notification session ended");
                    })
                })),
                ..Default::default()
            }
        });

        let descriptors = spec
            .descriptors
            .iter()
            .map(|d| self.build_descriptor(d, props))
            .collect();

        Characteristic {
            uuid,
            read,
            write,
            notify,
            descriptors,
            ..Default::default()
        }
    }

    fn build_descriptor(
        &self,
        spec: &DescriptorSpec,
        characteristic_props: CharacteristicProps,
    ) -> Descriptor {
        let uuid = spec.uuid;

        let read = {
            let dispatcher = self.dispatcher.clone();
            Some(DescriptorRead {
                read: true,
                fun: Box::new(move |_req| {
                    let dispatcher = dispatcher.clone();
                    Box::pin(async move {
                        let response = dispatcher.dispatch(GattRequest::ReadDescriptor {
                            uuid,
                            characteristic_props,
                        });
                        into_read_result(response)
                    })
                }),
                ..Default::default()
            })
        };

        let write = spec.writable.then(|| {
            let dispatcher = self.dispatcher.clone();
            DescriptorWrite {
                write: true,
                fun: Box::new(move |value, _req| {
                    let dispatcher = dispatcher.clone();
                    Box::pin(async move {
                        let response = dispatcher.dispatch(GattRequest::WriteDescriptor {
                            uuid,
                            characteristic_props,
                            value,
                            response_needed: true,
                        });
                        into_write_result(response)
                    })
                }),
                ..Default::default()
            }
        });

        Descriptor {
            uuid,
            read,
            write,
            ..Default::default()
        }
    }

    /// Start advertising all three services, connectable and indefinite.
    pub async fn start_advertising(&mut self, local_name: &str, appearance: u16) -> Result<()> {
        let advertisement = Advertisement {
            advertisement_type: Type::Peripheral,
            service_uuids: [
                uuids::SERVICE_DEVICE_INFORMATION,
                uuids::SERVICE_BLE_HID,
                uuids::SERVICE_BATTERY,
            ]
            .into_iter()
            .collect(),
            discoverable: Some(true),
            local_name: Some(local_name.to_owned()),
            appearance: Some(appearance),
            ..Default::default()
        };
        self._adv_handle = Some(self.adapter.advertise(advertisement).await?);
        info!(name = %local_name, "advertising started");
        Ok(())
    }

    /// Stop advertising, drop every link, release the application.
    ///
    /// Best effort throughout: failures because the radio already went away
    /// are swallowed and shutdown still succeeds.
    pub async fn stop(&mut self, addresses: &[String]) {
        self._adv_handle = None;
        for address in addresses {
            match self.device(address) {
                Ok(device) => {
                    if let Err(err) = device.disconnect().await {
                        debug!(%address, %err, "disconnect at shutdown failed");
                    }
                }
                Err(err) => debug!(%address, %err, "unknown device at shutdown"),
            }
        }
        self._app_handle = None;
        info!("GATT server stopped");
    }

    fn device(&self, address: &str) -> Result<bluer::Device> {
        let address = Address::from_str(address)?;
        Ok(self.adapter.device(address)?)
    }

    /// Watch adapter and device events, translating them into link events.
    pub fn spawn_link_watcher(
        &self,
        event_tx: mpsc::UnboundedSender<LinkEvent>,
    ) -> JoinHandle<()> {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            let adapter_events = match adapter.discover_devices().await {
                Ok(events) => events,
                Err(err) => {
                    warn!(%err, "device discovery unavailable");
                    return;
                }
            };
            pin_mut!(adapter_events);
            while let Some(event) = adapter_events.next().await {
                if let AdapterEvent::DeviceAdded(address) = event {
                    let adapter = adapter.clone();
                    let event_tx = event_tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = watch_device(adapter, address, event_tx).await {
                            debug!(%address, %err, "device watcher ended");
                        }
                    });
                }
            }
        })
    }

    /// Carry out the actions the state machine demands.
    pub fn spawn_action_executor(
        &self,
        mut action_rx: mpsc::UnboundedReceiver<LinkAction>,
    ) -> JoinHandle<()> {
        let adapter = self.adapter.clone();
        tokio::spawn(async move {
            while let Some(action) = action_rx.recv().await {
                if let Err(err) = execute_action(&adapter, &action).await {
                    // Transient: the central may already be gone or the
                    // platform still settling.
                    debug!(?action, %err, "link action failed");
                }
            }
        })
    }
}

fn into_read_result(response: GattResponse) -> std::result::Result<Vec<u8>, ReqError> {
    match response {
        GattResponse::Value(value) => Ok(value),
        _ => Err(ReqError::Failed),
    }
}

fn into_write_result(response: GattResponse) -> std::result::Result<(), ReqError> {
    match response {
        GattResponse::Written | GattResponse::NoResponse => Ok(()),
        _ => Err(ReqError::Failed),
    }
}

async fn watch_device(
    adapter: Adapter,
    address: Address,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
) -> AnyResult<()> {
    let device = adapter.device(address)?;
    let events = device.events().await?;
    pin_mut!(events);
    while let Some(DeviceEvent::PropertyChanged(property)) = events.next().await {
        let event = match property {
            DeviceProperty::Connected(true) => LinkEvent::Connected {
                address: address.to_string(),
                bonded: device.is_paired().await.unwrap_or(false),
            },
            DeviceProperty::Connected(false) => LinkEvent::Disconnected {
                address: address.to_string(),
            },
            DeviceProperty::Paired(true) => LinkEvent::BondEstablished {
                address: address.to_string(),
            },
            _ => continue,
        };
        if event_tx.send(event).is_err() {
            break;
        }
    }
    Ok(())
}

async fn execute_action(adapter: &Adapter, action: &LinkAction) -> AnyResult<()> {
    match action {
        // The registered agent already confirms pairing requests.
        LinkAction::ConfirmPairing(address) => {
            debug!(%address, "pairing confirmation handled by agent");
            Ok(())
        }
        LinkAction::CreateBond(address) => {
            let device = adapter.device(Address::from_str(address)?)?;
            if !device.is_paired().await? {
                device.pair().await?;
            }
            Ok(())
        }
        LinkAction::GattConnect(address) => {
            let device = adapter.device(Address::from_str(address)?)?;
            if !device.is_connected().await? {
                device.connect().await?;
            }
            Ok(())
        }
    }
}
