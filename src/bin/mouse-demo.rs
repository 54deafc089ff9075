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

//! Demo: advertise a BLE mouse and wiggle the pointer until Ctrl-C.

use anyhow::Result;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hogp::{Config, Mouse};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hogp=info".parse().unwrap()),
        )
        .init();

    info!("Starting BLE mouse demo v{}...", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Advertising as '{}'", config.device_name);

    let mut mouse = Mouse::new(config).await?;
    mouse.start_advertising().await?;

    let mut interval = tokio::time::interval(Duration::from_millis(500));
    let mut direction = 1i32;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                mouse.move_pointer(direction * 20, 0, 0, false, false, false);
                direction = -direction;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutting down");
    mouse.stop_advertising().await;

    Ok(())
}
