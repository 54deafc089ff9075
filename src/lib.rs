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

//! BLE HID-over-GATT peripheral for Linux.
//!
//! Emulates a mouse, absolute mouse, keyboard or joystick towards any BLE
//! central that speaks the HID-over-GATT profile. Built on BlueZ via
//! [`bluer`]; each device variant wraps the shared [`HidPeripheral`] engine.
//!
//! ```no_run
//! use hogp::{Config, Mouse};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut mouse = Mouse::new(Config::load()?).await?;
//! mouse.start_advertising().await?;
//! mouse.move_pointer(10, 0, 0, false, false, false);
//! # Ok(())
//! # }
//! ```

pub mod bluetooth;
pub mod config;
pub mod error;
pub mod events;
pub mod hid;
pub mod peripheral;
pub mod report;

pub use config::Config;
pub use error::{Error, Result};
pub use hid::{AbsoluteMouse, Joystick, Keyboard, Mouse};
pub use peripheral::HidPeripheral;
pub use report::Report;
