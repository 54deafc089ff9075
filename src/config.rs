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

//! Peripheral identity configuration.
//!
//! The Device Information Service exposes these strings to the central. Each
//! value is capped at 20 UTF-8 bytes; longer values are truncated at a
//! character boundary so a multi-byte code point is never split.

use anyhow::Result;
use gethostname::gethostname;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum length in bytes of each Device Information string.
pub const DEVICE_INFO_MAX_LENGTH: usize = 20;

/// Get a sanitized hostname suitable for a Bluetooth device name.
/// Bluetooth names should only contain alphanumeric chars, spaces, and hyphens.
fn get_sanitized_hostname() -> String {
    let hostname = gethostname().to_string_lossy().to_string();
    let sanitized: String = hostname
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == ' ' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        "BLE HID".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Truncate to at most `max` bytes without splitting a code point.
fn truncate_utf8(value: &str, max: usize) -> String {
    if value.len() <= max {
        return value.to_string();
    }
    let mut end = max;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// Identity strings served by the Device Information Service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device name, also used as the advertised local name.
    pub device_name: String,

    /// Manufacturer Name characteristic value.
    pub manufacturer: String,

    /// Serial Number characteristic value.
    pub serial_number: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: truncate_utf8(&get_sanitized_hostname(), DEVICE_INFO_MAX_LENGTH),
            manufacturer: "hogp project".to_string(),
            serial_number: "12345678".to_string(),
        }
    }
}

impl Config {
    /// Set the device name, truncated to 20 bytes.
    pub fn set_device_name(&mut self, name: &str) {
        self.device_name = truncate_utf8(name, DEVICE_INFO_MAX_LENGTH);
    }

    /// Set the manufacturer name, truncated to 20 bytes.
    pub fn set_manufacturer(&mut self, name: &str) {
        self.manufacturer = truncate_utf8(name, DEVICE_INFO_MAX_LENGTH);
    }

    /// Set the serial number, truncated to 20 bytes.
    pub fn set_serial_number(&mut self, serial: &str) {
        self.serial_number = truncate_utf8(serial, DEVICE_INFO_MAX_LENGTH);
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hogp")
            .join("config.toml")
    }

    /// Load configuration from the default location or create the default.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `config_path`, writing defaults if missing.
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&config_path, content)?;
            config
        };

        // Values from the file go through the same length cap as setters.
        config.set_device_name(&config.device_name.clone());
        config.set_manufacturer(&config.manufacturer.clone());
        config.set_serial_number(&config.serial_number.clone());

        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}
