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

//! Error types for the peripheral.
//!
//! Only environment problems detected while constructing a peripheral are
//! surfaced to callers. Transient registration and notification failures are
//! handled internally and never reach this type.

use thiserror::Error;

/// Errors surfaced by peripheral construction and lifecycle operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No Bluetooth adapter could be obtained from BlueZ.
    #[error("no Bluetooth adapter is available")]
    AdapterUnavailable(#[source] bluer::Error),

    /// The adapter exists but is powered off.
    #[error("Bluetooth adapter '{0}' is powered off")]
    AdapterDisabled(String),

    /// Registering the GATT application kept failing past the retry cap.
    #[error("GATT application registration failed after {attempts} attempts")]
    GattRegistration {
        attempts: u32,
        #[source]
        source: bluer::Error,
    },

    /// A stored device address failed to parse.
    #[error("invalid device address")]
    InvalidAddress(#[from] bluer::InvalidAddress),

    /// Any other BlueZ failure during setup.
    #[error(transparent)]
    Bluetooth(#[from] bluer::Error),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
