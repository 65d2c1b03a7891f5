//! Connection to a USB DMX bridge.

use std::time::Duration;

use crossbeam_channel::Sender;
use log::error;
use serde::Deserialize;
use strum_macros::Display as EnumDisplay;
use thiserror::Error;

mod device;
mod frame;
mod serial;
#[cfg(test)]
pub(crate) mod mock;
mod usb;

pub use device::{
    Bridge, BridgeError, DeviceFilter, DeviceInfo, DeviceProvider, DEFAULT_DEVICE_FILTERS,
};
pub use frame::Driver;
pub use serial::{SerialBridge, SerialDeviceProvider};
pub use usb::UsbTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumDisplay)]
pub enum ConnectionState {
    Disconnected,
    /// Waiting for the host to select a device, or re-pairing with an approved one.
    Pairing,
    Connected,
    /// A connection attempt just failed; always resolves to Disconnected.
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no DMX bridge found: {0}")]
    DeviceNotFound(String),
    #[error("DMX bridge disconnected: {0}")]
    DeviceDisconnected(String),
    #[error("failed to send DMX frame: {0}")]
    SendFailure(String),
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: ConnectionState,
    },
}

/// Notifications surfaced by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    StateChanged(ConnectionState),
    Error(TransportError),
}

/// Receive connection notifications.
///
/// Called from transport worker threads while the connection state is locked;
/// implementations must not call back into the transport.
pub trait EmitConnectionEvent: Send + Sync {
    fn emit_connection_event(&self, event: ConnectionEvent);
}

impl EmitConnectionEvent for Sender<ConnectionEvent> {
    fn emit_connection_event(&self, event: ConnectionEvent) {
        if self.send(event).is_err() {
            error!("Connection event channel is disconnected.");
        }
    }
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_poll_interval_ms() -> u64 {
    250
}

/// Shortest wait between idle bridge checks.
const MIN_POLL_INTERVAL_MS: u64 = 10;

fn default_device_filters() -> Vec<DeviceFilter> {
    DEFAULT_DEVICE_FILTERS.to_vec()
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub driver: Driver,
    /// Baud rate for serial bridges; ignored by native USB CDC devices.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// How often to check on an idle bridge.
    /// Values below 10 ms are raised to 10 ms.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Connect to a single previously approved bridge at startup.
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    /// USB vendor/product pairs accepted as bridges.
    #[serde(default = "default_device_filters")]
    pub devices: Vec<DeviceFilter>,
}

impl TransportConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            driver: Driver::default(),
            baud_rate: default_baud_rate(),
            poll_interval_ms: default_poll_interval_ms(),
            auto_connect: true,
            devices: default_device_filters(),
        }
    }
}
