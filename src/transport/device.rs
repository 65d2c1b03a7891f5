//! The seam between the transport and the host's USB device access.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TransportError;

/// A USB vendor/product pair the transport will accept as a bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceFilter {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

/// Arduino Leonardo (and compatibles) acting as DMX bridges.
pub const DEFAULT_DEVICE_FILTERS: &[DeviceFilter] = &[
    // Arduino LLC
    DeviceFilter::new(0x2341, 0x8036),
    DeviceFilter::new(0x2341, 0x8037),
    // Arduino SRL, Leonardo ETH
    DeviceFilter::new(0x2a03, 0x8040),
];

/// A bridge device visible to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Host path used to open the device.
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl DeviceInfo {
    pub fn matches_any(&self, filters: &[DeviceFilter]) -> bool {
        filters
            .iter()
            .any(|f| f.matches(self.vendor_id, self.product_id))
    }
}

impl Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:04x}:{:04x}",
            self.path, self.vendor_id, self.product_id
        )?;
        if let Some(product) = &self.product {
            write!(f, " {product}")?;
        }
        if let Some(serial) = &self.serial_number {
            write!(f, " #{serial}")?;
        }
        write!(f, ")")
    }
}

/// Host-side discovery and opening of bridge devices.
pub trait DeviceProvider: Send + Sync {
    /// Matching devices the host has already granted access to.
    fn approved_devices(&self, filters: &[DeviceFilter]) -> Result<Vec<DeviceInfo>, TransportError>;

    /// Ask the host to select a matching device.
    /// This may block on user confirmation.
    fn request_device(&self, filters: &[DeviceFilter]) -> Result<DeviceInfo, TransportError>;

    /// Open a connection to the device.
    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Bridge>, TransportError>;
}

/// An open connection to a bridge.
/// Dropping it closes the connection.
pub trait Bridge: Send {
    /// Write one complete, already-framed universe.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), BridgeError>;

    /// Check on the device while no frames are being sent.
    /// Any data the device sends us is consumed here.
    fn check(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The device is gone; the connection cannot be used again.
    #[error("device disconnected: {0}")]
    Disconnected(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_filter_matching() {
        let leonardo = DeviceInfo {
            path: "/dev/ttyACM0".to_string(),
            vendor_id: 0x2341,
            product_id: 0x8036,
            product: Some("Arduino Leonardo".to_string()),
            serial_number: None,
        };
        assert!(leonardo.matches_any(DEFAULT_DEVICE_FILTERS));
        assert!(!leonardo.matches_any(&[DeviceFilter::new(0x0403, 0x6001)]));
        assert!(!leonardo.matches_any(&[]));
        assert_eq!(
            "/dev/ttyACM0 (2341:8036 Arduino Leonardo)",
            leonardo.to_string()
        );
    }
}
