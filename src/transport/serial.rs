//! Bridges that enumerate as USB serial ports (Arduino CDC, FTDI, Enttec).

use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, info};
use serialport::{SerialPort, SerialPortType};

use super::device::{Bridge, BridgeError, DeviceFilter, DeviceInfo, DeviceProvider};
use super::TransportError;

const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Find and open bridges through the host's serial port enumeration.
///
/// Every present port whose USB ids pass the filter counts as approved: the
/// operating system has already granted access to it. This provider never
/// prompts; choosing between several bridges is up to the caller, who then
/// pairs with the chosen device directly.
pub struct SerialDeviceProvider {
    baud_rate: u32,
}

impl SerialDeviceProvider {
    pub fn new(baud_rate: u32) -> Self {
        Self { baud_rate }
    }
}

impl DeviceProvider for SerialDeviceProvider {
    fn approved_devices(&self, filters: &[DeviceFilter]) -> Result<Vec<DeviceInfo>, TransportError> {
        let ports = serialport::available_ports()
            .map_err(|e| TransportError::DeviceNotFound(e.to_string()))?;
        Ok(ports
            .into_iter()
            .filter_map(|port| match port.port_type {
                SerialPortType::UsbPort(usb) => Some(DeviceInfo {
                    path: port.port_name,
                    vendor_id: usb.vid,
                    product_id: usb.pid,
                    product: usb.product,
                    serial_number: usb.serial_number,
                }),
                _ => None,
            })
            .filter(|device| device.matches_any(filters))
            .collect())
    }

    fn request_device(&self, filters: &[DeviceFilter]) -> Result<DeviceInfo, TransportError> {
        let mut candidates = self.approved_devices(filters)?;
        match candidates.len() {
            0 => Err(TransportError::DeviceNotFound(
                "no connected USB device matches the accepted vendor/product ids".to_string(),
            )),
            1 => Ok(candidates.remove(0)),
            n => Err(TransportError::DeviceNotFound(format!(
                "{n} matching devices; choose one to pair with"
            ))),
        }
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn Bridge>, TransportError> {
        let port = serialport::new(&device.path, self.baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| TransportError::DeviceNotFound(format!("{}: {e}", device.path)))?;
        info!("Opened DMX bridge {device}.");
        Ok(Box::new(SerialBridge { port }))
    }
}

pub struct SerialBridge {
    port: Box<dyn SerialPort>,
}

impl Bridge for SerialBridge {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), BridgeError> {
        self.port
            .write_all(frame)
            .and_then(|_| self.port.flush())
            .map_err(classify_io_error)
    }

    fn check(&mut self) -> Result<(), BridgeError> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => BridgeError::Disconnected(e.to_string()),
                serialport::ErrorKind::Io(kind) => classify_io_error(io::Error::new(kind, e)),
                _ => BridgeError::Io(io::Error::new(io::ErrorKind::Other, e)),
            })?;
        if pending > 0 {
            let mut buf = vec![0u8; pending as usize];
            let read = self.port.read(&mut buf).map_err(classify_io_error)?;
            debug!("Bridge sent {read} bytes: {:?}", &buf[..read]);
        }
        Ok(())
    }
}

/// Errors that mean the device has gone away, as opposed to a single failed write.
fn classify_io_error(err: io::Error) -> BridgeError {
    use io::ErrorKind::*;
    match err.kind() {
        BrokenPipe | NotConnected | ConnectionAborted | ConnectionReset | NotFound
        | PermissionDenied => BridgeError::Disconnected(err.to_string()),
        _ => BridgeError::Io(err),
    }
}
