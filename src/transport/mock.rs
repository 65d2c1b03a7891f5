//! In-memory bridge used to exercise the transport without hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::device::{Bridge, BridgeError, DeviceFilter, DeviceInfo, DeviceProvider};
use super::TransportError;

pub fn device(path: &str) -> DeviceInfo {
    DeviceInfo {
        path: path.to_string(),
        vendor_id: 0x2341,
        product_id: 0x8036,
        product: Some("Mock Leonardo".to_string()),
        serial_number: None,
    }
}

/// Handles for observing and disturbing the mock from a test.
#[derive(Clone)]
pub struct MockHandle {
    pub frames: Receiver<Vec<u8>>,
    unplugged: Arc<AtomicBool>,
    failing_writes: Arc<AtomicBool>,
}

impl MockHandle {
    /// Simulate the device being unplugged.
    pub fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
    }

    /// Make every write fail without losing the device.
    pub fn fail_writes(&self, fail: bool) {
        self.failing_writes.store(fail, Ordering::SeqCst);
    }
}

pub struct MockProvider {
    pub approved: Vec<DeviceInfo>,
    /// The device the "user" picks when asked; None cancels the selection.
    pub selection: Option<DeviceInfo>,
    frames: Sender<Vec<u8>>,
    unplugged: Arc<AtomicBool>,
    failing_writes: Arc<AtomicBool>,
}

impl MockProvider {
    pub fn new(approved: Vec<DeviceInfo>, selection: Option<DeviceInfo>) -> (Self, MockHandle) {
        let (send, recv) = unbounded();
        let unplugged = Arc::new(AtomicBool::new(false));
        let failing_writes = Arc::new(AtomicBool::new(false));
        (
            Self {
                approved,
                selection,
                frames: send,
                unplugged: unplugged.clone(),
                failing_writes: failing_writes.clone(),
            },
            MockHandle {
                frames: recv,
                unplugged,
                failing_writes,
            },
        )
    }
}

impl DeviceProvider for MockProvider {
    fn approved_devices(&self, filters: &[DeviceFilter]) -> Result<Vec<DeviceInfo>, TransportError> {
        Ok(self
            .approved
            .iter()
            .filter(|d| d.matches_any(filters))
            .cloned()
            .collect())
    }

    fn request_device(&self, _filters: &[DeviceFilter]) -> Result<DeviceInfo, TransportError> {
        self.selection
            .clone()
            .ok_or_else(|| TransportError::DeviceNotFound("selection cancelled".to_string()))
    }

    fn open(&self, _device: &DeviceInfo) -> Result<Box<dyn Bridge>, TransportError> {
        Ok(Box::new(MockBridge {
            frames: self.frames.clone(),
            unplugged: self.unplugged.clone(),
            failing_writes: self.failing_writes.clone(),
        }))
    }
}

struct MockBridge {
    frames: Sender<Vec<u8>>,
    unplugged: Arc<AtomicBool>,
    failing_writes: Arc<AtomicBool>,
}

impl MockBridge {
    fn check_plugged(&self) -> Result<(), BridgeError> {
        if self.unplugged.load(Ordering::SeqCst) {
            return Err(BridgeError::Disconnected("unplugged".to_string()));
        }
        Ok(())
    }
}

impl Bridge for MockBridge {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), BridgeError> {
        self.check_plugged()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "write timed out",
            )));
        }
        let _ = self.frames.send(frame.to_vec());
        Ok(())
    }

    fn check(&mut self) -> Result<(), BridgeError> {
        self.check_plugged()
    }
}
