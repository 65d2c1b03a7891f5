//! The connection state machine for a single USB DMX bridge.
//!
//! Pairing and frame output run on their own threads. The control path only
//! ever hands the output thread its most recent frame through a single-slot
//! channel, so a slow bridge can never build up a backlog of stale universes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::{debug, error, info, warn};

use super::device::{Bridge, BridgeError, DeviceInfo, DeviceProvider};
use super::frame::Driver;
use super::{
    ConnectionEvent, ConnectionState, EmitConnectionEvent, TransportConfig, TransportError,
};
use crate::dmx::DmxBuffer;

pub struct UsbTransport {
    shared: Arc<Shared>,
}

struct Shared {
    config: TransportConfig,
    provider: Arc<dyn DeviceProvider>,
    emitter: Arc<dyn EmitConnectionEvent>,
    link: Mutex<Link>,
}

struct Link {
    state: ConnectionState,
    /// Bumped whenever a pairing attempt or open connection is abandoned, so
    /// that late completions from worker threads are ignored.
    session: u64,
    /// Present only while connected; the bridge itself is owned by the output thread.
    frames: Option<FrameSlot>,
    device: Option<DeviceInfo>,
    last_transmission: Option<Instant>,
}

type Paired = (DeviceInfo, Box<dyn Bridge>);

impl UsbTransport {
    pub fn new(
        config: TransportConfig,
        provider: Arc<dyn DeviceProvider>,
        emitter: Arc<dyn EmitConnectionEvent>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                provider,
                emitter,
                link: Mutex::new(Link {
                    state: ConnectionState::Disconnected,
                    session: 0,
                    frames: None,
                    device: None,
                    last_transmission: None,
                }),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.link().state
    }

    /// The bridge we are connected to, if any.
    pub fn device(&self) -> Option<DeviceInfo> {
        self.shared.link().device.clone()
    }

    /// When a frame was last handed to the bridge.
    pub fn last_transmission(&self) -> Option<Instant> {
        self.shared.link().last_transmission
    }

    /// Ask the host to select a bridge and connect to it.
    ///
    /// Returns as soon as pairing has started; the outcome is reported
    /// through connection events.
    pub fn pair(&self) -> Result<(), TransportError> {
        let session = self.begin_pairing("pair")?;
        self.spawn_pairing(session, |shared| {
            shared.provider.request_device(&shared.config.devices)
        });
        Ok(())
    }

    /// Silently reconnect if exactly one previously approved bridge is present.
    ///
    /// Return true if a connection attempt was started.
    pub fn connect_approved(&self) -> Result<bool, TransportError> {
        let mut devices = self.approved_devices()?;
        if devices.len() != 1 {
            info!(
                "Found {} previously approved DMX bridges, not connecting automatically.",
                devices.len()
            );
            return Ok(false);
        }
        self.pair_device("reconnect", devices.remove(0))?;
        Ok(true)
    }

    /// Matching bridges the host has already granted access to.
    pub fn approved_devices(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        self.shared
            .provider
            .approved_devices(&self.shared.config.devices)
    }

    /// Connect to a bridge the caller has already chosen.
    ///
    /// Like pair, the outcome is reported through connection events.
    pub fn pair_with(&self, device: DeviceInfo) -> Result<(), TransportError> {
        self.pair_device("pair", device)
    }

    fn pair_device(&self, action: &'static str, device: DeviceInfo) -> Result<(), TransportError> {
        let session = self.begin_pairing(action)?;
        info!("Connecting to {device}.");
        self.spawn_pairing(session, move |_| Ok(device));
        Ok(())
    }

    /// Close the connection, or abandon a pairing attempt in progress.
    /// A frame being written at this moment may or may not reach the bridge.
    pub fn disconnect(&self) {
        let mut link = self.shared.link();
        match link.state {
            ConnectionState::Connected | ConnectionState::Pairing => {
                link.session += 1;
                link.frames = None;
                if let Some(device) = link.device.take() {
                    info!("Disconnecting from {device}.");
                }
                self.shared
                    .set_state(&mut link, ConnectionState::Disconnected);
            }
            ConnectionState::Disconnected | ConnectionState::Error => {
                debug!("DMX bridge is already disconnected.");
            }
        }
    }

    /// Hand a universe to the bridge.
    ///
    /// Never blocks. Return false if we are not connected, in which case the
    /// frame is dropped rather than queued.
    pub fn send(&self, frame: DmxBuffer) -> bool {
        let mut link = self.shared.link();
        if link.state != ConnectionState::Connected {
            debug!("DMX bridge is {}, dropping frame.", link.state);
            return false;
        }
        let Some(slot) = link.frames.as_ref() else {
            return false;
        };
        if !slot.replace(frame) {
            return false;
        }
        link.last_transmission = Some(Instant::now());
        true
    }

    fn begin_pairing(&self, action: &'static str) -> Result<u64, TransportError> {
        let mut link = self.shared.link();
        if link.state != ConnectionState::Disconnected {
            return Err(TransportError::InvalidState {
                action,
                state: link.state,
            });
        }
        link.session += 1;
        self.shared.set_state(&mut link, ConnectionState::Pairing);
        Ok(link.session)
    }

    fn spawn_pairing<F>(&self, session: u64, select: F)
    where
        F: FnOnce(&Shared) -> Result<DeviceInfo, TransportError> + Send + 'static,
    {
        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name("dmx-pairing".to_string())
            .spawn(move || {
                let result = select(&shared).and_then(|device| {
                    let bridge = shared.provider.open(&device)?;
                    Ok((device, bridge))
                });
                shared.finish_pairing(session, result);
            });
        if let Err(err) = spawned {
            self.shared.finish_pairing(
                session,
                Err(TransportError::DeviceNotFound(format!(
                    "could not start pairing: {err}"
                ))),
            );
        }
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Shared {
    fn link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, link: &mut Link, state: ConnectionState) {
        if link.state == state {
            return;
        }
        link.state = state;
        info!("DMX bridge {state}.");
        // Error is transient and never reported as a state of its own.
        if state != ConnectionState::Error {
            self.emitter
                .emit_connection_event(ConnectionEvent::StateChanged(state));
        }
    }

    fn report(&self, err: TransportError) {
        match err {
            TransportError::DeviceNotFound(_) => warn!("{err}."),
            _ => error!("{err}."),
        }
        self.emitter
            .emit_connection_event(ConnectionEvent::Error(err));
    }

    fn finish_pairing(self: &Arc<Self>, session: u64, result: Result<Paired, TransportError>) {
        let mut link = self.link();
        if link.session != session || link.state != ConnectionState::Pairing {
            debug!("Discarding the result of an abandoned pairing attempt.");
            return;
        }
        let result = result.and_then(|(device, bridge)| {
            let frames = self.start_output(session, bridge)?;
            Ok((device, frames))
        });
        match result {
            Ok((device, frames)) => {
                info!("Connected to DMX bridge {device}.");
                link.frames = Some(frames);
                link.device = Some(device);
                self.set_state(&mut link, ConnectionState::Connected);
            }
            Err(err) => {
                self.set_state(&mut link, ConnectionState::Error);
                self.report(err);
                self.set_state(&mut link, ConnectionState::Disconnected);
            }
        }
    }

    fn start_output(
        self: &Arc<Self>,
        session: u64,
        bridge: Box<dyn Bridge>,
    ) -> Result<FrameSlot, TransportError> {
        let (send, recv) = bounded(1);
        let stale = recv.clone();
        let shared = self.clone();
        let driver = self.config.driver;
        let poll_interval = self.config.poll_interval();
        thread::Builder::new()
            .name("dmx-output".to_string())
            .spawn(move || run_output(shared, session, bridge, driver, recv, poll_interval))
            .map_err(|e| TransportError::DeviceNotFound(format!("could not start output: {e}")))?;
        Ok(FrameSlot { send, stale })
    }

    /// The bridge went away underneath an open connection.
    fn lose_session(&self, session: u64, reason: String) {
        let mut link = self.link();
        if link.session != session || link.state != ConnectionState::Connected {
            return;
        }
        link.session += 1;
        link.frames = None;
        link.device = None;
        self.report(TransportError::DeviceDisconnected(reason));
        self.set_state(&mut link, ConnectionState::Disconnected);
    }

    fn report_send_failure(&self, session: u64, reason: String) {
        let link = self.link();
        if link.session == session {
            self.report(TransportError::SendFailure(reason));
        }
    }
}

/// Write frames to the bridge until the connection is closed or lost.
fn run_output(
    shared: Arc<Shared>,
    session: u64,
    mut bridge: Box<dyn Bridge>,
    driver: Driver,
    frames: Receiver<DmxBuffer>,
    poll_interval: Duration,
) {
    loop {
        let result = match frames.recv_timeout(poll_interval) {
            Ok(frame) => bridge.write_frame(&driver.encode(&frame)),
            Err(RecvTimeoutError::Timeout) => match bridge.check() {
                Err(BridgeError::Io(err)) => {
                    warn!("DMX bridge check failed: {err}.");
                    Ok(())
                }
                other => other,
            },
            Err(RecvTimeoutError::Disconnected) => {
                debug!("DMX output closed, releasing bridge.");
                return;
            }
        };
        match result {
            Ok(()) => (),
            Err(BridgeError::Disconnected(reason)) => {
                shared.lose_session(session, reason);
                return;
            }
            // The next property change resends the whole universe.
            Err(BridgeError::Io(err)) => shared.report_send_failure(session, err.to_string()),
        }
    }
}

/// A single-slot channel holding the newest unsent frame.
struct FrameSlot {
    send: Sender<DmxBuffer>,
    /// Used to evict a frame the output thread has not picked up yet.
    stale: Receiver<DmxBuffer>,
}

impl FrameSlot {
    /// Put a frame in the slot, replacing any frame still waiting there.
    fn replace(&self, frame: DmxBuffer) -> bool {
        let frame = match self.send.try_send(frame) {
            Ok(()) => return true,
            Err(TrySendError::Disconnected(_)) => return false,
            Err(TrySendError::Full(frame)) => frame,
        };
        if self.stale.try_recv().is_ok() {
            debug!("Replaced an unsent DMX frame.");
        }
        self.send.try_send(frame).is_ok()
    }
}
