//! Tie fixture property changes to universe output.

use std::time::Instant;

use log::info;

use crate::dmx::{DmxAddr, Universe, UniverseIdx};
use crate::fixture::{FixtureId, FixtureManager, FixtureMetadata, PatchError, PropertyValue};
use crate::transport::{ConnectionState, DeviceInfo, TransportError, UsbTransport};

const COLOR: &str = "color";

/// The control path: owns the universe, the patch, and the bridge connection.
///
/// Every mutation of the universe happens here, synchronously. After each
/// change the whole universe is handed to the transport if it is connected.
pub struct ConnectionController {
    universe: Universe,
    fixtures: FixtureManager,
    transport: UsbTransport,
    /// While set, replaces every incoming color property value.
    color_override: Option<[u8; 3]>,
}

impl ConnectionController {
    pub fn new(universe: UniverseIdx, fixtures: FixtureManager, transport: UsbTransport) -> Self {
        Self {
            universe: Universe::new(universe),
            fixtures,
            transport,
            color_override: None,
        }
    }

    pub fn create_fixture(
        &mut self,
        fixture_type: &str,
        addr: usize,
        universe: UniverseIdx,
    ) -> Result<FixtureId, PatchError> {
        let addr = DmxAddr::new(addr)?;
        if universe != self.universe.idx() {
            return Err(PatchError::UnknownUniverse(universe));
        }
        self.fixtures.create(fixture_type, addr, universe)
    }

    /// Unpatch a fixture. Its channels keep their last values.
    pub fn remove_fixture(&mut self, id: FixtureId) -> bool {
        self.fixtures.remove(id).is_some()
    }

    /// Apply property changes to a fixture and send the resulting universe.
    ///
    /// Properties the fixture does not declare are ignored.
    pub fn update_fixture_properties<I>(&mut self, id: FixtureId, properties: I) -> Result<(), PatchError>
    where
        I: IntoIterator<Item = (String, PropertyValue)>,
    {
        let color_override = self.color_override;
        let properties = properties.into_iter().map(|(name, value)| match color_override {
            Some(rgb) if name == COLOR => (name, PropertyValue::Color(rgb)),
            _ => (name, value),
        });
        self.fixtures.update(id, properties, &mut self.universe)?;
        self.transmit();
        Ok(())
    }

    /// Replace the value of every color property set from now on, until cleared.
    /// Colors already written stay as they are.
    pub fn set_color_override(&mut self, color: Option<[u8; 3]>) {
        match color {
            Some([r, g, b]) => info!("Overriding fixture colors with [{r}, {g}, {b}]."),
            None => info!("Color override cleared."),
        }
        self.color_override = color;
    }

    pub fn color_override(&self) -> Option<[u8; 3]> {
        self.color_override
    }

    /// Zero the whole universe and send it.
    pub fn clear_universe(&mut self) {
        self.universe.clear();
        self.transmit();
    }

    /// Start pairing with a bridge.
    pub fn request_connect(&self) -> Result<(), TransportError> {
        self.transport.pair()
    }

    /// Start pairing with a bridge the operator has picked from approved_devices.
    pub fn request_connect_to(&self, device: DeviceInfo) -> Result<(), TransportError> {
        self.transport.pair_with(device)
    }

    /// Bridges that can be paired with without asking the host.
    pub fn approved_devices(&self) -> Result<Vec<DeviceInfo>, TransportError> {
        self.transport.approved_devices()
    }

    pub fn request_disconnect(&self) {
        self.transport.disconnect();
    }

    /// Reconnect to a previously approved bridge without prompting, if there is exactly one.
    pub fn connect_approved(&self) -> Result<bool, TransportError> {
        self.transport.connect_approved()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn device(&self) -> Option<DeviceInfo> {
        self.transport.device()
    }

    pub fn last_transmission(&self) -> Option<Instant> {
        self.transport.last_transmission()
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn fixtures(&self) -> &FixtureManager {
        &self.fixtures
    }

    pub fn fixture_metadata(&self, id: FixtureId) -> Result<FixtureMetadata, PatchError> {
        Ok(self.fixtures.get(id)?.metadata())
    }

    pub fn fixtures_metadata(&self) -> Vec<FixtureMetadata> {
        self.fixtures.iter().map(|f| f.metadata()).collect()
    }

    /// Snapshot the universe and send it if we are connected.
    /// Frames are dropped while disconnected; the next change resends everything.
    fn transmit(&self) {
        self.transport.send(self.universe.snapshot());
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use crossbeam_channel::{unbounded, Receiver};

    use super::*;
    use crate::dmx::UNIVERSE_SIZE;
    use crate::fixture::Registry;
    use crate::transport::mock::{device, MockHandle, MockProvider};
    use crate::transport::{ConnectionEvent, Driver, TransportConfig};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn controller() -> (ConnectionController, MockHandle, Receiver<ConnectionEvent>) {
        let (provider, handle) = MockProvider::new(vec![], Some(device("/dev/ttyACM0")));
        let (send, recv) = unbounded();
        let config = TransportConfig {
            poll_interval_ms: 5,
            ..Default::default()
        };
        let transport = UsbTransport::new(config, Arc::new(provider), Arc::new(send));
        let fixtures = FixtureManager::new(Arc::new(Registry::builtin()));
        (ConnectionController::new(0, fixtures, transport), handle, recv)
    }

    fn connect(c: &ConnectionController, events: &Receiver<ConnectionEvent>) {
        c.request_connect().unwrap();
        loop {
            let event = events.recv_timeout(TIMEOUT).unwrap();
            if event == ConnectionEvent::StateChanged(ConnectionState::Connected) {
                return;
            }
        }
    }

    fn color(rgb: [u8; 3]) -> Vec<(String, PropertyValue)> {
        vec![("color".to_string(), PropertyValue::Color(rgb))]
    }

    #[test]
    fn test_update_transmits_when_connected() {
        let (mut c, handle, events) = controller();
        let a = c.create_fixture("Rgb", 1, 0).unwrap();
        connect(&c, &events);
        c.update_fixture_properties(a, color([255, 0, 0])).unwrap();

        let mut expected = [0u8; UNIVERSE_SIZE];
        expected[..3].copy_from_slice(&[255, 0, 0]);
        assert_eq!(expected, c.universe().snapshot());
        assert_eq!(
            Driver::EnttecPro.encode(&expected),
            handle.frames.recv_timeout(TIMEOUT).unwrap()
        );
        assert!(c.last_transmission().is_some());
    }

    #[test]
    fn test_update_while_disconnected_drops_frame() {
        let (mut c, handle, _events) = controller();
        let a = c.create_fixture("Rgb", 10, 0).unwrap();
        c.update_fixture_properties(a, color([1, 2, 3])).unwrap();
        assert_eq!([1, 2, 3], c.universe().snapshot()[9..12]);
        assert_eq!(ConnectionState::Disconnected, c.connection_state());
        assert!(c.last_transmission().is_none());
        assert!(handle.frames.try_recv().is_err());
    }

    #[test]
    fn test_frames_are_not_queued_while_disconnected() {
        let (mut c, handle, events) = controller();
        let a = c.create_fixture("Rgb", 1, 0).unwrap();
        for v in 0..10 {
            c.update_fixture_properties(a, color([v, v, v])).unwrap();
        }
        connect(&c, &events);
        assert!(handle
            .frames
            .recv_timeout(Duration::from_millis(50))
            .is_err());
        c.update_fixture_properties(a, color([42, 42, 42])).unwrap();
        let frame = handle.frames.recv_timeout(TIMEOUT).unwrap();
        assert_eq!([42, 42, 42], frame[5..8]);
    }

    #[test]
    fn test_create_fixture_validation() {
        let (mut c, _handle, _events) = controller();
        assert!(matches!(
            c.create_fixture("Rgb", 0, 0),
            Err(PatchError::InvalidAddress(_))
        ));
        assert!(matches!(
            c.create_fixture("Rgb", 513, 0),
            Err(PatchError::InvalidAddress(_))
        ));
        assert_eq!(
            Err(PatchError::UnknownUniverse(1)),
            c.create_fixture("Rgb", 1, 1)
        );
        assert_eq!(
            Err(PatchError::UnknownFixtureType("Nope".to_string())),
            c.create_fixture("Nope", 1, 0)
        );
        assert!(c.fixtures().is_empty());
    }

    #[test]
    fn test_color_override() {
        let (mut c, _handle, _events) = controller();
        let a = c.create_fixture("CameoFlatPar1RGBW", 1, 0).unwrap();
        c.set_color_override(Some([0, 0, 200]));
        c.update_fixture_properties(
            a,
            vec![
                ("color".to_string(), PropertyValue::Color([255, 0, 0])),
                ("dimmer".to_string(), PropertyValue::Unipolar(1.0)),
            ],
        )
        .unwrap();
        assert_eq!([255, 0, 0, 0, 200], c.universe().snapshot()[0..5]);
        assert_eq!(
            Some(&PropertyValue::Color([0, 0, 200])),
            c.fixture_metadata(a).unwrap().properties.get("color")
        );

        c.set_color_override(None);
        c.update_fixture_properties(a, color([255, 0, 0])).unwrap();
        assert_eq!([255, 0, 0], c.universe().snapshot()[2..5]);
    }

    #[test]
    fn test_remove_and_clear() {
        let (mut c, _handle, _events) = controller();
        let a = c.create_fixture("StairvilleAF150", 1, 0).unwrap();
        c.update_fixture_properties(a, vec![("fog".to_string(), PropertyValue::Unipolar(1.0))])
            .unwrap();
        assert!(c.remove_fixture(a));
        assert!(!c.remove_fixture(a));
        assert_eq!(Some(255), c.universe().get(0));
        assert!(c.fixture_metadata(a).is_err());
        c.clear_universe();
        assert_eq!([0u8; UNIVERSE_SIZE], c.universe().snapshot());
    }

    #[test]
    fn test_metadata() {
        let (mut c, _handle, _events) = controller();
        let a = c.create_fixture("CameoPixBar600PRO", 100, 0).unwrap();
        c.create_fixture("Rgb", 300, 0).unwrap();
        let meta = c.fixture_metadata(a).unwrap();
        assert_eq!(74, meta.channel_count);
        assert_eq!(4.2, meta.weight);
        assert_eq!(
            vec!["dimmer", "strobe", "color", "white", "amber", "uv"],
            meta.params.iter().map(|p| p.name).collect::<Vec<_>>()
        );
        assert_eq!(2, c.fixtures_metadata().len());
    }

    #[test]
    fn test_connect_disconnect_sequence() {
        let (c, _handle, events) = controller();
        assert_eq!(ConnectionState::Disconnected, c.connection_state());
        c.request_connect().unwrap();
        let mut seen = vec![ConnectionState::Disconnected];
        for _ in 0..2 {
            match events.recv_timeout(TIMEOUT).unwrap() {
                ConnectionEvent::StateChanged(s) => seen.push(s),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(Some(device("/dev/ttyACM0")), c.device());
        c.request_disconnect();
        match events.recv_timeout(TIMEOUT).unwrap() {
            ConnectionEvent::StateChanged(s) => seen.push(s),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            vec![
                ConnectionState::Disconnected,
                ConnectionState::Pairing,
                ConnectionState::Connected,
                ConnectionState::Disconnected,
            ],
            seen
        );
    }
}
