use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of channels in one DMX universe.
pub const UNIVERSE_SIZE: usize = 512;

/// A DMX address, indexed from 1.
#[derive(Serialize, Deserialize, PartialEq, Eq, Hash, Copy, Clone, Debug)]
#[serde(try_from = "usize", into = "usize")]
pub struct DmxAddr(usize);

impl DmxAddr {
    pub fn new(addr: usize) -> Result<Self, DmxAddrError> {
        if !(1..=UNIVERSE_SIZE).contains(&addr) {
            return Err(DmxAddrError(addr));
        }
        Ok(Self(addr))
    }

    /// Get the DMX buffer index of this address (indexed from 0).
    pub fn dmx_index(&self) -> usize {
        self.0 - 1
    }
}

impl TryFrom<usize> for DmxAddr {
    type Error = DmxAddrError;
    fn try_from(addr: usize) -> Result<Self, Self::Error> {
        Self::new(addr)
    }
}

impl From<DmxAddr> for usize {
    fn from(addr: DmxAddr) -> Self {
        addr.0
    }
}

impl Display for DmxAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("DMX address {0} is outside of 1-{UNIVERSE_SIZE}")]
pub struct DmxAddrError(pub usize);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("DMX buffer index {0} is outside of 0-511")]
pub struct DmxIndexError(pub usize);

/// A data buffer for one DMX universe.
pub type DmxBuffer = [u8; UNIVERSE_SIZE];

/// Index into the DMX universes.
pub type UniverseIdx = usize;

/// The channel state of a single DMX universe.
///
/// Fixtures write into the universe in place; the transport only ever sees
/// snapshots of it.
#[derive(Clone, Debug)]
pub struct Universe {
    idx: UniverseIdx,
    channels: DmxBuffer,
}

impl Universe {
    pub fn new(idx: UniverseIdx) -> Self {
        Self {
            idx,
            channels: [0; UNIVERSE_SIZE],
        }
    }

    pub fn idx(&self) -> UniverseIdx {
        self.idx
    }

    /// Set the channel at the provided buffer index (indexed from 0).
    pub fn write(&mut self, offset: usize, value: u8) -> Result<(), DmxIndexError> {
        let channel = self.channels.get_mut(offset).ok_or(DmxIndexError(offset))?;
        *channel = value;
        Ok(())
    }

    pub fn get(&self, offset: usize) -> Option<u8> {
        self.channels.get(offset).copied()
    }

    /// Reset every channel to 0.
    pub fn clear(&mut self) {
        self.channels.fill(0);
    }

    /// Copy out the current state of every channel.
    pub fn snapshot(&self) -> DmxBuffer {
        self.channels
    }

    pub fn channels(&self) -> &[u8] {
        &self.channels
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_addr_range() {
        assert_eq!(0, DmxAddr::new(1).unwrap().dmx_index());
        assert_eq!(511, DmxAddr::new(512).unwrap().dmx_index());
        assert_eq!(Err(DmxAddrError(0)), DmxAddr::new(0));
        assert_eq!(Err(DmxAddrError(513)), DmxAddr::new(513));
    }

    #[test]
    fn test_addr_deserialize_rejects_out_of_range() {
        assert_eq!(
            DmxAddr::new(17).unwrap(),
            serde_yaml::from_str::<DmxAddr>("17").unwrap()
        );
        assert!(serde_yaml::from_str::<DmxAddr>("600").is_err());
    }

    #[test]
    fn test_write_then_snapshot() {
        let mut univ = Universe::new(0);
        for offset in [0, 1, 255, 510, 511] {
            univ.write(offset, 200).unwrap();
        }
        univ.write(42, 7).unwrap();
        let before = univ.snapshot();
        for (offset, value) in [(0, 0), (100, 255), (511, 1), (42, 42)] {
            univ.write(offset, value).unwrap();
            let snap = univ.snapshot();
            assert_eq!(UNIVERSE_SIZE, snap.len());
            assert_eq!(value, snap[offset]);
            for (i, v) in snap.iter().enumerate() {
                if ![0, 100, 511, 42].contains(&i) {
                    assert_eq!(before[i], *v, "channel {i} changed");
                }
            }
        }
    }

    #[test]
    fn test_write_out_of_range() {
        let mut univ = Universe::new(0);
        assert_eq!(Err(DmxIndexError(512)), univ.write(512, 1));
        assert_eq!(Err(DmxIndexError(9000)), univ.write(9000, 1));
        assert!(univ.channels().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_clear() {
        let mut univ = Universe::new(0);
        for offset in 0..UNIVERSE_SIZE {
            univ.write(offset, (offset % 256) as u8).unwrap();
        }
        univ.clear();
        assert_eq!([0u8; UNIVERSE_SIZE], univ.snapshot());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut univ = Universe::new(0);
        univ.write(3, 9).unwrap();
        let snap = univ.snapshot();
        univ.write(3, 10).unwrap();
        assert_eq!(9, snap[3]);
        assert_eq!(Some(10), univ.get(3));
        assert_eq!(None, univ.get(512));
    }
}
