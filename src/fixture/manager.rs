use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use super::definition::PropertyValue;
use super::fixture::{Fixture, FixtureId};
use super::registry::Registry;
use crate::dmx::{DmxAddr, Universe, UniverseIdx, UNIVERSE_SIZE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("unknown fixture type \"{0}\"")]
    UnknownFixtureType(String),
    #[error("fixture {0} not found")]
    FixtureNotFound(FixtureId),
    #[error("universe {0} is not driven by this bridge")]
    UnknownUniverse(UniverseIdx),
    #[error(transparent)]
    InvalidAddress(#[from] crate::dmx::DmxAddrError),
    #[error("{fixture_type} at {addr} needs {channel_count} channels and runs past the end of the universe")]
    FootprintOutOfRange {
        fixture_type: String,
        addr: DmxAddr,
        channel_count: usize,
    },
}

/// The collection of all patched fixtures.
pub struct FixtureManager {
    registry: Arc<Registry>,
    fixtures: Vec<Fixture>,
}

impl FixtureManager {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            fixtures: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Patch a new fixture of the named type.
    pub fn create(
        &mut self,
        fixture_type: &str,
        addr: DmxAddr,
        universe: UniverseIdx,
    ) -> Result<FixtureId, PatchError> {
        let Some((fixture_type, definition)) = self.registry.create(fixture_type) else {
            return Err(PatchError::UnknownFixtureType(fixture_type.to_string()));
        };
        let fixture = Fixture::new(fixture_type, definition, addr, universe);
        if fixture.dmx_indexes().end > UNIVERSE_SIZE {
            return Err(PatchError::FootprintOutOfRange {
                fixture_type: fixture_type.to_string(),
                addr,
                channel_count: fixture.channel_count(),
            });
        }
        self.warn_on_overlap(&fixture);
        info!(
            "Controlling {} at {} in universe {} ({}).",
            fixture_type,
            addr,
            universe,
            fixture.id()
        );
        let id = fixture.id();
        self.fixtures.push(fixture);
        Ok(id)
    }

    /// Overlapping fixtures are allowed, the last write to a shared channel wins.
    fn warn_on_overlap(&self, candidate: &Fixture) {
        let range = candidate.dmx_indexes();
        for existing in &self.fixtures {
            if existing.universe() != candidate.universe() {
                continue;
            }
            let other = existing.dmx_indexes();
            if range.start < other.end && other.start < range.end {
                warn!(
                    "{} at {} overlaps at DMX address {} in universe {} with {} at {}.",
                    candidate.fixture_type(),
                    candidate.addr(),
                    range.start.max(other.start) + 1,
                    candidate.universe(),
                    existing.fixture_type(),
                    existing.addr(),
                );
            }
        }
    }

    /// Unpatch a fixture.
    /// The channels it has written keep their current values.
    pub fn remove(&mut self, id: FixtureId) -> Option<Fixture> {
        let index = self.fixtures.iter().position(|f| f.id() == id)?;
        let fixture = self.fixtures.remove(index);
        info!(
            "Removed {} at {} ({}).",
            fixture.fixture_type(),
            fixture.addr(),
            id
        );
        Some(fixture)
    }

    /// Set properties on a fixture, writing the results into the universe.
    ///
    /// Names the fixture does not declare are skipped, as are values that
    /// cannot be encoded. Return the number of properties that were applied.
    pub fn update<I>(
        &mut self,
        id: FixtureId,
        properties: I,
        universe: &mut Universe,
    ) -> Result<usize, PatchError>
    where
        I: IntoIterator<Item = (String, PropertyValue)>,
    {
        let fixture = self.get_mut(id)?;
        let mut applied = 0;
        for (name, value) in properties {
            match fixture.set(&name, value, universe) {
                Ok(true) => applied += 1,
                Ok(false) => (),
                Err(err) => warn!("{} ({id}): {err}.", fixture.fixture_type()),
            }
        }
        debug!("Applied {applied} properties to {id}.");
        Ok(applied)
    }

    pub fn get(&self, id: FixtureId) -> Result<&Fixture, PatchError> {
        self.fixtures
            .iter()
            .find(|f| f.id() == id)
            .ok_or(PatchError::FixtureNotFound(id))
    }

    pub fn get_mut(&mut self, id: FixtureId) -> Result<&mut Fixture, PatchError> {
        self.fixtures
            .iter_mut()
            .find(|f| f.id() == id)
            .ok_or(PatchError::FixtureNotFound(id))
    }

    /// Iterate over all patched fixtures, in patch order.
    pub fn iter(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter()
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}
