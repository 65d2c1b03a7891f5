//! A single patched fixture.
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::definition::{FixtureChannels, FixtureDefinition, PropertyError, PropertyValue};
use super::registry::FixtureType;
use crate::dmx::{DmxAddr, DmxIndexError, Universe, UniverseIdx, UNIVERSE_SIZE};

/// Unique identifier of a patched fixture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixtureId(Uuid);

impl FixtureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FixtureId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for FixtureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FixtureId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug)]
pub struct Fixture {
    id: FixtureId,
    fixture_type: FixtureType,
    definition: Box<dyn FixtureDefinition>,
    addr: DmxAddr,
    universe: UniverseIdx,
    /// The last value successfully set for each property.
    properties: HashMap<String, PropertyValue>,
}

impl Fixture {
    pub fn new(
        fixture_type: FixtureType,
        definition: Box<dyn FixtureDefinition>,
        addr: DmxAddr,
        universe: UniverseIdx,
    ) -> Self {
        Self {
            id: FixtureId::new(),
            fixture_type,
            definition,
            addr,
            universe,
            properties: HashMap::new(),
        }
    }

    pub fn id(&self) -> FixtureId {
        self.id
    }

    pub fn fixture_type(&self) -> FixtureType {
        self.fixture_type
    }

    pub fn addr(&self) -> DmxAddr {
        self.addr
    }

    pub fn universe(&self) -> UniverseIdx {
        self.universe
    }

    pub fn channel_count(&self) -> usize {
        self.definition.channel_count()
    }

    /// The range of DMX buffer indices this fixture occupies.
    pub fn dmx_indexes(&self) -> std::ops::Range<usize> {
        let start = self.addr.dmx_index();
        start..start + self.channel_count()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Set a property and write its channels into the universe.
    ///
    /// Return false if the fixture does not declare this property; nothing is
    /// written in that case. Nothing is written either if the fixture's
    /// footprint runs past the end of the universe.
    pub fn set(
        &mut self,
        name: &str,
        value: PropertyValue,
        universe: &mut Universe,
    ) -> Result<bool, PropertyError> {
        let Some(param) = self.definition.param(name) else {
            debug!("{} has no property {name}, ignoring.", self.fixture_type);
            return Ok(false);
        };
        let encoded = param.encode(&value)?;
        let end = self.dmx_indexes().end;
        if end > UNIVERSE_SIZE {
            return Err(DmxIndexError(end - 1).into());
        }
        let mut channels = FixtureChannels::new(universe, self.addr.dmx_index());
        for (offset, byte) in param.channels.iter().zip(&encoded) {
            channels.write(*offset, *byte)?;
        }
        self.definition
            .after_write(param, &encoded, &mut channels)?;
        debug!(
            "{} at {}: {name} = {value} -> {encoded:?}",
            self.fixture_type, self.addr
        );
        self.properties.insert(name.to_string(), value);
        Ok(true)
    }

    /// Describe this fixture for display.
    pub fn metadata(&self) -> FixtureMetadata {
        let start = self.addr.dmx_index();
        FixtureMetadata {
            id: self.id,
            fixture_type: self.fixture_type,
            addr: self.addr,
            universe: self.universe,
            weight: self.definition.weight(),
            channel_count: self.definition.channel_count(),
            params: self
                .definition
                .params()
                .iter()
                .map(|p| ParamMetadata {
                    name: p.name,
                    kind: p.kind.name(),
                    // Reported as 1-indexed DMX addresses.
                    channels: p.channels.iter().map(|c| start + c + 1).collect(),
                    options: p.options(),
                })
                .collect(),
            properties: self
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FixtureMetadata {
    pub id: FixtureId,
    pub fixture_type: FixtureType,
    pub addr: DmxAddr,
    pub universe: UniverseIdx,
    pub weight: f64,
    pub channel_count: usize,
    pub params: Vec<ParamMetadata>,
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ParamMetadata {
    pub name: &'static str,
    pub kind: &'static str,
    pub channels: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}
