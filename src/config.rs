use std::collections::BTreeMap;
use std::fs::File;

use anyhow::Result;
use serde::Deserialize;

use crate::dmx::{DmxAddr, UniverseIdx};
use crate::fixture::PropertyValue;
use crate::transport::TransportConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub debug: bool,
    /// The universe driven by the bridge.
    /// Defaults to 0.
    #[serde(default)]
    pub universe: UniverseIdx,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Fixtures to patch at startup.
    #[serde(default)]
    pub fixtures: Vec<FixtureConfig>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let config_file = File::open(path)?;
        let cfg: Config = serde_yaml::from_reader(config_file)?;
        Ok(cfg)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FixtureConfig {
    /// Registered fixture type name.
    #[serde(rename = "type")]
    pub fixture_type: String,
    pub addr: DmxAddr,
    /// The universe this fixture is patched in.
    /// Defaults to 0.
    #[serde(default)]
    pub universe: UniverseIdx,
    /// Initial property values, applied right after patching.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}
