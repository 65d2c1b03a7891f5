//! Fixture models, patched fixture instances, and the fixture registry.

pub mod definition;
#[allow(clippy::module_inception)]
pub mod fixture;
pub mod manager;
pub mod profile;
pub mod registry;

pub use definition::{FixtureDefinition, Param, ParamKind, PropertyError, PropertyValue};
pub use fixture::{Fixture, FixtureId, FixtureMetadata};
pub use manager::{FixtureManager, PatchError};
pub use registry::{FixtureType, PatchFixture, Registry};

pub mod prelude {
    pub use super::definition::{FixtureChannels, FixtureDefinition, Param, PropertyValue};
    pub use super::registry::{FixtureType, PatchFixture};
    pub use crate::dmx::DmxIndexError;
}
