use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Deref;

use lazy_static::lazy_static;
use serde::Serialize;

use super::definition::FixtureDefinition;
use super::profile::cameo_flat_par_1_rgbw::CameoFlatPar1Rgbw;
use super::profile::cameo_pixbar_600_pro::CameoPixBar600Pro;
use super::profile::eurolite_tmh8::EuroliteTmh8;
use super::profile::fun_generation_se_par_quad::FunGenerationSeParQuad;
use super::profile::rgb::Rgb;
use super::profile::stairville_af150::StairvilleAf150;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FixtureType(pub &'static str);

impl Deref for FixtureType {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl Display for FixtureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Construct a fresh instance of a fixture definition.
pub type Factory = fn() -> Box<dyn FixtureDefinition>;

/// Fixture constructor trait to handle registering fixture models.
pub trait PatchFixture: FixtureDefinition + Default + 'static {
    const NAME: FixtureType;

    fn create() -> Box<dyn FixtureDefinition> {
        Box::new(Self::default())
    }

    /// The registry entry for this model.
    fn registration() -> (FixtureType, Factory) {
        (Self::NAME, Self::create)
    }
}

lazy_static! {
    static ref BUILTIN: Vec<(FixtureType, Factory)> = vec![
        CameoFlatPar1Rgbw::registration(),
        CameoPixBar600Pro::registration(),
        EuroliteTmh8::registration(),
        FunGenerationSeParQuad::registration(),
        Rgb::registration(),
        StairvilleAf150::registration(),
    ];
}

/// Lookup from fixture type name to the factory for that model.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<&'static str, (FixtureType, Factory)>,
}

impl Registry {
    /// A registry holding every built-in fixture model.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for (fixture_type, factory) in BUILTIN.iter() {
            registry.insert(*fixture_type, *factory);
        }
        registry
    }

    pub fn register<P: PatchFixture>(&mut self) {
        let (fixture_type, factory) = P::registration();
        self.insert(fixture_type, factory);
    }

    fn insert(&mut self, fixture_type: FixtureType, factory: Factory) {
        self.factories.insert(fixture_type.0, (fixture_type, factory));
    }

    /// Instantiate the definition registered under this name, if there is one.
    pub fn create(&self, name: &str) -> Option<(FixtureType, Box<dyn FixtureDefinition>)> {
        self.factories
            .get(name)
            .map(|(fixture_type, factory)| (*fixture_type, factory()))
    }

    /// All registered type names, sorted.
    pub fn fixture_types(&self) -> Vec<FixtureType> {
        let mut types: Vec<_> = self.factories.values().map(|(t, _)| *t).collect();
        types.sort_by_key(|t| t.0);
        types
    }
}
