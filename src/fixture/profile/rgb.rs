//! Generic three-channel RGB fixture.

use crate::fixture::prelude::*;

#[derive(Debug, Default)]
pub struct Rgb;

const PARAMS: &[Param] = &[Param::color("color", &[0, 1, 2])];

impl PatchFixture for Rgb {
    const NAME: FixtureType = FixtureType("Rgb");
}

impl FixtureDefinition for Rgb {
    fn params(&self) -> &'static [Param] {
        PARAMS
    }

    fn channel_count(&self) -> usize {
        3
    }

    fn weight(&self) -> f64 {
        0.0
    }
}
