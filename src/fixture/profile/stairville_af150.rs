//! Control profile for the Stairville AF-150 fog machine.

use crate::fixture::prelude::*;

#[derive(Debug, Default)]
pub struct StairvilleAf150;

const PARAMS: &[Param] = &[Param::unipolar("fog", &[0])];

impl PatchFixture for StairvilleAf150 {
    const NAME: FixtureType = FixtureType("StairvilleAF150");
}

impl FixtureDefinition for StairvilleAf150 {
    fn params(&self) -> &'static [Param] {
        PARAMS
    }

    fn channel_count(&self) -> usize {
        1
    }

    fn weight(&self) -> f64 {
        3.5
    }
}
