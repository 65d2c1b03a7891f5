//! Control profile for the Fun Generation SePar Quad LED RGB UV, 8-channel mode.

use crate::fixture::prelude::*;

#[derive(Debug, Default)]
pub struct FunGenerationSeParQuad;

const PARAMS: &[Param] = &[
    Param::color("color", &[0, 1, 2]),
    Param::unipolar("uv", &[3]),
    Param::unipolar("dimmer", &[4]),
    // 0-9 is open, 10-255 strobes from slow to fast.
    Param::unipolar_range("strobe", &[5], 0, 255),
    Param::select(
        "program",
        &[6],
        &[
            ("none", 0),
            ("fade", 51),
            ("jump", 101),
            ("pulse", 151),
            ("sound", 201),
        ],
    ),
    Param::unipolar("speed", &[7]),
];

impl PatchFixture for FunGenerationSeParQuad {
    const NAME: FixtureType = FixtureType("FunGenerationSeParQuadLedRgbUv");
}

impl FixtureDefinition for FunGenerationSeParQuad {
    fn params(&self) -> &'static [Param] {
        PARAMS
    }

    fn channel_count(&self) -> usize {
        8
    }

    fn weight(&self) -> f64 {
        1.4
    }
}
