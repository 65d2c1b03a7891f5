//! Control profile for the Cameo Flat PAR 1 RGBW, 7-channel mode.

use crate::fixture::prelude::*;

#[derive(Debug, Default)]
pub struct CameoFlatPar1Rgbw;

const PARAMS: &[Param] = &[
    Param::unipolar("dimmer", &[0]),
    Param::unipolar_range("strobe", &[1], 0, 255),
    Param::color("color", &[2, 3, 4]),
    Param::unipolar("white", &[5]),
    Param::select(
        "program",
        &[6],
        &[
            ("none", 0),
            ("color-fade", 64),
            ("color-jump", 128),
            ("sound", 192),
        ],
    ),
];

impl PatchFixture for CameoFlatPar1Rgbw {
    const NAME: FixtureType = FixtureType("CameoFlatPar1RGBW");
}

impl FixtureDefinition for CameoFlatPar1Rgbw {
    fn params(&self) -> &'static [Param] {
        PARAMS
    }

    fn channel_count(&self) -> usize {
        7
    }

    fn weight(&self) -> f64 {
        0.9
    }
}
