//! Control profile for the Eurolite LED TMH-8 moving head, 9-channel mode.

use crate::fixture::prelude::*;

#[derive(Debug, Default)]
pub struct EuroliteTmh8;

const PARAMS: &[Param] = &[
    Param::unipolar("pan", &[0]),
    Param::unipolar("tilt", &[1]),
    Param::select(
        "colorWheel",
        &[2],
        &[
            ("white", 0),
            ("red", 10),
            ("green", 20),
            ("blue", 30),
            ("yellow", 40),
            ("orange", 50),
            ("cyan", 60),
            ("pink", 70),
            ("rainbow", 128),
        ],
    ),
    Param::select(
        "gobo",
        &[3],
        &[
            ("open", 0),
            ("gobo1", 8),
            ("gobo2", 16),
            ("gobo3", 24),
            ("gobo4", 32),
            ("gobo5", 40),
            ("gobo6", 48),
            ("gobo7", 56),
            ("shake", 64),
        ],
    ),
    Param::unipolar_range("strobe", &[4], 0, 250),
    Param::unipolar("dimmer", &[5]),
    // Speed runs fast to slow.
    Param::unipolar_range("panTiltSpeed", &[6], 255, 0),
    Param::bool("auto", &[7], 0, 135),
    Param::bool("reset", &[8], 0, 255),
];

impl PatchFixture for EuroliteTmh8 {
    const NAME: FixtureType = FixtureType("EuroliteTMH8");
}

impl FixtureDefinition for EuroliteTmh8 {
    fn params(&self) -> &'static [Param] {
        PARAMS
    }

    fn channel_count(&self) -> usize {
        9
    }

    fn weight(&self) -> f64 {
        5.5
    }
}
