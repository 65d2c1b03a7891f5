//! Control profile for the Cameo PixBar 600 PRO, 74-channel mode.
//!
//! The bar has twelve independently addressable RGBWA+UV segments. The color
//! and UV properties are written to the first segment and then mirrored onto
//! the other eleven so the bar behaves as a single lamp.

use crate::fixture::prelude::*;

#[derive(Debug, Default)]
pub struct CameoPixBar600Pro;

const SEGMENT_COUNT: usize = 12;
/// Red, green, blue, white, amber, UV.
const SEGMENT_WIDTH: usize = 6;
/// Offset of the first segment's red channel.
const FIRST_SEGMENT: usize = 2;

const PARAMS: &[Param] = &[
    Param::unipolar("dimmer", &[0]),
    Param::unipolar_range("strobe", &[1], 0, 255),
    Param::color("color", &[2, 3, 4]),
    Param::unipolar("white", &[5]),
    Param::unipolar("amber", &[6]),
    Param::unipolar("uv", &[7]),
];

impl PatchFixture for CameoPixBar600Pro {
    const NAME: FixtureType = FixtureType("CameoPixBar600PRO");
}

impl FixtureDefinition for CameoPixBar600Pro {
    fn params(&self) -> &'static [Param] {
        PARAMS
    }

    fn channel_count(&self) -> usize {
        FIRST_SEGMENT + SEGMENT_COUNT * SEGMENT_WIDTH
    }

    fn weight(&self) -> f64 {
        4.2
    }

    fn after_write(
        &self,
        param: &Param,
        encoded: &[u8],
        channels: &mut FixtureChannels,
    ) -> Result<(), DmxIndexError> {
        if !matches!(param.name, "color" | "white" | "amber" | "uv") {
            return Ok(());
        }
        for segment in 1..SEGMENT_COUNT {
            for (offset, value) in param.channels.iter().zip(encoded) {
                channels.write(offset + segment * SEGMENT_WIDTH, *value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dmx::Universe;

    fn write(univ: &mut Universe, start: usize, name: &str, value: PropertyValue) {
        let fixture = CameoPixBar600Pro;
        let param = fixture.param(name).unwrap();
        let encoded = param.encode(&value).unwrap();
        let mut channels = FixtureChannels::new(univ, start);
        for (offset, v) in param.channels.iter().zip(&encoded) {
            channels.write(*offset, *v).unwrap();
        }
        fixture.after_write(param, &encoded, &mut channels).unwrap();
    }

    #[test]
    fn test_color_fans_out_to_every_segment() {
        let mut univ = Universe::new(0);
        write(&mut univ, 10, "color", PropertyValue::Color([10, 20, 30]));
        write(&mut univ, 10, "uv", PropertyValue::Unipolar(1.0));
        for segment in 0..SEGMENT_COUNT {
            let base = 10 + FIRST_SEGMENT + segment * SEGMENT_WIDTH;
            assert_eq!(
                &[10, 20, 30, 0, 0, 255],
                &univ.channels()[base..base + SEGMENT_WIDTH],
                "segment {segment}"
            );
        }
        assert_eq!(0, univ.channels()[10]);
        assert_eq!(0, univ.channels()[10 + 74]);
    }

    #[test]
    fn test_dimmer_is_not_mirrored() {
        let mut univ = Universe::new(0);
        write(&mut univ, 0, "dimmer", PropertyValue::Unipolar(1.0));
        assert_eq!(255, univ.channels()[0]);
        assert_eq!(1, univ.channels().iter().filter(|v| **v != 0).count());
    }
}
