//! Wire framing for DMX bridges.

use serde::Deserialize;
use strum_macros::{Display as EnumDisplay, EnumString};

use crate::dmx::{DmxBuffer, UNIVERSE_SIZE};

const ENTTEC_START_OF_MESSAGE: u8 = 0x7E;
const ENTTEC_END_OF_MESSAGE: u8 = 0xE7;
/// Output Only Send DMX Packet Request.
const ENTTEC_SEND_DMX_LABEL: u8 = 6;
const DMX_NULL_START_CODE: u8 = 0x00;

/// The framing a bridge expects around the 512 channel bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, EnumString, EnumDisplay)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Driver {
    /// Enttec DMX USB Pro widget protocol, also spoken by most Arduino bridge sketches.
    #[default]
    EnttecPro,
    /// The null start code followed by the channel data.
    Raw,
}

impl Driver {
    /// Wrap a universe in this driver's framing.
    pub fn encode(&self, channels: &DmxBuffer) -> Vec<u8> {
        match self {
            Self::EnttecPro => {
                let len = (UNIVERSE_SIZE + 1) as u16;
                let mut frame = Vec::with_capacity(UNIVERSE_SIZE + 6);
                frame.push(ENTTEC_START_OF_MESSAGE);
                frame.push(ENTTEC_SEND_DMX_LABEL);
                frame.extend_from_slice(&len.to_le_bytes());
                frame.push(DMX_NULL_START_CODE);
                frame.extend_from_slice(channels);
                frame.push(ENTTEC_END_OF_MESSAGE);
                frame
            }
            Self::Raw => {
                let mut frame = Vec::with_capacity(UNIVERSE_SIZE + 1);
                frame.push(DMX_NULL_START_CODE);
                frame.extend_from_slice(channels);
                frame
            }
        }
    }
}
