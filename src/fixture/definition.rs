//! The abstract contract every fixture model implements.
//!
//! A definition declares a set of named parameters, each bound to one or more
//! channel offsets relative to the fixture's base address, and knows how to
//! encode a property value into channel bytes.

use std::fmt::{Debug, Display};

use number::UnipolarFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dmx::{DmxIndexError, Universe};
use crate::util::unipolar_to_range;

/// The value of a single fixture property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Color([u8; 3]),
    /// A normalized value in 0-1; out of range values are clamped at encode time.
    Unipolar(f64),
    Select(String),
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Color([r, g, b]) => write!(f, "[{r}, {g}, {b}]"),
            Self::Unipolar(v) => write!(f, "{v}"),
            Self::Select(v) => f.write_str(v),
        }
    }
}

/// How a parameter's value maps onto its channels.
#[derive(Clone, Copy, Debug)]
pub enum ParamKind {
    /// Three channels, red/green/blue.
    Color,
    /// A normalized value scaled into an inclusive DMX range.
    Unipolar { start: u8, end: u8 },
    Bool { off: u8, on: u8 },
    /// A discrete choice between labeled DMX values.
    Select(&'static [(&'static str, u8)]),
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Unipolar { .. } => "unipolar",
            Self::Bool { .. } => "bool",
            Self::Select(_) => "select",
        }
    }
}

/// A named fixture parameter.
#[derive(Clone, Copy, Debug)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Channel offsets relative to the fixture's base address.
    pub channels: &'static [usize],
}

impl Param {
    pub const fn color(name: &'static str, channels: &'static [usize; 3]) -> Self {
        Self {
            name,
            kind: ParamKind::Color,
            channels,
        }
    }

    /// A unipolar parameter covering a whole channel.
    pub const fn unipolar(name: &'static str, channels: &'static [usize]) -> Self {
        Self::unipolar_range(name, channels, 0, 255)
    }

    pub const fn unipolar_range(
        name: &'static str,
        channels: &'static [usize],
        start: u8,
        end: u8,
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Unipolar { start, end },
            channels,
        }
    }

    pub const fn bool(name: &'static str, channels: &'static [usize], off: u8, on: u8) -> Self {
        Self {
            name,
            kind: ParamKind::Bool { off, on },
            channels,
        }
    }

    pub const fn select(
        name: &'static str,
        channels: &'static [usize],
        options: &'static [(&'static str, u8)],
    ) -> Self {
        Self {
            name,
            kind: ParamKind::Select(options),
            channels,
        }
    }

    /// Encode a value into one byte per channel of this parameter.
    pub fn encode(&self, value: &PropertyValue) -> Result<Vec<u8>, PropertyError> {
        let byte = match (&self.kind, value) {
            (ParamKind::Color, PropertyValue::Color(rgb)) => {
                return Ok(rgb.iter().copied().cycle().take(self.channels.len()).collect());
            }
            (ParamKind::Unipolar { start, end }, PropertyValue::Unipolar(v)) => {
                unipolar_to_range(*start, *end, UnipolarFloat::new(*v))
            }
            (ParamKind::Bool { off, on }, PropertyValue::Bool(v)) => {
                if *v {
                    *on
                } else {
                    *off
                }
            }
            (ParamKind::Select(options), PropertyValue::Select(label)) => options
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(label))
                .map(|(_, v)| *v)
                .ok_or_else(|| PropertyError::UnknownOption {
                    param: self.name,
                    label: label.clone(),
                })?,
            (kind, value) => {
                return Err(PropertyError::InvalidValue {
                    param: self.name,
                    expected: kind.name(),
                    value: value.clone(),
                })
            }
        };
        Ok(vec![byte; self.channels.len()])
    }

    /// The labels accepted by a select parameter.
    pub fn options(&self) -> Vec<&'static str> {
        match self.kind {
            ParamKind::Select(options) => options.iter().map(|(label, _)| *label).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PropertyError {
    #[error("{param} expects a {expected} value, got {value}")]
    InvalidValue {
        param: &'static str,
        expected: &'static str,
        value: PropertyValue,
    },
    #[error("{param} has no option \"{label}\"")]
    UnknownOption { param: &'static str, label: String },
    #[error(transparent)]
    Dmx(#[from] DmxIndexError),
}

/// The channels of a single patched fixture, addressed relative to its base address.
pub struct FixtureChannels<'a> {
    universe: &'a mut Universe,
    start: usize,
}

impl<'a> FixtureChannels<'a> {
    pub fn new(universe: &'a mut Universe, start: usize) -> Self {
        Self { universe, start }
    }

    pub fn write(&mut self, offset: usize, value: u8) -> Result<(), DmxIndexError> {
        self.universe.write(self.start + offset, value)
    }

    pub fn get(&self, offset: usize) -> Option<u8> {
        self.universe.get(self.start + offset)
    }
}

/// Static description of one fixture model.
pub trait FixtureDefinition: Debug + Send {
    /// The parameters this model declares, in display order.
    fn params(&self) -> &'static [Param];

    /// The number of contiguous DMX channels used by the fixture.
    fn channel_count(&self) -> usize;

    /// Weight in kilograms.
    fn weight(&self) -> f64;

    fn param(&self, name: &str) -> Option<&'static Param> {
        self.params().iter().find(|p| p.name == name)
    }

    /// Called after the generic write of a parameter's encoded bytes.
    /// Models whose sub-elements must follow one logical property override this.
    fn after_write(
        &self,
        _param: &Param,
        _encoded: &[u8],
        _channels: &mut FixtureChannels,
    ) -> Result<(), DmxIndexError> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PROGRAMS: &[(&str, u8)] = &[("off", 0), ("fade", 64), ("jump", 128)];

    #[test]
    fn test_encode_color() {
        let p = Param::color("color", &[0, 1, 2]);
        assert_eq!(
            vec![255, 0, 10],
            p.encode(&PropertyValue::Color([255, 0, 10])).unwrap()
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let params = [
            (Param::color("color", &[0, 1, 2]), PropertyValue::Color([1, 2, 3])),
            (Param::unipolar("dimmer", &[3]), PropertyValue::Unipolar(0.3)),
            (Param::bool("fog", &[4], 0, 200), PropertyValue::Bool(true)),
            (
                Param::select("program", &[5], PROGRAMS),
                PropertyValue::Select("jump".to_string()),
            ),
        ];
        for (param, value) in params {
            assert_eq!(param.encode(&value).unwrap(), param.encode(&value).unwrap());
        }
    }

    #[test]
    fn test_encode_unipolar_clamps() {
        let p = Param::unipolar_range("strobe", &[0], 10, 250);
        assert_eq!(vec![10], p.encode(&PropertyValue::Unipolar(0.0)).unwrap());
        assert_eq!(vec![250], p.encode(&PropertyValue::Unipolar(1.0)).unwrap());
        assert_eq!(vec![250], p.encode(&PropertyValue::Unipolar(3.0)).unwrap());
        assert_eq!(vec![10], p.encode(&PropertyValue::Unipolar(-1.0)).unwrap());
    }

    #[test]
    fn test_encode_fans_out_to_every_channel() {
        let p = Param::unipolar("uv", &[3, 9, 15]);
        assert_eq!(vec![255; 3], p.encode(&PropertyValue::Unipolar(1.0)).unwrap());
    }

    #[test]
    fn test_encode_select() {
        let p = Param::select("program", &[0], PROGRAMS);
        assert_eq!(
            vec![64],
            p.encode(&PropertyValue::Select("Fade".to_string())).unwrap()
        );
        assert_eq!(
            Err(PropertyError::UnknownOption {
                param: "program",
                label: "strobe".to_string()
            }),
            p.encode(&PropertyValue::Select("strobe".to_string()))
        );
        assert_eq!(vec!["off", "fade", "jump"], p.options());
    }

    #[test]
    fn test_encode_wrong_kind() {
        let p = Param::unipolar("dimmer", &[0]);
        assert!(matches!(
            p.encode(&PropertyValue::Color([0, 0, 0])),
            Err(PropertyError::InvalidValue {
                param: "dimmer",
                expected: "unipolar",
                ..
            })
        ));
    }

    #[test]
    fn test_parse_values() {
        let parse = |s: &str| serde_yaml::from_str::<PropertyValue>(s).unwrap();
        assert_eq!(PropertyValue::Color([255, 0, 0]), parse("[255, 0, 0]"));
        assert_eq!(PropertyValue::Unipolar(0.5), parse("0.5"));
        assert_eq!(PropertyValue::Unipolar(1.0), parse("1"));
        assert_eq!(PropertyValue::Bool(true), parse("true"));
        assert_eq!(PropertyValue::Select("fade".to_string()), parse("fade"));
    }
}
