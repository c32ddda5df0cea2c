//! Presentation hints derived from the current input: which thermometer icon to
//! show, which colour band the background falls into, and the reference points
//! offered as one-click presets.

use crate::unit::{convert_input, parse_number, ConvertedValues, Reading, Unit};
use crate::errors::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalIcon {
    Warm,
    Cool,
}

impl ThermalIcon {
    pub fn for_celsius(celsius: f64) -> Self {
        if celsius > 25.0 {
            ThermalIcon::Warm
        } else {
            ThermalIcon::Cool
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBand {
    Neutral,
    Hot,
    Warm,
    Mild,
    Cold,
}

impl ColorBand {
    pub fn for_celsius(celsius: f64) -> Self {
        if celsius > 35.0 {
            ColorBand::Hot
        } else if celsius > 20.0 {
            ColorBand::Warm
        } else if celsius > 10.0 {
            ColorBand::Mild
        } else {
            ColorBand::Cold
        }
    }
}

/// Everything the converter card needs to render one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayState {
    pub input_unit: Unit,
    pub values: ConvertedValues,
    pub icon: Option<ThermalIcon>,
    pub band: ColorBand,
}

impl DisplayState {
    /// Fails only when the input is numeric and below absolute zero.
    pub fn from_input(text: &str, unit: Unit) -> Result<Self> {
        let values = convert_input(text, unit)?;
        let state = match parse_number(text) {
            Some(value) => {
                let celsius = Reading::new(value, unit)?.celsius();
                Self {
                    input_unit: unit,
                    values,
                    icon: Some(ThermalIcon::for_celsius(celsius)),
                    band: ColorBand::for_celsius(celsius),
                }
            }
            None => Self {
                input_unit: unit,
                values,
                icon: None,
                band: ColorBand::Neutral,
            },
        };
        Ok(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferencePoint {
    pub celsius: f64,
    pub description: &'static str,
}

impl ReferencePoint {
    pub fn reading(&self) -> Result<Reading> {
        Reading::new(self.celsius, Unit::Celsius)
    }
}

pub const REFERENCE_POINTS: [ReferencePoint; 5] = [
    ReferencePoint {
        celsius: 100.0,
        description: "Water boils",
    },
    ReferencePoint {
        celsius: 0.0,
        description: "Water freezes",
    },
    ReferencePoint {
        celsius: 37.0,
        description: "Normal body temperature",
    },
    ReferencePoint {
        celsius: 20.0,
        description: "Room temperature",
    },
    ReferencePoint {
        celsius: -273.15,
        description: "Absolute zero",
    },
];
