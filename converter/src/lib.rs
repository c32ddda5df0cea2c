//! Temperature conversion between Celsius, Fahrenheit and Kelvin.
//!
//! Every conversion pivots through Celsius at full precision; rounding to two
//! decimals only happens when values are formatted for display.

pub mod display;
pub mod errors;
pub mod unit;

pub use display::{ColorBand, DisplayState, ReferencePoint, ThermalIcon, REFERENCE_POINTS};
pub use errors::{Error, Result};
pub use unit::{
    convert, convert_input, is_valid, is_valid_input, parse_number, ConvertedValues, Reading,
    Unit, ABSOLUTE_ZERO_CELSIUS,
};
