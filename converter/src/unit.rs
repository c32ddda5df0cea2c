use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ABSOLUTE_ZERO_CELSIUS: f64 = -273.15;

// Slack for Fahrenheit input, whose conversion cannot land exactly on 0 K.
const KELVIN_FLOOR_TOLERANCE: f64 = 1e-9;

/// Temperature scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Celsius, Unit::Fahrenheit, Unit::Kelvin];

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kelvin => "K",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Celsius => "celsius",
            Unit::Fahrenheit => "fahrenheit",
            Unit::Kelvin => "kelvin",
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            Unit::Celsius => value,
            Unit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Unit::Kelvin => value - 273.15,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Unit::Celsius => celsius,
            Unit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Unit::Kelvin => celsius + 273.15,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celsius" | "c" | "°c" => Ok(Unit::Celsius),
            "fahrenheit" | "f" | "°f" => Ok(Unit::Fahrenheit),
            "kelvin" | "k" => Ok(Unit::Kelvin),
            _ => Err(Error::UnknownUnit(s.to_string())),
        }
    }
}

/// Converts `value` from one unit to another through the Celsius pivot.
///
/// Converting to the same unit returns the input untouched.
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }
    to.from_celsius(from.to_celsius(value))
}

/// Returns false when `value` in `from` lies below absolute zero.
pub fn is_valid(value: f64, from: Unit) -> bool {
    match from {
        Unit::Kelvin => value >= 0.0,
        Unit::Celsius => value >= ABSOLUTE_ZERO_CELSIUS,
        Unit::Fahrenheit => convert(value, from, Unit::Kelvin) >= -KELVIN_FLOOR_TOLERANCE,
    }
}

/// Input-box rule: text that is not a number is accepted (it is shown as a
/// placeholder later), numeric text must not be below absolute zero.
pub fn is_valid_input(text: &str, from: Unit) -> bool {
    match parse_number(text) {
        Some(value) => is_valid(value, from),
        None => true,
    }
}

/// Parses user input into a finite number.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A temperature that has passed the absolute zero check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    value: f64,
    unit: Unit,
}

impl Reading {
    pub fn new(value: f64, unit: Unit) -> Result<Self> {
        if !value.is_finite() || !is_valid(value, unit) {
            return Err(Error::BelowAbsoluteZero { value, unit });
        }
        Ok(Self { value, unit })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn to(&self, unit: Unit) -> f64 {
        convert(self.value, self.unit, unit)
    }

    pub fn celsius(&self) -> f64 {
        self.to(Unit::Celsius)
    }

    /// Values in all three units, formatted to two decimals.
    pub fn converted(&self) -> ConvertedValues {
        ConvertedValues {
            celsius: format_value(self.to(Unit::Celsius)),
            fahrenheit: format_value(self.to(Unit::Fahrenheit)),
            kelvin: format_value(self.to(Unit::Kelvin)),
        }
    }
}

/// Display strings for each unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedValues {
    pub celsius: String,
    pub fahrenheit: String,
    pub kelvin: String,
}

impl ConvertedValues {
    pub const PLACEHOLDER: &'static str = "-";

    pub fn placeholder() -> Self {
        Self {
            celsius: Self::PLACEHOLDER.to_string(),
            fahrenheit: Self::PLACEHOLDER.to_string(),
            kelvin: Self::PLACEHOLDER.to_string(),
        }
    }

    pub fn get(&self, unit: Unit) -> &str {
        match unit {
            Unit::Celsius => &self.celsius,
            Unit::Fahrenheit => &self.fahrenheit,
            Unit::Kelvin => &self.kelvin,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.celsius == Self::PLACEHOLDER
    }
}

/// Converts raw input text. Non-numeric text yields placeholders rather than
/// an error; numbers below absolute zero are rejected.
pub fn convert_input(text: &str, from: Unit) -> Result<ConvertedValues> {
    match parse_number(text) {
        Some(value) => Ok(Reading::new(value, from)?.converted()),
        None => Ok(ConvertedValues::placeholder()),
    }
}

fn format_value(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    // "-0.00" reads oddly next to the other cards
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_known_points() {
        assert_eq!(convert(0.0, Unit::Celsius, Unit::Fahrenheit), 32.0);
        assert!(approx(convert(100.0, Unit::Celsius, Unit::Kelvin), 373.15));
        assert_eq!(convert(-40.0, Unit::Celsius, Unit::Fahrenheit), -40.0);
        assert!(approx(convert(212.0, Unit::Fahrenheit, Unit::Celsius), 100.0));
        assert!(approx(convert(0.0, Unit::Kelvin, Unit::Celsius), ABSOLUTE_ZERO_CELSIUS));
    }

    #[test]
    fn test_identity_is_exact() {
        for unit in Unit::ALL {
            for value in [0.1, -17.777, 98.6, 1e6, 273.15] {
                assert_eq!(convert(value, unit, unit), value);
            }
        }
    }

    #[test]
    fn test_round_trip_between_units() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let value: f64 = rng.gen_range(-500.0..5000.0);
            for a in Unit::ALL {
                for b in Unit::ALL {
                    let back = convert(convert(value, a, b), b, a);
                    assert!((back - value).abs() < 1e-9, "{value} {a:?}->{b:?} gave {back}");
                }
            }
        }
    }

    #[test]
    fn test_absolute_zero_floor() {
        assert!(!is_valid(-274.0, Unit::Celsius));
        assert!(is_valid(-273.15, Unit::Celsius));
        assert!(is_valid(-459.67, Unit::Fahrenheit));
        assert!(!is_valid(-460.0, Unit::Fahrenheit));
        assert!(is_valid(0.0, Unit::Kelvin));
        assert!(!is_valid(-0.01, Unit::Kelvin));
    }

    #[test]
    fn test_floor_is_strict_outside_fahrenheit() {
        assert!(!is_valid(-1e-10, Unit::Kelvin));
        assert!(!is_valid(ABSOLUTE_ZERO_CELSIUS - 1e-10, Unit::Celsius));
        assert!(is_valid(-0.0, Unit::Kelvin));
        assert!(!is_valid(f64::NAN, Unit::Kelvin));
        assert!(!is_valid(-459.68, Unit::Fahrenheit));
    }

    #[test]
    fn test_reading_rejects_below_absolute_zero() {
        let err = Reading::new(-300.0, Unit::Celsius).unwrap_err();
        assert_eq!(
            err,
            Error::BelowAbsoluteZero {
                value: -300.0,
                unit: Unit::Celsius
            }
        );
        assert!(Reading::new(f64::NAN, Unit::Kelvin).is_err());
    }

    #[test]
    fn test_converted_values_are_two_decimals() {
        let values = Reading::new(37.0, Unit::Celsius).unwrap().converted();
        assert_eq!(values.celsius, "37.00");
        assert_eq!(values.fahrenheit, "98.60");
        assert_eq!(values.kelvin, "310.15");
    }

    #[test]
    fn test_non_numeric_input_is_placeholder() {
        let values = convert_input("abc", Unit::Celsius).unwrap();
        assert!(values.is_placeholder());
        assert_eq!(values.get(Unit::Kelvin), "-");
        assert!(convert_input("", Unit::Kelvin).unwrap().is_placeholder());
        assert!(is_valid_input("not a number", Unit::Celsius));
    }

    #[test]
    fn test_input_below_absolute_zero_is_rejected() {
        assert!(!is_valid_input("-500", Unit::Fahrenheit));
        assert!(convert_input("-1", Unit::Kelvin).is_err());
        assert_eq!(
            convert_input(" 32 ", Unit::Fahrenheit).unwrap().celsius,
            "0.00"
        );
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("Celsius".parse::<Unit>().unwrap(), Unit::Celsius);
        assert_eq!("°F".parse::<Unit>().unwrap(), Unit::Fahrenheit);
        assert_eq!("k".parse::<Unit>().unwrap(), Unit::Kelvin);
        assert!(matches!("rankine".parse::<Unit>(), Err(Error::UnknownUnit(_))));
    }

    #[test]
    fn test_unit_serde_names() {
        assert_eq!(serde_json::to_string(&Unit::Kelvin).unwrap(), "\"kelvin\"");
        let unit: Unit = serde_json::from_str("\"fahrenheit\"").unwrap();
        assert_eq!(unit, Unit::Fahrenheit);
    }
}
