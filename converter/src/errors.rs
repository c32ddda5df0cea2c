use crate::unit::Unit;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Unknown temperature unit: {0}")]
    UnknownUnit(String),

    #[error("Temperature {value} {unit} is below absolute zero")]
    BelowAbsoluteZero { value: f64, unit: Unit },
}

pub type Result<T> = std::result::Result<T, Error>;
