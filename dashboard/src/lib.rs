//! Cold-chain telemetry dashboard core.
//!
//! Recorded telemetry, alerts and the route track come in through
//! [`source::DataService`]; [`derive`] turns a device's sample sequence into
//! the figures the dashboard shows, and [`rest`] serves them as JSON.

pub mod cache;
pub mod config;
pub mod derive;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod rest;
pub mod source;
pub mod upload;
pub mod validate;
