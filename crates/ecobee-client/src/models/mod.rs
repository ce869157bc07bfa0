//! Data models for the ecobee thermostat API.
//!
//! All response models use `#[serde(default)]` so missing fields decode to empty values,
//! and `camelCase` renaming to match API naming.

mod selection;
mod thermostat;

pub use selection::{Selection, SelectionType};
pub use thermostat::{
    ApiStatus, Page, RemoteSensor, Revision, Runtime, SensorCapability, Thermostat,
    ThermostatPage, ThermostatSummary,
};
