//! PathForge Settings Crate
//!
//! Loads, validates and saves the tuning knobs of the route, extrusion and
//! placement stages.

pub mod config;
pub mod error;

pub use config::{Config, ExtrusionSettings, PlacementSettings, RouteSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
