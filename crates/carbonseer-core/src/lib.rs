//! carbonseer-core — configuration and shared types for the CarbonSeer
//! carbon-aware replica controller.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ControllerConfig, Weights};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
