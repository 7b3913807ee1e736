//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level config struct, logging config and file loading
//! - [`store`]: Backing store selection and connection parameters (StoreConfig)
//! - [`validation`]: Startup checks that report every problem at once

mod store;
mod types;
mod validation;

pub use store::{Backend, StoreConfig};
pub use types::{Config, ConfigError, LogConfig, LogFormat};
pub use validation::{ValidationError, validate};
