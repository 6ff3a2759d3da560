// src/config/mod.rs

//! Configuration loading and validation for domwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or a string (`loader.rs`).
//! - Validate the data-connector endpoint and query parameters
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, DataConnectorSection, LoggingSection, RawConfigFile};
pub use validate::validate_config;
