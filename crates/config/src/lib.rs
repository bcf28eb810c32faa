//! Configuration for the realty chat agent
//!
//! Two concerns live here:
//! - `Settings`: layered runtime configuration (files, then `REALTY_*`
//!   environment overrides, with API keys from plain env vars).
//! - `CodeTables`: the provider's name-to-code mapping tables (districts,
//!   developers, facilities, bedroom labels, apartment types, cities), loaded
//!   from a YAML data asset and queried with fuzzy matching.

pub mod settings;
pub mod tables;

pub use settings::{
    load_settings, CatalogSettings, GatewaySettings, LlmSettings, SearchSettings, ServerSettings,
    SessionSettings, Settings, ToolsSettings,
};
pub use tables::{similarity, CodeTables, TableMatch};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to load code tables from {path}: {message}")]
    Tables { path: String, message: String },
}
