//! # litmap common library
//!
//! Shared code for the litmap crates:
//! - Common error type
//! - TOML bootstrap configuration, file discovery and atomic writes
//! - Geocoder API key resolution

pub mod config;
pub mod error;

pub use config::{CountryField, TomlConfig};
pub use error::{Error, Result};
