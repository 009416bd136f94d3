//! Configuration and profile management
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Named profiles hold the New Relic account, API key and region together
//! with a default AWS profile and region, so repeated commands against the
//! same accounts need no flags.
//!
//! # Features
//!
//! - Multiple named profiles with a selectable default
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

pub mod config;
pub mod error;

pub use config::{Config, Profile};
pub use error::{ConfigError, Result};
