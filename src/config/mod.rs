//! TSA Configuration Module
//!
//! Provides run configuration loaded from TOML files: marker detection,
//! averaging methods and tolerances, and report output.
//!
//! ## Loading Order
//!
//! 1. `TSA_CONFIG` environment variable (path to TOML file)
//! 2. `tsa_config.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! ## Usage
//!
//! The configuration is an ordinary value handed to whatever needs it; the
//! averaging functions themselves only take the options they use.
//!
//! ```ignore
//! let config = TsaConfig::load();
//! let detector = acquisition::detector_from_config(&config.markers);
//! let options = config.frequency_domain_options();
//! ```

pub mod defaults;
mod tsa_config;
pub mod validation;

pub use tsa_config::*;
