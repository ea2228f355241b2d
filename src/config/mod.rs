//! Configuration module for pagegrep
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use pagegrep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pagegrep.toml")).unwrap();
//! println!("Scanning with {} workers", config.scan.worker_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ScanConfig, TransportConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
