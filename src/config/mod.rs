//! Configuration module for Accord-Harvest
//!
//! Settings come from an optional TOML file, overlaid with `HARVEST_*` environment
//! variables (a `.env` file is honoured), and are validated before use.
//!
//! # Example
//!
//! ```no_run
//! use accord_harvest::config::load_effective_config;
//! use std::path::Path;
//!
//! let (config, _hash) = load_effective_config(Some(Path::new("harvest.toml"))).unwrap();
//! println!("Concurrency: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, IdentityConfig, SiteConfig, StoreConfig};

pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_effective_config, load_env_file,
};
