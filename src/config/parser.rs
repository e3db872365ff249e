use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Environment variable names recognised as overrides
pub const ENV_STORE_URL: &str = "HARVEST_STORE_URL";
pub const ENV_STORE_DB: &str = "HARVEST_STORE_DB";
pub const ENV_CATEGORY_CAP: &str = "HARVEST_CATEGORY_CAP";
pub const ENV_CONCURRENCY: &str = "HARVEST_CONCURRENCY";
pub const ENV_BASE_DELAY_MS: &str = "HARVEST_BASE_DELAY_MS";
pub const ENV_MAX_DELAY_MS: &str = "HARVEST_MAX_DELAY_MS";
pub const ENV_USER_AGENTS: &str = "HARVEST_USER_AGENTS";
pub const ENV_INDEX_URL: &str = "HARVEST_INDEX_URL";

/// Env file read from the working directory
pub const ENV_FILE: &str = ".env";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use accord_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Per-category cap: {}", config.crawler.per_category_cap);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config_file(path)?;
    validate(&config)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs made with different settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Builds the effective configuration from an optional file and the environment
///
/// Order of precedence (highest first): environment variables (including a `.env`
/// file in the working directory), the TOML file, built-in defaults.
///
/// Returns the configuration and the file hash, if a file was given.
pub fn load_effective_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    load_env_file(Path::new(ENV_FILE))?;

    let (mut config, hash) = match path {
        Some(path) => (read_config_file(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate(&config)?;

    Ok((config, hash))
}

/// Loads variables from an env file into the process environment
///
/// A missing file is skipped. A file that exists but cannot be read or parsed is an
/// error. Variables already set in the environment are not overwritten.
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Applies environment-style overrides to a configuration
///
/// `lookup` returns the value of a variable, if set. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(value) = get(ENV_STORE_URL) {
        config.store.connection = value;
    }
    if let Some(value) = get(ENV_STORE_DB) {
        config.store.database = value;
    }
    if let Some(value) = get(ENV_CATEGORY_CAP) {
        config.crawler.per_category_cap = parse_env(ENV_CATEGORY_CAP, &value)?;
    }
    if let Some(value) = get(ENV_CONCURRENCY) {
        config.crawler.concurrency = parse_env(ENV_CONCURRENCY, &value)?;
    }
    if let Some(value) = get(ENV_BASE_DELAY_MS) {
        config.crawler.base_delay_ms = parse_env(ENV_BASE_DELAY_MS, &value)?;
    }
    if let Some(value) = get(ENV_MAX_DELAY_MS) {
        config.crawler.max_delay_ms = parse_env(ENV_MAX_DELAY_MS, &value)?;
    }
    if let Some(value) = get(ENV_USER_AGENTS) {
        config.identity.user_agents = value
            .split('|')
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(value) = get(ENV_INDEX_URL) {
        config.site.index_url = value;
    }

    Ok(())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}
