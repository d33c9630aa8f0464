//! Configuration loading
//!
//! Each setting resolves with the following priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback, local development only)
//!
//! Levels 1 and 2 arrive together as [`ConfigOverrides`] (clap merges the
//! command line with the environment in rfdash-ui).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "RFDASH_CONFIG";

/// Development-only secret key used when nothing else is configured
pub const DEV_SECRET_KEY: &str = "rfdash-dev-secret-change-me";

/// Development-only bootstrap admin password
pub const DEV_BOOTSTRAP_PASSWORD: &str = "admin";

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub database_url: String,
    pub bind: String,
    pub max_upload_bytes: usize,
    pub password_hash_cost: u32,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            database_url: sqlite_url(&default_database_path()),
            bind: "127.0.0.1:5800".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            password_hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Settings read from the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub secret_key: Option<String>,
    pub database_url: Option<String>,
    pub bind: Option<String>,
    pub bootstrap_password: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub password_hash_cost: Option<u32>,
    pub reset_on_schema_drift: Option<bool>,
}

/// Settings supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub secret_key: Option<String>,
    pub database_url: Option<String>,
    pub bind: Option<String>,
    pub bootstrap_password: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub password_hash_cost: Option<u32>,
    pub reset_on_schema_drift: Option<bool>,
}

/// Fully resolved dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Key used to sign session cookies
    pub secret_key: String,
    /// sqlx SQLite connection string
    pub database_url: String,
    /// Listen address
    pub bind: String,
    /// Password given to the bootstrap admin on first run
    pub bootstrap_password: String,
    /// Upper bound on request bodies (uploads)
    pub max_upload_bytes: usize,
    /// bcrypt cost for new password hashes
    pub password_hash_cost: u32,
    /// Operator confirmation for destructive schema reset
    pub reset_on_schema_drift: bool,
}

impl DashboardConfig {
    /// Resolve configuration, reading the TOML file if one is present
    ///
    /// A missing config file is not an error; an unreadable or malformed
    /// one is.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match config_file_path() {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                Some(load_toml_config(&path)?)
            }
            None => None,
        };

        Ok(Self::resolve_with(overrides, toml_config))
    }

    /// Merge overrides, file settings and compiled defaults
    pub fn resolve_with(overrides: ConfigOverrides, toml_config: Option<TomlConfig>) -> Self {
        let file = toml_config.unwrap_or_default();
        let defaults = CompiledDefaults::for_current_platform();

        let secret_key = overrides
            .secret_key
            .or(file.secret_key)
            .unwrap_or_else(|| {
                warn!("No secret key configured - using development default. Set RFDASH_SECRET_KEY in production.");
                DEV_SECRET_KEY.to_string()
            });

        let bootstrap_password = overrides
            .bootstrap_password
            .or(file.bootstrap_password)
            .unwrap_or_else(|| DEV_BOOTSTRAP_PASSWORD.to_string());

        let password_hash_cost = overrides
            .password_hash_cost
            .or(file.password_hash_cost)
            .unwrap_or(defaults.password_hash_cost)
            .clamp(4, 31);

        Self {
            secret_key,
            database_url: overrides
                .database_url
                .or(file.database_url)
                .unwrap_or(defaults.database_url),
            bind: overrides.bind.or(file.bind).unwrap_or(defaults.bind),
            bootstrap_password,
            max_upload_bytes: overrides
                .max_upload_bytes
                .or(file.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            password_hash_cost,
            reset_on_schema_drift: overrides
                .reset_on_schema_drift
                .or(file.reset_on_schema_drift)
                .unwrap_or(false),
        }
    }

    /// True when the session signing key is the development default
    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

/// Locate the config file
///
/// `$RFDASH_CONFIG` wins when set; otherwise the per-user config directory,
/// then (Linux only) `/etc/rfdash/config.toml`. Returns `None` when no file
/// exists.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("rfdash").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/rfdash/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}

/// Build a read-write-create SQLite connection string for a file path
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}?mode=rwc", path.display())
}

/// Get OS-dependent default database path
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rfdash"))
        .unwrap_or_else(|| PathBuf::from("./rfdash_data"))
        .join("rfdash.db")
}
