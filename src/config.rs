//! Application-level configuration loading for the progression engine.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "MATCHFLOW_BACK_CONFIG_PATH";

const DEFAULT_SSE_CAPACITY: usize = 16;
const DEFAULT_SEED_GROUP_SIZE: u32 = 4;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    sse_public_capacity: usize,
    sse_admin_capacity: usize,
    default_seed_group_size: u32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in
    /// defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Broadcast channel capacity of the public SSE hub.
    pub fn sse_public_capacity(&self) -> usize {
        self.sse_public_capacity
    }

    /// Broadcast channel capacity of the admin SSE hub.
    pub fn sse_admin_capacity(&self) -> usize {
        self.sse_admin_capacity
    }

    /// Seed group size applied when a seeded pairing mode does not carry one.
    pub fn default_seed_group_size(&self) -> u32 {
        self.default_seed_group_size
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sse_public_capacity: DEFAULT_SSE_CAPACITY,
            sse_admin_capacity: DEFAULT_SSE_CAPACITY,
            default_seed_group_size: DEFAULT_SEED_GROUP_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    sse_public_capacity: Option<usize>,
    #[serde(default)]
    sse_admin_capacity: Option<usize>,
    #[serde(default)]
    default_seed_group_size: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            sse_public_capacity: value
                .sse_public_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_public_capacity),
            sse_admin_capacity: value
                .sse_admin_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_admin_capacity),
            default_seed_group_size: value
                .default_seed_group_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.default_seed_group_size),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
