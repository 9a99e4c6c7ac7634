// ⚙️ Configuration - TOML file + environment overrides
//
// Lookup order: NEURAZOR_CONFIG (or ./neurazor.toml when present), then
// environment variables, which win. A missing default file is not an error;
// every field has a default.

use crate::mock_data::DEFAULT_HISTORY_DAYS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "neurazor.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("auth provider 'supabase' requires {0}")]
    MissingSupabase(&'static str),
}

// ============================================================================
// SECTIONS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Browser sessions unused for this long are dropped by the sweeper
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_session_idle_timeout_secs() -> u64 {
    1_800
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    #[default]
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub provider: AuthProviderKind,

    #[serde(default)]
    pub supabase_url: Option<String>,

    #[serde(default)]
    pub supabase_anon_key: Option<String>,

    /// Upper bound on a single role lookup
    #[serde(default = "default_role_check_timeout_ms")]
    pub role_check_timeout_ms: u64,

    /// Upper bound on the initial session check
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Accounts for the in-memory provider
    #[serde(default)]
    pub users: Vec<UserAccount>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            provider: AuthProviderKind::default(),
            supabase_url: None,
            supabase_anon_key: None,
            role_check_timeout_ms: default_role_check_timeout_ms(),
            session_timeout_ms: default_session_timeout_ms(),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    pub fn role_check_timeout(&self) -> Duration {
        Duration::from_millis(self.role_check_timeout_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }
}

fn default_role_check_timeout_ms() -> u64 { 3_000 }
fn default_session_timeout_ms() -> u64 { 5_000 }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Fixed seed for reproducible mock data
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            seed: None,
            history_days: default_history_days(),
        }
    }
}

fn default_history_days() -> u32 { DEFAULT_HISTORY_DAYS }

// ============================================================================
// LOADING
// ============================================================================

impl AppConfig {
    /// Load `.env`, the config file and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("loaded environment from {}", path.display());
        }

        let explicit = std::env::var("NEURAZOR_CONFIG").ok();
        let mut config = match &explicit {
            Some(path) => Self::from_file(Path::new(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => AppConfig::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        info!(
            provider = ?config.auth.provider,
            bind = %config.server.bind,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = first_of(&lookup, &["SUPABASE_URL", "VITE_SUPABASE_URL"]) {
            self.auth.supabase_url = Some(url);
        }
        if let Some(key) = first_of(&lookup, &["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]) {
            self.auth.supabase_anon_key = Some(key);
        }
        if let Some(provider) = lookup("NEURAZOR_AUTH_PROVIDER") {
            self.auth.provider = match provider.to_lowercase().as_str() {
                "supabase" => AuthProviderKind::Supabase,
                "memory" => AuthProviderKind::Memory,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: "NEURAZOR_AUTH_PROVIDER".to_string(),
                        value: provider,
                    })
                }
            };
        }
        if let Some(bind) = lookup("NEURAZOR_BIND") {
            self.server.bind = bind;
        }
        if let Some(seed) = lookup("NEURAZOR_DATA_SEED") {
            let parsed = seed.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "NEURAZOR_DATA_SEED".to_string(),
                value: seed.clone(),
            })?;
            self.data.seed = Some(parsed);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.provider == AuthProviderKind::Supabase {
            if self.auth.supabase_url.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingSupabase("SUPABASE_URL"));
            }
            if self.auth.supabase_anon_key.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingSupabase("SUPABASE_ANON_KEY"));
            }
        }
        Ok(())
    }
}

fn first_of<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|&key| lookup(key))
}
