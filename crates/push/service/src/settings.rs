//! Service settings.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use push_core::PushError;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional TOML settings file.
pub const CONFIG_PATH_VAR: &str = "PAWPUSH_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Config file not found at {0}")]
    NotFound(PathBuf),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Server-side settings.
///
/// Secrets are optional here; a missing one is reported per request as a
/// configuration error rather than refusing to start.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    /// Shared secret identifying privileged callers.
    pub supabase_service_role_key: Option<String>,
    /// Use a local SQLite database instead of Supabase.
    pub database_url: Option<String>,
    pub firebase_service_account_json: Option<String>,
    pub firebase_project_id: Option<String>,
    pub fcm_base_url: Option<String>,
    /// Maximum sends in flight for one request.
    pub dispatch_concurrency: usize,
    pub bind_addr: SocketAddr,
}

/// Which store backs identity and token lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Supabase,
    Sqlite { database_url: String },
}

/// Secrets every request needs, borrowed from [`Settings`].
#[derive(Debug, Clone, Copy)]
pub struct RequiredSettings<'a> {
    pub privileged_key: &'a str,
    pub service_account_json: &'a str,
    pub project_id: Option<&'a str>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            supabase_service_role_key: None,
            database_url: None,
            firebase_service_account_json: None,
            firebase_project_id: None,
            fcm_base_url: None,
            dispatch_concurrency: 1,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = |v: &Option<String>| v.as_ref().map(|_| "<set>");
        f.debug_struct("Settings")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &set(&self.supabase_anon_key))
            .field("supabase_service_role_key", &set(&self.supabase_service_role_key))
            .field("database_url", &self.database_url)
            .field(
                "firebase_service_account_json",
                &set(&self.firebase_service_account_json),
            )
            .field("firebase_project_id", &self.firebase_project_id)
            .field("fcm_base_url", &self.fcm_base_url)
            .field("dispatch_concurrency", &self.dispatch_concurrency)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Settings {
    /// Load settings from the file named by `PAWPUSH_CONFIG`, if any, then
    /// apply environment overrides.
    pub fn resolve() -> Result<Self, ConfigError> {
        let settings = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        settings.with_env(|name| std::env::var(name).ok())
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Override fields from environment variables. Empty values are ignored.
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let strings = [
            ("SUPABASE_URL", &mut self.supabase_url),
            ("SUPABASE_ANON_KEY", &mut self.supabase_anon_key),
            ("SUPABASE_SERVICE_ROLE_KEY", &mut self.supabase_service_role_key),
            ("DATABASE_URL", &mut self.database_url),
            (
                "FIREBASE_SERVICE_ACCOUNT_JSON",
                &mut self.firebase_service_account_json,
            ),
            ("FIREBASE_PROJECT_ID", &mut self.firebase_project_id),
            ("FCM_BASE_URL", &mut self.fcm_base_url),
        ];
        for (name, field) in strings {
            if let Some(value) = var(name) {
                *field = Some(value);
            }
        }

        if let Some(value) = var("PAWPUSH_DISPATCH_CONCURRENCY") {
            self.dispatch_concurrency = value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "PAWPUSH_DISPATCH_CONCURRENCY",
                    value,
                })?;
        }

        if let Some(value) = var("PAWPUSH_BIND_ADDR") {
            self.bind_addr = value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PAWPUSH_BIND_ADDR",
                value,
            })?;
        }

        Ok(self)
    }

    /// Store backend selected by these settings.
    pub fn backend(&self) -> Backend {
        match non_empty(&self.database_url) {
            Some(url) => Backend::Sqlite {
                database_url: url.to_string(),
            },
            None => Backend::Supabase,
        }
    }

    /// Check that everything a request needs is configured.
    pub fn require(&self) -> Result<RequiredSettings<'_>, PushError> {
        let privileged_key = non_empty(&self.supabase_service_role_key);

        let privileged_key = match self.backend() {
            Backend::Supabase => {
                let complete = non_empty(&self.supabase_url).is_some()
                    && non_empty(&self.supabase_anon_key).is_some();
                privileged_key.filter(|_| complete).ok_or_else(|| {
                    PushError::Configuration("Supabase environment is incomplete.".to_string())
                })?
            }
            Backend::Sqlite { .. } => privileged_key.ok_or_else(|| {
                PushError::Configuration("SUPABASE_SERVICE_ROLE_KEY is missing.".to_string())
            })?,
        };

        let service_account_json =
            non_empty(&self.firebase_service_account_json).ok_or_else(|| {
                PushError::Configuration("FIREBASE_SERVICE_ACCOUNT_JSON is missing.".to_string())
            })?;

        Ok(RequiredSettings {
            privileged_key,
            service_account_json,
            project_id: non_empty(&self.firebase_project_id),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
