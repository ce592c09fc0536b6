//! CLI configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use haloctl_core::{LoginCredentials, TokenHeader};
use haloctl_core::releases::{DEFAULT_GITHUB_API, DEFAULT_RELEASES_REPO};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Halo admin API root, e.g. `http://localhost:8090/api/admin`.
    pub base_url: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Header carrying the access token.
    pub token_header: TokenHeader,

    pub refresh_timeout_secs: u64,
    pub request_timeout_secs: u64,

    /// Persist tokens in the OS keyring rather than in memory.
    pub prefer_keyring: bool,

    pub github_api_url: String,
    /// `owner/name` of the repository whose releases are listed.
    pub releases_repo: String,

    pub log_level: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090/api/admin".to_string(),
            username: None,
            password: None,
            token_header: TokenHeader::halo_admin(),
            refresh_timeout_secs: 30,
            request_timeout_secs: 30,
            prefer_keyring: true,
            github_api_url: DEFAULT_GITHUB_API.to_string(),
            releases_repo: DEFAULT_RELEASES_REPO.to_string(),
            log_level: "info".to_string(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Override fields from `HALOCTL_*` variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("HALOCTL_BASE_URL") {
            self.base_url = url;
        }
        if let Some(username) = lookup("HALOCTL_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = lookup("HALOCTL_PASSWORD") {
            self.password = Some(password);
        }
    }

    /// Credentials for the login fallback, when both halves are configured.
    pub fn login_credentials(&self) -> Option<LoginCredentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(LoginCredentials::new(username, password)),
            _ => None,
        }
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load configuration from `path`, or the default location, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path(),
    };

    let mut config = load_from_path(&config_path)?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

fn load_from_path(config_path: &Path) -> Result<Config> {
    let mut config = if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        Config::default()
    };

    config.config_path = config_path.to_path_buf();
    Ok(config)
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("com", "raibid-labs", "haloctl")
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("haloctl.toml"))
}
