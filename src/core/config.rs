//! Runtime configuration
//!
//! Everything that used to be ambient (credential, endpoints, timeouts, the
//! extraction policy) is gathered into one [`Config`] that is passed to each
//! component explicitly. Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `speedclone/config.toml` in each `$XDG_CONFIG_DIRS` entry, then `$XDG_CONFIG_HOME`
//! 3. environment (`GITHUB_TOKEN`, `SPEEDCLONE_HTTP_TIMEOUT`)
//! 4. command-line flags, applied by the binary
//!
//! ```toml
//! # ~/.config/speedclone/config.toml
//! read_timeout_secs = 300
//! strict = true
//! progress = false
//! ```

use crate::error::{Error, Result};
use crate::extract::ExtractPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default GitHub REST API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Default GitHub website base URL (HTML fallback)
pub const DEFAULT_WEB_BASE: &str = "https://github.com";

/// Default archive-delivery base URL
pub const DEFAULT_ARCHIVE_BASE: &str = "https://codeload.github.com";

/// Environment variable holding the optional bearer token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable overriding the read timeout, in seconds
pub const TIMEOUT_ENV: &str = "SPEEDCLONE_HTTP_TIMEOUT";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub web_base: String,
    pub archive_base: String,
    /// Bearer credential attached to API requests only.
    pub token: Option<String>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Per-read timeout; a large archive may take far longer overall.
    pub read_timeout: Duration,
    pub policy: ExtractPolicy,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            archive_base: DEFAULT_ARCHIVE_BASE.to_string(),
            token: None,
            user_agent: default_user_agent(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            policy: ExtractPolicy::default(),
            show_progress: true,
        }
    }
}

/// The fixed client string sent with every request.
pub fn default_user_agent() -> String {
    format!("speedclone/{}", env!("CARGO_PKG_VERSION"))
}

/// Clamp a timeout to a reasonable range (5 seconds to 1 hour).
fn clamp_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(5, 3600))
}

impl Config {
    /// Load configuration from config files and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `env` to look up environment variables.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::from_files(&find_config_files(&env))?;

        if let Some(token) = env(TOKEN_ENV) {
            config = config.with_token(Some(token));
        }
        if let Some(secs) = env(TIMEOUT_ENV).and_then(|s| s.trim().parse::<u64>().ok()) {
            config.read_timeout = clamp_timeout(secs);
        }

        Ok(config)
    }

    /// Build a configuration from defaults plus the given TOML files.
    ///
    /// Missing files are ignored; later files override earlier ones.
    pub fn from_files(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = ConfigToml::default();
        for path in paths {
            if !path.exists() {
                continue;
            }
            merged.merge(read_toml(path)?);
        }

        let mut config = Config::default();
        merged.apply(&mut config);
        Ok(config)
    }

    /// Set the bearer token, treating an empty value as absent.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Override the read timeout in seconds (clamped).
    pub fn with_read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout = clamp_timeout(secs);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    api_base: Option<String>,
    web_base: Option<String>,
    archive_base: Option<String>,
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
    strict: Option<bool>,
    progress: Option<bool>,
}

impl ConfigToml {
    fn merge(&mut self, other: ConfigToml) {
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.web_base.is_some() {
            self.web_base = other.web_base;
        }
        if other.archive_base.is_some() {
            self.archive_base = other.archive_base;
        }
        if other.connect_timeout_secs.is_some() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        if other.read_timeout_secs.is_some() {
            self.read_timeout_secs = other.read_timeout_secs;
        }
        if other.strict.is_some() {
            self.strict = other.strict;
        }
        if other.progress.is_some() {
            self.progress = other.progress;
        }
    }

    fn apply(self, config: &mut Config) {
        if let Some(base) = self.api_base {
            config.api_base = trim_base(&base);
        }
        if let Some(base) = self.web_base {
            config.web_base = trim_base(&base);
        }
        if let Some(base) = self.archive_base {
            config.archive_base = trim_base(&base);
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.connect_timeout = clamp_timeout(secs);
        }
        if let Some(secs) = self.read_timeout_secs {
            config.read_timeout = clamp_timeout(secs);
        }
        if self.strict == Some(true) {
            config.policy = ExtractPolicy::strict();
        }
        if let Some(progress) = self.progress {
            config.show_progress = progress;
        }
    }
}

fn trim_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn read_toml(path: &Path) -> Result<ConfigToml> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str::<ConfigToml>(&text)
        .map_err(|e| Error::Config(format!("invalid TOML in {}: {e}", path.display())))
}

fn find_config_files(env: &impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let system_dirs = env("XDG_CONFIG_DIRS").unwrap_or_else(|| "/etc/xdg".to_owned());
    for dir in system_dirs
        .split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        paths.push(PathBuf::from(dir).join("speedclone").join("config.toml"));
    }

    let home = env("XDG_CONFIG_HOME")
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from(".").join(".config"));
    paths.push(home.join("speedclone").join("config.toml"));

    paths
}
