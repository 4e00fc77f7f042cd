use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_CONFIG_FILENAME: &str = "wikiql.toml";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_EDITOR: &str = "markdown";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiConfig {
    #[serde(default)]
    pub wiki: WikiSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct WikiSection {
    pub url: Option<String>,
    pub api_token: Option<String>,
    pub default_locale: Option<String>,
    pub default_editor: Option<String>,
    pub timeout_ms: Option<u64>,
    pub rate_limit_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct LoggingSection {
    pub level: Option<String>,
}

impl WikiConfig {
    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

pub const CONFIG_PATH_ENV: &str = "WIKIQL_CONFIG";

/// `explicit` wins, then `WIKIQL_CONFIG`, then `wikiql.toml` in the working directory.
pub fn resolve_config_path<F>(explicit: Option<&Path>, lookup_env: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    lookup_env(CONFIG_PATH_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME))
}

/// Load and parse a WikiConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<WikiConfig> {
    if !config_path.exists() {
        return Ok(WikiConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: WikiConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Fully resolved connection parameters for the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub base_url: String,
    pub api_token: String,
    pub default_locale: String,
    pub default_editor: String,
    pub timeout: Duration,
    pub rate_limit: Option<Duration>,
}

impl ConnectionSettings {
    /// Resolve env > config > default. Missing url or token is fatal.
    pub fn resolve(config: &WikiConfig) -> ClientResult<Self> {
        Self::resolve_with_lookup(config, |key| env::var(key).ok())
    }

    pub fn resolve_with_lookup<F>(config: &WikiConfig, lookup_env: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = &config.wiki;
        let pick = |key: &str, fallback: Option<&String>| {
            lookup_env(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .or_else(|| fallback.map(|value| value.trim().to_string()))
                .filter(|value| !value.is_empty())
        };

        let base_url = pick("WIKI_URL", section.url.as_ref()).ok_or_else(|| {
            ClientError::Config("wiki url is not set (WIKI_URL or [wiki].url)".to_string())
        })?;
        let api_token = pick("WIKI_API_TOKEN", section.api_token.as_ref()).ok_or_else(|| {
            ClientError::Config(
                "wiki API token is not set (WIKI_API_TOKEN or [wiki].api_token)".to_string(),
            )
        })?;
        let default_locale = pick("WIKI_DEFAULT_LOCALE", section.default_locale.as_ref())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let default_editor = pick("WIKI_DEFAULT_EDITOR", section.default_editor.as_ref())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        let timeout_ms = lookup_u64(&lookup_env, "WIKI_HTTP_TIMEOUT_MS")
            .or(section.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let rate_limit_ms = lookup_u64(&lookup_env, "WIKI_RATE_LIMIT_MS")
            .or(section.rate_limit_ms)
            .unwrap_or(0);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            default_locale,
            default_editor,
            timeout: Duration::from_millis(timeout_ms),
            rate_limit: (rate_limit_ms > 0).then(|| Duration::from_millis(rate_limit_ms)),
        })
    }

    pub fn graphql_endpoint(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    pub fn upload_endpoint(&self) -> String {
        format!("{}/u", self.base_url)
    }
}

fn lookup_u64<F>(lookup_env: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_env(key).and_then(|value| value.trim().parse::<u64>().ok())
}
