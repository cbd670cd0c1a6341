//! `accounts-site.toml` settings.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. Command-line flags override what is read here.
//!
//! ```toml
//! [cache]
//! backend = "sqlite"
//! path = "content-cache.db"
//! ttl_hours = 720
//!
//! [generator]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o-mini"
//! api_key_env = "OPENAI_API_KEY"
//!
//! [retry]
//! max_attempts = 5
//! initial_delay_ms = 5000
//! max_jitter_ms = 1000
//!
//! [tax]
//! year = "2024/25"
//! constants_path = "uk_tax_years.csv"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use content_core::{CacheConfig, RetryPolicy};
use content_llm::OpenAiConfig;
use serde::Deserialize;
use tracing::debug;

/// Looked for in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "accounts-site.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub cache: CacheSection,
    pub generator: GeneratorSection,
    pub retry: RetrySection,
    pub tax: TaxSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// Registered backend name, `"sqlite"` or `"memory"`.
    pub backend: String,
    /// Database file, or `:memory:`.
    pub path: String,
    /// Lifetime of generated content. Absent means it never expires.
    pub ttl_hours: Option<i64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            path: "content-cache.db".to_string(),
            ttl_hours: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSection {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        let defaults = OpenAiConfig::default();
        Self {
            base_url: defaults.base_url,
            model: defaults.model,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_jitter_ms: defaults.max_jitter.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxSection {
    /// Tax-year label such as `"2024/25"`. Absent means the latest loaded year.
    pub year: Option<String>,
    /// CSV of tax-year constants. Absent means the bundled table.
    pub constants_path: Option<PathBuf>,
}

impl SiteConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it
    /// exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => {
                debug!("No configuration file, using defaults");
                return Ok(Self::default());
            }
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration: {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        self.cache_ttl()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_jitter: Duration::from_millis(self.retry.max_jitter_ms),
        }
    }

    pub fn cache_ttl(&self) -> Result<Option<TimeDelta>> {
        match self.cache.ttl_hours {
            None => Ok(None),
            Some(hours) if hours <= 0 => bail!("cache.ttl_hours must be positive, got {hours}"),
            Some(hours) => TimeDelta::try_hours(hours)
                .map(Some)
                .with_context(|| format!("cache.ttl_hours is too large: {hours}")),
        }
    }

    /// Cache settings, with `db` taking the place of `cache.path` when set.
    pub fn cache_config(
        &self,
        db: Option<&str>,
    ) -> CacheConfig {
        CacheConfig {
            backend: self.cache.backend.clone(),
            connection_string: db.unwrap_or(&self.cache.path).to_string(),
        }
    }

    pub fn openai_config(
        &self,
        api_key: String,
    ) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.generator.base_url.clone(),
            model: self.generator.model.clone(),
            api_key,
            timeout: Duration::from_secs(self.generator.timeout_secs),
        }
    }

    /// Read the API key from the environment variable named in the config.
    pub fn api_key(&self) -> Result<String> {
        let name = &self.generator.api_key_env;
        let key = std::env::var(name)
            .with_context(|| format!("Environment variable {name} is not set"))?;
        if key.trim().is_empty() {
            bail!("Environment variable {name} is empty");
        }
        Ok(key)
    }
}
