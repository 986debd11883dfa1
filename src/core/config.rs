use crate::core::known::KnownEtf;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf, time::Duration};
use tracing::debug;

pub const ALPHA_VANTAGE_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";
pub const POLYGON_KEY_ENV: &str = "POLYGON_API_KEY";

#[derive(Deserialize, Serialize, Clone)]
pub struct AlphaVantageProviderConfig {
    #[serde(default = "default_alpha_vantage_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct PolygonProviderConfig {
    #[serde(default = "default_polygon_url")]
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Stand-in for a configured API key in debug output.
const MASKED_KEY: &str = "***";

fn masked(key: &Option<String>) -> Option<&'static str> {
    key.as_ref().map(|_| MASKED_KEY)
}

impl fmt::Debug for AlphaVantageProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &masked(&self.api_key))
            .finish()
    }
}

impl fmt::Debug for PolygonProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &masked(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

fn default_alpha_vantage_url() -> String {
    "https://www.alphavantage.co".to_string()
}

fn default_polygon_url() -> String {
    "https://api.polygon.io".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub alpha_vantage: Option<AlphaVantageProviderConfig>,
    pub polygon: Option<PolygonProviderConfig>,
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            alpha_vantage: Some(AlphaVantageProviderConfig {
                base_url: default_alpha_vantage_url(),
                api_key: None,
            }),
            polygon: Some(PolygonProviderConfig {
                base_url: default_polygon_url(),
                api_key: None,
            }),
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

impl ProvidersConfig {
    /// Alpha Vantage key from config, falling back to the environment.
    pub fn alpha_vantage_key(&self) -> Option<String> {
        key_or_env(
            self.alpha_vantage.as_ref().and_then(|p| p.api_key.clone()),
            ALPHA_VANTAGE_KEY_ENV,
        )
    }

    /// Polygon key from config, falling back to the environment.
    pub fn polygon_key(&self) -> Option<String> {
        key_or_env(
            self.polygon.as_ref().and_then(|p| p.api_key.clone()),
            POLYGON_KEY_ENV,
        )
    }
}

fn key_or_env(configured: Option<String>, env_var: &str) -> Option<String> {
    configured
        .or_else(|| std::env::var(env_var).ok())
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub enrich: bool,
    #[serde(default)]
    pub known_etfs: Vec<KnownEtf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            timeout_secs: default_timeout_secs(),
            enrich: false,
            known_etfs: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults if there is none.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "etfscope", "etfscope")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
