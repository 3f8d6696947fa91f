use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub aviary: AviaryConfig,
    #[serde(default)]
    pub genealogy: GenealogyConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Storage and logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct AviaryConfig {
    pub db_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
}

/// Ancestry search settings
#[derive(Debug, Clone, Deserialize)]
pub struct GenealogyConfig {
    /// Generations searched when a request does not say otherwise.
    #[serde(default = "default_max_generations")]
    pub default_max_generations: usize,
    /// Largest generation bound a request may ask for.
    #[serde(default = "default_max_generations_limit")]
    pub max_generations_limit: usize,
    /// When true, consanguinity checks on unknown birds fail with not-found
    /// instead of reporting "no known relation".
    #[serde(default)]
    pub strict_lookup: bool,
}

impl Default for GenealogyConfig {
    fn default() -> Self {
        Self {
            default_max_generations: default_max_generations(),
            max_generations_limit: default_max_generations_limit(),
            strict_lookup: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_http_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub authless: bool,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            api_key_env: default_http_api_key_env(),
            allowed_origins: Vec::new(),
            authless: false,
        }
    }
}

fn default_max_generations() -> usize {
    3
}

fn default_max_generations_limit() -> usize {
    8
}

fn default_http_port() -> u16 {
    8001
}

fn default_http_api_key_env() -> String {
    "AVIARY_API_KEY".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in AVIARY_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("AVIARY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Load and validate a configuration file at an explicit path
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.aviary.db_path.as_os_str().is_empty() {
            anyhow::bail!("aviary.db_path must not be empty");
        }

        if self.genealogy.max_generations_limit == 0 {
            anyhow::bail!("genealogy.max_generations_limit must be greater than 0");
        }

        if self.genealogy.default_max_generations > self.genealogy.max_generations_limit {
            anyhow::bail!(
                "genealogy.default_max_generations ({}) must not exceed max_generations_limit ({})",
                self.genealogy.default_max_generations,
                self.genealogy.max_generations_limit
            );
        }

        if self.http_server.port == 0 {
            anyhow::bail!("http_server.port must be greater than 0");
        }

        Ok(())
    }

    /// Get database path
    pub fn db_path(&self) -> &Path {
        &self.aviary.db_path
    }

    /// Get migrations directory
    pub fn migrations_dir(&self) -> &Path {
        &self.aviary.migrations_dir
    }
}
