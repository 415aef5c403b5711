use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when the config file has no API token.
pub const TOKEN_ENV_VAR: &str = "MOVIE_API_KEY";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_logfile")]
    pub logfile: String,
    #[serde(skip)]
    pub debug_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

/// Connection settings for the movie metadata API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(alias = "baseurl", default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(alias = "timeout", default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Prefix turning a poster path into an image URL.
    #[serde(alias = "imagesource", default = "default_image_base")]
    pub image_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            image_base: default_image_base(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The bearer token from the file, else from the environment.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.trim().is_empty()))
            .ok_or(ConfigError::MissingToken)
    }
}

fn default_port() -> String {
    "8097".to_string()
}

fn default_logfile() -> String {
    "stdout".to_string()
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_image_base() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        Self::from_yaml(&content).map_err(|e| ConfigError::ParseError(path.to_string(), e))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn get_database_path(&self) -> Option<String> {
        self.database.sqlite.as_ref().map(|sqlite| sqlite.filename.clone())
    }

    pub fn json_logs(&self) -> bool {
        self.logfile.eq_ignore_ascii_case("json")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("No API token configured (set api.token or {})", TOKEN_ENV_VAR)]
    MissingToken,
}
