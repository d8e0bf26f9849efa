use std::env;

use thiserror::Error;
use url::Url;

pub const DEFAULT_LOGIN_USER: &str = "admin";
pub const DEFAULT_LOGIN_PASS: &str = "1234";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Falta la variable de entorno {0}")]
    Missing(&'static str),
    #[error("API_URL no es una URL válida: {0}")]
    InvalidUrl(String),
}

/// Connection settings for the campaign API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; the campaign id is appended to it as-is.
    pub base_url: String,
    pub user: String,
    pub pass: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let base_url = required("API_URL")?;
        Url::parse(&base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            base_url,
            user: required("API_USER")?,
            pass: required("API_PASS")?,
        })
    }
}

/// Credentials accepted by the login form.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginConfig {
    pub username: String,
    pub password: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username: DEFAULT_LOGIN_USER.to_string(),
            password: DEFAULT_LOGIN_PASS.to_string(),
        }
    }
}

impl LoginConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            username: lookup("LOGIN_USER").unwrap_or(defaults.username),
            password: lookup("LOGIN_PASS").unwrap_or(defaults.password),
        }
    }
}

/// Loads `.env` if present. Variables already set in the process win.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env loaded: {}", e);
    }
}
