use std::path::PathBuf;
use std::time::Duration;

use super::constants::{
    DEFAULT_ACCESS_SECRET, DEFAULT_PASSWORD_PEPPER, DEFAULT_REFRESH_SECRET, DEFAULT_TOKEN_KEY,
};

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cookies: CookieConfig,
    pub cors: CorsConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `None` selects the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub password_pepper: String,
    pub token_key: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Names of secrets still set to the built-in development values.
    pub fn default_secrets(&self) -> Vec<&'static str> {
        let mut defaults = Vec::new();
        if self.access_secret == DEFAULT_ACCESS_SECRET {
            defaults.push("ACCESS_TOKEN_SECRET");
        }
        if self.refresh_secret == DEFAULT_REFRESH_SECRET {
            defaults.push("REFRESH_TOKEN_SECRET");
        }
        if self.password_pepper == DEFAULT_PASSWORD_PEPPER {
            defaults.push("AUTH_PASSWORD_PEPPER");
        }
        if self.token_key == DEFAULT_TOKEN_KEY {
            defaults.push("AUTH_TOKEN_KEY");
        }
        defaults
    }
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Adds the `Secure` attribute; disable only for plain-HTTP development
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin.trim() == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
