//! Development-only fallbacks. Every one of them triggers a startup warning.

pub const DEFAULT_ACCESS_SECRET: &str = "clipcast-dev-access-secret-change-me";
pub const DEFAULT_REFRESH_SECRET: &str = "clipcast-dev-refresh-secret-change-me";
pub const DEFAULT_PASSWORD_PEPPER: &str = "clipcast-dev-password-pepper-change-me";
pub const DEFAULT_TOKEN_KEY: &str = "clipcast-dev-token-key-change-me";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_CONFIG_LOCATIONS: &[&str] = &["clipcast.toml", "config/clipcast.toml"];
