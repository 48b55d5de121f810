use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use clipcast_core::auth::codec::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL};
use thiserror::Error;

use super::{
    constants::{
        DEFAULT_ACCESS_SECRET, DEFAULT_CONFIG_LOCATIONS, DEFAULT_HOST, DEFAULT_MAX_CONNECTIONS,
        DEFAULT_PASSWORD_PEPPER, DEFAULT_PORT, DEFAULT_REFRESH_SECRET, DEFAULT_TOKEN_KEY,
    },
    models::{
        AuthConfig, Config, ConfigMetadata, CookieConfig, CorsConfig, DatabaseConfig,
        ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Resolves configuration from, in order of precedence: environment
/// variables (including a `.env` file), the TOML file, built-in defaults.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path)
                .map(|_| true)
                .or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        self.load_from(EnvConfig::gather(), env_file_loaded)
    }

    /// Resolve against an explicit environment snapshot.
    pub fn load_from(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        let (config, warnings) =
            self.compose_config(file_config, env, config_path, env_file_loaded)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let (path, explicit) = match (&self.options.config_path, &env.config_path) {
            (Some(path), _) | (None, Some(path)) => (path.clone(), true),
            (None, None) => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => (path, false),
                None => return Ok((None, None)),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }

    fn compose_config(
        &self,
        file_config: Option<FileConfig>,
        env: EnvConfig,
        config_path: Option<PathBuf>,
        env_file_loaded: bool,
    ) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No clipcast.toml detected; falling back to environment variables",
                "Pass --config or set CLIPCAST_CONFIG to use a configuration file",
            );
        }

        let FileConfig {
            server: file_server,
            database: file_database,
            auth: file_auth,
            cookies: file_cookies,
            cors: file_cors,
            dev_mode: file_dev_mode,
        } = file_config.unwrap_or_default();

        let server = ServerConfig {
            host: env
                .server_host
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let database = DatabaseConfig {
            url: env
                .database_url
                .or(file_database.url)
                .filter(|url| !url.trim().is_empty()),
            max_connections: env
                .database_max_connections
                .or(file_database.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        let auth = AuthConfig {
            access_secret: env
                .access_secret
                .or(file_auth.access_secret)
                .unwrap_or_else(|| DEFAULT_ACCESS_SECRET.to_string()),
            refresh_secret: env
                .refresh_secret
                .or(file_auth.refresh_secret)
                .unwrap_or_else(|| DEFAULT_REFRESH_SECRET.to_string()),
            password_pepper: env
                .password_pepper
                .or(file_auth.password_pepper)
                .unwrap_or_else(|| DEFAULT_PASSWORD_PEPPER.to_string()),
            token_key: env
                .token_key
                .or(file_auth.token_key)
                .unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
            access_ttl: resolve_duration(
                "ACCESS_TOKEN_TTL",
                env.access_ttl.or(file_auth.access_ttl),
                DEFAULT_ACCESS_TTL,
            )?,
            refresh_ttl: resolve_duration(
                "REFRESH_TOKEN_TTL",
                env.refresh_ttl.or(file_auth.refresh_ttl),
                DEFAULT_REFRESH_TTL,
            )?,
        };

        let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

        let cookies = CookieConfig {
            secure: env.cookie_secure.or(file_cookies.secure).unwrap_or(true),
        };

        let cors = CorsConfig {
            allowed_origins: env
                .cors_allowed_origins
                .or(file_cors.allowed_origins)
                .unwrap_or_else(default_cors_origins),
        };

        let config = Config {
            server,
            database,
            auth,
            cookies,
            cors,
            dev_mode,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };

        warnings.extend(validation::apply_guard_rails(&config)?);
        Ok((config, warnings))
    }
}

fn resolve_duration(
    field: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(raw) => humantime::parse_duration(raw.trim())
            .map_err(|source| ConfigLoadError::InvalidDuration { field, source }),
        None => Ok(default),
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration for {field}")]
    InvalidDuration {
        field: &'static str,
        #[source]
        source: humantime::DurationError,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoad {
    pub fn config_path(&self) -> Option<&Path> {
        self.config.metadata.config_path.as_deref()
    }
}
