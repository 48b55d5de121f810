use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("authentication secret {field} {reason}")]
    WeakSecret { field: &'static str, reason: String },
    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedTokenSecret,
    #[error("token lifetime {field} must be positive")]
    ZeroLifetime { field: &'static str },
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(config: &Config) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let auth = &config.auth;

    for (field, value) in [
        ("ACCESS_TOKEN_SECRET", &auth.access_secret),
        ("REFRESH_TOKEN_SECRET", &auth.refresh_secret),
        ("AUTH_PASSWORD_PEPPER", &auth.password_pepper),
        ("AUTH_TOKEN_KEY", &auth.token_key),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigGuardRailError::WeakSecret {
                field,
                reason: "must not be empty".into(),
            });
        }
    }
    if auth.access_secret == auth.refresh_secret {
        return Err(ConfigGuardRailError::SharedTokenSecret);
    }
    if auth.access_ttl.is_zero() {
        return Err(ConfigGuardRailError::ZeroLifetime {
            field: "ACCESS_TOKEN_TTL",
        });
    }
    if auth.refresh_ttl.is_zero() {
        return Err(ConfigGuardRailError::ZeroLifetime {
            field: "REFRESH_TOKEN_TTL",
        });
    }

    let defaults = auth.default_secrets();
    if !defaults.is_empty() {
        warnings.push_with_hint(
            format!(
                "using built-in development values for {}",
                defaults.join(", ")
            ),
            "Set these variables (or the [auth] section) before exposing the server",
        );
    }

    if !config.dev_mode && config.cors.is_wildcard_included() {
        return Err(ConfigGuardRailError::DangerousCorsWildcard);
    }

    if !config.cookies.secure {
        warnings.push_with_hint(
            "token cookies are sent without the Secure attribute",
            "Only disable COOKIE_SECURE for plain-HTTP local development",
        );
    }

    if config.database.url.is_none() {
        warnings.push_with_hint(
            "DATABASE_URL not configured; using the in-memory store",
            "Data is lost on restart. Set DATABASE_URL to persist to PostgreSQL",
        );
    }

    Ok(warnings)
}
