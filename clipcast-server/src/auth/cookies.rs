use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use clipcast_core::auth::TokenPair;

use crate::infra::config::CookieConfig;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Writes and clears the token cookies with the configured attributes.
#[derive(Debug, Clone, Copy)]
pub struct TokenCookies {
    secure: bool,
}

impl TokenCookies {
    pub fn new(config: &CookieConfig) -> Self {
        Self {
            secure: config.secure,
        }
    }

    fn build(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }

    pub fn set(&self, jar: CookieJar, tokens: &TokenPair) -> CookieJar {
        jar.add(self.build(ACCESS_COOKIE, tokens.access.token.clone()))
            .add(self.build(REFRESH_COOKIE, tokens.refresh.token.clone()))
    }

    /// Expired, empty cookies are sent even when the request carried none.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        let removal = |name| {
            let mut cookie = self.build(name, String::new());
            cookie.make_removal();
            cookie
        };
        jar.add(removal(ACCESS_COOKIE)).add(removal(REFRESH_COOKIE))
    }
}
