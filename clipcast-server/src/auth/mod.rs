//! HTTP side of authentication: the access gate middleware, the
//! [`CurrentAccount`] extractor and the token cookies.

pub mod cookies;
pub mod extractor;
pub mod middleware;

pub use cookies::{ACCESS_COOKIE, REFRESH_COOKIE, TokenCookies};
pub use extractor::CurrentAccount;
pub use middleware::require_auth;
