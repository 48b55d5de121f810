//! Authentication
//!
//! ## Token flow
//!
//! 1. **Login**: the password is checked against the stored Argon2id hash,
//!    an access token (15 minutes by default) and a refresh token (10 days)
//!    are issued, and the HMAC digest of the refresh token is stored on the
//!    account
//! 2. **Request**: the [`RequestGate`] verifies the access token and resolves
//!    the public account; it never looks at the stored refresh digest
//! 3. **Refresh**: the refresh token must verify *and* match the stored
//!    digest; a new pair is issued and the digest overwritten, so every
//!    refresh token is single-use
//! 4. **Logout**: the stored digest is cleared. Access tokens already issued
//!    stay usable until they expire
//!
//! Access and refresh tokens are signed with two distinct secrets.

pub mod codec;
pub mod crypto;
pub mod gate;
pub mod session;

pub use codec::{Claims, CodecError, CredentialCodec, IssuedToken, TokenKind};
pub use crypto::{AuthCrypto, AuthCryptoError};
pub use gate::{GateError, RequestGate, TokenCarrier};
pub use session::{
    LoginCredential, LoginOutcome, SessionAuthority, SessionError, SessionState, TokenPair,
};
