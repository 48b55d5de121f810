use std::fmt;

/// Classification every component error maps onto. The HTTP boundary turns a
/// kind into a status code; nothing inside the core knows about HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or malformed input (400)
    Validation,
    /// Missing, expired, malformed or superseded credential, or bad password (401)
    Authentication,
    /// Authenticated, but acting on someone else's content (403)
    Forbidden,
    /// Referenced entity absent (404)
    NotFound,
    /// Duplicate unique field on creation (409)
    Conflict,
    /// Unexpected collaborator failure (500)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }

    /// Whether the message of an error with this kind may be shown to clients.
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
