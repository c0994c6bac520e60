use serde::{Deserialize, Serialize};

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // username
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    pub kind: TokenKind // token type
}

/// The verified subject of an authenticated request. Never persisted; it is
/// resolved back to a stored user on every request that needs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaim {
    pub subject: String,
}

impl From<Claims> for SessionClaim {
    fn from(c: Claims) -> Self {
        Self { subject: c.sub }
    }
}
