use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Purpose of a signed token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
    /// Mailed password-reset link.
    Reset,
    /// CSRF state carried through the OAuth redirect.
    OauthState,
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID, or a nonce for oauth state
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    pub kind: TokenKind, // token type
    /// Session epoch of the user at signing time; stale once the user signs out.
    #[serde(default)]
    pub epoch: u64,
}
