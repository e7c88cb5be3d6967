use serde::{Deserialize, Serialize};

pub mod verifier;

pub use verifier::TokenVerifier;

/// Claim set of a verified bearer token. The `sub` claim is the caller
/// identity used as the record-ownership partition key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed authorization header: {0}")]
    MalformedHeader(String),
    #[error("no usable signing key: {0}")]
    KeyNotFound(String),
    #[error("token signature verification failed")]
    InvalidSignature,
    #[error("token has expired")]
    TokenExpired,
    #[error("key set endpoint unreachable: {0}")]
    ProviderUnreachable(String),
}
