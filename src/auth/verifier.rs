//! Bearer-token verification against the identity provider's key set.
//!
//! Tokens are RS256-signed by an external provider. The verifier decodes the
//! token header to find the signing key id, fetches the provider's published
//! key set on a cache miss, converts the matching RSA entry into a
//! `DecodingKey`, and verifies signature and expiry. Keys are cached per
//! `kid` and expire on a TTL taken from the key set response's
//! `Cache-Control: max-age` when present.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{AuthError, Claims};
use crate::config::AuthConfig;

/// Timeout for key set HTTP fetches (connect + response).
const KEY_SET_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A cached verification key for a single `kid`.
struct CachedKey {
    key: DecodingKey,
    fetched_at: Instant,
    ttl: Duration,
}

impl CachedKey {
    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > self.ttl
    }
}

/// Verifies bearer tokens and extracts the caller identity.
///
/// Cloning is cheap; clones share the key cache.
#[derive(Clone)]
pub struct TokenVerifier {
    jwks_url: String,
    leeway_seconds: u64,
    default_ttl: Duration,
    http: reqwest::Client,
    keys: Arc<RwLock<HashMap<String, CachedKey>>>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("jwks_url", &self.jwks_url)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(KEY_SET_FETCH_TIMEOUT)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build key set HTTP client");

        Self {
            jwks_url: config.jwks_url.clone(),
            leeway_seconds: config.leeway_seconds,
            default_ttl: Duration::from_secs(config.key_cache_ttl_secs),
            http,
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Verify a bearer `Authorization` header value and return the claim set.
    pub async fn verify(&self, bearer_header: &str) -> Result<Claims, AuthError> {
        let token = parse_bearer(bearer_header)?;

        let header = decode_header(token)
            .map_err(|e| AuthError::MalformedHeader(format!("undecodable token: {}", e)))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::KeyNotFound("token carries no key id".to_string()))?;

        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.leeway_seconds;
        // Audience/issuer are enforced by the provider at token issuance, not here
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidSignature,
        })?;

        tracing::debug!(subject = %data.claims.sub, "token verified");
        Ok(data.claims)
    }

    /// Get the verification key for `kid`, fetching the key set on a miss.
    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let keys = self.keys.read().await;
            if let Some(entry) = keys.get(kid) {
                if !entry.is_expired() {
                    return Ok(entry.key.clone());
                }
            }
        }

        // Cache miss or expired entry. A race here at worst duplicates the
        // fetch; last writer wins and both end up with fresh keys.
        let (fetched, ttl) = self.fetch_key_set().await?;

        let mut keys = self.keys.write().await;
        for (key_id, key) in fetched {
            keys.insert(
                key_id,
                CachedKey {
                    key,
                    fetched_at: Instant::now(),
                    ttl,
                },
            );
        }

        keys.get(kid)
            .map(|entry| entry.key.clone())
            .ok_or_else(|| {
                AuthError::KeyNotFound(format!("no RSA signing key with kid {} in key set", kid))
            })
    }

    /// Fetch the provider's key set and convert usable entries.
    ///
    /// Returns the verification keys by `kid` together with the lifetime the
    /// provider allows for caching them.
    async fn fetch_key_set(&self) -> Result<(Vec<(String, DecodingKey)>, Duration), AuthError> {
        tracing::debug!(jwks_url = %self.jwks_url, "fetching signing key set");

        let response = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::ProviderUnreachable(format!(
                "key set endpoint returned HTTP {}",
                response.status()
            )));
        }

        let ttl = max_age(response.headers()).unwrap_or(self.default_ttl);

        let key_set: KeySetResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnreachable(format!("invalid key set payload: {}", e)))?;

        let mut keys = Vec::new();
        for jwk in &key_set.keys {
            if !jwk.is_usable_for_signing() {
                continue;
            }
            let (Some(kid), Some(n), Some(e)) = (&jwk.kid, &jwk.n, &jwk.e) else {
                continue;
            };
            match DecodingKey::from_rsa_components(n, e) {
                Ok(key) => keys.push((kid.clone(), key)),
                Err(err) => {
                    tracing::warn!(kid = %kid, error = %err, "skipping unusable key set entry")
                }
            }
        }

        tracing::info!(jwks_url = %self.jwks_url, key_count = keys.len(), ttl_secs = ttl.as_secs(), "cached signing keys");
        Ok((keys, ttl))
    }
}

/// Extract the token from a `Bearer <token>` header value.
/// The scheme is matched case-insensitively.
fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| AuthError::MalformedHeader("expected 'Bearer <token>'".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader(format!(
            "unsupported scheme '{}'",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader("empty token".to_string()));
    }
    Ok(token)
}

/// Parse `max-age` out of a Cache-Control response header, if any.
fn max_age(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let value = headers.get(reqwest::header::CACHE_CONTROL)?.to_str().ok()?;
    value.split(',').find_map(|directive| {
        directive
            .trim()
            .strip_prefix("max-age=")?
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    })
}

/// Key set document published by the identity provider.
#[derive(Debug, Deserialize)]
struct KeySetResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    #[serde(rename = "use")]
    key_use: Option<String>,
    /// RSA modulus (base64url-encoded)
    n: Option<String>,
    /// RSA exponent (base64url-encoded)
    e: Option<String>,
}

impl Jwk {
    /// A key is usable when it is published for signing, is RSA, carries a
    /// key id, and has public components to build a verification key from.
    fn is_usable_for_signing(&self) -> bool {
        self.key_use.as_deref() == Some("sig")
            && self.kty == "RSA"
            && self.kid.is_some()
            && self.n.is_some()
            && self.e.is_some()
    }
}
