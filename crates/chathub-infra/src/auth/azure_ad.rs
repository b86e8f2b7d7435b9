//! Azure AD (Entra ID) bearer token validation.
//!
//! Tokens are RS256 JWTs signed with one of the tenant's published keys. The
//! key set is fetched from `{instance}/{tenant}/discovery/v2.0/keys` and
//! cached for an hour. An unknown `kid` forces a refresh so rotated keys are
//! picked up without waiting for expiry, but at most once per refresh
//! cooldown; inside it the cached set answers and the token is rejected.

use std::time::{Duration, Instant};

use chathub_types::config::AzureAdOptions;
use chathub_types::error::AuthError;
use chathub_types::identity::UserIdentity;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::RwLock;

const JWKS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const JWKS_REFRESH_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Claims read from an Azure AD access token.
#[derive(Debug, Deserialize)]
struct AzureAdClaims {
    #[serde(default)]
    oid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Validates bearer tokens for one tenant and audience.
pub struct AzureAdValidator {
    client: reqwest::Client,
    jwks_url: String,
    issuer: String,
    audience: String,
    refresh_cooldown: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl AzureAdValidator {
    pub fn new(options: &AzureAdOptions) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Jwks(format!("failed to create HTTP client: {e}")))?;

        let authority = format!(
            "{}/{}",
            options.instance.trim_end_matches('/'),
            options.tenant_id
        );
        Ok(Self {
            client,
            jwks_url: format!("{authority}/discovery/v2.0/keys"),
            issuer: format!("{authority}/v2.0"),
            audience: options.effective_audience().to_string(),
            refresh_cooldown: JWKS_REFRESH_COOLDOWN,
            cache: RwLock::new(None),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Validate `token` and return the caller's identity.
    ///
    /// The user id is the `oid` claim, falling back to `sub`.
    pub async fn validate(&self, token: &str) -> Result<UserIdentity, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unexpected signing algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<AzureAdClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let claims = data.claims;
        let user_id = claims
            .oid
            .or(claims.sub)
            .ok_or_else(|| AuthError::InvalidToken("token has no oid or sub claim".to_string()))?;
        let user_name = claims.name.unwrap_or_else(|| user_id.clone());
        Ok(UserIdentity::new(user_id, user_name))
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(answer) = self.cache.read().await.as_ref().and_then(|c| self.lookup(c, kid)) {
            return answer;
        }

        // Concurrent misses queue on the write lock; re-check so only the
        // first one fetches.
        let mut cache = self.cache.write().await;
        if let Some(answer) = cache.as_ref().and_then(|c| self.lookup(c, kid)) {
            return answer;
        }

        let keys = self.fetch_keys().await?;
        let cached = cache.insert(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        match cached.keys.find(kid) {
            Some(jwk) => DecodingKey::from_jwk(jwk).map_err(|e| AuthError::Jwks(e.to_string())),
            None => Err(unknown_key(kid)),
        }
    }

    /// Answer from the cache, or `None` when the key set must be refetched.
    fn lookup(&self, cached: &CachedKeys, kid: &str) -> Option<Result<DecodingKey, AuthError>> {
        let age = cached.fetched_at.elapsed();
        if age >= JWKS_CACHE_TTL {
            return None;
        }
        if let Some(jwk) = cached.keys.find(kid) {
            return Some(DecodingKey::from_jwk(jwk).map_err(|e| AuthError::Jwks(e.to_string())));
        }
        if age < self.refresh_cooldown {
            tracing::debug!(kid, "Unknown signing key inside refresh cooldown");
            return Some(Err(unknown_key(kid)));
        }
        None
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        tracing::debug!(url = %self.jwks_url, "Fetching Azure AD signing keys");
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::Jwks(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Jwks(format!("key endpoint returned HTTP {status}")));
        }
        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::Jwks(format!("invalid key set: {e}")))
    }
}

fn unknown_key(kid: &str) -> AuthError {
    AuthError::InvalidToken(format!("unknown signing key '{kid}'"))
}
