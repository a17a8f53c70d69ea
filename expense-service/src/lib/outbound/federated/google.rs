use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use jsonwebtoken::decode;
use jsonwebtoken::decode_header;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Validation;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::FederatedIdentity;
use crate::domain::identity::ports::IdentityVerifier;
use crate::identity::errors::FederatedAuthError;

pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
const KEY_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Verifies Google ID tokens.
///
/// Checks the RS256 signature against Google's published keys, the audience
/// against our OAuth client id, the issuer, and expiry. Keys are cached for an
/// hour and refetched early when a token names an unknown `kid`, at most once
/// a minute.
pub struct GoogleIdentityVerifier {
    client: reqwest::Client,
    client_id: String,
    certs_url: String,
    keys: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

impl CachedKeys {
    fn fresh_key(&self, kid: &str) -> Option<&Jwk> {
        if self.fetched_at.elapsed() < KEY_CACHE_TTL {
            self.set.find(kid)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

impl GoogleIdentityVerifier {
    /// # Arguments
    /// * `client_id` - OAuth client id the tokens must be issued for
    /// * `certs_url` - JWKS endpoint, normally [`GOOGLE_CERTS_URL`]
    pub fn new(client_id: String, certs_url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

        Ok(Self {
            client,
            client_id,
            certs_url,
            keys: RwLock::new(None),
        })
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, FederatedAuthError> {
        {
            let cache = self.keys.read().await;
            if let Some(jwk) = cache.as_ref().and_then(|cached| cached.fresh_key(kid)) {
                return DecodingKey::from_jwk(jwk)
                    .map_err(|e| FederatedAuthError::Rejected(e.to_string()));
            }
        }

        // One fetch at a time; waiters re-check what the winner stored.
        let mut cache = self.keys.write().await;
        if let Some(cached) = cache.as_ref() {
            if let Some(jwk) = cached.fresh_key(kid) {
                return DecodingKey::from_jwk(jwk)
                    .map_err(|e| FederatedAuthError::Rejected(e.to_string()));
            }
            if cached.fetched_at.elapsed() < MIN_REFETCH_INTERVAL {
                return Err(FederatedAuthError::Rejected(format!(
                    "unknown signing key: {}",
                    kid
                )));
            }
        }

        let set = self.fetch_keys().await?;
        let key = set
            .find(kid)
            .ok_or_else(|| FederatedAuthError::Rejected(format!("unknown signing key: {}", kid)))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk).map_err(|e| FederatedAuthError::Rejected(e.to_string()))
            });

        *cache = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        key
    }

    async fn fetch_keys(&self) -> Result<JwkSet, FederatedAuthError> {
        tracing::debug!(url = %self.certs_url, "Fetching identity provider signing keys");

        self.client
            .get(&self.certs_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| FederatedAuthError::Unreachable(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| FederatedAuthError::Unreachable(e.to_string()))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, FederatedAuthError> {
        let header =
            decode_header(assertion).map_err(|e| FederatedAuthError::Malformed(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(FederatedAuthError::Rejected(format!(
                "unexpected algorithm: {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| FederatedAuthError::Malformed("missing key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleIdClaims>(assertion, &key, &validation)
            .map_err(|e| FederatedAuthError::Rejected(e.to_string()))?
            .claims;

        if !claims.email_verified {
            return Err(FederatedAuthError::Rejected(
                "email not verified".to_string(),
            ));
        }

        let email = claims
            .email
            .ok_or_else(|| FederatedAuthError::Rejected("missing email".to_string()))
            .and_then(|email| {
                EmailAddress::new(email).map_err(|e| FederatedAuthError::Rejected(e.to_string()))
            })?;

        let name = match claims.name.map(DisplayName::new) {
            Some(Ok(name)) => name,
            _ => DisplayName::new(email.local_part().to_string())
                .map_err(|e| FederatedAuthError::Rejected(e.to_string()))?,
        };

        Ok(FederatedIdentity {
            email,
            name,
            subject: claims.sub,
        })
    }
}
