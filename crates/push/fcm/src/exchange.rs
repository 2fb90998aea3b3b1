//! Service account token exchange.

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::WrapErr as _;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

use crate::{AccessToken, ServiceAccount, TokenExchanger};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, serde::Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Exchanges a signed JWT assertion for a Google OAuth access token.
#[derive(Clone, Default)]
pub struct GoogleTokenExchanger {
    client: reqwest::Client,
}

impl GoogleTokenExchanger {
    /// Create a new exchanger.
    pub fn new() -> Self {
        Self::default()
    }

    fn assertion(
        account: &ServiceAccount,
        scope: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> color_eyre::eyre::Result<String> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .wrap_err("service account private key is not a valid RSA PEM key")?;

        let mut header = Header::new(Algorithm::RS256);
        header.kid = account.private_key_id.clone();

        let claims = AssertionClaims {
            iss: &account.client_email,
            scope,
            aud: account.token_uri(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &key).wrap_err("failed to sign token assertion")
    }
}

impl TokenExchanger for GoogleTokenExchanger {
    async fn exchange(
        &self,
        account: &ServiceAccount,
        scope: &str,
    ) -> color_eyre::eyre::Result<AccessToken> {
        let now = chrono::Utc::now();
        let assertion = Self::assertion(account, scope, now)?;

        let response = self
            .client
            .post(account.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .wrap_err("failed to reach token endpoint")?;

        let status = response.status();
        if !status.is_success() {
            color_eyre::eyre::bail!("token endpoint rejected credential: {}", status);
        }

        let body: TokenResponse = response
            .json()
            .await
            .wrap_err("failed to parse token response")?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| color_eyre::eyre::eyre!("token response has no access_token"))?;

        let lifetime = body.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        let expires_at = chrono::Duration::try_seconds(lifetime)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| color_eyre::eyre::eyre!("token expires_in out of range: {lifetime}"))?;

        tracing::debug!(client = %account.client_email, lifetime, "obtained access token");

        Ok(AccessToken { token, expires_at })
    }
}

/// Process-wide access token cache in front of another exchanger.
///
/// Tokens are keyed by account and scope and reused until `margin` before
/// their provider-issued expiry.
#[derive(Clone)]
pub struct CachedExchanger<E> {
    inner: E,
    cache: Arc<tokio::sync::Mutex<HashMap<String, AccessToken>>>,
    margin: chrono::Duration,
}

impl<E> CachedExchanger<E> {
    /// Wrap an exchanger with a cache using a 60 second refresh margin.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: Arc::default(),
            margin: chrono::Duration::seconds(60),
        }
    }

    /// Set how long before expiry a cached token is refreshed.
    pub fn with_margin(mut self, margin: chrono::Duration) -> Self {
        self.margin = margin;
        self
    }
}

impl<E: TokenExchanger> TokenExchanger for CachedExchanger<E> {
    async fn exchange(
        &self,
        account: &ServiceAccount,
        scope: &str,
    ) -> color_eyre::eyre::Result<AccessToken> {
        let key = account.cache_key(scope);

        let cached = {
            let cache = self.cache.lock().await;
            cache
                .get(&key)
                .filter(|token| token.is_fresh(chrono::Utc::now(), self.margin))
                .cloned()
        };
        if let Some(token) = cached {
            return Ok(token);
        }

        let token = self.inner.exchange(account, scope).await?;
        self.cache.lock().await.insert(key, token.clone());

        Ok(token)
    }
}
