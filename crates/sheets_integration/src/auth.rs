use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{credentials::ServiceAccountKey, error::SheetsError};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECONDS: i64 = 3600;
const REFRESH_MARGIN_SECONDS: i64 = 60;

#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// Fixed bearer token, for emulators and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_TTL_SECONDS
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// OAuth2 two-legged flow for a Google service account.
pub struct ServiceAccountAuth {
    http: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scopes: Vec<String>,
    cache: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(http: Client, key: ServiceAccountKey) -> Result<Self, SheetsError> {
        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(SheetsError::InvalidKey)?;
        Ok(Self {
            http,
            key,
            encoding_key,
            scopes: vec![SPREADSHEETS_SCOPE.to_string(), DRIVE_SCOPE.to_string()],
            cache: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed JWT presented to the token endpoint.
    pub fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetsError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: self.scopes.join(" "),
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_TTL_SECONDS)).timestamp(),
        };
        encode(&header, &claims, &self.encoding_key).map_err(SheetsError::InvalidKey)
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, SheetsError> {
        let assertion = self.signed_assertion(now)?;
        let token_uri = self.key.token_uri.as_str();
        let response = self
            .http
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|source| SheetsError::Transport {
                url: token_uri.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::TokenExchange {
                token_uri: token_uri.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await.map_err(|err| SheetsError::Decode {
            url: token_uri.to_string(),
            reason: err.to_string(),
        })?;
        let expires_at = Duration::try_seconds(token.expires_in)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| SheetsError::Decode {
                url: token_uri.to_string(),
                reason: format!("expires_in out of range: {}", token.expires_in),
            })?;
        debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "access token issued"
        );
        Ok(CachedToken {
            token: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cache = self.cache.lock().await;
        let now = Utc::now();
        if let Some(cached) = cache.as_ref() {
            let refresh_at = cached
                .expires_at
                .checked_sub_signed(Duration::seconds(REFRESH_MARGIN_SECONDS));
            if refresh_at.is_some_and(|refresh_at| refresh_at > now) {
                return Ok(cached.token.clone());
            }
        }
        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
