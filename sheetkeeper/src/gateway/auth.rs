//! Sheets API credentials
//!
//! Two sources of bearer tokens:
//! - `StaticToken`: a token handed in through configuration, used as is
//! - `ServiceAccountTokens`: a Google service-account key; access tokens are
//!   minted with the JWT bearer grant (RFC 7523) and cached until shortly
//!   before they expire

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sheetkeeper_common::{time, Error, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// OAuth scope for reading and writing spreadsheets
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (Google's maximum)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cached tokens are replaced once they are this close to expiry
const REFRESH_MARGIN_SECS: i64 = 60;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Supplies the bearer token for each Sheets API request
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token from configuration
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fields of a Google service-account JSON key that token minting needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid service account key: {}", e)))
    }

    /// Key JSON encoded as standard base64 (surrounding whitespace ignored)
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::Config(format!("Credentials are not valid base64: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| Error::Config(format!("Credentials are not UTF-8: {}", e)))?;
        Self::from_json(&json)
    }
}

/// Claims of the signed assertion exchanged for an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Access tokens minted from a service-account key
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    http_client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    /// Fails with `Error::Config` if the key's PEM cannot be loaded
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid service account private key: {}", e)))?;

        let http_client = Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            key,
            signing_key,
            http_client,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed RS256 assertion issued at `issued_at` (seconds since epoch)
    pub fn assertion(&self, issued_at: i64) -> Result<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| Error::Internal(format!("Failed to sign assertion: {}", e)))
    }

    async fn fetch_token(&self, now: DateTime<Utc>) -> Result<CachedToken> {
        let assertion = self.assertion(now.timestamp())?;

        let response = self
            .http_client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::Sheets(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Sheets(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Sheets(format!("Token response parse failed: {}", e)))?;

        info!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Minted Sheets access token"
        );

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + ChronoDuration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = time::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        debug!(token_uri = %self.key.token_uri, "Requesting new access token");
        let token = self.fetch_token(now).await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }
}
