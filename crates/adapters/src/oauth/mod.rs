//! X OAuth 2.0 authorization-code flow with PKCE
//!
//! Obtains the user-context token the X publisher can use when no OAuth 1.0a
//! credential set is configured. The authorize URL is opened by the user in a
//! browser; the resulting code is exchanged here.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

/// Scopes required for reading and writing posts with a refresh token
pub const X_SCOPES: &str = "tweet.read tweet.write users.read offline.access";

const DEFAULT_AUTHORIZE_URL: &str = "https://x.com/i/oauth2/authorize";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A PKCE verifier and its S256 challenge
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Generate a fresh PKCE verifier/challenge pair
pub fn generate_pkce_pair() -> PkcePair {
    let bytes: [u8; 32] = rand::rng().random();
    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    PkcePair {
        challenge: challenge_for(&verifier),
        verifier,
    }
}

fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn urlencode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Build the browser authorization URL
pub fn build_authorize_url(
    client_id: &str,
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        DEFAULT_AUTHORIZE_URL,
        urlencode(client_id),
        urlencode(redirect_uri),
        urlencode(X_SCOPES),
        urlencode(state),
        urlencode(challenge),
    )
}

/// Tokens returned by the X token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

/// Client for the X OAuth 2.0 token endpoint
pub struct XOAuthClient {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    token_url: String,
}

impl XOAuthClient {
    pub fn new(client_id: String, client_secret: SecretString) -> Self {
        Self::with_token_url(
            client_id,
            client_secret,
            "https://api.twitter.com/2/oauth2/token".to_string(),
        )
    }

    pub fn with_token_url(
        client_id: String,
        client_secret: SecretString,
        token_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            client_id,
            client_secret,
            token_url,
        }
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        verifier: &str,
    ) -> Result<TokenSet, OAuthError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
            ("client_id", &self.client_id),
        ])
        .await
    }

    /// Trade a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, OAuthError> {
        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose_secret()
        ));

        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .form(form)
            .send()
            .await
            .map_err(|e| OAuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenEndpoint { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}
