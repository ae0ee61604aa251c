use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::{config::IdentityConfig, error::AuthError, types::Token};

/// OAuth 2.0 authorization-code client with PKCE for the configured identity
/// provider.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    http: Client,
    config: IdentityConfig,
    audience: String,
}

impl IdentityProvider {
    pub fn new(
        config: IdentityConfig,
        audience: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            config,
            audience: audience.into(),
        })
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn logout_url(&self) -> Option<&str> {
        self.config.logout_url.as_deref()
    }

    /// URL the browser is sent to in order to sign in.
    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("audience", self.audience.as_str()),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AuthError::Config(format!("{}: {}", self.config.authorize_url, e)))?;

        Ok(url.into())
    }

    /// Exchanges an authorization code and its PKCE verifier for a token.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.request_token(&form, None).await
    }

    /// Trades a refresh token for a fresh access token. Providers that do not
    /// rotate refresh tokens omit one; the old value is kept then.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.request_token(&form, Some(refresh_token)).await
    }

    async fn request_token(
        &self,
        form: &[(&str, &str)],
        previous_refresh: Option<&str>,
    ) -> Result<Token, AuthError> {
        let res = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("{}: {}", status, body)));
        }

        let json: Value = res.json().await?;
        token_from_json(&json, &self.audience, previous_refresh)
    }
}

fn token_from_json(
    json: &Value,
    audience: &str,
    previous_refresh: Option<&str>,
) -> Result<Token, AuthError> {
    let access_token = json["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::Exchange("response carries no access_token".to_string()))?;

    Ok(Token {
        access_token: access_token.to_string(),
        refresh_token: json["refresh_token"]
            .as_str()
            .or(previous_refresh)
            .unwrap_or_default()
            .to_string(),
        scope: json["scope"].as_str().unwrap_or_default().to_string(),
        audience: Some(audience.to_string()),
        expires_in: json["expires_in"].as_u64().unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}
