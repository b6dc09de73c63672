//! Client for the Xero identity server (OAuth2/OIDC).

use chrono::Utc;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::observability::TracedClientExt;

use crate::config::XeroSettings;
use crate::error::XeroError;
use crate::models::TokenPair;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(default)]
    id_token: Option<String>,
}

/// Result of the authorization-code exchange.
pub struct CodeExchange {
    pub tokens: TokenPair,
    pub id_token: Option<String>,
}

pub struct IdentityClient {
    http: Client,
    settings: XeroSettings,
}

impl IdentityClient {
    pub fn new(http: Client, settings: XeroSettings) -> Self {
        Self { http, settings }
    }

    /// Browser redirect target starting the authorization-code + PKCE flow.
    pub fn authorize_url(&self, state: &str, code_challenge: &str) -> anyhow::Result<String> {
        let url = reqwest::Url::parse_with_params(
            &self.settings.authorize_endpoint(),
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("scope", self.settings.scopes.as_str()),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
                ("prompt", "login"),
            ],
        )
        .map_err(|e| anyhow::anyhow!("Invalid Xero identity URL: {}", e))?;

        Ok(url.into())
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<CodeExchange, XeroError> {
        let response = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("code_verifier", code_verifier),
            ])
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Xero code exchange failed");
            return Err(XeroError::ProviderRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| XeroError::Decode(e.to_string()))?;

        let refresh_token = token.refresh_token.ok_or_else(|| {
            XeroError::Decode("token response has no refresh_token (is offline_access granted?)".into())
        })?;

        Ok(CodeExchange {
            tokens: TokenPair::issued_at(token.access_token, refresh_token, token.expires_in, Utc::now()),
            id_token: token.id_token,
        })
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// A `400`/`401` from the token endpoint means the grant was rejected
    /// (expired, revoked or already rotated) and maps to `TokenRefreshFailed`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, XeroError> {
        let response = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Xero refresh grant failed");
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                    XeroError::TokenRefreshFailed(body)
                }
                _ => XeroError::ProviderRequestFailed {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| XeroError::Decode(e.to_string()))?;

        // Xero rotates refresh tokens, but keep the old one if none came back
        let refresh_token = token
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string());

        Ok(TokenPair::issued_at(
            token.access_token,
            refresh_token,
            token.expires_in,
            Utc::now(),
        ))
    }

    /// Revoke a refresh token and every access token issued from it.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), XeroError> {
        let response = self
            .http
            .traced_post(&self.settings.revocation_endpoint())
            .basic_auth(
                &self.settings.client_id,
                Some(self.settings.client_secret.expose_secret()),
            )
            .form(&[("token", refresh_token)])
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(XeroError::ProviderRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<reqwest::Response, XeroError> {
        let response = self
            .http
            .traced_post(&self.settings.token_endpoint())
            .basic_auth(
                &self.settings.client_id,
                Some(self.settings.client_secret.expose_secret()),
            )
            .form(form)
            .timeout(self.settings.request_timeout())
            .send()
            .await?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn client() -> IdentityClient {
        IdentityClient::new(
            Client::new(),
            XeroSettings {
                client_id: "client-123".into(),
                client_secret: Secret::new("secret".into()),
                redirect_uri: "http://localhost:8080/auth/xero/callback".into(),
                identity_url: "https://identity.xero.com".into(),
                api_base_url: "https://api.xero.com/api.xro/2.0".into(),
                connections_url: "https://api.xero.com/connections".into(),
                scopes: "openid offline_access".into(),
                request_timeout_secs: 5,
            },
        )
    }

    #[test]
    fn authorize_url_carries_pkce_and_state() {
        let url = client().authorize_url("state-1", "challenge-1").unwrap();
        let parsed = reqwest::Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(parsed.path(), "/connect/authorize");
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["redirect_uri"], "http://localhost:8080/auth/xero/callback");
        assert_eq!(params["scope"], "openid offline_access");
        assert_eq!(params["state"], "state-1");
        assert_eq!(params["code_challenge"], "challenge-1");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["response_type"], "code");
    }
}
