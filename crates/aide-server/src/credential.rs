use aide::graph::DelegatedCredential;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::configuration::AuthSettings;
use crate::error::CredentialError;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Turns the SSO token forwarded by Teams into a credential for Graph
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    async fn exchange(&self, sso_token: &str) -> Result<DelegatedCredential, CredentialError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Default)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// The OAuth 2.0 on-behalf-of flow against the Microsoft identity platform
pub struct OnBehalfOf {
    http: Client,
    settings: AuthSettings,
}

impl OnBehalfOf {
    pub fn new(settings: AuthSettings) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self { http, settings })
    }
}

#[async_trait]
impl CredentialExchange for OnBehalfOf {
    async fn exchange(&self, sso_token: &str) -> Result<DelegatedCredential, CredentialError> {
        let params = [
            ("grant_type", JWT_BEARER_GRANT),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("assertion", sso_token),
            ("scope", self.settings.scopes.as_str()),
            ("requested_token_use", "on_behalf_of"),
        ];

        let response = self
            .http
            .post(self.settings.token_url())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorResponse = response.json().await.unwrap_or_default();
            return Err(CredentialError::Rejected {
                status,
                error: body.error,
                description: body.error_description,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(DelegatedCredential::new(token.access_token))
    }
}
