//! Password-grant token exchange

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use sunat_core::TokenProvider;
use sunat_domain::constants::{TOKEN_GRANT_TYPE, TOKEN_SCOPE};
use sunat_domain::{AccessToken, Credentials, Result, SunatError};
use tracing::{debug, instrument};

use super::SunatClient;
use crate::errors::InfraError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[async_trait]
impl TokenProvider for SunatClient {
    #[instrument(skip(self, credentials), fields(client_id = %credentials.client_id))]
    async fn fetch_token(&self, credentials: &Credentials) -> Result<AccessToken> {
        let url = self.token_url(&credentials.client_id);

        let form = [
            ("scope", TOKEN_SCOPE),
            ("grant_type", TOKEN_GRANT_TYPE),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        let response = self
            .http
            .send(self.http.request(Method::POST, &url).form(&form))
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SunatError::AuthTimeout(self.http.timeout())
                } else {
                    SunatError::from(InfraError::from(err))
                }
            })?;

        if !response.is_success() {
            return Err(SunatError::AuthRejected {
                status: response.status().as_u16(),
                body: response.excerpt(),
            });
        }

        let parsed: TokenResponse = response.json("parsing token response")?;
        let token = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| SunatError::MalformedResponse {
                context: "reading access_token".to_string(),
                body: response.excerpt(),
            })?;

        debug!(expires_in = parsed.expires_in, "Obtained access token");
        Ok(AccessToken::new(token))
    }
}
