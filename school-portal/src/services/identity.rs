//! Client for the provider's identity API (`/auth/v1`).
//!
//! Every call carries the project's anon key as `apikey`; calls acting on a
//! signed-in user also carry that user's access token as a bearer token.

use crate::config::ProviderSettings;
use crate::models::{Session, User};
use crate::services::error::{read_empty, read_json, ProviderError};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde_json::json;

#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

impl IdentityClient {
    pub fn new(client: Client, settings: &ProviderSettings) -> Self {
        Self {
            client,
            base_url: format!("{}/auth/v1", settings.url.trim_end_matches('/')),
            anon_key: settings.anon_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange email and password for a session.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, ProviderError> {
        let response = self
            .client
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session: Session = read_json(response).await?;
        tracing::info!(user_id = %session.user.id, "Signed in with password");
        Ok(session)
    }

    /// Exchange a refresh token for a fresh session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ProviderError> {
        let response = self
            .client
            .post(self.url("/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key.expose_secret())
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let session: Session = read_json(response).await?;
        tracing::debug!(user_id = %session.user.id, "Session refreshed");
        Ok(session)
    }

    /// Resolve the user an access token belongs to.
    pub async fn get_user(&self, access_token: &str) -> Result<User, ProviderError> {
        let response = self
            .client
            .get(self.url("/user"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        read_json(response).await
    }

    /// Set a new password for the token's user.
    pub async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<User, ProviderError> {
        let response = self
            .client
            .put(self.url("/user"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        read_json(response).await
    }

    /// Revoke the session behind an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.url("/logout"))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await?;

        read_empty(response).await
    }
}
