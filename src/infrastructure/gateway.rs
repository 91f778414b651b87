// Upstream gateway - authenticated HTTP access to the IoT platform
use crate::infrastructure::credentials::CredentialCache;
use crate::infrastructure::error::ProviderError;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Thin wrapper around reqwest that injects the bearer credential and the
/// standard headers, and turns non-success statuses into typed errors.
#[derive(Clone)]
pub struct UpstreamGateway {
    base_url: String,
    client: reqwest::Client,
    credentials: Arc<CredentialCache>,
}

impl UpstreamGateway {
    pub fn new(base_url: String, client: reqwest::Client, credentials: Arc<CredentialCache>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticated GET returning parsed JSON.
    ///
    /// A 404 means "entity not found" on the lookup endpoints and maps to
    /// `Ok(None)`; callers branch on it, so it must not surface as an error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
    ) -> Result<Option<T>, ProviderError> {
        let credential = self.credentials.get_token().await?;
        let url = format!("{}{}", self.base_url, path_and_query);

        let response = self
            .client
            .get(&url)
            .header("X-Authorization", format!("Bearer {}", credential.token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Some(response.json().await?))
    }

    /// Forward a two-way RPC to a device, authenticated with the caller's own
    /// session token rather than the cached service credential.
    pub async fn invoke_rpc(
        &self,
        device_id: &str,
        method: &str,
        params: serde_json::Value,
        session_token: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = format!(
            "{}/api/rpc/twoway/{}",
            self.base_url,
            urlencoding::encode(device_id)
        );

        let response = self
            .client
            .post(&url)
            .header("X-Authorization", format!("Bearer {session_token}"))
            .header("Accept", "application/json")
            .json(&serde_json::json!({ "method": method, "params": params }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        // Some RPC handlers answer with plain text or an empty body.
        match serde_json::from_str(&text) {
            Ok(json) => Ok(json),
            Err(_) => Ok(serde_json::json!({
                "ok": true,
                "raw": if text.is_empty() { serde_json::Value::Null } else { text.into() },
            })),
        }
    }
}
