// Credential cache for the upstream platform token
use crate::infrastructure::error::ProviderError;
use serde::Deserialize;
use tokio::sync::Mutex;

/// Refresh this long before the recorded expiry, to absorb clock skew and
/// request latency.
const REFRESH_MARGIN_MS: i64 = 60_000;

/// The upstream issues tokens good for roughly 2.5 hours; treat them as valid
/// for 2 so we never hand out one that expires mid-request.
const CONSERVATIVE_LIFETIME_MS: i64 = 2 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: i64,
}

impl Credential {
    fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at - REFRESH_MARGIN_MS
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// Process-wide holder of the upstream access token.
///
/// A pre-issued token is served as-is. Otherwise the cache performs the
/// username/password login exchange and keeps the result until it nears
/// expiry. The mutex is held across the refresh call, so concurrent callers
/// that race past expiry converge on a single login request.
pub struct CredentialCache {
    base_url: String,
    access_token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client: reqwest::Client,
    cached: Mutex<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(
        base_url: String,
        access_token: Option<String>,
        username: Option<String>,
        password: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            username,
            password,
            client,
            cached: Mutex::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<Credential, ProviderError> {
        if let Some(token) = &self.access_token {
            return Ok(Credential {
                token: token.clone(),
                expires_at: i64::MAX,
            });
        }

        let mut cached = self.cached.lock().await;
        let now = crate::domain::telemetry::now_ms();
        if let Some(credential) = cached.as_ref() {
            if credential.is_fresh(now) {
                return Ok(credential.clone());
            }
        }

        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(ProviderError::MissingCredentials);
        };

        tracing::debug!("refreshing upstream access token");
        let token = login_exchange(&self.client, &self.base_url, username, password).await?;
        let credential = Credential {
            token,
            expires_at: crate::domain::telemetry::now_ms() + CONSERVATIVE_LIFETIME_MS,
        };
        *cached = Some(credential.clone());
        Ok(credential)
    }

    /// Force the next `get_token` call to refresh. Test hook and escape hatch
    /// for callers that observe a 401 on a supposedly fresh token.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

/// Exchange username/password for a bearer token at the upstream login
/// endpoint. Also used directly by the session login handler.
pub async fn login_exchange(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<String, ProviderError> {
    let url = format!("{}/api/auth/login", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .header("Accept", "application/json")
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Auth {
            status: status.as_u16(),
            body,
        });
    }

    let body: LoginResponse = response.json().await?;
    body.token.ok_or_else(|| ProviderError::Auth {
        status: status.as_u16(),
        body: "login response did not include a token".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pre_issued_token_served_without_login() {
        let cache = CredentialCache::new(
            "https://iot.example.com".to_string(),
            Some("pre-issued".to_string()),
            None,
            None,
            reqwest::Client::new(),
        );

        let credential = cache.get_token().await.unwrap();
        assert_eq!(credential.token, "pre-issued");
        assert_eq!(credential.expires_at, i64::MAX);
    }

    #[tokio::test]
    async fn test_no_credential_source_is_an_auth_error() {
        let cache = CredentialCache::new(
            "https://iot.example.com".to_string(),
            None,
            None,
            None,
            reqwest::Client::new(),
        );

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_login_result_is_cached() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "tok-1",
                "refreshToken": "refresh-1",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cache = CredentialCache::new(
            server.uri(),
            None,
            Some("tenant@example.com".to_string()),
            Some("secret".to_string()),
            reqwest::Client::new(),
        );

        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();
        assert_eq!(first.token, "tok-1");
        assert_eq!(second.token, "tok-1");
        // expect(1) on the mock verifies no second login happened
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "token": "tok-1" }))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cache = std::sync::Arc::new(CredentialCache::new(
            server.uri(),
            None,
            Some("tenant@example.com".to_string()),
            Some("secret".to_string()),
            reqwest::Client::new(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await.unwrap().token })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "tok-1");
        }
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "tok-1",
            })))
            .expect(2)
            .mount(&server)
            .await;

        let cache = CredentialCache::new(
            server.uri(),
            None,
            Some("tenant@example.com".to_string()),
            Some("secret".to_string()),
            reqwest::Client::new(),
        );

        cache.get_token().await.unwrap();
        cache.invalidate().await;
        cache.get_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_login_failure_carries_status_and_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let cache = CredentialCache::new(
            server.uri(),
            None,
            Some("tenant@example.com".to_string()),
            Some("wrong".to_string()),
            reqwest::Client::new(),
        );

        match cache.get_token().await.unwrap_err() {
            ProviderError::Auth { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad credentials");
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn test_freshness_margin() {
        let now = 1_700_000_000_000;
        let credential = Credential {
            token: "t".to_string(),
            expires_at: now + REFRESH_MARGIN_MS + 1,
        };
        assert!(credential.is_fresh(now));

        let expiring = Credential {
            token: "t".to_string(),
            expires_at: now + REFRESH_MARGIN_MS - 1,
        };
        assert!(!expiring.is_fresh(now));
    }
}
