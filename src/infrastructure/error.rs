// Error taxonomy for upstream access
use thiserror::Error;

/// Failures surfaced by the credential cache, gateway and providers.
///
/// A 404 on an entity lookup is deliberately NOT represented here - lookup
/// calls return `Ok(None)` so callers can branch on "not found" without
/// error handling.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing configuration: {0}")]
    Config(&'static str),

    #[error("no credential source configured (set an access token or username/password)")]
    MissingCredentials,

    #[error("upstream login failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("upstream request failed ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
