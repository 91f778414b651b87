use serde::Deserialize;

/// Connection settings for the upstream IoT platform.
///
/// Loaded from an optional `config/upstream` file merged with `UPSTREAM_*`
/// environment variables (e.g. `UPSTREAM_BASE_URL`, `UPSTREAM_USE_MOCK`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct UpstreamSettings {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Device whose telemetry feeds the demo dashboard charts.
    pub device_id: Option<String>,
    #[serde(default)]
    pub use_mock: bool,
}

impl UpstreamSettings {
    /// Mock data is served when explicitly requested or when no upstream is
    /// configured at all.
    pub fn mock_enabled(&self) -> bool {
        self.use_mock || self.base_url.is_none()
    }
}

pub fn load_upstream_settings() -> anyhow::Result<UpstreamSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/upstream").required(false))
        .add_source(config::Environment::with_prefix("UPSTREAM").try_parsing(true))
        .build()?;

    Ok(settings.try_deserialize()?)
}
