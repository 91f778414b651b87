// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod live_provider;
pub mod mock_provider;
