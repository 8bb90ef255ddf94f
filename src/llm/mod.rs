pub mod config;
pub mod prompts;
pub mod secrets;
pub mod service;

pub use config::{ConfigError, ConfigOverrides, ConfigResolver, Provider, ProviderConfig};
pub use secrets::SecretsStore;
pub use service::{ChatBackend, LlmService, UpstreamError};
