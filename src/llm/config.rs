use crate::llm::secrets::SecretsStore;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Default sampling temperature when no source provides one
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Highest temperature accepted by the OpenAI-compatible APIs
pub const MAX_TEMPERATURE: f32 = 2.0;

pub const PROVIDER_VAR: &str = "LLM_PROVIDER";
pub const TEMPERATURE_VAR: &str = "TEMPERATURE";
pub const TIMEOUT_VAR: &str = "LLM_REQUEST_TIMEOUT";

/// Generic section of the secrets document
const CONFIG_SECTION: &str = "config";

/// Errors raised while resolving provider configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{provider} API key is missing. Set {env_var} in the environment or api_key under [{section}] in the secrets file")]
    MissingApiKey {
        provider: Provider,
        env_var: &'static str,
        section: &'static str,
    },

    #[error("Invalid temperature '{value}' from {origin}: expected a number")]
    InvalidTemperature { value: String, origin: ValueOrigin },

    #[error("Temperature must be between 0.0 and {max}, got {value}", max = MAX_TEMPERATURE)]
    TemperatureOutOfRange { value: f32 },

    #[error("Invalid request timeout '{value}' from {origin}: expected a positive number of seconds")]
    InvalidTimeout { value: String, origin: ValueOrigin },

    #[error("Secrets file not found: {0}")]
    SecretsNotFound(String),

    #[error("Failed to read secrets file {path}: {message}")]
    SecretsUnreadable { path: String, message: String },

    #[error("Malformed secrets document: {0}")]
    SecretsMalformed(String),
}

/// Where a configuration value was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    Override,
    Environment(&'static str),
    Secrets(String),
}

impl fmt::Display for ValueOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueOrigin::Override => write!(f, "command line"),
            ValueOrigin::Environment(var) => write!(f, "environment variable {}", var),
            ValueOrigin::Secrets(key) => write!(f, "secrets key {}", key),
        }
    }
}

/// Static description of a chat-completion provider
#[derive(Debug)]
pub struct ProviderProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    pub api_key_var: &'static str,
    pub model_var: &'static str,
    pub base_url_var: &'static str,
    pub default_model: &'static str,
    pub default_base_url: &'static str,
    /// Whether the API accepts a custom `temperature`.
    /// The OpenAI reasoning models reject anything but the default.
    pub supports_temperature: bool,
}

static OPENAI_PROFILE: ProviderProfile = ProviderProfile {
    id: "openai",
    display_name: "OpenAI",
    api_key_var: "OPENAI_API_KEY",
    model_var: "OPENAI_MODEL",
    base_url_var: "OPENAI_BASE_URL",
    default_model: "gpt-5-mini",
    default_base_url: "https://api.openai.com/v1",
    supports_temperature: false,
};

static DEEPSEEK_PROFILE: ProviderProfile = ProviderProfile {
    id: "deepseek",
    display_name: "DeepSeek",
    api_key_var: "DEEPSEEK_API_KEY",
    model_var: "DEEPSEEK_MODEL",
    base_url_var: "DEEPSEEK_BASE_URL",
    default_model: "deepseek-chat",
    default_base_url: "https://api.deepseek.com",
    supports_temperature: true,
};

/// Supported chat-completion providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Primary provider
    #[default]
    OpenAi,
    /// Secondary provider
    DeepSeek,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::DeepSeek];

    pub fn profile(&self) -> &'static ProviderProfile {
        match self {
            Provider::OpenAi => &OPENAI_PROFILE,
            Provider::DeepSeek => &DEEPSEEK_PROFILE,
        }
    }

    pub fn id(&self) -> &'static str {
        self.profile().id
    }

    pub fn supports_temperature(&self) -> bool {
        self.profile().supports_temperature
    }

    /// Parse a provider id, ignoring case and surrounding whitespace
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.id() == wanted)
    }

    /// Parse a configured provider, falling back to the default for unknown values
    pub fn from_setting(value: &str) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            let fallback = Provider::default();
            warn!(
                "Unknown LLM provider '{}', falling back to {}",
                value.trim(),
                fallback.id()
            );
            fallback
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().display_name)
    }
}

/// Fully resolved configuration for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,

    pub api_key: String,

    pub model: String,

    /// Custom API base; the provider default is used when unset
    pub base_url: Option<String>,

    pub temperature: f32,

    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.profile().default_model.to_string(),
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Base URL the request is sent to
    pub fn api_base(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.profile().default_base_url)
    }

    /// Temperature to put on the wire, if the provider accepts one
    pub fn request_temperature(&self) -> Option<f32> {
        self.provider
            .supports_temperature()
            .then_some(self.temperature)
    }

    pub fn masked_api_key(&self) -> String {
        mask_token(&self.api_key)
    }

    /// Check the invariants required before any request is dispatched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            let profile = self.provider.profile();
            return Err(ConfigError::MissingApiKey {
                provider: self.provider,
                env_var: profile.api_key_var,
                section: profile.id,
            });
        }

        check_temperature(self.temperature)?;

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: "0".to_string(),
                origin: ValueOrigin::Override,
            });
        }

        Ok(())
    }
}

/// Masks an API key for display: first 7 chars + "***" + last 4 chars.
/// Keys of 11 chars or fewer are fully hidden.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

fn check_temperature(value: f32) -> Result<f32, ConfigError> {
    if !(0.0..=MAX_TEMPERATURE).contains(&value) {
        return Err(ConfigError::TemperatureOutOfRange { value });
    }
    Ok(value)
}

/// Values supplied explicitly at runtime (command line flags)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

/// Resolves a [`ProviderConfig`] from overrides, environment, secrets and defaults,
/// in that order of precedence
pub struct ConfigResolver {
    overrides: ConfigOverrides,
    env: HashMap<String, String>,
    secrets: SecretsStore,
}

impl ConfigResolver {
    /// Build a resolver reading the current process environment
    pub fn new(overrides: ConfigOverrides, secrets: SecretsStore) -> Self {
        let env = known_env_vars()
            .into_iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect();
        Self::with_env(overrides, secrets, env)
    }

    /// Build a resolver over a fixed environment snapshot
    pub fn with_env(
        overrides: ConfigOverrides,
        secrets: SecretsStore,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            overrides,
            env,
            secrets,
        }
    }

    pub fn resolve(&self) -> Result<ProviderConfig, ConfigError> {
        let provider = self.resolve_provider();
        let profile = provider.profile();
        debug!("Resolving configuration for provider {}", provider.id());

        let (api_key, _) = self
            .lookup(
                self.overrides.api_key.as_deref(),
                profile.api_key_var,
                profile.id,
                "api_key",
            )
            .ok_or(ConfigError::MissingApiKey {
                provider,
                env_var: profile.api_key_var,
                section: profile.id,
            })?;

        let model = self
            .lookup(
                self.overrides.model.as_deref(),
                profile.model_var,
                profile.id,
                "model",
            )
            .map(|(model, _)| model)
            .unwrap_or_else(|| profile.default_model.to_string());

        let base_url = self
            .lookup(
                self.overrides.base_url.as_deref(),
                profile.base_url_var,
                profile.id,
                "base_url",
            )
            .map(|(url, _)| url);

        let config = ProviderConfig {
            provider,
            api_key,
            model,
            base_url,
            temperature: self.resolve_temperature(provider)?,
            timeout_secs: self.resolve_timeout()?,
        };

        debug!(
            provider = provider.id(),
            model = %config.model,
            api_base = %config.api_base(),
            temperature = config.temperature,
            timeout_secs = config.timeout_secs,
            "Configuration resolved"
        );

        Ok(config)
    }

    fn resolve_provider(&self) -> Provider {
        self.lookup(
            self.overrides.provider.as_deref(),
            PROVIDER_VAR,
            CONFIG_SECTION,
            "llm_provider",
        )
        .map(|(value, _)| Provider::from_setting(&value))
        .unwrap_or_default()
    }

    fn resolve_temperature(&self, provider: Provider) -> Result<f32, ConfigError> {
        if let Some(value) = self.overrides.temperature {
            return check_temperature(value);
        }

        let found = self
            .env_value(TEMPERATURE_VAR)
            .map(|value| (value, ValueOrigin::Environment(TEMPERATURE_VAR)))
            .or_else(|| self.secret_value(provider.id(), "temperature", TEMPERATURE_VAR))
            .or_else(|| self.secret_value(CONFIG_SECTION, "temperature", TEMPERATURE_VAR));

        match found {
            Some((raw, origin)) => {
                let value = raw
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or(ConfigError::InvalidTemperature { value: raw, origin })?;
                check_temperature(value)
            }
            None => Ok(DEFAULT_TEMPERATURE),
        }
    }

    fn resolve_timeout(&self) -> Result<u64, ConfigError> {
        if let Some(secs) = self.overrides.timeout_secs {
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout {
                    value: secs.to_string(),
                    origin: ValueOrigin::Override,
                });
            }
            return Ok(secs);
        }

        match self.lookup(None, TIMEOUT_VAR, CONFIG_SECTION, "request_timeout") {
            Some((raw, origin)) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw, origin }),
            None => Ok(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Look a value up as override, then environment, then secrets
    /// (nested `[section] key` first, then the flat env-style key)
    fn lookup(
        &self,
        override_value: Option<&str>,
        env_key: &'static str,
        section: &str,
        key: &str,
    ) -> Option<(String, ValueOrigin)> {
        if let Some(value) = override_value.map(str::trim).filter(|v| !v.is_empty()) {
            return Some((value.to_string(), ValueOrigin::Override));
        }

        if let Some(value) = self.env_value(env_key) {
            return Some((value, ValueOrigin::Environment(env_key)));
        }

        self.secret_value(section, key, env_key)
    }

    fn env_value(&self, key: &str) -> Option<String> {
        self.env
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn secret_value(
        &self,
        section: &str,
        key: &str,
        flat_key: &str,
    ) -> Option<(String, ValueOrigin)> {
        if let Some(value) = self.secrets.section_value(section, key) {
            return Some((value, ValueOrigin::Secrets(format!("{}.{}", section, key))));
        }
        self.secrets
            .flat_value(flat_key)
            .map(|value| (value, ValueOrigin::Secrets(flat_key.to_string())))
    }
}

/// Every environment variable the resolver reads
pub fn known_env_vars() -> Vec<&'static str> {
    let mut vars = vec![PROVIDER_VAR, TEMPERATURE_VAR, TIMEOUT_VAR];
    for provider in Provider::ALL {
        let profile = provider.profile();
        vars.extend([profile.api_key_var, profile.model_var, profile.base_url_var]);
    }
    vars
}
