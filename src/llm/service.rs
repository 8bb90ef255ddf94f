use crate::llm::config::{ConfigError, Provider, ProviderConfig};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Failures reported by, or while talking to, the chat-completion service
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{provider} API error: {message}")]
    Api { provider: Provider, message: String },

    #[error("{provider} rate limit exceeded: {message}")]
    RateLimitExceeded { provider: Provider, message: String },

    #[error("Request to {provider} timed out after {secs} seconds")]
    Timeout { provider: Provider, secs: u64 },

    #[error("{0} returned no checklist content")]
    EmptyResponse(Provider),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Anything that can turn a system and user prompt into generated text
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, UpstreamError>;

    /// Short human-readable description, e.g. "OpenAI (gpt-5-mini)"
    fn describe(&self) -> String;
}

/// Chat message for LLM interactions
#[derive(Debug, Clone)]
pub enum ChatMessage {
    System(String),
    User(String),
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self::System(content.to_string())
    }

    pub fn user(content: &str) -> Self {
        Self::User(content.to_string())
    }

    fn into_openai_message(self) -> Result<ChatCompletionRequestMessage, String> {
        match self {
            ChatMessage::System(content) => ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()
                .map(ChatCompletionRequestMessage::System)
                .map_err(|e| e.to_string()),
            ChatMessage::User(content) => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map(ChatCompletionRequestMessage::User)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Build the outbound chat-completion request for a provider.
///
/// `temperature` is only set when the provider accepts it; sending it to
/// one that does not makes the whole call fail.
pub fn build_request(
    config: &ProviderConfig,
    messages: Vec<ChatMessage>,
) -> Result<CreateChatCompletionRequest, UpstreamError> {
    let openai_messages = messages
        .into_iter()
        .map(ChatMessage::into_openai_message)
        .collect::<Result<Vec<_>, _>>()
        .map_err(UpstreamError::InvalidRequest)?;

    let mut request_builder = CreateChatCompletionRequestArgs::default();
    request_builder.model(&config.model).messages(openai_messages);

    match config.request_temperature() {
        Some(temperature) => {
            request_builder.temperature(temperature);
            debug!("Setting temperature to {}", temperature);
        }
        None => {
            debug!(
                "Skipping temperature parameter for {} (not supported)",
                config.provider
            );
        }
    }

    request_builder
        .build()
        .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))
}

/// Longest time async-openai may spend retrying a rate-limited request
pub const MAX_RATE_LIMIT_RETRY: Duration = Duration::from_secs(2);

/// Retry window for HTTP 429 responses.
///
/// Capped at a quarter of the request timeout so a persistent rate limit
/// comes back as an error instead of running into the timeout.
fn rate_limit_backoff(timeout_secs: u64) -> ExponentialBackoff {
    let window = MAX_RATE_LIMIT_RETRY.min(Duration::from_secs(timeout_secs) / 4);
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(250))
        .with_max_interval(window)
        .with_max_elapsed_time(Some(window))
        .build()
}

/// Chat-completion client for the configured provider
pub struct LlmService {
    client: Client<OpenAIConfig>,
    config: ProviderConfig,
}

impl LlmService {
    /// Create a new service; fails if the configuration cannot be used for a request
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.api_base());

        let client = Client::with_config(openai_config)
            .with_backoff(rate_limit_backoff(config.timeout_secs));

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send one request and return the generated text
    pub async fn dispatch(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, UpstreamError> {
        let provider = self.config.provider;
        let request = build_request(
            &self.config,
            vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
        )?;

        info!(
            provider = provider.id(),
            model = %self.config.model,
            api_base = %self.config.api_base(),
            api_key = %self.config.masked_api_key(),
            prompt_chars = user_prompt.len(),
            "Sending chat completion request"
        );

        if let Ok(json) = serde_json::to_string_pretty(&request) {
            debug!(request_json = %json, "Chat completion request JSON");
        }

        let response = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| UpstreamError::Timeout {
            provider,
            secs: self.config.timeout_secs,
        })?
        .map_err(|e| upstream_error(provider, e))?;

        if let Some(usage) = &response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .filter(|content| !content.trim().is_empty())
            .ok_or(UpstreamError::EmptyResponse(provider))?
            .to_string();

        debug!("Received response: {} chars", content.len());

        Ok(content)
    }
}

#[async_trait]
impl ChatBackend for LlmService {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, UpstreamError> {
        self.dispatch(system_prompt, user_prompt).await
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }
}

fn upstream_error(provider: Provider, error: OpenAIError) -> UpstreamError {
    let message = match error {
        OpenAIError::ApiError(api) => api.message,
        other => other.to_string(),
    };

    if message.to_lowercase().contains("rate limit") {
        UpstreamError::RateLimitExceeded { provider, message }
    } else {
        UpstreamError::Api { provider, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompts::SYSTEM_PROMPT;

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user("Checklist for Jane"),
        ]
    }

    #[test]
    fn test_secondary_provider_sends_temperature() {
        for temperature in [0.0, 0.2, 0.75, 1.0, 2.0] {
            let mut config = ProviderConfig::new(Provider::DeepSeek, "ds-key");
            config.temperature = temperature;

            let request = build_request(&config, messages()).unwrap();
            assert_eq!(request.temperature, Some(temperature));
            assert_eq!(request.model, "deepseek-chat");
        }
    }

    #[test]
    fn test_primary_provider_omits_temperature() {
        for temperature in [0.0, 0.2, 0.75, 1.0, 2.0] {
            let mut config = ProviderConfig::new(Provider::OpenAi, "sk-key");
            config.temperature = temperature;

            let request = build_request(&config, messages()).unwrap();
            assert_eq!(request.temperature, None);

            let json = serde_json::to_value(&request).unwrap();
            assert!(json.get("temperature").is_none());
        }
    }

    #[test]
    fn test_request_messages() {
        let config = ProviderConfig::new(Provider::OpenAi, "sk-key");
        let request = build_request(&config, messages()).unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-5-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "Checklist for Jane");
    }

    #[test]
    fn test_service_requires_api_key() {
        let config = ProviderConfig::new(Provider::OpenAi, "");
        assert!(matches!(
            LlmService::new(config),
            Err(ConfigError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn test_rate_limit_backoff_is_bounded_by_timeout() {
        let default = rate_limit_backoff(120);
        assert_eq!(default.max_elapsed_time, Some(MAX_RATE_LIMIT_RETRY));

        let short = rate_limit_backoff(4);
        assert_eq!(short.max_elapsed_time, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_rate_limit_message_is_kept() {
        let error = upstream_error(
            Provider::OpenAi,
            OpenAIError::InvalidArgument("Rate limit reached for gpt-5-mini".to_string()),
        );
        match error {
            UpstreamError::RateLimitExceeded { provider, message } => {
                assert_eq!(provider, Provider::OpenAi);
                assert!(message.contains("Rate limit reached for gpt-5-mini"));
            }
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_describe() {
        let service =
            LlmService::new(ProviderConfig::new(Provider::DeepSeek, "ds-key")).unwrap();
        assert_eq!(service.describe(), "DeepSeek (deepseek-chat)");
    }
}
