use loan_checklist::checklist::applicant::{
    EmploymentType, LoanPurpose, PassportType, Residence, YesNo,
};
use loan_checklist::checklist::{ApplicantInput, ChecklistGenerator, TemplateStore};
use loan_checklist::llm::prompts::SYSTEM_PROMPT;
use loan_checklist::llm::{LlmService, Provider, ProviderConfig, UpstreamError};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000u32,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
    })
}

async fn mock_completion(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .expect(1)
        .mount(server)
        .await;
}

fn config_for(server: &MockServer, provider: Provider, temperature: f32) -> ProviderConfig {
    let mut config = ProviderConfig::new(provider, "test-key-0123456789");
    config.base_url = Some(server.uri());
    config.temperature = temperature;
    config
}

async fn sent_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).unwrap()
}

#[tokio::test]
async fn secondary_provider_request_carries_temperature() {
    let server = MockServer::start().await;
    mock_completion(&server, "- [ ] Passport").await;

    let service = LlmService::new(config_for(&server, Provider::DeepSeek, 0.5)).unwrap();
    let text = service.dispatch(SYSTEM_PROMPT, "Checklist please").await.unwrap();
    assert_eq!(text, "- [ ] Passport");

    let body = sent_body(&server).await;
    assert_eq!(body["model"], "deepseek-chat");
    assert_eq!(body["temperature"].as_f64(), Some(0.5));
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Checklist please");
}

#[tokio::test]
async fn primary_provider_request_omits_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key-0123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let service = LlmService::new(config_for(&server, Provider::OpenAi, 0.5)).unwrap();
    service.dispatch(SYSTEM_PROMPT, "Checklist please").await.unwrap();

    let body = sent_body(&server).await;
    assert_eq!(body["model"], "gpt-5-mini");
    assert!(body.get("temperature").is_none());
}

#[tokio::test]
async fn auth_failure_surfaces_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = LlmService::new(config_for(&server, Provider::OpenAi, 0.2)).unwrap();
    let err = service.dispatch(SYSTEM_PROMPT, "prompt").await.unwrap_err();

    match err {
        UpstreamError::Api { provider, message } => {
            assert_eq!(provider, Provider::OpenAi);
            assert!(message.contains("Incorrect API key provided"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_completion_is_an_error() {
    let server = MockServer::start().await;
    mock_completion(&server, "   ").await;

    let service = LlmService::new(config_for(&server, Provider::DeepSeek, 0.2)).unwrap();
    let err = service.dispatch(SYSTEM_PROMPT, "prompt").await.unwrap_err();

    assert!(matches!(err, UpstreamError::EmptyResponse(Provider::DeepSeek)));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server, Provider::DeepSeek, 0.2);
    config.timeout_secs = 1;
    let service = LlmService::new(config).unwrap();

    let err = service.dispatch(SYSTEM_PROMPT, "prompt").await.unwrap_err();
    assert!(matches!(err, UpstreamError::Timeout { secs: 1, .. }));
}

#[tokio::test]
async fn rate_limit_surfaces_before_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "message": "Rate limit reached for gpt-5-mini",
                "type": "requests",
                "param": null,
                "code": "rate_limit_exceeded"
            }
        })))
        .mount(&server)
        .await;

    let mut config = config_for(&server, Provider::OpenAi, 0.2);
    config.timeout_secs = 8;
    let service = LlmService::new(config).unwrap();

    let err = service.dispatch(SYSTEM_PROMPT, "prompt").await.unwrap_err();
    match err {
        UpstreamError::RateLimitExceeded { provider, message } => {
            assert_eq!(provider, Provider::OpenAi);
            assert!(message.contains("Rate limit reached for gpt-5-mini"));
        }
        other => panic!("expected rate limit error, got {:?}", other),
    }
}

#[tokio::test]
async fn generator_end_to_end_with_bundled_template() {
    let server = MockServer::start().await;
    mock_completion(&server, "## Identification\n- [ ] Passport").await;

    let service = LlmService::new(config_for(&server, Provider::DeepSeek, 0.2)).unwrap();
    let template = TemplateStore::Bundled.load().unwrap();
    let generator = ChecklistGenerator::new(service, template);

    let applicant = ApplicantInput {
        client_name: "Jane Citizen".to_string(),
        loan_purpose: LoanPurpose::Purchase,
        employment_type: EmploymentType::SelfEmployed,
        passport_type: PassportType::NonAustralian,
        rental_property: YesNo::Yes,
        trust_assets: Some(YesNo::No),
        country: Some(Residence::Australia),
        notes: "First home".to_string(),
    };

    let result = generator.generate(&applicant).await.unwrap();
    assert_eq!(result.text, "## Identification\n- [ ] Passport");
    assert_eq!(result.generated_by, "DeepSeek (deepseek-chat)");

    let body = sent_body(&server).await;
    let user_prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_prompt.contains("Client name: Jane Citizen"));
    assert!(user_prompt.contains("Employment type: Self-Employed"));
    assert!(user_prompt.contains("Passport type: Non-Australian"));
    assert!(!user_prompt.contains("{client_name}"));

    let dir = tempfile::tempdir().unwrap();
    let saved = result.save(dir.path()).unwrap();
    assert_eq!(saved, dir.path().join("Jane Citizen_LoanChecklist.txt"));
    assert_eq!(std::fs::read_to_string(saved).unwrap(), result.text);
}
