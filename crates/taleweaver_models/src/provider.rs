//! Provider wire formats.
//!
//! Requests are built from a provider-neutral [`GenerateRequest`] plus the session's
//! [`ModelConfig`]; per-request overrides win over configuration values.

use serde::{Deserialize, Serialize};
use taleweaver_core::{GenerateRequest, ModelConfig, ProviderKind, Role};
use taleweaver_error::{ModelsError, ModelsErrorKind, ModelsResult};

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One message in the OpenAI chat-completions dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

/// Request body for OpenAI-compatible endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiRequest {
    /// Model identifier
    pub model: String,
    /// Conversation in order
    pub messages: Vec<OpenAiMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion length limit
    pub max_tokens: u32,
}

/// One message in the Anthropic messages dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

/// Request body for the Anthropic messages endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicRequest {
    /// Model identifier
    pub model: String,
    /// System prompt lifted out of the message list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Alternating user/assistant turns
    pub messages: Vec<AnthropicMessage>,
    /// Completion length limit
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// A request in whichever dialect the provider speaks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderRequest {
    /// OpenAI, DeepSeek, Ollama and custom endpoints
    OpenAi(OpenAiRequest),
    /// Anthropic
    Anthropic(AnthropicRequest),
}

impl ProviderRequest {
    /// Build the request body for the configured provider.
    pub fn build(config: &ModelConfig, request: &GenerateRequest) -> Self {
        match config.provider {
            ProviderKind::Anthropic => Self::Anthropic(build_anthropic_request(config, request)),
            ProviderKind::OpenAi
            | ProviderKind::DeepSeek
            | ProviderKind::Ollama
            | ProviderKind::Custom => Self::OpenAi(build_openai_request(config, request)),
        }
    }

    /// Full endpoint URL below the given base.
    pub fn endpoint(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Self::OpenAi(_) => format!("{}/chat/completions", base),
            Self::Anthropic(_) => format!("{}/messages", base),
        }
    }

    /// Model named in the body.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(req) => &req.model,
            Self::Anthropic(req) => &req.model,
        }
    }
}

fn resolve_model(config: &ModelConfig, request: &GenerateRequest) -> String {
    request
        .model()
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| config.effective_model().to_string())
}

/// Build an OpenAI chat-completions request.
pub fn build_openai_request(config: &ModelConfig, request: &GenerateRequest) -> OpenAiRequest {
    OpenAiRequest {
        model: resolve_model(config, request),
        messages: request
            .messages()
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect(),
        temperature: request.temperature().unwrap_or(config.temperature),
        max_tokens: request.max_tokens().unwrap_or(config.max_tokens),
    }
}

/// Build an Anthropic messages request.
///
/// System messages are joined into the top-level `system` field and consecutive turns of
/// the same role are merged, since the endpoint expects strictly alternating roles.
pub fn build_anthropic_request(
    config: &ModelConfig,
    request: &GenerateRequest,
) -> AnthropicRequest {
    let mut system_parts = Vec::new();
    let mut messages: Vec<AnthropicMessage> = Vec::new();

    for message in request.messages() {
        let role = match message.role {
            Role::System => {
                system_parts.push(message.content.clone());
                continue;
            }
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&message.content);
            }
            _ => messages.push(AnthropicMessage {
                role: role.to_string(),
                content: message.content.clone(),
            }),
        }
    }

    if messages.first().is_none_or(|m| m.role != "user") {
        messages.insert(
            0,
            AnthropicMessage {
                role: "user".to_string(),
                content: "Continue.".to_string(),
            },
        );
    }

    AnthropicRequest {
        model: resolve_model(config, request),
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        messages,
        max_tokens: request.max_tokens().unwrap_or(config.max_tokens),
        temperature: request.temperature().unwrap_or(config.temperature),
    }
}

/// Message inside an OpenAI choice.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponseMessage {
    /// Completion text
    #[serde(default)]
    pub content: Option<String>,
}

/// One completion alternative.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    /// The generated message
    pub message: OpenAiResponseMessage,
}

/// OpenAI chat-completions response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponse {
    /// Completion alternatives
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

/// One content block of an Anthropic response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicContentBlock {
    /// Block type ("text", "tool_use", ...)
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text of a text block
    #[serde(default)]
    pub text: Option<String>,
}

/// Anthropic messages response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicResponse {
    /// Content blocks
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
}

/// Extract the completion text from a response body.
///
/// # Errors
///
/// `Parse` when the body has the wrong shape, `EmptyResponse` when it carries no text.
pub fn parse_completion(provider: ProviderKind, body: &str) -> ModelsResult<String> {
    let text = match provider {
        ProviderKind::Anthropic => {
            let response: AnthropicResponse = serde_json::from_str(body)
                .map_err(|e| ModelsError::new(ModelsErrorKind::Parse(e.to_string())))?;
            response
                .content
                .into_iter()
                .filter(|block| block.block_type == "text")
                .filter_map(|block| block.text)
                .collect::<Vec<_>>()
                .join("")
        }
        _ => {
            let response: OpenAiResponse = serde_json::from_str(body)
                .map_err(|e| ModelsError::new(ModelsErrorKind::Parse(e.to_string())))?;
            response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default()
        }
    };

    if text.trim().is_empty() {
        return Err(ModelsError::new(ModelsErrorKind::EmptyResponse));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taleweaver_core::ChatMessage;

    fn request(messages: Vec<ChatMessage>) -> GenerateRequest {
        GenerateRequest::builder().messages(messages).build().unwrap()
    }

    #[test]
    fn test_openai_request_uses_config_defaults() {
        let config = ModelConfig::new(ProviderKind::DeepSeek);
        let req = request(vec![
            ChatMessage::system("You narrate."),
            ChatMessage::user("Begin"),
        ]);

        let body = build_openai_request(&config, &req);
        assert_eq!(body.model, "deepseek-chat");
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content, "Begin");
        assert_eq!(body.max_tokens, 2000);

        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_request_overrides_win() {
        let config = ModelConfig::new(ProviderKind::OpenAi);
        let req = GenerateRequest::builder()
            .messages(vec![ChatMessage::user("Begin")])
            .model("gpt-4o")
            .temperature(0.2)
            .max_tokens(100u32)
            .build()
            .unwrap();

        let body = build_openai_request(&config, &req);
        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.temperature, 0.2);
        assert_eq!(body.max_tokens, 100);
    }

    #[test]
    fn test_anthropic_lifts_system_and_merges_turns() {
        let config = ModelConfig::new(ProviderKind::Anthropic);
        let req = request(vec![
            ChatMessage::system("You narrate."),
            ChatMessage::system("Reply in JSON."),
            ChatMessage::user("Chapter one"),
            ChatMessage::user("I open the door"),
            ChatMessage::assistant("{\"scene\":\"...\"}"),
            ChatMessage::user("Next"),
        ]);

        let body = build_anthropic_request(&config, &req);
        assert_eq!(body.system.as_deref(), Some("You narrate.\n\nReply in JSON."));
        assert_eq!(body.messages.len(), 3);
        assert_eq!(body.messages[0].content, "Chapter one\n\nI open the door");
        assert_eq!(body.messages[1].role, "assistant");
        assert_eq!(body.messages[2].role, "user");
    }

    #[test]
    fn test_anthropic_requires_leading_user_turn() {
        let config = ModelConfig::new(ProviderKind::Anthropic);
        let req = request(vec![ChatMessage::system("Only instructions")]);

        let body = build_anthropic_request(&config, &req);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn test_provider_request_dispatch_and_endpoint() {
        let req = request(vec![ChatMessage::user("Begin")]);

        let anthropic = ProviderRequest::build(&ModelConfig::new(ProviderKind::Anthropic), &req);
        assert!(matches!(anthropic, ProviderRequest::Anthropic(_)));
        assert_eq!(
            anthropic.endpoint("https://api.anthropic.com/v1/"),
            "https://api.anthropic.com/v1/messages"
        );

        let ollama = ProviderRequest::build(&ModelConfig::new(ProviderKind::Ollama), &req);
        assert!(matches!(ollama, ProviderRequest::OpenAi(_)));
        assert_eq!(
            ollama.endpoint("http://localhost:11434/v1"),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(ollama.model(), "llama3.1");
    }

    #[test]
    fn test_parse_openai_completion() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Once upon a time"}}]}"#;
        assert_eq!(
            parse_completion(ProviderKind::OpenAi, body).unwrap(),
            "Once upon a time"
        );
    }

    #[test]
    fn test_parse_anthropic_completion_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"Once "},{"type":"tool_use","id":"t"},{"type":"text","text":"upon"}]}"#;
        assert_eq!(
            parse_completion(ProviderKind::Anthropic, body).unwrap(),
            "Once upon"
        );
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        let empty = parse_completion(ProviderKind::OpenAi, r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(empty.kind, ModelsErrorKind::EmptyResponse);

        let blank = parse_completion(ProviderKind::Anthropic, r#"{"content":[{"type":"text","text":"  "}]}"#)
            .unwrap_err();
        assert_eq!(blank.kind, ModelsErrorKind::EmptyResponse);

        let malformed = parse_completion(ProviderKind::OpenAi, "not json").unwrap_err();
        assert!(matches!(malformed.kind, ModelsErrorKind::Parse(_)));
    }
}
