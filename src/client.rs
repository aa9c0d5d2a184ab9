//! Chat-completion client for the Groq OpenAI-compatible endpoint.

use crate::error::ChatError;
use crate::stream::{ChunkSink, read_stream};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Upper bound on generated length for every request.
pub const MAX_TOKENS: u32 = 1000;

/// Connect timeout for every request, and total timeout for non-streamed requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall deadline for a streamed request, from send to the last line.
pub const DEFAULT_STREAM_DEADLINE: Duration = Duration::from_secs(120);

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const USAGE_PROBE_PROMPT: &str = "Get token usage info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sync,
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Token accounting reported by the API. Fields the API adds beyond the
/// common three are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Usage {
    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none()
            && self.completion_tokens.is_none()
            && self.total_tokens.is_none()
            && self.extra.is_empty()
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Generated text plus whatever usage the API reported. Streamed calls never carry usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<Usage>,
}

pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    request_timeout: Duration,
    stream_deadline: Duration,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: GROQ_CHAT_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            stream_deadline: DEFAULT_STREAM_DEADLINE,
        })
    }

    /// Points the client at a different chat-completion URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the total timeout for non-streamed requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_stream_deadline(mut self, deadline: Duration) -> Self {
        self.stream_deadline = deadline;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Builds the two-message generation request for `prompt`.
    pub fn generation_request(&self, prompt: &str, mode: Mode) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: MAX_TOKENS,
            stream: (mode == Mode::Streaming).then_some(true),
        }
    }

    /// Sends `prompt` and returns the generated text.
    ///
    /// In streaming mode every piece of text is passed to `sink` as it arrives
    /// and the pieces are joined with newlines.
    pub async fn complete(
        &self,
        prompt: &str,
        mode: Mode,
        sink: &mut dyn ChunkSink,
    ) -> Result<Completion, ChatError> {
        let request = self.generation_request(prompt, mode);
        match mode {
            Mode::Sync => self.send_sync(&request).await.and_then(|response| {
                let usage = response.usage;
                let text = response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or(ChatError::EmptyResponse)?;
                Ok(Completion { text, usage })
            }),
            Mode::Streaming => self.send_streaming(&request, sink).await,
        }
    }

    /// Issues a single-message request and returns only its `usage` field.
    pub async fn probe_usage(&self) -> Result<Option<Usage>, ChatError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(USAGE_PROBE_PROMPT)],
            max_tokens: MAX_TOKENS,
            stream: None,
        };
        Ok(self.send_sync(&request).await?.usage)
    }

    fn post(&self, request: &ChatRequest) -> reqwest::RequestBuilder {
        debug!(
            "POST {} (model: {:?}, messages: {}, stream: {})",
            self.endpoint,
            request.model,
            request.messages.len(),
            request.stream.unwrap_or(false)
        );

        self.http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
    }

    async fn send_sync(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let response = self.post(request).timeout(self.request_timeout).send().await?;

        let status = response.status();
        debug!("Response status: {status}");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let body = response.text().await?;
        debug!("Raw response content: {body}");
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_streaming(
        &self,
        request: &ChatRequest,
        sink: &mut dyn ChunkSink,
    ) -> Result<Completion, ChatError> {
        let deadline = self.stream_deadline;
        let exchange = async {
            let response = self.post(request).send().await?;

            let status = response.status();
            debug!("Response status: {status}");
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::Status { status, body });
            }

            let text = read_stream(response.bytes_stream(), sink).await?;
            Ok::<_, ChatError>(Completion { text, usage: None })
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(result) => result,
            Err(_) => Err(ChatError::StreamTimeout(deadline)),
        }
    }
}
