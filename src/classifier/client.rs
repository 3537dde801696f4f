//! Vision LLM client supporting Bedrock, Anthropic and OpenAI backends
//!
//! Provides a single `describe(prompt, image)` call across providers.
//! Uses ureq (sync HTTP) - no async runtime needed.

use crate::classifier::{ClassifierError, ClassifierResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Supported classifier backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    #[default]
    Bedrock,
    Anthropic,
    OpenAi,
}

impl ClassifierBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            ClassifierBackend::Bedrock => "AWS_BEARER_TOKEN_BEDROCK",
            ClassifierBackend::Anthropic => "ANTHROPIC_API_KEY",
            ClassifierBackend::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ClassifierBackend::Bedrock => "amazon.nova-pro-v1:0",
            ClassifierBackend::Anthropic => "claude-sonnet-4-20250514",
            ClassifierBackend::OpenAi => "gpt-4o",
        }
    }

    pub fn api_url(&self, region: &str, model: &str) -> String {
        match self {
            ClassifierBackend::Bedrock => format!(
                "https://bedrock-runtime.{}.amazonaws.com/model/{}/converse",
                region, model
            ),
            ClassifierBackend::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
            ClassifierBackend::OpenAi => "https://api.openai.com/v1/chat/completions".to_string(),
        }
    }
}

impl FromStr for ClassifierBackend {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bedrock" | "nova" | "aws" => Ok(ClassifierBackend::Bedrock),
            "anthropic" | "claude" => Ok(ClassifierBackend::Anthropic),
            "openai" => Ok(ClassifierBackend::OpenAi),
            other => Err(ClassifierError::ConfigError(format!(
                "unknown classifier backend '{}' (expected bedrock, anthropic or openai)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ClassifierBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierBackend::Bedrock => write!(f, "bedrock"),
            ClassifierBackend::Anthropic => write!(f, "anthropic"),
            ClassifierBackend::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub model: Option<String>,
    pub region: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub extended_analysis: bool,
    pub web_grounding: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::default(),
            model: None,
            region: "us-east-1".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout: Duration::from_secs(120),
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            extended_analysis: true,
            web_grounding: true,
        }
    }
}

impl ClassifierConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Screenshot encoding understood by the providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Sniff from magic bytes; unknown data is sent as PNG
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if bytes.starts_with(b"GIF8") {
            ImageFormat::Gif
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else {
            ImageFormat::Png
        }
    }

    /// Bedrock's `format` field
    pub fn short_name(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// Screenshot bytes ready for upload
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            format: ImageFormat::detect(&bytes),
            bytes,
        }
    }

    pub fn base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}

/// A vision-capable classifier
pub trait VisionModel: Send + Sync {
    /// Model identifier recorded in report metadata
    fn model_id(&self) -> &str;

    /// Send prompt + image, return the model's raw text reply
    fn describe(&self, prompt: &str, image: &ImagePayload) -> ClassifierResult<String>;
}

/// Unified vision client - sync HTTP via ureq (no tokio needed)
pub struct VisionClient {
    config: ClassifierConfig,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl VisionClient {
    pub fn new(config: ClassifierConfig, api_key: impl Into<String>) -> Self {
        let agent = make_agent(config.timeout);
        Self {
            config,
            api_key: api_key.into(),
            agent,
        }
    }

    /// Build a client, reading the backend's key from the environment
    pub fn from_env_with_config(config: ClassifierConfig) -> ClassifierResult<Self> {
        let env_key = config.backend.env_key();
        let api_key = env::var(env_key)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ClassifierError::MissingCredential {
                env_var: env_key.to_string(),
            })?;

        Ok(Self::new(config, api_key))
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn post_json<B: Serialize>(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &B,
    ) -> ClassifierResult<ureq::Body> {
        let mut req = self.agent.post(url).header("Content-Type", "application/json");
        for (name, value) in headers {
            req = req.header(*name, value);
        }

        let response = req
            .send_json(body)
            .map_err(|e| ClassifierError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(ClassifierError::ApiError {
                status,
                message: error_text,
            });
        }
        Ok(response.into_body())
    }

    fn describe_bedrock(&self, prompt: &str, image: &ImagePayload) -> ClassifierResult<String> {
        let body = ConverseRequest {
            messages: vec![ConverseMessage {
                role: "user",
                content: vec![
                    ConverseContent::Text {
                        text: prompt.to_string(),
                    },
                    ConverseContent::Image {
                        image: ConverseImage {
                            format: image.format.short_name(),
                            source: ConverseImageSource {
                                bytes: image.base64(),
                            },
                        },
                    },
                ],
            }],
            inference_config: ConverseInference {
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            },
        };

        let url = self
            .config
            .backend
            .api_url(&self.config.region, self.config.model());
        let mut body_reader = self.post_json(
            &url,
            &[("Authorization", format!("Bearer {}", self.api_key))],
            &body,
        )?;

        let resp: ConverseResponse = body_reader
            .read_json()
            .map_err(|e| ClassifierError::ParseError(e.to_string()))?;

        let text: Vec<String> = resp
            .output
            .message
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect();
        if text.is_empty() {
            return Err(ClassifierError::ParseError("No text content in response".to_string()));
        }
        Ok(text.join("\n"))
    }

    fn describe_anthropic(&self, prompt: &str, image: &ImagePayload) -> ClassifierResult<String> {
        let body = AnthropicRequest {
            model: self.config.model().to_string(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![
                    AnthropicContentBlock::Image {
                        source: AnthropicImageSource {
                            source_type: "base64",
                            media_type: image.format.media_type(),
                            data: image.base64(),
                        },
                    },
                    AnthropicContentBlock::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };

        let url = self.config.backend.api_url(&self.config.region, self.config.model());
        let mut body_reader = self.post_json(
            &url,
            &[
                ("x-api-key", self.api_key.clone()),
                ("anthropic-version", "2023-06-01".to_string()),
            ],
            &body,
        )?;

        let resp: AnthropicResponse = body_reader
            .read_json()
            .map_err(|e| ClassifierError::ParseError(e.to_string()))?;

        resp.content
            .into_iter()
            .find(|c| c.content_type == "text")
            .and_then(|c| c.text)
            .ok_or_else(|| ClassifierError::ParseError("No text content in response".to_string()))
    }

    fn describe_openai(&self, prompt: &str, image: &ImagePayload) -> ClassifierResult<String> {
        let body = OpenAiRequest {
            model: self.config.model().to_string(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: vec![OpenAiMessage {
                role: "user",
                content: vec![
                    OpenAiContentPart::Text {
                        text: prompt.to_string(),
                    },
                    OpenAiContentPart::ImageUrl {
                        image_url: OpenAiImageUrl {
                            url: format!("data:{};base64,{}", image.format.media_type(), image.base64()),
                        },
                    },
                ],
            }],
        };

        let url = self.config.backend.api_url(&self.config.region, self.config.model());
        let mut body_reader = self.post_json(
            &url,
            &[("Authorization", format!("Bearer {}", self.api_key))],
            &body,
        )?;

        let resp: OpenAiResponse = body_reader
            .read_json()
            .map_err(|e| ClassifierError::ParseError(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClassifierError::ParseError("No response choices".to_string()))
    }
}

impl VisionModel for VisionClient {
    fn model_id(&self) -> &str {
        self.config.model()
    }

    fn describe(&self, prompt: &str, image: &ImagePayload) -> ClassifierResult<String> {
        match self.config.backend {
            ClassifierBackend::Bedrock => self.describe_bedrock(prompt, image),
            ClassifierBackend::Anthropic => self.describe_anthropic(prompt, image),
            ClassifierBackend::OpenAi => self.describe_openai(prompt, image),
        }
    }
}

// Bedrock Converse API types
#[derive(Serialize)]
struct ConverseRequest {
    messages: Vec<ConverseMessage>,
    #[serde(rename = "inferenceConfig")]
    inference_config: ConverseInference,
}

#[derive(Serialize)]
struct ConverseMessage {
    role: &'static str,
    content: Vec<ConverseContent>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ConverseContent {
    Text { text: String },
    Image { image: ConverseImage },
}

#[derive(Serialize)]
struct ConverseImage {
    format: &'static str,
    source: ConverseImageSource,
}

#[derive(Serialize)]
struct ConverseImageSource {
    bytes: String,
}

#[derive(Serialize)]
struct ConverseInference {
    #[serde(rename = "maxTokens")]
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ConverseResponse {
    output: ConverseOutput,
}

#[derive(Deserialize)]
struct ConverseOutput {
    message: ConverseOutputMessage,
}

#[derive(Deserialize)]
struct ConverseOutputMessage {
    #[serde(default)]
    content: Vec<ConverseOutputContent>,
}

#[derive(Deserialize)]
struct ConverseOutputContent {
    #[serde(default)]
    text: Option<String>,
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnthropicContentBlock {
    Image { source: AnthropicImageSource },
    Text { text: String },
}

#[derive(Serialize)]
struct AnthropicImageSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: Vec<OpenAiContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Serialize)]
struct OpenAiImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
