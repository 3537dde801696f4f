//! Vision-model WCAG analysis
//!
//! Sends a page screenshot to a vision-capable LLM and turns its reply
//! into [`Issue`](crate::models::Issue)s. Supports Amazon Bedrock (Converse
//! API), Anthropic and OpenAI-compatible backends. Uses BYOK (bring your
//! own key) - credentials come from the environment.
//!
//! # Environment Variables
//!
//! - `AWS_BEARER_TOKEN_BEDROCK`: Required for the Bedrock backend
//! - `AWS_REGION`: Bedrock region (default `us-east-1`)
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//!
//! # Example
//!
//! ```rust,ignore
//! use a11yscan::classifier::{Analyzer, ClassifierConfig};
//!
//! let analyzer = Analyzer::from_config(ClassifierConfig::default(), log);
//! let outcome = analyzer.analyze(Path::new("agent_screenshots/audit_1.png"));
//! ```

mod analyzer;
mod client;
mod extract;
mod prompts;

pub use analyzer::{parse_analysis, AnalysisOutcome, Analyzer, ParsedAnalysis};
pub use client::{
    ClassifierBackend, ClassifierConfig, ImageFormat, ImagePayload, VisionClient, VisionModel,
};
pub use extract::{extract_json, ExtractError};
pub use prompts::AnalysisPrompt;

use thiserror::Error;

/// Errors that can occur talking to the classifier
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("{env_var} not configured")]
    MissingCredential { env_var: String },

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
