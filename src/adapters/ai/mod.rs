//! AI Adapters.
//!
//! Implementations of the AIProvider and Classifier ports.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Scripted provider for testing
//! - `OpenAIProvider` - OpenAI-compatible chat-completions endpoints
//! - `LlmClassifier` - Classifier prompting any `AIProvider` under a `RetryPolicy`

mod llm_classifier;
mod mock_provider;
mod openai_provider;
mod retry;

pub use llm_classifier::{LlmClassifier, LlmClassifierConfig};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
pub use retry::{RetryPolicy, MAX_ATTEMPT_TIMEOUT};
