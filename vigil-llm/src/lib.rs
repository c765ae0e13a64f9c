//! VIGIL LLM - Generation Capability
//!
//! Provider-agnostic access to the free-text generation capability. The
//! rest of the system treats generation as an opaque function: prompt in,
//! text out, possibly malformed. This crate defines the trait, an
//! OpenAI-compatible client implementation, and the strict structured
//! parsing step that turns model text into validated values.

pub mod client;
pub mod structured;
pub mod types;

pub use client::ChatClient;
pub use structured::{parse_payload, strip_code_fences, Payload};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use vigil_core::LlmError;

// ============================================================================
// COMPLETION PROVIDER TRAIT
// ============================================================================

/// A single generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: i32,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: i32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }
}

/// Trait for generation providers. Implementations must be thread-safe;
/// analyzers share one provider behind an `Arc` and may call it
/// concurrently during fan-out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a prompt and return the raw model text.
    ///
    /// # Returns
    /// * `Ok(String)` - the model output, unvalidated
    /// * `Err(LlmError)` - if the provider call itself fails
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

// ============================================================================
// UNCONFIGURED PROVIDER
// ============================================================================

/// Stand-in used when no credentials are present: every call fails with
/// `NotConfigured`, which the analyzers absorb into degraded decisions.
/// The service still boots and serves schema-only behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl CompletionProvider for UnconfiguredProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

// ============================================================================
// MOCK PROVIDER FOR TESTING
// ============================================================================

/// Scripted provider for tests: returns queued responses in order.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a successful response.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.responses
            .lock()
            .expect("mock provider lock")
            .push_back(Ok(text.into()));
        self
    }

    /// Queue a provider failure.
    pub fn fail(self, error: LlmError) -> Self {
        self.responses
            .lock()
            .expect("mock provider lock")
            .push_back(Err(error));
        self
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().expect("mock provider lock").len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        self.responses
            .lock()
            .expect("mock provider lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(LlmError::InvalidResponse {
                    provider: "mock".to_string(),
                    reason: "no scripted response left".to_string(),
                })
            })
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("remaining", &self.remaining())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
