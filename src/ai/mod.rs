//! The AI bridge collaborator.
//!
//! [`AiBridge`] is the narrow capability the rest of the crate sees: send a
//! prompt, get text back. The structured operations are default methods that
//! pair a prompt builder with a reply interpreter, so an implementation only
//! has to provide transport and an availability probe.

mod cli_bridge;
pub mod interpreter;
pub mod prompts;

pub use cli_bridge::CliAiBridge;

use crate::core::{CodeBehavior, TestExpectation};
use crate::errors::AiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixRequest {
    pub test_code: String,
    pub source_code: String,
    pub error_message: String,
    pub file_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSuggestion {
    pub suggestion: String,
    pub explanation: String,
}

#[async_trait]
pub trait AiBridge: Send + Sync {
    /// Send one prompt and return the raw reply.
    async fn ask(&self, prompt: &str) -> Result<String, AiError>;

    /// Whether the backing tool can be used at all. Callers skip AI work
    /// entirely when this is false.
    async fn check_availability(&self) -> bool;

    async fn explain_divergence(
        &self,
        test_body: &str,
        source_body: &str,
    ) -> Result<String, AiError> {
        self.ask(&prompts::explain_divergence(test_body, source_body))
            .await
    }

    async fn analyze_test_expectation(&self, test_body: &str) -> Result<TestExpectation, AiError> {
        let reply = self.ask(&prompts::analyze_test_expectation(test_body)).await?;
        Ok(interpreter::parse_test_expectation(&reply))
    }

    async fn analyze_code_behavior(&self, source_body: &str) -> Result<CodeBehavior, AiError> {
        let reply = self.ask(&prompts::analyze_code_behavior(source_body)).await?;
        Ok(interpreter::parse_code_behavior(&reply))
    }

    /// A reply without a usable suggestion counts as an empty response.
    async fn suggest_fix(&self, request: &FixRequest) -> Result<FixSuggestion, AiError> {
        let reply = self.ask(&prompts::suggest_fix(request)).await?;
        interpreter::parse_fix_suggestion(&reply).ok_or(AiError::EmptyResponse)
    }
}
