//! Plan generation through the model backend

use crate::actions::catalog::ActionCatalog;
use crate::context::ContextStore;
use crate::llm::client::{GenerationError, LlmBackend};
use crate::llm::context::PromptContext;
use std::sync::Arc;
use std::time::Instant;

/// Builds prompts and asks the backend for raw plan text
pub struct PlanGenerator<B: LlmBackend> {
    backend: B,
    catalog: Arc<ActionCatalog>,
    prompt_turns: usize,
}

impl<B: LlmBackend> PlanGenerator<B> {
    pub fn new(backend: B, catalog: Arc<ActionCatalog>, prompt_turns: usize) -> Self {
        Self {
            backend,
            catalog,
            prompt_turns,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Prompt for a command against a context snapshot
    pub fn prompt(&self, command: &str, visual: Option<&str>, context: &ContextStore) -> PromptContext {
        PromptContext {
            command: command.to_string(),
            catalog_description: self.catalog.describe(),
            context_summary: context.has_prior_facts().then(|| context.summary()),
            recent_turns: context.recent_turns_summary(self.prompt_turns),
            visual: visual
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        }
    }

    /// One blocking model call; no retries
    pub fn generate(
        &self,
        command: &str,
        visual: Option<&str>,
        context: &ContextStore,
    ) -> Result<String, GenerationError> {
        let prompt = self.prompt(command, visual, context).render();
        tracing::info!("Consulting LLM for '{}' ({} byte prompt)", command, prompt.len());

        let start = Instant::now();
        let result = self.backend.complete(&prompt);
        match &result {
            Ok(raw) => {
                tracing::info!(
                    "LLM response: {} bytes in {:.1}s",
                    raw.len(),
                    start.elapsed().as_secs_f64()
                );
                tracing::debug!("Raw LLM output: {}", raw);
            }
            Err(e) => tracing::warn!("Generation failed: {}", e),
        }
        result
    }
}
