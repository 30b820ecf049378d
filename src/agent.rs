//! The turn pipeline
//!
//! One command per turn, strictly sequential:
//! resolve references -> memory commands -> shortcut | (generate -> extract -> validate) -> execute
//!
//! Every failure stays inside the turn. It never panics and only
//! successfully completed actions reach the context.

use crate::actions::catalog::ActionCatalog;
use crate::command::executor::{ExecutionReport, PlanExecutor};
use crate::command::plan::Plan;
use crate::command::resolver::ReferenceResolver;
use crate::command::shortcuts::ShortcutMatcher;
use crate::command::validator::{PlanValidator, ValidationError};
use crate::context::{ContextStore, SharedContext, TurnRecord};
use crate::control::PcControl;
use crate::core::config::AgentConfig;
use crate::core::error::Result;
use crate::llm::client::{GenerationError, LlmBackend};
use crate::llm::context::needs_visual_context;
use crate::llm::generator::PlanGenerator;
use crate::llm::parser::extract_plan_json;
use std::sync::Arc;
use thiserror::Error;

/// Turns listed by the history memory command
const HISTORY_TURNS: usize = 5;

/// Where a plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Shortcut,
    Llm,
    /// Answered from the session history ("historial", "repite" with nothing to repeat)
    Memory,
}

/// A plan ready to run, with the command that produced it
#[derive(Debug, Clone)]
pub struct PlannedCommand {
    pub original: String,
    /// The command after reference resolution or repetition
    pub effective: String,
    pub plan: Plan,
    pub source: PlanSource,
}

/// Why a turn produced no plan
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("model did not answer: {0}")]
    GenerationTimeout(#[source] GenerationError),

    #[error("model output could not be used: {reason}")]
    UnparsableResponse { reason: String },

    #[error("plan rejected: {0}")]
    ValidationRejected(#[from] ValidationError),
}

impl From<GenerationError> for TurnError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::InvalidUtf8 | GenerationError::EmptyResponse => {
                TurnError::UnparsableResponse {
                    reason: e.to_string(),
                }
            }
            other => TurnError::GenerationTimeout(other),
        }
    }
}

impl TurnError {
    /// What the user is told; raw model output never appears here
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::GenerationTimeout(_) | TurnError::UnparsableResponse { .. } => {
                "No pude entender el comando"
            }
            TurnError::ValidationRejected(_) => "No puedo ejecutar ese comando",
        }
    }
}

/// Result of a full turn
#[derive(Debug)]
pub enum TurnOutcome {
    Executed {
        planned: PlannedCommand,
        report: ExecutionReport,
    },
    Rejected {
        command: String,
        error: TurnError,
    },
}

impl TurnOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Executed { report, .. } if report.is_success())
    }

    /// One line for the user
    pub fn message(&self) -> String {
        match self {
            TurnOutcome::Executed { planned, report } => match &report.failure {
                None => planned.plan.explanation.clone(),
                Some(failure) => format!(
                    "Falló la acción {} de {} ({})",
                    failure.index, report.total, failure.function
                ),
            },
            TurnOutcome::Rejected { error, .. } => error.user_message().to_string(),
        }
    }
}

/// The command pipeline for one session
pub struct Agent<B: LlmBackend> {
    config: AgentConfig,
    catalog: Arc<ActionCatalog>,
    resolver: ReferenceResolver,
    shortcuts: ShortcutMatcher,
    generator: PlanGenerator<B>,
    validator: PlanValidator,
    executor: PlanExecutor,
    context: SharedContext,
}

impl<B: LlmBackend> Agent<B> {
    /// Build the pipeline; an empty catalog is a configuration fault
    pub fn new(config: AgentConfig, backend: B) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(ActionCatalog::with_disabled(&config.catalog.disabled)?);
        tracing::info!("Action catalog ready: {} actions", catalog.len());

        let context = SharedContext::new(ContextStore::new(config.context.history_limit));
        let generator = PlanGenerator::new(backend, catalog.clone(), config.context.prompt_turns);

        Ok(Self {
            resolver: ReferenceResolver::new(),
            shortcuts: ShortcutMatcher::new(),
            generator,
            validator: PlanValidator::new(catalog.clone()),
            executor: PlanExecutor::new(catalog.clone()),
            catalog,
            context,
            config,
        })
    }

    /// Use a context handle that other parts of the host also hold
    pub fn with_context(mut self, context: SharedContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        self.generator.backend()
    }

    /// Whether the caller should fetch a screen description first
    pub fn needs_visual_context(&self, command: &str) -> bool {
        needs_visual_context(command, &self.config.vision.keywords)
    }

    /// Turn a command into a validated plan without running it
    pub fn plan(&self, command: &str, visual: Option<&str>) -> std::result::Result<PlannedCommand, TurnError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(TurnError::UnparsableResponse {
                reason: "empty command".into(),
            });
        }

        let snapshot = self.context.snapshot();
        let resolution = self.resolver.resolve(command, &snapshot);

        if let Some(planned) = self.memory_command(command, &resolution.command, visual, &snapshot)? {
            return Ok(planned);
        }
        self.plan_fresh(command, resolution.command, visual, &snapshot)
    }

    fn memory_command(
        &self,
        original: &str,
        effective: &str,
        visual: Option<&str>,
        snapshot: &ContextStore,
    ) -> std::result::Result<Option<PlannedCommand>, TurnError> {
        let lower = effective.to_lowercase();
        let memory = |plan: Plan| PlannedCommand {
            original: original.to_string(),
            effective: effective.to_string(),
            plan,
            source: PlanSource::Memory,
        };

        if lower.contains("repite") || lower.contains("hazlo de nuevo") {
            return match snapshot.last_successful_turn() {
                Some(turn) => {
                    tracing::info!("Repeating '{}'", turn.command);
                    self.plan_fresh(original, turn.command.clone(), visual, snapshot)
                        .map(Some)
                }
                None => Ok(Some(memory(Plan::direct("No hay comando anterior para repetir")))),
            };
        }

        if lower.contains("historial") || lower.contains("qué hice") || lower.contains("que hice") {
            let text = snapshot
                .recent_turns_summary(HISTORY_TURNS)
                .unwrap_or_else(|| "No hay historial todavía".to_string());
            return Ok(Some(memory(Plan::direct(text))));
        }

        Ok(None)
    }

    /// Shortcut or model path for an already-resolved command
    fn plan_fresh(
        &self,
        original: &str,
        effective: String,
        visual: Option<&str>,
        snapshot: &ContextStore,
    ) -> std::result::Result<PlannedCommand, TurnError> {
        if let Some(plan) = self.shortcuts.match_command(&effective) {
            return Ok(PlannedCommand {
                original: original.to_string(),
                effective,
                plan,
                source: PlanSource::Shortcut,
            });
        }

        let raw = self.generator.generate(&effective, visual, snapshot)?;
        let value = extract_plan_json(&raw).map_err(|e| {
            tracing::warn!("Could not recover plan: {}", e);
            TurnError::UnparsableResponse {
                reason: e.to_string(),
            }
        })?;
        let plan = self.validator.validate(&value)?;

        tracing::info!("Plan: {} ({} actions)", plan.explanation, plan.len());
        Ok(PlannedCommand {
            original: original.to_string(),
            effective,
            plan,
            source: PlanSource::Llm,
        })
    }

    /// Run a planned command and record the turn
    pub fn execute(&self, planned: &PlannedCommand, control: &mut dyn PcControl) -> ExecutionReport {
        let report = self.executor.execute_shared(&planned.plan, control, &self.context);
        if planned.source != PlanSource::Memory {
            self.executor.record_turn_shared(
                &self.context,
                TurnRecord::new(
                    planned.effective.as_str(),
                    planned.plan.explanation.as_str(),
                    planned.plan.len(),
                    report.is_success(),
                ),
            );
        }
        report
    }

    /// Plan and execute in one step, without confirmation
    pub fn handle(&self, command: &str, visual: Option<&str>, control: &mut dyn PcControl) -> TurnOutcome {
        match self.plan(command, visual) {
            Ok(planned) => {
                let report = self.execute(&planned, control);
                TurnOutcome::Executed { planned, report }
            }
            Err(error) => {
                tracing::warn!("Turn failed for '{}': {}", command, error);
                TurnOutcome::Rejected {
                    command: command.to_string(),
                    error,
                }
            }
        }
    }
}
