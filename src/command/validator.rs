//! Plan validation
//!
//! Validation is the hard gate between recovered JSON and the executor.
//! It guarantees that a plan can only name catalog actions. Argument count
//! and type are deliberately left to dispatch, where `ActionArgs` fills in
//! defaults and ignores extras.

use crate::actions::catalog::ActionCatalog;
use crate::command::plan::{Action, Plan, Value, DEFAULT_EXPLANATION};
use std::sync::Arc;
use thiserror::Error;

/// Why a recovered object was rejected; indices are 1-based
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("plan is not a JSON object")]
    NotAnObject,

    #[error("plan has no 'acciones' key")]
    MissingActions,

    #[error("'acciones' is not an array")]
    ActionsNotArray,

    #[error("action {index} has no 'funcion'")]
    MissingFunction { index: usize },

    #[error("action {index}: 'funcion' is not a string")]
    FunctionNotString { index: usize },

    #[error("action {index}: function '{function}' is not allowed")]
    FunctionNotAllowed { index: usize, function: String },

    #[error("action {index} has no 'args'")]
    MissingArgs { index: usize },

    #[error("action {index}: 'args' is not an array")]
    ArgsNotArray { index: usize },
}

/// Checks recovered objects against the catalog allowlist
#[derive(Debug, Clone)]
pub struct PlanValidator {
    catalog: Arc<ActionCatalog>,
}

impl PlanValidator {
    pub fn new(catalog: Arc<ActionCatalog>) -> Self {
        Self { catalog }
    }

    /// Validate and convert into a typed plan
    pub fn validate(&self, value: &serde_json::Value) -> Result<Plan, ValidationError> {
        let result = self.check(value);
        if let Err(e) = &result {
            tracing::warn!("Plan rejected: {}", e);
        }
        result
    }

    /// Boolean form of [`validate`](Self::validate)
    pub fn is_valid(&self, value: &serde_json::Value) -> bool {
        self.validate(value).is_ok()
    }

    fn check(&self, value: &serde_json::Value) -> Result<Plan, ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
        let entries = object
            .get("acciones")
            .ok_or(ValidationError::MissingActions)?
            .as_array()
            .ok_or(ValidationError::ActionsNotArray)?;

        let mut actions = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            actions.push(self.check_action(i + 1, entry)?);
        }

        let explanation = object
            .get("explicacion")
            .and_then(|e| e.as_str())
            .unwrap_or(DEFAULT_EXPLANATION)
            .to_string();
        let direct_response = object
            .get("respuesta_directa")
            .and_then(|d| d.as_bool())
            .unwrap_or(false);

        Ok(Plan {
            actions,
            explanation,
            direct_response,
        })
    }

    fn check_action(&self, index: usize, entry: &serde_json::Value) -> Result<Action, ValidationError> {
        let function = entry
            .get("funcion")
            .ok_or(ValidationError::MissingFunction { index })?
            .as_str()
            .ok_or(ValidationError::FunctionNotString { index })?;

        if !self.catalog.contains(function) {
            return Err(ValidationError::FunctionNotAllowed {
                index,
                function: function.to_string(),
            });
        }

        let args = entry
            .get("args")
            .ok_or(ValidationError::MissingArgs { index })?
            .as_array()
            .ok_or(ValidationError::ArgsNotArray { index })?;

        Ok(Action::new(function, args.iter().map(Value::from_json).collect()))
    }
}
