//! Plan execution
//!
//! Runs validated plans strictly in order against a `PcControl` backend.
//! The first failing action aborts the plan; nothing already done is
//! rolled back. Facts from each completed action are written to the
//! context before the next action starts, and this is the only place
//! the context is ever written.

use crate::actions::args::ActionArgs;
use crate::actions::catalog::ActionCatalog;
use crate::command::plan::{Action, Plan};
use crate::context::shared::ContextSink;
use crate::context::{ContextFact, ContextStore, SharedContext, TurnRecord};
use crate::control::{ControlError, PcControl};
use std::sync::Arc;
use thiserror::Error;

/// Lifecycle of one plan run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// What went wrong with a single action
#[derive(Error, Debug)]
pub enum DispatchFailure {
    #[error("function is not in the catalog")]
    NotAllowed,

    #[error(transparent)]
    Control(#[from] ControlError),
}

/// An action that failed during execution, 1-based index
#[derive(Error, Debug)]
#[error("action {index} ({function}) failed: {source}")]
pub struct DispatchError {
    pub index: usize,
    pub function: String,
    #[source]
    pub source: DispatchFailure,
}

/// Outcome of executing one plan
#[derive(Debug)]
pub struct ExecutionReport {
    pub state: ExecutionState,
    /// Actions that finished successfully
    pub completed: usize,
    pub total: usize,
    pub failure: Option<DispatchError>,
    /// 1-based indices of actions dispatched with an argument count that
    /// differs from the declared arity
    pub loose_arity: Vec<usize>,
}

impl ExecutionReport {
    fn new(total: usize) -> Self {
        Self {
            state: ExecutionState::Pending,
            completed: 0,
            total,
            failure: None,
            loose_arity: Vec::new(),
        }
    }

    /// True only when every action completed
    pub fn is_success(&self) -> bool {
        self.state == ExecutionState::Completed
    }
}

/// Dispatches plan actions through the catalog
#[derive(Debug, Clone)]
pub struct PlanExecutor {
    catalog: Arc<ActionCatalog>,
}

impl PlanExecutor {
    pub fn new(catalog: Arc<ActionCatalog>) -> Self {
        Self { catalog }
    }

    /// Execute against a context owned by the caller
    pub fn execute(
        &self,
        plan: &Plan,
        control: &mut dyn PcControl,
        context: &mut ContextStore,
    ) -> ExecutionReport {
        self.run(plan, control, context)
    }

    /// Execute against a shared context, locking once per completed action
    pub fn execute_shared(
        &self,
        plan: &Plan,
        control: &mut dyn PcControl,
        context: &SharedContext,
    ) -> ExecutionReport {
        let mut sink = context;
        self.run(plan, control, &mut sink)
    }

    /// Append a finished turn to the history
    pub fn record_turn(&self, context: &mut ContextStore, turn: TurnRecord) {
        context.record_turn(turn);
    }

    pub fn record_turn_shared(&self, context: &SharedContext, turn: TurnRecord) {
        let mut sink = context;
        sink.record_turn(turn);
    }

    fn run<S: ContextSink>(
        &self,
        plan: &Plan,
        control: &mut dyn PcControl,
        sink: &mut S,
    ) -> ExecutionReport {
        let total = plan.len();
        let mut report = ExecutionReport::new(total);

        if plan.is_empty() {
            tracing::debug!("Plan has no actions: {}", plan.explanation);
            report.state = ExecutionState::Completed;
            return report;
        }

        report.state = ExecutionState::Running;
        for (i, action) in plan.actions.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, total, action);

            match self.dispatch(action, control) {
                Ok((mut facts, exact)) => {
                    if !exact {
                        report.loose_arity.push(i + 1);
                    }
                    facts.push(ContextFact::Action(action.function.clone()));
                    sink.record(facts);
                    report.completed += 1;
                }
                Err(failure) => {
                    let error = DispatchError {
                        index: i + 1,
                        function: action.function.clone(),
                        source: failure,
                    };
                    tracing::error!("Plan aborted: {}", error);
                    report.failure = Some(error);
                    report.state = ExecutionState::Failed;
                    return report;
                }
            }
        }

        report.state = ExecutionState::Completed;
        report
    }

    fn dispatch(
        &self,
        action: &Action,
        control: &mut dyn PcControl,
    ) -> Result<(Vec<ContextFact>, bool), DispatchFailure> {
        let entry = self
            .catalog
            .get(&action.function)
            .ok_or(DispatchFailure::NotAllowed)?;

        // Handlers fill in missing arguments and ignore extras
        let exact = entry.id.arity().accepts(action.args.len());
        if !exact {
            tracing::debug!(
                "{} called with {} args, declared {}",
                action.function,
                action.args.len(),
                entry.id.signature()
            );
        }
        let facts = (entry.handler)(control, ActionArgs::new(&action.args))?;
        Ok((facts, exact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::catalog::ActionId;
    use crate::command::plan::Value;
    use crate::control::{ControlCall, RecordingControl};

    fn executor() -> PlanExecutor {
        PlanExecutor::new(Arc::new(ActionCatalog::standard()))
    }

    #[test]
    fn test_empty_plan_is_vacuously_successful() {
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();
        let report = executor().execute(&Plan::direct("Son las 14:30"), &mut control, &mut context);

        assert!(report.is_success());
        assert_eq!(report.total, 0);
        assert!(control.calls().is_empty());
        assert!(!context.has_prior_facts());
    }

    #[test]
    fn test_successful_actions_write_context() {
        let plan = Plan::new(
            vec![
                Action::bare("abrir_chrome"),
                Action::new("buscar_en_google", vec!["clima".into()]),
            ],
            "Buscando el clima",
        );
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();
        let report = executor().execute(&plan, &mut control, &mut context);

        assert!(report.is_success());
        assert_eq!(report.completed, 2);
        assert!(report.loose_arity.is_empty());
        assert_eq!(context.last_app(), Some("chrome"));
        assert_eq!(context.last_search(), Some("clima"));
        assert_eq!(context.last_action(), Some("buscar_en_google"));
    }

    #[test]
    fn test_failure_aborts_remaining_actions() {
        let plan = Plan::new(
            vec![
                Action::bare("abrir_notepad"),
                Action::bare("copiar"),
                Action::bare("pegar"),
            ],
            "x",
        );
        let mut control = RecordingControl::new().failing_on_call(2);
        let mut context = ContextStore::default();
        let report = executor().execute(&plan, &mut control, &mut context);

        assert_eq!(report.state, ExecutionState::Failed);
        assert_eq!(report.completed, 1);
        assert_eq!(control.calls().len(), 2);
        let failure = report.failure.unwrap();
        assert_eq!(failure.index, 2);
        assert_eq!(failure.function, "copiar");
        // First action's facts stay; failed action wrote nothing
        assert_eq!(context.last_app(), Some("notepad"));
        assert_eq!(context.last_action(), Some("abrir_notepad"));
    }

    #[test]
    fn test_unvalidated_plan_is_rechecked() {
        let plan = Plan::new(
            vec![Action::bare("copiar"), Action::new("borrar_disco", vec!["C:".into()])],
            "x",
        );
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();
        let report = executor().execute(&plan, &mut control, &mut context);

        assert!(!report.is_success());
        let failure = report.failure.unwrap();
        assert_eq!(failure.index, 2);
        assert!(matches!(failure.source, DispatchFailure::NotAllowed));
        assert_eq!(control.calls().len(), 1);
    }

    #[test]
    fn test_disabled_action_never_dispatches() {
        let catalog = ActionCatalog::from_ids([ActionId::Copy]).unwrap();
        let executor = PlanExecutor::new(Arc::new(catalog));
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();
        let report = executor.execute(
            &Plan::single(Action::bare("pegar"), "x"),
            &mut control,
            &mut context,
        );
        assert!(!report.is_success());
        assert!(control.calls().is_empty());
    }

    #[test]
    fn test_missing_required_argument_is_dispatch_error() {
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();
        let report = executor().execute(
            &Plan::single(Action::bare("abrir_url"), "x"),
            &mut control,
            &mut context,
        );
        let failure = report.failure.unwrap();
        assert!(matches!(
            failure.source,
            DispatchFailure::Control(ControlError::MissingArgument { position: 1, .. })
        ));
        assert!(context.last_action().is_none());
    }

    #[test]
    fn test_loose_arity_defaults_at_dispatch() {
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();
        let plan = Plan::new(
            vec![
                Action::bare("volumen_subir"),
                Action::new("copiar", vec![Value::Int(1), Value::Int(2)]),
            ],
            "x",
        );
        let report = executor().execute(&plan, &mut control, &mut context);
        assert!(report.is_success());
        assert_eq!(report.loose_arity, vec![1, 2]);
        assert_eq!(context.volume_changes(), 1);
        assert!(matches!(control.calls()[0], ControlCall::Press(_, 1)));
    }

    #[test]
    fn test_shared_execution_and_turn_record() {
        let shared = SharedContext::default();
        let mut control = RecordingControl::new();
        let executor = executor();
        let plan = Plan::single(Action::bare("abrir_calculadora"), "Abriendo calculadora");

        let report = executor.execute_shared(&plan, &mut control, &shared);
        executor.record_turn_shared(
            &shared,
            TurnRecord::new("abre la calculadora", &plan.explanation, plan.len(), report.is_success()),
        );

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.last_app(), Some("calculadora"));
        assert_eq!(snapshot.turns().count(), 1);
        assert!(snapshot.last_successful_turn().is_some());
    }
}
