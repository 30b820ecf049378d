//! Abort semantics of plan execution

use neo_agent::actions::catalog::ActionCatalog;
use neo_agent::command::executor::{ExecutionState, PlanExecutor};
use neo_agent::command::plan::{Action, Plan};
use neo_agent::context::ContextStore;
use neo_agent::control::RecordingControl;
use proptest::prelude::*;
use std::sync::Arc;

/// Actions that each issue exactly one control call
const ONE_CALL_ACTIONS: &[&str] = &[
    "abrir_chrome",
    "abrir_notepad",
    "minimizar_todo",
    "cambiar_ventana",
    "copiar",
    "pegar",
    "guardar",
    "deshacer",
    "presionar_enter",
    "volumen_subir",
    "tomar_captura",
];

fn plan_and_failure() -> impl Strategy<Value = (Vec<&'static str>, usize)> {
    prop::collection::vec(prop::sample::select(ONE_CALL_ACTIONS), 1..8).prop_flat_map(|names| {
        let k = names.len();
        (Just(names), 1..=k)
    })
}

proptest! {
    #[test]
    fn failure_at_i_stops_the_plan((names, i) in plan_and_failure()) {
        let plan = Plan::new(names.iter().map(|n| Action::bare(*n)).collect(), "prueba");
        let executor = PlanExecutor::new(Arc::new(ActionCatalog::standard()));
        let mut control = RecordingControl::new().failing_on_call(i);
        let mut context = ContextStore::default();

        let report = executor.execute(&plan, &mut control, &mut context);

        prop_assert!(!report.is_success());
        prop_assert_eq!(report.state, ExecutionState::Failed);
        // Actions 1..=i were attempted, nothing after
        prop_assert_eq!(control.calls().len(), i);
        prop_assert_eq!(report.completed, i - 1);

        let failure = report.failure.unwrap();
        prop_assert_eq!(failure.index, i);
        prop_assert_eq!(failure.function.as_str(), names[i - 1]);

        // Only the actions before the failure left facts behind
        let expected_last = if i > 1 { Some(names[i - 2]) } else { None };
        prop_assert_eq!(context.last_action(), expected_last);
    }

    #[test]
    fn plans_without_failures_complete(names in prop::collection::vec(prop::sample::select(ONE_CALL_ACTIONS), 0..8)) {
        let plan = Plan::new(names.iter().map(|n| Action::bare(*n)).collect(), "prueba");
        let executor = PlanExecutor::new(Arc::new(ActionCatalog::standard()));
        let mut control = RecordingControl::new();
        let mut context = ContextStore::default();

        let report = executor.execute(&plan, &mut control, &mut context);

        prop_assert!(report.is_success());
        prop_assert_eq!(report.completed, names.len());
        prop_assert_eq!(control.calls().len(), names.len());
        prop_assert_eq!(context.last_action(), names.last().copied());
    }
}
