//! Deterministic fast paths that bypass the model
//!
//! Rules are checked in a fixed priority order (time, open, search,
//! close/minimize, volume) and the first one that fires wins. The
//! matcher never looks at the session context, so the same text always
//! produces the same plan.

use crate::actions::catalog::ActionId;
use crate::command::plan::{Action, Plan, Value};
use chrono::{DateTime, Local};

/// Volume steps used when the command names no number
pub const DEFAULT_VOLUME_STEPS: i64 = 3;

/// Which rule produced a shortcut plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutRule {
    Time,
    Open,
    Search,
    Close,
    Volume,
}

/// Pattern rules for the most common commands
#[derive(Debug, Clone, Default)]
pub struct ShortcutMatcher;

impl ShortcutMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Match against the current local time
    pub fn match_command(&self, command: &str) -> Option<Plan> {
        self.match_at(command, Local::now()).map(|(_, plan)| plan)
    }

    /// Match with an explicit clock; returns the rule that fired
    pub fn match_at(&self, command: &str, now: DateTime<Local>) -> Option<(ShortcutRule, Plan)> {
        let command = command.trim();
        let lower = command.to_lowercase();

        let rules: [(ShortcutRule, fn(&str, &str, DateTime<Local>) -> Option<Plan>); 5] = [
            (ShortcutRule::Time, time_rule),
            (ShortcutRule::Open, open_rule),
            (ShortcutRule::Search, search_rule),
            (ShortcutRule::Close, close_rule),
            (ShortcutRule::Volume, volume_rule),
        ];

        rules.iter().find_map(|(rule, apply)| {
            apply(command, &lower, now).map(|plan| {
                tracing::info!("Shortcut {:?}: '{}' -> {}", rule, command, plan.explanation);
                (*rule, plan)
            })
        })
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// Remainder after a case-insensitive ASCII prefix, trimmed and non-empty
fn strip_prefix_ci<'a>(command: &'a str, prefix: &str) -> Option<&'a str> {
    let head = command.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = command[prefix.len()..].trim();
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// First run of ASCII digits in the text
pub fn first_number(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn time_rule(_command: &str, lower: &str, now: DateTime<Local>) -> Option<Plan> {
    if !contains_any(lower, &["qué hora", "que hora", "hora es"]) {
        return None;
    }
    Some(Plan::direct(format!("Son las {}", now.format("%H:%M"))))
}

fn open_rule(command: &str, _lower: &str, _now: DateTime<Local>) -> Option<Plan> {
    let program = strip_prefix_ci(command, "abre ")?;
    Some(Plan::single(
        Action::new(ActionId::OpenProgram.name(), vec![Value::from(program)]),
        format!("Abriendo {}", program),
    ))
}

fn search_rule(command: &str, _lower: &str, _now: DateTime<Local>) -> Option<Plan> {
    let query = strip_prefix_ci(command, "busca ")?;
    Some(Plan::single(
        Action::new(ActionId::SearchGoogle.name(), vec![Value::from(query)]),
        format!("Buscando: {}", query),
    ))
}

fn close_rule(_command: &str, lower: &str, _now: DateTime<Local>) -> Option<Plan> {
    if contains_any(lower, &["cierra", "cerrar"]) {
        if lower.contains("todo") {
            return Some(Plan::single(
                Action::bare(ActionId::MinimizeAll.name()),
                "Minimizando todas las ventanas",
            ));
        }
        return Some(Plan::single(
            Action::bare(ActionId::CloseWindow.name()),
            "Cerrando ventana actual",
        ));
    }

    if lower.contains("minimiza") {
        if lower.contains("ventana") && !lower.contains("todo") {
            return Some(Plan::single(
                Action::bare(ActionId::MinimizeWindow.name()),
                "Minimizando ventana",
            ));
        }
        return Some(Plan::single(
            Action::bare(ActionId::MinimizeAll.name()),
            "Minimizando todas las ventanas",
        ));
    }

    None
}

fn volume_rule(command: &str, lower: &str, _now: DateTime<Local>) -> Option<Plan> {
    if !contains_any(lower, &["volumen", "sonido"]) {
        return None;
    }

    let steps = || first_number(command).unwrap_or(DEFAULT_VOLUME_STEPS);

    if contains_any(lower, &["sube", "subir", "aumenta"]) {
        let n = steps();
        return Some(Plan::single(
            Action::new(ActionId::VolumeUp.name(), vec![Value::Int(n)]),
            format!("Subiendo volumen {} veces", n),
        ));
    }
    if contains_any(lower, &["baja", "bajar", "disminuye"]) {
        let n = steps();
        return Some(Plan::single(
            Action::new(ActionId::VolumeDown.name(), vec![Value::Int(n)]),
            format!("Bajando volumen {} veces", n),
        ));
    }
    if contains_any(lower, &["silencia", "mutea", "silencio"]) {
        return Some(Plan::single(
            Action::bare(ActionId::VolumeMute.name()),
            "Silenciando/activando volumen",
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_1430() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap()
    }

    fn matched(command: &str) -> Option<(ShortcutRule, Plan)> {
        ShortcutMatcher::new().match_at(command, at_1430())
    }

    #[test]
    fn test_time_query_is_direct_response() {
        let (rule, plan) = matched("qué hora es").unwrap();
        assert_eq!(rule, ShortcutRule::Time);
        assert!(plan.actions.is_empty());
        assert!(plan.direct_response);
        assert_eq!(plan.explanation, "Son las 14:30");
    }

    #[test]
    fn test_open_prefix_keeps_original_case() {
        let (rule, plan) = matched("Abre Spotify").unwrap();
        assert_eq!(rule, ShortcutRule::Open);
        assert_eq!(
            plan.actions,
            vec![Action::new("abrir_programa", vec!["Spotify".into()])]
        );
        assert_eq!(plan.explanation, "Abriendo Spotify");
    }

    #[test]
    fn test_open_without_target_does_not_fire() {
        assert!(matched("abre   ").is_none());
    }

    #[test]
    fn test_search_prefix() {
        let (_, plan) = matched("busca recetas de pasta").unwrap();
        assert_eq!(
            plan.actions,
            vec![Action::new("buscar_en_google", vec!["recetas de pasta".into()])]
        );
        assert_eq!(plan.explanation, "Buscando: recetas de pasta");
    }

    #[test]
    fn test_close_and_close_all() {
        let (_, plan) = matched("cierra la ventana").unwrap();
        assert_eq!(plan.actions, vec![Action::bare("cerrar_ventana_actual")]);

        let (_, plan) = matched("cierra todo").unwrap();
        assert_eq!(plan.actions, vec![Action::bare("minimizar_todo")]);
    }

    #[test]
    fn test_minimize_variants() {
        let (_, plan) = matched("minimiza todo").unwrap();
        assert_eq!(plan.actions, vec![Action::bare("minimizar_todo")]);

        let (_, plan) = matched("minimiza esta ventana").unwrap();
        assert_eq!(plan.actions, vec![Action::bare("minimizar_ventana")]);
    }

    #[test]
    fn test_volume_with_number() {
        let (rule, plan) = matched("sube volumen 5 veces").unwrap();
        assert_eq!(rule, ShortcutRule::Volume);
        assert_eq!(
            serde_json::to_value(&plan).unwrap(),
            serde_json::json!({
                "acciones": [{"funcion": "volumen_subir", "args": [5]}],
                "explicacion": "Subiendo volumen 5 veces"
            })
        );
    }

    #[test]
    fn test_volume_default_steps() {
        let (_, plan) = matched("baja el sonido").unwrap();
        assert_eq!(
            plan.actions,
            vec![Action::new("volumen_bajar", vec![Value::Int(3)])]
        );
        assert_eq!(plan.explanation, "Bajando volumen 3 veces");
    }

    #[test]
    fn test_mute() {
        let (_, plan) = matched("silencia el volumen").unwrap();
        assert_eq!(plan.actions, vec![Action::bare("volumen_silenciar")]);
    }

    #[test]
    fn test_priority_open_beats_close() {
        // Matches both the open prefix and the close keyword
        let (rule, _) = matched("abre cerrar sesión").unwrap();
        assert_eq!(rule, ShortcutRule::Open);
    }

    #[test]
    fn test_priority_time_beats_open() {
        let (rule, _) = matched("abre el reloj y dime qué hora es").unwrap();
        assert_eq!(rule, ShortcutRule::Time);
    }

    #[test]
    fn test_volume_keyword_without_direction_falls_through() {
        assert!(matched("el volumen está bien").is_none());
    }

    #[test]
    fn test_free_form_falls_through() {
        assert!(matched("escribe hola mundo en el bloc de notas").is_none());
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("sube 12 y luego 3"), Some(12));
        assert_eq!(first_number("sin números"), None);
        assert_eq!(first_number("x99999999999999999999999"), None);
    }
}
