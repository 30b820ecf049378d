//! Plan and action types
//!
//! Wire keys stay in Spanish (`acciones`, `funcion`, `explicacion`) because
//! that is the shape the model is prompted to produce and the shape
//! shortcut plans are compared against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Explanation used when a plan arrives without one
pub const DEFAULT_EXPLANATION: &str = "Ejecutando comando";

/// Ordered list of actions plus a human-readable explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Actions in execution order; may be empty for informational answers
    #[serde(rename = "acciones")]
    pub actions: Vec<Action>,
    #[serde(rename = "explicacion", default = "default_explanation")]
    pub explanation: String,
    /// The explanation itself is the answer ("son las 14:30")
    #[serde(
        rename = "respuesta_directa",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub direct_response: bool,
}

fn default_explanation() -> String {
    DEFAULT_EXPLANATION.to_string()
}

impl Plan {
    pub fn new(actions: Vec<Action>, explanation: impl Into<String>) -> Self {
        Self {
            actions,
            explanation: explanation.into(),
            direct_response: false,
        }
    }

    /// A single-action plan
    pub fn single(action: Action, explanation: impl Into<String>) -> Self {
        Self::new(vec![action], explanation)
    }

    /// An answer with nothing to execute
    pub fn direct(explanation: impl Into<String>) -> Self {
        Self {
            actions: Vec::new(),
            explanation: explanation.into(),
            direct_response: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

/// A single `(function name, arguments)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "funcion")]
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Action {
    pub fn new(function: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// An action without arguments
    pub fn bare(function: impl Into<String>) -> Self {
        Self::new(function, Vec::new())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Positional argument value
///
/// Variant order matters for untagged deserialization: integers must be
/// tried before floats so `5` stays `Int(5)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Convert an arbitrary JSON value into an argument
    ///
    /// Booleans, nulls and nested structures are not part of the argument
    /// contract; they are carried as their JSON text so a handler can
    /// still decide what to do with them.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            other => Value::Str(other.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "'{}'", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_serializes_with_spanish_keys() {
        let plan = Plan::single(
            Action::new("volumen_subir", vec![Value::Int(5)]),
            "Subiendo volumen 5 veces",
        );
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "acciones": [{"funcion": "volumen_subir", "args": [5]}],
                "explicacion": "Subiendo volumen 5 veces"
            })
        );
    }

    #[test]
    fn test_direct_response_flag_serialized_only_when_set() {
        let json = serde_json::to_string(&Plan::direct("Son las 10:00")).unwrap();
        assert!(json.contains("\"respuesta_directa\":true"));
        assert!(json.contains("\"acciones\":[]"));
    }

    #[test]
    fn test_plan_deserializes_without_explanation() {
        let plan: Plan =
            serde_json::from_str(r#"{"acciones": [{"funcion": "copiar", "args": []}]}"#).unwrap();
        assert_eq!(plan.explanation, DEFAULT_EXPLANATION);
        assert!(!plan.direct_response);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_value_untagged_prefers_int() {
        let values: Vec<Value> = serde_json::from_str(r#"[5, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![Value::Int(5), Value::Float(2.5), Value::Str("x".into())]
        );
    }

    #[test]
    fn test_value_from_json_keeps_odd_values_as_text() {
        assert_eq!(
            Value::from_json(&serde_json::json!(true)),
            Value::Str("true".into())
        );
        assert_eq!(Value::from_json(&serde_json::json!(3)), Value::Int(3));
        assert_eq!(Value::from_json(&serde_json::json!(0.5)), Value::Float(0.5));
    }

    #[test]
    fn test_action_display() {
        let action = Action::new("buscar_en_google", vec!["rust".into()]);
        assert_eq!(action.to_string(), "buscar_en_google('rust')");
        assert_eq!(Action::bare("copiar").to_string(), "copiar()");
    }
}
