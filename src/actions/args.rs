//! Loose positional argument access
//!
//! The validator never checks argument count or type. Handlers read their
//! arguments through these accessors: missing values fall back to a
//! default, extra values are ignored, numbers written as strings are
//! accepted.

use crate::command::plan::Value;

/// Borrowed view over an action's arguments
#[derive(Debug, Clone, Copy)]
pub struct ActionArgs<'a> {
    values: &'a [Value],
}

impl<'a> ActionArgs<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index` as text, trimmed; `None` when absent or blank
    pub fn text(&self, index: usize) -> Option<String> {
        let text = match self.values.get(index)? {
            Value::Str(s) => s.trim().to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Every argument rendered as text and joined with spaces
    pub fn joined_text(&self) -> String {
        self.values
            .iter()
            .map(|v| match v {
                Value::Str(s) => s.clone(),
                Value::Int(i) => i.to_string(),
                Value::Float(x) => x.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Non-negative count at `index`, clamped to `max`
    pub fn count(&self, index: usize, default: u32, max: u32) -> u32 {
        let count = match self.values.get(index) {
            Some(Value::Int(i)) => (*i).clamp(0, i64::from(max)) as u32,
            Some(Value::Float(x)) if x.is_finite() => x.round().clamp(0.0, f64::from(max)) as u32,
            Some(Value::Str(s)) => match s.trim().parse::<f64>() {
                Ok(x) if x.is_finite() => x.round().clamp(0.0, f64::from(max)) as u32,
                _ => default,
            },
            _ => default,
        };
        count.min(max)
    }

    /// Seconds at `index`, clamped to `[0, max]`
    pub fn seconds(&self, index: usize, default: f64, max: f64) -> f64 {
        let secs = match self.values.get(index) {
            Some(Value::Int(i)) => *i as f64,
            Some(Value::Float(x)) => *x,
            Some(Value::Str(s)) => s.trim().parse::<f64>().unwrap_or(default),
            None => default,
        };
        if secs.is_finite() {
            secs.clamp(0.0, max)
        } else {
            default.clamp(0.0, max)
        }
    }
}
