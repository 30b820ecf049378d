//! Agent configuration with documented defaults
//!
//! Every section is optional in the TOML file; anything missing falls back
//! to the values below. Environment variables are applied on top of the
//! file so a single run can swap the model without editing it.

use crate::core::error::{NeoError, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete configuration for the command pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub llm: LlmConfig,
    pub context: ContextConfig,
    pub vision: VisionConfig,
    pub catalog: CatalogConfig,
    pub control: ControlConfig,
}

/// How the external model process is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Executable that reads the prompt on stdin and answers on stdout
    pub program: String,
    /// Arguments placed before the model name
    pub args: Vec<String>,
    /// Model name appended after `args`
    pub model: String,
    /// Hard limit for one generation, in seconds
    ///
    /// Small local models answer in 10-20 seconds; the limit leaves room
    /// for a cold start without letting a hung process block the turn.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            program: "ollama".into(),
            args: vec!["run".into()],
            model: "llama3.2:3b".into(),
            timeout_secs: 30,
        }
    }
}

/// Session context sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Turns kept in memory for the session
    pub history_limit: usize,
    /// Turns summarized into each prompt
    pub prompt_turns: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            prompt_turns: 3,
        }
    }
}

/// Keywords that suggest the command is about what is on screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub keywords: Vec<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let keywords = [
            "esto",
            "esta",
            "eso",
            "aquí",
            "ahí",
            "pantalla",
            "ventana",
            "lo que ves",
            "lo que hay",
            "qué hay",
        ];
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Restrictions on the action allowlist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Action names removed from the catalog at startup
    pub disabled: Vec<String>,
}

/// Which PC-control backend runs the actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlBackend {
    /// Real desktop through xdotool / xdg-open
    Desktop,
    /// Log and record every call, touch nothing
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub backend: ControlBackend,
    /// Delay between typed characters, in milliseconds
    pub type_delay_ms: u64,
    /// Catalog program names mapped to local executables
    pub program_aliases: AHashMap<String, String>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        let aliases = [
            ("chrome", "google-chrome"),
            ("notepad", "gedit"),
            ("calc", "gnome-calculator"),
            ("cmd", "x-terminal-emulator"),
        ];
        Self {
            backend: ControlBackend::Desktop,
            type_delay_ms: 50,
            program_aliases: aliases
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from an optional TOML file, then apply env overrides
    ///
    /// `None` means "no file": defaults plus environment. An explicit path
    /// that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    NeoError::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without env overrides
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply environment overrides
    ///
    /// Optional: NEO_LLM_PROGRAM, NEO_MODEL, NEO_LLM_TIMEOUT_SECS
    pub fn apply_env(&mut self) {
        if let Ok(program) = std::env::var("NEO_LLM_PROGRAM") {
            self.llm.program = program;
        }
        if let Ok(model) = std::env::var("NEO_MODEL") {
            self.llm.model = model;
        }
        if let Ok(secs) = std::env::var("NEO_LLM_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.llm.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring NEO_LLM_TIMEOUT_SECS={:?}: not a number", secs),
            }
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_secs == 0 {
            return Err(NeoError::Config("llm.timeout_secs must be positive".into()));
        }
        if self.llm.program.trim().is_empty() {
            return Err(NeoError::Config("llm.program must not be empty".into()));
        }
        if self.context.history_limit == 0 {
            return Err(NeoError::Config("context.history_limit must be positive".into()));
        }
        if self.context.prompt_turns > self.context.history_limit {
            return Err(NeoError::Config(format!(
                "context.prompt_turns ({}) should be <= context.history_limit ({})",
                self.context.prompt_turns, self.context.history_limit
            )));
        }
        Ok(())
    }
}
