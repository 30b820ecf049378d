//! Volatile session context
//!
//! Holds "what just happened" for anaphora resolution and prompt
//! building. Nothing is persisted; a restart starts empty. Writes are
//! crate-private and only the plan executor performs them.

use ahash::AHashSet;
use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// One fact produced by a successfully completed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextFact {
    /// An application was opened
    App(String),
    /// A URL was visited
    Url(String),
    /// A file was created or opened
    File(String),
    /// A web search was run
    Search(String),
    /// Name of the last completed action
    Action(String),
    /// The volume was changed once
    VolumeChanged,
}

/// A completed turn, kept for the prompt's short history
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    pub command: String,
    pub explanation: String,
    pub action_count: usize,
    pub success: bool,
    pub at: DateTime<Local>,
}

impl TurnRecord {
    pub fn new(
        command: impl Into<String>,
        explanation: impl Into<String>,
        action_count: usize,
        success: bool,
    ) -> Self {
        Self {
            command: command.into(),
            explanation: explanation.into(),
            action_count,
            success,
            at: Local::now(),
        }
    }
}

/// Per-session facts plus a bounded turn history
#[derive(Debug, Clone)]
pub struct ContextStore {
    last_app: Option<String>,
    last_url: Option<String>,
    last_file: Option<String>,
    last_search: Option<String>,
    last_action: Option<String>,
    volume_changes: u32,
    open_windows: AHashSet<String>,
    turns: VecDeque<TurnRecord>,
    history_limit: usize,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ContextStore {
    /// Create an empty store keeping at most `history_limit` turns
    pub fn new(history_limit: usize) -> Self {
        Self {
            last_app: None,
            last_url: None,
            last_file: None,
            last_search: None,
            last_action: None,
            volume_changes: 0,
            open_windows: AHashSet::new(),
            turns: VecDeque::new(),
            history_limit: history_limit.max(1),
        }
    }

    pub fn last_app(&self) -> Option<&str> {
        self.last_app.as_deref()
    }

    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    pub fn last_file(&self) -> Option<&str> {
        self.last_file.as_deref()
    }

    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_deref()
    }

    pub fn last_action(&self) -> Option<&str> {
        self.last_action.as_deref()
    }

    pub fn volume_changes(&self) -> u32 {
        self.volume_changes
    }

    pub fn open_windows(&self) -> &AHashSet<String> {
        &self.open_windows
    }

    /// Turns, oldest first
    pub fn turns(&self) -> impl Iterator<Item = &TurnRecord> {
        self.turns.iter()
    }

    /// The most recent turn that completed successfully
    pub fn last_successful_turn(&self) -> Option<&TurnRecord> {
        self.turns.iter().rev().find(|t| t.success)
    }

    /// True when any antecedent for a contextual reference exists
    pub fn has_prior_facts(&self) -> bool {
        self.last_app.is_some()
            || self.last_url.is_some()
            || self.last_file.is_some()
            || self.last_search.is_some()
    }

    /// Clear every fact and the history
    pub fn reset(&mut self) {
        let limit = self.history_limit;
        *self = Self::new(limit);
        tracing::debug!("Context reset");
    }

    pub(crate) fn apply(&mut self, fact: ContextFact) {
        tracing::debug!("Context updated: {:?}", fact);
        match fact {
            ContextFact::App(app) => {
                if !app.is_empty() {
                    self.open_windows.insert(app.clone());
                }
                self.last_app = Some(app);
            }
            ContextFact::Url(url) => self.last_url = Some(url),
            ContextFact::File(file) => self.last_file = Some(file),
            ContextFact::Search(query) => self.last_search = Some(query),
            ContextFact::Action(action) => self.last_action = Some(action),
            ContextFact::VolumeChanged => self.volume_changes += 1,
        }
    }

    pub(crate) fn push_turn(&mut self, turn: TurnRecord) {
        self.turns.push_back(turn);
        while self.turns.len() > self.history_limit {
            self.turns.pop_front();
        }
    }

    /// Human-readable summary of the current facts
    pub fn summary(&self) -> String {
        let mut s = String::from("CONTEXTO ACTUAL:\n");

        if let Some(app) = &self.last_app {
            s.push_str(&format!("- Última app: {}\n", app));
        }
        if let Some(url) = &self.last_url {
            s.push_str(&format!("- Última URL: {}\n", url));
        }
        if let Some(file) = &self.last_file {
            s.push_str(&format!("- Último archivo: {}\n", file));
        }
        if let Some(query) = &self.last_search {
            s.push_str(&format!("- Última búsqueda: {}\n", query));
        }
        if !self.open_windows.is_empty() {
            let mut windows: Vec<_> = self.open_windows.iter().map(String::as_str).collect();
            windows.sort_unstable();
            s.push_str(&format!("- Ventanas abiertas: {}\n", windows.join(", ")));
        }
        if !self.has_prior_facts() {
            s.push_str("- Sin contexto previo\n");
        }

        s
    }

    /// Summary of the last `n` turns, or `None` without history
    pub fn recent_turns_summary(&self, n: usize) -> Option<String> {
        if self.turns.is_empty() || n == 0 {
            return None;
        }
        let skip = self.turns.len().saturating_sub(n);
        let mut s = String::from("Historial reciente:\n");
        for turn in self.turns.iter().skip(skip) {
            s.push_str(&format!("- '{}' → {}\n", turn.command, turn.explanation));
        }
        Some(s)
    }
}
