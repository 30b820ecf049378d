//! Mutex-guarded context for hosts that overlap turns
//!
//! A GUI may start a new command while the previous plan is still
//! running. Readers take a consistent snapshot; the executor locks once
//! per completed action so a reader sees all of an action's facts or none.

use crate::context::store::{ContextFact, ContextStore, TurnRecord};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to one session's context
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    inner: Arc<Mutex<ContextStore>>,
}

impl SharedContext {
    pub fn new(store: ContextStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContextStore> {
        // A panic while holding the lock leaves plain data behind; keep using it
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consistent copy of the current context
    pub fn snapshot(&self) -> ContextStore {
        self.lock().clone()
    }

    /// Run a read-only closure under the lock
    pub fn read<T>(&self, f: impl FnOnce(&ContextStore) -> T) -> T {
        f(&self.lock())
    }

    pub fn reset(&self) {
        self.lock().reset();
    }
}

/// Write side of the context, used only by the executor
pub(crate) trait ContextSink {
    /// Record all facts of one completed action atomically
    fn record(&mut self, facts: Vec<ContextFact>);

    fn record_turn(&mut self, turn: TurnRecord);
}

impl ContextSink for ContextStore {
    fn record(&mut self, facts: Vec<ContextFact>) {
        for fact in facts {
            self.apply(fact);
        }
    }

    fn record_turn(&mut self, turn: TurnRecord) {
        self.push_turn(turn);
    }
}

impl ContextSink for &SharedContext {
    fn record(&mut self, facts: Vec<ContextFact>) {
        let mut store = self.lock();
        for fact in facts {
            store.apply(fact);
        }
    }

    fn record_turn(&mut self, turn: TurnRecord) {
        self.lock().push_turn(turn);
    }
}
