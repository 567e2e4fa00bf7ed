//! Shared handle over the current [`AppState`].
//!
//! Every dispatch runs the pure reducer and swaps the stored value. The lock
//! is held for one reduction only, so it is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::{action::Action, reducer::reduce, state::AppState};

#[derive(Debug, Clone, Default)]
pub struct StateStore {
    current: Arc<Mutex<AppState>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: Action) {
        let mut current = self.lock();
        tracing::trace!(action = action.kind(), "dispatching action");
        *current = reduce(&current, action);
    }

    /// Plans actions from the current state and applies them in the same
    /// critical section. Returns how many actions were applied.
    pub fn dispatch_with<F>(&self, plan: F) -> usize
    where
        F: FnOnce(&AppState) -> Vec<Action>,
    {
        let mut current = self.lock();
        let actions = plan(&current);
        let applied = actions.len();
        for action in actions {
            tracing::trace!(action = action.kind(), "dispatching planned action");
            *current = reduce(&current, action);
        }
        applied
    }

    /// Returns the current state. Cheap: large fields are `Arc`-shared.
    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
