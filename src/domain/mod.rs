//! Domain layer: core entities, the state reducer and view-model math.

pub mod action;
pub mod chat;
pub mod events;
pub mod message;
pub mod message_input_state;
pub mod reducer;
pub mod selection_window;
pub mod shell_state;
pub mod state;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
