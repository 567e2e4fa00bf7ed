//! Use case layer: the session engine and the workflows driven by the shell.

pub mod bootstrap;
pub mod context;
pub mod contracts;
pub mod event_bridge;
pub mod pagination;
pub mod request_error;
pub mod session;
pub mod shell;
pub mod store;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
