//! PromptGate server library
//!
//! The transport adapters and shared state behind the `promptgate-server`
//! binary, exposed as a library so integration tests can drive them
//! in-process.

pub mod routes;
pub mod state;
pub mod tcp;

pub use routes::create_router;
pub use state::AppState;
