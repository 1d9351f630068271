//! HTTP calling layer for the game-code automation core.

/// Route handlers and router assembly.
pub mod routes;

/// Shared application state.
pub use routes::AppState;
