//! Web server module
//!
//! Exposes the search entry point over a small JSON HTTP API.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
