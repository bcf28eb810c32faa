//! HTTP server for the realty chat agent

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
