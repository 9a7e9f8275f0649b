//! HTTP API layer for the ACH gateway.

pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
