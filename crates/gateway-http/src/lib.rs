//! Gateway HTTP - axum facade over the worker manager
//!
//! Thin mapping of URL paths to registry and channel operations. All state
//! lives in the shared `WorkerManager`; handlers translate between JSON
//! bodies and manager calls and map errors to status codes.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
