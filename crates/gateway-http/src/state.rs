//! Shared application state type.

use gateway_worker::WorkerManager;
use std::sync::Arc;

/// Application state shared across all handlers.
pub type AppState = Arc<WorkerManager>;
