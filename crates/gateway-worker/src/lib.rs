//! Gateway Worker - process lifecycle and line-delimited JSON-RPC channel
//!
//! This crate owns the two moving parts of the gateway: spawning and
//! stopping worker processes, and exchanging newline-delimited JSON-RPC 2.0
//! messages with them over stdio.

pub mod channel;
pub mod error;
pub mod manager;
pub mod worker;

pub use error::{Result, WorkerError};
pub use manager::{ManagerSettings, ServerReport, WorkerManager};
pub use worker::Worker;
