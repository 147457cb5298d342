//! Request and response bodies for the HTTP surface.

use chrono::{DateTime, Utc};
use gateway_types::{ServerConfig, ServerStatus};
use gateway_worker::ServerReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct RegisterServerRequest {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl From<RegisterServerRequest> for ServerConfig {
    fn from(req: RegisterServerRequest) -> Self {
        ServerConfig {
            name: req.name,
            command: req.command,
            description: req.description,
            env_vars: req.env_vars,
            enabled: req.enabled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub server: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub server: String,
    pub result: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// Wall-clock duration of the exchange, in seconds.
    pub duration: f64,
}

#[derive(Debug, Serialize)]
pub struct ServersResponse {
    pub servers: Vec<ServerReport>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub servers: HashMap<String, ServerStatus>,
    pub total_servers: usize,
    pub running_servers: usize,
}
