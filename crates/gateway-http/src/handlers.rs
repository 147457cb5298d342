//! HTTP handlers, one per endpoint. All of them delegate to the shared
//! `WorkerManager`.

use crate::dto::{
    CallRequest, CallResponse, HealthResponse, MessageResponse, RegisterServerRequest,
    ServersResponse,
};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use gateway_types::ServerStatus;
use gateway_worker::ServerReport;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::error;

/// Service banner with the endpoint map.
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "MCP Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/servers": "List registered servers",
            "/servers/register": "Register a new server",
            "/servers/{name}": "Unregister a server (DELETE)",
            "/servers/{name}/start": "Start a server",
            "/servers/{name}/stop": "Stop a server",
            "/servers/{name}/status": "Server status",
            "/call": "Call a method on a server",
            "/tools/{server}/{tool}": "Call a tool on a server",
            "/health": "Gateway health"
        }
    }))
}

pub async fn list_servers(State(state): State<AppState>) -> Json<ServersResponse> {
    Json(ServersResponse {
        servers: state.list().await,
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterServerRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let name = req.name.clone();
    state.register(req.into()).await?;
    Ok(Json(MessageResponse::new(format!(
        "Server {name} registered"
    ))))
}

pub async fn unregister(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.unregister(&name).await?;
    Ok(Json(MessageResponse::new(format!(
        "Server {name} unregistered"
    ))))
}

pub async fn start(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.start(&name).await?;
    Ok(Json(MessageResponse::new(format!("Server {name} started"))))
}

pub async fn stop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.stop(&name).await?;
    Ok(Json(MessageResponse::new(format!("Server {name} stopped"))))
}

pub async fn status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ServerReport>, ApiError> {
    Ok(Json(state.status(&name).await?))
}

/// Pass-through to the RPC channel: one JSON-RPC call to one worker.
pub async fn call(
    State(state): State<AppState>,
    Json(req): Json<CallRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    dispatch(&state, req.server, &req.method, Value::Object(req.params)).await
}

/// Convenience wrapper issuing `tools/call` with the tool name and body as
/// arguments. A missing body means no arguments.
pub async fn call_tool(
    State(state): State<AppState>,
    Path((server, tool)): Path<(String, String)>,
    body: Option<Json<serde_json::Map<String, Value>>>,
) -> Result<Json<CallResponse>, ApiError> {
    let arguments = body.map(|Json(args)| args).unwrap_or_default();
    let params = json!({
        "name": tool,
        "arguments": arguments
    });
    dispatch(&state, server, "tools/call", params).await
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let reports = state.list().await;
    let mut servers = HashMap::new();
    let mut running = 0;
    for report in &reports {
        if report.status == ServerStatus::Running {
            running += 1;
        }
        servers.insert(report.name.clone(), report.status);
    }

    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        total_servers: reports.len(),
        running_servers: running,
        servers,
    })
}

async fn dispatch(
    state: &AppState,
    server: String,
    method: &str,
    params: Value,
) -> Result<Json<CallResponse>, ApiError> {
    let started = Instant::now();
    let result = state.call(&server, method, params).await.map_err(|e| {
        error!("Call to {}.{} failed: {}", server, method, e);
        e
    })?;

    Ok(Json(CallResponse {
        server,
        result,
        timestamp: Utc::now(),
        duration: started.elapsed().as_secs_f64(),
    }))
}
