//! Line-delimited JSON-RPC 2.0 channel over a worker's stdio.
//!
//! One request per line in, one response per line out. There is no
//! Content-Length framing; a single line must be one complete message.

use crate::error::{Result, WorkerError};
use crate::worker::Worker;
use gateway_types::{JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Parse one response line, tolerating workers that prefix banner text
/// before their JSON (scan forward to the first `{` and retry).
pub fn parse_response(name: &str, line: &str) -> Result<JsonRpcResponse> {
    let trimmed = line.trim();

    if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(trimmed) {
        return Ok(response);
    }

    if let Some(start) = trimmed.find('{') {
        if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(&trimmed[start..]) {
            debug!(
                "Recovered JSON from noisy output of server '{}': {}",
                name,
                &trimmed[..start]
            );
            return Ok(response);
        }
    }

    Err(WorkerError::MalformedResponse {
        name: name.to_string(),
        line: trimmed.to_string(),
    })
}

/// Perform one request/response exchange and unwrap the JSON-RPC envelope.
///
/// Returns the `result` field (empty object when absent) or fails with the
/// remote error payload.
pub async fn roundtrip(
    worker: &mut Worker,
    method: &str,
    params: Value,
    deadline: Duration,
) -> Result<Value> {
    let request = JsonRpcRequest::new(method, params);
    let line = serde_json::to_string(&request)?;
    debug!("[{}] sending: {}", worker.name(), line);

    let raw = worker.exchange(&line, deadline).await?;
    let response = parse_response(worker.name(), &raw)?;

    if let Some(error) = response.error {
        return Err(WorkerError::Remote {
            name: worker.name().to_string(),
            error: serde_json::to_value(error)?,
        });
    }

    Ok(response.result.unwrap_or_else(|| json!({})))
}

/// One-time handshake before the first tool call: `initialize` then
/// `tools/list`, responses logged and discarded.
pub async fn handshake(worker: &mut Worker, deadline: Duration) -> Result<()> {
    let init = roundtrip(
        worker,
        "initialize",
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {}
        }),
        deadline,
    )
    .await?;
    info!("Server '{}' initialized: {}", worker.name(), init);

    let tools = roundtrip(worker, "tools/list", json!({}), deadline).await?;
    debug!("Server '{}' tools: {}", worker.name(), tools);

    worker.mark_initialized();
    Ok(())
}
