use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Server not registered: {0}")]
    NotFound(String),

    #[error("Invalid command for server '{0}': empty launch line")]
    InvalidCommand(String),

    #[error("Failed to spawn server '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No response from server '{0}': output stream closed")]
    NoResponse(String),

    #[error("Malformed response from server '{name}': {line}")]
    MalformedResponse { name: String, line: String },

    #[error("Server '{name}' returned an error: {error}")]
    Remote {
        name: String,
        error: serde_json::Value,
    },

    #[error("Timed out waiting for response from server '{0}'")]
    Timeout(String),

    #[error("Worker not initialized for server '{0}'")]
    NotInitialized(String),

    #[error("Registry error: {0}")]
    Registry(#[from] gateway_registry::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
