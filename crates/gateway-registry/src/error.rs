use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Server not registered: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
