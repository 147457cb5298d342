//! Gateway Registry - durable mapping of worker names to launch configuration
//!
//! The registry is backed by a YAML document (`servers: [...]`) that is read
//! once at startup and rewritten wholesale on every mutation. Runtime status
//! is tracked in memory only and resets to `registered` on reload.

pub mod error;

pub use error::{RegistryError, Result};

use gateway_types::{ServerConfig, ServerStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// One registered worker: persisted config plus runtime-only status.
#[derive(Debug, Clone)]
pub struct ServerEntry {
    pub config: ServerConfig,
    pub status: ServerStatus,
}

/// On-disk shape of the configuration document.
#[derive(Debug, serde::Serialize, serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    servers: Vec<ServerConfig>,
}

/// In-memory registry with file-backed persistence.
///
/// Not internally synchronized; the manager wraps it in a lock.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    entries: HashMap<String, ServerEntry>,
}

impl Registry {
    /// Load the registry from `path`. A missing file yields an empty
    /// registry; a present but unparseable file is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut entries = HashMap::new();

        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let config: ConfigFile = serde_yaml::from_str(&raw)?;
            for server in config.servers {
                debug!("Loaded server config: {}", server.name);
                entries.insert(
                    server.name.clone(),
                    ServerEntry {
                        config: server,
                        status: ServerStatus::Registered,
                    },
                );
            }
            info!("Loaded {} server(s) from {}", entries.len(), path.display());
        } else {
            info!(
                "No configuration file at {}, starting with empty registry",
                path.display()
            );
        }

        Ok(Self { path, entries })
    }

    /// Serialize every entry's config and overwrite the backing file.
    pub fn save(&self) -> Result<()> {
        let mut servers: Vec<ServerConfig> =
            self.entries.values().map(|e| e.config.clone()).collect();
        // Stable output so rewrites are diffable.
        servers.sort_by(|a, b| a.name.cmp(&b.name));

        let raw = serde_yaml::to_string(&ConfigFile { servers })?;
        // Synchronous write on purpose: the document is a handful of entries
        // and a mutation is not durable until this returns.
        std::fs::write(&self.path, raw)?;
        debug!("Persisted registry to {}", self.path.display());
        Ok(())
    }

    /// Insert or wholesale overwrite an entry, then persist. Idempotent.
    pub fn register(&mut self, config: ServerConfig) -> Result<()> {
        let name = config.name.clone();
        self.entries.insert(
            name.clone(),
            ServerEntry {
                config,
                status: ServerStatus::Registered,
            },
        );
        self.save()?;
        info!("Registered server: {}", name);
        Ok(())
    }

    /// Remove an entry, then persist.
    pub fn unregister(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_none() {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        self.save()?;
        info!("Unregistered server: {}", name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        self.entries.get(name)
    }

    /// Set the runtime status of an entry. Missing names are ignored.
    pub fn set_status(&mut self, name: &str, status: ServerStatus) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.status = status;
        }
    }

    pub fn list(&self) -> Vec<ServerEntry> {
        let mut entries: Vec<ServerEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.config.name.cmp(&b.config.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(name: &str, command: &str) -> ServerConfig {
        ServerConfig {
            name: name.to_string(),
            command: command.to_string(),
            description: format!("{name} worker"),
            env_vars: HashMap::from([("API_KEY".to_string(), "token".to_string())]),
            enabled: true,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(dir.path().join("servers.yaml")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.yaml");

        let mut registry = Registry::load(&path).unwrap();
        registry.register(config("nocodb", "python server.py")).unwrap();
        registry.register(config("files", "mcp-files --root /tmp")).unwrap();

        let reloaded = Registry::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        let entry = reloaded.get("nocodb").unwrap();
        assert_eq!(entry.config.command, "python server.py");
        assert_eq!(entry.config.env_vars.get("API_KEY").unwrap(), "token");
        // Status is runtime-only and resets on reload.
        assert_eq!(entry.status, ServerStatus::Registered);
    }

    #[test]
    fn test_register_overwrites_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.yaml");

        let mut registry = Registry::load(&path).unwrap();
        registry.register(config("nocodb", "python server.py")).unwrap();

        let replacement = ServerConfig {
            name: "nocodb".to_string(),
            command: "python other.py".to_string(),
            description: String::new(),
            env_vars: HashMap::new(),
            enabled: false,
        };
        registry.register(replacement).unwrap();

        let entry = registry.get("nocodb").unwrap();
        assert_eq!(entry.config.command, "python other.py");
        // No merge of prior env_vars.
        assert!(entry.config.env_vars.is_empty());
        assert!(!entry.config.enabled);
    }

    #[test]
    fn test_unregister_unknown_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = Registry::load(dir.path().join("servers.yaml")).unwrap();
        assert!(matches!(
            registry.unregister("ghost"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_status_reset_on_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.yaml");

        let mut registry = Registry::load(&path).unwrap();
        registry.register(config("nocodb", "python server.py")).unwrap();
        registry.set_status("nocodb", ServerStatus::Running);
        assert_eq!(registry.get("nocodb").unwrap().status, ServerStatus::Running);

        let reloaded = Registry::load(&path).unwrap();
        assert_eq!(
            reloaded.get("nocodb").unwrap().status,
            ServerStatus::Registered
        );
    }
}
