//! Worker lifecycle manager.
//!
//! `WorkerManager` is the single context object owning the registry and the
//! process table. Each worker name maps to a slot guarded by its own mutex;
//! the slot lock is held across the whole write-then-read exchange so
//! concurrent calls to the same worker are serialized, while calls to
//! different workers proceed in parallel.

use crate::channel;
use crate::error::{Result, WorkerError};
use crate::worker::Worker;
use gateway_registry::Registry;
use gateway_types::{ServerConfig, ServerStatus};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Tunables shared by all workers.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    /// Deadline for one request/response exchange.
    pub call_timeout: Duration,
    /// Grace period before a stubborn worker is force-killed.
    pub stop_grace: Duration,
    /// Run the initialize/tools-list handshake once per process.
    pub handshake: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            stop_grace: Duration::from_secs(5),
            handshake: true,
        }
    }
}

/// Point-in-time view of one registered worker, with liveness re-probed
/// at query time.
#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    pub name: String,
    pub description: String,
    pub status: ServerStatus,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

/// One worker's slot: the exchange-serializing mutex plus the last known
/// pid, readable without taking that mutex so status queries never wait
/// behind an in-flight call.
#[derive(Default)]
struct Slot {
    worker: Mutex<Option<Worker>>,
    // 0 means no live worker; child pids are never 0.
    last_pid: AtomicU32,
}

impl Slot {
    fn record_pid(&self, pid: Option<u32>) {
        self.last_pid.store(pid.unwrap_or(0), Ordering::Relaxed);
    }

    fn cached_pid(&self) -> Option<u32> {
        match self.last_pid.load(Ordering::Relaxed) {
            0 => None,
            pid => Some(pid),
        }
    }
}

type WorkerSlot = Arc<Slot>;

pub struct WorkerManager {
    registry: RwLock<Registry>,
    workers: Mutex<HashMap<String, WorkerSlot>>,
    settings: ManagerSettings,
}

impl WorkerManager {
    pub fn new(registry: Registry, settings: ManagerSettings) -> Self {
        Self {
            registry: RwLock::new(registry),
            workers: Mutex::new(HashMap::new()),
            settings,
        }
    }

    /// Insert or overwrite a registry entry and persist it.
    pub async fn register(&self, config: ServerConfig) -> Result<()> {
        self.registry.write().await.register(config)?;
        Ok(())
    }

    /// Stop any live process for `name`, then remove and persist.
    pub async fn unregister(&self, name: &str) -> Result<()> {
        self.stop(name).await?;
        self.registry.write().await.unregister(name)?;
        self.workers.lock().await.remove(name);
        Ok(())
    }

    /// Start the named worker. No-op with a warning if it is already alive.
    pub async fn start(&self, name: &str) -> Result<()> {
        let config = self.config(name).await?;
        let slot = self.slot(name).await;
        let mut guard = slot.worker.lock().await;

        if guard.as_mut().is_some_and(Worker::is_alive) {
            warn!("Server '{}' is already running", name);
            return Ok(());
        }

        self.spawn_into(&slot, &mut guard, name, &config).await
    }

    /// Stop the named worker if it is running. No-op otherwise; stopping a
    /// never-started worker does not fail.
    pub async fn stop(&self, name: &str) -> Result<()> {
        let slot = {
            let workers = self.workers.lock().await;
            match workers.get(name) {
                Some(slot) => slot.clone(),
                None => return Ok(()),
            }
        };

        let mut guard = slot.worker.lock().await;
        if let Some(worker) = guard.take() {
            worker.shutdown(self.settings.stop_grace).await;
            slot.record_pid(None);
            self.set_status(name, ServerStatus::Stopped).await;
            info!("Server '{}' stopped", name);
        }
        Ok(())
    }

    /// Stop every live worker; used at gateway shutdown.
    pub async fn stop_all(&self) {
        let names: Vec<String> = self.workers.lock().await.keys().cloned().collect();
        for name in names {
            if let Err(e) = self.stop(&name).await {
                warn!("Error stopping server '{}': {}", name, e);
            }
        }
    }

    /// Report the named worker's state, re-probing OS liveness.
    pub async fn status(&self, name: &str) -> Result<ServerReport> {
        let entry = self
            .registry
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| WorkerError::NotFound(name.to_string()))?;

        let (alive, pid) = self.probe(name).await;
        let status = if alive {
            ServerStatus::Running
        } else if entry.status == ServerStatus::Running {
            // The process exited on its own since we last looked.
            self.set_status(name, ServerStatus::Stopped).await;
            ServerStatus::Stopped
        } else {
            entry.status
        };

        Ok(ServerReport {
            name: entry.config.name,
            description: entry.config.description,
            status,
            enabled: entry.config.enabled,
            pid: if alive { pid } else { None },
        })
    }

    /// Snapshot of every registered worker.
    pub async fn list(&self) -> Vec<ServerReport> {
        let names: Vec<String> = {
            let registry = self.registry.read().await;
            registry.list().into_iter().map(|e| e.config.name).collect()
        };

        let mut reports = Vec::with_capacity(names.len());
        for name in names {
            if let Ok(report) = self.status(&name).await {
                reports.push(report);
            }
        }
        reports
    }

    /// Dispatch one JSON-RPC call to the named worker, lazily starting it.
    ///
    /// Unregistered names fail with `NotFound` before anything is spawned.
    pub async fn call(&self, name: &str, method: &str, params: Value) -> Result<Value> {
        let config = self.config(name).await?;
        let slot = self.slot(name).await;
        let mut guard = slot.worker.lock().await;

        if !guard.as_mut().is_some_and(Worker::is_alive) {
            info!("Server '{}' is not running, starting it on demand", name);
            self.spawn_into(&slot, &mut guard, name, &config).await?;
        }

        let worker = guard
            .as_mut()
            .ok_or_else(|| WorkerError::NotInitialized(name.to_string()))?;

        match self.exchange(worker, method, params).await {
            Ok(result) => Ok(result),
            Err(err @ (WorkerError::Timeout(_) | WorkerError::NoResponse(_))) => {
                // The pipe is desynchronized or closed; drop the process so
                // the next use respawns a fresh one.
                if let Some(worker) = guard.take() {
                    worker.kill().await;
                }
                slot.record_pid(None);
                self.set_status(name, ServerStatus::Error).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Handshake (once per process) followed by the actual call.
    async fn exchange(&self, worker: &mut Worker, method: &str, params: Value) -> Result<Value> {
        if self.settings.handshake && !worker.initialized() {
            channel::handshake(worker, self.settings.call_timeout).await?;
        }
        channel::roundtrip(worker, method, params, self.settings.call_timeout).await
    }

    async fn config(&self, name: &str) -> Result<ServerConfig> {
        self.registry
            .read()
            .await
            .get(name)
            .map(|entry| entry.config.clone())
            .ok_or_else(|| WorkerError::NotFound(name.to_string()))
    }

    async fn slot(&self, name: &str) -> WorkerSlot {
        self.workers
            .lock()
            .await
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    async fn spawn_into(
        &self,
        slot: &Slot,
        guard: &mut Option<Worker>,
        name: &str,
        config: &ServerConfig,
    ) -> Result<()> {
        match Worker::spawn(config) {
            Ok(worker) => {
                slot.record_pid(worker.pid());
                *guard = Some(worker);
                self.set_status(name, ServerStatus::Running).await;
                Ok(())
            }
            Err(err) => {
                *guard = None;
                slot.record_pid(None);
                self.set_status(name, ServerStatus::Error).await;
                Err(err)
            }
        }
    }

    /// Liveness probe that never waits behind an in-flight exchange: a busy
    /// slot mutex is only ever held around a live worker, so it is reported
    /// as alive with the cached pid.
    async fn probe(&self, name: &str) -> (bool, Option<u32>) {
        let slot = {
            let workers = self.workers.lock().await;
            match workers.get(name) {
                Some(slot) => slot.clone(),
                None => return (false, None),
            }
        };
        let result = match slot.worker.try_lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(worker) => (worker.is_alive(), worker.pid()),
                None => (false, None),
            },
            Err(_) => (true, slot.cached_pid()),
        };
        result
    }

    async fn set_status(&self, name: &str, status: ServerStatus) {
        self.registry.write().await.set_status(name, status);
    }
}
