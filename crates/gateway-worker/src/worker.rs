//! A single managed worker process with piped stdio.

use crate::error::{Result, WorkerError};
use gateway_types::ServerConfig;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, error, info, warn};

/// A live child process and its RPC pipes.
///
/// At most one `Worker` exists per registered name; the manager enforces
/// this by probing liveness before spawning.
pub struct Worker {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    initialized: bool,
}

impl Worker {
    /// Spawn the configured command with its env overrides merged over the
    /// parent environment and all three standard streams piped.
    pub fn spawn(config: &ServerConfig) -> Result<Self> {
        let parts: Vec<&str> = config.command.split_whitespace().collect();
        if parts.is_empty() {
            return Err(WorkerError::InvalidCommand(config.name.clone()));
        }

        let mut cmd = Command::new(parts[0]);
        if parts.len() > 1 {
            cmd.args(&parts[1..]);
        }
        cmd.envs(&config.env_vars)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropped workers (e.g. after a timeout) must not linger.
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| WorkerError::Spawn {
            name: config.name.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| WorkerError::Spawn {
            name: config.name.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin not captured"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| WorkerError::Spawn {
            name: config.name.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout not captured"),
        })?;

        // Drain stderr in the background so a chatty worker cannot fill the
        // pipe and wedge itself.
        if let Some(stderr) = child.stderr.take() {
            let name = config.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[{}] stderr: {}", name, line);
                }
            });
        }

        info!(
            "Started server '{}' with PID {:?}",
            config.name,
            child.id()
        );

        Ok(Self {
            name: config.name.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
            initialized: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// OS-level liveness probe. The cached registry status is never trusted
    /// for this; the process may have exited on its own.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    /// One synchronous request/response exchange: write a single line,
    /// flush, then read exactly one line back within `deadline`.
    ///
    /// Callers must hold the worker's slot lock for the whole exchange;
    /// request and response are correlated purely by read-after-write order.
    pub async fn exchange(&mut self, line: &str, deadline: Duration) -> Result<String> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let mut response = String::new();
        match tokio::time::timeout(deadline, self.stdout.read_line(&mut response)).await {
            Ok(Ok(0)) => {
                error!("Server '{}' closed its output stream", self.name);
                Err(WorkerError::NoResponse(self.name.clone()))
            }
            Ok(Ok(_)) => {
                debug!("[{}] received: {}", self.name, response.trim());
                Ok(response)
            }
            Ok(Err(e)) => {
                error!("IO error reading from server '{}': {}", self.name, e);
                Err(WorkerError::Io(e))
            }
            Err(_) => {
                error!("Timeout waiting for response from server '{}'", self.name);
                Err(WorkerError::Timeout(self.name.clone()))
            }
        }
    }

    /// Graceful stop: close stdin to signal the worker to exit, wait up to
    /// `grace`, then escalate to a forced kill.
    pub async fn shutdown(self, grace: Duration) {
        let Self {
            name,
            mut child,
            stdin,
            ..
        } = self;
        drop(stdin);

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!("Server '{}' exited with status {}", name, status);
            }
            Ok(Err(e)) => {
                error!("Error waiting for server '{}': {}", name, e);
            }
            Err(_) => {
                warn!("Server '{}' ignored shutdown, killing it", name);
                let _ = child.kill().await;
            }
        }
    }

    /// Immediate forced termination, used when the pipe is considered
    /// desynchronized (e.g. after a read timeout).
    pub async fn kill(mut self) {
        let _ = self.child.kill().await;
    }
}
