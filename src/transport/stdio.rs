//! Child-process stdio transport
//!
//! Spawns a command as a child process and speaks newline-delimited JSON
//! over its pipes: stdin is the outbound channel, stdout the inbound
//! channel, stderr an informational log that is never surfaced as a
//! transport error.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::transport::{MessageStream, Transport, TransportError, TransportState};

/// Configuration for spawning the child process.
#[derive(Debug, Clone)]
pub struct StdioConfig {
    /// Command to execute, resolved via `PATH` (through `/usr/bin/env` on unix).
    pub command: String,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
    /// Extra environment variables overlaid on the inherited environment.
    pub environment: HashMap<String, String>,
    /// Maximum size of a single inbound or outbound frame.
    pub max_message_size: usize,
    /// How long `stop()` waits for the child to exit after SIGTERM before
    /// escalating to SIGKILL.
    pub shutdown_grace_period: Duration,
}

impl StdioConfig {
    /// Build a configuration for the given command with no extra args/env.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            environment: HashMap::new(),
            max_message_size: 10 * 1024 * 1024,
            shutdown_grace_period: Duration::from_secs(5),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Overlay an environment variable onto the spawned process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// Directories prepended to `PATH` so common JS-ecosystem tooling (npx,
/// locally-installed servers) is reachable even when the host process's own
/// `PATH` is minimal (e.g. launched from a GUI app, not a shell).
fn enriched_path(inherited: Option<&str>) -> String {
    let mut dirs = vec![
        "/usr/local/bin".to_string(),
        "/opt/homebrew/bin".to_string(),
    ];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(format!("{home}/.npm-global/bin"));
    }
    dirs.push("./node_modules/.bin".to_string());
    if let Some(existing) = inherited {
        dirs.push(existing.to_string());
    }
    dirs.join(":")
}

/// Asks the child to exit gracefully (SIGTERM on unix), then escalates to a
/// forced kill (SIGKILL) if it hasn't exited within `grace_period`.
async fn terminate(child: &mut Child, grace_period: Duration) {
    if !request_exit(child) {
        let _ = child.start_kill();
        let _ = child.wait().await;
        return;
    }

    if timeout(grace_period, child.wait()).await.is_err() {
        warn!("child did not exit within the grace period, sending SIGKILL");
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

#[cfg(unix)]
fn request_exit(child: &Child) -> bool {
    match child.id() {
        // SAFETY: `pid` is the child's own OS process id, valid for the
        // lifetime of this `Child`; sending a signal to it has no memory
        // safety implications.
        Some(pid) => unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) == 0 },
        None => false,
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) -> bool {
    false
}

/// Spawns `config.command` and wires its stdio pipes as a [`Transport`].
pub struct StdioTransport {
    config: StdioConfig,
    child: Option<Child>,
    stdin: Option<Mutex<ChildStdin>>,
    inbound_rx: Option<mpsc::Receiver<Result<Bytes, TransportError>>>,
    state_tx: watch::Sender<TransportState>,
    state_rx: watch::Receiver<TransportState>,
}

impl StdioTransport {
    /// Create a transport that will spawn `config.command` on `start()`.
    pub fn new(config: StdioConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(TransportState::Idle);
        Self {
            config,
            child: None,
            stdin: None,
            inbound_rx: None,
            state_tx,
            state_rx,
        }
    }

    fn set_state(&self, state: TransportState) {
        let _ = self.state_tx.send(state);
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(&mut self) -> Result<(), TransportError> {
        if self.state_rx.borrow().clone() == TransportState::Connected {
            return Ok(());
        }
        self.set_state(TransportState::Connecting);

        let path = enriched_path(std::env::var("PATH").ok().as_deref());

        #[cfg(unix)]
        let mut command = {
            let mut cmd = Command::new("/usr/bin/env");
            cmd.arg(&self.config.command).args(&self.config.args);
            cmd
        };
        #[cfg(not(unix))]
        let mut command = {
            let mut cmd = Command::new(&self.config.command);
            cmd.args(&self.config.args);
            cmd
        };

        command
            .env("PATH", path)
            .envs(&self.config.environment)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                self.set_state(TransportState::Disconnected);
                return Err(TransportError::Io(err));
            }
        };

        let stdin = child.stdin.take().ok_or_else(|| TransportError::other("child has no stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| TransportError::other("child has no stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| TransportError::other("child has no stderr"))?;

        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        let state_tx = self.state_tx.clone();
        let max_message_size = self.config.max_message_size;

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        if line.len() > max_message_size {
                            let _ = inbound_tx
                                .send(Err(TransportError::message_too_large(line.len(), max_message_size)))
                                .await;
                            continue;
                        }
                        if inbound_tx.send(Ok(Bytes::from(line.into_bytes()))).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdio transport: child stdout closed");
                        let _ = state_tx.send(TransportState::Disconnected);
                        break;
                    }
                    Err(err) => {
                        warn!("stdio transport: read error: {err}");
                        let _ = inbound_tx.send(Err(TransportError::Io(err))).await;
                        let _ = state_tx.send(TransportState::Disconnected);
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(target: "mcp_client::stdio::stderr", "{line}");
            }
        });

        self.child = Some(child);
        self.stdin = Some(Mutex::new(stdin));
        self.inbound_rx = Some(inbound_rx);
        self.set_state(TransportState::Connected);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        if *self.state_rx.borrow() == TransportState::Idle
            || *self.state_rx.borrow() == TransportState::Stopped
        {
            return Ok(());
        }

        if let Some(mut child) = self.child.take() {
            terminate(&mut child, self.config.shutdown_grace_period).await;
        }
        self.stdin = None;
        self.inbound_rx = None;
        self.set_state(TransportState::Stopped);
        Ok(())
    }

    async fn send(&mut self, message: Bytes, timeout: Option<Duration>) -> Result<(), TransportError> {
        if *self.state_rx.borrow() != TransportState::Connected {
            return Err(TransportError::invalid_state("not connected"));
        }
        if message.len() > self.config.max_message_size {
            return Err(TransportError::message_too_large(message.len(), self.config.max_message_size));
        }
        if message.contains(&b'\n') {
            return Err(TransportError::format(
                "message contains embedded newlines, which violates line framing",
            ));
        }

        let stdin = self
            .stdin
            .as_ref()
            .ok_or_else(|| TransportError::invalid_state("not connected"))?;

        let write = async {
            let mut stdin = stdin.lock().await;
            stdin.write_all(&message).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        };

        match timeout {
            Some(duration) => tokio::time::timeout(duration, write)
                .await
                .map_err(|_| TransportError::timeout(duration.as_millis() as u64))?
                .map_err(TransportError::from),
            None => write.await.map_err(TransportError::from),
        }
    }

    fn messages(&mut self) -> MessageStream {
        match self.inbound_rx.take() {
            Some(rx) => Box::pin(ReceiverStream::new(rx)),
            None => Box::pin(tokio_stream::empty()),
        }
    }

    fn state(&self) -> TransportState {
        *self.state_rx.borrow()
    }

    fn state_changes(&self) -> watch::Receiver<TransportState> {
        self.state_rx.clone()
    }

    fn transport_type(&self) -> &'static str {
        "stdio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enriched_path_prepends_known_dirs_and_keeps_inherited() {
        let path = enriched_path(Some("/usr/bin:/bin"));
        assert!(path.starts_with("/usr/local/bin"));
        assert!(path.ends_with("/usr/bin:/bin"));
    }

    #[tokio::test]
    async fn echo_child_produces_a_frame_then_disconnects() {
        let config = StdioConfig::new("sh").arg("-c").arg("echo hello-world");
        let mut transport = StdioTransport::new(config);
        transport.start().await.unwrap();

        let mut messages = transport.messages();
        use futures::StreamExt;
        let first = messages.next().await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&first).contains("hello-world"));

        // further polling eventually observes the closed channel (EOF)
        while messages.next().await.is_some() {}

        transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn send_before_start_is_invalid_state() {
        let config = StdioConfig::new("cat");
        let mut transport = StdioTransport::new(config);
        let result = transport.send(Bytes::from_static(b"hi"), None).await;
        assert!(matches!(result, Err(TransportError::InvalidState(_))));
    }

    #[tokio::test]
    async fn send_rejects_oversized_message() {
        let mut config = StdioConfig::new("cat");
        config.max_message_size = 4;
        let mut transport = StdioTransport::new(config);
        transport.start().await.unwrap();

        let result = transport.send(Bytes::from_static(b"too long"), None).await;
        assert!(matches!(result, Err(TransportError::MessageTooLarge { .. })));
        transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_reaps_a_cooperative_child_via_sigterm() {
        let mut transport = StdioTransport::new(StdioConfig::new("cat"));
        transport.start().await.unwrap();

        let pid = transport.child.as_ref().and_then(|c| c.id()).unwrap();
        transport.stop().await.unwrap();

        // The pid no longer refers to a running process: signal 0 just probes
        // for existence and returns ESRCH once the child has been reaped.
        let probe = unsafe { libc::kill(pid as libc::pid_t, 0) };
        assert_eq!(probe, -1);
    }

    #[tokio::test]
    async fn stop_escalates_to_sigkill_after_the_grace_period() {
        let mut config = StdioConfig::new("sh");
        config.args = vec!["-c".to_string(), "trap '' TERM; sleep 30".to_string()];
        config.shutdown_grace_period = Duration::from_millis(200);
        let mut transport = StdioTransport::new(config);
        transport.start().await.unwrap();

        let started = std::time::Instant::now();
        transport.stop().await.unwrap();
        // Escalation should fire close to the grace period, not wait out the
        // child's 30s sleep.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn start_is_a_no_op_when_already_connected() {
        let mut transport = StdioTransport::new(StdioConfig::new("cat"));
        transport.start().await.unwrap();
        let child_pid_before = transport.child.as_ref().and_then(|c| c.id());
        transport.start().await.unwrap();
        let child_pid_after = transport.child.as_ref().and_then(|c| c.id());
        assert_eq!(child_pid_before, child_pid_after);
        transport.stop().await.unwrap();
    }
}
