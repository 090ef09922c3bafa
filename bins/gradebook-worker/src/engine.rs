//! Kernel Engine - Python Execution Backends
//!
//! **Core Responsibility:**
//! Execute notebook cell source in a persistent Python namespace and report
//! what happened: captured stdout, and the exception if the cell raised.
//!
//! **Critical Architectural Boundary:**
//! - Engine knows HOW to execute (local process or Docker container)
//! - Engine does NOT know about test cases, points or results
//! - A cell that raises is a normal `CellOutcome`, not an error
//! - `KernelError` is reserved for infrastructure failures (dead process,
//!   broken protocol, timeout) after which the namespace cannot be trusted
//!
//! Both backends speak the same line protocol with `assets/kernel_bridge.py`:
//! one JSON request per line in, one JSON reply per line out.

use crate::config::{KernelBackend, KernelConfig};
use base64::{engine::general_purpose, Engine as _};
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, RemoveContainerOptions, StartContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures_util::stream::{Stream, StreamExt};
use gradebook_common::notebook::{error_output, stream_output};
use gradebook_common::types::KernelInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, instrument, warn};

pub const BRIDGE_SCRIPT: &str = include_str!("../assets/kernel_bridge.py");

/// Cells larger than this never reach the interpreter
const MAX_CELL_SOURCE_BYTES: usize = 1024 * 1024; // 1MB

const BRIDGE_PATH_IN_CONTAINER: &str = "/tmp/gradebook_bridge.py";
const WORKDIR_IN_CONTAINER: &str = "/work";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("failed to start kernel: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("kernel I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("kernel closed its output stream")]
    Closed,
    #[error("malformed kernel exchange: {0}")]
    Protocol(String),
    #[error("cell did not finish within {0}s")]
    Timeout(u64),
    #[error("cell source exceeds maximum size of {0} bytes")]
    SourceTooLarge(usize),
    #[error("docker: {0}")]
    Docker(#[from] bollard::errors::Error),
}

/// Exception raised by a cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellFailure {
    pub ename: String,
    pub evalue: String,
    pub traceback: String,
}

impl CellFailure {
    /// Full traceback when the kernel sent one, `ename: evalue` otherwise
    pub fn detail(&self) -> String {
        if self.traceback.trim().is_empty() {
            format!("{}: {}", self.ename, self.evalue)
        } else {
            self.traceback.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellOutcome {
    pub stdout: String,
    pub failure: Option<CellFailure>,
}

#[cfg(test)]
impl CellOutcome {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            failure: None,
        }
    }

    pub fn raised(ename: &str, evalue: &str, traceback: &str) -> Self {
        Self {
            stdout: String::new(),
            failure: Some(CellFailure {
                ename: ename.to_string(),
                evalue: evalue.to_string(),
                traceback: traceback.to_string(),
            }),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

impl CellOutcome {
    /// nbformat outputs for the executed cell
    pub fn outputs(&self) -> Vec<Value> {
        let mut outputs = Vec::new();
        if !self.stdout.is_empty() {
            outputs.push(stream_output("stdout", &self.stdout));
        }
        if let Some(failure) = &self.failure {
            outputs.push(error_output(&failure.ename, &failure.evalue, &failure.traceback));
        }
        outputs
    }
}

/// A Python namespace that executes cells in order
#[allow(async_fn_in_trait)]
pub trait Kernel {
    async fn info(&mut self) -> Result<KernelInfo, KernelError>;
    async fn execute(&mut self, source: &str) -> Result<CellOutcome, KernelError>;
    async fn shutdown(&mut self) -> Result<(), KernelError>;
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum BridgeRequest<'a> {
    Info,
    Execute { source: &'a str },
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    ok: bool,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    ename: String,
    #[serde(default)]
    evalue: String,
    #[serde(default)]
    traceback: String,
    #[serde(default)]
    python_version: Option<String>,
    #[serde(default)]
    platform: Option<String>,
}

impl From<BridgeReply> for CellOutcome {
    fn from(reply: BridgeReply) -> Self {
        let failure = (!reply.ok).then(|| CellFailure {
            ename: reply.ename,
            evalue: reply.evalue,
            traceback: reply.traceback,
        });
        CellOutcome {
            stdout: reply.stdout,
            failure,
        }
    }
}

fn encode_request(request: &BridgeRequest<'_>) -> Result<String, KernelError> {
    let mut line =
        serde_json::to_string(request).map_err(|e| KernelError::Protocol(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

fn decode_reply(line: &str) -> Result<BridgeReply, KernelError> {
    serde_json::from_str(line.trim()).map_err(|e| {
        KernelError::Protocol(format!("{} in reply {:?}", e, line.trim()))
    })
}

/// Line transport to a running bridge script
trait BridgeChannel {
    async fn send(&mut self, line: &str) -> Result<(), KernelError>;
    async fn recv(&mut self) -> Result<String, KernelError>;
}

async fn round_trip<C: BridgeChannel>(
    channel: &mut C,
    request: &BridgeRequest<'_>,
    timeout: Duration,
) -> Result<BridgeReply, KernelError> {
    let line = encode_request(request)?;
    let exchange = async {
        channel.send(&line).await?;
        channel.recv().await
    };
    let reply = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| KernelError::Timeout(timeout.as_secs()))??;
    decode_reply(&reply)
}

async fn bridge_info<C: BridgeChannel>(
    channel: &mut C,
    timeout: Duration,
) -> Result<KernelInfo, KernelError> {
    let reply = round_trip(channel, &BridgeRequest::Info, timeout).await?;
    if !reply.ok {
        return Err(KernelError::Protocol(format!(
            "info request failed: {}: {}",
            reply.ename, reply.evalue
        )));
    }
    Ok(KernelInfo {
        python_version: reply.python_version.unwrap_or_default(),
        platform: reply.platform.unwrap_or_default(),
    })
}

async fn bridge_execute<C: BridgeChannel>(
    channel: &mut C,
    source: &str,
    timeout: Duration,
) -> Result<CellOutcome, KernelError> {
    // GUARDRAIL: reject pathological cells before they reach the interpreter
    if source.len() > MAX_CELL_SOURCE_BYTES {
        return Err(KernelError::SourceTooLarge(MAX_CELL_SOURCE_BYTES));
    }
    let reply = round_trip(channel, &BridgeRequest::Execute { source }, timeout).await?;
    Ok(reply.into())
}

/// Python child process on the grading host
pub struct LocalKernel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    timeout: Duration,
}

impl LocalKernel {
    #[instrument(skip(config), fields(kernel = %config.name, python = %config.python))]
    pub async fn start(config: &KernelConfig, working_dir: &Path) -> Result<Self, KernelError> {
        let mut child = Command::new(&config.python)
            .arg("-u")
            .arg("-c")
            .arg(BRIDGE_SCRIPT)
            .current_dir(working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(KernelError::Spawn)?;

        let stdin = child.stdin.take().ok_or(KernelError::Closed)?;
        let stdout = child.stdout.take().ok_or(KernelError::Closed)?;

        info!(working_dir = %working_dir.display(), "Local kernel started");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            timeout: Duration::from_secs(config.cell_timeout_secs),
        })
    }
}

impl BridgeChannel for LocalKernel {
    async fn send(&mut self, line: &str) -> Result<(), KernelError> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, KernelError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line).await? == 0 {
            return Err(KernelError::Closed);
        }
        Ok(line)
    }
}

impl Kernel for LocalKernel {
    async fn info(&mut self) -> Result<KernelInfo, KernelError> {
        let timeout = self.timeout;
        bridge_info(self, timeout).await
    }

    async fn execute(&mut self, source: &str) -> Result<CellOutcome, KernelError> {
        let timeout = self.timeout;
        bridge_execute(self, source, timeout).await
    }

    async fn shutdown(&mut self) -> Result<(), KernelError> {
        // Closing stdin ends the bridge's read loop
        let _ = self.stdin.shutdown().await;
        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(status = ?status, "Local kernel exited");
            }
            Err(_) => {
                warn!("Local kernel did not exit, killing it");
                self.child.kill().await?;
            }
        }
        Ok(())
    }
}

/// Container cleanup guard - removes the container on drop unless disarmed
struct ContainerGuard {
    docker: Docker,
    container_id: String,
    armed: bool,
}

impl ContainerGuard {
    fn new(docker: &Docker, container_id: String) -> Self {
        Self {
            docker: docker.clone(),
            container_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    /// Remove the container before returning, then disarm
    ///
    /// Used on error paths where the process may exit right after, which
    /// would abandon a removal spawned from `Drop`.
    async fn remove_now(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = force_remove(&self.docker, &self.container_id).await {
            warn!(container_id = %self.container_id, error = %e, "Failed to clean up container");
        }
        self.disarm();
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Cannot await in Drop; hand removal to the runtime if one is still alive
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(container_id = %self.container_id, "No runtime left to remove container");
            return;
        };
        let docker = self.docker.clone();
        let container_id = self.container_id.clone();
        handle.spawn(async move {
            if let Err(e) = force_remove(&docker, &container_id).await {
                warn!(container_id = %container_id, error = %e, "Failed to clean up container");
            }
        });
    }
}

async fn force_remove(docker: &Docker, container_id: &str) -> Result<(), KernelError> {
    let options = RemoveContainerOptions {
        force: true,
        ..Default::default()
    };
    docker.remove_container(container_id, Some(options)).await?;
    Ok(())
}

type ExecOutput =
    Pin<Box<dyn Stream<Item = Result<LogOutput, bollard::errors::Error>> + Send>>;

/// Bridge script running inside a sandboxed Docker container
///
/// **Sandbox Rules:**
/// - Network disabled
/// - Memory and CPU limits from the kernel config
/// - Notebook directory mounted at `/work`, which is the working directory
/// - Container removed on shutdown, or by the drop guard
pub struct DockerKernel {
    docker: Docker,
    container_id: String,
    input: Pin<Box<dyn AsyncWrite + Send>>,
    output: ExecOutput,
    pending: Vec<u8>,
    timeout: Duration,
    guard: ContainerGuard,
}

impl DockerKernel {
    #[instrument(skip(config), fields(kernel = %config.name))]
    pub async fn start(config: &KernelConfig, working_dir: &Path) -> Result<Self, KernelError> {
        let image = config
            .image
            .clone()
            .ok_or_else(|| KernelError::Protocol(format!("kernel '{}' has no image", config.name)))?;

        let docker = Docker::connect_with_local_defaults()?;
        ensure_image(&docker, &image).await?;

        let host_dir = std::fs::canonicalize(working_dir)?;
        let container_name = format!("gradebook-{}", uuid::Uuid::new_v4());

        let container_config = Config {
            image: Some(image.clone()),
            cmd: Some(vec!["sleep".to_string(), "infinity".to_string()]),
            entrypoint: Some(vec![]),
            working_dir: Some(WORKDIR_IN_CONTAINER.to_string()),
            network_disabled: Some(true),
            host_config: Some(bollard::models::HostConfig {
                memory: Some(i64::from(config.memory_limit_mb) * 1024 * 1024),
                nano_cpus: Some((f64::from(config.cpu_limit) * 1_000_000_000.0) as i64),
                binds: Some(vec![format!(
                    "{}:{}",
                    host_dir.display(),
                    WORKDIR_IN_CONTAINER
                )]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: container_name.as_str(),
            platform: None,
        };
        let container = docker
            .create_container(Some(create_options), container_config)
            .await?;
        let container_id = container.id.clone();
        let mut guard = ContainerGuard::new(&docker, container_id.clone());

        let (output, input) = match attach_bridge(&docker, &container_id, config).await {
            Ok(attached) => attached,
            Err(e) => {
                warn!(container_id = %container_id, error = %e, "Kernel start failed, removing container");
                guard.remove_now().await;
                return Err(e);
            }
        };

        info!(
            container_id = %container_id,
            image = %image,
            memory_mb = config.memory_limit_mb,
            cpu_limit = config.cpu_limit,
            "Docker kernel started"
        );

        Ok(Self {
            docker,
            container_id,
            input,
            output,
            pending: Vec::new(),
            timeout: Duration::from_secs(config.cell_timeout_secs),
            guard,
        })
    }
}

/// Start the container and attach to a bridge process inside it
async fn attach_bridge(
    docker: &Docker,
    container_id: &str,
    config: &KernelConfig,
) -> Result<(ExecOutput, Pin<Box<dyn AsyncWrite + Send>>), KernelError> {
    docker
        .start_container(container_id, None::<StartContainerOptions<String>>)
        .await?;

    write_bridge_script(docker, container_id).await?;

    let exec = docker
        .create_exec(
            container_id,
            CreateExecOptions {
                cmd: Some(vec![
                    config.python.clone(),
                    "-u".to_string(),
                    BRIDGE_PATH_IN_CONTAINER.to_string(),
                ]),
                attach_stdin: Some(true),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                working_dir: Some(WORKDIR_IN_CONTAINER.to_string()),
                ..Default::default()
            },
        )
        .await?;

    let started = docker
        .start_exec(
            &exec.id,
            Some(StartExecOptions {
                detach: false,
                ..Default::default()
            }),
        )
        .await?;

    match started {
        StartExecResults::Attached { output, input } => Ok((output, input)),
        StartExecResults::Detached => Err(KernelError::Protocol(
            "failed to attach to bridge exec".to_string(),
        )),
    }
}

/// Pull the image unless it is already present
async fn ensure_image(docker: &Docker, image: &str) -> Result<(), KernelError> {
    if docker.inspect_image(image).await.is_ok() {
        debug!(image = %image, "Image cache hit");
        return Ok(());
    }

    warn!(image = %image, "Image cache miss, pulling");
    let options = Some(CreateImageOptions {
        from_image: image,
        ..Default::default()
    });
    let mut stream = docker.create_image(options, None, None);
    while let Some(result) = stream.next().await {
        result?;
    }
    info!(image = %image, "Image pulled");
    Ok(())
}

async fn write_bridge_script(docker: &Docker, container_id: &str) -> Result<(), KernelError> {
    let encoded = general_purpose::STANDARD.encode(BRIDGE_SCRIPT);
    let write_command = format!(
        "echo '{}' | base64 -d > {}",
        encoded, BRIDGE_PATH_IN_CONTAINER
    );

    let exec = docker
        .create_exec(
            container_id,
            CreateExecOptions {
                cmd: Some(vec!["sh".to_string(), "-c".to_string(), write_command]),
                attach_stdout: Some(true),
                attach_stderr: Some(true),
                ..Default::default()
            },
        )
        .await?;

    if let StartExecResults::Attached { mut output, .. } = docker
        .start_exec(
            &exec.id,
            Some(StartExecOptions {
                detach: false,
                ..Default::default()
            }),
        )
        .await?
    {
        while output.next().await.is_some() {}
    }

    let inspect = docker.inspect_exec(&exec.id).await?;
    if inspect.exit_code != Some(0) {
        return Err(KernelError::Protocol(format!(
            "failed to write bridge script (exit code {:?})",
            inspect.exit_code
        )));
    }
    Ok(())
}

impl BridgeChannel for DockerKernel {
    async fn send(&mut self, line: &str) -> Result<(), KernelError> {
        self.input.write_all(line.as_bytes()).await?;
        self.input.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, KernelError> {
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            match self.output.next().await {
                Some(Ok(LogOutput::StdOut { message })) => {
                    self.pending.extend_from_slice(&message);
                }
                Some(Ok(LogOutput::StdErr { message })) => {
                    debug!(stderr = %String::from_utf8_lossy(&message), "Bridge stderr");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(KernelError::Closed),
            }
        }
    }
}

impl Kernel for DockerKernel {
    async fn info(&mut self) -> Result<KernelInfo, KernelError> {
        let timeout = self.timeout;
        bridge_info(self, timeout).await
    }

    async fn execute(&mut self, source: &str) -> Result<CellOutcome, KernelError> {
        let timeout = self.timeout;
        bridge_execute(self, source, timeout).await
    }

    async fn shutdown(&mut self) -> Result<(), KernelError> {
        let _ = self.input.shutdown().await;
        force_remove(&self.docker, &self.container_id).await?;
        self.guard.disarm();
        debug!(container_id = %self.container_id, "Docker kernel removed");
        Ok(())
    }
}

/// Kernel selected at runtime from the kernel config
pub enum AnyKernel {
    Local(LocalKernel),
    Docker(DockerKernel),
}

impl AnyKernel {
    pub async fn start(config: &KernelConfig, working_dir: &Path) -> Result<Self, KernelError> {
        match config.backend {
            KernelBackend::Local => Ok(Self::Local(LocalKernel::start(config, working_dir).await?)),
            KernelBackend::Docker => {
                Ok(Self::Docker(DockerKernel::start(config, working_dir).await?))
            }
        }
    }
}

impl Kernel for AnyKernel {
    async fn info(&mut self) -> Result<KernelInfo, KernelError> {
        match self {
            Self::Local(k) => k.info().await,
            Self::Docker(k) => k.info().await,
        }
    }

    async fn execute(&mut self, source: &str) -> Result<CellOutcome, KernelError> {
        match self {
            Self::Local(k) => k.execute(source).await,
            Self::Docker(k) => k.execute(source).await,
        }
    }

    async fn shutdown(&mut self) -> Result<(), KernelError> {
        match self {
            Self::Local(k) => k.shutdown().await,
            Self::Docker(k) => k.shutdown().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        assert_eq!(encode_request(&BridgeRequest::Info).unwrap(), "{\"op\":\"info\"}\n");
        assert_eq!(
            encode_request(&BridgeRequest::Execute { source: "x = 1\nprint(x)" }).unwrap(),
            "{\"op\":\"execute\",\"source\":\"x = 1\\nprint(x)\"}\n"
        );
    }

    #[test]
    fn test_decode_success_reply() {
        let outcome: CellOutcome = decode_reply("{\"ok\": true, \"stdout\": \"3\\n\"}\n")
            .unwrap()
            .into();
        assert!(outcome.succeeded());
        assert_eq!(outcome.stdout, "3\n");
    }

    #[test]
    fn test_decode_failure_reply() {
        let line = r#"{"ok": false, "stdout": "", "ename": "AssertionError", "evalue": "", "traceback": "Traceback (most recent call last):\nAssertionError\n"}"#;
        let outcome: CellOutcome = decode_reply(line).unwrap().into();
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.ename, "AssertionError");
        assert!(failure.detail().starts_with("Traceback"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_reply("not json"), Err(KernelError::Protocol(_))));
    }

    #[test]
    fn test_failure_detail_without_traceback() {
        let outcome = CellOutcome::raised("ValueError", "bad input", "");
        assert_eq!(outcome.failure.unwrap().detail(), "ValueError: bad input");
    }

    #[test]
    fn test_outcome_outputs() {
        assert!(CellOutcome::success("").outputs().is_empty());

        let mut outcome = CellOutcome::raised("NameError", "name 'x' is not defined", "tb");
        outcome.stdout = "partial\n".to_string();
        let outputs = outcome.outputs();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0]["output_type"], "stream");
        assert_eq!(outputs[1]["ename"], "NameError");
    }

    /// In-memory channel replaying canned reply lines
    struct Replay {
        sent: Vec<String>,
        replies: Vec<String>,
    }

    impl BridgeChannel for Replay {
        async fn send(&mut self, line: &str) -> Result<(), KernelError> {
            self.sent.push(line.to_string());
            Ok(())
        }

        async fn recv(&mut self) -> Result<String, KernelError> {
            if self.replies.is_empty() {
                return Err(KernelError::Closed);
            }
            Ok(self.replies.remove(0))
        }
    }

    #[tokio::test]
    async fn test_bridge_info_and_execute() {
        let mut channel = Replay {
            sent: Vec::new(),
            replies: vec![
                "{\"ok\": true, \"python_version\": \"3.12.1\", \"platform\": \"Linux\"}\n".to_string(),
                "{\"ok\": true, \"stdout\": \"hi\\n\"}\n".to_string(),
            ],
        };
        let timeout = Duration::from_secs(1);

        let info = bridge_info(&mut channel, timeout).await.unwrap();
        assert_eq!(info.python_version, "3.12.1");
        assert_eq!(info.platform, "Linux");

        let outcome = bridge_execute(&mut channel, "print('hi')", timeout).await.unwrap();
        assert_eq!(outcome.stdout, "hi\n");
        assert_eq!(channel.sent.len(), 2);

        assert!(matches!(
            bridge_execute(&mut channel, "x", timeout).await,
            Err(KernelError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_guard_remove_now_disarms_even_when_daemon_unreachable() {
        let docker = Docker::connect_with_http("http://127.0.0.1:9", 1, bollard::API_DEFAULT_VERSION)
            .unwrap();
        let mut guard = ContainerGuard::new(&docker, "gradebook-missing".to_string());

        guard.remove_now().await;
        assert!(!guard.armed);

        // A second call is a no-op and dropping spawns nothing
        guard.remove_now().await;
        drop(guard);
    }

    #[tokio::test]
    async fn test_oversized_cell_rejected() {
        let mut channel = Replay {
            sent: Vec::new(),
            replies: Vec::new(),
        };
        let source = "x".repeat(MAX_CELL_SOURCE_BYTES + 1);
        assert!(matches!(
            bridge_execute(&mut channel, &source, Duration::from_secs(1)).await,
            Err(KernelError::SourceTooLarge(_))
        ));
        assert!(channel.sent.is_empty());
    }
}
