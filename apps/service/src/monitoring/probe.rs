use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;

use super::types::ProbeOutput;
use super::validation::Target;
use crate::error::Error;

/// Extra time granted on top of the ping deadline before the process is killed.
const DEADLINE_GRACE: Duration = Duration::from_secs(5);

/// One measurement round against a target.
///
/// A failing probe process is not an error at this layer: partial or total
/// loss still produces text worth parsing, so it is reported through
/// [`ProbeOutput::success`] instead.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn run_round(&self, target: &Target, count: u32) -> ProbeOutput;
}

/// Probe backed by the system `ping` binary.
pub struct PingProbe {
    program: String,
    grace: Duration,
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PingProbe {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    /// Use a different executable with ping-compatible arguments.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into(), grace: DEADLINE_GRACE }
    }

    /// Change the time allowed past `count` seconds before the process is killed.
    pub fn with_deadline_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Arguments for one round, including the platform deadline flag.
    fn args(target: &Target, count: u32) -> Vec<String> {
        let mut args = vec!["-c".to_string(), count.to_string()];

        // Linux: -w is a deadline for the whole run. macOS: -t is the timeout
        // in seconds before ping exits. Elsewhere we rely on the outer timeout.
        if cfg!(target_os = "linux") {
            args.extend(["-w".to_string(), count.to_string()]);
        } else if cfg!(target_os = "macos") {
            args.extend(["-t".to_string(), count.to_string()]);
        }

        args.push(target.as_str().to_string());
        args
    }

    async fn spawn(&self, target: &Target, count: u32) -> Result<ProbeOutput, Error> {
        let deadline = Duration::from_secs(u64::from(count)) + self.grace;

        let mut child = Command::new(&self.program)
            .args(Self::args(target, count))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProbeExecution {
                reason: format!("failed to spawn {}: {}", self.program, e),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        // The buffers outlive the timeout, so a killed round keeps what it printed.
        let finished = timeout(deadline, async {
            let (out, err) =
                tokio::join!(drain(stdout, &mut stdout_buf), drain(stderr, &mut stderr_buf));
            out?;
            err?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(status)
        })
        .await;

        let status = match finished {
            Ok(status) => Some(status.map_err(|e| Error::ProbeExecution {
                reason: format!("failed to collect {} output: {}", self.program, e),
            })?),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill {}: {}", self.program, e);
                }
                None
            }
        };

        let mut text = String::from_utf8_lossy(&stdout_buf).into_owned();
        text.push_str(&String::from_utf8_lossy(&stderr_buf));

        let (success, error) = match status {
            Some(status) if status.success() => (true, None),
            Some(status) => (false, Some(format!("{} exited with {}", self.program, status))),
            None => (false, Some(format!("{} did not finish within {:?}", self.program, deadline))),
        };

        Ok(ProbeOutput::completed(text, success, error))
    }
}

/// Append everything `pipe` yields to `buf`, one read at a time.
async fn drain(pipe: Option<impl AsyncRead + Unpin>, buf: &mut Vec<u8>) -> std::io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };

    let mut chunk = [0u8; 1024];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[async_trait::async_trait]
impl Probe for PingProbe {
    async fn run_round(&self, target: &Target, count: u32) -> ProbeOutput {
        match self.spawn(target, count).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Probe round against {} produced no output: {}", target, e);
                ProbeOutput::unavailable(e.to_string())
            }
        }
    }
}
