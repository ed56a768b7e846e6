//! Bounded execution of external tools (git, uv, ruff, black, mypy).

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Why a tool could not produce output.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{program} not found on PATH")]
    NotFound { program: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },
}

/// Runs external programs. Swapped for a fake in tests.
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[String], cwd: Option<&Path>)
    -> Result<ToolOutput, ToolError>;

    /// Whether `program` can be found on `PATH`.
    fn available(&self, program: &str) -> bool;
}

/// Runs real subprocesses, killing any that outlive the timeout.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    pub timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

impl ToolRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> Result<ToolOutput, ToolError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ToolError::NotFound {
                program: program.to_string(),
            },
            _ => ToolError::Spawn {
                program: program.to_string(),
                source,
            },
        })?;

        // Pipes must be drained while polling or a full pipe stalls the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if start.elapsed() > self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    log::warn!("{program} killed after {:?}", self.timeout);
                    return Err(ToolError::Timeout {
                        program: program.to_string(),
                        secs: self.timeout.as_secs(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    return Err(ToolError::Spawn {
                        program: program.to_string(),
                        source,
                    });
                }
            }
        };

        Ok(ToolOutput {
            success: status.success(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }

    fn available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
