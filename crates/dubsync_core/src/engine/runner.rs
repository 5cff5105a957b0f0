//! Blocking process runner with timeout and cancellation.
//!
//! The child is polled rather than waited on so that a cancellation
//! request or an expired timeout can kill it mid-flight. Stdout and stderr
//! are drained on helper threads to keep the pipes from filling up.

use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::orchestrator::CancelHandle;

use super::types::{CommandOutput, EngineError, EngineResult};

/// How often a running child is checked for exit/cancel/timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs external commands and captures their output.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Runner without a time limit.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Runner that kills the child after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Build a runner from a seconds value where `0` means unbounded.
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::new()
        } else {
            Self::with_timeout(Duration::from_secs(secs))
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `program` with `args`, returning its captured output.
    ///
    /// A non-zero exit is *not* an error here; the caller decides. Spawn
    /// failures, timeouts and cancellation are.
    pub fn run<I, S>(
        &self,
        program: &Path,
        args: I,
        cancel: &CancelHandle,
    ) -> EngineResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let tool = tool_name(program);

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled { tool });
        }

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        tracing::debug!("Running: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| EngineError::spawn(&tool, e))?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    terminate(&mut child);
                    return Err(EngineError::io(format!("waiting for {}", tool), e));
                }
            }

            if cancel.is_cancelled() {
                terminate(&mut child);
                tracing::debug!("{} killed after cancellation", tool);
                return Err(EngineError::Cancelled { tool });
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    terminate(&mut child);
                    return Err(EngineError::Timeout {
                        tool,
                        seconds: limit.as_secs_f64(),
                    });
                }
            }

            thread::sleep(POLL_INTERVAL);
        };

        Ok(CommandOutput {
            stdout: collect(stdout),
            stderr: collect(stderr),
            exit_code: status.code().unwrap_or(-1),
        })
    }
}

/// Short tool name for messages (`/usr/bin/ffmpeg` -> `ffmpeg`).
pub fn tool_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| program.display().to_string())
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = reader.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
        .unwrap_or_default()
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
