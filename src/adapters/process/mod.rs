//! Child-process build adapter
//!
//! Implements `BuildInvoker` by spawning the build tool with
//! `tokio::process::Command`. A supervisor task forwards stdout and stderr
//! line by line over the event channel, waits for the child, and sends the
//! exit status last. There is no kill path: once started, the child runs to
//! completion or external termination.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::core::models::BuildRequest;
use crate::core::ports::{BuildEvent, BuildHandle, BuildInvoker, InvocationError};

/// Events buffered between the child and the runner
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Runs the build tool as a child process
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    /// Executable (name on `PATH` or full path)
    program: PathBuf,
}

impl ProcessInvoker {
    /// Create an invoker for the given executable
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl BuildInvoker for ProcessInvoker {
    fn start(&self, request: &BuildRequest) -> Result<BuildHandle, InvocationError> {
        let args = request.to_args()?;
        log::debug!("Starting {} {}", self.program.display(), args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if request.project_dir.is_dir() {
            command.current_dir(&request.project_dir);
        }

        let mut child = command.spawn().map_err(|source| InvocationError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let operation = request.operation.to_string();

        tokio::spawn(async move {
            let readers = [
                stdout.map(|s| tokio::spawn(forward_lines(s, tx.clone()))),
                stderr.map(|s| tokio::spawn(forward_lines(s, tx.clone()))),
            ];

            let success = match child.wait().await {
                Ok(status) => {
                    log::debug!("{operation} exited with {status}");
                    status.success()
                },
                Err(e) => {
                    log::error!("Failed waiting for {operation}: {e}");
                    false
                },
            };

            // Drain both pipes before reporting the exit
            for reader in readers.into_iter().flatten() {
                if let Err(e) = reader.await {
                    log::warn!("Output reader for {operation} failed: {e}");
                }
            }

            let _ = tx.send(BuildEvent::Exited { success }).await;
        });

        Ok(BuildHandle::new(rx))
    }
}

/// Forward each line of `reader` as an output event
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<BuildEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(BuildEvent::Output(format!("{line}\n"))).await.is_err() {
                    break;
                }
            },
            Ok(None) => break,
            Err(e) => {
                log::warn!("Stopped reading build output: {e}");
                break;
            },
        }
    }
}
