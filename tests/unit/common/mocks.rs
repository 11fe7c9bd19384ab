//! Mock implementations of port traits for testing
//!
//! These mocks replay synthetic event sequences instead of launching a
//! real build tool.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use snowball::core::models::{BuildRequest, ProgressSnapshot};
use snowball::core::ports::{
    BuildEvent, BuildHandle, BuildInvoker, InvocationError, ProgressReporter,
};
use tokio::sync::mpsc;

/// What a scripted operation emits
#[derive(Debug, Clone)]
pub struct Script {
    /// Output chunks, sent in order
    pub chunks: Vec<String>,
    /// Exit status sent last
    pub success: bool,
}

impl Script {
    pub fn ok(chunks: Vec<String>) -> Self {
        Self { chunks, success: true }
    }

    pub fn failing(chunks: Vec<String>) -> Self {
        Self { chunks, success: false }
    }
}

/// Replays a script per operation keyword from a background task
pub struct ScriptedInvoker {
    scripts: HashMap<String, Script>,
    delay: Duration,
    requests: Mutex<Vec<BuildRequest>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script the operation with this keyword (`run`, `compile`, `run-operation`)
    pub fn with(mut self, keyword: &str, script: Script) -> Self {
        self.scripts.insert(keyword.to_string(), script);
        self
    }

    /// Pause between chunks
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Requests started so far
    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl BuildInvoker for ScriptedInvoker {
    fn start(&self, request: &BuildRequest) -> Result<BuildHandle, InvocationError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self
            .scripts
            .get(request.operation.keyword())
            .cloned()
            .unwrap_or_else(|| Script::ok(Vec::new()));
        let delay = self.delay;

        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for chunk in script.chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(BuildEvent::Output(chunk)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(BuildEvent::Exited { success: script.success }).await;
        });
        Ok(BuildHandle::new(rx))
    }
}

/// Always fails to start
pub struct BrokenInvoker;

impl BuildInvoker for BrokenInvoker {
    fn start(&self, _request: &BuildRequest) -> Result<BuildHandle, InvocationError> {
        Err(InvocationError::Spawn {
            program: "dbt".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    }
}

/// Records every snapshot it receives
#[derive(Default)]
pub struct RecordingReporter {
    pub snapshots: Vec<ProgressSnapshot>,
    pub finished: usize,
}

impl ProgressReporter for RecordingReporter {
    fn update(&mut self, snapshot: &ProgressSnapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        self.finished += 1;
        self.update(snapshot);
    }
}
