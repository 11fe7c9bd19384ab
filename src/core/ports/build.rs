//! Build invocation port
//!
//! Defines the interface for starting the external build tool and the
//! handle through which its output is observed.
//!
//! The invocation runs in the background and reports over a channel:
//! zero or more [`BuildEvent::Output`] chunks followed by one
//! [`BuildEvent::Exited`]. [`BuildHandle`] owns the receiving end and the
//! accumulated buffer, so the buffer has one writer and one reader and only
//! ever grows.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::models::BuildRequest;

/// The build tool could not be started
///
/// Fatal: no output buffer exists and the run is aborted.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The process failed to spawn
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// Program that was launched
        program: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The variables payload could not be encoded
    #[error("failed to encode build variables: {0}")]
    Vars(#[from] serde_json::Error),
}

/// A message from a running invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// More combined stdout/stderr text
    Output(String),
    /// The invocation finished
    Exited {
        /// Whether the tool reported success
        success: bool,
    },
}

/// Final result of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Whether the tool reported success
    pub success: bool,
    /// Full captured output
    pub log: String,
}

/// Live view of one invocation
#[derive(Debug)]
pub struct BuildHandle {
    events: mpsc::Receiver<BuildEvent>,
    buffer: String,
    exit: Option<bool>,
}

impl BuildHandle {
    /// Wrap the receiving end of an invocation's event channel
    #[must_use]
    pub const fn new(events: mpsc::Receiver<BuildEvent>) -> Self {
        Self {
            events,
            buffer: String::new(),
            exit: None,
        }
    }

    /// Whether the invocation has not reported its exit yet
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.exit.is_none()
    }

    /// Output accumulated so far
    #[must_use]
    pub fn snapshot(&self) -> &str {
        &self.buffer
    }

    /// Wait for the next event
    ///
    /// Cancel-safe. Returns `None` once the channel is closed.
    pub async fn next_event(&mut self) -> Option<BuildEvent> {
        self.events.recv().await
    }

    /// Fold an event (or channel closure) into the handle
    ///
    /// A channel that closes without an exit event counts as a failure.
    /// Output after the exit event is still appended.
    pub fn apply(&mut self, event: Option<BuildEvent>) {
        match event {
            Some(BuildEvent::Output(chunk)) => self.buffer.push_str(&chunk),
            Some(BuildEvent::Exited { success }) => {
                self.exit.get_or_insert(success);
            },
            None => {
                if self.exit.is_none() {
                    log::warn!("Build event channel closed without an exit status");
                    self.exit = Some(false);
                }
            },
        }
    }

    /// Receive and apply one event
    pub async fn pump(&mut self) {
        let event = self.next_event().await;
        self.apply(event);
    }

    /// Drain remaining events and return the final result
    pub async fn wait(mut self) -> BuildOutcome {
        while self.is_running() {
            self.pump().await;
        }
        self.into_outcome()
    }

    /// The final result, once the invocation has exited
    #[must_use]
    pub fn outcome(&self) -> Option<BuildOutcome> {
        self.exit.map(|success| BuildOutcome {
            success,
            log: self.buffer.clone(),
        })
    }

    /// Consume the handle; still running counts as failure
    #[must_use]
    pub fn into_outcome(self) -> BuildOutcome {
        BuildOutcome {
            success: self.exit.unwrap_or(false),
            log: self.buffer,
        }
    }
}

/// Starts build invocations
///
/// Implementations spawn the work in the background and return at once.
/// Must be called from within a tokio runtime.
pub trait BuildInvoker: Send + Sync {
    /// Start one invocation
    fn start(&self, request: &BuildRequest) -> Result<BuildHandle, InvocationError>;
}
