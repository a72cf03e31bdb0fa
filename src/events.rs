//! Sync event types
//!
//! Every observable action of the engine is reported through a
//! [`SyncEvent`] pushed into an [`EventSink`] callback. The binary renders
//! events as human-readable lines or NDJSON for CI; the engine itself never
//! prints. Each message category is distinguishable by the serde tag.

use std::sync::Arc;

/// Event sink callback shared with transfer worker threads
pub type EventSink = Arc<dyn Fn(SyncEvent) + Send + Sync>;

/// Events emitted during a sync session, NDJSON-serializable
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Connected to the remote host
    Connected { host: String },
    /// Transport-level connect failure; session stays unconnected
    ConnectionError { message: String },
    /// A required connection field is missing; one event per field
    ConfigWarning { field: String },
    /// Engine invoked outside development mode; logged no-op
    ModeWarning { mode: String },
    /// Credentials validate but can only authenticate through an agent
    AuthWarning { message: String },
    /// Artifact transfer dispatched
    UploadStarted { artifact: String },
    /// Artifact transfer finished successfully
    UploadComplete { artifact: String },
    /// Artifact transfer failed; contained, siblings unaffected
    UploadError { artifact: String, message: String },
    /// Connection disposed after a one-shot build settled
    Disposed,
    /// Watch loop started
    WatchStarted { source: String },
    /// A build cycle was detected with the given changed artifacts
    BuildDetected { artifacts: usize },
    /// A build cycle failed before any transfer was dispatched; the
    /// watch session continues
    Error { message: String },
    /// Watch loop stopped
    Shutdown,
}

impl SyncEvent {
    /// Convert to a single NDJSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Sink that discards every event (quiet library use and tests)
pub fn null_sink() -> EventSink {
    Arc::new(|_| {})
}
