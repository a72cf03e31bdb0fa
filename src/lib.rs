//! Ferry - build artifact synchronization over SSH
//!
//! Ferry watches a build output directory and uploads new or changed
//! artifacts to a remote host as soon as they are produced. The engine is
//! incremental: each artifact is fingerprinted per build cycle and only
//! transferred when its fingerprint changes, with per-artifact error
//! containment so one failed upload never blocks its siblings.

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod transport;
pub mod watcher;

// Re-exports for convenience
pub use config::{Config, ConnectionConfig, Mode};
pub use engine::{
    BuildOutcome, FingerprintCache, SessionController, SessionState, UploadScheduler,
    MANIFEST_FILE,
};
pub use error::{FerryError, FerryResult};
pub use events::{EventSink, SyncEvent};
pub use transport::{Connector, SshConnector, SshTransport, Transport};
pub use watcher::{sync_once, watch, WatchOptions};
