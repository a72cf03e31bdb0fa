//! Incremental synchronization engine
//!
//! The engine decides which produced artifacts are new or changed, when to
//! transfer them, and how to sequence transfers against the connection
//! lifecycle. It is driven by two notifications from the host build
//! process (in the standalone binary, the `watcher` module):
//!
//! - `asset_emitted(artifact, outcome)` — per artifact written to the
//!   output directory, only in continuous watch mode
//! - `build_done(outcome)` — once per completed build cycle
//!
//! ## Architecture
//!
//! - [`FingerprintCache`] — artifact → last-synced build fingerprint
//! - [`UploadScheduler`] — skip-or-transfer decision and per-artifact
//!   error containment
//! - [`SessionController`] — connection lifecycle, one-time bootstrap
//!   upload, disposal

mod cache;
mod scheduler;
mod session;

pub use cache::FingerprintCache;
pub use scheduler::{TransferHandle, UploadScheduler};
pub use session::{SessionController, SessionState};

/// Well-known manifest file uploaded on every completed build when enabled
pub const MANIFEST_FILE: &str = "mix-manifest.json";

/// Outcome of one build cycle, produced by the host build process
///
/// `full_hash` is an opaque fingerprint of the cycle's output; two cycles
/// with the same fingerprint are assumed to have produced identical
/// artifact content.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub full_hash: String,
    /// Relative paths of artifacts written during this cycle
    pub emitted: Vec<String>,
    /// True when the build process stays alive and rebuilds on changes
    pub watching: bool,
}

impl BuildOutcome {
    pub fn new(full_hash: impl Into<String>, emitted: Vec<String>, watching: bool) -> Self {
        Self {
            full_hash: full_hash.into(),
            emitted,
            watching,
        }
    }
}
