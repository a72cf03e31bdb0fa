//! Upload scheduler
//!
//! Decides, per artifact and build fingerprint, whether an upload is
//! required and drives the transport call. Transfers run on detached
//! worker threads; a failed transfer is logged and swallowed so it never
//! blocks or fails sibling transfers.
//!
//! The fingerprint is recorded before the transfer is attempted. This is a
//! deliberate at-most-once-per-fingerprint policy: a failed upload is not
//! retried on the next build carrying the same fingerprint.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::events::{EventSink, SyncEvent};
use crate::transport::Transport;

use super::cache::FingerprintCache;
use super::BuildOutcome;

/// An in-flight artifact transfer
///
/// Dropping the handle detaches the worker; the transfer still runs to
/// completion or failure. [`TransferHandle::settle`] is the single join
/// point, used only for the bootstrap batch before disposal.
pub struct TransferHandle {
    handle: JoinHandle<()>,
}

impl TransferHandle {
    /// Wait for the transfer to settle, successfully or not
    pub fn settle(self) {
        let _ = self.handle.join();
    }
}

/// Schedules artifact transfers against the fingerprint cache
pub struct UploadScheduler {
    cache: FingerprintCache,
    /// Local build output root
    output_root: PathBuf,
    /// Remote upload root
    upload_root: String,
    transport: Arc<dyn Transport>,
    sink: EventSink,
}

impl UploadScheduler {
    pub fn new(
        output_root: PathBuf,
        upload_root: String,
        transport: Arc<dyn Transport>,
        sink: EventSink,
    ) -> Self {
        Self {
            cache: FingerprintCache::new(),
            output_root,
            upload_root,
            transport,
            sink,
        }
    }

    /// Transfer the artifact unless it is unchanged since the last sync
    ///
    /// Returns `None` when the cached fingerprint matches the build's.
    pub fn consider_upload(
        &mut self,
        artifact: &str,
        outcome: &BuildOutcome,
    ) -> Option<TransferHandle> {
        if self.cache.lookup(artifact) == Some(outcome.full_hash.as_str()) {
            return None;
        }
        self.cache.record(artifact, &outcome.full_hash);
        Some(self.transfer(artifact))
    }

    /// Dispatch an unconditional transfer on a worker thread
    pub fn transfer(&self, artifact: &str) -> TransferHandle {
        (self.sink)(SyncEvent::UploadStarted {
            artifact: artifact.to_string(),
        });

        let local = self.output_root.join(artifact);
        let remote = self.remote_path(artifact);
        let transport = self.transport.clone();
        let sink = self.sink.clone();
        let artifact = artifact.to_string();

        let handle = thread::spawn(move || match transport.put_file(&local, &remote) {
            Ok(()) => sink(SyncEvent::UploadComplete { artifact }),
            Err(e) => sink(SyncEvent::UploadError {
                artifact,
                message: e.to_string(),
            }),
        });

        TransferHandle { handle }
    }

    fn remote_path(&self, artifact: &str) -> String {
        format!(
            "{}/{}",
            self.upload_root.trim_end_matches('/'),
            artifact.trim_start_matches('/')
        )
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &FingerprintCache {
        &self.cache
    }
}
