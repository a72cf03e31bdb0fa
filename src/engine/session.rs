//! Session controller
//!
//! Owns the connection lifecycle: credential validation, connect, the
//! one-time bootstrap upload of the first build's artifacts, and disposal
//! once a one-shot build's batch has settled.

use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, Mode};
use crate::events::{EventSink, SyncEvent};
use crate::transport::{Connector, Transport};

use super::scheduler::UploadScheduler;
use super::{BuildOutcome, MANIFEST_FILE};

/// Connection lifecycle states
///
/// `Unconnected → Connecting → Connected → Disposed`; there is no
/// transition out of `Disposed`. Validation or connect failure returns the
/// session to `Unconnected` without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connecting,
    Connected,
    Disposed,
}

/// Drives a sync session from build notifications
///
/// The controller owns the transport handle exclusively and lends it to
/// the upload scheduler for issuing transfers. All failures are reported
/// through the event sink; none interrupt the host build.
pub struct SessionController {
    config: Config,
    connector: Box<dyn Connector>,
    sink: EventSink,
    state: SessionState,
    bootstrap_done: bool,
    transport: Option<Arc<dyn Transport>>,
    scheduler: Option<UploadScheduler>,
}

impl SessionController {
    pub fn new(config: Config, connector: Box<dyn Connector>, sink: EventSink) -> Self {
        Self {
            config,
            connector,
            sink,
            state: SessionState::Unconnected,
            bootstrap_done: false,
            transport: None,
            scheduler: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn bootstrap_done(&self) -> bool {
        self.bootstrap_done
    }

    /// Start the session: mode gate, credential validation, connect
    ///
    /// Outside development mode the controller stays inert and only logs a
    /// mode warning. Validation failure logs one config warning per
    /// missing field and skips the connect attempt entirely. On entering
    /// `Connected`, the preview domain is opened once, fire-and-forget,
    /// when configured.
    pub fn start(&mut self, output_root: &Path) {
        if self.config.mode != Mode::Development {
            (self.sink)(SyncEvent::ModeWarning {
                mode: self.config.mode.as_str().to_string(),
            });
            return;
        }

        let missing = self.config.connection.missing_fields();
        if !missing.is_empty() {
            for field in missing {
                (self.sink)(SyncEvent::ConfigWarning {
                    field: field.to_string(),
                });
            }
            return;
        }

        if self.config.connection.passphrase_only() {
            (self.sink)(SyncEvent::AuthWarning {
                message: "passphrase-only authentication relies on an ssh-agent held key; \
                          ssh runs in batch mode and will not prompt"
                    .to_string(),
            });
        }

        self.state = SessionState::Connecting;
        match self.connector.connect(&self.config.connection) {
            Ok(transport) => {
                self.scheduler = Some(UploadScheduler::new(
                    output_root.to_path_buf(),
                    self.config.upload.path.clone(),
                    transport.clone(),
                    self.sink.clone(),
                ));
                self.transport = Some(transport);
                self.state = SessionState::Connected;
                (self.sink)(SyncEvent::Connected {
                    host: self.config.connection.host.clone(),
                });
                self.open_preview();
            }
            Err(e) => {
                self.state = SessionState::Unconnected;
                (self.sink)(SyncEvent::ConnectionError {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Per-artifact notification from a continuous watch build
    ///
    /// Forwarded to the scheduler's cache decision; the resulting transfer
    /// runs detached. Notifications arriving while the session is not
    /// connected are dropped with a logged warning.
    pub fn asset_emitted(&mut self, artifact: &str, outcome: &BuildOutcome) {
        if self.state != SessionState::Connected {
            (self.sink)(SyncEvent::UploadError {
                artifact: artifact.to_string(),
                message: "session not connected, dropping".to_string(),
            });
            return;
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            // Dropping the handle detaches the transfer.
            let _ = scheduler.consider_upload(artifact, outcome);
        }
    }

    /// Build-done notification, fired once per completed build cycle
    ///
    /// The manifest (when enabled) uploads on every build-done. The first
    /// build-done additionally uploads every emitted artifact (the
    /// bootstrap); afterwards, incremental uploads are driven exclusively
    /// by [`Self::asset_emitted`]. A one-shot build disposes the
    /// connection after the whole batch settles, successfully or not.
    pub fn build_done(&mut self, outcome: &BuildOutcome) {
        if self.state != SessionState::Connected {
            return;
        }
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };

        let mut batch = Vec::new();
        if self.config.upload.manifest {
            batch.push(scheduler.transfer(MANIFEST_FILE));
        }

        if !self.bootstrap_done {
            for artifact in &outcome.emitted {
                batch.push(scheduler.transfer(artifact));
            }
            self.bootstrap_done = true;

            if !outcome.watching {
                for handle in batch {
                    handle.settle();
                }
                self.dispose();
                return;
            }
        }
        // Post-bootstrap batches (manifest only) are fire-and-forget.
    }

    fn open_preview(&self) {
        if !self.config.preview.open {
            return;
        }
        if let Some(domain) = &self.config.preview.domain {
            // Best-effort; a missing browser must not affect the session.
            let _ = open::that_detached(format!("https://{domain}"));
        }
    }

    fn dispose(&mut self) {
        if let Some(transport) = &self.transport {
            if let Err(e) = transport.dispose() {
                (self.sink)(SyncEvent::ConnectionError {
                    message: e.to_string(),
                });
            }
        }
        self.state = SessionState::Disposed;
        (self.sink)(SyncEvent::Disposed);
    }
}
