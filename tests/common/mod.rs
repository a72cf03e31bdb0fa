//! Shared test doubles for the engine integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ferry::config::ConnectionConfig;
use ferry::error::{FerryError, FerryResult};
use ferry::events::{EventSink, SyncEvent};
use ferry::transport::{Connector, Transport};

/// Transport that records every put and can simulate failures
#[derive(Default)]
pub struct RecordingTransport {
    pub puts: Mutex<Vec<(PathBuf, String)>>,
    pub fail_remote_containing: Mutex<Option<String>>,
    pub disposals: AtomicUsize,
}

impl RecordingTransport {
    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn remote_paths(&self) -> Vec<String> {
        self.puts.lock().unwrap().iter().map(|p| p.1.clone()).collect()
    }

    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }

    pub fn fail_when_remote_contains(&self, needle: &str) {
        *self.fail_remote_containing.lock().unwrap() = Some(needle.to_string());
    }
}

impl Transport for RecordingTransport {
    fn put_file(&self, local: &Path, remote: &str) -> FerryResult<()> {
        self.puts
            .lock()
            .unwrap()
            .push((local.to_path_buf(), remote.to_string()));
        if let Some(needle) = self.fail_remote_containing.lock().unwrap().as_ref() {
            if remote.contains(needle.as_str()) {
                return Err(FerryError::Transfer {
                    artifact: remote.to_string(),
                    message: "simulated failure".to_string(),
                });
            }
        }
        Ok(())
    }

    fn dispose(&self) -> FerryResult<()> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector counting attempts and handing out a shared transport
pub struct RecordingConnector {
    pub transport: Arc<RecordingTransport>,
    pub attempts: Arc<AtomicUsize>,
}

impl RecordingConnector {
    pub fn new(transport: Arc<RecordingTransport>) -> Self {
        Self {
            transport,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Connector for RecordingConnector {
    fn connect(&self, _config: &ConnectionConfig) -> FerryResult<Arc<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(self.transport.clone())
    }
}

/// Sink collecting every event for later assertions
pub fn recording_sink() -> (EventSink, Arc<Mutex<Vec<SyncEvent>>>) {
    let events: Arc<Mutex<Vec<SyncEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let clone = events.clone();
    (Arc::new(move |e| clone.lock().unwrap().push(e)), events)
}

/// Artifacts for which an upload was dispatched, in dispatch order
pub fn upload_starts(events: &Arc<Mutex<Vec<SyncEvent>>>) -> Vec<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            SyncEvent::UploadStarted { artifact } => Some(artifact.clone()),
            _ => None,
        })
        .collect()
}

/// A development-mode config with valid credentials
pub fn dev_config() -> ferry::Config {
    let mut config = ferry::Config::default();
    config.connection = ConnectionConfig {
        host: "example.com".to_string(),
        port: Some(22),
        username: "deploy".to_string(),
        passphrase: None,
        private_key: Some(PathBuf::from("/home/dev/.ssh/id_ed25519")),
    };
    config.upload.path = "/srv/app/public".to_string();
    config
}
