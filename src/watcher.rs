//! Build output watcher
//!
//! Plays the host-build-tool role for standalone use: watches the build
//! output directory with `notify`, groups debounced filesystem changes
//! into build cycles, fingerprints each cycle with sha256, and translates
//! cycles into the engine's two lifecycle notifications.
//!
//! This module is the only place aware of filesystem-event vocabulary;
//! the engine just sees `asset_emitted` and `build_done`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};

use crate::engine::{BuildOutcome, SessionController};
use crate::error::{FerryError, FerryResult};
use crate::events::{EventSink, SyncEvent};

/// Debounce duration in milliseconds
pub const DEBOUNCE_MS: u64 = 100;

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Build output directory to watch
    pub source: PathBuf,
}

impl WatchOptions {
    pub fn new(source: PathBuf) -> Self {
        Self { source }
    }
}

/// Watcher state for debouncing
#[derive(Debug, Default)]
pub(crate) struct WatcherState {
    pending_changes: HashSet<PathBuf>,
    last_change: Option<Instant>,
}

impl WatcherState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_change(&mut self, path: PathBuf) {
        self.pending_changes.insert(path);
        self.last_change = Some(Instant::now());
    }

    /// Debounce period elapsed with pending changes
    pub(crate) fn should_flush(&self) -> bool {
        if let Some(last) = self.last_change {
            !self.pending_changes.is_empty() && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS)
        } else {
            false
        }
    }

    pub(crate) fn take_changes(&mut self) -> Vec<PathBuf> {
        let changes: Vec<_> = self.pending_changes.drain().collect();
        self.last_change = None;
        changes
    }
}

/// Watch the output directory and sync continuously until `running` clears
///
/// The initial directory scan counts as the first build cycle; it flows
/// through both the per-asset path and the bootstrap on build-done,
/// matching a watch-mode build tool's first compile.
pub fn watch(
    options: &WatchOptions,
    controller: &mut SessionController,
    running: Arc<AtomicBool>,
    sink: EventSink,
) -> FerryResult<()> {
    sink(SyncEvent::WatchStarted {
        source: options.source.display().to_string(),
    });

    // First build cycle: everything currently in the output directory.
    let initial = scan_artifacts(&options.source)?;
    let outcome = build_outcome(&options.source, &initial, true)?;
    for artifact in &outcome.emitted {
        controller.asset_emitted(artifact, &outcome);
    }
    controller.build_done(&outcome);

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|e| FerryError::Io(std::io::Error::other(e.to_string())))?;

    watcher
        .watch(&options.source, RecursiveMode::Recursive)
        .map_err(|e| FerryError::Io(std::io::Error::other(e.to_string())))?;

    let mut state = WatcherState::new();
    while running.load(Ordering::SeqCst) {
        if let Ok(path) = rx.recv_timeout(Duration::from_millis(50)) {
            if path.is_file() && path.starts_with(&options.source) {
                state.add_change(path);
            }
        }

        if state.should_flush() {
            // Files may have vanished between the event and the flush.
            let changed: Vec<PathBuf> = state
                .take_changes()
                .into_iter()
                .filter(|p| p.is_file())
                .collect();
            if !changed.is_empty() {
                flush_cycle(&options.source, &changed, controller, &sink);
            }
        }
    }

    sink(SyncEvent::Shutdown);
    Ok(())
}

/// Run one debounced batch of changes through the engine as a build cycle
///
/// Build tools write-then-rename, so a file can still vanish between the
/// change event and the content read. A cycle that fails to fingerprint
/// is logged through the sink and skipped; it never terminates the watch
/// session.
fn flush_cycle(
    source: &Path,
    changed: &[PathBuf],
    controller: &mut SessionController,
    sink: &EventSink,
) {
    let outcome = match build_outcome(source, changed, true) {
        Ok(outcome) => outcome,
        Err(e) => {
            sink(SyncEvent::Error {
                message: e.to_string(),
            });
            return;
        }
    };

    sink(SyncEvent::BuildDetected {
        artifacts: outcome.emitted.len(),
    });
    for artifact in &outcome.emitted {
        controller.asset_emitted(artifact, &outcome);
    }
    controller.build_done(&outcome);
}

/// One-shot sync: scan the output directory once and report a completed
/// non-continuous build, letting the bootstrap upload everything and then
/// dispose the connection.
pub fn sync_once(options: &WatchOptions, controller: &mut SessionController) -> FerryResult<()> {
    let artifacts = scan_artifacts(&options.source)?;
    let outcome = build_outcome(&options.source, &artifacts, false)?;
    controller.build_done(&outcome);
    Ok(())
}

/// Collect all files under the output directory
fn scan_artifacts(source: &Path) -> FerryResult<Vec<PathBuf>> {
    if !source.is_dir() {
        return Err(FerryError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("output directory not found: {}", source.display()),
        )));
    }
    let mut files = Vec::new();
    collect_files(source, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> FerryResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

/// Fingerprint a set of changed files into one build outcome
///
/// The cycle fingerprint hashes the sorted (artifact, content-hash) pairs,
/// so any content change anywhere in the set produces a new fingerprint.
fn build_outcome(source: &Path, changed: &[PathBuf], watching: bool) -> FerryResult<BuildOutcome> {
    let mut pairs: Vec<(String, String)> = Vec::with_capacity(changed.len());
    for path in changed {
        let artifact = artifact_id(source, path);
        let content = std::fs::read(path)?;
        pairs.push((artifact, content_hash(&content)));
    }
    pairs.sort();

    let mut hasher = Sha256::new();
    for (artifact, hash) in &pairs {
        hasher.update(artifact.as_bytes());
        hasher.update(b":");
        hasher.update(hash.as_bytes());
        hasher.update(b"\n");
    }
    let full_hash = format!("{:x}", hasher.finalize());

    let emitted = pairs.into_iter().map(|(artifact, _)| artifact).collect();
    Ok(BuildOutcome::new(full_hash, emitted, watching))
}

/// Relative identifier for an artifact under the output root
fn artifact_id(source: &Path, path: &Path) -> String {
    path.strip_prefix(source)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
