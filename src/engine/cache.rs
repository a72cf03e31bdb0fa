//! Change fingerprint store
//!
//! In-memory map from artifact identifier to the build fingerprint it was
//! last synchronized under. Pure data, no I/O. Records are created lazily
//! on first observation and live for the session.

use std::collections::HashMap;

/// Artifact → last-synced build fingerprint
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: HashMap<String, String>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint the artifact was last synced under, if any
    pub fn lookup(&self, artifact: &str) -> Option<&str> {
        self.entries.get(artifact).map(String::as_str)
    }

    /// Record the fingerprint for an artifact, replacing any previous one
    pub fn record(&mut self, artifact: &str, fingerprint: &str) {
        self.entries
            .insert(artifact.to_string(), fingerprint.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_unknown_artifact_is_absent() {
        let cache = FingerprintCache::new();
        assert_eq!(cache.lookup("js/app.js"), None);
    }

    #[test]
    fn record_then_lookup() {
        let mut cache = FingerprintCache::new();
        cache.record("js/app.js", "abc123");
        assert_eq!(cache.lookup("js/app.js"), Some("abc123"));
    }

    #[test]
    fn record_replaces_previous_fingerprint() {
        let mut cache = FingerprintCache::new();
        cache.record("css/app.css", "h1");
        cache.record("css/app.css", "h2");
        assert_eq!(cache.lookup("css/app.css"), Some("h2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn artifacts_are_independent() {
        let mut cache = FingerprintCache::new();
        cache.record("a.js", "h1");
        cache.record("b.css", "h2");
        assert_eq!(cache.lookup("a.js"), Some("h1"));
        assert_eq!(cache.lookup("b.css"), Some("h2"));
    }
}
