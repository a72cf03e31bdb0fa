//! Configuration module for Ferry
//!
//! Configuration lives in a `ferry.toml` file next to the project (path
//! overridable via `--config`). Every recognized option has an explicit
//! default; nothing is silently coerced. Connection fields are validated
//! lazily at connect time, reporting each missing field individually.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FerryError, FerryResult};

/// Run mode gate for the engine
///
/// Ferry only connects and uploads in development mode. Any other mode
/// string ("production", "staging", ...) is accepted as-is and treated as
/// a logged no-op by the session controller, never as a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    #[default]
    Development,
    /// Any mode string other than "development"
    Other(String),
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Development => "development",
            Mode::Other(mode) => mode,
        }
    }
}

impl From<String> for Mode {
    fn from(s: String) -> Self {
        if s == "development" {
            Mode::Development
        } else {
            Mode::Other(s)
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// SSH connection credentials
///
/// Immutable once loaded. `host`, `port` and `username` are always
/// required; `private_key` and `passphrase` are mutually substitutable but
/// at least one authentication means must be present. An encrypted key
/// relies on ssh-agent for its passphrase; ferry does not prompt.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub passphrase: Option<String>,

    #[serde(default)]
    pub private_key: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Names of required fields that are absent or empty
    ///
    /// Both `private_key` and `passphrase` are reported when neither
    /// authentication means is present.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("host");
        }
        if self.port.is_none() {
            missing.push("port");
        }
        if self.username.trim().is_empty() {
            missing.push("username");
        }
        let no_key = self
            .private_key
            .as_ref()
            .map(|p| p.as_os_str().is_empty())
            .unwrap_or(true);
        let no_passphrase = self
            .passphrase
            .as_ref()
            .map(|p| p.trim().is_empty())
            .unwrap_or(true);
        if no_key && no_passphrase {
            missing.push("private_key");
            missing.push("passphrase");
        }
        missing
    }

    /// True when a passphrase is the only configured authentication means
    ///
    /// Such a config validates, but the ssh subprocess runs in batch mode
    /// and never prompts; the passphrase has to come from an ssh-agent
    /// held key. The session controller surfaces this at connect time.
    pub fn passphrase_only(&self) -> bool {
        let no_key = self
            .private_key
            .as_ref()
            .map(|p| p.as_os_str().is_empty())
            .unwrap_or(true);
        let has_passphrase = self
            .passphrase
            .as_ref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false);
        no_key && has_passphrase
    }

    /// Private key path with `~` expanded to the home directory
    pub fn key_path(&self) -> Option<PathBuf> {
        let key = self.private_key.as_ref()?;
        Some(expand_home(key))
    }
}

/// Remote upload settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UploadConfig {
    /// Remote root directory artifacts are uploaded under
    #[serde(default)]
    pub path: String,

    /// Upload `mix-manifest.json` on every completed build
    #[serde(default)]
    pub manifest: bool,
}

/// Preview domain settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PreviewConfig {
    /// Domain serving the uploaded artifacts (e.g. "myapp.test")
    #[serde(default)]
    pub domain: Option<String>,

    /// Open `https://{domain}` in a browser once connected
    #[serde(default)]
    pub open: bool,
}

/// Top-level Ferry configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the built-in defaults; a malformed file is an
    /// error so typos never silently disable uploads.
    pub fn load(path: &Path) -> FerryResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FerryError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_connection() -> ConnectionConfig {
        ConnectionConfig {
            host: "example.com".to_string(),
            port: Some(22),
            username: "deploy".to_string(),
            passphrase: None,
            private_key: Some(PathBuf::from("/home/dev/.ssh/id_ed25519")),
        }
    }

    #[test]
    fn valid_connection_has_no_missing_fields() {
        assert!(valid_connection().missing_fields().is_empty());
    }

    #[test]
    fn passphrase_substitutes_for_private_key() {
        let conn = ConnectionConfig {
            private_key: None,
            passphrase: Some("hunter2".to_string()),
            ..valid_connection()
        };
        assert!(conn.missing_fields().is_empty());
    }

    #[test]
    fn missing_auth_reports_both_fields() {
        let conn = ConnectionConfig {
            private_key: None,
            passphrase: None,
            ..valid_connection()
        };
        let missing = conn.missing_fields();
        assert!(missing.contains(&"private_key"));
        assert!(missing.contains(&"passphrase"));
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let conn = ConnectionConfig {
            host: "  ".to_string(),
            port: None,
            username: String::new(),
            passphrase: None,
            private_key: None,
        };
        let missing = conn.missing_fields();
        assert!(missing.contains(&"host"));
        assert!(missing.contains(&"port"));
        assert!(missing.contains(&"username"));
    }

    #[test]
    fn defaults_are_inert() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Development);
        assert!(!config.upload.manifest);
        assert!(!config.preview.open);
        assert!(config.preview.domain.is_none());
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/ferry.toml")).unwrap();
        assert_eq!(config.mode, Mode::Development);
    }

    #[test]
    fn load_parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(
            &path,
            r#"mode = "development"

[connection]
host = "example.com"
port = 2222
username = "deploy"
private_key = "~/.ssh/id_ed25519"

[upload]
path = "/var/www/site/public"
manifest = true

[preview]
domain = "myapp.test"
open = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.connection.host, "example.com");
        assert_eq!(config.connection.port, Some(2222));
        assert_eq!(config.upload.path, "/var/www/site/public");
        assert!(config.upload.manifest);
        assert_eq!(config.preview.domain.as_deref(), Some("myapp.test"));
        assert!(config.preview.open);
    }

    #[test]
    fn unrecognized_mode_loads_as_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(&path, "mode = \"staging\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.mode, Mode::Other("staging".to_string()));
        assert_eq!(config.mode.as_str(), "staging");
    }

    #[test]
    fn mode_round_trips_through_strings() {
        assert_eq!(Mode::from("development".to_string()), Mode::Development);
        assert_eq!(String::from(Mode::Other("test".to_string())), "test");
    }

    #[test]
    fn passphrase_only_detected() {
        let conn = ConnectionConfig {
            private_key: None,
            passphrase: Some("hunter2".to_string()),
            ..valid_connection()
        };
        assert!(conn.passphrase_only());
        assert!(!valid_connection().passphrase_only());

        let neither = ConnectionConfig {
            private_key: None,
            passphrase: None,
            ..valid_connection()
        };
        assert!(!neither.passphrase_only());
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(&path, "mode = [not toml").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(FerryError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        let path = Path::new("/etc/ssh/key");
        assert_eq!(expand_home(path), PathBuf::from("/etc/ssh/key"));
    }

    #[test]
    fn expand_home_expands_tilde() {
        let expanded = expand_home(Path::new("~/.ssh/id_ed25519"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join(".ssh/id_ed25519"));
        }
    }
}
