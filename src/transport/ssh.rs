//! SSH transport
//!
//! Uses the system `ssh`/`scp` binaries rather than an in-process SSH
//! stack. A ControlMaster socket is established at connect time so that
//! per-artifact `scp` calls reuse one authenticated connection and
//! `dispose` has a real endpoint to close.
//!
//! scp does not create remote directories, so each put is preceded by an
//! `ssh mkdir -p` for the target's parent.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::error::{FerryError, FerryResult};

use super::{Connector, Transport};

/// Connection over a ControlMaster socket
pub struct SshTransport {
    /// "user@host"
    destination: String,
    port: u16,
    key_path: Option<PathBuf>,
    control_path: PathBuf,
    disposed: AtomicBool,
}

impl SshTransport {
    /// Establish the master connection
    ///
    /// Blocks until ssh has authenticated (or failed). The caller is
    /// expected to have validated `config` already; this only surfaces
    /// transport-level failures.
    pub fn connect(config: &ConnectionConfig) -> FerryResult<Self> {
        let destination = format!("{}@{}", config.username, config.host);
        let port = config.port.unwrap_or(22);
        let control_path = std::env::temp_dir().join(format!(
            "ferry-{}-{}.sock",
            std::process::id(),
            config.host
        ));

        let transport = Self {
            destination,
            port,
            key_path: config.key_path(),
            control_path,
            disposed: AtomicBool::new(false),
        };

        // -fN: background after auth, no remote command. BatchMode keeps a
        // missing agent from hanging on an interactive prompt.
        let output = transport
            .ssh_command()
            .arg("-fN")
            .arg("-o")
            .arg("ControlMaster=yes")
            .arg("-o")
            .arg("BatchMode=yes")
            .arg(&transport.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| FerryError::Connection {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(FerryError::Connection {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(transport)
    }

    /// Base ssh invocation sharing the control socket
    fn ssh_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-p")
            .arg(self.port.to_string())
            .arg("-S")
            .arg(&self.control_path);
        if let Some(key) = &self.key_path {
            cmd.arg("-i").arg(key);
        }
        cmd
    }

    fn shell_quote(s: &str) -> String {
        format!("'{}'", s.replace('\'', "'\\''"))
    }

    fn create_remote_dir(&self, remote: &str) -> FerryResult<()> {
        let parent = match Path::new(remote).parent() {
            Some(p) if !p.as_os_str().is_empty() => p.display().to_string(),
            _ => return Ok(()),
        };

        let status = self
            .ssh_command()
            .arg(&self.destination)
            .arg(format!("mkdir -p {}", Self::shell_quote(&parent)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| FerryError::Connection {
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(FerryError::Connection {
                message: format!("failed to create remote directory {parent}"),
            });
        }
        Ok(())
    }
}

impl Transport for SshTransport {
    fn put_file(&self, local: &Path, remote: &str) -> FerryResult<()> {
        self.create_remote_dir(remote)
            .map_err(|e| FerryError::Transfer {
                artifact: remote.to_string(),
                message: e.to_string(),
            })?;

        let mut cmd = Command::new("scp");
        cmd.arg("-P")
            .arg(self.port.to_string())
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()));
        if let Some(key) = &self.key_path {
            cmd.arg("-i").arg(key);
        }

        let output = cmd
            .arg(local)
            .arg(format!("{}:{}", self.destination, remote))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| FerryError::Transfer {
                artifact: remote.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(FerryError::Transfer {
                artifact: remote.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn dispose(&self) -> FerryResult<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let status = self
            .ssh_command()
            .arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| FerryError::Connection {
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(FerryError::Connection {
                message: "failed to close control connection".to_string(),
            });
        }
        Ok(())
    }
}

/// Production connector producing [`SshTransport`] connections
#[derive(Debug, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    fn connect(&self, config: &ConnectionConfig) -> FerryResult<Arc<dyn Transport>> {
        Ok(Arc::new(SshTransport::connect(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_quote_simple() {
        assert_eq!(SshTransport::shell_quote("/var/www"), "'/var/www'");
    }

    #[test]
    fn shell_quote_embedded_quote() {
        assert_eq!(
            SshTransport::shell_quote("it's here"),
            "'it'\\''s here'"
        );
    }

    fn test_transport() -> SshTransport {
        SshTransport {
            destination: "deploy@example.com".to_string(),
            port: 2222,
            key_path: Some(PathBuf::from("/home/dev/.ssh/id_ed25519")),
            control_path: PathBuf::from("/tmp/ferry-test.sock"),
            disposed: AtomicBool::new(false),
        }
    }

    #[test]
    fn ssh_command_carries_port_and_socket() {
        let transport = test_transport();
        let cmd = transport.ssh_command();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert!(args.contains(&"2222".to_string()));
        assert!(args.contains(&"/tmp/ferry-test.sock".to_string()));
        assert!(args.contains(&"/home/dev/.ssh/id_ed25519".to_string()));
    }

    #[test]
    fn dispose_is_idempotent() {
        let transport = test_transport();
        transport.disposed.store(true, Ordering::SeqCst);
        // Already disposed: no subprocess is spawned, returns Ok.
        assert!(transport.dispose().is_ok());
    }
}
