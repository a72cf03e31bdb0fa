//! Remote transport seam
//!
//! The engine treats the remote side as an opaque capability: connect,
//! put a file, dispose. [`SshTransport`] is the production implementation;
//! tests plug in recording mocks through the same traits.

mod ssh;

pub use ssh::{SshConnector, SshTransport};

use std::path::Path;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::error::FerryResult;

/// An established connection to the remote host
///
/// Shared by reference between the session controller (which owns its
/// lifecycle) and the upload scheduler's transfer workers.
pub trait Transport: Send + Sync {
    /// Copy a local file to an absolute remote path
    fn put_file(&self, local: &Path, remote: &str) -> FerryResult<()>;

    /// Close the connection. Idempotent; called at most once by the
    /// session controller after the bootstrap batch settles.
    fn dispose(&self) -> FerryResult<()>;
}

/// Connection factory, the seam for substituting transports in tests
pub trait Connector {
    fn connect(&self, config: &ConnectionConfig) -> FerryResult<Arc<dyn Transport>>;
}
