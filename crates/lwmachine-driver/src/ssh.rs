//! SSH keypair bootstrap
//!
//! Wraps `ssh-keygen` to produce the keypair a new node is provisioned with.

use crate::error::{DriverError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_PROGRAM: &str = "ssh-keygen";
const KEY_BITS: &str = "2048";

/// `ssh-keygen` wrapper
#[derive(Debug, Clone)]
pub struct SshKeygen {
    program: PathBuf,
}

impl Default for SshKeygen {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl SshKeygen {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Generate an RSA keypair at `path` unless one already exists there
    ///
    /// Writes the private key to `path` and the public key to `path.pub`.
    pub async fn ensure_key(&self, path: &Path) -> Result<()> {
        if path.exists() {
            tracing::debug!("Reusing existing SSH key: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::debug!("Generating SSH key: {}", path.display());

        let output = Command::new(&self.program)
            .args(["-t", "rsa", "-b", KEY_BITS, "-N", "", "-q", "-f"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    DriverError::SshKeygenNotFound(self.program.display().to_string())
                }
                _ => DriverError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::SshKeygenFailed(stderr.trim().to_string()));
        }

        Ok(())
    }

    /// Ensure the keypair exists and return the public key in authorized_keys format
    pub async fn public_key(&self, path: &Path) -> Result<String> {
        self.ensure_key(path).await?;
        read_public_key(path).await
    }
}

/// Path of the public half of the keypair at `path`
pub fn public_key_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".pub");
    PathBuf::from(os)
}

/// Read the public key belonging to the private key at `path`
pub async fn read_public_key(path: &Path) -> Result<String> {
    let content = tokio::fs::read_to_string(public_key_path(path)).await?;
    Ok(content)
}
