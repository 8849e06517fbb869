//! Machine driver error types

use thiserror::Error;

/// Errors surfaced through the [`MachineDriver`](crate::MachineDriver) interface
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Machine not found: {0}")]
    MachineNotFound(String),

    #[error("Machine already exists: {0}")]
    MachineAlreadyExists(String),

    #[error("Node has not been created yet")]
    NodeNotCreated,

    #[error("ssh-keygen not found: {0}")]
    SshKeygenNotFound(String),

    #[error("SSH key generation failed: {0}")]
    SshKeygenFailed(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error returned by the provider, passed through unchanged
    #[error(transparent)]
    Provider(Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriverError {
    /// Wrap a provider-specific error without altering its message
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
