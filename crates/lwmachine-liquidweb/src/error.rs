//! Liquid Web driver error types

use lwmachine_driver::DriverError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiquidWebError {
    #[error("must give a lw-config-id")]
    MissingConfigId,

    #[error("docker port must be greater than zero")]
    NonPositiveDockerPort,

    #[error("docker port {0} is out of range")]
    DockerPortOutOfRange(i64),

    #[error("lw username and password are required")]
    MissingCredentials,

    #[error("api domain cannot be blank")]
    MissingApiDomain,

    #[error("template cannot be blank")]
    MissingTemplate,

    #[error("Windows is not supported (template {0})")]
    UnsupportedOs(String),

    #[error("invalid api domain '{domain}': {reason}")]
    InvalidApiDomain { domain: String, reason: String },

    #[error("node already created with uniq_id [{0}]")]
    AlreadyCreated(String),

    #[error("LW API error [{class}]: {message}")]
    Api { class: String, message: String },

    #[error("LW API {method} returned HTTP {status}: {body}")]
    HttpStatus {
        method: String,
        status: u16,
        body: String,
    },

    #[error("error fetching primary ip: {0}")]
    PrimaryIp(#[source] Box<LiquidWebError>),

    #[error("node [{uniq_id}] did not become ready within {timeout:?}")]
    ReadyTimeout { uniq_id: String, timeout: Duration },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl LiquidWebError {
    /// Whether this error comes from validating options, before any remote call
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LiquidWebError::MissingConfigId
                | LiquidWebError::NonPositiveDockerPort
                | LiquidWebError::DockerPortOutOfRange(_)
                | LiquidWebError::MissingCredentials
                | LiquidWebError::MissingApiDomain
                | LiquidWebError::MissingTemplate
                | LiquidWebError::UnsupportedOs(_)
                | LiquidWebError::InvalidApiDomain { .. }
        )
    }
}

impl From<LiquidWebError> for DriverError {
    fn from(err: LiquidWebError) -> Self {
        match err {
            LiquidWebError::Driver(e) => e,
            e @ LiquidWebError::ReadyTimeout { .. } => DriverError::Timeout(e.to_string()),
            e if e.is_config_error() => DriverError::InvalidConfig(e.to_string()),
            e => DriverError::provider(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, LiquidWebError>;
