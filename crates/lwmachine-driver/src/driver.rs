//! Machine driver trait definition

use crate::base::BaseDriver;
use crate::error::Result;
use crate::state::MachineState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Lifecycle interface a provider driver exposes to the host
///
/// The host invokes these sequentially for a given machine. Operations that
/// record node identity or cache lookups take `&mut self`.
#[async_trait]
pub trait MachineDriver: Send + Sync {
    /// Returns the driver name (e.g., "liquidweb")
    fn driver_name(&self) -> &str;

    /// Host-side settings for this machine
    fn base(&self) -> &BaseDriver;

    /// Options this driver recognizes at create time
    fn create_flags(&self) -> Vec<CreateFlag>;

    /// Port the Docker daemon listens on inside the node
    fn docker_port(&self) -> u16;

    fn machine_name(&self) -> &str {
        &self.base().machine_name
    }

    fn ssh_username(&self) -> &str {
        &self.base().ssh_user
    }

    fn ssh_port(&self) -> u16 {
        self.base().ssh_port
    }

    fn ssh_key_path(&self) -> PathBuf {
        self.base().ssh_key_path()
    }

    /// Last-chance checks and defaulting before `create`
    fn pre_create_check(&mut self) -> Result<()>;

    /// Provision the node and wait until it is ready
    async fn create(&mut self) -> Result<()>;

    async fn start(&self) -> Result<()>;

    /// Graceful shutdown
    async fn stop(&self) -> Result<()>;

    async fn restart(&self) -> Result<()>;

    /// Forced shutdown
    async fn kill(&self) -> Result<()>;

    /// Destroy the node
    async fn remove(&self) -> Result<()>;

    /// Current state of the node. An `Err` means the state is `Error`.
    async fn get_state(&self) -> Result<MachineState>;

    /// Primary IP of the node, memoized after the first successful lookup
    async fn get_ip(&mut self) -> Result<String>;

    async fn ssh_hostname(&mut self) -> Result<String> {
        self.get_ip().await
    }

    /// Docker endpoint, `tcp://<ip>:<port>`
    async fn get_url(&mut self) -> Result<String> {
        let ip = self.get_ip().await?;
        Ok(format!("tcp://{}:{}", ip, self.docker_port()))
    }
}

/// Value type of a create flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    String,
    Int,
}

/// Description of an option a driver accepts at create time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlag {
    /// Flag name without leading dashes (e.g., "lw-username")
    pub name: String,

    /// Environment variable the host falls back to
    pub env_var: String,

    pub usage: String,

    pub kind: FlagKind,

    /// Default shown to users, if any
    pub default: Option<String>,
}

impl CreateFlag {
    pub fn string(name: &str, env_var: &str, usage: &str) -> Self {
        Self {
            name: name.to_string(),
            env_var: env_var.to_string(),
            usage: usage.to_string(),
            kind: FlagKind::String,
            default: None,
        }
    }

    pub fn int(name: &str, env_var: &str, usage: &str) -> Self {
        Self {
            kind: FlagKind::Int,
            ..Self::string(name, env_var, usage)
        }
    }

    pub fn with_default(mut self, default: impl ToString) -> Self {
        self.default = Some(default.to_string());
        self
    }
}

/// Readiness polling configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between status checks while the node is not ready
    pub interval: Duration,

    /// Delay after a failed status check
    pub error_interval: Duration,

    /// Give up after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl PollConfig {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            error_interval: Duration::from_secs(30),
            timeout: None,
        }
    }
}
