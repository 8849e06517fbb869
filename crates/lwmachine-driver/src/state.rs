//! Generic machine state

use serde::{Deserialize, Serialize};

/// Provider-independent state of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    /// Machine is up and reachable
    Running,
    /// Machine is powered off
    Stopped,
    /// Machine is shutting down
    Stopping,
    /// Machine is being built, booted or otherwise transitioning towards running
    Starting,
    /// State could not be determined or the provider reports a failure
    Error,
}

impl MachineState {
    /// Whether the machine is in a transitional state
    pub fn is_transitioning(&self) -> bool {
        matches!(self, MachineState::Starting | MachineState::Stopping)
    }
}

impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineState::Running => write!(f, "Running"),
            MachineState::Stopped => write!(f, "Stopped"),
            MachineState::Stopping => write!(f, "Stopping"),
            MachineState::Starting => write!(f, "Starting"),
            MachineState::Error => write!(f, "Error"),
        }
    }
}
