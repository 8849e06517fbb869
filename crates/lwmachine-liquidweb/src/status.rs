//! Storm server status to machine state mapping

use lwmachine_driver::MachineState;

/// Status strings reported while a server is on its way to running
const STARTING_STATUSES: &[&str] = &[
    "BUILDING",
    "BOOTING",
    "Updating Firewall",
    "Updating Network",
    "RESTARTING",
    "CLONING",
    "RESTORING IMAGE",
    "RE-IMAGING",
    "RESTORING BACKUP",
    "MOVING",
    "RESIZING",
];

/// Whether a status string means the server is ready
pub fn is_running(status: &str) -> bool {
    status.eq_ignore_ascii_case("RUNNING")
}

/// Map a Storm status string to a [`MachineState`], ignoring case
pub fn machine_state(status: &str) -> MachineState {
    let status = status.trim();

    if is_running(status) {
        MachineState::Running
    } else if status.eq_ignore_ascii_case("SHUTDOWN") {
        MachineState::Stopped
    } else if status.eq_ignore_ascii_case("SHUTTING DOWN") {
        MachineState::Stopping
    } else if STARTING_STATUSES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(status))
    {
        MachineState::Starting
    } else {
        MachineState::Error
    }
}
