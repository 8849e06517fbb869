//! Host-side settings shared by every driver

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_SSH_PORT: u16 = 22;

const SSH_KEY_FILE: &str = "id_rsa";

/// Settings the host owns on behalf of a driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDriver {
    /// Name the host knows the machine by
    pub machine_name: String,

    /// Directory holding the machine record and SSH keypair
    pub store_path: PathBuf,

    pub ssh_user: String,

    pub ssh_port: u16,
}

impl BaseDriver {
    pub fn new(machine_name: impl Into<String>, store_path: impl Into<PathBuf>) -> Self {
        Self {
            machine_name: machine_name.into(),
            store_path: store_path.into(),
            ssh_user: DEFAULT_SSH_USER.to_string(),
            ssh_port: DEFAULT_SSH_PORT,
        }
    }

    /// Private key location; the public half lives next to it with a `.pub` suffix
    pub fn ssh_key_path(&self) -> PathBuf {
        self.store_path.join(SSH_KEY_FILE)
    }
}
