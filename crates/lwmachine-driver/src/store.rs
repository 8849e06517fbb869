//! Machine record storage
//!
//! Each machine gets a directory under `<root>/machines/<name>/` holding its
//! `config.json` record and SSH keypair.

use crate::base::BaseDriver;
use crate::error::{DriverError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const RECORD_VERSION: u32 = 1;
const MACHINES_DIR: &str = "machines";
const RECORD_FILE: &str = "config.json";
const RECORD_BACKUP: &str = "config.json.backup";
const DEFAULT_STORE_DIR: &str = ".lwmachine";

/// Environment variable overriding the store root
pub const STORAGE_PATH_ENV: &str = "MACHINE_STORAGE_PATH";

/// Persisted state of one machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRecord<T> {
    /// Record format version
    pub version: u32,

    pub driver_name: String,

    pub base: BaseDriver,

    /// Driver-specific configuration and node handle
    pub driver: T,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl<T> MachineRecord<T> {
    pub fn new(driver_name: impl Into<String>, base: BaseDriver, driver: T) -> Self {
        let now = Utc::now();
        Self {
            version: RECORD_VERSION,
            driver_name: driver_name.into(),
            base,
            driver,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the driver payload and bump `updated_at`
    pub fn update(&mut self, driver: T) {
        self.driver = driver;
        self.updated_at = Utc::now();
    }
}

/// Reads and writes machine records under a store root
#[derive(Debug, Clone)]
pub struct MachineStore {
    root: PathBuf,
}

impl MachineStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `$MACHINE_STORAGE_PATH`, falling back to `~/.lwmachine`
    pub fn default_root() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(STORAGE_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        dirs::home_dir()
            .map(|home| home.join(DEFAULT_STORE_DIR))
            .ok_or_else(|| DriverError::StoreError("home directory not found".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a single machine
    pub fn machine_dir(&self, name: &str) -> PathBuf {
        self.root.join(MACHINES_DIR).join(name)
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.machine_dir(name).join(RECORD_FILE)
    }

    fn backup_path(&self, name: &str) -> PathBuf {
        self.machine_dir(name).join(RECORD_BACKUP)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.record_path(name).exists()
    }

    /// Create the directory for a new machine
    pub async fn create_machine_dir(&self, name: &str) -> Result<PathBuf> {
        validate_machine_name(name)?;

        if self.exists(name) {
            return Err(DriverError::MachineAlreadyExists(name.to_string()));
        }

        let dir = self.machine_dir(name);
        fs::create_dir_all(&dir).await?;
        tracing::debug!("Created machine directory: {}", dir.display());
        Ok(dir)
    }

    /// Load the record of a machine
    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<MachineRecord<T>> {
        let path = self.record_path(name);
        if !path.exists() {
            return Err(DriverError::MachineNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&path).await?;
        let record: MachineRecord<T> = serde_json::from_str(&content)?;

        if record.version > RECORD_VERSION {
            return Err(DriverError::StoreError(format!(
                "Machine record version {} is newer than supported version {}",
                record.version, RECORD_VERSION
            )));
        }

        tracing::debug!("Loaded machine record: {}", name);
        Ok(record)
    }

    /// Save a machine record, keeping the previous one as a backup
    pub async fn save<T: Serialize>(&self, record: &MachineRecord<T>) -> Result<()> {
        let name = &record.base.machine_name;
        validate_machine_name(name)?;

        let dir = self.machine_dir(name);
        fs::create_dir_all(&dir).await?;

        let path = self.record_path(name);
        let backup = self.backup_path(name);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let content = serde_json::to_string_pretty(record)?;
        fs::write(&path, content).await?;
        restrict_permissions(&path).await?;

        tracing::debug!("Saved machine record: {}", name);
        Ok(())
    }

    /// Delete a machine directory with everything in it
    pub async fn remove(&self, name: &str) -> Result<()> {
        let dir = self.machine_dir(name);
        if !dir.exists() {
            return Err(DriverError::MachineNotFound(name.to_string()));
        }

        fs::remove_dir_all(&dir).await?;
        tracing::debug!("Removed machine directory: {}", dir.display());
        Ok(())
    }

    /// Names of all machines that have a record, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let machines = self.root.join(MACHINES_DIR);
        if !machines.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&machines).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if self.exists(&name) {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Machine names double as directory names and default hostnames
pub fn validate_machine_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphanumeric()
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DriverError::InvalidConfig(format!(
            "invalid machine name '{}': use letters, digits, '-', '_' or '.', starting with a letter or digit",
            name
        )))
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
