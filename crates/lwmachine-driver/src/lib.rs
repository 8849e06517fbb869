//! lwmachine driver abstraction
//!
//! This crate defines the interface between the `lwmachine` host CLI and the
//! provider drivers that create and control remote machines.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  lwmachine CLI                   │
//! │        (create / start / stop / rm / ip)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               lwmachine-driver                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Driver Abstraction               │   │
//! │  │  trait MachineDriver { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  SSH keygen  │  │ MachineStore │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │   liquidweb   │
//! │    driver     │
//! └───────────────┘
//! ```

pub mod base;
pub mod driver;
pub mod error;
pub mod ssh;
pub mod state;
pub mod store;

// Re-exports
pub use base::{BaseDriver, DEFAULT_SSH_PORT, DEFAULT_SSH_USER};
pub use driver::{CreateFlag, FlagKind, MachineDriver, PollConfig};
pub use error::{DriverError, Result};
pub use ssh::SshKeygen;
pub use state::MachineState;
pub use store::{MachineRecord, MachineStore, STORAGE_PATH_ENV, validate_machine_name};
