//! Liquid Web driver for lwmachine
//!
//! This crate implements the [`MachineDriver`](lwmachine_driver::MachineDriver)
//! trait for Liquid Web Storm servers, letting lwmachine provision a Docker
//! host and manage its power state.
//!
//! # Features
//!
//! - Option validation (`lw-*` create flags)
//! - Server provisioning with an SSH public key and root password
//! - Readiness polling with an optional deadline
//! - Start, stop, restart, kill and remove
//! - State and primary IP lookups
//!
//! # Example
//!
//! ```ignore
//! use lwmachine_driver::{BaseDriver, MachineDriver};
//! use lwmachine_liquidweb::{DriverConfig, LiquidWebDriver, RawOptions};
//!
//! let config = DriverConfig::from_options(
//!     RawOptions {
//!         username: "user".into(),
//!         password: "pass".into(),
//!         config_id: 5,
//!         ..Default::default()
//!     },
//!     &mut rand::thread_rng(),
//! )?;
//!
//! let mut driver = LiquidWebDriver::new(BaseDriver::new("web-01", store_dir), config);
//! driver.pre_create_check()?;
//! driver.create().await?;
//! println!("{}", driver.get_url().await?);
//! ```

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod random;
pub mod status;

pub use api::{Connector, HttpConnector, LiquidWebClient, StormApi};
pub use config::{
    Credentials, DEFAULT_API_DOMAIN, DEFAULT_DOCKER_PORT, DEFAULT_TEMPLATE, DEFAULT_ZONE_ID,
    DRIVER_NAME, DriverConfig, RawOptions, create_flags,
};
pub use driver::{LiquidWebDriver, LiquidWebState, NodeHandle, wait_until_ready};
pub use error::{LiquidWebError, Result};
