//! Driver configuration and validation

use crate::api::ServerParams;
use crate::error::{LiquidWebError, Result};
use crate::random::random_hostname;
use lwmachine_driver::CreateFlag;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DRIVER_NAME: &str = "liquidweb";
pub const DEFAULT_API_DOMAIN: &str = "https://api.liquidweb.com";
pub const DEFAULT_TEMPLATE: &str = "DEBIAN_10_UNMANAGED";
pub const DEFAULT_DOCKER_PORT: i64 = 2376;
/// Zone sentinel meaning "let the provider choose"
pub const DEFAULT_ZONE_ID: i64 = -1;
pub const ROOT_PASSWORD_LENGTH: usize = 30;

/// Option values as given by the host, before validation
#[derive(Debug, Clone)]
pub struct RawOptions {
    pub username: String,
    pub password: String,
    pub api_domain: String,
    pub template: String,
    pub root_password: String,
    pub config_id: i64,
    pub zone_id: i64,
    /// `None` or empty generates a hostname
    pub hostname: Option<String>,
    pub docker_port: i64,
}

impl Default for RawOptions {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            api_domain: DEFAULT_API_DOMAIN.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            root_password: String::new(),
            config_id: 0,
            zone_id: DEFAULT_ZONE_ID,
            hostname: None,
            docker_port: DEFAULT_DOCKER_PORT,
        }
    }
}

/// API account credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub api_domain: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_domain", &self.api_domain)
            .finish()
    }
}

/// Validated driver configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub credentials: Credentials,
    pub config_id: i64,
    pub zone_id: i64,
    pub hostname: String,
    /// Empty until generated by the pre-create check, unless given
    pub root_password: String,
    pub template: String,
    pub docker_port: u16,
}

impl std::fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConfig")
            .field("credentials", &self.credentials)
            .field("config_id", &self.config_id)
            .field("zone_id", &self.zone_id)
            .field("hostname", &self.hostname)
            .field("root_password", &"<redacted>")
            .field("template", &self.template)
            .field("docker_port", &self.docker_port)
            .finish()
    }
}

impl DriverConfig {
    /// Validate raw options, generating a hostname when none was given
    pub fn from_options<R: Rng + ?Sized>(opts: RawOptions, rng: &mut R) -> Result<Self> {
        if opts.config_id == 0 {
            return Err(LiquidWebError::MissingConfigId);
        }

        if opts.docker_port <= 0 {
            return Err(LiquidWebError::NonPositiveDockerPort);
        }
        let docker_port = u16::try_from(opts.docker_port)
            .map_err(|_| LiquidWebError::DockerPortOutOfRange(opts.docker_port))?;

        if opts.username.is_empty() || opts.password.is_empty() {
            return Err(LiquidWebError::MissingCredentials);
        }

        if opts.api_domain.is_empty() {
            return Err(LiquidWebError::MissingApiDomain);
        }

        if opts.template.is_empty() {
            return Err(LiquidWebError::MissingTemplate);
        }

        if opts.template.to_uppercase().contains("WINDOWS") {
            return Err(LiquidWebError::UnsupportedOs(opts.template));
        }

        let hostname = match opts.hostname {
            Some(h) if !h.is_empty() => h,
            _ => random_hostname(rng),
        };

        Ok(Self {
            credentials: Credentials {
                username: opts.username,
                password: opts.password,
                api_domain: opts.api_domain,
            },
            config_id: opts.config_id,
            zone_id: opts.zone_id,
            hostname,
            root_password: opts.root_password,
            template: opts.template,
            docker_port,
        })
    }

    /// Zone to request, if one was chosen
    pub fn zone(&self) -> Option<i64> {
        (self.zone_id > 0).then_some(self.zone_id)
    }

    pub(crate) fn server_params(&self, public_ssh_key: String) -> ServerParams {
        ServerParams {
            domain: self.hostname.clone(),
            zone: self.zone(),
            password: (!self.root_password.is_empty()).then(|| self.root_password.clone()),
            public_ssh_key,
            template: self.template.clone(),
            config_id: self.config_id,
        }
    }
}

/// Options the Liquid Web driver recognizes at create time
pub fn create_flags() -> Vec<CreateFlag> {
    vec![
        CreateFlag::string("lw-username", "LW_USERNAME", "liquidweb api/account username"),
        CreateFlag::string(
            "lw-password",
            "LW_PASSWORD",
            "password associated with lw-username",
        ),
        CreateFlag::string("lw-api-domain", "LW_API_DOMAIN", "liquidweb public api domain")
            .with_default(DEFAULT_API_DOMAIN),
        CreateFlag::string(
            "lw-template",
            "LW_TEMPLATE",
            "Name of the template to deploy on the node",
        )
        .with_default(DEFAULT_TEMPLATE),
        CreateFlag::string(
            "lw-node-root-password",
            "LW_NODE_ROOT_PASSWORD",
            "root password to set on the node",
        ),
        CreateFlag::int("lw-config-id", "LW_CONFIG_ID", "config-id to deploy the node as"),
        CreateFlag::int(
            "lw-zone-id",
            "LW_ZONE_ID",
            "zone_id of the zone to deploy the node in",
        )
        .with_default(DEFAULT_ZONE_ID),
        CreateFlag::string("lw-node-hostname", "LW_NODE_HOSTNAME", "hostname to give the node")
            .with_default("dockerhost-<random>.<random>.io"),
        CreateFlag::int("lw-docker-port", "LW_DOCKER_PORT", "dockerport to use")
            .with_default(DEFAULT_DOCKER_PORT),
    ]
}
