use clap::Args;
use colored::Colorize;
use lwmachine_driver::{
    BaseDriver, MachineDriver, MachineRecord, MachineStore, PollConfig, validate_machine_name,
};
use lwmachine_liquidweb::{
    DEFAULT_API_DOMAIN, DEFAULT_DOCKER_PORT, DEFAULT_TEMPLATE, DEFAULT_ZONE_ID, DriverConfig,
    LiquidWebDriver, RawOptions,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;

#[derive(Args)]
pub struct CreateArgs {
    /// Machine name
    pub name: String,

    /// liquidweb api/account username
    #[arg(long, env = "LW_USERNAME")]
    pub lw_username: Option<String>,

    /// password associated with lw-username
    #[arg(long, env = "LW_PASSWORD", hide_env_values = true)]
    pub lw_password: Option<String>,

    /// liquidweb public api domain
    #[arg(long, env = "LW_API_DOMAIN", default_value = DEFAULT_API_DOMAIN)]
    pub lw_api_domain: String,

    /// Name of the template to deploy on the node
    #[arg(long, env = "LW_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub lw_template: String,

    /// root password to set on the node (generated when omitted)
    #[arg(long, env = "LW_NODE_ROOT_PASSWORD", hide_env_values = true)]
    pub lw_node_root_password: Option<String>,

    /// config-id to deploy the node as
    #[arg(long, env = "LW_CONFIG_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub lw_config_id: i64,

    /// zone_id of the zone to deploy the node in
    #[arg(long, env = "LW_ZONE_ID", default_value_t = DEFAULT_ZONE_ID, allow_negative_numbers = true)]
    pub lw_zone_id: i64,

    /// hostname to give the node (generated when omitted)
    #[arg(long, env = "LW_NODE_HOSTNAME")]
    pub lw_node_hostname: Option<String>,

    /// dockerport to use
    #[arg(long, env = "LW_DOCKER_PORT", default_value_t = DEFAULT_DOCKER_PORT, allow_negative_numbers = true)]
    pub lw_docker_port: i64,

    /// Seconds to wait for the node to become ready, 0 waits indefinitely
    #[arg(long, env = "LW_READY_TIMEOUT", default_value_t = 0)]
    pub lw_ready_timeout: u64,
}

impl CreateArgs {
    fn raw_options(&self) -> RawOptions {
        RawOptions {
            username: self.lw_username.clone().unwrap_or_default(),
            password: self.lw_password.clone().unwrap_or_default(),
            api_domain: self.lw_api_domain.clone(),
            template: self.lw_template.clone(),
            root_password: self.lw_node_root_password.clone().unwrap_or_default(),
            config_id: self.lw_config_id,
            zone_id: self.lw_zone_id,
            hostname: self.lw_node_hostname.clone(),
            docker_port: self.lw_docker_port,
        }
    }

    fn ready_timeout(&self) -> Option<Duration> {
        (self.lw_ready_timeout > 0).then(|| Duration::from_secs(self.lw_ready_timeout))
    }
}

pub async fn handle(store: &MachineStore, args: CreateArgs) -> anyhow::Result<()> {
    validate_machine_name(&args.name)?;

    // Validate before anything is written to the store
    let mut rng = StdRng::from_entropy();
    let config = DriverConfig::from_options(args.raw_options(), &mut rng)?;

    let dir = store.create_machine_dir(&args.name).await?;
    let poll = PollConfig::default().with_timeout(args.ready_timeout());
    let mut driver = LiquidWebDriver::new(BaseDriver::new(&args.name, dir), config)
        .with_poll_config(poll)
        .with_rng(rng);

    println!(
        "{}",
        format!("Creating machine '{}'...", args.name).yellow()
    );
    println!("Hostname: {}", driver.config().hostname.cyan());

    if let Err(e) = driver.pre_create_check() {
        discard(store, &args.name).await;
        return Err(e.into());
    }

    let result = tokio::select! {
        result = driver.create() => result.map_err(anyhow::Error::from),
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("interrupted while creating '{}'", args.name)),
    };

    match &driver.node().uniq_id {
        Some(uniq_id) => {
            // Keep the record whenever a node exists so it can be removed later
            let record = MachineRecord::new(
                driver.driver_name(),
                driver.base().clone(),
                driver.state(),
            );
            store.save(&record).await?;

            if result.is_err() {
                println!(
                    "{}",
                    format!(
                        "Node [{}] was created but is not ready; run 'lwmachine rm {}' to destroy it",
                        uniq_id, args.name
                    )
                    .yellow()
                );
            }
        }
        None => discard(store, &args.name).await,
    }

    result?;

    println!();
    println!(
        "{}",
        format!("✓ Machine '{}' is ready", args.name).green().bold()
    );
    if let Some(ip) = &driver.node().ip_address {
        println!("IP:  {}", ip.cyan());
        println!(
            "URL: {}",
            format!("tcp://{}:{}", ip, driver.docker_port()).cyan()
        );
    }

    Ok(())
}

/// Drop the machine directory of a create that never reached the provider
async fn discard(store: &MachineStore, name: &str) {
    if let Err(e) = store.remove(name).await {
        tracing::warn!("failed to clean up machine directory for '{}': {}", name, e);
    }
}
