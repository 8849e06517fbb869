//! Liquid Web machine driver

use crate::api::{Connector, HttpConnector, StormApi};
use crate::config::{DRIVER_NAME, DriverConfig, ROOT_PASSWORD_LENGTH, create_flags};
use crate::error::LiquidWebError;
use crate::random::random_string;
use crate::status::{is_running, machine_state};
use async_trait::async_trait;
use lwmachine_driver::{
    BaseDriver, CreateFlag, DriverError, MachineDriver, MachineState, PollConfig, Result,
    SshKeygen,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Identity of the remote node once it exists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHandle {
    /// Provider-assigned identifier, set once by `create`
    pub uniq_id: Option<String>,

    /// Cached primary IP
    pub ip_address: Option<String>,
}

/// Everything the host persists for a Liquid Web machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidWebState {
    pub config: DriverConfig,
    #[serde(default)]
    pub node: NodeHandle,
}

/// Driver for Liquid Web Storm servers
pub struct LiquidWebDriver<C: Connector = HttpConnector> {
    base: BaseDriver,
    config: DriverConfig,
    node: NodeHandle,
    poll: PollConfig,
    keygen: SshKeygen,
    connector: C,
    rng: StdRng,
}

impl LiquidWebDriver<HttpConnector> {
    pub fn new(base: BaseDriver, config: DriverConfig) -> Self {
        Self::with_connector(base, config, HttpConnector::default())
    }
}

impl<C: Connector> LiquidWebDriver<C> {
    pub fn with_connector(base: BaseDriver, config: DriverConfig, connector: C) -> Self {
        Self {
            base,
            config,
            node: NodeHandle::default(),
            poll: PollConfig::default(),
            keygen: SshKeygen::default(),
            connector,
            rng: StdRng::from_entropy(),
        }
    }

    /// Rebuild a driver from a persisted state
    pub fn from_state(base: BaseDriver, state: LiquidWebState, connector: C) -> Self {
        let mut driver = Self::with_connector(base, state.config, connector);
        driver.node = state.node;
        driver
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_keygen(mut self, keygen: SshKeygen) -> Self {
        self.keygen = keygen;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Snapshot for the host to persist
    pub fn state(&self) -> LiquidWebState {
        LiquidWebState {
            config: self.config.clone(),
            node: self.node.clone(),
        }
    }

    fn uniq_id(&self) -> Result<&str> {
        self.node
            .uniq_id
            .as_deref()
            .ok_or(DriverError::NodeNotCreated)
    }

    fn connect(&self) -> Result<C::Api> {
        Ok(self.connector.connect(&self.config.credentials)?)
    }

    /// API handle plus the node it should act on
    fn node_api(&self) -> Result<(C::Api, &str)> {
        let uniq_id = self.uniq_id()?;
        Ok((self.connect()?, uniq_id))
    }
}

/// Poll server status until it reports RUNNING
///
/// Waits `poll.interval` between checks and `poll.error_interval` after a
/// failed check. Runs until ready unless `poll.timeout` is set. Dropping the
/// future stops polling.
pub async fn wait_until_ready<A>(
    api: &A,
    uniq_id: &str,
    poll: &PollConfig,
) -> std::result::Result<(), LiquidWebError>
where
    A: StormApi + ?Sized,
{
    let wait = async {
        loop {
            match api.server_status(uniq_id).await {
                Err(e) => {
                    tracing::warn!("failed fetching status for [{}]: {}", uniq_id, e);
                    tokio::time::sleep(poll.error_interval).await;
                }
                Ok(status) if is_running(&status.status) => {
                    tracing::info!("node [{}] has become ready", uniq_id);
                    return;
                }
                Ok(status) => {
                    tracing::debug!("node [{}] status: {}", uniq_id, status.status);
                    tokio::time::sleep(poll.interval).await;
                }
            }
        }
    };

    match poll.timeout {
        Some(timeout) => tokio::time::timeout(timeout, wait).await.map_err(|_| {
            LiquidWebError::ReadyTimeout {
                uniq_id: uniq_id.to_string(),
                timeout,
            }
        }),
        None => {
            wait.await;
            Ok(())
        }
    }
}

#[async_trait]
impl<C: Connector> MachineDriver for LiquidWebDriver<C> {
    fn driver_name(&self) -> &str {
        DRIVER_NAME
    }

    fn base(&self) -> &BaseDriver {
        &self.base
    }

    fn create_flags(&self) -> Vec<CreateFlag> {
        create_flags()
    }

    fn docker_port(&self) -> u16 {
        self.config.docker_port
    }

    fn pre_create_check(&mut self) -> Result<()> {
        if self.config.root_password.is_empty() {
            tracing::info!("Generating a random root password...");
            self.config.root_password = random_string(&mut self.rng, ROOT_PASSWORD_LENGTH, true);
        }
        Ok(())
    }

    async fn create(&mut self) -> Result<()> {
        if let Some(uniq_id) = &self.node.uniq_id {
            return Err(LiquidWebError::AlreadyCreated(uniq_id.clone()).into());
        }

        tracing::info!("Creating {} machine instance...", DRIVER_NAME);

        let public_key = self.keygen.public_key(&self.base.ssh_key_path()).await?;

        let api = self.connect()?;

        let params = self.config.server_params(public_key);
        let server = api.create_server(&params).await?;

        self.node.uniq_id = Some(server.uniq_id.clone());
        let uniq_id = server.uniq_id;

        tracing::info!(
            "Created {} instance with uniq_id [{}]",
            DRIVER_NAME,
            uniq_id
        );

        tracing::info!("Waiting for machine to become ready..");
        wait_until_ready(&api, &uniq_id, &self.poll).await?;
        tracing::info!("Machine has become ready..");

        let details = api
            .asset_details(&uniq_id)
            .await
            .map_err(|e| LiquidWebError::PrimaryIp(Box::new(e)))?;

        if !details.ip.is_empty() {
            tracing::info!(
                "Discovered IP address [{}] for uniq_id [{}]",
                details.ip,
                uniq_id
            );
            self.node.ip_address = Some(details.ip);
        }

        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let (api, uniq_id) = self.node_api()?;
        tracing::info!(
            "requesting {} compute node [{}] to start...",
            DRIVER_NAME,
            uniq_id
        );
        api.start_server(uniq_id).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let (api, uniq_id) = self.node_api()?;
        tracing::info!(
            "requesting {} compute node [{}] to shutdown...",
            DRIVER_NAME,
            uniq_id
        );
        api.stop_server(uniq_id, false).await?;
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        let (api, uniq_id) = self.node_api()?;
        tracing::info!("rebooting {} compute node [{}]...", DRIVER_NAME, uniq_id);
        api.reboot_server(uniq_id).await?;
        Ok(())
    }

    async fn kill(&self) -> Result<()> {
        let (api, uniq_id) = self.node_api()?;
        tracing::info!(
            "forcing {} compute node [{}] to shutdown...",
            DRIVER_NAME,
            uniq_id
        );
        api.stop_server(uniq_id, true).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        let (api, uniq_id) = self.node_api()?;
        tracing::info!("removing {} compute node [{}]...", DRIVER_NAME, uniq_id);
        api.destroy_server(uniq_id).await?;
        Ok(())
    }

    async fn get_state(&self) -> Result<MachineState> {
        let (api, uniq_id) = self.node_api()?;
        let status = api.server_status(uniq_id).await?;
        Ok(machine_state(&status.status))
    }

    async fn get_ip(&mut self) -> Result<String> {
        if let Some(ip) = &self.node.ip_address {
            return Ok(ip.clone());
        }

        let (api, uniq_id) = self.node_api()?;
        let details = api
            .asset_details(uniq_id)
            .await
            .map_err(|e| LiquidWebError::PrimaryIp(Box::new(e)))?;

        if !details.ip.is_empty() {
            self.node.ip_address = Some(details.ip.clone());
        }
        Ok(details.ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssetDetails, Server, ServerParams, ServerStatus};
    use crate::config::{Credentials, RawOptions};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::Instant;

    type ApiResult<T> = std::result::Result<T, LiquidWebError>;

    #[derive(Default)]
    struct FakeState {
        calls: Vec<String>,
        created: Vec<ServerParams>,
        statuses: VecDeque<std::result::Result<&'static str, &'static str>>,
        idle_status: Option<&'static str>,
        details: VecDeque<std::result::Result<&'static str, &'static str>>,
        power_error: Option<&'static str>,
    }

    /// Scripted stand-in for the Storm API
    #[derive(Clone, Default)]
    struct FakeApi {
        state: Arc<Mutex<FakeState>>,
    }

    fn api_err(message: &str) -> LiquidWebError {
        LiquidWebError::Api {
            class: "LW::Exception::Test".to_string(),
            message: message.to_string(),
        }
    }

    impl FakeApi {
        fn with_statuses(self, statuses: &[std::result::Result<&'static str, &'static str>]) -> Self {
            self.state.lock().unwrap().statuses = statuses.iter().copied().collect();
            self
        }

        fn with_idle_status(self, status: &'static str) -> Self {
            self.state.lock().unwrap().idle_status = Some(status);
            self
        }

        fn with_details(self, details: &[std::result::Result<&'static str, &'static str>]) -> Self {
            self.state.lock().unwrap().details = details.iter().copied().collect();
            self
        }

        fn with_power_error(self, message: &'static str) -> Self {
            self.state.lock().unwrap().power_error = Some(message);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        fn count(&self, call: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == call).count()
        }

        fn record(&self, call: String) {
            self.state.lock().unwrap().calls.push(call);
        }

        fn power(&self, call: String) -> ApiResult<()> {
            self.record(call);
            match self.state.lock().unwrap().power_error {
                Some(message) => Err(api_err(message)),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl StormApi for FakeApi {
        async fn create_server(&self, params: &ServerParams) -> ApiResult<Server> {
            self.record("create".to_string());
            self.state.lock().unwrap().created.push(params.clone());
            Ok(Server {
                uniq_id: "ABC123".to_string(),
                domain: Some(params.domain.clone()),
                ip: None,
                template: Some(params.template.clone()),
            })
        }

        async fn server_status(&self, uniq_id: &str) -> ApiResult<ServerStatus> {
            self.record(format!("status {}", uniq_id));
            let mut state = self.state.lock().unwrap();
            let next = state
                .statuses
                .pop_front()
                .or(state.idle_status.map(Ok))
                .unwrap_or(Err("no scripted status"));
            next.map(|s| ServerStatus {
                status: s.to_string(),
                detailed_status: None,
            })
            .map_err(api_err)
        }

        async fn start_server(&self, uniq_id: &str) -> ApiResult<()> {
            self.power(format!("start {}", uniq_id))
        }

        async fn stop_server(&self, uniq_id: &str, force: bool) -> ApiResult<()> {
            self.power(format!("stop {} force={}", uniq_id, force))
        }

        async fn reboot_server(&self, uniq_id: &str) -> ApiResult<()> {
            self.power(format!("reboot {}", uniq_id))
        }

        async fn destroy_server(&self, uniq_id: &str) -> ApiResult<()> {
            self.power(format!("destroy {}", uniq_id))
        }

        async fn asset_details(&self, uniq_id: &str) -> ApiResult<AssetDetails> {
            self.record(format!("details {}", uniq_id));
            let next = self
                .state
                .lock()
                .unwrap()
                .details
                .pop_front()
                .unwrap_or(Err("no scripted details"));
            next.map(|ip| AssetDetails {
                uniq_id: Some(uniq_id.to_string()),
                ip: ip.to_string(),
                domain: None,
            })
            .map_err(api_err)
        }
    }

    struct FakeConnector {
        api: FakeApi,
        connections: Arc<Mutex<Vec<Credentials>>>,
    }

    impl Connector for FakeConnector {
        type Api = FakeApi;

        fn connect(&self, credentials: &Credentials) -> ApiResult<FakeApi> {
            self.connections.lock().unwrap().push(credentials.clone());
            Ok(self.api.clone())
        }
    }

    struct Fixture {
        _dir: TempDir,
        driver: LiquidWebDriver<FakeConnector>,
        api: FakeApi,
    }

    fn config() -> DriverConfig {
        DriverConfig::from_options(
            RawOptions {
                username: "u".to_string(),
                password: "p".to_string(),
                api_domain: "https://api.x.com".to_string(),
                template: "DEBIAN_10_UNMANAGED".to_string(),
                config_id: 5,
                docker_port: 2376,
                hostname: Some("docker.example.com".to_string()),
                ..Default::default()
            },
            &mut StdRng::seed_from_u64(9),
        )
        .unwrap()
    }

    /// Driver whose store already holds a keypair, so no ssh-keygen runs
    fn fixture(api: FakeApi) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let base = BaseDriver::new("web-01", dir.path());
        std::fs::write(base.ssh_key_path(), "PRIVATE").unwrap();
        std::fs::write(dir.path().join("id_rsa.pub"), "ssh-rsa AAAA web-01\n").unwrap();

        let connector = FakeConnector {
            api: api.clone(),
            connections: Arc::default(),
        };
        let driver = LiquidWebDriver::with_connector(base, config(), connector)
            .with_keygen(SshKeygen::new(dir.path().join("no-such-keygen")))
            .with_rng(StdRng::seed_from_u64(11));

        Fixture {
            _dir: dir,
            driver,
            api,
        }
    }

    fn created(uniq_id: &str, ip: Option<&str>) -> NodeHandle {
        NodeHandle {
            uniq_id: Some(uniq_id.to_string()),
            ip_address: ip.map(str::to_string),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_for_running() {
        let api = FakeApi::default()
            .with_statuses(&[Ok("BUILDING"), Ok("RUNNING")])
            .with_details(&[Ok("203.0.113.10")]);
        let mut fx = fixture(api);
        fx.driver.pre_create_check().unwrap();

        let started = Instant::now();
        fx.driver.create().await.unwrap();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));
        assert_eq!(fx.driver.node(), &created("ABC123", Some("203.0.113.10")));
        assert_eq!(
            fx.api.calls(),
            vec!["create", "status ABC123", "status ABC123", "details ABC123"]
        );

        let params = fx.api.state.lock().unwrap().created[0].clone();
        assert_eq!(params.domain, "docker.example.com");
        assert_eq!(params.public_ssh_key, "ssh-rsa AAAA web-01\n");
        assert_eq!(params.config_id, 5);
        assert_eq!(params.zone, None);
        assert_eq!(params.password.as_deref().map(str::len), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_retries_status_errors_after_backoff() {
        let api = FakeApi::default()
            .with_statuses(&[Err("gateway timeout"), Ok("running")])
            .with_details(&[Ok("203.0.113.10")]);
        let mut fx = fixture(api);

        let started = Instant::now();
        fx.driver.create().await.unwrap();

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(31));
        assert_eq!(fx.api.count("status ABC123"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_timeout_keeps_uniq_id() {
        let api = FakeApi::default().with_idle_status("BUILDING");
        let mut fx = fixture(api);
        fx.driver = fx
            .driver
            .with_poll_config(PollConfig::default().with_timeout(Some(Duration::from_secs(35))));

        let err = fx.driver.create().await.unwrap_err();

        assert!(matches!(err, DriverError::Timeout(_)));
        assert_eq!(fx.driver.node(), &created("ABC123", None));
        // checks at 0s, 10s, 20s and 30s
        assert_eq!(fx.api.count("status ABC123"), 4);
        assert_eq!(fx.api.count("details ABC123"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_ip_lookup_failure_keeps_node() {
        let api = FakeApi::default()
            .with_statuses(&[Ok("RUNNING")])
            .with_details(&[Err("asset lookup exploded")]);
        let mut fx = fixture(api);

        let err = fx.driver.create().await.unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("error fetching primary ip"));
        assert!(msg.contains("asset lookup exploded"));
        assert_eq!(fx.driver.node(), &created("ABC123", None));
        assert_eq!(fx.api.count("destroy ABC123"), 0);
    }

    #[tokio::test]
    async fn test_create_key_failure_has_no_remote_effect() {
        let mut fx = fixture(FakeApi::default());
        let dir = tempfile::tempdir().unwrap();
        // no keypair at this location and no ssh-keygen to make one
        fx.driver.base = BaseDriver::new("web-02", dir.path().join("web-02"));

        let err = fx.driver.create().await.unwrap_err();

        assert!(matches!(err, DriverError::SshKeygenNotFound(_)));
        assert!(fx.api.calls().is_empty());
        assert!(fx.driver.node().uniq_id.is_none());
    }

    #[tokio::test]
    async fn test_create_twice_rejected() {
        let mut fx = fixture(FakeApi::default());
        fx.driver.node = created("ABC123", None);

        let err = fx.driver.create().await.unwrap_err();
        assert!(err.to_string().contains("ABC123"));
        assert!(fx.api.calls().is_empty());
    }

    #[test]
    fn test_pre_create_check_generates_password_once() {
        let mut fx = fixture(FakeApi::default());
        assert!(fx.driver.config().root_password.is_empty());

        fx.driver.pre_create_check().unwrap();
        let generated = fx.driver.config().root_password.clone();
        assert_eq!(generated.len(), 30);

        fx.driver.pre_create_check().unwrap();
        assert_eq!(fx.driver.config().root_password, generated);
    }

    #[test]
    fn test_pre_create_check_keeps_given_password() {
        let mut fx = fixture(FakeApi::default());
        fx.driver.config.root_password = "given".to_string();

        fx.driver.pre_create_check().unwrap();
        assert_eq!(fx.driver.config().root_password, "given");
    }

    #[tokio::test]
    async fn test_get_state_mapping() {
        let api = FakeApi::default().with_statuses(&[
            Ok("ShutDown"),
            Ok("Shutting Down"),
            Ok("RE-IMAGING"),
            Ok("FOOBAR"),
        ]);
        let mut fx = fixture(api);
        fx.driver.node = created("ABC123", None);

        assert_eq!(fx.driver.get_state().await.unwrap(), MachineState::Stopped);
        assert_eq!(fx.driver.get_state().await.unwrap(), MachineState::Stopping);
        assert_eq!(fx.driver.get_state().await.unwrap(), MachineState::Starting);
        assert_eq!(fx.driver.get_state().await.unwrap(), MachineState::Error);
    }

    #[tokio::test]
    async fn test_get_state_fetch_error() {
        let api = FakeApi::default().with_statuses(&[Err("service unavailable")]);
        let mut fx = fixture(api);
        fx.driver.node = created("ABC123", None);

        let err = fx.driver.get_state().await.unwrap_err();
        assert!(err.to_string().contains("service unavailable"));
    }

    #[tokio::test]
    async fn test_get_state_before_create() {
        let fx = fixture(FakeApi::default());
        let err = fx.driver.get_state().await.unwrap_err();
        assert!(matches!(err, DriverError::NodeNotCreated));
        assert!(fx.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_ip_is_memoized() {
        let api = FakeApi::default().with_details(&[Ok("203.0.113.10"), Ok("198.51.100.7")]);
        let mut fx = fixture(api);
        fx.driver.node = created("ABC123", None);

        assert_eq!(fx.driver.get_ip().await.unwrap(), "203.0.113.10");
        assert_eq!(fx.driver.get_ip().await.unwrap(), "203.0.113.10");
        assert_eq!(fx.api.count("details ABC123"), 1);
    }

    #[tokio::test]
    async fn test_get_ip_failure_is_wrapped_and_not_cached() {
        let api = FakeApi::default().with_details(&[Err("asset lookup exploded"), Ok("203.0.113.10")]);
        let mut fx = fixture(api);
        fx.driver.node = created("ABC123", None);

        let err = fx.driver.get_ip().await.unwrap_err();
        assert!(err.to_string().contains("error fetching primary ip"));
        assert!(err.to_string().contains("asset lookup exploded"));
        assert!(fx.driver.node().ip_address.is_none());

        assert_eq!(fx.driver.get_ip().await.unwrap(), "203.0.113.10");
    }

    #[tokio::test]
    async fn test_get_url() {
        let mut fx = fixture(FakeApi::default());
        fx.driver.node = created("ABC123", Some("203.0.113.10"));

        assert_eq!(fx.driver.get_url().await.unwrap(), "tcp://203.0.113.10:2376");
        assert!(fx.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_url_fails_without_ip() {
        let api = FakeApi::default().with_details(&[Err("nope")]);
        let mut fx = fixture(api);
        fx.driver.node = created("ABC123", None);

        assert!(fx.driver.get_url().await.is_err());
    }

    #[tokio::test]
    async fn test_power_operations_issue_one_request_each() {
        let mut fx = fixture(FakeApi::default());
        fx.driver.node = created("ABC123", None);

        fx.driver.start().await.unwrap();
        fx.driver.stop().await.unwrap();
        fx.driver.restart().await.unwrap();
        fx.driver.kill().await.unwrap();
        fx.driver.remove().await.unwrap();

        assert_eq!(
            fx.api.calls(),
            vec![
                "start ABC123",
                "stop ABC123 force=false",
                "reboot ABC123",
                "stop ABC123 force=true",
                "destroy ABC123",
            ]
        );
        let connections = fx.driver.connector.connections.lock().unwrap().clone();
        assert_eq!(connections.len(), 5);
        assert_eq!(connections[0].username, "u");
    }

    #[tokio::test]
    async fn test_power_error_returned_verbatim() {
        let api = FakeApi::default().with_power_error("Server is locked");
        let mut fx = fixture(api);
        fx.driver.node = created("ABC123", None);

        let err = fx.driver.stop().await.unwrap_err();
        assert!(matches!(err, DriverError::Provider(_)));
        assert_eq!(
            err.to_string(),
            "LW API error [LW::Exception::Test]: Server is locked"
        );
        assert_eq!(fx.api.count("stop ABC123 force=false"), 1);
    }

    #[test]
    fn test_state_round_trip_through_from_state() {
        let mut fx = fixture(FakeApi::default());
        fx.driver.node = created("ABC123", Some("203.0.113.10"));

        let state = fx.driver.state();
        let json = serde_json::to_string(&state).unwrap();
        let restored: LiquidWebState = serde_json::from_str(&json).unwrap();

        let driver = LiquidWebDriver::from_state(
            fx.driver.base().clone(),
            restored,
            FakeConnector {
                api: FakeApi::default(),
                connections: Arc::default(),
            },
        );
        assert_eq!(driver.node(), fx.driver.node());
        assert_eq!(driver.config(), fx.driver.config());
        assert_eq!(driver.machine_name(), "web-01");
        assert_eq!(driver.driver_name(), "liquidweb");
    }
}
