//! Liquid Web API client
//!
//! Calls are `POST <domain>/v1/<Method>` with HTTP basic auth and a JSON body
//! of the form `{"params": {...}}`. Failures are reported in the body through
//! `error_class`, sometimes alongside a 200 status.

use crate::config::Credentials;
use crate::error::{LiquidWebError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout for every API call
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(90);

const API_VERSION: &str = "v1";

/// Storm server and asset operations used by the driver
#[async_trait]
pub trait StormApi: Send + Sync {
    async fn create_server(&self, params: &ServerParams) -> Result<Server>;

    async fn server_status(&self, uniq_id: &str) -> Result<ServerStatus>;

    async fn start_server(&self, uniq_id: &str) -> Result<()>;

    /// Shut down a server; `force` skips the graceful ACPI shutdown
    async fn stop_server(&self, uniq_id: &str, force: bool) -> Result<()>;

    async fn reboot_server(&self, uniq_id: &str) -> Result<()>;

    async fn destroy_server(&self, uniq_id: &str) -> Result<()>;

    async fn asset_details(&self, uniq_id: &str) -> Result<AssetDetails>;
}

/// Produces an authenticated API handle from credentials
pub trait Connector: Send + Sync {
    type Api: StormApi;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Api>;
}

/// Connector for the real HTTP API
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_API_TIMEOUT)
    }
}

impl Connector for HttpConnector {
    type Api = LiquidWebClient;

    fn connect(&self, credentials: &Credentials) -> Result<LiquidWebClient> {
        LiquidWebClient::new(credentials, self.timeout)
    }
}

/// HTTP client for the Liquid Web API
pub struct LiquidWebClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl LiquidWebClient {
    pub fn new(credentials: &Credentials, timeout: Duration) -> Result<Self> {
        let domain = credentials.api_domain.trim_end_matches('/');

        let url = reqwest::Url::parse(domain).map_err(|e| LiquidWebError::InvalidApiDomain {
            domain: credentials.api_domain.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LiquidWebError::InvalidApiDomain {
                domain: credentials.api_domain.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: domain.to_string(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        })
    }

    /// Invoke an API method such as `Storm/Server/status`
    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}/{}", self.base_url, API_VERSION, method);
        tracing::debug!("LW API call: {}", method);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&ApiRequest { params })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let value = serde_json::from_str::<serde_json::Value>(&body);
        if let Ok(ref value) = value {
            if let Some(err) = api_error(value) {
                return Err(err);
            }
        }

        if !status.is_success() {
            return Err(LiquidWebError::HttpStatus {
                method: method.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_value(value?)?)
    }
}

#[async_trait]
impl StormApi for LiquidWebClient {
    async fn create_server(&self, params: &ServerParams) -> Result<Server> {
        self.call("Storm/Server/create", params).await
    }

    async fn server_status(&self, uniq_id: &str) -> Result<ServerStatus> {
        self.call("Storm/Server/status", &UniqIdParams::new(uniq_id))
            .await
    }

    async fn start_server(&self, uniq_id: &str) -> Result<()> {
        let _: StartResult = self
            .call("Storm/Server/start", &UniqIdParams::new(uniq_id))
            .await?;
        Ok(())
    }

    async fn stop_server(&self, uniq_id: &str, force: bool) -> Result<()> {
        let params = StopParams {
            uniq_id,
            force: force.then_some(true),
        };
        let _: StopResult = self.call("Storm/Server/stop", &params).await?;
        Ok(())
    }

    async fn reboot_server(&self, uniq_id: &str) -> Result<()> {
        let _: RebootResult = self
            .call("Storm/Server/reboot", &UniqIdParams::new(uniq_id))
            .await?;
        Ok(())
    }

    async fn destroy_server(&self, uniq_id: &str) -> Result<()> {
        let _: DestroyResult = self
            .call("Storm/Server/destroy", &UniqIdParams::new(uniq_id))
            .await?;
        Ok(())
    }

    async fn asset_details(&self, uniq_id: &str) -> Result<AssetDetails> {
        self.call("Asset/details", &UniqIdParams::new(uniq_id))
            .await
    }
}

/// Extract an API error from a response body, if it carries one
fn api_error(value: &serde_json::Value) -> Option<LiquidWebError> {
    let class = value
        .get("error_class")
        .and_then(|v| v.as_str())
        .filter(|c| !c.is_empty())?;

    let message = ["full_message", "public_message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .unwrap_or(class);

    Some(LiquidWebError::Api {
        class: class.to_string(),
        message: message.to_string(),
    })
}

// ============ API Types ============

#[derive(Serialize)]
struct ApiRequest<'a, P> {
    params: &'a P,
}

#[derive(Serialize)]
struct UniqIdParams<'a> {
    uniq_id: &'a str,
}

impl<'a> UniqIdParams<'a> {
    fn new(uniq_id: &'a str) -> Self {
        Self { uniq_id }
    }
}

#[derive(Serialize)]
struct StopParams<'a> {
    uniq_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    force: Option<bool>,
}

/// Parameters for `Storm/Server/create`
#[derive(Clone, Serialize)]
pub struct ServerParams {
    /// Hostname of the new server
    pub domain: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<i64>,

    /// Root password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    pub public_ssh_key: String,

    pub template: String,

    pub config_id: i64,
}

/// Server returned by `Storm/Server/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub uniq_id: String,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub ip: Option<String>,

    #[serde(default)]
    pub template: Option<String>,
}

/// Status returned by `Storm/Server/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,

    #[serde(default)]
    pub detailed_status: Option<String>,
}

/// Asset returned by `Asset/details`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetails {
    #[serde(default)]
    pub uniq_id: Option<String>,

    /// Primary IP
    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StartResult {
    #[allow(dead_code)]
    started: String,
}

#[derive(Debug, Deserialize)]
struct StopResult {
    #[allow(dead_code)]
    stopped: String,
}

#[derive(Debug, Deserialize)]
struct RebootResult {
    #[allow(dead_code)]
    rebooted: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResult {
    #[allow(dead_code)]
    destroyed: String,
}
