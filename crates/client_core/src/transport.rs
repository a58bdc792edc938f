use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::{RpcRequest, INDEX_ROUTE, RPC_ROUTE, STATUS_ROUTE};
use url::Url;

/// Raw HTTP reply from the device. Decoding is left to the controller so malformed bodies and
/// rejected commands can be reported separately from transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReply {
    pub status: u16,
    pub body: String,
}

impl DeviceReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait DeviceApi: Send + Sync {
    async fn get_status(&self) -> Result<DeviceReply>;
    async fn post_rpc(&self, request: &RpcRequest) -> Result<DeviceReply>;
}

pub struct HttpDeviceApi {
    http: Client,
    base_url: Url,
}

impl HttpDeviceApi {
    pub fn new(device_url: &str) -> Result<Self> {
        let base_url = Url::parse(device_url)
            .with_context(|| format!("invalid device url '{device_url}'"))?;
        Ok(Self::with_client(Client::new(), base_url))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url> {
        self.base_url
            .join(route)
            .with_context(|| format!("failed to build device url for {route}"))
    }

    /// Fetches the host page that embeds the sequence list.
    pub async fn fetch_host_page(&self) -> Result<String> {
        let res = self
            .http
            .get(self.endpoint(INDEX_ROUTE)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.text().await?)
    }
}

#[async_trait]
impl DeviceApi for HttpDeviceApi {
    async fn get_status(&self) -> Result<DeviceReply> {
        let res = self.http.get(self.endpoint(STATUS_ROUTE)?).send().await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(DeviceReply { status, body })
    }

    async fn post_rpc(&self, request: &RpcRequest) -> Result<DeviceReply> {
        let res = self
            .http
            .post(self.endpoint(RPC_ROUTE)?)
            .json(request)
            .send()
            .await?;
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(DeviceReply { status, body })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
