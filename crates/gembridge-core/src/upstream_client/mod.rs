use std::time::Duration;

use async_trait::async_trait;
use gembridge_common::{
    GatewayError, GatewayResult, HttpMethod, RelayClient, RelayConfig, UpstreamHttpRequest,
    UpstreamHttpResponse, headers_from_map, relay_request,
};
use wreq::{Client, Method};

#[derive(Debug, Clone)]
pub struct RelayClientConfig {
    pub connect_timeout: Duration,
}

impl Default for RelayClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Sends every request through the configured relay over one pooled `wreq` client.
///
/// No overall deadline is set; only connecting is bounded.
#[derive(Clone)]
pub struct WreqRelayClient {
    relay: RelayConfig,
    client: Client,
}

impl WreqRelayClient {
    pub fn new(relay: RelayConfig, config: RelayClientConfig) -> Result<Self, wreq::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { relay, client })
    }
}

#[async_trait]
impl RelayClient for WreqRelayClient {
    async fn send(&self, req: UpstreamHttpRequest) -> GatewayResult<UpstreamHttpResponse> {
        let req = relay_request(&self.relay, req)?;
        let mut builder = self.client.request(http_method_to_wreq(req.method), &req.url);

        for (k, v) in &req.headers {
            builder = builder.header(k, v);
        }

        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(map_wreq_error)?;
        let status = resp.status().as_u16();
        let headers = headers_from_map(resp.headers());
        let body = resp.bytes().await.map_err(map_wreq_error)?;
        Ok(UpstreamHttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn http_method_to_wreq(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

fn map_wreq_error(err: wreq::Error) -> GatewayError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "transport"
    };
    GatewayError::upstream_unreachable(format!("relay request failed ({kind}): {err}"))
}
