use async_trait::async_trait;
use bytes::Bytes;
use http::Uri;

use crate::config::RelayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::headers::{Headers, header_set};

/// Carries the hostname the relay should forward to.
pub const RELAY_TARGET_HEADER: &str = "X-Proxy-Target";
/// Carries the secret shared with the relay.
pub const RELAY_AUTH_HEADER: &str = "X-Worker-Auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A request addressed to its real target; the relay rewrites it on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl UpstreamHttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let mut headers = Headers::new();
        header_set(&mut headers, "Content-Type", "application/json");
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers,
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamHttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl UpstreamHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a request through the authenticated relay and returns the raw upstream response.
///
/// Non-2xx responses are `Ok`; only a failure to reach the relay (or a missing relay
/// configuration) is an error.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn send(&self, req: UpstreamHttpRequest) -> GatewayResult<UpstreamHttpResponse>;
}

/// Re-addresses `req` to the relay: the target host moves into `X-Proxy-Target`, the shared
/// secret is attached, and the target's path and query are kept.
pub fn relay_request(
    config: &RelayConfig,
    mut req: UpstreamHttpRequest,
) -> GatewayResult<UpstreamHttpRequest> {
    let (Some(relay_url), Some(secret)) = (config.url.as_deref(), config.secret.as_deref()) else {
        return Err(GatewayError::Configuration(
            "Proxy configuration error: GCP_PROXY_URL or NGINX_INTERNAL_SECRET is not set."
                .to_string(),
        ));
    };

    let target: Uri = req
        .url
        .parse()
        .map_err(|err| GatewayError::invalid_input(format!("invalid upstream url: {err}")))?;
    let host = target
        .host()
        .ok_or_else(|| GatewayError::invalid_input(format!("upstream url has no host: {}", req.url)))?
        .to_string();
    let path_and_query = target
        .path_and_query()
        .map(|value| value.as_str())
        .unwrap_or("/");

    req.url = format!("{}{}", relay_url.trim_end_matches('/'), path_and_query);
    header_set(&mut req.headers, RELAY_TARGET_HEADER, host);
    header_set(&mut req.headers, RELAY_AUTH_HEADER, secret);
    Ok(req)
}
