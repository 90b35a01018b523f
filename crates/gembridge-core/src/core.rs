use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, HeaderValue, Method, Uri};
use axum::response::Response;
use bytes::Bytes;
use gembridge_common::{GatewayConfig, GatewayResult, RelayClient};
use gembridge_transform::generate_content::openai_chat_completions2gemini::TranslatorConfig;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{AuthProvider, MasterKeyAuth};
use crate::classify::{Operation, classify_request};
use crate::cors::{apply_cors, preflight_response};
use crate::error::error_response;
use crate::handler;
use crate::upstream_client::{RelayClientConfig, WreqRelayClient};

pub const REQUEST_ID_HEADER: &str = "x-gembridge-request-id";

/// The Gemini endpoint every call is addressed to before the relay rewrites it.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub base_url: String,
    pub api_key: Option<String>,
}

pub struct CoreState {
    pub relay: Arc<dyn RelayClient>,
    pub auth: Arc<dyn AuthProvider>,
    pub translator: TranslatorConfig,
    pub upstream: UpstreamTarget,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(state: CoreState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Wire the production relay client and master-key auth from merged configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, wreq::Error> {
        let relay = WreqRelayClient::new(config.relay.clone(), RelayClientConfig::default())?;
        Ok(Self::new(CoreState {
            relay: Arc::new(relay),
            auth: Arc::new(MasterKeyAuth::new(config.master_key_hash.clone())),
            translator: TranslatorConfig::default(),
            upstream: UpstreamTarget {
                base_url: config.upstream_base_url.clone(),
                api_key: config.google_api_key.clone(),
            },
        }))
    }

    pub fn router(&self) -> Router {
        // Inline images make large bodies normal; size is not capped here.
        Router::new()
            .fallback(entry_handler)
            .layer(DefaultBodyLimit::disable())
            .with_state(self.state.clone())
    }
}

async fn entry_handler(
    State(state): State<Arc<CoreState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, method, uri, headers, body).await
}

/// Answer one inbound request. Every error raised below is rendered here.
pub async fn handle(
    state: &CoreState,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let started_at = Instant::now();

    let mut resp = if method == Method::OPTIONS {
        preflight_response()
    } else {
        match dispatch(state, &trace_id, &method, &uri, &headers, &body).await {
            Ok(resp) => resp,
            Err(err) => error_response(&err),
        }
    };

    apply_cors(resp.headers_mut());
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = resp.status().as_u16();
    if resp.status().is_success() {
        info!(
            event = "downstream_responded",
            trace_id = %trace_id,
            status = status,
            elapsed_ms = started_at.elapsed().as_millis()
        );
    } else {
        warn!(
            event = "downstream_responded",
            trace_id = %trace_id,
            status = status,
            elapsed_ms = started_at.elapsed().as_millis()
        );
    }
    resp
}

async fn dispatch(
    state: &CoreState,
    trace_id: &str,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> GatewayResult<Response> {
    if let Err(err) = state.auth.authenticate(headers) {
        warn!(event = "auth_failed", trace_id = %trace_id, path = %uri.path());
        return Err(err);
    }

    let op = classify_request(method, uri.path())?;
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        op = %op.as_str(),
        method = %method,
        path = %uri.path()
    );

    match op {
        Operation::ChatCompletions => handler::chat_completions(state, trace_id, body).await,
        Operation::ListModels => handler::list_models(state, trace_id).await,
        Operation::Embeddings => handler::embeddings(state, trace_id, body).await,
    }
}
