use axum::body::Body;
use axum::response::Response;
use async_trait::async_trait;
use gembridge_common::{
    GatewayError, GatewayResult, Headers, RelayClient, UpstreamHttpRequest, UpstreamHttpResponse,
    header_remove, header_set,
};
use gembridge_protocol::gemini::batch_embed_contents::response::BatchEmbedContentsResponse;
use gembridge_protocol::gemini::generate_content::response::GenerateContentResponse;
use gembridge_protocol::gemini::list_models::response::ListModelsResponse;
use gembridge_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;
use gembridge_protocol::openai::embeddings::request::CreateEmbeddingRequestBody;
use gembridge_transform::embeddings::openai2gemini as embeddings_transform;
use gembridge_transform::generate_content::openai_chat_completions2gemini as chat_transform;
use gembridge_transform::list_models::openai2gemini as models_transform;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::classify::parse_json;
use crate::core::CoreState;

pub const GOOGLE_API_CLIENT: &str = "genai-js/0.21.0";

/// Upstream headers that must not be replayed to the caller.
const STRIPPED_RESPONSE_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
    "content-encoding",
];

/// Outcome of an upstream call: either the decoded success body or the raw failure,
/// which is replayed to the caller untouched.
enum Upstream<T> {
    Success(T),
    Failure(UpstreamHttpResponse),
}

pub async fn list_models(state: &CoreState, trace_id: &str) -> GatewayResult<Response> {
    let url = format!("{}/v1beta/models", state.upstream.base_url);
    let req = google_request(state, UpstreamHttpRequest::get(url));

    match send_upstream::<ListModelsResponse>(state, trace_id, req).await? {
        Upstream::Success(response) => {
            json_response(&models_transform::transform_response(response))
        }
        Upstream::Failure(response) => Ok(passthrough_response(response)),
    }
}

pub async fn chat_completions(
    state: &CoreState,
    trace_id: &str,
    body: &[u8],
) -> GatewayResult<Response> {
    let body: CreateChatCompletionRequestBody = parse_json(body)?;
    let relay = TracedRelay::new(state, trace_id);
    let request = chat_transform::transform_request(&body, &state.translator, &relay).await?;
    let model = request.path.model;

    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        state.upstream.base_url, model
    );
    let payload = serde_json::to_vec(&request.body).map_err(encode_error)?;
    let req = google_request(state, UpstreamHttpRequest::post_json(url, payload));

    match send_upstream::<GenerateContentResponse>(state, trace_id, req).await? {
        Upstream::Success(response) => {
            json_response(&chat_transform::transform_response(response, &model))
        }
        Upstream::Failure(response) => Ok(passthrough_response(response)),
    }
}

pub async fn embeddings(
    state: &CoreState,
    trace_id: &str,
    body: &[u8],
) -> GatewayResult<Response> {
    let body: CreateEmbeddingRequestBody = parse_json(body)?;
    let request = embeddings_transform::transform_request(&body);
    let model = request.path.model;

    let url = format!(
        "{}/v1beta/models/{}:batchEmbedContents",
        state.upstream.base_url, model
    );
    let payload = serde_json::to_vec(&request.body).map_err(encode_error)?;
    let req = google_request(state, UpstreamHttpRequest::post_json(url, payload));

    match send_upstream::<BatchEmbedContentsResponse>(state, trace_id, req).await? {
        Upstream::Success(response) => {
            json_response(&embeddings_transform::transform_response(response, &model))
        }
        Upstream::Failure(response) => Ok(passthrough_response(response)),
    }
}

fn google_request(state: &CoreState, mut req: UpstreamHttpRequest) -> UpstreamHttpRequest {
    header_set(&mut req.headers, "x-goog-api-client", GOOGLE_API_CLIENT);
    if let Some(api_key) = state.upstream.api_key.as_deref() {
        header_set(&mut req.headers, "x-goog-api-key", api_key);
    }
    req
}

/// Logs every outbound call of one inbound request under its trace id.
///
/// Image fetches made by the translator go through here as well as the Gemini call.
pub(crate) struct TracedRelay<'a> {
    inner: &'a dyn RelayClient,
    trace_id: &'a str,
}

impl<'a> TracedRelay<'a> {
    pub(crate) fn new(state: &'a CoreState, trace_id: &'a str) -> Self {
        Self {
            inner: state.relay.as_ref(),
            trace_id,
        }
    }
}

#[async_trait]
impl RelayClient for TracedRelay<'_> {
    async fn send(&self, req: UpstreamHttpRequest) -> GatewayResult<UpstreamHttpResponse> {
        let url = req.url.clone();
        info!(
            event = "upstream_sent",
            trace_id = %self.trace_id,
            method = %req.method.as_str(),
            url = %url
        );

        let response = match self.inner.send(req).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    event = "upstream_failed",
                    trace_id = %self.trace_id,
                    url = %url,
                    status = %err.status().as_u16(),
                    error = %err
                );
                return Err(err);
            }
        };

        if !response.is_success() {
            warn!(
                event = "upstream_failed",
                trace_id = %self.trace_id,
                url = %url,
                status = response.status,
                error_body = %String::from_utf8_lossy(&response.body)
            );
        }
        Ok(response)
    }
}

async fn send_upstream<T>(
    state: &CoreState,
    trace_id: &str,
    req: UpstreamHttpRequest,
) -> GatewayResult<Upstream<T>>
where
    T: DeserializeOwned,
{
    let response = TracedRelay::new(state, trace_id).send(req).await?;
    if !response.is_success() {
        return Ok(Upstream::Failure(response));
    }

    serde_json::from_slice(&response.body)
        .map(Upstream::Success)
        .map_err(|err| GatewayError::upstream_unreachable(format!("invalid upstream json: {err}")))
}

fn json_response<T: Serialize>(value: &T) -> GatewayResult<Response> {
    let body = serde_json::to_vec(value).map_err(encode_error)?;
    let mut resp = Response::new(Body::from(body));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(resp)
}

fn passthrough_response(response: UpstreamHttpResponse) -> Response {
    let mut resp = Response::new(Body::from(response.body));
    *resp.status_mut() =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    *resp.headers_mut() = passthrough_headers(response.headers);
    resp
}

fn passthrough_headers(mut headers: Headers) -> HeaderMap {
    for name in STRIPPED_RESPONSE_HEADERS {
        while header_remove(&mut headers, name).is_some() {}
    }

    let mut out = HeaderMap::new();
    for (name, value) in headers {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) else {
            continue;
        };
        out.append(name, value);
    }
    out
}

fn encode_error(err: serde_json::Error) -> GatewayError {
    GatewayError::Configuration(format!("failed to encode json: {err}"))
}
