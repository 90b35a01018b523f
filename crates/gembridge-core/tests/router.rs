use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode, Uri};
use axum::response::Response;
use bytes::Bytes;
use gembridge_common::{
    GatewayError, GatewayResult, HttpMethod, RelayClient, UpstreamHttpRequest,
    UpstreamHttpResponse, header_get,
};
use gembridge_core::core::REQUEST_ID_HEADER;
use gembridge_core::{Core, CoreState, MasterKeyAuth, UpstreamTarget, handle};
use gembridge_transform::generate_content::openai_chat_completions2gemini::TranslatorConfig;
use serde_json::{Value, json};
use tower::ServiceExt;

const MASTER_KEY: &str = "test-master-key";
const BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Default)]
struct FakeRelay {
    responses: Mutex<VecDeque<UpstreamHttpResponse>>,
    requests: Mutex<Vec<UpstreamHttpRequest>>,
}

impl FakeRelay {
    fn replying(responses: Vec<UpstreamHttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<UpstreamHttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayClient for FakeRelay {
    async fn send(&self, req: UpstreamHttpRequest) -> GatewayResult<UpstreamHttpResponse> {
        self.requests.lock().unwrap().push(req);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::upstream_unreachable("connection refused"))
    }
}

fn json_reply(status: u16, body: Value) -> UpstreamHttpResponse {
    UpstreamHttpResponse {
        status,
        headers: vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("content-length".to_string(), "999".to_string()),
        ],
        body: Bytes::from(body.to_string()),
    }
}

fn state(relay: Arc<FakeRelay>) -> CoreState {
    CoreState {
        relay,
        auth: Arc::new(MasterKeyAuth::from_plain(MASTER_KEY)),
        translator: TranslatorConfig::default(),
        upstream: UpstreamTarget {
            base_url: BASE_URL.to_string(),
            api_key: Some("google-key".to_string()),
        },
    }
}

fn authed() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-master-key", HeaderValue::from_static(MASTER_KEY));
    headers
}

async fn call(
    state: &CoreState,
    method: Method,
    path: &str,
    headers: HeaderMap,
    body: Value,
) -> Response {
    let body = if body.is_null() {
        Bytes::new()
    } else {
        Bytes::from(body.to_string())
    };
    handle(state, method, path.parse::<Uri>().unwrap(), headers, body).await
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

fn assert_cors(resp: &Response) {
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        resp.headers().get("access-control-allow-methods").unwrap(),
        "GET, POST, PUT, DELETE, OPTIONS"
    );
    assert_eq!(
        resp.headers().get("access-control-allow-headers").unwrap(),
        "Content-Type, Authorization, X-Master-Key, x-goog-api-key"
    );
}

#[tokio::test]
async fn missing_master_key_is_rejected_before_any_upstream_call() {
    let relay = FakeRelay::replying(vec![json_reply(200, json!({ "models": [] }))]);
    let state = state(relay.clone());

    let resp = call(&state, Method::GET, "/v1/models", HeaderMap::new(), Value::Null).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_cors(&resp);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(
        body_text(resp).await,
        "Unauthorized: Missing or invalid X-Master-Key for proxy."
    );

    let mut wrong = HeaderMap::new();
    wrong.insert("x-master-key", HeaderValue::from_static("nope"));
    let resp = call(&state, Method::POST, "/v1/unknown", wrong, Value::Null).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(relay.requests().is_empty());
}

#[tokio::test]
async fn chat_without_key_never_fetches_images() {
    let relay = FakeRelay::replying(vec![json_reply(200, json!({ "candidates": [] }))]);
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/chat/completions",
        HeaderMap::new(),
        json!({
            "model": "gemini-pro",
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": "what is this?" },
                    { "type": "image_url", "image_url": { "url": "https://img.example.com/secret.png" } }
                ]
            }]
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_cors(&resp);
    assert!(relay.requests().is_empty());
}

fn large_image_chat(key: &str) -> Request<Body> {
    let payload = "A".repeat(3 * 1024 * 1024);
    let body = json!({
        "model": "gemini-pro",
        "messages": [{
            "role": "user",
            "content": [{
                "type": "image_url",
                "image_url": { "url": format!("data:image/png;base64,{payload}") }
            }]
        }]
    });
    Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .header("x-master-key", key)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn large_inline_image_reaches_upstream() {
    let relay = FakeRelay::replying(vec![json_reply(
        200,
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "a blank image" }] },
                "finishReason": "STOP"
            }]
        }),
    )]);
    let router = Core::new(state(relay.clone())).router();

    let resp = router.oneshot(large_image_chat(MASTER_KEY)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_cors(&resp);
    let body = body_json(resp).await;
    assert_eq!(body["choices"][0]["message"]["content"], "a blank image");

    let requests = relay.requests();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
    let inline = &sent["contents"][0]["parts"][0]["inlineData"];
    assert_eq!(inline["mimeType"], "image/png");
    assert_eq!(inline["data"].as_str().unwrap().len(), 3 * 1024 * 1024);
}

#[tokio::test]
async fn large_body_with_wrong_key_is_unauthorized() {
    let relay = FakeRelay::replying(Vec::new());
    let router = Core::new(state(relay.clone())).router();

    let resp = router.oneshot(large_image_chat("nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_cors(&resp);
    assert!(resp.headers().contains_key(REQUEST_ID_HEADER));
    assert!(relay.requests().is_empty());
}

#[tokio::test]
async fn preflight_needs_no_key() {
    let relay = FakeRelay::replying(Vec::new());
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::OPTIONS,
        "/v1/chat/completions",
        HeaderMap::new(),
        Value::Null,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_cors(&resp);
    assert!(body_text(resp).await.is_empty());
    assert!(relay.requests().is_empty());
}

#[tokio::test]
async fn unknown_path_and_wrong_method() {
    let relay = FakeRelay::replying(Vec::new());
    let state = state(relay.clone());

    let resp = call(&state, Method::GET, "/v1/completions", authed(), Value::Null).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_cors(&resp);
    assert_eq!(
        body_text(resp).await,
        "Not Found: The requested endpoint does not exist."
    );

    let resp = call(&state, Method::GET, "/v1/chat/completions", authed(), Value::Null).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        body_text(resp).await,
        "The specified HTTP method is not allowed for the requested resource"
    );
    assert!(relay.requests().is_empty());
}

#[tokio::test]
async fn lists_models_without_prefix() {
    let relay = FakeRelay::replying(vec![json_reply(
        200,
        json!({ "models": [{ "name": "models/gemini-pro" }, { "name": "models/text-embedding-004" }] }),
    )]);
    let state = state(relay.clone());

    let resp = call(&state, Method::GET, "/v1/models", authed(), Value::Null).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("content-type").unwrap(), "application/json");
    assert_cors(&resp);
    let body = body_json(resp).await;
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "gemini-pro");
    assert_eq!(body["data"][0]["owned_by"], "google");
    assert_eq!(body["data"][1]["id"], "text-embedding-004");

    let requests = relay.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, format!("{BASE_URL}/v1beta/models"));
    assert_eq!(
        header_get(&requests[0].headers, "x-goog-api-client"),
        Some("genai-js/0.21.0")
    );
    assert_eq!(header_get(&requests[0].headers, "x-goog-api-key"), Some("google-key"));
}

#[tokio::test]
async fn chat_completion_with_tool_call() {
    let relay = FakeRelay::replying(vec![json_reply(
        200,
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "functionCall": { "name": "get_weather", "args": { "city": "Paris" } } }
                ]},
                "finishReason": "STOP",
                "index": 0
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15 }
        }),
    )]);
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/chat/completions",
        authed(),
        json!({
            "model": "models/gemini-pro",
            "stream": true,
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "weather in Paris?" }
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": "get_weather",
                    "parameters": {
                        "$schema": "http://json-schema.org/draft-07/schema#",
                        "type": "object",
                        "additionalProperties": false,
                        "properties": { "city": { "type": "string" } }
                    }
                }
            }],
            "temperature": 0.7,
            "max_tokens": 100
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "gemini-pro");
    assert_eq!(body["choices"][0]["finish_reason"], "tool_calls");
    assert_eq!(body["choices"][0]["message"]["content"], Value::Null);
    let call = &body["choices"][0]["message"]["tool_calls"][0];
    assert_eq!(call["type"], "function");
    assert_eq!(call["function"]["name"], "get_weather");
    assert_eq!(call["function"]["arguments"], r#"{"city":"Paris"}"#);
    assert_eq!(body["usage"]["total_tokens"], 15);

    let requests = relay.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url,
        format!("{BASE_URL}/v1beta/models/gemini-pro:generateContent")
    );
    assert_eq!(
        header_get(&requests[0].headers, "content-type"),
        Some("application/json")
    );
    let sent: Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(sent["systemInstruction"]["parts"][0]["text"], "be brief");
    assert_eq!(sent["contents"][0]["role"], "user");
    assert_eq!(
        sent["generationConfig"],
        json!({ "temperature": 0.7, "maxOutputTokens": 100 })
    );
    assert_eq!(
        sent["tools"][0]["functionDeclarations"][0]["parameters"],
        json!({ "type": "object", "properties": { "city": { "type": "string" } } })
    );
}

#[tokio::test]
async fn embeddings_keep_input_order() {
    let relay = FakeRelay::replying(vec![json_reply(
        200,
        json!({ "embeddings": [{ "values": [0.5, 0.25] }, { "values": [1.0] }] }),
    )]);
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/embeddings",
        authed(),
        json!({ "input": ["a", "b"] }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["model"], "text-embedding-004");
    assert_eq!(body["data"][0]["index"], 0);
    assert_eq!(body["data"][0]["embedding"], json!([0.5, 0.25]));
    assert_eq!(body["data"][1]["index"], 1);
    assert_eq!(body["usage"], json!({ "prompt_tokens": 0, "total_tokens": 0 }));

    let requests = relay.requests();
    assert_eq!(
        requests[0].url,
        format!("{BASE_URL}/v1beta/models/text-embedding-004:batchEmbedContents")
    );
    let sent: Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(sent["requests"][1]["model"], "models/text-embedding-004");
    assert_eq!(sent["requests"][1]["content"]["parts"][0]["text"], "b");
}

#[tokio::test]
async fn upstream_errors_pass_through() {
    let upstream_body = json!({ "error": { "code": 429, "message": "Resource exhausted" } });
    let relay = FakeRelay::replying(vec![json_reply(429, upstream_body.clone())]);
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/chat/completions",
        authed(),
        json!({ "messages": [{ "role": "user", "content": "hi" }] }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_cors(&resp);
    assert_eq!(resp.headers().get("content-type").unwrap(), "application/json");
    assert!(resp.headers().get("content-length").is_none());
    assert_eq!(body_json(resp).await, upstream_body);
    assert_eq!(
        relay.requests()[0].url,
        format!("{BASE_URL}/v1beta/models/gemini-1.5-flash-latest:generateContent")
    );
}

#[tokio::test]
async fn malformed_data_uri_never_reaches_upstream() {
    let relay = FakeRelay::replying(Vec::new());
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/chat/completions",
        authed(),
        json!({
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": "what is this?" },
                    { "type": "image_url", "image_url": { "url": "data:image/png;base64" } }
                ]
            }]
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "Invalid image data");
    assert!(relay.requests().is_empty());
}

#[tokio::test]
async fn unknown_role_and_bad_json_are_bad_requests() {
    let relay = FakeRelay::replying(Vec::new());
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/chat/completions",
        authed(),
        json!({ "messages": [{ "role": "tool", "content": "42" }] }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "Unknown role: tool");

    let resp = handle(
        &state,
        Method::POST,
        "/v1/embeddings".parse().unwrap(),
        authed(),
        Bytes::from_static(b"{\"input\":"),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.starts_with("invalid json: "));
    assert!(relay.requests().is_empty());
}

#[tokio::test]
async fn remote_image_fetch_failure_mirrors_status() {
    let relay = FakeRelay::replying(vec![UpstreamHttpResponse {
        status: 403,
        headers: Vec::new(),
        body: Bytes::from_static(b"forbidden"),
    }]);
    let state = state(relay.clone());

    let resp = call(
        &state,
        Method::POST,
        "/v1/chat/completions",
        authed(),
        json!({
            "messages": [{
                "role": "user",
                "content": [{ "type": "image_url", "image_url": { "url": "https://img.example.com/a.png" } }]
            }]
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(resp).await, "Image fetch failed: 403");

    let requests = relay.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://img.example.com/a.png");
}

#[tokio::test]
async fn unreachable_relay_is_bad_gateway() {
    let relay = FakeRelay::replying(Vec::new());
    let state = state(relay.clone());

    let resp = call(&state, Method::GET, "/models", authed(), Value::Null).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_cors(&resp);
    assert_eq!(body_text(resp).await, "connection refused");
}
