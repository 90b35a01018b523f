use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gembridge_common::{
    GatewayError, GatewayResult, RelayClient, UpstreamHttpRequest, header_get,
};
use gembridge_protocol::gemini::types::Part as GeminiPart;
use gembridge_protocol::openai::create_chat_completions::types::{
    ChatCompletionContentPart, ChatCompletionMessageContent,
};
use http::StatusCode;
use regex::Regex;

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

// The payload is forwarded as-is; it is not decoded or re-encoded.
static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:(?P<mime_type>.*?)(;base64)?,(?P<data>.*)$")
        .expect("data uri pattern is hardcoded and must be valid")
});

/// Convert one message's content into Gemini parts.
///
/// Part types other than text and image are skipped. Remote images are fetched one at a
/// time, in order, through `relay`.
pub async fn transform_content(
    content: Option<&ChatCompletionMessageContent>,
    relay: &dyn RelayClient,
) -> GatewayResult<Vec<GeminiPart>> {
    let items = match content {
        None => return Ok(Vec::new()),
        Some(ChatCompletionMessageContent::Text(text)) => {
            return Ok(vec![GeminiPart::text(text.as_str())]);
        }
        Some(ChatCompletionMessageContent::Parts(items)) => items,
    };

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ChatCompletionContentPart::Text { text } => parts.push(GeminiPart::text(text.as_str())),
            ChatCompletionContentPart::ImageUrl { image_url } => {
                parts.push(resolve_image(&image_url.url, relay).await?);
            }
            ChatCompletionContentPart::Unsupported => {}
        }
    }
    Ok(parts)
}

/// Turn an image reference into an inline-data part.
pub async fn resolve_image(url: &str, relay: &dyn RelayClient) -> GatewayResult<GeminiPart> {
    if url.starts_with("data:") {
        return parse_data_uri(url);
    }

    // TODO: cap the body size before buffering; remote images are read fully into memory.
    let response = relay.send(UpstreamHttpRequest::get(url)).await?;
    if !response.is_success() {
        return Err(GatewayError::UpstreamFetch {
            status: StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY),
            message: format!("Image fetch failed: {}", response.status),
        });
    }

    let mime_type = header_get(&response.headers, "content-type")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE);
    Ok(GeminiPart::inline_data(mime_type, STANDARD.encode(&response.body)))
}

pub fn parse_data_uri(url: &str) -> GatewayResult<GeminiPart> {
    let captures = DATA_URI
        .captures(url)
        .ok_or_else(|| GatewayError::invalid_input("Invalid image data"))?;
    let mime_type = captures.name("mime_type").map_or("", |m| m.as_str());
    let data = captures.name("data").map_or("", |m| m.as_str());
    Ok(GeminiPart::inline_data(mime_type, data))
}
