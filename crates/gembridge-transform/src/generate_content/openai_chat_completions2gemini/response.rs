use gembridge_protocol::gemini::generate_content::response::GenerateContentResponse as GeminiGenerateContentResponse;
use gembridge_protocol::gemini::generate_content::types::{Candidate, UsageMetadata};
use gembridge_protocol::gemini::types::{FunctionCall as GeminiFunctionCall, Part as GeminiPart};
use gembridge_protocol::openai::create_chat_completions::response::{
    ChatCompletionChoice, ChatCompletionObjectType, CreateChatCompletionResponse,
};
use gembridge_protocol::openai::create_chat_completions::types::{
    ChatCompletionFunctionCall, ChatCompletionMessageToolCall, ChatCompletionResponseMessage,
    ChatCompletionResponseRole, ChatCompletionToolCallType, CompletionUsage,
};
use time::OffsetDateTime;

use crate::ids::generate_id;

/// Convert a Gemini generate-content response into an OpenAI chat completion.
///
/// `model` is the resolved id, without any `models/` prefix.
pub fn transform_response(
    response: GeminiGenerateContentResponse,
    model: &str,
) -> CreateChatCompletionResponse {
    let choices = response
        .candidates
        .into_iter()
        .map(map_candidate)
        .collect();

    CreateChatCompletionResponse {
        id: format!("chatcmpl-{}", generate_id()),
        object: ChatCompletionObjectType::ChatCompletion,
        created: OffsetDateTime::now_utc().unix_timestamp(),
        model: model.to_string(),
        choices,
        usage: response.usage_metadata.map(map_usage),
    }
}

fn map_candidate(candidate: Candidate) -> ChatCompletionChoice {
    let parts = candidate.content.map(|content| content.parts).unwrap_or_default();

    let text: String = parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .filter(|text| !text.is_empty())
        .collect();
    let tool_calls: Vec<ChatCompletionMessageToolCall> =
        parts.into_iter().filter_map(map_function_call).collect();

    let finish_reason = if tool_calls.is_empty() {
        candidate.finish_reason.as_deref().map(map_finish_reason)
    } else {
        Some("tool_calls".to_string())
    };

    ChatCompletionChoice {
        index: candidate.index.unwrap_or(0),
        message: ChatCompletionResponseMessage {
            role: ChatCompletionResponseRole::Assistant,
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
        },
        finish_reason,
    }
}

fn map_function_call(part: GeminiPart) -> Option<ChatCompletionMessageToolCall> {
    let GeminiFunctionCall { name, args, .. } = part.function_call?;
    Some(ChatCompletionMessageToolCall {
        id: format!("call_{}", generate_id()),
        kind: ChatCompletionToolCallType::Function,
        function: ChatCompletionFunctionCall {
            name,
            arguments: args.map_or_else(|| "{}".to_string(), |args| args.to_string()),
        },
    })
}

fn map_finish_reason(reason: &str) -> String {
    match reason {
        "STOP" => "stop",
        "MAX_TOKENS" => "length",
        "SAFETY" | "RECITATION" => "content_filter",
        other => return other.to_lowercase(),
    }
    .to_string()
}

fn map_usage(usage: UsageMetadata) -> CompletionUsage {
    CompletionUsage {
        prompt_tokens: usage.prompt_token_count,
        completion_tokens: usage.candidates_token_count,
        total_tokens: usage.total_token_count,
    }
}
